//! Form validation
//!
//! Each form is checked in full (not stopping at the first problem) and
//! yields at most one message per field: the first rule that field fails.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::constants::MIN_PASSWORD_LEN;
use crate::models::{ProfileUpdate, SignInCredentials, SignUpRequest};

/// A message attached to one form field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors of one submission, in field order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error unless the field already has one
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

fn check_required(errors: &mut ValidationErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn check_email(errors: &mut ValidationErrors, value: &str) {
    check_required(errors, "email", value, "Email is required");
    if !value.trim().is_empty() && !is_valid_email(value.trim()) {
        errors.add("email", "Enter a valid email");
    }
}

/// Sign-in form fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<SignInCredentials, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        check_required(&mut errors, "password", &self.password, "Password is required");
        errors.into_result(SignInCredentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// Sign-up form fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<SignUpRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "name", &self.name, "Name is required");
        check_email(&mut errors, &self.email);
        check_required(&mut errors, "password", &self.password, "Password is required");
        errors.into_result(SignUpRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// Profile form fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub old_password: String,
    pub password: String,
    pub password_confirmation: String,
}

impl ProfileForm {
    /// Password fields are only checked (and sent) when `old_password` is filled in
    pub fn validate(&self) -> Result<ProfileUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "name", &self.name, "Name is required");
        check_email(&mut errors, &self.email);

        let changing_password = !self.old_password.is_empty();
        if changing_password {
            for (field, value) in [
                ("password", &self.password),
                ("password_confirmation", &self.password_confirmation),
            ] {
                if value.is_empty() {
                    errors.add(field, "Required field");
                } else if value.chars().count() < MIN_PASSWORD_LEN {
                    errors.add(field, format!("At least {} characters", MIN_PASSWORD_LEN));
                }
            }
        }
        if self.password_confirmation != self.password {
            errors.add("password_confirmation", "Confirmation does not match");
        }

        let update = if changing_password {
            ProfileUpdate {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                old_password: Some(self.old_password.clone()),
                password: Some(self.password.clone()),
                password_confirmation: Some(self.password_confirmation.clone()),
            }
        } else {
            ProfileUpdate {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                old_password: None,
                password: None,
                password_confirmation: None,
            }
        };
        errors.into_result(update)
    }
}
