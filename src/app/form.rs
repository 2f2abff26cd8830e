//! Form state shared by the sign-in, sign-up and profile screens

use crate::models::UserProfile;
use crate::validation::{ProfileForm, SignInForm, SignUpForm, ValidationErrors};

/// One text input
#[derive(Clone, Debug, PartialEq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    /// Rendered masked
    pub secret: bool,
}

impl FormField {
    fn new(name: &'static str, label: &'static str) -> Self {
        FormField {
            name,
            label,
            value: String::new(),
            secret: false,
        }
    }

    fn secret(name: &'static str, label: &'static str) -> Self {
        FormField {
            secret: true,
            ..FormField::new(name, label)
        }
    }

    /// Text to display (masked for secrets)
    pub fn display_value(&self) -> String {
        if self.secret {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormState {
    pub fields: Vec<FormField>,
    pub focused: usize,
    pub errors: ValidationErrors,
}

impl FormState {
    pub fn sign_in() -> Self {
        FormState {
            fields: vec![
                FormField::new("email", "E-mail"),
                FormField::secret("password", "Password"),
            ],
            ..Default::default()
        }
    }

    pub fn sign_up() -> Self {
        FormState {
            fields: vec![
                FormField::new("name", "Name"),
                FormField::new("email", "E-mail"),
                FormField::secret("password", "Password"),
            ],
            ..Default::default()
        }
    }

    /// Profile form pre-filled with the current user
    pub fn profile(user: Option<&UserProfile>) -> Self {
        let mut form = FormState {
            fields: vec![
                FormField::new("name", "Name"),
                FormField::new("email", "E-mail"),
                FormField::secret("old_password", "Current password"),
                FormField::secret("password", "New password"),
                FormField::secret("password_confirmation", "Confirm password"),
            ],
            ..Default::default()
        };
        if let Some(user) = user {
            form.set("name", &user.name);
            form.set("email", &user.email);
        }
        form
    }

    pub fn value(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.value = value.to_string();
        }
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focused = self.focused.checked_sub(1).unwrap_or(self.fields.len() - 1);
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            field.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            field.value.pop();
        }
    }

    /// Store errors and move focus to the first failing field
    pub fn set_errors(&mut self, errors: ValidationErrors) {
        if let Some(first) = errors.iter().next() {
            if let Some(idx) = self.fields.iter().position(|f| f.name == first.field) {
                self.focused = idx;
            }
        }
        self.errors = errors;
    }

    pub fn clear_errors(&mut self) {
        self.errors = ValidationErrors::default();
    }

    pub fn to_sign_in(&self) -> SignInForm {
        SignInForm {
            email: self.value("email").to_string(),
            password: self.value("password").to_string(),
        }
    }

    pub fn to_sign_up(&self) -> SignUpForm {
        SignUpForm {
            name: self.value("name").to_string(),
            email: self.value("email").to_string(),
            password: self.value("password").to_string(),
        }
    }

    pub fn to_profile(&self) -> ProfileForm {
        ProfileForm {
            name: self.value("name").to_string(),
            email: self.value("email").to_string(),
            old_password: self.value("old_password").to_string(),
            password: self.value("password").to_string(),
            password_confirmation: self.value("password_confirmation").to_string(),
        }
    }
}
