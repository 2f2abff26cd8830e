//! Error types surfaced to the screens
//!
//! Validation errors stay on the form, one message per field. Everything
//! else ends up as a single alert the user dismisses before retrying.

use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Clone, Debug, Error)]
pub enum AppError {
    /// Client-side form check failed before any network call
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Credentials rejected, session call failed, or no active session
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Any other failed remote call
    #[error("network error: {0}")]
    Network(String),

    /// Key-value store or local file failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Message shown in the alert body
    pub fn detail(&self) -> String {
        match self {
            AppError::Validation(errors) => errors.to_string(),
            AppError::Authentication(msg) | AppError::Network(msg) | AppError::Storage(msg) => {
                msg.clone()
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Alert popup content
#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Alert {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Alert for a failed operation, keeping the server's reason when there is one
    pub fn from_error(title: impl Into<String>, fallback: &str, error: &AppError) -> Self {
        let detail = error.detail();
        let message = if detail.is_empty() {
            fallback.to_string()
        } else {
            format!("{}\n\n{}", fallback, detail)
        };
        Alert::new(title, message)
    }
}
