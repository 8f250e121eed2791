//! Request validation shared by the API and the browser forms.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CreateTaskRequest, Credentials, UpdateTaskRequest};

pub const MAX_TITLE_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One or more failed field checks. Displays as the messages joined by a space.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ValidationErrors {
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn required(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(
            field,
            format!("The {field} field is required."),
        ));
    }
}

fn title_length(value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().chars().count() > MAX_TITLE_LEN {
        errors.push(FieldError::new(
            "title",
            format!("The title may not be greater than {MAX_TITLE_LEN} characters."),
        ));
    }
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        required("title", &self.title, &mut errors);
        title_length(&self.title, &mut errors);
        required("description", &self.description, &mut errors);
        ValidationErrors(errors).into_result()
    }
}

impl UpdateTaskRequest {
    /// Fields that are present must still satisfy the create rules.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            required("title", title, &mut errors);
            title_length(title, &mut errors);
        }
        if let Some(description) = &self.description {
            required("description", description, &mut errors);
        }
        ValidationErrors(errors).into_result()
    }
}

pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

impl Credentials {
    pub fn validate_login(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        required("email", &self.email, &mut errors);
        if !self.email.trim().is_empty() && !is_plausible_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Enter a valid email address."));
        }
        required("password", &self.password, &mut errors);
        ValidationErrors(errors).into_result()
    }

    pub fn validate_registration(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate_login() {
            Ok(()) => Vec::new(),
            Err(ValidationErrors(errors)) => errors,
        };
        if !self.password.is_empty() && self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("The password must be at least {MIN_PASSWORD_LEN} characters."),
            ));
        }
        ValidationErrors(errors).into_result()
    }

    /// Emails are unique regardless of case.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}
