//! Auth payloads.

use ocean_core::models::identity::Identity;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::validation::field_error;

fn register_passwords_match(req: &RegisterRequest) -> Result<(), ValidationError> {
    match &req.confirm_password {
        Some(confirm) if *confirm != req.password => Err(field_error(
            "confirmPassword",
            "passwords_match",
            "Passwords do not match",
        )),
        _ => Ok(()),
    }
}

fn reset_passwords_match(req: &ResetPasswordRequest) -> Result<(), ValidationError> {
    if !req.confirm_password.is_empty() && req.confirm_password != req.password {
        return Err(field_error(
            "confirmPassword",
            "passwords_match",
            "Passwords do not match",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "register_passwords_match", skip_on_field_errors = false))]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::validation::display_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "crate::validation::password_strength")
    )]
    pub password: String,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "reset_passwords_match", skip_on_field_errors = false))]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[serde(default)]
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "crate::validation::password_strength")
    )]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Confirm password is required"))]
    pub confirm_password: String,
}

/// Returned by register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: Identity,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::field_errors;

    fn register(json: serde_json::Value) -> RegisterRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn valid_registration_passes() {
        let req = register(serde_json::json!({
            "name": "A.", "email": "a@x.com", "password": "Abc12345!", "confirmPassword": "Abc12345!"
        }));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn every_violation_is_reported() {
        let req = register(serde_json::json!({
            "name": "", "email": "nope", "password": "short", "confirmPassword": "other"
        }));
        let errors = field_errors(&req.validate().unwrap_err());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
        assert!(fields.contains(&"confirmPassword"));
    }

    #[test]
    fn whitespace_only_name_is_rejected() {
        let req = register(serde_json::json!({
            "name": "   ", "email": "a@x.com", "password": "Abc12345!"
        }));
        let errors = field_errors(&req.validate().unwrap_err());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[0].message, "Name must be between 1 and 100 characters");
    }

    #[test]
    fn missing_fields_are_violations() {
        let req = register(serde_json::json!({}));
        let errors = field_errors(&req.validate().unwrap_err());
        assert!(errors.len() >= 3);
    }

    #[test]
    fn reset_requires_confirmation() {
        let req: ResetPasswordRequest = serde_json::from_value(serde_json::json!({
            "token": "t", "password": "Abc12345!"
        }))
        .unwrap();
        let errors = field_errors(&req.validate().unwrap_err());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "confirmPassword");
    }
}
