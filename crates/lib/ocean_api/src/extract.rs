//! Request extractors.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::envelope::FieldError;
use crate::error::AppError;
use crate::validation::field_errors;

/// JSON body that has been deserialized and validated.
///
/// Malformed bodies and rule violations both become `400 Validation failed`.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::Validation(vec![FieldError::new("body", rejection.body_text())])
            })?;
        value
            .validate()
            .map_err(|errors| AppError::Validation(field_errors(&errors)))?;
        Ok(Self(value))
    }
}
