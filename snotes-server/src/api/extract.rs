//! Request extractors

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use snotes_common::validation::Validate;
use uuid::Uuid;

use crate::error::ApiError;

/// JSON body that has passed its validation rules
///
/// Malformed JSON and out-of-bounds values are both rejected with 400 before
/// the handler runs.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::InvalidInput(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidJson(value))
    }
}

/// Parse a path id; a malformed id names nothing, so it is `NotFound`
pub fn parse_id(raw: &str, kind: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} {}", kind, raw)))
}
