//! Body and query extractors whose rejections go through `errors`.
//!
//! axum's stock `Json`/`Query` reject with plain-text 400/422 responses; these
//! wrappers turn the same failures into `validation_failed` JSON errors.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Json, Query, Request};
use axum::http::request::Parts;
use axum::response::Response;
use serde::de::DeserializeOwned;

use tenderflow_infra::TenderServiceError;

use crate::app::errors;

/// JSON request body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_input(rejection.body_text())),
        }
    }
}

/// Query string parameters.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_input(rejection.body_text())),
        }
    }
}

fn invalid_input(detail: String) -> Response {
    errors::service_error_to_response(TenderServiceError::ValidationFailed(detail))
}
