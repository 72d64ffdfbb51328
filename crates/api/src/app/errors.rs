use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tenderflow_core::DomainError;
use tenderflow_infra::{ErrorCategory, TenderServiceError};

pub fn service_error_to_response(err: TenderServiceError) -> axum::response::Response {
    let status = match err.category() {
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Forbidden => StatusCode::FORBIDDEN,
        ErrorCategory::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.code(), err.to_string())
}

/// Request-level validation failures (bad ids, query parameters, bodies).
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    service_error_to_response(err.into())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_one_status_each() {
        let cases = [
            (TenderServiceError::UserNotFound("u".into()), StatusCode::NOT_FOUND),
            (TenderServiceError::TenderNotFound("t".into()), StatusCode::NOT_FOUND),
            (TenderServiceError::Forbidden("f".into()), StatusCode::FORBIDDEN),
            (TenderServiceError::InvalidAction("a".into()), StatusCode::BAD_REQUEST),
            (TenderServiceError::ValidationFailed("v".into()), StatusCode::BAD_REQUEST),
            (TenderServiceError::Conflict("c".into()), StatusCode::CONFLICT),
            (
                TenderServiceError::OperationFailed("o".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(service_error_to_response(err).status(), status);
        }
    }
}
