use crate::domain::error::DomainError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

/// The one place where failures become HTTP responses.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();

        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) | ApiError::Unauthorized(_) => {
                warn!(error = %message, status = %status, "Request rejected")
            }
            ApiError::Upstream(_) => {
                warn!(error = %message, status = %status, "Upstream failure")
            }
            ApiError::Configuration(_) | ApiError::Internal(_) => {
                error!(error = %message, status = %status, "Server error")
            }
        }

        HttpResponse::build(status).json(ErrorResponse {
            ok: false,
            error: message,
        })
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Configuration(msg) => ApiError::Configuration(msg),
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            DomainError::Upstream(msg) => ApiError::Upstream(msg),
            DomainError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<DomainError>() {
            Ok(domain) => domain.into(),
            Err(other) => {
                // Storage and other unexpected failures stay out of the response body.
                error!(error = %other, "Unhandled error");
                ApiError::Internal("Internal server error.".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Configuration("c".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("c".into()), StatusCode::CONFLICT),
            (ApiError::Unauthorized("u".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Upstream("u".into()), StatusCode::BAD_GATEWAY),
            (ApiError::Internal("i".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn test_domain_error_keeps_message() {
        let api: ApiError =
            anyhow::Error::from(DomainError::Conflict("Email already registered.".into())).into();
        assert!(matches!(&api, ApiError::Conflict(m) if m == "Email already registered."));
    }

    #[test]
    fn test_foreign_error_is_hidden() {
        let api: ApiError = anyhow::anyhow!("disk I/O error at /var/db").into();
        assert!(matches!(&api, ApiError::Internal(m) if !m.contains("/var/db")));
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let response = ApiError::Validation("Email and password are required.".into())
            .error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "Email and password are required.");
    }
}
