use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ServiceError;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_failed", msg),
            ApiError::Service(e) => {
                let message = e.to_string();
                match e {
                    ServiceError::InvalidInput(_) => {
                        (StatusCode::BAD_REQUEST, "invalid_input", message)
                    }
                    ServiceError::UpstreamUnavailable(_) => {
                        (StatusCode::BAD_GATEWAY, "upstream_unavailable", message)
                    }
                    ServiceError::NotFound(_) => {
                        (StatusCode::NOT_FOUND, "notification_not_found", message)
                    }
                    ServiceError::PersistenceFailure(ref store) => {
                        log::error!("request failed on notification store: {}", store);
                        (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failure", message)
                    }
                }
            }
        };
        (status, Json(ErrorResponse::with_message(error, &message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::StoreError;

    fn status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn maps_service_errors_to_status_codes() {
        assert_eq!(
            status(ServiceError::InvalidInput("lat".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ServiceError::UpstreamUnavailable("sgp4".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status(ServiceError::NotFound(3).into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ServiceError::PersistenceFailure(StoreError::Io(std::io::Error::other("disk"))).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ApiError::Validation("line2 missing".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn error_body_omits_empty_message() {
        let json = serde_json::to_value(ErrorResponse::new("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "nope" }));
    }
}
