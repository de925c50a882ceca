use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        match self {
            AppError::ConfigurationMissing { .. } => {
                // Admin-facing: keep the setting name and remediation in the
                // body instead of collapsing into a generic 500.
                let msg = self.to_string();
                error_resp(
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::ConfigurationMissing,
                    Some(msg),
                )
            }
            AppError::InvalidCredentialFormat { .. } => {
                let msg = self.to_string();
                error_resp(
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::InvalidCredentialFormat,
                    Some(msg),
                )
            }
            AppError::AuthenticationFailure => error_resp(
                StatusCode::BAD_GATEWAY,
                ErrorCode::AuthenticationFailure,
                None,
            ),
            AppError::ServiceUnavailable => error_resp(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ServiceUnavailable,
                Some("payment provider is unavailable, try again shortly".into()),
            ),
            AppError::ProviderRejected(msg) => error_resp(
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::ProviderRejected,
                Some(msg),
            ),
            AppError::PlanNotFound => {
                error_resp(StatusCode::NOT_FOUND, ErrorCode::PlanNotFound, None)
            }
            AppError::Forbidden => error_resp(StatusCode::FORBIDDEN, ErrorCode::Forbidden, None),
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None),
            AppError::Conflict => error_resp(StatusCode::CONFLICT, ErrorCode::Conflict, None),
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::Database(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
                None,
            ),
            AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                None,
            ),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
