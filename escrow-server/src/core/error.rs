use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::EscrowError;
use thiserror::Error;

/// Server-facing error, produced by API handlers
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ServerError::Escrow(e) => {
                // 客户端错误是正常业务流，只有服务端错误值得告警
                if !e.is_client_error() {
                    tracing::error!(error = %e, "Escrow operation failed server-side");
                }
                let (status, error_type) = match e {
                    EscrowError::InvalidInput(_) | EscrowError::InvalidDonationPercent(_) => {
                        (StatusCode::BAD_REQUEST, "invalid_input")
                    }
                    EscrowError::OrderNotFound(_) => (StatusCode::NOT_FOUND, "order_not_found"),
                    EscrowError::InvalidTransition(_) => {
                        (StatusCode::CONFLICT, "invalid_transition")
                    }
                    EscrowError::InspectionWindowClosed => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "inspection_window_closed")
                    }
                    // CAS 冲突在服务层已重试，走到这里说明重试耗尽
                    EscrowError::ConcurrencyConflict(_) => {
                        (StatusCode::CONFLICT, "concurrency_conflict")
                    }
                    EscrowError::RepositoryUnavailable(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "repository_unavailable")
                    }
                };
                (status, error_type, e.to_string())
            }
            ServerError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            ServerError::Internal(err) => {
                // 记录内部错误但不暴露详细信息
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

/// 处理器的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
