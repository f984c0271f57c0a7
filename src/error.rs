use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid count: {0}")]
    InvalidCount(String),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Red packet is closed")]
    PacketClosed,

    #[error("Red packet has expired")]
    PacketExpired,

    #[error("Red packet has been fully claimed")]
    PacketExhausted,

    #[error("Red packet already claimed by this user")]
    AlreadyClaimed,

    #[error("Sender cannot claim their own red packet")]
    SelfClaimForbidden,

    #[error("Only the sender can revoke this red packet")]
    NotOwner,

    #[error("Red packet is no longer active")]
    NotActive,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::InvalidAmount(msg) => {
                log::warn!("Invalid amount: {msg}");
                (StatusCode::BAD_REQUEST, "INVALID_AMOUNT", msg.clone())
            }
            AppError::InvalidCount(msg) => {
                log::warn!("Invalid count: {msg}");
                (StatusCode::BAD_REQUEST, "INVALID_COUNT", msg.clone())
            }
            AppError::InsufficientBalance => (
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_BALANCE",
                self.to_string(),
            ),
            // 抢红包竞争失败属于正常业务结果, 只记 debug
            AppError::PacketClosed => {
                log::debug!("Claim lost: packet closed");
                (StatusCode::CONFLICT, "PACKET_CLOSED", self.to_string())
            }
            AppError::PacketExpired => {
                log::debug!("Claim lost: packet expired");
                (StatusCode::CONFLICT, "PACKET_EXPIRED", self.to_string())
            }
            AppError::PacketExhausted => {
                log::debug!("Claim lost: packet exhausted");
                (StatusCode::CONFLICT, "PACKET_EXHAUSTED", self.to_string())
            }
            AppError::AlreadyClaimed => {
                log::debug!("Claim lost: already claimed");
                (StatusCode::CONFLICT, "ALREADY_CLAIMED", self.to_string())
            }
            AppError::SelfClaimForbidden => (
                StatusCode::BAD_REQUEST,
                "SELF_CLAIM_FORBIDDEN",
                self.to_string(),
            ),
            AppError::NotOwner => (StatusCode::FORBIDDEN, "NOT_OWNER", self.to_string()),
            AppError::NotActive => (StatusCode::CONFLICT, "NOT_ACTIVE", self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            AppError::ConfigError(msg) => {
                log::error!("Config error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    "Config error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
