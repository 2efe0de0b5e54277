//! HTTP 层错误类型定义
//!
//! 业务错误来自 `pollpeak::ServiceError`，在此统一映射为状态码和响应体

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pollpeak::ServiceError;
use pollpeak_shared::observability::tracing::current_trace_id;
use serde_json::json;

const GENERIC_MESSAGE: &str = "服务内部错误，请稍后重试";

/// API 错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),
    #[error("禁止访问: {0}")]
    Forbidden(String),
    #[error("邮箱或密码错误")]
    InvalidCredentials,

    #[error("参数验证失败: {0}")]
    Validation(String),
    #[error("资源不存在: {0}")]
    NotFound(String),
    #[error("请求过于频繁，请 {0} 秒后重试")]
    RateLimited(u64),

    // 业务错误
    #[error(transparent)]
    Service(#[from] ServiceError),

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Redis错误: {0}")]
    Redis(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Service(e) => service_status(e),
            Self::Database(_) | Self::Redis(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Service(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

fn service_status(err: &ServiceError) -> StatusCode {
    use ServiceError::*;
    match err {
        ProfileNotFound(_)
        | PollNotFound(_)
        | CommentNotFound(_)
        | TriviaGameNotFound(_)
        | StoreItemNotFound(_)
        | SponsorNotFound(_)
        | PromotionNotFound(_)
        | ReportNotFound(_)
        | AmbassadorNotFound
        | SettingNotFound(_) => StatusCode::NOT_FOUND,

        Validation(_)
        | InvalidOption { .. }
        | AnswerCountMismatch { .. }
        | InvalidReferralCode(_)
        | SelfReferral => StatusCode::BAD_REQUEST,

        UserBanned | Forbidden(_) => StatusCode::FORBIDDEN,

        AdLimitReached(_) => StatusCode::TOO_MANY_REQUESTS,

        InsufficientPoints { .. } => StatusCode::UNPROCESSABLE_ENTITY,

        PollNotActive(_)
        | PollExpired(_)
        | AlreadyVoted(_)
        | TriviaAlreadyCompleted(_)
        | TriviaGameInactive(_)
        | DailyRewardAlreadyClaimed
        | SpinAlreadyUsed
        | AlreadyReferred
        | AmbassadorApplicationExists
        | InvalidAmbassadorStatus(_)
        | OutOfStock(_)
        | StoreItemInactive(_)
        | InvalidPromotionStatus { .. }
        | ReportAlreadyResolved(_)
        | DuplicateReport
        | UsernameTaken(_)
        | EmailTaken(_) => StatusCode::CONFLICT,

        Database(_) | Serialization(_) | Internal(_) | ReferralCodeTaken(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息带 trace id 记录日志
        let message = match &self {
            Self::Database(e) => log_system_error("数据库操作失败", e),
            Self::Redis(e) => log_system_error("Redis 操作失败", e),
            Self::Internal(e) => log_system_error("内部错误", e),
            Self::Service(e) if !e.is_business_error() => log_system_error("服务层系统错误", e),
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

fn log_system_error(kind: &str, err: &dyn std::fmt::Display) -> String {
    tracing::error!(trace_id = ?current_trace_id(), error = %err, "{}", kind);
    GENERIC_MESSAGE.to_string()
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<pollpeak_shared::error::SharedError> for ApiError {
    fn from(err: pollpeak_shared::error::SharedError) -> Self {
        Self::Redis(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use uuid::Uuid;

    fn all_error_variants() -> Vec<(ApiError, StatusCode, &'static str)> {
        vec![
            (ApiError::Unauthorized("token expired".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (ApiError::Forbidden("admin only".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            (ApiError::Validation("email".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (ApiError::RateLimited(60), StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            (ServiceError::PollNotFound(1).into(), StatusCode::NOT_FOUND, "POLL_NOT_FOUND"),
            (ServiceError::AlreadyVoted(1).into(), StatusCode::CONFLICT, "ALREADY_VOTED"),
            (ServiceError::InvalidOption { index: 5, options: 2 }.into(), StatusCode::BAD_REQUEST, "INVALID_OPTION"),
            (ServiceError::SpinAlreadyUsed.into(), StatusCode::CONFLICT, "SPIN_ALREADY_USED"),
            (ServiceError::AdLimitReached(10).into(), StatusCode::TOO_MANY_REQUESTS, "AD_LIMIT_REACHED"),
            (ServiceError::InsufficientPoints { required: 10, available: 1 }.into(), StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_POINTS"),
            (ServiceError::UserBanned.into(), StatusCode::FORBIDDEN, "USER_BANNED"),
            (ServiceError::ProfileNotFound(Uuid::nil()).into(), StatusCode::NOT_FOUND, "PROFILE_NOT_FOUND"),
            (ServiceError::Internal("boom".into()).into(), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            (ApiError::Redis("connection refused".into()), StatusCode::INTERNAL_SERVER_ERROR, "REDIS_ERROR"),
        ]
    }

    #[test]
    fn test_all_variants_status_and_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            assert_eq!(error.status_code(), expected_status, "状态码不匹配: {expected_code}");
            assert_eq!(error.error_code(), expected_code);
        }
    }

    #[tokio::test]
    async fn test_system_error_hides_detail() {
        let response = ApiError::Internal("secret connection string".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], GENERIC_MESSAGE);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_business_error_keeps_message() {
        let response = ApiError::from(ServiceError::AlreadyVoted(42)).into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "ALREADY_VOTED");
        assert!(body["message"].as_str().unwrap().contains("42"));
    }
}
