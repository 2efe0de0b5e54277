//! 中间件模块
//!
//! 提供认证、角色校验、限流和安全响应头

mod auth;
mod rate_limit;
mod role;
mod security;

pub use auth::{auth_middleware, is_public_path};
pub use rate_limit::{RateLimitConfig, rate_limit_middleware};
pub use role::{require_current_role, require_role};
pub use security::security_headers;
