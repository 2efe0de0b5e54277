//! 分级限流中间件
//!
//! 基于 Redis 固定窗口计数器，按请求类型分级：
//! - 写操作（POST/PUT/PATCH/DELETE）：默认 60 req/min
//! - 读操作（GET）：默认 300 req/min
//!
//! 两个维度：已认证请求按用户 ID，匿名请求按客户端地址的哈希；
//! 另有全局计数防止整体过载。Redis 不可用时放行。

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use pollpeak_shared::cache::{Cache, CacheKey};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::auth::Claims;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RateLimit {
    max_requests: i64,
    window_secs: u64,
}

/// 限流配置
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    write: RateLimit,
    read: RateLimit,
    /// 全局配额 = 单用户配额 * 此倍数
    global_multiplier: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            write: RateLimit {
                max_requests: 60,
                window_secs: 60,
            },
            read: RateLimit {
                max_requests: 300,
                window_secs: 60,
            },
            global_multiplier: 100,
        }
    }
}

impl RateLimitConfig {
    fn classify(&self, method: &Method) -> (&'static str, RateLimit) {
        match *method {
            Method::GET | Method::HEAD | Method::OPTIONS => ("read", self.read),
            _ => ("write", self.write),
        }
    }
}

/// 限流中间件
///
/// 放置在 auth 中间件之内，才能读取 Claims
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if path == "/health" || path == "/ready" {
        return next.run(request).await;
    }

    let config = RateLimitConfig::default();
    let (tier, limit) = config.classify(request.method());
    let window = window_key(limit.window_secs);
    let scope = client_scope(&request);

    // 1. 用户级
    let user_key = CacheKey::rate_limit(&scope, tier, window);
    match check_rate_limit(&state.cache, &user_key, limit.max_requests, limit.window_secs).await {
        Ok(remaining) if remaining < 0 => {
            warn!(scope = %scope, path = %path, tier, "用户限流触发");
            return too_many_requests_response(limit.window_secs);
        }
        Err(e) => {
            warn!(error = %e, "Redis 限流检查失败，跳过限流");
            return next.run(request).await;
        }
        _ => {}
    }

    // 2. 全局级
    let global_key = CacheKey::rate_limit("global", tier, window);
    let global_limit = limit.max_requests * config.global_multiplier;
    match check_rate_limit(&state.cache, &global_key, global_limit, limit.window_secs).await {
        Ok(remaining) if remaining < 0 => {
            warn!(path = %path, tier, "全局限流触发");
            return too_many_requests_response(limit.window_secs);
        }
        Err(e) => warn!(error = %e, "Redis 全局限流检查失败，跳过限流"),
        _ => {}
    }

    next.run(request).await
}

/// 固定窗口计数，返回剩余配额（负数表示超限）
///
/// 计数与过期时间原子写入，Redis 出错时由调用方记录日志并放行
async fn check_rate_limit(
    cache: &Cache,
    key: &str,
    max_requests: i64,
    window_secs: u64,
) -> Result<i64, String> {
    let count = cache
        .incr_with_ttl(key, 1, std::time::Duration::from_secs(window_secs))
        .await
        .map_err(|e| format!("Redis INCR/EXPIRE 失败: {}", e))?;

    Ok(max_requests - count)
}

/// 限流维度：已认证用户用 ID，匿名请求用转发地址的哈希（不在 Redis 中保存原始 IP）
fn client_scope(request: &Request<Body>) -> String {
    if let Some(claims) = request.extensions().get::<Claims>() {
        return format!("user:{}", claims.sub);
    }
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .unwrap_or("unknown");
    anonymous_scope(forwarded)
}

fn anonymous_scope(address: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(address.as_bytes()));
    format!("anon:{}", &digest[..16])
}

/// 当前窗口编号，同一窗口内的请求共享计数器
fn window_key(window_secs: u64) -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now / window_secs
}

fn too_many_requests_response(retry_after_secs: u64) -> Response {
    let body = json!({
        "success": false,
        "code": "RATE_LIMITED",
        "message": format!("请求过于频繁，请 {} 秒后重试", retry_after_secs),
        "data": null
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_method() {
        let config = RateLimitConfig::default();
        assert_eq!(config.classify(&Method::GET).0, "read");
        assert_eq!(config.classify(&Method::POST).0, "write");
        assert_eq!(config.classify(&Method::DELETE).1.max_requests, 60);
    }

    #[test]
    fn test_anonymous_scope_is_stable_and_opaque() {
        let a = anonymous_scope("203.0.113.9");
        assert_eq!(a, anonymous_scope("203.0.113.9"));
        assert_ne!(a, anonymous_scope("203.0.113.10"));
        assert!(!a.contains("203.0.113.9"));
        assert_eq!(a.len(), "anon:".len() + 16);
    }

    #[test]
    fn test_window_key_alignment() {
        let key = window_key(60);
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert!(key == now / 60 || key + 1 == now / 60);
    }
}
