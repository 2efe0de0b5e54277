//! 角色校验中间件
//!
//! `require_role` 只看令牌中的角色，不访问数据库；
//! `require_current_role` 再按数据库中的账号状态复核，降级或封禁立即生效。

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use pollpeak::{ServiceError, UserRole};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// 角色校验中间件工厂
///
/// 角色有序：Admin 满足 Moderator 要求
///
/// ```ignore
/// .route_layer(axum::middleware::from_fn(require_role(UserRole::Admin)))
/// ```
pub fn require_role(
    required: UserRole,
) -> impl Fn(Request<Body>, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send + Sync
{
    move |request: Request<Body>, next: Next| {
        Box::pin(async move { check_role(request, next, required).await })
    }
}

async fn check_role(request: Request<Body>, next: Next, required: UserRole) -> Response {
    let role = match request.extensions().get::<Claims>() {
        Some(claims) => claims.role,
        None => return error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "未认证"),
    };

    if role >= required {
        return next.run(request).await;
    }

    error_response(
        StatusCode::FORBIDDEN,
        "FORBIDDEN",
        &format!("需要 {} 角色", required.as_str()),
    )
}

/// 按数据库中的角色和封禁状态复核的角色校验中间件工厂
///
/// 放在同级 `require_role` 之内，令牌角色不足的请求不会访问数据库。
/// 校验通过后用数据库中的角色覆盖 Claims。
pub fn require_current_role(
    state: AppState,
    required: UserRole,
) -> impl Fn(Request<Body>, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send + Sync
{
    move |request: Request<Body>, next: Next| {
        let state = state.clone();
        Box::pin(async move { check_current_role(state, request, next, required).await })
    }
}

async fn check_current_role(
    state: AppState,
    mut request: Request<Body>,
    next: Next,
    required: UserRole,
) -> Response {
    let Some(claims) = request.extensions().get::<Claims>().cloned() else {
        return error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "未认证");
    };

    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    let profile = match state.profiles.get_profile(user_id).await {
        Ok(profile) => profile,
        Err(ServiceError::ProfileNotFound(_)) => {
            return error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "账号不存在");
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    match stored_role_check(profile.role, profile.is_banned, required) {
        Ok(role) => {
            request.extensions_mut().insert(Claims { role, ..claims });
            next.run(request).await
        }
        Err(message) => {
            warn!(
                user_id = %claims.sub,
                token_role = claims.role.as_str(),
                stored_role = profile.role.as_str(),
                banned = profile.is_banned,
                "令牌角色与账号当前状态不符，拒绝访问"
            );
            error_response(StatusCode::FORBIDDEN, "FORBIDDEN", &message)
        }
    }
}

/// 账号当前状态是否满足要求，满足时返回数据库中的角色
fn stored_role_check(
    stored: UserRole,
    is_banned: bool,
    required: UserRole,
) -> Result<UserRole, String> {
    if is_banned {
        return Err("账号已被封禁".to_string());
    }
    if stored < required {
        return Err(format!("需要 {} 角色", required.as_str()));
    }
    Ok(stored)
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = json!({
        "success": false,
        "code": code,
        "message": message,
        "data": null
    });

    (status, axum::Json(body)).into_response()
}
