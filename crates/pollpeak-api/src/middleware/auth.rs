//! JWT 认证中间件
//!
//! 验证请求中的 Bearer Token 并将 Claims 注入请求扩展。
//! 公开路由在携带有效 Token 时同样注入 Claims，方便 handler 区分作者与访客。

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::state::AppState;

/// 任何方法都无需认证的路由
const OPEN_PATHS: [&str; 4] = [
    "/health",
    "/ready",
    "/api/v1/auth/register",
    "/api/v1/auth/login",
];

/// 仅 GET 请求无需认证的路由前缀
const PUBLIC_READ_PREFIXES: [&str; 7] = [
    "/api/v1/polls",
    "/api/v1/leaderboard",
    "/api/v1/profiles/",
    "/api/v1/trivia/games",
    "/api/v1/badges/catalogue",
    "/api/v1/store/items",
    "/api/v1/settings/public",
];

/// 判断请求是否允许匿名访问
pub fn is_public_path(method: &Method, path: &str) -> bool {
    if *method == Method::OPTIONS || OPEN_PATHS.contains(&path) {
        return true;
    }
    *method == Method::GET && PUBLIC_READ_PREFIXES.iter().any(|p| path.starts_with(p))
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let public = is_public_path(request.method(), request.uri().path());

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    match token {
        Some(token) => match state.jwt_manager.verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
                next.run(request).await
            }
            // 公开路由上的过期 Token 按匿名访问处理
            Err(_) if public => next.run(request).await,
            Err(e) => unauthorized_response(&e.to_string()),
        },
        None if public => next.run(request).await,
        None => unauthorized_response("缺少认证 Token"),
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = json!({
        "success": false,
        "code": "UNAUTHORIZED",
        "message": message,
        "data": null
    });

    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}
