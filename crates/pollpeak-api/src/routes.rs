//! 路由配置模块
//!
//! `/api/v1` 为 C 端接口，`/api/admin` 为运营管理接口

use std::time::Duration;

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post, put},
};
use pollpeak::UserRole;
use pollpeak_shared::observability::middleware as obs_middleware;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing::info;

use crate::middleware::{
    auth_middleware, rate_limit_middleware, require_current_role, require_role, security_headers,
};
use crate::{handlers, state::AppState};

/// 认证与个人档案
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh_token))
        .route("/auth/me", get(handlers::auth::get_current_user))
        .route(
            "/me",
            get(handlers::profile::get_me).patch(handlers::profile::update_me),
        )
        .route("/profiles/{id}", get(handlers::profile::get_public_profile))
        .route("/leaderboard", get(handlers::profile::leaderboard))
        .route("/transactions", get(handlers::transaction::history))
}

/// 投票与评论
fn poll_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/polls",
            get(handlers::poll::list_polls).post(handlers::poll::create_poll),
        )
        .route("/polls/{id}", get(handlers::poll::get_poll))
        .route("/polls/{id}/results", get(handlers::poll::get_results))
        .route("/polls/{id}/vote", post(handlers::poll::vote))
        .route("/polls/{id}/close", post(handlers::poll::close_poll))
        .route(
            "/polls/{id}/comments",
            get(handlers::poll::list_comments).post(handlers::poll::add_comment),
        )
        .route("/comments/{id}", delete(handlers::poll::delete_comment))
}

/// 问答、每日奖励、徽章
fn engagement_routes() -> Router<AppState> {
    Router::new()
        .route("/trivia/games", get(handlers::trivia::list_games))
        .route("/trivia/games/{id}", get(handlers::trivia::get_game))
        .route(
            "/trivia/games/{id}/submit",
            post(handlers::trivia::submit_answers),
        )
        .route("/rewards/status", get(handlers::reward::daily_status))
        .route("/rewards/daily", post(handlers::reward::claim_daily))
        .route("/rewards/spin", post(handlers::reward::spin))
        .route("/rewards/ad-watch", post(handlers::reward::ad_watch))
        .route("/rewards/history", get(handlers::reward::history))
        .route("/badges/catalogue", get(handlers::badge::catalogue))
        .route("/badges/mine", get(handlers::badge::my_badges))
}

/// 邀请、大使、积分商城、举报、公开设置
fn community_routes() -> Router<AppState> {
    Router::new()
        .route("/referrals/apply", post(handlers::referral::apply_referral))
        .route("/referrals/mine", get(handlers::referral::my_referrals))
        .route(
            "/ambassador/apply",
            post(handlers::referral::apply_ambassador),
        )
        .route(
            "/ambassador/dashboard",
            get(handlers::referral::ambassador_dashboard),
        )
        .route("/store/items", get(handlers::store::list_items))
        .route("/store/items/{id}/redeem", post(handlers::store::redeem))
        .route("/store/redemptions", get(handlers::store::my_redemptions))
        .route("/reports", post(handlers::moderation::create_report))
        .route("/settings/public", get(handlers::settings::public_settings))
}

/// C 端路由，挂载到 `/api/v1`
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .merge(account_routes())
        .merge(poll_routes())
        .merge(engagement_routes())
        .merge(community_routes())
}

/// 审核员可访问的管理路由
fn moderation_routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(handlers::moderation::list_reports))
        .route(
            "/reports/{id}/resolve",
            post(handlers::moderation::resolve_report),
        )
        .route(
            "/moderation/actions",
            get(handlers::moderation::list_actions),
        )
}

/// 仅管理员可访问的路由
fn admin_only_routes() -> Router<AppState> {
    Router::new()
        // 用户
        .route("/profiles", get(handlers::profile::list_profiles))
        .route(
            "/profiles/{id}",
            patch(handlers::profile::admin_update_profile),
        )
        .route("/polls/{id}", delete(handlers::poll::delete_poll))
        // 问答
        .route(
            "/trivia/games",
            get(handlers::trivia::admin_list_games).post(handlers::trivia::create_game),
        )
        .route(
            "/trivia/games/{id}/questions",
            post(handlers::trivia::add_question),
        )
        .route(
            "/trivia/games/{id}/active",
            patch(handlers::trivia::set_game_active),
        )
        // 大使
        .route("/ambassadors", get(handlers::referral::list_ambassadors))
        .route(
            "/ambassadors/{id}/approve",
            post(handlers::referral::approve_ambassador),
        )
        .route(
            "/ambassadors/{id}/reject",
            post(handlers::referral::reject_ambassador),
        )
        // 积分商城
        .route(
            "/store/items",
            get(handlers::store::admin_list_items).post(handlers::store::create_item),
        )
        .route("/store/items/{id}", patch(handlers::store::update_item))
        // 赞助推广
        .route(
            "/sponsors",
            get(handlers::sponsor::list_sponsors).post(handlers::sponsor::create_sponsor),
        )
        .route(
            "/promotions",
            get(handlers::sponsor::list_promotions).post(handlers::sponsor::promote_poll),
        )
        .route(
            "/promotions/{id}/confirm-payment",
            post(handlers::sponsor::confirm_payment),
        )
        .route(
            "/promotions/{id}/cancel",
            post(handlers::sponsor::cancel_promotion),
        )
        // 系统设置
        .route("/settings", get(handlers::settings::list_settings))
        .route(
            "/settings/{key}",
            get(handlers::settings::get_setting)
                .put(handlers::settings::upsert_setting)
                .delete(handlers::settings::delete_setting),
        )
}

/// 管理路由，挂载到 `/api/admin`
///
/// 先按令牌角色快速拒绝，再按数据库中的账号状态复核
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    let moderation = moderation_routes()
        .route_layer(middleware::from_fn(require_current_role(
            state.clone(),
            UserRole::Moderator,
        )))
        .route_layer(middleware::from_fn(require_role(UserRole::Moderator)));
    let admin = admin_only_routes()
        .route_layer(middleware::from_fn(require_current_role(
            state.clone(),
            UserRole::Admin,
        )))
        .route_layer(middleware::from_fn(require_role(UserRole::Admin)));
    moderation.merge(admin)
}

/// 按逗号分隔的来源列表构建 CORS，`*` 表示允许所有来源
pub fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        info!("CORS allowed_origins: * (all origins)");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 组装完整应用
///
/// 中间件由内到外：限流、安全头、CORS、认证、追踪、请求 ID
pub fn app(state: AppState, cors: CorsLayer, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v1", user_routes())
        .nest("/api/admin", admin_routes(&state))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // 限流依赖认证中间件注入的 Claims，必须在其内层
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_construction() {
        let _account = account_routes();
        let _poll = poll_routes();
        let _engagement = engagement_routes();
        let _community = community_routes();
        let _user = user_routes();
    }

    #[test]
    fn test_cors_layer_accepts_lists_and_wildcard() {
        let _any = cors_layer("*");
        let _list = cors_layer("http://localhost:5173, https://pollpeak.app");
        let _empty = cors_layer("");
    }
}
