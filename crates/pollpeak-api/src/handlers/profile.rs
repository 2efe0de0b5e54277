//! 用户档案与排行榜

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use pollpeak::{LeaderboardEntry, Profile, PublicProfile};
use pollpeak_shared::cache::CacheKey;
use uuid::Uuid;
use validator::Validate;

use super::cached;
use crate::auth::Claims;
use crate::dto::{
    AdminUpdateProfileRequest, ApiResponse, LimitQuery, PageResponse, PaginationParams,
    UpdateProfileRequest,
};
use crate::error::Result;
use crate::state::AppState;

const LEADERBOARD_TTL: Duration = Duration::from_secs(60);
const DEFAULT_LEADERBOARD_SIZE: i64 = 10;

/// GET /api/v1/me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Profile>>> {
    let profile = state.profiles.get_profile(claims.user_id()?).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PATCH /api/v1/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<Profile>>> {
    req.validate()?;
    let profile = state
        .profiles
        .update_profile(claims.user_id()?, req.into())
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// GET /api/v1/profiles/{id}
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PublicProfile>>> {
    let profile = state.profiles.get_public_profile(id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// 排行榜，缓存 60 秒
///
/// GET /api/v1/leaderboard?limit=10
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>> {
    let limit = query.limit_or(DEFAULT_LEADERBOARD_SIZE).clamp(1, 100);
    let profiles = state.profiles.clone();
    let entries = cached(
        &state.cache,
        &CacheKey::leaderboard(limit),
        LEADERBOARD_TTL,
        || async move { Ok(profiles.leaderboard(limit).await?) },
    )
    .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// GET /api/admin/profiles
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Profile>>>> {
    let page: pollpeak::Pagination = params.into();
    let (items, total) = state.profiles.list_profiles(page).await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        page.page,
        page.limit(),
    ))))
}

/// 修改角色、封禁状态或调整积分
///
/// PATCH /api/admin/profiles/{id}
pub async fn admin_update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<AdminUpdateProfileRequest>,
) -> Result<Json<ApiResponse<Profile>>> {
    req.validate()?;
    let profile = state
        .profiles
        .admin_update_profile(claims.user_id()?, id, req.into())
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}
