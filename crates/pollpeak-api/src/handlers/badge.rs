//! 徽章 API 处理器

use axum::{Extension, Json, extract::State};
use pollpeak::{BadgeDefinition, UserBadgeView};

use crate::auth::Claims;
use crate::dto::ApiResponse;
use crate::error::Result;
use crate::state::AppState;

/// GET /api/v1/badges/catalogue
pub async fn catalogue(
    State(state): State<AppState>,
) -> Json<ApiResponse<&'static [BadgeDefinition]>> {
    Json(ApiResponse::success(state.badges.catalogue()))
}

/// 全部徽章及当前用户的获得状态与进度
///
/// GET /api/v1/badges/mine
pub async fn my_badges(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<UserBadgeView>>>> {
    let badges = state.badges.user_badges(claims.user_id()?).await?;
    Ok(Json(ApiResponse::success(badges)))
}
