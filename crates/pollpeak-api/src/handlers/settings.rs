//! 系统设置
//!
//! 公开设置对所有客户端可见，修改后清除缓存

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use pollpeak::AppSetting;
use pollpeak_shared::cache::CacheKey;

use super::{cached, invalidate};
use crate::auth::Claims;
use crate::dto::{ApiResponse, DeletedResponse, UpsertSettingRequest};
use crate::error::Result;
use crate::state::AppState;

const PUBLIC_SETTINGS_TTL: Duration = Duration::from_secs(300);

/// GET /api/v1/settings/public
pub async fn public_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AppSetting>>>> {
    let settings = state.settings.clone();
    let items = cached(
        &state.cache,
        &CacheKey::public_settings(),
        PUBLIC_SETTINGS_TTL,
        || async move { Ok(settings.public_settings().await?) },
    )
    .await?;
    Ok(Json(ApiResponse::success(items)))
}

/// GET /api/admin/settings
pub async fn list_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AppSetting>>>> {
    let items = state.settings.list().await?;
    Ok(Json(ApiResponse::success(items)))
}

/// GET /api/admin/settings/{key}
pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<AppSetting>>> {
    let setting = state.settings.get(&key).await?;
    Ok(Json(ApiResponse::success(setting)))
}

/// PUT /api/admin/settings/{key}
pub async fn upsert_setting(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(key): Path<String>,
    Json(req): Json<UpsertSettingRequest>,
) -> Result<Json<ApiResponse<AppSetting>>> {
    let setting = state
        .settings
        .upsert(claims.user_id()?, &key, req.value, req.is_public)
        .await?;
    invalidate(&state.cache, &CacheKey::public_settings()).await;
    Ok(Json(ApiResponse::success(setting)))
}

/// DELETE /api/admin/settings/{key}
pub async fn delete_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.settings.delete(&key).await?;
    invalidate(&state.cache, &CacheKey::public_settings()).await;
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}
