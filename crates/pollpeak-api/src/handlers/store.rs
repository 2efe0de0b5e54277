//! 积分商城

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use pollpeak::{StoreItem, StoreRedemption};
use validator::Validate;

use crate::auth::Claims;
use crate::dto::{
    ApiResponse, CreateStoreItemRequest, IncludeInactiveQuery, LimitQuery,
    UpdateStoreItemRequest,
};
use crate::error::Result;
use crate::state::AppState;

/// GET /api/v1/store/items
pub async fn list_items(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<StoreItem>>>> {
    let items = state.store.list_items(false).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// 扣减积分与库存在同一事务中完成
///
/// POST /api/v1/store/items/{id}/redeem
pub async fn redeem(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<i64>,
) -> Result<Json<ApiResponse<StoreRedemption>>> {
    let redemption = state.store.redeem(claims.user_id()?, item_id).await?;
    Ok(Json(ApiResponse::success(redemption)))
}

/// GET /api/v1/store/redemptions
pub async fn my_redemptions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<StoreRedemption>>>> {
    let items = state
        .store
        .my_redemptions(claims.user_id()?, query.limit_or(50))
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

/// GET /api/admin/store/items
pub async fn admin_list_items(
    State(state): State<AppState>,
    Query(query): Query<IncludeInactiveQuery>,
) -> Result<Json<ApiResponse<Vec<StoreItem>>>> {
    let items = state.store.list_items(query.include_inactive).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// POST /api/admin/store/items
pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateStoreItemRequest>,
) -> Result<Json<ApiResponse<StoreItem>>> {
    req.validate()?;
    let item = state.store.create_item(req.into()).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// PATCH /api/admin/store/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStoreItemRequest>,
) -> Result<Json<ApiResponse<StoreItem>>> {
    req.validate()?;
    let item = state.store.update_item(id, req.into()).await?;
    Ok(Json(ApiResponse::success(item)))
}
