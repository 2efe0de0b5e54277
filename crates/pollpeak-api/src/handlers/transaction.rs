//! 积分流水

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use pollpeak::{Pagination, PointTransaction};

use crate::auth::Claims;
use crate::dto::{ApiResponse, PageResponse, PaginationParams};
use crate::error::Result;
use crate::state::AppState;

/// GET /api/v1/transactions?page=1&pageSize=20
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<PointTransaction>>>> {
    let page: Pagination = params.into();
    let (items, total) = state.transactions.history(claims.user_id()?, page).await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        page.page,
        page.limit(),
    ))))
}
