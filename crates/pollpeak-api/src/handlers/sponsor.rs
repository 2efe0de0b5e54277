//! 赞助商与推广投票（管理员）

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use pollpeak::{PromotePollInput, PromotedPoll, Sponsor};
use validator::Validate;

use crate::dto::{
    ApiResponse, ConfirmPaymentRequest, CreateSponsorRequest, PromotePollRequest,
    PromotionListQuery,
};
use crate::error::Result;
use crate::state::AppState;

/// POST /api/admin/sponsors
pub async fn create_sponsor(
    State(state): State<AppState>,
    Json(req): Json<CreateSponsorRequest>,
) -> Result<Json<ApiResponse<Sponsor>>> {
    req.validate()?;
    let sponsor = state.sponsors.create_sponsor(req.into()).await?;
    Ok(Json(ApiResponse::success(sponsor)))
}

/// GET /api/admin/sponsors
pub async fn list_sponsors(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Sponsor>>>> {
    let sponsors = state.sponsors.list_sponsors().await?;
    Ok(Json(ApiResponse::success(sponsors)))
}

/// 创建待付款的推广，`startsAt` 缺省为当前时间
///
/// POST /api/admin/promotions
pub async fn promote_poll(
    State(state): State<AppState>,
    Json(req): Json<PromotePollRequest>,
) -> Result<Json<ApiResponse<PromotedPoll>>> {
    req.validate()?;
    let now = Utc::now();
    let input = PromotePollInput {
        poll_id: req.poll_id,
        sponsor_id: req.sponsor_id,
        budget_cents: req.budget_cents,
        starts_at: req.starts_at.unwrap_or(now),
        ends_at: req.ends_at,
    };
    let promotion = state.sponsors.promote_poll(input, now).await?;
    Ok(Json(ApiResponse::success(promotion)))
}

/// GET /api/admin/promotions?status=ACTIVE
pub async fn list_promotions(
    State(state): State<AppState>,
    Query(query): Query<PromotionListQuery>,
) -> Result<Json<ApiResponse<Vec<PromotedPoll>>>> {
    let promotions = state.sponsors.list_promotions(query.status).await?;
    Ok(Json(ApiResponse::success(promotions)))
}

/// POST /api/admin/promotions/{id}/confirm-payment
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> Result<Json<ApiResponse<PromotedPoll>>> {
    req.validate()?;
    let promotion = state.sponsors.confirm_payment(id, &req.reference).await?;
    Ok(Json(ApiResponse::success(promotion)))
}

/// POST /api/admin/promotions/{id}/cancel
pub async fn cancel_promotion(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PromotedPoll>>> {
    let promotion = state.sponsors.cancel_promotion(id).await?;
    Ok(Json(ApiResponse::success(promotion)))
}
