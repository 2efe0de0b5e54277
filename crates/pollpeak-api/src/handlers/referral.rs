//! 邀请与大使计划

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use pollpeak::{Ambassador, AmbassadorDashboard, ReferralApplied, ReferralSummary};
use validator::Validate;

use crate::auth::Claims;
use crate::dto::{
    AmbassadorApplyRequest, AmbassadorListQuery, ApiResponse, ApplyReferralRequest, LimitQuery,
};
use crate::error::Result;
use crate::state::AppState;

/// 注册后补填邀请码，每个用户只能被邀请一次
///
/// POST /api/v1/referrals/apply
pub async fn apply_referral(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ApplyReferralRequest>,
) -> Result<Json<ApiResponse<ReferralApplied>>> {
    req.validate()?;
    let applied = state
        .referrals
        .apply_referral(claims.user_id()?, &req.code)
        .await?;
    Ok(Json(ApiResponse::success(applied)))
}

/// GET /api/v1/referrals/mine
pub async fn my_referrals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<ReferralSummary>>>> {
    let items = state
        .referrals
        .my_referrals(claims.user_id()?, query.limit_or(50))
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

/// POST /api/v1/ambassador/apply
pub async fn apply_ambassador(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AmbassadorApplyRequest>,
) -> Result<Json<ApiResponse<Ambassador>>> {
    req.validate()?;
    let ambassador = state
        .ambassadors
        .apply(claims.user_id()?, req.motivation)
        .await?;
    Ok(Json(ApiResponse::success(ambassador)))
}

/// GET /api/v1/ambassador/dashboard
pub async fn ambassador_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<AmbassadorDashboard>>> {
    let dashboard = state.ambassadors.dashboard(claims.user_id()?).await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

/// GET /api/admin/ambassadors?status=PENDING
pub async fn list_ambassadors(
    State(state): State<AppState>,
    Query(query): Query<AmbassadorListQuery>,
) -> Result<Json<ApiResponse<Vec<Ambassador>>>> {
    let items = state.ambassadors.list(query.status).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// POST /api/admin/ambassadors/{id}/approve
pub async fn approve_ambassador(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Ambassador>>> {
    let ambassador = state.ambassadors.approve(claims.user_id()?, id).await?;
    Ok(Json(ApiResponse::success(ambassador)))
}

/// POST /api/admin/ambassadors/{id}/reject
pub async fn reject_ambassador(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Ambassador>>> {
    let ambassador = state.ambassadors.reject(claims.user_id()?, id).await?;
    Ok(Json(ApiResponse::success(ambassador)))
}
