//! 每日奖励 API 处理器
//!
//! 签到、转盘、广告奖励均按 UTC 日期结算

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use pollpeak::{AdWatchResult, DailyClaimResult, DailyRewardHistory, DailyStatus, SpinResult};

use super::today;
use crate::auth::Claims;
use crate::dto::{ApiResponse, LimitQuery};
use crate::error::Result;
use crate::state::AppState;

/// GET /api/v1/rewards/status
pub async fn daily_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<DailyStatus>>> {
    let status = state
        .rewards
        .daily_status(claims.user_id()?, today())
        .await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /api/v1/rewards/daily
pub async fn claim_daily(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<DailyClaimResult>>> {
    let result = state
        .rewards
        .claim_daily_reward(claims.user_id()?, today())
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// POST /api/v1/rewards/spin
pub async fn spin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<SpinResult>>> {
    let result = state
        .rewards
        .perform_spin(claims.user_id()?, today())
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// 广告观看完成回调，广告平台的校验不在此处理
///
/// POST /api/v1/rewards/ad-watch
pub async fn ad_watch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<AdWatchResult>>> {
    let result = state
        .rewards
        .record_ad_watch(claims.user_id()?, today())
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// GET /api/v1/rewards/history?limit=30
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<DailyRewardHistory>>>> {
    let items = state
        .rewards
        .reward_history(claims.user_id()?, query.limit_or(30))
        .await?;
    Ok(Json(ApiResponse::success(items)))
}
