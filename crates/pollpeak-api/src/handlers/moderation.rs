//! 举报与内容审核

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use pollpeak::{ContentReport, ModeratorAction, ReportTarget};
use pollpeak_shared::cache::CacheKey;
use validator::Validate;

use super::invalidate;
use crate::auth::Claims;
use crate::dto::{
    ApiResponse, LimitQuery, PageResponse, ReportListQuery, ReportRequest, ResolveReportRequest,
};
use crate::error::Result;
use crate::state::AppState;

/// POST /api/v1/reports
pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<ApiResponse<ContentReport>>> {
    req.validate()?;
    let report = state
        .moderation
        .report(claims.user_id()?, req.into())
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// GET /api/admin/reports?status=OPEN
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportListQuery>,
) -> Result<Json<ApiResponse<PageResponse<ContentReport>>>> {
    let page = query.pagination();
    let (items, total) = state.moderation.list_reports(query.status, page).await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        page.page,
        page.limit(),
    ))))
}

/// 处理举报；隐藏投票后清掉结果缓存
///
/// POST /api/admin/reports/{id}/resolve
pub async fn resolve_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<ResolveReportRequest>,
) -> Result<Json<ApiResponse<ModeratorAction>>> {
    req.validate()?;
    let action = state
        .moderation
        .resolve(&claims.actor()?, id, req.action, req.note)
        .await?;

    if action.target_type == ReportTarget::Poll {
        if let Ok(poll_id) = action.target_id.parse::<i64>() {
            invalidate(&state.cache, &CacheKey::poll_results(poll_id)).await;
        }
    }
    Ok(Json(ApiResponse::success(action)))
}

/// GET /api/admin/moderation/actions?limit=50
pub async fn list_actions(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<ModeratorAction>>>> {
    let actions = state.moderation.list_actions(query.limit_or(50)).await?;
    Ok(Json(ApiResponse::success(actions)))
}
