//! 投票 API 处理器
//!
//! 投票结果对普通访客缓存 30 秒，投票、关闭、隐藏时失效

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use pollpeak::{Poll, PollComment, PollCreated, PollResults, VoteOutcome};
use pollpeak_shared::cache::CacheKey;
use validator::Validate;

use super::{cached_when, invalidate, optional_actor};
use crate::auth::Claims;
use crate::dto::{
    ApiResponse, CommentRequest, CreatePollRequest, DeletedResponse, PageResponse, PollListQuery,
    VoteRequest,
};
use crate::error::Result;
use crate::state::AppState;

const RESULTS_TTL: Duration = Duration::from_secs(30);

/// GET /api/v1/polls
pub async fn list_polls(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Query(query): Query<PollListQuery>,
) -> Result<Json<ApiResponse<PageResponse<Poll>>>> {
    let actor = optional_actor(&claims)?;
    let page = query.pagination();
    let (items, total) = state
        .polls
        .list_polls(actor.as_ref(), query.filter(), page)
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        page.page,
        page.limit(),
    ))))
}

/// POST /api/v1/polls
pub async fn create_poll(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePollRequest>,
) -> Result<Json<ApiResponse<PollCreated>>> {
    req.validate()?;
    let created = state
        .polls
        .create_poll(claims.user_id()?, req.into(), Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

/// GET /api/v1/polls/{id}
pub async fn get_poll(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Poll>>> {
    let actor = optional_actor(&claims)?;
    let poll = state.polls.get_poll(actor.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(poll)))
}

/// GET /api/v1/polls/{id}/results
///
/// 审核员可能查看隐藏投票，不走缓存。
/// 创建者查看自己的隐藏或草稿投票时结果不写入缓存，缓存中只有公开投票的结果
pub async fn get_results(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PollResults>>> {
    let actor = optional_actor(&claims)?;
    if actor.is_some_and(|a| a.is_moderator()) {
        let view = state.polls.get_results(actor.as_ref(), id).await?;
        return Ok(Json(ApiResponse::success(view.results)));
    }

    let polls = state.polls.clone();
    let results = cached_when(
        &state.cache,
        &CacheKey::poll_results(id),
        RESULTS_TTL,
        || async move {
            let view = polls.get_results(actor.as_ref(), id).await?;
            Ok((view.results, view.shareable))
        },
    )
    .await?;
    Ok(Json(ApiResponse::success(results)))
}

/// POST /api/v1/polls/{id}/vote
pub async fn vote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<ApiResponse<VoteOutcome>>> {
    req.validate()?;
    let outcome = state
        .polls
        .vote_on_poll(claims.user_id()?, id, req.option_index, Utc::now())
        .await?;
    invalidate(&state.cache, &CacheKey::poll_results(id)).await;
    Ok(Json(ApiResponse::success(outcome)))
}

/// GET /api/v1/polls/{id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<PollComment>>>> {
    let actor = optional_actor(&claims)?;
    let comments = state.polls.list_comments(actor.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(comments)))
}

/// POST /api/v1/polls/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<ApiResponse<PollComment>>> {
    req.validate()?;
    let comment = state
        .polls
        .add_comment(claims.user_id()?, id, &req.content)
        .await?;
    Ok(Json(ApiResponse::success(comment)))
}

/// 作者或审核员删除评论
///
/// DELETE /api/v1/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.polls.delete_comment(&claims.actor()?, id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}

/// 创建者或管理员关闭投票
///
/// POST /api/v1/polls/{id}/close
pub async fn close_poll(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Poll>>> {
    let poll = state.polls.close_poll(&claims.actor()?, id).await?;
    invalidate(&state.cache, &CacheKey::poll_results(id)).await;
    Ok(Json(ApiResponse::success(poll)))
}

/// DELETE /api/admin/polls/{id}
pub async fn delete_poll(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.polls.delete_poll(&claims.actor()?, id).await?;
    invalidate(&state.cache, &CacheKey::poll_results(id)).await;
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}
