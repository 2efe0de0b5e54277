//! 问答游戏 API 处理器

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use pollpeak::{TriviaGame, TriviaGameForPlay, TriviaQuestion, TriviaResult};
use validator::Validate;

use crate::auth::Claims;
use crate::dto::{
    AddQuestionRequest, ApiResponse, CreateTriviaGameRequest, IncludeInactiveQuery,
    SetActiveRequest, SubmitAnswersRequest,
};
use crate::error::Result;
use crate::state::AppState;

/// 已上线的游戏
///
/// GET /api/v1/trivia/games
pub async fn list_games(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<TriviaGame>>>> {
    let games = state.trivia.list_games(false).await?;
    Ok(Json(ApiResponse::success(games)))
}

/// 作答视图，不含正确答案
///
/// GET /api/v1/trivia/games/{id}
pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<TriviaGameForPlay>>> {
    let game = state.trivia.get_game_for_play(id).await?;
    Ok(Json(ApiResponse::success(game)))
}

/// POST /api/v1/trivia/games/{id}/submit
pub async fn submit_answers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<Json<ApiResponse<TriviaResult>>> {
    req.validate()?;
    let result = state
        .trivia
        .submit_answers(claims.user_id()?, id, req.answers)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// GET /api/admin/trivia/games?includeInactive=true
pub async fn admin_list_games(
    State(state): State<AppState>,
    Query(query): Query<IncludeInactiveQuery>,
) -> Result<Json<ApiResponse<Vec<TriviaGame>>>> {
    let games = state.trivia.list_games(query.include_inactive).await?;
    Ok(Json(ApiResponse::success(games)))
}

/// 新游戏默认未上线，添加题目后再上线
///
/// POST /api/admin/trivia/games
pub async fn create_game(
    State(state): State<AppState>,
    Json(req): Json<CreateTriviaGameRequest>,
) -> Result<Json<ApiResponse<TriviaGame>>> {
    req.validate()?;
    let game = state.trivia.create_game(req.into()).await?;
    Ok(Json(ApiResponse::success(game)))
}

/// POST /api/admin/trivia/games/{id}/questions
pub async fn add_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AddQuestionRequest>,
) -> Result<Json<ApiResponse<TriviaQuestion>>> {
    req.validate()?;
    let question = state.trivia.add_question(id, req.into()).await?;
    Ok(Json(ApiResponse::success(question)))
}

/// PATCH /api/admin/trivia/games/{id}/active
pub async fn set_game_active(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<TriviaGame>>> {
    let game = state.trivia.set_game_active(id, req.active).await?;
    Ok(Json(ApiResponse::success(game)))
}
