//! 问答游戏

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TriviaGame {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    /// 满分时可获得的积分
    pub points_reward: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TriviaQuestion {
    pub id: i64,
    pub game_id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: i32,
    #[sqlx(default)]
    pub explanation: Option<String>,
    pub position: i32,
}

/// 作答时下发的题目，不含正确答案
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayableQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub position: i32,
}

impl From<&TriviaQuestion> for PlayableQuestion {
    fn from(q: &TriviaQuestion) -> Self {
        Self {
            id: q.id,
            question: q.question.clone(),
            options: q.options.clone(),
            position: q.position,
        }
    }
}

/// 一次完成记录，每个用户每个游戏只有一条
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TriviaSession {
    pub id: i64,
    pub game_id: i64,
    pub user_id: Uuid,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub score: i16,
    pub points_earned: i32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTriviaGame {
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub points_reward: i32,
}

#[derive(Debug, Clone)]
pub struct NewTriviaQuestion {
    pub game_id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: i32,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTriviaSession {
    pub game_id: i64,
    pub user_id: Uuid,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub score: i16,
    pub points_earned: i32,
}
