//! 服务层数据传输对象
//!
//! 定义服务层的输入参数与操作结果，与内部领域模型解耦

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Poll, PlayableQuestion, PollResults, ReportTarget, TriviaGame, UserRole,
};
use crate::scoring::SpinBand;

/// 投票结果查询
///
/// `shareable` 为 false 表示投票对公众不可见（隐藏或草稿），结果只能返回给当前调用方，不能写入共享缓存
#[derive(Debug, Clone)]
pub struct PollResultsView {
    pub results: PollResults,
    pub shareable: bool,
}

/// 操作发起人
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_moderator(&self) -> bool {
        self.role.is_moderator()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

// ==================== 投票 ====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollInput {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub options: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// 创建投票结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollCreated {
    pub poll: Poll,
    pub points_awarded: i32,
    pub new_badges: Vec<String>,
}

/// 投票结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub poll: Poll,
    pub points_awarded: i32,
    pub new_badges: Vec<String>,
}

// ==================== 问答 ====================

/// 作答视图（不含答案）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaGameForPlay {
    pub game: TriviaGame,
    pub questions: Vec<PlayableQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: i64,
    pub selected_index: i32,
    pub correct_index: i32,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaResult {
    pub game_id: i64,
    pub correct: u32,
    pub total: u32,
    /// 0-100
    pub score: u8,
    pub points_earned: i32,
    pub questions: Vec<QuestionResult>,
    pub new_badges: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTriviaGameInput {
    pub title: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub points_reward: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionInput {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: i32,
    pub explanation: Option<String>,
}

// ==================== 每日奖励 ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatus {
    pub can_claim_daily: bool,
    pub can_spin: bool,
    /// 仍然有效的连续天数（断签后为 0）
    pub current_streak: u32,
    /// 当前连续天数对应的倍率
    pub multiplier: f64,
    /// 今天签到可获得的积分
    pub next_claim_points: i32,
    pub ads_watched_today: i32,
    pub ads_remaining: i32,
    pub total_spins: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyClaimResult {
    pub points_awarded: i32,
    pub streak: u32,
    pub multiplier: f64,
    pub new_badges: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinResult {
    pub band: SpinBand,
    pub base_points: i32,
    pub multiplier: f64,
    pub points_awarded: i32,
    pub streak: u32,
    pub new_badges: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdWatchResult {
    pub points_awarded: i32,
    pub ads_watched_today: i32,
    pub ads_remaining: i32,
}

// ==================== 赞助 ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotePollInput {
    pub poll_id: i64,
    pub sponsor_id: i64,
    pub budget_cents: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

// ==================== 审核 ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInput {
    pub target_type: ReportTarget,
    pub target_id: String,
    pub reason: String,
    pub details: Option<String>,
}
