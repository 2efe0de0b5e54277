//! 投票与评论

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::PollStatus;

/// 投票
///
/// `vote_counts` 与 `options` 等长，`vote_counts[i]` 为第 i 个选项的票数
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: i64,
    pub creator_id: Uuid,
    pub title: String,
    #[sqlx(default)]
    pub description: Option<String>,
    pub category: String,
    pub options: Vec<String>,
    pub vote_counts: Vec<i32>,
    pub total_votes: i32,
    pub status: PollStatus,
    pub is_promoted: bool,
    #[sqlx(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Poll {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| now >= t)
    }

    /// 是否对普通用户可见
    pub fn is_visible(&self) -> bool {
        matches!(self.status, PollStatus::Active | PollStatus::Closed)
    }

    /// 各选项的票数与占比
    ///
    /// 占比保留一位小数；总票数为 0 时全部为 0.0
    pub fn results(&self) -> PollResults {
        let total: i64 = self.vote_counts.iter().map(|c| i64::from(*c)).sum();
        let options = self
            .options
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let votes = self.vote_counts.get(index).copied().unwrap_or(0);
                let percentage = if total == 0 {
                    0.0
                } else {
                    (f64::from(votes) * 1000.0 / total as f64).round() / 10.0
                };
                OptionResult {
                    index,
                    label: label.clone(),
                    votes,
                    percentage,
                }
            })
            .collect();

        PollResults {
            poll_id: self.id,
            total_votes: total,
            options,
        }
    }
}

/// 投票结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub poll_id: i64,
    pub total_votes: i64,
    pub options: Vec<OptionResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionResult {
    pub index: usize,
    pub label: String,
    pub votes: i32,
    pub percentage: f64,
}

/// 单条投票记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PollVote {
    pub id: i64,
    pub poll_id: i64,
    pub user_id: Uuid,
    pub option_index: i32,
    pub created_at: DateTime<Utc>,
}

/// 投票评论
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PollComment {
    pub id: i64,
    pub poll_id: i64,
    pub user_id: Uuid,
    /// 评论者用户名（查询时关联）
    #[sqlx(default)]
    pub username: Option<String>,
    pub content: String,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

/// 新建投票
#[derive(Debug, Clone)]
pub struct NewPoll {
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub options: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// 投票列表过滤条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollFilter {
    pub status: Option<PollStatus>,
    pub category: Option<String>,
    pub creator_id: Option<Uuid>,
    pub promoted_only: Option<bool>,
    pub keyword: Option<String>,
}
