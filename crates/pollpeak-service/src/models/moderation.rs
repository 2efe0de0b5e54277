//! 内容举报与审核

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ModerationActionType, ReportStatus, ReportTarget};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentReport {
    pub id: i64,
    pub reporter_id: Uuid,
    pub target_type: ReportTarget,
    /// 投票/评论为数字 ID，用户为 UUID
    pub target_id: String,
    pub reason: String,
    #[sqlx(default)]
    pub details: Option<String>,
    pub status: ReportStatus,
    #[sqlx(default)]
    pub resolved_by: Option<Uuid>,
    #[sqlx(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub target_type: ReportTarget,
    pub target_id: String,
    pub reason: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ModeratorAction {
    pub id: i64,
    pub moderator_id: Uuid,
    #[sqlx(default)]
    pub report_id: Option<i64>,
    pub action: ModerationActionType,
    pub target_type: ReportTarget,
    pub target_id: String,
    #[sqlx(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 处理举报
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub report_id: i64,
    pub moderator_id: Uuid,
    pub action: ModerationActionType,
    pub note: Option<String>,
}
