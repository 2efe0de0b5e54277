//! 赞助商与推广投票

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::PromotionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sponsor {
    pub id: i64,
    pub name: String,
    pub contact_email: String,
    #[sqlx(default)]
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSponsor {
    pub name: String,
    pub contact_email: String,
    pub website: Option<String>,
}

/// 推广投票
///
/// 仅在确认付款后进入 Active，投票才会标记为推广
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PromotedPoll {
    pub id: i64,
    pub poll_id: i64,
    pub sponsor_id: i64,
    pub budget_cents: i64,
    pub status: PromotionStatus,
    #[sqlx(default)]
    pub payment_reference: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPromotion {
    pub poll_id: i64,
    pub sponsor_id: i64,
    pub budget_cents: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}
