//! 邀请与大使计划

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AmbassadorStatus;
use crate::scoring::AmbassadorTier;

/// 邀请关系，每个被邀请人只有一条
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: i64,
    pub referrer_id: Uuid,
    pub referee_id: Uuid,
    pub referrer_points: i32,
    pub referee_points: i32,
    pub created_at: DateTime<Utc>,
}

/// 我邀请的用户
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummary {
    pub referee_id: Uuid,
    pub referee_username: String,
    pub referrer_points: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReferral {
    pub referrer_id: Uuid,
    pub referee_id: Uuid,
    pub referrer_points: i32,
    pub referee_points: i32,
}

/// 邀请写入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralOutcome {
    pub referral: Referral,
    /// 邀请人的大使佣金（非大使为 0）
    pub commission: i32,
    pub referrer_referral_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ambassador {
    pub id: i64,
    pub user_id: Uuid,
    pub status: AmbassadorStatus,
    pub tier: AmbassadorTier,
    pub commission_rate: f64,
    pub total_commission: i32,
    #[sqlx(default)]
    pub motivation: Option<String>,
    #[sqlx(default)]
    pub approved_by: Option<Uuid>,
    #[sqlx(default)]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 审核大使申请
#[derive(Debug, Clone, PartialEq)]
pub struct AmbassadorReview {
    pub status: AmbassadorStatus,
    pub reviewer: Uuid,
    pub tier: AmbassadorTier,
    pub commission_rate: f64,
}

/// 大使面板
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbassadorDashboard {
    pub status: AmbassadorStatus,
    pub tier: AmbassadorTier,
    pub commission_rate: f64,
    pub referral_count: i32,
    pub total_commission: i32,
    pub next_tier: Option<AmbassadorTier>,
    /// 距离下一等级还需邀请的人数
    pub referrals_to_next_tier: Option<i32>,
    pub recent_referrals: Vec<ReferralSummary>,
}
