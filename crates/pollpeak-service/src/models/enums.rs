//! 枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Moderator,
    Admin,
}

impl UserRole {
    /// 审核员及以上
    pub fn is_moderator(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(format!("未知角色: {}", other)),
        }
    }
}

/// 投票状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum PollStatus {
    /// 草稿，不对外展示
    Draft,
    /// 进行中，可投票
    #[default]
    Active,
    /// 已结束（到期或创建者关闭），结果可见
    Closed,
    /// 被审核隐藏
    Hidden,
}

/// 每日奖励类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum RewardType {
    DailyLogin,
    Spin,
    AdWatch,
}

/// 大使申请状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum AmbassadorStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl AmbassadorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// 推广状态
///
/// PendingPayment -> Active -> Completed，PendingPayment/Active 可取消
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum PromotionStatus {
    #[default]
    PendingPayment,
    Active,
    Completed,
    Cancelled,
}

impl PromotionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::PendingPayment | Self::Active)
    }
}

/// 积分流水方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum TransactionKind {
    Earn,
    Spend,
}

/// 积分来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum PointSource {
    Vote,
    PollCreation,
    Comment,
    Trivia,
    DailyLogin,
    Spin,
    AdWatch,
    ReferralBonus,
    AmbassadorCommission,
    StoreRedemption,
    AdminAdjustment,
}

impl PointSource {
    /// 指标标签
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vote => "vote",
            Self::PollCreation => "poll_creation",
            Self::Comment => "comment",
            Self::Trivia => "trivia",
            Self::DailyLogin => "daily_login",
            Self::Spin => "spin",
            Self::AdWatch => "ad_watch",
            Self::ReferralBonus => "referral_bonus",
            Self::AmbassadorCommission => "ambassador_commission",
            Self::StoreRedemption => "store_redemption",
            Self::AdminAdjustment => "admin_adjustment",
        }
    }
}

/// 举报对象类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum ReportTarget {
    Poll,
    Comment,
    Profile,
}

/// 举报状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Open,
    Resolved,
    Dismissed,
}

/// 审核动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum ModerationActionType {
    /// 驳回举报，不做处理
    Dismiss,
    /// 隐藏投票或评论
    HideContent,
    /// 警告内容作者
    Warn,
    /// 封禁内容作者
    BanUser,
    /// 解除封禁
    UnbanUser,
}

impl ModerationActionType {
    /// 执行该动作后举报的状态
    pub fn resulting_status(&self) -> ReportStatus {
        match self {
            Self::Dismiss => ReportStatus::Dismissed,
            _ => ReportStatus::Resolved,
        }
    }
}

/// 商城兑换状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum RedemptionStatus {
    #[default]
    Completed,
    Fulfilled,
    Refunded,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Fulfilled => "fulfilled",
            Self::Refunded => "refunded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_json_format() {
        assert_eq!(
            serde_json::to_string(&PromotionStatus::PendingPayment).unwrap(),
            "\"PENDING_PAYMENT\""
        );
        assert_eq!(
            serde_json::to_string(&ModerationActionType::HideContent).unwrap(),
            "\"HIDE_CONTENT\""
        );
        let role: UserRole = serde_json::from_str("\"MODERATOR\"").unwrap();
        assert_eq!(role, UserRole::Moderator);
    }

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::Admin > UserRole::Moderator);
        assert!(UserRole::Moderator > UserRole::User);
        assert!(UserRole::Admin.is_moderator());
        assert!(!UserRole::User.is_moderator());
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_dismiss_leads_to_dismissed() {
        assert_eq!(
            ModerationActionType::Dismiss.resulting_status(),
            ReportStatus::Dismissed
        );
        assert_eq!(
            ModerationActionType::BanUser.resulting_status(),
            ReportStatus::Resolved
        );
    }

    #[test]
    fn test_promotion_can_cancel() {
        assert!(PromotionStatus::PendingPayment.can_cancel());
        assert!(PromotionStatus::Active.can_cancel());
        assert!(!PromotionStatus::Completed.can_cancel());
        assert!(!PromotionStatus::Cancelled.can_cancel());
    }
}
