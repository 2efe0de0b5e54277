//! 领域模型
//!
//! 包含平台所有核心实体定义

pub mod badge;
pub mod enums;
pub mod moderation;
pub mod poll;
pub mod profile;
pub mod referral;
pub mod reward;
pub mod settings;
pub mod sponsor;
pub mod store;
pub mod transaction;
pub mod trivia;

pub use badge::{BADGE_CATALOGUE, BadgeDefinition, BadgeMetric, UserBadgeView};
pub use enums::{
    AmbassadorStatus, ModerationActionType, PointSource, PollStatus, PromotionStatus,
    RedemptionStatus, ReportStatus, ReportTarget, RewardType, TransactionKind, UserRole,
};
pub use moderation::{ContentReport, ModeratorAction, NewReport, Resolution};
pub use poll::{
    NewPoll, OptionResult, Poll, PollComment, PollFilter, PollResults, PollVote,
};
pub use profile::{
    AdminProfileUpdate, LeaderboardEntry, NewProfile, Profile, ProfileCredentials, ProfileUpdate,
    PublicProfile,
};
pub use referral::{
    Ambassador, AmbassadorDashboard, AmbassadorReview, NewReferral, Referral, ReferralOutcome,
    ReferralSummary,
};
pub use reward::{AdWatch, DailyClaim, DailyRewardHistory, SpinRecord, UserDailyReward};
pub use settings::AppSetting;
pub use sponsor::{NewPromotion, NewSponsor, PromotedPoll, Sponsor};
pub use store::{NewStoreItem, StoreItem, StoreItemUpdate, StoreRedemption};
pub use transaction::PointTransaction;
pub use trivia::{
    NewTriviaGame, NewTriviaQuestion, NewTriviaSession, PlayableQuestion, TriviaGame,
    TriviaQuestion, TriviaSession,
};

use serde::{Deserialize, Serialize};

/// 允许请求的最大页码
pub const MAX_PAGE: i64 = 10_000;

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// 数据库查询的 offset，页码先收敛到 1..=MAX_PAGE
    pub fn offset(&self) -> i64 {
        (self.page.clamp(1, MAX_PAGE) - 1).saturating_mul(self.limit())
    }

    /// 每页条数（1-100）
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_bounds() {
        let p = Pagination::new(3, 20);
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);

        let p = Pagination::new(0, 1000);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 100);
    }

    #[test]
    fn test_pagination_offset_never_overflows() {
        let p = Pagination::new(i64::MAX, 100);
        assert_eq!(p.offset(), (MAX_PAGE - 1) * 100);

        let p = Pagination::new(i64::MIN, i64::MAX);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 100);
    }
}
