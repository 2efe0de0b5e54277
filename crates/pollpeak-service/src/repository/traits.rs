//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试。
//! 涉及多表变更的方法（投票、签到、兑换等）在实现内部使用单个数据库事务。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AdWatch, AdminProfileUpdate, Ambassador, AmbassadorReview, AmbassadorStatus, AppSetting,
    ContentReport, DailyClaim, DailyRewardHistory, LeaderboardEntry, ModeratorAction, NewPoll,
    NewProfile, NewPromotion, NewReferral, NewReport, NewSponsor, NewStoreItem, NewTriviaGame,
    NewTriviaQuestion, NewTriviaSession, Pagination, PointTransaction, Poll, PollComment,
    PollFilter, PollStatus, Profile, ProfileCredentials, ProfileUpdate, PromotedPoll,
    PromotionStatus, ReferralOutcome, ReferralSummary, ReportStatus, ReportTarget, Resolution,
    SpinRecord, Sponsor, StoreItem, StoreItemUpdate, StoreRedemption, TriviaGame, TriviaQuestion,
    TriviaSession, UserDailyReward,
};

/// 用户档案仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepositoryTrait: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Profile>>;
    async fn get_credentials_by_email(&self, email: &str) -> Result<Option<ProfileCredentials>>;
    async fn get_credentials_by_id(&self, id: Uuid) -> Result<Option<ProfileCredentials>>;
    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>>;
    async fn get_by_referral_code(&self, code: &str) -> Result<Option<Profile>>;
    async fn create(&self, profile: &NewProfile) -> Result<Profile>;
    async fn update_public_fields(&self, id: Uuid, update: &ProfileUpdate) -> Result<Profile>;
    async fn admin_update(&self, id: Uuid, update: &AdminProfileUpdate) -> Result<Profile>;
    /// 追加未持有的徽章，返回追加后的完整列表
    async fn append_badges(&self, id: Uuid, names: &[String]) -> Result<Vec<String>>;
    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>>;
    async fn list(&self, page: Pagination) -> Result<(Vec<Profile>, i64)>;
}

/// 投票仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PollRepositoryTrait: Send + Sync {
    /// 创建投票并发放创建积分
    async fn create(&self, poll: &NewPoll, creation_points: i32) -> Result<Poll>;
    async fn get(&self, id: i64) -> Result<Option<Poll>>;
    async fn list(&self, filter: &PollFilter, page: Pagination) -> Result<(Vec<Poll>, i64)>;
    async fn has_voted(&self, poll_id: i64, user_id: Uuid) -> Result<bool>;
    /// 写入投票、累加选项计数、用户投票数并发放积分
    async fn record_vote(
        &self,
        poll_id: i64,
        user_id: Uuid,
        option_index: i32,
        points: i32,
    ) -> Result<Poll>;
    async fn set_status(&self, id: i64, status: PollStatus) -> Result<Poll>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn add_comment(
        &self,
        poll_id: i64,
        user_id: Uuid,
        content: &str,
        points: i32,
    ) -> Result<PollComment>;
    async fn list_comments(&self, poll_id: i64, include_hidden: bool) -> Result<Vec<PollComment>>;
    async fn get_comment(&self, id: i64) -> Result<Option<PollComment>>;
    async fn delete_comment(&self, id: i64) -> Result<bool>;
    /// 关闭所有已到期的进行中投票，返回关闭数量
    async fn close_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// 问答仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TriviaRepositoryTrait: Send + Sync {
    async fn list_games(&self, active_only: bool) -> Result<Vec<TriviaGame>>;
    async fn get_game(&self, id: i64) -> Result<Option<TriviaGame>>;
    async fn list_questions(&self, game_id: i64) -> Result<Vec<TriviaQuestion>>;
    async fn create_game(&self, game: &NewTriviaGame) -> Result<TriviaGame>;
    async fn add_question(&self, question: &NewTriviaQuestion) -> Result<TriviaQuestion>;
    async fn set_game_active(&self, id: i64, active: bool) -> Result<TriviaGame>;
    async fn has_completed(&self, game_id: i64, user_id: Uuid) -> Result<bool>;
    /// 写入完成记录、累加游戏次数并发放积分
    async fn record_session(&self, session: &NewTriviaSession) -> Result<TriviaSession>;
}

/// 每日奖励仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepositoryTrait: Send + Sync {
    async fn get_state(&self, user_id: Uuid) -> Result<Option<UserDailyReward>>;
    async fn apply_daily_claim(&self, claim: &DailyClaim) -> Result<UserDailyReward>;
    async fn apply_spin(&self, spin: &SpinRecord) -> Result<UserDailyReward>;
    async fn apply_ad_watch(&self, ad: &AdWatch) -> Result<UserDailyReward>;
    async fn history(&self, user_id: Uuid, limit: i64) -> Result<Vec<DailyRewardHistory>>;
}

/// 邀请与大使仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferralRepositoryTrait: Send + Sync {
    /// 写入邀请关系、发放双方奖励并结算大使佣金
    async fn record_referral(&self, referral: &NewReferral) -> Result<ReferralOutcome>;
    async fn list_by_referrer(&self, referrer_id: Uuid, limit: i64)
    -> Result<Vec<ReferralSummary>>;

    async fn get_ambassador_by_user(&self, user_id: Uuid) -> Result<Option<Ambassador>>;
    async fn get_ambassador(&self, id: i64) -> Result<Option<Ambassador>>;
    async fn create_ambassador(&self, user_id: Uuid, motivation: Option<String>)
    -> Result<Ambassador>;
    async fn list_ambassadors(&self, status: Option<AmbassadorStatus>) -> Result<Vec<Ambassador>>;
    async fn review_ambassador(&self, id: i64, review: &AmbassadorReview) -> Result<Ambassador>;
}

/// 赞助推广仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SponsorRepositoryTrait: Send + Sync {
    async fn create_sponsor(&self, sponsor: &NewSponsor) -> Result<Sponsor>;
    async fn list_sponsors(&self) -> Result<Vec<Sponsor>>;
    async fn get_sponsor(&self, id: i64) -> Result<Option<Sponsor>>;
    async fn create_promotion(&self, promotion: &NewPromotion) -> Result<PromotedPoll>;
    async fn list_promotions(&self, status: Option<PromotionStatus>) -> Result<Vec<PromotedPoll>>;
    async fn get_promotion(&self, id: i64) -> Result<Option<PromotedPoll>>;
    /// 待付款 -> 进行中，已到开始时间时同时标记投票为推广
    async fn confirm_payment(&self, id: i64, reference: &str) -> Result<PromotedPoll>;
    async fn cancel_promotion(&self, id: i64) -> Result<PromotedPoll>;
    /// 为已到开始时间的 Active 推广标记投票，返回新标记的投票数量
    async fn start_due(&self, now: DateTime<Utc>) -> Result<u64>;
    /// 结束所有已到期的推广，返回结束数量
    async fn complete_ended(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// 内容审核仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModerationRepositoryTrait: Send + Sync {
    async fn create_report(&self, report: &NewReport) -> Result<ContentReport>;
    async fn has_open_report(
        &self,
        reporter_id: Uuid,
        target_type: ReportTarget,
        target_id: &str,
    ) -> Result<bool>;
    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: Pagination,
    ) -> Result<(Vec<ContentReport>, i64)>;
    async fn get_report(&self, id: i64) -> Result<Option<ContentReport>>;
    /// 更新举报状态、执行处理效果并记录审核动作
    async fn resolve(&self, resolution: &Resolution) -> Result<ModeratorAction>;
    async fn list_actions(&self, limit: i64) -> Result<Vec<ModeratorAction>>;
}

/// 积分商城仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreRepositoryTrait: Send + Sync {
    async fn list_items(&self, active_only: bool) -> Result<Vec<StoreItem>>;
    async fn get_item(&self, id: i64) -> Result<Option<StoreItem>>;
    async fn create_item(&self, item: &NewStoreItem) -> Result<StoreItem>;
    async fn update_item(&self, id: i64, update: &StoreItemUpdate) -> Result<StoreItem>;
    /// 扣减库存与积分并写入兑换记录
    async fn redeem(&self, user_id: Uuid, item_id: i64) -> Result<StoreRedemption>;
    async fn list_redemptions(&self, user_id: Uuid, limit: i64) -> Result<Vec<StoreRedemption>>;
}

/// 积分流水仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<(Vec<PointTransaction>, i64)>;
}

/// 系统设置仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    async fn list(&self, public_only: bool) -> Result<Vec<AppSetting>>;
    async fn get(&self, key: &str) -> Result<Option<AppSetting>>;
    async fn upsert(
        &self,
        key: &str,
        value: &serde_json::Value,
        is_public: bool,
        updated_by: Uuid,
    ) -> Result<AppSetting>;
    async fn delete(&self, key: &str) -> Result<bool>;
}
