//! 业务服务层
//!
//! 每个服务对仓储 trait 泛型化，便于使用 mock 仓储进行单元测试。
//! 积分发放与业务写入由仓储在同一事务内完成，徽章检查在提交后进行，
//! 失败不影响主流程。

pub mod ambassador_service;
pub mod badge_service;
pub mod dto;
pub mod moderation_service;
pub mod poll_service;
pub mod profile_service;
pub mod referral_service;
pub mod reward_service;
pub mod settings_service;
pub mod sponsor_service;
pub mod store_service;
pub mod transaction_service;
pub mod trivia_service;

pub use ambassador_service::AmbassadorService;
pub use badge_service::{BadgeService, award_new_badges, evaluate};
pub use dto::{
    Actor, AdWatchResult, AddQuestionInput, CreatePollInput, CreateTriviaGameInput,
    DailyClaimResult, DailyStatus, PollCreated, PollResultsView, PromotePollInput,
    QuestionResult, ReportInput, SpinResult, TriviaGameForPlay, TriviaResult, VoteOutcome,
};
pub use moderation_service::ModerationService;
pub use poll_service::PollService;
pub use profile_service::{ProfileService, generate_referral_code, validate_username};
pub use referral_service::{ReferralApplied, ReferralService};
pub use reward_service::RewardService;
pub use settings_service::SettingsService;
pub use sponsor_service::SponsorService;
pub use store_service::StoreService;
pub use transaction_service::TransactionService;
pub use trivia_service::TriviaService;
