//! 数据库仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，业务校验由服务层完成
//! - 积分变动统一通过 `ledger` 写入流水，与业务写入处于同一事务
//! - 唯一约束冲突映射为业务错误，作为并发重复请求的最终保障
//! - 定义 trait 接口以支持 mock 测试

mod ledger;
mod moderation_repo;
mod poll_repo;
mod profile_repo;
mod referral_repo;
mod reward_repo;
mod settings_repo;
mod sponsor_repo;
mod store_repo;
mod traits;
mod transaction_repo;
mod trivia_repo;

pub use ledger::{award_points_in_tx, map_unique_violation, spend_points_in_tx};
pub use moderation_repo::ModerationRepository;
pub use poll_repo::PollRepository;
pub use profile_repo::ProfileRepository;
pub use referral_repo::ReferralRepository;
pub use reward_repo::RewardRepository;
pub use settings_repo::SettingsRepository;
pub use sponsor_repo::SponsorRepository;
pub use store_repo::StoreRepository;
pub use traits::*;
pub use transaction_repo::TransactionRepository;
pub use trivia_repo::TriviaRepository;
