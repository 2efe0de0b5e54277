//! 应用状态定义
//!
//! 服务实例在启动时按具体仓储装配一次，handler 间通过 Arc 共享

use std::sync::Arc;

use pollpeak::scoring::ThreadRandom;
use pollpeak::{
    AmbassadorService, BadgeService, ModerationRepository, ModerationService, PollRepository,
    PollService, ProfileRepository, ProfileService, ReferralRepository, ReferralService,
    RewardRepository, RewardService, SettingsRepository, SettingsService, SponsorRepository,
    SponsorService, StoreRepository, StoreService, TransactionRepository, TransactionService,
    TriviaRepository, TriviaService,
};
use pollpeak_shared::cache::Cache;
use pollpeak_shared::config::{AppConfig, RewardSettings};
use sqlx::PgPool;

use crate::auth::{JwtConfig, JwtManager};

pub type Profiles = ProfileService<ProfileRepository>;
pub type Polls = PollService<PollRepository, ProfileRepository>;
pub type Trivia = TriviaService<TriviaRepository, ProfileRepository>;
pub type Rewards = RewardService<RewardRepository, ProfileRepository>;
pub type Badges = BadgeService<ProfileRepository>;
pub type Referrals = ReferralService<ReferralRepository, ProfileRepository>;
pub type Ambassadors = AmbassadorService<ReferralRepository, ProfileRepository>;
pub type Store = StoreService<StoreRepository, ProfileRepository>;
pub type Sponsors = SponsorService<SponsorRepository, PollRepository>;
pub type Moderation = ModerationService<ModerationRepository, PollRepository, ProfileRepository>;
pub type Transactions = TransactionService<TransactionRepository>;
pub type Settings = SettingsService<SettingsRepository>;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL 连接池（就绪探针使用）
    pub pool: PgPool,
    /// Redis 缓存客户端（排行榜、投票结果、限流计数）
    pub cache: Arc<Cache>,
    pub jwt_manager: Arc<JwtManager>,
    pub profiles: Arc<Profiles>,
    pub polls: Arc<Polls>,
    pub trivia: Arc<Trivia>,
    pub rewards: Arc<Rewards>,
    pub badges: Arc<Badges>,
    pub referrals: Arc<Referrals>,
    pub ambassadors: Arc<Ambassadors>,
    pub store: Arc<Store>,
    pub sponsors: Arc<Sponsors>,
    pub moderation: Arc<Moderation>,
    pub transactions: Arc<Transactions>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pool: PgPool, cache: Arc<Cache>, config: &AppConfig) -> Self {
        Self::with_parts(
            pool,
            cache,
            JwtConfig::from(&config.auth),
            config.rewards.clone(),
        )
    }

    pub fn with_parts(
        pool: PgPool,
        cache: Arc<Cache>,
        jwt_config: JwtConfig,
        rewards: RewardSettings,
    ) -> Self {
        let profile_repo = Arc::new(ProfileRepository::new(pool.clone()));
        let poll_repo = Arc::new(PollRepository::new(pool.clone()));
        let referral_repo = Arc::new(ReferralRepository::new(pool.clone()));

        Self {
            jwt_manager: Arc::new(JwtManager::new(jwt_config)),
            profiles: Arc::new(ProfileService::new(profile_repo.clone())),
            polls: Arc::new(PollService::new(
                poll_repo.clone(),
                profile_repo.clone(),
                rewards.clone(),
            )),
            trivia: Arc::new(TriviaService::new(
                Arc::new(TriviaRepository::new(pool.clone())),
                profile_repo.clone(),
            )),
            rewards: Arc::new(RewardService::new(
                Arc::new(RewardRepository::new(pool.clone())),
                profile_repo.clone(),
                rewards.clone(),
                Arc::new(ThreadRandom),
            )),
            badges: Arc::new(BadgeService::new(profile_repo.clone())),
            referrals: Arc::new(ReferralService::new(
                referral_repo.clone(),
                profile_repo.clone(),
                rewards,
            )),
            ambassadors: Arc::new(AmbassadorService::new(referral_repo, profile_repo.clone())),
            store: Arc::new(StoreService::new(
                Arc::new(StoreRepository::new(pool.clone())),
                profile_repo.clone(),
            )),
            sponsors: Arc::new(SponsorService::new(
                Arc::new(SponsorRepository::new(pool.clone())),
                poll_repo.clone(),
            )),
            moderation: Arc::new(ModerationService::new(
                Arc::new(ModerationRepository::new(pool.clone())),
                poll_repo,
                profile_repo,
            )),
            transactions: Arc::new(TransactionService::new(Arc::new(
                TransactionRepository::new(pool.clone()),
            ))),
            settings: Arc::new(SettingsService::new(Arc::new(SettingsRepository::new(
                pool.clone(),
            )))),
            pool,
            cache,
        }
    }
}
