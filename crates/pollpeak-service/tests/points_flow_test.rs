//! 积分流程集成测试
//!
//! 使用真实 PostgreSQL 验证仓储事务：投票、签到、转盘、邀请、兑换都会写入积分流水，
//! 并且唯一约束能拒绝重复请求。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p pollpeak-service --test points_flow_test -- --ignored
//! ```

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use fake::Fake;
use fake::faker::name::en::Name;
use pollpeak::scoring::{AmbassadorTier, RandomSource, SpinBand};
use pollpeak::{
    AmbassadorService, AmbassadorStatus, CreatePollInput, NewSponsor, NewStoreItem, Pagination,
    PointSource, PollRepository, PollService, ProfileRepository, ProfileService,
    PromotePollInput, ReferralRepository, ReferralService, RewardRepository, RewardService,
    ServiceError, SponsorRepository, SponsorService, StoreRepository, StoreService,
    TransactionRepository, TransactionService,
};
use pollpeak_shared::config::{DatabaseConfig, RewardSettings};
use pollpeak_shared::database::Database;
use pollpeak_shared::test_utils::{test_database_config, test_email, test_username};
use sqlx::PgPool;
use uuid::Uuid;

// ==================== 辅助函数 ====================

struct FixedRoll(f64);

impl RandomSource for FixedRoll {
    fn roll(&self) -> f64 {
        self.0
    }
}

async fn setup_pool() -> PgPool {
    let config = match std::env::var("DATABASE_URL") {
        Ok(url) => DatabaseConfig {
            url,
            ..test_database_config()
        },
        Err(_) => test_database_config(),
    };
    let db = Database::connect(&config)
        .await
        .expect("数据库连接失败");
    db.run_migrations().await.expect("迁移执行失败");
    db.pool().clone()
}

async fn register(pool: &PgPool) -> pollpeak::Profile {
    let service = ProfileService::new(Arc::new(ProfileRepository::new(pool.clone())));
    let display_name: String = Name().fake();
    service
        .register(
            &test_email(),
            &test_username(),
            "$2b$04$integration.test.hash.placeholder.value".to_string(),
            Some(display_name),
        )
        .await
        .expect("注册失败")
}

async fn points_of(pool: &PgPool, user_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT points FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("查询积分失败")
}

// ==================== 测试用例 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_vote_awards_points_once() {
    let pool = setup_pool().await;
    let creator = register(&pool).await;
    let voter = register(&pool).await;

    let polls = PollService::new(
        Arc::new(PollRepository::new(pool.clone())),
        Arc::new(ProfileRepository::new(pool.clone())),
        RewardSettings::default(),
    );
    let created = polls
        .create_poll(
            creator.id,
            CreatePollInput {
                title: "Integration poll".to_string(),
                options: vec!["Red".to_string(), "Blue".to_string()],
                expires_at: Some(Utc::now() + Duration::days(1)),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(created.new_badges.contains(&"Poll Creator".to_string()));

    let outcome = polls
        .vote_on_poll(voter.id, created.poll.id, 1, Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome.poll.vote_counts, vec![0, 1]);
    assert_eq!(outcome.points_awarded, 5);
    assert!(outcome.new_badges.contains(&"First Vote".to_string()));
    assert_eq!(points_of(&pool, voter.id).await, 5);

    let err = polls
        .vote_on_poll(voter.id, created.poll.id, 0, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyVoted(_)));
    assert_eq!(points_of(&pool, voter.id).await, 5);

    let history = TransactionService::new(Arc::new(TransactionRepository::new(pool.clone())));
    let (items, total) = history
        .history(voter.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].source, PointSource::Vote);
    assert_eq!(items[0].balance_after, 5);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_daily_claim_and_spin() {
    let pool = setup_pool().await;
    let user = register(&pool).await;

    let rewards = RewardService::new(
        Arc::new(RewardRepository::new(pool.clone())),
        Arc::new(ProfileRepository::new(pool.clone())),
        RewardSettings::default(),
        Arc::new(FixedRoll(99.5)),
    );
    let day1 = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
    let day2 = day1.succ_opt().unwrap();

    let first = rewards.claim_daily_reward(user.id, day1).await.unwrap();
    assert_eq!(first.streak, 1);
    assert_eq!(first.points_awarded, 11);

    let again = rewards.claim_daily_reward(user.id, day1).await.unwrap_err();
    assert!(matches!(again, ServiceError::DailyRewardAlreadyClaimed));

    let second = rewards.claim_daily_reward(user.id, day2).await.unwrap();
    assert_eq!(second.streak, 2);
    assert_eq!(second.points_awarded, 12);

    let spin = rewards.perform_spin(user.id, day2).await.unwrap();
    assert_eq!(spin.band, SpinBand::Jackpot);
    assert_eq!(spin.points_awarded, 600);
    assert!(matches!(
        rewards.perform_spin(user.id, day2).await,
        Err(ServiceError::SpinAlreadyUsed)
    ));

    assert_eq!(points_of(&pool, user.id).await, 11 + 12 + 600);
    let history = rewards.reward_history(user.id, 10).await.unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_referral_and_redemption() {
    let pool = setup_pool().await;
    let referrer = register(&pool).await;
    let referee = register(&pool).await;

    let referrals = ReferralService::new(
        Arc::new(ReferralRepository::new(pool.clone())),
        Arc::new(ProfileRepository::new(pool.clone())),
        RewardSettings::default(),
    );
    let applied = referrals
        .apply_referral(referee.id, &referrer.referral_code.to_lowercase())
        .await
        .unwrap();
    assert_eq!(applied.referrer_id, referrer.id);
    assert!(matches!(
        referrals
            .apply_referral(referee.id, &referrer.referral_code)
            .await,
        Err(ServiceError::AlreadyReferred)
    ));
    assert_eq!(points_of(&pool, referrer.id).await, 100);
    assert_eq!(points_of(&pool, referee.id).await, 50);

    let store = StoreService::new(
        Arc::new(StoreRepository::new(pool.clone())),
        Arc::new(ProfileRepository::new(pool.clone())),
    );
    let item = store
        .create_item(NewStoreItem {
            name: format!("Mug {}", Uuid::new_v4().simple()),
            description: None,
            cost_points: 40,
            stock: Some(1),
        })
        .await
        .unwrap();

    store.redeem(referee.id, item.id).await.unwrap();
    assert_eq!(points_of(&pool, referee.id).await, 10);

    let err = store.redeem(referrer.id, item.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::OutOfStock(_)));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_approved_ambassador_earns_commission_on_tier_upgrade() {
    let pool = setup_pool().await;
    let admin = register(&pool).await;
    let ambassador_user = register(&pool).await;
    let referee = register(&pool).await;

    // 已有 9 位邀请，批准时为 Bronze
    sqlx::query("UPDATE profiles SET referral_count = 9 WHERE id = $1")
        .bind(ambassador_user.id)
        .execute(&pool)
        .await
        .unwrap();

    let referral_repo = Arc::new(ReferralRepository::new(pool.clone()));
    let profile_repo = Arc::new(ProfileRepository::new(pool.clone()));
    let ambassadors = AmbassadorService::new(referral_repo.clone(), profile_repo.clone());
    let applied = ambassadors
        .apply(ambassador_user.id, Some("I run a poll club".to_string()))
        .await
        .unwrap();
    let approved = ambassadors.approve(admin.id, applied.id).await.unwrap();
    assert_eq!(approved.status, AmbassadorStatus::Approved);
    assert_eq!(approved.tier, AmbassadorTier::Bronze);

    // 第 10 位邀请升级为 Silver，佣金为被邀请人奖励 50 的 10%
    let referrals = ReferralService::new(referral_repo, profile_repo, RewardSettings::default());
    referrals
        .apply_referral(referee.id, &ambassador_user.referral_code)
        .await
        .unwrap();

    let (tier, total_commission): (String, i32) =
        sqlx::query_as("SELECT tier, total_commission FROM ambassadors WHERE id = $1")
            .bind(applied.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(tier, "silver");
    assert_eq!(total_commission, 5);

    let commission_rows: Vec<(i32, String)> = sqlx::query_as(
        "SELECT amount, reference FROM transactions WHERE user_id = $1 AND source = 'ambassador_commission'",
    )
    .bind(ambassador_user.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(commission_rows.len(), 1);
    assert_eq!(commission_rows[0].0, 5);
    assert!(commission_rows[0].1.starts_with("referral:"));

    assert_eq!(points_of(&pool, ambassador_user.id).await, 100 + 5);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_future_promotion_takes_effect_at_start() {
    let pool = setup_pool().await;
    let creator = register(&pool).await;
    let now = Utc::now();

    let poll_repo = Arc::new(PollRepository::new(pool.clone()));
    let polls = PollService::new(
        poll_repo.clone(),
        Arc::new(ProfileRepository::new(pool.clone())),
        RewardSettings::default(),
    );
    let poll = polls
        .create_poll(
            creator.id,
            CreatePollInput {
                title: "Sponsored poll".to_string(),
                options: vec!["Yes".to_string(), "No".to_string()],
                expires_at: Some(now + Duration::days(30)),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap()
        .poll;

    let sponsors = SponsorService::new(Arc::new(SponsorRepository::new(pool.clone())), poll_repo);
    let sponsor = sponsors
        .create_sponsor(NewSponsor {
            name: format!("Acme {}", Uuid::new_v4().simple()),
            contact_email: test_email(),
            website: None,
        })
        .await
        .unwrap();
    let starts_at = now + Duration::hours(2);
    let promotion = sponsors
        .promote_poll(
            PromotePollInput {
                poll_id: poll.id,
                sponsor_id: sponsor.id,
                budget_cents: 5000,
                starts_at,
                ends_at: starts_at + Duration::days(7),
            },
            now,
        )
        .await
        .unwrap();
    sponsors
        .confirm_payment(promotion.id, "INV-2026-001")
        .await
        .unwrap();

    let is_promoted = |pool: PgPool, id: i64| async move {
        sqlx::query_scalar::<_, bool>("SELECT is_promoted FROM polls WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap()
    };
    assert!(!is_promoted(pool.clone(), poll.id).await);

    assert_eq!(sponsors.start_due_promotions(now).await.unwrap(), 0);
    let started = sponsors
        .start_due_promotions(starts_at + Duration::seconds(1))
        .await
        .unwrap();
    assert!(started >= 1);
    assert!(is_promoted(pool.clone(), poll.id).await);
}
