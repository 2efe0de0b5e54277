//! 每日奖励仓储
//!
//! 签到、转盘、广告三种奖励共用 `user_daily_rewards` 一行状态。
//! 每个写入都以 upsert 的 WHERE 条件作为当日唯一性的最终保障，
//! 条件不满足时不返回行，映射为对应的业务错误。

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::ledger::award_points_in_tx;
use super::traits::RewardRepositoryTrait;
use crate::error::{Result, ServiceError};
use crate::models::{
    AdWatch, DailyClaim, DailyRewardHistory, PointSource, RewardType, SpinRecord, UserDailyReward,
};
use crate::scoring::SpinBand;

const STATE_COLUMNS: &str = r#"
    user_id, last_claim_date, last_spin_date, ads_watched_date, ads_watched_today,
    current_streak, total_spins, updated_at
"#;

pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中写入奖励历史
    pub async fn insert_history_in_tx(
        conn: &mut PgConnection,
        user_id: Uuid,
        reward_type: RewardType,
        band: Option<SpinBand>,
        points: i32,
        multiplier: f64,
        streak: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_reward_history (user_id, reward_type, band, points, multiplier, streak)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(reward_type)
        .bind(band)
        .bind(points)
        .bind(multiplier)
        .bind(streak)
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RewardRepositoryTrait for RewardRepository {
    async fn get_state(&self, user_id: Uuid) -> Result<Option<UserDailyReward>> {
        let sql = format!(
            "SELECT {} FROM user_daily_rewards WHERE user_id = $1",
            STATE_COLUMNS
        );
        let state = sqlx::query_as::<_, UserDailyReward>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(state)
    }

    async fn apply_daily_claim(&self, claim: &DailyClaim) -> Result<UserDailyReward> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO user_daily_rewards (user_id, last_claim_date, current_streak)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET last_claim_date = EXCLUDED.last_claim_date,
                current_streak = EXCLUDED.current_streak,
                updated_at = NOW()
            WHERE user_daily_rewards.last_claim_date IS NULL
               OR user_daily_rewards.last_claim_date < EXCLUDED.last_claim_date
            RETURNING {}
            "#,
            STATE_COLUMNS
        );
        let state = sqlx::query_as::<_, UserDailyReward>(&sql)
            .bind(claim.user_id)
            .bind(claim.today)
            .bind(claim.new_streak)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::DailyRewardAlreadyClaimed)?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET current_streak = $2,
                longest_streak = GREATEST(longest_streak, $2),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(claim.user_id)
        .bind(claim.new_streak)
        .execute(&mut *tx)
        .await?;

        Self::insert_history_in_tx(
            &mut tx,
            claim.user_id,
            RewardType::DailyLogin,
            None,
            claim.points,
            claim.multiplier,
            claim.new_streak,
        )
        .await?;

        let reference = format!("daily:{}", claim.today);
        award_points_in_tx(
            &mut tx,
            claim.user_id,
            claim.points,
            PointSource::DailyLogin,
            Some(&reference),
        )
        .await?;

        tx.commit().await?;
        Ok(state)
    }

    async fn apply_spin(&self, spin: &SpinRecord) -> Result<UserDailyReward> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO user_daily_rewards (user_id, last_spin_date, total_spins)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id) DO UPDATE
            SET last_spin_date = EXCLUDED.last_spin_date,
                total_spins = user_daily_rewards.total_spins + 1,
                updated_at = NOW()
            WHERE user_daily_rewards.last_spin_date IS NULL
               OR user_daily_rewards.last_spin_date < EXCLUDED.last_spin_date
            RETURNING {}
            "#,
            STATE_COLUMNS
        );
        let state = sqlx::query_as::<_, UserDailyReward>(&sql)
            .bind(spin.user_id)
            .bind(spin.today)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::SpinAlreadyUsed)?;

        Self::insert_history_in_tx(
            &mut tx,
            spin.user_id,
            RewardType::Spin,
            Some(spin.band),
            spin.points,
            spin.multiplier,
            spin.streak,
        )
        .await?;

        let reference = format!("spin:{}:{}", spin.today, spin.band.as_str());
        award_points_in_tx(
            &mut tx,
            spin.user_id,
            spin.points,
            PointSource::Spin,
            Some(&reference),
        )
        .await?;

        tx.commit().await?;
        Ok(state)
    }

    async fn apply_ad_watch(&self, ad: &AdWatch) -> Result<UserDailyReward> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO user_daily_rewards (user_id, ads_watched_date, ads_watched_today)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id) DO UPDATE
            SET ads_watched_today = CASE
                    WHEN user_daily_rewards.ads_watched_date = EXCLUDED.ads_watched_date
                    THEN user_daily_rewards.ads_watched_today + 1
                    ELSE 1
                END,
                ads_watched_date = EXCLUDED.ads_watched_date,
                updated_at = NOW()
            WHERE user_daily_rewards.ads_watched_date IS DISTINCT FROM EXCLUDED.ads_watched_date
               OR user_daily_rewards.ads_watched_today < $3
            RETURNING {}
            "#,
            STATE_COLUMNS
        );
        let state = sqlx::query_as::<_, UserDailyReward>(&sql)
            .bind(ad.user_id)
            .bind(ad.today)
            .bind(ad.max_per_day)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::AdLimitReached(ad.max_per_day))?;

        Self::insert_history_in_tx(
            &mut tx,
            ad.user_id,
            RewardType::AdWatch,
            None,
            ad.points,
            1.0,
            0,
        )
        .await?;

        let reference = format!("ad:{}:{}", ad.today, state.ads_watched_today);
        award_points_in_tx(
            &mut tx,
            ad.user_id,
            ad.points,
            PointSource::AdWatch,
            Some(&reference),
        )
        .await?;

        tx.commit().await?;
        Ok(state)
    }

    async fn history(&self, user_id: Uuid, limit: i64) -> Result<Vec<DailyRewardHistory>> {
        let rows = sqlx::query_as::<_, DailyRewardHistory>(
            r#"
            SELECT id, user_id, reward_type, band, points, multiplier, streak, created_at
            FROM daily_reward_history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
