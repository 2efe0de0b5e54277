//! 邀请与大使仓储

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::ledger::{award_points_in_tx, map_unique_violation};
use super::traits::ReferralRepositoryTrait;
use crate::error::{Result, ServiceError};
use crate::models::{
    Ambassador, AmbassadorReview, AmbassadorStatus, NewReferral, PointSource, Referral,
    ReferralOutcome, ReferralSummary,
};
use crate::scoring::AmbassadorTier;

const AMBASSADOR_COLUMNS: &str = r#"
    id, user_id, status, tier, commission_rate, total_commission, motivation,
    approved_by, approved_at, created_at
"#;

pub struct ReferralRepository {
    pool: PgPool,
}

impl ReferralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferralRepositoryTrait for ReferralRepository {
    async fn record_referral(&self, referral: &NewReferral) -> Result<ReferralOutcome> {
        let mut tx = self.pool.begin().await?;

        let bound = sqlx::query(
            r#"
            UPDATE profiles SET referred_by = $2, updated_at = NOW()
            WHERE id = $1 AND referred_by IS NULL
            "#,
        )
        .bind(referral.referee_id)
        .bind(referral.referrer_id)
        .execute(&mut *tx)
        .await?;
        if bound.rows_affected() == 0 {
            return Err(ServiceError::AlreadyReferred);
        }

        let created = sqlx::query_as::<_, Referral>(
            r#"
            INSERT INTO referrals (referrer_id, referee_id, referrer_points, referee_points)
            VALUES ($1, $2, $3, $4)
            RETURNING id, referrer_id, referee_id, referrer_points, referee_points, created_at
            "#,
        )
        .bind(referral.referrer_id)
        .bind(referral.referee_id)
        .bind(referral.referrer_points)
        .bind(referral.referee_points)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, "referrals_referee_id_key", || ServiceError::AlreadyReferred)
        })?;

        let referral_count: i32 = sqlx::query(
            r#"
            UPDATE profiles SET referral_count = referral_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING referral_count
            "#,
        )
        .bind(referral.referrer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::ProfileNotFound(referral.referrer_id))?
        .get("referral_count");

        let reference = format!("referral:{}", created.id);
        award_points_in_tx(
            &mut tx,
            referral.referrer_id,
            referral.referrer_points,
            PointSource::ReferralBonus,
            Some(&reference),
        )
        .await?;
        award_points_in_tx(
            &mut tx,
            referral.referee_id,
            referral.referee_points,
            PointSource::ReferralBonus,
            Some(&reference),
        )
        .await?;

        // 已批准的大使按新的邀请人数重算等级，并以被邀请人奖励为基数结算佣金
        let ambassador_id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM ambassadors WHERE user_id = $1 AND status = 'approved' FOR UPDATE",
        )
        .bind(referral.referrer_id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut commission = 0;
        if let Some(ambassador_id) = ambassador_id {
            let tier = AmbassadorTier::from_referrals(referral_count);
            commission = tier.commission_for(referral.referee_points);

            sqlx::query(
                r#"
                UPDATE ambassadors
                SET tier = $2, commission_rate = $3, total_commission = total_commission + $4
                WHERE id = $1
                "#,
            )
            .bind(ambassador_id)
            .bind(tier)
            .bind(tier.commission_rate())
            .bind(commission)
            .execute(&mut *tx)
            .await?;

            award_points_in_tx(
                &mut tx,
                referral.referrer_id,
                commission,
                PointSource::AmbassadorCommission,
                Some(&reference),
            )
            .await?;
        }

        tx.commit().await?;

        Ok(ReferralOutcome {
            referral: created,
            commission,
            referrer_referral_count: referral_count,
        })
    }

    async fn list_by_referrer(
        &self,
        referrer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ReferralSummary>> {
        let rows = sqlx::query_as::<_, ReferralSummary>(
            r#"
            SELECT r.referee_id, p.username AS referee_username, r.referrer_points, r.created_at
            FROM referrals r
            JOIN profiles p ON p.id = r.referee_id
            WHERE r.referrer_id = $1
            ORDER BY r.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(referrer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_ambassador_by_user(&self, user_id: Uuid) -> Result<Option<Ambassador>> {
        let sql = format!(
            "SELECT {} FROM ambassadors WHERE user_id = $1",
            AMBASSADOR_COLUMNS
        );
        let row = sqlx::query_as::<_, Ambassador>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_ambassador(&self, id: i64) -> Result<Option<Ambassador>> {
        let sql = format!("SELECT {} FROM ambassadors WHERE id = $1", AMBASSADOR_COLUMNS);
        let row = sqlx::query_as::<_, Ambassador>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_ambassador(
        &self,
        user_id: Uuid,
        motivation: Option<String>,
    ) -> Result<Ambassador> {
        let sql = format!(
            "INSERT INTO ambassadors (user_id, motivation) VALUES ($1, $2) RETURNING {}",
            AMBASSADOR_COLUMNS
        );
        sqlx::query_as::<_, Ambassador>(&sql)
            .bind(user_id)
            .bind(motivation)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, "ambassadors_user_id_key", || {
                    ServiceError::AmbassadorApplicationExists
                })
            })
    }

    async fn list_ambassadors(&self, status: Option<AmbassadorStatus>) -> Result<Vec<Ambassador>> {
        let sql = format!(
            r#"
            SELECT {} FROM ambassadors
            WHERE ($1::varchar IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
            AMBASSADOR_COLUMNS
        );
        let rows = sqlx::query_as::<_, Ambassador>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn review_ambassador(&self, id: i64, review: &AmbassadorReview) -> Result<Ambassador> {
        // 只有待审核的申请可以被审核
        let sql = format!(
            r#"
            UPDATE ambassadors
            SET status = $2, tier = $3, commission_rate = $4,
                approved_by = $5, approved_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            AMBASSADOR_COLUMNS
        );
        let updated = sqlx::query_as::<_, Ambassador>(&sql)
            .bind(id)
            .bind(review.status)
            .bind(review.tier)
            .bind(review.commission_rate)
            .bind(review.reviewer)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(ambassador) => Ok(ambassador),
            None => match self.get_ambassador(id).await? {
                Some(existing) => Err(ServiceError::InvalidAmbassadorStatus(
                    existing.status.as_str().to_string(),
                )),
                None => Err(ServiceError::AmbassadorNotFound),
            },
        }
    }
}
