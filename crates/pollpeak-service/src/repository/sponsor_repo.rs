//! 赞助推广仓储
//!
//! 投票的 `is_promoted` 标记跟随推广状态：存在已到开始时间的 Active 推广时置位，
//! 否则清除。开始时间在未来的推广由定时任务在到点后置位。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::traits::SponsorRepositoryTrait;
use crate::error::{Result, ServiceError};
use crate::models::{NewPromotion, NewSponsor, PromotedPoll, PromotionStatus, Sponsor};

const PROMOTION_COLUMNS: &str = r#"
    id, poll_id, sponsor_id, budget_cents, status, payment_reference, starts_at, ends_at, created_at
"#;

pub struct SponsorRepository {
    pool: PgPool,
}

impl SponsorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按 now 时刻生效中的 Active 推广重算投票的推广标记
    async fn refresh_promoted_flag_in_tx(
        conn: &mut PgConnection,
        poll_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<()> {
        if poll_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r#"
            UPDATE polls p
            SET is_promoted = EXISTS(
                    SELECT 1 FROM promoted_polls pp
                    WHERE pp.poll_id = p.id AND pp.status = 'active'
                      AND pp.starts_at <= $2 AND pp.ends_at > $2
                ),
                updated_at = NOW()
            WHERE p.id = ANY($1)
            "#,
        )
        .bind(poll_ids)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn status_error(&self, id: i64) -> ServiceError {
        match self.get_promotion(id).await {
            Ok(Some(existing)) => ServiceError::InvalidPromotionStatus {
                id,
                status: existing.status.as_str().to_string(),
            },
            Ok(None) => ServiceError::PromotionNotFound(id),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl SponsorRepositoryTrait for SponsorRepository {
    async fn create_sponsor(&self, sponsor: &NewSponsor) -> Result<Sponsor> {
        let created = sqlx::query_as::<_, Sponsor>(
            r#"
            INSERT INTO sponsors (name, contact_email, website)
            VALUES ($1, $2, $3)
            RETURNING id, name, contact_email, website, is_active, created_at
            "#,
        )
        .bind(&sponsor.name)
        .bind(&sponsor.contact_email)
        .bind(&sponsor.website)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list_sponsors(&self) -> Result<Vec<Sponsor>> {
        let rows = sqlx::query_as::<_, Sponsor>(
            r#"
            SELECT id, name, contact_email, website, is_active, created_at
            FROM sponsors
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_sponsor(&self, id: i64) -> Result<Option<Sponsor>> {
        let row = sqlx::query_as::<_, Sponsor>(
            "SELECT id, name, contact_email, website, is_active, created_at FROM sponsors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_promotion(&self, promotion: &NewPromotion) -> Result<PromotedPoll> {
        let sql = format!(
            r#"
            INSERT INTO promoted_polls (poll_id, sponsor_id, budget_cents, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PROMOTION_COLUMNS
        );
        let created = sqlx::query_as::<_, PromotedPoll>(&sql)
            .bind(promotion.poll_id)
            .bind(promotion.sponsor_id)
            .bind(promotion.budget_cents)
            .bind(promotion.starts_at)
            .bind(promotion.ends_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list_promotions(&self, status: Option<PromotionStatus>) -> Result<Vec<PromotedPoll>> {
        let sql = format!(
            r#"
            SELECT {} FROM promoted_polls
            WHERE ($1::varchar IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
            PROMOTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, PromotedPoll>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_promotion(&self, id: i64) -> Result<Option<PromotedPoll>> {
        let sql = format!("SELECT {} FROM promoted_polls WHERE id = $1", PROMOTION_COLUMNS);
        let row = sqlx::query_as::<_, PromotedPoll>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn confirm_payment(&self, id: i64, reference: &str) -> Result<PromotedPoll> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE promoted_polls
            SET status = 'active', payment_reference = $2
            WHERE id = $1 AND status = 'pending_payment'
            RETURNING {}
            "#,
            PROMOTION_COLUMNS
        );
        let updated = sqlx::query_as::<_, PromotedPoll>(&sql)
            .bind(id)
            .bind(reference)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(promotion) = updated else {
            drop(tx);
            return Err(self.status_error(id).await);
        };

        Self::refresh_promoted_flag_in_tx(&mut tx, &[promotion.poll_id], Utc::now()).await?;

        tx.commit().await?;
        Ok(promotion)
    }

    async fn cancel_promotion(&self, id: i64) -> Result<PromotedPoll> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE promoted_polls
            SET status = 'cancelled'
            WHERE id = $1 AND status IN ('pending_payment', 'active')
            RETURNING {}
            "#,
            PROMOTION_COLUMNS
        );
        let updated = sqlx::query_as::<_, PromotedPoll>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(promotion) = updated else {
            drop(tx);
            return Err(self.status_error(id).await);
        };

        Self::refresh_promoted_flag_in_tx(&mut tx, &[promotion.poll_id], Utc::now()).await?;

        tx.commit().await?;
        Ok(promotion)
    }

    async fn complete_ended(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let poll_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            UPDATE promoted_polls
            SET status = 'completed'
            WHERE status = 'active' AND ends_at <= $1
            RETURNING poll_id
            "#,
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        let completed = poll_ids.len() as u64;
        Self::refresh_promoted_flag_in_tx(&mut tx, &poll_ids, now).await?;

        tx.commit().await?;
        Ok(completed)
    }

    async fn start_due(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE polls p
            SET is_promoted = TRUE, updated_at = NOW()
            WHERE p.is_promoted = FALSE
              AND EXISTS(
                    SELECT 1 FROM promoted_polls pp
                    WHERE pp.poll_id = p.id AND pp.status = 'active'
                      AND pp.starts_at <= $1 AND pp.ends_at > $1
                )
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
