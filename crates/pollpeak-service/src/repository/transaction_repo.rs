//! 积分流水仓储

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::TransactionRepositoryTrait;
use crate::error::Result;
use crate::models::{Pagination, PointTransaction};

pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<(Vec<PointTransaction>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, PointTransaction>(
            r#"
            SELECT id, user_id, kind, source, amount, balance_after, reference, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }
}
