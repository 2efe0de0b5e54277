//! 积分商城仓储

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ledger::spend_points_in_tx;
use super::traits::StoreRepositoryTrait;
use crate::error::{Result, ServiceError};
use crate::models::{NewStoreItem, PointSource, StoreItem, StoreItemUpdate, StoreRedemption};

const ITEM_COLUMNS: &str =
    "id, name, description, cost_points, stock, is_active, created_at, updated_at";

pub struct StoreRepository {
    pool: PgPool,
}

impl StoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRepositoryTrait for StoreRepository {
    async fn list_items(&self, active_only: bool) -> Result<Vec<StoreItem>> {
        let sql = format!(
            "SELECT {} FROM store_items WHERE ($1 = FALSE OR is_active = TRUE) ORDER BY cost_points ASC, id ASC",
            ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, StoreItem>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn get_item(&self, id: i64) -> Result<Option<StoreItem>> {
        let sql = format!("SELECT {} FROM store_items WHERE id = $1", ITEM_COLUMNS);
        let item = sqlx::query_as::<_, StoreItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn create_item(&self, item: &NewStoreItem) -> Result<StoreItem> {
        let sql = format!(
            r#"
            INSERT INTO store_items (name, description, cost_points, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );
        let created = sqlx::query_as::<_, StoreItem>(&sql)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.cost_points)
            .bind(item.stock)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_item(&self, id: i64, update: &StoreItemUpdate) -> Result<StoreItem> {
        let sql = format!(
            r#"
            UPDATE store_items
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                cost_points = COALESCE($4, cost_points),
                stock = COALESCE($5, stock),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );
        sqlx::query_as::<_, StoreItem>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(&update.description)
            .bind(update.cost_points)
            .bind(update.stock)
            .bind(update.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::StoreItemNotFound(id))
    }

    async fn redeem(&self, user_id: Uuid, item_id: i64) -> Result<StoreRedemption> {
        let mut tx = self.pool.begin().await?;

        // 锁定商品行，防止并发超卖
        let sql = format!("SELECT {} FROM store_items WHERE id = $1 FOR UPDATE", ITEM_COLUMNS);
        let item = sqlx::query_as::<_, StoreItem>(&sql)
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::StoreItemNotFound(item_id))?;

        if !item.is_active {
            return Err(ServiceError::StoreItemInactive(item_id));
        }
        if !item.in_stock() {
            return Err(ServiceError::OutOfStock(item_id));
        }

        let reference = format!("store_item:{}", item.id);
        spend_points_in_tx(
            &mut tx,
            user_id,
            item.cost_points,
            PointSource::StoreRedemption,
            Some(&reference),
        )
        .await?;

        if item.stock.is_some() {
            sqlx::query(
                "UPDATE store_items SET stock = stock - 1, updated_at = NOW() WHERE id = $1",
            )
            .bind(item.id)
            .execute(&mut *tx)
            .await?;
        }

        let mut redemption = sqlx::query_as::<_, StoreRedemption>(
            r#"
            INSERT INTO store_redemptions (user_id, item_id, cost_points)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, item_id, NULL::varchar AS item_name, cost_points, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(item.id)
        .bind(item.cost_points)
        .fetch_one(&mut *tx)
        .await?;
        redemption.item_name = Some(item.name);

        tx.commit().await?;
        Ok(redemption)
    }

    async fn list_redemptions(&self, user_id: Uuid, limit: i64) -> Result<Vec<StoreRedemption>> {
        let rows = sqlx::query_as::<_, StoreRedemption>(
            r#"
            SELECT r.id, r.user_id, r.item_id, i.name AS item_name, r.cost_points, r.status, r.created_at
            FROM store_redemptions r
            JOIN store_items i ON i.id = r.item_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC
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
