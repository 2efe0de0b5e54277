//! 系统设置仓储

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::SettingsRepositoryTrait;
use crate::error::Result;
use crate::models::AppSetting;

pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepositoryTrait for SettingsRepository {
    async fn list(&self, public_only: bool) -> Result<Vec<AppSetting>> {
        let rows = sqlx::query_as::<_, AppSetting>(
            r#"
            SELECT key, value, is_public, updated_by, updated_at
            FROM app_settings
            WHERE ($1 = FALSE OR is_public = TRUE)
            ORDER BY key
            "#,
        )
        .bind(public_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, key: &str) -> Result<Option<AppSetting>> {
        let row = sqlx::query_as::<_, AppSetting>(
            "SELECT key, value, is_public, updated_by, updated_at FROM app_settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert(
        &self,
        key: &str,
        value: &serde_json::Value,
        is_public: bool,
        updated_by: Uuid,
    ) -> Result<AppSetting> {
        let row = sqlx::query_as::<_, AppSetting>(
            r#"
            INSERT INTO app_settings (key, value, is_public, updated_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                is_public = EXCLUDED.is_public,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING key, value, is_public, updated_by, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(is_public)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM app_settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
