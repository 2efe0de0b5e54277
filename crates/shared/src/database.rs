//! PostgreSQL 连接池
//!
//! 积分相关的多行写入都在仓储层开启事务，这里只负责连接池、就绪检查和嵌入式迁移。

use std::time::{Duration, Instant};

use sqlx::Executor;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;
use crate::error::Result;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 建立连接池
    ///
    /// 配置了语句超时时，每个新连接建立后执行 `SET statement_timeout`
    #[instrument(skip(config), fields(max = config.max_connections))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        if let Some(statement) = statement_timeout_sql(config.statement_timeout_seconds) {
            options = options.after_connect(move |conn, _meta| {
                let statement = statement.clone();
                Box::pin(async move {
                    conn.execute(statement.as_str()).await?;
                    Ok(())
                })
            });
        }

        let pool = options.connect(&config.url).await?;
        info!(
            statement_timeout_seconds = config.statement_timeout_seconds,
            "PostgreSQL 连接池已建立"
        );

        Ok(Self { pool })
    }

    /// 包装已有连接池，API 层就绪探针和测试使用
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 就绪检查，成功时记录往返耗时
    pub async fn health_check(&self) -> Result<()> {
        let started = Instant::now();
        self.pool.execute("SELECT 1").await?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "数据库就绪检查通过");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL 连接池已关闭");
    }

    /// 执行仓库根目录 migrations/ 下的迁移（编译期嵌入）
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("数据库迁移完成");
        Ok(())
    }
}

impl std::ops::Deref for Database {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

fn statement_timeout_sql(seconds: u64) -> Option<String> {
    (seconds > 0).then(|| format!("SET statement_timeout = '{}s'", seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_timeout_sql() {
        assert_eq!(statement_timeout_sql(0), None);
        assert_eq!(
            statement_timeout_sql(15).as_deref(),
            Some("SET statement_timeout = '15s'")
        );
    }

    #[tokio::test]
    #[ignore] // 需要数据库连接
    async fn test_connect_migrate_and_health_check() {
        let config = crate::test_utils::test_database_config();
        let db = Database::connect(&config).await.unwrap();
        db.run_migrations().await.unwrap();
        db.health_check().await.unwrap();
        db.close().await;
    }
}
