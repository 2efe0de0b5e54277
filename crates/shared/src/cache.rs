//! Redis 缓存管理模块
//!
//! 提供 Redis 连接管理和常用缓存操作封装。值统一以 JSON 存储。

use crate::config::RedisConfig;
use crate::error::Result;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{info, instrument};

/// Redis 缓存客户端
#[derive(Clone)]
pub struct Cache {
    client: Client,
}

impl Cache {
    /// 创建 Redis 客户端（惰性连接）
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        info!("Redis client created");
        Ok(Self { client })
    }

    async fn get_conn(&self) -> Result<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    /// 获取值
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(v) => Ok(Some(serde_json::from_str(&v)?)),
            None => Ok(None),
        }
    }

    /// 设置值
    #[instrument(skip(self, value))]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let serialized = serde_json::to_string(value)?;

        let _: () = conn.set_ex(key, serialized, ttl.as_secs()).await?;
        Ok(())
    }

    /// 删除值
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    /// 计数器自增并刷新过期时间
    ///
    /// INCR 与 EXPIRE 在同一个 MULTI/EXEC 中执行，计数键不会脱离过期时间存在
    pub async fn incr_with_ttl(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64> {
        let mut conn = self.get_conn().await?;
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, delta)
            .expire(key, ttl.as_secs() as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }
}

/// 缓存键生成器
pub struct CacheKey;

impl CacheKey {
    pub fn leaderboard(limit: i64) -> String {
        format!("leaderboard:top:{}", limit)
    }

    pub fn poll_results(poll_id: i64) -> String {
        format!("poll:results:{}", poll_id)
    }

    pub fn public_settings() -> String {
        "settings:public".to_string()
    }

    pub fn rate_limit(scope: &str, tier: &str, window: u64) -> String {
        format!("rl:{}:{}:{}", scope, tier, window)
    }
}
