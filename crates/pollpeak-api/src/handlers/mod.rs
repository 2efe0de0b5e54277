//! HTTP 请求处理器
//!
//! handler 只负责参数提取、格式校验和响应封装，业务逻辑在 `pollpeak` 服务层

pub mod auth;
pub mod badge;
pub mod health;
pub mod moderation;
pub mod poll;
pub mod profile;
pub mod referral;
pub mod reward;
pub mod settings;
pub mod sponsor;
pub mod store;
pub mod transaction;
pub mod trivia;

use std::future::Future;
use std::time::Duration;

use axum::Extension;
use chrono::{NaiveDate, Utc};
use pollpeak::Actor;
use pollpeak_shared::cache::Cache;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::auth::Claims;
use crate::error::Result;

/// 读穿缓存
///
/// 缓存读写失败只记录日志，回退到直接加载
pub(crate) async fn cached<T, F, Fut>(cache: &Cache, key: &str, ttl: Duration, load: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    cached_when(cache, key, ttl, || async move { Ok((load().await?, true)) }).await
}

/// 读穿缓存，加载结果附带是否允许写入缓存
///
/// 只对所有调用方都相同的结果返回 true，否则结果直接返回给当前调用方
pub(crate) async fn cached_when<T, F, Fut>(
    cache: &Cache,
    key: &str,
    ttl: Duration,
    load: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(T, bool)>>,
{
    match cache.get::<T>(key).await {
        Ok(Some(value)) => return Ok(value),
        Ok(None) => {}
        Err(e) => warn!(key, error = %e, "读取缓存失败"),
    }

    let (value, shareable) = load().await?;
    if shareable {
        if let Err(e) = cache.set(key, &value, ttl).await {
            warn!(key, error = %e, "写入缓存失败");
        }
    }
    Ok(value)
}

/// 删除缓存项，失败只记录日志
pub(crate) async fn invalidate(cache: &Cache, key: &str) {
    if let Err(e) = cache.delete(key).await {
        warn!(key, error = %e, "删除缓存失败");
    }
}

/// 每日奖励按 UTC 日期结算
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// 公开路由上的可选登录用户
pub(crate) fn optional_actor(claims: &Option<Extension<Claims>>) -> Result<Option<Actor>> {
    claims.as_ref().map(|Extension(c)| c.actor()).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollpeak_shared::test_utils::test_redis_config;

    #[tokio::test]
    #[ignore] // 需要 Redis
    async fn test_cached_when_skips_unshareable_values() {
        let cache = Cache::new(&test_redis_config()).unwrap();
        let key = format!("test:cached_when:{}", uuid::Uuid::new_v4());
        let ttl = Duration::from_secs(30);

        let private: i64 = cached_when(&cache, &key, ttl, || async { Ok((7, false)) })
            .await
            .unwrap();
        assert_eq!(private, 7);
        assert_eq!(cache.get::<i64>(&key).await.unwrap(), None);

        let public: i64 = cached_when(&cache, &key, ttl, || async { Ok((9, true)) })
            .await
            .unwrap();
        assert_eq!(public, 9);
        assert_eq!(cache.get::<i64>(&key).await.unwrap(), Some(9));

        invalidate(&cache, &key).await;
    }
}
