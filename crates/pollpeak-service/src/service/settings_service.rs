//! 系统设置服务
//!
//! 设置项为键值对，值为任意 JSON。公开设置项可被未登录用户读取。

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::AppSetting;
use crate::repository::SettingsRepositoryTrait;

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_.]{1,64}$").expect("设置键正则有效"));

/// 单个设置值序列化后的最大字节数
const MAX_VALUE_BYTES: usize = 16 * 1024;

pub fn validate_key(key: &str) -> Result<()> {
    if KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "设置键须为 1-64 位小写字母、数字、下划线或点: {}",
            key
        )))
    }
}

pub struct SettingsService<S>
where
    S: SettingsRepositoryTrait,
{
    settings_repo: Arc<S>,
}

impl<S> SettingsService<S>
where
    S: SettingsRepositoryTrait,
{
    pub fn new(settings_repo: Arc<S>) -> Self {
        Self { settings_repo }
    }

    #[instrument(skip(self))]
    pub async fn public_settings(&self) -> Result<Vec<AppSetting>> {
        self.settings_repo.list(true).await
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<AppSetting>> {
        self.settings_repo.list(false).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<AppSetting> {
        validate_key(key)?;
        self.settings_repo
            .get(key)
            .await?
            .ok_or_else(|| ServiceError::SettingNotFound(key.to_string()))
    }

    /// 新增或覆盖设置项（管理员）
    #[instrument(skip(self, value))]
    pub async fn upsert(
        &self,
        admin_id: Uuid,
        key: &str,
        value: serde_json::Value,
        is_public: bool,
    ) -> Result<AppSetting> {
        validate_key(key)?;
        if serde_json::to_vec(&value)?.len() > MAX_VALUE_BYTES {
            return Err(ServiceError::Validation("设置值不能超过 16KB".to_string()));
        }

        let setting = self
            .settings_repo
            .upsert(key, &value, is_public, admin_id)
            .await?;
        info!(key = %key, is_public = is_public, admin_id = %admin_id, "设置项已保存");
        Ok(setting)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        if !self.settings_repo.delete(key).await? {
            return Err(ServiceError::SettingNotFound(key.to_string()));
        }
        info!(key = %key, "设置项已删除");
        Ok(())
    }
}
