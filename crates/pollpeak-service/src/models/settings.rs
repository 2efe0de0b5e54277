//! 系统设置

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 键值设置项，公开项无需登录即可读取
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AppSetting {
    pub key: String,
    pub value: serde_json::Value,
    pub is_public: bool,
    #[sqlx(default)]
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}
