//! 积分商城

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RedemptionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoreItem {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    pub cost_points: i32,
    /// 库存，None 表示不限量
    #[sqlx(default)]
    pub stock: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreItem {
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|s| s > 0)
    }
}

#[derive(Debug, Clone)]
pub struct NewStoreItem {
    pub name: String,
    pub description: Option<String>,
    pub cost_points: i32,
    pub stock: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost_points: Option<i32>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoreRedemption {
    pub id: i64,
    pub user_id: Uuid,
    pub item_id: i64,
    #[sqlx(default)]
    pub item_name: Option<String>,
    pub cost_points: i32,
    pub status: RedemptionStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_stock() {
        let mut item = StoreItem {
            id: 1,
            name: "Sticker pack".to_string(),
            description: None,
            cost_points: 100,
            stock: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(item.in_stock());
        item.stock = Some(0);
        assert!(!item.in_stock());
        item.stock = Some(3);
        assert!(item.in_stock());
    }
}
