//! 积分商城服务
//!
//! 兑换在单个事务内锁定商品行、扣减库存与积分并写入兑换记录；
//! 服务层的预检查只为尽早给出明确的错误。

use std::sync::Arc;

use pollpeak_shared::observability::metrics;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::{NewStoreItem, StoreItem, StoreItemUpdate, StoreRedemption};
use crate::repository::{ProfileRepositoryTrait, StoreRepositoryTrait};

const MAX_REDEMPTIONS_LISTED: i64 = 100;

fn validate_item_fields(name: Option<&str>, cost: Option<i32>, stock: Option<i32>) -> Result<()> {
    if name.is_some_and(|n| n.trim().is_empty() || n.chars().count() > 200) {
        return Err(ServiceError::Validation(
            "商品名称长度须为 1-200 个字符".to_string(),
        ));
    }
    if cost.is_some_and(|c| c <= 0) {
        return Err(ServiceError::Validation("兑换积分必须大于 0".to_string()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(ServiceError::Validation("库存不能为负数".to_string()));
    }
    Ok(())
}

pub struct StoreService<S, P>
where
    S: StoreRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    store_repo: Arc<S>,
    profile_repo: Arc<P>,
}

impl<S, P> StoreService<S, P>
where
    S: StoreRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    pub fn new(store_repo: Arc<S>, profile_repo: Arc<P>) -> Self {
        Self {
            store_repo,
            profile_repo,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self, include_inactive: bool) -> Result<Vec<StoreItem>> {
        self.store_repo.list_items(!include_inactive).await
    }

    /// 兑换商品
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn redeem(&self, user_id: Uuid, item_id: i64) -> Result<StoreRedemption> {
        let item = self
            .store_repo
            .get_item(item_id)
            .await?
            .ok_or(ServiceError::StoreItemNotFound(item_id))?;
        if !item.is_active {
            return Err(ServiceError::StoreItemInactive(item_id));
        }
        if !item.in_stock() {
            return Err(ServiceError::OutOfStock(item_id));
        }

        let profile = self
            .profile_repo
            .get(user_id)
            .await?
            .ok_or(ServiceError::ProfileNotFound(user_id))?;
        if profile.is_banned {
            return Err(ServiceError::UserBanned);
        }
        if profile.points < item.cost_points {
            return Err(ServiceError::InsufficientPoints {
                required: item.cost_points,
                available: profile.points,
            });
        }

        let redemption = match self.store_repo.redeem(user_id, item_id).await {
            Ok(r) => r,
            Err(e) => {
                if e.is_business_error() {
                    warn!(item_id = item_id, error = %e, "兑换被拒绝");
                }
                return Err(e);
            }
        };
        metrics::record_store_redemption(redemption.status.as_str());
        info!(
            item_id = item_id,
            redemption_id = redemption.id,
            cost = redemption.cost_points,
            "商品兑换成功"
        );
        Ok(redemption)
    }

    #[instrument(skip(self))]
    pub async fn my_redemptions(&self, user_id: Uuid, limit: i64) -> Result<Vec<StoreRedemption>> {
        self.store_repo
            .list_redemptions(user_id, limit.clamp(1, MAX_REDEMPTIONS_LISTED))
            .await
    }

    /// 上架商品（管理员）
    #[instrument(skip(self, item))]
    pub async fn create_item(&self, item: NewStoreItem) -> Result<StoreItem> {
        validate_item_fields(Some(&item.name), Some(item.cost_points), item.stock)?;
        let created = self.store_repo.create_item(&item).await?;
        info!(item_id = created.id, name = %created.name, "商品已上架");
        Ok(created)
    }

    /// 修改商品（管理员），未提供的字段保持不变
    #[instrument(skip(self, update))]
    pub async fn update_item(&self, item_id: i64, update: StoreItemUpdate) -> Result<StoreItem> {
        validate_item_fields(update.name.as_deref(), update.cost_points, update.stock)?;
        let updated = self.store_repo.update_item(item_id, &update).await?;
        info!(item_id = item_id, "商品已更新");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RedemptionStatus;
    use crate::repository::{MockProfileRepositoryTrait, MockStoreRepositoryTrait};
    use crate::service::badge_service::tests::test_profile;
    use chrono::Utc;

    fn item(id: i64, cost: i32, stock: Option<i32>) -> StoreItem {
        StoreItem {
            id,
            name: "Sticker pack".to_string(),
            description: None,
            cost_points: cost,
            stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profiles(points: i32) -> MockProfileRepositoryTrait {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get().returning(move |id| {
            let mut profile = test_profile(id);
            profile.points = points;
            Ok(Some(profile))
        });
        repo
    }

    #[tokio::test]
    async fn test_redeem_success() {
        let mut store = MockStoreRepositoryTrait::new();
        store
            .expect_get_item()
            .returning(|id| Ok(Some(item(id, 100, Some(3)))));
        store.expect_redeem().times(1).returning(|uid, item_id| {
            Ok(StoreRedemption {
                id: 1,
                user_id: uid,
                item_id,
                item_name: Some("Sticker pack".to_string()),
                cost_points: 100,
                status: RedemptionStatus::Completed,
                created_at: Utc::now(),
            })
        });
        let service = StoreService::new(Arc::new(store), Arc::new(profiles(150)));

        let redemption = service.redeem(Uuid::new_v4(), 1).await.unwrap();
        assert_eq!(redemption.cost_points, 100);
    }

    #[tokio::test]
    async fn test_insufficient_points() {
        let mut store = MockStoreRepositoryTrait::new();
        store
            .expect_get_item()
            .returning(|id| Ok(Some(item(id, 500, None))));
        store.expect_redeem().never();
        let service = StoreService::new(Arc::new(store), Arc::new(profiles(120)));

        let err = service.redeem(Uuid::new_v4(), 1).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InsufficientPoints {
                required: 500,
                available: 120
            }
        ));
    }

    #[tokio::test]
    async fn test_out_of_stock() {
        let mut store = MockStoreRepositoryTrait::new();
        store
            .expect_get_item()
            .returning(|id| Ok(Some(item(id, 10, Some(0)))));
        let service = StoreService::new(Arc::new(store), Arc::new(profiles(1000)));

        let err = service.redeem(Uuid::new_v4(), 8).await.unwrap_err();
        assert!(matches!(err, ServiceError::OutOfStock(8)));
    }

    #[tokio::test]
    async fn test_create_item_requires_positive_cost() {
        let mut store = MockStoreRepositoryTrait::new();
        store.expect_create_item().never();
        let service = StoreService::new(Arc::new(store), Arc::new(profiles(0)));

        let err = service
            .create_item(NewStoreItem {
                name: "Free lunch".to_string(),
                description: None,
                cost_points: 0,
                stock: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
