//! 积分流水查询服务

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Pagination, PointTransaction};
use crate::repository::TransactionRepositoryTrait;

pub struct TransactionService<T>
where
    T: TransactionRepositoryTrait,
{
    transaction_repo: Arc<T>,
}

impl<T> TransactionService<T>
where
    T: TransactionRepositoryTrait,
{
    pub fn new(transaction_repo: Arc<T>) -> Self {
        Self { transaction_repo }
    }

    /// 用户积分流水，按时间倒序
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> Result<(Vec<PointTransaction>, i64)> {
        self.transaction_repo.list_by_user(user_id, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PointSource, TransactionKind};
    use crate::repository::MockTransactionRepositoryTrait;
    use chrono::Utc;

    #[tokio::test]
    async fn test_history_passes_pagination() {
        let user = Uuid::new_v4();
        let mut repo = MockTransactionRepositoryTrait::new();
        repo.expect_list_by_user()
            .withf(move |uid, page| *uid == user && page.page == 2 && page.page_size == 10)
            .times(1)
            .returning(|uid, _| {
                Ok((
                    vec![PointTransaction {
                        id: 11,
                        user_id: uid,
                        kind: TransactionKind::Earn,
                        source: PointSource::Vote,
                        amount: 5,
                        balance_after: 5,
                        reference: Some("poll:1".to_string()),
                        created_at: Utc::now(),
                    }],
                    11,
                ))
            });
        let service = TransactionService::new(Arc::new(repo));

        let (items, total) = service.history(user, Pagination::new(2, 10)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(total, 11);
    }
}
