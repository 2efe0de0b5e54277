//! 赞助推广服务
//!
//! 推广状态流转：
//!
//! ```text
//! PendingPayment --confirm_payment--> Active --ends_at--> Completed
//!        |                              |
//!        +----------cancel--------------+--> Cancelled
//! ```
//!
//! 只有确认付款后投票才会标记为推广；支付网关对接不在本服务范围内，
//! 付款凭证由管理员录入。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use super::dto::PromotePollInput;
use crate::error::{Result, ServiceError};
use crate::models::{NewPromotion, NewSponsor, PromotedPoll, PromotionStatus, Sponsor};
use crate::repository::{PollRepositoryTrait, SponsorRepositoryTrait};

const MAX_REFERENCE_LEN: usize = 200;

pub struct SponsorService<S, PR>
where
    S: SponsorRepositoryTrait,
    PR: PollRepositoryTrait,
{
    sponsor_repo: Arc<S>,
    poll_repo: Arc<PR>,
}

impl<S, PR> SponsorService<S, PR>
where
    S: SponsorRepositoryTrait,
    PR: PollRepositoryTrait,
{
    pub fn new(sponsor_repo: Arc<S>, poll_repo: Arc<PR>) -> Self {
        Self {
            sponsor_repo,
            poll_repo,
        }
    }

    #[instrument(skip(self, sponsor))]
    pub async fn create_sponsor(&self, sponsor: NewSponsor) -> Result<Sponsor> {
        let name = sponsor.name.trim().to_string();
        if name.is_empty() || name.chars().count() > 200 {
            return Err(ServiceError::Validation(
                "赞助商名称长度须为 1-200 个字符".to_string(),
            ));
        }
        let contact_email = sponsor.contact_email.trim().to_lowercase();
        if !contact_email.contains('@') {
            return Err(ServiceError::Validation("联系邮箱格式不正确".to_string()));
        }
        if sponsor
            .website
            .as_ref()
            .is_some_and(|w| !(w.starts_with("https://") || w.starts_with("http://")))
        {
            return Err(ServiceError::Validation("网站地址必须是 http(s) URL".to_string()));
        }

        let created = self
            .sponsor_repo
            .create_sponsor(&NewSponsor {
                name,
                contact_email,
                website: sponsor.website,
            })
            .await?;
        info!(sponsor_id = created.id, "赞助商已创建");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_sponsors(&self) -> Result<Vec<Sponsor>> {
        self.sponsor_repo.list_sponsors().await
    }

    /// 创建推广，初始状态为待付款
    #[instrument(skip(self, input))]
    pub async fn promote_poll(
        &self,
        input: PromotePollInput,
        now: DateTime<Utc>,
    ) -> Result<PromotedPoll> {
        if input.budget_cents <= 0 {
            return Err(ServiceError::Validation("推广预算必须大于 0".to_string()));
        }
        if input.ends_at <= input.starts_at {
            return Err(ServiceError::Validation(
                "推广结束时间必须晚于开始时间".to_string(),
            ));
        }
        if input.ends_at <= now {
            return Err(ServiceError::Validation("推广结束时间已过".to_string()));
        }

        let sponsor = self
            .sponsor_repo
            .get_sponsor(input.sponsor_id)
            .await?
            .ok_or(ServiceError::SponsorNotFound(input.sponsor_id))?;
        if !sponsor.is_active {
            return Err(ServiceError::Validation("赞助商已停用".to_string()));
        }
        let poll = self
            .poll_repo
            .get(input.poll_id)
            .await?
            .ok_or(ServiceError::PollNotFound(input.poll_id))?;
        if !poll.is_visible() {
            return Err(ServiceError::PollNotActive(poll.id));
        }

        let promotion = self
            .sponsor_repo
            .create_promotion(&NewPromotion {
                poll_id: input.poll_id,
                sponsor_id: input.sponsor_id,
                budget_cents: input.budget_cents,
                starts_at: input.starts_at,
                ends_at: input.ends_at,
            })
            .await?;
        info!(
            promotion_id = promotion.id,
            poll_id = promotion.poll_id,
            sponsor_id = promotion.sponsor_id,
            budget_cents = promotion.budget_cents,
            "推广已创建，等待付款"
        );
        Ok(promotion)
    }

    #[instrument(skip(self))]
    pub async fn list_promotions(
        &self,
        status: Option<PromotionStatus>,
    ) -> Result<Vec<PromotedPoll>> {
        self.sponsor_repo.list_promotions(status).await
    }

    /// 确认付款，推广进入进行中
    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, promotion_id: i64, reference: &str) -> Result<PromotedPoll> {
        let reference = reference.trim();
        if reference.is_empty() || reference.chars().count() > MAX_REFERENCE_LEN {
            return Err(ServiceError::Validation(
                "付款凭证长度须为 1-200 个字符".to_string(),
            ));
        }
        let promotion = self
            .sponsor_repo
            .confirm_payment(promotion_id, reference)
            .await?;
        info!(promotion_id = promotion_id, poll_id = promotion.poll_id, "推广付款已确认");
        Ok(promotion)
    }

    #[instrument(skip(self))]
    pub async fn cancel_promotion(&self, promotion_id: i64) -> Result<PromotedPoll> {
        let existing = self
            .sponsor_repo
            .get_promotion(promotion_id)
            .await?
            .ok_or(ServiceError::PromotionNotFound(promotion_id))?;
        if !existing.status.can_cancel() {
            return Err(ServiceError::InvalidPromotionStatus {
                id: promotion_id,
                status: existing.status.as_str().to_string(),
            });
        }

        let promotion = self.sponsor_repo.cancel_promotion(promotion_id).await?;
        info!(promotion_id = promotion_id, "推广已取消");
        Ok(promotion)
    }

    /// 开始时间已到的进行中推广生效，由定时任务调用
    #[instrument(skip(self))]
    pub async fn start_due_promotions(&self, now: DateTime<Utc>) -> Result<u64> {
        let started = self.sponsor_repo.start_due(now).await?;
        if started > 0 {
            info!(started = started, "推广已到开始时间");
        }
        Ok(started)
    }

    /// 结束所有已到期的推广，由定时任务调用
    #[instrument(skip(self))]
    pub async fn complete_ended_promotions(&self, now: DateTime<Utc>) -> Result<u64> {
        let completed = self.sponsor_repo.complete_ended(now).await?;
        if completed > 0 {
            info!(completed = completed, "已结束到期推广");
        }
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Poll, PollStatus};
    use crate::repository::{MockPollRepositoryTrait, MockSponsorRepositoryTrait};
    use chrono::Duration;
    use uuid::Uuid;

    fn promotion(id: i64, status: PromotionStatus) -> PromotedPoll {
        let now = Utc::now();
        PromotedPoll {
            id,
            poll_id: 1,
            sponsor_id: 1,
            budget_cents: 5000,
            status,
            payment_reference: None,
            starts_at: now,
            ends_at: now + Duration::days(7),
            created_at: now,
        }
    }

    fn sponsor(id: i64) -> Sponsor {
        Sponsor {
            id,
            name: "Acme".to_string(),
            contact_email: "ads@acme.test".to_string(),
            website: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn poll(id: i64) -> Poll {
        Poll {
            id,
            creator_id: Uuid::new_v4(),
            title: "Coffee or tea?".to_string(),
            description: None,
            category: "food".to_string(),
            options: vec!["Coffee".to_string(), "Tea".to_string()],
            vote_counts: vec![0, 0],
            total_votes: 0,
            status: PollStatus::Active,
            is_promoted: false,
            expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input(budget: i64, days: i64) -> PromotePollInput {
        let now = Utc::now();
        PromotePollInput {
            poll_id: 1,
            sponsor_id: 1,
            budget_cents: budget,
            starts_at: now,
            ends_at: now + Duration::days(days),
        }
    }

    #[tokio::test]
    async fn test_start_due_promotions_uses_worker_clock() {
        let now = Utc::now();
        let mut sponsors = MockSponsorRepositoryTrait::new();
        sponsors
            .expect_start_due()
            .withf(move |at| *at == now)
            .times(1)
            .returning(|_| Ok(2));
        let svc = SponsorService::new(
            Arc::new(sponsors),
            Arc::new(MockPollRepositoryTrait::new()),
        );

        assert_eq!(svc.start_due_promotions(now).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_promote_poll_starts_pending() {
        let mut sponsors = MockSponsorRepositoryTrait::new();
        sponsors.expect_get_sponsor().returning(|id| Ok(Some(sponsor(id))));
        sponsors
            .expect_create_promotion()
            .times(1)
            .returning(|_| Ok(promotion(1, PromotionStatus::PendingPayment)));
        let mut polls = MockPollRepositoryTrait::new();
        polls.expect_get().returning(|id| Ok(Some(poll(id))));
        let service = SponsorService::new(Arc::new(sponsors), Arc::new(polls));

        let created = service.promote_poll(input(5000, 7), Utc::now()).await.unwrap();
        assert_eq!(created.status, PromotionStatus::PendingPayment);
    }

    #[tokio::test]
    async fn test_promote_poll_validation() {
        let service = SponsorService::new(
            Arc::new(MockSponsorRepositoryTrait::new()),
            Arc::new(MockPollRepositoryTrait::new()),
        );
        assert!(service.promote_poll(input(0, 7), Utc::now()).await.is_err());
        assert!(service.promote_poll(input(100, -1), Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_confirm_requires_reference() {
        let mut sponsors = MockSponsorRepositoryTrait::new();
        sponsors.expect_confirm_payment().never();
        let service = SponsorService::new(
            Arc::new(sponsors),
            Arc::new(MockPollRepositoryTrait::new()),
        );
        assert!(matches!(
            service.confirm_payment(1, "   ").await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_cannot_cancel_completed() {
        let mut sponsors = MockSponsorRepositoryTrait::new();
        sponsors
            .expect_get_promotion()
            .returning(|id| Ok(Some(promotion(id, PromotionStatus::Completed))));
        sponsors.expect_cancel_promotion().never();
        let service = SponsorService::new(
            Arc::new(sponsors),
            Arc::new(MockPollRepositoryTrait::new()),
        );

        let err = service.cancel_promotion(4).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidPromotionStatus { id: 4, .. }
        ));
    }
}
