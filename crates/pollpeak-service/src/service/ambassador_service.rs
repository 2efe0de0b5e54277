//! 大使计划服务

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::{Ambassador, AmbassadorDashboard, AmbassadorReview, AmbassadorStatus};
use crate::repository::{ProfileRepositoryTrait, ReferralRepositoryTrait};
use crate::scoring::AmbassadorTier;

const RECENT_REFERRALS: i64 = 10;
const MAX_MOTIVATION_LEN: usize = 1000;

pub struct AmbassadorService<RR, P>
where
    RR: ReferralRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    referral_repo: Arc<RR>,
    profile_repo: Arc<P>,
}

impl<RR, P> AmbassadorService<RR, P>
where
    RR: ReferralRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    pub fn new(referral_repo: Arc<RR>, profile_repo: Arc<P>) -> Self {
        Self {
            referral_repo,
            profile_repo,
        }
    }

    /// 提交大使申请，每个用户只能申请一次
    #[instrument(skip(self, motivation))]
    pub async fn apply(&self, user_id: Uuid, motivation: Option<String>) -> Result<Ambassador> {
        let motivation = motivation
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if motivation
            .as_ref()
            .is_some_and(|m| m.chars().count() > MAX_MOTIVATION_LEN)
        {
            return Err(ServiceError::Validation(
                "申请理由不能超过 1000 个字符".to_string(),
            ));
        }

        let profile = self
            .profile_repo
            .get(user_id)
            .await?
            .ok_or(ServiceError::ProfileNotFound(user_id))?;
        if profile.is_banned {
            return Err(ServiceError::UserBanned);
        }
        if self
            .referral_repo
            .get_ambassador_by_user(user_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::AmbassadorApplicationExists);
        }

        let ambassador = self
            .referral_repo
            .create_ambassador(user_id, motivation)
            .await?;
        info!(ambassador_id = ambassador.id, user_id = %user_id, "大使申请已提交");
        Ok(ambassador)
    }

    /// 大使面板
    ///
    /// 待审核的申请也可查看，等级按当前邀请人数展示
    #[instrument(skip(self))]
    pub async fn dashboard(&self, user_id: Uuid) -> Result<AmbassadorDashboard> {
        let ambassador = self
            .referral_repo
            .get_ambassador_by_user(user_id)
            .await?
            .ok_or(ServiceError::AmbassadorNotFound)?;
        let profile = self
            .profile_repo
            .get(user_id)
            .await?
            .ok_or(ServiceError::ProfileNotFound(user_id))?;
        let recent_referrals = self
            .referral_repo
            .list_by_referrer(user_id, RECENT_REFERRALS)
            .await?;

        let tier = if ambassador.status == AmbassadorStatus::Approved {
            ambassador.tier
        } else {
            AmbassadorTier::from_referrals(profile.referral_count)
        };
        let next_tier = tier.next();

        Ok(AmbassadorDashboard {
            status: ambassador.status,
            tier,
            commission_rate: tier.commission_rate(),
            referral_count: profile.referral_count,
            total_commission: ambassador.total_commission,
            next_tier,
            referrals_to_next_tier: next_tier
                .map(|t| (t.min_referrals() - profile.referral_count).max(0)),
            recent_referrals,
        })
    }

    #[instrument(skip(self))]
    pub async fn list(&self, status: Option<AmbassadorStatus>) -> Result<Vec<Ambassador>> {
        self.referral_repo.list_ambassadors(status).await
    }

    /// 批准申请，等级按申请人当前邀请人数确定
    #[instrument(skip(self))]
    pub async fn approve(&self, reviewer: Uuid, ambassador_id: i64) -> Result<Ambassador> {
        let ambassador = self.load_pending(ambassador_id).await?;
        let referral_count = self
            .profile_repo
            .get(ambassador.user_id)
            .await?
            .ok_or(ServiceError::ProfileNotFound(ambassador.user_id))?
            .referral_count;
        let tier = AmbassadorTier::from_referrals(referral_count);

        let approved = self
            .referral_repo
            .review_ambassador(
                ambassador_id,
                &AmbassadorReview {
                    status: AmbassadorStatus::Approved,
                    reviewer,
                    tier,
                    commission_rate: tier.commission_rate(),
                },
            )
            .await?;
        info!(ambassador_id = ambassador_id, reviewer = %reviewer, tier = ?tier, "大使申请已批准");
        Ok(approved)
    }

    #[instrument(skip(self))]
    pub async fn reject(&self, reviewer: Uuid, ambassador_id: i64) -> Result<Ambassador> {
        let ambassador = self.load_pending(ambassador_id).await?;
        let rejected = self
            .referral_repo
            .review_ambassador(
                ambassador_id,
                &AmbassadorReview {
                    status: AmbassadorStatus::Rejected,
                    reviewer,
                    tier: ambassador.tier,
                    commission_rate: ambassador.commission_rate,
                },
            )
            .await?;
        info!(ambassador_id = ambassador_id, reviewer = %reviewer, "大使申请已拒绝");
        Ok(rejected)
    }

    async fn load_pending(&self, ambassador_id: i64) -> Result<Ambassador> {
        let ambassador = self
            .referral_repo
            .get_ambassador(ambassador_id)
            .await?
            .ok_or(ServiceError::AmbassadorNotFound)?;
        if ambassador.status != AmbassadorStatus::Pending {
            return Err(ServiceError::InvalidAmbassadorStatus(
                ambassador.status.as_str().to_string(),
            ));
        }
        Ok(ambassador)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockProfileRepositoryTrait, MockReferralRepositoryTrait};
    use crate::service::badge_service::tests::test_profile;
    use chrono::Utc;

    fn ambassador(id: i64, user_id: Uuid, status: AmbassadorStatus) -> Ambassador {
        Ambassador {
            id,
            user_id,
            status,
            tier: AmbassadorTier::Bronze,
            commission_rate: 0.05,
            total_commission: 0,
            motivation: None,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
        }
    }

    fn profiles(referral_count: i32) -> MockProfileRepositoryTrait {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get().returning(move |id| {
            let mut profile = test_profile(id);
            profile.referral_count = referral_count;
            Ok(Some(profile))
        });
        repo
    }

    #[tokio::test]
    async fn test_duplicate_application() {
        let mut referrals = MockReferralRepositoryTrait::new();
        referrals
            .expect_get_ambassador_by_user()
            .returning(|uid| Ok(Some(ambassador(1, uid, AmbassadorStatus::Pending))));
        referrals.expect_create_ambassador().never();
        let service = AmbassadorService::new(Arc::new(referrals), Arc::new(profiles(0)));

        let err = service.apply(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::AmbassadorApplicationExists));
    }

    #[tokio::test]
    async fn test_approve_sets_tier_from_referrals() {
        let user = Uuid::new_v4();
        let mut referrals = MockReferralRepositoryTrait::new();
        referrals
            .expect_get_ambassador()
            .returning(move |id| Ok(Some(ambassador(id, user, AmbassadorStatus::Pending))));
        referrals
            .expect_review_ambassador()
            .withf(|_, review| {
                review.status == AmbassadorStatus::Approved
                    && review.tier == AmbassadorTier::Silver
                    && (review.commission_rate - 0.10).abs() < 1e-9
            })
            .times(1)
            .returning(move |id, review| {
                let mut a = ambassador(id, user, review.status);
                a.tier = review.tier;
                a.commission_rate = review.commission_rate;
                Ok(a)
            });
        let service = AmbassadorService::new(Arc::new(referrals), Arc::new(profiles(12)));

        let approved = service.approve(Uuid::new_v4(), 3).await.unwrap();
        assert_eq!(approved.tier, AmbassadorTier::Silver);
    }

    #[tokio::test]
    async fn test_cannot_review_twice() {
        let mut referrals = MockReferralRepositoryTrait::new();
        referrals.expect_get_ambassador().returning(|id| {
            Ok(Some(ambassador(id, Uuid::new_v4(), AmbassadorStatus::Rejected)))
        });
        referrals.expect_review_ambassador().never();
        let service = AmbassadorService::new(Arc::new(referrals), Arc::new(profiles(0)));

        let err = service.approve(Uuid::new_v4(), 3).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidAmbassadorStatus(_)));
    }

    #[tokio::test]
    async fn test_dashboard_next_tier() {
        let mut referrals = MockReferralRepositoryTrait::new();
        referrals.expect_get_ambassador_by_user().returning(|uid| {
            let mut a = ambassador(1, uid, AmbassadorStatus::Approved);
            a.tier = AmbassadorTier::Silver;
            a.total_commission = 40;
            Ok(Some(a))
        });
        referrals
            .expect_list_by_referrer()
            .returning(|_, _| Ok(vec![]));
        let service = AmbassadorService::new(Arc::new(referrals), Arc::new(profiles(12)));

        let dashboard = service.dashboard(Uuid::new_v4()).await.unwrap();
        assert_eq!(dashboard.tier, AmbassadorTier::Silver);
        assert_eq!(dashboard.next_tier, Some(AmbassadorTier::Gold));
        assert_eq!(dashboard.referrals_to_next_tier, Some(38));
        assert_eq!(dashboard.total_commission, 40);
    }
}
