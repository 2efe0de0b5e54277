//! 邀请服务
//!
//! 被邀请人填写邀请码后，双方各得奖励积分；邀请人若为已批准的大使，
//! 按新的邀请人数重算等级并获得佣金。每个用户只能被邀请一次。

use std::sync::Arc;

use pollpeak_shared::config::RewardSettings;
use pollpeak_shared::observability::metrics;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::badge_service::award_after_commit;
use crate::error::{Result, ServiceError};
use crate::models::{NewReferral, PointSource, ReferralSummary};
use crate::repository::{ProfileRepositoryTrait, ReferralRepositoryTrait};

const MAX_REFERRALS_LISTED: i64 = 100;

/// 使用邀请码的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralApplied {
    pub referrer_id: Uuid,
    pub points_awarded: i32,
    pub new_badges: Vec<String>,
}

/// 邀请码统一去空白并转大写
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub struct ReferralService<RR, P>
where
    RR: ReferralRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    referral_repo: Arc<RR>,
    profile_repo: Arc<P>,
    settings: RewardSettings,
}

impl<RR, P> ReferralService<RR, P>
where
    RR: ReferralRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    pub fn new(referral_repo: Arc<RR>, profile_repo: Arc<P>, settings: RewardSettings) -> Self {
        Self {
            referral_repo,
            profile_repo,
            settings,
        }
    }

    /// 使用邀请码
    #[instrument(skip(self), fields(referee_id = %referee_id))]
    pub async fn apply_referral(&self, referee_id: Uuid, code: &str) -> Result<ReferralApplied> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(ServiceError::InvalidReferralCode(code));
        }

        let referee = self
            .profile_repo
            .get(referee_id)
            .await?
            .ok_or(ServiceError::ProfileNotFound(referee_id))?;
        if referee.is_banned {
            return Err(ServiceError::UserBanned);
        }
        if referee.referred_by.is_some() {
            return Err(ServiceError::AlreadyReferred);
        }

        let referrer = self
            .profile_repo
            .get_by_referral_code(&code)
            .await?
            .ok_or_else(|| ServiceError::InvalidReferralCode(code.clone()))?;
        if referrer.id == referee_id {
            return Err(ServiceError::SelfReferral);
        }
        if referrer.is_banned {
            return Err(ServiceError::InvalidReferralCode(code));
        }

        let outcome = self
            .referral_repo
            .record_referral(&NewReferral {
                referrer_id: referrer.id,
                referee_id,
                referrer_points: self.settings.referrer_bonus,
                referee_points: self.settings.referee_bonus,
            })
            .await?;

        metrics::record_referral();
        metrics::record_points_awarded(
            PointSource::ReferralBonus.as_str(),
            self.settings.referrer_bonus + self.settings.referee_bonus,
        );
        if outcome.commission > 0 {
            metrics::record_points_awarded(
                PointSource::AmbassadorCommission.as_str(),
                outcome.commission,
            );
        }

        let new_badges = award_after_commit(self.profile_repo.as_ref(), referee_id).await;
        award_after_commit(self.profile_repo.as_ref(), referrer.id).await;

        info!(
            referrer_id = %referrer.id,
            referrer_count = outcome.referrer_referral_count,
            commission = outcome.commission,
            "邀请关系已建立"
        );

        Ok(ReferralApplied {
            referrer_id: referrer.id,
            points_awarded: self.settings.referee_bonus,
            new_badges,
        })
    }

    /// 我邀请的用户
    #[instrument(skip(self))]
    pub async fn my_referrals(&self, user_id: Uuid, limit: i64) -> Result<Vec<ReferralSummary>> {
        self.referral_repo
            .list_by_referrer(user_id, limit.clamp(1, MAX_REFERRALS_LISTED))
            .await
    }
}
