//! 每日奖励服务
//!
//! 包含每日签到、幸运转盘和广告奖励，均以 UTC 自然日为周期：
//!
//! - 签到：连续天数推进，积分 = 基础积分 × 倍率(新连续天数)
//! - 转盘：每天一次，积分 = 档位积分 × 倍率(当前有效连续天数)
//! - 广告：固定积分，每天有上限，跨天计数归零
//!
//! 同一天的重复请求由仓储层的条件更新拒绝，预检查只为给出更友好的错误。

use std::sync::Arc;

use chrono::NaiveDate;
use pollpeak_shared::config::RewardSettings;
use pollpeak_shared::observability::metrics;
use tracing::{info, instrument};
use uuid::Uuid;

use super::badge_service::award_after_commit;
use super::dto::{AdWatchResult, DailyClaimResult, DailyStatus, SpinResult};
use crate::error::{Result, ServiceError};
use crate::models::{AdWatch, DailyClaim, DailyRewardHistory, PointSource, SpinRecord};
use crate::repository::{ProfileRepositoryTrait, RewardRepositoryTrait};
use crate::scoring::{
    RandomSource, SpinBand, StreakMultiplier, advance_streak, effective_streak,
};

const MAX_HISTORY: i64 = 100;

pub struct RewardService<R, P>
where
    R: RewardRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    reward_repo: Arc<R>,
    profile_repo: Arc<P>,
    settings: RewardSettings,
    multiplier: StreakMultiplier,
    random: Arc<dyn RandomSource>,
}

impl<R, P> RewardService<R, P>
where
    R: RewardRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    pub fn new(
        reward_repo: Arc<R>,
        profile_repo: Arc<P>,
        settings: RewardSettings,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        let multiplier = StreakMultiplier::from(&settings);
        Self {
            reward_repo,
            profile_repo,
            settings,
            multiplier,
            random,
        }
    }

    async fn ensure_not_banned(&self, user_id: Uuid) -> Result<()> {
        let profile = self
            .profile_repo
            .get(user_id)
            .await?
            .ok_or(ServiceError::ProfileNotFound(user_id))?;
        if profile.is_banned {
            return Err(ServiceError::UserBanned);
        }
        Ok(())
    }

    /// 今日奖励状态
    #[instrument(skip(self))]
    pub async fn daily_status(&self, user_id: Uuid, today: NaiveDate) -> Result<DailyStatus> {
        let state = self.reward_repo.get_state(user_id).await?;
        let max_ads = self.settings.max_ads_per_day;

        let status = match state {
            None => DailyStatus {
                can_claim_daily: true,
                can_spin: true,
                current_streak: 0,
                multiplier: self.multiplier.for_streak(0),
                next_claim_points: self.multiplier.apply(self.settings.daily_base_points, 1),
                ads_watched_today: 0,
                ads_remaining: max_ads,
                total_spins: 0,
            },
            Some(state) => {
                let streak = effective_streak(state.last_claim_date, state.streak(), today);
                let next_claim_points = advance_streak(state.last_claim_date, state.streak(), today)
                    .new_streak()
                    .map_or(0, |n| self.multiplier.apply(self.settings.daily_base_points, n));
                let ads_watched = state.ads_watched_on(today);

                DailyStatus {
                    can_claim_daily: !state.claimed_on(today),
                    can_spin: !state.spun_on(today),
                    current_streak: streak,
                    multiplier: self.multiplier.for_streak(streak),
                    next_claim_points,
                    ads_watched_today: ads_watched,
                    ads_remaining: (max_ads - ads_watched).max(0),
                    total_spins: state.total_spins,
                }
            }
        };
        Ok(status)
    }

    /// 每日签到
    #[instrument(skip(self))]
    pub async fn claim_daily_reward(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<DailyClaimResult> {
        self.ensure_not_banned(user_id).await?;
        let state = self.reward_repo.get_state(user_id).await?;
        let (last_claim, current) = state
            .as_ref()
            .map_or((None, 0), |s| (s.last_claim_date, s.streak()));

        let new_streak = advance_streak(last_claim, current, today)
            .new_streak()
            .ok_or(ServiceError::DailyRewardAlreadyClaimed)?;
        let multiplier = self.multiplier.for_streak(new_streak);
        let points = self
            .multiplier
            .apply(self.settings.daily_base_points, new_streak);

        self.reward_repo
            .apply_daily_claim(&DailyClaim {
                user_id,
                today,
                new_streak: i32::try_from(new_streak).unwrap_or(i32::MAX),
                points,
                multiplier,
            })
            .await?;
        metrics::record_daily_claim();
        metrics::record_points_awarded(PointSource::DailyLogin.as_str(), points);

        let new_badges = award_after_commit(self.profile_repo.as_ref(), user_id).await;
        info!(streak = new_streak, points = points, "每日签到成功");

        Ok(DailyClaimResult {
            points_awarded: points,
            streak: new_streak,
            multiplier,
            new_badges,
        })
    }

    /// 幸运转盘，每天一次
    #[instrument(skip(self))]
    pub async fn perform_spin(&self, user_id: Uuid, today: NaiveDate) -> Result<SpinResult> {
        self.ensure_not_banned(user_id).await?;
        let state = self.reward_repo.get_state(user_id).await?;
        if state.as_ref().is_some_and(|s| s.spun_on(today)) {
            return Err(ServiceError::SpinAlreadyUsed);
        }

        let streak = state
            .as_ref()
            .map_or(0, |s| effective_streak(s.last_claim_date, s.streak(), today));
        let band = SpinBand::from_roll(self.random.roll());
        let base_points = band.base_points();
        let multiplier = self.multiplier.for_streak(streak);
        let points = self.multiplier.apply(base_points, streak);

        self.reward_repo
            .apply_spin(&SpinRecord {
                user_id,
                today,
                band,
                points,
                multiplier,
                streak: i32::try_from(streak).unwrap_or(i32::MAX),
            })
            .await?;
        metrics::record_spin(band.as_str());
        metrics::record_points_awarded(PointSource::Spin.as_str(), points);

        let new_badges = award_after_commit(self.profile_repo.as_ref(), user_id).await;
        info!(band = band.as_str(), streak = streak, points = points, "转盘完成");

        Ok(SpinResult {
            band,
            base_points,
            multiplier,
            points_awarded: points,
            streak,
            new_badges,
        })
    }

    /// 观看广告奖励
    #[instrument(skip(self))]
    pub async fn record_ad_watch(&self, user_id: Uuid, today: NaiveDate) -> Result<AdWatchResult> {
        self.ensure_not_banned(user_id).await?;
        let max_ads = self.settings.max_ads_per_day;
        let watched = self
            .reward_repo
            .get_state(user_id)
            .await?
            .map_or(0, |s| s.ads_watched_on(today));
        if watched >= max_ads {
            return Err(ServiceError::AdLimitReached(max_ads));
        }

        let points = self.settings.ad_watch_points;
        let state = self
            .reward_repo
            .apply_ad_watch(&AdWatch {
                user_id,
                today,
                points,
                max_per_day: max_ads,
            })
            .await?;
        metrics::record_ad_reward();
        metrics::record_points_awarded(PointSource::AdWatch.as_str(), points);
        award_after_commit(self.profile_repo.as_ref(), user_id).await;

        let watched = state.ads_watched_on(today);
        info!(ads_watched_today = watched, "广告奖励已发放");
        Ok(AdWatchResult {
            points_awarded: points,
            ads_watched_today: watched,
            ads_remaining: (max_ads - watched).max(0),
        })
    }

    #[instrument(skip(self))]
    pub async fn reward_history(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<DailyRewardHistory>> {
        self.reward_repo
            .history(user_id, limit.clamp(1, MAX_HISTORY))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserDailyReward;
    use crate::repository::{MockProfileRepositoryTrait, MockRewardRepositoryTrait};
    use crate::service::badge_service::tests::test_profile;
    use chrono::Utc;

    struct FixedRoll(f64);

    impl RandomSource for FixedRoll {
        fn roll(&self) -> f64 {
            self.0
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn state(last_claim: Option<NaiveDate>, streak: i32) -> UserDailyReward {
        UserDailyReward {
            user_id: Uuid::new_v4(),
            last_claim_date: last_claim,
            last_spin_date: None,
            ads_watched_date: None,
            ads_watched_today: 0,
            current_streak: streak,
            total_spins: 0,
            updated_at: Utc::now(),
        }
    }

    fn profiles() -> MockProfileRepositoryTrait {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get().returning(|id| Ok(Some(test_profile(id))));
        repo.expect_append_badges()
            .returning(|_, names| Ok(names.to_vec()));
        repo
    }

    fn service(
        rewards: MockRewardRepositoryTrait,
        roll: f64,
    ) -> RewardService<MockRewardRepositoryTrait, MockProfileRepositoryTrait> {
        RewardService::new(
            Arc::new(rewards),
            Arc::new(profiles()),
            RewardSettings::default(),
            Arc::new(FixedRoll(roll)),
        )
    }

    #[tokio::test]
    async fn test_first_claim_starts_streak() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards.expect_get_state().returning(|_| Ok(None));
        rewards
            .expect_apply_daily_claim()
            .withf(|c| c.new_streak == 1 && c.points == 11)
            .times(1)
            .returning(|c| Ok(state(Some(c.today), c.new_streak)));
        let svc = service(rewards, 0.0);

        let result = svc.claim_daily_reward(Uuid::new_v4(), date(10)).await.unwrap();
        assert_eq!(result.streak, 1);
        assert_eq!(result.points_awarded, 11);
    }

    #[tokio::test]
    async fn test_consecutive_claim_continues_streak() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_state()
            .returning(|_| Ok(Some(state(Some(date(9)), 4))));
        rewards
            .expect_apply_daily_claim()
            .withf(|c| c.new_streak == 5 && c.points == 15)
            .times(1)
            .returning(|c| Ok(state(Some(c.today), c.new_streak)));
        let svc = service(rewards, 0.0);

        let result = svc.claim_daily_reward(Uuid::new_v4(), date(10)).await.unwrap();
        assert_eq!(result.streak, 5);
        assert_eq!(result.points_awarded, 15);
    }

    #[tokio::test]
    async fn test_same_day_claim_rejected() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_state()
            .returning(|_| Ok(Some(state(Some(date(10)), 2))));
        rewards.expect_apply_daily_claim().never();
        let svc = service(rewards, 0.0);

        let err = svc
            .claim_daily_reward(Uuid::new_v4(), date(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DailyRewardAlreadyClaimed));
    }

    #[tokio::test]
    async fn test_spin_uses_effective_streak() {
        let mut rewards = MockRewardRepositoryTrait::new();
        // 昨天签到，连续 3 天，仍然有效
        rewards
            .expect_get_state()
            .returning(|_| Ok(Some(state(Some(date(9)), 3))));
        rewards
            .expect_apply_spin()
            .withf(|s| s.band == SpinBand::Rare && s.points == 65 && s.streak == 3)
            .times(1)
            .returning(|s| {
                let mut st = state(Some(date(9)), 3);
                st.last_spin_date = Some(s.today);
                st.total_spins = 1;
                Ok(st)
            });
        // 70 落在 Rare 档 [65, 85)
        let svc = service(rewards, 70.0);

        let result = svc.perform_spin(Uuid::new_v4(), date(10)).await.unwrap();
        assert_eq!(result.band, SpinBand::Rare);
        assert_eq!(result.base_points, 50);
        assert_eq!(result.points_awarded, 65);
    }

    #[tokio::test]
    async fn test_spin_after_broken_streak_has_no_bonus() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards
            .expect_get_state()
            .returning(|_| Ok(Some(state(Some(date(1)), 8))));
        rewards
            .expect_apply_spin()
            .withf(|s| s.streak == 0 && s.points == 10)
            .returning(|_| Ok(state(Some(date(1)), 8)));
        let svc = service(rewards, 0.0);

        let result = svc.perform_spin(Uuid::new_v4(), date(10)).await.unwrap();
        assert_eq!(result.band, SpinBand::Common);
        assert_eq!(result.points_awarded, 10);
    }

    #[tokio::test]
    async fn test_second_spin_same_day_rejected() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards.expect_get_state().returning(|_| {
            let mut st = state(None, 0);
            st.last_spin_date = Some(date(10));
            Ok(Some(st))
        });
        rewards.expect_apply_spin().never();
        let svc = service(rewards, 0.0);

        let err = svc.perform_spin(Uuid::new_v4(), date(10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::SpinAlreadyUsed));
    }

    #[tokio::test]
    async fn test_ad_cap_and_reset() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards.expect_get_state().returning(|_| {
            let mut st = state(None, 0);
            st.ads_watched_date = Some(date(10));
            st.ads_watched_today = 10;
            Ok(Some(st))
        });
        rewards
            .expect_apply_ad_watch()
            .withf(|ad| ad.today == date(11))
            .times(1)
            .returning(|ad| {
                let mut st = state(None, 0);
                st.ads_watched_date = Some(ad.today);
                st.ads_watched_today = 1;
                Ok(st)
            });
        let svc = service(rewards, 0.0);

        let err = svc
            .record_ad_watch(Uuid::new_v4(), date(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AdLimitReached(10)));

        let result = svc.record_ad_watch(Uuid::new_v4(), date(11)).await.unwrap();
        assert_eq!(result.ads_watched_today, 1);
        assert_eq!(result.ads_remaining, 9);
    }

    #[tokio::test]
    async fn test_daily_status() {
        let mut rewards = MockRewardRepositoryTrait::new();
        rewards.expect_get_state().returning(|_| {
            let mut st = state(Some(date(9)), 2);
            st.ads_watched_date = Some(date(10));
            st.ads_watched_today = 3;
            st.total_spins = 4;
            Ok(Some(st))
        });
        let svc = service(rewards, 0.0);

        let status = svc.daily_status(Uuid::new_v4(), date(10)).await.unwrap();
        assert!(status.can_claim_daily);
        assert!(status.can_spin);
        assert_eq!(status.current_streak, 2);
        assert_eq!(status.next_claim_points, 13);
        assert_eq!(status.ads_remaining, 7);
        assert_eq!(status.total_spins, 4);
    }
}
