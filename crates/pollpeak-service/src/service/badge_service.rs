//! 徽章服务
//!
//! 徽章判定是纯函数：比较档案计数与目录阈值，返回新满足且尚未持有的徽章。
//! 其他服务在积分或计数变化后调用 `award_new_badges` 补发徽章。

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::{BADGE_CATALOGUE, BadgeDefinition, Profile, UserBadgeView};
use crate::repository::ProfileRepositoryTrait;

/// 新满足条件且尚未持有的徽章
pub fn evaluate(profile: &Profile) -> Vec<&'static BadgeDefinition> {
    BADGE_CATALOGUE
        .iter()
        .filter(|badge| badge.is_satisfied_by(profile) && !profile.has_badge(badge.name))
        .collect()
}

/// 检查并授予徽章，返回本次新获得的徽章名称
///
/// 追加操作本身是幂等的，重复调用不会产生重复徽章
pub async fn award_new_badges<P>(profile_repo: &P, user_id: Uuid) -> Result<Vec<String>>
where
    P: ProfileRepositoryTrait + ?Sized,
{
    let profile = profile_repo
        .get(user_id)
        .await?
        .ok_or(ServiceError::ProfileNotFound(user_id))?;

    let earned: Vec<String> = evaluate(&profile)
        .into_iter()
        .map(|b| b.name.to_string())
        .collect();
    if earned.is_empty() {
        return Ok(earned);
    }

    profile_repo.append_badges(user_id, &earned).await?;
    info!(user_id = %user_id, badges = ?earned, "徽章授予成功");
    Ok(earned)
}

/// 业务写入已提交后的徽章补发，失败只记录日志
pub(crate) async fn award_after_commit<P>(profile_repo: &P, user_id: Uuid) -> Vec<String>
where
    P: ProfileRepositoryTrait + ?Sized,
{
    match award_new_badges(profile_repo, user_id).await {
        Ok(badges) => badges,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "徽章检查失败，下次操作时重试");
            Vec::new()
        }
    }
}

pub struct BadgeService<P>
where
    P: ProfileRepositoryTrait,
{
    profile_repo: Arc<P>,
}

impl<P> BadgeService<P>
where
    P: ProfileRepositoryTrait,
{
    pub fn new(profile_repo: Arc<P>) -> Self {
        Self { profile_repo }
    }

    pub fn catalogue(&self) -> &'static [BadgeDefinition] {
        BADGE_CATALOGUE
    }

    #[instrument(skip(self))]
    pub async fn check_and_award_badges(&self, user_id: Uuid) -> Result<Vec<String>> {
        award_new_badges(self.profile_repo.as_ref(), user_id).await
    }

    /// 目录中每个徽章的获得状态与进度
    #[instrument(skip(self))]
    pub async fn user_badges(&self, user_id: Uuid) -> Result<Vec<UserBadgeView>> {
        let profile = self
            .profile_repo
            .get(user_id)
            .await?
            .ok_or(ServiceError::ProfileNotFound(user_id))?;

        Ok(BADGE_CATALOGUE
            .iter()
            .map(|badge| UserBadgeView {
                badge: badge.clone(),
                earned: profile.has_badge(badge.name),
                progress: badge.metric.value(&profile).min(badge.threshold),
            })
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::repository::MockProfileRepositoryTrait;
    use chrono::Utc;

    pub(crate) fn test_profile(id: Uuid) -> Profile {
        Profile {
            id,
            email: "voter@example.com".to_string(),
            username: "voter".to_string(),
            display_name: None,
            avatar_url: None,
            bio: None,
            role: UserRole::User,
            points: 0,
            total_points_earned: 0,
            current_streak: 0,
            longest_streak: 0,
            total_votes: 0,
            polls_created: 0,
            trivia_games_played: 0,
            referral_count: 0,
            referral_code: "ABCD1234".to_string(),
            referred_by: None,
            badges: Vec::new(),
            is_banned: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn names(badges: Vec<&BadgeDefinition>) -> Vec<&str> {
        badges.into_iter().map(|b| b.name).collect()
    }

    #[test]
    fn test_new_profile_has_no_badges() {
        let profile = test_profile(Uuid::new_v4());
        assert!(evaluate(&profile).is_empty());
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let mut profile = test_profile(Uuid::new_v4());
        profile.total_votes = 50;
        profile.current_streak = 3;
        profile.longest_streak = 3;
        assert_eq!(
            names(evaluate(&profile)),
            vec!["First Vote", "Active Voter", "Streak Starter"]
        );
    }

    #[test]
    fn test_held_badges_are_skipped() {
        let mut profile = test_profile(Uuid::new_v4());
        profile.total_votes = 1;
        profile.polls_created = 1;
        profile.badges = vec!["First Vote".to_string()];
        assert_eq!(names(evaluate(&profile)), vec!["Poll Creator"]);
    }

    #[test]
    fn test_points_badges() {
        let mut profile = test_profile(Uuid::new_v4());
        profile.points = 5;
        profile.total_points_earned = 10_000;
        assert_eq!(
            names(evaluate(&profile)),
            vec!["Point Collector", "High Roller"]
        );
    }

    #[tokio::test]
    async fn test_award_new_badges_persists() {
        let user_id = Uuid::new_v4();
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get().returning(move |id| {
            let mut profile = test_profile(id);
            profile.referral_count = 1;
            Ok(Some(profile))
        });
        repo.expect_append_badges()
            .withf(move |id, names| *id == user_id && names.len() == 1 && names[0] == "Recruiter")
            .times(1)
            .returning(|_, names| Ok(names.to_vec()));

        let earned = award_new_badges(&repo, user_id).await.unwrap();
        assert_eq!(earned, vec!["Recruiter".to_string()]);
    }

    #[tokio::test]
    async fn test_award_is_idempotent_when_nothing_new() {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get().returning(|id| {
            let mut profile = test_profile(id);
            profile.total_votes = 1;
            profile.badges = vec!["First Vote".to_string()];
            Ok(Some(profile))
        });
        repo.expect_append_badges().never();

        let earned = award_new_badges(&repo, Uuid::new_v4()).await.unwrap();
        assert!(earned.is_empty());
    }

    #[tokio::test]
    async fn test_user_badges_reports_progress() {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get().returning(|id| {
            let mut profile = test_profile(id);
            profile.total_votes = 20;
            profile.badges = vec!["First Vote".to_string()];
            Ok(Some(profile))
        });
        let service = BadgeService::new(Arc::new(repo));

        let views = service.user_badges(Uuid::new_v4()).await.unwrap();
        assert_eq!(views.len(), BADGE_CATALOGUE.len());
        assert!(views[0].earned);
        assert_eq!(views[0].progress, 1);
        assert!(!views[1].earned);
        assert_eq!(views[1].progress, 20);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get().returning(|_| Ok(None));
        let service = BadgeService::new(Arc::new(repo));
        let err = service.check_and_award_badges(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::ProfileNotFound(_)));
    }
}
