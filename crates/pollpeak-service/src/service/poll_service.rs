//! 投票服务
//!
//! 负责投票的创建、参与、评论和生命周期管理。
//!
//! ## 投票流程
//!
//! 1. 校验投票存在、进行中且未过期
//! 2. 校验选项下标与用户状态
//! 3. 事务内写入投票记录、累加计数并发放积分
//! 4. 提交后检查徽章
//!
//! 重复投票由 `(poll_id, user_id)` 唯一约束兜底，预检查只为给出更友好的错误。

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pollpeak_shared::config::RewardSettings;
use pollpeak_shared::observability::metrics;
use tracing::{info, instrument};
use uuid::Uuid;

use super::badge_service::award_after_commit;
use super::dto::{Actor, CreatePollInput, PollCreated, PollResultsView, VoteOutcome};
use crate::error::{Result, ServiceError};
use crate::models::{
    NewPoll, Pagination, PointSource, Poll, PollComment, PollFilter, PollStatus,
};
use crate::repository::{PollRepositoryTrait, ProfileRepositoryTrait};

const MIN_TITLE_LEN: usize = 3;
const MAX_TITLE_LEN: usize = 200;
const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 10;
const MAX_OPTION_LEN: usize = 200;
const MAX_COMMENT_LEN: usize = 1000;
const DEFAULT_CATEGORY: &str = "general";

/// 校验并规整创建参数
fn validate_new_poll(
    creator_id: Uuid,
    input: CreatePollInput,
    now: DateTime<Utc>,
) -> Result<NewPoll> {
    let title = input.title.trim().to_string();
    let title_len = title.chars().count();
    if !(MIN_TITLE_LEN..=MAX_TITLE_LEN).contains(&title_len) {
        return Err(ServiceError::Validation(
            "标题长度须为 3-200 个字符".to_string(),
        ));
    }

    let options: Vec<String> = input
        .options
        .into_iter()
        .map(|o| o.trim().to_string())
        .collect();
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(ServiceError::Validation("选项数量须为 2-10 个".to_string()));
    }
    if options
        .iter()
        .any(|o| o.is_empty() || o.chars().count() > MAX_OPTION_LEN)
    {
        return Err(ServiceError::Validation(
            "选项不能为空且不能超过 200 个字符".to_string(),
        ));
    }
    let distinct: HashSet<String> = options.iter().map(|o| o.to_lowercase()).collect();
    if distinct.len() != options.len() {
        return Err(ServiceError::Validation("选项不能重复".to_string()));
    }

    if input.expires_at.is_some_and(|t| t <= now) {
        return Err(ServiceError::Validation("截止时间必须晚于当前时间".to_string()));
    }

    let category = input
        .category
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    Ok(NewPoll {
        creator_id,
        title,
        description: input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        category,
        options,
        expires_at: input.expires_at,
    })
}

/// 投票服务
pub struct PollService<PR, P>
where
    PR: PollRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    poll_repo: Arc<PR>,
    profile_repo: Arc<P>,
    settings: RewardSettings,
}

impl<PR, P> PollService<PR, P>
where
    PR: PollRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    pub fn new(poll_repo: Arc<PR>, profile_repo: Arc<P>, settings: RewardSettings) -> Self {
        Self {
            poll_repo,
            profile_repo,
            settings,
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

    async fn load_poll(&self, poll_id: i64) -> Result<Poll> {
        self.poll_repo
            .get(poll_id)
            .await?
            .ok_or(ServiceError::PollNotFound(poll_id))
    }

    /// 创建投票并发放创建积分
    #[instrument(skip(self, input), fields(creator_id = %creator_id))]
    pub async fn create_poll(
        &self,
        creator_id: Uuid,
        input: CreatePollInput,
        now: DateTime<Utc>,
    ) -> Result<PollCreated> {
        let new_poll = validate_new_poll(creator_id, input, now)?;
        self.ensure_not_banned(creator_id).await?;

        let points = self.settings.poll_creation_points;
        let poll = self.poll_repo.create(&new_poll, points).await?;
        metrics::record_points_awarded(PointSource::PollCreation.as_str(), points);

        let new_badges = award_after_commit(self.profile_repo.as_ref(), creator_id).await;
        info!(poll_id = poll.id, options = poll.options.len(), "投票创建成功");

        Ok(PollCreated {
            poll,
            points_awarded: points,
            new_badges,
        })
    }

    /// 投票列表
    ///
    /// 普通用户只能看到进行中或已结束的投票，未指定状态时默认进行中
    #[instrument(skip(self, filter))]
    pub async fn list_polls(
        &self,
        actor: Option<&Actor>,
        mut filter: PollFilter,
        page: Pagination,
    ) -> Result<(Vec<Poll>, i64)> {
        let is_moderator = actor.is_some_and(|a| a.is_moderator());
        if !is_moderator {
            filter.status = match filter.status {
                Some(PollStatus::Closed) => Some(PollStatus::Closed),
                _ => Some(PollStatus::Active),
            };
        }
        self.poll_repo.list(&filter, page).await
    }

    /// 获取投票详情，隐藏和草稿状态只对审核员可见
    #[instrument(skip(self))]
    pub async fn get_poll(&self, actor: Option<&Actor>, poll_id: i64) -> Result<Poll> {
        let poll = self.load_poll(poll_id).await?;
        let is_moderator = actor.is_some_and(|a| a.is_moderator());
        let is_creator = actor.is_some_and(|a| a.id == poll.creator_id);
        if !poll.is_visible() && !is_moderator && !is_creator {
            return Err(ServiceError::PollNotFound(poll_id));
        }
        Ok(poll)
    }

    /// 投票结果，可见性规则与 `get_poll` 一致
    #[instrument(skip(self))]
    pub async fn get_results(&self, actor: Option<&Actor>, poll_id: i64) -> Result<PollResultsView> {
        let poll = self.get_poll(actor, poll_id).await?;
        Ok(PollResultsView {
            results: poll.results(),
            shareable: poll.is_visible(),
        })
    }

    /// 参与投票
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn vote_on_poll(
        &self,
        user_id: Uuid,
        poll_id: i64,
        option_index: i32,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome> {
        let poll = self.load_poll(poll_id).await?;
        if poll.status != PollStatus::Active {
            return Err(ServiceError::PollNotActive(poll_id));
        }
        if poll.is_expired(now) {
            return Err(ServiceError::PollExpired(poll_id));
        }
        let in_bounds = usize::try_from(option_index).is_ok_and(|i| i < poll.options.len());
        if !in_bounds {
            return Err(ServiceError::InvalidOption {
                index: option_index,
                options: poll.options.len(),
            });
        }

        self.ensure_not_banned(user_id).await?;
        if self.poll_repo.has_voted(poll_id, user_id).await? {
            return Err(ServiceError::AlreadyVoted(poll_id));
        }

        let points = self.settings.vote_points;
        let poll = self
            .poll_repo
            .record_vote(poll_id, user_id, option_index, points)
            .await?;
        metrics::record_vote();
        metrics::record_points_awarded(PointSource::Vote.as_str(), points);

        let new_badges = award_after_commit(self.profile_repo.as_ref(), user_id).await;
        info!(
            poll_id = poll_id,
            option_index = option_index,
            total_votes = poll.total_votes,
            "投票成功"
        );

        Ok(VoteOutcome {
            poll,
            points_awarded: points,
            new_badges,
        })
    }

    /// 发表评论并发放评论积分
    #[instrument(skip(self, content), fields(user_id = %user_id))]
    pub async fn add_comment(
        &self,
        user_id: Uuid,
        poll_id: i64,
        content: &str,
    ) -> Result<PollComment> {
        let content = content.trim();
        let len = content.chars().count();
        if len == 0 || len > MAX_COMMENT_LEN {
            return Err(ServiceError::Validation(
                "评论长度须为 1-1000 个字符".to_string(),
            ));
        }

        let poll = self.load_poll(poll_id).await?;
        if !poll.is_visible() {
            return Err(ServiceError::PollNotFound(poll_id));
        }
        self.ensure_not_banned(user_id).await?;

        let points = self.settings.comment_points;
        let comment = self
            .poll_repo
            .add_comment(poll_id, user_id, content, points)
            .await?;
        metrics::record_points_awarded(PointSource::Comment.as_str(), points);
        award_after_commit(self.profile_repo.as_ref(), user_id).await;

        info!(poll_id = poll_id, comment_id = comment.id, "评论发表成功");
        Ok(comment)
    }

    /// 评论列表，隐藏评论只对审核员可见
    #[instrument(skip(self))]
    pub async fn list_comments(
        &self,
        actor: Option<&Actor>,
        poll_id: i64,
    ) -> Result<Vec<PollComment>> {
        self.get_poll(actor, poll_id).await?;
        let include_hidden = actor.is_some_and(|a| a.is_moderator());
        self.poll_repo.list_comments(poll_id, include_hidden).await
    }

    /// 删除评论（作者或审核员）
    #[instrument(skip(self))]
    pub async fn delete_comment(&self, actor: &Actor, comment_id: i64) -> Result<()> {
        let comment = self
            .poll_repo
            .get_comment(comment_id)
            .await?
            .ok_or(ServiceError::CommentNotFound(comment_id))?;
        if comment.user_id != actor.id && !actor.is_moderator() {
            return Err(ServiceError::Forbidden("只能删除自己的评论".to_string()));
        }

        if !self.poll_repo.delete_comment(comment_id).await? {
            return Err(ServiceError::CommentNotFound(comment_id));
        }
        info!(comment_id = comment_id, actor_id = %actor.id, "评论已删除");
        Ok(())
    }

    /// 提前结束投票（创建者或管理员）
    #[instrument(skip(self))]
    pub async fn close_poll(&self, actor: &Actor, poll_id: i64) -> Result<Poll> {
        let poll = self.load_poll(poll_id).await?;
        if poll.creator_id != actor.id && !actor.is_admin() {
            return Err(ServiceError::Forbidden("只有创建者可以结束投票".to_string()));
        }
        if poll.status != PollStatus::Active {
            return Err(ServiceError::PollNotActive(poll_id));
        }

        let poll = self.poll_repo.set_status(poll_id, PollStatus::Closed).await?;
        info!(poll_id = poll_id, actor_id = %actor.id, "投票已结束");
        Ok(poll)
    }

    /// 删除投票（管理员）
    #[instrument(skip(self))]
    pub async fn delete_poll(&self, actor: &Actor, poll_id: i64) -> Result<()> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden("只有管理员可以删除投票".to_string()));
        }
        if !self.poll_repo.delete(poll_id).await? {
            return Err(ServiceError::PollNotFound(poll_id));
        }
        info!(poll_id = poll_id, actor_id = %actor.id, "投票已删除");
        Ok(())
    }

    /// 关闭所有已到期的投票，由定时任务调用
    #[instrument(skip(self))]
    pub async fn close_expired_polls(&self, now: DateTime<Utc>) -> Result<u64> {
        let closed = self.poll_repo.close_expired(now).await?;
        if closed > 0 {
            info!(closed = closed, "已关闭到期投票");
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::repository::{MockPollRepositoryTrait, MockProfileRepositoryTrait};
    use crate::service::badge_service::tests::test_profile;
    use chrono::Duration;

    fn test_poll(id: i64, creator_id: Uuid) -> Poll {
        Poll {
            id,
            creator_id,
            title: "Tabs or spaces?".to_string(),
            description: None,
            category: "tech".to_string(),
            options: vec!["Tabs".to_string(), "Spaces".to_string()],
            vote_counts: vec![0, 0],
            total_votes: 0,
            status: PollStatus::Active,
            is_promoted: false,
            expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profiles_returning(banned: bool) -> MockProfileRepositoryTrait {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get().returning(move |id| {
            let mut profile = test_profile(id);
            profile.is_banned = banned;
            Ok(Some(profile))
        });
        repo.expect_append_badges()
            .returning(|_, names| Ok(names.to_vec()));
        repo
    }

    fn service(
        polls: MockPollRepositoryTrait,
        profiles: MockProfileRepositoryTrait,
    ) -> PollService<MockPollRepositoryTrait, MockProfileRepositoryTrait> {
        PollService::new(
            Arc::new(polls),
            Arc::new(profiles),
            RewardSettings::default(),
        )
    }

    fn input(options: &[&str]) -> CreatePollInput {
        CreatePollInput {
            title: "Favourite season".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_options_count() {
        let now = Utc::now();
        assert!(validate_new_poll(Uuid::new_v4(), input(&["only"]), now).is_err());
        let eleven: Vec<String> = (0..11).map(|i| format!("opt{}", i)).collect();
        let refs: Vec<&str> = eleven.iter().map(String::as_str).collect();
        assert!(validate_new_poll(Uuid::new_v4(), input(&refs), now).is_err());
        assert!(validate_new_poll(Uuid::new_v4(), input(&["a", "b"]), now).is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicates_and_blanks() {
        let now = Utc::now();
        assert!(validate_new_poll(Uuid::new_v4(), input(&["Yes", " yes "]), now).is_err());
        assert!(validate_new_poll(Uuid::new_v4(), input(&["Yes", "  "]), now).is_err());
    }

    #[test]
    fn test_validate_expiry_and_defaults() {
        let now = Utc::now();
        let mut past = input(&["a", "b"]);
        past.expires_at = Some(now - Duration::hours(1));
        assert!(validate_new_poll(Uuid::new_v4(), past, now).is_err());

        let poll = validate_new_poll(Uuid::new_v4(), input(&["a", "b"]), now).unwrap();
        assert_eq!(poll.category, "general");

        let mut short = input(&["a", "b"]);
        short.title = "hi".to_string();
        assert!(validate_new_poll(Uuid::new_v4(), short, now).is_err());
    }

    #[tokio::test]
    async fn test_create_poll_awards_points() {
        let creator = Uuid::new_v4();
        let mut polls = MockPollRepositoryTrait::new();
        polls
            .expect_create()
            .withf(|p, points| p.options.len() == 2 && *points == 10)
            .returning(move |_, _| Ok(test_poll(1, creator)));
        let svc = service(polls, profiles_returning(false));

        let created = svc
            .create_poll(creator, input(&["a", "b"]), Utc::now())
            .await
            .unwrap();
        assert_eq!(created.points_awarded, 10);
        assert_eq!(created.poll.id, 1);
    }

    #[tokio::test]
    async fn test_vote_success() {
        let user = Uuid::new_v4();
        let mut polls = MockPollRepositoryTrait::new();
        polls
            .expect_get()
            .returning(|id| Ok(Some(test_poll(id, Uuid::new_v4()))));
        polls.expect_has_voted().returning(|_, _| Ok(false));
        polls
            .expect_record_vote()
            .withf(move |poll_id, uid, idx, points| {
                *poll_id == 7 && *uid == user && *idx == 1 && *points == 5
            })
            .times(1)
            .returning(|poll_id, _, _, _| {
                let mut poll = test_poll(poll_id, Uuid::new_v4());
                poll.vote_counts = vec![0, 1];
                poll.total_votes = 1;
                Ok(poll)
            });
        let svc = service(polls, profiles_returning(false));

        let outcome = svc.vote_on_poll(user, 7, 1, Utc::now()).await.unwrap();
        assert_eq!(outcome.points_awarded, 5);
        assert_eq!(outcome.poll.total_votes, 1);
    }

    #[tokio::test]
    async fn test_vote_option_out_of_bounds() {
        let mut polls = MockPollRepositoryTrait::new();
        polls
            .expect_get()
            .returning(|id| Ok(Some(test_poll(id, Uuid::new_v4()))));
        polls.expect_record_vote().never();
        let svc = service(polls, profiles_returning(false));

        for index in [2, -1] {
            let err = svc
                .vote_on_poll(Uuid::new_v4(), 1, index, Utc::now())
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidOption { options: 2, .. }));
        }
    }

    #[tokio::test]
    async fn test_vote_twice_rejected() {
        let mut polls = MockPollRepositoryTrait::new();
        polls
            .expect_get()
            .returning(|id| Ok(Some(test_poll(id, Uuid::new_v4()))));
        polls.expect_has_voted().returning(|_, _| Ok(true));
        polls.expect_record_vote().never();
        let svc = service(polls, profiles_returning(false));

        let err = svc
            .vote_on_poll(Uuid::new_v4(), 3, 0, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyVoted(3)));
    }

    #[tokio::test]
    async fn test_vote_on_expired_or_closed_poll() {
        let now = Utc::now();
        let mut polls = MockPollRepositoryTrait::new();
        polls.expect_get().returning(move |id| {
            let mut poll = test_poll(id, Uuid::new_v4());
            if id == 1 {
                poll.expires_at = Some(now - Duration::minutes(5));
            } else {
                poll.status = PollStatus::Closed;
            }
            Ok(Some(poll))
        });
        let svc = service(polls, profiles_returning(false));

        let err = svc.vote_on_poll(Uuid::new_v4(), 1, 0, now).await.unwrap_err();
        assert!(matches!(err, ServiceError::PollExpired(1)));
        let err = svc.vote_on_poll(Uuid::new_v4(), 2, 0, now).await.unwrap_err();
        assert!(matches!(err, ServiceError::PollNotActive(2)));
    }

    #[tokio::test]
    async fn test_banned_user_cannot_vote() {
        let mut polls = MockPollRepositoryTrait::new();
        polls
            .expect_get()
            .returning(|id| Ok(Some(test_poll(id, Uuid::new_v4()))));
        polls.expect_record_vote().never();
        let svc = service(polls, profiles_returning(true));

        let err = svc
            .vote_on_poll(Uuid::new_v4(), 1, 0, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserBanned));
    }

    #[tokio::test]
    async fn test_hidden_poll_not_found_for_users() {
        let mut polls = MockPollRepositoryTrait::new();
        polls.expect_get().returning(|id| {
            let mut poll = test_poll(id, Uuid::new_v4());
            poll.status = PollStatus::Hidden;
            Ok(Some(poll))
        });
        let svc = service(polls, MockProfileRepositoryTrait::new());

        let user = Actor::new(Uuid::new_v4(), UserRole::User);
        let moderator = Actor::new(Uuid::new_v4(), UserRole::Moderator);
        assert!(matches!(
            svc.get_poll(Some(&user), 4).await,
            Err(ServiceError::PollNotFound(4))
        ));
        assert!(svc.get_poll(Some(&moderator), 4).await.is_ok());
    }

    #[tokio::test]
    async fn test_hidden_poll_results_not_shareable_for_creator() {
        let creator = Uuid::new_v4();
        let mut polls = MockPollRepositoryTrait::new();
        polls.expect_get().returning(move |id| {
            let mut poll = test_poll(id, creator);
            poll.status = if id == 7 {
                PollStatus::Hidden
            } else {
                PollStatus::Active
            };
            poll.vote_counts = vec![3, 1];
            poll.total_votes = 4;
            Ok(Some(poll))
        });
        let svc = service(polls, MockProfileRepositoryTrait::new());
        let owner = Actor::new(creator, UserRole::User);

        let hidden = svc.get_results(Some(&owner), 7).await.unwrap();
        assert!(!hidden.shareable);
        assert_eq!(hidden.results.total_votes, 4);
        assert!(matches!(
            svc.get_results(None, 7).await,
            Err(ServiceError::PollNotFound(7))
        ));

        let active = svc.get_results(None, 8).await.unwrap();
        assert!(active.shareable);
    }

    #[tokio::test]
    async fn test_list_polls_forces_visible_status() {
        let mut polls = MockPollRepositoryTrait::new();
        polls
            .expect_list()
            .withf(|f, _| f.status == Some(PollStatus::Active))
            .times(1)
            .returning(|_, _| Ok((vec![], 0)));
        let svc = service(polls, MockProfileRepositoryTrait::new());

        let filter = PollFilter {
            status: Some(PollStatus::Hidden),
            ..Default::default()
        };
        svc.list_polls(None, filter, Pagination::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_close_poll_requires_creator() {
        let creator = Uuid::new_v4();
        let mut polls = MockPollRepositoryTrait::new();
        polls
            .expect_get()
            .returning(move |id| Ok(Some(test_poll(id, creator))));
        polls
            .expect_set_status()
            .withf(|_, status| *status == PollStatus::Closed)
            .times(1)
            .returning(move |id, status| {
                let mut poll = test_poll(id, creator);
                poll.status = status;
                Ok(poll)
            });
        let svc = service(polls, MockProfileRepositoryTrait::new());

        let stranger = Actor::new(Uuid::new_v4(), UserRole::User);
        assert!(matches!(
            svc.close_poll(&stranger, 1).await,
            Err(ServiceError::Forbidden(_))
        ));
        let owner = Actor::new(creator, UserRole::User);
        let poll = svc.close_poll(&owner, 1).await.unwrap();
        assert_eq!(poll.status, PollStatus::Closed);
    }

    #[tokio::test]
    async fn test_comment_length_and_author_delete() {
        let author = Uuid::new_v4();
        let mut polls = MockPollRepositoryTrait::new();
        polls.expect_get_comment().returning(move |id| {
            Ok(Some(PollComment {
                id,
                poll_id: 1,
                user_id: author,
                username: None,
                content: "nice".to_string(),
                is_hidden: false,
                created_at: Utc::now(),
            }))
        });
        polls.expect_delete_comment().returning(|_| Ok(true));
        let svc = service(polls, MockProfileRepositoryTrait::new());

        let err = svc
            .add_comment(author, 1, &"x".repeat(1001))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let other = Actor::new(Uuid::new_v4(), UserRole::User);
        assert!(svc.delete_comment(&other, 9).await.is_err());
        let moderator = Actor::new(Uuid::new_v4(), UserRole::Moderator);
        assert!(svc.delete_comment(&moderator, 9).await.is_ok());
    }
}
