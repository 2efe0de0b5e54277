//! 内容审核服务
//!
//! 用户举报投票、评论或其他用户；审核员处理举报时执行对应效果
//! （隐藏内容、封禁/解封内容作者）并记录审核动作。同一举报人对同一目标
//! 只能有一条未处理的举报。

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{Actor, ReportInput};
use crate::error::{Result, ServiceError};
use crate::models::{
    ContentReport, ModerationActionType, ModeratorAction, NewReport, Pagination, ReportStatus,
    ReportTarget, Resolution,
};
use crate::repository::{ModerationRepositoryTrait, PollRepositoryTrait, ProfileRepositoryTrait};

const MIN_REASON_LEN: usize = 3;
const MAX_REASON_LEN: usize = 200;
const MAX_DETAILS_LEN: usize = 2000;
const MAX_ACTIONS_LISTED: i64 = 200;

fn parse_numeric_target(target_id: &str) -> Result<i64> {
    target_id
        .trim()
        .parse::<i64>()
        .map_err(|_| ServiceError::Validation(format!("无效的目标 ID: {}", target_id)))
}

pub struct ModerationService<M, PR, P>
where
    M: ModerationRepositoryTrait,
    PR: PollRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    moderation_repo: Arc<M>,
    poll_repo: Arc<PR>,
    profile_repo: Arc<P>,
}

impl<M, PR, P> ModerationService<M, PR, P>
where
    M: ModerationRepositoryTrait,
    PR: PollRepositoryTrait,
    P: ProfileRepositoryTrait,
{
    pub fn new(moderation_repo: Arc<M>, poll_repo: Arc<PR>, profile_repo: Arc<P>) -> Self {
        Self {
            moderation_repo,
            poll_repo,
            profile_repo,
        }
    }

    /// 校验目标存在，返回规范化后的目标 ID
    async fn resolve_target(
        &self,
        reporter_id: Uuid,
        target_type: ReportTarget,
        target_id: &str,
    ) -> Result<String> {
        match target_type {
            ReportTarget::Poll => {
                let id = parse_numeric_target(target_id)?;
                self.poll_repo
                    .get(id)
                    .await?
                    .ok_or(ServiceError::PollNotFound(id))?;
                Ok(id.to_string())
            }
            ReportTarget::Comment => {
                let id = parse_numeric_target(target_id)?;
                self.poll_repo
                    .get_comment(id)
                    .await?
                    .ok_or(ServiceError::CommentNotFound(id))?;
                Ok(id.to_string())
            }
            ReportTarget::Profile => {
                let id = Uuid::parse_str(target_id.trim()).map_err(|_| {
                    ServiceError::Validation(format!("无效的用户 ID: {}", target_id))
                })?;
                if id == reporter_id {
                    return Err(ServiceError::Validation("不能举报自己".to_string()));
                }
                self.profile_repo
                    .get(id)
                    .await?
                    .ok_or(ServiceError::ProfileNotFound(id))?;
                Ok(id.to_string())
            }
        }
    }

    /// 提交举报
    #[instrument(skip(self, input), fields(reporter_id = %reporter_id))]
    pub async fn report(&self, reporter_id: Uuid, input: ReportInput) -> Result<ContentReport> {
        let reason = input.reason.trim().to_string();
        if !(MIN_REASON_LEN..=MAX_REASON_LEN).contains(&reason.chars().count()) {
            return Err(ServiceError::Validation(
                "举报理由长度须为 3-200 个字符".to_string(),
            ));
        }
        let details = input
            .details
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if details
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DETAILS_LEN)
        {
            return Err(ServiceError::Validation(
                "补充说明不能超过 2000 个字符".to_string(),
            ));
        }

        let target_id = self
            .resolve_target(reporter_id, input.target_type, &input.target_id)
            .await?;
        if self
            .moderation_repo
            .has_open_report(reporter_id, input.target_type, &target_id)
            .await?
        {
            return Err(ServiceError::DuplicateReport);
        }

        let report = self
            .moderation_repo
            .create_report(&NewReport {
                reporter_id,
                target_type: input.target_type,
                target_id,
                reason,
                details,
            })
            .await?;
        info!(
            report_id = report.id,
            target_type = ?report.target_type,
            target_id = %report.target_id,
            "举报已提交"
        );
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: Pagination,
    ) -> Result<(Vec<ContentReport>, i64)> {
        self.moderation_repo.list_reports(status, page).await
    }

    /// 处理举报（审核员）
    #[instrument(skip(self, note))]
    pub async fn resolve(
        &self,
        moderator: &Actor,
        report_id: i64,
        action: ModerationActionType,
        note: Option<String>,
    ) -> Result<ModeratorAction> {
        if !moderator.is_moderator() {
            return Err(ServiceError::Forbidden("需要审核员权限".to_string()));
        }

        let report = self
            .moderation_repo
            .get_report(report_id)
            .await?
            .ok_or(ServiceError::ReportNotFound(report_id))?;
        if report.status != ReportStatus::Open {
            return Err(ServiceError::ReportAlreadyResolved(report_id));
        }
        if action == ModerationActionType::HideContent
            && report.target_type == ReportTarget::Profile
        {
            return Err(ServiceError::Validation(
                "用户档案不能被隐藏，请使用封禁".to_string(),
            ));
        }

        let recorded = self
            .moderation_repo
            .resolve(&Resolution {
                report_id,
                moderator_id: moderator.id,
                action,
                note: note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            })
            .await?;
        info!(
            report_id = report_id,
            moderator_id = %moderator.id,
            action = ?action,
            "举报已处理"
        );
        Ok(recorded)
    }

    #[instrument(skip(self))]
    pub async fn list_actions(&self, limit: i64) -> Result<Vec<ModeratorAction>> {
        self.moderation_repo
            .list_actions(limit.clamp(1, MAX_ACTIONS_LISTED))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Poll, PollStatus, UserRole};
    use crate::repository::{
        MockModerationRepositoryTrait, MockPollRepositoryTrait, MockProfileRepositoryTrait,
    };
    use chrono::Utc;

    fn report(id: i64, target_type: ReportTarget, status: ReportStatus) -> ContentReport {
        ContentReport {
            id,
            reporter_id: Uuid::new_v4(),
            target_type,
            target_id: "1".to_string(),
            reason: "spam".to_string(),
            details: None,
            status,
            resolved_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    fn polls() -> MockPollRepositoryTrait {
        let mut repo = MockPollRepositoryTrait::new();
        repo.expect_get().returning(|id| {
            Ok(Some(Poll {
                id,
                creator_id: Uuid::new_v4(),
                title: "Spam poll".to_string(),
                description: None,
                category: "general".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                vote_counts: vec![0, 0],
                total_votes: 0,
                status: PollStatus::Active,
                is_promoted: false,
                expires_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });
        repo
    }

    fn input(target_id: &str) -> ReportInput {
        ReportInput {
            target_type: ReportTarget::Poll,
            target_id: target_id.to_string(),
            reason: "spam content".to_string(),
            details: None,
        }
    }

    #[tokio::test]
    async fn test_report_poll() {
        let mut moderation = MockModerationRepositoryTrait::new();
        moderation
            .expect_has_open_report()
            .returning(|_, _, _| Ok(false));
        moderation
            .expect_create_report()
            .withf(|r| r.target_id == "12" && r.target_type == ReportTarget::Poll)
            .times(1)
            .returning(|r| {
                let mut created = report(1, r.target_type, ReportStatus::Open);
                created.target_id = r.target_id.clone();
                Ok(created)
            });
        let service = ModerationService::new(
            Arc::new(moderation),
            Arc::new(polls()),
            Arc::new(MockProfileRepositoryTrait::new()),
        );

        let created = service.report(Uuid::new_v4(), input(" 12 ")).await.unwrap();
        assert_eq!(created.target_id, "12");
    }

    #[tokio::test]
    async fn test_duplicate_open_report() {
        let mut moderation = MockModerationRepositoryTrait::new();
        moderation
            .expect_has_open_report()
            .returning(|_, _, _| Ok(true));
        moderation.expect_create_report().never();
        let service = ModerationService::new(
            Arc::new(moderation),
            Arc::new(polls()),
            Arc::new(MockProfileRepositoryTrait::new()),
        );

        let err = service.report(Uuid::new_v4(), input("12")).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateReport));
    }

    #[tokio::test]
    async fn test_invalid_target_id() {
        let service = ModerationService::new(
            Arc::new(MockModerationRepositoryTrait::new()),
            Arc::new(polls()),
            Arc::new(MockProfileRepositoryTrait::new()),
        );
        let err = service
            .report(Uuid::new_v4(), input("not-a-number"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resolve_rejects_resolved_report() {
        let mut moderation = MockModerationRepositoryTrait::new();
        moderation
            .expect_get_report()
            .returning(|id| Ok(Some(report(id, ReportTarget::Poll, ReportStatus::Dismissed))));
        moderation.expect_resolve().never();
        let service = ModerationService::new(
            Arc::new(moderation),
            Arc::new(polls()),
            Arc::new(MockProfileRepositoryTrait::new()),
        );

        let moderator = Actor::new(Uuid::new_v4(), UserRole::Moderator);
        let err = service
            .resolve(&moderator, 3, ModerationActionType::HideContent, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ReportAlreadyResolved(3)));
    }

    #[tokio::test]
    async fn test_hide_profile_is_invalid() {
        let mut moderation = MockModerationRepositoryTrait::new();
        moderation
            .expect_get_report()
            .returning(|id| Ok(Some(report(id, ReportTarget::Profile, ReportStatus::Open))));
        moderation.expect_resolve().never();
        let service = ModerationService::new(
            Arc::new(moderation),
            Arc::new(polls()),
            Arc::new(MockProfileRepositoryTrait::new()),
        );

        let moderator = Actor::new(Uuid::new_v4(), UserRole::Admin);
        let err = service
            .resolve(&moderator, 3, ModerationActionType::HideContent, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resolve_records_action() {
        let moderator_id = Uuid::new_v4();
        let mut moderation = MockModerationRepositoryTrait::new();
        moderation
            .expect_get_report()
            .returning(|id| Ok(Some(report(id, ReportTarget::Comment, ReportStatus::Open))));
        moderation
            .expect_resolve()
            .withf(move |r| {
                r.report_id == 5
                    && r.moderator_id == moderator_id
                    && r.action == ModerationActionType::BanUser
                    && r.note.is_none()
            })
            .times(1)
            .returning(|r| {
                Ok(ModeratorAction {
                    id: 1,
                    moderator_id: r.moderator_id,
                    report_id: Some(r.report_id),
                    action: r.action,
                    target_type: ReportTarget::Comment,
                    target_id: "1".to_string(),
                    note: None,
                    created_at: Utc::now(),
                })
            });
        let service = ModerationService::new(
            Arc::new(moderation),
            Arc::new(polls()),
            Arc::new(MockProfileRepositoryTrait::new()),
        );

        let moderator = Actor::new(moderator_id, UserRole::Moderator);
        let action = service
            .resolve(&moderator, 5, ModerationActionType::BanUser, Some("  ".to_string()))
            .await
            .unwrap();
        assert_eq!(action.action, ModerationActionType::BanUser);
    }
}
