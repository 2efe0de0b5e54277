//! 内容审核仓储

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::ledger::map_unique_violation;
use super::traits::ModerationRepositoryTrait;
use crate::error::{Result, ServiceError};
use crate::models::{
    ContentReport, ModerationActionType, ModeratorAction, NewReport, Pagination, ReportStatus,
    ReportTarget, Resolution,
};

const REPORT_COLUMNS: &str = r#"
    id, reporter_id, target_type, target_id, reason, details, status,
    resolved_by, resolved_at, created_at
"#;

const ACTION_COLUMNS: &str = r#"
    id, moderator_id, report_id, action, target_type, target_id, note, created_at
"#;

pub struct ModerationRepository {
    pool: PgPool,
}

impl ModerationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_numeric_id(target_id: &str) -> Result<i64> {
        target_id
            .parse::<i64>()
            .map_err(|_| ServiceError::Validation(format!("无效的目标 ID: {}", target_id)))
    }

    /// 被举报内容的作者
    async fn content_owner_in_tx(
        conn: &mut PgConnection,
        target_type: ReportTarget,
        target_id: &str,
    ) -> Result<Uuid> {
        match target_type {
            ReportTarget::Profile => Uuid::parse_str(target_id)
                .map_err(|_| ServiceError::Validation(format!("无效的用户 ID: {}", target_id))),
            ReportTarget::Poll => {
                let id = Self::parse_numeric_id(target_id)?;
                sqlx::query_scalar::<_, Uuid>("SELECT creator_id FROM polls WHERE id = $1")
                    .bind(id)
                    .fetch_optional(conn)
                    .await?
                    .ok_or(ServiceError::PollNotFound(id))
            }
            ReportTarget::Comment => {
                let id = Self::parse_numeric_id(target_id)?;
                sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM poll_comments WHERE id = $1")
                    .bind(id)
                    .fetch_optional(conn)
                    .await?
                    .ok_or(ServiceError::CommentNotFound(id))
            }
        }
    }

    /// 执行审核动作的效果
    async fn apply_effect_in_tx(
        conn: &mut PgConnection,
        action: ModerationActionType,
        target_type: ReportTarget,
        target_id: &str,
    ) -> Result<()> {
        match action {
            ModerationActionType::Dismiss | ModerationActionType::Warn => Ok(()),
            ModerationActionType::HideContent => match target_type {
                ReportTarget::Poll => {
                    let id = Self::parse_numeric_id(target_id)?;
                    sqlx::query(
                        "UPDATE polls SET status = 'hidden', updated_at = NOW() WHERE id = $1",
                    )
                    .bind(id)
                    .execute(conn)
                    .await?;
                    Ok(())
                }
                ReportTarget::Comment => {
                    let id = Self::parse_numeric_id(target_id)?;
                    sqlx::query("UPDATE poll_comments SET is_hidden = TRUE WHERE id = $1")
                        .bind(id)
                        .execute(conn)
                        .await?;
                    Ok(())
                }
                ReportTarget::Profile => Err(ServiceError::Validation(
                    "用户档案不能被隐藏，请使用封禁".to_string(),
                )),
            },
            ModerationActionType::BanUser | ModerationActionType::UnbanUser => {
                let owner = Self::content_owner_in_tx(&mut *conn, target_type, target_id).await?;
                let banned = action == ModerationActionType::BanUser;
                sqlx::query("UPDATE profiles SET is_banned = $2, updated_at = NOW() WHERE id = $1")
                    .bind(owner)
                    .bind(banned)
                    .execute(conn)
                    .await?;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ModerationRepositoryTrait for ModerationRepository {
    async fn create_report(&self, report: &NewReport) -> Result<ContentReport> {
        let sql = format!(
            r#"
            INSERT INTO content_reports (reporter_id, target_type, target_id, reason, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        sqlx::query_as::<_, ContentReport>(&sql)
            .bind(report.reporter_id)
            .bind(report.target_type)
            .bind(&report.target_id)
            .bind(&report.reason)
            .bind(&report.details)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, "uq_content_reports_open", || ServiceError::DuplicateReport)
            })
    }

    async fn has_open_report(
        &self,
        reporter_id: Uuid,
        target_type: ReportTarget,
        target_id: &str,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM content_reports
                WHERE reporter_id = $1 AND target_type = $2 AND target_id = $3 AND status = 'open'
            )
            "#,
        )
        .bind(reporter_id)
        .bind(target_type)
        .bind(target_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: Pagination,
    ) -> Result<(Vec<ContentReport>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM content_reports WHERE ($1::varchar IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {} FROM content_reports
            WHERE ($1::varchar IS NULL OR status = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
            REPORT_COLUMNS
        );
        let items = sqlx::query_as::<_, ContentReport>(&sql)
            .bind(status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    async fn get_report(&self, id: i64) -> Result<Option<ContentReport>> {
        let sql = format!("SELECT {} FROM content_reports WHERE id = $1", REPORT_COLUMNS);
        let report = sqlx::query_as::<_, ContentReport>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(report)
    }

    async fn resolve(&self, resolution: &Resolution) -> Result<ModeratorAction> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM content_reports WHERE id = $1 FOR UPDATE",
            REPORT_COLUMNS
        );
        let report = sqlx::query_as::<_, ContentReport>(&sql)
            .bind(resolution.report_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::ReportNotFound(resolution.report_id))?;

        if report.status != ReportStatus::Open {
            return Err(ServiceError::ReportAlreadyResolved(report.id));
        }

        Self::apply_effect_in_tx(
            &mut tx,
            resolution.action,
            report.target_type,
            &report.target_id,
        )
        .await?;

        sqlx::query(
            r#"
            UPDATE content_reports
            SET status = $2, resolved_by = $3, resolved_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(report.id)
        .bind(resolution.action.resulting_status())
        .bind(resolution.moderator_id)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            INSERT INTO moderator_actions (moderator_id, report_id, action, target_type, target_id, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ACTION_COLUMNS
        );
        let action = sqlx::query_as::<_, ModeratorAction>(&sql)
            .bind(resolution.moderator_id)
            .bind(report.id)
            .bind(resolution.action)
            .bind(report.target_type)
            .bind(&report.target_id)
            .bind(&resolution.note)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(action)
    }

    async fn list_actions(&self, limit: i64) -> Result<Vec<ModeratorAction>> {
        let sql = format!(
            "SELECT {} FROM moderator_actions ORDER BY created_at DESC LIMIT $1",
            ACTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ModeratorAction>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
