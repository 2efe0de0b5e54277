//! 投票仓储
//!
//! 投票计数存放在 `polls.vote_counts` 数组中，与 `poll_votes` 明细在同一事务内更新

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::ledger::{award_points_in_tx, map_unique_violation};
use super::traits::PollRepositoryTrait;
use crate::error::{Result, ServiceError};
use crate::models::{NewPoll, Pagination, PointSource, Poll, PollComment, PollFilter, PollStatus};

const POLL_COLUMNS: &str = r#"
    id, creator_id, title, description, category, options, vote_counts, total_votes,
    status, is_promoted, expires_at, created_at, updated_at
"#;

pub struct PollRepository {
    pool: PgPool,
}

impl PollRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中更新投票状态
    pub async fn set_status_in_tx(
        conn: &mut PgConnection,
        id: i64,
        status: PollStatus,
    ) -> Result<Option<Poll>> {
        let sql = format!(
            "UPDATE polls SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            POLL_COLUMNS
        );
        let poll = sqlx::query_as::<_, Poll>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(conn)
            .await?;
        Ok(poll)
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PollFilter) {
        builder.push(" WHERE 1 = 1");
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(category) = &filter.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(creator_id) = filter.creator_id {
            builder.push(" AND creator_id = ").push_bind(creator_id);
        }
        if filter.promoted_only == Some(true) {
            builder.push(" AND is_promoted = TRUE");
        }
        if let Some(keyword) = filter.keyword.as_ref().filter(|k| !k.trim().is_empty()) {
            builder
                .push(" AND title ILIKE ")
                .push_bind(format!("%{}%", keyword.trim()));
        }
    }
}

#[async_trait]
impl PollRepositoryTrait for PollRepository {
    async fn create(&self, poll: &NewPoll, creation_points: i32) -> Result<Poll> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO polls (creator_id, title, description, category, options, vote_counts, expires_at)
            VALUES ($1, $2, $3, $4, $5, array_fill(0, ARRAY[cardinality($5::text[])]), $6)
            RETURNING {}
            "#,
            POLL_COLUMNS
        );
        let created = sqlx::query_as::<_, Poll>(&sql)
            .bind(poll.creator_id)
            .bind(&poll.title)
            .bind(&poll.description)
            .bind(&poll.category)
            .bind(&poll.options)
            .bind(poll.expires_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE profiles SET polls_created = polls_created + 1 WHERE id = $1")
            .bind(poll.creator_id)
            .execute(&mut *tx)
            .await?;

        let reference = format!("poll:{}", created.id);
        award_points_in_tx(
            &mut tx,
            poll.creator_id,
            creation_points,
            PointSource::PollCreation,
            Some(&reference),
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Poll>> {
        let sql = format!("SELECT {} FROM polls WHERE id = $1", POLL_COLUMNS);
        let poll = sqlx::query_as::<_, Poll>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(poll)
    }

    async fn list(&self, filter: &PollFilter, page: Pagination) -> Result<(Vec<Poll>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM polls");
        Self::push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM polls", POLL_COLUMNS));
        Self::push_filter(&mut query, filter);
        // 推广投票优先展示
        query
            .push(" ORDER BY is_promoted DESC, created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<Poll>().fetch_all(&self.pool).await?;

        Ok((items, total))
    }

    async fn has_voted(&self, poll_id: i64, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM poll_votes WHERE poll_id = $1 AND user_id = $2)",
        )
        .bind(poll_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn record_vote(
        &self,
        poll_id: i64,
        user_id: Uuid,
        option_index: i32,
        points: i32,
    ) -> Result<Poll> {
        let mut tx = self.pool.begin().await?;

        // 唯一约束兜底并发重复投票
        sqlx::query("INSERT INTO poll_votes (poll_id, user_id, option_index) VALUES ($1, $2, $3)")
            .bind(poll_id)
            .bind(user_id)
            .bind(option_index)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                map_unique_violation(e, "uq_poll_votes_poll_user", || {
                    ServiceError::AlreadyVoted(poll_id)
                })
            })?;

        // Postgres 数组下标从 1 开始
        let sql = format!(
            r#"
            UPDATE polls
            SET vote_counts[$2 + 1] = vote_counts[$2 + 1] + 1,
                total_votes = total_votes + 1,
                updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING {}
            "#,
            POLL_COLUMNS
        );
        let poll = sqlx::query_as::<_, Poll>(&sql)
            .bind(poll_id)
            .bind(option_index)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ServiceError::PollNotActive(poll_id))?;

        sqlx::query("UPDATE profiles SET total_votes = total_votes + 1 WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let reference = format!("poll:{}", poll_id);
        award_points_in_tx(&mut tx, user_id, points, PointSource::Vote, Some(&reference)).await?;

        tx.commit().await?;
        Ok(poll)
    }

    async fn set_status(&self, id: i64, status: PollStatus) -> Result<Poll> {
        let mut conn = self.pool.acquire().await?;
        Self::set_status_in_tx(&mut conn, id, status)
            .await?
            .ok_or(ServiceError::PollNotFound(id))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_comment(
        &self,
        poll_id: i64,
        user_id: Uuid,
        content: &str,
        points: i32,
    ) -> Result<PollComment> {
        let mut tx = self.pool.begin().await?;

        let comment = sqlx::query_as::<_, PollComment>(
            r#"
            WITH inserted AS (
                INSERT INTO poll_comments (poll_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, poll_id, user_id, content, is_hidden, created_at
            )
            SELECT i.id, i.poll_id, i.user_id, p.username, i.content, i.is_hidden, i.created_at
            FROM inserted i
            JOIN profiles p ON p.id = i.user_id
            "#,
        )
        .bind(poll_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        let reference = format!("comment:{}", comment.id);
        award_points_in_tx(&mut tx, user_id, points, PointSource::Comment, Some(&reference))
            .await?;

        tx.commit().await?;
        Ok(comment)
    }

    async fn list_comments(&self, poll_id: i64, include_hidden: bool) -> Result<Vec<PollComment>> {
        let comments = sqlx::query_as::<_, PollComment>(
            r#"
            SELECT c.id, c.poll_id, c.user_id, p.username, c.content, c.is_hidden, c.created_at
            FROM poll_comments c
            JOIN profiles p ON p.id = c.user_id
            WHERE c.poll_id = $1 AND ($2 OR c.is_hidden = FALSE)
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(poll_id)
        .bind(include_hidden)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<PollComment>> {
        let comment = sqlx::query_as::<_, PollComment>(
            r#"
            SELECT c.id, c.poll_id, c.user_id, p.username, c.content, c.is_hidden, c.created_at
            FROM poll_comments c
            JOIN profiles p ON p.id = c.user_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM poll_comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn close_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE polls
            SET status = 'closed', updated_at = NOW()
            WHERE status = 'active' AND expires_at IS NOT NULL AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
