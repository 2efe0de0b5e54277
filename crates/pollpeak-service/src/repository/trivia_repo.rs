//! 问答仓储

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::ledger::{award_points_in_tx, map_unique_violation};
use super::traits::TriviaRepositoryTrait;
use crate::error::{Result, ServiceError};
use crate::models::{
    NewTriviaGame, NewTriviaQuestion, NewTriviaSession, PointSource, TriviaGame, TriviaQuestion,
    TriviaSession,
};

pub struct TriviaRepository {
    pool: PgPool,
}

impl TriviaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TriviaRepositoryTrait for TriviaRepository {
    async fn list_games(&self, active_only: bool) -> Result<Vec<TriviaGame>> {
        let games = sqlx::query_as::<_, TriviaGame>(
            r#"
            SELECT id, title, category, difficulty, points_reward, is_active, created_at
            FROM trivia_games
            WHERE ($1 = FALSE OR is_active = TRUE)
            ORDER BY created_at DESC
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(games)
    }

    async fn get_game(&self, id: i64) -> Result<Option<TriviaGame>> {
        let game = sqlx::query_as::<_, TriviaGame>(
            r#"
            SELECT id, title, category, difficulty, points_reward, is_active, created_at
            FROM trivia_games
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(game)
    }

    async fn list_questions(&self, game_id: i64) -> Result<Vec<TriviaQuestion>> {
        let questions = sqlx::query_as::<_, TriviaQuestion>(
            r#"
            SELECT id, game_id, question, options, correct_index, explanation, position
            FROM trivia_questions
            WHERE game_id = $1
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    async fn create_game(&self, game: &NewTriviaGame) -> Result<TriviaGame> {
        let created = sqlx::query_as::<_, TriviaGame>(
            r#"
            INSERT INTO trivia_games (title, category, difficulty, points_reward)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, category, difficulty, points_reward, is_active, created_at
            "#,
        )
        .bind(&game.title)
        .bind(&game.category)
        .bind(&game.difficulty)
        .bind(game.points_reward)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn add_question(&self, question: &NewTriviaQuestion) -> Result<TriviaQuestion> {
        // 新题目追加在末尾
        let created = sqlx::query_as::<_, TriviaQuestion>(
            r#"
            INSERT INTO trivia_questions (game_id, question, options, correct_index, explanation, position)
            VALUES ($1, $2, $3, $4, $5,
                    (SELECT COALESCE(MAX(position) + 1, 0) FROM trivia_questions WHERE game_id = $1))
            RETURNING id, game_id, question, options, correct_index, explanation, position
            "#,
        )
        .bind(question.game_id)
        .bind(&question.question)
        .bind(&question.options)
        .bind(question.correct_index)
        .bind(&question.explanation)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn set_game_active(&self, id: i64, active: bool) -> Result<TriviaGame> {
        sqlx::query_as::<_, TriviaGame>(
            r#"
            UPDATE trivia_games SET is_active = $2
            WHERE id = $1
            RETURNING id, title, category, difficulty, points_reward, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::TriviaGameNotFound(id))
    }

    async fn has_completed(&self, game_id: i64, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM trivia_sessions WHERE game_id = $1 AND user_id = $2)",
        )
        .bind(game_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn record_session(&self, session: &NewTriviaSession) -> Result<TriviaSession> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, TriviaSession>(
            r#"
            INSERT INTO trivia_sessions (game_id, user_id, correct_answers, total_questions, score, points_earned)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, game_id, user_id, correct_answers, total_questions, score, points_earned, completed_at
            "#,
        )
        .bind(session.game_id)
        .bind(session.user_id)
        .bind(session.correct_answers)
        .bind(session.total_questions)
        .bind(session.score)
        .bind(session.points_earned)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, "uq_trivia_sessions_game_user", || {
                ServiceError::TriviaAlreadyCompleted(session.game_id)
            })
        })?;

        sqlx::query(
            "UPDATE profiles SET trivia_games_played = trivia_games_played + 1 WHERE id = $1",
        )
        .bind(session.user_id)
        .execute(&mut *tx)
        .await?;

        let reference = format!("trivia:{}", session.game_id);
        award_points_in_tx(
            &mut tx,
            session.user_id,
            session.points_earned,
            PointSource::Trivia,
            Some(&reference),
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }
}
