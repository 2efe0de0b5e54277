//! 用户档案仓储

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::ledger::{award_points_in_tx, map_unique_violation, spend_points_in_tx};
use super::traits::ProfileRepositoryTrait;
use crate::error::{Result, ServiceError};
use crate::models::{
    AdminProfileUpdate, LeaderboardEntry, NewProfile, Pagination, PointSource, Profile,
    ProfileCredentials, ProfileUpdate,
};

const PROFILE_COLUMNS: &str = r#"
    id, email, username, display_name, avatar_url, bio, role, points, total_points_earned,
    current_streak, longest_streak, total_votes, polls_created, trivia_games_played,
    referral_count, referral_code, referred_by, badges, is_banned, created_at, updated_at
"#;

pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<Profile>> {
        let sql = format!(
            "SELECT {} FROM profiles WHERE {} = $1",
            PROFILE_COLUMNS, column
        );
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }
}

#[async_trait]
impl ProfileRepositoryTrait for ProfileRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn get_credentials_by_email(&self, email: &str) -> Result<Option<ProfileCredentials>> {
        let creds = sqlx::query_as::<_, ProfileCredentials>(
            r#"
            SELECT id, username, password_hash, role, is_banned
            FROM profiles
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    async fn get_credentials_by_id(&self, id: Uuid) -> Result<Option<ProfileCredentials>> {
        let creds = sqlx::query_as::<_, ProfileCredentials>(
            "SELECT id, username, password_hash, role, is_banned FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>> {
        self.fetch_one_by("username", username).await
    }

    async fn get_by_referral_code(&self, code: &str) -> Result<Option<Profile>> {
        self.fetch_one_by("referral_code", &code.to_ascii_uppercase())
            .await
    }

    async fn create(&self, profile: &NewProfile) -> Result<Profile> {
        let sql = format!(
            r#"
            INSERT INTO profiles (email, username, password_hash, display_name, referral_code)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, Profile>(&sql)
            .bind(&profile.email)
            .bind(&profile.username)
            .bind(&profile.password_hash)
            .bind(&profile.display_name)
            .bind(&profile.referral_code)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match constraint_of(&e).as_deref() {
                Some("profiles_email_key") => ServiceError::EmailTaken(profile.email.clone()),
                Some("profiles_username_key") => {
                    ServiceError::UsernameTaken(profile.username.clone())
                }
                Some("profiles_referral_code_key") => {
                    ServiceError::ReferralCodeTaken(profile.referral_code.clone())
                }
                _ => ServiceError::Database(e),
            })
    }

    async fn update_public_fields(&self, id: Uuid, update: &ProfileUpdate) -> Result<Profile> {
        let sql = format!(
            r#"
            UPDATE profiles
            SET username = COALESCE($2, username),
                display_name = COALESCE($3, display_name),
                avatar_url = COALESCE($4, avatar_url),
                bio = COALESCE($5, bio),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let username = update.username.clone().unwrap_or_default();
        sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(&update.username)
            .bind(&update.display_name)
            .bind(&update.avatar_url)
            .bind(&update.bio)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, "profiles_username_key", || {
                    ServiceError::UsernameTaken(username)
                })
            })?
            .ok_or(ServiceError::ProfileNotFound(id))
    }

    async fn admin_update(&self, id: Uuid, update: &AdminProfileUpdate) -> Result<Profile> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE profiles
            SET role = COALESCE($2, role),
                is_banned = COALESCE($3, is_banned),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.role)
        .bind(update.is_banned)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(ServiceError::ProfileNotFound(id));
        }

        match update.points_delta {
            Some(delta) if delta > 0 => {
                award_points_in_tx(
                    &mut tx,
                    id,
                    delta,
                    PointSource::AdminAdjustment,
                    update.reason.as_deref(),
                )
                .await?;
            }
            Some(delta) if delta < 0 => {
                spend_points_in_tx(
                    &mut tx,
                    id,
                    -delta,
                    PointSource::AdminAdjustment,
                    update.reason.as_deref(),
                )
                .await?;
            }
            _ => {}
        }

        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(profile)
    }

    async fn append_badges(&self, id: Uuid, names: &[String]) -> Result<Vec<String>> {
        let row = sqlx::query(
            r#"
            UPDATE profiles
            SET badges = badges || ARRAY(
                    SELECT n FROM unnest($2::text[]) AS n
                    WHERE n <> ALL(profiles.badges)
                ),
                updated_at = NOW()
            WHERE id = $1
            RETURNING badges
            "#,
        )
        .bind(id)
        .bind(names)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::ProfileNotFound(id))?;

        Ok(row.get("badges"))
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT ROW_NUMBER() OVER (ORDER BY points DESC, created_at ASC) AS rank,
                   id AS user_id, username, display_name, avatar_url, points, current_streak,
                   COALESCE(cardinality(badges), 0)::int AS badge_count
            FROM profiles
            WHERE is_banned = FALSE
            ORDER BY points DESC, created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn list(&self, page: Pagination) -> Result<(Vec<Profile>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM profiles ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            PROFILE_COLUMNS
        );
        let items = sqlx::query_as::<_, Profile>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }
}

fn constraint_of(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            db.constraint().map(str::to_string)
        }
        _ => None,
    }
}
