//! 用户档案服务
//!
//! 负责注册、档案查询与修改、排行榜。角色、积分、封禁只允许管理员通过
//! `admin_update_profile` 修改。

use std::sync::{Arc, LazyLock};

use rand::Rng;
use rand::distr::Alphanumeric;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::{
    AdminProfileUpdate, LeaderboardEntry, NewProfile, Pagination, Profile, ProfileCredentials,
    ProfileUpdate, PublicProfile,
};
use crate::repository::ProfileRepositoryTrait;

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_]{3,30}$").expect("用户名正则有效")
});

const REFERRAL_CODE_LEN: usize = 8;
const MAX_DISPLAY_NAME_LEN: usize = 100;
const MAX_BIO_LEN: usize = 500;
const MAX_LEADERBOARD: i64 = 100;
/// 邀请码冲突时的最大尝试次数
const REFERRAL_CODE_ATTEMPTS: usize = 5;

/// 生成邀请码：8 位大写字母数字
pub fn generate_referral_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LEN)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect()
}

pub fn validate_username(username: &str) -> Result<()> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "用户名须为 3-30 位字母、数字或下划线".to_string(),
        ))
    }
}

fn validate_update(update: &ProfileUpdate) -> Result<()> {
    if let Some(username) = &update.username {
        validate_username(username)?;
    }
    if update
        .display_name
        .as_ref()
        .is_some_and(|name| name.chars().count() > MAX_DISPLAY_NAME_LEN)
    {
        return Err(ServiceError::Validation("昵称不能超过 100 个字符".to_string()));
    }
    if update
        .bio
        .as_ref()
        .is_some_and(|bio| bio.chars().count() > MAX_BIO_LEN)
    {
        return Err(ServiceError::Validation("简介不能超过 500 个字符".to_string()));
    }
    if update.avatar_url.as_ref().is_some_and(|url| {
        !url.is_empty() && !(url.starts_with("https://") || url.starts_with("http://"))
    }) {
        return Err(ServiceError::Validation("头像地址必须是 http(s) URL".to_string()));
    }
    Ok(())
}

pub struct ProfileService<P>
where
    P: ProfileRepositoryTrait,
{
    profile_repo: Arc<P>,
}

impl<P> ProfileService<P>
where
    P: ProfileRepositoryTrait,
{
    pub fn new(profile_repo: Arc<P>) -> Self {
        Self { profile_repo }
    }

    /// 注册新用户
    ///
    /// 密码哈希由调用方（认证层）计算，邮箱统一小写
    #[instrument(skip(self, password_hash))]
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password_hash: String,
        display_name: Option<String>,
    ) -> Result<Profile> {
        validate_username(username)?;
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ServiceError::Validation("邮箱格式不正确".to_string()));
        }

        let mut new_profile = NewProfile {
            email,
            username: username.to_string(),
            password_hash,
            display_name,
            referral_code: generate_referral_code(),
        };
        let mut attempt = 1;
        let profile = loop {
            match self.profile_repo.create(&new_profile).await {
                Err(ServiceError::ReferralCodeTaken(code)) if attempt < REFERRAL_CODE_ATTEMPTS => {
                    warn!(code = %code, attempt, "邀请码冲突，重新生成");
                    new_profile.referral_code = generate_referral_code();
                    attempt += 1;
                }
                result => break result?,
            }
        };

        info!(user_id = %profile.id, username = %profile.username, "用户注册成功");
        Ok(profile)
    }

    pub async fn credentials_by_email(&self, email: &str) -> Result<Option<ProfileCredentials>> {
        self.profile_repo
            .get_credentials_by_email(&email.trim().to_lowercase())
            .await
    }

    pub async fn credentials_by_id(&self, id: Uuid) -> Result<Option<ProfileCredentials>> {
        self.profile_repo.get_credentials_by_id(id).await
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, id: Uuid) -> Result<Profile> {
        self.profile_repo
            .get(id)
            .await?
            .ok_or(ServiceError::ProfileNotFound(id))
    }

    /// 其他用户可见的档案，封禁用户不可见
    #[instrument(skip(self))]
    pub async fn get_public_profile(&self, id: Uuid) -> Result<PublicProfile> {
        let profile = self.get_profile(id).await?;
        if profile.is_banned {
            return Err(ServiceError::ProfileNotFound(id));
        }
        Ok(profile.into())
    }

    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Profile> {
        if update.is_empty() {
            return self.get_profile(id).await;
        }
        validate_update(&update)?;

        if let Some(username) = &update.username {
            let existing = self.profile_repo.get_by_username(username).await?;
            if existing.is_some_and(|p| p.id != id) {
                return Err(ServiceError::UsernameTaken(username.clone()));
            }
        }

        let profile = self.profile_repo.update_public_fields(id, &update).await?;
        info!(user_id = %id, "档案已更新");
        Ok(profile)
    }

    /// 管理员修改角色、封禁状态或调整积分
    #[instrument(skip(self, update))]
    pub async fn admin_update_profile(
        &self,
        admin_id: Uuid,
        id: Uuid,
        update: AdminProfileUpdate,
    ) -> Result<Profile> {
        if admin_id == id && update.is_banned == Some(true) {
            return Err(ServiceError::Forbidden("不能封禁自己".to_string()));
        }
        if update.points_delta == Some(0) {
            return Err(ServiceError::Validation("积分调整量不能为 0".to_string()));
        }

        let profile = self.profile_repo.admin_update(id, &update).await?;
        info!(
            admin_id = %admin_id,
            user_id = %id,
            role = ?update.role,
            is_banned = ?update.is_banned,
            points_delta = ?update.points_delta,
            "管理员修改档案"
        );
        Ok(profile)
    }

    /// 积分排行榜，limit 限制在 1-100
    #[instrument(skip(self))]
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>> {
        self.profile_repo
            .leaderboard(limit.clamp(1, MAX_LEADERBOARD))
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_profiles(&self, page: Pagination) -> Result<(Vec<Profile>, i64)> {
        self.profile_repo.list(page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProfileRepositoryTrait;
    use crate::service::badge_service::tests::test_profile;

    #[test]
    fn test_referral_code_format() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 8);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("poll_fan_42").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(31)).is_err());
    }

    #[test]
    fn test_avatar_must_be_http() {
        let update = ProfileUpdate {
            avatar_url: Some("javascript:alert(1)".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_update(&update),
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_lowercases_email() {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_create()
            .withf(|p| p.email == "voter@example.com" && p.referral_code.len() == 8)
            .returning(|p| {
                let mut profile = test_profile(Uuid::new_v4());
                profile.email = p.email.clone();
                profile.username = p.username.clone();
                Ok(profile)
            });
        let service = ProfileService::new(Arc::new(repo));

        let profile = service
            .register(" Voter@Example.com ", "voter", "hash".to_string(), None)
            .await
            .unwrap();
        assert_eq!(profile.email, "voter@example.com");
    }

    #[tokio::test]
    async fn test_register_retries_on_referral_code_collision() {
        let mut repo = MockProfileRepositoryTrait::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|p| Err(ServiceError::ReferralCodeTaken(p.referral_code.clone())));
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|p| {
                let mut profile = test_profile(Uuid::new_v4());
                profile.referral_code = p.referral_code.clone();
                Ok(profile)
            });
        let service = ProfileService::new(Arc::new(repo));

        let profile = service
            .register("voter@example.com", "voter", "hash".to_string(), None)
            .await
            .unwrap();
        assert_eq!(profile.referral_code.len(), 8);
    }

    #[tokio::test]
    async fn test_register_gives_up_after_repeated_collisions() {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_create()
            .times(REFERRAL_CODE_ATTEMPTS)
            .returning(|p| Err(ServiceError::ReferralCodeTaken(p.referral_code.clone())));
        let service = ProfileService::new(Arc::new(repo));

        let err = service
            .register("voter@example.com", "voter", "hash".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ReferralCodeTaken(_)));
        assert!(!err.is_business_error());
    }

    #[tokio::test]
    async fn test_update_rejects_taken_username() {
        let me = Uuid::new_v4();
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get_by_username()
            .returning(|_| Ok(Some(test_profile(Uuid::new_v4()))));
        repo.expect_update_public_fields().never();
        let service = ProfileService::new(Arc::new(repo));

        let update = ProfileUpdate {
            username: Some("taken_name".to_string()),
            ..Default::default()
        };
        let err = service.update_profile(me, update).await.unwrap_err();
        assert!(matches!(err, ServiceError::UsernameTaken(_)));
    }

    #[tokio::test]
    async fn test_public_profile_hides_banned() {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_get().returning(|id| {
            let mut profile = test_profile(id);
            profile.is_banned = true;
            Ok(Some(profile))
        });
        let service = ProfileService::new(Arc::new(repo));
        let err = service.get_public_profile(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn test_leaderboard_limit_is_clamped() {
        let mut repo = MockProfileRepositoryTrait::new();
        repo.expect_leaderboard()
            .withf(|limit| *limit == 100)
            .returning(|_| Ok(vec![]));
        let service = ProfileService::new(Arc::new(repo));
        assert!(service.leaderboard(5000).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_cannot_ban_self() {
        let admin = Uuid::new_v4();
        let repo = MockProfileRepositoryTrait::new();
        let service = ProfileService::new(Arc::new(repo));
        let update = AdminProfileUpdate {
            is_banned: Some(true),
            ..Default::default()
        };
        let err = service
            .admin_update_profile(admin, admin, update)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
