//! 用户档案

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::UserRole;

/// 用户档案
///
/// 计数字段（投票数、创建投票数等）是徽章判定的依据，由各业务事务维护
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[sqlx(default)]
    pub display_name: Option<String>,
    #[sqlx(default)]
    pub avatar_url: Option<String>,
    #[sqlx(default)]
    pub bio: Option<String>,
    pub role: UserRole,
    /// 当前可用积分
    pub points: i32,
    /// 累计获得积分（消费不减少）
    pub total_points_earned: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_votes: i32,
    pub polls_created: i32,
    pub trivia_games_played: i32,
    pub referral_count: i32,
    pub referral_code: String,
    #[sqlx(default)]
    pub referred_by: Option<Uuid>,
    /// 已获得的徽章名称，按获得顺序
    pub badges: Vec<String>,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn has_badge(&self, name: &str) -> bool {
        self.badges.iter().any(|b| b == name)
    }
}

/// 登录凭据
///
/// 只在认证流程中使用，不对外序列化
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_banned: bool,
}

/// 新建用户
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub referral_code: String,
}

/// 用户可自行修改的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.display_name.is_none()
            && self.avatar_url.is_none()
            && self.bio.is_none()
    }
}

/// 管理员可修改的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfileUpdate {
    pub role: Option<UserRole>,
    pub is_banned: Option<bool>,
    /// 积分调整量，正数增加、负数扣减，写入积分流水
    pub points_delta: Option<i32>,
    pub reason: Option<String>,
}

/// 排行榜条目
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: Uuid,
    pub username: String,
    #[sqlx(default)]
    pub display_name: Option<String>,
    #[sqlx(default)]
    pub avatar_url: Option<String>,
    pub points: i32,
    pub current_streak: i32,
    pub badge_count: i32,
}

/// 对外公开的档案（隐藏邮箱等私密字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub points: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_votes: i32,
    pub polls_created: i32,
    pub badges: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for PublicProfile {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            username: p.username,
            display_name: p.display_name,
            avatar_url: p.avatar_url,
            bio: p.bio,
            points: p.points,
            current_streak: p.current_streak,
            longest_streak: p.longest_streak,
            total_votes: p.total_votes,
            polls_created: p.polls_created,
            badges: p.badges,
            created_at: p.created_at,
        }
    }
}
