//! 徽章目录
//!
//! 徽章是静态定义的成就，按用户档案上的计数字段与阈值比较判定

use serde::{Deserialize, Serialize};

use super::profile::Profile;

/// 徽章判定所依据的计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeMetric {
    TotalVotes,
    PollsCreated,
    TriviaGamesPlayed,
    CurrentStreak,
    ReferralCount,
    TotalPointsEarned,
}

impl BadgeMetric {
    /// 从档案中读取对应计数
    pub fn value(&self, profile: &Profile) -> i32 {
        match self {
            Self::TotalVotes => profile.total_votes,
            Self::PollsCreated => profile.polls_created,
            Self::TriviaGamesPlayed => profile.trivia_games_played,
            // 连续天数按历史最长计算，断签后徽章仍可补发
            Self::CurrentStreak => profile.current_streak.max(profile.longest_streak),
            Self::ReferralCount => profile.referral_count,
            Self::TotalPointsEarned => profile.total_points_earned,
        }
    }
}

/// 徽章定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub metric: BadgeMetric,
    pub threshold: i32,
}

impl BadgeDefinition {
    pub fn is_satisfied_by(&self, profile: &Profile) -> bool {
        self.metric.value(profile) >= self.threshold
    }
}

/// 徽章目录，按类别和阈值排列
pub static BADGE_CATALOGUE: &[BadgeDefinition] = &[
    BadgeDefinition {
        name: "First Vote",
        description: "Cast your first vote",
        metric: BadgeMetric::TotalVotes,
        threshold: 1,
    },
    BadgeDefinition {
        name: "Active Voter",
        description: "Cast 50 votes",
        metric: BadgeMetric::TotalVotes,
        threshold: 50,
    },
    BadgeDefinition {
        name: "Poll Master",
        description: "Cast 250 votes",
        metric: BadgeMetric::TotalVotes,
        threshold: 250,
    },
    BadgeDefinition {
        name: "Poll Creator",
        description: "Create your first poll",
        metric: BadgeMetric::PollsCreated,
        threshold: 1,
    },
    BadgeDefinition {
        name: "Trivia Rookie",
        description: "Complete your first trivia game",
        metric: BadgeMetric::TriviaGamesPlayed,
        threshold: 1,
    },
    BadgeDefinition {
        name: "Trivia Expert",
        description: "Complete 25 trivia games",
        metric: BadgeMetric::TriviaGamesPlayed,
        threshold: 25,
    },
    BadgeDefinition {
        name: "Streak Starter",
        description: "Claim daily rewards 3 days in a row",
        metric: BadgeMetric::CurrentStreak,
        threshold: 3,
    },
    BadgeDefinition {
        name: "Week Warrior",
        description: "Claim daily rewards 7 days in a row",
        metric: BadgeMetric::CurrentStreak,
        threshold: 7,
    },
    BadgeDefinition {
        name: "Monthly Legend",
        description: "Claim daily rewards 30 days in a row",
        metric: BadgeMetric::CurrentStreak,
        threshold: 30,
    },
    BadgeDefinition {
        name: "Recruiter",
        description: "Refer your first friend",
        metric: BadgeMetric::ReferralCount,
        threshold: 1,
    },
    BadgeDefinition {
        name: "Influencer",
        description: "Refer 10 friends",
        metric: BadgeMetric::ReferralCount,
        threshold: 10,
    },
    BadgeDefinition {
        name: "Point Collector",
        description: "Earn 1,000 points in total",
        metric: BadgeMetric::TotalPointsEarned,
        threshold: 1000,
    },
    BadgeDefinition {
        name: "High Roller",
        description: "Earn 10,000 points in total",
        metric: BadgeMetric::TotalPointsEarned,
        threshold: 10000,
    },
];

/// 带获得状态的徽章
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBadgeView {
    #[serde(flatten)]
    pub badge: BadgeDefinition,
    pub earned: bool,
    /// 当前进度值
    pub progress: i32,
}
