//! 大使等级
//!
//! 按累计邀请人数划分佣金档位。

use serde::{Deserialize, Serialize};

/// 大使等级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum AmbassadorTier {
    /// 0-9 人
    #[default]
    Bronze,
    /// 10-49 人
    Silver,
    /// 50-99 人
    Gold,
    /// 100 人及以上
    Platinum,
}

impl AmbassadorTier {
    pub fn from_referrals(count: i32) -> Self {
        match count {
            c if c >= 100 => Self::Platinum,
            c if c >= 50 => Self::Gold,
            c if c >= 10 => Self::Silver,
            _ => Self::Bronze,
        }
    }

    /// 佣金比例
    pub fn commission_rate(&self) -> f64 {
        match self {
            Self::Bronze => 0.05,
            Self::Silver => 0.10,
            Self::Gold => 0.15,
            Self::Platinum => 0.20,
        }
    }

    /// 达到该等级所需的最少邀请人数
    pub fn min_referrals(&self) -> i32 {
        match self {
            Self::Bronze => 0,
            Self::Silver => 10,
            Self::Gold => 50,
            Self::Platinum => 100,
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Platinum),
            Self::Platinum => None,
        }
    }

    /// 按佣金比例计算佣金积分（向下取整）
    pub fn commission_for(&self, points: i32) -> i32 {
        (f64::from(points.max(0)) * self.commission_rate()).floor() as i32
    }
}
