//! 每日奖励（签到、转盘、广告）

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RewardType;
use crate::scoring::SpinBand;

/// 用户每日奖励状态
///
/// 日期字段均为 UTC 自然日
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserDailyReward {
    pub user_id: Uuid,
    #[sqlx(default)]
    pub last_claim_date: Option<NaiveDate>,
    #[sqlx(default)]
    pub last_spin_date: Option<NaiveDate>,
    #[sqlx(default)]
    pub ads_watched_date: Option<NaiveDate>,
    pub ads_watched_today: i32,
    pub current_streak: i32,
    pub total_spins: i32,
    pub updated_at: DateTime<Utc>,
}

impl UserDailyReward {
    /// 指定日期已观看的广告数，跨天自动归零
    pub fn ads_watched_on(&self, today: NaiveDate) -> i32 {
        if self.ads_watched_date == Some(today) {
            self.ads_watched_today
        } else {
            0
        }
    }

    pub fn claimed_on(&self, today: NaiveDate) -> bool {
        self.last_claim_date.is_some_and(|d| d >= today)
    }

    pub fn spun_on(&self, today: NaiveDate) -> bool {
        self.last_spin_date.is_some_and(|d| d >= today)
    }

    pub fn streak(&self) -> u32 {
        u32::try_from(self.current_streak).unwrap_or(0)
    }
}

/// 奖励历史
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyRewardHistory {
    pub id: i64,
    pub user_id: Uuid,
    pub reward_type: RewardType,
    #[sqlx(default)]
    pub band: Option<SpinBand>,
    pub points: i32,
    pub multiplier: f64,
    pub streak: i32,
    pub created_at: DateTime<Utc>,
}

/// 签到写入参数
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClaim {
    pub user_id: Uuid,
    pub today: NaiveDate,
    pub new_streak: i32,
    pub points: i32,
    pub multiplier: f64,
}

/// 转盘写入参数
#[derive(Debug, Clone, PartialEq)]
pub struct SpinRecord {
    pub user_id: Uuid,
    pub today: NaiveDate,
    pub band: SpinBand,
    pub points: i32,
    pub multiplier: f64,
    pub streak: i32,
}

/// 广告奖励写入参数
#[derive(Debug, Clone, PartialEq)]
pub struct AdWatch {
    pub user_id: Uuid,
    pub today: NaiveDate,
    pub points: i32,
    pub max_per_day: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ads_date: Option<NaiveDate>, ads: i32) -> UserDailyReward {
        UserDailyReward {
            user_id: Uuid::new_v4(),
            last_claim_date: None,
            last_spin_date: None,
            ads_watched_date: ads_date,
            ads_watched_today: ads,
            current_streak: 0,
            total_spins: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ad_counter_resets_on_new_day() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        assert_eq!(state(Some(today), 4).ads_watched_on(today), 4);
        assert_eq!(state(Some(yesterday), 4).ads_watched_on(today), 0);
        assert_eq!(state(None, 0).ads_watched_on(today), 0);
    }
}
