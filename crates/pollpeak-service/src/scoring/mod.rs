//! 积分计算
//!
//! 平台所有积分公式都集中在此模块，均为纯函数，不访问数据库：
//! - `streak`: 连续签到天数推进
//! - `spin`: 幸运转盘概率分档
//! - `tier`: 大使等级与佣金
//! - 本文件：连续参与倍率、问答得分

pub mod spin;
pub mod streak;
pub mod tier;

use pollpeak_shared::config::RewardSettings;

pub use spin::{RandomSource, SpinBand, ThreadRandom};
pub use streak::{StreakUpdate, advance_streak, effective_streak};
pub use tier::AmbassadorTier;

/// 默认每日倍率增量
pub const DEFAULT_MULTIPLIER_STEP: f64 = 0.1;
/// 默认倍率上限
pub const DEFAULT_MULTIPLIER_CAP: f64 = 2.0;

/// 连续参与倍率
///
/// multiplier(n) = min(1 + step·n, cap)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreakMultiplier {
    step: f64,
    cap: f64,
}

impl Default for StreakMultiplier {
    fn default() -> Self {
        Self {
            step: DEFAULT_MULTIPLIER_STEP,
            cap: DEFAULT_MULTIPLIER_CAP,
        }
    }
}

impl From<&RewardSettings> for StreakMultiplier {
    fn from(settings: &RewardSettings) -> Self {
        Self {
            step: settings.multiplier_step,
            cap: settings.multiplier_cap.max(1.0),
        }
    }
}

impl StreakMultiplier {
    pub fn new(step: f64, cap: f64) -> Self {
        Self {
            step,
            cap: cap.max(1.0),
        }
    }

    /// 连续 streak 天对应的倍率
    pub fn for_streak(&self, streak: u32) -> f64 {
        (1.0 + self.step * f64::from(streak)).min(self.cap)
    }

    /// 对基础积分应用倍率，四舍五入到整数
    pub fn apply(&self, base: i32, streak: u32) -> i32 {
        (f64::from(base) * self.for_streak(streak)).round() as i32
    }
}

/// 默认参数下的连续参与倍率
pub fn streak_multiplier(streak: u32) -> f64 {
    StreakMultiplier::default().for_streak(streak)
}

/// 问答得分（0-100）
///
/// 题目数为 0 时得分为 0
pub fn trivia_score(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    ((f64::from(correct) / f64::from(total)) * 100.0).round() as u8
}

/// 问答积分：round(score/100 × points_reward)
pub fn trivia_points(score: u8, points_reward: i32) -> i32 {
    let score = f64::from(score.min(100));
    (score * f64::from(points_reward.max(0)) / 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_multiplier_is_linear_until_cap() {
        for n in 0..=10u32 {
            assert!(approx(streak_multiplier(n), 1.0 + 0.1 * n as f64));
        }
    }

    #[test]
    fn test_multiplier_caps_at_two() {
        assert!(approx(streak_multiplier(10), 2.0));
        assert!(approx(streak_multiplier(11), 2.0));
        assert!(approx(streak_multiplier(365), 2.0));
        assert!(approx(streak_multiplier(u32::MAX), 2.0));
    }

    #[test]
    fn test_apply_rounds_half_up() {
        let m = StreakMultiplier::default();
        assert_eq!(m.apply(10, 0), 10);
        assert_eq!(m.apply(10, 3), 13);
        // 25 × 1.1 = 27.5 -> 28
        assert_eq!(m.apply(25, 1), 28);
        assert_eq!(m.apply(500, 20), 1000);
    }

    #[test]
    fn test_multiplier_from_settings() {
        let settings = RewardSettings {
            multiplier_step: 0.25,
            multiplier_cap: 1.5,
            ..Default::default()
        };
        let m = StreakMultiplier::from(&settings);
        assert!(approx(m.for_streak(1), 1.25));
        assert!(approx(m.for_streak(4), 1.5));
    }

    #[test]
    fn test_cap_below_one_is_clamped() {
        let m = StreakMultiplier::new(0.1, 0.5);
        assert!(approx(m.for_streak(0), 1.0));
    }

    #[test]
    fn test_trivia_score() {
        assert_eq!(trivia_score(0, 0), 0);
        assert_eq!(trivia_score(0, 5), 0);
        assert_eq!(trivia_score(5, 5), 100);
        assert_eq!(trivia_score(2, 3), 67);
        assert_eq!(trivia_score(1, 3), 33);
        // 多于题目数的正确数按满分计
        assert_eq!(trivia_score(9, 5), 100);
    }

    #[test]
    fn test_trivia_points_formula() {
        assert_eq!(trivia_points(100, 50), 50);
        assert_eq!(trivia_points(0, 50), 0);
        assert_eq!(trivia_points(67, 50), 34); // 33.5 -> 34
        assert_eq!(trivia_points(33, 50), 17); // 16.5 -> 17
        assert_eq!(trivia_points(80, 25), 20);
        assert_eq!(trivia_points(100, -10), 0);
    }
}
