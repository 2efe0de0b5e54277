//! 幸运转盘
//!
//! 一次抽取落在 [0, 100) 区间，按累计概率映射到六个固定档位：
//! 40 / 25 / 20 / 10 / 4 / 1 (%)

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 转盘档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum SpinBand {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Jackpot,
}

impl SpinBand {
    /// 全部档位，按概率从高到低
    pub const ALL: [SpinBand; 6] = [
        SpinBand::Common,
        SpinBand::Uncommon,
        SpinBand::Rare,
        SpinBand::Epic,
        SpinBand::Legendary,
        SpinBand::Jackpot,
    ];

    /// 档位概率（百分比）
    pub fn probability(&self) -> f64 {
        match self {
            Self::Common => 40.0,
            Self::Uncommon => 25.0,
            Self::Rare => 20.0,
            Self::Epic => 10.0,
            Self::Legendary => 4.0,
            Self::Jackpot => 1.0,
        }
    }

    /// 档位基础积分（未计倍率）
    pub fn base_points(&self) -> i32 {
        match self {
            Self::Common => 10,
            Self::Uncommon => 25,
            Self::Rare => 50,
            Self::Epic => 100,
            Self::Legendary => 250,
            Self::Jackpot => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
            Self::Jackpot => "jackpot",
        }
    }

    /// 将 [0, 100) 的抽取值映射到档位
    ///
    /// 越界值被夹到区间内，NaN 视为 0
    pub fn from_roll(roll: f64) -> Self {
        let roll = if roll.is_nan() { 0.0 } else { roll.clamp(0.0, 100.0) };

        let mut upper = 0.0;
        for band in Self::ALL {
            upper += band.probability();
            if roll < upper {
                return band;
            }
        }
        Self::Jackpot
    }
}

/// 随机数来源
///
/// 返回 [0, 100) 内的抽取值；测试中可替换为固定值
pub trait RandomSource: Send + Sync {
    fn roll(&self) -> f64;
}

/// 基于线程本地 RNG 的随机源
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn roll(&self) -> f64 {
        rand::rng().random_range(0.0..100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_probabilities_sum_to_100() {
        let total: f64 = SpinBand::ALL.iter().map(|b| b.probability()).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(SpinBand::from_roll(0.0), SpinBand::Common);
        assert_eq!(SpinBand::from_roll(39.999), SpinBand::Common);
        assert_eq!(SpinBand::from_roll(40.0), SpinBand::Uncommon);
        assert_eq!(SpinBand::from_roll(64.999), SpinBand::Uncommon);
        assert_eq!(SpinBand::from_roll(65.0), SpinBand::Rare);
        assert_eq!(SpinBand::from_roll(85.0), SpinBand::Epic);
        assert_eq!(SpinBand::from_roll(95.0), SpinBand::Legendary);
        assert_eq!(SpinBand::from_roll(98.999), SpinBand::Legendary);
        assert_eq!(SpinBand::from_roll(99.0), SpinBand::Jackpot);
        assert_eq!(SpinBand::from_roll(99.999), SpinBand::Jackpot);
    }

    #[test]
    fn test_out_of_range_rolls_are_clamped() {
        assert_eq!(SpinBand::from_roll(-5.0), SpinBand::Common);
        assert_eq!(SpinBand::from_roll(150.0), SpinBand::Jackpot);
        assert_eq!(SpinBand::from_roll(f64::NAN), SpinBand::Common);
    }

    #[test]
    fn test_thread_random_stays_in_range() {
        let source = ThreadRandom;
        for _ in 0..1_000 {
            let roll = source.roll();
            assert!((0.0..100.0).contains(&roll));
        }
    }

    #[test]
    fn test_distribution_matches_stated_percentages() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let samples = 200_000;
        let mut counts = std::collections::HashMap::new();

        for _ in 0..samples {
            let roll: f64 = rng.random_range(0.0..100.0);
            *counts.entry(SpinBand::from_roll(roll)).or_insert(0u32) += 1;
        }

        for band in SpinBand::ALL {
            let observed = f64::from(*counts.get(&band).unwrap_or(&0)) / samples as f64 * 100.0;
            assert!(
                (observed - band.probability()).abs() < 0.5,
                "{:?}: observed {:.2}%, expected {}%",
                band,
                observed,
                band.probability()
            );
        }
    }

    #[test]
    fn test_band_serialization() {
        assert_eq!(
            serde_json::to_value(SpinBand::Legendary).unwrap(),
            "LEGENDARY"
        );
        assert_eq!(SpinBand::Jackpot.as_str(), "jackpot");
    }
}
