//! 连续签到天数
//!
//! 以 UTC 自然日为单位比较上次签到日期与今天。

use chrono::NaiveDate;

/// 签到后的连续天数变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// 今天已签到
    AlreadyClaimed,
    /// 昨天签到过，连续天数 +1
    Continued(u32),
    /// 首次签到或中断后重新开始
    Started,
}

impl StreakUpdate {
    /// 更新后的连续天数；今天已签到时返回 None
    pub fn new_streak(&self) -> Option<u32> {
        match self {
            Self::AlreadyClaimed => None,
            Self::Continued(n) => Some(*n),
            Self::Started => Some(1),
        }
    }
}

/// 根据上次签到日期推进连续天数
///
/// 上次签到日期晚于今天（时钟回拨）视为今天已签到
pub fn advance_streak(last_claim: Option<NaiveDate>, current: u32, today: NaiveDate) -> StreakUpdate {
    match last_claim {
        Some(last) if last >= today => StreakUpdate::AlreadyClaimed,
        Some(last) if today.pred_opt() == Some(last) => {
            StreakUpdate::Continued(current.saturating_add(1).max(1))
        }
        _ => StreakUpdate::Started,
    }
}

/// 当前仍然有效的连续天数
///
/// 只有今天或昨天签到过，记录的连续天数才仍然有效，否则已经中断
pub fn effective_streak(last_claim: Option<NaiveDate>, current: u32, today: NaiveDate) -> u32 {
    match last_claim {
        Some(last) if last >= today || today.pred_opt() == Some(last) => current,
        _ => 0,
    }
}
