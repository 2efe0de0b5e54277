//! 积分流水
//!
//! 每一次积分变动都记录一条流水，包含变动后余额，便于对账追溯

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{PointSource, TransactionKind};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointTransaction {
    pub id: i64,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub source: PointSource,
    /// 变动数量（始终为正数，方向由 kind 决定）
    pub amount: i32,
    pub balance_after: i32,
    /// 关联的业务 ID
    #[sqlx(default)]
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PointTransaction {
    /// 带符号的变动值
    pub fn signed_amount(&self) -> i32 {
        match self.kind {
            TransactionKind::Earn => self.amount,
            TransactionKind::Spend => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(kind: TransactionKind, amount: i32, balance_after: i32) -> PointTransaction {
        PointTransaction {
            id: 1,
            user_id: Uuid::nil(),
            kind,
            source: PointSource::Vote,
            amount,
            balance_after,
            reference: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_signed_amount_replays_balance() {
        // 按时间正序回放流水，余额应与每条记录的 balance_after 一致
        let history = [
            tx(TransactionKind::Earn, 5, 5),
            tx(TransactionKind::Earn, 100, 105),
            tx(TransactionKind::Spend, 80, 25),
        ];

        let mut balance = 0;
        for entry in &history {
            balance += entry.signed_amount();
            assert_eq!(balance, entry.balance_after);
        }
    }
}
