//! 积分账本
//!
//! 所有积分变动都经过这里：更新用户余额并写入一条流水，
//! 必须在调用方的事务中执行，保证余额与流水一致。

use sqlx::{PgConnection, Row};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::{PointSource, TransactionKind};

/// 发放积分
///
/// 同时累加可用积分和累计获得积分，返回变动后余额。amount 为 0 时不写流水
pub async fn award_points_in_tx(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i32,
    source: PointSource,
    reference: Option<&str>,
) -> Result<i32> {
    if amount <= 0 {
        let row = sqlx::query("SELECT points FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(ServiceError::ProfileNotFound(user_id))?;
        return Ok(row.get("points"));
    }

    let row = sqlx::query(
        r#"
        UPDATE profiles
        SET points = points + $2,
            total_points_earned = total_points_earned + $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING points
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(ServiceError::ProfileNotFound(user_id))?;

    let balance: i32 = row.get("points");
    insert_transaction(conn, user_id, TransactionKind::Earn, source, amount, balance, reference)
        .await?;

    Ok(balance)
}

/// 扣减积分
///
/// 余额不足时返回 `InsufficientPoints`，不做任何修改
pub async fn spend_points_in_tx(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i32,
    source: PointSource,
    reference: Option<&str>,
) -> Result<i32> {
    let updated = sqlx::query(
        r#"
        UPDATE profiles
        SET points = points - $2, updated_at = NOW()
        WHERE id = $1 AND points >= $2
        RETURNING points
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    let balance: i32 = match updated {
        Some(row) => row.get("points"),
        None => {
            let available = sqlx::query("SELECT points FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(ServiceError::ProfileNotFound(user_id))?
                .get("points");
            return Err(ServiceError::InsufficientPoints {
                required: amount,
                available,
            });
        }
    };

    insert_transaction(conn, user_id, TransactionKind::Spend, source, amount, balance, reference)
        .await?;

    Ok(balance)
}

async fn insert_transaction(
    conn: &mut PgConnection,
    user_id: Uuid,
    kind: TransactionKind,
    source: PointSource,
    amount: i32,
    balance_after: i32,
    reference: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, kind, source, amount, balance_after, reference)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .bind(source)
    .bind(amount)
    .bind(balance_after)
    .bind(reference)
    .execute(conn)
    .await?;

    Ok(())
}

/// 将唯一约束冲突映射为业务错误
///
/// 只处理指定约束名的冲突（Postgres 23505），其余错误原样转换
pub fn map_unique_violation(
    err: sqlx::Error,
    constraint: &str,
    to_error: impl FnOnce() -> ServiceError,
) -> ServiceError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") && db.constraint() == Some(constraint) {
            return to_error();
        }
    }
    ServiceError::Database(err)
}
