//! 健康检查

use axum::{Json, extract::State};
use pollpeak_shared::database::Database;
use serde_json::{Value, json};

use crate::state::AppState;

const SERVICE_NAME: &str = "pollpeak-api";

/// 存活探针
///
/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针：检查数据库和 Redis
///
/// GET /ready
pub async fn readiness_check(State(state): State<AppState>) -> Json<Value> {
    let db_ok = Database::from_pool(state.pool.clone())
        .health_check()
        .await
        .is_ok();
    let cache_ok = state.cache.health_check().await.is_ok();
    let all_ok = db_ok && cache_ok;

    Json(json!({
        "status": if all_ok { "ok" } else { "degraded" },
        "service": SERVICE_NAME,
        "checks": {
            "database": if db_ok { "ok" } else { "fail" },
            "redis": if cache_ok { "ok" } else { "fail" }
        }
    }))
}
