//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册指标描述（出现在 /metrics 的 HELP 注释中）
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("poll_votes_total", "Total number of accepted poll votes");
    metrics::describe_counter!("spins_total", "Spin wheel results by band");
    metrics::describe_counter!("daily_claims_total", "Daily login rewards claimed");
    metrics::describe_counter!("ad_rewards_total", "Ad watch rewards granted");
    metrics::describe_counter!("trivia_completions_total", "Completed trivia games");
    metrics::describe_counter!("points_awarded_total", "Points awarded by source");
    metrics::describe_counter!("store_redemptions_total", "Store redemptions by status");
    metrics::describe_counter!("referrals_total", "Applied referral codes");
    metrics::describe_gauge!(
        "worker_last_run_timestamp",
        "Unix timestamp of the last background worker run"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录积分发放
#[inline]
pub fn record_points_awarded(source: &str, points: i32) {
    if points <= 0 {
        return;
    }
    metrics::counter!("points_awarded_total", "source" => source.to_string())
        .increment(points as u64);
}

/// 记录投票
#[inline]
pub fn record_vote() {
    metrics::counter!("poll_votes_total").increment(1);
}

/// 记录转盘结果
#[inline]
pub fn record_spin(band: &str) {
    metrics::counter!("spins_total", "band" => band.to_string()).increment(1);
}

/// 记录每日签到
#[inline]
pub fn record_daily_claim() {
    metrics::counter!("daily_claims_total").increment(1);
}

/// 记录广告奖励
#[inline]
pub fn record_ad_reward() {
    metrics::counter!("ad_rewards_total").increment(1);
}

/// 记录问答完成
#[inline]
pub fn record_trivia_completion(score: u8) {
    let bucket = match score {
        100 => "perfect",
        50..=99 => "pass",
        _ => "fail",
    };
    metrics::counter!("trivia_completions_total", "result" => bucket).increment(1);
}

/// 记录商店兑换
#[inline]
pub fn record_store_redemption(status: &str) {
    metrics::counter!("store_redemptions_total", "status" => status.to_string()).increment(1);
}

/// 记录邀请码使用
#[inline]
pub fn record_referral() {
    metrics::counter!("referrals_total").increment(1);
}

/// 记录后台 Worker 最近一次运行时间
#[inline]
pub fn set_worker_last_run(worker: &str) {
    metrics::gauge!("worker_last_run_timestamp", "worker" => worker.to_string())
        .set(chrono::Utc::now().timestamp() as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 未安装 recorder 时记录为空操作
        record_http_request("GET", "/api/v1/polls", 200, 0.1);
        record_points_awarded("vote", 5);
        record_points_awarded("vote", 0);
        record_vote();
        record_spin("jackpot");
        record_daily_claim();
        record_ad_reward();
        record_trivia_completion(100);
        record_trivia_completion(10);
        record_store_redemption("success");
        record_referral();
        set_worker_last_run("status_update_worker");
    }

    #[test]
    fn test_handle_absent_before_init() {
        assert!(get_handle().is_none());
    }
}
