//! PollPeak API 服务
//!
//! 提供投票、问答、每日奖励、积分商城等 REST API，并运行定时状态更新任务。

use std::sync::Arc;
use std::time::Duration;

use pollpeak_api::{routes, state::AppState, worker::StatusUpdateWorker};
use pollpeak_shared::{
    cache::Cache,
    config::AppConfig,
    database::Database,
    observability,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 统一加载配置：config/default.toml、config/{环境}.toml、config/pollpeak-api.toml 和环境变量
    let config = AppConfig::load("pollpeak-api")?;
    config.validate_for_environment()?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(
        environment = %config.environment,
        "Starting pollpeak-api on {}",
        config.server_addr()
    );

    // 初始化基础设施
    let db = Database::connect(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }
    let cache = Arc::new(Cache::new(&config.redis)?);

    let state = AppState::new(db.pool().clone(), cache, &config);

    // 启动状态更新 Worker：关闭到期投票、结束到期推广
    if config.status_worker.enabled {
        match StatusUpdateWorker::from_state(&state, &config.status_worker.cron) {
            Ok(worker) => {
                tokio::spawn(async move {
                    worker.run().await;
                });
            }
            Err(e) => {
                error!(cron = %config.status_worker.cron, error = %e, "无效的 cron 表达式，状态更新 Worker 未启动");
            }
        }
    } else {
        warn!("状态更新 Worker 已禁用，到期投票需手动关闭");
    }

    let cors = routes::cors_layer(&config.auth.cors_origins);
    if config.is_production() && config.auth.cors_origins.trim() == "*" {
        warn!("cors_origins=\"*\" 在生产环境中不安全，请设置为具体域名");
    }

    let app = routes::app(
        state,
        cors,
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM 或 Ctrl+C 时停止接收新连接，等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
