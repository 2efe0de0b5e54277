//! 状态更新 Worker
//!
//! 按 cron 表达式定时执行：
//! 1. 关闭已到截止时间的投票
//! 2. 标记已到开始时间的推广投票
//! 3. 结束已到期的推广
//!
//! 各项更新都是幂等的条件 UPDATE，多实例同时运行也不会重复结算

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use pollpeak_shared::observability::metrics;
use tracing::{error, info};

use crate::state::{AppState, Polls, Sponsors};

const WORKER_NAME: &str = "status_update_worker";

pub struct StatusUpdateWorker {
    polls: Arc<Polls>,
    sponsors: Arc<Sponsors>,
    schedule: Schedule,
}

impl StatusUpdateWorker {
    pub fn new(
        polls: Arc<Polls>,
        sponsors: Arc<Sponsors>,
        cron_expression: &str,
    ) -> Result<Self, cron::error::Error> {
        Ok(Self {
            polls,
            sponsors,
            schedule: Schedule::from_str(cron_expression)?,
        })
    }

    pub fn from_state(state: &AppState, cron_expression: &str) -> Result<Self, cron::error::Error> {
        Self::new(state.polls.clone(), state.sponsors.clone(), cron_expression)
    }

    /// 主循环：等待下一个触发点后执行一轮，直到进程退出
    pub async fn run(&self) {
        info!(worker = WORKER_NAME, "StatusUpdateWorker 已启动");

        loop {
            let now = Utc::now();
            let Some(delay) = next_delay(&self.schedule, now) else {
                error!(worker = WORKER_NAME, "cron 表达式没有后续触发时间，Worker 退出");
                return;
            };
            tokio::time::sleep(delay).await;

            self.tick(Utc::now()).await;
        }
    }

    /// 执行一轮状态更新，单项失败不影响另一项
    pub async fn tick(&self, now: DateTime<Utc>) {
        match self.polls.close_expired_polls(now).await {
            Ok(0) => {}
            Ok(closed) => info!(closed = closed, "已关闭到期投票"),
            Err(e) => error!(error = %e, "关闭到期投票出错"),
        }

        match self.sponsors.start_due_promotions(now).await {
            Ok(0) => {}
            Ok(started) => info!(started = started, "已生效到点推广"),
            Err(e) => error!(error = %e, "生效到点推广出错"),
        }

        match self.sponsors.complete_ended_promotions(now).await {
            Ok(0) => {}
            Ok(completed) => info!(completed = completed, "已结束到期推广"),
            Err(e) => error!(error = %e, "结束到期推广出错"),
        }

        metrics::set_worker_last_run(WORKER_NAME);
    }
}

/// 距离下一个触发点的等待时长
fn next_delay(schedule: &Schedule, now: DateTime<Utc>) -> Option<Duration> {
    let next = schedule.after(&now).next()?;
    Some((next - now).to_std().unwrap_or(Duration::ZERO))
}
