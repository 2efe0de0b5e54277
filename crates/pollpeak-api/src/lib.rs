//! PollPeak REST API
//!
//! 对外提供投票、问答、每日奖励、积分商城等 C 端接口，以及 `/api/admin` 下的运营管理接口。
//!
//! ## 模块结构
//!
//! - `auth`: JWT 签发校验与密码哈希
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: HTTP 错误类型与统一响应体
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 认证、角色校验、限流、安全头
//! - `routes`: 路由与中间件装配
//! - `state`: 应用状态
//! - `worker`: 定时状态更新任务
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod worker;

pub use dto::{ApiResponse, PageResponse, PaginationParams};
pub use error::{ApiError, Result};
pub use state::AppState;
