//! PollPeak 业务服务
//!
//! 社区投票与积分激励平台的领域层。
//!
//! ## 核心功能
//!
//! - **投票**：创建投票、投票、评论、结果统计
//! - **问答**：问答游戏作答与按得分发放积分
//! - **每日奖励**：签到连续天数倍率、幸运转盘、广告奖励
//! - **徽章**：按用户计数与静态阈值自动授予
//! - **邀请与大使**：邀请奖励、大使等级与佣金
//! - **积分商城**：积分兑换商品，所有积分变动记录流水
//! - **赞助推广**：赞助商付费推广投票
//! - **内容审核**：举报、隐藏内容、封禁用户
//!
//! ## 模块结构
//!
//! - `scoring`: 纯函数积分公式
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层

pub mod error;
pub mod models;
pub mod repository;
pub mod scoring;
pub mod service;

pub use error::{Result, ServiceError};
pub use models::*;
pub use repository::*;
pub use service::*;
