//! 业务服务错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;
use uuid::Uuid;

/// 业务服务错误类型
#[derive(Debug, Error)]
pub enum ServiceError {
    // === 资源不存在 ===
    #[error("用户不存在: {0}")]
    ProfileNotFound(Uuid),

    #[error("投票不存在: {0}")]
    PollNotFound(i64),

    #[error("评论不存在: {0}")]
    CommentNotFound(i64),

    #[error("问答游戏不存在: {0}")]
    TriviaGameNotFound(i64),

    #[error("商品不存在: {0}")]
    StoreItemNotFound(i64),

    #[error("赞助商不存在: {0}")]
    SponsorNotFound(i64),

    #[error("推广不存在: {0}")]
    PromotionNotFound(i64),

    #[error("举报不存在: {0}")]
    ReportNotFound(i64),

    #[error("大使申请不存在")]
    AmbassadorNotFound,

    #[error("设置项不存在: {0}")]
    SettingNotFound(String),

    // === 投票 ===
    #[error("投票未开放: poll_id={0}")]
    PollNotActive(i64),

    #[error("投票已过期: poll_id={0}")]
    PollExpired(i64),

    #[error("选项下标越界: index={index}, options={options}")]
    InvalidOption { index: i32, options: usize },

    #[error("已经投过票: poll_id={0}")]
    AlreadyVoted(i64),

    // === 问答 ===
    #[error("问答游戏已完成: game_id={0}")]
    TriviaAlreadyCompleted(i64),

    #[error("问答游戏未上线: game_id={0}")]
    TriviaGameInactive(i64),

    #[error("答案数量不匹配: 需要 {expected}, 提交 {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },

    // === 每日奖励 ===
    #[error("今日奖励已领取")]
    DailyRewardAlreadyClaimed,

    #[error("今日转盘次数已用完")]
    SpinAlreadyUsed,

    #[error("今日广告奖励已达上限: {0}")]
    AdLimitReached(i32),

    // === 邀请与大使 ===
    #[error("邀请码无效: {0}")]
    InvalidReferralCode(String),

    #[error("不能使用自己的邀请码")]
    SelfReferral,

    #[error("已经使用过邀请码")]
    AlreadyReferred,

    #[error("已提交过大使申请")]
    AmbassadorApplicationExists,

    #[error("大使申请状态不允许此操作: {0}")]
    InvalidAmbassadorStatus(String),

    // === 积分商城 ===
    #[error("积分不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: i32, available: i32 },

    #[error("商品库存不足: item_id={0}")]
    OutOfStock(i64),

    #[error("商品已下架: item_id={0}")]
    StoreItemInactive(i64),

    // === 推广 ===
    #[error("推广状态不允许此操作: promotion_id={id}, current_status={status}")]
    InvalidPromotionStatus { id: i64, status: String },

    // === 审核 ===
    #[error("举报已处理: report_id={0}")]
    ReportAlreadyResolved(i64),

    #[error("已存在未处理的举报")]
    DuplicateReport,

    // === 用户 ===
    #[error("用户已被封禁")]
    UserBanned,

    #[error("无权操作: {0}")]
    Forbidden(String),

    #[error("用户名已被使用: {0}")]
    UsernameTaken(String),

    #[error("邮箱已被注册: {0}")]
    EmailTaken(String),

    /// 生成的邀请码与已有用户重复，注册时换码重试
    #[error("邀请码冲突: {0}")]
    ReferralCodeTaken(String),

    // === 系统错误 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 业务服务 Result 类型别名
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_)
                | Self::Serialization(_)
                | Self::Internal(_)
                | Self::ReferralCodeTaken(_)
        )
    }

    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ProfileNotFound(_) => "PROFILE_NOT_FOUND",
            Self::PollNotFound(_) => "POLL_NOT_FOUND",
            Self::CommentNotFound(_) => "COMMENT_NOT_FOUND",
            Self::TriviaGameNotFound(_) => "TRIVIA_GAME_NOT_FOUND",
            Self::StoreItemNotFound(_) => "STORE_ITEM_NOT_FOUND",
            Self::SponsorNotFound(_) => "SPONSOR_NOT_FOUND",
            Self::PromotionNotFound(_) => "PROMOTION_NOT_FOUND",
            Self::ReportNotFound(_) => "REPORT_NOT_FOUND",
            Self::AmbassadorNotFound => "AMBASSADOR_NOT_FOUND",
            Self::SettingNotFound(_) => "SETTING_NOT_FOUND",
            Self::PollNotActive(_) => "POLL_NOT_ACTIVE",
            Self::PollExpired(_) => "POLL_EXPIRED",
            Self::InvalidOption { .. } => "INVALID_OPTION",
            Self::AlreadyVoted(_) => "ALREADY_VOTED",
            Self::TriviaAlreadyCompleted(_) => "TRIVIA_ALREADY_COMPLETED",
            Self::TriviaGameInactive(_) => "TRIVIA_GAME_INACTIVE",
            Self::AnswerCountMismatch { .. } => "ANSWER_COUNT_MISMATCH",
            Self::DailyRewardAlreadyClaimed => "DAILY_REWARD_ALREADY_CLAIMED",
            Self::SpinAlreadyUsed => "SPIN_ALREADY_USED",
            Self::AdLimitReached(_) => "AD_LIMIT_REACHED",
            Self::InvalidReferralCode(_) => "INVALID_REFERRAL_CODE",
            Self::SelfReferral => "SELF_REFERRAL",
            Self::AlreadyReferred => "ALREADY_REFERRED",
            Self::AmbassadorApplicationExists => "AMBASSADOR_APPLICATION_EXISTS",
            Self::InvalidAmbassadorStatus(_) => "INVALID_AMBASSADOR_STATUS",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::OutOfStock(_) => "OUT_OF_STOCK",
            Self::StoreItemInactive(_) => "STORE_ITEM_INACTIVE",
            Self::InvalidPromotionStatus { .. } => "INVALID_PROMOTION_STATUS",
            Self::ReportAlreadyResolved(_) => "REPORT_ALREADY_RESOLVED",
            Self::DuplicateReport => "DUPLICATE_REPORT",
            Self::UserBanned => "USER_BANNED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::UsernameTaken(_) => "USERNAME_TAKEN",
            Self::EmailTaken(_) => "EMAIL_TAKEN",
            Self::ReferralCodeTaken(_) => "REFERRAL_CODE_CONFLICT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
