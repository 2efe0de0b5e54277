//! 请求 DTO 定义
//!
//! 所有 REST API 的请求参数和请求体结构；格式校验在此完成，
//! 业务约束（选项去重、过期时间等）由服务层校验

use chrono::{DateTime, Utc};
use pollpeak::{
    AddQuestionInput, AdminProfileUpdate, AmbassadorStatus, CreatePollInput,
    CreateTriviaGameInput, MAX_PAGE, ModerationActionType, NewSponsor, NewStoreItem, Pagination,
    PollFilter, PollStatus, ProfileUpdate, PromotionStatus, ReportInput, ReportStatus,
    ReportTarget, StoreItemUpdate, UserRole,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

// ==================== 认证 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(length(min = 3, max = 30, message = "用户名长度必须在 3-30 之间"))]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "密码长度必须在 8-128 之间"))]
    pub password: String,
    #[validate(length(max = 50, message = "昵称不能超过 50 个字符"))]
    pub display_name: Option<String>,
    #[validate(length(min = 1, max = 32, message = "邀请码格式不正确"))]
    pub referral_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 254, message = "邮箱长度必须在 3-254 之间"))]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "密码长度必须在 1-128 之间"))]
    pub password: String,
}

// ==================== 用户 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 30, message = "用户名长度必须在 3-30 之间"))]
    pub username: Option<String>,
    #[validate(length(max = 50, message = "昵称不能超过 50 个字符"))]
    pub display_name: Option<String>,
    #[validate(url(message = "头像地址必须是合法 URL"))]
    pub avatar_url: Option<String>,
    #[validate(length(max = 500, message = "简介不能超过 500 个字符"))]
    pub bio: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            username: req.username,
            display_name: req.display_name,
            avatar_url: req.avatar_url,
            bio: req.bio,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateProfileRequest {
    pub role: Option<UserRole>,
    pub is_banned: Option<bool>,
    #[validate(range(min = -1_000_000, max = 1_000_000, message = "积分调整幅度过大"))]
    pub points_delta: Option<i32>,
    #[validate(length(max = 200, message = "调整原因不能超过 200 个字符"))]
    pub reason: Option<String>,
}

impl From<AdminUpdateProfileRequest> for AdminProfileUpdate {
    fn from(req: AdminUpdateProfileRequest) -> Self {
        Self {
            role: req.role,
            is_banned: req.is_banned,
            points_delta: req.points_delta,
            reason: req.reason,
        }
    }
}

// ==================== 投票 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    #[validate(length(min = 3, max = 200, message = "标题长度必须在 3-200 之间"))]
    pub title: String,
    #[validate(length(max = 2000, message = "描述不能超过 2000 个字符"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50, message = "分类长度必须在 1-50 之间"))]
    pub category: Option<String>,
    #[validate(length(min = 2, max = 10, message = "选项数量必须在 2-10 之间"))]
    pub options: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CreatePollRequest> for CreatePollInput {
    fn from(req: CreatePollRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            category: req.category,
            options: req.options,
            expires_at: req.expires_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[validate(range(min = 0, message = "选项下标不能为负数"))]
    pub option_index: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 1000, message = "评论长度必须在 1-1000 之间"))]
    pub content: String,
}

/// 投票列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollListQuery {
    pub status: Option<PollStatus>,
    pub category: Option<String>,
    pub creator_id: Option<Uuid>,
    pub promoted_only: Option<bool>,
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PollListQuery {
    pub fn pagination(&self) -> Pagination {
        page_of(self.page, self.page_size)
    }

    pub fn filter(&self) -> PollFilter {
        PollFilter {
            status: self.status,
            category: self.category.clone(),
            creator_id: self.creator_id,
            promoted_only: self.promoted_only,
            keyword: self.keyword.clone(),
        }
    }
}

// ==================== 问答 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswersRequest {
    #[validate(length(min = 1, max = 100, message = "答案数量必须在 1-100 之间"))]
    pub answers: Vec<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTriviaGameRequest {
    #[validate(length(min = 3, max = 200, message = "标题长度必须在 3-200 之间"))]
    pub title: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    #[validate(range(min = 0, max = 10000, message = "奖励积分必须在 0-10000 之间"))]
    pub points_reward: i32,
}

impl From<CreateTriviaGameRequest> for CreateTriviaGameInput {
    fn from(req: CreateTriviaGameRequest) -> Self {
        Self {
            title: req.title,
            category: req.category,
            difficulty: req.difficulty,
            points_reward: req.points_reward,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionRequest {
    #[validate(length(min = 1, max = 500, message = "题目长度必须在 1-500 之间"))]
    pub question: String,
    #[validate(length(min = 2, max = 6, message = "选项数量必须在 2-6 之间"))]
    pub options: Vec<String>,
    #[validate(range(min = 0, message = "正确答案下标不能为负数"))]
    pub correct_index: i32,
    pub explanation: Option<String>,
}

impl From<AddQuestionRequest> for AddQuestionInput {
    fn from(req: AddQuestionRequest) -> Self {
        Self {
            question: req.question,
            options: req.options,
            correct_index: req.correct_index,
            explanation: req.explanation,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub active: bool,
}

// ==================== 邀请与大使 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReferralRequest {
    #[validate(length(min = 1, max = 32, message = "邀请码格式不正确"))]
    pub code: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AmbassadorApplyRequest {
    #[validate(length(max = 1000, message = "申请理由不能超过 1000 个字符"))]
    pub motivation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbassadorListQuery {
    pub status: Option<AmbassadorStatus>,
}

// ==================== 积分商城 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreItemRequest {
    #[validate(length(min = 1, max = 200, message = "商品名称长度必须在 1-200 之间"))]
    pub name: String,
    #[validate(length(max = 2000, message = "描述不能超过 2000 个字符"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "兑换积分必须大于 0"))]
    pub cost_points: i32,
    #[validate(range(min = 0, message = "库存不能为负数"))]
    pub stock: Option<i32>,
}

impl From<CreateStoreItemRequest> for NewStoreItem {
    fn from(req: CreateStoreItemRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            cost_points: req.cost_points,
            stock: req.stock,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreItemRequest {
    #[validate(length(min = 1, max = 200, message = "商品名称长度必须在 1-200 之间"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "兑换积分必须大于 0"))]
    pub cost_points: Option<i32>,
    #[validate(range(min = 0, message = "库存不能为负数"))]
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<UpdateStoreItemRequest> for StoreItemUpdate {
    fn from(req: UpdateStoreItemRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            cost_points: req.cost_points,
            stock: req.stock,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeInactiveQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

// ==================== 赞助推广 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSponsorRequest {
    #[validate(length(min = 1, max = 200, message = "赞助商名称长度必须在 1-200 之间"))]
    pub name: String,
    #[validate(email(message = "联系邮箱格式不正确"))]
    pub contact_email: String,
    #[validate(url(message = "网站地址必须是合法 URL"))]
    pub website: Option<String>,
}

impl From<CreateSponsorRequest> for NewSponsor {
    fn from(req: CreateSponsorRequest) -> Self {
        Self {
            name: req.name,
            contact_email: req.contact_email,
            website: req.website,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PromotePollRequest {
    pub poll_id: i64,
    pub sponsor_id: i64,
    #[validate(range(min = 1, message = "推广预算必须大于 0"))]
    pub budget_cents: i64,
    /// 缺省为立即开始
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, max = 200, message = "付款凭证长度必须在 1-200 之间"))]
    pub reference: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionListQuery {
    pub status: Option<PromotionStatus>,
}

// ==================== 审核 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub target_type: ReportTarget,
    #[validate(length(min = 1, max = 64, message = "举报对象格式不正确"))]
    pub target_id: String,
    #[validate(length(min = 3, max = 200, message = "举报原因长度必须在 3-200 之间"))]
    pub reason: String,
    #[validate(length(max = 2000, message = "补充说明不能超过 2000 个字符"))]
    pub details: Option<String>,
}

impl From<ReportRequest> for ReportInput {
    fn from(req: ReportRequest) -> Self {
        Self {
            target_type: req.target_type,
            target_id: req.target_id,
            reason: req.reason,
            details: req.details,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReportRequest {
    pub action: ModerationActionType,
    #[validate(length(max = 1000, message = "处理备注不能超过 1000 个字符"))]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListQuery {
    pub status: Option<ReportStatus>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ReportListQuery {
    pub fn pagination(&self) -> Pagination {
        page_of(self.page, self.page_size)
    }
}

// ==================== 系统设置 ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSettingRequest {
    pub value: serde_json::Value,
    #[serde(default)]
    pub is_public: bool,
}

// ==================== 通用 ====================

/// 分页查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

/// 页码收敛到 1..=MAX_PAGE，每页条数收敛到 1..=100
fn page_of(page: Option<i64>, page_size: Option<i64>) -> Pagination {
    Pagination::new(
        page.unwrap_or_else(default_page).clamp(1, MAX_PAGE),
        page_size.unwrap_or_else(default_page_size).clamp(1, 100),
    )
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        page_of(Some(params.page), Some(params.page_size))
    }
}

/// 条数限制查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    pub fn limit_or(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default)
    }
}
