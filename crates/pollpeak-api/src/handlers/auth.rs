//! 认证相关的 HTTP 处理器
//!
//! 注册、登录、刷新 Token 和获取当前用户

use axum::{Extension, Json, extract::State};
use pollpeak::{Profile, ServiceError};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{Claims, hash_password, verify_password};
use crate::dto::{ApiResponse, AuthResponse, LoginRequest, RegisterRequest, RegisterResponse};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 用户注册
///
/// POST /api/v1/auth/register
///
/// 携带邀请码时在账号创建后使用，邀请码无效不影响注册结果
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>> {
    req.validate()?;

    let password_hash = hash_password(&req.password)?;
    let profile = state
        .profiles
        .register(&req.email, &req.username, password_hash, req.display_name)
        .await?;

    let (referral, referral_error) = match req.referral_code.as_deref() {
        Some(code) => match state.referrals.apply_referral(profile.id, code).await {
            Ok(applied) => (Some(applied), None),
            Err(e) if e.is_business_error() => {
                warn!(user_id = %profile.id, error = %e, "注册时邀请码使用失败");
                (None, Some(e.to_string()))
            }
            Err(e) => return Err(e.into()),
        },
        None => (None, None),
    };

    // 邀请奖励会改变积分，重新读取
    let profile = if referral.is_some() {
        state.profiles.get_profile(profile.id).await?
    } else {
        profile
    };

    let (token, expires_at) =
        state
            .jwt_manager
            .generate_token(profile.id, &profile.username, profile.role)?;
    info!(user_id = %profile.id, username = %profile.username, "用户注册成功");

    Ok(Json(ApiResponse::success_with_message(
        RegisterResponse {
            token,
            expires_at,
            profile,
            referral,
            referral_error,
        },
        "注册成功",
    )))
}

/// 用户登录
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    req.validate()?;

    let credentials = state
        .profiles
        .credentials_by_email(&req.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&req.password, &credentials.password_hash)? {
        warn!(user_id = %credentials.id, "登录密码错误");
        return Err(ApiError::InvalidCredentials);
    }
    if credentials.is_banned {
        return Err(ServiceError::UserBanned.into());
    }

    let profile = state.profiles.get_profile(credentials.id).await?;
    issue(&state, profile)
}

/// 刷新 Token
///
/// POST /api/v1/auth/refresh
///
/// 角色和封禁状态以数据库为准，管理员调整角色后刷新即可生效
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let user_id = claims.user_id()?;
    let credentials = state
        .profiles
        .credentials_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("用户不存在".to_string()))?;
    if credentials.is_banned {
        return Err(ServiceError::UserBanned.into());
    }

    let profile = state.profiles.get_profile(user_id).await?;
    issue(&state, profile)
}

/// 获取当前用户
///
/// GET /api/v1/auth/me
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Profile>>> {
    let profile = state.profiles.get_profile(claims.user_id()?).await?;
    Ok(Json(ApiResponse::success(profile)))
}

fn issue(state: &AppState, profile: Profile) -> Result<Json<ApiResponse<AuthResponse>>> {
    let (token, expires_at) =
        state
            .jwt_manager
            .generate_token(profile.id, &profile.username, profile.role)?;
    info!(user_id = %profile.id, "签发 Token");

    Ok(Json(ApiResponse::success(AuthResponse {
        token,
        expires_at,
        profile,
    })))
}
