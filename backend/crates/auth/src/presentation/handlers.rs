//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::extract::{ApiJson, ApiQuery};
use platform::kv::SharedKv;
use platform::mail::{Notifier, SharedMailer};

use crate::application::config::AuthConfig;
use crate::application::{
    AuthGate, ConfirmEmailUseCase, ForgotPasswordUseCase, LoginInput, LoginUseCase,
    LogoutUseCase, ProfileUseCase, RegisterUseCase, TokenIssuer,
};
use crate::domain::entity::session::AuthContext;
use crate::domain::repository::SharedUserRepository;
use crate::error::AuthResult;
use crate::infra::confirmation::ConfirmationKeys;
use crate::infra::session_cache::SessionCache;
use crate::presentation::dto::{
    ConfirmEmailQuery, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    TokenResponse, UpdateProfileRequest, UserProfileResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<R, K, M> {
    pub users: Arc<R>,
    pub sessions: SessionCache<K>,
    pub confirmations: ConfirmationKeys<K>,
    pub issuer: Arc<TokenIssuer>,
    pub notifier: Notifier<M>,
    pub config: Arc<AuthConfig>,
}

impl<R, K: Clone, M> Clone for AuthAppState<R, K, M> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            sessions: self.sessions.clone(),
            confirmations: self.confirmations.clone(),
            issuer: self.issuer.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, K, M> AuthAppState<R, K, M>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    /// Wire the state from its backends
    pub fn new(users: R, kv: K, mailer: M, config: AuthConfig) -> Self {
        Self {
            users: Arc::new(users),
            sessions: SessionCache::new(kv.clone(), config.session_ttl),
            confirmations: ConfirmationKeys::new(kv, config.confirmation_ttl),
            issuer: Arc::new(TokenIssuer::new(&config.signing_key, config.token_ttl)),
            notifier: Notifier::new(mailer),
            config: Arc::new(config),
        }
    }

    /// Gate sharing this state's issuer and session cache
    pub fn gate(&self) -> AuthGate<K> {
        AuthGate::new(self.issuer.clone(), self.sessions.clone())
    }

    fn profiles(&self) -> ProfileUseCase<R, K> {
        ProfileUseCase::new(self.users.clone(), self.sessions.clone())
    }
}

// ============================================================================
// Registration and login
// ============================================================================

/// POST /api/users
pub async fn register<R, K, M>(
    State(state): State<AuthAppState<R, K, M>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let use_case = RegisterUseCase::new(
        state.users.clone(),
        state.sessions.clone(),
        state.confirmations.clone(),
        state.issuer.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let issued = use_case.execute(req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token: issued.token,
        }),
    ))
}

/// POST /api/login
pub async fn login<R, K, M>(
    State(state): State<AuthAppState<R, K, M>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AuthResult<Json<TokenResponse>>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let use_case = LoginUseCase::new(
        state.users.clone(),
        state.sessions.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let issued = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(TokenResponse {
        token: issued.token,
    }))
}

/// GET /api/logout
pub async fn logout<R, K, M>(
    State(state): State<AuthAppState<R, K, M>>,
    ctx: AuthContext,
) -> AuthResult<Json<MessageResponse>>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    LogoutUseCase::new(state.sessions.clone())
        .execute(&ctx)
        .await?;

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

// ============================================================================
// Confirmation and password reset
// ============================================================================

/// GET /api/confirm-email?key=
pub async fn confirm_email<R, K, M>(
    State(state): State<AuthAppState<R, K, M>>,
    ApiQuery(query): ApiQuery<ConfirmEmailQuery>,
) -> AuthResult<Json<TokenResponse>>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let use_case = ConfirmEmailUseCase::new(
        state.users.clone(),
        state.sessions.clone(),
        state.confirmations.clone(),
        state.issuer.clone(),
    );

    let issued = use_case.execute(&query.key).await?;

    Ok(Json(TokenResponse {
        token: issued.token,
    }))
}

/// POST /api/forgot-password
pub async fn forgot_password<R, K, M>(
    State(state): State<AuthAppState<R, K, M>>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    ForgotPasswordUseCase::new(
        state.users.clone(),
        state.notifier.clone(),
        state.config.clone(),
    )
    .execute(req.email)
    .await?;

    Ok(Json(MessageResponse::new(
        "If the email is registered, a new password is on its way",
    )))
}

// ============================================================================
// Profiles
// ============================================================================

/// GET /api/users
pub async fn list_users<R, K, M>(
    State(state): State<AuthAppState<R, K, M>>,
) -> AuthResult<Json<Vec<UserProfileResponse>>>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let users = state.profiles().list().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /api/users/{username}
pub async fn get_user<R, K, M>(
    State(state): State<AuthAppState<R, K, M>>,
    Path(username): Path<String>,
) -> AuthResult<Json<UserProfileResponse>>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let user = state.profiles().get(&username).await?;
    Ok(Json(user.into()))
}

/// PUT /api/users
pub async fn update_profile<R, K, M>(
    State(state): State<AuthAppState<R, K, M>>,
    ctx: AuthContext,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> AuthResult<Json<UserProfileResponse>>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    let user = state.profiles().update(&ctx, req.into()).await?;
    Ok(Json(user.into()))
}

/// DELETE /api/users
pub async fn delete_account<R, K, M>(
    State(state): State<AuthAppState<R, K, M>>,
    ctx: AuthContext,
) -> AuthResult<Json<MessageResponse>>
where
    R: SharedUserRepository,
    K: SharedKv,
    M: SharedMailer,
{
    state.profiles().delete(&ctx).await?;
    Ok(Json(MessageResponse::new("Account deleted")))
}
