use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser,
            RegisterRequest, ResetPasswordRequest, SessionExchangeRequest, VerifyEmailRequest,
        },
        password::{hash_password, verify_password},
        repo::{EmailVerificationToken, PasswordResetToken, Session, User},
        token::{logout_cookie, session_cookie},
    },
    auth::extractors::CurrentUser,
    email,
    error::{ApiError, ApiResult},
    profiles::repo::{provision_profile, split_name},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<RegisterRequest>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create_local(&state.db, &payload.email, payload.name.trim(), &hash).await?;

    let (first_name, last_name) = split_name(&payload.name);
    let profile = provision_profile(
        &state.db,
        user.id,
        &user.email,
        first_name.as_deref(),
        last_name.as_deref(),
        None,
    )
    .await?;

    let verification = EmailVerificationToken::create(&state.db, user.id).await?;
    email::send_welcome(&state, &user);
    email::send_verification(&state, &user, &verification.token);

    let session = Session::create(&state.db, user.id, state.config.session_ttl_days).await?;
    let jar = jar.add(session_cookie(
        session.token.clone(),
        state.config.session_ttl_days,
    ));

    info!(user_id = %user.id, username = %profile.username, "user registered");
    Ok((
        jar,
        Json(AuthResponse {
            session_token: session.token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if user.auth_type != "email" {
        return Err(ApiError::Validation(
            "This account uses an external sign-in".into(),
        ));
    }

    let hash = user.password_hash.as_deref().unwrap_or_default();
    if !verify_password(&payload.password, hash).unwrap_or(false) {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthenticated);
    }

    let session = Session::create(&state.db, user.id, state.config.session_ttl_days).await?;
    let jar = jar.add(session_cookie(
        session.token.clone(),
        state.config.session_ttl_days,
    ));

    info!(user_id = %user.id, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            session_token: session.token,
            user: user.into(),
        }),
    ))
}

/// What the identity provider returns for a valid session id.
#[derive(Debug, Deserialize)]
struct ProviderSessionData {
    email: String,
    name: String,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

#[instrument(skip(state, jar, payload))]
pub async fn exchange_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SessionExchangeRequest>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    if payload.session_id.is_empty() {
        return Err(ApiError::Validation("session_id required".into()));
    }

    let url = state
        .config
        .oauth_session_url
        .as_deref()
        .ok_or_else(|| ApiError::Upstream("identity provider not configured".into()))?;

    // One outbound call, no retries; any failure reads as a bad credential.
    let response = state
        .http
        .get(url)
        .header("X-Session-ID", &payload.session_id)
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "identity provider unreachable");
            ApiError::Unauthenticated
        })?;

    if !response.status().is_success() {
        warn!(status = %response.status(), "identity provider rejected session id");
        return Err(ApiError::Unauthenticated);
    }

    let data: ProviderSessionData = response.json().await.map_err(|e| {
        error!(error = %e, "identity provider returned malformed body");
        ApiError::Unauthenticated
    })?;

    let email = data.email.trim().to_lowercase();
    let known = User::find_by_email(&state.db, &email).await?.is_some();

    let user = User::upsert_external(
        &state.db,
        &email,
        &data.name,
        data.picture.as_deref(),
        "google",
        data.id.as_deref(),
    )
    .await?;

    if !known {
        let (first_name, last_name) = split_name(&data.name);
        provision_profile(
            &state.db,
            user.id,
            &user.email,
            first_name.as_deref(),
            last_name.as_deref(),
            data.picture.as_deref(),
        )
        .await?;
        email::send_welcome(&state, &user);
    }

    let session = Session::create(&state.db, user.id, state.config.session_ttl_days).await?;
    let jar = jar.add(session_cookie(
        session.token.clone(),
        state.config.session_ttl_days,
    ));

    info!(user_id = %user.id, "external session exchanged");
    Ok((
        jar,
        Json(AuthResponse {
            session_token: session.token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(cookie) = jar.get(crate::auth::token::SESSION_COOKIE) {
        Session::delete_by_token(&state.db, cookie.value()).await?;
    }
    Ok((
        jar.add(logout_cookie()),
        Json(MessageResponse::new("Logged out")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    // Same response whether or not the account exists.
    if let Some(user) = User::find_by_email(&state.db, &payload.email).await? {
        if user.auth_type == "email" {
            let reset = PasswordResetToken::create(&state.db, user.id).await?;
            email::send_password_reset(&state, &user, &reset.token);
        }
    }

    Ok(Json(MessageResponse::new(
        "If this email is registered, a reset link has been sent",
    )))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if payload.password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }

    let token = PasswordResetToken::find_valid(&state.db, &payload.token)
        .await?
        .ok_or_else(|| ApiError::Validation("Invalid or expired token".into()))?;

    let hash = hash_password(&payload.password)?;
    User::set_password(&state.db, token.user_id, &hash).await?;
    PasswordResetToken::mark_used(&state.db, token.id).await?;
    // Old credentials stop working everywhere.
    Session::delete_for_user(&state.db, token.user_id).await?;

    info!(user_id = %token.user_id, "password reset");
    Ok(Json(MessageResponse::new("Password updated")))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let token = EmailVerificationToken::find_valid(&state.db, &payload.token)
        .await?
        .ok_or_else(|| ApiError::Validation("Invalid or expired token".into()))?;

    User::mark_email_verified(&state.db, token.user_id).await?;
    EmailVerificationToken::mark_used(&state.db, token.id).await?;

    info!(user_id = %token.user_id, "email verified");
    Ok(Json(MessageResponse::new("Email verified")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("two words@example.com"));
        assert!(!is_valid_email(""));
    }
}
