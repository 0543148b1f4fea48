use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    auth::{
        jwt::SupabaseJwt,
        repo::{Session, User},
        token::SESSION_COOKIE,
    },
    error::ApiError,
    state::AppState,
};

/// Authenticated caller, resolved from the session cookie or a bearer token.
///
/// When a Supabase JWT secret is configured the credential is first tried as
/// a provider-issued JWT (mapped via `users.supabase_user_id`); on failure it
/// falls back to the opaque local session lookup. All failure modes surface
/// as the same `Unauthenticated` error.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let credential = extract_credential(parts).ok_or(ApiError::Unauthenticated)?;

        if let Some(jwt_config) = &state.config.supabase_jwt {
            let jwt = SupabaseJwt::new(jwt_config);
            if let Ok(claims) = jwt.verify(&credential) {
                match User::find_by_supabase_id(&state.db, &claims.sub).await? {
                    Some(user) => return Ok(CurrentUser(user)),
                    None => {
                        warn!(sub = %claims.sub, "valid external jwt for unknown account");
                        return Err(ApiError::Unauthenticated);
                    }
                }
            }
        }

        let session = Session::find_valid(&state.db, &credential)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        let user = User::find_by_id(&state.db, session.user_id)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok(CurrentUser(user))
    }
}

fn extract_credential(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/profile");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn credential_from_cookie() {
        let parts = parts_with(&[("cookie", "session_token=abc123; other=x")]);
        assert_eq!(extract_credential(&parts).as_deref(), Some("abc123"));
    }

    #[test]
    fn credential_from_bearer_header() {
        let parts = parts_with(&[("authorization", "Bearer tok-456")]);
        assert_eq!(extract_credential(&parts).as_deref(), Some("tok-456"));
    }

    #[test]
    fn cookie_wins_over_header() {
        let parts = parts_with(&[
            ("cookie", "session_token=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(extract_credential(&parts).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn missing_credential_is_none() {
        let parts = parts_with(&[("authorization", "Basic dXNlcg==")]);
        assert_eq!(extract_credential(&parts), None);
        assert_eq!(extract_credential(&parts_with(&[])), None);
    }

    #[test]
    fn empty_cookie_falls_back_to_header() {
        let parts = parts_with(&[
            ("cookie", "session_token="),
            ("authorization", "Bearer fallback"),
        ]);
        assert_eq!(extract_credential(&parts).as_deref(), Some("fallback"));
    }
}
