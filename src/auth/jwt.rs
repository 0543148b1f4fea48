use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SupabaseJwtConfig;

/// Claims we care about in a Supabase-issued access token. The subject is
/// the provider-side user id, matched against `users.supabase_user_id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExternalClaims {
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct SupabaseJwt {
    decoding: DecodingKey,
    audience: String,
}

impl SupabaseJwt {
    pub fn new(config: &SupabaseJwtConfig) -> Self {
        Self {
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            audience: config.audience.clone(),
        }
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<ExternalClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        let data = decode::<ExternalClaims>(token, &self.decoding, &validation)?;
        debug!(sub = %data.claims.sub, "external jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::OffsetDateTime;

    fn config(secret: &str) -> SupabaseJwtConfig {
        SupabaseJwtConfig {
            secret: secret.into(),
            audience: "authenticated".into(),
        }
    }

    fn sign(secret: &str, aud: &str, exp_offset_secs: i64) -> String {
        let claims = ExternalClaims {
            sub: "9f1c5f3e-supabase-user".into(),
            aud: aud.into(),
            exp: (OffsetDateTime::now_utc().unix_timestamp() + exp_offset_secs) as usize,
            email: Some("user@example.com".into()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("sign")
    }

    #[test]
    fn verifies_valid_token() {
        let jwt = SupabaseJwt::new(&config("secret"));
        let claims = jwt.verify(&sign("secret", "authenticated", 3600)).expect("verify");
        assert_eq!(claims.sub, "9f1c5f3e-supabase-user");
    }

    #[test]
    fn rejects_wrong_secret() {
        let jwt = SupabaseJwt::new(&config("secret"));
        assert!(jwt.verify(&sign("other", "authenticated", 3600)).is_err());
    }

    #[test]
    fn rejects_wrong_audience() {
        let jwt = SupabaseJwt::new(&config("secret"));
        assert!(jwt.verify(&sign("secret", "anon", 3600)).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let jwt = SupabaseJwt::new(&config("secret"));
        assert!(jwt.verify(&sign("secret", "authenticated", -3600)).is_err());
    }

    #[test]
    fn rejects_opaque_session_token() {
        // Local session tokens must fall through to the database lookup.
        let jwt = SupabaseJwt::new(&config("secret"));
        assert!(jwt.verify(&crate::auth::token::generate_token()).is_err());
    }
}
