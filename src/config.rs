use serde::Deserialize;

/// Verification settings for third-party (Supabase-issued) JWTs.
/// When absent, only opaque local session tokens are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseJwtConfig {
    pub secret: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_key: String,
    pub sender: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub frontend_url: String,
    pub uploads_dir: String,
    pub session_ttl_days: i64,
    pub supabase_jwt: Option<SupabaseJwtConfig>,
    pub oauth_session_url: Option<String>,
    pub mail: Option<MailConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let supabase_jwt = std::env::var("SUPABASE_JWT_SECRET")
            .ok()
            .map(|secret| SupabaseJwtConfig {
                secret,
                audience: std::env::var("SUPABASE_JWT_AUDIENCE")
                    .unwrap_or_else(|_| "authenticated".into()),
            });
        let mail = std::env::var("RESEND_API_KEY")
            .ok()
            .map(|api_key| MailConfig {
                api_key,
                sender: std::env::var("SENDER_EMAIL")
                    .unwrap_or_else(|_| "FlexCard <onboarding@resend.dev>".into()),
            });
        Ok(Self {
            database_url,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "https://www.flexcardci.com".into()),
            uploads_dir: std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".into()),
            session_ttl_days: std::env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
            supabase_jwt,
            oauth_session_url: std::env::var("OAUTH_SESSION_URL").ok(),
            mail,
        })
    }
}
