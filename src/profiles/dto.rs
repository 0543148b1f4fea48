use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UpdateUsernameRequest {
    pub username: String,
}

pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters");
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Username must be alphanumeric");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_username("  JaneDoe42 "), "janedoe42");
    }

    #[test]
    fn rejects_short_and_non_alphanumeric() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("jane.doe").is_err());
        assert!(validate_username("jane doe").is_err());
        assert!(validate_username("jane-doe").is_err());
        assert!(validate_username("janedoe42").is_ok());
    }
}
