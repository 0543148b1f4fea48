use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub platform: Option<String>,
    pub url: String,
    pub title: Option<String>,
    pub icon: Option<String>,
}

fn default_kind() -> String {
    "social".into()
}

impl CreateLinkRequest {
    /// Falls back to a capitalized platform name when no title was given.
    pub fn display_title(&self) -> Option<String> {
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return Some(title.trim().to_string());
        }
        let platform = self.platform.as_deref()?.trim();
        let mut chars = platform.chars();
        let first = chars.next()?;
        Some(first.to_uppercase().chain(chars).collect())
    }
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub link_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: Option<&str>, platform: Option<&str>) -> CreateLinkRequest {
        CreateLinkRequest {
            kind: "social".into(),
            platform: platform.map(Into::into),
            url: "https://example.com".into(),
            title: title.map(Into::into),
            icon: None,
        }
    }

    #[test]
    fn explicit_title_wins() {
        let r = request(Some("My LinkedIn"), Some("linkedin"));
        assert_eq!(r.display_title().as_deref(), Some("My LinkedIn"));
    }

    #[test]
    fn platform_is_capitalized_as_fallback() {
        let r = request(None, Some("linkedin"));
        assert_eq!(r.display_title().as_deref(), Some("Linkedin"));
        let r = request(Some("  "), Some("x"));
        assert_eq!(r.display_title().as_deref(), Some("X"));
    }

    #[test]
    fn no_title_and_no_platform_yields_none() {
        assert_eq!(request(None, None).display_title(), None);
    }

    #[test]
    fn kind_defaults_to_social() {
        let r: CreateLinkRequest =
            serde_json::from_str(r#"{"url":"https://x.com/a","platform":"x"}"#).unwrap();
        assert_eq!(r.kind, "social");
    }
}
