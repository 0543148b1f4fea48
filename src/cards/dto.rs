use serde::{Deserialize, Serialize};

use super::repo::{PhysicalCard, STATUS_ACTIVATED};

pub const MAX_BATCH_SIZE: u32 = 100;

fn default_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct GenerateCardsRequest {
    #[serde(default = "default_count")]
    pub count: u32,
    pub batch_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedCardsResponse {
    pub cards: Vec<PhysicalCard>,
}

/// Public answer for a scanned code. `redirect_to` is what a QR landing
/// page should follow: the profile for an activated card, the activation
/// flow otherwise.
#[derive(Debug, Serialize)]
pub struct CardStatusResponse {
    pub status: String,
    pub code: String,
    pub redirect_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl CardStatusResponse {
    pub fn new(card: &PhysicalCard, username: Option<String>) -> CardStatusResponse {
        let redirect_to = match (&username, card.status == STATUS_ACTIVATED) {
            (Some(name), true) => format!("/u/{name}"),
            _ => format!("/activate/{}", card.code),
        };
        CardStatusResponse {
            status: card.status.clone(),
            code: card.code.clone(),
            redirect_to,
            username,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivatedCardResponse {
    pub card: PhysicalCard,
    pub redirect_to: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn card(status: &str) -> PhysicalCard {
        PhysicalCard {
            id: Uuid::new_v4(),
            code: "FCAB12CD34".to_string(),
            status: status.to_string(),
            user_id: None,
            profile_id: None,
            batch_name: None,
            activated_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn activated_card_redirects_to_profile() {
        let response = CardStatusResponse::new(&card("activated"), Some("jane".to_string()));
        assert_eq!(response.redirect_to, "/u/jane");
    }

    #[test]
    fn unactivated_card_redirects_to_activation() {
        let response = CardStatusResponse::new(&card("unactivated"), None);
        assert_eq!(response.redirect_to, "/activate/FCAB12CD34");
    }

    #[test]
    fn activated_card_with_missing_profile_falls_back_to_activation() {
        let response = CardStatusResponse::new(&card("activated"), None);
        assert_eq!(response.redirect_to, "/activate/FCAB12CD34");
    }
}
