//! Fire-and-forget transactional email. Sends run on a spawned task so a
//! slow or failing provider never delays the triggering request; failures
//! are logged and not retried.

use tracing::error;

use crate::{auth::repo::User, state::AppState};

pub mod mailer;
pub mod templates;

fn spawn_send(state: &AppState, to: String, subject: String, html: String) {
    let mailer = state.mailer.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, &subject, &html).await {
            error!(error = %e, %to, "failed to send email");
        }
    });
}

pub fn send_welcome(state: &AppState, user: &User) {
    let (subject, html) = templates::welcome(&user.name);
    spawn_send(state, user.email.clone(), subject, html);
}

pub fn send_verification(state: &AppState, user: &User, token: &str) {
    let link = format!("{}/verify-email?token={token}", state.config.frontend_url);
    let (subject, html) = templates::email_verification(&user.name, &link);
    spawn_send(state, user.email.clone(), subject, html);
}

pub fn send_password_reset(state: &AppState, user: &User, token: &str) {
    let link = format!("{}/reset-password?token={token}", state.config.frontend_url);
    let (subject, html) = templates::password_reset(&user.name, &link);
    spawn_send(state, user.email.clone(), subject, html);
}

pub fn send_card_activation(state: &AppState, user: &User, card_code: &str, username: &str) {
    let link = format!("{}/u/{username}", state.config.frontend_url);
    let (subject, html) = templates::card_activation(&user.name, card_code, &link);
    spawn_send(state, user.email.clone(), subject, html);
}
