//! Transactional email bodies. Plain string templating around a shared
//! branded frame; nothing here talks to the network.

const PRIMARY_COLOR: &str = "#8645D6";

fn base_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="margin:0;padding:0;background-color:#f4f4f5;font-family:-apple-system,'Segoe UI',Roboto,Arial,sans-serif;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0">
    <tr><td align="center" style="padding:40px 20px;">
      <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width:600px;background:#ffffff;border-radius:16px;overflow:hidden;">
        <tr><td style="background:{PRIMARY_COLOR};padding:30px 40px;text-align:center;">
          <h1 style="margin:0;color:#ffffff;font-size:28px;">FlexCard</h1>
          <p style="margin:8px 0 0;color:rgba(255,255,255,0.9);font-size:14px;">Your digital business card</p>
        </td></tr>
        <tr><td style="padding:40px;">{content}</td></tr>
        <tr><td style="background:#f9fafb;padding:24px 40px;text-align:center;border-top:1px solid #e5e7eb;">
          <p style="margin:0;color:#9ca3af;font-size:11px;">This email was sent by FlexCard. If you did not expect it, you can ignore it.</p>
        </td></tr>
      </table>
    </td></tr>
  </table>
</body>
</html>"#
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"<div style="text-align:center;margin:30px 0;">
  <a href="{href}" style="display:inline-block;background:{PRIMARY_COLOR};color:#ffffff;text-decoration:none;padding:14px 32px;border-radius:8px;font-weight:600;">{label}</a>
</div>"#
    )
}

pub fn welcome(name: &str) -> (String, String) {
    let subject = "Welcome to FlexCard!".to_string();
    let content = format!(
        r#"<h2 style="margin:0 0 16px;">Hello {name}!</h2>
<p>Welcome to <strong>FlexCard</strong>. Build your digital business card and share it in seconds with a QR code or a link.</p>
<p style="color:#4b5563;font-size:14px;">Next steps: complete your profile, add your social links, share your card.</p>"#
    );
    (subject.clone(), base_template(&subject, &content))
}

pub fn email_verification(name: &str, verification_link: &str) -> (String, String) {
    let subject = "Confirm your email address - FlexCard".to_string();
    let content = format!(
        r#"<h2 style="margin:0 0 16px;">Hello {name},</h2>
<p>Thanks for signing up for FlexCard! Confirm your email address to activate your account.</p>
{button}
<p style="text-align:center;color:#6b7280;font-size:12px;">This link expires in 24 hours.</p>"#,
        button = button(verification_link, "Confirm my email")
    );
    (subject.clone(), base_template(&subject, &content))
}

pub fn password_reset(name: &str, reset_link: &str) -> (String, String) {
    let subject = "Reset your FlexCard password".to_string();
    let content = format!(
        r#"<h2 style="margin:0 0 16px;">Hello {name},</h2>
<p>You asked to reset your FlexCard password. Use the button below to choose a new one.</p>
{button}
<p style="text-align:center;color:#6b7280;font-size:12px;">This link expires in 1 hour.</p>
<p style="color:#92400e;font-size:14px;"><strong>Didn't request this?</strong> Ignore this email and your password will stay unchanged.</p>"#,
        button = button(reset_link, "Reset my password")
    );
    (subject.clone(), base_template(&subject, &content))
}

pub fn card_activation(name: &str, card_code: &str, profile_link: &str) -> (String, String) {
    let subject = format!("Your FlexCard {card_code} is activated!");
    let content = format!(
        r#"<h2 style="margin:0 0 16px;">Congratulations {name}!</h2>
<p>Your card <strong style="color:{PRIMARY_COLOR};">{card_code}</strong> has been activated. Anyone scanning its QR code will now land on your profile.</p>
{button}"#,
        button = button(profile_link, "View my profile")
    );
    (subject.clone(), base_template(&subject, &content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_greets_by_name() {
        let (subject, html) = welcome("Jane");
        assert!(subject.contains("Welcome"));
        assert!(html.contains("Hello Jane"));
    }

    #[test]
    fn verification_carries_link_and_expiry() {
        let (subject, html) =
            email_verification("Jane", "https://flexcard.test/verify-email?token=t1");
        assert!(subject.contains("Confirm"));
        assert!(html.contains("https://flexcard.test/verify-email?token=t1"));
        assert!(html.contains("expires in 24 hours"));
    }

    #[test]
    fn reset_mentions_expiry_and_link() {
        let (subject, html) = password_reset("Jane", "https://flexcard.test/reset?token=t2");
        assert!(subject.contains("password"));
        assert!(html.contains("expires in 1 hour"));
        assert!(html.contains("token=t2"));
    }

    #[test]
    fn card_activation_names_the_card() {
        let (subject, html) = card_activation("Jane", "FC1A2B3C4D", "https://flexcard.test/u/jane");
        assert!(subject.contains("FC1A2B3C4D"));
        assert!(html.contains("/u/jane"));
    }

    #[test]
    fn templates_are_full_html_documents() {
        let (_, html) = welcome("Jane");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("</html>"));
    }
}
