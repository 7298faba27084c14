use std::sync::Arc;

use once_cell::sync::Lazy;
use reqwest::Client;
use tera::{Context, Tera};
use tracing::{error, info};

use crate::server::config::ServerConfig;
use crate::web::error::AppError;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

const CONFIRMATION_SUBJECT: &str = "Confirm your email";

const CONFIRMATION_TEMPLATE: &str = r#"<html>
  <body>
    <p>Hi {{ username }},</p>
    <p>Thanks for signing up for PhotoShare. Please confirm your email address
       by following the link below:</p>
    <p><a href="{{ link | safe }}">Confirm email</a></p>
    <p>If you did not create this account, you can ignore this message.</p>
  </body>
</html>"#;

/// Sends transactional mail through an HTTP mail API.
pub struct Mailer {
    api_url: String,
    api_key: String,
    from: String,
    base_url: String,
}

impl Mailer {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from: config.mail_from.clone(),
            base_url: config.base_url.clone(),
        }
    }

    pub async fn send_confirmation(
        &self,
        to: &str,
        username: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let link = format!("{}/api/auth/confirmed_email/{}", self.base_url, token);
        let html = render_confirmation(username, &link)?;

        let response = HTTP_CLIENT
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": to,
                "subject": CONFIRMATION_SUBJECT,
                "html": html,
            }))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("mail API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "mail API returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

fn render_confirmation(username: &str, link: &str) -> Result<String, AppError> {
    let mut context = Context::new();
    context.insert("username", username);
    context.insert("link", link);
    Tera::one_off(CONFIRMATION_TEMPLATE, &context, true)
        .map_err(|e| AppError::Internal(format!("mail template error: {e}")))
}

/// Fire-and-forget send; the request path never waits on the mail API and a
/// failure only shows up in the logs.
pub fn spawn_confirmation(mailer: Arc<Mailer>, to: String, username: String, token: String) {
    tokio::spawn(async move {
        match mailer.send_confirmation(&to, &username, &token).await {
            Ok(()) => info!(to = %to, "confirmation email sent"),
            Err(e) => error!(error = %e, to = %to, "failed to send confirmation email"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_template_renders_name_and_link() {
        let html = render_confirmation("ali", "http://localhost:8000/api/auth/confirmed_email/tok")
            .unwrap();
        assert!(html.contains("Hi ali,"));
        assert!(html.contains(r#"href="http://localhost:8000/api/auth/confirmed_email/tok""#));
    }

    #[test]
    fn template_escapes_html_in_usernames() {
        let html = render_confirmation("<script>", "http://x").unwrap();
        assert!(!html.contains("<script>"));
    }
}
