//! Approval notice delivery through the Resend e-mail API.

use campus_core::notify::{ApprovalNotice, NotifyError, Notifier};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

/// Resend API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResendConfig {
    /// API key. Without one, every notice fails with `Disabled` and the
    /// temporary credential is handed back to the approving admin.
    pub api_key: Option<String>,
    /// Sender, e.g. `University Events <onboarding@resend.dev>`.
    pub from: String,
    pub subject: String,
    pub base_url: String,
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: "University Events <onboarding@resend.dev>".into(),
            subject: "Your University Event Management System Login".into(),
            base_url: "https://api.resend.com".into(),
        }
    }
}

/// A rendered approval e-mail.
#[derive(Debug)]
pub struct RenderedNotice {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Render the approval mail for `notice`.
pub fn render_notice(subject: &str, notice: &ApprovalNotice) -> RenderedNotice {
    let text_body = format!(
        "Hello {name},\n\n\
         Your account has been approved by an administrator. \
         You can now sign in with:\n\n\
         Email: {email}\n\
         Temporary password: {credential}\n\n\
         Please change your password after your first login.\n",
        name = notice.full_name,
        email = notice.email,
        credential = notice.temporary_credential,
    );

    let html_body = format!(
        "<h1>Welcome, {name}!</h1>\
         <p>Your account has been approved by an administrator. \
         You can now sign in with the credentials below.</p>\
         <p><strong>Email:</strong> {email}<br>\
         <strong>Temporary password:</strong> <code>{credential}</code></p>\
         <p>Please change your password after your first login.</p>",
        name = escape_html(&notice.full_name),
        email = escape_html(&notice.email),
        credential = escape_html(&notice.temporary_credential),
    );

    RenderedNotice {
        subject: subject.to_string(),
        text_body,
        html_body,
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Sends approval notices with `POST {base_url}/emails`.
#[derive(Clone)]
pub struct ResendNotifier {
    http_client: Client,
    config: ResendConfig,
}

impl ResendNotifier {
    pub fn new(config: ResendConfig) -> Result<Self, NotifyError> {
        let http_client = Client::builder()
            .user_agent(concat!("campus-workflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifyError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }
}

impl Notifier for ResendNotifier {
    async fn send_approval_notice(&self, notice: &ApprovalNotice) -> Result<(), NotifyError> {
        let api_key = self.config.api_key.as_deref().ok_or(NotifyError::Disabled)?;
        let rendered = render_notice(&self.config.subject, notice);

        let body = serde_json::json!({
            "from": self.config.from,
            "to": [notice.email],
            "subject": rendered.subject,
            "html": rendered.html_body,
            "text": rendered.text_body,
        });

        let response = self
            .http_client
            .post(format!(
                "{}/emails",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(format!("Resend request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            info!(to = %notice.email, "Approval notice accepted by Resend");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> ApprovalNotice {
        ApprovalNotice {
            email: "ada@campus.edu".into(),
            full_name: "Ada <Admin>".into(),
            temporary_credential: "Xy7#kPq2Rm4$".into(),
        }
    }

    #[test]
    fn rendered_notice_carries_login_details() {
        let rendered = render_notice("Login", &notice());
        assert_eq!(rendered.subject, "Login");
        assert!(rendered.text_body.contains("ada@campus.edu"));
        assert!(rendered.text_body.contains("Xy7#kPq2Rm4$"));
        assert!(rendered.text_body.contains("change your password"));
        assert!(rendered.html_body.contains("Xy7#kPq2Rm4$"));
    }

    #[test]
    fn html_body_escapes_names() {
        let rendered = render_notice("Login", &notice());
        assert!(rendered.html_body.contains("Ada &lt;Admin&gt;"));
        assert!(!rendered.html_body.contains("<Admin>"));
    }

    #[tokio::test]
    async fn missing_api_key_disables_delivery() {
        let notifier = ResendNotifier::new(ResendConfig::default()).unwrap();
        assert!(!notifier.is_enabled());
        let err = notifier.send_approval_notice(&notice()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Disabled));
    }
}
