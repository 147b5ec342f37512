//! Outbound email collaborator.
//!
//! Services build an [`EmailMessage`] from a template and hand it to the
//! injected [`Mailer`]. Delivery failures are logged and never fail the
//! request that triggered them.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SmtpConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    Welcome,
    PasswordReset,
    CollectionShared,
}

impl EmailTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailTemplate::Welcome => "welcome",
            EmailTemplate::PasswordReset => "password_reset",
            EmailTemplate::CollectionShared => "collection_shared",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub template: EmailTemplate,
    pub subject: String,
    pub html: String,
    /// The primary link in the message, if any.
    pub link: Option<String>,
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"<p><a href="{href}" style="background-color: #0066cc; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px;">{label}</a></p>"#
    )
}

impl EmailMessage {
    pub fn welcome(to: &str, name: &str, login_link: &str) -> Self {
        Self {
            to: to.to_string(),
            template: EmailTemplate::Welcome,
            subject: "Welcome to Ocean Insight!".into(),
            html: format!(
                "<h2>Welcome to Ocean Insight, {name}!</h2>\
                 <p>Your account is ready. Explore ocean science resources, build collections and join events.</p>{}",
                button(login_link, "Get Started")
            ),
            link: Some(login_link.to_string()),
        }
    }

    pub fn password_reset(to: &str, reset_link: &str) -> Self {
        Self {
            to: to.to_string(),
            template: EmailTemplate::PasswordReset,
            subject: "Reset Your Ocean Insight Password".into(),
            html: format!(
                "<h2>Password Reset Request</h2>\
                 <p>We received a request to reset your password. Click the link below to reset it.</p>{}\
                 <p>This link will expire in 1 hour.</p>",
                button(reset_link, "Reset Password")
            ),
            link: Some(reset_link.to_string()),
        }
    }

    pub fn collection_shared(to: &str, shared_by: &str, collection: &str, view_link: &str) -> Self {
        Self {
            to: to.to_string(),
            template: EmailTemplate::CollectionShared,
            subject: format!("{shared_by} shared a collection with you"),
            html: format!(
                "<h2>{shared_by} shared a collection with you</h2>\
                 <p>You've been invited to view the collection <strong>{collection}</strong>.</p>{}",
                button(view_link, "View Collection")
            ),
            link: Some(view_link.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Logs outbound messages instead of delivering them.
pub struct TracingMailer {
    smtp: SmtpConfig,
}

impl TracingMailer {
    pub fn new(smtp: SmtpConfig) -> Self {
        Self { smtp }
    }
}

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            from = %self.smtp.from_email,
            smtp_host = %self.smtp.host,
            template = message.template.as_str(),
            subject = %message.subject,
            "email queued"
        );
        Ok(())
    }
}

/// Send and swallow failures.
pub async fn deliver(mailer: &dyn Mailer, message: EmailMessage) {
    let template = message.template.as_str();
    let to = message.to.clone();
    if let Err(e) = mailer.send(message).await {
        warn!(error = %e, %to, template, "email delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_embed_links() {
        let msg = EmailMessage::password_reset("a@x.com", "http://app/reset-password?token=abc");
        assert_eq!(msg.template, EmailTemplate::PasswordReset);
        assert!(msg.html.contains("http://app/reset-password?token=abc"));

        let msg = EmailMessage::collection_shared("b@x.com", "Ada", "Reefs", "http://app/collections/t");
        assert_eq!(msg.subject, "Ada shared a collection with you");
        assert!(msg.html.contains("Reefs"));
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _message: EmailMessage) -> Result<(), MailError> {
            Err(MailError::Delivery("smtp down".into()))
        }
    }

    #[tokio::test]
    async fn deliver_swallows_failures() {
        deliver(&FailingMailer, EmailMessage::welcome("a@x.com", "Ada", "http://app/login")).await;
    }
}
