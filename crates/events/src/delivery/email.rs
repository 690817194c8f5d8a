//! Digest email delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send
//! plain-text update digests. Configuration is loaded from environment
//! variables; if `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns
//! `None` and digests are not sent.

use folio_core::updates::{UpdateGroup, UpdateType};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_FROM_ADDRESS: &str = "noreply@folio.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default               |
    /// |-----------------|----------|-----------------------|
    /// | `SMTP_HOST`     | yes      |                       |
    /// | `SMTP_PORT`     | no       | `587`                 |
    /// | `SMTP_FROM`     | no       | `noreply@folio.local` |
    /// | `SMTP_USER`     | no       |                       |
    /// | `SMTP_PASSWORD` | no       |                       |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Digest text
// ---------------------------------------------------------------------------

fn describe(update_type: UpdateType) -> &'static str {
    match update_type {
        UpdateType::TopLevelComment => "New comment",
        UpdateType::Reply => "New reply",
        UpdateType::ChangeLog => "Relationship change",
        UpdateType::PageEdit => "Page edited",
        UpdateType::CommentEdit => "Comment edited",
        UpdateType::UndeletePage => "Page restored",
        UpdateType::NewPageByUser => "New page",
        UpdateType::AtMention => "You were mentioned",
        UpdateType::NewMark => "New reader mark",
        UpdateType::ResolvedMark => "Mark resolved",
        UpdateType::AnsweredMark => "Mark answered",
    }
}

/// Plain-text body listing each group and its entries.
pub fn digest_body(site_address: &str, groups: &[UpdateGroup]) -> String {
    let mut body = String::from("Here is what happened since your last digest:\n");
    for group in groups {
        let heading = if group.key.group_by_page_id.is_empty() {
            format!("{site_address}/u/{}", group.key.group_by_user_id)
        } else {
            format!("{site_address}/p/{}", group.key.group_by_page_id)
        };
        body.push_str(&format!("\n{heading}\n"));
        for entry in &group.updates {
            let mut line = format!("  - {}", describe(entry.update_type));
            if entry.repeated > 1 {
                line.push_str(&format!(" ({} times)", entry.repeated));
            }
            if !entry.go_to_page_id.is_empty() {
                line.push_str(&format!(": {site_address}/p/{}", entry.go_to_page_id));
            }
            body.push_str(&line);
            body.push('\n');
        }
    }
    body
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send one digest email.
    pub async fn send_digest(
        &self,
        to_email: &str,
        update_count: usize,
        body: String,
    ) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let subject = format!("[Folio] {update_count} new updates");
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(to = to_email, update_count, "Digest email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
