//! # Credential Emails
//!
//! Best effort: a failed or skipped send is reported back as `emailSent: false`
//! and never undoes the account write that triggered it.
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use models::Role;
use thiserror::Error;
use tracing::{info, warn};

use crate::{config::MailConfig, state::AppState};

pub const CREDENTIALS_SUBJECT: &str = "Your Meter Management System Login Credentials";

#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("invalid message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html)?;

        self.transport.send(message).await?;

        Ok(())
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn credentials_email(
    to: &str,
    username: &str,
    password: &str,
    role: Role,
    frontend_url: &str,
) -> OutgoingMail {
    let title = role.title();
    let username = escape(username);
    let password = escape(password);
    let login_url = format!("{}/login", frontend_url.trim_end_matches('/'));

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1>Welcome to Meter Management System</h1>
    <p>Your {title} account has been created!</p>
    <p>An administrator has created a {title} account for you in the Meter Management System.</p>
    <p><strong>Username:</strong> <code>{username}</code></p>
    <p><strong>Temporary Password:</strong> <code>{password}</code></p>
    <p><strong>Role:</strong> {title}</p>
    <ul>
        <li>Please change your password after first login</li>
        <li>Do not share your credentials with anyone</li>
        <li>Keep this email in a secure location</li>
    </ul>
    <p><a href="{login_url}">Login Now</a></p>
    <p style="font-size: 12px; color: #666;">This is an automated email from Meter Management System. Please do not reply to this email.</p>
</body>
</html>"#
    );

    OutgoingMail {
        to: to.to_string(),
        subject: CREDENTIALS_SUBJECT.to_string(),
        html,
    }
}

/// Sends login details when both an address and a transport exist.
/// Returns whether the mail went out.
pub async fn send_credentials(
    state: &AppState,
    email: Option<String>,
    username: &str,
    password: &str,
    role: Role,
) -> bool {
    let Some(email) = email else {
        return false;
    };

    let Some(mailer) = &state.mailer else {
        warn!(%username, "Email not sent, service not configured");
        return false;
    };

    let mail = credentials_email(&email, username, password, role, &state.config.frontend_url);

    match mailer.send(mail).await {
        Ok(()) => {
            info!(%username, "Credentials email sent");
            true
        }
        Err(e) => {
            warn!(%username, error = %e, "Credentials email failed");
            false
        }
    }
}
