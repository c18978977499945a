// mailer/mod.rs - outgoing email
pub mod templates;

pub use templates::{user_welcome, Email};

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::config::SmtpConfig;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Something that can deliver an email to one recipient.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, email: Email) -> Result<(), MailerError>;
}

/// SMTP delivery. Connections are opened per message.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let sender: Mailbox = config.sender.parse()?;
        let tls = TlsParameters::new(config.host.clone())?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(Tls::Opportunistic(tls))
            .timeout(Some(SEND_TIMEOUT));
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipient: &str, email: Email) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient.parse()?)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(
                email.plain_body,
                email.html_body,
            ))?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Keeps messages in memory instead of sending them.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<(String, Email)>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, as `(recipient, email)` pairs.
    pub fn sent(&self) -> Vec<(String, Email)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, recipient: &str, email: Email) -> Result<(), MailerError> {
        let _: Mailbox = recipient.parse()?;
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipient.to_string(), email));
        }
        Ok(())
    }
}
