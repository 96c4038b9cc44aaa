use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;

use crate::config::Config;

#[derive(thiserror::Error, Debug)]
pub enum MailError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Transport(String),
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html_body: String,
}

/// Delivers mail through an SMTP relay
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<Credentials>,
        from: &str,
    ) -> Result<Self, MailError> {
        let mut builder = SmtpTransport::relay(host)
            .map_err(|e| MailError::Transport(format!("SMTP relay error: {}", e)))?
            .port(port);

        if let Some(credentials) = credentials {
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
            from: parse_mailbox(from)?,
        })
    }

    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML);

        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        let message = builder
            .body(email.html_body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        let transport = self.transport.clone();

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailError::Transport(format!("Email task failed: {}", e)))?
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Most recent messages kept by the console mailer
pub const CONSOLE_OUTBOX_CAPACITY: usize = 50;

/// Logs mail instead of sending it. The last few messages stay in a bounded
/// in-memory outbox.
#[derive(Clone, Default)]
pub struct ConsoleMailer {
    outbox: Arc<Mutex<VecDeque<OutgoingEmail>>>,
}

impl ConsoleMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent messages "sent", oldest first
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        parse_mailbox(&email.to)?;

        tracing::info!(
            to = %email.to,
            reply_to = ?email.reply_to,
            subject = %email.subject,
            body_len = email.html_body.len(),
            "Email (console mailer, not delivered)"
        );

        if let Ok(mut outbox) = self.outbox.lock() {
            if outbox.len() == CONSOLE_OUTBOX_CAPACITY {
                outbox.pop_front();
            }
            outbox.push_back(email);
        }

        Ok(())
    }
}

#[derive(Clone)]
pub enum Mailer {
    Smtp(SmtpMailer),
    Console(ConsoleMailer),
}

impl Mailer {
    /// SMTP when `smtp_host` is configured, console otherwise.
    pub fn from_config(config: &Config) -> Result<Self, MailError> {
        match &config.smtp_host {
            Some(host) => {
                let credentials = match (&config.smtp_username, &config.smtp_password) {
                    (Some(user), Some(password)) => Some(Credentials::new(
                        user.clone(),
                        password.expose_secret().clone(),
                    )),
                    _ => None,
                };

                tracing::info!(host = %host, port = config.smtp_port, "Using SMTP mailer");
                Ok(Mailer::Smtp(SmtpMailer::new(
                    host,
                    config.smtp_port,
                    credentials,
                    &config.mail_from,
                )?))
            }
            None => {
                tracing::warn!("SMTP_HOST not set, emails will only be logged");
                Ok(Mailer::Console(ConsoleMailer::new()))
            }
        }
    }

    #[tracing::instrument(skip(self, email), fields(to = %email.to, subject = %email.subject))]
    pub async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        match self {
            Mailer::Smtp(mailer) => mailer.send(email).await,
            Mailer::Console(mailer) => mailer.send(email).await,
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress(format!("{}: {}", address, e)))
}
