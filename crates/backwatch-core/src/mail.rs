//! Notification sink: the `MailClient` trait and its SMTP implementation
//!
//! The scheduling engine only ever talks to the trait; swapping the SMTP
//! transport for a recording mock in tests changes nothing upstream.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, info};

use crate::config::MailConfig;
use crate::error::{Error, Result};
use crate::models::User;

/// Capability to resolve a user's email address and deliver a message.
pub trait MailClient {
    /// The address mail for this user goes to.
    fn address(&self, user: &User) -> Result<String>;

    /// Deliver a fully rendered message. Failures propagate to the
    /// caller; the engine performs no retries.
    fn send(&self, user: &User, subject: &str, body: &str) -> Result<()>;
}

/// Delivers mail through an SMTP relay using lettre.
pub struct SmtpMailClient {
    transport: SmtpTransport,
    sender: Mailbox,
    address_template: String,
}

impl SmtpMailClient {
    /// Build a client from the mail configuration.
    ///
    /// The relay connection itself is opened lazily on the first send;
    /// construction only validates the configuration.
    pub fn new(config: &MailConfig) -> Result<Self> {
        if !config.address_template.contains("{username}") {
            return Err(Error::Config(
                "mail address template is missing the {username} placeholder".to_string(),
            ));
        }
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|e| Error::Config(format!("invalid sender address '{}': {e}", config.sender)))?;

        let mut builder = SmtpTransport::relay(&config.smtp_host)
            .map_err(|e| Error::Mail(format!("SMTP relay setup failed: {e}")))?;
        if let Some(port) = config.smtp_port {
            builder = builder.port(port);
        }
        if let Some(user) = &config.smtp_user {
            if let Some(password) = config.resolve_password() {
                builder = builder.credentials(Credentials::new(user.clone(), password));
            }
        }

        debug!("SMTP transport configured for relay '{}'", config.smtp_host);
        Ok(Self {
            transport: builder.build(),
            sender,
            address_template: config.address_template.clone(),
        })
    }
}

impl MailClient for SmtpMailClient {
    fn address(&self, user: &User) -> Result<String> {
        Ok(self.address_template.replace("{username}", &user.username))
    }

    fn send(&self, user: &User, subject: &str, body: &str) -> Result<()> {
        let address = self.address(user)?;
        let to: Mailbox = address
            .parse()
            .map_err(|e| Error::Mail(format!("invalid recipient address '{address}': {e}")))?;
        let message = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| Error::Mail(format!("failed to build message: {e}")))?;
        self.transport
            .send(&message)
            .map_err(|e| Error::Mail(format!("SMTP delivery to '{address}' failed: {e}")))?;
        info!("delivered mail to '{address}'");
        Ok(())
    }
}
