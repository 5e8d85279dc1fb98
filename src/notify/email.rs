//! SMTP email channel

use lettre::message::{Mailbox, Message, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use super::NotifyError;
use crate::config::SmtpConfig;

/// Sends HTML alert emails over STARTTLS
pub struct EmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailSender {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        let from = config.from.parse()?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Send an HTML email to one recipient
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| NotifyError::Email(format!("invalid recipient {to:?}: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .singlepart(SinglePart::html(html.to_string()))
            .map_err(|e| NotifyError::Email(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Email(e.to_string()))?;

        tracing::debug!(subject, "alert email sent");
        Ok(())
    }
}
