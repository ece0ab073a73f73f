use crate::config::Settings;
use crate::mail::template::render_change_email;
use crate::mail::{ChangeNotification, MailError, NotificationSender};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

const DEFAULT_SMTP_PORT: u16 = 587;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let host = settings.require_smtp_host()?;
        let sender = settings.require_smtp_sender()?;
        let port = settings.smtp_port.unwrap_or(DEFAULT_SMTP_PORT);
        let password = settings.smtp_password.clone().unwrap_or_default();

        Ok(Self::new(host, port, sender, &password)?)
    }

    pub fn new(host: &str, port: u16, username: &str, password: &str) -> Result<Self, MailError> {
        let from: Mailbox = username
            .parse()
            .map_err(|e| MailError::Config(format!("invalid sender address {username}: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError::Smtp(format!("SMTP transport error: {e}")))?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait::async_trait]
impl NotificationSender for SmtpMailer {
    async fn send(&self, notification: &ChangeNotification) -> Result<(), MailError> {
        let to: Mailbox = notification
            .recipient
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {e}", notification.recipient)))?;

        let rendered = render_change_email(notification);
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(rendered.body)
            .map_err(|e| MailError::Smtp(format!("failed to build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Smtp(format!("failed to send email: {e}")))?;

        tracing::info!(list_name = %notification.list_name, "change notification sent");
        Ok(())
    }
}
