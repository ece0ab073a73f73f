mod smtp;
mod template;

pub use smtp::SmtpMailer;
pub use template::{render_change_email, RenderedEmail};

use serde::{Deserialize, Serialize};

/// A change in the green-priced set of one watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub list_name: String,
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub current: Vec<String>,
    pub recipient: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[async_trait::async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &ChangeNotification) -> Result<(), MailError>;
}
