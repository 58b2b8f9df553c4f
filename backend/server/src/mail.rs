use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::error::MailError;

/// One plain-text UTF-8 email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Writes emails to the log instead of sending them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if email.to.is_empty() {
            return Err(MailError::NoRecipient);
        }

        info!(
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            "Email logged:\n{}",
            email.text
        );

        Ok(())
    }
}

/// Posts emails as JSON to a mail API with a bearer key.
pub struct HttpMailer {
    client: Client,
    url: String,
    key: String,
}

impl HttpMailer {
    pub fn new(client: Client, url: String, key: String) -> Self {
        Self { client, url, key }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if email.to.is_empty() {
            return Err(MailError::NoRecipient);
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.key)
            .json(email)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::Rejected(response.status().as_u16()));
        }

        info!(to = ?email.to, "Email sent");
        Ok(())
    }
}
