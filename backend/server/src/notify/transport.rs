use std::{fs, path::Path};

use async_trait::async_trait;
use records::Notification;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub transport: &'static str,
}

#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<Sent, TransportError>;
}

/// Notification endpoint as resolved from the deployment outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// The document could not be read or parsed.
    Unreadable(String),
    /// The document parsed but holds no `custom.functionUrl`.
    Missing,
    Url(String),
}

impl Endpoint {
    pub fn from_outputs_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_outputs(&text),
            Err(e) => Endpoint::Unreadable(format!("{}: {e}", path.display())),
        }
    }

    pub fn from_outputs(text: &str) -> Self {
        // Only an unparseable document is unreadable. A readable one with a
        // wrongly typed or absent `custom.functionUrl` has no endpoint.
        match serde_json::from_str::<Value>(text) {
            Ok(outputs) => outputs
                .pointer("/custom/functionUrl")
                .and_then(Value::as_str)
                .filter(|url| !url.trim().is_empty())
                .map_or(Endpoint::Missing, |url| Endpoint::Url(url.to_string())),
            Err(e) => Endpoint::Unreadable(e.to_string()),
        }
    }
}

/// Relays the JSON payload to the notification endpoint with a single POST.
pub struct HttpRelay {
    endpoint: Endpoint,
    client: Client,
}

impl HttpRelay {
    pub fn new(endpoint: Endpoint, client: Client) -> Self {
        Self { endpoint, client }
    }
}

#[async_trait]
impl Transport for HttpRelay {
    fn name(&self) -> &'static str {
        "http-relay"
    }

    async fn send(&self, notification: &Notification) -> Result<Sent, TransportError> {
        let url = match &self.endpoint {
            Endpoint::Url(url) => url,
            Endpoint::Unreadable(reason) => {
                return Err(TransportError::Unavailable(format!(
                    "deployment outputs unreadable: {reason}"
                )));
            }
            Endpoint::Missing => {
                return Err(TransportError::Failed(
                    "functionUrl missing from deployment outputs".to_string(),
                ));
            }
        };

        info!("Sending notification to {url}");

        let response = self
            .client
            .post(url)
            .json(notification)
            .send()
            .await
            .map_err(|e| TransportError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Failed(format!(
                "endpoint responded with {status}"
            )));
        }

        Ok(Sent {
            transport: self.name(),
        })
    }
}

/// Writes the payload to the log. Never fails.
pub struct LogOnly;

#[async_trait]
impl Transport for LogOnly {
    fn name(&self) -> &'static str {
        "log-only"
    }

    async fn send(&self, notification: &Notification) -> Result<Sent, TransportError> {
        info!(
            kind = notification.kind(),
            payload = %serde_json::to_string(notification).unwrap_or_default(),
            "Notification logged"
        );

        Ok(Sent {
            transport: self.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_resolution() {
        assert_eq!(
            Endpoint::from_outputs(r#"{"custom":{"functionUrl":"https://fn.example.com/"}}"#),
            Endpoint::Url("https://fn.example.com/".to_string())
        );
        assert_eq!(
            Endpoint::from_outputs(r#"{"custom":{"sesRegion":"ap-northeast-1"}}"#),
            Endpoint::Missing
        );
        assert_eq!(
            Endpoint::from_outputs(r#"{"custom":{"functionUrl":"  "}}"#),
            Endpoint::Missing
        );
        assert_eq!(Endpoint::from_outputs("{}"), Endpoint::Missing);
        assert_eq!(Endpoint::from_outputs("[]"), Endpoint::Missing);
        assert_eq!(Endpoint::from_outputs(r#"{"custom":5}"#), Endpoint::Missing);
        assert_eq!(
            Endpoint::from_outputs(r#"{"custom":{"functionUrl":1}}"#),
            Endpoint::Missing
        );
        assert!(matches!(
            Endpoint::from_outputs("{ not json"),
            Endpoint::Unreadable(_)
        ));
    }

    #[test]
    fn test_missing_outputs_file() {
        let endpoint = Endpoint::from_outputs_file(Path::new("/nonexistent/deploy_outputs.json"));

        assert!(matches!(endpoint, Endpoint::Unreadable(reason) if reason.contains("/nonexistent")));
    }
}
