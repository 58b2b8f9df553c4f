//! # Notifications
//!
//! Best-effort email notifications for club applications and event
//! participation. Nothing here is retried, and a failed notification never
//! undoes the action that triggered it.
//!
//! ## Dispatch
//!
//! The [`Dispatcher`] walks an ordered list of [`Transport`]s:
//!
//! 1. [`HttpRelay`] posts the JSON payload to the notification endpoint named
//!    in the deployment outputs (`custom.functionUrl`)
//! 2. [`LogOnly`] writes the payload to the log
//!
//! A transport either delivers (done, `true`), is unavailable (try the next
//! one) or fails (stop, `false`). For the relay that works out as:
//!
//! | Deployment outputs | Result |
//! |---|---|
//! | unreadable | logged only, `true` |
//! | no `functionUrl` | payload logged, `false`, no request |
//! | endpoint answers 2xx | `true` |
//! | endpoint answers otherwise, or the request errors | `false` |
//!
//! ## Rendering
//!
//! [`render`] turns a notification into a subject and a plain-text body. The
//! relay endpoint does this on the receiving side, see `routes::notify_handler`.
use records::{ApplicationNotice, EventNotice, Notification};
use reqwest::Client;
use tracing::{error, info, warn};

pub mod render;
pub mod transport;

pub use render::{Message, render};
pub use transport::{Endpoint, HttpRelay, LogOnly, Sent, Transport};

use crate::error::TransportError;

pub struct Dispatcher {
    transports: Vec<Box<dyn Transport>>,
}

impl Dispatcher {
    pub fn new(transports: Vec<Box<dyn Transport>>) -> Self {
        Self { transports }
    }

    /// The standard chain: relay to `endpoint`, falling back to the log.
    pub fn relay(endpoint: Endpoint, client: Client) -> Self {
        Self::new(vec![
            Box::new(HttpRelay::new(endpoint, client)),
            Box::new(LogOnly),
        ])
    }

    pub async fn dispatch(&self, notification: &Notification) -> bool {
        for transport in &self.transports {
            match transport.send(notification).await {
                Ok(sent) => {
                    info!(
                        transport = sent.transport,
                        kind = notification.kind(),
                        "Notification handled"
                    );
                    return true;
                }
                Err(TransportError::Unavailable(reason)) => {
                    warn!(transport = transport.name(), "{reason}, trying next transport");
                }
                Err(e @ TransportError::Failed(_)) => {
                    error!(transport = transport.name(), "Notification not sent: {e}");
                    log_payload(notification);
                    return false;
                }
            }
        }

        error!("No transport accepted the notification");
        log_payload(notification);
        false
    }

    pub async fn send_application(&self, notice: ApplicationNotice) -> bool {
        self.dispatch(&Notification::Application(notice)).await
    }

    pub async fn send_cancellation(&self, notice: ApplicationNotice) -> bool {
        self.dispatch(&Notification::Cancellation(notice)).await
    }

    pub async fn send_event(&self, notice: EventNotice, is_joining: bool) -> bool {
        let notification = if is_joining {
            Notification::EventJoin(notice)
        } else {
            Notification::EventLeave(notice)
        };

        self.dispatch(&notification).await
    }
}

/// Keeps undelivered payloads recoverable from the log.
fn log_payload(notification: &Notification) {
    info!(
        payload = %serde_json::to_string(notification).unwrap_or_default(),
        "Undelivered notification"
    );
}
