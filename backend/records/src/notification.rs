//! # Notification payloads
//!
//! One variant per application event. On the wire each variant becomes the
//! notice's fields plus a `type` discriminator:
//!
//! | Variant | `type` | Extra |
//! |---|---|---|
//! | `Application` | `application` | |
//! | `Cancellation` | `cancel` | |
//! | `EventJoin` | `event` | `isJoining: true` |
//! | `EventLeave` | `event` | `isJoining: false` |
//!
//! Payloads without a `type` are club applications.
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationNotice {
    pub representative_email: String,
    pub applicant_name: String,
    pub applicant_department: String,
    pub applicant_section: String,
    pub club_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNotice {
    pub representative_email: String,
    pub participant_name: String,
    pub participant_department: String,
    pub participant_section: String,
    pub event_title: String,
    pub event_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WirePayload", from = "WirePayload")]
pub enum Notification {
    Application(ApplicationNotice),
    Cancellation(ApplicationNotice),
    EventJoin(EventNotice),
    EventLeave(EventNotice),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WirePayload {
    Application(ApplicationNotice),
    Cancel(ApplicationNotice),
    Event(EventPayload),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload {
    #[serde(flatten)]
    notice: EventNotice,
    is_joining: bool,
}

impl From<Notification> for WirePayload {
    fn from(notification: Notification) -> Self {
        match notification {
            Notification::Application(notice) => WirePayload::Application(notice),
            Notification::Cancellation(notice) => WirePayload::Cancel(notice),
            Notification::EventJoin(notice) => WirePayload::Event(EventPayload {
                notice,
                is_joining: true,
            }),
            Notification::EventLeave(notice) => WirePayload::Event(EventPayload {
                notice,
                is_joining: false,
            }),
        }
    }
}

impl From<WirePayload> for Notification {
    fn from(payload: WirePayload) -> Self {
        match payload {
            WirePayload::Application(notice) => Notification::Application(notice),
            WirePayload::Cancel(notice) => Notification::Cancellation(notice),
            WirePayload::Event(EventPayload {
                notice,
                is_joining: true,
            }) => Notification::EventJoin(notice),
            WirePayload::Event(EventPayload { notice, .. }) => Notification::EventLeave(notice),
        }
    }
}

impl Notification {
    /// Parses a relayed request body, treating a missing `type` as an application.
    pub fn from_relay_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_slice(body)?;

        if let Value::Object(map) = &mut value {
            map.entry("type")
                .or_insert_with(|| Value::from("application"));
        }

        serde_json::from_value(value)
    }

    pub fn representative_email(&self) -> &str {
        match self {
            Notification::Application(notice) | Notification::Cancellation(notice) => {
                &notice.representative_email
            }
            Notification::EventJoin(notice) | Notification::EventLeave(notice) => {
                &notice.representative_email
            }
        }
    }

    /// Value of the `type` discriminator on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Application(_) => "application",
            Notification::Cancellation(_) => "cancel",
            Notification::EventJoin(_) | Notification::EventLeave(_) => "event",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn application() -> ApplicationNotice {
        ApplicationNotice {
            representative_email: "rep@example.com".to_string(),
            applicant_name: "Sato".to_string(),
            applicant_department: "Dev".to_string(),
            applicant_section: "Platform".to_string(),
            club_name: "Go Club".to_string(),
        }
    }

    fn event() -> EventNotice {
        EventNotice {
            representative_email: "rep@example.com".to_string(),
            participant_name: "Suzuki".to_string(),
            participant_department: "Sales".to_string(),
            participant_section: "East".to_string(),
            event_title: "Hackathon".to_string(),
            event_date: "2025-06-15T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_application_wire_shape() {
        let value = serde_json::to_value(Notification::Application(application())).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "application",
                "representativeEmail": "rep@example.com",
                "applicantName": "Sato",
                "applicantDepartment": "Dev",
                "applicantSection": "Platform",
                "clubName": "Go Club"
            })
        );
    }

    #[test]
    fn test_event_leave_wire_shape() {
        let value = serde_json::to_value(Notification::EventLeave(event())).unwrap();

        assert_eq!(value["type"], "event");
        assert_eq!(value["isJoining"], false);
        assert_eq!(value["eventTitle"], "Hackathon");
        assert_eq!(value["eventDate"], "2025-06-15T10:00:00Z");
    }

    #[test]
    fn test_relay_body_defaults_to_application() {
        let body = json!({
            "representativeEmail": "rep@example.com",
            "applicantName": "Sato",
            "applicantDepartment": "Dev",
            "applicantSection": "Platform",
            "clubName": "Go Club"
        })
        .to_string();

        let notification = Notification::from_relay_body(body.as_bytes()).unwrap();
        assert_eq!(notification, Notification::Application(application()));
    }

    #[test]
    fn test_relay_body_event_join() {
        let mut body = serde_json::to_value(Notification::EventJoin(event())).unwrap();
        body["isJoining"] = json!(true);

        let notification = Notification::from_relay_body(body.to_string().as_bytes()).unwrap();
        assert_eq!(notification, Notification::EventJoin(event()));
        assert_eq!(notification.kind(), "event");
        assert_eq!(notification.representative_email(), "rep@example.com");
    }

    #[test]
    fn test_relay_body_rejects_missing_fields() {
        assert!(Notification::from_relay_body(br#"{"type":"cancel"}"#).is_err());
        assert!(Notification::from_relay_body(b"not json").is_err());
    }
}
