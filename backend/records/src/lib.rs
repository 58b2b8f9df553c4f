//! # Records
//!
//! Shared data model for the club/event membership backend.
//!
//! Both the server and the seed tool read and write these shapes, so they live
//! in their own crate the same way the schema would in a managed data store.
//!
//! ## Tables
//!
//! Every record type implements [`Entity`], which names the table it is stored
//! in. Records travel as camelCase JSON objects; the store adds `createdAt` and
//! `updatedAt` on its own.
//!
//! | Table | Id format |
//! |---|---|
//! | `Club` | `CLB-0001` |
//! | `WikiPage` | `WKI-000001` |
//! | `ClubApplication` | uuid |
//! | `Event` | `EVT-20250615-0001` |
//! | `EventParticipant` | `PRT-00000001` |
//! | `UserProfile` | `USR-202506-0001` |
//! | `TagMaster` | `TAG-IT-001` |
//! | `Counter` | uuid |
//!
//! ## Notifications
//!
//! [`Notification`] is never stored. It is the payload relayed to the
//! notification endpoint, see [`notification`].
use serde::{Serialize, de::DeserializeOwned};

pub mod entities;
pub mod notification;
pub mod validation;

pub use entities::{
    ApplicationStatus, Club, ClubApplication, Counter, Event, EventParticipant, SeedMarker,
    TagMaster, UserProfile, WikiPage,
};
pub use notification::{ApplicationNotice, EventNotice, Notification};

/// A record type stored in its own table.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const TABLE: &'static str;

    fn id(&self) -> Option<&str>;
}
