//! # Services
//!
//! Thin façades over the record store, one per area of the app.
//!
//! Every failure is logged here and turned into a sentinel: `false`, `None`,
//! an empty list. Callers only ever learn that an action failed, not why.
//!
//! Creating a club, event, participant, profile, tag or wiki page draws its
//! id from the [`IdGenerator`]. Applying to a club, cancelling an
//! application, joining or leaving an event also notifies the
//! representative. Those notifications are best effort and do not change the
//! result of the action.
use std::sync::Arc;

use records::UserProfile;
use serde::Serialize;

pub mod club;
pub mod event;
pub mod tag;
pub mod user;

pub use club::{ActivityRecord, ClubService};
pub use event::EventService;
pub use tag::{SeedOutcome, TagCategory, TagService};
pub use user::UserService;

use crate::{database::RecordStore, ids::IdGenerator, notify::Dispatcher};

#[derive(Clone)]
pub struct Context {
    pub store: Arc<dyn RecordStore>,
    pub ids: Arc<IdGenerator>,
    pub dispatcher: Arc<Dispatcher>,
}

/// Public view of a member, shown on participant lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub department: String,
    pub section: String,
    pub hobby_tags: Vec<String>,
}

impl From<UserProfile> for Participant {
    fn from(profile: UserProfile) -> Self {
        fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| placeholder.to_string())
        }

        Self {
            name: or_placeholder(Some(profile.name), "名前未設定"),
            department: or_placeholder(profile.department, "部門未設定"),
            section: or_placeholder(profile.section, "課未設定"),
            hobby_tags: profile.hobby_tags,
        }
    }
}
