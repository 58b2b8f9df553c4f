use records::{Event, EventNotice, EventParticipant, validation::validate_required};
use tracing::{error, info, warn};

use super::{Context, Participant, user::profile_of};
use crate::{database::Filter, error::StoreError};

pub struct EventService {
    ctx: Context,
}

impl EventService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub async fn events(&self) -> Vec<Event> {
        self.ctx
            .store
            .all::<Event>()
            .await
            .map_err(|e| error!("Failed to list events: {e}"))
            .unwrap_or_default()
    }

    pub async fn event(&self, event_id: &str) -> Option<Event> {
        self.ctx
            .store
            .fetch::<Event>(event_id)
            .await
            .map_err(|e| error!(event_id, "Failed to get event: {e}"))
            .ok()
            .flatten()
    }

    /// Stores the event under a fresh `EVT-` id for today.
    pub async fn create_event(&self, event: Event) -> Option<Event> {
        if !validate_required(&event.title) {
            warn!("Rejected event without a title");
            return None;
        }

        let event = Event {
            id: Some(self.ctx.ids.event_id().await),
            ..event
        };

        self.ctx
            .store
            .insert(&event)
            .await
            .map_err(|e| error!(title = %event.title, "Failed to create event: {e}"))
            .ok()
    }

    /// `false` for events that were never saved.
    pub async fn update_event(&self, event: Event) -> bool {
        if event.id.is_none() {
            return false;
        }

        self.ctx
            .store
            .replace(&event)
            .await
            .map_err(|e| error!(title = %event.title, "Failed to update event: {e}"))
            .is_ok()
    }

    pub async fn delete_event(&self, event_id: &str) -> bool {
        self.ctx
            .store
            .remove::<Event>(event_id)
            .await
            .map_err(|e| error!(event_id, "Failed to delete event: {e}"))
            .is_ok()
    }

    /// Registers the user under a fresh `PRT-` id, then notifies the representative.
    pub async fn join(&self, event_id: &str, user_id: &str) -> bool {
        let participant = EventParticipant {
            id: Some(self.ctx.ids.participant_id().await),
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
        };

        if let Err(e) = self.ctx.store.insert(&participant).await {
            error!(event_id, user_id, "Failed to join event: {e}");
            return false;
        }

        self.notify(event_id, user_id, true).await;
        true
    }

    /// `false` when the user had not joined.
    pub async fn leave(&self, event_id: &str, user_id: &str) -> bool {
        let left = async {
            let Some(participant) = self.participation(event_id, user_id).await? else {
                return Ok(false);
            };
            let id = participant.id.ok_or(StoreError::MissingId {
                table: "EventParticipant",
            })?;

            self.ctx.store.remove::<EventParticipant>(&id).await?;
            Ok::<_, StoreError>(true)
        };

        match left.await {
            Ok(true) => {
                self.notify(event_id, user_id, false).await;
                true
            }
            Ok(false) => false,
            Err(e) => {
                error!(event_id, user_id, "Failed to leave event: {e}");
                false
            }
        }
    }

    pub async fn participation_status(&self, event_id: &str, user_id: &str) -> bool {
        self.participation(event_id, user_id)
            .await
            .map_err(|e| error!(event_id, user_id, "Failed to get participation status: {e}"))
            .ok()
            .flatten()
            .is_some()
    }

    /// Profiles of everyone who joined. Users without a profile are skipped.
    pub async fn participants(&self, event_id: &str) -> Vec<Participant> {
        let participants = async {
            let joined = self
                .ctx
                .store
                .find::<EventParticipant>(&Filter::new().eq("eventId", event_id))
                .await?;

            let mut participants = Vec::new();
            for participant in joined {
                if let Some(profile) =
                    profile_of(self.ctx.store.as_ref(), &participant.user_id).await?
                {
                    participants.push(Participant::from(profile));
                }
            }

            Ok::<_, StoreError>(participants)
        };

        participants
            .await
            .map_err(|e| error!(event_id, "Failed to list event participants: {e}"))
            .unwrap_or_default()
    }

    /// Events the user joined. Deleted events are skipped.
    pub async fn user_events(&self, user_id: &str) -> Vec<Event> {
        let events = async {
            let joined = self
                .ctx
                .store
                .find::<EventParticipant>(&Filter::new().eq("userId", user_id))
                .await?;

            let mut events = Vec::new();
            for participant in joined {
                if let Some(event) = self.ctx.store.fetch::<Event>(&participant.event_id).await? {
                    events.push(event);
                }
            }

            Ok::<_, StoreError>(events)
        };

        events
            .await
            .map_err(|e| error!(user_id, "Failed to list user events: {e}"))
            .unwrap_or_default()
    }

    async fn participation(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventParticipant>, StoreError> {
        let filter = Filter::new().eq("eventId", event_id).eq("userId", user_id);

        self.ctx.store.first(&filter).await
    }

    async fn notify(&self, event_id: &str, user_id: &str, is_joining: bool) {
        match self.notice(event_id, user_id).await {
            Ok(Some(notice)) => {
                self.ctx.dispatcher.send_event(notice, is_joining).await;
            }
            Ok(None) => {
                info!(event_id, user_id, "No representative or profile, skipping notification");
            }
            Err(e) => {
                error!(event_id, user_id, "Failed to prepare event notification: {e}");
            }
        }
    }

    async fn notice(&self, event_id: &str, user_id: &str) -> Result<Option<EventNotice>, StoreError> {
        let Some(event) = self.ctx.store.fetch::<Event>(event_id).await? else {
            return Ok(None);
        };
        let Some(representative_email) = event.representative_email.filter(|e| !e.is_empty())
        else {
            return Ok(None);
        };
        let Some(profile) = profile_of(self.ctx.store.as_ref(), user_id).await? else {
            return Ok(None);
        };

        Ok(Some(EventNotice {
            representative_email,
            participant_name: profile.name,
            participant_department: profile.department.unwrap_or_default(),
            participant_section: profile.section.unwrap_or_default(),
            event_title: event.title,
            event_date: event.date,
        }))
    }
}
