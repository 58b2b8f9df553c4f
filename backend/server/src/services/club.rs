use records::{
    ApplicationNotice, ApplicationStatus, Club, ClubApplication, Event, WikiPage,
    validation::{validate_email, validate_required},
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::{Context, Participant, user::profile_of};
use crate::{database::Filter, error::StoreError, utils::newest_first};

/// One past event of a club, for its activity history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub date: String,
    pub title: String,
    pub location: Option<String>,
}

pub struct ClubService {
    ctx: Context,
}

impl ClubService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Active clubs only.
    pub async fn clubs(&self) -> Vec<Club> {
        self.ctx
            .store
            .all::<Club>()
            .await
            .map(|clubs| clubs.into_iter().filter(Club::is_active).collect())
            .map_err(|e| error!("Failed to list clubs: {e}"))
            .unwrap_or_default()
    }

    pub async fn club(&self, club_id: &str) -> Option<Club> {
        self.ctx
            .store
            .fetch::<Club>(club_id)
            .await
            .map_err(|e| error!(club_id, "Failed to get club: {e}"))
            .ok()
            .flatten()
    }

    pub async fn create_club(&self, club: Club) -> Option<Club> {
        if !validate_required(&club.name) {
            warn!("Rejected club without a name");
            return None;
        }

        if let Some(email) = club.representative_email.as_deref() {
            if !validate_email(email) {
                warn!(email, "Rejected club with invalid representative email");
                return None;
            }
        }

        let club = Club {
            id: Some(self.ctx.ids.club_id().await),
            ..club
        };

        self.ctx
            .store
            .insert(&club)
            .await
            .map_err(|e| error!(name = %club.name, "Failed to create club: {e}"))
            .ok()
    }

    pub async fn wiki_page(&self, club_id: &str) -> Option<WikiPage> {
        self.ctx
            .store
            .first::<WikiPage>(&Filter::new().eq("clubId", club_id))
            .await
            .map_err(|e| error!(club_id, "Failed to get wiki page: {e}"))
            .ok()
            .flatten()
    }

    /// Updates a saved page, or creates it under a fresh `WKI-` id.
    pub async fn save_wiki_page(&self, page: WikiPage) -> bool {
        let saved = match page.id {
            Some(_) => self.ctx.store.replace(&page).await,
            None => {
                let page = WikiPage {
                    id: Some(self.ctx.ids.wiki_id().await),
                    ..page
                };
                self.ctx.store.insert(&page).await
            }
        };

        saved
            .map_err(|e| error!("Failed to save wiki page: {e}"))
            .is_ok()
    }

    /// Files a pending application, then notifies the club representative.
    pub async fn apply(&self, club_id: &str, user_id: &str) -> bool {
        let application = ClubApplication {
            id: None,
            club_id: club_id.to_string(),
            applicant_user_id: user_id.to_string(),
            status: Some(ApplicationStatus::Pending),
        };

        if let Err(e) = self.ctx.store.insert(&application).await {
            error!(club_id, user_id, "Failed to apply to club: {e}");
            return false;
        }

        self.notify(club_id, user_id, false).await;
        true
    }

    /// Withdraws the user's application, then notifies the club representative.
    /// `false` when there was nothing to withdraw.
    pub async fn cancel_application(&self, club_id: &str, user_id: &str) -> bool {
        let withdrawn = async {
            let Some(application) = self.application(club_id, user_id).await? else {
                return Ok(false);
            };
            let id = application.id.ok_or(StoreError::MissingId {
                table: "ClubApplication",
            })?;

            self.ctx.store.remove::<ClubApplication>(&id).await?;
            Ok::<_, StoreError>(true)
        };

        match withdrawn.await {
            Ok(true) => {
                self.notify(club_id, user_id, true).await;
                true
            }
            Ok(false) => false,
            Err(e) => {
                error!(club_id, user_id, "Failed to cancel application: {e}");
                false
            }
        }
    }

    pub async fn set_application_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
    ) -> bool {
        let updated = async {
            let application = self
                .ctx
                .store
                .fetch::<ClubApplication>(application_id)
                .await?
                .ok_or_else(|| StoreError::NotFound {
                    table: "ClubApplication".to_string(),
                    id: application_id.to_string(),
                })?;

            self.ctx
                .store
                .replace(&ClubApplication {
                    status: Some(status),
                    ..application
                })
                .await
        };

        updated
            .await
            .map_err(|e| error!(application_id, "Failed to set application status: {e}"))
            .is_ok()
    }

    /// `None` when the user never applied. A missing status reads as pending.
    pub async fn application_status(
        &self,
        club_id: &str,
        user_id: &str,
    ) -> Option<ApplicationStatus> {
        self.application(club_id, user_id)
            .await
            .map_err(|e| error!(club_id, user_id, "Failed to get application status: {e}"))
            .ok()
            .flatten()
            .map(|application| application.status.unwrap_or_default())
    }

    /// Profiles of approved applicants. Applicants without a profile are skipped.
    pub async fn approved_participants(&self, club_id: &str) -> Vec<Participant> {
        let participants = async {
            let filter = Filter::new()
                .eq("clubId", club_id)
                .eq("status", ApplicationStatus::Approved.as_str());
            let applications = self.ctx.store.find::<ClubApplication>(&filter).await?;

            let mut participants = Vec::new();
            for application in applications {
                if let Some(profile) =
                    profile_of(self.ctx.store.as_ref(), &application.applicant_user_id).await?
                {
                    participants.push(Participant::from(profile));
                }
            }

            Ok::<_, StoreError>(participants)
        };

        participants
            .await
            .map_err(|e| error!(club_id, "Failed to list approved participants: {e}"))
            .unwrap_or_default()
    }

    /// Events organized by the club, newest first.
    pub async fn activity_records(&self, club_name: &str) -> Vec<ActivityRecord> {
        let filter = Filter::new().eq("organizerClub", club_name);

        let mut events = match self.ctx.store.find::<Event>(&filter).await {
            Ok(events) => events,
            Err(e) => {
                error!(club_name, "Failed to list club activity: {e}");
                return Vec::new();
            }
        };

        events.retain(|event| !event.date.is_empty());
        events.sort_by(|a, b| newest_first(&a.date, &b.date));

        events
            .into_iter()
            .map(|event| ActivityRecord {
                date: event.date,
                title: event.title,
                location: event.location,
            })
            .collect()
    }

    async fn application(
        &self,
        club_id: &str,
        user_id: &str,
    ) -> Result<Option<ClubApplication>, StoreError> {
        let filter = Filter::new()
            .eq("clubId", club_id)
            .eq("applicantUserId", user_id);

        self.ctx.store.first(&filter).await
    }

    async fn notify(&self, club_id: &str, user_id: &str, cancel: bool) {
        let notice = match self.notice(club_id, user_id).await {
            Ok(Some(notice)) => notice,
            Ok(None) => {
                info!(club_id, user_id, "No representative or profile, skipping notification");
                return;
            }
            Err(e) => {
                error!(club_id, user_id, "Failed to prepare application notification: {e}");
                return;
            }
        };

        if cancel {
            self.ctx.dispatcher.send_cancellation(notice).await;
        } else {
            self.ctx.dispatcher.send_application(notice).await;
        }
    }

    async fn notice(
        &self,
        club_id: &str,
        user_id: &str,
    ) -> Result<Option<ApplicationNotice>, StoreError> {
        let Some(club) = self.ctx.store.fetch::<Club>(club_id).await? else {
            return Ok(None);
        };
        let Some(representative_email) = club.representative_email.filter(|e| !e.is_empty())
        else {
            return Ok(None);
        };
        let Some(profile) = profile_of(self.ctx.store.as_ref(), user_id).await? else {
            return Ok(None);
        };

        Ok(Some(ApplicationNotice {
            representative_email,
            applicant_name: profile.name,
            applicant_department: profile.department.unwrap_or_default(),
            applicant_section: profile.section.unwrap_or_default(),
            club_name: club.name,
        }))
    }
}
