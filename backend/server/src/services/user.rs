use records::UserProfile;
use tracing::error;

use super::Context;
use crate::{
    database::{Filter, RecordStore},
    error::StoreError,
};

/// Profile for a login user id, not a profile id.
pub(crate) async fn profile_of(
    store: &dyn RecordStore,
    user_id: &str,
) -> Result<Option<UserProfile>, StoreError> {
    store.first::<UserProfile>(&Filter::new().eq("userId", user_id)).await
}

pub struct UserService {
    ctx: Context,
}

impl UserService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub async fn profile(&self, user_id: &str) -> Option<UserProfile> {
        profile_of(self.ctx.store.as_ref(), user_id)
            .await
            .map_err(|e| error!(user_id, "Failed to get user profile: {e}"))
            .ok()
            .flatten()
    }

    /// Stores a new profile under a fresh `USR-` id.
    pub async fn create_profile(&self, profile: UserProfile) -> Option<UserProfile> {
        let profile = UserProfile {
            id: Some(self.ctx.ids.user_profile_id().await),
            ..profile
        };

        self.ctx
            .store
            .insert(&profile)
            .await
            .map_err(|e| error!(user_id = %profile.user_id, "Failed to create user profile: {e}"))
            .ok()
    }

    /// Updates a saved profile, or creates it when it has no id yet.
    pub async fn update_profile(&self, profile: UserProfile) -> bool {
        if profile.id.is_none() {
            return self.create_profile(profile).await.is_some();
        }

        self.ctx
            .store
            .replace(&profile)
            .await
            .map_err(|e| error!(user_id = %profile.user_id, "Failed to update user profile: {e}"))
            .is_ok()
    }
}
