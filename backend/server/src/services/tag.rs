use records::{
    SeedMarker, TagMaster,
    validation::{normalize_tag_name, validate_required},
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::Context;
use crate::{database::Filter, error::StoreError};

/// Sentinel id claimed by the first successful seed.
pub const SEED_MARKER_ID: &str = "tag-master";

pub const INITIAL_TAGS: [(&str, &str); 20] = [
    ("プログラミング", "event"),
    ("デザイン", "event"),
    ("ゲーム開発", "event"),
    ("AI・機械学習", "event"),
    ("Web開発", "event"),
    ("モバイルアプリ", "event"),
    ("データベース", "event"),
    ("セキュリティ", "event"),
    ("クラウド", "event"),
    ("ネットワーク", "event"),
    ("読書", "hobby"),
    ("映画鑑賞", "hobby"),
    ("音楽", "hobby"),
    ("料理", "hobby"),
    ("旅行", "hobby"),
    ("スポーツ", "hobby"),
    ("写真", "hobby"),
    ("アニメ", "hobby"),
    ("ゲーム", "hobby"),
    ("アート", "hobby"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCategory {
    pub name: String,
    pub tags: Vec<TagMaster>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded(usize),
    AlreadySeeded,
}

pub struct TagService {
    ctx: Context,
}

impl TagService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Active tags only.
    pub async fn tag_master(&self) -> Vec<TagMaster> {
        self.ctx
            .store
            .find::<TagMaster>(&Filter::new().eq("isActive", true))
            .await
            .map_err(|e| error!("Failed to list tags: {e}"))
            .unwrap_or_default()
    }

    /// Active tags grouped by category, categories in first-seen order.
    pub async fn tags_by_category(&self) -> Vec<TagCategory> {
        let mut categories: Vec<TagCategory> = Vec::new();

        for tag in self.tag_master().await {
            match categories.iter_mut().find(|c| c.name == tag.category) {
                Some(category) => category.tags.push(tag),
                None => categories.push(TagCategory {
                    name: tag.category.clone(),
                    tags: vec![tag],
                }),
            }
        }

        categories
    }

    pub async fn create_tag(&self, name: &str, category: &str) -> Option<TagMaster> {
        let name = normalize_tag_name(name);
        if !validate_required(&name) {
            warn!(category, "Rejected tag with an empty name");
            return None;
        }

        let tag = TagMaster {
            id: Some(self.ctx.ids.tag_id(category).await),
            name,
            category: category.to_string(),
            is_active: Some(true),
        };

        self.ctx
            .store
            .insert(&tag)
            .await
            .map_err(|e| error!(name = %tag.name, category, "Failed to create tag: {e}"))
            .ok()
    }

    /// Writes [`INITIAL_TAGS`] once. Claims the seed marker before the first
    /// tag, so a repeated or concurrent run writes nothing. A run that fails
    /// partway undoes its writes.
    pub async fn seed_tag_master(
        &self,
        mut on_tag: impl FnMut(&TagMaster),
    ) -> Result<SeedOutcome, StoreError> {
        let marker = SeedMarker {
            id: Some(SEED_MARKER_ID.to_string()),
        };

        match self.ctx.store.insert(&marker).await {
            Ok(_) => {}
            Err(StoreError::Conflict { .. }) => {
                info!("Tag master already seeded");
                return Ok(SeedOutcome::AlreadySeeded);
            }
            Err(e) => return Err(e),
        }

        let mut written = Vec::new();
        for (name, category) in INITIAL_TAGS {
            let tag = TagMaster {
                id: Some(self.ctx.ids.tag_id(category).await),
                name: name.to_string(),
                category: category.to_string(),
                is_active: Some(true),
            };

            match self.ctx.store.insert(&tag).await {
                Ok(tag) => {
                    on_tag(&tag);
                    written.extend(tag.id);
                }
                Err(e) => {
                    self.unwind_seed(&written).await;
                    return Err(e);
                }
            }
        }

        info!(count = INITIAL_TAGS.len(), "Seeded tag master");
        Ok(SeedOutcome::Seeded(INITIAL_TAGS.len()))
    }

    /// Removes the tags of a failed seed and releases the marker so the next
    /// run starts over.
    async fn unwind_seed(&self, written: &[String]) {
        for id in written {
            if let Err(e) = self.ctx.store.remove::<TagMaster>(id).await {
                error!(id, "Failed to remove partially seeded tag: {e}");
            }
        }

        if let Err(e) = self.ctx.store.remove::<SeedMarker>(SEED_MARKER_ID).await {
            error!("Failed to release tag master seed marker: {e}");
        }
    }
}
