use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::common::{AspectRatio, ImageSize, ModelVariant};
use crate::models::image::EncodedImage;

/// Maximum number of entries kept in the gallery.
pub const HISTORY_CAP: usize = 80;

/// A single generated image in the gallery. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "url")]
    pub image_url: EncodedImage,
    #[serde(rename = "prompt")]
    pub prompt_text: String,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub model: ModelVariant,
    pub aspect_ratio: AspectRatio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
}

/// Newest-first gallery, capped at [`HISTORY_CAP`]. Serialized as a plain array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored entries, enforcing the cap.
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.truncate(HISTORY_CAP);
        Self { entries }
    }

    /// Prepend a batch, keeping its order, then evict past the cap.
    pub fn append(&self, batch: Vec<HistoryEntry>) -> History {
        let mut entries = batch;
        let keep = HISTORY_CAP.saturating_sub(entries.len());
        entries.extend(self.entries.iter().take(keep).cloned());
        entries.truncate(HISTORY_CAP);
        History { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
