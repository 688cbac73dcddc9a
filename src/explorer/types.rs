use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Static metadata for one collection, resolved before the explorer mounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionProps {
    pub collection_id: String,
    pub title: String,
    pub description: String,
    pub formatted_date: String,
    #[serde(default)]
    pub initial_items: Vec<ImageDescriptor>,
    #[serde(default)]
    pub initial_total_count: usize,
}

/// One image of a loaded collection.
///
/// `key` is the host content identifier (or the URL when the host did not
/// send one) and is what selection and per-card state are keyed on. `ordinal`
/// is the 1-based arrival position and only drives display order and titles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub key: String,
    pub ordinal: usize,
    pub title: String,
    pub reference: String,
    pub public_id: Option<String>,
    pub date: Option<String>,
}

impl ImageDescriptor {
    pub fn new(
        collection_title: &str,
        ordinal: usize,
        reference: String,
        public_id: Option<String>,
        date: Option<String>,
    ) -> Self {
        let key = public_id.clone().unwrap_or_else(|| reference.clone());
        Self {
            key,
            ordinal,
            title: descriptor_title(collection_title, ordinal),
            reference,
            public_id,
            date,
        }
    }

    /// Reference used to build the full-resolution viewer URL.
    pub fn full_resolution_source(&self) -> &str {
        self.public_id.as_deref().unwrap_or(&self.reference)
    }
}

/// Suffixes repeated keys with `#ordinal` so no two descriptors share a
/// selection or card state.
pub fn unique_keys(mut descriptors: Vec<ImageDescriptor>) -> Vec<ImageDescriptor> {
    let mut seen = HashSet::new();
    for descriptor in &mut descriptors {
        if !seen.insert(descriptor.key.clone()) {
            descriptor.key = format!("{}#{}", descriptor.key, descriptor.ordinal);
            seen.insert(descriptor.key.clone());
        }
    }
    descriptors
}

pub fn descriptor_title(collection_title: &str, ordinal: usize) -> String {
    format!("{} - Foto {}", collection_title, ordinal)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SelectedImage {
    pub key: String,
    pub ordinal: usize,
    pub resolved_url: String,
    pub title: String,
    /// Set when the viewer reported that the full-resolution image failed to decode.
    pub failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum PaginationItem {
    Page(usize),
    Ellipsis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    #[default]
    Pending,
    Loaded,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardOutcome {
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GalleryQuery {
    pub page: Option<usize>,
}
