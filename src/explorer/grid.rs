use super::{CardStatus, ImageDescriptor, MediaUrlBuilder};
use serde::Serialize;
use std::collections::HashMap;

pub const STAGGER_STEP_MS: u64 = 50;
/// Keeps a full 12-card page inside ~0.6s of entrance animation.
pub const MAX_STAGGER_MS: u64 = 550;

pub const PLACEHOLDER_ICON: &str = "image-off";
pub const PLACEHOLDER_CAPTION: &str = "Image unavailable";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Placeholder {
    pub icon: &'static str,
    pub caption: &'static str,
}

const PLACEHOLDER: Placeholder = Placeholder {
    icon: PLACEHOLDER_ICON,
    caption: PLACEHOLDER_CAPTION,
};

/// Render model for one card on the current page.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GridCard {
    pub key: String,
    pub ordinal: usize,
    pub title: String,
    pub date: Option<String>,
    pub thumbnail_url: String,
    pub status: CardStatus,
    /// Caption overlay revealed on hover/focus once the image decoded.
    pub caption_enabled: bool,
    pub placeholder: Option<Placeholder>,
    pub entrance_delay_ms: u64,
}

pub fn entrance_delay_ms(position: usize) -> u64 {
    (position as u64)
        .saturating_mul(STAGGER_STEP_MS)
        .min(MAX_STAGGER_MS)
}

/// Load outcome reported for each card, keyed by descriptor key.
#[derive(Debug, Clone, Default)]
pub struct CardStates {
    statuses: HashMap<String, CardStatus>,
}

impl CardStates {
    pub fn status(&self, key: &str) -> CardStatus {
        self.statuses.get(key).copied().unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, status: CardStatus) {
        self.statuses.insert(key.to_string(), status);
    }

    /// Drops entries whose descriptor is no longer loaded.
    pub fn retain_keys(&mut self, items: &[ImageDescriptor]) {
        self.statuses
            .retain(|key, _| items.iter().any(|item| &item.key == key));
    }
}

pub fn build_cards(
    visible: &[ImageDescriptor],
    states: &CardStates,
    urls: &MediaUrlBuilder,
) -> Vec<GridCard> {
    visible
        .iter()
        .enumerate()
        .map(|(position, descriptor)| {
            let status = states.status(&descriptor.key);
            GridCard {
                key: descriptor.key.clone(),
                ordinal: descriptor.ordinal,
                title: descriptor.title.clone(),
                date: descriptor.date.clone(),
                thumbnail_url: urls.thumbnail(descriptor),
                status,
                caption_enabled: status == CardStatus::Loaded,
                placeholder: (status == CardStatus::Errored).then_some(PLACEHOLDER),
                entrance_delay_ms: entrance_delay_ms(position),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors() -> Vec<ImageDescriptor> {
        (1..=3)
            .map(|ordinal| {
                ImageDescriptor::new(
                    "Gala",
                    ordinal,
                    format!("https://cdn.example.com/{}.jpg", ordinal),
                    None,
                    Some("May 4, 2024".to_string()),
                )
            })
            .collect()
    }

    #[test]
    fn test_entrance_delay_is_bounded() {
        assert_eq!(entrance_delay_ms(0), 0);
        assert_eq!(entrance_delay_ms(3), 150);
        assert_eq!(entrance_delay_ms(11), 550);
        assert_eq!(entrance_delay_ms(500), MAX_STAGGER_MS);
    }

    #[test]
    fn test_cards_track_status_independently() {
        let urls = MediaUrlBuilder::new("https://res.cloudinary.com/demo/image");
        let items = descriptors();
        let mut states = CardStates::default();
        states.set(&items[0].key, CardStatus::Loaded);
        states.set(&items[2].key, CardStatus::Errored);

        let cards = build_cards(&items, &states, &urls);
        assert_eq!(cards.len(), 3);

        assert_eq!(cards[0].status, CardStatus::Loaded);
        assert!(cards[0].caption_enabled);
        assert!(cards[0].placeholder.is_none());

        assert_eq!(cards[1].status, CardStatus::Pending);
        assert!(!cards[1].caption_enabled);
        assert_eq!(cards[1].thumbnail_url, "https://cdn.example.com/2.jpg");
        assert_eq!(cards[1].entrance_delay_ms, 50);

        assert_eq!(cards[2].status, CardStatus::Errored);
        assert_eq!(
            cards[2].placeholder.as_ref().map(|p| p.caption),
            Some(PLACEHOLDER_CAPTION)
        );
    }

    #[test]
    fn test_retain_keys_forgets_unloaded_items() {
        let items = descriptors();
        let mut states = CardStates::default();
        states.set("gone", CardStatus::Errored);
        states.set(&items[1].key, CardStatus::Loaded);

        states.retain_keys(&items);
        assert_eq!(states.status("gone"), CardStatus::Pending);
        assert_eq!(states.status(&items[1].key), CardStatus::Loaded);
    }
}
