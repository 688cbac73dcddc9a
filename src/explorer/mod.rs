mod core;
mod error;
mod fetcher;
mod grid;
mod handlers;
mod lightbox;
mod pagination;
mod resolve;
mod sessions;
mod types;
mod view;

// Re-export public items
pub use self::core::{Explorer, ExplorerSettings};
pub use error::FetchError;
pub use fetcher::{
    DEFAULT_MAX_RESULTS, EndpointMap, HttpMediaSource, MediaSource, RemoteBatch, RemoteImage,
};
pub use grid::{CardStates, GridCard, MAX_STAGGER_MS, Placeholder, build_cards, entrance_delay_ms};
pub use handlers::{
    card_outcome_handler, close_lightbox_handler, gallery_json_handler, gallery_page_handler,
    lightbox_failed_handler, navigate_handler, open_lightbox_handler, page_handler, retry_handler,
};
pub use lightbox::{Lightbox, NavigationStep, PageEdge, edge_item, plan_navigation};
pub use pagination::{
    DEFAULT_PAGE_SIZE, DEFAULT_SETTLE_DELAY, PageSettle, PageWindow, page_window,
    pagination_items, total_pages,
};
pub use resolve::{FULL_RESOLUTION_TRANSFORM, MediaUrlBuilder, is_absolute_http_url};
pub use sessions::{ExplorerSessions, SESSION_COOKIE};
pub use types::*;
pub use view::{ExplorerSnapshot, ViewState};

use std::sync::Arc;

pub type SharedSessions = Arc<ExplorerSessions>;
