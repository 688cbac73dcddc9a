use super::{GridCard, PaginationItem, SelectedImage};
use serde::Serialize;

/// What the gallery body shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Initial batch outstanding: spinner only, no grid.
    Loading,
    /// Fetch failed: retry banner, fallback items (if any) rendered below it.
    Error,
    /// Nothing to show on this page and nothing went wrong.
    Empty,
    Grid,
}

impl ViewState {
    pub fn derive(loading: bool, load_error: bool, visible_count: usize) -> Self {
        if loading {
            ViewState::Loading
        } else if load_error {
            ViewState::Error
        } else if visible_count == 0 {
            ViewState::Empty
        } else {
            ViewState::Grid
        }
    }

    pub fn shows_grid(self, visible_count: usize) -> bool {
        match self {
            ViewState::Grid => true,
            ViewState::Error => visible_count > 0,
            ViewState::Loading | ViewState::Empty => false,
        }
    }

    pub fn offers_retry(self) -> bool {
        self == ViewState::Error
    }
}

/// Everything a renderer needs for one frame of the explorer.
#[derive(Debug, Clone, Serialize)]
pub struct ExplorerSnapshot {
    pub collection_id: String,
    pub title: String,
    pub description: String,
    pub formatted_date: String,
    pub view: ViewState,
    pub loading: bool,
    pub load_error: bool,
    pub show_grid: bool,
    pub offer_retry: bool,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub loaded_count: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub cards: Vec<GridCard>,
    pub pagination: Vec<PaginationItem>,
    pub lightbox: Option<SelectedImage>,
    pub body_scroll_locked: bool,
    /// Bumped on every committed page change; renderers reset scroll when it moves.
    pub scroll_epoch: u64,
}
