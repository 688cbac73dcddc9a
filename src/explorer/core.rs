use super::fetcher::{DEFAULT_MAX_RESULTS, MediaSource};
use super::grid::{CardStates, build_cards};
use super::lightbox::{Lightbox, NavigationStep, edge_item, plan_navigation};
use super::pagination::{
    DEFAULT_PAGE_SIZE, DEFAULT_SETTLE_DELAY, PageSettle, clamp_page, page_of_index, page_window,
    pagination_items, total_pages, visible_range,
};
use super::view::{ExplorerSnapshot, ViewState};
use super::{
    CardOutcome, CardStatus, CollectionProps, Direction, ImageDescriptor, MediaUrlBuilder,
    SelectedImage,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ExplorerSettings {
    pub page_size: usize,
    pub max_results: usize,
    pub settle_delay: Duration,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_results: DEFAULT_MAX_RESULTS,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// One mounted gallery viewer: loaded items, current page, lightbox and
/// per-card state for a single collection at a time.
pub struct Explorer {
    source: Arc<dyn MediaSource>,
    urls: MediaUrlBuilder,
    settings: ExplorerSettings,
    state: RwLock<ExplorerState>,
    settle: PageSettle,
}

struct ExplorerState {
    props: Option<CollectionProps>,
    items: Vec<ImageDescriptor>,
    total_count: usize,
    current_page: usize,
    lightbox: Lightbox,
    cards: CardStates,
    loading: bool,
    load_error: bool,
    in_flight: Option<CancellationToken>,
    scroll_epoch: u64,
}

impl Default for ExplorerState {
    fn default() -> Self {
        Self {
            props: None,
            items: Vec::new(),
            total_count: 0,
            current_page: 1,
            lightbox: Lightbox::Closed,
            cards: CardStates::default(),
            loading: false,
            load_error: false,
            in_flight: None,
            scroll_epoch: 0,
        }
    }
}

impl ExplorerState {
    fn total_pages(&self, page_size: usize) -> usize {
        total_pages(self.total_count.max(self.items.len()), page_size)
    }

    fn reset(&mut self, props: CollectionProps) {
        let scroll_epoch = self.scroll_epoch;
        *self = ExplorerState {
            items: props.initial_items.clone(),
            total_count: props.initial_total_count,
            props: Some(props),
            loading: true,
            scroll_epoch,
            ..ExplorerState::default()
        };
    }

    fn commit_page(&mut self, page: usize, page_size: usize) -> bool {
        let page = clamp_page(page, self.total_pages(page_size));
        if page == self.current_page {
            return false;
        }
        debug!(from = self.current_page, to = page, "Committing page change");
        self.current_page = page;
        self.scroll_epoch += 1;
        true
    }

    fn key_for_ordinal(&self, ordinal: usize) -> Option<String> {
        self.items
            .iter()
            .find(|d| d.ordinal == ordinal)
            .map(|d| d.key.clone())
    }

    /// Re-establishes the page and selection invariants after the item list
    /// was replaced.
    fn reconcile(&mut self, page_size: usize, urls: &MediaUrlBuilder) {
        self.current_page = clamp_page(self.current_page, self.total_pages(page_size));
        self.cards.retain_keys(&self.items);

        let Some(key) = self.lightbox.selected().map(|s| s.key.clone()) else {
            return;
        };
        match self.items.iter().position(|d| d.key == key) {
            Some(index) => {
                self.commit_page(page_of_index(index, page_size), page_size);
                self.lightbox.open(&self.items[index], urls);
            }
            None => self.lightbox.close(),
        }
    }
}

impl Explorer {
    pub fn new(
        source: Arc<dyn MediaSource>,
        urls: MediaUrlBuilder,
        settings: ExplorerSettings,
    ) -> Self {
        let settle = PageSettle::new(settings.settle_delay);
        Self {
            source,
            urls,
            settings,
            state: RwLock::new(ExplorerState::default()),
            settle,
        }
    }

    /// Mounts `props` and loads its batch. Mounting the collection that is
    /// already mounted is a no-op; any other collection fully resets the
    /// viewer and cancels the load in flight.
    pub async fn mount(&self, props: CollectionProps) {
        {
            let mut state = self.state.write().await;
            if state
                .props
                .as_ref()
                .is_some_and(|p| p.collection_id == props.collection_id)
            {
                debug!(collection_id = %props.collection_id, "Collection already mounted");
                return;
            }

            if let Some(previous) = state.in_flight.take() {
                previous.cancel();
            }

            info!(collection_id = %props.collection_id, "Mounting collection");
            state.reset(props);
        }

        self.load().await;
    }

    /// User-initiated reload of the mounted collection.
    pub async fn retry(&self) {
        info!("Retrying collection load");
        self.load().await;
    }

    async fn load(&self) {
        let (collection_id, title, date, token) = {
            let mut state = self.state.write().await;
            let Some(props) = state.props.as_ref() else {
                return;
            };
            let collection_id = props.collection_id.clone();
            let title = props.title.clone();
            let date = Some(props.formatted_date.clone()).filter(|d| !d.is_empty());

            if let Some(previous) = state.in_flight.take() {
                previous.cancel();
            }
            let token = CancellationToken::new();
            state.in_flight = Some(token.clone());
            state.loading = true;
            state.load_error = false;

            (collection_id, title, date, token)
        };

        let result = self
            .source
            .fetch_batch(&collection_id, self.settings.max_results, &token)
            .await;

        let mut guard = self.state.write().await;
        if token.is_cancelled() {
            debug!(collection_id = %collection_id, "Discarding superseded collection load");
            return;
        }

        let state = &mut *guard;
        state.in_flight = None;
        state.loading = false;

        match result {
            Ok(batch) => {
                state.total_count = batch.total;
                state.items = batch.into_descriptors(&title, date.as_deref());
                info!(
                    collection_id = %collection_id,
                    loaded = state.items.len(),
                    total = state.total_count,
                    "Collection loaded"
                );
            }
            Err(e) if e.is_abort() => {
                debug!(collection_id = %collection_id, "Collection load aborted");
            }
            Err(e) => {
                warn!(collection_id = %collection_id, "Collection load failed, using initial items: {}", e);
                state.load_error = true;
                if let Some(props) = state.props.as_ref() {
                    state.items = props.initial_items.clone();
                    state.total_count = props.initial_total_count;
                }
            }
        }

        state.reconcile(self.settings.page_size, &self.urls);
    }

    /// Debounced grid page change. Returns `false` if a newer change
    /// superseded this one during the settle delay, the page did not move, or
    /// the lightbox is open (the navigator owns the page until it closes).
    pub async fn set_page(&self, page: usize) -> bool {
        if !self.settle.settle().await {
            debug!(page, "Page change superseded");
            return false;
        }

        let mut state = self.state.write().await;
        if state.lightbox.is_open() {
            debug!(page, "Ignoring grid page change while the lightbox is open");
            return false;
        }
        state.commit_page(page, self.settings.page_size)
    }

    /// Opens the lightbox on a loaded item, moving to its page if needed.
    pub async fn activate(&self, ordinal: usize) -> Option<SelectedImage> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let Some(index) = state.items.iter().position(|d| d.ordinal == ordinal) else {
            warn!(ordinal, "Cannot open an item that is not loaded");
            return None;
        };

        state.commit_page(
            page_of_index(index, self.settings.page_size),
            self.settings.page_size,
        );
        state.lightbox.open(&state.items[index], &self.urls);
        state.lightbox.selected().cloned()
    }

    pub async fn close(&self) {
        self.state.write().await.lightbox.close();
    }

    /// Moves the lightbox selection, crossing pages at slice boundaries.
    pub async fn navigate(&self, direction: Direction) -> Option<SelectedImage> {
        let planned = {
            let state = self.state.read().await;
            let selected = state.lightbox.selected()?;
            plan_navigation(
                &state.items,
                state.current_page,
                self.settings.page_size,
                &selected.key,
                direction,
            )
        };

        if matches!(planned, NavigationStep::ChangePage { .. }) && !self.settle.settle().await {
            debug!("Lightbox page change superseded");
            return self.state.read().await.lightbox.selected().cloned();
        }

        let page_size = self.settings.page_size;
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let key = state.lightbox.selected()?.key.clone();

        match plan_navigation(&state.items, state.current_page, page_size, &key, direction) {
            NavigationStep::Within(index) => {
                let range = visible_range(state.items.len(), state.current_page, page_size);
                state.lightbox.open(&state.items[range][index], &self.urls);
            }
            NavigationStep::ChangePage { page, edge } => {
                match edge_item(&state.items, page, page_size, edge).cloned() {
                    Some(descriptor) => {
                        state.commit_page(page, page_size);
                        state.lightbox.open(&descriptor, &self.urls);
                    }
                    None => state.lightbox.close(),
                }
            }
            NavigationStep::Close => {
                debug!(key = %key, "Selection left the visible page, closing lightbox");
                state.lightbox.close();
            }
        }

        state.lightbox.selected().cloned()
    }

    /// Records a card's decode result. Returns `false` for unknown ordinals.
    pub async fn report_card(&self, ordinal: usize, outcome: CardOutcome) -> bool {
        let mut state = self.state.write().await;
        let Some(key) = state.key_for_ordinal(ordinal) else {
            return false;
        };

        let status = match outcome {
            CardOutcome::Loaded => CardStatus::Loaded,
            CardOutcome::Failed => {
                debug!(ordinal, "Card image failed to load");
                CardStatus::Errored
            }
        };
        state.cards.set(&key, status);
        true
    }

    pub async fn lightbox_image_failed(&self) -> bool {
        self.state.write().await.lightbox.mark_failed()
    }

    pub async fn snapshot(&self) -> ExplorerSnapshot {
        let state = self.state.read().await;
        let window = page_window(
            &state.items,
            state.total_count,
            state.current_page,
            self.settings.page_size,
        );
        let visible_count = window.visible.len();
        let view = ViewState::derive(state.loading, state.load_error, visible_count);
        let show_grid = view.shows_grid(visible_count);

        let (collection_id, title, description, formatted_date) = match state.props.as_ref() {
            Some(props) => (
                props.collection_id.clone(),
                props.title.clone(),
                props.description.clone(),
                props.formatted_date.clone(),
            ),
            None => Default::default(),
        };

        ExplorerSnapshot {
            collection_id,
            title,
            description,
            formatted_date,
            view,
            loading: state.loading,
            load_error: state.load_error,
            show_grid,
            offer_retry: view.offers_retry(),
            current_page: window.current_page,
            total_pages: window.total_pages,
            page_size: window.page_size,
            total_count: state.total_count.max(state.items.len()),
            loaded_count: state.items.len(),
            has_previous_page: window.has_previous(),
            has_next_page: window.has_next(),
            cards: if show_grid {
                build_cards(window.visible, &state.cards, &self.urls)
            } else {
                Vec::new()
            },
            pagination: if view == ViewState::Loading {
                Vec::new()
            } else {
                pagination_items(window.current_page, window.total_pages)
            },
            lightbox: state.lightbox.selected().cloned(),
            body_scroll_locked: state.lightbox.body_scroll_locked(),
            scroll_epoch: state.scroll_epoch,
        }
    }
}
