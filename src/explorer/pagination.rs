use super::{ImageDescriptor, PaginationItem};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Borrowed view of the current page. Never owns the descriptors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageWindow<'a> {
    pub page_size: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub visible: &'a [ImageDescriptor],
}

impl PageWindow<'_> {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

pub fn total_pages(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Number of pages that hold at least one loaded item.
pub fn loaded_page_count(loaded: usize, page_size: usize) -> usize {
    loaded.div_ceil(page_size.max(1))
}

pub fn page_of_index(index: usize, page_size: usize) -> usize {
    index / page_size.max(1) + 1
}

pub fn visible_range(loaded: usize, current_page: usize, page_size: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let start = current_page.saturating_sub(1).saturating_mul(page_size);
    let end = current_page.saturating_mul(page_size).min(loaded);

    if start >= end { 0..0 } else { start..end }
}

pub fn page_window(
    items: &[ImageDescriptor],
    total_count: usize,
    current_page: usize,
    page_size: usize,
) -> PageWindow<'_> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(total_count.max(items.len()), page_size);
    let current_page = clamp_page(current_page, total_pages);
    let range = visible_range(items.len(), current_page, page_size);

    PageWindow {
        page_size,
        current_page,
        total_pages,
        visible: &items[range],
    }
}

/// Condensed control model: first, last and the neighbors of the current
/// page, with each gap collapsed into one ellipsis. Empty for a single page.
pub fn pagination_items(current_page: usize, total_pages: usize) -> Vec<PaginationItem> {
    if total_pages <= 1 {
        return Vec::new();
    }

    let current_page = clamp_page(current_page, total_pages);
    let mut pages = vec![1, total_pages];
    for page in current_page.saturating_sub(1)..=current_page + 1 {
        if (1..=total_pages).contains(&page) {
            pages.push(page);
        }
    }
    pages.sort_unstable();
    pages.dedup();

    let mut items = Vec::with_capacity(pages.len() * 2);
    let mut previous = 0;
    for page in pages {
        if previous != 0 && page > previous + 1 {
            items.push(PaginationItem::Ellipsis);
        }
        items.push(PaginationItem::Page(page));
        previous = page;
    }

    items
}

/// Debounce for page changes. Each call waits out the settle delay and only
/// the most recent caller is allowed to commit.
#[derive(Debug)]
pub struct PageSettle {
    delay: Duration,
    latest: AtomicU64,
}

impl PageSettle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: AtomicU64::new(0),
        }
    }

    /// Returns `false` when a newer page change arrived during the delay.
    pub async fn settle(&self) -> bool {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.latest.load(Ordering::SeqCst) == ticket
    }
}
