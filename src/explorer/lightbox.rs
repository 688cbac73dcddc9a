use super::pagination::{loaded_page_count, visible_range};
use super::{Direction, ImageDescriptor, MediaUrlBuilder, SelectedImage};

/// Full-screen single image viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lightbox {
    #[default]
    Closed,
    Open(SelectedImage),
}

impl Lightbox {
    pub fn is_open(&self) -> bool {
        matches!(self, Lightbox::Open(_))
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        match self {
            Lightbox::Open(selected) => Some(selected),
            Lightbox::Closed => None,
        }
    }

    pub fn open(&mut self, descriptor: &ImageDescriptor, urls: &MediaUrlBuilder) {
        *self = Lightbox::Open(select(descriptor, urls));
    }

    pub fn close(&mut self) {
        *self = Lightbox::Closed;
    }

    /// Page body must not scroll behind an open viewer.
    pub fn body_scroll_locked(&self) -> bool {
        self.is_open()
    }

    /// Keeps the viewer open and switches it to the unavailable placeholder.
    pub fn mark_failed(&mut self) -> bool {
        match self {
            Lightbox::Open(selected) => {
                selected.failed = true;
                true
            }
            Lightbox::Closed => false,
        }
    }
}

pub fn select(descriptor: &ImageDescriptor, urls: &MediaUrlBuilder) -> SelectedImage {
    SelectedImage {
        key: descriptor.key.clone(),
        ordinal: descriptor.ordinal,
        resolved_url: urls.full_resolution(descriptor),
        title: descriptor.title.clone(),
        failed: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEdge {
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStep {
    /// Move to this index of the current page's visible slice.
    Within(usize),
    /// Switch pages, then select the first or last item there.
    ChangePage { page: usize, edge: PageEdge },
    /// The selection is not on the current page; nothing to navigate from.
    Close,
}

/// Works out where `direction` leads from the item keyed `current_key`.
///
/// Movement stays inside the visible slice until its edge, then crosses to
/// the adjacent page that holds loaded items. Past the last loaded page it
/// wraps to page 1 (and the reverse for `Prev`). A collection that fits on
/// one page wraps within that page.
pub fn plan_navigation(
    items: &[ImageDescriptor],
    current_page: usize,
    page_size: usize,
    current_key: &str,
    direction: Direction,
) -> NavigationStep {
    let visible = &items[visible_range(items.len(), current_page, page_size)];
    let Some(position) = visible.iter().position(|d| d.key == current_key) else {
        return NavigationStep::Close;
    };
    let loaded_pages = loaded_page_count(items.len(), page_size);

    match direction {
        Direction::Next if position + 1 < visible.len() => NavigationStep::Within(position + 1),
        Direction::Prev if position > 0 => NavigationStep::Within(position - 1),
        _ if loaded_pages <= 1 => match direction {
            Direction::Next => NavigationStep::Within(0),
            Direction::Prev => NavigationStep::Within(visible.len() - 1),
        },
        Direction::Next => NavigationStep::ChangePage {
            page: if current_page >= loaded_pages {
                1
            } else {
                current_page + 1
            },
            edge: PageEdge::First,
        },
        Direction::Prev => NavigationStep::ChangePage {
            page: if current_page <= 1 {
                loaded_pages
            } else {
                current_page - 1
            },
            edge: PageEdge::Last,
        },
    }
}

/// Descriptor at `edge` of `page`, if that page has loaded items.
pub fn edge_item(
    items: &[ImageDescriptor],
    page: usize,
    page_size: usize,
    edge: PageEdge,
) -> Option<&ImageDescriptor> {
    let visible = &items[visible_range(items.len(), page, page_size)];
    match edge {
        PageEdge::First => visible.first(),
        PageEdge::Last => visible.last(),
    }
}
