use std::collections::HashSet;

use crate::model::{DocumentItem, SubmissionRecord};

/// Above this many pages the page strip collapses into a window with ellipses.
pub const PAGE_WINDOW_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Page numbers to render for a table footer.
///
/// `current` is clamped into `1..=total`. Returns an empty strip when there
/// are no pages.
pub fn page_window(current: u32, total: u32) -> Vec<PageItem> {
    if total == 0 {
        return Vec::new();
    }
    if total <= PAGE_WINDOW_THRESHOLD {
        return (1..=total).map(PageItem::Page).collect();
    }

    let current = current.clamp(1, total);
    let mut items = Vec::with_capacity(7);
    if current <= 3 {
        items.extend((1..=4).map(PageItem::Page));
        items.push(PageItem::Ellipsis);
        items.push(PageItem::Page(total));
    } else if current >= total - 2 {
        items.push(PageItem::Page(1));
        items.push(PageItem::Ellipsis);
        items.extend((total - 3..=total).map(PageItem::Page));
    } else {
        items.push(PageItem::Page(1));
        items.push(PageItem::Ellipsis);
        items.extend((current - 1..=current + 1).map(PageItem::Page));
        items.push(PageItem::Ellipsis);
        items.push(PageItem::Page(total));
    }
    items
}

/// Anything listed with a server-assigned id.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for SubmissionRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for DocumentItem {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Append `incoming` after `existing`, keeping order and skipping ids that are
/// already present. Returns how many items were appended.
pub fn append_unique<T: Identified>(existing: &mut Vec<T>, incoming: Vec<T>) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(|item| item.id().to_string()).collect();
    let before = existing.len();
    for item in incoming {
        if seen.insert(item.id().to_string()) {
            existing.push(item);
        }
    }
    existing.len() - before
}
