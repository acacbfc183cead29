// crates/engine/src/page.rs

use serde::{Deserialize, Serialize};

/// Pagination over matches: drop the first `skip`, emit at most `limit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub skip: usize,
    /// `None` is unbounded.
    pub limit: Option<usize>,
}

impl Page {
    /// Build from command-line style numbers, where a `limit` of 0 means
    /// "no limit".
    pub fn new(skip: usize, limit: usize) -> Self {
        Self {
            skip,
            limit: (limit > 0).then_some(limit),
        }
    }

    /// Every match, no skipping.
    pub fn all() -> Self {
        Self::default()
    }
}

/// Running pagination state for one filter pass.
#[derive(Debug)]
pub(crate) struct Cursor {
    page: Page,
    matched: usize,
    emitted: usize,
}

impl Cursor {
    pub(crate) fn new(page: Page) -> Self {
        Self {
            page,
            matched: 0,
            emitted: 0,
        }
    }

    /// Record one match. Returns whether it should be emitted.
    pub(crate) fn admit(&mut self) -> bool {
        self.matched += 1;
        if self.matched <= self.page.skip || self.is_done() {
            return false;
        }
        self.emitted += 1;
        true
    }

    /// The limit has been reached; nothing more will be emitted.
    pub(crate) fn is_done(&self) -> bool {
        self.page.limit.is_some_and(|limit| self.emitted >= limit)
    }

    pub(crate) fn matched(&self) -> usize {
        self.matched
    }
}
