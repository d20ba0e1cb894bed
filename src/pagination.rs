//! Stateless pagination over the tracked record list
//!
//! Pure window arithmetic plus a small cursor type. Navigation never panics:
//! out-of-range moves are no-ops and out-of-range slices are clamped.

use std::ops::Range;

/// Number of pages needed for `total` records at `page_size` per page
///
/// Zero records means zero pages. A `page_size` of zero also yields zero
/// pages rather than dividing by zero; callers validate page size upstream.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if total == 0 || page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// The `[start, end)` index range covered by page `index`
///
/// The range is clamped to `[0, total)`; an index past the last page yields
/// an empty range at `total` instead of an error.
pub fn page_bounds(index: usize, total: usize, page_size: usize) -> Range<usize> {
    let start = index.saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    start..end
}

/// Cursor over a paged list
///
/// Holds only the page size and current index; the total is supplied per
/// call because the underlying list can be replaced wholesale by a reload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    index: usize,
}

impl Pager {
    /// Create a pager at page 0
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            index: 0,
        }
    }

    /// Current page index (0-based)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Configured page size
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The index range of the current page for a list of `total` records
    pub fn current_bounds(&self, total: usize) -> Range<usize> {
        page_bounds(self.index, total, self.page_size)
    }

    /// Whether a previous page exists
    pub fn can_go_prev(&self) -> bool {
        self.index > 0
    }

    /// Whether a next page exists for a list of `total` records
    pub fn can_go_next(&self, total: usize) -> bool {
        self.index + 1 < page_count(total, self.page_size)
    }

    /// Advance one page; returns false (and stays put) at the last page
    pub fn next(&mut self, total: usize) -> bool {
        if self.can_go_next(total) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page; returns false (and stays put) at page 0
    pub fn prev(&mut self) -> bool {
        if self.can_go_prev() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Return to page 0, used after a reload replaces the list
    pub fn reset(&mut self) {
        self.index = 0;
    }
}
