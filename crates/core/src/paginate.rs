//! Pagination rules shared by the page builders.
//!
//! Most views split their items into pages of a fixed capacity. The step
//! view instead packs two tables per slide with [`SlotMachine`].

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Fixed-capacity paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    /// Number of items per page.
    capacity: usize,
    /// Whether zero items still produce one (empty) page.
    minimum_one_page: bool,
}

impl Paginator {
    /// Create a paginator with the given number of items per page.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1), // At least 1 item per page
            minimum_one_page: false,
        }
    }

    /// Emit one empty page when there are no items.
    pub fn with_minimum_one_page(mut self) -> Self {
        self.minimum_one_page = true;
        self
    }

    /// Items per page.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages needed for `items`.
    pub fn page_count(&self, items: usize) -> usize {
        let pages = items.div_ceil(self.capacity);
        if self.minimum_one_page {
            pages.max(1)
        } else {
            pages
        }
    }

    /// Item index ranges, one per page.
    ///
    /// Every page is full except the last, which holds the remainder.
    pub fn pages(&self, items: usize) -> Vec<Range<usize>> {
        (0..self.page_count(items))
            .map(|page| {
                let start = (page * self.capacity).min(items);
                let end = (start + self.capacity).min(items);
                start..end
            })
            .collect()
    }

    /// Number of items on each page.
    pub fn page_sizes(&self, items: usize) -> Vec<usize> {
        self.pages(items).into_iter().map(|r| r.len()).collect()
    }
}

/// Largest step table that can share a slide with another one.
pub const SLOT_ROW_LIMIT: usize = 5;

/// Placement position of a step table on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    /// Upper half of a fresh slide.
    First,
    /// Lower half of the previous slide.
    Second,
}

/// Where one step table goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub slot: Slot,
    /// Whether a new slide must be added before placing the table.
    pub new_slide: bool,
}

/// Packs step tables two to a slide.
///
/// A table always opens a fresh slide in slot 1. Only a table of at most
/// [`SLOT_ROW_LIMIT`] rows lets the next table share its slide in slot 2. A
/// table that is offered slot 2 but is too large opens a fresh slide in
/// slot 1 instead, and the table after it again starts a fresh slide.
#[derive(Debug, Clone)]
pub struct SlotMachine {
    next: Slot,
}

impl Default for SlotMachine {
    fn default() -> Self {
        Self { next: Slot::First }
    }
}

impl SlotMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide the placement of a table with `rows` protein rows.
    pub fn place(&mut self, rows: usize) -> Placement {
        let fits = rows <= SLOT_ROW_LIMIT;
        match self.next {
            Slot::First => {
                if fits {
                    self.next = Slot::Second;
                }
                Placement {
                    slot: Slot::First,
                    new_slide: true,
                }
            }
            Slot::Second => {
                self.next = Slot::First;
                if fits {
                    Placement {
                        slot: Slot::Second,
                        new_slide: false,
                    }
                } else {
                    Placement {
                        slot: Slot::First,
                        new_slide: true,
                    }
                }
            }
        }
    }

    /// Plan a whole sequence: the 0-based slide index and slot of each table.
    pub fn plan(row_counts: &[usize]) -> Vec<(usize, Slot)> {
        let mut machine = Self::new();
        let mut slides = 0usize;
        row_counts
            .iter()
            .map(|&rows| {
                let placement = machine.place(rows);
                if placement.new_slide {
                    slides += 1;
                }
                (slides.saturating_sub(1), placement.slot)
            })
            .collect()
    }
}
