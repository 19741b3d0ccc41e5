//! Page-number pagination with clamping.
//!
//! A missing or non-numeric page number means the first page. A number that
//! falls outside `1..=num_pages` means the last page. Nothing here fails.

use std::num::IntErrorKind;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requested {
    First,
    Number(i64),
    OutOfRange,
}

/// A request for one page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    requested: Requested,
    page_size: u64,
}

/// The concrete slice a [`PageRequest`] maps to once the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number.
    pub number: u64,
    pub num_pages: u64,
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Parse the raw `page` query value.
    pub fn parse(raw: Option<&str>, page_size: u64) -> Self {
        let requested = match raw.map(str::trim) {
            None | Some("") => Requested::First,
            Some(value) => match value.parse::<i64>() {
                Ok(number) => Requested::Number(number),
                Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                    Requested::OutOfRange
                }
                Err(_) => Requested::First,
            },
        };

        Self {
            requested,
            page_size: page_size.max(1),
        }
    }

    /// Request a specific page.
    pub fn number(number: u64, page_size: u64) -> Self {
        Self {
            requested: Requested::Number(i64::try_from(number).unwrap_or(i64::MAX)),
            page_size: page_size.max(1),
        }
    }

    /// First page with the given size.
    pub fn first(page_size: u64) -> Self {
        Self {
            requested: Requested::First,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Clamp the request against `total` items.
    ///
    /// An empty listing still has one (empty) page.
    pub fn window(&self, total: u64) -> PageWindow {
        let num_pages = total.div_ceil(self.page_size).max(1);
        let number = match self.requested {
            Requested::First => 1,
            Requested::Number(n) if n >= 1 && (n as u64) <= num_pages => n as u64,
            Requested::Number(_) | Requested::OutOfRange => num_pages,
        };

        PageWindow {
            number,
            num_pages,
            offset: (number - 1) * self.page_size,
            limit: self.page_size,
        }
    }

    /// Paginate an already sorted, fully materialised listing.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len() as u64;
        let window = self.window(total);
        let items = items
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect();
        Page::new(items, window, total)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub page_size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: u64) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            page_size: window.limit,
            total,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            page_size: self.page_size,
            total: self.total,
        }
    }
}
