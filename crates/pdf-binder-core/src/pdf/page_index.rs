//! Strongly-typed page indices.
//!
//! Page positions cross two library boundaries with different conventions:
//! mupdf wants an `i32`, lopdf a 1-based `u32`, and the rest of the crate
//! indexes with `usize`. [`PageIndex`] pins the conversions down in one
//! place so no call site does its own arithmetic.

use std::fmt;

use crate::error::Error;

/// A validated 0-based page index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    /// Wrap an index that is already known to be valid.
    #[must_use]
    pub const fn new(index: i32) -> Self {
        Self(index)
    }

    /// The raw i32 value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// The index as usize, for slice and map lookups.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // Safe: we check for negative values
    pub const fn as_usize(self) -> usize {
        // Construction never produces a negative index; treat one as 0
        // instead of panicking anyway
        if self.0 < 0 {
            0
        } else {
            self.0 as usize
        }
    }

    /// The 1-based page number lopdf's page APIs expect.
    #[must_use]
    pub const fn as_page_number(self) -> u32 {
        // Non-negative by construction, and +1 cannot overflow for any
        // real page count
        (self.0 + 1).cast_unsigned()
    }

    /// Validate a 0-based page number against a document's page count.
    pub fn try_from_page_num(page_num: usize, total_pages: usize) -> Result<Self, Error> {
        if page_num >= total_pages {
            return Err(Error::InvalidPage {
                page: page_num,
                total: total_pages,
            });
        }

        let index = i32::try_from(page_num).map_err(|_| Error::InvalidPage {
            page: page_num,
            total: total_pages,
        })?;

        Ok(Self(index))
    }

    /// Clamp against a document's page count, falling back to the first page.
    ///
    /// Preview rendering keeps going where strict lookups would fail, so an
    /// out-of-range index quietly becomes page 0.
    #[must_use]
    pub fn clamped_to(self, total_pages: usize) -> Self {
        if total_pages > 0 && self.as_usize() < total_pages {
            self
        } else {
            Self(0)
        }
    }
}

impl TryFrom<usize> for PageIndex {
    type Error = Error;

    /// Convert a usize to a PageIndex.
    ///
    /// Fails only when the value does not fit in an i32. Prefer
    /// `try_from_page_num` when a page count is available to check against.
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let index = i32::try_from(value).map_err(|_| Error::InvalidPage {
            page: value,
            total: 0, // Unknown total when using raw conversion
        })?;
        Ok(Self(index))
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
