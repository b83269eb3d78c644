//! One-based page numbers for catalog listings.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for page numbers below one.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("page numbers start at 1")]
pub struct PageNumberError;

/// A one-based page number.
///
/// `GET /get_books` without a page is page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageNumber(u32);

impl PageNumber {
    /// The first page.
    pub const FIRST: Self = Self(1);

    /// Create a page number.
    ///
    /// # Errors
    ///
    /// Returns `PageNumberError` for page 0.
    pub const fn new(page: u32) -> Result<Self, PageNumberError> {
        if page == 0 {
            Err(PageNumberError)
        } else {
            Ok(Self(page))
        }
    }

    /// Get the underlying page number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this is the first page.
    #[must_use]
    pub const fn is_first(self) -> bool {
        self.0 == 1
    }

    /// Number of rows to skip for this page at the given page size.
    #[must_use]
    pub const fn offset(self, per_page: u32) -> u64 {
        (self.0 as u64 - 1) * per_page as u64
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for PageNumber {
    type Error = PageNumberError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageNumber> for u32 {
    fn from(page: PageNumber) -> Self {
        page.0
    }
}
