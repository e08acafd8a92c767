//! In-memory, append-only wishlist

use std::fmt;

/// One requested item, attributed to the person who asked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistEntry {
    requestor: String,
    item: String,
}

impl WishlistEntry {
    /// Create an entry
    #[must_use]
    pub fn new(requestor: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            requestor: requestor.into(),
            item: item.into(),
        }
    }

    /// Who asked for the item
    #[must_use]
    pub fn requestor(&self) -> &str {
        &self.requestor
    }

    /// What was asked for
    #[must_use]
    pub fn item(&self) -> &str {
        &self.item
    }
}

impl fmt::Display for WishlistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wants {}", self.requestor, self.item)
    }
}

/// Ordered log of requests for the lifetime of the process
///
/// Entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    entries: Vec<WishlistEntry>,
}

impl Wishlist {
    /// Create an empty wishlist
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry at the end
    pub fn append(
        &mut self,
        requestor: impl Into<String>,
        item: impl Into<String>,
    ) -> &WishlistEntry {
        self.entries.push(WishlistEntry::new(requestor, item));
        &self.entries[self.entries.len() - 1]
    }

    /// All entries in insertion order
    #[must_use]
    pub fn all(&self) -> &[WishlistEntry] {
        &self.entries
    }

    /// Whether nothing has been requested yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
