//! Derived views over the book list: search, category filter, sort, featured.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use feruca::Collator;
use serde::{Deserialize, Serialize};

use super::models::{Book, DdcCode, UnknownDdcCode};

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Title,
    Author,
    Ddc,
}

impl SortKey {
    /// Text fields go through the collator; DDC groups order by code.
    pub fn compare(self, collator: &mut Collator, a: &Book, b: &Book) -> Ordering {
        match self {
            SortKey::Title => collator.collate(a.title.as_str(), b.title.as_str()),
            SortKey::Author => collator.collate(a.author.as_str(), b.author.as_str()),
            SortKey::Ddc => a.ddc.cmp(&b.ddc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Category restriction: everything, or a single DDC group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DdcFilter {
    #[default]
    All,
    Only(DdcCode),
}

impl DdcFilter {
    pub fn matches(self, book: &Book) -> bool {
        match self {
            DdcFilter::All => true,
            DdcFilter::Only(code) => book.ddc == code,
        }
    }
}

impl FromStr for DdcFilter {
    type Err = UnknownDdcCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            Ok(DdcFilter::All)
        } else {
            s.parse().map(DdcFilter::Only)
        }
    }
}

impl TryFrom<String> for DdcFilter {
    type Error = UnknownDdcCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DdcFilter> for String {
    fn from(filter: DdcFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for DdcFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdcFilter::All => f.write_str("All"),
            DdcFilter::Only(code) => write!(f, "{code}"),
        }
    }
}

/// Search, filter, and ordering parameters for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub search: String,
    pub ddc: DdcFilter,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

impl CatalogQuery {
    /// Case-insensitive substring match on title or author, within the category filter.
    pub fn matches(&self, book: &Book) -> bool {
        self.ddc.matches(book) && matches_term(book, &self.search.to_lowercase())
    }

    /// Matching books in comparator order. Ties keep their input order.
    pub fn run<'a>(&self, books: &'a [Book]) -> Vec<&'a Book> {
        let mut hits: Vec<&Book> = books.iter().filter(|book| self.matches(book)).collect();
        let mut collator = Collator::default();
        // `sort_by` is stable.
        hits.sort_by(|a, b| self.order.apply(self.sort_by.compare(&mut collator, a, b)));
        hits
    }
}

fn matches_term(book: &Book, lowered_term: &str) -> bool {
    lowered_term.is_empty()
        || book.title.to_lowercase().contains(lowered_term)
        || book.author.to_lowercase().contains(lowered_term)
}

/// Books flagged as featured, in list order.
pub fn featured(books: &[Book]) -> Vec<&Book> {
    books.iter().filter(|book| book.is_featured).collect()
}
