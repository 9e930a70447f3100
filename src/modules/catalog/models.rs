use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Availability label assigned to every newly added book.
pub const AVAILABLE_STATUS: &str = "ရရှိနိုင်သည်";

/// One of the ten Dewey-style classification groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DdcCode {
    #[default]
    #[serde(rename = "000")]
    GeneralWorks,
    #[serde(rename = "100")]
    Philosophy,
    #[serde(rename = "200")]
    Religion,
    #[serde(rename = "300")]
    SocialSciences,
    #[serde(rename = "400")]
    Language,
    #[serde(rename = "500")]
    Science,
    #[serde(rename = "600")]
    Technology,
    #[serde(rename = "700")]
    Arts,
    #[serde(rename = "800")]
    Literature,
    #[serde(rename = "900")]
    HistoryGeography,
}

impl DdcCode {
    pub const ALL: [DdcCode; 10] = [
        DdcCode::GeneralWorks,
        DdcCode::Philosophy,
        DdcCode::Religion,
        DdcCode::SocialSciences,
        DdcCode::Language,
        DdcCode::Science,
        DdcCode::Technology,
        DdcCode::Arts,
        DdcCode::Literature,
        DdcCode::HistoryGeography,
    ];

    /// The 3-digit code, e.g. `"600"`.
    pub fn as_str(self) -> &'static str {
        match self {
            DdcCode::GeneralWorks => "000",
            DdcCode::Philosophy => "100",
            DdcCode::Religion => "200",
            DdcCode::SocialSciences => "300",
            DdcCode::Language => "400",
            DdcCode::Science => "500",
            DdcCode::Technology => "600",
            DdcCode::Arts => "700",
            DdcCode::Literature => "800",
            DdcCode::HistoryGeography => "900",
        }
    }
}

impl fmt::Display for DdcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown DDC code '{0}'")]
pub struct UnknownDdcCode(pub String);

impl FromStr for DdcCode {
    type Err = UnknownDdcCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DdcCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownDdcCode(s.to_string()))
    }
}

/// Static reference entry describing a DDC group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DdcCategory {
    pub code: DdcCode,
    pub label: &'static str,
    pub icon_key: &'static str,
    pub color: &'static str,
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub ddc: DdcCode,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub status: String,
    /// Free-form; may be empty or use non-latin digits.
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub pdf_url: String,
}

impl Book {
    /// Build a book from form fields with the default availability status.
    pub fn from_form(id: i64, form: NewBookForm) -> Self {
        Self {
            id,
            title: form.title,
            author: form.author,
            ddc: form.ddc,
            is_featured: form.is_featured,
            status: AVAILABLE_STATUS.to_string(),
            year: form.year,
            cover_url: form.cover_url,
            pdf_url: form.pdf_url,
        }
    }

    /// Overwrite the editable fields; `id` and `status` are kept.
    pub fn apply(&mut self, form: NewBookForm) {
        self.title = form.title;
        self.author = form.author;
        self.ddc = form.ddc;
        self.is_featured = form.is_featured;
        self.year = form.year;
        self.cover_url = form.cover_url;
        self.pdf_url = form.pdf_url;
    }

    pub fn is_available(&self) -> bool {
        self.status == AVAILABLE_STATUS
    }
}

/// Acquisition request submitted by a patron.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRequest {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub requester: String,
    pub date: String,
}

/// Editable book fields, used for both add and update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBookForm {
    pub title: String,
    pub author: String,
    pub ddc: DdcCode,
    pub is_featured: bool,
    pub year: String,
    pub cover_url: String,
    pub pdf_url: String,
}

impl NewBookForm {
    /// Names of required fields left blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.author.trim().is_empty() {
            missing.push("author");
        }
        missing
    }
}

impl From<&Book> for NewBookForm {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            ddc: book.ddc,
            is_featured: book.is_featured,
            year: book.year.clone(),
            cover_url: book.cover_url.clone(),
            pdf_url: book.pdf_url.clone(),
        }
    }
}

/// Fields a patron fills in to request a book.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewRequestForm {
    pub title: String,
    pub author: String,
    pub requester: String,
}

impl NewRequestForm {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("author", &self.author),
            ("requester", &self.requester),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// The session's live books and requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkingSet {
    pub books: Vec<Book>,
    pub requests: Vec<BookRequest>,
}

/// Point-in-time backup of the working set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub books: Vec<Book>,
    pub requests: Vec<BookRequest>,
    pub export_date: String,
}
