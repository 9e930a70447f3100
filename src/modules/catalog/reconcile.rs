//! One-shot merge of bundled defaults into a loaded book list.

use std::collections::HashSet;

use super::models::Book;

/// Result of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub books: Vec<Book>,
    /// Defaults appended to the list.
    pub added: usize,
    /// The stored tag was stale and must be replaced with the build tag.
    pub tag_updated: bool,
}

/// Append defaults whose ids are absent when `stored_tag` differs from `build_tag`.
///
/// Existing books are never touched, even when they share an id with a
/// default. A matching tag is a no-op.
pub fn reconcile(
    mut books: Vec<Book>,
    stored_tag: Option<&str>,
    build_tag: &str,
    defaults: &[Book],
) -> Reconciled {
    if stored_tag == Some(build_tag) {
        return Reconciled {
            books,
            added: 0,
            tag_updated: false,
        };
    }

    let existing: HashSet<i64> = books.iter().map(|book| book.id).collect();
    let before = books.len();
    books.extend(
        defaults
            .iter()
            .filter(|book| !existing.contains(&book.id))
            .cloned(),
    );
    let added = books.len() - before;

    tracing::info!(
        stored = stored_tag.unwrap_or("<none>"),
        build = build_tag,
        added,
        "reconciled bundled defaults"
    );

    Reconciled {
        books,
        added,
        tag_updated: true,
    }
}
