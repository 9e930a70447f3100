//! The single owner of the working set for the lifetime of a session.
//!
//! Reads go through the query engine; every mutation ends in [`CatalogSession::commit`],
//! which mirrors the whole working set to the cache once the session is loaded.

use std::time::Duration;

use time::OffsetDateTime;

use super::cache::CatalogCache;
use super::defaults::{default_books, DATA_VERSION};
use super::error::CatalogError;
use super::ids::IdGenerator;
use super::models::{
    Book, BookRequest, ExportDocument, NewBookForm, NewRequestForm, WorkingSet,
};
use super::notice::NoticeBoard;
use super::query::{self, CatalogQuery};
use crate::utils;

pub struct CatalogSession {
    working_set: WorkingSet,
    loaded: bool,
    cache: CatalogCache,
    ids: IdGenerator,
    notices: NoticeBoard,
}

impl CatalogSession {
    /// An empty, not-yet-loaded session. Nothing is persisted until [`install`](Self::install).
    pub fn new(cache: CatalogCache, notice_ttl: Duration) -> Self {
        Self {
            working_set: WorkingSet::default(),
            loaded: false,
            cache,
            ids: IdGenerator::new(),
            notices: NoticeBoard::new(notice_ttl),
        }
    }

    /// Replace the working set with a freshly loaded one and mark the session loaded.
    pub fn install(&mut self, working_set: WorkingSet) -> Result<(), CatalogError> {
        tracing::info!(
            books = working_set.books.len(),
            requests = working_set.requests.len(),
            "working set installed"
        );
        self.working_set = working_set;
        self.loaded = true;
        self.commit()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn books(&self) -> &[Book] {
        &self.working_set.books
    }

    pub fn requests(&self) -> &[BookRequest] {
        &self.working_set.requests
    }

    pub fn book(&self, id: i64) -> Option<&Book> {
        self.working_set.books.iter().find(|book| book.id == id)
    }

    pub fn list(&self, query: &CatalogQuery) -> Vec<&Book> {
        query.run(&self.working_set.books)
    }

    pub fn featured(&self) -> Vec<&Book> {
        query::featured(&self.working_set.books)
    }

    pub fn notice(&self) -> Option<&str> {
        self.notices.current()
    }

    pub fn post_notice(&mut self, message: impl Into<String>) {
        self.notices.post(message);
    }

    /// Append a new book with a fresh id and the default status.
    pub fn add_book(&mut self, form: NewBookForm) -> Result<Book, CatalogError> {
        let previous = self.working_set.clone();
        let books = &self.working_set.books;
        let id = self.ids.next_id(utils::unix_millis(OffsetDateTime::now_utc()), |id| {
            books.iter().any(|book| book.id == id)
        });
        let book = Book::from_form(id, form);
        self.working_set.books.push(book.clone());

        self.commit_or_restore(previous)?;
        tracing::info!(id, title = %book.title, "book added");
        self.notices.post("New book added");
        Ok(book)
    }

    /// Replace the editable fields of book `id` in place.
    pub fn update_book(&mut self, id: i64, form: NewBookForm) -> Result<Book, CatalogError> {
        let previous = self.working_set.clone();
        let book = self
            .working_set
            .books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or(CatalogError::BookNotFound(id))?;
        book.apply(form);
        let updated = book.clone();

        self.commit_or_restore(previous)?;
        tracing::info!(id, "book updated");
        self.notices.post("Book details updated");
        Ok(updated)
    }

    /// Remove book `id`. Returns whether anything was removed; absent ids are not an error
    /// and change nothing.
    pub fn delete_book(&mut self, id: i64) -> Result<bool, CatalogError> {
        let Some(index) = self.working_set.books.iter().position(|book| book.id == id) else {
            tracing::debug!(id, "no such book to delete");
            return Ok(false);
        };
        let previous = self.working_set.clone();
        self.working_set.books.remove(index);

        self.commit_or_restore(previous)?;
        tracing::info!(id, "book deleted");
        self.notices.post("Book deleted");
        Ok(true)
    }

    /// Record a patron request, stamped with today's date.
    pub fn add_request(&mut self, form: NewRequestForm) -> Result<BookRequest, CatalogError> {
        let previous = self.working_set.clone();
        let now = OffsetDateTime::now_utc();
        let requests = &self.working_set.requests;
        let id = self.ids.next_id(utils::unix_millis(now), |id| {
            requests.iter().any(|request| request.id == id)
        });
        let request = BookRequest {
            id,
            title: form.title,
            author: form.author,
            requester: form.requester,
            date: utils::request_date(now),
        };
        self.working_set.requests.push(request.clone());

        self.commit_or_restore(previous)?;
        tracing::info!(id, requester = %request.requester, "book request received");
        self.notices.post("Book request received");
        Ok(request)
    }

    pub fn delete_request(&mut self, id: i64) -> Result<bool, CatalogError> {
        let Some(index) = self
            .working_set
            .requests
            .iter()
            .position(|request| request.id == id)
        else {
            tracing::debug!(id, "no such request to remove");
            return Ok(false);
        };
        let previous = self.working_set.clone();
        self.working_set.requests.remove(index);

        self.commit_or_restore(previous)?;
        tracing::info!(id, "book request removed");
        self.notices.post("Request removed");
        Ok(true)
    }

    /// A book form prefilled from request `id`, ready for an admin to complete and add.
    pub fn fulfill_request(&self, id: i64) -> Result<NewBookForm, CatalogError> {
        let request = self
            .working_set
            .requests
            .iter()
            .find(|request| request.id == id)
            .ok_or(CatalogError::RequestNotFound(id))?;

        Ok(NewBookForm {
            title: request.title.clone(),
            author: request.author.clone(),
            ..NewBookForm::default()
        })
    }

    /// Restore the factory book list; requests are kept.
    ///
    /// The version tag is stamped so the next load does not reconcile again. It goes
    /// first: if the books then fail to persist, the old tag is put back.
    pub fn reset_catalog(&mut self) -> Result<(), CatalogError> {
        let previous_tag = if self.loaded { self.cache.version_tag()? } else { None };
        if self.loaded {
            self.cache.write_version_tag(DATA_VERSION)?;
        }

        let previous = self.working_set.clone();
        self.working_set.books = default_books();
        if let Err(e) = self.commit_or_restore(previous) {
            self.restore_version_tag(previous_tag.as_deref());
            return Err(e);
        }

        tracing::warn!(
            requests = self.working_set.requests.len(),
            "catalog reset to bundled defaults"
        );
        self.notices.post("Database reset to defaults");
        Ok(())
    }

    /// Snapshot of the working set for download.
    pub fn export(&self) -> ExportDocument {
        ExportDocument {
            books: self.working_set.books.clone(),
            requests: self.working_set.requests.clone(),
            export_date: utils::rfc3339(OffsetDateTime::now_utc()),
        }
    }

    /// Mirror the working set to the cache. Before the initial load this is a no-op so
    /// an empty pre-load state can never overwrite a good cache.
    pub fn commit(&self) -> Result<(), CatalogError> {
        if !self.loaded {
            tracing::debug!("session not loaded; skipping persist");
            return Ok(());
        }
        self.cache.persist(&self.working_set).map_err(|e| {
            tracing::error!(error = %e, "failed to persist working set");
            e
        })
    }

    /// Commit, or put `previous` back so memory never runs ahead of the cache.
    fn commit_or_restore(&mut self, previous: WorkingSet) -> Result<(), CatalogError> {
        self.commit().map_err(|e| {
            tracing::warn!("mutation rolled back");
            self.working_set = previous;
            e
        })
    }

    fn restore_version_tag(&self, tag: Option<&str>) {
        let restored = match tag {
            Some(tag) => self.cache.write_version_tag(tag),
            None => self.cache.clear_version_tag(),
        };
        if let Err(e) = restored {
            tracing::error!(error = %e, "failed to restore version tag after rollback");
        }
    }
}
