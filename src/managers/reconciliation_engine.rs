//! Reconciliation Engine for bookmark-sync.
//!
//! Owns the in-memory bookmark list of one user session. Three writers feed
//! it: full listings (initial load and poll), optimistic local mutations, and
//! remote change events. All of them merge by `id`, so the arrival order of a
//! record across channels never produces duplicates.

use tracing::debug;

use crate::types::bookmark::Bookmark;
use crate::types::errors::LoadError;
use crate::types::event::ChangeEvent;
use crate::types::view::{ListView, LoadState};

/// Trait defining the reconciliation operations.
pub trait ReconciliationEngineTrait {
    fn listing_ticket(&self) -> u64;
    fn replace_listing(&mut self, records: Vec<Bookmark>, ticket: u64);
    fn replace_all(&mut self, records: Vec<Bookmark>);
    fn record_load_failure(&mut self, error: &LoadError);
    fn apply_optimistic_insert(&mut self, record: Bookmark) -> bool;
    fn apply_remote_event(&mut self, event: &ChangeEvent) -> bool;
    fn apply_optimistic_delete(&mut self, id: &str) -> Option<Bookmark>;
    fn confirm_delete(&mut self, id: &str);
    fn rollback_delete(&mut self) -> bool;
    fn rollback_delete_of(&mut self, id: &str) -> bool;
    fn bookmarks(&self) -> &[Bookmark];
    fn contains(&self, id: &str) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
}

/// Single-writer list container for one user.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    user_id: String,
    bookmarks: Vec<Bookmark>,
    /// Records removed optimistically whose delete is still in flight,
    /// most recent last.
    pending_deletes: Vec<Bookmark>,
    /// Ids inserted after some listing may have been requested, tagged with
    /// the insert sequence number. A listing older than the tag keeps them.
    recent_inserts: Vec<(String, u64)>,
    insert_seq: u64,
    load_state: LoadState,
}

impl ReconciliationEngine {
    /// Creates an empty engine for `user_id` in the `Loading` state.
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            bookmarks: Vec::new(),
            pending_deletes: Vec::new(),
            recent_inserts: Vec::new(),
            insert_seq: 0,
            load_state: LoadState::Loading,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// What the list area should render right now.
    pub fn list_view(&self) -> ListView {
        ListView::new(&self.load_state, &self.bookmarks)
    }

    /// Whether a delete of `id` is awaiting confirmation.
    pub fn has_pending_delete(&self, id: &str) -> bool {
        self.pending_deletes.iter().any(|b| b.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.bookmarks.iter().position(|b| b.id == id)
    }

    /// Whether `id` was inserted after the listing behind `ticket` was requested.
    pub fn inserted_after(&self, id: &str, ticket: u64) -> bool {
        self.recent_inserts
            .iter()
            .any(|(recent, seq)| recent == id && *seq > ticket)
    }

    fn prepend(&mut self, record: Bookmark) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        self.insert_seq += 1;
        self.recent_inserts.retain(|(id, _)| id != &record.id);
        self.recent_inserts.push((record.id.clone(), self.insert_seq));
        self.bookmarks.insert(0, record);
        true
    }

    fn forget_insert(&mut self, id: &str) {
        self.recent_inserts.retain(|(recent, _)| recent != id);
    }

    /// Inserts before the first strictly older entry.
    fn insert_sorted(&mut self, record: Bookmark) {
        let index = self
            .bookmarks
            .iter()
            .position(|b| b.created_at < record.created_at)
            .unwrap_or(self.bookmarks.len());
        self.bookmarks.insert(index, record);
    }
}

impl ReconciliationEngineTrait for ReconciliationEngine {
    /// Taken when a listing is requested and handed back to `replace_listing`.
    fn listing_ticket(&self) -> u64 {
        self.insert_seq
    }

    /// Replaces the list with a listing requested at `ticket`.
    ///
    /// The result is sorted newest first, keeps only this user's rows and the
    /// first copy of each id, and holds back rows whose delete is in flight.
    /// Rows inserted after the request keep their place even when the
    /// listing predates them.
    fn replace_listing(&mut self, mut records: Vec<Bookmark>, ticket: u64) {
        records.sort_by(Bookmark::newest_first);

        let mut next: Vec<Bookmark> = Vec::with_capacity(records.len());
        for record in records {
            if record.user_id != self.user_id
                || self.has_pending_delete(&record.id)
                || next.iter().any(|b| b.id == record.id)
            {
                continue;
            }
            next.push(record);
        }

        // Listed ids are confirmed, and an unlisted id older than the
        // request was deleted remotely. Only younger unlisted ids survive.
        self.recent_inserts
            .retain(|(id, seq)| *seq > ticket && !next.iter().any(|b| &b.id == id));

        let mut kept_newer = false;
        for b in &self.bookmarks {
            if self.inserted_after(&b.id, ticket) && !self.has_pending_delete(&b.id) {
                debug!(id = %b.id, ticket, "kept row inserted after the listing was requested");
                next.push(b.clone());
                kept_newer = true;
            }
        }
        if kept_newer {
            next.sort_by(Bookmark::newest_first);
        }

        self.bookmarks = next;
        self.load_state = LoadState::Ready;
    }

    /// Replaces the list with a listing requested just now.
    fn replace_all(&mut self, records: Vec<Bookmark>) {
        let ticket = self.listing_ticket();
        self.replace_listing(records, ticket);
    }

    /// Only a failed initial load changes what the user sees; a failed
    /// refresh keeps the last good list.
    fn record_load_failure(&mut self, error: &LoadError) {
        match self.load_state {
            LoadState::Loading | LoadState::Failed(_) => {
                self.load_state = LoadState::Failed(error.to_string());
            }
            LoadState::Ready => {}
        }
    }

    /// Prepends a record confirmed by the submitter. No-op if the id is present.
    fn apply_optimistic_insert(&mut self, record: Bookmark) -> bool {
        if record.user_id != self.user_id {
            debug!(id = %record.id, "optimistic insert for another user ignored");
            return false;
        }
        self.prepend(record)
    }

    fn apply_remote_event(&mut self, event: &ChangeEvent) -> bool {
        if event.user_id() != self.user_id {
            return false;
        }

        match event {
            ChangeEvent::Insert { record } => {
                if self.has_pending_delete(&record.id) {
                    debug!(id = %record.id, "insert event for a row being deleted ignored");
                    return false;
                }
                self.prepend(record.clone())
            }
            ChangeEvent::Update { record } => {
                if let Some(buffered) = self.pending_deletes.iter_mut().find(|b| b.id == record.id) {
                    *buffered = record.clone();
                }
                match self.position(&record.id) {
                    Some(index) if self.bookmarks[index] != *record => {
                        self.bookmarks[index] = record.clone();
                        true
                    }
                    _ => false,
                }
            }
            ChangeEvent::Delete { id, .. } => {
                // Deleted remotely: a failing local delete must not resurrect it.
                self.pending_deletes.retain(|b| &b.id != id);
                self.forget_insert(id);
                match self.position(id) {
                    Some(index) => {
                        self.bookmarks.remove(index);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Removes `id` immediately and buffers it for rollback.
    fn apply_optimistic_delete(&mut self, id: &str) -> Option<Bookmark> {
        let index = self.position(id)?;
        let removed = self.bookmarks.remove(index);
        self.forget_insert(id);
        self.pending_deletes.retain(|b| b.id != id);
        self.pending_deletes.push(removed.clone());
        Some(removed)
    }

    fn confirm_delete(&mut self, id: &str) {
        self.pending_deletes.retain(|b| b.id != id);
    }

    /// Rolls back the most recent optimistic delete.
    fn rollback_delete(&mut self) -> bool {
        match self.pending_deletes.last() {
            Some(last) => {
                let id = last.id.clone();
                self.rollback_delete_of(&id)
            }
            None => false,
        }
    }

    /// Restores the buffered record at its `created_at` position. Returns
    /// false if nothing was buffered or the record already reappeared.
    fn rollback_delete_of(&mut self, id: &str) -> bool {
        let Some(index) = self.pending_deletes.iter().position(|b| b.id == id) else {
            return false;
        };
        let record = self.pending_deletes.remove(index);
        if self.contains(&record.id) {
            return false;
        }
        self.insert_sorted(record);
        true
    }

    fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn len(&self) -> usize {
        self.bookmarks.len()
    }

    fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}
