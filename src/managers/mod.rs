// bookmark-sync state managers
// The reconciliation engine owns the list; the submitter talks to the backend;
// the session ties both to one user's lifecycle.

pub mod mutation_submitter;
pub mod reconciliation_engine;
pub mod sync_session;
