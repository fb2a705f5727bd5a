//! Local SQLite storage behind [`crate::services::sqlite_service::SqliteDataService`].
//!
//! # Usage
//!
//! ```no_run
//! use bookmark_sync::database::Database;
//!
//! let db = Database::open("bookmarks.db").expect("failed to open database");
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
