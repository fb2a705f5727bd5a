//! Local remote-data-service backed by SQLite.
//!
//! Every session sharing one `SqliteDataService` sees the others' writes
//! through a broadcast change feed, the way browser tabs share one backend.
//! Processes sharing only the database file converge through polling.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, OptionalExtension};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::connection::Database;
use crate::services::remote_service::{RemoteDataService, Subscription};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{BookmarkError, DeleteError, InsertError, LoadError};
use crate::types::event::{ChangeEvent, SubscriptionMessage, SubscriptionStatus};

const CHANGE_FEED_CAPACITY: usize = 256;
const DEFAULT_SUBSCRIPTION_BUFFER: usize = 64;

/// Remote data service over a local SQLite database.
pub struct SqliteDataService {
    db: Mutex<Database>,
    changes: broadcast::Sender<ChangeEvent>,
    subscription_buffer: usize,
}

impl SqliteDataService {
    pub fn new(db: Database) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            db: Mutex::new(db),
            changes,
            subscription_buffer: DEFAULT_SUBSCRIPTION_BUFFER,
        }
    }

    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Sets the capacity of each subscriber's channel.
    pub fn with_subscription_buffer(mut self, buffer: usize) -> Self {
        self.subscription_buffer = buffer.max(1);
        self
    }

    /// Number of live subscription forwarders.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    /// Changes the title and/or url of an existing bookmark and broadcasts
    /// an update event.
    pub fn update(
        &self,
        id: &str,
        user_id: &str,
        url: Option<&str>,
        title: Option<&str>,
    ) -> Result<Bookmark, BookmarkError> {
        let updated = {
            let db = self.lock();
            let conn = db.connection();
            let affected = conn
                .execute(
                    "UPDATE bookmarks SET url = COALESCE(?1, url), title = COALESCE(?2, title) \
                     WHERE id = ?3 AND user_id = ?4",
                    params![url, title, id, user_id],
                )
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
            if affected == 0 {
                return Err(BookmarkError::NotFound(id.to_string()));
            }
            Self::fetch(&db, id)?.ok_or_else(|| BookmarkError::NotFound(id.to_string()))?
        };

        self.publish(ChangeEvent::Update {
            record: updated.clone(),
        });
        Ok(updated)
    }

    /// Writes a record exactly as given, without broadcasting. Used to import
    /// existing bookmarks; sessions pick them up on their next poll.
    pub fn restore(&self, bookmark: &Bookmark) -> Result<(), BookmarkError> {
        let db = self.lock();
        db.connection()
            .execute(
                "INSERT OR REPLACE INTO bookmarks (id, user_id, url, title, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    bookmark.id,
                    bookmark.user_id,
                    bookmark.url,
                    bookmark.title,
                    bookmark.created_at.timestamp_millis()
                ],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: ChangeEvent) {
        // No subscribers is not an error.
        if self.changes.send(event).is_err() {
            debug!("change event dropped: no subscribers");
        }
    }

    fn fetch(db: &Database, id: &str) -> Result<Option<Bookmark>, BookmarkError> {
        db.connection()
            .query_row(
                "SELECT id, user_id, url, title, created_at FROM bookmarks WHERE id = ?1",
                params![id],
                Self::row_to_bookmark,
            )
            .optional()
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))
    }

    /// Next creation timestamp: now, but strictly after every stored row so
    /// ordering by `created_at` is total.
    fn next_created_at(db: &Database) -> Result<DateTime<Utc>, rusqlite::Error> {
        let latest: Option<i64> =
            db.connection()
                .query_row("SELECT MAX(created_at) FROM bookmarks", [], |row| row.get(0))?;
        let now = Utc::now().timestamp_millis();
        let millis = match latest {
            Some(latest) if latest >= now => latest + 1,
            _ => now,
        };
        millis_to_datetime(millis)
    }

    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            user_id: row.get(1)?,
            url: row.get(2)?,
            title: row.get(3)?,
            created_at: millis_to_datetime(row.get(4)?)?,
        })
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, rusqlite::Error> {
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Integer,
            format!("timestamp out of range: {}", millis).into(),
        )
    })
}

#[async_trait]
impl RemoteDataService for SqliteDataService {
    async fn list(&self, user_id: &str) -> Result<Vec<Bookmark>, LoadError> {
        let db = self.lock();
        let mut stmt = db
            .connection()
            .prepare(
                "SELECT id, user_id, url, title, created_at FROM bookmarks \
                 WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| LoadError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id], Self::row_to_bookmark)
            .map_err(|e| LoadError::Backend(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| LoadError::Decode(e.to_string()))?);
        }
        Ok(results)
    }

    async fn insert(&self, user_id: &str, title: &str, url: &str) -> Result<Bookmark, InsertError> {
        let bookmark = {
            let db = self.lock();
            let created_at =
                Self::next_created_at(&db).map_err(|e| InsertError::Backend(e.to_string()))?;
            let bookmark = Bookmark {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                url: url.to_string(),
                title: title.to_string(),
                created_at,
            };
            db.connection()
                .execute(
                    "INSERT INTO bookmarks (id, user_id, url, title, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        bookmark.id,
                        bookmark.user_id,
                        bookmark.url,
                        bookmark.title,
                        bookmark.created_at.timestamp_millis()
                    ],
                )
                .map_err(|e| InsertError::Backend(e.to_string()))?;
            bookmark
        };

        self.publish(ChangeEvent::Insert {
            record: bookmark.clone(),
        });
        Ok(bookmark)
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), DeleteError> {
        let affected = {
            let db = self.lock();
            db.connection()
                .execute(
                    "DELETE FROM bookmarks WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )
                .map_err(|e| DeleteError::Backend(e.to_string()))?
        };

        if affected == 0 {
            return Err(DeleteError::NotFound(id.to_string()));
        }

        self.publish(ChangeEvent::Delete {
            id: id.to_string(),
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    /// Forwards the whole change feed; rows of other users are not filtered
    /// here.
    async fn subscribe(&self, user_id: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.subscription_buffer);
        let mut feed = self.changes.subscribe();
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            for status in [SubscriptionStatus::Connecting, SubscriptionStatus::Connected] {
                if tx.send(SubscriptionMessage::Status(status)).await.is_err() {
                    return;
                }
            }

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    received = feed.recv() => match received {
                        Ok(event) => {
                            if tx.send(SubscriptionMessage::Event(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(user_id = %user_id, skipped, "change feed lagged, events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            let _ = tx
                                .send(SubscriptionMessage::Status(SubscriptionStatus::Closed))
                                .await;
                            break;
                        }
                    },
                }
            }
            debug!(user_id = %user_id, "subscription forwarder stopped");
        });

        rx
    }
}
