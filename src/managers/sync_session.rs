//! Sync Session for bookmark-sync.
//!
//! Scopes everything tied to one signed-in user: the reconciliation engine,
//! the change subscription task and the poll task. `start` and `stop` are
//! the only lifecycle entry points.
//!
//! Every start bumps a generation counter kept next to the engine. Work that
//! began under an older generation (an in-flight listing, an insert that
//! resolves after sign-out) finds the counter changed and is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::managers::mutation_submitter::MutationSubmitter;
use crate::managers::reconciliation_engine::{ReconciliationEngine, ReconciliationEngineTrait};
use crate::services::remote_service::RemoteDataService;
use crate::types::bookmark::Bookmark;
use crate::types::errors::{DeleteError, SessionError};
use crate::types::event::{SubscriptionMessage, SubscriptionStatus};
use crate::types::settings::SyncSettings;
use crate::types::view::{ListView, LoadState};

struct SessionState {
    generation: u64,
    engine: Option<ReconciliationEngine>,
}

/// State shared between the session handle and its background tasks.
struct Shared {
    state: Mutex<SessionState>,
    status: watch::Sender<SubscriptionStatus>,
    revision: watch::Sender<u64>,
    visible: watch::Sender<bool>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.lock();
        state.generation == generation && state.engine.is_some()
    }

    /// Generation and user of the running session.
    fn active(&self) -> Option<(u64, String)> {
        let state = self.lock();
        state
            .engine
            .as_ref()
            .map(|engine| (state.generation, engine.user_id().to_string()))
    }

    /// Runs `f` against the engine if `generation` is still the running
    /// session, and publishes a new revision when `f` reports a change.
    /// `None` means the session is gone and `f` did not run.
    fn mutate<F>(&self, generation: u64, f: F) -> Option<bool>
    where
        F: FnOnce(&mut ReconciliationEngine) -> bool,
    {
        let changed = {
            let mut state = self.lock();
            if state.generation != generation {
                return None;
            }
            f(state.engine.as_mut()?)
        };
        if changed {
            self.notify();
        }
        Some(changed)
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

struct SessionTasks {
    subscription: JoinHandle<()>,
    poll: JoinHandle<()>,
}

impl SessionTasks {
    fn abort(self) {
        self.subscription.abort();
        self.poll.abort();
    }
}

/// One user's live bookmark list, kept in sync by push and poll.
pub struct SyncSession {
    service: Arc<dyn RemoteDataService>,
    submitter: MutationSubmitter,
    poll_interval: Duration,
    shared: Arc<Shared>,
    tasks: Option<SessionTasks>,
}

impl SyncSession {
    pub fn new(service: Arc<dyn RemoteDataService>, settings: &SyncSettings) -> Self {
        Self::with_poll_interval(service, Duration::from_millis(settings.poll_interval_ms.max(1)))
    }

    pub fn with_poll_interval(service: Arc<dyn RemoteDataService>, poll_interval: Duration) -> Self {
        let (status, _) = watch::channel(SubscriptionStatus::Closed);
        let (revision, _) = watch::channel(0);
        let (visible, _) = watch::channel(true);
        Self {
            submitter: MutationSubmitter::new(service.clone()),
            service,
            poll_interval,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    generation: 0,
                    engine: None,
                }),
                status,
                revision,
                visible,
            }),
            tasks: None,
        }
    }

    /// Starts a session for `user_id`, replacing any running one.
    ///
    /// Subscribes, starts polling, then loads the list. A failed initial load
    /// is returned and shown as the error state; the poll keeps retrying.
    pub async fn start(&mut self, user_id: &str) -> Result<(), SessionError> {
        self.stop();

        let generation = {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.engine = Some(ReconciliationEngine::new(user_id));
            state.generation
        };
        self.shared.status.send_replace(SubscriptionStatus::Connecting);
        self.shared.notify();
        info!(user_id = %user_id, generation, "bookmark session started");

        let subscription = tokio::spawn(run_subscription(
            self.service.clone(),
            self.shared.clone(),
            generation,
            user_id.to_string(),
        ));
        let poll = tokio::spawn(run_poll(
            self.service.clone(),
            self.shared.clone(),
            generation,
            user_id.to_string(),
            self.poll_interval,
            self.shared.visible.subscribe(),
        ));
        self.tasks = Some(SessionTasks { subscription, poll });

        refresh_generation(self.service.as_ref(), &self.shared, generation, user_id).await
    }

    /// Ends the session: cancels the subscription and the poll, and drops
    /// the list. Late results of the old session are discarded.
    pub fn stop(&mut self) {
        let stopped = {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.engine.take()
        };
        if let Some(tasks) = self.tasks.take() {
            tasks.abort();
        }
        if let Some(engine) = stopped {
            self.shared.status.send_replace(SubscriptionStatus::Closed);
            self.shared.notify();
            info!(user_id = %engine.user_id(), "bookmark session stopped");
        }
    }

    /// Reloads the full list. On failure the previous list stays in place.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let (generation, user_id) = self.shared.active().ok_or(SessionError::NotStarted)?;
        refresh_generation(self.service.as_ref(), &self.shared, generation, &user_id).await
    }

    /// Pauses polling while hidden. Becoming visible refreshes once and
    /// resumes the poll. The subscription is unaffected.
    pub async fn set_visible(&self, visible: bool) {
        let was_visible = self.shared.visible.send_replace(visible);
        if visible == was_visible {
            return;
        }
        debug!(visible, "view visibility changed");
        if visible && self.is_active() {
            if let Err(e) = self.refresh().await {
                debug!(error = %e, "refresh on becoming visible failed");
            }
        }
    }

    /// Inserts remotely, then shows the persisted record at the top.
    pub async fn add_bookmark(&self, title: &str, url: &str) -> Result<Bookmark, SessionError> {
        let (generation, user_id) = self.shared.active().ok_or(SessionError::NotStarted)?;
        let record = self.submitter.submit_insert(&user_id, title, url).await?;

        let inserted = record.clone();
        if self
            .shared
            .mutate(generation, move |engine| engine.apply_optimistic_insert(inserted))
            .is_none()
        {
            debug!(id = %record.id, "session ended before insert resolved");
        }
        Ok(record)
    }

    /// Removes `id` at once, then deletes remotely; restores it if the
    /// delete fails.
    pub async fn delete_bookmark(&self, id: &str) -> Result<(), SessionError> {
        let (generation, user_id) = self.shared.active().ok_or(SessionError::NotStarted)?;
        self.shared.mutate(generation, |engine| {
            engine.apply_optimistic_delete(id).is_some()
        });

        match self.submitter.submit_delete(id, &user_id).await {
            Ok(()) | Err(DeleteError::NotFound(_)) => {
                self.shared.mutate(generation, |engine| {
                    engine.confirm_delete(id);
                    false
                });
                Ok(())
            }
            Err(e) => {
                let restored = self
                    .shared
                    .mutate(generation, |engine| engine.rollback_delete_of(id));
                debug!(id = %id, restored = ?restored, "rolled back optimistic delete");
                Err(e.into())
            }
        }
    }

    /// Current list, newest first (optimistic entries may lead).
    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.shared
            .lock()
            .engine
            .as_ref()
            .map(|engine| engine.bookmarks().to_vec())
            .unwrap_or_default()
    }

    pub fn list_view(&self) -> Option<ListView> {
        self.shared.lock().engine.as_ref().map(|engine| engine.list_view())
    }

    pub fn load_state(&self) -> Option<LoadState> {
        self.shared
            .lock()
            .engine
            .as_ref()
            .map(|engine| engine.load_state().clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.shared.active().map(|(_, user_id)| user_id)
    }

    pub fn is_active(&self) -> bool {
        self.shared.lock().engine.is_some()
    }

    pub fn is_visible(&self) -> bool {
        *self.shared.visible.borrow()
    }

    pub fn subscription_status(&self) -> SubscriptionStatus {
        *self.shared.status.borrow()
    }

    pub fn status_updates(&self) -> watch::Receiver<SubscriptionStatus> {
        self.shared.status.subscribe()
    }

    /// Receiver bumped after every change to the list or its load state.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        if let Some(tasks) = self.tasks.take() {
            tasks.abort();
        }
    }
}

async fn refresh_generation(
    service: &dyn RemoteDataService,
    shared: &Shared,
    generation: u64,
    user_id: &str,
) -> Result<(), SessionError> {
    let ticket = {
        let state = shared.lock();
        match state.engine.as_ref() {
            Some(engine) if state.generation == generation => engine.listing_ticket(),
            _ => return Ok(()),
        }
    };
    let result = service.list(user_id).await;

    let applied = {
        let mut guard = shared.lock();
        let state = &mut *guard;
        if state.generation != generation {
            None
        } else {
            state.engine.as_mut().map(|engine| match result {
                Ok(records) => {
                    engine.replace_listing(records, ticket);
                    Ok(())
                }
                Err(e) => {
                    engine.record_load_failure(&e);
                    Err(e)
                }
            })
        }
    };

    match applied {
        None => {
            debug!(user_id = %user_id, generation, "discarded listing of a stopped session");
            Ok(())
        }
        Some(Ok(())) => {
            shared.notify();
            Ok(())
        }
        Some(Err(e)) => {
            warn!(user_id = %user_id, error = %e, "error loading bookmarks");
            shared.notify();
            Err(e.into())
        }
    }
}

async fn run_subscription(
    service: Arc<dyn RemoteDataService>,
    shared: Arc<Shared>,
    generation: u64,
    user_id: String,
) {
    let mut subscription = service.subscribe(&user_id).await;

    while let Some(message) = subscription.recv().await {
        match message {
            SubscriptionMessage::Status(status) => {
                if !shared.is_current(generation) {
                    break;
                }
                match status {
                    SubscriptionStatus::Connected => info!(user_id = %user_id, "realtime connected for bookmarks"),
                    SubscriptionStatus::Error => error!(user_id = %user_id, "realtime channel error"),
                    SubscriptionStatus::TimedOut => error!(user_id = %user_id, "realtime subscription timed out"),
                    SubscriptionStatus::Closed => warn!(user_id = %user_id, "realtime channel closed"),
                    SubscriptionStatus::Connecting => debug!(user_id = %user_id, "realtime connecting"),
                }
                shared.status.send_replace(status);
            }
            SubscriptionMessage::Event(event) => {
                if shared
                    .mutate(generation, |engine| engine.apply_remote_event(&event))
                    .is_none()
                {
                    break;
                }
            }
        }
    }
    debug!(user_id = %user_id, generation, "subscription task finished");
}

async fn run_poll(
    service: Arc<dyn RemoteDataService>,
    shared: Arc<Shared>,
    generation: u64,
    user_id: String,
    period: Duration,
    mut visible: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes at once; the initial load is done by `start`.
    ticker.tick().await;

    loop {
        if !*visible.borrow_and_update() {
            debug!(user_id = %user_id, "poll paused while hidden");
            let resumed = visible.wait_for(|v| *v).await.map(|_| ());
            if resumed.is_err() {
                return;
            }
            ticker.reset();
            continue;
        }

        tokio::select! {
            _ = ticker.tick() => {
                if !shared.is_current(generation) {
                    return;
                }
                // Failures are logged inside and retried on the next tick.
                let _ = refresh_generation(service.as_ref(), &shared, generation, &user_id).await;
            }
            changed = visible.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}
