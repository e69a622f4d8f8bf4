//! Client query cache
//!
//! Holds the last fetched project snapshot and the note threads the view has
//! opened. Incoming events never patch this data; they only mark it stale, and
//! the [`Refresher`] replaces stale entries with a fresh fetch.
//!
//! Staleness is tracked by epoch: an invalidation that lands while a fetch is
//! in flight bumps the epoch, so the fetched data is stored but stays stale.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use snotes_common::models::{Cell, Note, ProjectSnapshot};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api_client::ApiClient;
use crate::error::{Result, SyncError};

#[derive(Debug, Default)]
struct NoteThread {
    notes: Vec<Note>,
    epoch: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<ProjectSnapshot>,
    /// Epoch the stored snapshot was fetched at
    snapshot_epoch: Option<u64>,
    project_epoch: u64,
    threads: HashMap<Uuid, NoteThread>,
    /// Cells whose thread was requested but never fetched
    wanted_threads: Vec<Uuid>,
    notes_epoch: u64,
}

/// Cached state of one project view
pub struct ProjectCache {
    project_id: Uuid,
    state: Mutex<CacheState>,
    /// Bumped on every invalidation
    invalidations: watch::Sender<u64>,
}

impl ProjectCache {
    pub fn new(project_id: Uuid) -> Self {
        let (invalidations, _) = watch::channel(0);
        Self {
            project_id,
            state: Mutex::new(CacheState::default()),
            invalidations,
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn signal(&self) {
        self.invalidations.send_modify(|count| *count += 1);
    }

    /// Receiver that changes whenever something is invalidated
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.invalidations.subscribe()
    }

    /// Total invalidations so far
    pub fn invalidation_count(&self) -> u64 {
        *self.invalidations.borrow()
    }

    // -------------------------------------------------------------------------
    // Project snapshot
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> Option<ProjectSnapshot> {
        self.lock().snapshot.clone()
    }

    /// Whether the snapshot must be (re)fetched
    pub fn is_project_stale(&self) -> bool {
        let state = self.lock();
        state.snapshot_epoch != Some(state.project_epoch)
    }

    /// Epoch to pass back to [`ProjectCache::store_snapshot`] after fetching
    pub fn project_epoch(&self) -> u64 {
        self.lock().project_epoch
    }

    /// Install a snapshot fetched at `epoch`
    pub fn store_snapshot(&self, snapshot: ProjectSnapshot, epoch: u64) {
        let mut state = self.lock();
        state.snapshot = Some(snapshot);
        state.snapshot_epoch = Some(epoch);
    }

    /// Mark the snapshot stale
    pub fn invalidate_project(&self) {
        self.lock().project_epoch += 1;
        debug!("Project {} snapshot invalidated", self.project_id);
        self.signal();
    }

    // -------------------------------------------------------------------------
    // Note threads
    // -------------------------------------------------------------------------

    /// Cached notes of a cell, if that thread was ever fetched
    pub fn notes(&self, cell_id: Uuid) -> Option<Vec<Note>> {
        self.lock().threads.get(&cell_id).map(|t| t.notes.clone())
    }

    /// Ask for a cell's thread to be fetched on the next refresh
    pub fn watch_notes(&self, cell_id: Uuid) {
        let mut state = self.lock();
        if !state.threads.contains_key(&cell_id) && !state.wanted_threads.contains(&cell_id) {
            state.wanted_threads.push(cell_id);
            drop(state);
            self.signal();
        }
    }

    pub fn notes_epoch(&self) -> u64 {
        self.lock().notes_epoch
    }

    pub fn store_notes(&self, cell_id: Uuid, notes: Vec<Note>, epoch: u64) {
        let mut state = self.lock();
        state.wanted_threads.retain(|id| *id != cell_id);
        state.threads.insert(cell_id, NoteThread { notes, epoch });
    }

    /// Whether a cached thread must be refetched
    pub fn is_notes_stale(&self, cell_id: Uuid) -> bool {
        let state = self.lock();
        match state.threads.get(&cell_id) {
            Some(thread) => thread.epoch != state.notes_epoch,
            None => state.wanted_threads.contains(&cell_id),
        }
    }

    /// Threads needing a fetch
    pub fn stale_note_cells(&self) -> Vec<Uuid> {
        let state = self.lock();
        let mut cells: Vec<Uuid> = state
            .threads
            .iter()
            .filter(|(_, thread)| thread.epoch != state.notes_epoch)
            .map(|(id, _)| *id)
            .collect();
        cells.extend(state.wanted_threads.iter().copied());
        cells
    }

    /// Stop tracking a cell's thread, e.g. after the cell was deleted
    pub fn forget_notes(&self, cell_id: Uuid) {
        let mut state = self.lock();
        state.threads.remove(&cell_id);
        state.wanted_threads.retain(|id| *id != cell_id);
    }

    /// Mark every cached thread stale
    pub fn invalidate_notes(&self) {
        self.lock().notes_epoch += 1;
        debug!("Project {} note threads invalidated", self.project_id);
        self.signal();
    }

    // -------------------------------------------------------------------------
    // Optimistic cell updates
    // -------------------------------------------------------------------------

    /// Flip a cached cell before the server confirms
    ///
    /// Returns the cell as it was, for rollback, or `None` when the cell is
    /// not in the cached snapshot.
    pub fn apply_toggle(&self, cell_id: Uuid, is_complete: bool) -> Option<Cell> {
        let mut state = self.lock();
        let cell = state.snapshot.as_mut()?.cell_mut(cell_id)?;
        let previous = cell.clone();

        cell.is_complete = is_complete;
        if !is_complete {
            cell.completed_by = None;
            cell.completed_at = None;
        }
        Some(previous)
    }

    /// Overwrite a cached cell with the given value
    pub fn replace_cell(&self, cell: Cell) {
        let mut state = self.lock();
        if let Some(cached) = state.snapshot.as_mut().and_then(|s| s.cell_mut(cell.id)) {
            *cached = cell;
        }
    }
}

/// Refetches stale cache entries through the API
pub struct Refresher {
    api: ApiClient,
    cache: Arc<ProjectCache>,
}

impl Refresher {
    pub fn new(api: ApiClient, cache: Arc<ProjectCache>) -> Self {
        Self { api, cache }
    }

    /// Fetch everything currently stale
    ///
    /// Returns the number of entries refetched. A failed snapshot fetch is
    /// returned as the error; a failed thread is logged and the remaining
    /// threads are still fetched. Threads whose cell is gone or no longer
    /// readable (404, 403) are dropped from the cache.
    pub async fn refresh(&self) -> Result<usize> {
        let mut fetched = 0;

        if self.cache.is_project_stale() {
            let epoch = self.cache.project_epoch();
            let snapshot = self.api.get_project(self.cache.project_id()).await?;
            self.cache.store_snapshot(snapshot, epoch);
            fetched += 1;
        }

        for cell_id in self.cache.stale_note_cells() {
            let epoch = self.cache.notes_epoch();
            match self.api.list_notes(cell_id).await {
                Ok(notes) => {
                    self.cache.store_notes(cell_id, notes, epoch);
                    fetched += 1;
                }
                Err(SyncError::Api { status: 403 | 404, .. }) => {
                    debug!("Dropping note thread of unreachable cell {}", cell_id);
                    self.cache.forget_notes(cell_id);
                }
                Err(e) => warn!("Refresh of notes for cell {} failed: {}", cell_id, e),
            }
        }

        if fetched > 0 {
            debug!("Refreshed {} entries of project {}", fetched, self.cache.project_id());
        }
        Ok(fetched)
    }

    /// Refresh on every invalidation until cancelled
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let mut invalidations = self.cache.subscribe();
        tokio::spawn(async move {
            loop {
                if let Err(e) = self.refresh().await {
                    warn!("Refresh of project {} failed: {}", self.cache.project_id(), e);
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = invalidations.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }
}
