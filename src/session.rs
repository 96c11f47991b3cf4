use crate::identity::Identity;
use crate::puzzle::PuzzleVariant;
use crate::remote::{RemoteMirror, RemoteRef};
use crate::solve::{SolveId, SolveRecord};
use crate::stats::{self, Summary};
use crate::store::{HistoryStore, StoreError};
use chrono::Local;
use std::collections::HashMap;
use std::thread::JoinHandle;

/// Most recent solves kept per puzzle
pub const HISTORY_CAP: usize = 12;

pub fn history_key(variant: PuzzleVariant) -> String {
    format!("solves:{}", variant.key())
}

pub fn best_key(variant: PuzzleVariant) -> String {
    format!("best:{}", variant.key())
}

/// Solve histories and best times per puzzle, plus the collaborators that
/// persist and mirror them.
pub struct SolveSession {
    variant: PuzzleVariant,
    histories: HashMap<PuzzleVariant, Vec<SolveRecord>>,
    best_times: HashMap<PuzzleVariant, SolveRecord>,
    store: Box<dyn HistoryStore>,
    mirror: RemoteMirror,
    identity: Identity,
    remote_refs: HashMap<SolveId, RemoteRef>,
    last_id: Option<SolveId>,
    pending_remote: Vec<JoinHandle<()>>,
}

impl SolveSession {
    pub fn new(
        variant: PuzzleVariant,
        store: Box<dyn HistoryStore>,
        mirror: RemoteMirror,
        identity: Identity,
    ) -> Self {
        let mut session = Self {
            variant,
            histories: HashMap::new(),
            best_times: HashMap::new(),
            store,
            mirror,
            identity,
            remote_refs: HashMap::new(),
            last_id: None,
            pending_remote: Vec::new(),
        };
        session.load_variant(variant);
        session
    }

    pub fn variant(&self) -> PuzzleVariant {
        self.variant
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Make `variant` active, loading its history and best time on first use
    pub fn switch_variant(&mut self, variant: PuzzleVariant) {
        self.load_variant(variant);
        self.variant = variant;
    }

    fn load_variant(&mut self, variant: PuzzleVariant) {
        if self.histories.contains_key(&variant) {
            return;
        }

        let history = match self.read_json::<Vec<SolveRecord>>(&history_key(variant)) {
            Ok(Some(mut history)) => {
                history.truncate(HISTORY_CAP);
                history
            }
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(variant = %variant, error = %err, "could not load history, starting empty");
                Vec::new()
            }
        };

        // a cleared best is stored as `null`
        let stored_best = match self.read_json::<Option<SolveRecord>>(&best_key(variant)) {
            Ok(best) => best.flatten(),
            Err(err) => {
                tracing::warn!(variant = %variant, error = %err, "could not load best time");
                None
            }
        };

        // the best can never be slower than a solve still in the history
        let best = match (stored_best, stats::best_of(&history)) {
            (Some(stored), Some(seen)) if seen.elapsed_millis < stored.elapsed_millis => {
                Some((seen.clone(), true))
            }
            (None, Some(seen)) => Some((seen.clone(), true)),
            (stored, _) => stored.map(|best| (best, false)),
        };

        if let Some(max_id) = history.iter().map(|r| r.id).max() {
            self.last_id = self.last_id.max(Some(max_id));
        }
        tracing::debug!(variant = %variant, solves = history.len(), "history loaded");
        self.histories.insert(variant, history);

        if let Some((best, repaired)) = best {
            self.best_times.insert(variant, best);
            if repaired {
                tracing::info!(variant = %variant, "best time restored from history");
                self.persist_best(variant);
            }
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)
    }

    /// Newest-first history of the active puzzle
    pub fn history(&self) -> &[SolveRecord] {
        self.history_for(self.variant)
    }

    pub fn history_for(&self, variant: PuzzleVariant) -> &[SolveRecord] {
        self.histories
            .get(&variant)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn best(&self) -> Option<&SolveRecord> {
        self.best_for(self.variant)
    }

    pub fn best_for(&self, variant: PuzzleVariant) -> Option<&SolveRecord> {
        self.best_times.get(&variant)
    }

    /// Trimmed Ao-`n` of the active puzzle, in milliseconds
    pub fn average_of(&self, n: usize) -> Option<u64> {
        stats::average_of(self.history(), n)
    }

    pub fn summary(&self) -> Summary {
        Summary::from_history(self.history(), self.best())
    }

    /// Record a finished attempt on the active puzzle.
    ///
    /// The record is prepended to the capped history, the history rewritten to
    /// the store, the best time updated, and a remote copy dispatched. Store and
    /// remote failures are logged and never undo the in-memory update.
    pub fn record_solve(&mut self, elapsed_millis: u64, scramble: String) -> SolveRecord {
        let variant = self.variant;
        let created_at = Local::now();
        let id = SolveId::next_after(created_at, self.last_id);
        self.last_id = Some(id);

        let record = SolveRecord::new(id, elapsed_millis, scramble, variant, created_at);

        let history = self.histories.entry(variant).or_default();
        history.insert(0, record.clone());
        history.truncate(HISTORY_CAP);
        self.persist_history(variant);

        let improved = self
            .best_times
            .get(&variant)
            .map_or(true, |best| record.elapsed_millis < best.elapsed_millis);
        if improved {
            self.best_times.insert(variant, record.clone());
            self.persist_best(variant);
        }

        tracing::info!(
            variant = %variant,
            solve_id = %record.id,
            time = %record.display_time,
            personal_best = improved,
            "solve recorded"
        );

        if let Some(user_id) = self.identity.user_id() {
            if let Some(handle) = self.mirror.mirror(user_id, &record) {
                self.track_remote(handle);
            }
        }

        record
    }

    /// Remove one solve from the active puzzle's history.
    ///
    /// When it held the best time, the best is recomputed from what remains.
    pub fn delete_solve(&mut self, id: SolveId) -> Option<SolveRecord> {
        let variant = self.variant;
        let history = self.histories.get_mut(&variant)?;
        let idx = history.iter().position(|r| r.id == id)?;
        let removed = history.remove(idx);
        self.persist_history(variant);

        if self.best_times.get(&variant).map(|b| b.id) == Some(id) {
            match stats::best_of(self.history_for(variant)).cloned() {
                Some(best) => {
                    self.best_times.insert(variant, best);
                }
                None => {
                    self.best_times.remove(&variant);
                }
            }
            self.persist_best(variant);
        }

        tracing::info!(variant = %variant, solve_id = %id, "solve deleted");

        self.collect_remote_refs();
        if let (Some(remote_ref), Some(user_id)) =
            (self.remote_refs.remove(&id), self.identity.user_id())
        {
            if let Some(handle) = self.mirror.delete(user_id, remote_ref) {
                self.track_remote(handle);
            }
        }

        Some(removed)
    }

    fn persist_history(&mut self, variant: PuzzleVariant) {
        let history = self.histories.get(&variant).cloned().unwrap_or_default();
        if let Err(err) = self.write_json(&history_key(variant), &history) {
            tracing::warn!(variant = %variant, error = %err, "could not persist history");
        }
    }

    fn persist_best(&mut self, variant: PuzzleVariant) {
        let best = self.best_times.get(&variant).cloned();
        if let Err(err) = self.write_json(&best_key(variant), &best) {
            tracing::warn!(variant = %variant, error = %err, "could not persist best time");
        }
    }

    fn track_remote(&mut self, handle: JoinHandle<()>) {
        self.pending_remote.retain(|h| !h.is_finished());
        self.pending_remote.push(handle);
    }

    /// Pick up document references reported by finished remote writes
    pub fn collect_remote_refs(&mut self) {
        for (id, remote_ref) in self.mirror.drain_refs() {
            self.remote_refs.insert(id, remote_ref);
        }
    }

    pub fn remote_ref(&self, id: SolveId) -> Option<&RemoteRef> {
        self.remote_refs.get(&id)
    }

    /// Block until every dispatched remote call has finished.
    ///
    /// Only for shutdown and tests; the timer itself never waits on the remote.
    pub fn wait_for_remote(&mut self) {
        for handle in self.pending_remote.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("remote worker panicked");
            }
        }
        self.collect_remote_refs();
    }
}
