//! Transactional persistence collaborator and its in-memory implementation.
//!
//! A step reads and writes a campaign through one [`StoreTransaction`]. Nothing
//! written inside the transaction is visible until [`StoreTransaction::commit`]
//! succeeds; dropping an uncommitted transaction discards every staged write.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::SimulationEvent;
use crate::state::{CampaignId, CampaignState, Kpis};

/// KPI history row written once per committed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub campaign_id: CampaignId,
    pub step: u64,
    pub kpis: Kpis,
}

/// Storage backend able to open per-campaign transactions.
pub trait CampaignStore {
    type Error: std::error::Error + Send + Sync + 'static;
    type Transaction<'a>: StoreTransaction<Error = Self::Error>
    where
        Self: 'a;

    /// Open a transaction holding exclusive access to `campaign_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start a transaction.
    fn begin(&self, campaign_id: CampaignId) -> Result<Self::Transaction<'_>, Self::Error>;
}

/// Unit of work for a single step. All four writes commit together or not at all.
pub trait StoreTransaction {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the campaign's current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the campaign does not exist or cannot be read.
    fn load_state(&mut self) -> Result<CampaignState, Self::Error>;

    /// Stage the campaign's next state.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be staged.
    fn persist_state(&mut self, state: &CampaignState) -> Result<(), Self::Error>;

    /// Stage a KPI history row.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be staged.
    fn append_kpi_snapshot(&mut self, step: u64, kpis: &Kpis) -> Result<(), Self::Error>;

    /// Stage events for publication on commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the events cannot be staged.
    fn emit_events(&mut self, events: &[SimulationEvent]) -> Result<(), Self::Error>;

    /// Make every staged write visible atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing staged becomes visible.
    fn commit(self) -> Result<(), Self::Error>;
}

/// Write point at which [`MemoryStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePoint {
    Begin,
    LoadState,
    PersistState,
    AppendKpiSnapshot,
    EmitEvents,
    Commit,
}

impl FailurePoint {
    pub const ALL: [Self; 6] = [
        Self::Begin,
        Self::LoadState,
        Self::PersistState,
        Self::AppendKpiSnapshot,
        Self::EmitEvents,
        Self::Commit,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::LoadState => "load_state",
            Self::PersistState => "persist_state",
            Self::AppendKpiSnapshot => "append_kpi_snapshot",
            Self::EmitEvents => "emit_events",
            Self::Commit => "commit",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryStoreError {
    #[error("{0} not found")]
    CampaignNotFound(CampaignId),
    #[error("memory store lock poisoned")]
    Poisoned,
    #[error("injected failure at {}", .0.as_str())]
    Injected(FailurePoint),
}

#[derive(Debug, Default)]
struct StoreInner {
    campaigns: BTreeMap<CampaignId, CampaignState>,
    kpi_history: BTreeMap<CampaignId, Vec<KpiSnapshot>>,
    outbox: BTreeMap<CampaignId, Vec<SimulationEvent>>,
    pending_failure: Option<FailurePoint>,
}

impl StoreInner {
    fn trip(&mut self, point: FailurePoint) -> Result<(), MemoryStoreError> {
        if self.pending_failure == Some(point) {
            self.pending_failure = None;
            return Err(MemoryStoreError::Injected(point));
        }
        Ok(())
    }
}

/// In-process reference store.
///
/// Each transaction claims its campaign until it commits or is dropped, so
/// steps on one campaign are serialised while different campaigns proceed in
/// parallel. Shared data sits behind one mutex that is only held for the
/// duration of a single operation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
    claimed: Mutex<BTreeSet<CampaignId>>,
    released: Condvar,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given campaigns.
    #[must_use]
    pub fn with_campaigns(campaigns: impl IntoIterator<Item = CampaignState>) -> Self {
        let inner = StoreInner {
            campaigns: campaigns
                .into_iter()
                .map(|state| (state.id, state))
                .collect(),
            ..StoreInner::default()
        };
        Self {
            inner: Mutex::new(inner),
            ..Self::default()
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, MemoryStoreError> {
        self.inner.lock().map_err(|_| MemoryStoreError::Poisoned)
    }

    /// Block until no other open transaction holds `id`, then hold it.
    fn claim(&self, id: CampaignId) -> Result<(), MemoryStoreError> {
        let claimed = self.claimed.lock().map_err(|_| MemoryStoreError::Poisoned)?;
        let mut claimed = self
            .released
            .wait_while(claimed, |claimed| claimed.contains(&id))
            .map_err(|_| MemoryStoreError::Poisoned)?;
        claimed.insert(id);
        Ok(())
    }

    fn release(&self, id: CampaignId) {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        claimed.remove(&id);
        drop(claimed);
        self.released.notify_all();
    }

    /// Insert or replace a campaign outside any step.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn insert(&self, state: CampaignState) -> Result<(), MemoryStoreError> {
        self.lock()?.campaigns.insert(state.id, state);
        Ok(())
    }

    /// Last committed state of a campaign.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn campaign(&self, id: CampaignId) -> Result<Option<CampaignState>, MemoryStoreError> {
        Ok(self.lock()?.campaigns.get(&id).cloned())
    }

    /// Committed KPI history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn kpi_history(&self, id: CampaignId) -> Result<Vec<KpiSnapshot>, MemoryStoreError> {
        Ok(self.lock()?.kpi_history.get(&id).cloned().unwrap_or_default())
    }

    /// Events published by committed steps, in emission order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn published_events(&self, id: CampaignId) -> Result<Vec<SimulationEvent>, MemoryStoreError> {
        Ok(self.lock()?.outbox.get(&id).cloned().unwrap_or_default())
    }

    /// Make the next operation reaching `point` fail once.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn fail_once(&self, point: FailurePoint) -> Result<(), MemoryStoreError> {
        self.lock()?.pending_failure = Some(point);
        Ok(())
    }
}

impl CampaignStore for MemoryStore {
    type Error = MemoryStoreError;
    type Transaction<'a> = MemoryTransaction<'a>;

    fn begin(&self, campaign_id: CampaignId) -> Result<MemoryTransaction<'_>, MemoryStoreError> {
        self.lock()?.trip(FailurePoint::Begin)?;
        self.claim(campaign_id)?;
        Ok(MemoryTransaction {
            store: self,
            campaign_id,
            staged_state: None,
            staged_kpis: Vec::new(),
            staged_events: Vec::new(),
            committed: false,
        })
    }
}

/// Open transaction against a [`MemoryStore`]. Holds its campaign until
/// dropped.
#[derive(Debug)]
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    campaign_id: CampaignId,
    staged_state: Option<CampaignState>,
    staged_kpis: Vec<KpiSnapshot>,
    staged_events: Vec<SimulationEvent>,
    committed: bool,
}

impl<'a> MemoryTransaction<'a> {
    fn has_staged_writes(&self) -> bool {
        self.staged_state.is_some() || !self.staged_kpis.is_empty() || !self.staged_events.is_empty()
    }

    fn trip(&self, point: FailurePoint) -> Result<MutexGuard<'a, StoreInner>, MemoryStoreError> {
        let mut inner = self.store.lock()?;
        inner.trip(point)?;
        Ok(inner)
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    type Error = MemoryStoreError;

    fn load_state(&mut self) -> Result<CampaignState, MemoryStoreError> {
        let inner = self.trip(FailurePoint::LoadState)?;
        if let Some(staged) = &self.staged_state {
            return Ok(staged.clone());
        }
        inner
            .campaigns
            .get(&self.campaign_id)
            .cloned()
            .ok_or(MemoryStoreError::CampaignNotFound(self.campaign_id))
    }

    fn persist_state(&mut self, state: &CampaignState) -> Result<(), MemoryStoreError> {
        drop(self.trip(FailurePoint::PersistState)?);
        self.staged_state = Some(state.clone());
        Ok(())
    }

    fn append_kpi_snapshot(&mut self, step: u64, kpis: &Kpis) -> Result<(), MemoryStoreError> {
        drop(self.trip(FailurePoint::AppendKpiSnapshot)?);
        self.staged_kpis.push(KpiSnapshot {
            campaign_id: self.campaign_id,
            step,
            kpis: kpis.clone(),
        });
        Ok(())
    }

    fn emit_events(&mut self, events: &[SimulationEvent]) -> Result<(), MemoryStoreError> {
        drop(self.trip(FailurePoint::EmitEvents)?);
        self.staged_events.extend_from_slice(events);
        Ok(())
    }

    fn commit(mut self) -> Result<(), MemoryStoreError> {
        let mut inner = self.trip(FailurePoint::Commit)?;
        let id = self.campaign_id;
        let state = self.staged_state.take();
        let kpis = std::mem::take(&mut self.staged_kpis);
        let events = std::mem::take(&mut self.staged_events);
        if let Some(state) = state {
            inner.campaigns.insert(id, state);
        }
        inner.kpi_history.entry(id).or_default().extend(kpis);
        inner.outbox.entry(id).or_default().extend(events);
        drop(inner);
        self.committed = true;
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed && self.has_staged_writes() {
            warn!("{} transaction rolled back", self.campaign_id);
        }
        self.store.release(self.campaign_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, EventLog};
    use crate::state::Resources;

    fn seeded() -> MemoryStore {
        MemoryStore::with_campaigns([CampaignState::new(CampaignId(7))
            .with_resources(Resources::from([("credits", 10)]))])
    }

    fn sample_events() -> Vec<SimulationEvent> {
        EventLog::new(1)
            .with(EventKind::PolicyExpired, &[], serde_json::Value::Null)
            .into_events()
    }

    #[test]
    fn committed_writes_become_visible() {
        let store = seeded();
        let mut tx = store.begin(CampaignId(7)).expect("begin");
        let mut state = tx.load_state().expect("load");
        state.step = 1;
        state.resources.set("credits", 99);
        tx.persist_state(&state).expect("persist");
        tx.append_kpi_snapshot(1, &Kpis::new()).expect("kpis");
        tx.emit_events(&sample_events()).expect("events");
        tx.commit().expect("commit");

        let stored = store.campaign(CampaignId(7)).expect("read").expect("exists");
        assert_eq!(stored.resources.get("credits"), 99);
        assert_eq!(store.kpi_history(CampaignId(7)).expect("history").len(), 1);
        assert_eq!(store.published_events(CampaignId(7)).expect("outbox").len(), 1);
    }

    #[test]
    fn dropped_transaction_discards_staged_writes() {
        let store = seeded();
        {
            let mut tx = store.begin(CampaignId(7)).expect("begin");
            let mut state = tx.load_state().expect("load");
            state.resources.set("credits", 0);
            tx.persist_state(&state).expect("persist");
            tx.emit_events(&sample_events()).expect("events");
        }
        let stored = store.campaign(CampaignId(7)).expect("read").expect("exists");
        assert_eq!(stored.resources.get("credits"), 10);
        assert!(store.published_events(CampaignId(7)).expect("outbox").is_empty());
    }

    #[test]
    fn injected_commit_failure_rolls_back() {
        let store = seeded();
        store.fail_once(FailurePoint::Commit).expect("arm");
        let mut tx = store.begin(CampaignId(7)).expect("begin");
        let state = tx.load_state().expect("load");
        tx.persist_state(&state.clone().with_resources(Resources::new()))
            .expect("persist");
        tx.append_kpi_snapshot(1, &Kpis::new()).expect("kpis");
        let err = tx.commit().expect_err("commit should fail");
        assert_eq!(err, MemoryStoreError::Injected(FailurePoint::Commit));
        assert_eq!(store.campaign(CampaignId(7)).expect("read"), Some(state));
        assert!(store.kpi_history(CampaignId(7)).expect("history").is_empty());
    }

    #[test]
    fn injected_failures_fire_once() {
        let store = seeded();
        store.fail_once(FailurePoint::Begin).expect("arm");
        assert!(store.begin(CampaignId(7)).is_err());
        assert!(store.begin(CampaignId(7)).is_ok());
    }

    #[test]
    fn open_transaction_does_not_block_other_campaigns() {
        let store = MemoryStore::with_campaigns([
            CampaignState::new(CampaignId(7)),
            CampaignState::new(CampaignId(8)),
        ]);
        let mut first = store.begin(CampaignId(7)).expect("begin 7");
        let mut second = store.begin(CampaignId(8)).expect("begin 8");
        assert!(store.campaign(CampaignId(7)).expect("read").is_some());
        let state = second.load_state().expect("load 8");
        second.persist_state(&state).expect("persist 8");
        second.commit().expect("commit 8");
        let state = first.load_state().expect("load 7");
        first.persist_state(&state).expect("persist 7");
        first.commit().expect("commit 7");
    }

    #[test]
    fn same_campaign_waits_for_open_transaction() {
        let store = seeded();
        let mut tx = store.begin(CampaignId(7)).expect("begin");
        std::thread::scope(|scope| {
            let waiter = scope.spawn(|| {
                let mut tx = store.begin(CampaignId(7)).expect("begin after release");
                tx.load_state().expect("load").resources.get("credits")
            });
            let mut state = tx.load_state().expect("load");
            state.resources.set("credits", 99);
            tx.persist_state(&state).expect("persist");
            tx.commit().expect("commit");
            assert_eq!(waiter.join().expect("join"), 99);
        });
    }

    #[test]
    fn missing_campaign_is_reported() {
        let store = MemoryStore::new();
        let mut tx = store.begin(CampaignId(1)).expect("begin");
        assert_eq!(
            tx.load_state().expect_err("missing"),
            MemoryStoreError::CampaignNotFound(CampaignId(1))
        );
    }
}
