//! Step orchestration: load, apply actions, reduce, persist, commit.
use log::{debug, info, warn};
use thiserror::Error;

use crate::actions::{Action, apply_actions};
use crate::config::{SimConfig, SimConfigError};
use crate::event::{EventLog, SimulationEvent};
use crate::pipeline::{StageCtx, Tick, run_pipeline};
use crate::rng::StepRng;
use crate::state::{CampaignId, CampaignState};
use crate::store::{CampaignStore, StoreTransaction};
use crate::tables::{CostTables, cost_tables};

#[derive(Debug, Error)]
pub enum StepError<E>
where
    E: std::error::Error + 'static,
{
    /// The persistence collaborator failed; nothing was committed.
    #[error("campaign store error: {0}")]
    Store(#[source] E),
    #[error("store returned {loaded} when {requested} was requested")]
    CampaignMismatch {
        requested: CampaignId,
        loaded: CampaignId,
    },
}

/// Result of a committed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: CampaignState,
    pub events: Vec<SimulationEvent>,
    /// RNG values consumed by the pipeline.
    pub rng_draws: u64,
}

/// Pure step computation without persistence: actions, then the pipeline,
/// then the step counter.
///
/// Stored amounts below zero are clamped before any stage runs.
///
/// # Panics
///
/// Panics when `cfg` has inverted clamp bounds (`efficiency_min >
/// efficiency_max` or `price_min > price_max`). Configs accepted by
/// [`SimConfig::validate`] never panic; [`StepEngine::with_config`] checks
/// this up front.
#[must_use]
pub fn advance(
    state: CampaignState,
    seed: &str,
    actions: &[Action],
    cfg: &SimConfig,
    tables: &CostTables,
) -> StepOutcome {
    let next_step = state.step.saturating_add(1);
    let mut events = EventLog::new(next_step);
    let mut state = apply_actions(state, actions, &mut events);
    state.resources.clamp_non_negative();

    let mut rng = StepRng::from_seed_str(seed);
    let mut ctx = StageCtx::new(cfg, tables, &mut rng);
    let Tick { mut state, events } = run_pipeline(Tick::new(state, events), &mut ctx);
    state.step = next_step;

    StepOutcome {
        state,
        events: events.into_events(),
        rng_draws: rng.draws(),
    }
}

/// Drives campaign steps against a transactional store.
#[derive(Debug)]
pub struct StepEngine<S> {
    store: S,
    cfg: SimConfig,
}

impl<S: CampaignStore> StepEngine<S> {
    /// Engine with the default balance.
    pub fn new(store: S) -> Self {
        Self {
            store,
            cfg: SimConfig::default(),
        }
    }

    /// Engine with custom tuning.
    ///
    /// # Errors
    ///
    /// Returns `SimConfigError` if the configuration is invalid.
    pub fn with_config(store: S, cfg: SimConfig) -> Result<Self, SimConfigError> {
        cfg.validate()?;
        Ok(Self { store, cfg })
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &SimConfig {
        &self.cfg
    }

    /// Advance one campaign by exactly one step inside a single transaction.
    ///
    /// Identical stored state, seed, and actions always produce an identical
    /// outcome. On any error the transaction is dropped uncommitted and the
    /// stored campaign is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Store` when the store fails at any point, and
    /// `StepError::CampaignMismatch` if it loads a different campaign.
    pub fn step(
        &self,
        campaign_id: CampaignId,
        seed: &str,
        actions: &[Action],
    ) -> Result<StepOutcome, StepError<S::Error>> {
        info!("{campaign_id} step begin (seed {seed:?}, {} actions)", actions.len());
        let result = self.run_step(campaign_id, seed, actions);
        match &result {
            Ok(outcome) => info!(
                "{campaign_id} step {} committed ({} events, {} draws)",
                outcome.state.step,
                outcome.events.len(),
                outcome.rng_draws
            ),
            Err(err) => warn!("{campaign_id} step rolled back: {err}"),
        }
        result
    }

    fn run_step(
        &self,
        campaign_id: CampaignId,
        seed: &str,
        actions: &[Action],
    ) -> Result<StepOutcome, StepError<S::Error>> {
        let mut tx = self.store.begin(campaign_id).map_err(StepError::Store)?;
        let loaded = tx.load_state().map_err(StepError::Store)?;
        if loaded.id != campaign_id {
            return Err(StepError::CampaignMismatch {
                requested: campaign_id,
                loaded: loaded.id,
            });
        }
        debug!("{campaign_id} loaded at step {}", loaded.step);

        let outcome = advance(loaded, seed, actions, &self.cfg, cost_tables());

        tx.persist_state(&outcome.state).map_err(StepError::Store)?;
        tx.append_kpi_snapshot(outcome.state.step, &outcome.state.kpis)
            .map_err(StepError::Store)?;
        tx.emit_events(&outcome.events).map_err(StepError::Store)?;
        tx.commit().map_err(StepError::Store)?;
        Ok(outcome)
    }
}
