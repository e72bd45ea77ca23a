//! Empire Sim Step Engine
//!
//! Deterministic, platform-agnostic campaign-tick simulation. A step loads a
//! campaign from a transactional store, applies pending actions, folds the
//! state through a fixed reducer pipeline driven by a seeded RNG stream, and
//! commits the new state, a KPI snapshot, and the step's events as one unit.

pub mod actions;
pub mod analytics;
pub mod config;
pub mod constants;
pub mod engine;
pub mod event;
pub mod numbers;
pub mod pipeline;
pub mod rng;
pub mod state;
pub mod store;
pub mod tables;

// Re-export commonly used types
pub use actions::{Action, Rejection, apply_action, apply_actions};
pub use analytics::{DevelopmentLevel, KpiDelta, compare, infrastructure_index};
pub use config::{SimConfig, SimConfigError};
pub use engine::{StepEngine, StepError, StepOutcome, advance};
pub use event::{EventId, EventKind, EventLog, SimulationEvent};
pub use pipeline::{PIPELINE, Stage, StageCtx, StageId, Tick, run_pipeline};
pub use rng::{StepRng, seed_key};
pub use state::{
    Buildings, CampaignId, CampaignState, KpiValue, Kpis, PolicyEffect, PolicyKind, QueueItem,
    QueueKind, Resources,
};
pub use store::{
    CampaignStore, FailurePoint, KpiSnapshot, MemoryStore, MemoryStoreError, MemoryTransaction,
    StoreTransaction,
};
pub use tables::{CostTables, cost_tables};
