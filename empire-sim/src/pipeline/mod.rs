//! Ordered reducer pipeline advancing a campaign by one step.
//!
//! Each stage takes the [`Tick`] produced by the previous stage by value and
//! returns the next one. The stage order is fixed; changing it changes the
//! order of RNG draws and therefore every seeded outcome.
use log::debug;

use crate::config::SimConfig;
use crate::event::EventLog;
use crate::rng::StepRng;
use crate::state::CampaignState;
use crate::tables::CostTables;

pub mod finalize;
pub mod logistics;
pub mod policy;
pub mod pricing;
pub mod production;
pub mod queue;
pub mod readiness;

/// State and event accumulator threaded through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub state: CampaignState,
    pub events: EventLog,
}

impl Tick {
    #[must_use]
    pub const fn new(state: CampaignState, events: EventLog) -> Self {
        Self { state, events }
    }
}

/// Read-only tables plus the step's RNG stream.
#[derive(Debug)]
pub struct StageCtx<'a> {
    pub cfg: &'a SimConfig,
    pub tables: &'a CostTables,
    pub rng: &'a mut StepRng,
}

impl<'a> StageCtx<'a> {
    pub const fn new(cfg: &'a SimConfig, tables: &'a CostTables, rng: &'a mut StepRng) -> Self {
        Self { cfg, tables, rng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Production,
    Queue,
    Logistics,
    Pricing,
    Readiness,
    Policy,
    Finalize,
}

impl StageId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Queue => "queue",
            Self::Logistics => "logistics",
            Self::Pricing => "pricing",
            Self::Readiness => "readiness",
            Self::Policy => "policy",
            Self::Finalize => "finalize",
        }
    }
}

pub type ReducerFn = fn(Tick, &mut StageCtx<'_>) -> Tick;

#[derive(Clone, Copy)]
pub struct Stage {
    pub id: StageId,
    pub reduce: ReducerFn,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage").field("id", &self.id).finish()
    }
}

/// The step pipeline in execution order.
pub const PIPELINE: [Stage; 7] = [
    Stage {
        id: StageId::Production,
        reduce: production::reduce,
    },
    Stage {
        id: StageId::Queue,
        reduce: queue::reduce,
    },
    Stage {
        id: StageId::Logistics,
        reduce: logistics::reduce,
    },
    Stage {
        id: StageId::Pricing,
        reduce: pricing::reduce,
    },
    Stage {
        id: StageId::Readiness,
        reduce: readiness::reduce,
    },
    Stage {
        id: StageId::Policy,
        reduce: policy::reduce,
    },
    Stage {
        id: StageId::Finalize,
        reduce: finalize::reduce,
    },
];

/// Run the full step pipeline.
#[must_use]
pub fn run_pipeline(tick: Tick, ctx: &mut StageCtx<'_>) -> Tick {
    run_stages(&PIPELINE, tick, ctx)
}

/// Run an explicit stage list in order.
#[must_use]
pub fn run_stages(stages: &[Stage], tick: Tick, ctx: &mut StageCtx<'_>) -> Tick {
    stages.iter().fold(tick, |tick, stage| {
        let next = (stage.reduce)(tick, ctx);
        debug!(
            "{} stage {} done: draws={} events={}",
            next.state.id,
            stage.id.as_str(),
            ctx.rng.draws(),
            next.events.len()
        );
        next
    })
}
