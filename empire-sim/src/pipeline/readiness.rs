//! Military readiness, science progress, and the breakthrough roll.
use log::debug;
use serde_json::json;

use crate::config::ReadinessConfig;
use crate::constants::{
    BUILDING_FACTORY, BUILDING_RESEARCH_LAB, DEFENSE_LOGISTICS_WEIGHT, DEFENSE_READINESS_WEIGHT,
    KPI_DEFENSE_CAPABILITY, KPI_LOGISTICS_EFFICIENCY, KPI_MILITARY_READINESS,
    KPI_SCIENCE_PROGRESS, KPI_TECHNOLOGY_LEVEL, RESOURCE_CREDITS, RESOURCE_ENERGY,
    RESOURCE_MATERIALS, TECHNOLOGY_LEVEL_MAX, TECHNOLOGY_PER_LAB, TECHNOLOGY_PER_SCIENCE,
};
use crate::event::EventKind;
use crate::numbers::{capped_ratio, i64_to_f64, mean, round_to};
use crate::pipeline::{StageCtx, Tick};
use crate::state::CampaignState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakthrough {
    Major,
    Minor,
}

impl Breakthrough {
    /// Classify a roll in `[0, 1)`; the major threshold is checked first.
    #[must_use]
    pub fn from_roll(roll: f64, cfg: &ReadinessConfig) -> Option<Self> {
        if roll > cfg.major_breakthrough_roll {
            Some(Self::Major)
        } else if roll > cfg.minor_breakthrough_roll {
            Some(Self::Minor)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }

    #[must_use]
    pub const fn multiplier(self, cfg: &ReadinessConfig) -> f64 {
        match self {
            Self::Major => cfg.major_multiplier,
            Self::Minor => cfg.minor_multiplier,
        }
    }
}

fn resource_ratio(state: &CampaignState, resource: &str, divisor: f64) -> f64 {
    capped_ratio(i64_to_f64(state.resources.get(resource)), divisor)
}

/// Unjittered readiness inputs: stockpiles and factory count.
#[must_use]
pub fn base_readiness(state: &CampaignState) -> f64 {
    mean(&[
        resource_ratio(state, RESOURCE_MATERIALS, 500.0),
        resource_ratio(state, RESOURCE_ENERGY, 300.0),
        resource_ratio(state, RESOURCE_CREDITS, 1_000.0),
        capped_ratio(f64::from(state.buildings.count(BUILDING_FACTORY)), 5.0),
    ])
}

/// Science inputs before the breakthrough multiplier.
#[must_use]
pub fn base_science(state: &CampaignState, population_per_building: f64) -> f64 {
    mean(&[
        capped_ratio(f64::from(state.buildings.count(BUILDING_RESEARCH_LAB)), 3.0),
        resource_ratio(state, RESOURCE_ENERGY, 400.0),
        resource_ratio(state, RESOURCE_CREDITS, 800.0),
        capped_ratio(state.population(population_per_building), 2_000.0),
    ])
}

/// Two draws, always in the same order: readiness jitter, then the
/// breakthrough roll.
pub fn reduce(tick: Tick, ctx: &mut StageCtx<'_>) -> Tick {
    let Tick {
        mut state,
        mut events,
    } = tick;
    let cfg = &ctx.cfg.readiness;

    let readiness = (base_readiness(&state) * ctx.rng.jitter(cfg.jitter)).clamp(0.0, 1.0);

    let roll = ctx.rng.next_f64();
    let breakthrough = Breakthrough::from_roll(roll, cfg);
    let multiplier = breakthrough.map_or(1.0, |b| b.multiplier(cfg));
    let science = (base_science(&state, ctx.cfg.production.population_per_building) * multiplier)
        .clamp(0.0, 1.0);
    if let Some(kind) = breakthrough {
        debug!("{} research breakthrough: {}", state.id, kind.as_str());
        events.push(
            EventKind::ResearchBreakthrough,
            &[kind.as_str()],
            json!({ "type": kind.as_str() }),
        );
    }

    let labs = f64::from(state.buildings.count(BUILDING_RESEARCH_LAB));
    let technology = science
        .mul_add(TECHNOLOGY_PER_SCIENCE, labs * TECHNOLOGY_PER_LAB)
        .min(TECHNOLOGY_LEVEL_MAX);
    let logistics = state.kpis.number(KPI_LOGISTICS_EFFICIENCY).unwrap_or(1.0);
    let defense = readiness.mul_add(
        DEFENSE_READINESS_WEIGHT,
        logistics * DEFENSE_LOGISTICS_WEIGHT,
    );

    let kpis = &mut state.kpis;
    kpis.set_number(KPI_MILITARY_READINESS, readiness);
    kpis.set_number(KPI_SCIENCE_PROGRESS, science);
    kpis.set_number(KPI_TECHNOLOGY_LEVEL, round_to(technology, 1));
    kpis.set_number(KPI_DEFENSE_CAPABILITY, round_to(defense, 2));
    Tick { state, events }
}
