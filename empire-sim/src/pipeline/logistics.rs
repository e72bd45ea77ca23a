//! Logistics capacity versus stockpile load.
use log::debug;

use crate::config::LogisticsConfig;
use crate::constants::{
    KPI_LOGISTICS_CAPACITY, KPI_LOGISTICS_EFFICIENCY, KPI_LOGISTICS_STRAIN, KPI_LOGISTICS_USAGE,
    LOGISTICS_BUILDINGS,
};
use crate::numbers::{floor_f64_to_i64, i64_to_f64};
use crate::pipeline::{StageCtx, Tick};
use crate::state::{Buildings, Resources};

/// Snapshot of the logistics network for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticsReport {
    pub capacity: f64,
    pub load: f64,
    pub strain: f64,
    pub efficiency: f64,
}

impl LogisticsReport {
    #[must_use]
    pub fn measure(buildings: &Buildings, resources: &Resources, cfg: &LogisticsConfig) -> Self {
        let logistic_buildings: u32 = LOGISTICS_BUILDINGS
            .iter()
            .map(|name| buildings.count(name))
            .fold(0, u32::saturating_add);
        let capacity = f64::from(logistic_buildings).mul_add(cfg.capacity_per_building, cfg.base_capacity);
        let load: i64 = resources
            .iter()
            .map(|(_, amount)| floor_f64_to_i64(i64_to_f64(amount) / cfg.load_divisor))
            .fold(0, i64::saturating_add);
        let load = i64_to_f64(load);
        let strain = if load > capacity && capacity > 0.0 {
            (load - capacity) / capacity
        } else {
            0.0
        };
        let efficiency = (capacity / load.max(1.0)).min(1.0);
        Self {
            capacity,
            load,
            strain,
            efficiency,
        }
    }

    #[must_use]
    pub fn overloaded(&self) -> bool {
        self.load > self.capacity
    }
}

/// Penalise stockpiles when load exceeds capacity and record logistics KPIs.
///
/// Draws no randomness.
pub fn reduce(mut tick: Tick, ctx: &mut StageCtx<'_>) -> Tick {
    let cfg = &ctx.cfg.logistics;
    let state = &mut tick.state;
    let report = LogisticsReport::measure(&state.buildings, &state.resources, cfg);

    if report.overloaded() {
        let reduction = (1.0 - report.strain).max(cfg.min_reduction);
        let penalties: Vec<(String, i64)> = state
            .resources
            .iter()
            .filter(|(_, amount)| *amount > 0)
            .map(|(name, amount)| {
                let loss = floor_f64_to_i64(i64_to_f64(amount) * (1.0 - reduction) * cfg.penalty_rate);
                (name.to_string(), loss)
            })
            .collect();
        for (name, loss) in penalties {
            if loss > 0 {
                state.resources.add_clamped(&name, -loss);
            }
        }
        debug!(
            "{} logistics overloaded: load {} over capacity {} (strain {:.3})",
            state.id, report.load, report.capacity, report.strain
        );
    }

    state.kpis.set_number(KPI_LOGISTICS_CAPACITY, report.capacity);
    state.kpis.set_number(KPI_LOGISTICS_USAGE, report.load);
    state.kpis.set_number(KPI_LOGISTICS_STRAIN, report.strain);
    state.kpis.set_number(KPI_LOGISTICS_EFFICIENCY, report.efficiency);
    tick
}
