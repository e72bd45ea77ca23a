//! Baseline KPIs recomputed from the state as it reaches the end of the pipeline.
use crate::analytics::{DevelopmentLevel, infrastructure_index};
use crate::constants::{
    KPI_DEVELOPMENT_LEVEL, KPI_INFRASTRUCTURE_INDEX, KPI_PRODUCTION_RATE, KPI_QUEUE_EFFICIENCY,
    KPI_TOTAL_POPULATION, KPI_TOTAL_RESOURCES, PRODUCTION_RATE_PER_BUILDING,
};
use crate::numbers::{i64_to_f64, mean};
use crate::pipeline::{StageCtx, Tick};
use crate::state::QueueItem;

/// Mean completion ratio of the remaining queue, `1.0` when nothing is queued.
#[must_use]
pub fn queue_efficiency(queue: &[QueueItem]) -> f64 {
    if queue.is_empty() {
        return 1.0;
    }
    mean(&queue.iter().map(QueueItem::completion_ratio).collect::<Vec<_>>())
}

/// Overwrites its keys unconditionally, so values stamped by earlier stages
/// under the same names never survive.
pub fn reduce(mut tick: Tick, ctx: &mut StageCtx<'_>) -> Tick {
    let state = &mut tick.state;
    let population = state.population(ctx.cfg.production.population_per_building);
    let total_resources = i64_to_f64(state.resources.total());
    #[allow(clippy::cast_precision_loss)]
    let production_rate = state.buildings.total() as f64 * PRODUCTION_RATE_PER_BUILDING;
    let efficiency = queue_efficiency(&state.queues);
    let infrastructure = infrastructure_index(&state.buildings, ctx.tables);
    let level = DevelopmentLevel::from_index(infrastructure);

    let kpis = &mut state.kpis;
    kpis.set_number(KPI_TOTAL_POPULATION, population);
    kpis.set_number(KPI_TOTAL_RESOURCES, total_resources);
    kpis.set_number(KPI_PRODUCTION_RATE, production_rate);
    kpis.set_number(KPI_QUEUE_EFFICIENCY, efficiency);
    kpis.set_number(KPI_INFRASTRUCTURE_INDEX, infrastructure);
    kpis.set_label(KPI_DEVELOPMENT_LEVEL, level.as_str());
    tick
}
