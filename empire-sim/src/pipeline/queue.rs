//! Queue progression, completion, and deferred retry of unaffordable items.
use log::debug;
use serde_json::json;

use crate::config::QueueConfig;
use crate::event::EventKind;
use crate::numbers::{capped_ratio, i64_to_f64, mean};
use crate::pipeline::{StageCtx, Tick};
use crate::rng::StepRng;
use crate::state::{CampaignState, QueueItem, QueueKind, Resources};
use crate::tables::{CostTables, EfficiencyInputs};

/// Outcome of a completion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Cost paid, effect applied, item leaves the queue.
    Completed,
    /// Cost not covered; the item stays queued for another attempt.
    Deferred,
}

/// Advance every queue item in priority order.
///
/// Items are sorted by priority (descending, stable). Each known item draws
/// one jitter per efficiency input; unknown kinds are skipped without
/// consuming randomness.
pub fn reduce(tick: Tick, ctx: &mut StageCtx<'_>) -> Tick {
    let Tick {
        mut state,
        mut events,
    } = tick;
    let cfg = &ctx.cfg.queue;
    let mut ordered = std::mem::take(&mut state.queues);
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut retained = Vec::with_capacity(ordered.len());
    for mut item in ordered {
        let Some(inputs) = ctx.tables.efficiency_inputs(&item.kind) else {
            debug!(
                "{} skipping queue item {} of unknown kind {}",
                state.id,
                item.id,
                item.kind.as_str()
            );
            retained.push(item);
            continue;
        };

        let efficiency = efficiency(&state.resources, inputs, ctx.rng, cfg);
        let starting_progress = item.progress;
        item.progress += efficiency.max(cfg.progress_floor);
        if item.progress < item.total_work {
            retained.push(item);
            continue;
        }

        match try_complete(&mut state, &item, ctx.tables) {
            Completion::Completed => {
                debug!("{} completed {} ({})", state.id, item.id, item.target_id);
                events.push(
                    EventKind::QueueComplete,
                    &[item.kind.as_str()],
                    json!({
                        "itemId": item.id,
                        "kind": item.kind.as_str(),
                        "targetId": item.target_id,
                        "completionProgress": item.progress,
                        "efficiency": efficiency,
                    }),
                );
            }
            Completion::Deferred => {
                item.progress = deferred_progress(starting_progress, item.total_work);
                debug!(
                    "{} deferred {}: cost not covered, progress held at {:.2}",
                    state.id, item.id, item.progress
                );
                retained.push(item);
            }
        }
    }
    state.queues = retained;
    Tick { state, events }
}

/// Jittered mean of the kind's resource availability ratios, clamped to the
/// configured efficiency band.
pub fn efficiency(
    resources: &Resources,
    inputs: EfficiencyInputs,
    rng: &mut StepRng,
    cfg: &QueueConfig,
) -> f64 {
    let ratios: Vec<f64> = inputs
        .iter()
        .map(|(resource, divisor)| {
            let available = capped_ratio(i64_to_f64(resources.get(resource)), *divisor);
            available * rng.jitter(cfg.jitter)
        })
        .collect();
    mean(&ratios).clamp(cfg.efficiency_min, cfg.efficiency_max)
}

/// Progress kept by an item whose completion could not be paid for: one unit
/// short of the threshold, never below where the step started.
#[must_use]
pub fn deferred_progress(starting_progress: f64, total_work: f64) -> f64 {
    (total_work - 1.0).max(starting_progress)
}

/// Pay for and apply a finished item. Kinds without a cost table never
/// complete and report `Deferred`.
pub fn try_complete(state: &mut CampaignState, item: &QueueItem, tables: &CostTables) -> Completion {
    let Some(cost) = tables.cost_for(&item.kind, &item.target_id) else {
        return Completion::Deferred;
    };
    if !state.resources.deduct(cost) {
        return Completion::Deferred;
    }
    apply_completion_effect(state, item);
    Completion::Completed
}

fn apply_completion_effect(state: &mut CampaignState, item: &QueueItem) {
    match &item.kind {
        QueueKind::Building => state.buildings.increment(&item.target_id),
        QueueKind::Research => {
            state.technologies.insert(item.target_id.clone());
        }
        QueueKind::Military => {
            let units = state.units.entry(item.target_id.clone()).or_insert(0);
            *units = units.saturating_add(1);
        }
        QueueKind::Unknown(_) => {}
    }
}
