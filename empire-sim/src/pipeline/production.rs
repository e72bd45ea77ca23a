//! Building output followed by population upkeep.
use crate::config::ProductionConfig;
use crate::constants::{RESOURCE_ENERGY, RESOURCE_FOOD};
use crate::numbers::floor_f64_to_i64;
use crate::pipeline::{StageCtx, Tick};
use crate::state::CampaignState;

/// Apply jittered per-building production, then food and energy upkeep.
///
/// Rows are walked in the rate table's sorted order and one jitter value is
/// drawn per building type that is actually present.
pub fn reduce(mut tick: Tick, ctx: &mut StageCtx<'_>) -> Tick {
    let cfg = &ctx.cfg.production;
    let state = &mut tick.state;
    for (building, row) in ctx.tables.production_rows() {
        let count = state.buildings.count(building);
        if count == 0 {
            continue;
        }
        let jitter = ctx.rng.jitter(cfg.jitter);
        for (resource, rate) in row {
            let delta = floor_f64_to_i64(rate * f64::from(count) * jitter);
            if delta != 0 {
                state.resources.add_clamped(resource, delta);
            }
        }
    }
    apply_population_upkeep(state, cfg);
    tick
}

fn apply_population_upkeep(state: &mut CampaignState, cfg: &ProductionConfig) {
    let population = state.population(cfg.population_per_building);
    let food = floor_f64_to_i64(population * cfg.food_upkeep_per_capita);
    let energy = floor_f64_to_i64(population * cfg.energy_upkeep_per_capita);
    if food > 0 {
        state.resources.add_clamped(RESOURCE_FOOD, -food);
    }
    if energy > 0 {
        state.resources.add_clamped(RESOURCE_ENERGY, -energy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::event::EventLog;
    use crate::rng::StepRng;
    use crate::state::{Buildings, CampaignId, Resources};
    use crate::tables::cost_tables;

    fn run(state: CampaignState, seed: &str) -> (CampaignState, u64) {
        let cfg = SimConfig::default();
        let mut rng = StepRng::from_seed_str(seed);
        let mut ctx = StageCtx::new(&cfg, cost_tables(), &mut rng);
        let tick = reduce(Tick::new(state, EventLog::new(1)), &mut ctx);
        (tick.state, rng.draws())
    }

    #[test]
    fn factories_produce_within_jitter_band() {
        let state = CampaignState::new(CampaignId(1))
            .with_buildings(Buildings::from([("factory", 10)]))
            .with_resources(Resources::from([("materials", 0), ("energy", 1_000)]));
        let (next, draws) = run(state, "factories");
        assert_eq!(draws, 1);
        // 10 factories × 20 materials × [0.95, 1.05)
        let materials = next.resources.get("materials");
        assert!((190..=210).contains(&materials), "materials {materials}");
        // production then upkeep: population 1000 → food 100, energy 50
        let energy = next.resources.get("energy");
        assert!((1_000 - 53 - 50..=1_000 - 47 - 50).contains(&energy), "energy {energy}");
        assert_eq!(next.resources.get("food"), 0);
    }

    #[test]
    fn unknown_buildings_draw_nothing_but_count_toward_upkeep() {
        let state = CampaignState::new(CampaignId(1))
            .with_buildings(Buildings::from([("monument", 2)]))
            .with_resources(Resources::from([("food", 100), ("energy", 100)]));
        let (next, draws) = run(state, "monument");
        assert_eq!(draws, 0);
        assert_eq!(next.resources.get("food"), 80);
        assert_eq!(next.resources.get("energy"), 90);
    }

    #[test]
    fn upkeep_floors_at_zero() {
        let state = CampaignState::new(CampaignId(1))
            .with_buildings(Buildings::from([("research_lab", 20)]))
            .with_resources(Resources::from([("credits", 5), ("energy", 3), ("food", 1)]));
        let (next, _) = run(state, "starved");
        for (name, amount) in next.resources.iter() {
            assert!(amount >= 0, "{name} went negative");
        }
        assert_eq!(next.resources.get("credits"), 0);
        assert_eq!(next.resources.get("food"), 0);
    }

    #[test]
    fn draw_order_ignores_building_insertion_order() {
        let a = CampaignState::new(CampaignId(1)).with_buildings(Buildings::from([
            ("mine", 1),
            ("factory", 1),
            ("farm", 1),
        ]));
        let b = CampaignState::new(CampaignId(1)).with_buildings(Buildings::from([
            ("farm", 1),
            ("factory", 1),
            ("mine", 1),
        ]));
        assert_eq!(run(a, "order").0, run(b, "order").0);
    }
}
