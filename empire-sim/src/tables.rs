//! Static production, cost, and weighting tables.
//!
//! The catalog is built once and shared read-only by every campaign. All
//! tables are `BTreeMap`s so callers that walk them consume RNG draws in the
//! same order on every run.
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::constants::{
    BUILDING_DEFENSE_STATION, BUILDING_FACTORY, BUILDING_FARM, BUILDING_MARKET, BUILDING_MINE,
    BUILDING_POWER_PLANT, BUILDING_RESEARCH_LAB, BUILDING_SPACEPORT, RESOURCE_CREDITS,
    RESOURCE_ENERGY, RESOURCE_FOOD, RESOURCE_MATERIALS,
};
use crate::state::QueueKind;

/// Resource amounts required to complete an item.
pub type Cost = BTreeMap<&'static str, i64>;

/// Per-building resource deltas for one step; negative entries are upkeep.
pub type ProductionRow = BTreeMap<&'static str, f64>;

/// Resource availability inputs for queue efficiency: `(resource, divisor)`.
pub type EfficiencyInputs = &'static [(&'static str, f64)];

const BUILDING_EFFICIENCY: EfficiencyInputs = &[(RESOURCE_MATERIALS, 100.0), (RESOURCE_ENERGY, 50.0)];
const RESEARCH_EFFICIENCY: EfficiencyInputs = &[(RESOURCE_CREDITS, 200.0), (RESOURCE_ENERGY, 100.0)];
const MILITARY_EFFICIENCY: EfficiencyInputs =
    &[(RESOURCE_MATERIALS, 150.0), (RESOURCE_CREDITS, 100.0)];

/// Base market prices in credit terms, in the order the price reducer walks them.
pub const BASE_PRICES: [(&str, f64); 4] = [
    (RESOURCE_CREDITS, 1.0),
    (RESOURCE_MATERIALS, 2.0),
    (RESOURCE_ENERGY, 1.5),
    (RESOURCE_FOOD, 1.2),
];

/// Immutable lookup data consulted by the reducers.
#[derive(Debug, Clone)]
pub struct CostTables {
    production: BTreeMap<&'static str, ProductionRow>,
    building_costs: BTreeMap<&'static str, Cost>,
    research_costs: BTreeMap<&'static str, Cost>,
    military_costs: BTreeMap<&'static str, Cost>,
    default_building_cost: Cost,
    default_research_cost: Cost,
    default_military_cost: Cost,
    infrastructure_weights: BTreeMap<&'static str, f64>,
}

impl CostTables {
    fn standard() -> Self {
        let production = BTreeMap::from([
            (
                BUILDING_FACTORY,
                ProductionRow::from([
                    (RESOURCE_CREDITS, 15.0),
                    (RESOURCE_MATERIALS, 20.0),
                    (RESOURCE_ENERGY, -5.0),
                ]),
            ),
            (
                BUILDING_MINE,
                ProductionRow::from([(RESOURCE_MATERIALS, 15.0), (RESOURCE_ENERGY, -3.0)]),
            ),
            (
                BUILDING_FARM,
                ProductionRow::from([(RESOURCE_FOOD, 25.0), (RESOURCE_ENERGY, -2.0)]),
            ),
            (
                BUILDING_POWER_PLANT,
                ProductionRow::from([(RESOURCE_ENERGY, 40.0), (RESOURCE_CREDITS, -5.0)]),
            ),
            (
                BUILDING_RESEARCH_LAB,
                ProductionRow::from([(RESOURCE_CREDITS, -10.0), (RESOURCE_ENERGY, -8.0)]),
            ),
            (
                BUILDING_MARKET,
                ProductionRow::from([(RESOURCE_CREDITS, 30.0), (RESOURCE_FOOD, -2.0)]),
            ),
            (
                BUILDING_SPACEPORT,
                ProductionRow::from([
                    (RESOURCE_CREDITS, 20.0),
                    (RESOURCE_ENERGY, -10.0),
                    (RESOURCE_MATERIALS, -5.0),
                ]),
            ),
            (
                BUILDING_DEFENSE_STATION,
                ProductionRow::from([(RESOURCE_CREDITS, -8.0), (RESOURCE_ENERGY, -4.0)]),
            ),
        ]);

        let building_costs = BTreeMap::from([
            (
                BUILDING_FACTORY,
                Cost::from([(RESOURCE_CREDITS, 200), (RESOURCE_MATERIALS, 150)]),
            ),
            (
                BUILDING_MINE,
                Cost::from([(RESOURCE_CREDITS, 150), (RESOURCE_MATERIALS, 50)]),
            ),
            (
                BUILDING_FARM,
                Cost::from([(RESOURCE_CREDITS, 100), (RESOURCE_MATERIALS, 50)]),
            ),
            (
                BUILDING_POWER_PLANT,
                Cost::from([(RESOURCE_CREDITS, 250), (RESOURCE_MATERIALS, 200)]),
            ),
            (
                BUILDING_RESEARCH_LAB,
                Cost::from([
                    (RESOURCE_CREDITS, 300),
                    (RESOURCE_MATERIALS, 150),
                    (RESOURCE_ENERGY, 50),
                ]),
            ),
            (
                BUILDING_MARKET,
                Cost::from([(RESOURCE_CREDITS, 250), (RESOURCE_MATERIALS, 100)]),
            ),
            (
                BUILDING_SPACEPORT,
                Cost::from([
                    (RESOURCE_CREDITS, 1_000),
                    (RESOURCE_MATERIALS, 800),
                    (RESOURCE_ENERGY, 300),
                ]),
            ),
            (
                BUILDING_DEFENSE_STATION,
                Cost::from([(RESOURCE_CREDITS, 400), (RESOURCE_MATERIALS, 300)]),
            ),
        ]);

        let research_costs = BTreeMap::from([
            (
                "advanced_materials",
                Cost::from([(RESOURCE_CREDITS, 300), (RESOURCE_ENERGY, 150)]),
            ),
            (
                "fusion_power",
                Cost::from([
                    (RESOURCE_CREDITS, 500),
                    (RESOURCE_ENERGY, 250),
                    (RESOURCE_MATERIALS, 100),
                ]),
            ),
            (
                "logistics_networks",
                Cost::from([(RESOURCE_CREDITS, 250), (RESOURCE_ENERGY, 100)]),
            ),
            (
                "hydroponics",
                Cost::from([(RESOURCE_CREDITS, 200), (RESOURCE_FOOD, 100)]),
            ),
        ]);

        let military_costs = BTreeMap::from([
            (
                "infantry",
                Cost::from([
                    (RESOURCE_CREDITS, 100),
                    (RESOURCE_MATERIALS, 50),
                    (RESOURCE_FOOD, 20),
                ]),
            ),
            (
                "armor",
                Cost::from([
                    (RESOURCE_CREDITS, 300),
                    (RESOURCE_MATERIALS, 200),
                    (RESOURCE_ENERGY, 50),
                ]),
            ),
            (
                "fighter",
                Cost::from([
                    (RESOURCE_CREDITS, 400),
                    (RESOURCE_MATERIALS, 250),
                    (RESOURCE_ENERGY, 100),
                ]),
            ),
            (
                "frigate",
                Cost::from([
                    (RESOURCE_CREDITS, 800),
                    (RESOURCE_MATERIALS, 600),
                    (RESOURCE_ENERGY, 200),
                ]),
            ),
        ]);

        let infrastructure_weights = BTreeMap::from([
            (BUILDING_MINE, 1.0),
            (BUILDING_FACTORY, 1.5),
            (BUILDING_FARM, 1.0),
            (BUILDING_POWER_PLANT, 2.0),
            (BUILDING_RESEARCH_LAB, 2.5),
            (BUILDING_SPACEPORT, 3.0),
            (BUILDING_DEFENSE_STATION, 1.5),
        ]);

        Self {
            production,
            building_costs,
            research_costs,
            military_costs,
            default_building_cost: Cost::from([(RESOURCE_CREDITS, 100), (RESOURCE_MATERIALS, 100)]),
            default_research_cost: Cost::from([(RESOURCE_CREDITS, 200), (RESOURCE_ENERGY, 100)]),
            default_military_cost: Cost::from([(RESOURCE_CREDITS, 150), (RESOURCE_MATERIALS, 100)]),
            infrastructure_weights,
        }
    }

    /// Production rows in sorted building order.
    pub fn production_rows(&self) -> impl Iterator<Item = (&'static str, &ProductionRow)> {
        self.production.iter().map(|(building, row)| (*building, row))
    }

    /// Completion cost for a queue target, falling back to the kind's default
    /// cost. Unknown kinds have no cost and cannot complete.
    #[must_use]
    pub fn cost_for(&self, kind: &QueueKind, target_id: &str) -> Option<&Cost> {
        let (table, fallback) = match kind {
            QueueKind::Building => (&self.building_costs, &self.default_building_cost),
            QueueKind::Research => (&self.research_costs, &self.default_research_cost),
            QueueKind::Military => (&self.military_costs, &self.default_military_cost),
            QueueKind::Unknown(_) => return None,
        };
        Some(table.get(target_id).unwrap_or(fallback))
    }

    /// Resource availability inputs feeding queue efficiency for a kind.
    #[must_use]
    pub fn efficiency_inputs(&self, kind: &QueueKind) -> Option<EfficiencyInputs> {
        match kind {
            QueueKind::Building => Some(BUILDING_EFFICIENCY),
            QueueKind::Research => Some(RESEARCH_EFFICIENCY),
            QueueKind::Military => Some(MILITARY_EFFICIENCY),
            QueueKind::Unknown(_) => None,
        }
    }

    /// Infrastructure weight of a building type; unlisted types weigh 1.
    #[must_use]
    pub fn infrastructure_weight(&self, building: &str) -> f64 {
        self.infrastructure_weights
            .get(building)
            .copied()
            .unwrap_or(1.0)
    }
}

/// Shared read-only catalog.
pub fn cost_tables() -> &'static CostTables {
    static TABLES: OnceLock<CostTables> = OnceLock::new();
    TABLES.get_or_init(CostTables::standard)
}
