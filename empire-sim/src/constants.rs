//! Centralized balance and tuning constants for the campaign step engine.
//!
//! These values define the deterministic math for the reducer pipeline.
//! `SimConfig` defaults are sourced from here so the defaults and the
//! documented formulas cannot drift apart.

// Resource names -----------------------------------------------------------
pub const RESOURCE_CREDITS: &str = "credits";
pub const RESOURCE_MATERIALS: &str = "materials";
pub const RESOURCE_ENERGY: &str = "energy";
pub const RESOURCE_FOOD: &str = "food";

// Building names -----------------------------------------------------------
pub const BUILDING_FACTORY: &str = "factory";
pub const BUILDING_MINE: &str = "mine";
pub const BUILDING_FARM: &str = "farm";
pub const BUILDING_POWER_PLANT: &str = "power_plant";
pub const BUILDING_RESEARCH_LAB: &str = "research_lab";
pub const BUILDING_MARKET: &str = "market";
pub const BUILDING_SPACEPORT: &str = "spaceport";
pub const BUILDING_DEFENSE_STATION: &str = "defense_station";

/// Building types that contribute to logistics capacity.
pub const LOGISTICS_BUILDINGS: [&str; 3] = [BUILDING_FACTORY, BUILDING_MINE, BUILDING_FARM];

// KPI keys -----------------------------------------------------------------
pub const KPI_TOTAL_POPULATION: &str = "total_population";
pub const KPI_TOTAL_RESOURCES: &str = "total_resources";
pub const KPI_PRODUCTION_RATE: &str = "production_rate";
pub const KPI_QUEUE_EFFICIENCY: &str = "queue_efficiency";
pub const KPI_MILITARY_READINESS: &str = "military_readiness";
pub const KPI_SCIENCE_PROGRESS: &str = "science_progress";
pub const KPI_TECHNOLOGY_LEVEL: &str = "technology_level";
pub const KPI_DEFENSE_CAPABILITY: &str = "defense_capability";
pub const KPI_LOGISTICS_CAPACITY: &str = "logistics_capacity";
pub const KPI_LOGISTICS_USAGE: &str = "logistics_usage";
pub const KPI_LOGISTICS_STRAIN: &str = "logistics_strain";
pub const KPI_LOGISTICS_EFFICIENCY: &str = "logistics_efficiency";
pub const KPI_RESOURCE_PRICES: &str = "resource_prices";
pub const KPI_MARKET_VOLATILITY: &str = "market_volatility";
pub const KPI_INFLATION_RATE: &str = "inflation_rate";
pub const KPI_INFRASTRUCTURE_INDEX: &str = "infrastructure_index";
pub const KPI_DEVELOPMENT_LEVEL: &str = "development_level";

/// KPI keys guaranteed to be present after every committed step.
pub const REQUIRED_KPIS: [&str; 8] = [
    KPI_TOTAL_POPULATION,
    KPI_TOTAL_RESOURCES,
    KPI_PRODUCTION_RATE,
    KPI_QUEUE_EFFICIENCY,
    KPI_MILITARY_READINESS,
    KPI_SCIENCE_PROGRESS,
    KPI_LOGISTICS_EFFICIENCY,
    KPI_RESOURCE_PRICES,
];

// Seed handling ------------------------------------------------------------
/// Key used when the caller supplies an empty seed string.
pub const EMPTY_SEED_KEY: u64 = 0x5EED_CAFE_0000_0001;
pub(crate) const SEED_HASH_KEY: u64 = 0;
pub(crate) const STEP_STREAM_TAG: &[u8] = b"campaign-step";

// Production ---------------------------------------------------------------
pub(crate) const PRODUCTION_JITTER: f64 = 0.1;
pub(crate) const POPULATION_PER_BUILDING: f64 = 100.0;
pub(crate) const FOOD_UPKEEP_PER_CAPITA: f64 = 0.1;
pub(crate) const ENERGY_UPKEEP_PER_CAPITA: f64 = 0.05;

// Queue --------------------------------------------------------------------
pub(crate) const QUEUE_JITTER: f64 = 0.2;
pub(crate) const QUEUE_EFFICIENCY_MIN: f64 = 0.1;
pub(crate) const QUEUE_EFFICIENCY_MAX: f64 = 2.0;
pub(crate) const QUEUE_PROGRESS_FLOOR: f64 = 0.1;

// Logistics ----------------------------------------------------------------
pub(crate) const LOGISTICS_BASE_CAPACITY: f64 = 200.0;
pub(crate) const LOGISTICS_CAPACITY_PER_BUILDING: f64 = 50.0;
pub(crate) const LOGISTICS_LOAD_DIVISOR: f64 = 10.0;
pub(crate) const LOGISTICS_MIN_REDUCTION: f64 = 0.5;
pub(crate) const LOGISTICS_PENALTY_RATE: f64 = 0.1;

// Pricing ------------------------------------------------------------------
pub(crate) const PRICE_VOLATILITY: f64 = 0.3;
pub(crate) const PRICE_REFERENCE_STOCK: f64 = 1_000.0;
pub(crate) const SUPPLY_FACTOR_MIN: f64 = 0.1;
pub(crate) const SUPPLY_FACTOR_MAX: f64 = 3.0;
pub(crate) const PRICE_MIN: f64 = 0.1;
pub(crate) const PRICE_MAX: f64 = 10.0;
pub(crate) const INFLATION_BOUND: f64 = 0.5;

// Readiness and science ----------------------------------------------------
pub(crate) const READINESS_JITTER: f64 = 0.2;
pub(crate) const BREAKTHROUGH_MAJOR_ROLL: f64 = 0.95;
pub(crate) const BREAKTHROUGH_MINOR_ROLL: f64 = 0.85;
pub(crate) const BREAKTHROUGH_MAJOR_MULTIPLIER: f64 = 1.5;
pub(crate) const BREAKTHROUGH_MINOR_MULTIPLIER: f64 = 1.2;
pub(crate) const TECHNOLOGY_LEVEL_MAX: f64 = 10.0;
pub(crate) const TECHNOLOGY_PER_SCIENCE: f64 = 5.0;
pub(crate) const TECHNOLOGY_PER_LAB: f64 = 0.5;
pub(crate) const DEFENSE_READINESS_WEIGHT: f64 = 0.7;
pub(crate) const DEFENSE_LOGISTICS_WEIGHT: f64 = 0.3;

// Finalization -------------------------------------------------------------
pub(crate) const PRODUCTION_RATE_PER_BUILDING: f64 = 10.0;
pub(crate) const INFRASTRUCTURE_SCALE: f64 = 100.0;
pub(crate) const DEVELOPMENT_DEVELOPING: f64 = 500.0;
pub(crate) const DEVELOPMENT_ADVANCED: f64 = 2_000.0;
pub(crate) const DEVELOPMENT_FUTURISTIC: f64 = 5_000.0;
