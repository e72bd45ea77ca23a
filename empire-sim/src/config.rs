//! Tuning knobs consumed by the reducer pipeline.
//!
//! Every field has a serde default, so an empty JSON object resolves to the
//! baseline balance described in `constants`.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// Errors raised when simulation configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum SimConfigError {
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("queue efficiency bounds invalid (min {min:.2} > max {max:.2})")]
    EfficiencyBounds { min: f64, max: f64 },
    #[error("breakthrough rolls invalid (minor {minor:.2} must not exceed major {major:.2})")]
    BreakthroughRolls { minor: f64, major: f64 },
}

/// Simulation tuning shared by every campaign step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub production: ProductionConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub logistics: LogisticsConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
}

impl SimConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `SimConfigError` when any field violates its documented bounds.
    pub fn validate(&self) -> Result<(), SimConfigError> {
        self.production.validate()?;
        self.queue.validate()?;
        self.logistics.validate()?;
        self.pricing.validate()?;
        self.readiness.validate()?;
        Ok(())
    }

    /// Parse a configuration from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            production: ProductionConfig::default(),
            queue: QueueConfig::default(),
            logistics: LogisticsConfig::default(),
            pricing: PricingConfig::default(),
            readiness: ReadinessConfig::default(),
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), SimConfigError> {
    if !(min..=max).contains(&value) {
        return Err(SimConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

fn check_min(field: &'static str, value: f64, min: f64) -> Result<(), SimConfigError> {
    if value.is_nan() || value < min {
        return Err(SimConfigError::MinViolation { field, min, value });
    }
    Ok(())
}

/// Building output and population upkeep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionConfig {
    /// Full width of the production jitter band (0.1 → ±5%).
    #[serde(default = "ProductionConfig::default_jitter")]
    pub jitter: f64,
    #[serde(default = "ProductionConfig::default_population_per_building")]
    pub population_per_building: f64,
    #[serde(default = "ProductionConfig::default_food_upkeep")]
    pub food_upkeep_per_capita: f64,
    #[serde(default = "ProductionConfig::default_energy_upkeep")]
    pub energy_upkeep_per_capita: f64,
}

impl ProductionConfig {
    const fn default_jitter() -> f64 {
        constants::PRODUCTION_JITTER
    }

    const fn default_population_per_building() -> f64 {
        constants::POPULATION_PER_BUILDING
    }

    const fn default_food_upkeep() -> f64 {
        constants::FOOD_UPKEEP_PER_CAPITA
    }

    const fn default_energy_upkeep() -> f64 {
        constants::ENERGY_UPKEEP_PER_CAPITA
    }

    fn validate(&self) -> Result<(), SimConfigError> {
        check_range("production.jitter", self.jitter, 0.0, 1.0)?;
        check_min(
            "production.population_per_building",
            self.population_per_building,
            0.0,
        )?;
        check_min("production.food_upkeep_per_capita", self.food_upkeep_per_capita, 0.0)?;
        check_min(
            "production.energy_upkeep_per_capita",
            self.energy_upkeep_per_capita,
            0.0,
        )?;
        Ok(())
    }
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            jitter: Self::default_jitter(),
            population_per_building: Self::default_population_per_building(),
            food_upkeep_per_capita: Self::default_food_upkeep(),
            energy_upkeep_per_capita: Self::default_energy_upkeep(),
        }
    }
}

/// Queue progression tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Full width of the per-ratio efficiency jitter band (0.2 → ±10%).
    #[serde(default = "QueueConfig::default_jitter")]
    pub jitter: f64,
    #[serde(default = "QueueConfig::default_efficiency_min")]
    pub efficiency_min: f64,
    #[serde(default = "QueueConfig::default_efficiency_max")]
    pub efficiency_max: f64,
    /// Minimum progress credited per step so items never stall outright.
    #[serde(default = "QueueConfig::default_progress_floor")]
    pub progress_floor: f64,
}

impl QueueConfig {
    const fn default_jitter() -> f64 {
        constants::QUEUE_JITTER
    }

    const fn default_efficiency_min() -> f64 {
        constants::QUEUE_EFFICIENCY_MIN
    }

    const fn default_efficiency_max() -> f64 {
        constants::QUEUE_EFFICIENCY_MAX
    }

    const fn default_progress_floor() -> f64 {
        constants::QUEUE_PROGRESS_FLOOR
    }

    fn validate(&self) -> Result<(), SimConfigError> {
        check_range("queue.jitter", self.jitter, 0.0, 1.0)?;
        check_min("queue.efficiency_min", self.efficiency_min, 0.0)?;
        if self.efficiency_min > self.efficiency_max {
            return Err(SimConfigError::EfficiencyBounds {
                min: self.efficiency_min,
                max: self.efficiency_max,
            });
        }
        check_min("queue.progress_floor", self.progress_floor, 0.01)?;
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            jitter: Self::default_jitter(),
            efficiency_min: Self::default_efficiency_min(),
            efficiency_max: Self::default_efficiency_max(),
            progress_floor: Self::default_progress_floor(),
        }
    }
}

/// Logistics capacity and overload penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsConfig {
    #[serde(default = "LogisticsConfig::default_base_capacity")]
    pub base_capacity: f64,
    #[serde(default = "LogisticsConfig::default_capacity_per_building")]
    pub capacity_per_building: f64,
    /// Resource units that make up one unit of logistics load.
    #[serde(default = "LogisticsConfig::default_load_divisor")]
    pub load_divisor: f64,
    #[serde(default = "LogisticsConfig::default_min_reduction")]
    pub min_reduction: f64,
    #[serde(default = "LogisticsConfig::default_penalty_rate")]
    pub penalty_rate: f64,
}

impl LogisticsConfig {
    const fn default_base_capacity() -> f64 {
        constants::LOGISTICS_BASE_CAPACITY
    }

    const fn default_capacity_per_building() -> f64 {
        constants::LOGISTICS_CAPACITY_PER_BUILDING
    }

    const fn default_load_divisor() -> f64 {
        constants::LOGISTICS_LOAD_DIVISOR
    }

    const fn default_min_reduction() -> f64 {
        constants::LOGISTICS_MIN_REDUCTION
    }

    const fn default_penalty_rate() -> f64 {
        constants::LOGISTICS_PENALTY_RATE
    }

    fn validate(&self) -> Result<(), SimConfigError> {
        check_min("logistics.base_capacity", self.base_capacity, 1.0)?;
        check_min(
            "logistics.capacity_per_building",
            self.capacity_per_building,
            0.0,
        )?;
        check_min("logistics.load_divisor", self.load_divisor, 1.0)?;
        check_range("logistics.min_reduction", self.min_reduction, 0.0, 1.0)?;
        check_range("logistics.penalty_rate", self.penalty_rate, 0.0, 1.0)?;
        Ok(())
    }
}

impl Default for LogisticsConfig {
    fn default() -> Self {
        Self {
            base_capacity: Self::default_base_capacity(),
            capacity_per_building: Self::default_capacity_per_building(),
            load_divisor: Self::default_load_divisor(),
            min_reduction: Self::default_min_reduction(),
            penalty_rate: Self::default_penalty_rate(),
        }
    }
}

/// Market price model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Full width of the volatility jitter band (0.3 → ±15%).
    #[serde(default = "PricingConfig::default_volatility")]
    pub volatility: f64,
    /// Stock level at which the supply factor equals 1.
    #[serde(default = "PricingConfig::default_reference_stock")]
    pub reference_stock: f64,
    #[serde(default = "PricingConfig::default_price_min")]
    pub price_min: f64,
    #[serde(default = "PricingConfig::default_price_max")]
    pub price_max: f64,
}

impl PricingConfig {
    const fn default_volatility() -> f64 {
        constants::PRICE_VOLATILITY
    }

    const fn default_reference_stock() -> f64 {
        constants::PRICE_REFERENCE_STOCK
    }

    const fn default_price_min() -> f64 {
        constants::PRICE_MIN
    }

    const fn default_price_max() -> f64 {
        constants::PRICE_MAX
    }

    fn validate(&self) -> Result<(), SimConfigError> {
        check_range("pricing.volatility", self.volatility, 0.0, 1.0)?;
        check_min("pricing.reference_stock", self.reference_stock, 1.0)?;
        check_min("pricing.price_min", self.price_min, 0.01)?;
        check_range(
            "pricing.price_max",
            self.price_max,
            self.price_min,
            f64::MAX,
        )?;
        Ok(())
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            volatility: Self::default_volatility(),
            reference_stock: Self::default_reference_stock(),
            price_min: Self::default_price_min(),
            price_max: Self::default_price_max(),
        }
    }
}

/// Military readiness jitter and research breakthrough rolls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "ReadinessConfig::default_jitter")]
    pub jitter: f64,
    #[serde(default = "ReadinessConfig::default_major_roll")]
    pub major_breakthrough_roll: f64,
    #[serde(default = "ReadinessConfig::default_minor_roll")]
    pub minor_breakthrough_roll: f64,
    #[serde(default = "ReadinessConfig::default_major_multiplier")]
    pub major_multiplier: f64,
    #[serde(default = "ReadinessConfig::default_minor_multiplier")]
    pub minor_multiplier: f64,
}

impl ReadinessConfig {
    const fn default_jitter() -> f64 {
        constants::READINESS_JITTER
    }

    const fn default_major_roll() -> f64 {
        constants::BREAKTHROUGH_MAJOR_ROLL
    }

    const fn default_minor_roll() -> f64 {
        constants::BREAKTHROUGH_MINOR_ROLL
    }

    const fn default_major_multiplier() -> f64 {
        constants::BREAKTHROUGH_MAJOR_MULTIPLIER
    }

    const fn default_minor_multiplier() -> f64 {
        constants::BREAKTHROUGH_MINOR_MULTIPLIER
    }

    fn validate(&self) -> Result<(), SimConfigError> {
        check_range("readiness.jitter", self.jitter, 0.0, 1.0)?;
        check_range(
            "readiness.major_breakthrough_roll",
            self.major_breakthrough_roll,
            0.0,
            1.0,
        )?;
        check_range(
            "readiness.minor_breakthrough_roll",
            self.minor_breakthrough_roll,
            0.0,
            1.0,
        )?;
        if self.minor_breakthrough_roll > self.major_breakthrough_roll {
            return Err(SimConfigError::BreakthroughRolls {
                minor: self.minor_breakthrough_roll,
                major: self.major_breakthrough_roll,
            });
        }
        check_min("readiness.major_multiplier", self.major_multiplier, 1.0)?;
        check_min("readiness.minor_multiplier", self.minor_multiplier, 1.0)?;
        Ok(())
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            jitter: Self::default_jitter(),
            major_breakthrough_roll: Self::default_major_roll(),
            minor_breakthrough_roll: Self::default_minor_roll(),
            major_multiplier: Self::default_major_multiplier(),
            minor_multiplier: Self::default_minor_multiplier(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let cfg = SimConfig::from_json("{}").expect("deserialize");
        assert_eq!(cfg, SimConfig::default());
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = SimConfig::from_json(r#"{"logistics": {"base_capacity": 400.0}}"#)
            .expect("deserialize");
        assert!((cfg.logistics.base_capacity - 400.0).abs() < f64::EPSILON);
        assert!((cfg.logistics.capacity_per_building - 50.0).abs() < f64::EPSILON);
        assert_eq!(cfg.queue, QueueConfig::default());
    }

    #[test]
    fn rejects_inverted_efficiency_bounds() {
        let cfg = SimConfig {
            queue: QueueConfig {
                efficiency_min: 3.0,
                efficiency_max: 2.0,
                ..QueueConfig::default()
            },
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::EfficiencyBounds { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_jitter() {
        let cfg = SimConfig {
            production: ProductionConfig {
                jitter: 1.5,
                ..ProductionConfig::default()
            },
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::RangeViolation { field, .. }) if field == "production.jitter"
        ));
    }

    #[test]
    fn rejects_inverted_breakthrough_rolls() {
        let cfg = SimConfig {
            readiness: ReadinessConfig {
                minor_breakthrough_roll: 0.99,
                ..ReadinessConfig::default()
            },
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::BreakthroughRolls { .. })
        ));
    }
}
