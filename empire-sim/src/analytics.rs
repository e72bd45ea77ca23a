//! Derived empire analytics: infrastructure scoring and snapshot comparison.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEVELOPMENT_ADVANCED, DEVELOPMENT_DEVELOPING, DEVELOPMENT_FUTURISTIC, INFRASTRUCTURE_SCALE,
};
use crate::state::{Buildings, Kpis};
use crate::tables::CostTables;

/// Weighted building stock scaled by 100.
#[must_use]
pub fn infrastructure_index(buildings: &Buildings, tables: &CostTables) -> f64 {
    buildings
        .iter()
        .map(|(building, count)| f64::from(count) * tables.infrastructure_weight(building))
        .sum::<f64>()
        * INFRASTRUCTURE_SCALE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentLevel {
    Primitive,
    Developing,
    Advanced,
    Futuristic,
}

impl DevelopmentLevel {
    #[must_use]
    pub fn from_index(index: f64) -> Self {
        if index < DEVELOPMENT_DEVELOPING {
            Self::Primitive
        } else if index < DEVELOPMENT_ADVANCED {
            Self::Developing
        } else if index < DEVELOPMENT_FUTURISTIC {
            Self::Advanced
        } else {
            Self::Futuristic
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Developing => "developing",
            Self::Advanced => "advanced",
            Self::Futuristic => "futuristic",
        }
    }
}

/// Movement of one numeric KPI between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiDelta {
    pub previous: f64,
    pub current: f64,
    pub change: f64,
    /// Percent change relative to `previous`; `0` when `previous` is zero.
    pub percent_change: f64,
}

impl KpiDelta {
    #[must_use]
    pub fn between(previous: f64, current: f64) -> Self {
        let change = current - previous;
        let percent_change = if previous == 0.0 {
            0.0
        } else {
            change / previous * 100.0
        };
        Self {
            previous,
            current,
            change,
            percent_change,
        }
    }
}

/// Compare the numeric KPIs present in both snapshots.
///
/// Labels and price maps are ignored, as are keys only one side carries.
#[must_use]
pub fn compare(previous: &Kpis, current: &Kpis) -> BTreeMap<String, KpiDelta> {
    current
        .iter()
        .filter_map(|(key, _)| {
            let now = current.number(key)?;
            let before = previous.number(key)?;
            Some((key.to_string(), KpiDelta::between(before, now)))
        })
        .collect()
}
