//! Campaign state aggregate advanced by the step engine.
//!
//! All keyed collections are `BTreeMap`/`BTreeSet` so iteration order is
//! sorted and identical on every run.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::numbers::{floor_f64_to_i64, i64_to_f64};
use crate::tables::Cost;

/// Stable campaign identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub i64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "campaign#{}", self.0)
    }
}

/// Resource stockpile keyed by resource name. Amounts never go below zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resources(BTreeMap<String, i64>);

impl Resources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount held, zero when the resource was never recorded.
    #[must_use]
    pub fn get(&self, name: &str) -> i64 {
        self.0.get(name).copied().unwrap_or(0)
    }

    /// Overwrite an amount, clamping at zero.
    pub fn set(&mut self, name: &str, amount: i64) {
        self.0.insert(name.to_string(), amount.max(0));
    }

    /// Apply a signed delta with a floor at zero, returning the delta actually applied.
    pub fn add_clamped(&mut self, name: &str, delta: i64) -> i64 {
        let current = self.get(name);
        let next = current.saturating_add(delta).max(0);
        self.0.insert(name.to_string(), next);
        next - current
    }

    /// Sum of every amount.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.0.values().fold(0_i64, |acc, v| acc.saturating_add(*v))
    }

    /// Whether every cost line is covered by current stock.
    #[must_use]
    pub fn can_afford(&self, cost: &Cost) -> bool {
        cost.iter().all(|(name, amount)| self.get(name) >= *amount)
    }

    /// Deduct a cost when affordable. Returns `false` and leaves the stockpile
    /// untouched otherwise.
    pub fn deduct(&mut self, cost: &Cost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for (name, amount) in cost {
            self.add_clamped(name, -*amount);
        }
        true
    }

    /// Force every amount to be non-negative.
    pub fn clamp_non_negative(&mut self) {
        for amount in self.0.values_mut() {
            *amount = (*amount).max(0);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, amount)| (name.as_str(), *amount))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&str, i64); N]> for Resources {
    fn from(pairs: [(&str, i64); N]) -> Self {
        let mut resources = Self::new();
        for (name, amount) in pairs {
            resources.set(name, amount);
        }
        resources
    }
}

/// Building counts keyed by building type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buildings(BTreeMap<String, u32>);

impl Buildings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self, building: &str) -> u32 {
        self.0.get(building).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, building: &str) {
        let entry = self.0.entry(building.to_string()).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    /// Total number of buildings across all types.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().map(|count| u64::from(*count)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&str, u32); N]> for Buildings {
    fn from(pairs: [(&str, u32); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(name, count)| (name.to_string(), count))
                .collect(),
        )
    }
}

/// Queue item family. Unrecognised kinds survive a round trip and are
/// skipped by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    Building,
    Research,
    Military,
    #[serde(untagged)]
    Unknown(String),
}

impl QueueKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Building => "building",
            Self::Research => "research",
            Self::Military => "military",
            Self::Unknown(kind) => kind,
        }
    }
}

/// Pending build, research, or military order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    pub kind: QueueKind,
    /// What is being built or researched.
    pub target_id: String,
    #[serde(default)]
    pub progress: f64,
    pub total_work: f64,
    /// Higher values are processed first.
    #[serde(default)]
    pub priority: i32,
}

impl QueueItem {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: QueueKind,
        target_id: impl Into<String>,
        total_work: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            target_id: target_id.into(),
            progress: 0.0,
            total_work,
            priority: 0,
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    /// Fraction of work done; items with no work are reported as complete.
    #[must_use]
    pub fn completion_ratio(&self) -> f64 {
        if self.total_work <= 0.0 {
            return 1.0;
        }
        self.progress / self.total_work
    }
}

/// Policy effect family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Adds `modifier` credits every tick while active.
    TaxBoost,
    #[serde(untagged)]
    Other(String),
}

impl PolicyKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::TaxBoost => "tax_boost",
            Self::Other(kind) => kind,
        }
    }
}

/// Time-limited modifier with a countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEffect {
    pub id: String,
    pub kind: PolicyKind,
    pub modifier: f64,
    pub remaining_ticks: u32,
    /// Fractional credit not yet paid out, carried into the next tick.
    #[serde(default)]
    pub carry: f64,
}

impl PolicyEffect {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: PolicyKind, modifier: f64, remaining_ticks: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            modifier,
            remaining_ticks,
            carry: 0.0,
        }
    }

    /// Whole credits owed this tick. The fractional part of `modifier` plus
    /// any earlier remainder accumulates in `carry` until it pays out.
    pub fn take_whole_credits(&mut self) -> i64 {
        let owed = self.modifier + self.carry;
        let whole = floor_f64_to_i64(owed);
        self.carry = owed - i64_to_f64(whole);
        whole
    }
}

/// A KPI value: a plain number, a label, or a per-resource price map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KpiValue {
    Number(f64),
    Label(String),
    Prices(BTreeMap<String, f64>),
}

/// Derived metrics recomputed every step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kpis(BTreeMap<String, KpiValue>);

impl Kpis {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a numeric KPI, replacing any previous value under the key.
    pub fn set_number(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), KpiValue::Number(value));
    }

    pub fn set_label(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), KpiValue::Label(value.into()));
    }

    pub fn set_prices(&mut self, key: &str, prices: BTreeMap<String, f64>) {
        self.0.insert(key.to_string(), KpiValue::Prices(prices));
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&KpiValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(KpiValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(KpiValue::Label(value)) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn prices(&self, key: &str) -> Option<&BTreeMap<String, f64>> {
        match self.0.get(key) {
            Some(KpiValue::Prices(prices)) => Some(prices),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KpiValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Root aggregate for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignState {
    pub id: CampaignId,
    /// Incremented exactly once per committed step.
    #[serde(default)]
    pub step: u64,
    #[serde(default)]
    pub resources: Resources,
    #[serde(default)]
    pub buildings: Buildings,
    /// Pending orders, unique by id.
    #[serde(default)]
    pub queues: Vec<QueueItem>,
    #[serde(default)]
    pub policies: Vec<PolicyEffect>,
    #[serde(default)]
    pub kpis: Kpis,
    /// Completed research targets.
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    /// Trained military units by unit type.
    #[serde(default)]
    pub units: BTreeMap<String, u64>,
}

impl CampaignState {
    /// Empty campaign at step zero.
    #[must_use]
    pub fn new(id: CampaignId) -> Self {
        Self {
            id,
            step: 0,
            resources: Resources::new(),
            buildings: Buildings::new(),
            queues: Vec::new(),
            policies: Vec::new(),
            kpis: Kpis::new(),
            technologies: BTreeSet::new(),
            units: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    #[must_use]
    pub fn with_buildings(mut self, buildings: Buildings) -> Self {
        self.buildings = buildings;
        self
    }

    #[must_use]
    pub fn with_queue(mut self, queues: Vec<QueueItem>) -> Self {
        self.queues = queues;
        self
    }

    #[must_use]
    pub fn with_policies(mut self, policies: Vec<PolicyEffect>) -> Self {
        self.policies = policies;
        self
    }

    /// Population implied by the building stock.
    #[must_use]
    pub fn population(&self, per_building: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let buildings = self.buildings.total() as f64;
        buildings * per_building
    }

    #[must_use]
    pub fn has_queue_item(&self, id: &str) -> bool {
        self.queues.iter().any(|item| item.id == id)
    }

    #[must_use]
    pub fn has_policy(&self, id: &str) -> bool {
        self.policies.iter().any(|policy| policy.id == id)
    }

    /// Parse a campaign state from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a campaign state.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
