//! Structured simulation events collected during a step.
//!
//! Events are accumulated in an [`EventLog`] passed by value through the
//! reducer pipeline and handed to the store only when the step commits.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stable, deterministic identifier for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Step number the event belongs to.
    pub step: u64,
    /// Sequence number (0-based) within the step.
    pub seq: u16,
}

impl EventId {
    #[must_use]
    pub const fn new(step: u64, seq: u16) -> Self {
        Self { step, seq }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    QueueComplete,
    ResearchBreakthrough,
    PolicyExpired,
    ActionRejected,
}

/// Maximum tag capacity stored inline without additional allocations.
pub type EventTagSet = SmallVec<[String; 2]>;

/// Write-once event produced mid-pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub id: EventId,
    /// Step counter used as the event timestamp.
    pub step: u64,
    pub kind: EventKind,
    #[serde(default)]
    pub tags: EventTagSet,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

/// Ordered accumulator of the events raised while computing one step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventLog {
    step: u64,
    events: Vec<SimulationEvent>,
}

impl EventLog {
    /// Empty log for the step being computed.
    #[must_use]
    pub const fn new(step: u64) -> Self {
        Self {
            step,
            events: Vec::new(),
        }
    }

    /// Append an event and return the log, so reducers can fold over it.
    #[must_use]
    pub fn with(mut self, kind: EventKind, tags: &[&str], payload: serde_json::Value) -> Self {
        self.push(kind, tags, payload);
        self
    }

    pub fn push(&mut self, kind: EventKind, tags: &[&str], payload: serde_json::Value) {
        let seq = u16::try_from(self.events.len()).unwrap_or(u16::MAX);
        self.events.push(SimulationEvent {
            id: EventId::new(self.step, seq),
            step: self.step,
            kind,
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            payload,
        });
    }

    #[must_use]
    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    pub fn of_kind<'a>(&'a self, kind: &'a EventKind) -> impl Iterator<Item = &'a SimulationEvent> {
        self.events.iter().filter(move |event| &event.kind == kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn into_events(self) -> Vec<SimulationEvent> {
        self.events
    }
}
