//! Player and AI commands applied before the reducer pipeline runs.
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::event::{EventKind, EventLog};
use crate::state::{CampaignState, PolicyEffect, QueueItem};

/// A pending command for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Enqueue { item: QueueItem },
    Cancel { item_id: String },
    ActivatePolicy { effect: PolicyEffect },
}

impl Action {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Enqueue { .. } => "enqueue",
            Self::Cancel { .. } => "cancel",
            Self::ActivatePolicy { .. } => "activate_policy",
        }
    }

    fn subject(&self) -> &str {
        match self {
            Self::Enqueue { item } => &item.id,
            Self::Cancel { item_id } => item_id,
            Self::ActivatePolicy { effect } => &effect.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    DuplicateQueueItem,
    UnknownQueueItem,
    DuplicatePolicy,
}

impl Rejection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateQueueItem => "duplicate_queue_item",
            Self::UnknownQueueItem => "unknown_queue_item",
            Self::DuplicatePolicy => "duplicate_policy",
        }
    }
}

/// Apply one action in place.
///
/// # Errors
///
/// Returns the rejection reason; the state is untouched in that case.
pub fn apply_action(state: &mut CampaignState, action: &Action) -> Result<(), Rejection> {
    match action {
        Action::Enqueue { item } => {
            if state.has_queue_item(&item.id) {
                return Err(Rejection::DuplicateQueueItem);
            }
            state.queues.push(item.clone());
        }
        Action::Cancel { item_id } => {
            let Some(index) = state.queues.iter().position(|item| &item.id == item_id) else {
                return Err(Rejection::UnknownQueueItem);
            };
            state.queues.remove(index);
        }
        Action::ActivatePolicy { effect } => {
            if state.has_policy(&effect.id) {
                return Err(Rejection::DuplicatePolicy);
            }
            state.policies.push(effect.clone());
        }
    }
    Ok(())
}

/// Apply actions in order, recording an `action_rejected` event for each
/// command that cannot be honoured.
#[must_use]
pub fn apply_actions(
    mut state: CampaignState,
    actions: &[Action],
    events: &mut EventLog,
) -> CampaignState {
    for (index, action) in actions.iter().enumerate() {
        if let Err(reason) = apply_action(&mut state, action) {
            warn!(
                "{} rejected {} {}: {}",
                state.id,
                action.name(),
                action.subject(),
                reason.as_str()
            );
            events.push(
                EventKind::ActionRejected,
                &[action.name()],
                json!({
                    "index": index,
                    "action": action.name(),
                    "subject": action.subject(),
                    "reason": reason.as_str(),
                }),
            );
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CampaignId, PolicyKind, QueueKind};

    fn farm(id: &str) -> QueueItem {
        QueueItem::new(id, QueueKind::Building, "farm", 5.0)
    }

    #[test]
    fn actions_apply_in_order() {
        let actions = [
            Action::Enqueue { item: farm("a") },
            Action::Enqueue { item: farm("b") },
            Action::Cancel {
                item_id: "a".into(),
            },
            Action::ActivatePolicy {
                effect: PolicyEffect::new("tax", PolicyKind::TaxBoost, 5.0, 2),
            },
        ];
        let mut events = EventLog::new(1);
        let state = apply_actions(CampaignState::new(CampaignId(3)), &actions, &mut events);
        assert!(events.is_empty());
        assert_eq!(state.queues.len(), 1);
        assert_eq!(state.queues[0].id, "b");
        assert!(state.has_policy("tax"));
    }

    #[test]
    fn rejected_actions_leave_state_untouched() {
        let start = CampaignState::new(CampaignId(3)).with_queue(vec![farm("a")]);
        let actions = [
            Action::Enqueue { item: farm("a") },
            Action::Cancel {
                item_id: "ghost".into(),
            },
        ];
        let mut events = EventLog::new(1);
        let state = apply_actions(start.clone(), &actions, &mut events);
        assert_eq!(state, start);
        assert_eq!(events.len(), 2);
        let reasons: Vec<&str> = events
            .of_kind(&EventKind::ActionRejected)
            .filter_map(|event| event.payload["reason"].as_str())
            .collect();
        assert_eq!(reasons, vec!["duplicate_queue_item", "unknown_queue_item"]);
    }

    #[test]
    fn duplicate_policy_is_rejected() {
        let effect = PolicyEffect::new("tax", PolicyKind::TaxBoost, 5.0, 2);
        let start = CampaignState::new(CampaignId(3)).with_policies(vec![effect.clone()]);
        let mut events = EventLog::new(1);
        let state = apply_actions(start, &[Action::ActivatePolicy { effect }], &mut events);
        assert_eq!(state.policies.len(), 1);
        assert_eq!(events.events()[0].payload["reason"], "duplicate_policy");
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let json = r#"[
            {"type": "enqueue", "item": {"id": "q1", "kind": "research", "target_id": "hydroponics", "total_work": 3.0}},
            {"type": "cancel", "item_id": "q1"}
        ]"#;
        let actions: Vec<Action> = serde_json::from_str(json).expect("actions parse");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1].name(), "cancel");
    }
}
