//! Policy countdown and per-tick effects. Draws no randomness.
use log::debug;
use serde_json::json;

use crate::constants::RESOURCE_CREDITS;
use crate::event::{EventKind, EventLog};
use crate::pipeline::{StageCtx, Tick};
use crate::state::{CampaignState, PolicyEffect, PolicyKind};

pub fn reduce(tick: Tick, _ctx: &mut StageCtx<'_>) -> Tick {
    let Tick {
        mut state,
        mut events,
    } = tick;
    let policies = std::mem::take(&mut state.policies);
    let mut active = Vec::with_capacity(policies.len());
    for mut policy in policies {
        // Already spent on arrival: expire without a final application.
        if policy.remaining_ticks == 0 {
            expire(&state, &policy, &mut events);
            continue;
        }
        policy.remaining_ticks -= 1;
        apply_effect(&mut state, &mut policy);
        if policy.remaining_ticks == 0 {
            expire(&state, &policy, &mut events);
        } else {
            active.push(policy);
        }
    }
    state.policies = active;
    Tick { state, events }
}

fn apply_effect(state: &mut CampaignState, policy: &mut PolicyEffect) {
    match policy.kind {
        PolicyKind::TaxBoost => {
            let credits = policy.take_whole_credits();
            state.resources.add_clamped(RESOURCE_CREDITS, credits);
        }
        PolicyKind::Other(_) => {}
    }
}

fn expire(state: &CampaignState, policy: &PolicyEffect, events: &mut EventLog) {
    debug!("{} policy {} expired", state.id, policy.id);
    events.push(
        EventKind::PolicyExpired,
        &[policy.kind.as_str()],
        json!({ "policyId": policy.id, "kind": policy.kind.as_str() }),
    );
}
