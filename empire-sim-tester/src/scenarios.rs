use anyhow::{Result, bail, ensure};

use empire_sim::constants::KPI_LOGISTICS_STRAIN;
use empire_sim::{
    Action, Buildings, CampaignId, CampaignState, EventKind, PolicyEffect, PolicyKind, QueueItem,
    QueueKind, Resources, StepOutcome,
};

/// Campaign id used by every scenario run; each run gets its own store.
pub const SCENARIO_CAMPAIGN: CampaignId = CampaignId(1);

/// Record of one executed scenario, handed to the expectation hook.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub outcomes: Vec<StepOutcome>,
}

impl ScenarioRun {
    pub fn final_state(&self) -> Option<&CampaignState> {
        self.outcomes.last().map(|outcome| &outcome.state)
    }

    pub fn events_of(&self, kind: &EventKind) -> usize {
        self.outcomes
            .iter()
            .flat_map(|outcome| &outcome.events)
            .filter(|event| &event.kind == kind)
            .count()
    }
}

pub type Expectation = fn(&ScenarioRun) -> Result<()>;

#[derive(Debug, Clone)]
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    setup: fn() -> CampaignState,
    actions: fn(u64) -> Vec<Action>,
    expectation: Option<Expectation>,
}

impl Scenario {
    const fn new(
        key: &'static str,
        description: &'static str,
        setup: fn() -> CampaignState,
    ) -> Self {
        Self {
            key,
            description,
            setup,
            actions: no_actions,
            expectation: None,
        }
    }

    const fn with_actions(mut self, actions: fn(u64) -> Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    const fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectation = Some(expectation);
        self
    }

    pub fn initial_state(&self) -> CampaignState {
        (self.setup)()
    }

    /// Actions submitted before the step that will become `step`.
    pub fn actions_for(&self, step: u64) -> Vec<Action> {
        (self.actions)(step)
    }

    /// Scenario-specific checks on a completed run.
    ///
    /// # Errors
    ///
    /// Returns a description of the violated expectation.
    pub fn check(&self, run: &ScenarioRun) -> Result<()> {
        self.expectation.map_or(Ok(()), |expect| expect(run))
    }
}

fn no_actions(_step: u64) -> Vec<Action> {
    Vec::new()
}

pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "baseline",
            "Starter colony with a balanced building mix",
            baseline_state,
        )
        .with_expectation(expect_credit_growth),
        Scenario::new(
            "stalled-queue",
            "Spaceport order that can never be paid for",
            stalled_queue_state,
        )
        .with_expectation(expect_spaceport_still_queued),
        Scenario::new(
            "overloaded-logistics",
            "Huge stockpile on a tiny logistics network",
            overloaded_state,
        )
        .with_expectation(expect_logistics_strain),
        Scenario::new(
            "policy-cycle",
            "Tax boost expiry plus queued orders added and cancelled mid-run",
            baseline_state,
        )
        .with_actions(policy_cycle_actions)
        .with_expectation(expect_policy_expired),
    ]
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    all_scenarios()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

pub fn get_scenario(key: &str) -> Option<Scenario> {
    all_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

/// Expand `all` into every registered scenario key, keeping other keys as given.
pub fn expand_scenarios(keys: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = keys.iter().filter(|k| *k != "all").cloned().collect();
    if keys.iter().any(|k| k == "all") {
        for (key, _) in list_scenarios() {
            if !expanded.iter().any(|k| k == key) {
                expanded.push(key.to_string());
            }
        }
    }
    expanded
}

fn baseline_state() -> CampaignState {
    CampaignState::new(SCENARIO_CAMPAIGN)
        .with_resources(Resources::from([
            ("credits", 1_000),
            ("materials", 500),
            ("energy", 200),
            ("food", 300),
        ]))
        .with_buildings(Buildings::from([
            ("factory", 2),
            ("mine", 1),
            ("farm", 3),
            ("power_plant", 1),
        ]))
}

fn stalled_queue_state() -> CampaignState {
    CampaignState::new(SCENARIO_CAMPAIGN)
        .with_resources(Resources::from([("materials", 400), ("energy", 400)]))
        .with_queue(vec![
            QueueItem::new("port", QueueKind::Building, "spaceport", 30.0).with_progress(29.0),
        ])
}

fn overloaded_state() -> CampaignState {
    CampaignState::new(SCENARIO_CAMPAIGN)
        .with_resources(Resources::from([
            ("credits", 20_000),
            ("materials", 15_000),
            ("energy", 8_000),
            ("food", 6_000),
        ]))
        .with_buildings(Buildings::from([("market", 2), ("research_lab", 1)]))
}

fn policy_cycle_actions(step: u64) -> Vec<Action> {
    match step {
        1 => vec![
            Action::ActivatePolicy {
                effect: PolicyEffect::new("tax-drive", PolicyKind::TaxBoost, 40.0, 2),
            },
            Action::Enqueue {
                item: QueueItem::new("lab-1", QueueKind::Building, "research_lab", 6.0),
            },
            Action::Enqueue {
                item: QueueItem::new("hydro", QueueKind::Research, "hydroponics", 2.0)
                    .with_priority(2),
            },
        ],
        2 => vec![Action::Cancel {
            item_id: "lab-1".to_string(),
        }],
        _ => Vec::new(),
    }
}

fn expect_credit_growth(run: &ScenarioRun) -> Result<()> {
    let Some(first) = run.outcomes.first() else {
        bail!("no steps executed");
    };
    ensure!(
        first.state.resources.get("credits") > 1_000,
        "first step should grow credits, got {}",
        first.state.resources.get("credits")
    );
    Ok(())
}

fn expect_spaceport_still_queued(run: &ScenarioRun) -> Result<()> {
    let Some(state) = run.final_state() else {
        bail!("no steps executed");
    };
    ensure!(state.has_queue_item("port"), "stalled spaceport order vanished");
    ensure!(
        state.buildings.count("spaceport") == 0,
        "spaceport completed without payment"
    );
    Ok(())
}

fn expect_logistics_strain(run: &ScenarioRun) -> Result<()> {
    let Some(first) = run.outcomes.first() else {
        bail!("no steps executed");
    };
    let strain = first.state.kpis.number(KPI_LOGISTICS_STRAIN).unwrap_or(0.0);
    ensure!(strain > 0.0, "expected logistics strain, got {strain}");
    Ok(())
}

fn expect_policy_expired(run: &ScenarioRun) -> Result<()> {
    if run.outcomes.len() < 3 {
        return Ok(());
    }
    ensure!(
        run.events_of(&EventKind::PolicyExpired) >= 1,
        "tax boost never expired"
    );
    Ok(())
}
