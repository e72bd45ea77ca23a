use anyhow::{Context, Result};
use colored::Colorize;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use empire_sim::constants::REQUIRED_KPIS;
use empire_sim::{KpiDelta, MemoryStore, SimConfig, StepEngine, StepOutcome, compare};

use crate::scenarios::{SCENARIO_CAMPAIGN, Scenario, ScenarioRun};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: String,
    pub passed: bool,
    pub steps_run: u64,
    pub failures: Vec<String>,
    pub events_emitted: usize,
    pub rng_draws: u64,
    pub final_resources: BTreeMap<String, i64>,
    pub development_level: Option<String>,
    /// Movement of numeric KPIs between the first and last committed step.
    pub kpi_changes: BTreeMap<String, KpiDelta>,
    #[serde(with = "duration_serde")]
    pub average_step: Duration,
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u64::deserialize(deserializer)?;
        Ok(Duration::from_micros(micros))
    }
}

pub struct ScenarioRunner {
    config: SimConfig,
    steps: u64,
    verbose: bool,
}

impl ScenarioRunner {
    pub const fn new(config: SimConfig, steps: u64, verbose: bool) -> Self {
        Self {
            config,
            steps,
            verbose,
        }
    }

    pub fn run_scenario(&self, scenario: &Scenario, seeds: &[String]) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|seed| {
                if self.verbose {
                    println!(
                        "🧪 Running scenario: {} (seed {:?}, {} steps)",
                        scenario.key.bright_white(),
                        seed,
                        self.steps
                    );
                }
                self.run_single(scenario, seed)
            })
            .collect()
    }

    fn run_single(&self, scenario: &Scenario, seed: &str) -> ScenarioResult {
        let mut failures = Vec::new();
        let started = Instant::now();

        let primary = match self.execute(scenario, seed) {
            Ok(run) => run,
            Err(err) => {
                failures.push(format!("{err:#}"));
                ScenarioRun {
                    outcomes: Vec::new(),
                }
            }
        };
        let elapsed = started.elapsed();

        failures.extend(check_invariants(&primary));

        match self.execute(scenario, seed) {
            Ok(replay) if replay.outcomes != primary.outcomes => {
                failures.push("replay with identical seed diverged".to_string());
            }
            Ok(_) => {}
            Err(err) => failures.push(format!("replay failed: {err:#}")),
        }

        if let Err(err) = scenario.check(&primary) {
            failures.push(format!("expectation: {err:#}"));
        }

        debug!(
            "scenario {} seed {seed:?}: {} steps, {} failures",
            scenario.key,
            primary.outcomes.len(),
            failures.len()
        );
        summarize(scenario, seed, &primary, failures, elapsed)
    }

    fn execute(&self, scenario: &Scenario, seed: &str) -> Result<ScenarioRun> {
        let store = MemoryStore::with_campaigns([scenario.initial_state()]);
        let engine = StepEngine::with_config(store, self.config.clone())
            .context("invalid simulation config")?;
        let mut outcomes = Vec::new();
        for step in 1..=self.steps {
            let actions = scenario.actions_for(step);
            let outcome = engine
                .step(SCENARIO_CAMPAIGN, &step_seed(seed, step), &actions)
                .with_context(|| format!("step {step} failed"))?;
            outcomes.push(outcome);
        }
        Ok(ScenarioRun { outcomes })
    }
}

/// Each step gets its own stream derived from the run seed.
pub fn step_seed(seed: &str, step: u64) -> String {
    format!("{seed}:{step}")
}

fn check_invariants(run: &ScenarioRun) -> Vec<String> {
    let mut failures = Vec::new();
    for outcome in &run.outcomes {
        let step = outcome.state.step;
        for (name, amount) in outcome.state.resources.iter() {
            if amount < 0 {
                failures.push(format!("step {step}: {name} went negative ({amount})"));
            }
        }
        for key in REQUIRED_KPIS {
            if !outcome.state.kpis.contains_key(key) {
                failures.push(format!("step {step}: missing KPI {key}"));
            }
        }
    }
    let steps: Vec<u64> = run.outcomes.iter().map(|o| o.state.step).collect();
    if steps.windows(2).any(|pair| pair[1] != pair[0] + 1) {
        failures.push(format!("step counter not sequential: {steps:?}"));
    }
    failures
}

fn summarize(
    scenario: &Scenario,
    seed: &str,
    run: &ScenarioRun,
    failures: Vec<String>,
    elapsed: Duration,
) -> ScenarioResult {
    let outcomes: &[StepOutcome] = &run.outcomes;
    let kpi_changes = match (outcomes.first(), outcomes.last()) {
        (Some(first), Some(last)) => compare(&first.state.kpis, &last.state.kpis),
        _ => BTreeMap::new(),
    };
    let final_state = run.final_state();
    let steps_run = u64::try_from(outcomes.len()).unwrap_or(u64::MAX);
    let average_step = if outcomes.is_empty() {
        Duration::ZERO
    } else {
        elapsed / u32::try_from(outcomes.len()).unwrap_or(u32::MAX)
    };

    ScenarioResult {
        scenario_name: scenario.key.to_string(),
        seed: seed.to_string(),
        passed: failures.is_empty(),
        steps_run,
        failures,
        events_emitted: outcomes.iter().map(|o| o.events.len()).sum(),
        rng_draws: outcomes.iter().map(|o| o.rng_draws).sum(),
        final_resources: final_state
            .map(|state| {
                state
                    .resources
                    .iter()
                    .map(|(name, amount)| (name.to_string(), amount))
                    .collect()
            })
            .unwrap_or_default(),
        development_level: final_state
            .and_then(|state| state.kpis.label("development_level"))
            .map(str::to_string),
        kpi_changes,
        average_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{all_scenarios, get_scenario};

    #[test]
    fn every_scenario_passes_with_defaults() {
        let runner = ScenarioRunner::new(SimConfig::default(), 6, false);
        for scenario in all_scenarios() {
            let results = runner.run_scenario(&scenario, &["1337".to_string()]);
            assert_eq!(results.len(), 1);
            let result = &results[0];
            assert!(result.passed, "{}: {:?}", scenario.key, result.failures);
            assert_eq!(result.steps_run, 6);
        }
    }

    #[test]
    fn invalid_config_is_reported_as_failure() {
        let mut config = SimConfig::default();
        config.pricing.price_min = 0.0;
        let runner = ScenarioRunner::new(config, 2, false);
        let scenario = get_scenario("baseline").expect("baseline");
        let result = &runner.run_scenario(&scenario, &["x".to_string()])[0];
        assert!(!result.passed);
        assert_eq!(result.steps_run, 0);
        assert!(result.failures[0].contains("invalid simulation config"));
    }

    #[test]
    fn step_seeds_are_distinct_per_step() {
        assert_ne!(step_seed("a", 1), step_seed("a", 2));
        assert_eq!(step_seed("a", 1), "a:1");
    }

    #[test]
    fn kpi_changes_cover_numeric_kpis() {
        let runner = ScenarioRunner::new(SimConfig::default(), 3, false);
        let scenario = get_scenario("baseline").expect("baseline");
        let result = &runner.run_scenario(&scenario, &["seed".to_string()])[0];
        assert!(result.kpi_changes.contains_key("total_resources"));
        assert!(!result.kpi_changes.contains_key("resource_prices"));
    }
}
