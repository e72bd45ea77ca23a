use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::runner::ScenarioResult;

/// KPIs highlighted in the human-readable reports.
const HEADLINE_KPIS: [&str; 5] = [
    "total_resources",
    "production_rate",
    "military_readiness",
    "science_progress",
    "infrastructure_index",
];

fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    #[allow(clippy::cast_precision_loss)]
    let rate = passed as f64 / results.len() as f64 * 100.0;
    rate
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Scenario Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;
    writeln!(out, "Total runs: {}", results.len())?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", failed.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} (seed {:?})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Steps: {}  Events: {}  RNG draws: {}  Avg step: {:?}",
            result.steps_run, result.events_emitted, result.rng_draws, result.average_step
        )?;
        if let Some(level) = &result.development_level {
            writeln!(out, "   Development: {level}")?;
        }
        for key in HEADLINE_KPIS {
            if let Some(delta) = result.kpi_changes.get(key) {
                writeln!(
                    out,
                    "   {key:22} {:>12.2} → {:>12.2} ({:+.1}%)",
                    delta.previous, delta.current, delta.percent_change
                )?;
            }
        }
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Empire Sim Scenario Results\n")?;

    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {}", results.len())?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", results.len() - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {} {} (`{}`)\n", status, result.scenario_name, result.seed)?;
        writeln!(out, "- **Steps**: {}", result.steps_run)?;
        writeln!(out, "- **Events**: {}", result.events_emitted)?;
        if let Some(level) = &result.development_level {
            writeln!(out, "- **Development level**: {level}")?;
        }
        if !result.kpi_changes.is_empty() {
            writeln!(out, "\n| KPI | First | Last | Change |")?;
            writeln!(out, "|---|---:|---:|---:|")?;
            for (key, delta) in &result.kpi_changes {
                writeln!(
                    out,
                    "| {key} | {:.2} | {:.2} | {:+.1}% |",
                    delta.previous, delta.current, delta.percent_change
                )?;
            }
        }
        if !result.failures.is_empty() {
            writeln!(out, "\n- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use empire_sim::KpiDelta;
    use std::collections::BTreeMap;

    fn sample(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "baseline".to_string(),
            seed: "1337".to_string(),
            passed,
            steps_run: 3,
            failures: if passed {
                Vec::new()
            } else {
                vec!["credits went negative".to_string()]
            },
            events_emitted: 2,
            rng_draws: 30,
            final_resources: BTreeMap::from([("credits".to_string(), 1_200)]),
            development_level: Some("developing".to_string()),
            kpi_changes: BTreeMap::from([(
                "total_resources".to_string(),
                KpiDelta::between(100.0, 150.0),
            )]),
            average_step: Duration::from_micros(40),
        }
    }

    #[test]
    fn json_report_round_trips() {
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &[sample(true)]).expect("json");
        let parsed: Vec<ScenarioResult> = serde_json::from_slice(&buf).expect("parse");
        assert_eq!(parsed[0].scenario_name, "baseline");
        assert_eq!(parsed[0].average_step, Duration::from_micros(40));
    }

    #[test]
    fn markdown_report_lists_failures_and_kpis() {
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &[sample(false)]).expect("markdown");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("# Empire Sim Scenario Results"));
        assert!(text.contains("| total_resources | 100.00 | 150.00 | +50.0% |"));
        assert!(text.contains("credits went negative"));
    }

    #[test]
    fn console_report_counts_runs() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &[sample(true), sample(false)], Duration::ZERO)
            .expect("console");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Total runs: 2"));
        assert!(text.contains("Success rate: 50.0%"));
    }
}
