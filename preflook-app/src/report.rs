use anyhow::{Context, Result};
use preflook_core::{StoppingRule, TrialConfig, Verdict, format_duration};
use preflook_experiment::{SessionReport, TrialOutcome, UnsavedLog};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Running => "running",
        Verdict::Success => "success",
        Verdict::Failed => "failed",
    }
}

fn describe_rule(rule: &StoppingRule) -> String {
    let secs = |d: Duration| format!("{}s", format_duration(d));
    let mut parts = Vec::new();
    if let Some(total) = rule.total_image_time {
        parts.push(format!("image time > {}", secs(total)));
    }
    if let Some(window) = rule.post_first_look_window {
        let mut part = format!("{} after first look", secs(window));
        if let Some(min) = rule.min_image_time {
            part.push_str(&format!(", needs image time > {}", secs(min)));
        }
        parts.push(part);
    }
    parts.join(" or ")
}

pub fn outcome_line(outcome: &TrialOutcome) -> String {
    let mut line = format!(
        "{}: {} after {}s (away {}s, left {}s, right {}s)",
        outcome.trial,
        verdict_label(outcome.verdict),
        format_duration(outcome.elapsed),
        format_duration(outcome.dwell.away),
        format_duration(outcome.dwell.left),
        format_duration(outcome.dwell.right),
    );
    match &outcome.path {
        Some(path) => line.push_str(&format!(" -> {}", path.display())),
        None => line.push_str(" (log not written)"),
    }
    line
}

pub fn print_trials(trials: &[TrialConfig]) {
    println!("{} trial(s) OK", trials.len());
    for (i, trial) in trials.iter().enumerate() {
        println!("  {}. {}: ends at {}", i + 1, trial.name(), describe_rule(trial.rule()));
    }
}

pub fn print_summary(report: &SessionReport) {
    for outcome in &report.outcomes {
        println!("{}", outcome_line(outcome));
    }
    if report.aborted {
        println!(
            "Session aborted after {} completed trial(s).",
            report.outcomes.len()
        );
    } else {
        println!("All {} trial(s) completed.", report.outcomes.len());
    }
}

/// Tells the user about a log that could not be written and dumps it to
/// stdout so the data is not lost.
pub fn print_unsaved(unsaved: &UnsavedLog) {
    eprintln!(
        "Failed to write the log of \"{}\" to {:?}: {}",
        unsaved.trial, unsaved.path, unsaved.error
    );
    eprintln!("Dumping it to stdout instead:");
    print!("{}", unsaved.log.to_csv_string());
}

/// Machine-readable session summary, durations in seconds.
pub fn write_summary_json(path: &Path, report: &SessionReport) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("writing summary to {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflook_core::Dwell;
    use std::path::PathBuf;

    fn outcome(path: Option<PathBuf>) -> TrialOutcome {
        TrialOutcome {
            trial: "Trial 1".into(),
            verdict: Verdict::Success,
            dwell: Dwell {
                away: Duration::from_millis(250),
                left: Duration::from_millis(2050),
                right: Duration::ZERO,
            },
            elapsed: Duration::from_millis(2300),
            path,
        }
    }

    #[test]
    fn rule_descriptions() {
        let rule = StoppingRule::image_time(Duration::from_secs(2));
        assert_eq!(describe_rule(&rule), "image time > 2.000000s");

        let rule = StoppingRule::window(Duration::from_secs(5), Some(Duration::from_millis(1500)));
        assert_eq!(
            describe_rule(&rule),
            "5.000000s after first look, needs image time > 1.500000s"
        );
    }

    #[test]
    fn outcome_summary() {
        let saved = outcome(Some(PathBuf::from("out/Trial 1.csv")));
        assert_eq!(
            outcome_line(&saved),
            "Trial 1: success after 2.300000s (away 0.250000s, left 2.050000s, right 0.000000s) -> out/Trial 1.csv"
        );
        assert!(outcome_line(&outcome(None)).ends_with("right 0.000000s) (log not written)"));
    }

    #[test]
    fn summary_json_has_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let report = SessionReport {
            outcomes: vec![outcome(None)],
            aborted: true,
            unsaved: Vec::new(),
        };
        write_summary_json(&path, &report).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["aborted"], true);
        assert_eq!(value["outcomes"][0]["trial"], "Trial 1");
        assert_eq!(value["outcomes"][0]["verdict"], "success");
        assert_eq!(value["outcomes"][0]["dwell"]["left"], 2.05);
        assert!(value["outcomes"][0]["path"].is_null());
        assert_eq!(value["unsaved"], serde_json::json!([]));
    }
}
