//! The `quizkit grade` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use quizkit_core::grading::{CreditPolicy, TestScorer};
use quizkit_core::model::{Answer, Test, TestSolutionAttempt};
use quizkit_core::results::CheckedAttempt;
use quizkit_core::subject::TestInstance;

/// Attempt as written by hand; `solved_at` defaults to now.
#[derive(Debug, Deserialize)]
struct AttemptInput {
    solved_by: String,
    #[serde(default)]
    solved_at: Option<DateTime<Utc>>,
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AttemptFile {
    One(AttemptInput),
    Many(Vec<AttemptInput>),
}

impl From<AttemptInput> for TestSolutionAttempt {
    fn from(input: AttemptInput) -> Self {
        let mut attempt = TestSolutionAttempt::new(input.solved_by, input.answers);
        if let Some(at) = input.solved_at {
            attempt.solved_at = at;
        }
        attempt
    }
}

fn load_attempts(path: &Path) -> Result<Vec<TestSolutionAttempt>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attempts: {}", path.display()))?;
    let parsed: AttemptFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse attempts: {}", path.display()))?;

    let inputs = match parsed {
        AttemptFile::One(one) => vec![one],
        AttemptFile::Many(many) => many,
    };
    Ok(inputs.into_iter().map(Into::into).collect())
}

pub fn execute(
    test_path: PathBuf,
    attempts_path: PathBuf,
    policy: Option<CreditPolicy>,
    remark: String,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let policy = match policy {
        Some(p) => p,
        None if config_path.is_some() => {
            quizkit_client::load_config_from(config_path.as_deref())?.credit_policy
        }
        None => CreditPolicy::default(),
    };

    let test = quizkit_core::parser::parse_test(&test_path)?;
    let attempts = load_attempts(&attempts_path)?;
    let scorer = TestScorer::new(policy);

    let mut instance = TestInstance::new(test, remark, "quizkit");
    for attempt in attempts {
        let solved_by = attempt.solved_by.clone();
        instance
            .submit(attempt, &scorer)
            .with_context(|| format!("failed to grade attempt by {solved_by}"))?;
    }

    match format.as_str() {
        "json" => {
            let json = serde_json::json!({
                "attempts": instance.solution_attempts(),
                "summary": instance.summary(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        "text" => print_text(&instance.test, instance.solution_attempts(), policy),
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&instance)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write instance: {}", path.display()))?;
        eprintln!("Instance written to {}", path.display());
    }

    Ok(())
}

fn print_text(test: &Test, attempts: &[CheckedAttempt], policy: CreditPolicy) {
    use comfy_table::{Cell, Table};

    println!(
        "Test: {} ({} tasks, {} points, pass at {}%, {policy})",
        test.info.name,
        test.tasks.len(),
        test.overall_points(),
        test.pass_percents
    );

    let mut table = Table::new();
    table.set_header(vec!["Student", "Task points", "Points", "Percent", "Result"]);
    for attempt in attempts {
        let per_task = attempt
            .task_points()
            .iter()
            .zip(&test.tasks)
            .map(|(got, task)| format!("{}/{}", fmt_points(*got), task.points))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(attempt.solved_by()),
            Cell::new(per_task),
            Cell::new(format!(
                "{}/{}",
                fmt_points(attempt.attempt_points()),
                attempt.overall_points()
            )),
            Cell::new(format!("{:.1}%", attempt.attempt_percents())),
            Cell::new(if attempt.passed() { "PASSED" } else { "FAILED" }),
        ]);
    }
    println!("{table}");

    let summary = quizkit_core::statistics::summarize(attempts);
    println!(
        "{} attempt(s), {} passed, average {:.1}%",
        summary.attempts_count, summary.passed, summary.average
    );
}

/// Whole points print without decimals.
pub fn fmt_points(points: f64) -> String {
    if points.fract().abs() < 1e-9 {
        format!("{points:.0}")
    } else {
        format!("{points:.2}")
    }
}
