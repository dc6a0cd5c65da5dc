//! The `quizkit summarize` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizkit_core::subject::TestInstance;

use super::grade::fmt_points;

pub fn execute(instance_path: PathBuf, student: Option<String>, format: String) -> Result<()> {
    let content = std::fs::read_to_string(&instance_path)
        .with_context(|| format!("failed to read instance: {}", instance_path.display()))?;
    let instance: TestInstance = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse instance: {}", instance_path.display()))?;

    if let Some(student) = student {
        let view = instance.for_student(&student);
        match format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&view)?),
            "text" => {
                println!("Test: {} ({})", view.test.info.name, student);
                if view.solution_attempts.is_empty() {
                    println!("No attempts.");
                }
                for attempt in &view.solution_attempts {
                    println!(
                        "  {}: {}/{} ({:.1}%) {}",
                        attempt.solution_attempt().solved_at.format("%Y-%m-%d %H:%M"),
                        fmt_points(attempt.attempt_points()),
                        attempt.overall_points(),
                        attempt.attempt_percents(),
                        if attempt.passed() { "PASSED" } else { "FAILED" }
                    );
                }
            }
            other => anyhow::bail!("unknown format: {other} (expected text or json)"),
        }
        return Ok(());
    }

    let summary = instance.summary();
    let task_results = instance.task_results();

    match format.as_str() {
        "json" => {
            let json = serde_json::json!({
                "test": instance.test.info,
                "remark": instance.remark,
                "summary": summary,
                "task_results": task_results,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        "text" => {
            println!("Test: {}", instance.test.info.name);
            if !instance.remark.is_empty() {
                println!("Remark: {}", instance.remark);
            }
            println!(
                "Attempts: {}, passed: {}, average: {:.1}%",
                summary.attempts_count, summary.passed, summary.average
            );

            let mut table = Table::new();
            table.set_header(vec!["#", "Question", "Type", "Option pick rates"]);
            for (index, (task, rates)) in instance.test.tasks.iter().zip(&task_results).enumerate()
            {
                let picks = task
                    .options
                    .iter()
                    .zip(rates)
                    .map(|(option, rate)| format!("{option}: {rate:.0}%"))
                    .collect::<Vec<_>>()
                    .join(", ");
                table.add_row(vec![
                    Cell::new(index + 1),
                    Cell::new(&task.question),
                    Cell::new(task.task_type()),
                    Cell::new(picks),
                ]);
            }
            println!("{table}");
        }
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}
