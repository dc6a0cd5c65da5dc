//! The `quizkit validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(test_path: PathBuf) -> Result<()> {
    let tests = if test_path.is_dir() {
        quizkit_core::parser::load_test_directory(&test_path)?
    } else {
        vec![quizkit_core::parser::parse_test(&test_path)?]
    };

    let mut total_warnings = 0;

    for test in &tests {
        println!(
            "Test: {} ({} tasks, {} points)",
            test.info.name,
            test.tasks.len(),
            test.overall_points()
        );

        let warnings = quizkit_core::parser::validate_test(test);
        for w in &warnings {
            let prefix = w
                .task
                .map(|index| format!("  [task {}]", index + 1))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All tests valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
