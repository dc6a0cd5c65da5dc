//! The `quizkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizkit.toml").exists() {
        println!("quizkit.toml already exists, skipping.");
    } else {
        std::fs::write("quizkit.toml", SAMPLE_CONFIG)?;
        println!("Created quizkit.toml");
    }

    std::fs::create_dir_all("quizzes")?;
    for (path, content) in [
        ("quizzes/example.toml", EXAMPLE_TEST),
        ("quizzes/example-attempts.json", EXAMPLE_ATTEMPTS),
    ] {
        if std::path::Path::new(path).exists() {
            println!("{path} already exists, skipping.");
        } else {
            std::fs::write(path, content)?;
            println!("Created {path}");
        }
    }

    println!("\nNext steps:");
    println!("  1. Edit quizkit.toml with your gateway URL");
    println!("  2. Run: quizkit validate --test quizzes/example.toml");
    println!(
        "  3. Run: quizkit grade --test quizzes/example.toml --attempts quizzes/example-attempts.json"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizkit configuration

# ${VAR} references are expanded; QUIZKIT_BASE_URL overrides this value.
base_url = "http://localhost:5000"
refresh_interval_secs = 300
request_timeout_ms = 10000
notification_secs = 5
credit_policy = "symmetric-difference"
session_file = ".quizkit-session.json"
"#;

const EXAMPLE_TEST: &str = r#"[test]
id = "example"
name = "Example Test"
description = "A short test to get started"
pass_percents = 60

[[tasks]]
type = "single-choice"
question = "9 * 12 = ?"
tag = "easy"
options = ["96", "108", "120"]
answer = 1
points = 10

[[tasks]]
type = "multiple-choice"
question = "Which numbers leave remainder 1 when divided by 3?"
tag = "medium"
options = ["988", "254", "1684", "403"]
answer = [0, 2, 3]
points = 20
"#;

const EXAMPLE_ATTEMPTS: &str = r#"[
  { "solved_by": "anna", "answers": [1, [0, 2, 3]] },
  { "solved_by": "ben", "answers": [0, [0, 1]] }
]
"#;
