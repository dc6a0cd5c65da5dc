//! Test definition parser.
//!
//! Loads tests from TOML or JSON files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Task, Test, TestInfo};

/// Intermediate TOML structure: a `[test]` header followed by `[[tasks]]`.
#[derive(Debug, Deserialize)]
struct TomlTestFile {
    test: TomlTestHeader,
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Debug, Deserialize)]
struct TomlTestHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_pass_percents")]
    pass_percents: f64,
}

fn default_pass_percents() -> f64 {
    50.0
}

/// Parse a single test definition file. `.json` files hold a serialized
/// [`Test`]; everything else is read as TOML.
pub fn parse_test(path: &Path) -> Result<Test> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))
    } else {
        parse_test_str(&content, path)
    }
}

/// Parse a TOML string into a `Test`.
pub fn parse_test_str(content: &str, source_path: &Path) -> Result<Test> {
    let parsed: TomlTestFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(Test {
        info: TestInfo {
            id: parsed.test.id,
            name: parsed.test.name,
            description: parsed.test.description,
        },
        tasks: parsed.tasks,
        pass_percents: parsed.test.pass_percents,
    })
}

/// Recursively load all `.toml` and `.json` test files from a directory.
/// Files that fail to parse are skipped with a warning.
pub fn load_test_directory(dir: &Path) -> Result<Vec<Test>> {
    let mut tests = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            tests.extend(load_test_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_test(&path) {
                Ok(test) => tests.push(test),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(tests)
}

/// A warning from test validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// Index of the offending task, if the warning is about one.
    pub task: Option<usize>,
    pub message: String,
}

impl ValidationWarning {
    fn test(message: impl Into<String>) -> Self {
        Self {
            task: None,
            message: message.into(),
        }
    }

    fn task(index: usize, message: impl Into<String>) -> Self {
        Self {
            task: Some(index),
            message: message.into(),
        }
    }
}

/// Validate a test for issues that parse fine but grade badly.
pub fn validate_test(test: &Test) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if test.tasks.is_empty() {
        warnings.push(ValidationWarning::test("test has no tasks"));
    }

    if !(0.0..=100.0).contains(&test.pass_percents) {
        warnings.push(ValidationWarning::test(format!(
            "pass_percents {} is outside 0-100",
            test.pass_percents
        )));
    }

    for (index, task) in test.tasks.iter().enumerate() {
        if task.question.trim().is_empty() {
            warnings.push(ValidationWarning::task(index, "question is empty"));
        }

        if task.points == 0 {
            warnings.push(ValidationWarning::task(index, "task is worth 0 points"));
        }

        let options = task.options.len();
        for answer in task.answer_indices() {
            if answer >= options {
                warnings.push(ValidationWarning::task(
                    index,
                    format!("answer index {answer} is out of range ({options} options)"),
                ));
            }
        }

        let mut seen = HashSet::new();
        for option in &task.options {
            if !seen.insert(option.trim()) {
                warnings.push(ValidationWarning::task(
                    index,
                    format!("duplicate option: {option}"),
                ));
            }
        }
    }

    warnings
}
