//! Graded results.
//!
//! A [`CheckedAttempt`] is only ever built by the scorer (or re-read from a
//! persisted record that passes the same consistency checks), so its derived
//! fields cannot drift from the points they are derived from.

use serde::{Deserialize, Serialize};

use crate::model::{Test, TestSolutionAttempt};

const POINTS_EPSILON: f64 = 1e-9;

/// The graded result of one attempt against one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CheckedAttemptRecord")]
pub struct CheckedAttempt {
    solution_attempt: TestSolutionAttempt,
    task_points: Vec<f64>,
    attempt_points: f64,
    overall_points: u32,
    attempt_percents: f64,
    passed: bool,
}

impl CheckedAttempt {
    /// Derive totals, percentage, and the pass flag from per-task points.
    pub(crate) fn from_task_points(
        solution_attempt: TestSolutionAttempt,
        task_points: Vec<f64>,
        overall_points: u32,
        pass_percents: f64,
    ) -> Self {
        let attempt_points: f64 = task_points.iter().sum();
        let attempt_percents = percent_of(attempt_points, overall_points);
        Self {
            solution_attempt,
            task_points,
            attempt_points,
            overall_points,
            attempt_percents,
            passed: attempt_percents >= pass_percents,
        }
    }

    pub fn solution_attempt(&self) -> &TestSolutionAttempt {
        &self.solution_attempt
    }

    pub fn solved_by(&self) -> &str {
        &self.solution_attempt.solved_by
    }

    /// Points per task, aligned with the test's tasks.
    pub fn task_points(&self) -> &[f64] {
        &self.task_points
    }

    pub fn attempt_points(&self) -> f64 {
        self.attempt_points
    }

    pub fn overall_points(&self) -> u32 {
        self.overall_points
    }

    pub fn attempt_percents(&self) -> f64 {
        self.attempt_percents
    }

    pub fn passed(&self) -> bool {
        self.passed
    }
}

impl CheckedAttempt {
    /// Check a re-read attempt against the test it claims to be graded on.
    pub(crate) fn check_against(&self, test: &Test) -> Result<(), String> {
        let who = self.solved_by();
        if self.overall_points != test.overall_points() {
            return Err(format!(
                "attempt by {who} records overall_points {} but the test is worth {}",
                self.overall_points,
                test.overall_points()
            ));
        }
        if self.task_points.len() != test.tasks.len() {
            return Err(format!(
                "attempt by {who} has {} task points but the test has {} tasks",
                self.task_points.len(),
                test.tasks.len()
            ));
        }
        if let Some(i) = self
            .task_points
            .iter()
            .zip(&test.tasks)
            .position(|(p, t)| *p > t.points as f64 + POINTS_EPSILON)
        {
            return Err(format!(
                "attempt by {who} scores {} on task {} worth {}",
                self.task_points[i],
                i + 1,
                test.tasks[i].points
            ));
        }
        if self.passed != (self.attempt_percents >= test.pass_percents) {
            return Err(format!(
                "attempt by {who} is marked passed={} at {}% with a pass mark of {}%",
                self.passed, self.attempt_percents, test.pass_percents
            ));
        }
        Ok(())
    }
}

/// `attempt / overall * 100`, or 0 when there is nothing to score.
pub fn percent_of(attempt_points: f64, overall_points: u32) -> f64 {
    if overall_points == 0 {
        0.0
    } else {
        attempt_points / overall_points as f64 * 100.0
    }
}

/// Wire shape of a persisted [`CheckedAttempt`], checked before conversion.
#[derive(Deserialize)]
struct CheckedAttemptRecord {
    solution_attempt: TestSolutionAttempt,
    task_points: Vec<f64>,
    attempt_points: f64,
    overall_points: u32,
    attempt_percents: f64,
    passed: bool,
}

impl TryFrom<CheckedAttemptRecord> for CheckedAttempt {
    type Error = String;

    fn try_from(record: CheckedAttemptRecord) -> Result<Self, Self::Error> {
        if record.task_points.len() != record.solution_attempt.answers.len() {
            return Err(format!(
                "{} task points recorded for {} answers",
                record.task_points.len(),
                record.solution_attempt.answers.len()
            ));
        }
        if record.task_points.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err("task points must be finite and non-negative".into());
        }
        let sum: f64 = record.task_points.iter().sum();
        if (sum - record.attempt_points).abs() > POINTS_EPSILON {
            return Err(format!(
                "attempt_points {} does not match the task points sum {sum}",
                record.attempt_points
            ));
        }
        if record.attempt_points > record.overall_points as f64 + POINTS_EPSILON {
            return Err(format!(
                "attempt_points {} exceeds overall_points {}",
                record.attempt_points, record.overall_points
            ));
        }
        let expected = percent_of(record.attempt_points, record.overall_points);
        if (expected - record.attempt_percents).abs() > POINTS_EPSILON {
            return Err(format!(
                "attempt_percents {} does not match {expected}",
                record.attempt_percents
            ));
        }

        Ok(Self {
            solution_attempt: record.solution_attempt,
            task_points: record.task_points,
            attempt_points: record.attempt_points,
            overall_points: record.overall_points,
            attempt_percents: record.attempt_percents,
            passed: record.passed,
        })
    }
}

/// Aggregate over a collection of checked attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    /// Number of attempts that passed.
    pub passed: usize,
    pub attempts_count: usize,
    /// Mean of `attempt_percents`, 0 when there are no attempts.
    pub average: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Answer;

    fn attempt(answers: Vec<Answer>) -> TestSolutionAttempt {
        TestSolutionAttempt::new("student", answers)
    }

    #[test]
    fn derives_totals_and_pass_flag() {
        let checked = CheckedAttempt::from_task_points(
            attempt(vec![Answer::Single(0), Answer::Single(1)]),
            vec![5.0, 0.0],
            15,
            60.0,
        );
        assert_eq!(checked.attempt_points(), 5.0);
        assert!((checked.attempt_percents() - 33.333).abs() < 0.01);
        assert!(!checked.passed());
    }

    #[test]
    fn zero_overall_points_is_zero_percent() {
        assert_eq!(percent_of(0.0, 0), 0.0);
        let checked = CheckedAttempt::from_task_points(attempt(vec![]), vec![], 0, 0.0);
        assert_eq!(checked.attempt_percents(), 0.0);
        assert!(checked.passed());
    }

    #[test]
    fn persisted_record_roundtrips() {
        let checked = CheckedAttempt::from_task_points(
            attempt(vec![Answer::Single(1)]),
            vec![10.0],
            10,
            50.0,
        );
        let json = serde_json::to_string(&checked).unwrap();
        let back: CheckedAttempt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, checked);
    }

    #[test]
    fn inconsistent_record_is_rejected() {
        let checked = CheckedAttempt::from_task_points(
            attempt(vec![Answer::Single(1)]),
            vec![10.0],
            10,
            50.0,
        );
        let mut value = serde_json::to_value(&checked).unwrap();
        value["attempt_points"] = serde_json::json!(7.0);
        let err = serde_json::from_value::<CheckedAttempt>(value).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }
}
