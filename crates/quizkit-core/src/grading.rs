//! Grading single answers and scoring whole attempts.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GradingError, ScoringError};
use crate::model::{Answer, Task, TaskKind, Test, TestSolutionAttempt};
use crate::results::CheckedAttempt;

/// How a multiple-choice answer that only partially matches the key is scored.
///
/// An exact match always earns the full points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreditPolicy {
    /// Anything short of an exact match earns 0.
    AllOrNothing,
    /// Each option counts as one decision; every option on which the
    /// submission disagrees with the key (the symmetric difference) costs
    /// `points / options`.
    #[default]
    SymmetricDifference,
}

impl fmt::Display for CreditPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditPolicy::AllOrNothing => write!(f, "all-or-nothing"),
            CreditPolicy::SymmetricDifference => write!(f, "symmetric-difference"),
        }
    }
}

impl FromStr for CreditPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all-or-nothing" | "strict" => Ok(CreditPolicy::AllOrNothing),
            "symmetric-difference" | "partial" => Ok(CreditPolicy::SymmetricDifference),
            other => Err(format!("unknown credit policy: {other}")),
        }
    }
}

/// Grades one answer against one task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskGrader {
    policy: CreditPolicy,
}

impl TaskGrader {
    pub fn new(policy: CreditPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CreditPolicy {
        self.policy
    }

    /// Points earned by `answer`, in `0..=task.points`.
    pub fn grade(&self, task: &Task, answer: &Answer) -> Result<f64, GradingError> {
        let options = task.options.len();
        let check_range = |index: usize| {
            if index < options {
                Ok(())
            } else {
                Err(GradingError::OptionOutOfRange { index, options })
            }
        };

        match (&task.kind, answer) {
            (TaskKind::SingleChoice { answer: expected }, Answer::Single(submitted)) => {
                check_range(*submitted)?;
                Ok(if submitted == expected {
                    task.points as f64
                } else {
                    0.0
                })
            }
            (TaskKind::MultipleChoice { answer: expected }, Answer::Multiple(submitted)) => {
                for &index in submitted {
                    check_range(index)?;
                }
                Ok(self.multiple_choice_points(task, expected, submitted))
            }
            _ => Err(GradingError::AnswerShape {
                expected: task.task_type(),
                found: answer.task_type(),
            }),
        }
    }

    fn multiple_choice_points(
        &self,
        task: &Task,
        expected: &BTreeSet<usize>,
        submitted: &BTreeSet<usize>,
    ) -> f64 {
        let points = task.points as f64;
        if expected == submitted {
            return points;
        }
        match self.policy {
            CreditPolicy::AllOrNothing => 0.0,
            CreditPolicy::SymmetricDifference => {
                let options = task.options.len();
                if options == 0 {
                    return points;
                }
                let wrong = expected.symmetric_difference(submitted).count();
                let correct = options.saturating_sub(wrong);
                correct as f64 / options as f64 * points
            }
        }
    }
}

/// Scores a whole attempt against a test.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestScorer {
    grader: TaskGrader,
}

impl TestScorer {
    pub fn new(policy: CreditPolicy) -> Self {
        Self {
            grader: TaskGrader::new(policy),
        }
    }

    pub fn grader(&self) -> &TaskGrader {
        &self.grader
    }

    /// Grade every answer and derive the totals.
    ///
    /// Fails without a partial result if the answer count differs from the
    /// task count or any single answer cannot be graded.
    pub fn score(
        &self,
        test: &Test,
        attempt: TestSolutionAttempt,
    ) -> Result<CheckedAttempt, ScoringError> {
        if attempt.answers.len() != test.tasks.len() {
            return Err(ScoringError::ShapeMismatch {
                tasks: test.tasks.len(),
                answers: attempt.answers.len(),
            });
        }

        let task_points = test
            .tasks
            .iter()
            .zip(&attempt.answers)
            .enumerate()
            .map(|(task, (t, a))| {
                self.grader
                    .grade(t, a)
                    .map_err(|source| ScoringError::Grading { task, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CheckedAttempt::from_task_points(
            attempt,
            task_points,
            test.overall_points(),
            test.pass_percents,
        ))
    }
}
