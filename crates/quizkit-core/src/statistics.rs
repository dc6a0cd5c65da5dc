//! Aggregate statistics over checked attempts.

use crate::model::Test;
use crate::results::{CheckedAttempt, TestSummary};

/// Summarize a collection of checked attempts.
pub fn summarize(attempts: &[CheckedAttempt]) -> TestSummary {
    let attempts_count = attempts.len();
    if attempts_count == 0 {
        return TestSummary::default();
    }

    let passed = attempts.iter().filter(|a| a.passed()).count();
    let average =
        attempts.iter().map(|a| a.attempt_percents()).sum::<f64>() / attempts_count as f64;

    TestSummary {
        passed,
        attempts_count,
        average,
    }
}

/// For every task, the percentage of attempts that picked each option.
///
/// The outer vector is aligned with `test.tasks`, the inner one with that
/// task's options. Multiple-choice percentages need not sum to 100. Answers
/// beyond the task list or indices beyond the option list are ignored.
pub fn task_results(test: &Test, attempts: &[CheckedAttempt]) -> Vec<Vec<f64>> {
    let mut counts: Vec<Vec<usize>> = test
        .tasks
        .iter()
        .map(|t| vec![0; t.options.len()])
        .collect();

    for attempt in attempts {
        for (task_counts, answer) in counts
            .iter_mut()
            .zip(&attempt.solution_attempt().answers)
        {
            for index in answer.picked() {
                if let Some(count) = task_counts.get_mut(index) {
                    *count += 1;
                }
            }
        }
    }

    let total = attempts.len();
    counts
        .into_iter()
        .map(|task_counts| {
            task_counts
                .into_iter()
                .map(|count| {
                    if total == 0 {
                        0.0
                    } else {
                        count as f64 / total as f64 * 100.0
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::TestScorer;
    use crate::model::{Answer, Task, TestInfo, TestSolutionAttempt};

    fn mini_test() -> Test {
        Test {
            info: TestInfo {
                id: "mini".into(),
                name: "Mini-Test".into(),
                description: "math tests".into(),
            },
            tasks: vec![
                Task::single_choice("9 * 12 = ?", vec!["96".into(), "108".into(), "120".into()], 1, 10),
                Task::multiple_choice(
                    "x mod 3 = 1. x?",
                    vec!["988".into(), "254".into(), "1684".into(), "403".into()],
                    [0, 2, 3],
                    10,
                ),
            ],
            pass_percents: 60.0,
        }
    }

    fn check(test: &Test, who: &str, answers: Vec<Answer>) -> CheckedAttempt {
        TestScorer::default()
            .score(test, TestSolutionAttempt::new(who, answers))
            .unwrap()
    }

    #[test]
    fn summarize_empty() {
        assert_eq!(
            summarize(&[]),
            TestSummary {
                passed: 0,
                attempts_count: 0,
                average: 0.0
            }
        );
    }

    #[test]
    fn summarize_mean_and_passed_count() {
        let test = mini_test();
        let attempts = vec![
            check(&test, "a", vec![Answer::Single(1), Answer::multiple([0, 2, 3])]),
            check(&test, "b", vec![Answer::Single(0), Answer::multiple([0, 2, 3])]),
            check(&test, "c", vec![Answer::Single(0), Answer::multiple([1])]),
        ];
        let expected_mean =
            attempts.iter().map(|a| a.attempt_percents()).sum::<f64>() / 3.0;

        let summary = summarize(&attempts);
        assert_eq!(summary.attempts_count, 3);
        assert_eq!(summary.passed, attempts.iter().filter(|a| a.passed()).count());
        assert_eq!(summary.passed, 1);
        assert!((summary.average - expected_mean).abs() < 1e-9);
    }

    #[test]
    fn task_results_pick_rates() {
        let test = mini_test();
        let attempts = vec![
            check(&test, "a", vec![Answer::Single(1), Answer::multiple([0, 2])]),
            check(&test, "b", vec![Answer::Single(0), Answer::multiple([0])]),
        ];
        let results = task_results(&test, &attempts);
        assert_eq!(results[0], vec![50.0, 50.0, 0.0]);
        assert_eq!(results[1], vec![100.0, 0.0, 50.0, 0.0]);
    }

    #[test]
    fn task_results_without_attempts() {
        let test = mini_test();
        let results = task_results(&test, &[]);
        assert_eq!(results, vec![vec![0.0; 3], vec![0.0; 4]]);
    }
}
