//! Published tests and the subjects that own them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PublishError, SubmissionError};
use crate::grading::TestScorer;
use crate::model::{PublicTest, Test, TestSolutionAttempt};
use crate::results::{CheckedAttempt, TestSummary};
use crate::statistics::{summarize, task_results};

/// A test published into a subject, accumulating checked attempts.
///
/// Attempts can only be appended through [`TestInstance::submit`]. A
/// persisted instance is re-checked against its own test when read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TestInstanceRecord")]
pub struct TestInstance {
    pub test: Test,
    #[serde(default)]
    pub remark: String,
    pub published_at: DateTime<Utc>,
    pub published_by: String,
    #[serde(default)]
    solution_attempts: Vec<CheckedAttempt>,
}

impl TestInstance {
    pub fn new(test: Test, remark: impl Into<String>, published_by: impl Into<String>) -> Self {
        Self {
            test,
            remark: remark.into(),
            published_at: Utc::now(),
            published_by: published_by.into(),
            solution_attempts: Vec::new(),
        }
    }

    pub fn solution_attempts(&self) -> &[CheckedAttempt] {
        &self.solution_attempts
    }

    /// Grade `attempt` and append the result. Each student submits once.
    pub fn submit(
        &mut self,
        attempt: TestSolutionAttempt,
        scorer: &TestScorer,
    ) -> Result<&CheckedAttempt, SubmissionError> {
        if self
            .solution_attempts
            .iter()
            .any(|a| a.solved_by() == attempt.solved_by)
        {
            return Err(SubmissionError::AlreadySubmitted(attempt.solved_by));
        }

        let checked = scorer.score(&self.test, attempt)?;
        tracing::debug!(
            test = %self.test.info.id,
            solved_by = checked.solved_by(),
            percents = checked.attempt_percents(),
            "attempt checked"
        );
        self.solution_attempts.push(checked);
        Ok(&self.solution_attempts[self.solution_attempts.len() - 1])
    }

    pub fn attempts_by<'a>(
        &'a self,
        student: &'a str,
    ) -> impl Iterator<Item = &'a CheckedAttempt> + 'a {
        self.solution_attempts
            .iter()
            .filter(move |a| a.solved_by() == student)
    }

    pub fn summary(&self) -> TestSummary {
        summarize(&self.solution_attempts)
    }

    /// Per task, per option pick percentages over all attempts.
    pub fn task_results(&self) -> Vec<Vec<f64>> {
        task_results(&self.test, &self.solution_attempts)
    }

    /// What a student may see: the answer-free test and only their own attempts.
    pub fn for_student(&self, student: &str) -> StudentTestInstance {
        StudentTestInstance {
            test: self.test.public(),
            remark: self.remark.clone(),
            published_at: self.published_at,
            published_by: self.published_by.clone(),
            solution_attempts: self.attempts_by(student).cloned().collect(),
        }
    }
}

#[derive(Deserialize)]
struct TestInstanceRecord {
    test: Test,
    #[serde(default)]
    remark: String,
    published_at: DateTime<Utc>,
    published_by: String,
    #[serde(default)]
    solution_attempts: Vec<CheckedAttempt>,
}

impl TryFrom<TestInstanceRecord> for TestInstance {
    type Error = String;

    fn try_from(record: TestInstanceRecord) -> Result<Self, Self::Error> {
        for (i, attempt) in record.solution_attempts.iter().enumerate() {
            attempt.check_against(&record.test)?;
            if record.solution_attempts[..i]
                .iter()
                .any(|a| a.solved_by() == attempt.solved_by())
            {
                return Err(format!("{} submitted more than once", attempt.solved_by()));
            }
        }
        Ok(Self {
            test: record.test,
            remark: record.remark,
            published_at: record.published_at,
            published_by: record.published_by,
            solution_attempts: record.solution_attempts,
        })
    }
}

/// A test instance as seen by one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentTestInstance {
    pub test: PublicTest,
    pub remark: String,
    pub published_at: DateTime<Utc>,
    pub published_by: String,
    pub solution_attempts: Vec<CheckedAttempt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Username of the owning teacher.
    pub owner: String,
    /// Teacher usernames, the owner included.
    #[serde(default)]
    pub teachers: Vec<String>,
}

/// A group of published tests with its roster and access codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub info: SubjectInfo,
    #[serde(default)]
    pub student_access_code: String,
    #[serde(default)]
    pub teacher_access_code: String,
    /// Student usernames.
    #[serde(default)]
    pub students: Vec<String>,
    #[serde(default)]
    pub test_instances: Vec<TestInstance>,
}

impl Subject {
    pub fn is_teacher(&self, username: &str) -> bool {
        self.info.teachers.iter().any(|t| t == username)
    }

    pub fn is_student(&self, username: &str) -> bool {
        self.students.iter().any(|s| s == username)
    }

    pub fn is_participant(&self, username: &str) -> bool {
        self.is_teacher(username) || self.is_student(username)
    }

    /// Instances are identified by test id plus remark.
    pub fn find_instance(&self, test_id: &str, remark: &str) -> Option<&TestInstance> {
        self.test_instances
            .iter()
            .find(|i| i.test.info.id == test_id && i.remark == remark)
    }

    pub fn find_instance_mut(&mut self, test_id: &str, remark: &str) -> Option<&mut TestInstance> {
        self.test_instances
            .iter_mut()
            .find(|i| i.test.info.id == test_id && i.remark == remark)
    }

    /// Publish a snapshot of `test` under `remark`.
    pub fn publish(
        &mut self,
        test: Test,
        remark: impl Into<String>,
        published_by: impl Into<String>,
    ) -> Result<&TestInstance, PublishError> {
        let remark = remark.into();
        if self.find_instance(&test.info.id, &remark).is_some() {
            return Err(PublishError::Duplicate {
                test_id: test.info.id,
                remark,
            });
        }
        self.test_instances
            .push(TestInstance::new(test, remark, published_by));
        Ok(&self.test_instances[self.test_instances.len() - 1])
    }
}
