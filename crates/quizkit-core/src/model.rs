//! Core data model types for quizkit.
//!
//! Users and their credentials, tasks, tests, and submitted attempts. The
//! graded counterparts live in [`crate::results`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Access role of an authenticated user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    None,
    Admin,
    Teacher,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::None => write!(f, "none"),
            Role::Admin => write!(f, "admin"),
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Role::None),
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Login input. Never persisted.
///
/// The `Debug` impl masks the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// The authenticated identity together with its live bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub token: String,
}

impl UserInfo {
    /// Same identity, new token.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role,
            token: token.into(),
        }
    }
}

impl fmt::Debug for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserInfo")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("token", &"***")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Discriminant of a [`Task`], as written in its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    SingleChoice,
    MultipleChoice,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::SingleChoice => write!(f, "single-choice"),
            TaskType::MultipleChoice => write!(f, "multiple-choice"),
        }
    }
}

/// A single gradable question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// The question text.
    pub question: String,
    /// Free-form label (e.g. "easy").
    #[serde(default)]
    pub tag: String,
    /// Answer options, addressed by index.
    pub options: Vec<String>,
    /// Maximum score for this task.
    pub points: u32,
    /// Variant and answer key.
    #[serde(flatten)]
    pub kind: TaskKind,
}

/// Task variant carrying the correct answer in its typed shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TaskKind {
    SingleChoice { answer: usize },
    MultipleChoice { answer: BTreeSet<usize> },
}

impl Task {
    pub fn single_choice(
        question: impl Into<String>,
        options: Vec<String>,
        answer: usize,
        points: u32,
    ) -> Self {
        Self {
            question: question.into(),
            tag: String::new(),
            options,
            points,
            kind: TaskKind::SingleChoice { answer },
        }
    }

    pub fn multiple_choice(
        question: impl Into<String>,
        options: Vec<String>,
        answer: impl IntoIterator<Item = usize>,
        points: u32,
    ) -> Self {
        Self {
            question: question.into(),
            tag: String::new(),
            options,
            points,
            kind: TaskKind::MultipleChoice {
                answer: answer.into_iter().collect(),
            },
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn task_type(&self) -> TaskType {
        match self.kind {
            TaskKind::SingleChoice { .. } => TaskType::SingleChoice,
            TaskKind::MultipleChoice { .. } => TaskType::MultipleChoice,
        }
    }

    /// Option indices referenced by the answer key.
    pub fn answer_indices(&self) -> Vec<usize> {
        match &self.kind {
            TaskKind::SingleChoice { answer } => vec![*answer],
            TaskKind::MultipleChoice { answer } => answer.iter().copied().collect(),
        }
    }
}

/// A submitted answer. On the wire this is either a bare index or an array
/// of indices; duplicates in the array collapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(usize),
    Multiple(BTreeSet<usize>),
}

impl Answer {
    pub fn multiple(indices: impl IntoIterator<Item = usize>) -> Self {
        Answer::Multiple(indices.into_iter().collect())
    }

    /// The task variant this answer shape belongs to.
    pub fn task_type(&self) -> TaskType {
        match self {
            Answer::Single(_) => TaskType::SingleChoice,
            Answer::Multiple(_) => TaskType::MultipleChoice,
        }
    }

    /// All option indices this answer selects.
    pub fn picked(&self) -> Vec<usize> {
        match self {
            Answer::Single(index) => vec![*index],
            Answer::Multiple(indices) => indices.iter().copied().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A test definition: ordered tasks plus the pass threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub info: TestInfo,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Minimum percentage of the overall points required to pass.
    #[serde(default = "default_pass_percents")]
    pub pass_percents: f64,
}

fn default_pass_percents() -> f64 {
    50.0
}

impl Test {
    /// Sum of the maximum points of every task.
    pub fn overall_points(&self) -> u32 {
        self.tasks.iter().map(|t| t.points).sum()
    }

    /// The test as handed to students: answer keys stripped.
    pub fn public(&self) -> PublicTest {
        PublicTest {
            info: self.info.clone(),
            tasks: self
                .tasks
                .iter()
                .map(|t| PublicTask {
                    question: t.question.clone(),
                    tag: t.tag.clone(),
                    options: t.options.clone(),
                    points: t.points,
                    task_type: t.task_type(),
                })
                .collect(),
            pass_percents: self.pass_percents,
        }
    }
}

/// A task without its answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicTask {
    pub question: String,
    pub tag: String,
    pub options: Vec<String>,
    pub points: u32,
    #[serde(rename = "type")]
    pub task_type: TaskType,
}

/// A test without answer keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicTest {
    pub info: TestInfo,
    pub tasks: Vec<PublicTask>,
    pub pass_percents: f64,
}

/// A student's submitted answers, aligned by position with the test's tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSolutionAttempt {
    pub solved_by: String,
    pub solved_at: DateTime<Utc>,
    pub answers: Vec<Answer>,
}

impl TestSolutionAttempt {
    /// An attempt stamped with the current time.
    pub fn new(solved_by: impl Into<String>, answers: Vec<Answer>) -> Self {
        Self {
            solved_by: solved_by.into(),
            solved_at: Utc::now(),
            answers,
        }
    }
}
