//! quizkit-core — session lifecycle and assessment model.
//!
//! This crate defines the data model, grading and scoring, aggregate
//! statistics, and the session manager that keeps a user's bearer token
//! fresh. Transport and storage live behind the traits in [`traits`].

pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod results;
pub mod session;
pub mod statistics;
pub mod subject;
pub mod traits;
