//! # Lorehound Memory
//!
//! SQLite-backed interaction log: every answered query is recorded with its
//! search parameters and the model that produced the answer.

pub mod sqlite;

pub use sqlite::{InteractionLog, InteractionRecord};
