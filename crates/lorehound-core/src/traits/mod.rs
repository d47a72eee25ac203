//! Trait seams between Lorehound crates.

pub mod provider;

pub use provider::{GenerateParams, Provider};
