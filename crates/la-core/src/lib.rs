//! la-core: shared types, IDs, ratings, errors, and configuration.
//!
//! This crate is the foundational dependency for all other la-* crates,
//! providing type-safe identifiers, the content [`Rating`] scale, a unified
//! error type, and application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod rating;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use rating::Rating;
