//! Interactive review flow over the registry and placement store.
//!
//! # Responsibility
//! - Aggregate placement progress.
//! - Coordinate plan/photo selection and pin mutations for one view.

pub mod progress;
pub mod session;
