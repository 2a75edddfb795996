//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and review sessions into use-case APIs.
//! - Keep FFI/CLI layers decoupled from storage details.

pub mod review_service;
