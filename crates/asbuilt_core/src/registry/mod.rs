//! Plan registry: which plans a project has and which one is primary.

pub mod plan_registry;
