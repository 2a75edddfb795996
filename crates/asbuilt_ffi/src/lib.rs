//! Flutter-facing bindings for the as-built review core.

pub mod api;
