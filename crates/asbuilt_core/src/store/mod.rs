//! Photo-to-pin association store.

pub mod placement_store;
