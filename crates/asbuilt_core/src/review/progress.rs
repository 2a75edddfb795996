//! Placement progress aggregation.
//!
//! # Invariants
//! - `placed + unplaced == total`.
//! - `percentage` is `0` for an empty photo set, otherwise
//!   `placed / total * 100` rounded half-up.
//! - Stats are recomputed on every read; nothing is cached.

use crate::model::photo::Photo;
use crate::model::plan::PlanId;
use crate::store::placement_store::PlacementStore;
use serde::{Deserialize, Serialize};

/// Verification progress over a photo set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlacementStats {
    pub total: u32,
    pub placed: u32,
    pub unplaced: u32,
    /// Whole percent in `0..=100`.
    pub percentage: u32,
}

impl PlacementStats {
    /// Builds stats from raw counts. `placed` is capped at `total`.
    pub fn from_counts(total: u32, placed: u32) -> Self {
        let placed = placed.min(total);
        Self {
            total,
            placed,
            unplaced: total - placed,
            percentage: rounded_percentage(placed, total),
        }
    }
}

/// Computes progress of `photos` against their placements in `placements`.
///
/// Only photos in `photos` are counted, so a stale placement of an unknown
/// photo never pushes `placed` above `total`.
pub fn compute_stats<'a>(
    photos: impl IntoIterator<Item = &'a Photo>,
    placements: &PlacementStore,
) -> PlacementStats {
    tally(photos, |photo| placements.is_placed(photo.id))
}

/// Like [`compute_stats`] but only photos pinned on `plan_id` count as placed.
pub fn compute_plan_stats<'a>(
    photos: impl IntoIterator<Item = &'a Photo>,
    placements: &PlacementStore,
    plan_id: PlanId,
) -> PlacementStats {
    tally(photos, |photo| {
        placements.get_placement(photo.id).is_on_plan(plan_id)
    })
}

fn tally<'a>(
    photos: impl IntoIterator<Item = &'a Photo>,
    is_placed: impl Fn(&Photo) -> bool,
) -> PlacementStats {
    let (total, placed) = photos.into_iter().fold((0u32, 0u32), |(total, placed), photo| {
        (total + 1, placed + u32::from(is_placed(photo)))
    });
    PlacementStats::from_counts(total, placed)
}

fn rounded_percentage(placed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let placed = u64::from(placed);
    let total = u64::from(total);
    // Integer half-up: floor((placed * 100) / total + 0.5).
    ((placed * 200 + total) / (total * 2)) as u32
}
