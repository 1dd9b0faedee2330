//! Sub-tiling: chop one lane's extent into scratch-buffer-sized passes.
//!
//! A sub-tile is the number of units moved through the scratch buffer in
//! one pass. Full sub-tiles are always a whole number of alignment
//! granules; only the last pass (the tail) may be shorter.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::partition::ceil_div;

/// How the per-pass extent is chosen once the loop count is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubTileStrategy {
    /// Largest sub-tile that fits; the tail takes the leftover.
    #[default]
    Greedy,
    /// Same number of passes, but the extent is spread evenly so the tail
    /// is never much shorter than the other passes.
    Balanced,
}

/// Scratch-buffer chopping of one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTile {
    pub extent: i64,
    /// Kept wide here; the wire layout narrows it.
    pub loop_count: u64,
    pub tail_extent: i64,
}

impl SubTile {
    pub const EMPTY: SubTile = SubTile {
        extent: 0,
        loop_count: 0,
        tail_extent: 0,
    };

    /// Units covered by all passes.
    pub fn covered_units(&self) -> i128 {
        if self.loop_count == 0 {
            return 0;
        }
        i128::from(self.extent) * (i128::from(self.loop_count) - 1) + i128::from(self.tail_extent)
    }

    /// Passes a shorter lane needs at this sub-tile's extent.
    ///
    /// Kernels read a single sub-tile extent, so the remainder lane reuses
    /// the regular lane's and only gets its own loop count and tail.
    pub fn for_lane(&self, lane_extent: i64) -> SubTile {
        if lane_extent <= 0 || self.extent <= 0 {
            return SubTile::EMPTY;
        }
        let loops = ceil_div(lane_extent, self.extent);
        SubTile {
            extent: self.extent,
            loop_count: loops.unsigned_abs(),
            tail_extent: lane_extent - self.extent * (loops - 1),
        }
    }
}

/// Scratch limits one sub-tiling call works against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchBudget {
    pub element_bytes: u64,
    pub buffer_multiplier: u32,
    pub scratch_capacity_bytes: u32,
    pub alignment_bytes: u32,
}

impl ScratchBudget {
    /// Units in the smallest alignment-exact transfer.
    pub fn granule(&self) -> u64 {
        let align = u64::from(self.alignment_bytes);
        align / gcd(align, self.element_bytes)
    }

    /// Largest alignment-exact sub-tile that fits in scratch.
    ///
    /// # Errors
    ///
    /// [`PlanError::InvalidShape`] / [`PlanError::InvalidPlatform`] for zero
    /// parameters and [`PlanError::CapacityExceeded`] when not even one
    /// granule fits.
    pub fn max_units(&self) -> Result<u64, PlanError> {
        if self.element_bytes == 0 {
            return Err(PlanError::invalid_shape("element_bytes", 0));
        }
        if self.buffer_multiplier == 0 {
            return Err(PlanError::invalid_shape("buffer_multiplier", 0));
        }
        if self.alignment_bytes == 0 {
            return Err(PlanError::invalid_platform("alignment_bytes", 0));
        }
        if self.scratch_capacity_bytes == 0 {
            return Err(PlanError::invalid_platform("scratch_capacity_bytes", 0));
        }

        let capacity = u64::from(self.scratch_capacity_bytes);
        let granule = self.granule();
        let bytes_per_unit = u128::from(self.element_bytes) * u128::from(self.buffer_multiplier);
        if u128::from(granule) * bytes_per_unit > u128::from(capacity) {
            return Err(PlanError::capacity_exceeded(
                "scratch_capacity_bytes",
                format!(
                    "{capacity} < {granule} units x {} x {} bytes",
                    self.buffer_multiplier, self.element_bytes
                ),
            ));
        }
        // bytes_per_unit <= capacity here, so it fits in u64
        let raw = capacity / u64::try_from(bytes_per_unit).unwrap_or(u64::MAX);
        Ok(raw / granule * granule)
    }
}

/// Chop `lane_extent` units into sub-tiles using the greedy strategy.
///
/// # Errors
///
/// See [`sub_tile_with`].
pub fn sub_tile(
    lane_extent: i64,
    element_bytes: u32,
    buffer_multiplier: u32,
    scratch_capacity_bytes: u32,
    alignment_bytes: u32,
) -> Result<SubTile, PlanError> {
    let budget = ScratchBudget {
        element_bytes: u64::from(element_bytes),
        buffer_multiplier,
        scratch_capacity_bytes,
        alignment_bytes,
    };
    sub_tile_with(lane_extent, &budget, SubTileStrategy::Greedy)
}

/// Chop `lane_extent` units into sub-tiles against `budget`.
///
/// The capacity check runs before anything else, so an operator that can
/// never be tiled on this platform fails even for an empty lane.
///
/// # Errors
///
/// Returns [`PlanError::CapacityExceeded`] when one granule does not fit,
/// and [`PlanError::InvalidShape`] for a negative extent or zero
/// multiplier/width.
pub fn sub_tile_with(
    lane_extent: i64,
    budget: &ScratchBudget,
    strategy: SubTileStrategy,
) -> Result<SubTile, PlanError> {
    let max_units = budget.max_units()?;
    if lane_extent < 0 {
        return Err(PlanError::invalid_shape("lane_extent", lane_extent));
    }
    if lane_extent == 0 {
        return Ok(SubTile::EMPTY);
    }

    let max_units = i64::try_from(max_units).unwrap_or(i64::MAX);
    let greedy = max_units.min(lane_extent);
    let loops = ceil_div(lane_extent, greedy);

    let extent = match strategy {
        SubTileStrategy::Greedy => greedy,
        SubTileStrategy::Balanced => {
            let granule = i64::try_from(budget.granule()).unwrap_or(i64::MAX);
            let even = ceil_div(lane_extent, loops);
            // even <= greedy and greedy is a granule multiple unless it is
            // the whole lane, so rounding up never passes max_units
            let rounded = ceil_div(even, granule).saturating_mul(granule);
            rounded.min(greedy)
        }
    };

    let loop_count = ceil_div(lane_extent, extent);
    let tail_extent = lane_extent - extent * (loop_count - 1);
    Ok(SubTile {
        extent,
        loop_count: loop_count.unsigned_abs(),
        tail_extent,
    })
}

pub(crate) fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
