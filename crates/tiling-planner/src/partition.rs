//! Lane partition: spread a unit count over a fixed number of lanes.
//!
//! Every used lane gets `ceil(total / lanes)` units except possibly the
//! last one, which takes whatever is left. Lanes beyond the last used
//! lane get nothing and are not launched.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Result of splitting `total_units` across lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub regular_lane_count: u32,
    pub regular_extent: i64,
    pub remainder_lane_count: u32,
    pub remainder_extent: i64,
}

impl Partition {
    /// Lanes that receive work (or, for the degenerate plan, the lanes
    /// the launch is sized for).
    pub fn used_lanes(&self) -> u32 {
        self.regular_lane_count + self.remainder_lane_count
    }

    /// Units covered by all lanes together.
    pub fn covered_units(&self) -> i64 {
        i64::from(self.regular_lane_count) * self.regular_extent
            + i64::from(self.remainder_lane_count) * self.remainder_extent
    }

    /// Larger of the two per-lane extents.
    pub fn max_extent(&self) -> i64 {
        self.regular_extent.max(self.remainder_extent)
    }

    pub fn has_remainder(&self) -> bool {
        self.remainder_lane_count > 0
    }

    pub fn is_degenerate(&self) -> bool {
        self.regular_extent == 0 && self.remainder_extent == 0
    }

    /// Units assigned to lane `lane`, or `None` past the used lanes.
    pub fn lane_extent(&self, lane: u32) -> Option<i64> {
        if lane < self.regular_lane_count {
            Some(self.regular_extent)
        } else if lane < self.used_lanes() {
            Some(self.remainder_extent)
        } else {
            None
        }
    }

    /// First unit of lane `lane`, as a kernel derives it from its block index.
    pub fn lane_offset(&self, lane: u32) -> Option<i64> {
        (lane < self.used_lanes()).then(|| i64::from(lane) * self.regular_extent)
    }
}

/// Split `total_units` across at most `lane_count` lanes.
///
/// # Errors
///
/// Returns [`PlanError::InvalidShape`] when `total_units` is negative and
/// [`PlanError::InvalidPlatform`] when `lane_count` is zero.
pub fn partition(total_units: i64, lane_count: u32) -> Result<Partition, PlanError> {
    if total_units < 0 {
        return Err(PlanError::invalid_shape("total_units", total_units));
    }
    if lane_count == 0 {
        return Err(PlanError::invalid_platform("lane_count", lane_count));
    }
    if total_units == 0 {
        return Ok(Partition {
            regular_lane_count: lane_count,
            regular_extent: 0,
            remainder_lane_count: 0,
            remainder_extent: 0,
        });
    }

    let lanes = i64::from(lane_count);
    let per_lane = ceil_div(total_units, lanes);
    // used <= lanes because per_lane >= total / lanes
    let used = ceil_div(total_units, per_lane);
    let used_u32 = u32::try_from(used).map_err(|_| PlanError::invalid_platform("lane_count", used))?;

    if i128::from(used) * i128::from(per_lane) == i128::from(total_units) {
        Ok(Partition {
            regular_lane_count: used_u32,
            regular_extent: per_lane,
            remainder_lane_count: 0,
            remainder_extent: 0,
        })
    } else {
        Ok(Partition {
            regular_lane_count: used_u32 - 1,
            regular_extent: per_lane,
            remainder_lane_count: 1,
            remainder_extent: total_units - (used - 1) * per_lane,
        })
    }
}

/// Lanes worth launching when each lane should see at least
/// `min_units_per_lane` units.
pub fn capped_lane_count(total_units: i64, lane_count: u32, min_units_per_lane: u32) -> u32 {
    if total_units <= 0 || min_units_per_lane <= 1 {
        return lane_count;
    }
    let wanted = ceil_div(total_units, i64::from(min_units_per_lane)).max(1);
    u32::try_from(wanted).map_or(lane_count, |w| w.min(lane_count))
}

pub(crate) fn ceil_div(a: i64, b: i64) -> i64 {
    debug_assert!(a >= 0 && b > 0);
    a / b + i64::from(a % b != 0)
}
