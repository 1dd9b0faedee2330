//! Device resource profile: lanes, per-lane scratch capacity, alignment.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Resources of one device target, fixed for the lifetime of a planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    #[serde(default)]
    pub name: String,
    /// Independent parallel execution units.
    pub lane_count: u32,
    /// Bytes of fast on-chip working buffer available to each lane.
    pub scratch_capacity_bytes: u32,
    /// Minimum transfer granularity; a power of two.
    pub alignment_bytes: u32,
    /// Scratch bytes per lane held back by the runtime.
    #[serde(default)]
    pub reserved_scratch_bytes: u32,
    /// Global-memory workspace the runtime library needs on every launch.
    #[serde(default)]
    pub system_workspace_bytes: u64,
}

impl PlatformProfile {
    /// Build and validate a profile with no reserved scratch and no
    /// system workspace.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidPlatform`] when any invariant of
    /// [`PlatformProfile::validate`] fails.
    pub fn new(
        lane_count: u32,
        scratch_capacity_bytes: u32,
        alignment_bytes: u32,
    ) -> Result<Self, PlanError> {
        let profile = Self {
            name: String::new(),
            lane_count,
            scratch_capacity_bytes,
            alignment_bytes,
            reserved_scratch_bytes: 0,
            system_workspace_bytes: 0,
        };
        profile.validate()?;
        Ok(profile)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// # Errors
    ///
    /// Returns [`PlanError::InvalidPlatform`] when the reservation breaks
    /// the profile invariants.
    pub fn with_reserved_scratch(mut self, bytes: u32) -> Result<Self, PlanError> {
        self.reserved_scratch_bytes = bytes;
        self.validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn with_system_workspace(mut self, bytes: u64) -> Self {
        self.system_workspace_bytes = bytes;
        self
    }

    /// Check the profile invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidPlatform`] naming the first field that
    /// breaks an invariant.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.lane_count == 0 {
            return Err(PlanError::invalid_platform("platform.lane_count", 0));
        }
        if self.scratch_capacity_bytes == 0 {
            return Err(PlanError::invalid_platform(
                "platform.scratch_capacity_bytes",
                0,
            ));
        }
        if !self.alignment_bytes.is_power_of_two() {
            return Err(PlanError::invalid_platform(
                "platform.alignment_bytes",
                self.alignment_bytes,
            ));
        }
        if self.scratch_capacity_bytes % self.alignment_bytes != 0 {
            return Err(PlanError::invalid_platform(
                "platform.scratch_capacity_bytes",
                self.scratch_capacity_bytes,
            ));
        }
        if self.reserved_scratch_bytes % self.alignment_bytes != 0
            || self.reserved_scratch_bytes >= self.scratch_capacity_bytes
        {
            return Err(PlanError::invalid_platform(
                "platform.reserved_scratch_bytes",
                self.reserved_scratch_bytes,
            ));
        }
        Ok(())
    }

    /// Scratch bytes per lane left for operator buffers.
    ///
    /// Always a non-zero multiple of the alignment for a validated profile.
    pub fn usable_scratch_bytes(&self) -> u32 {
        self.scratch_capacity_bytes
            .saturating_sub(self.reserved_scratch_bytes)
    }

    /// Round `bytes` up to the next alignment boundary.
    pub fn align_up(&self, bytes: u64) -> Option<u64> {
        let align = u64::from(self.alignment_bytes.max(1));
        bytes.div_ceil(align).checked_mul(align)
    }
}

impl std::fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = if self.name.is_empty() {
            "<unnamed>"
        } else {
            &self.name
        };
        write!(
            f,
            "{name}: {} lanes, {} B scratch ({} B reserved), {} B alignment",
            self.lane_count,
            self.scratch_capacity_bytes,
            self.reserved_scratch_bytes,
            self.alignment_bytes
        )
    }
}
