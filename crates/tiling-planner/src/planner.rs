//! The planner: validate, partition, sub-tile, select a key, serialize.
//!
//! A [`TilingPlanner`] is built once per `(platform, operator family)` pair
//! and is immutable afterwards, so it can be shared across threads. Each
//! [`TilingPlanner::plan`] call is a one-shot pass through [`PlanStage`];
//! the first failure ends the call and no partial plan is returned.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, OperatorFamily, ShapeRegime};
use crate::error::PlanError;
use crate::layout::{self, PlanFields};
use crate::operand::{optional_presence_mask, DType, OperandDescriptor, Role};
use crate::partition::{capped_lane_count, partition, Partition};
use crate::platform::PlatformProfile;
use crate::subtile::{sub_tile_with, ScratchBudget, SubTile};

/// Stages of one planning call, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStage {
    Validate,
    Partition,
    SubTile,
    SelectKey,
    Serialize,
    Done,
}

impl std::fmt::Display for PlanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validate => "validate",
            Self::Partition => "partition",
            Self::SubTile => "sub_tile",
            Self::SelectKey => "select_key",
            Self::Serialize => "serialize",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// One operator invocation to plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Ordered as the kernel sees them; optional inputs take presence-mask
    /// bits in this order.
    pub operands: Vec<OperandDescriptor>,
    /// Overrides the family's multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_multiplier: Option<u32>,
    /// Overrides the family's size threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regime: Option<ShapeRegime>,
}

impl PlanRequest {
    pub fn new(operands: Vec<OperandDescriptor>) -> Self {
        Self {
            operands,
            buffer_multiplier: None,
            regime: None,
        }
    }

    #[must_use]
    pub fn with_buffer_multiplier(mut self, multiplier: u32) -> Self {
        self.buffer_multiplier = Some(multiplier);
        self
    }

    #[must_use]
    pub fn with_regime(mut self, regime: ShapeRegime) -> Self {
        self.regime = Some(regime);
        self
    }
}

/// The computed plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TilingPlan {
    pub lane_count: u32,
    pub regular_lane_count: u32,
    pub regular_extent: i64,
    pub remainder_lane_count: u32,
    pub remainder_extent: i64,
    pub sub_tile_extent: i64,
    pub sub_tile_loop_count: u32,
    pub sub_tile_tail_extent: i64,
    pub remainder_loop_count: u32,
    pub remainder_tail_extent: i64,
    pub plan_key: u64,
    pub workspace_bytes: u64,
    pub regime: ShapeRegime,
    pub dtype: DType,
    #[serde(skip)]
    pub serialized_bytes: Vec<u8>,
}

impl TilingPlan {
    /// Wire fields of this plan.
    pub fn fields(&self) -> PlanFields {
        PlanFields {
            regular_extent: self.regular_extent,
            remainder_extent: self.remainder_extent,
            sub_tile_extent: self.sub_tile_extent,
            sub_tile_tail_extent: self.sub_tile_tail_extent,
            remainder_tail_extent: self.remainder_tail_extent,
            plan_key: self.plan_key,
            workspace_bytes: self.workspace_bytes,
            lane_count: self.lane_count,
            regular_lane_count: self.regular_lane_count,
            remainder_lane_count: self.remainder_lane_count,
            sub_tile_loop_count: self.sub_tile_loop_count,
            remainder_loop_count: self.remainder_loop_count,
        }
    }

    pub fn total_units(&self) -> i64 {
        i64::from(self.regular_lane_count) * self.regular_extent
            + i64::from(self.remainder_lane_count) * self.remainder_extent
    }

    pub fn is_degenerate(&self) -> bool {
        self.regular_extent == 0 && self.remainder_extent == 0
    }

    pub fn has_remainder(&self) -> bool {
        self.remainder_lane_count > 0
    }

    /// Lowercase hex of the serialized record.
    pub fn hex(&self) -> String {
        self.serialized_bytes
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl std::fmt::Display for TilingPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "plan_key:        {} ({} {})", self.plan_key, self.dtype, self.regime)?;
        writeln!(
            f,
            "lanes:           {} ({} x {} + {} x {})",
            self.lane_count,
            self.regular_lane_count,
            self.regular_extent,
            self.remainder_lane_count,
            self.remainder_extent
        )?;
        writeln!(
            f,
            "sub-tile:        {} x {} loops, tail {}",
            self.sub_tile_extent, self.sub_tile_loop_count, self.sub_tile_tail_extent
        )?;
        if self.has_remainder() {
            writeln!(
                f,
                "remainder lane:  {} loops, tail {}",
                self.remainder_loop_count, self.remainder_tail_extent
            )?;
        }
        write!(f, "workspace_bytes: {}", self.workspace_bytes)
    }
}

/// What the validate stage hands to the rest of the pipeline.
#[derive(Debug, Clone, Copy)]
struct Validated {
    total_units: i64,
    unit_bytes: u64,
    buffer_multiplier: u32,
    dtype: DType,
    regime: ShapeRegime,
    optional_mask: u32,
}

#[derive(Debug, Clone)]
pub struct TilingPlanner {
    platform: PlatformProfile,
    family: OperatorFamily,
    catalog: Catalog,
}

impl TilingPlanner {
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidPlatform`] for a bad profile,
    /// [`PlanError::InvalidShape`] for a zero family multiplier, and
    /// [`PlanError::UnsupportedConfiguration`] for a conflicting catalog.
    pub fn new(platform: PlatformProfile, family: OperatorFamily) -> Result<Self, PlanError> {
        platform.validate()?;
        if family.buffer_multiplier == 0 {
            return Err(PlanError::invalid_shape(
                format!("{}.buffer_multiplier", family.name),
                0,
            ));
        }
        let catalog = family.catalog()?;
        Ok(Self {
            platform,
            family,
            catalog,
        })
    }

    pub fn platform(&self) -> &PlatformProfile {
        &self.platform
    }

    pub fn family(&self) -> &OperatorFamily {
        &self.family
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Compute the plan for one invocation.
    ///
    /// # Errors
    ///
    /// Any [`PlanError`] planning kind, raised by the stage that detects it.
    pub fn plan(&self, request: &PlanRequest) -> Result<TilingPlan, PlanError> {
        let mut stage = PlanStage::Validate;
        let result = self.run(request, &mut stage);
        if let Err(e) = &result {
            log::trace!("{}: failed in {stage}: {e}", self.family.name);
        }
        result
    }

    fn run(&self, request: &PlanRequest, stage: &mut PlanStage) -> Result<TilingPlan, PlanError> {
        let v = self.validate(request)?;

        self.advance(stage, PlanStage::Partition);
        let lanes = capped_lane_count(
            v.total_units,
            self.platform.lane_count,
            self.family.min_units_per_lane,
        );
        let part = partition(v.total_units, lanes)?;

        self.advance(stage, PlanStage::SubTile);
        let budget = ScratchBudget {
            element_bytes: v.unit_bytes,
            buffer_multiplier: v.buffer_multiplier,
            scratch_capacity_bytes: self.platform.usable_scratch_bytes(),
            alignment_bytes: self.platform.alignment_bytes,
        };
        // unit width grows with the reduced axis, so an empty plan is never sized
        let regular = if part.is_degenerate() {
            SubTile::EMPTY
        } else {
            sub_tile_with(part.max_extent(), &budget, self.family.sub_tile)?
        };
        let remainder = if part.has_remainder() {
            regular.for_lane(part.remainder_extent)
        } else {
            SubTile::EMPTY
        };

        self.advance(stage, PlanStage::SelectKey);
        let plan_key = self
            .catalog
            .select_key(v.dtype, v.optional_mask, v.regime)?;

        self.advance(stage, PlanStage::Serialize);
        let workspace_bytes = self.workspace_bytes(&part)?;
        let mut plan = TilingPlan {
            lane_count: part.used_lanes(),
            regular_lane_count: part.regular_lane_count,
            regular_extent: part.regular_extent,
            remainder_lane_count: part.remainder_lane_count,
            remainder_extent: part.remainder_extent,
            sub_tile_extent: regular.extent,
            sub_tile_loop_count: layout::narrow_u32("sub_tile_loop_count", regular.loop_count)?,
            sub_tile_tail_extent: regular.tail_extent,
            remainder_loop_count: layout::narrow_u32("remainder_loop_count", remainder.loop_count)?,
            remainder_tail_extent: remainder.tail_extent,
            plan_key,
            workspace_bytes,
            regime: v.regime,
            dtype: v.dtype,
            serialized_bytes: Vec::new(),
        };
        plan.serialized_bytes = layout::serialize(&plan.fields());

        self.advance(stage, PlanStage::Done);
        log::debug!(
            "{} on {}: {} units, key {}, {} lanes ({} x {} + {} x {}), sub-tile {} x {} tail {}, workspace {} B",
            self.family.name,
            self.platform.name,
            v.total_units,
            plan.plan_key,
            plan.lane_count,
            plan.regular_lane_count,
            plan.regular_extent,
            plan.remainder_lane_count,
            plan.remainder_extent,
            plan.sub_tile_extent,
            plan.sub_tile_loop_count,
            plan.sub_tile_tail_extent,
            plan.workspace_bytes
        );
        Ok(plan)
    }

    fn advance(&self, stage: &mut PlanStage, next: PlanStage) {
        log::trace!("{}: {stage} -> {next}", self.family.name);
        *stage = next;
    }

    fn validate(&self, request: &PlanRequest) -> Result<Validated, PlanError> {
        self.platform.validate()?;
        for (i, op) in request.operands.iter().enumerate() {
            op.validate(&format!("operands[{i}]"))?;
        }

        let (index, driving) = request
            .operands
            .iter()
            .enumerate()
            .find(|(_, op)| op.role == Role::Input)
            .ok_or_else(|| PlanError::invalid_shape("operands", "no input operand"))?;
        let path = format!("operands[{index}]");

        let buffer_multiplier = request
            .buffer_multiplier
            .unwrap_or(self.family.buffer_multiplier);
        if buffer_multiplier == 0 {
            return Err(PlanError::invalid_shape("buffer_multiplier", 0));
        }

        let reduced = driving.reduced_extent(&path)?;
        // an empty reduction axis leaves nothing to process
        let total_units = if reduced == 0 {
            0
        } else {
            driving.outer_extent(&path)?
        };

        let widest = request
            .operands
            .iter()
            .filter(|op| op.is_present())
            .map(|op| op.element_bytes)
            .max()
            .unwrap_or(driving.element_bytes);
        let unit_bytes = u64::try_from(reduced.max(1))
            .ok()
            .and_then(|r| r.checked_mul(u64::from(widest)))
            .ok_or_else(|| PlanError::invalid_shape(format!("{path}.shape"), reduced))?;

        let regime = match request.regime {
            Some(r) => r,
            None => self.family.regime_for(driving.byte_size(&path)?),
        };

        Ok(Validated {
            total_units,
            unit_bytes,
            buffer_multiplier,
            dtype: driving.dtype,
            regime,
            optional_mask: optional_presence_mask(&request.operands)?,
        })
    }

    fn workspace_bytes(&self, part: &Partition) -> Result<u64, PlanError> {
        if part.is_degenerate() {
            return Ok(0);
        }
        let per_lane = self
            .platform
            .align_up(self.family.per_lane_partial_bytes)
            .ok_or_else(|| {
                PlanError::overflow("per_lane_partial_bytes", self.family.per_lane_partial_bytes)
            })?;
        u64::from(part.used_lanes())
            .checked_mul(per_lane)
            .and_then(|staging| staging.checked_add(self.family.user_workspace_bytes))
            .and_then(|ws| ws.checked_add(self.platform.system_workspace_bytes))
            .ok_or_else(|| {
                PlanError::overflow(
                    "workspace_bytes",
                    format!(
                        "{} + {} + {} x {per_lane}",
                        self.platform.system_workspace_bytes,
                        self.family.user_workspace_bytes,
                        part.used_lanes()
                    ),
                )
            })
    }
}
