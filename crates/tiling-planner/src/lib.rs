//! # tiling-planner
//!
//! Ahead-of-launch tiling plans for data-parallel device kernels.
//!
//! Given a platform profile (lanes, per-lane scratch, alignment) and the
//! operands of one operator invocation, the planner decides how the work
//! is split across lanes, how each lane streams its share through scratch,
//! which compiled kernel variant runs it, and the exact bytes of the plan
//! record the kernel reads.
//!
//! ## Modules
//!
//! - [`platform`]: Device resource profile
//! - [`operand`]: Operand descriptors, dtypes, presence mask
//! - [`partition`]: Split a unit count over lanes with one remainder lane
//! - [`subtile`]: Chop a lane into scratch-sized passes plus a tail
//! - [`catalog`]: Kernel-variant catalog and operator families
//! - [`layout`]: Fixed wire layout of a plan, encoder and decoder
//! - [`planner`]: The validate → partition → sub-tile → key → serialize pipeline
//! - [`config`]: Parse and validate YAML platforms, families and requests
//! - [`error`]: Error kinds and validation violations

pub mod catalog;
pub mod config;
pub mod error;
pub mod layout;
pub mod operand;
pub mod partition;
pub mod planner;
pub mod platform;
pub mod subtile;

#[cfg(kani)]
mod kani_proofs;

pub use catalog::{Catalog, CatalogEntry, OperatorFamily, ShapeRegime};
pub use error::{ErrorKind, PlanError};
pub use operand::{AxisKind, DType, OperandDescriptor, Role};
pub use planner::{PlanRequest, TilingPlan, TilingPlanner};
pub use platform::PlatformProfile;
