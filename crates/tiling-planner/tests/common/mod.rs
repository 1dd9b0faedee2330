//! Shared helpers for the planner integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tiling_planner::catalog::{CatalogEntry, OperatorFamily, ShapeRegime};
use tiling_planner::config::{parse_family, parse_platform, parse_request};
use tiling_planner::operand::{DType, OperandDescriptor};
use tiling_planner::planner::{PlanRequest, TilingPlan, TilingPlanner};
use tiling_planner::subtile::SubTileStrategy;
use tiling_planner::PlatformProfile;

/// Path of a file under the workspace `configs/` directory.
pub fn config_path(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../configs")
        .join(rel)
}

/// Planner for a sample platform and family, by file stem.
pub fn sample_planner(platform: &str, family: &str) -> TilingPlanner {
    let platform = parse_platform(&config_path(&format!("platforms/{platform}.yaml")))
        .unwrap_or_else(|e| panic!("platform {platform}: {e}"));
    let family = parse_family(&config_path(&format!("families/{family}.yaml")))
        .unwrap_or_else(|e| panic!("family {family}: {e}"));
    TilingPlanner::new(platform, family).unwrap()
}

pub fn sample_request(name: &str) -> PlanRequest {
    parse_request(&config_path(&format!("requests/{name}.yaml")))
        .unwrap_or_else(|e| panic!("request {name}: {e}"))
}

/// Family accepting every dtype in both regimes, with no optional inputs.
pub fn open_family(multiplier: u32, strategy: SubTileStrategy) -> OperatorFamily {
    let mut kernels = Vec::new();
    for dtype in DType::ALL {
        for regime in ShapeRegime::ALL {
            kernels.push(CatalogEntry::new(dtype, 0, regime));
        }
    }
    OperatorFamily {
        name: "open".to_string(),
        description: String::new(),
        buffer_multiplier: multiplier,
        full_load_max_bytes: None,
        min_units_per_lane: 1,
        user_workspace_bytes: 0,
        per_lane_partial_bytes: 0,
        sub_tile: strategy,
        kernels,
    }
}

pub fn planner(platform: PlatformProfile, family: OperatorFamily) -> TilingPlanner {
    TilingPlanner::new(platform, family).unwrap()
}

/// `x -> y` elementwise request over `shape`.
pub fn unary(shape: &[i64], dtype: DType) -> PlanRequest {
    PlanRequest::new(vec![
        OperandDescriptor::input("x", shape, dtype),
        OperandDescriptor::output("y", shape, dtype),
    ])
}

/// Asserts every structural law a plan must satisfy for `total_units`.
pub fn assert_plan_laws(plan: &TilingPlan, total_units: i64, lane_limit: u32) {
    assert_eq!(
        plan.regular_lane_count + plan.remainder_lane_count,
        plan.lane_count,
        "lane counts do not add up"
    );
    assert!(plan.lane_count <= lane_limit, "{} lanes > {lane_limit}", plan.lane_count);
    assert_eq!(plan.total_units(), total_units, "partition does not cover the input");
    assert!(plan.remainder_lane_count <= 1, "more than one remainder lane");

    if plan.sub_tile_loop_count > 0 {
        let covered = plan.sub_tile_extent * i64::from(plan.sub_tile_loop_count)
            - (plan.sub_tile_extent - plan.sub_tile_tail_extent);
        assert_eq!(covered, plan.regular_extent.max(plan.remainder_extent));
        assert!(plan.sub_tile_tail_extent > 0 && plan.sub_tile_tail_extent <= plan.sub_tile_extent);
    }
    if plan.remainder_loop_count > 0 {
        let covered = plan.sub_tile_extent * i64::from(plan.remainder_loop_count)
            - (plan.sub_tile_extent - plan.remainder_tail_extent);
        assert_eq!(covered, plan.remainder_extent);
    } else {
        assert_eq!(plan.remainder_tail_extent, 0);
    }
}
