//! Falsification tests for the planner pipeline.
//!
//! Each test targets one law a plan must obey and names the bug class that
//! would break it.

mod common;

use proptest::prelude::*;
use tiling_planner::catalog::ShapeRegime;
use tiling_planner::error::ErrorKind;
use tiling_planner::layout;
use tiling_planner::operand::{AxisKind, DType, OperandDescriptor};
use tiling_planner::partition::partition;
use tiling_planner::planner::PlanRequest;
use tiling_planner::subtile::{sub_tile, SubTileStrategy};
use tiling_planner::PlatformProfile;

fn dtypes() -> impl Strategy<Value = DType> {
    prop::sample::select(DType::ALL.to_vec())
}

// ============================================================================
// Partition (FALSIFY-PART-001 through FALSIFY-PART-003)
// ============================================================================

proptest! {
    /// FALSIFY-PART-001: Coverage
    /// Prediction: regular and remainder lanes cover exactly total_units
    /// If fails: remainder computed from lanes instead of used lanes
    #[test]
    fn falsify_part_001_coverage(total in 0i64..10_000_000, lanes in 1u32..1024) {
        let p = partition(total, lanes).unwrap();
        prop_assert_eq!(p.covered_units(), total);
    }

    /// FALSIFY-PART-002: Remainder lane is last and shorter
    /// Prediction: every lane before the last used lane has regular_extent
    /// If fails: remainder spread across several lanes
    #[test]
    fn falsify_part_002_remainder_is_last(total in 1i64..100_000, lanes in 1u32..128) {
        let p = partition(total, lanes).unwrap();
        let used = p.used_lanes();
        for lane in 0..used.saturating_sub(1) {
            prop_assert_eq!(p.lane_extent(lane), Some(p.regular_extent));
        }
        prop_assert!(p.lane_extent(used - 1).unwrap() <= p.regular_extent);
    }

    /// FALSIFY-PART-003: Per-lane balance
    /// Prediction: regular_extent == ceil(total / lanes)
    /// If fails: floor division leaves work for an extra lane
    #[test]
    fn falsify_part_003_ceil_balance(total in 1i64..10_000_000, lanes in 1u32..1024) {
        let p = partition(total, lanes).unwrap();
        let expected = (total + i64::from(lanes) - 1) / i64::from(lanes);
        prop_assert_eq!(p.regular_extent, expected);
    }
}

// ============================================================================
// Sub-tile (FALSIFY-ST-001 through FALSIFY-ST-003)
// ============================================================================

proptest! {
    /// FALSIFY-ST-001: Scratch capacity
    /// Prediction: extent * multiplier * element_bytes <= capacity
    /// If fails: multiplier ignored when sizing the sub-tile
    #[test]
    fn falsify_st_001_capacity(
        lane in 1i64..1_000_000,
        eb in prop::sample::select(vec![1u32, 2, 4, 8]),
        mult in 1u32..6,
        blocks in 1u32..256,
    ) {
        let cap = blocks * 1024;
        let st = sub_tile(lane, eb, mult, cap, 32).unwrap();
        prop_assert!(st.extent as u64 * u64::from(mult) * u64::from(eb) <= u64::from(cap));
    }

    /// FALSIFY-ST-002: Tail bounds
    /// Prediction: 0 < tail <= extent, and extent * (loops - 1) + tail == lane
    /// If fails: tail computed as lane % extent (zero on exact division)
    #[test]
    fn falsify_st_002_tail(
        lane in 1i64..1_000_000,
        eb in prop::sample::select(vec![1u32, 2, 4, 8]),
        blocks in 1u32..64,
    ) {
        let st = sub_tile(lane, eb, 2, blocks * 1024, 32).unwrap();
        prop_assert!(st.tail_extent > 0 && st.tail_extent <= st.extent);
        prop_assert_eq!(st.covered_units(), i128::from(lane));
    }

    /// FALSIFY-ST-003: Alignment of full passes
    /// Prediction: every non-tail pass moves a multiple of alignment_bytes
    /// If fails: granule ignores element width
    #[test]
    fn falsify_st_003_alignment(
        lane in 1i64..1_000_000,
        eb in prop::sample::select(vec![1u32, 2, 4, 8]),
        align in prop::sample::select(vec![8u32, 16, 32, 64, 128]),
    ) {
        let st = sub_tile(lane, eb, 2, 16 * 1024, align).unwrap();
        if st.loop_count > 1 {
            prop_assert_eq!((st.extent as u64 * u64::from(eb)) % u64::from(align), 0);
        }
    }
}

// ============================================================================
// Planner (FALSIFY-PLAN-001 through FALSIFY-PLAN-006)
// ============================================================================

proptest! {
    /// FALSIFY-PLAN-001: Structural laws over random shapes and dtypes
    /// Prediction: every plan satisfies the partition and sub-tile laws
    /// If fails: remainder lane sub-tiled with a different extent
    #[test]
    fn falsify_plan_001_laws(
        rows in 0i64..2_000,
        cols in 1i64..512,
        dtype in dtypes(),
        lanes in 1u32..48,
        balanced in any::<bool>(),
    ) {
        let strategy = if balanced { SubTileStrategy::Balanced } else { SubTileStrategy::Greedy };
        let platform = PlatformProfile::new(lanes, 64 * 1024, 32).unwrap();
        let p = common::planner(platform, common::open_family(3, strategy));
        let plan = p.plan(&common::unary(&[rows, cols], dtype)).unwrap();
        common::assert_plan_laws(&plan, rows * cols, lanes);
    }

    /// FALSIFY-PLAN-002: Determinism
    /// Prediction: the same request always yields the same bytes
    /// If fails: iteration over an unordered map leaks into the plan
    #[test]
    fn falsify_plan_002_determinism(
        n in 0i64..5_000_000,
        dtype in dtypes(),
        lanes in 1u32..48,
    ) {
        let platform = PlatformProfile::new(lanes, 32 * 1024, 32).unwrap();
        let p = common::planner(platform, common::open_family(2, SubTileStrategy::Greedy));
        let req = common::unary(&[n], dtype);
        let a = p.plan(&req).unwrap();
        let b = p.plan(&req).unwrap();
        prop_assert_eq!(a.serialized_bytes, b.serialized_bytes);
    }

    /// FALSIFY-PLAN-003: Record matches plan
    /// Prediction: decoding serialized_bytes yields the plan's own fields
    /// If fails: encoder writes fields out of schema order
    #[test]
    fn falsify_plan_003_record(n in 0i64..5_000_000, lanes in 1u32..48) {
        let platform = PlatformProfile::new(lanes, 32 * 1024, 32).unwrap();
        let p = common::planner(platform, common::open_family(2, SubTileStrategy::Greedy));
        let plan = p.plan(&common::unary(&[n], DType::Float32)).unwrap();
        prop_assert_eq!(layout::deserialize(&plan.serialized_bytes).unwrap(), plan.fields());
    }

    /// FALSIFY-PLAN-004: Reduction rows stay whole
    /// Prediction: a sub-tile of reduced rows fits rows * row_bytes * multiplier
    /// If fails: unit width ignores the reduced extent
    #[test]
    fn falsify_plan_004_rows_fit(rows in 1i64..4_000, cols in 1i64..2_048) {
        let platform = PlatformProfile::new(24, 192 * 1024, 32).unwrap();
        let p = common::planner(platform, common::open_family(3, SubTileStrategy::Greedy));
        let req = PlanRequest::new(vec![
            OperandDescriptor::input("x", &[rows, cols], DType::Float32)
                .with_axes(&[AxisKind::Elementwise, AxisKind::Reduced]),
        ]);
        match p.plan(&req) {
            Ok(plan) => {
                prop_assert_eq!(plan.total_units(), rows);
                let bytes = plan.sub_tile_extent as u64 * cols as u64 * 4 * 3;
                prop_assert!(bytes <= 192 * 1024);
            }
            Err(e) => {
                // only a row too wide for scratch may fail
                prop_assert_eq!(e.kind(), ErrorKind::CapacityExceeded);
                prop_assert!(cols as u64 * 4 * 3 > 192 * 1024);
            }
        }
    }
}

/// FALSIFY-PLAN-005: Scenario table
/// Prediction: the documented scenarios produce the documented numbers
/// If fails: a regression in one of the core formulas
#[test]
fn falsify_plan_005_scenarios() {
    // 100 units over 8 lanes
    let p = partition(100, 8).unwrap();
    assert_eq!(
        (p.regular_lane_count, p.regular_extent, p.remainder_lane_count, p.remainder_extent),
        (7, 13, 1, 9)
    );

    // lane of 13, 4-byte elements, double buffered in 64 bytes
    let st = sub_tile(13, 4, 2, 64, 4).unwrap();
    assert_eq!((st.extent, st.loop_count, st.tail_extent), (8, 2, 5));

    // empty input
    let platform = PlatformProfile::new(8, 64, 4).unwrap();
    let p = common::planner(platform, common::open_family(2, SubTileStrategy::Greedy));
    let plan = p.plan(&common::unary(&[0], DType::Float32)).unwrap();
    assert!(plan.is_degenerate());
    assert_eq!(plan.lane_count, 8);

    // an 8-byte element in 4 bytes of scratch
    let platform = PlatformProfile::new(8, 4, 4).unwrap();
    let p = common::planner(platform, common::open_family(1, SubTileStrategy::Greedy));
    let err = p.plan(&common::unary(&[10], DType::Float64)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);

    // no rows at all: a row too wide for scratch is never sized
    let platform = PlatformProfile::new(8, 1024, 32).unwrap();
    let p = common::planner(platform, common::open_family(2, SubTileStrategy::Greedy));
    let req = PlanRequest::new(vec![
        OperandDescriptor::input("x", &[0, 100_000], DType::Float32)
            .with_axes(&[AxisKind::Elementwise, AxisKind::Reduced]),
    ]);
    let plan = p.plan(&req).unwrap();
    assert!(plan.is_degenerate());
    assert_eq!(plan.sub_tile_extent, 0);
}

/// FALSIFY-PLAN-006: Rejection paths carry the offending field
/// Prediction: each invalid input fails with its kind and field path
/// If fails: errors lose their location on the way out of the pipeline
#[test]
fn falsify_plan_006_rejections() {
    let platform = PlatformProfile::new(8, 1024, 32).unwrap();
    let p = common::planner(platform, common::open_family(2, SubTileStrategy::Greedy));

    let mut bad_width = OperandDescriptor::input("x", &[8], DType::Float32);
    bad_width.element_bytes = 3;
    let err = p.plan(&PlanRequest::new(vec![bad_width])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidShape);
    assert_eq!(err.field(), Some("operands[0].element_bytes"));

    let err = p
        .plan(&common::unary(&[i64::MAX, 2], DType::Float32))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidShape);
    assert_eq!(err.field(), Some("operands[0].shape"));

    let req = PlanRequest::new(vec![
        OperandDescriptor::input("x", &[8], DType::Float32),
        OperandDescriptor::optional("bias", &[8], DType::Float32, true),
    ]);
    let err = p.plan(&req).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedConfiguration);

    let err = p
        .plan(&common::unary(&[8], DType::Float32).with_buffer_multiplier(0))
        .unwrap_err();
    assert_eq!(err.field(), Some("buffer_multiplier"));

    // one 32-byte pass per loop over 2^32 + 1 passes
    let platform = PlatformProfile::new(1, 32, 32).unwrap();
    let p = common::planner(platform, common::open_family(1, SubTileStrategy::Greedy));
    let err = p
        .plan(&common::unary(&[32 * ((1i64 << 32) + 1)], DType::Int8))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SerializationOverflow);
    assert_eq!(err.field(), Some("sub_tile_loop_count"));
    assert_eq!(err.value(), Some("4294967297"));

    // explicit regime outside the catalog
    let platform = PlatformProfile::new(8, 1024, 32).unwrap();
    let mut family = common::open_family(2, SubTileStrategy::Greedy);
    family.kernels.retain(|k| k.regime == ShapeRegime::Streaming);
    let p = common::planner(platform, family);
    let err = p
        .plan(&common::unary(&[8], DType::Float32).with_regime(ShapeRegime::FullLoad))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedConfiguration);
}
