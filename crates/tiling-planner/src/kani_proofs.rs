//! Kani bounded proof harnesses for the partition, sub-tile and layout laws.
//!
//! The proptest properties in each module sample these laws; the harnesses
//! here check them for every input inside the stated bounds.
//!
//! All code here is behind `#[cfg(kani)]` and invisible to normal builds.

use crate::layout::{self, PlanFields};
use crate::partition::partition;
use crate::subtile::{sub_tile_with, ScratchBudget, SubTileStrategy};

// ════════════════════════════════════════════════════════════════════════════
// Partition (3 harnesses)
// ════════════════════════════════════════════════════════════════════════════

/// KANI-PART-001: lanes cover exactly `total_units`.
/// Bound: total < 4096, lanes < 64
#[kani::proof]
#[kani::unwind(3)]
fn verify_partition_covers_total() {
    let total: i64 = kani::any();
    let lanes: u32 = kani::any();
    kani::assume((0..4096).contains(&total));
    kani::assume((1..64).contains(&lanes));

    let p = partition(total, lanes).unwrap();
    assert_eq!(
        p.covered_units(),
        total,
        "KANI-PART-001: {total} units over {lanes} lanes"
    );
}

/// KANI-PART-002: never more lanes than the platform offers, at most one
/// remainder lane.
/// Bound: total < 4096, lanes < 64
#[kani::proof]
#[kani::unwind(3)]
fn verify_partition_lane_bounds() {
    let total: i64 = kani::any();
    let lanes: u32 = kani::any();
    kani::assume((0..4096).contains(&total));
    kani::assume((1..64).contains(&lanes));

    let p = partition(total, lanes).unwrap();
    assert!(p.used_lanes() <= lanes, "KANI-PART-002: too many lanes");
    assert!(p.remainder_lane_count <= 1, "KANI-PART-002: split remainder");
}

/// KANI-PART-003: the remainder lane is non-empty and shorter than a
/// regular lane.
/// Bound: total < 4096, lanes < 64
#[kani::proof]
#[kani::unwind(3)]
fn verify_partition_remainder_smaller() {
    let total: i64 = kani::any();
    let lanes: u32 = kani::any();
    kani::assume((1..4096).contains(&total));
    kani::assume((1..64).contains(&lanes));

    let p = partition(total, lanes).unwrap();
    if p.has_remainder() {
        assert!(p.remainder_extent > 0, "KANI-PART-003: empty remainder");
        assert!(
            p.remainder_extent < p.regular_extent,
            "KANI-PART-003: remainder not smaller"
        );
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Sub-tile (3 harnesses)
// ════════════════════════════════════════════════════════════════════════════

fn any_budget() -> ScratchBudget {
    let eb_log: u32 = kani::any();
    let align_log: u32 = kani::any();
    let mult: u32 = kani::any();
    let blocks: u32 = kani::any();
    kani::assume(eb_log <= 3);
    kani::assume(align_log <= 6);
    kani::assume((1..=4).contains(&mult));
    kani::assume((1..=16).contains(&blocks));
    let alignment_bytes = 1u32 << align_log;
    ScratchBudget {
        element_bytes: 1u64 << eb_log,
        buffer_multiplier: mult,
        scratch_capacity_bytes: blocks * 64,
        alignment_bytes,
    }
}

/// KANI-ST-001: passes cover the lane and the tail is in `(0, extent]`.
/// Bound: lane < 2048
#[kani::proof]
#[kani::unwind(8)]
fn verify_sub_tile_coverage() {
    let lane: i64 = kani::any();
    kani::assume((1..2048).contains(&lane));
    let budget = any_budget();
    let balanced: bool = kani::any();
    let strategy = if balanced {
        SubTileStrategy::Balanced
    } else {
        SubTileStrategy::Greedy
    };

    if let Ok(st) = sub_tile_with(lane, &budget, strategy) {
        assert_eq!(st.covered_units(), i128::from(lane), "KANI-ST-001: coverage");
        assert!(st.tail_extent > 0, "KANI-ST-001: empty tail");
        assert!(st.tail_extent <= st.extent, "KANI-ST-001: tail too long");
    }
}

/// KANI-ST-002: a sub-tile never overflows scratch.
/// Bound: lane < 2048
#[kani::proof]
#[kani::unwind(8)]
fn verify_sub_tile_capacity() {
    let lane: i64 = kani::any();
    kani::assume((1..2048).contains(&lane));
    let budget = any_budget();

    if let Ok(st) = sub_tile_with(lane, &budget, SubTileStrategy::Greedy) {
        let bytes = st.extent.unsigned_abs()
            * u64::from(budget.buffer_multiplier)
            * budget.element_bytes;
        assert!(
            bytes <= u64::from(budget.scratch_capacity_bytes),
            "KANI-ST-002: {bytes} B exceeds scratch"
        );
    }
}

/// KANI-ST-003: capacity errors are exactly the budgets where one granule
/// does not fit.
#[kani::proof]
#[kani::unwind(8)]
fn verify_sub_tile_capacity_error_iff_granule_too_big() {
    let budget = any_budget();
    let granule_bytes =
        budget.granule() * u64::from(budget.buffer_multiplier) * budget.element_bytes;
    let fits = granule_bytes <= u64::from(budget.scratch_capacity_bytes);
    assert_eq!(
        sub_tile_with(1, &budget, SubTileStrategy::Greedy).is_ok(),
        fits,
        "KANI-ST-003: capacity check disagrees with granule size"
    );
}

// ════════════════════════════════════════════════════════════════════════════
// Layout (1 harness)
// ════════════════════════════════════════════════════════════════════════════

/// KANI-LAY-001: decoding an encoded record gives back the same fields.
#[kani::proof]
#[kani::unwind(80)]
fn verify_layout_round_trip() {
    let fields = PlanFields {
        regular_extent: kani::any(),
        remainder_extent: kani::any(),
        sub_tile_extent: kani::any(),
        sub_tile_tail_extent: kani::any(),
        remainder_tail_extent: kani::any(),
        plan_key: kani::any(),
        workspace_bytes: kani::any(),
        lane_count: kani::any(),
        regular_lane_count: kani::any(),
        remainder_lane_count: kani::any(),
        sub_tile_loop_count: kani::any(),
        remainder_loop_count: kani::any(),
    };
    let bytes = layout::serialize(&fields);
    assert_eq!(bytes.len(), layout::RECORD_BYTES);
    assert_eq!(layout::deserialize(&bytes).unwrap(), fields, "KANI-LAY-001");
}
