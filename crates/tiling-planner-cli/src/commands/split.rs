use tiling_planner::partition::partition;

pub fn run(total_units: i64, lanes: u32) -> Result<(), Box<dyn std::error::Error>> {
    let p = partition(total_units, lanes)?;

    println!(
        "{total_units} unit(s) over {lanes} lane(s): {} x {} + {} x {}",
        p.regular_lane_count, p.regular_extent, p.remainder_lane_count, p.remainder_extent
    );
    if p.is_degenerate() {
        println!("nothing to do");
        return Ok(());
    }
    if p.used_lanes() < lanes {
        println!("{} lane(s) idle", lanes - p.used_lanes());
    }
    for lane in 0..p.used_lanes() {
        if let (Some(offset), Some(extent)) = (p.lane_offset(lane), p.lane_extent(lane)) {
            println!("  lane {lane:>4}: [{offset}, {})", offset + extent);
        }
    }
    Ok(())
}
