//! Plan every sample request against every sample platform and family.
//!
//! Demonstrates: parse -> validate -> plan -> report, with failures shown
//! inline rather than aborting the sweep.
//!
//! Usage:
//!   cargo run --example sweep -- configs/

use std::path::{Path, PathBuf};
use std::process;

use tiling_planner::TilingPlanner;
use tiling_planner::config::{parse_family, parse_platform, parse_request, validate_family};
use tiling_planner::error::Severity;

fn yaml_files(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| {
            eprintln!("Cannot read {}: {e}", dir.display());
            process::exit(1);
        })
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "yaml" || ext == "yml"))
        .collect();
    paths.sort();
    paths
}

fn stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("?")
}

fn main() {
    let dir = std::env::args().nth(1).map_or_else(
        || {
            eprintln!("Usage: sweep <configs-dir/>");
            process::exit(1);
        },
        PathBuf::from,
    );

    let platforms = yaml_files(&dir.join("platforms"));
    let families = yaml_files(&dir.join("families"));
    let requests = yaml_files(&dir.join("requests"));

    let mut planned = 0usize;
    let mut failed = 0usize;

    for platform_path in &platforms {
        let platform = match parse_platform(platform_path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("skip {}: {e}", platform_path.display());
                continue;
            }
        };
        println!("== {platform}");

        for family_path in &families {
            let family = match parse_family(family_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("skip {}: {e}", family_path.display());
                    continue;
                }
            };
            let errors = validate_family(&family, Some(&platform))
                .into_iter()
                .filter(|v| v.severity == Severity::Error)
                .count();
            if errors > 0 {
                println!("  {}: {errors} validation error(s), skipped", family.name);
                continue;
            }
            let planner = match TilingPlanner::new(platform.clone(), family) {
                Ok(p) => p,
                Err(e) => {
                    println!("  {}: {e}", stem(family_path));
                    continue;
                }
            };

            for request_path in &requests {
                let Ok(request) = parse_request(request_path) else {
                    continue;
                };
                match planner.plan(&request) {
                    Ok(plan) => {
                        planned += 1;
                        println!(
                            "  {:<16} {:<16} key {:>5}  lanes {:>3}  sub-tile {} x {}  ws {} B",
                            planner.family().name,
                            stem(request_path),
                            plan.plan_key,
                            plan.lane_count,
                            plan.sub_tile_extent,
                            plan.sub_tile_loop_count,
                            plan.workspace_bytes
                        );
                    }
                    Err(e) => {
                        failed += 1;
                        println!(
                            "  {:<16} {:<16} {} ({})",
                            planner.family().name,
                            stem(request_path),
                            e.kind(),
                            e.field().unwrap_or("-")
                        );
                    }
                }
            }
        }
    }

    println!("\n{planned} plan(s), {failed} rejected");
}
