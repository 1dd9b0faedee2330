use std::path::Path;

use tiling_planner::TilingPlanner;
use tiling_planner::config::{parse_family, parse_platform, validate_family};
use tiling_planner::error::Severity;

pub fn run(family_path: &Path, platform_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("validate: family {}", family_path.display());
    let family = parse_family(family_path)?;
    if let Some(path) = platform_path {
        log::info!("validate: platform {}", path.display());
    }
    let platform = platform_path.map(parse_platform).transpose()?;
    let violations = validate_family(&family, platform.as_ref());

    let errors: Vec<_> = violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .collect();
    let warnings: Vec<_> = violations
        .iter()
        .filter(|v| v.severity == Severity::Warning)
        .collect();

    for v in &violations {
        match &v.location {
            Some(loc) => println!("{v} (at {loc})"),
            None => println!("{v}"),
        }
    }

    println!(
        "\n{} error(s), {} warning(s)",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        return Err(format!(
            "Family '{}' has {} validation error(s)",
            family.name,
            errors.len()
        )
        .into());
    }

    // the planner re-checks everything a plan call depends on
    if let Some(platform) = platform {
        TilingPlanner::new(platform, family)?;
    }
    println!("Family is valid.");
    Ok(())
}
