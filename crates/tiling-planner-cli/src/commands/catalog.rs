use std::path::Path;

use tiling_planner::config::parse_family;

pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("catalog: family {}", path.display());
    let family = parse_family(path)?;
    let catalog = family.catalog()?;

    println!("Kernel variants for {}", family.name);
    println!("{}", "=".repeat(24 + family.name.len()));
    println!(
        "{:<10} {:>6}  {:<10} {:>8}",
        "dtype", "mask", "regime", "key"
    );
    for entry in catalog.entries() {
        println!(
            "{:<10} {:>6}  {:<10} {:>8}",
            entry.dtype.to_string(),
            format!("{:#b}", entry.optional_mask),
            entry.regime.to_string(),
            entry.plan_key()
        );
    }
    println!("\n{} variant(s)", catalog.len());
    Ok(())
}
