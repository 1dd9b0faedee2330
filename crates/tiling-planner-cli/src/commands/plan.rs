use std::path::Path;

use tiling_planner::TilingPlanner;
use tiling_planner::config::{parse_family, parse_platform, parse_request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Hex,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "hex" => Ok(Self::Hex),
            other => Err(format!(
                "unknown format '{other}', expected 'text', 'json', or 'hex'"
            )),
        }
    }
}

pub fn run(
    platform: &Path,
    family: &Path,
    request: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!(
        "plan: platform {}, family {}, request {}",
        platform.display(),
        family.display(),
        request.display()
    );
    let platform = parse_platform(platform)?;
    let family = parse_family(family)?;
    let request = parse_request(request)?;
    log::debug!("{} operand(s) in request", request.operands.len());

    let planner = TilingPlanner::new(platform, family)?;
    let plan = planner.plan(&request)?;

    match format {
        OutputFormat::Text => {
            println!(
                "{} on {}",
                planner.family().name,
                planner.platform()
            );
            println!("{}", "=".repeat(40));
            println!("{plan}");
            println!("record ({} bytes): {}", plan.serialized_bytes.len(), plan.hex());
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "family": planner.family().name,
                "platform": planner.platform().name,
                "plan": plan,
                "record_hex": plan.hex(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Hex => println!("{}", plan.hex()),
    }

    Ok(())
}
