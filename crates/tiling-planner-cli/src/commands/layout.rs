use tiling_planner::layout::{PLAN_LAYOUT, RECORD_BYTES, render_c_header, render_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutFormat {
    Text,
    Json,
    C,
}

impl LayoutFormat {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "c" => Ok(Self::C),
            other => Err(format!(
                "unknown format '{other}', expected 'text', 'json', or 'c'"
            )),
        }
    }
}

pub fn run(format: LayoutFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        LayoutFormat::Text => print!("{}", render_text()),
        LayoutFormat::Json => {
            let json = serde_json::json!({
                "record_bytes": RECORD_BYTES,
                "fields": PLAN_LAYOUT,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        LayoutFormat::C => print!("{}", render_c_header("TilingPlanRecord")),
    }
    Ok(())
}
