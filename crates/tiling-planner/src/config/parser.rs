use std::path::Path;

use crate::catalog::OperatorFamily;
use crate::error::PlanError;
use crate::planner::PlanRequest;
use crate::platform::PlatformProfile;

/// Parse a YAML platform profile file.
///
/// The profile is not validated here; [`crate::config::validate_platform`]
/// and [`crate::planner::TilingPlanner::new`] do that.
///
/// # Errors
///
/// Returns [`PlanError::Io`] if the file cannot be read,
/// or [`PlanError::Yaml`] if the YAML is malformed.
pub fn parse_platform(path: &Path) -> Result<PlatformProfile, PlanError> {
    let content = std::fs::read_to_string(path)?;
    parse_platform_str(&content)
}

/// Parse a YAML platform profile from a string.
pub fn parse_platform_str(yaml: &str) -> Result<PlatformProfile, PlanError> {
    let platform: PlatformProfile = serde_yaml::from_str(yaml)?;
    Ok(platform)
}

/// Parse a YAML operator family file.
///
/// # Errors
///
/// Returns [`PlanError::Io`] if the file cannot be read,
/// or [`PlanError::Yaml`] if the YAML is malformed.
pub fn parse_family(path: &Path) -> Result<OperatorFamily, PlanError> {
    let content = std::fs::read_to_string(path)?;
    parse_family_str(&content)
}

/// Parse a YAML operator family from a string.
pub fn parse_family_str(yaml: &str) -> Result<OperatorFamily, PlanError> {
    let family: OperatorFamily = serde_yaml::from_str(yaml)?;
    Ok(family)
}

/// Parse a YAML plan request file.
///
/// # Errors
///
/// Returns [`PlanError::Io`] if the file cannot be read,
/// or [`PlanError::Yaml`] if the YAML is malformed.
pub fn parse_request(path: &Path) -> Result<PlanRequest, PlanError> {
    let content = std::fs::read_to_string(path)?;
    parse_request_str(&content)
}

/// Parse a YAML plan request from a string.
pub fn parse_request_str(yaml: &str) -> Result<PlanRequest, PlanError> {
    let request: PlanRequest = serde_yaml::from_str(yaml)?;
    Ok(request)
}
