use std::collections::HashMap;

use crate::catalog::{OperatorFamily, ShapeRegime};
use crate::error::{Severity, Violation};
use crate::operand::DType;
use crate::platform::PlatformProfile;
use crate::subtile::ScratchBudget;

/// Validate a platform profile.
///
/// Returns a list of violations. If any violation has
/// [`Severity::Error`], the profile cannot be planned against.
pub fn validate_platform(platform: &PlatformProfile) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let Err(e) = platform.validate() {
        violations.push(Violation {
            severity: Severity::Error,
            rule: "PLAT-001".to_string(),
            message: e.to_string(),
            location: e.field().map(str::to_string),
        });
    }

    if platform.name.is_empty() {
        violations.push(Violation {
            severity: Severity::Info,
            rule: "PLAT-002".to_string(),
            message: "platform has no name; logs will show an empty label".to_string(),
            location: Some("platform.name".to_string()),
        });
    }

    violations
}

/// Validate an operator family, and optionally its fit on `platform`.
///
/// Returns a list of violations. If any violation has
/// [`Severity::Error`], a planner cannot be built from the family.
pub fn validate_family(
    family: &OperatorFamily,
    platform: Option<&PlatformProfile>,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    validate_header(family, &mut violations);
    validate_kernels(family, &mut violations);
    validate_regimes(family, &mut violations);
    if let Some(platform) = platform {
        violations.extend(validate_platform(platform));
        if platform.validate().is_ok() {
            validate_fit(family, platform, &mut violations);
        }
    }

    violations
}

fn validate_header(family: &OperatorFamily, violations: &mut Vec<Violation>) {
    if family.name.is_empty() {
        violations.push(Violation {
            severity: Severity::Error,
            rule: "CAT-001".to_string(),
            message: "name must not be empty".to_string(),
            location: Some("name".to_string()),
        });
    }

    if family.buffer_multiplier == 0 {
        violations.push(Violation {
            severity: Severity::Error,
            rule: "CAT-002".to_string(),
            message: "buffer_multiplier must be at least 1".to_string(),
            location: Some("buffer_multiplier".to_string()),
        });
    }

    if family.min_units_per_lane == 0 {
        violations.push(Violation {
            severity: Severity::Warning,
            rule: "CAT-003".to_string(),
            message: "min_units_per_lane of 0 behaves like 1".to_string(),
            location: Some("min_units_per_lane".to_string()),
        });
    }
}

fn validate_kernels(family: &OperatorFamily, violations: &mut Vec<Violation>) {
    if family.kernels.is_empty() {
        violations.push(Violation {
            severity: Severity::Error,
            rule: "CAT-004".to_string(),
            message: "kernels must list at least one compiled variant".to_string(),
            location: Some("kernels".to_string()),
        });
        return;
    }

    let mut triples: HashMap<(DType, u32, ShapeRegime), usize> = HashMap::new();
    let mut keys: HashMap<u64, usize> = HashMap::new();
    for (i, entry) in family.kernels.iter().enumerate() {
        let repeated = triples.insert((entry.dtype, entry.optional_mask, entry.regime), i);
        if let Some(first) = repeated {
            violations.push(Violation {
                severity: Severity::Error,
                rule: "CAT-005".to_string(),
                message: format!(
                    "kernels[{i}] repeats {} mask={:#b} {} from kernels[{first}]",
                    entry.dtype, entry.optional_mask, entry.regime
                ),
                location: Some(format!("kernels[{i}]")),
            });
        }
        let key = entry.plan_key();
        // a repeated triple with a default key is already reported above
        if let Some(first) = keys.insert(key, i)
            && repeated.is_none()
        {
            violations.push(Violation {
                severity: Severity::Error,
                rule: "CAT-006".to_string(),
                message: format!("kernels[{i}] key {key} collides with kernels[{first}]"),
                location: Some(format!("kernels[{i}].key")),
            });
        }
    }
}

fn validate_regimes(family: &OperatorFamily, violations: &mut Vec<Violation>) {
    let has_full_load = family
        .kernels
        .iter()
        .any(|k| k.regime == ShapeRegime::FullLoad);
    let has_streaming = family
        .kernels
        .iter()
        .any(|k| k.regime == ShapeRegime::Streaming);

    if has_full_load && family.full_load_max_bytes.is_none() {
        violations.push(Violation {
            severity: Severity::Warning,
            rule: "CAT-007".to_string(),
            message: "full_load kernels are only reachable through an explicit request regime \
                      without full_load_max_bytes"
                .to_string(),
            location: Some("full_load_max_bytes".to_string()),
        });
    }

    if family.full_load_max_bytes.is_some() && !has_streaming {
        violations.push(Violation {
            severity: Severity::Warning,
            rule: "CAT-008".to_string(),
            message: "operands above full_load_max_bytes have no streaming kernel".to_string(),
            location: Some("kernels".to_string()),
        });
    }
}

/// Platform fit at the element width of each kernel (PLAT-003), plus the
/// full-load threshold against scratch (PLAT-005). A reduction row is only
/// known per request, so a streaming plan over rows wider than scratch still
/// fails at plan time.
fn validate_fit(
    family: &OperatorFamily,
    platform: &PlatformProfile,
    violations: &mut Vec<Violation>,
) {
    for (i, entry) in family.kernels.iter().enumerate() {
        let budget = ScratchBudget {
            element_bytes: u64::from(entry.dtype.size_bytes()),
            buffer_multiplier: family.buffer_multiplier,
            scratch_capacity_bytes: platform.usable_scratch_bytes(),
            alignment_bytes: platform.alignment_bytes,
        };
        if let Err(e) = budget.max_units() {
            violations.push(Violation {
                severity: Severity::Error,
                rule: "PLAT-003".to_string(),
                message: format!("kernels[{i}] ({}) cannot be tiled: {e}", entry.dtype),
                location: Some(format!("kernels[{i}]")),
            });
        }
    }

    let usable = u64::from(platform.usable_scratch_bytes());
    let has_full_load = family
        .kernels
        .iter()
        .any(|k| k.regime == ShapeRegime::FullLoad);
    if let Some(threshold) = family.full_load_max_bytes
        && has_full_load
        && u128::from(threshold) * u128::from(family.buffer_multiplier) > u128::from(usable)
    {
        violations.push(Violation {
            severity: Severity::Warning,
            rule: "PLAT-005".to_string(),
            message: format!(
                "full_load operands up to {threshold} B need {} x {threshold} B of scratch, \
                 {} has {usable} B usable",
                family.buffer_multiplier, platform.name
            ),
            location: Some("full_load_max_bytes".to_string()),
        });
    }

    if family.per_lane_partial_bytes % u64::from(platform.alignment_bytes) != 0 {
        violations.push(Violation {
            severity: Severity::Info,
            rule: "PLAT-004".to_string(),
            message: format!(
                "per_lane_partial_bytes {} is rounded up to {} B alignment",
                family.per_lane_partial_bytes, platform.alignment_bytes
            ),
            location: Some("per_lane_partial_bytes".to_string()),
        });
    }
}
