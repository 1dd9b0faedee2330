//! Per-tensor operand descriptors supplied by shape inference.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Element type tag used for kernel specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Float16,
    BFloat16,
    Float32,
    Float64,
    Int8,
    UInt8,
    Int16,
    Int32,
    Int64,
    Bool,
}

impl DType {
    pub const ALL: [DType; 10] = [
        DType::Float16,
        DType::BFloat16,
        DType::Float32,
        DType::Float64,
        DType::Int8,
        DType::UInt8,
        DType::Int16,
        DType::Int32,
        DType::Int64,
        DType::Bool,
    ];

    /// Natural width of one element in bytes.
    pub fn size_bytes(self) -> u32 {
        match self {
            Self::Int8 | Self::UInt8 | Self::Bool => 1,
            Self::Float16 | Self::BFloat16 | Self::Int16 => 2,
            Self::Float32 | Self::Int32 => 4,
            Self::Float64 | Self::Int64 => 8,
        }
    }

    /// Single-digit code used by the weighted plan-key encoding.
    pub fn code(self) -> u64 {
        match self {
            Self::Float16 => 1,
            Self::Float32 => 2,
            Self::BFloat16 => 3,
            Self::Float64 => 4,
            Self::Int8 => 5,
            Self::UInt8 => 6,
            Self::Int16 => 7,
            Self::Int32 => 8,
            Self::Int64 => 9,
            Self::Bool => 0,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Float16 => "float16",
            Self::BFloat16 => "bfloat16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Bool => "bool",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Input,
    OptionalInput,
    Output,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::OptionalInput => "optional_input",
            Self::Output => "output",
        };
        write!(f, "{s}")
    }
}

/// How the operator treats one axis of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    Elementwise,
    Reduced,
    Broadcast,
}

fn default_presence() -> bool {
    true
}

/// One tensor taking part in an operator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperandDescriptor {
    #[serde(default)]
    pub name: String,
    /// Dimension extents, outermost first; empty for a scalar.
    pub shape: Vec<i64>,
    pub dtype: DType,
    pub element_bytes: u32,
    pub role: Role,
    /// Only meaningful for [`Role::OptionalInput`].
    #[serde(default = "default_presence")]
    pub presence: bool,
    /// One entry per axis; empty means every axis is elementwise.
    #[serde(default)]
    pub axes: Vec<AxisKind>,
}

impl OperandDescriptor {
    fn with_role(name: &str, shape: &[i64], dtype: DType, role: Role) -> Self {
        Self {
            name: name.to_string(),
            shape: shape.to_vec(),
            dtype,
            element_bytes: dtype.size_bytes(),
            role,
            presence: true,
            axes: Vec::new(),
        }
    }

    pub fn input(name: &str, shape: &[i64], dtype: DType) -> Self {
        Self::with_role(name, shape, dtype, Role::Input)
    }

    pub fn output(name: &str, shape: &[i64], dtype: DType) -> Self {
        Self::with_role(name, shape, dtype, Role::Output)
    }

    pub fn optional(name: &str, shape: &[i64], dtype: DType, present: bool) -> Self {
        let mut d = Self::with_role(name, shape, dtype, Role::OptionalInput);
        d.presence = present;
        d
    }

    #[must_use]
    pub fn with_axes(mut self, axes: &[AxisKind]) -> Self {
        self.axes = axes.to_vec();
        self
    }

    /// Whether this operand contributes data to the invocation.
    pub fn is_present(&self) -> bool {
        self.role != Role::OptionalInput || self.presence
    }

    pub fn axis_kind(&self, axis: usize) -> AxisKind {
        self.axes.get(axis).copied().unwrap_or(AxisKind::Elementwise)
    }

    /// Check the descriptor invariants. `path` prefixes field names in
    /// the returned error, e.g. `operands[2]`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidShape`] for negative or overflowing
    /// extents, an element width outside {1, 2, 4, 8} or disagreeing
    /// with the dtype, or an axis list of the wrong length.
    pub fn validate(&self, path: &str) -> Result<(), PlanError> {
        if !matches!(self.element_bytes, 1 | 2 | 4 | 8) {
            return Err(PlanError::invalid_shape(
                format!("{path}.element_bytes"),
                self.element_bytes,
            ));
        }
        if self.element_bytes != self.dtype.size_bytes() {
            return Err(PlanError::invalid_shape(
                format!("{path}.element_bytes"),
                format!("{} (dtype {} is {} bytes)", self.element_bytes, self.dtype, self.dtype.size_bytes()),
            ));
        }
        if !self.axes.is_empty() && self.axes.len() != self.shape.len() {
            return Err(PlanError::invalid_shape(
                format!("{path}.axes"),
                format!("{} entries for rank {}", self.axes.len(), self.shape.len()),
            ));
        }
        for (i, &dim) in self.shape.iter().enumerate() {
            if dim < 0 {
                return Err(PlanError::invalid_shape(format!("{path}.shape[{i}]"), dim));
            }
        }
        self.element_count(path)?;
        Ok(())
    }

    /// Product of all extents (1 for a scalar).
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidShape`] when the product overflows `i64`.
    pub fn element_count(&self, path: &str) -> Result<i64, PlanError> {
        checked_product(self.shape.iter().copied(), &format!("{path}.shape"))
    }

    /// Product of the extents whose axis is not reduced.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidShape`] on overflow.
    pub fn outer_extent(&self, path: &str) -> Result<i64, PlanError> {
        let dims = self
            .shape
            .iter()
            .enumerate()
            .filter(|(i, _)| self.axis_kind(*i) != AxisKind::Reduced)
            .map(|(_, &d)| d);
        checked_product(dims, &format!("{path}.shape"))
    }

    /// Product of the reduced extents (1 when nothing is reduced).
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidShape`] on overflow.
    pub fn reduced_extent(&self, path: &str) -> Result<i64, PlanError> {
        let dims = self
            .shape
            .iter()
            .enumerate()
            .filter(|(i, _)| self.axis_kind(*i) == AxisKind::Reduced)
            .map(|(_, &d)| d);
        checked_product(dims, &format!("{path}.shape"))
    }

    /// Full byte footprint of the tensor.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidShape`] on overflow.
    pub fn byte_size(&self, path: &str) -> Result<u64, PlanError> {
        let count = self.element_count(path)?;
        u64::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(u64::from(self.element_bytes)))
            .ok_or_else(|| PlanError::invalid_shape(format!("{path}.shape"), format!("{:?}", self.shape)))
    }
}

fn checked_product(dims: impl Iterator<Item = i64>, field: &str) -> Result<i64, PlanError> {
    let dims: Vec<i64> = dims.collect();
    if dims.contains(&0) {
        return Ok(0);
    }
    dims.iter()
        .try_fold(1i64, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| PlanError::invalid_shape(field, format!("{dims:?} overflows i64")))
}

/// Presence bitmask of the optional inputs, in declaration order.
///
/// # Errors
///
/// Returns [`PlanError::UnsupportedConfiguration`] when there are more
/// optional slots than bits in the mask.
pub fn optional_presence_mask(operands: &[OperandDescriptor]) -> Result<u32, PlanError> {
    let mut mask = 0u32;
    let optionals = operands.iter().filter(|o| o.role == Role::OptionalInput);
    for (slot, op) in optionals.enumerate() {
        if slot >= 32 {
            return Err(PlanError::unsupported("optional_inputs", slot + 1));
        }
        if op.presence {
            mask |= 1 << slot;
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn dtype_widths() {
        assert_eq!(DType::Float16.size_bytes(), 2);
        assert_eq!(DType::BFloat16.size_bytes(), 2);
        assert_eq!(DType::Float32.size_bytes(), 4);
        assert_eq!(DType::Int64.size_bytes(), 8);
        assert_eq!(DType::Bool.size_bytes(), 1);
    }

    #[test]
    fn dtype_codes_are_distinct_digits() {
        let mut codes: Vec<u64> = DType::ALL.iter().map(|d| d.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), DType::ALL.len());
        assert!(codes.iter().all(|&c| c < 10));
    }

    #[test]
    fn scalar_has_one_element() {
        let s = OperandDescriptor::input("s", &[], DType::Float32);
        assert_eq!(s.element_count("s").unwrap(), 1);
        assert_eq!(s.outer_extent("s").unwrap(), 1);
        assert_eq!(s.reduced_extent("s").unwrap(), 1);
    }

    #[test]
    fn negative_extent_names_the_axis() {
        let d = OperandDescriptor::input("x", &[4, -1], DType::Float32);
        let err = d.validate("operands[0]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidShape);
        assert_eq!(err.field(), Some("operands[0].shape[1]"));
        assert_eq!(err.value(), Some("-1"));
    }

    #[test]
    fn overflowing_shape_rejected() {
        let d = OperandDescriptor::input("x", &[i64::MAX, 2], DType::Int8);
        let err = d.validate("operands[0]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidShape);
        assert_eq!(err.field(), Some("operands[0].shape"));
    }

    #[test]
    fn element_bytes_must_match_dtype() {
        let mut d = OperandDescriptor::input("x", &[4], DType::Float32);
        d.element_bytes = 2;
        assert_eq!(d.validate("x").unwrap_err().field(), Some("x.element_bytes"));
        d.element_bytes = 3;
        assert_eq!(d.validate("x").unwrap_err().value(), Some("3"));
    }

    #[test]
    fn axes_length_must_match_rank() {
        let d = OperandDescriptor::input("x", &[4, 8], DType::Float32)
            .with_axes(&[AxisKind::Elementwise]);
        assert_eq!(d.validate("x").unwrap_err().field(), Some("x.axes"));
    }

    #[test]
    fn outer_and_reduced_extents_split_the_shape() {
        let d = OperandDescriptor::input("x", &[2, 3, 64], DType::Float16).with_axes(&[
            AxisKind::Elementwise,
            AxisKind::Broadcast,
            AxisKind::Reduced,
        ]);
        assert_eq!(d.outer_extent("x").unwrap(), 6);
        assert_eq!(d.reduced_extent("x").unwrap(), 64);
        assert_eq!(d.byte_size("x").unwrap(), 2 * 3 * 64 * 2);
    }

    #[test]
    fn absent_optional_is_not_present() {
        let d = OperandDescriptor::optional("bias", &[8], DType::Float32, false);
        assert!(!d.is_present());
        assert!(OperandDescriptor::output("y", &[8], DType::Float32).is_present());
    }

    #[test]
    fn presence_mask_follows_declaration_order() {
        let ops = vec![
            OperandDescriptor::input("x", &[8], DType::Float32),
            OperandDescriptor::optional("a", &[8], DType::Float32, false),
            OperandDescriptor::output("y", &[8], DType::Float32),
            OperandDescriptor::optional("b", &[8], DType::Float32, true),
        ];
        assert_eq!(optional_presence_mask(&ops).unwrap(), 0b10);
    }

    #[test]
    fn too_many_optional_slots_unsupported() {
        let ops: Vec<_> = (0..33)
            .map(|i| OperandDescriptor::optional(&format!("o{i}"), &[1], DType::Int8, true))
            .collect();
        let err = optional_presence_mask(&ops).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedConfiguration);
    }

    #[test]
    fn descriptor_parses_from_yaml_with_defaults() {
        let yaml = r"
name: x
shape: [4, 16]
dtype: bfloat16
element_bytes: 2
role: optional_input
";
        let d: OperandDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(d.dtype, DType::BFloat16);
        assert_eq!(d.role, Role::OptionalInput);
        assert!(d.presence);
        assert!(d.axes.is_empty());
    }
}
