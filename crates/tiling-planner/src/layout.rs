//! Fixed binary layout of a tiling plan as handed to the kernel.
//!
//! The record is little-endian and densely packed: the 8-byte fields come
//! first and the 4-byte fields after, so every field is naturally aligned
//! without padding. [`PLAN_LAYOUT`] is the single source of truth for
//! offsets; the encoder, the decoder and the C header all follow it.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// One named field of the wire record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub signed: bool,
    pub unit: &'static str,
}

impl FieldSpec {
    const fn new(
        name: &'static str,
        offset: usize,
        width: usize,
        signed: bool,
        unit: &'static str,
    ) -> Self {
        Self {
            name,
            offset,
            width,
            signed,
            unit,
        }
    }

    /// C type used for this field in the generated header.
    pub fn c_type(&self) -> &'static str {
        match (self.width, self.signed) {
            (8, true) => "int64_t",
            (8, false) => "uint64_t",
            (4, true) => "int32_t",
            _ => "uint32_t",
        }
    }
}

pub const PLAN_LAYOUT: [FieldSpec; 12] = [
    FieldSpec::new("regular_extent", 0, 8, true, "partition units"),
    FieldSpec::new("remainder_extent", 8, 8, true, "partition units"),
    FieldSpec::new("sub_tile_extent", 16, 8, true, "partition units"),
    FieldSpec::new("sub_tile_tail_extent", 24, 8, true, "partition units"),
    FieldSpec::new("remainder_tail_extent", 32, 8, true, "partition units"),
    FieldSpec::new("plan_key", 40, 8, false, "opaque key"),
    FieldSpec::new("workspace_bytes", 48, 8, false, "bytes"),
    FieldSpec::new("lane_count", 56, 4, false, "lanes"),
    FieldSpec::new("regular_lane_count", 60, 4, false, "lanes"),
    FieldSpec::new("remainder_lane_count", 64, 4, false, "lanes"),
    FieldSpec::new("sub_tile_loop_count", 68, 4, false, "loops"),
    FieldSpec::new("remainder_loop_count", 72, 4, false, "loops"),
];

/// Size of one encoded plan.
pub const RECORD_BYTES: usize = 76;

/// Decoded form of the wire record, field for field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFields {
    pub regular_extent: i64,
    pub remainder_extent: i64,
    pub sub_tile_extent: i64,
    pub sub_tile_tail_extent: i64,
    pub remainder_tail_extent: i64,
    pub plan_key: u64,
    pub workspace_bytes: u64,
    pub lane_count: u32,
    pub regular_lane_count: u32,
    pub remainder_lane_count: u32,
    pub sub_tile_loop_count: u32,
    pub remainder_loop_count: u32,
}

/// Encode `fields` into a [`RECORD_BYTES`]-long record.
pub fn serialize(fields: &PlanFields) -> Vec<u8> {
    let mut out = Vec::with_capacity(RECORD_BYTES);
    out.extend_from_slice(&fields.regular_extent.to_le_bytes());
    out.extend_from_slice(&fields.remainder_extent.to_le_bytes());
    out.extend_from_slice(&fields.sub_tile_extent.to_le_bytes());
    out.extend_from_slice(&fields.sub_tile_tail_extent.to_le_bytes());
    out.extend_from_slice(&fields.remainder_tail_extent.to_le_bytes());
    out.extend_from_slice(&fields.plan_key.to_le_bytes());
    out.extend_from_slice(&fields.workspace_bytes.to_le_bytes());
    out.extend_from_slice(&fields.lane_count.to_le_bytes());
    out.extend_from_slice(&fields.regular_lane_count.to_le_bytes());
    out.extend_from_slice(&fields.remainder_lane_count.to_le_bytes());
    out.extend_from_slice(&fields.sub_tile_loop_count.to_le_bytes());
    out.extend_from_slice(&fields.remainder_loop_count.to_le_bytes());
    debug_assert_eq!(out.len(), RECORD_BYTES);
    out
}

/// Decode a record produced by [`serialize`].
///
/// # Errors
///
/// Returns [`PlanError::MalformedRecord`] unless `bytes` is exactly
/// [`RECORD_BYTES`] long.
pub fn deserialize(bytes: &[u8]) -> Result<PlanFields, PlanError> {
    if bytes.len() != RECORD_BYTES {
        return Err(PlanError::MalformedRecord {
            expected: RECORD_BYTES,
            actual: bytes.len(),
        });
    }
    let mut r = Reader { bytes, offset: 0 };
    Ok(PlanFields {
        regular_extent: i64::from_le_bytes(r.take()),
        remainder_extent: i64::from_le_bytes(r.take()),
        sub_tile_extent: i64::from_le_bytes(r.take()),
        sub_tile_tail_extent: i64::from_le_bytes(r.take()),
        remainder_tail_extent: i64::from_le_bytes(r.take()),
        plan_key: u64::from_le_bytes(r.take()),
        workspace_bytes: u64::from_le_bytes(r.take()),
        lane_count: u32::from_le_bytes(r.take()),
        regular_lane_count: u32::from_le_bytes(r.take()),
        remainder_lane_count: u32::from_le_bytes(r.take()),
        sub_tile_loop_count: u32::from_le_bytes(r.take()),
        remainder_loop_count: u32::from_le_bytes(r.take()),
    })
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.offset..self.offset + N]);
        self.offset += N;
        out
    }
}

/// Narrow a loop count to its 4-byte wire field.
///
/// # Errors
///
/// Returns [`PlanError::SerializationOverflow`] when `value` exceeds
/// `u32::MAX`.
pub fn narrow_u32(field: &str, value: u64) -> Result<u32, PlanError> {
    u32::try_from(value).map_err(|_| PlanError::overflow(field, value))
}

/// Human-readable table of the layout.
pub fn render_text() -> String {
    let mut out = format!("{:<24} {:>6} {:>5}  {:<6} unit\n", "field", "offset", "width", "type");
    for f in &PLAN_LAYOUT {
        out.push_str(&format!(
            "{:<24} {:>6} {:>5}  {:<6} {}\n",
            f.name,
            f.offset,
            f.width,
            if f.signed { "signed" } else { "uint" },
            f.unit
        ));
    }
    out.push_str(&format!("record size: {RECORD_BYTES} bytes\n"));
    out
}

/// Packed C struct matching the layout, for the kernel side.
pub fn render_c_header(struct_name: &str) -> String {
    let guard = struct_name.to_ascii_uppercase();
    let mut out = String::new();
    out.push_str(&format!("#ifndef {guard}_H\n#define {guard}_H\n\n"));
    out.push_str("#include <stdint.h>\n\n");
    out.push_str("#pragma pack(push, 1)\n");
    out.push_str(&format!("typedef struct {struct_name} {{\n"));
    for f in &PLAN_LAYOUT {
        out.push_str(&format!(
            "    {} {}; /* offset {}, {} */\n",
            f.c_type(),
            f.name,
            f.offset,
            f.unit
        ));
    }
    out.push_str(&format!("}} {struct_name};\n"));
    out.push_str("#pragma pack(pop)\n\n");
    out.push_str(&format!(
        "_Static_assert(sizeof({struct_name}) == {RECORD_BYTES}, \"plan record size\");\n\n"
    ));
    out.push_str(&format!("#endif /* {guard}_H */\n"));
    out
}
