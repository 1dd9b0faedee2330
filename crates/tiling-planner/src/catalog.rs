//! Kernel-variant catalog and operator families.
//!
//! A catalog is the finite table of compiled kernel variants an operator
//! ships with, indexed by `(dtype, optional presence mask, regime)`. It is
//! the only place an unsupported combination is rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::operand::DType;
use crate::subtile::SubTileStrategy;

/// Data-size regime a kernel variant is specialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeRegime {
    /// The whole operand fits the on-chip working set.
    FullLoad,
    /// The operand is streamed through scratch in sub-tiles.
    Streaming,
}

impl ShapeRegime {
    pub const ALL: [ShapeRegime; 2] = [ShapeRegime::FullLoad, ShapeRegime::Streaming];

    /// Digit used by the weighted key encoding.
    pub fn code(self) -> u64 {
        match self {
            Self::FullLoad => 0,
            Self::Streaming => 1,
        }
    }
}

impl std::fmt::Display for ShapeRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullLoad => write!(f, "full_load"),
            Self::Streaming => write!(f, "streaming"),
        }
    }
}

/// Default key of a variant: presence mask in the thousands, dtype code in
/// the tens, regime in the units.
pub fn weighted_key(dtype: DType, optional_mask: u32, regime: ShapeRegime) -> u64 {
    u64::from(optional_mask) * 1000 + dtype.code() * 10 + regime.code()
}

/// One compiled kernel variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub dtype: DType,
    #[serde(default)]
    pub optional_mask: u32,
    pub regime: ShapeRegime,
    /// Explicit key; the weighted key is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<u64>,
}

impl CatalogEntry {
    pub fn new(dtype: DType, optional_mask: u32, regime: ShapeRegime) -> Self {
        Self {
            dtype,
            optional_mask,
            regime,
            key: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: u64) -> Self {
        self.key = Some(key);
        self
    }

    /// Key dispatched to for this entry.
    pub fn plan_key(&self) -> u64 {
        self.key
            .unwrap_or_else(|| weighted_key(self.dtype, self.optional_mask, self.regime))
    }

    fn triple(&self) -> (DType, u32, ShapeRegime) {
        (self.dtype, self.optional_mask, self.regime)
    }
}

impl std::fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} mask={:#b} {} -> {}",
            self.dtype,
            self.optional_mask,
            self.regime,
            self.plan_key()
        )
    }
}

/// Validated lookup table from `(dtype, mask, regime)` to plan key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<(DType, u32, ShapeRegime), CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate triples and duplicate keys.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnsupportedConfiguration`] naming the first
    /// conflicting entry.
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self, PlanError> {
        let mut map = BTreeMap::new();
        let mut keys: BTreeMap<u64, usize> = BTreeMap::new();
        for (i, entry) in entries.into_iter().enumerate() {
            let key = entry.plan_key();
            if let Some(first) = keys.insert(key, i) {
                return Err(PlanError::unsupported(
                    format!("kernels[{i}].key"),
                    format!("{key} already used by kernels[{first}]"),
                ));
            }
            if map.insert(entry.triple(), entry.clone()).is_some() {
                return Err(PlanError::unsupported(format!("kernels[{i}]"), entry));
            }
        }
        Ok(Self { entries: map })
    }

    /// Every `dtype x mask x regime` combination with weighted keys.
    ///
    /// # Errors
    ///
    /// Fails when `dtypes` or `masks` repeats a value.
    pub fn full(dtypes: &[DType], masks: &[u32]) -> Result<Self, PlanError> {
        let mut entries = Vec::new();
        for &dtype in dtypes {
            for &mask in masks {
                for regime in ShapeRegime::ALL {
                    entries.push(CatalogEntry::new(dtype, mask, regime));
                }
            }
        }
        Self::new(entries)
    }

    /// Look up the kernel variant for a combination.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnsupportedConfiguration`] when no compiled
    /// variant exists.
    pub fn select_key(
        &self,
        dtype: DType,
        optional_mask: u32,
        regime: ShapeRegime,
    ) -> Result<u64, PlanError> {
        self.entries
            .get(&(dtype, optional_mask, regime))
            .map(CatalogEntry::plan_key)
            .ok_or_else(|| {
                PlanError::unsupported(
                    "dtype/optional_mask/regime",
                    format!("{dtype}/{optional_mask:#b}/{regime}"),
                )
            })
    }

    /// Entries ordered by dtype, then mask, then regime.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn supports_regime(&self, regime: ShapeRegime) -> bool {
        self.entries.values().any(|e| e.regime == regime)
    }
}

fn default_min_units_per_lane() -> u32 {
    1
}

/// Declarative description of one operator: its scratch use, thresholds,
/// workspace needs and compiled kernel variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorFamily {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Scratch copies of one unit held at once (inputs, outputs, double
    /// buffering).
    pub buffer_multiplier: u32,
    /// Driving operands up to this many bytes use [`ShapeRegime::FullLoad`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_load_max_bytes: Option<u64>,
    #[serde(default = "default_min_units_per_lane")]
    pub min_units_per_lane: u32,
    #[serde(default)]
    pub user_workspace_bytes: u64,
    /// Cross-lane reduction staging per lane.
    #[serde(default)]
    pub per_lane_partial_bytes: u64,
    #[serde(default)]
    pub sub_tile: SubTileStrategy,
    pub kernels: Vec<CatalogEntry>,
}

impl OperatorFamily {
    /// # Errors
    ///
    /// See [`Catalog::new`].
    pub fn catalog(&self) -> Result<Catalog, PlanError> {
        Catalog::new(self.kernels.iter().cloned())
    }

    /// Regime implied by the threshold for a driving operand of `bytes`.
    pub fn regime_for(&self, bytes: u64) -> ShapeRegime {
        match self.full_load_max_bytes {
            Some(max) if bytes <= max => ShapeRegime::FullLoad,
            _ => ShapeRegime::Streaming,
        }
    }
}
