//! Static region reference data
//!
//! Maps provider regions to geographic coordinates and a sustainability tag
//! for map-oriented dashboard views. The table is embedded at build time and
//! loaded once at startup; a region the table does not know is excluded from
//! geographically plotted views but stays present in tabular ones.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::Result;
use cumulo_core::RegionId;

/// Embedded reference table source
const REGION_GEO_JSON: &str = include_str!("../data/region_geo.json");

/// Sustainability classification of a region's grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SustainabilityTag {
    /// Mostly renewable or nuclear generation
    LowCarbon,
    /// Everything else
    Standard,
}

/// Static per-region reference entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionGeo {
    /// Provider region this entry describes
    pub region: RegionId,
    /// Data-center latitude
    pub latitude: f64,
    /// Data-center longitude
    pub longitude: f64,
    /// Grid classification
    pub sustainability: SustainabilityTag,
}

/// Region reference table, loaded once at startup
pub struct GeoTable {
    entries: HashMap<RegionId, RegionGeo>,
}

impl GeoTable {
    /// Load the embedded table
    pub fn load() -> Result<Self> {
        Self::from_json(REGION_GEO_JSON)
    }

    /// Load a table from JSON source (an external override file, or tests)
    pub fn from_json(source: &str) -> Result<Self> {
        let rows: Vec<RegionGeo> = serde_json::from_str(source)?;
        let entries = rows
            .into_iter()
            .map(|row| (row.region.clone(), row))
            .collect();
        Ok(Self { entries })
    }

    /// Look up a region. `None` means the region is dropped from map views.
    pub fn lookup(&self, region: &RegionId) -> Option<&RegionGeo> {
        let entry = self.entries.get(region);
        if entry.is_none() {
            debug!(region = %region, "region missing from geo reference table, dropped from map views");
        }
        entry
    }

    /// Number of known regions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
