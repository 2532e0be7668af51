//! # Cumulo Engine
//!
//! Regional fan-out aggregation and cache engine for cloud account
//! inspection.
//!
//! ## Architecture
//!
//! ```text
//! CloudInspector facade (AWS)        Engine
//! ├── region/listing calls    ←────  RegionActivityProbe
//! │                                      │ active regions
//! ├── analysis calls          ←────  FanOut (per-unit isolation)
//! │                                      │ partial lists
//! └── identity resolution     ←────  InspectionService
//!                                        │ composite reports
//!                                    CacheStore (TTL, force-refresh)
//! ```
//!
//! The engine decides which regions are active for an account, runs the
//! independent remote fetches for a scan concurrently without letting any
//! single failure abort the whole thing, merges the partial lists into
//! deterministic composite reports, and keeps every expensive aggregate
//! behind a force-refreshable TTL cache.
//!
//! Failure policy: a failing fan-out unit contributes an empty result, so
//! composite totals are a lower bound rather than an error. Only account
//! resolution is fatal. See [`fanout`] and [`aggregate`] for details.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod aws;
pub mod cache;
pub mod config;
pub mod error;
pub mod fanout;
pub mod geo;
pub mod probe;
pub mod report;

#[cfg(test)]
pub(crate) mod testutil;

// ============================================================================
// Public exports - Aggregation API
// ============================================================================

// Composite aggregation
pub use aggregate::{InspectionService, ScanFamily};

// Composite reports
pub use report::{
    CostReport, InventoryReport, OptimizationReport, RegionReport, RegionSummary,
    ReservationReport, SecurityReport,
};

// ============================================================================
// Public exports - Core infrastructure
// ============================================================================

// Error handling
pub use error::{EngineError, Result};

// Cache store
pub use cache::{CacheStore, Clock, ManualClock, SystemClock, cache_key};

// Fan-out execution
pub use fanout::{FanOut, Gathered, SubTask};

// Region activity detection
pub use probe::RegionActivityProbe;

// Configuration
pub use config::{
    DEFAULT_AGGREGATE_TTL_SECS, DEFAULT_PROBE_TTL_SECS, DEFAULT_UNIT_TIMEOUT_SECS, EngineConfig,
};

// Reference data
pub use geo::{GeoTable, RegionGeo, SustainabilityTag};

// AWS facade
pub use aws::AwsInspector;
