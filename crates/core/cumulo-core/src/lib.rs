//! Cumulo Core - Shared types and traits
//!
//! This crate defines the core abstractions used across:
//! - cumulo-engine (fan-out aggregation and cache engine)
//! - the `cumulo` CLI
//! - provider facades (AWS today, other clouds later)
//!
//! Key types:
//! - CloudInspector trait (interface for cloud provider facades)
//! - ResourceRecord and the per-family detail payloads
//! - ProviderError taxonomy and the ServiceSupport tri-state

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
