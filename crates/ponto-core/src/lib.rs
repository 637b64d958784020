//! # ponto-core
//!
//! Core types, traits, and the encoding normalizer for ponto.
//!
//! This crate provides the pure text transform (detection and repair of
//! Portuguese text damaged by transcoding) and the data structures the
//! storage and API crates share.

pub mod config;
pub mod defaults;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::EncodingConfig;
pub use encoding::{fix_one_field, CorruptionSignature, Normalizer, PatternTable, Tier};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
