//! fusion-core - Core types and traits for retrieval fusion
//!
//! This crate provides the document model, identity keys, collaborator
//! traits, configuration and error handling shared by the fusion engine
//! and the multi-query orchestrator.

pub mod config;
pub mod error;
pub mod identity;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{FusionError, Result};
pub use identity::{canonical_form, DocumentKey};
pub use traits::*;
pub use types::*;
