//! # veer-std
//!
//! Standard implementations for the Veer adaptive extension dispatch engine.
//!
//! This crate provides:
//! - **Extractors**: [`KeyExtractor`](extractors::KeyExtractor), [`FnExtractor`](extractors::FnExtractor)
//! - **Extraction chains**: [`ExtractionChain`](chain::ExtractionChain)
//! - **Instance cache**: [`InstanceCache`](cache::InstanceCache), at most one construction per name
//! - **Registry**: [`Registry`], [`RegistryBuilder`], [`AdaptiveMethod`]
//! - **Discovery**: in-memory lists, and `inventory` collection behind the `inventory` feature
//! - **Logging**: a small leveled facade, forwarding to `tracing` behind the `tracing` feature

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use veer_core;

// Modules
pub mod cache;
pub mod chain;
pub mod discovery;
pub mod extractors;
pub mod logging;
pub mod registry;
pub mod testing;

pub use registry::{Adaptive, AdaptiveMethod, Registry, RegistryBuilder};

#[cfg(feature = "inventory")]
pub use inventory;
