//! # veer - Adaptive Extension Dispatch
//!
//! A program depends on an abstract capability and `veer` picks the concrete
//! implementation per call, from a key carried by the call's own arguments.
//! Implementations are constructed lazily, at most once each, and shared.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use veer::prelude::*;
//!
//! pub trait Compressor: Send + Sync {
//!     fn compress(&self, data: &[u8]) -> Vec<u8>;
//! }
//!
//! pub struct CompressorPoint;
//!
//! impl ExtensionPoint for CompressorPoint {
//!     type Instance = dyn Compressor;
//!     const NAME: &'static str = "Compressor";
//!     const DEFAULT: Option<&'static str> = Some("gzip");
//! }
//!
//! let registry = Registry::builder()
//!     .register::<CompressorPoint, _>("gzip", gzip)
//!     .register::<CompressorPoint, _>("lz4", lz4)
//!     .adaptive_method::<CompressorPoint>(
//!         AdaptiveMethod::new("compress", [ArgumentType::Bytes, ArgumentType::Properties])
//!             .adaptive(1, AdaptiveSpec::key("compressor.type")),
//!     )
//!     .build()?;
//!
//! // {"compressor.type": "lz4"} selects lz4; an empty map falls back to gzip.
//! let target = registry.dispatch::<CompressorPoint>(
//!     "compress",
//!     &[Argument::from(data), Argument::from(&options)],
//! )?;
//! let out = target.compress(data);
//! ```
//!
//! ## Features
//!
//! - `tracing` (default): diagnostics go to `tracing`
//! - `inventory`: [`register_extension!`] and [`InventoryDiscovery`](discovery::InventoryDiscovery)
//! - `serde`: bindings such as [`AdaptiveSpec`] deserialize from config

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use veer_core::{
    // Adaptive metadata
    AdaptiveSpec,
    // Arguments
    Argument,
    ArgumentType,
    // Errors
    BootstrapError,
    BoxError,
    DispatchError,
    // Extension points
    ExtensionDescriptor,
    ExtensionPoint,
    ExtensionPointId,
    ExtractError,
    // Extraction
    ExtractorFactory,
    ExtractorSetup,
    ExtractorSetupSlots,
    ExtractorState,
    Factory,
    MethodSignature,
    Properties,
    SelectionKeyExtractor,
    SharedError,
    VeerError,
};

// Registry
pub use veer_std::{Adaptive, AdaptiveMethod, Registry, RegistryBuilder};

/// Instance cache.
pub mod cache {
    pub use veer_std::cache::{FactoryPanicked, InstanceCache};
}

/// Extraction chains.
pub mod chain {
    pub use veer_std::chain::{ExtractionChain, ExtractionChainBuilder};
}

/// Standard extractors.
pub mod extractors {
    pub use veer_std::extractors::{FnExtractor, KeyExtractor, for_spec};
}

/// Descriptor discovery.
pub mod discovery {
    pub use veer_std::discovery::Discovery;
    #[cfg(feature = "inventory")]
    pub use veer_std::discovery::{ExtensionRegistration, InventoryDiscovery};
}

/// Logging facade.
pub mod logging {
    #[cfg(feature = "tracing")]
    pub use veer_std::logging::TracingBackend;
    pub use veer_std::logging::{
        CACHE_LOGGER, CHAIN_LOGGER, Level, LogBackend, Logger, SilentBackend, StderrBackend,
        default_backend, logger, set_default_backend,
    };
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use veer_std::testing::*;
}

/// Prelude module - common imports for Veer.
///
/// # Usage
///
/// ```rust,ignore
/// use veer::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Adaptive,
        AdaptiveMethod,
        AdaptiveSpec,
        Argument,
        ArgumentType,
        BootstrapError,
        BoxError,
        DispatchError,
        ExtensionDescriptor,
        ExtensionPoint,
        Registry,
        SelectionKeyExtractor,
        VeerError,
    };
}

#[cfg(feature = "inventory")]
pub use veer_std::{inventory, register_extension};
