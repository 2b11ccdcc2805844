//! Standard selection-key extractors.
//!
//! - [`KeyExtractor`]: the name is a text argument, or a keyed value inside a
//!   properties argument. Used whenever an [`AdaptiveSpec`] carries no custom
//!   extractor.
//! - [`FnExtractor`]: any closure, with the lifecycle and type checks of the
//!   standard extractor.
//!
//! [`AdaptiveSpec`]: veer_core::AdaptiveSpec

pub mod func;
pub mod key;

pub use func::FnExtractor;
pub use key::KeyExtractor;

use veer_core::{AdaptiveSpec, SelectionKeyExtractor};

/// Create the extractor `spec` asks for, unconfigured.
pub fn for_spec(spec: &AdaptiveSpec) -> Box<dyn SelectionKeyExtractor> {
    match spec.extractor() {
        Some(factory) => factory(),
        None => Box::new(KeyExtractor::new()),
    }
}
