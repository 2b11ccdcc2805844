//! # veer-core
//!
//! Core contracts for the Veer adaptive extension dispatch engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! crates that only provide extensions or custom extractors and don't need
//! the full `veer-std` implementation.
//!
//! # Adaptive Dispatch
//!
//! A program depends on an abstract capability (an [`ExtensionPoint`]) and
//! the concrete implementation is chosen per call, from a key carried by the
//! call's own arguments:
//!
//! ```text
//! call(args) ──► extractors ──► name ──► instance cache ──► implementation
//! ```
//!
//! ## Extension points
//!
//! [`ExtensionPoint`] names a capability and the trait object its
//! implementations share. [`ExtensionDescriptor`] binds a unique name to a
//! factory for one implementation.
//!
//! ## Arguments
//!
//! [`Argument`] is a borrowed, typed view of one call argument. Key-value
//! arguments implement [`Properties`].
//!
//! ## Extraction
//!
//! A [`SelectionKeyExtractor`] turns one argument into a name, or into "no
//! opinion". [`AdaptiveSpec`] tells it where the name lives.
//!
//! # Error Types
//!
//! - [`VeerError`] - Top-level error type
//! - [`ExtractError`] - Extractor lifecycle and typing errors
//! - [`DispatchError`] - Per-call resolution errors
//! - [`BootstrapError`] - Registry configuration errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod adaptive;
mod argument;
mod descriptor;
mod error;
mod extractor;
mod point;

// Re-exports
pub use adaptive::{AdaptiveSpec, ExtractorFactory};
pub use argument::{Argument, ArgumentType, Properties};
pub use descriptor::{ExtensionDescriptor, Factory};
pub use error::{BootstrapError, BoxError, DispatchError, ExtractError, SharedError, VeerError};
pub use extractor::{ExtractorSetup, ExtractorSetupSlots, ExtractorState, SelectionKeyExtractor};
pub use point::{ExtensionPoint, ExtensionPointId, MethodSignature};
