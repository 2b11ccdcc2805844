//! Error types for Veer.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`VeerError`] - Top-level error type for all Veer operations
//! - [`ExtractError`] - Selection-key extractor lifecycle and typing errors
//! - [`DispatchError`] - Errors while resolving a call to an implementation
//! - [`BootstrapError`] - Registry configuration errors (always fatal)

use crate::argument::ArgumentType;
use std::sync::Arc;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A reference-counted error, handed to every caller waiting on the same failure.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Veer operations.
#[derive(Error, Debug)]
pub enum VeerError {
    /// The registry could not be bootstrapped.
    #[error("bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// A call could not be dispatched.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A selection-key extractor failed.
    #[error("extract error: {0}")]
    Extract(#[from] ExtractError),
}

/// Errors raised by selection-key extractors.
///
/// All of these are programming errors; none of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The extractor was used out of lifecycle order.
    #[error("extractor not configured: {reason}")]
    NotConfigured {
        /// What was out of order.
        reason: String,
    },

    /// The adaptive metadata cannot be satisfied by the argument type.
    #[error("invalid adaptive spec on `{method}` ({argument_type} argument): {reason}")]
    InvalidAdaptiveSpec {
        /// Method the extractor is bound to.
        method: String,
        /// Declared argument type.
        argument_type: ArgumentType,
        /// Why the combination is unusable.
        reason: String,
    },

    /// The runtime argument does not have the configured type.
    #[error("argument type mismatch on `{method}`: expected {expected}, found {found}")]
    ArgumentTypeMismatch {
        /// Method the extractor is bound to.
        method: String,
        /// Configured argument type.
        expected: ArgumentType,
        /// Type of the value actually passed.
        found: ArgumentType,
    },
}

impl ExtractError {
    /// Shorthand for [`ExtractError::NotConfigured`].
    pub fn not_configured(reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while dispatching a call.
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    /// An extractor rejected an argument.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Every extractor abstained and no default name was declared.
    #[error("no extension name resolvable for `{point}::{method}`")]
    NoNameResolvable {
        /// Extension point name.
        point: &'static str,
        /// Adaptive method name.
        method: String,
    },

    /// The resolved name has no descriptor.
    #[error("unknown extension `{name}` for extension point `{point}`")]
    UnknownExtensionName {
        /// Extension point name.
        point: &'static str,
        /// The name that failed to resolve.
        name: String,
    },

    /// The factory for `name` failed.
    #[error("failed to construct extension `{name}` of `{point}`")]
    ExtensionConstruction {
        /// Extension point name.
        point: &'static str,
        /// Extension name.
        name: String,
        /// The factory failure.
        #[source]
        source: SharedError,
    },

    /// The call carried fewer arguments than an adaptive position requires.
    #[error("`{method}` expects an argument at position {position}, but only {len} were passed")]
    MissingArgument {
        /// Adaptive method name.
        method: String,
        /// Adaptive argument position.
        position: usize,
        /// Number of arguments passed.
        len: usize,
    },

    /// The method was never declared adaptive on this extension point.
    #[error("`{method}` is not an adaptive method of `{point}`")]
    UnknownMethod {
        /// Extension point name.
        point: &'static str,
        /// Requested method.
        method: String,
    },

    /// The extension point was never registered.
    #[error("extension point `{point}` is not registered")]
    UnknownExtensionPoint {
        /// Extension point name.
        point: &'static str,
    },
}

/// Errors that can occur while bootstrapping a registry.
///
/// Any of these prevents the registry from being built.
#[derive(Error, Debug, Clone)]
pub enum BootstrapError {
    /// An extractor could not be configured or initialized.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The name is already registered for this extension point.
    #[error("extension `{name}` already registered for `{point}`")]
    DuplicateName {
        /// Extension point name.
        point: &'static str,
        /// Duplicated name.
        name: String,
    },

    /// Extension names must be non-blank.
    #[error("invalid extension name {name:?} for `{point}`")]
    InvalidName {
        /// Extension point name.
        point: &'static str,
        /// Rejected name.
        name: String,
    },

    /// The adaptive method is already declared for this extension point.
    #[error("adaptive method `{method}` already declared for `{point}`")]
    DuplicateMethod {
        /// Extension point name.
        point: &'static str,
        /// Duplicated method name.
        method: String,
    },

    /// Two adaptive specs were declared for the same argument.
    #[error("argument {position} of `{method}` is already adaptive")]
    DuplicateAdaptiveArgument {
        /// Method name.
        method: String,
        /// Argument position.
        position: usize,
    },

    /// The adaptive position does not exist in the method signature.
    #[error("`{method}` has {arity} parameters, no argument at position {position}")]
    ArgumentOutOfRange {
        /// Method name.
        method: String,
        /// Requested position.
        position: usize,
        /// Number of declared parameters.
        arity: usize,
    },

    /// A declared default name has no descriptor.
    #[error("default extension `{name}` of `{point}` is not registered")]
    UnknownDefault {
        /// Extension point name.
        point: &'static str,
        /// The default name.
        name: String,
    },

    /// A descriptor supplied by discovery is unusable.
    #[error("invalid descriptor `{name}` for `{point}`: {reason}")]
    InvalidDescriptor {
        /// Extension point name.
        point: &'static str,
        /// Descriptor name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}
