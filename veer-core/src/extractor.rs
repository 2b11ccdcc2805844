//! # Selection-Key Extraction
//!
//! A [`SelectionKeyExtractor`] is bound to exactly one
//! (extension point, method, argument) triple and derives an extension name
//! from that argument's runtime value.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --set_*--> Configured --init--> Ready
//! ```
//!
//! All four setup fields are recorded once, then [`init`] validates them
//! together. Only a `Ready` extractor may [`extract`]; from then on it holds
//! no per-call state and is shared across threads without locking.
//!
//! # No opinion
//!
//! `Ok(None)` means the argument carries no selection signal. It is not an
//! error: the chain simply moves on to the next extractor.
//!
//! [`init`]: SelectionKeyExtractor::init
//! [`extract`]: SelectionKeyExtractor::extract

use crate::adaptive::AdaptiveSpec;
use crate::argument::{Argument, ArgumentType};
use crate::error::ExtractError;
use crate::point::{ExtensionPointId, MethodSignature};
use std::borrow::Cow;

/// Strategy that derives an extension name from one call argument.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a selection-key extractor",
    label = "missing `SelectionKeyExtractor` implementation",
    note = "Embed `ExtractorSetupSlots` to get the lifecycle checks for free."
)]
pub trait SelectionKeyExtractor: Send + Sync {
    /// Record the owning extension point.
    fn set_extension_point(&mut self, point: ExtensionPointId) -> Result<(), ExtractError>;

    /// Record the target method.
    fn set_method(&mut self, method: MethodSignature) -> Result<(), ExtractError>;

    /// Record the expected runtime type of the argument.
    fn set_argument_type(&mut self, argument_type: ArgumentType) -> Result<(), ExtractError>;

    /// Record the adaptive-selection metadata of the argument.
    fn set_adaptive_spec(&mut self, spec: AdaptiveSpec) -> Result<(), ExtractError>;

    /// Validate the four setup fields together and become ready.
    fn init(&mut self) -> Result<(), ExtractError>;

    /// Derive a name from `argument`, or `None` for no opinion.
    fn extract<'a>(&self, argument: Argument<'a>) -> Result<Option<Cow<'a, str>>, ExtractError>;

    /// Record all four setup fields at once.
    fn configure(&mut self, setup: ExtractorSetup) -> Result<(), ExtractError> {
        self.set_extension_point(setup.point)?;
        self.set_method(setup.method)?;
        self.set_argument_type(setup.argument_type)?;
        self.set_adaptive_spec(setup.spec)
    }
}

impl<T: SelectionKeyExtractor + ?Sized> SelectionKeyExtractor for Box<T> {
    fn set_extension_point(&mut self, point: ExtensionPointId) -> Result<(), ExtractError> {
        (**self).set_extension_point(point)
    }

    fn set_method(&mut self, method: MethodSignature) -> Result<(), ExtractError> {
        (**self).set_method(method)
    }

    fn set_argument_type(&mut self, argument_type: ArgumentType) -> Result<(), ExtractError> {
        (**self).set_argument_type(argument_type)
    }

    fn set_adaptive_spec(&mut self, spec: AdaptiveSpec) -> Result<(), ExtractError> {
        (**self).set_adaptive_spec(spec)
    }

    fn init(&mut self) -> Result<(), ExtractError> {
        (**self).init()
    }

    fn extract<'a>(&self, argument: Argument<'a>) -> Result<Option<Cow<'a, str>>, ExtractError> {
        (**self).extract(argument)
    }

    fn configure(&mut self, setup: ExtractorSetup) -> Result<(), ExtractError> {
        (**self).configure(setup)
    }
}

/// The four setup fields of an extractor.
#[derive(Debug, Clone)]
pub struct ExtractorSetup {
    /// Owning extension point.
    pub point: ExtensionPointId,
    /// Target method.
    pub method: MethodSignature,
    /// Expected runtime type of the argument.
    pub argument_type: ArgumentType,
    /// Adaptive-selection metadata.
    pub spec: AdaptiveSpec,
}

impl ExtractorSetup {
    /// Fails with `ArgumentTypeMismatch` unless `argument` is `Null` or of
    /// the configured type.
    pub fn check_type(&self, argument: &Argument<'_>) -> Result<(), ExtractError> {
        match argument.kind() {
            Some(found) if found != self.argument_type => Err(ExtractError::ArgumentTypeMismatch {
                method: self.method.name().to_string(),
                expected: self.argument_type,
                found,
            }),
            _ => Ok(()),
        }
    }

    /// Shorthand for an `InvalidAdaptiveSpec` error on this setup.
    pub fn invalid(&self, reason: impl Into<String>) -> ExtractError {
        ExtractError::InvalidAdaptiveSpec {
            method: self.method.name().to_string(),
            argument_type: self.argument_type,
            reason: reason.into(),
        }
    }
}

/// Lifecycle state of an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorState {
    /// No setup field recorded yet.
    Uninitialized,
    /// Some or all setup fields recorded, `init` not yet run.
    Configured,
    /// `init` assembled the setup but validation rejected it. Terminal.
    Initialized,
    /// `init` validated the setup; extraction is allowed.
    Ready,
}

/// Reusable lifecycle bookkeeping for extractor implementations.
///
/// Enforces "each field once, all before `init`, `init` before `extract`".
/// `init` moves the slots through `Initialized`, where the assembled setup
/// is validated, and on to `Ready`. An extractor that fails validation stays
/// `Initialized` and can never extract.
#[derive(Debug, Default)]
pub struct ExtractorSetupSlots {
    point: Option<ExtensionPointId>,
    method: Option<MethodSignature>,
    argument_type: Option<ArgumentType>,
    spec: Option<AdaptiveSpec>,
    setup: Option<ExtractorSetup>,
    validated: bool,
}

impl ExtractorSetupSlots {
    /// Empty slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExtractorState {
        if self.validated {
            ExtractorState::Ready
        } else if self.setup.is_some() {
            ExtractorState::Initialized
        } else if self.point.is_some()
            || self.method.is_some()
            || self.argument_type.is_some()
            || self.spec.is_some()
        {
            ExtractorState::Configured
        } else {
            ExtractorState::Uninitialized
        }
    }

    /// Record the extension point.
    pub fn set_extension_point(&mut self, point: ExtensionPointId) -> Result<(), ExtractError> {
        self.ensure_open("extension point")?;
        fill_once(&mut self.point, point, "extension point")
    }

    /// Record the method.
    pub fn set_method(&mut self, method: MethodSignature) -> Result<(), ExtractError> {
        self.ensure_open("method")?;
        fill_once(&mut self.method, method, "method")
    }

    /// Record the argument type.
    pub fn set_argument_type(&mut self, argument_type: ArgumentType) -> Result<(), ExtractError> {
        self.ensure_open("argument type")?;
        fill_once(&mut self.argument_type, argument_type, "argument type")
    }

    /// Record the adaptive spec.
    pub fn set_adaptive_spec(&mut self, spec: AdaptiveSpec) -> Result<(), ExtractError> {
        self.ensure_open("adaptive spec")?;
        fill_once(&mut self.spec, spec, "adaptive spec")
    }

    /// Move the four fields into a complete setup and run `validate` on it.
    ///
    /// On success the slots are `Ready`. On failure they stay `Initialized`,
    /// so the extractor is unusable and cannot be initialized again.
    pub fn init_with<F>(&mut self, validate: F) -> Result<&ExtractorSetup, ExtractError>
    where
        F: FnOnce(&ExtractorSetup) -> Result<(), ExtractError>,
    {
        if self.setup.is_some() {
            return Err(ExtractError::not_configured("init called twice"));
        }
        let (Some(point), Some(method), Some(argument_type), Some(spec)) = (
            self.point,
            self.method.clone(),
            self.argument_type,
            self.spec.clone(),
        ) else {
            return Err(ExtractError::not_configured(format!(
                "init called before setting {}",
                self.missing_fields().join(", ")
            )));
        };
        let setup = ExtractorSetup {
            point,
            method,
            argument_type,
            spec,
        };
        let setup = &*self.setup.insert(setup);
        validate(setup)?;
        self.validated = true;
        Ok(setup)
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("extension point", self.point.is_none()),
            ("method", self.method.is_none()),
            ("argument type", self.argument_type.is_none()),
            ("adaptive spec", self.spec.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect()
    }

    /// The validated setup, or `NotConfigured` before `init`.
    pub fn ready(&self) -> Result<&ExtractorSetup, ExtractError> {
        match &self.setup {
            Some(setup) if self.validated => Ok(setup),
            Some(_) => Err(ExtractError::not_configured(
                "extract called after init failed validation",
            )),
            None => Err(ExtractError::not_configured("extract called before init")),
        }
    }

    fn ensure_open(&self, field: &str) -> Result<(), ExtractError> {
        if self.setup.is_some() {
            Err(ExtractError::not_configured(format!(
                "{field} set after init"
            )))
        } else {
            Ok(())
        }
    }
}

fn fill_once<T>(slot: &mut Option<T>, value: T, field: &str) -> Result<(), ExtractError> {
    if slot.is_some() {
        return Err(ExtractError::not_configured(format!("{field} set twice")));
    }
    *slot = Some(value);
    Ok(())
}
