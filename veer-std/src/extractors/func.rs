//! Closure-backed extractor.

use std::borrow::Cow;
use std::fmt;
use veer_core::{
    AdaptiveSpec, Argument, ArgumentType, ExtensionPointId, ExtractError, ExtractorSetup,
    ExtractorSetupSlots, MethodSignature, SelectionKeyExtractor,
};

/// An extractor that delegates to a closure.
///
/// The closure only sees arguments of the configured type (or `Null`), and
/// only after `init`. An optional validator runs once during `init`.
///
/// # Example
///
/// ```rust,ignore
/// // Pick the transport from the scheme of a URL argument.
/// let spec = AdaptiveSpec::direct().with_extractor(|| {
///     FnExtractor::new(|_, arg| {
///         arg.as_text()
///             .and_then(|url| url.split_once("://"))
///             .map(|(scheme, _)| Cow::Borrowed(scheme))
///     })
/// });
/// ```
pub struct FnExtractor<F> {
    slots: ExtractorSetupSlots,
    extract: F,
    validate: Option<Box<dyn Fn(&ExtractorSetup) -> Result<(), ExtractError> + Send + Sync>>,
}

impl<F> FnExtractor<F> {
    /// Wrap `extract`.
    pub fn new(extract: F) -> Self
    where
        F: for<'a> Fn(&ExtractorSetup, Argument<'a>) -> Option<Cow<'a, str>> + Send + Sync,
    {
        Self {
            slots: ExtractorSetupSlots::new(),
            extract,
            validate: None,
        }
    }

    /// Reject unusable setups at `init`.
    pub fn with_validator<V>(mut self, validate: V) -> Self
    where
        V: Fn(&ExtractorSetup) -> Result<(), ExtractError> + Send + Sync + 'static,
    {
        self.validate = Some(Box::new(validate));
        self
    }
}

impl<F> SelectionKeyExtractor for FnExtractor<F>
where
    F: for<'a> Fn(&ExtractorSetup, Argument<'a>) -> Option<Cow<'a, str>> + Send + Sync,
{
    fn set_extension_point(&mut self, point: ExtensionPointId) -> Result<(), ExtractError> {
        self.slots.set_extension_point(point)
    }

    fn set_method(&mut self, method: MethodSignature) -> Result<(), ExtractError> {
        self.slots.set_method(method)
    }

    fn set_argument_type(&mut self, argument_type: ArgumentType) -> Result<(), ExtractError> {
        self.slots.set_argument_type(argument_type)
    }

    fn set_adaptive_spec(&mut self, spec: AdaptiveSpec) -> Result<(), ExtractError> {
        self.slots.set_adaptive_spec(spec)
    }

    fn init(&mut self) -> Result<(), ExtractError> {
        let validate = self.validate.as_deref();
        self.slots
            .init_with(|setup| validate.map_or(Ok(()), |v| v(setup)))
            .map(|_| ())
    }

    fn extract<'a>(&self, argument: Argument<'a>) -> Result<Option<Cow<'a, str>>, ExtractError> {
        let setup = self.slots.ready()?;
        setup.check_type(&argument)?;
        Ok((self.extract)(setup, argument).filter(|name| !name.is_empty()))
    }
}

impl<F> fmt::Debug for FnExtractor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExtractor")
            .field("state", &self.slots.state())
            .field("validated", &self.validate.is_some())
            .finish_non_exhaustive()
    }
}
