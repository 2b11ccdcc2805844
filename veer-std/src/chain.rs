//! Ordered extraction of an extension name from call arguments.
//!
//! An [`ExtractionChain`] belongs to one adaptive method. It holds one
//! extractor per adaptive argument, in parameter order, and an optional
//! default name:
//!
//! ```text
//! args ──► extractor(pos 0) ──None──► extractor(pos 2) ──None──► default
//!               │ Some                     │ Some                    │ None
//!               ▼                          ▼                         ▼
//!             name                       name              NoNameResolvable
//! ```
//!
//! The first extractor with an opinion wins. Extractor errors are returned
//! unchanged and stop the chain.

use crate::extractors;
use crate::logging::{self, Logger};
use std::borrow::Cow;
use std::fmt;
use veer_core::{
    AdaptiveSpec, Argument, BootstrapError, DispatchError, ExtensionPointId, ExtractorSetup,
    MethodSignature, SelectionKeyExtractor,
};

/// Resolves the extension name of one adaptive method call.
///
/// Immutable once built, and shared across threads without locking.
pub struct ExtractionChain {
    point: ExtensionPointId,
    method: MethodSignature,
    extractors: Vec<(usize, Box<dyn SelectionKeyExtractor>)>,
    required_len: usize,
    default_name: Option<String>,
    logger: Logger,
}

impl ExtractionChain {
    /// Start a chain for `method` of extension point `point`.
    pub fn builder(point: ExtensionPointId, method: MethodSignature) -> ExtractionChainBuilder {
        ExtractionChainBuilder {
            point,
            method,
            extractors: Vec::new(),
            default_name: None,
            logger: None,
        }
    }

    /// Log fallbacks through `logger` from now on.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Owning extension point.
    pub fn point(&self) -> ExtensionPointId {
        self.point
    }

    /// The adaptive method.
    pub fn method(&self) -> &MethodSignature {
        &self.method
    }

    /// Name used when every extractor abstains.
    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Adaptive argument positions, in evaluation order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.extractors.iter().map(|(position, _)| *position)
    }

    /// Resolve the extension name for one call.
    ///
    /// `args` are the call's arguments in declared parameter order. Every
    /// adaptive position must be present, even when an earlier extractor
    /// would already have decided.
    pub fn resolve_name<'a>(&'a self, args: &[Argument<'a>]) -> Result<Cow<'a, str>, DispatchError> {
        if args.len() < self.required_len {
            return Err(DispatchError::MissingArgument {
                method: self.method.name().to_string(),
                position: self.required_len - 1,
                len: args.len(),
            });
        }

        for (position, extractor) in &self.extractors {
            if let Some(name) = extractor.extract(args[*position])? {
                return Ok(name);
            }
        }

        match self.default_name.as_deref() {
            Some(default) => {
                if self.logger.is_debug_enabled() {
                    self.logger.debug(format_args!(
                        "no adaptive argument of `{}::{}` named an extension, falling back to `{}`",
                        self.point,
                        self.method.name(),
                        default
                    ));
                }
                Ok(Cow::Borrowed(default))
            }
            None => Err(DispatchError::NoNameResolvable {
                point: self.point.name(),
                method: self.method.name().to_string(),
            }),
        }
    }
}

impl fmt::Debug for ExtractionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionChain")
            .field("point", &self.point)
            .field("method", &self.method)
            .field("positions", &self.positions().collect::<Vec<_>>())
            .field("default_name", &self.default_name)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ExtractionChain`].
///
/// Extractors are created, configured and initialized as arguments are
/// declared, so a spec the argument type cannot satisfy fails here rather
/// than on the first call.
pub struct ExtractionChainBuilder {
    point: ExtensionPointId,
    method: MethodSignature,
    extractors: Vec<(usize, Box<dyn SelectionKeyExtractor>)>,
    default_name: Option<String>,
    logger: Option<Logger>,
}

impl ExtractionChainBuilder {
    /// Declare the argument at `position` adaptive.
    ///
    /// Uses the extractor carried by `spec`, or the standard
    /// [`KeyExtractor`](crate::extractors::KeyExtractor).
    pub fn adaptive_argument(
        mut self,
        position: usize,
        spec: AdaptiveSpec,
    ) -> Result<Self, BootstrapError> {
        let argument_type =
            self.method
                .parameter(position)
                .ok_or_else(|| BootstrapError::ArgumentOutOfRange {
                    method: self.method.name().to_string(),
                    position,
                    arity: self.method.arity(),
                })?;
        if self.extractors.iter().any(|(p, _)| *p == position) {
            return Err(BootstrapError::DuplicateAdaptiveArgument {
                method: self.method.name().to_string(),
                position,
            });
        }

        let mut extractor = extractors::for_spec(&spec);
        extractor.configure(ExtractorSetup {
            point: self.point,
            method: self.method.clone(),
            argument_type,
            spec,
        })?;
        extractor.init()?;

        self.extractors.push((position, extractor));
        Ok(self)
    }

    /// Name used when every extractor abstains.
    pub fn default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    /// Log fallbacks through `logger` instead of the default backend.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Finish the chain.
    pub fn build(mut self) -> ExtractionChain {
        self.extractors.sort_by_key(|(position, _)| *position);
        let required_len = self
            .extractors
            .last()
            .map_or(0, |(position, _)| position + 1);
        ExtractionChain {
            point: self.point,
            method: self.method,
            extractors: self.extractors,
            required_len,
            default_name: self.default_name,
            logger: self
                .logger
                .unwrap_or_else(|| logging::logger(logging::CHAIN_LOGGER)),
        }
    }
}

impl fmt::Debug for ExtractionChainBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionChainBuilder")
            .field("point", &self.point)
            .field("method", &self.method)
            .field("extractors", &self.extractors.len())
            .field("default_name", &self.default_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::ExtractionChain;
    use crate::logging::{Level, Logger};
    use crate::testing::{RecordingBackend, ScriptedExtractor};
    use std::borrow::Cow;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use veer_core::{
        AdaptiveSpec, Argument, ArgumentType, BootstrapError, DispatchError, ExtensionPoint,
        ExtractError, MethodSignature,
    };

    trait Compressor: Send + Sync {}

    struct CompressorPoint;

    impl ExtensionPoint for CompressorPoint {
        type Instance = dyn Compressor;
        const NAME: &'static str = "Compressor";
    }

    fn compress() -> MethodSignature {
        MethodSignature::new("compress", [ArgumentType::Bytes, ArgumentType::Properties])
    }

    fn route() -> MethodSignature {
        MethodSignature::new(
            "route",
            [ArgumentType::Text, ArgumentType::Integer, ArgumentType::Text],
        )
    }

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn keyed_chain() -> ExtractionChain {
        ExtractionChain::builder(CompressorPoint::id(), compress())
            .adaptive_argument(1, AdaptiveSpec::key("compressor.type"))
            .unwrap()
            .default_name("gzip")
            .build()
    }

    #[test]
    fn resolves_from_properties_or_default() {
        let chain = keyed_chain();
        let lz4 = options(&[("compressor.type", "lz4")]);
        let empty = options(&[]);
        let data: &[u8] = b"payload";

        let name = chain
            .resolve_name(&[Argument::from(data), Argument::from(&lz4)])
            .unwrap();
        assert_eq!(name, "lz4");

        let name = chain
            .resolve_name(&[Argument::from(data), Argument::from(&empty)])
            .unwrap();
        assert_eq!(name, "gzip");
        assert!(matches!(name, Cow::Borrowed(_)));
    }

    #[test]
    fn resolution_is_deterministic() {
        let chain = keyed_chain();
        let lz4 = options(&[("compressor.type", "lz4")]);
        let args = [Argument::Null, Argument::from(&lz4)];
        let first = chain.resolve_name(&args).unwrap().into_owned();
        for _ in 0..100 {
            assert_eq!(chain.resolve_name(&args).unwrap(), first.as_str());
        }
    }

    fn scripted(answer: Option<&'static str>, calls: &Arc<AtomicUsize>) -> AdaptiveSpec {
        let calls = calls.clone();
        AdaptiveSpec::direct().with_extractor(move || {
            let extractor = match answer {
                Some(name) => ScriptedExtractor::name(name),
                None => ScriptedExtractor::no_opinion(),
            };
            extractor.counting(calls.clone())
        })
    }

    #[test]
    fn first_opinion_wins_and_stops_the_chain() {
        let abstain_calls = Arc::new(AtomicUsize::new(0));
        let x_calls = Arc::new(AtomicUsize::new(0));
        let y_calls = Arc::new(AtomicUsize::new(0));

        // Declared out of order; evaluated by position.
        let chain = ExtractionChain::builder(CompressorPoint::id(), route())
            .adaptive_argument(2, scripted(Some("y"), &y_calls))
            .unwrap()
            .adaptive_argument(0, scripted(None, &abstain_calls))
            .unwrap()
            .adaptive_argument(1, scripted(Some("x"), &x_calls))
            .unwrap()
            .build();

        assert_eq!(chain.positions().collect::<Vec<_>>(), vec![0, 1, 2]);
        let args = [Argument::Text("a"), Argument::Integer(1), Argument::Text("b")];
        assert_eq!(chain.resolve_name(&args).unwrap(), "x");
        assert_eq!(abstain_calls.load(Ordering::SeqCst), 1);
        assert_eq!(x_calls.load(Ordering::SeqCst), 1);
        assert_eq!(y_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_opinion_and_no_default_is_unresolvable() {
        let chain = ExtractionChain::builder(CompressorPoint::id(), compress())
            .adaptive_argument(1, AdaptiveSpec::key("compressor.type"))
            .unwrap()
            .build();
        let empty = options(&[]);
        let err = chain
            .resolve_name(&[Argument::Null, Argument::from(&empty)])
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::NoNameResolvable { point: "Compressor", ref method } if method == "compress"
        ));
    }

    #[test]
    fn missing_adaptive_argument_is_reported() {
        let chain = keyed_chain();
        let err = chain.resolve_name(&[Argument::Null]).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MissingArgument { position: 1, len: 1, .. }
        ));
    }

    #[test]
    fn extractor_errors_propagate_unchanged() {
        let chain = keyed_chain();
        let err = chain
            .resolve_name(&[Argument::Null, Argument::Text("lz4")])
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Extract(ExtractError::ArgumentTypeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_and_duplicate_positions() {
        let err = ExtractionChain::builder(CompressorPoint::id(), compress())
            .adaptive_argument(2, AdaptiveSpec::key("k"))
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::ArgumentOutOfRange { position: 2, arity: 2, .. }
        ));

        let err = ExtractionChain::builder(CompressorPoint::id(), compress())
            .adaptive_argument(1, AdaptiveSpec::key("k"))
            .unwrap()
            .adaptive_argument(1, AdaptiveSpec::key("other"))
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::DuplicateAdaptiveArgument { position: 1, .. }
        ));
    }

    #[test]
    fn unusable_spec_fails_at_build_time() {
        let err = ExtractionChain::builder(CompressorPoint::id(), compress())
            .adaptive_argument(0, AdaptiveSpec::key("k"))
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Extract(ExtractError::InvalidAdaptiveSpec { .. })
        ));
    }

    #[test]
    fn fallback_to_default_is_logged_at_debug() {
        let backend = RecordingBackend::new();
        let chain = ExtractionChain::builder(CompressorPoint::id(), compress())
            .adaptive_argument(1, AdaptiveSpec::key("compressor.type"))
            .unwrap()
            .default_name("gzip")
            .logger(Logger::new("veer::chain", Arc::new(backend.clone())))
            .build();

        let lz4 = options(&[("compressor.type", "lz4")]);
        chain
            .resolve_name(&[Argument::Null, Argument::from(&lz4)])
            .unwrap();
        assert!(backend.records().is_empty());

        let empty = options(&[]);
        chain
            .resolve_name(&[Argument::Null, Argument::from(&empty)])
            .unwrap();
        let records = backend.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Debug);
        assert!(records[0].message.contains("falling back to `gzip`"));
    }
}
