//! Registry bootstrap.

use super::{PointEntry, Registry};
use crate::cache::InstanceCache;
use crate::chain::ExtractionChain;
use crate::discovery::Discovery;
use crate::logging::{self, LogBackend, Logger};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use veer_core::{
    AdaptiveSpec, ArgumentType, BootstrapError, BoxError, ExtensionDescriptor, ExtensionPoint,
    MethodSignature,
};

/// Declaration of one adaptive method.
///
/// # Example
///
/// ```rust,ignore
/// AdaptiveMethod::new("compress", [ArgumentType::Bytes, ArgumentType::Properties])
///     .adaptive(1, AdaptiveSpec::key("compressor.type").with_fallback("codec"))
///     .default_name("gzip")
/// ```
#[derive(Debug, Clone)]
pub struct AdaptiveMethod {
    signature: MethodSignature,
    arguments: Vec<(usize, AdaptiveSpec)>,
    default_name: Option<String>,
}

impl AdaptiveMethod {
    /// Declare method `name` with the given parameter types.
    pub fn new(name: impl Into<String>, parameters: impl IntoIterator<Item = ArgumentType>) -> Self {
        Self::from_signature(MethodSignature::new(name, parameters))
    }

    /// Declare a method from an existing signature.
    pub fn from_signature(signature: MethodSignature) -> Self {
        Self {
            signature,
            arguments: Vec::new(),
            default_name: None,
        }
    }

    /// Make the argument at `position` carry a selection key.
    pub fn adaptive(mut self, position: usize, spec: AdaptiveSpec) -> Self {
        self.arguments.push((position, spec));
        self
    }

    /// Name used when no argument names an extension.
    ///
    /// Without one, the extension point's [`DEFAULT`](ExtensionPoint::DEFAULT)
    /// applies.
    pub fn default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    /// The method signature.
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    fn into_chain<P: ExtensionPoint>(self) -> Result<ExtractionChain, BootstrapError> {
        let mut builder = ExtractionChain::builder(P::id(), self.signature);
        for (position, spec) in self.arguments {
            builder = builder.adaptive_argument(position, spec)?;
        }
        match self.default_name.or_else(|| P::DEFAULT.map(str::to_string)) {
            Some(default) => Ok(builder.default_name(default).build()),
            None => Ok(builder.build()),
        }
    }
}

/// Registrations of one extension point, before `build`.
struct PendingPoint<P: ExtensionPoint> {
    descriptors: Vec<ExtensionDescriptor<P>>,
    names: HashSet<String>,
    methods: Vec<ExtractionChain>,
}

impl<P: ExtensionPoint> PendingPoint<P> {
    fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            names: HashSet::new(),
            methods: Vec::new(),
        }
    }

    fn add_descriptor(&mut self, descriptor: ExtensionDescriptor<P>) -> Result<(), BootstrapError> {
        let name = descriptor.name();
        if name.trim().is_empty() {
            return Err(BootstrapError::InvalidName {
                point: P::NAME,
                name: name.to_string(),
            });
        }
        if !self.names.insert(name.to_string()) {
            return Err(BootstrapError::DuplicateName {
                point: P::NAME,
                name: name.to_string(),
            });
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    fn add_method(&mut self, chain: ExtractionChain) -> Result<(), BootstrapError> {
        let name = chain.method().name();
        if self.methods.iter().any(|m| m.method().name() == name) {
            return Err(BootstrapError::DuplicateMethod {
                point: P::NAME,
                method: name.to_string(),
            });
        }
        self.methods.push(chain);
        Ok(())
    }

    fn check_default(&self, name: &str) -> Result<(), BootstrapError> {
        if self.names.contains(name) {
            Ok(())
        } else {
            Err(BootstrapError::UnknownDefault {
                point: P::NAME,
                name: name.to_string(),
            })
        }
    }
}

/// Type-erased view of a [`PendingPoint`].
trait Pending {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn finish(
        self: Box<Self>,
        backend: Option<&Arc<dyn LogBackend>>,
    ) -> Result<Box<dyn Any + Send + Sync>, BootstrapError>;
}

impl<P: ExtensionPoint> Pending for PendingPoint<P> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn finish(
        self: Box<Self>,
        backend: Option<&Arc<dyn LogBackend>>,
    ) -> Result<Box<dyn Any + Send + Sync>, BootstrapError> {
        let point = *self;
        if let Some(default) = P::DEFAULT {
            point.check_default(default)?;
        }
        for chain in &point.methods {
            if let Some(default) = chain.default_name() {
                point.check_default(default)?;
            }
        }

        let logger = |name: &'static str| match backend {
            Some(backend) => Logger::new(name, Arc::clone(backend)),
            None => logging::logger(name),
        };
        let cache =
            InstanceCache::new(point.descriptors)?.with_logger(logger(logging::CACHE_LOGGER));
        let methods = point
            .methods
            .into_iter()
            .map(|chain| {
                let chain = chain.with_logger(logger(logging::CHAIN_LOGGER));
                (chain.method().name().to_string(), chain)
            })
            .collect();

        Ok(Box::new(PointEntry {
            cache,
            methods,
            default_name: P::DEFAULT.map(str::to_string),
        }))
    }
}

/// Builder for [`Registry`].
///
/// Registration calls chain by value. The first failing call is remembered,
/// later calls are ignored, and [`build`](Self::build) returns that error.
pub struct RegistryBuilder {
    points: HashMap<TypeId, Box<dyn Pending>>,
    order: Vec<(TypeId, &'static str)>,
    error: Option<BootstrapError>,
    backend: Option<Arc<dyn LogBackend>>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            points: HashMap::new(),
            order: Vec::new(),
            error: None,
            backend: None,
        }
    }

    fn with_point<P, F>(mut self, f: F) -> Self
    where
        P: ExtensionPoint,
        F: FnOnce(&mut PendingPoint<P>) -> Result<(), BootstrapError>,
    {
        if self.error.is_some() {
            return self;
        }
        let id = TypeId::of::<P>();
        if !self.points.contains_key(&id) {
            self.order.push((id, P::NAME));
        }
        let pending = self
            .points
            .entry(id)
            .or_insert_with(|| Box::new(PendingPoint::<P>::new()) as Box<dyn Pending>);
        let result = match pending.as_any_mut().downcast_mut::<PendingPoint<P>>() {
            Some(pending) => f(pending),
            None => Err(BootstrapError::InvalidDescriptor {
                point: P::NAME,
                name: String::new(),
                reason: "extension point registered under a different type".to_string(),
            }),
        };
        if let Err(err) = result {
            self.error = Some(err);
        }
        self
    }

    /// Register `factory` as the implementation `name` of `P`.
    pub fn register<P, F>(self, name: impl Into<String>, factory: F) -> Self
    where
        P: ExtensionPoint,
        F: Fn() -> Result<Arc<P::Instance>, BoxError> + Send + Sync + 'static,
    {
        self.descriptor(ExtensionDescriptor::<P>::new(name, factory))
    }

    /// Register a prepared descriptor.
    pub fn descriptor<P: ExtensionPoint>(self, descriptor: ExtensionDescriptor<P>) -> Self {
        self.with_point::<P, _>(|pending| pending.add_descriptor(descriptor))
    }

    /// Register every descriptor `discovery` finds for `P`.
    pub fn discover<P, D>(self, discovery: &D) -> Self
    where
        P: ExtensionPoint,
        D: Discovery<P> + ?Sized,
    {
        self.with_point::<P, _>(|pending| {
            discovery
                .discover()?
                .into_iter()
                .try_for_each(|descriptor| pending.add_descriptor(descriptor))
        })
    }

    /// Declare an adaptive method of `P`.
    ///
    /// Its extractors are built and initialized immediately, so a spec the
    /// argument types cannot satisfy is reported by `build`.
    pub fn adaptive_method<P: ExtensionPoint>(self, method: AdaptiveMethod) -> Self {
        self.with_point::<P, _>(|pending| pending.add_method(method.into_chain::<P>()?))
    }

    /// Log through `backend` instead of the process default.
    pub fn log_backend(mut self, backend: Arc<dyn LogBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build the registry, or return the first registration error.
    pub fn build(mut self) -> Result<Registry, BootstrapError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut points = HashMap::with_capacity(self.order.len());
        let mut point_names = Vec::with_capacity(self.order.len());
        for (id, name) in self.order {
            if let Some(pending) = self.points.remove(&id) {
                points.insert(id, pending.finish(self.backend.as_ref())?);
                point_names.push(name);
            }
        }
        Ok(Registry {
            points,
            point_names,
        })
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let points: Vec<&str> = self.order.iter().map(|(_, name)| *name).collect();
        f.debug_struct("RegistryBuilder")
            .field("points", &points)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::AdaptiveMethod;
    use crate::registry::Registry;
    use std::sync::Arc;
    use veer_core::{
        AdaptiveSpec, ArgumentType, BootstrapError, BoxError, ExtensionDescriptor, ExtensionPoint,
        ExtractError,
    };

    trait Codec: Send + Sync {}

    struct Plain;

    impl Codec for Plain {}

    struct CodecPoint;

    impl ExtensionPoint for CodecPoint {
        type Instance = dyn Codec;
        const NAME: &'static str = "Codec";
    }

    struct DefaultedPoint;

    impl ExtensionPoint for DefaultedPoint {
        type Instance = dyn Codec;
        const NAME: &'static str = "Defaulted";
        const DEFAULT: Option<&'static str> = Some("plain");
    }

    fn plain() -> Result<Arc<dyn Codec>, BoxError> {
        Ok(Arc::new(Plain))
    }

    fn encode() -> AdaptiveMethod {
        AdaptiveMethod::new("encode", [ArgumentType::Bytes, ArgumentType::Text])
            .adaptive(1, AdaptiveSpec::direct())
    }

    #[test]
    fn first_error_wins() {
        let err = Registry::builder()
            .register::<CodecPoint, _>("plain", plain)
            .register::<CodecPoint, _>("plain", plain)
            .register::<CodecPoint, _>("", plain)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::DuplicateName { point: "Codec", ref name } if name == "plain"
        ));
    }

    #[test]
    fn blank_names_are_rejected() {
        let err = Registry::builder()
            .register::<CodecPoint, _>(" ", plain)
            .build()
            .unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidName { .. }));
    }

    #[test]
    fn duplicate_methods_are_rejected() {
        let err = Registry::builder()
            .register::<CodecPoint, _>("plain", plain)
            .adaptive_method::<CodecPoint>(encode())
            .adaptive_method::<CodecPoint>(encode())
            .build()
            .unwrap_err();
        assert!(matches!(err, BootstrapError::DuplicateMethod { .. }));
    }

    #[test]
    fn invalid_adaptive_spec_fails_bootstrap() {
        let err = Registry::builder()
            .register::<CodecPoint, _>("plain", plain)
            .adaptive_method::<CodecPoint>(
                AdaptiveMethod::new("encode", [ArgumentType::Integer])
                    .adaptive(0, AdaptiveSpec::key("level")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Extract(ExtractError::InvalidAdaptiveSpec { .. })
        ));
    }

    #[test]
    fn unknown_defaults_fail_bootstrap() {
        let err = Registry::builder()
            .register::<CodecPoint, _>("plain", plain)
            .adaptive_method::<CodecPoint>(encode().default_name("zstd"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::UnknownDefault { point: "Codec", ref name } if name == "zstd"
        ));

        let err = Registry::builder()
            .register::<DefaultedPoint, _>("other", plain)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::UnknownDefault { point: "Defaulted", ref name } if name == "plain"
        ));
    }

    #[test]
    fn method_default_inherits_point_default() {
        let registry = Registry::builder()
            .register::<DefaultedPoint, _>("plain", plain)
            .adaptive_method::<DefaultedPoint>(encode())
            .build()
            .unwrap();
        let chain = registry
            .adaptive::<DefaultedPoint>()
            .unwrap()
            .chain("encode")
            .unwrap();
        assert_eq!(chain.default_name(), Some("plain"));
    }

    #[test]
    fn discovery_registers_descriptors() {
        let found = vec![
            ExtensionDescriptor::<CodecPoint>::new("a", plain),
            ExtensionDescriptor::<CodecPoint>::new("b", plain),
        ];
        let registry = Registry::builder()
            .discover::<CodecPoint, _>(&found)
            .discover::<CodecPoint, _>(&[ExtensionDescriptor::<CodecPoint>::new("c", plain)][..])
            .build()
            .unwrap();
        assert_eq!(registry.extension_names::<CodecPoint>(), vec!["a", "b", "c"]);

        let err = Registry::builder()
            .discover::<CodecPoint, _>(&found)
            .discover::<CodecPoint, _>(&found)
            .build()
            .unwrap_err();
        assert!(matches!(err, BootstrapError::DuplicateName { .. }));
    }
}
