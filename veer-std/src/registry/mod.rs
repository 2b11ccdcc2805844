//! The dispatch registry.
//!
//! A [`Registry`] is an explicit, immutable context object built once by a
//! [`RegistryBuilder`]. For every extension point it was bootstrapped with it
//! holds an [`InstanceCache`] and one [`ExtractionChain`] per adaptive
//! method. Dispatch is the composition of the two:
//!
//! ```text
//! dispatch::<P>(method, args)
//!     └─ chain(method).resolve_name(args) ──► name
//!            └─ cache.get(name) ──► Arc<P::Instance>
//! ```
//!
//! Nothing is recovered along the way: the first failure is returned.

pub mod builder;

pub use builder::{AdaptiveMethod, RegistryBuilder};

use crate::cache::InstanceCache;
use crate::chain::ExtractionChain;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use veer_core::{Argument, DispatchError, ExtensionPoint};

/// Everything the registry knows about one extension point.
pub(crate) struct PointEntry<P: ExtensionPoint> {
    pub(crate) cache: InstanceCache<P>,
    pub(crate) methods: HashMap<String, ExtractionChain>,
    pub(crate) default_name: Option<String>,
}

impl<P: ExtensionPoint> PointEntry<P> {
    fn chain(&self, method: &str) -> Result<&ExtractionChain, DispatchError> {
        self.methods
            .get(method)
            .ok_or_else(|| DispatchError::UnknownMethod {
                point: P::NAME,
                method: method.to_string(),
            })
    }

    fn dispatch(&self, method: &str, args: &[Argument<'_>]) -> Result<Arc<P::Instance>, DispatchError> {
        let name = self.chain(method)?.resolve_name(args)?;
        self.cache.get(&name)
    }
}

/// Immutable registry of extension points, their implementations and their
/// adaptive methods.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Registry::builder()
///     .register::<CompressorPoint, _>("gzip", || Ok(Arc::new(Gzip) as Arc<dyn Compressor>))
///     .register::<CompressorPoint, _>("lz4", || Ok(Arc::new(Lz4) as Arc<dyn Compressor>))
///     .adaptive_method::<CompressorPoint>(
///         AdaptiveMethod::new("compress", [ArgumentType::Bytes, ArgumentType::Properties])
///             .adaptive(1, AdaptiveSpec::key("compressor.type")),
///     )
///     .build()?;
///
/// let compressor = registry.dispatch::<CompressorPoint>(
///     "compress",
///     &[Argument::from(data), Argument::from(&options)],
/// )?;
/// ```
pub struct Registry {
    points: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    point_names: Vec<&'static str>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    fn entry<P: ExtensionPoint>(&self) -> Result<&PointEntry<P>, DispatchError> {
        self.points
            .get(&TypeId::of::<P>())
            .and_then(|entry| entry.downcast_ref::<PointEntry<P>>())
            .ok_or(DispatchError::UnknownExtensionPoint { point: P::NAME })
    }

    /// Resolve the implementation of `P` that serves this call of `method`.
    ///
    /// `args` are the call's arguments in declared parameter order.
    pub fn dispatch<P: ExtensionPoint>(
        &self,
        method: &str,
        args: &[Argument<'_>],
    ) -> Result<Arc<P::Instance>, DispatchError> {
        self.entry::<P>()?.dispatch(method, args)
    }

    /// Borrow a dispatch handle for extension point `P`.
    ///
    /// Hand-written adaptive proxies hold one of these and forward each
    /// method to the instance it resolves.
    pub fn adaptive<P: ExtensionPoint>(&self) -> Result<Adaptive<'_, P>, DispatchError> {
        Ok(Adaptive {
            entry: self.entry::<P>()?,
        })
    }

    /// The implementation registered as `name`.
    pub fn get<P: ExtensionPoint>(&self, name: &str) -> Result<Arc<P::Instance>, DispatchError> {
        self.entry::<P>()?.cache.get(name)
    }

    /// The default implementation of `P`, if it declares one.
    pub fn default_extension<P: ExtensionPoint>(
        &self,
    ) -> Result<Option<Arc<P::Instance>>, DispatchError> {
        let entry = self.entry::<P>()?;
        entry
            .default_name
            .as_deref()
            .map(|name| entry.cache.get(name))
            .transpose()
    }

    /// Name of the default implementation of `P`.
    pub fn default_name<P: ExtensionPoint>(&self) -> Option<&str> {
        self.entry::<P>().ok()?.default_name.as_deref()
    }

    /// Whether `name` is registered for `P`.
    pub fn has_extension<P: ExtensionPoint>(&self, name: &str) -> bool {
        self.entry::<P>()
            .is_ok_and(|entry| entry.cache.contains(name))
    }

    /// Registered names of `P`, sorted. Empty for unknown points.
    pub fn extension_names<P: ExtensionPoint>(&self) -> Vec<&str> {
        self.entry::<P>()
            .map(|entry| entry.cache.names())
            .unwrap_or_default()
    }

    /// Whether the registry was bootstrapped with `P`.
    pub fn contains_point<P: ExtensionPoint>(&self) -> bool {
        self.points.contains_key(&TypeId::of::<P>())
    }

    /// Names of all extension points, in bootstrap order.
    pub fn point_names(&self) -> &[&'static str] {
        &self.point_names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("points", &self.point_names)
            .finish_non_exhaustive()
    }
}

/// A borrowed dispatch handle for one extension point.
///
/// # Example
///
/// ```rust,ignore
/// struct AdaptiveCompressor<'r> {
///     registry: Adaptive<'r, CompressorPoint>,
/// }
///
/// impl AdaptiveCompressor<'_> {
///     fn compress(&self, data: &[u8], options: &HashMap<String, String>) -> Result<Vec<u8>, DispatchError> {
///         let target = self
///             .registry
///             .dispatch("compress", &[Argument::from(data), Argument::from(options)])?;
///         Ok(target.compress(data))
///     }
/// }
/// ```
pub struct Adaptive<'r, P: ExtensionPoint> {
    entry: &'r PointEntry<P>,
}

impl<'r, P: ExtensionPoint> Adaptive<'r, P> {
    /// Resolve the implementation that serves this call of `method`.
    pub fn dispatch(
        &self,
        method: &str,
        args: &[Argument<'_>],
    ) -> Result<Arc<P::Instance>, DispatchError> {
        self.entry.dispatch(method, args)
    }

    /// Resolve only the extension name for this call of `method`.
    pub fn resolve_name(&self, method: &str, args: &[Argument<'_>]) -> Result<String, DispatchError> {
        Ok(self.entry.chain(method)?.resolve_name(args)?.into_owned())
    }

    /// The implementation registered as `name`.
    pub fn get(&self, name: &str) -> Result<Arc<P::Instance>, DispatchError> {
        self.entry.cache.get(name)
    }

    /// Whether `method` was declared adaptive.
    pub fn has_method(&self, method: &str) -> bool {
        self.entry.methods.contains_key(method)
    }

    /// The extraction chain of `method`.
    pub fn chain(&self, method: &str) -> Option<&'r ExtractionChain> {
        self.entry.methods.get(method)
    }
}

impl<P: ExtensionPoint> Clone for Adaptive<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ExtensionPoint> Copy for Adaptive<'_, P> {}

impl<P: ExtensionPoint> fmt::Debug for Adaptive<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.entry.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("Adaptive")
            .field("point", &P::NAME)
            .field("methods", &methods)
            .finish()
    }
}
