//! Adaptive-selection metadata for one method argument.

use crate::extractor::SelectionKeyExtractor;
use std::fmt;
use std::sync::Arc;

/// Creates a fresh, unconfigured extractor.
pub type ExtractorFactory = Arc<dyn Fn() -> Box<dyn SelectionKeyExtractor> + Send + Sync>;

/// Describes how a selection key is found in one argument.
///
/// - With no keys, a text argument is itself the selection key.
/// - With a `key`, a properties argument is searched for that key, then for
///   the `fallback_key`.
/// - A properties argument with no `key` is searched for the extension
///   point's default key (see [`ExtensionPointId::default_key`]).
///
/// [`ExtensionPointId::default_key`]: crate::ExtensionPointId::default_key
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdaptiveSpec {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    key: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    fallback_key: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    extractor: Option<ExtractorFactory>,
}

impl AdaptiveSpec {
    /// The argument value is the selection key.
    pub fn direct() -> Self {
        Self::default()
    }

    /// Look the selection key up under `key`.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Look the selection key up under the extension point's default key.
    pub fn default_key() -> Self {
        Self::default()
    }

    /// Try `fallback_key` when the primary key is absent.
    pub fn with_fallback(mut self, fallback_key: impl Into<String>) -> Self {
        self.fallback_key = Some(fallback_key.into());
        self
    }

    /// Use a custom extractor instead of the standard key extractor.
    pub fn with_extractor<F, X>(mut self, factory: F) -> Self
    where
        F: Fn() -> X + Send + Sync + 'static,
        X: SelectionKeyExtractor + 'static,
    {
        self.extractor = Some(Arc::new(move || Box::new(factory())));
        self
    }

    /// Primary lookup key.
    pub fn primary_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Secondary lookup key.
    pub fn fallback_key(&self) -> Option<&str> {
        self.fallback_key.as_deref()
    }

    /// Whether any lookup key is declared.
    pub fn has_keys(&self) -> bool {
        self.key.is_some() || self.fallback_key.is_some()
    }

    /// Custom extractor factory, if one was set.
    pub fn extractor(&self) -> Option<&ExtractorFactory> {
        self.extractor.as_ref()
    }
}

impl fmt::Debug for AdaptiveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveSpec")
            .field("key", &self.key)
            .field("fallback_key", &self.fallback_key)
            .field("custom_extractor", &self.extractor.is_some())
            .finish()
    }
}

impl PartialEq for AdaptiveSpec {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.fallback_key == other.fallback_key
            && match (&self.extractor, &other.extractor) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}
