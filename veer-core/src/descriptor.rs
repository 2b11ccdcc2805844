//! Named implementation factories.

use crate::error::BoxError;
use crate::point::ExtensionPoint;
use std::fmt;
use std::sync::Arc;

/// Builds one implementation instance of extension point `P`.
pub type Factory<P> = Arc<
    dyn Fn() -> Result<Arc<<P as ExtensionPoint>::Instance>, BoxError> + Send + Sync + 'static,
>;

/// Binds a name, unique within extension point `P`, to a factory.
///
/// The factory may be called again after a failed attempt, so it must not
/// assume it runs only once.
pub struct ExtensionDescriptor<P: ExtensionPoint> {
    name: String,
    factory: Factory<P>,
}

impl<P: ExtensionPoint> ExtensionDescriptor<P> {
    /// Create a descriptor from a name and a factory closure.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<P::Instance>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    /// Create a descriptor from an already shared factory.
    pub fn from_factory(name: impl Into<String>, factory: Factory<P>) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }

    /// Registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the factory once.
    pub fn construct(&self) -> Result<Arc<P::Instance>, BoxError> {
        (self.factory)()
    }
}

impl<P: ExtensionPoint> Clone for ExtensionDescriptor<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<P: ExtensionPoint> fmt::Debug for ExtensionDescriptor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("point", &P::NAME)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
