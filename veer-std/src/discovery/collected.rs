//! Link-time extension registration via `inventory`.

use super::Discovery;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use veer_core::{BootstrapError, BoxError, ExtensionDescriptor, ExtensionPoint, ExtensionPointId};

/// One extension submitted to the distributed collection.
///
/// The factory is type-erased: it returns an `Arc<P::Instance>` boxed as
/// `dyn Any`. Use [`register_extension!`](crate::register_extension) rather
/// than building this by hand, so the recorded types always agree.
pub struct ExtensionRegistration {
    /// Extension point the implementation belongs to.
    pub point: fn() -> ExtensionPointId,
    /// Registration name.
    pub name: &'static str,
    /// `TypeId` of the `Arc<P::Instance>` the factory boxes.
    pub instance_type: fn() -> TypeId,
    /// Type-erased factory.
    pub factory: fn() -> Result<Box<dyn Any + Send + Sync>, BoxError>,
}

impl fmt::Debug for ExtensionRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistration")
            .field("point", &(self.point)())
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

inventory::collect!(ExtensionRegistration);

/// Submit an extension to [`InventoryDiscovery`].
///
/// The factory is any expression callable as
/// `fn() -> Result<Arc<P::Instance>, E>` with `E: Into<BoxError>`.
///
/// # Example
///
/// ```rust,ignore
/// fn gzip() -> Result<Arc<dyn Compressor>, BoxError> {
///     Ok(Arc::new(Gzip))
/// }
///
/// veer::register_extension!(CompressorPoint, "gzip", gzip);
/// ```
#[macro_export]
macro_rules! register_extension {
    ($point:ty, $name:expr, $factory:expr $(,)?) => {
        $crate::inventory::submit! {
            $crate::discovery::ExtensionRegistration {
                point: <$point as $crate::veer_core::ExtensionPoint>::id,
                name: $name,
                instance_type: ::std::any::TypeId::of::<
                    ::std::sync::Arc<<$point as $crate::veer_core::ExtensionPoint>::Instance>,
                >,
                factory: || {
                    let instance: ::std::sync::Arc<
                        <$point as $crate::veer_core::ExtensionPoint>::Instance,
                    > = ($factory)()?;
                    ::std::result::Result::Ok(::std::boxed::Box::new(instance))
                },
            }
        }
    };
}

/// Discovers the extensions of `P` submitted with
/// [`register_extension!`](crate::register_extension), sorted by name.
pub struct InventoryDiscovery<P> {
    _point: PhantomData<fn() -> P>,
}

impl<P: ExtensionPoint> InventoryDiscovery<P> {
    /// Discover extensions of `P`.
    pub fn new() -> Self {
        Self {
            _point: PhantomData,
        }
    }
}

impl<P: ExtensionPoint> Default for InventoryDiscovery<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ExtensionPoint> fmt::Debug for InventoryDiscovery<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryDiscovery")
            .field("point", &P::NAME)
            .finish()
    }
}

fn typed_descriptor<P: ExtensionPoint>(
    registration: &'static ExtensionRegistration,
) -> Result<ExtensionDescriptor<P>, BootstrapError> {
    if (registration.instance_type)() != TypeId::of::<Arc<P::Instance>>() {
        return Err(BootstrapError::InvalidDescriptor {
            point: P::NAME,
            name: registration.name.to_string(),
            reason: "factory does not produce this extension point's instance type".to_string(),
        });
    }
    let factory = registration.factory;
    Ok(ExtensionDescriptor::new(registration.name, move || {
        factory()?
            .downcast::<Arc<P::Instance>>()
            .map(|instance| *instance)
            .map_err(|_| BoxError::from("registered factory produced an unexpected type"))
    }))
}

impl<P: ExtensionPoint> Discovery<P> for InventoryDiscovery<P> {
    fn discover(&self) -> Result<Vec<ExtensionDescriptor<P>>, BootstrapError> {
        let point = P::id();
        let mut registrations: Vec<&'static ExtensionRegistration> =
            inventory::iter::<ExtensionRegistration>
                .into_iter()
                .filter(|registration| (registration.point)() == point)
                .collect();
        registrations.sort_by_key(|registration| registration.name);
        registrations.into_iter().map(typed_descriptor::<P>).collect()
    }
}
