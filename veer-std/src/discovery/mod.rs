//! Sources of extension descriptors.
//!
//! A [`Discovery`] hands a registry builder the descriptors of one extension
//! point. In-memory lists are discoveries already; with the `inventory`
//! feature, [`InventoryDiscovery`] collects descriptors registered anywhere
//! in the binary with [`register_extension!`](crate::register_extension).

#[cfg(feature = "inventory")]
mod collected;

#[cfg(feature = "inventory")]
pub use collected::{ExtensionRegistration, InventoryDiscovery};

use veer_core::{BootstrapError, ExtensionDescriptor, ExtensionPoint};

/// A source of descriptors for extension point `P`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot discover extensions of `{P}`",
    label = "missing `Discovery<{P}>` implementation",
    note = "A `Vec` or slice of `ExtensionDescriptor<{P}>` is a discovery."
)]
pub trait Discovery<P: ExtensionPoint> {
    /// Find every descriptor of `P`.
    fn discover(&self) -> Result<Vec<ExtensionDescriptor<P>>, BootstrapError>;
}

impl<P: ExtensionPoint> Discovery<P> for [ExtensionDescriptor<P>] {
    fn discover(&self) -> Result<Vec<ExtensionDescriptor<P>>, BootstrapError> {
        Ok(self.to_vec())
    }
}

impl<P: ExtensionPoint> Discovery<P> for Vec<ExtensionDescriptor<P>> {
    fn discover(&self) -> Result<Vec<ExtensionDescriptor<P>>, BootstrapError> {
        self.as_slice().discover()
    }
}

impl<P: ExtensionPoint, const N: usize> Discovery<P> for [ExtensionDescriptor<P>; N] {
    fn discover(&self) -> Result<Vec<ExtensionDescriptor<P>>, BootstrapError> {
        self.as_slice().discover()
    }
}
