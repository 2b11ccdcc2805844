//! Extension point identity and method signatures.

use crate::argument::ArgumentType;
use std::any::TypeId;
use std::fmt;

/// An abstract capability with multiple swappable, named implementations.
///
/// Implement this on a marker type and name the capability's trait object as
/// the instance type.
///
/// # Example
///
/// ```rust,ignore
/// pub trait Compressor: Send + Sync {
///     fn compress(&self, data: &[u8]) -> Vec<u8>;
/// }
///
/// pub struct CompressorPoint;
///
/// impl ExtensionPoint for CompressorPoint {
///     type Instance = dyn Compressor;
///     const NAME: &'static str = "Compressor";
///     const DEFAULT: Option<&'static str> = Some("gzip");
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an extension point",
    label = "missing `ExtensionPoint` implementation",
    note = "Implement `ExtensionPoint` on a marker type and set `Instance` to the capability's trait object."
)]
pub trait ExtensionPoint: Send + Sync + 'static {
    /// The implementation type handed out by the registry.
    type Instance: ?Sized + Send + Sync + 'static;

    /// Stable identity of the capability.
    const NAME: &'static str;

    /// Name of the default implementation, if the capability has one.
    const DEFAULT: Option<&'static str> = None;

    /// Runtime identity of this extension point.
    fn id() -> ExtensionPointId
    where
        Self: Sized,
    {
        ExtensionPointId::of::<Self>()
    }
}

/// Runtime identity of an extension point.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionPointId {
    name: &'static str,
    type_id: TypeId,
}

impl ExtensionPointId {
    /// Identity of extension point `P`.
    pub fn of<P: ExtensionPoint>() -> Self {
        Self {
            name: P::NAME,
            type_id: TypeId::of::<P>(),
        }
    }

    /// The extension point's stable name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The marker type's `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The default selection key for properties arguments.
    ///
    /// Camel-case words become dot-separated lower-case segments:
    /// `"CompressorType"` becomes `"compressor.type"`.
    pub fn default_key(&self) -> String {
        dotted_lower_case(self.name)
    }
}

impl fmt::Debug for ExtensionPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExtensionPointId").field(&self.name).finish()
    }
}

impl fmt::Display for ExtensionPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn dotted_lower_case(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                key.push('.');
            }
            key.extend(c.to_lowercase());
            prev_lower = false;
        } else if c == '_' || c == '-' || c == ' ' {
            if !key.is_empty() && !key.ends_with('.') {
                key.push('.');
            }
            prev_lower = false;
        } else {
            key.push(c);
            prev_lower = true;
        }
    }
    key
}

/// Name and ordered parameter types of an extension point method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodSignature {
    name: String,
    parameters: Vec<ArgumentType>,
}

impl MethodSignature {
    /// Create a signature from a name and parameter types.
    pub fn new(name: impl Into<String>, parameters: impl IntoIterator<Item = ArgumentType>) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().collect(),
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types, in order.
    pub fn parameters(&self) -> &[ArgumentType] {
        &self.parameters
    }

    /// Type of the parameter at `position`.
    pub fn parameter(&self, position: usize) -> Option<ArgumentType> {
        self.parameters.get(position).copied()
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtensionPoint, ExtensionPointId, MethodSignature};
    use crate::argument::ArgumentType;

    trait Codec: Send + Sync {}

    struct CompressorType;

    impl ExtensionPoint for CompressorType {
        type Instance = dyn Codec;
        const NAME: &'static str = "CompressorType";
    }

    #[test]
    fn default_key_is_dotted_lower_case() {
        assert_eq!(ExtensionPointId::of::<CompressorType>().default_key(), "compressor.type");
        assert_eq!(super::dotted_lower_case("Protocol"), "protocol");
        assert_eq!(super::dotted_lower_case("load_balance"), "load.balance");
        assert_eq!(super::dotted_lower_case("HTTPServer"), "httpserver");
    }

    #[test]
    fn ids_compare_by_type() {
        assert_eq!(CompressorType::id(), ExtensionPointId::of::<CompressorType>());
        assert_eq!(CompressorType::id().name(), "CompressorType");
    }

    #[test]
    fn signature_displays_parameters() {
        let sig = MethodSignature::new(
            "compress",
            [ArgumentType::Bytes, ArgumentType::Properties],
        );
        assert_eq!(sig.to_string(), "compress(bytes, properties)");
        assert_eq!(sig.parameter(1), Some(ArgumentType::Properties));
        assert_eq!(sig.parameter(2), None);
    }
}
