//! The standard selection-key extractor.

use std::borrow::Cow;
use veer_core::{
    AdaptiveSpec, Argument, ArgumentType, ExtensionPointId, ExtractError, ExtractorSetup,
    ExtractorSetupSlots, MethodSignature, SelectionKeyExtractor,
};

/// Extracts a name from a text argument or from a properties argument.
///
/// | Argument type | Spec              | Selection key                          |
/// |---------------|-------------------|----------------------------------------|
/// | `Text`        | no keys           | the text itself                        |
/// | `Properties`  | `key`             | value of `key`, then `fallback_key`    |
/// | `Properties`  | no `key`          | value of the point's default key, then `fallback_key` |
///
/// Every other combination fails `init` with `InvalidAdaptiveSpec`.
/// `Null`, empty text and empty property values are "no opinion".
#[derive(Debug, Default)]
pub struct KeyExtractor {
    slots: ExtractorSetupSlots,
    primary_key: Option<String>,
}

impl KeyExtractor {
    /// Create an unconfigured extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create, configure and initialize an extractor in one step.
    pub fn ready(setup: ExtractorSetup) -> Result<Self, ExtractError> {
        let mut extractor = Self::new();
        extractor.configure(setup)?;
        extractor.init()?;
        Ok(extractor)
    }

    /// The key looked up first in properties arguments, once initialized.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }
}

fn validate(setup: &ExtractorSetup) -> Result<Option<String>, ExtractError> {
    match setup.argument_type {
        ArgumentType::Text if setup.spec.has_keys() => Err(setup.invalid(
            "a text argument is the selection key itself and cannot be searched by key",
        )),
        ArgumentType::Text => Ok(None),
        ArgumentType::Properties => Ok(Some(
            setup
                .spec
                .primary_key()
                .map_or_else(|| setup.point.default_key(), str::to_string),
        )),
        other => Err(setup.invalid(format!(
            "{other} arguments cannot carry a selection key"
        ))),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

impl SelectionKeyExtractor for KeyExtractor {
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
        let mut primary_key = None;
        self.slots.init_with(|setup| {
            primary_key = validate(setup)?;
            Ok(())
        })?;
        self.primary_key = primary_key;
        Ok(())
    }

    fn extract<'a>(&self, argument: Argument<'a>) -> Result<Option<Cow<'a, str>>, ExtractError> {
        let setup = self.slots.ready()?;
        setup.check_type(&argument)?;

        let name = match argument {
            Argument::Text(text) => non_empty(text),
            Argument::Properties(props) => self
                .primary_key
                .as_deref()
                .and_then(|key| props.property(key))
                .and_then(non_empty)
                .or_else(|| {
                    setup
                        .spec
                        .fallback_key()
                        .and_then(|key| props.property(key))
                        .and_then(non_empty)
                }),
            _ => None,
        };
        Ok(name.map(Cow::Borrowed))
    }
}

#[cfg(test)]
mod tests {
    use super::KeyExtractor;
    use std::collections::HashMap;
    use veer_core::{
        AdaptiveSpec, Argument, ArgumentType, ExtensionPoint, ExtractError, ExtractorSetup,
        MethodSignature, SelectionKeyExtractor,
    };

    trait Compressor: Send + Sync {}

    struct CompressorPoint;

    impl ExtensionPoint for CompressorPoint {
        type Instance = dyn Compressor;
        const NAME: &'static str = "Compressor";
    }

    fn setup(argument_type: ArgumentType, spec: AdaptiveSpec) -> ExtractorSetup {
        ExtractorSetup {
            point: CompressorPoint::id(),
            method: MethodSignature::new("compress", [ArgumentType::Bytes, argument_type]),
            argument_type,
            spec,
        }
    }

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn text_argument_is_the_name() {
        let extractor =
            KeyExtractor::ready(setup(ArgumentType::Text, AdaptiveSpec::direct())).unwrap();
        assert_eq!(
            extractor.extract(Argument::Text("lz4")).unwrap().as_deref(),
            Some("lz4")
        );
        assert_eq!(extractor.extract(Argument::Text("")).unwrap(), None);
        assert_eq!(extractor.extract(Argument::Null).unwrap(), None);
    }

    #[test]
    fn properties_lookup_uses_primary_then_fallback() {
        let extractor = KeyExtractor::ready(setup(
            ArgumentType::Properties,
            AdaptiveSpec::key("compressor.type").with_fallback("codec"),
        ))
        .unwrap();

        let primary = options(&[("compressor.type", "lz4"), ("codec", "zstd")]);
        let fallback = options(&[("codec", "zstd")]);
        let empty_primary = options(&[("compressor.type", ""), ("codec", "zstd")]);
        let neither = options(&[("level", "9")]);

        let name = |props: &HashMap<String, String>| {
            extractor
                .extract(Argument::from(props))
                .unwrap()
                .map(|n| n.into_owned())
        };
        assert_eq!(name(&primary).as_deref(), Some("lz4"));
        assert_eq!(name(&fallback).as_deref(), Some("zstd"));
        assert_eq!(name(&empty_primary).as_deref(), Some("zstd"));
        assert_eq!(name(&neither), None);
    }

    #[test]
    fn properties_without_key_use_point_default_key() {
        let extractor =
            KeyExtractor::ready(setup(ArgumentType::Properties, AdaptiveSpec::default_key()))
                .unwrap();
        assert_eq!(extractor.primary_key(), Some("compressor"));

        let props = options(&[("compressor", "gzip")]);
        assert_eq!(
            extractor.extract(Argument::from(&props)).unwrap().as_deref(),
            Some("gzip")
        );
    }

    #[test]
    fn init_rejects_numeric_argument() {
        let err = KeyExtractor::ready(setup(ArgumentType::Integer, AdaptiveSpec::key("level")))
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidAdaptiveSpec { .. }));

        let err = KeyExtractor::ready(setup(ArgumentType::Boolean, AdaptiveSpec::direct()))
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidAdaptiveSpec { .. }));
    }

    #[test]
    fn init_rejects_keyed_lookup_on_text() {
        let err = KeyExtractor::ready(setup(ArgumentType::Text, AdaptiveSpec::key("type")))
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidAdaptiveSpec { .. }));
    }

    #[test]
    fn extract_before_init_is_not_configured() {
        let mut extractor = KeyExtractor::new();
        assert!(matches!(
            extractor.extract(Argument::Text("gzip")),
            Err(ExtractError::NotConfigured { .. })
        ));

        extractor
            .configure(setup(ArgumentType::Text, AdaptiveSpec::direct()))
            .unwrap();
        assert!(matches!(
            extractor.extract(Argument::Text("gzip")),
            Err(ExtractError::NotConfigured { .. })
        ));
    }

    #[test]
    fn mismatched_argument_type_is_reported() {
        let extractor =
            KeyExtractor::ready(setup(ArgumentType::Properties, AdaptiveSpec::key("k"))).unwrap();
        let err = extractor.extract(Argument::Text("gzip")).unwrap_err();
        assert_eq!(
            err,
            ExtractError::ArgumentTypeMismatch {
                method: "compress".to_string(),
                expected: ArgumentType::Properties,
                found: ArgumentType::Text,
            }
        );
    }

    #[test]
    fn configure_twice_fails() {
        let mut extractor = KeyExtractor::new();
        extractor
            .configure(setup(ArgumentType::Text, AdaptiveSpec::direct()))
            .unwrap();
        let err = extractor
            .configure(setup(ArgumentType::Text, AdaptiveSpec::direct()))
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotConfigured { .. }));
    }
}
