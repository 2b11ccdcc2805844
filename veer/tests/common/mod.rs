#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use veer::testing::CountingFactory;
use veer::{
    AdaptiveMethod, AdaptiveSpec, ArgumentType, BoxError, ExtensionPoint, Registry,
    RegistryBuilder,
};

// ============================================================================
// Compressor Extension Point
// ============================================================================

pub trait Compressor: Send + Sync {
    fn id(&self) -> &'static str;
    fn compress(&self, data: &[u8]) -> Vec<u8>;
}

pub struct Gzip;

impl Compressor for Gzip {
    fn id(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, data: &[u8]) -> Vec<u8> {
        let mut out = b"GZ".to_vec();
        out.extend_from_slice(data);
        out
    }
}

pub struct Lz4;

impl Compressor for Lz4 {
    fn id(&self) -> &'static str {
        "lz4"
    }

    fn compress(&self, data: &[u8]) -> Vec<u8> {
        let mut out = b"LZ".to_vec();
        out.extend_from_slice(data);
        out
    }
}

pub struct CompressorPoint;

impl ExtensionPoint for CompressorPoint {
    type Instance = dyn Compressor;
    const NAME: &'static str = "Compressor";
    const DEFAULT: Option<&'static str> = Some("gzip");
}

pub const COMPRESSOR_KEY: &str = "compressor.type";

pub fn gzip() -> Arc<dyn Compressor> {
    Arc::new(Gzip)
}

pub fn lz4() -> Arc<dyn Compressor> {
    Arc::new(Lz4)
}

pub fn make_gzip() -> Result<Arc<dyn Compressor>, BoxError> {
    Ok(gzip())
}

pub fn make_lz4() -> Result<Arc<dyn Compressor>, BoxError> {
    Ok(lz4())
}

/// `compress(data: bytes, options: properties)`, keyed by `compressor.type`.
pub fn compress_method() -> AdaptiveMethod {
    AdaptiveMethod::new("compress", [ArgumentType::Bytes, ArgumentType::Properties])
        .adaptive(1, AdaptiveSpec::key(COMPRESSOR_KEY))
}

pub fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ============================================================================
// Fixtures
// ============================================================================

/// A compressor registry whose factories count their calls.
pub struct Fixture {
    pub registry: Registry,
    pub gzip: CountingFactory<CompressorPoint>,
    pub lz4: CountingFactory<CompressorPoint>,
}

pub fn builder_with(
    gzip: &CountingFactory<CompressorPoint>,
    lz4: &CountingFactory<CompressorPoint>,
) -> RegistryBuilder {
    Registry::builder()
        .descriptor(gzip.descriptor("gzip"))
        .descriptor(lz4.descriptor("lz4"))
        .adaptive_method::<CompressorPoint>(compress_method())
}

pub fn fixture() -> Fixture {
    let gzip = CountingFactory::new(gzip);
    let lz4 = CountingFactory::new(lz4);
    let registry = builder_with(&gzip, &lz4).build().unwrap();
    Fixture {
        registry,
        gzip,
        lz4,
    }
}
