//! Diagnostics emitted through a per-registry log backend, and factory panics.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use veer::logging::Level;
use veer::testing::{CountingFactory, RecordingBackend};
use veer::{Argument, BoxError, DispatchError, Registry};

mod common;
use common::{
    COMPRESSOR_KEY, Compressor, CompressorPoint, builder_with, compress_method, gzip, lz4,
    make_lz4, options,
};

#[test]
fn fallback_construction_and_failure_are_logged() {
    let backend = RecordingBackend::new();
    let gzip = CountingFactory::new(gzip);
    let lz4 = CountingFactory::new(lz4);
    lz4.fail_with("liblz4 not loaded");
    let registry = builder_with(&gzip, &lz4)
        .log_backend(Arc::new(backend.clone()))
        .build()
        .unwrap();

    let empty = options(&[]);
    registry
        .dispatch::<CompressorPoint>("compress", &[Argument::Null, Argument::from(&empty)])
        .unwrap();

    let lz4_opts = options(&[(COMPRESSOR_KEY, "lz4")]);
    assert!(
        registry
            .dispatch::<CompressorPoint>("compress", &[Argument::Null, Argument::from(&lz4_opts)])
            .is_err()
    );

    let records = backend.records();
    assert_eq!(records.len(), 3, "unexpected records: {records:?}");

    assert_eq!(records[0].logger, "veer::chain");
    assert_eq!(records[0].level, Level::Debug);
    assert!(records[0].message.contains("falling back to `gzip`"));

    assert_eq!(records[1].logger, "veer::cache");
    assert_eq!(records[1].level, Level::Debug);
    assert!(records[1].message.contains("constructed extension `gzip`"));

    assert_eq!(records[2].logger, "veer::cache");
    assert_eq!(records[2].level, Level::Warn);
    assert!(records[2].message.contains("`lz4`"));
    assert_eq!(records[2].cause.as_deref(), Some("liblz4 not loaded"));
}

#[test]
fn minimum_level_filters_debug_noise() {
    let backend = RecordingBackend::with_min_level(Level::Warn);
    let gzip = CountingFactory::new(gzip);
    let lz4 = CountingFactory::new(lz4);
    let registry = builder_with(&gzip, &lz4)
        .log_backend(Arc::new(backend.clone()))
        .build()
        .unwrap();

    let empty = options(&[]);
    registry
        .dispatch::<CompressorPoint>("compress", &[Argument::Null, Argument::from(&empty)])
        .unwrap();
    assert!(backend.records().is_empty());
}

#[test]
fn panicking_factory_does_not_poison_the_registry() {
    static PANICKING: AtomicBool = AtomicBool::new(true);

    fn flaky_gzip() -> Result<Arc<dyn Compressor>, BoxError> {
        if PANICKING.load(Ordering::SeqCst) {
            panic!("gzip tables corrupted");
        }
        Ok(gzip())
    }

    let registry = Registry::builder()
        .register::<CompressorPoint, _>("gzip", flaky_gzip)
        .register::<CompressorPoint, _>("lz4", make_lz4)
        .adaptive_method::<CompressorPoint>(compress_method())
        .build()
        .unwrap();

    let empty = options(&[]);
    let args = [Argument::Null, Argument::from(&empty)];
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        registry.dispatch::<CompressorPoint>("compress", &args)
    }));
    assert!(outcome.is_err());
    assert_eq!(registry.get::<CompressorPoint>("lz4").unwrap().id(), "lz4");

    PANICKING.store(false, Ordering::SeqCst);
    let compressor = registry
        .dispatch::<CompressorPoint>("compress", &args)
        .unwrap();
    assert_eq!(compressor.id(), "gzip");
}

#[test]
fn errors_render_useful_messages() {
    let gzip = CountingFactory::new(gzip);
    let lz4 = CountingFactory::new(lz4);
    let registry = builder_with(&gzip, &lz4).build().unwrap();

    let snappy = options(&[(COMPRESSOR_KEY, "snappy")]);
    let err = registry
        .dispatch::<CompressorPoint>("compress", &[Argument::Null, Argument::from(&snappy)])
        .err()
        .unwrap();
    assert_eq!(
        err.to_string(),
        "unknown extension `snappy` for extension point `Compressor`"
    );

    lz4.fail_with("liblz4 not loaded");
    let err = registry.get::<CompressorPoint>("lz4").err().unwrap();
    assert_eq!(
        err.to_string(),
        "failed to construct extension `lz4` of `Compressor`"
    );
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("liblz4 not loaded"));

    assert!(matches!(
        registry.get::<CompressorPoint>("zstd"),
        Err(DispatchError::UnknownExtensionName { .. })
    ));
}
