//! Testing utilities for Veer.
//!
//! This module provides utilities to make testing registries, chains and
//! extension factories easier.
//!
//! # Features
//!
//! - [`RecordingBackend`]: A log backend that keeps every record
//! - [`CountingFactory`]: A factory that counts invocations and can be told to fail
//! - [`ScriptedExtractor`]: An extractor with a fixed answer that records its calls

use crate::logging::{Level, LogBackend};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use veer_core::{
    AdaptiveSpec, Argument, ArgumentType, BoxError, ExtensionDescriptor, ExtensionPoint,
    ExtensionPointId, ExtractError, ExtractorSetupSlots, MethodSignature, SelectionKeyExtractor,
};

// ============================================================================
// Recording Backend
// ============================================================================

/// One captured log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Logger name.
    pub logger: String,
    /// Severity.
    pub level: Level,
    /// Rendered message.
    pub message: String,
    /// Rendered cause, if one was attached.
    pub cause: Option<String>,
}

/// A log backend that records everything at or above a minimum level.
///
/// # Example
///
/// ```rust,ignore
/// let backend = RecordingBackend::new();
/// let registry = builder.log_backend(Arc::new(backend.clone())).build()?;
///
/// registry.dispatch::<CompressorPoint>("compress", &args)?;
/// assert!(backend.contains("falling back"));
/// ```
#[derive(Clone)]
pub struct RecordingBackend {
    records: Arc<Mutex<Vec<LogRecord>>>,
    min_level: Level,
}

impl RecordingBackend {
    /// Record every level.
    pub fn new() -> Self {
        Self::with_min_level(Level::Debug)
    }

    /// Record only `min_level` and above.
    pub fn with_min_level(min_level: Level) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            min_level,
        }
    }

    /// Get a clone of the recorded entries.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Get the recorded messages only.
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Whether any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|r| r.message.contains(needle))
    }

    /// Clear all recorded entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBackend for RecordingBackend {
    fn enabled(&self, _logger: &str, level: Level) -> bool {
        level >= self.min_level
    }

    fn log(
        &self,
        logger: &str,
        level: Level,
        message: &fmt::Arguments<'_>,
        cause: Option<&(dyn Error + 'static)>,
    ) {
        if !self.enabled(logger, level) {
            return;
        }
        self.lock().push(LogRecord {
            logger: logger.to_string(),
            level,
            message: message.to_string(),
            cause: cause.map(ToString::to_string),
        });
    }
}

// ============================================================================
// Counting Factory
// ============================================================================

/// An extension factory that counts invocations.
///
/// Clones share the counter and the failure switch, so a test can keep one
/// clone for inspection and hand a descriptor to the registry.
///
/// # Example
///
/// ```rust,ignore
/// let gzip = CountingFactory::<CompressorPoint>::new(|| Arc::new(Gzip));
/// let registry = Registry::builder()
///     .descriptor(gzip.descriptor("gzip"))
///     .build()?;
///
/// registry.get::<CompressorPoint>("gzip")?;
/// assert_eq!(gzip.calls(), 1);
/// ```
pub struct CountingFactory<P: ExtensionPoint> {
    calls: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<String>>>,
    delay: Duration,
    make: Arc<dyn Fn() -> Arc<P::Instance> + Send + Sync>,
}

impl<P: ExtensionPoint> CountingFactory<P> {
    /// Create a counting factory around `make`.
    pub fn new<F>(make: F) -> Self
    where
        F: Fn() -> Arc<P::Instance> + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            failure: Arc::new(Mutex::new(None)),
            delay: Duration::ZERO,
            make: Arc::new(make),
        }
    }

    /// Sleep for `delay` inside every invocation, widening race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make subsequent invocations fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    /// Make subsequent invocations succeed again.
    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of invocations so far, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Run the factory once.
    pub fn invoke(&self) -> Result<Arc<P::Instance>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match failure {
            Some(message) => Err(message.into()),
            None => Ok((self.make)()),
        }
    }

    /// A descriptor that invokes this factory.
    pub fn descriptor(&self, name: impl Into<String>) -> ExtensionDescriptor<P> {
        let factory = self.clone();
        ExtensionDescriptor::new(name, move || factory.invoke())
    }
}

impl<P: ExtensionPoint> Clone for CountingFactory<P> {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
            failure: self.failure.clone(),
            delay: self.delay,
            make: self.make.clone(),
        }
    }
}

// ============================================================================
// Scripted Extractor
// ============================================================================

/// An extractor that ignores its argument and returns a fixed answer.
///
/// It still honours the lifecycle, and records how often it was asked.
///
/// # Example
///
/// ```rust,ignore
/// let calls = Arc::new(AtomicUsize::new(0));
/// let spec = AdaptiveSpec::direct().with_extractor({
///     let calls = calls.clone();
///     move || ScriptedExtractor::name("x").counting(calls.clone())
/// });
/// ```
pub struct ScriptedExtractor {
    slots: ExtractorSetupSlots,
    answer: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedExtractor {
    /// Always answer `name`.
    pub fn name(name: impl Into<String>) -> Self {
        Self::answering(Some(name.into()))
    }

    /// Always abstain.
    pub fn no_opinion() -> Self {
        Self::answering(None)
    }

    fn answering(answer: Option<String>) -> Self {
        Self {
            slots: ExtractorSetupSlots::new(),
            answer,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Count calls on a counter the test already holds.
    pub fn counting(mut self, calls: Arc<AtomicUsize>) -> Self {
        self.calls = calls;
        self
    }

    /// Shared handle to the call counter.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl SelectionKeyExtractor for ScriptedExtractor {
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
        self.slots.init_with(|_| Ok(())).map(|_| ())
    }

    fn extract<'a>(&self, _argument: Argument<'a>) -> Result<Option<Cow<'a, str>>, ExtractError> {
        self.slots.ready()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone().map(Cow::Owned))
    }
}
