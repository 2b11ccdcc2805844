//! Leveled logging facade.
//!
//! The engine only emits diagnostics (fallback to a default name,
//! construction of an extension, factory failures) and never depends on a
//! particular backend being present.
//!
//! The process-wide default backend is chosen once, on first use:
//!
//! 1. [`TracingBackend`] when the `tracing` feature is enabled,
//! 2. otherwise [`StderrBackend`], which writes warnings and errors.
//!
//! [`set_default_backend`] replaces it (for instance with [`SilentBackend`]),
//! and a registry can be given its own backend so tests stay isolated.
//!
//! Under `tracing`, the engine's own loggers ([`CACHE_LOGGER`],
//! [`CHAIN_LOGGER`]) become event targets, so `veer::cache=debug` filters
//! work. Any other logger name is emitted under the `veer` target with the
//! name in the `logger` field.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Logger of the instance cache.
pub const CACHE_LOGGER: &str = "veer::cache";

/// Logger of the extraction chains.
pub const CHAIN_LOGGER: &str = "veer::chain";

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Diagnostic detail.
    Debug,
    /// Notable events.
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

/// A logging backend.
pub trait LogBackend: Send + Sync {
    /// Whether records of `level` for `logger` would be emitted.
    fn enabled(&self, logger: &str, level: Level) -> bool;

    /// Emit one record, with an optional cause.
    fn log(
        &self,
        logger: &str,
        level: Level,
        message: &fmt::Arguments<'_>,
        cause: Option<&(dyn Error + 'static)>,
    );
}

/// A backend that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentBackend;

impl LogBackend for SilentBackend {
    fn enabled(&self, _logger: &str, _level: Level) -> bool {
        false
    }

    fn log(
        &self,
        _logger: &str,
        _level: Level,
        _message: &fmt::Arguments<'_>,
        _cause: Option<&(dyn Error + 'static)>,
    ) {
    }
}

/// A backend that writes records at or above a minimum level to stderr.
///
/// The default minimum is [`Level::Warn`].
#[derive(Debug, Clone, Copy)]
pub struct StderrBackend {
    min_level: Level,
}

impl StderrBackend {
    /// Write records at `min_level` and above.
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }
}

impl Default for StderrBackend {
    fn default() -> Self {
        Self::new(Level::Warn)
    }
}

impl LogBackend for StderrBackend {
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
        let mut stderr = io::stderr().lock();
        // Nowhere left to report a failed write to stderr.
        let _ = match cause {
            Some(cause) => writeln!(stderr, "[{level}] {logger}: {message}: {cause}"),
            None => writeln!(stderr, "[{level}] {logger}: {message}"),
        };
    }
}

/// A backend that forwards to `tracing`.
///
/// [`CACHE_LOGGER`] and [`CHAIN_LOGGER`] are used as event targets. Other
/// logger names go to the `veer` target and are recorded in the `logger`
/// field.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBackend;

#[cfg(feature = "tracing")]
macro_rules! tracing_enabled {
    ($target:expr, $level:expr) => {
        match $level {
            Level::Debug => tracing::enabled!(target: $target, tracing::Level::DEBUG),
            Level::Info => tracing::enabled!(target: $target, tracing::Level::INFO),
            Level::Warn => tracing::enabled!(target: $target, tracing::Level::WARN),
            Level::Error => tracing::enabled!(target: $target, tracing::Level::ERROR),
        }
    };
}

#[cfg(feature = "tracing")]
macro_rules! tracing_event {
    ($target:expr, $level:expr, $logger:expr, $cause:expr, $message:expr) => {{
        let (logger, cause, message) = ($logger, $cause, $message);
        match $level {
            Level::Debug => tracing::debug!(target: $target, logger, cause, "{message}"),
            Level::Info => tracing::info!(target: $target, logger, cause, "{message}"),
            Level::Warn => tracing::warn!(target: $target, logger, cause, "{message}"),
            Level::Error => tracing::error!(target: $target, logger, cause, "{message}"),
        }
    }};
}

#[cfg(feature = "tracing")]
impl LogBackend for TracingBackend {
    fn enabled(&self, logger: &str, level: Level) -> bool {
        match logger {
            CACHE_LOGGER => tracing_enabled!("veer::cache", level),
            CHAIN_LOGGER => tracing_enabled!("veer::chain", level),
            _ => tracing_enabled!("veer", level),
        }
    }

    fn log(
        &self,
        logger: &str,
        level: Level,
        message: &fmt::Arguments<'_>,
        cause: Option<&(dyn Error + 'static)>,
    ) {
        let cause = cause.map(tracing::field::display);
        match logger {
            CACHE_LOGGER => tracing_event!("veer::cache", level, logger, cause, message),
            CHAIN_LOGGER => tracing_event!("veer::chain", level, logger, cause, message),
            _ => tracing_event!("veer", level, logger, cause, message),
        }
    }
}

fn probe_default_backend() -> Arc<dyn LogBackend> {
    #[cfg(feature = "tracing")]
    {
        Arc::new(TracingBackend)
    }

    #[cfg(not(feature = "tracing"))]
    {
        Arc::new(StderrBackend::default())
    }
}

static DEFAULT_BACKEND: LazyLock<RwLock<Arc<dyn LogBackend>>> =
    LazyLock::new(|| RwLock::new(probe_default_backend()));

/// The current process-wide default backend.
pub fn default_backend() -> Arc<dyn LogBackend> {
    DEFAULT_BACKEND
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide default backend.
///
/// Only loggers created afterwards see the new backend, so call this early.
pub fn set_default_backend(backend: Arc<dyn LogBackend>) {
    *DEFAULT_BACKEND
        .write()
        .unwrap_or_else(PoisonError::into_inner) = backend;
}

/// Create a logger on the default backend.
pub fn logger(name: impl Into<Cow<'static, str>>) -> Logger {
    Logger::new(name, default_backend())
}

/// A named handle onto a [`LogBackend`].
#[derive(Clone)]
pub struct Logger {
    name: Cow<'static, str>,
    backend: Arc<dyn LogBackend>,
}

impl Logger {
    /// Create a logger on a specific backend.
    pub fn new(name: impl Into<Cow<'static, str>>, backend: Arc<dyn LogBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }

    /// Logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `level` is enabled.
    pub fn is_enabled(&self, level: Level) -> bool {
        self.backend.enabled(&self.name, level)
    }

    /// Whether debug records are emitted.
    pub fn is_debug_enabled(&self) -> bool {
        self.is_enabled(Level::Debug)
    }

    /// Whether info records are emitted.
    pub fn is_info_enabled(&self) -> bool {
        self.is_enabled(Level::Info)
    }

    /// Whether warn records are emitted.
    pub fn is_warn_enabled(&self) -> bool {
        self.is_enabled(Level::Warn)
    }

    /// Whether error records are emitted.
    pub fn is_error_enabled(&self) -> bool {
        self.is_enabled(Level::Error)
    }

    /// Emit a record at `level`.
    pub fn log(
        &self,
        level: Level,
        message: fmt::Arguments<'_>,
        cause: Option<&(dyn Error + 'static)>,
    ) {
        self.backend.log(&self.name, level, &message, cause);
    }

    /// Emit a debug record.
    pub fn debug(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Debug, message, None);
    }

    /// Emit a debug record with a cause.
    pub fn debug_with(&self, message: fmt::Arguments<'_>, cause: &(dyn Error + 'static)) {
        self.log(Level::Debug, message, Some(cause));
    }

    /// Emit an info record.
    pub fn info(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Info, message, None);
    }

    /// Emit an info record with a cause.
    pub fn info_with(&self, message: fmt::Arguments<'_>, cause: &(dyn Error + 'static)) {
        self.log(Level::Info, message, Some(cause));
    }

    /// Emit a warn record.
    pub fn warn(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Warn, message, None);
    }

    /// Emit a warn record with a cause.
    pub fn warn_with(&self, message: fmt::Arguments<'_>, cause: &(dyn Error + 'static)) {
        self.log(Level::Warn, message, Some(cause));
    }

    /// Emit an error record.
    pub fn error(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Error, message, None);
    }

    /// Emit an error record with a cause.
    pub fn error_with(&self, message: fmt::Arguments<'_>, cause: &(dyn Error + 'static)) {
        self.log(Level::Error, message, Some(cause));
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
