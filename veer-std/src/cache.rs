//! Lazily constructed, shared extension instances.
//!
//! # Construction protocol
//!
//! Every registered name owns a slot. A published instance is read through
//! a `OnceLock` without taking any lock. Until then:
//!
//! 1. The first caller installs a *flight* under the slot mutex and becomes
//!    the leader. It runs the factory with no lock held.
//! 2. Callers arriving while the flight is installed join it and block on
//!    its condition variable.
//! 3. The leader publishes a successful instance, removes the flight, then
//!    hands its outcome to every joined caller.
//!
//! A failed attempt is delivered to the leader and to everyone who joined
//! it, and leaves the slot unresolved, so the next call starts a new
//! attempt. A factory that panics is reported to joined callers as a failed
//! attempt while the panic keeps unwinding through the leader.

use crate::logging::{self, Logger};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};
use thiserror::Error;
use veer_core::{BootstrapError, DispatchError, ExtensionDescriptor, ExtensionPoint, SharedError};

type Outcome<P> = Result<Arc<<P as ExtensionPoint>::Instance>, SharedError>;

/// Reported to callers that joined an attempt whose factory panicked.
#[derive(Debug, Error)]
#[error("extension factory panicked")]
pub struct FactoryPanicked;

struct Flight<P: ExtensionPoint> {
    outcome: Mutex<Option<Outcome<P>>>,
    done: Condvar,
}

impl<P: ExtensionPoint> Flight<P> {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn complete(&self, outcome: Outcome<P>) {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        self.done.notify_all();
    }

    fn wait(&self) -> Outcome<P> {
        let outcome = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = self
            .done
            .wait_while(outcome, |outcome| outcome.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        match &*outcome {
            Some(outcome) => outcome.clone(),
            None => Err(Arc::new(FactoryPanicked)),
        }
    }
}

struct Slot<P: ExtensionPoint> {
    descriptor: ExtensionDescriptor<P>,
    instance: OnceLock<Arc<P::Instance>>,
    flight: Mutex<Option<Arc<Flight<P>>>>,
}

impl<P: ExtensionPoint> Slot<P> {
    fn new(descriptor: ExtensionDescriptor<P>) -> Self {
        Self {
            descriptor,
            instance: OnceLock::new(),
            flight: Mutex::new(None),
        }
    }

    fn clear_flight(&self) {
        *self.flight.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Completes the flight with [`FactoryPanicked`] if the leader unwinds.
struct LeaderGuard<'s, P: ExtensionPoint> {
    slot: &'s Slot<P>,
    flight: &'s Flight<P>,
    armed: bool,
}

impl<P: ExtensionPoint> Drop for LeaderGuard<'_, P> {
    fn drop(&mut self) {
        if self.armed {
            self.slot.clear_flight();
            self.flight.complete(Err(Arc::new(FactoryPanicked)));
        }
    }
}

/// Lazily constructed singleton instances of extension point `P`, by name.
///
/// The set of names is fixed at construction. Each factory runs at most once
/// per successful construction, however many threads ask at the same time.
pub struct InstanceCache<P: ExtensionPoint> {
    slots: HashMap<String, Slot<P>>,
    logger: Logger,
}

impl<P: ExtensionPoint> InstanceCache<P> {
    /// Create a cache over `descriptors`.
    ///
    /// Fails on blank or duplicate names.
    pub fn new(
        descriptors: impl IntoIterator<Item = ExtensionDescriptor<P>>,
    ) -> Result<Self, BootstrapError> {
        let mut slots = HashMap::new();
        for descriptor in descriptors {
            let name = descriptor.name().to_string();
            if name.trim().is_empty() {
                return Err(BootstrapError::InvalidName {
                    point: P::NAME,
                    name,
                });
            }
            if slots.contains_key(&name) {
                return Err(BootstrapError::DuplicateName {
                    point: P::NAME,
                    name,
                });
            }
            slots.insert(name, Slot::new(descriptor));
        }
        Ok(Self {
            slots,
            logger: logging::logger(logging::CACHE_LOGGER),
        })
    }

    /// Log through `logger` instead of the default backend.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Get the instance named `name`, constructing it on first use.
    pub fn get(&self, name: &str) -> Result<Arc<P::Instance>, DispatchError> {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| DispatchError::UnknownExtensionName {
                point: P::NAME,
                name: name.to_string(),
            })?;

        if let Some(instance) = slot.instance.get() {
            return Ok(Arc::clone(instance));
        }

        let (flight, leader) = {
            let mut current = slot.flight.lock().unwrap_or_else(PoisonError::into_inner);
            // The previous leader may have published since the fast path.
            if let Some(instance) = slot.instance.get() {
                return Ok(Arc::clone(instance));
            }
            match &*current {
                Some(flight) => (Arc::clone(flight), false),
                None => {
                    let flight = Arc::new(Flight::new());
                    *current = Some(Arc::clone(&flight));
                    (flight, true)
                }
            }
        };

        let outcome = if leader {
            self.lead(name, slot, &flight)
        } else {
            flight.wait()
        };
        outcome.map_err(|source| DispatchError::ExtensionConstruction {
            point: P::NAME,
            name: name.to_string(),
            source,
        })
    }

    fn lead(&self, name: &str, slot: &Slot<P>, flight: &Flight<P>) -> Outcome<P> {
        let mut guard = LeaderGuard {
            slot,
            flight,
            armed: true,
        };

        let outcome = match slot.descriptor.construct() {
            Ok(instance) => {
                let instance = Arc::clone(slot.instance.get_or_init(|| instance));
                if self.logger.is_debug_enabled() {
                    self.logger.debug(format_args!(
                        "constructed extension `{name}` of `{}`",
                        P::NAME
                    ));
                }
                Ok(instance)
            }
            Err(err) => {
                let err: SharedError = Arc::from(err);
                self.logger.warn_with(
                    format_args!("failed to construct extension `{name}` of `{}`", P::NAME),
                    &*err,
                );
                Err(err)
            }
        };

        guard.armed = false;
        slot.clear_flight();
        flight.complete(outcome.clone());
        outcome
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Whether `name` is registered and already constructed.
    pub fn is_constructed(&self, name: &str) -> bool {
        self.slots
            .get(name)
            .is_some_and(|slot| slot.instance.get().is_some())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no name is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<P: ExtensionPoint> fmt::Debug for InstanceCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let constructed: Vec<&str> = self
            .names()
            .into_iter()
            .filter(|name| self.is_constructed(name))
            .collect();
        f.debug_struct("InstanceCache")
            .field("point", &P::NAME)
            .field("names", &self.names())
            .field("constructed", &constructed)
            .finish_non_exhaustive()
    }
}
