use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::info;

use crate::descriptor::{Injectable, TypeDescriptor};
use crate::{Injector, Registry, WiringError};

/// Outcome of a successful [Container::initialize]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitSummary {
    pub bindings: usize,
    pub singletons: usize,
    pub elapsed: Duration,
}

/// Entry points for the host application: register candidates at startup,
/// inject targets while running, release everything at shutdown.
pub struct Container {
    injector: Injector,
    initialized: Mutex<bool>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            injector: Injector::new(Arc::new(Registry::new())),
            initialized: Mutex::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.injector.registry()
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.lock()
    }

    /// Register all candidate types.
    ///
    /// Return an error if the container is already initialized or if two candidates share
    /// a qualifier name. In the latter case the registry is released: the container never
    /// runs with a partial set of bindings.
    pub fn initialize<I>(&self, candidates: I) -> Result<InitSummary, WiringError>
    where
        I: IntoIterator,
        I::Item: Into<TypeDescriptor>,
    {
        let mut initialized = self.initialized.lock();
        if *initialized {
            return Err(WiringError::AlreadyInitialized);
        }

        let start = Instant::now();
        let registry = self.registry();
        if let Err(e) = registry.register_all(candidates) {
            registry.release();
            return Err(e);
        }
        *initialized = true;

        let summary = InitSummary {
            bindings: registry.len(),
            singletons: registry.singleton_count(),
            elapsed: start.elapsed(),
        };
        info!(
            bindings = summary.bindings,
            singletons = summary.singletons,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "container initialized"
        );
        Ok(summary)
    }

    /// Release all bindings and cached singletons. Calling it again is a no-op.
    pub fn shutdown(&self) {
        let mut initialized = self.initialized.lock();
        if *initialized {
            info!("container shutting down, releasing references to managed objects");
        }
        self.registry().release();
        *initialized = false;
    }

    pub fn inject<T: Injectable>(&self, target: &mut T) -> Result<(), WiringError> {
        self.injector.inject(target)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
