//! Binding tables: qualifier names, interface mappings and the singleton cache
//!
//! Bindings are written once during registration and read concurrently afterwards.
//! A qualifier name can only be bound once, while interfaces follow a first-wins policy:
//! the first registered implementation keeps the interface, later ones are only reachable
//! through their own name.

use std::collections::hash_map::{Entry, HashMap};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{ReentrantMutex, RwLock, RwLockReadGuard};
use tracing::{debug, info};

use crate::descriptor::{Instance, TypeDescriptor, TypeKey};
use crate::WiringError;

/// A resolvable entry: a qualifier name bound to a type descriptor
#[derive(Clone, Debug)]
pub struct Binding {
    name: String,
    descriptor: Arc<TypeDescriptor>,
    singleton: bool,
}

impl Binding {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton
    }
}

/// Cache entry of a singleton type, empty until the first resolution
#[derive(Default)]
pub(crate) struct SingletonSlot(OnceCell<Instance>);

impl SingletonSlot {
    pub(crate) fn get(&self) -> Option<&Instance> {
        self.0.get()
    }

    pub(crate) fn fill(&self, instance: Instance) -> Instance {
        self.0.get_or_init(|| instance).clone()
    }
}

#[derive(Default)]
pub(crate) struct Tables {
    bindings: HashMap<String, Binding>,
    interfaces: HashMap<TypeKey, Arc<TypeDescriptor>>,
    singletons: HashMap<TypeKey, Arc<SingletonSlot>>,
}

impl Tables {
    fn register(&mut self, descriptor: TypeDescriptor) -> Result<(), WiringError> {
        let name = descriptor.qualifier().to_string();
        let vacant = match self.bindings.entry(name) {
            Entry::Occupied(o) => {
                return Err(WiringError::DuplicateBinding {
                    name: o.key().clone(),
                    registered: o.get().descriptor.name().to_string(),
                    rejected: descriptor.name().to_string(),
                })
            }
            Entry::Vacant(v) => v,
        };

        let descriptor = Arc::new(descriptor);
        let singleton = descriptor.is_singleton();
        info!(
            name = %vacant.key(),
            type_name = descriptor.name(),
            singleton,
            "registered binding"
        );

        if singleton {
            self.singletons.entry(descriptor.key()).or_default();
        }

        for iface in descriptor.interfaces() {
            match self.interfaces.entry(iface) {
                Entry::Vacant(v) => {
                    v.insert(descriptor.clone());
                }
                Entry::Occupied(o) => {
                    debug!(
                        interface = iface.name(),
                        bound = o.get().name(),
                        skipped = descriptor.name(),
                        "interface already bound"
                    );
                }
            }
        }

        let binding = Binding {
            name: vacant.key().clone(),
            descriptor,
            singleton,
        };
        vacant.insert(binding);
        Ok(())
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub(crate) fn lookup_by_interface(&self, interface: &TypeKey) -> Option<&Arc<TypeDescriptor>> {
        self.interfaces.get(interface)
    }

    pub(crate) fn singleton_slot(&self, key: &TypeKey) -> Option<&Arc<SingletonSlot>> {
        self.singletons.get(key)
    }
}

/// Registry of bindings shared by the injector and the container glue.
///
/// Registration must complete before injection starts. Afterwards, any number
/// of threads can resolve dependencies concurrently; [Registry::release] waits
/// for in-flight injections to complete.
#[derive(Default)]
pub struct Registry {
    tables: RwLock<Tables>,
    construction: ReentrantMutex<()>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a descriptor under its qualifier name.
    ///
    /// Return an error if the name is already bound. Interfaces that already have
    /// an implementation are skipped.
    pub fn register(&self, descriptor: impl Into<TypeDescriptor>) -> Result<(), WiringError> {
        self.tables.write().register(descriptor.into())
    }

    /// Register a sequence of descriptors, stopping at the first duplicate name.
    ///
    /// Interface bindings depend on the order of the sequence: the first implementation wins.
    pub fn register_all<I>(&self, descriptors: I) -> Result<(), WiringError>
    where
        I: IntoIterator,
        I::Item: Into<TypeDescriptor>,
    {
        let mut tables = self.tables.write();
        for descriptor in descriptors {
            tables.register(descriptor.into())?;
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.tables.read().lookup(name).cloned()
    }

    pub fn lookup_by_interface(&self, interface: &TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.tables.read().lookup_by_interface(interface).cloned()
    }

    /// Drop all bindings and cached singletons
    pub fn release(&self) {
        let mut tables = self.tables.write();
        *tables = Tables::default();
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.tables.read().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of interfaces with a bound implementation
    pub fn interface_count(&self) -> usize {
        self.tables.read().interfaces.len()
    }

    /// Number of singleton types, constructed or not
    pub fn singleton_count(&self) -> usize {
        self.tables.read().singletons.len()
    }

    /// Number of singletons which have already been constructed
    pub fn constructed_count(&self) -> usize {
        self.tables
            .read()
            .singletons
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read()
    }

    /// Serialize the first construction of singletons.
    ///
    /// The lock is re-entrant: a singleton under construction can resolve other singletons.
    pub(crate) fn construction(&self) -> parking_lot::ReentrantMutexGuard<'_, ()> {
        self.construction.lock()
    }
}
