use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::descriptor::{Injectable, InjectionPoint, Instance, PointKind, TypeDescriptor, TypeKey};
use crate::registry::{Binding, Registry, Tables};
use crate::WiringError;

/// Fill the injection points of target objects using the bindings of a [Registry].
///
/// Singleton dependencies are constructed on first use and cached in the registry,
/// other dependencies are constructed for each injection point. Freshly constructed
/// instances are injected recursively before being handed out.
pub struct Injector {
    registry: Arc<Registry>,
    points: RwLock<HashMap<TypeId, Arc<[InjectionPoint]>>>,
}

impl Injector {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            points: RwLock::default(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Resolve and assign all injection points of the target.
    ///
    /// The target type does not need to be registered.
    /// Return an error if a required dependency can not be resolved or constructed.
    pub fn inject<T: Injectable>(&self, target: &mut T) -> Result<(), WiringError> {
        let points = self.points_of::<T>();
        let tables = self.registry.read();
        let mut resolution = Resolution {
            registry: &self.registry,
            tables: &tables,
            path: Vec::new(),
        };
        resolution.inject_into(type_name::<T>(), &points, target)
    }

    /// Injection points of a target type, queried once per type
    fn points_of<T: Injectable>(&self) -> Arc<[InjectionPoint]> {
        let id = TypeId::of::<T>();
        if let Some(points) = self.points.read().get(&id) {
            return points.clone();
        }
        self.points
            .write()
            .entry(id)
            .or_insert_with(|| T::injection_points().into())
            .clone()
    }
}

/// Where a dependency was requested, for error reports
#[derive(Clone, Copy)]
struct Site<'p> {
    owner: &'static str,
    point: &'p InjectionPoint,
}

impl Site<'_> {
    fn unresolved(&self) -> WiringError {
        WiringError::UnresolvedDependency {
            owner: self.owner.to_string(),
            point: self.point.label().to_string(),
            required: self.point.required().name().to_string(),
            qualifier: self.point.qualifier().map(str::to_string),
        }
    }

    fn incompatible(&self, bound: &TypeDescriptor) -> WiringError {
        WiringError::IncompatibleBinding {
            owner: self.owner.to_string(),
            point: self.point.label().to_string(),
            required: self.point.required().name().to_string(),
            bound: bound.name().to_string(),
        }
    }

    fn instantiation(&self, descriptor: &TypeDescriptor, reason: String) -> WiringError {
        WiringError::Instantiation {
            owner: self.owner.to_string(),
            point: self.point.label().to_string(),
            required: self.point.required().name().to_string(),
            type_name: descriptor.name().to_string(),
            reason,
        }
    }
}

/// State of a single top-level injection.
///
/// Holds the registry read guard for its whole duration, and the chain of types
/// currently under construction to detect cycles.
struct Resolution<'a> {
    registry: &'a Registry,
    tables: &'a Tables,
    path: Vec<TypeKey>,
}

impl<'a> Resolution<'a> {
    fn inject_into(
        &mut self,
        owner: &'static str,
        points: &[InjectionPoint],
        target: &mut dyn Any,
    ) -> Result<(), WiringError> {
        for point in points {
            let site = Site { owner, point };
            let Some(descriptor) = self.find(point) else {
                if point.is_optional() {
                    trace!(owner, point = point.label(), "optional dependency left unset");
                    continue;
                }
                return Err(site.unresolved());
            };

            let instance = self.materialize(descriptor, site)?;
            let value = descriptor
                .deliver(&point.required(), instance)
                .ok_or_else(|| site.incompatible(descriptor))?;
            if !point.assign(target, value) {
                return Err(site.incompatible(descriptor));
            }
            trace!(owner, point = point.label(), bound = descriptor.name(), "injected");
        }
        Ok(())
    }

    /// Select the binding for an injection point
    fn find(&self, point: &InjectionPoint) -> Option<&'a Arc<TypeDescriptor>> {
        let tables = self.tables;
        match (point.qualifier(), point.kind()) {
            (Some(name), _) => tables.lookup(name).map(Binding::descriptor),
            (None, PointKind::Interface) => tables.lookup_by_interface(&point.required()),
            (None, PointKind::Concrete) => tables
                .lookup(point.required().simple_name())
                .map(Binding::descriptor),
            (None, PointKind::Any) => None,
        }
    }

    /// Obtain the instance for a binding: the cached singleton or a fresh instance
    fn materialize(
        &mut self,
        descriptor: &'a Arc<TypeDescriptor>,
        site: Site<'_>,
    ) -> Result<Instance, WiringError> {
        let key = descriptor.key();
        if self.path.contains(&key) {
            return Err(self.cycle(key));
        }
        if !descriptor.is_singleton() {
            return self.construct(descriptor, site);
        }

        let (tables, registry) = (self.tables, self.registry);
        // Slots are seeded for every registered singleton
        let slot = tables
            .singleton_slot(&key)
            .ok_or_else(|| site.unresolved())?;
        if let Some(instance) = slot.get() {
            return Ok(instance.clone());
        }

        let _guard = registry.construction();
        if let Some(instance) = slot.get() {
            return Ok(instance.clone());
        }
        let instance = self.construct(descriptor, site)?;
        debug!(type_name = descriptor.name(), "constructed singleton");
        Ok(slot.fill(instance))
    }

    /// Build a new instance and inject its own dependencies
    fn construct(
        &mut self,
        descriptor: &'a Arc<TypeDescriptor>,
        site: Site<'_>,
    ) -> Result<Instance, WiringError> {
        let mut instance = descriptor
            .instantiate()
            .map_err(|reason| site.instantiation(descriptor, reason))?;

        self.path.push(descriptor.key());
        let injected =
            self.inject_into(descriptor.name(), descriptor.injection_points(), &mut *instance);
        self.path.pop();
        injected?;

        Ok(Instance::from(instance))
    }

    fn cycle(&self, key: TypeKey) -> WiringError {
        let path = self
            .path
            .iter()
            .skip_while(|k| **k != key)
            .chain(std::iter::once(&key))
            .map(TypeKey::simple_name)
            .collect::<Vec<_>>()
            .join(" -> ");
        WiringError::CyclicDependency { path }
    }
}
