//! Explicit description of injectable types and of their dependency slots
//!
//! Candidate types are not discovered by inspecting the program at runtime:
//! each type implements [Injectable] to list its [InjectionPoint]s, and a
//! [TypeDescriptor] is built for every type that should be bindable.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::BoxError;

/// A constructed component, shared between the singleton cache and injection targets
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Value handed to an injection point: a boxed `Arc<D>` for the required `D`
pub(crate) type Delivery = Box<dyn Any + Send + Sync>;

type Constructor = Arc<dyn Fn() -> Result<Box<dyn Any + Send + Sync>, BoxError> + Send + Sync>;
type Upcast = Arc<dyn Fn(Instance) -> Option<Delivery> + Send + Sync>;
type Assign = Arc<dyn Fn(&mut dyn Any, Delivery) -> bool + Send + Sync>;

/// Identity of a concrete type or of an interface (`dyn Trait`)
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Fully qualified name of the type
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, without generic arguments or extra trait bounds
    pub fn simple_name(&self) -> &'static str {
        let base = self.name.trim_start_matches("dyn ");
        let base = base.split(" +").next().unwrap_or(base);
        let base = base.split('<').next().unwrap_or(base);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Mark a type as a possible injection target.
///
/// The injection points are queried once per type and cached by the injector.
/// Types without dependencies can rely on the default (empty) implementation.
/// See the [injectable!](crate::injectable) macro for the common case of
/// `Option<Arc<_>>` fields.
pub trait Injectable: Any + Send + Sync {
    fn injection_points() -> Vec<InjectionPoint> {
        Vec::new()
    }
}

/// How the required type of an injection point is resolved when no qualifier is given
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointKind {
    /// Lookup by the simple name of the required type
    Concrete,
    /// Lookup in the interface bindings
    Interface,
    /// Type-erased slot, only reachable through a qualifier name
    Any,
}

/// One dependency slot of an injectable type
pub struct InjectionPoint {
    label: &'static str,
    required: TypeKey,
    kind: PointKind,
    qualifier: Option<String>,
    optional: bool,
    assign: Assign,
}

impl InjectionPoint {
    fn typed<O, D>(
        label: &'static str,
        kind: PointKind,
        assign: impl Fn(&mut O, Arc<D>) + Send + Sync + 'static,
    ) -> Self
    where
        O: Any,
        D: ?Sized + Send + Sync + 'static,
    {
        let assign: Assign = Arc::new(move |owner: &mut dyn Any, value: Delivery| {
            match (owner.downcast_mut::<O>(), value.downcast::<Arc<D>>()) {
                (Some(owner), Ok(value)) => {
                    assign(owner, *value);
                    true
                }
                _ => false,
            }
        });
        Self {
            label,
            required: TypeKey::of::<D>(),
            kind,
            qualifier: None,
            optional: false,
            assign,
        }
    }

    /// Slot requiring the concrete type `D`
    pub fn concrete<O: Any, D: Any + Send + Sync>(
        label: &'static str,
        assign: impl Fn(&mut O, Arc<D>) + Send + Sync + 'static,
    ) -> Self {
        Self::typed(label, PointKind::Concrete, assign)
    }

    /// Slot requiring an implementation of the interface `I` (usually a `dyn Trait`)
    pub fn interface<O: Any, I: ?Sized + Send + Sync + 'static>(
        label: &'static str,
        assign: impl Fn(&mut O, Arc<I>) + Send + Sync + 'static,
    ) -> Self {
        Self::typed(label, PointKind::Interface, assign)
    }

    /// Type-erased slot receiving whatever is bound under `name`
    pub fn any<O: Any>(
        label: &'static str,
        name: impl Into<String>,
        assign: impl Fn(&mut O, Instance) + Send + Sync + 'static,
    ) -> Self {
        Self::typed::<O, dyn Any + Send + Sync>(label, PointKind::Any, assign).named(name)
    }

    /// Resolve this slot through a qualifier name instead of its type
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.qualifier = Some(name.into());
        self
    }

    /// Leave the slot untouched when no binding can be found
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn required(&self) -> TypeKey {
        self.required
    }

    pub fn kind(&self) -> PointKind {
        self.kind
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Write a delivered value into the owner, returns false on a type mismatch
    pub(crate) fn assign(&self, owner: &mut dyn Any, value: Delivery) -> bool {
        (self.assign)(owner, value)
    }
}

impl fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("label", &self.label)
            .field("required", &self.required)
            .field("kind", &self.kind)
            .field("qualifier", &self.qualifier)
            .field("optional", &self.optional)
            .finish()
    }
}

struct InterfaceCast {
    key: TypeKey,
    upcast: Upcast,
}

/// Immutable description of a bindable type
pub struct TypeDescriptor {
    key: TypeKey,
    alias: Option<String>,
    singleton: bool,
    interfaces: Vec<InterfaceCast>,
    points: Arc<[InjectionPoint]>,
    constructor: Option<Constructor>,
    share: fn(Instance) -> Option<Delivery>,
}

fn share<T: Any + Send + Sync>(instance: Instance) -> Option<Delivery> {
    instance
        .downcast::<T>()
        .ok()
        .map(|value| Box::new(value) as Delivery)
}

impl TypeDescriptor {
    /// Describe a type without any constructor.
    ///
    /// Such a type can be registered, but resolving it fails with an instantiation error
    /// unless a constructor is added.
    pub fn builder<T: Injectable>() -> DescriptorBuilder<T> {
        DescriptorBuilder {
            descriptor: TypeDescriptor {
                key: TypeKey::of::<T>(),
                alias: None,
                singleton: false,
                interfaces: Vec::new(),
                points: T::injection_points().into(),
                constructor: None,
                share: share::<T>,
            },
            _marker: PhantomData,
        }
    }

    /// Describe a type built with its [Default] implementation
    pub fn of<T: Injectable + Default>() -> DescriptorBuilder<T> {
        Self::builder::<T>().constructor(|| Ok::<_, std::convert::Infallible>(T::default()))
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Canonical (fully qualified) name of the described type
    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    pub fn simple_name(&self) -> &'static str {
        self.key.simple_name()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The explicit alias if present and non-empty, else the simple name of the type
    pub fn qualifier(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias,
            _ => self.simple_name(),
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// Implemented interfaces, in declaration order
    pub fn interfaces(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.interfaces.iter().map(|i| i.key)
    }

    pub fn implements(&self, interface: &TypeKey) -> bool {
        self.interfaces.iter().any(|i| &i.key == interface)
    }

    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.points
    }

    pub(crate) fn instantiate(&self) -> Result<Box<dyn Any + Send + Sync>, String> {
        match &self.constructor {
            Some(constructor) => constructor().map_err(|e| e.to_string()),
            None => Err("construction unavailable".to_string()),
        }
    }

    /// Present an instance of this type in the shape required by an injection point
    pub(crate) fn deliver(&self, required: &TypeKey, instance: Instance) -> Option<Delivery> {
        if required == &self.key {
            return (self.share)(instance);
        }
        if let Some(cast) = self.interfaces.iter().find(|i| &i.key == required) {
            return (cast.upcast)(instance);
        }
        if required == &TypeKey::of::<dyn Any + Send + Sync>() {
            return Some(Box::new(instance) as Delivery);
        }
        None
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.key)
            .field("alias", &self.alias)
            .field("singleton", &self.singleton)
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .field("points", &self.points)
            .field("constructible", &self.constructor.is_some())
            .finish()
    }
}

/// Typed builder for a [TypeDescriptor]
pub struct DescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> DescriptorBuilder<T> {
    /// Register the type under an explicit qualifier name
    pub fn named(mut self, alias: impl Into<String>) -> Self {
        self.descriptor.alias = Some(alias.into());
        self
    }

    /// Share a single instance for the lifetime of the registry
    pub fn singleton(mut self) -> Self {
        self.descriptor.singleton = true;
        self
    }

    /// Declare that the type implements the interface `I`.
    ///
    /// The `upcast` function converts a shared instance into the interface,
    /// usually `|t| t as Arc<dyn Trait>`.
    pub fn implements<I>(mut self, upcast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<I>();
        if self.descriptor.implements(&key) {
            return self;
        }
        let upcast: Upcast = Arc::new(move |instance: Instance| {
            instance
                .downcast::<T>()
                .ok()
                .map(|value| Box::new(upcast(value)) as Delivery)
        });
        self.descriptor.interfaces.push(InterfaceCast { key, upcast });
        self
    }

    /// Use a fallible no-argument constructor
    pub fn constructor<F, E>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.descriptor.constructor = Some(Arc::new(move || {
            constructor()
                .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
                .map_err(Into::into)
        }));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

impl<T: Injectable> From<DescriptorBuilder<T>> for TypeDescriptor {
    fn from(builder: DescriptorBuilder<T>) -> Self {
        builder.build()
    }
}
