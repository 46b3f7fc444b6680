//! Minimal dependency injection container with named bindings, interface bindings and singletons.
//!
//! # Simple use case
//!
//! ```
//! # use std::sync::Arc;
//! # use graft::*;
//! // Define traits and implementors
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct English;
//! impl Injectable for English {}
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "Hello world".to_string()
//!     }
//! }
//!
//! // Declare the injection points of a target type
//! #[derive(Default)]
//! struct Handler {
//!     greeter: Option<Arc<dyn Greeter>>,
//! }
//! injectable!(Handler { greeter: dyn Greeter });
//!
//! # fn main() -> Result<(), WiringError> {
//! // Register the candidate types and inject a target
//! let container = Container::new();
//! container.initialize([TypeDescriptor::of::<English>()
//!     .singleton()
//!     .implements::<dyn Greeter>(|e| e as Arc<dyn Greeter>)])?;
//!
//! let mut handler = Handler::default();
//! container.inject(&mut handler)?;
//! assert_eq!(handler.greeter.unwrap().greet(), "Hello world");
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! Types are not discovered by reflection: the candidate types are described explicitly by
//! a ```TypeDescriptor``` and declare their dependencies through the ```Injectable``` trait.
//!
//! * The ```Registry``` binds each descriptor under a unique qualifier name (an explicit
//!   alias or the simple name of the type). Each interface is bound to the first registered
//!   implementation, and singleton types get an empty cache slot.
//! * The ```Injector``` resolves each injection point of a target: by qualifier name if one is
//!   given, by interface binding for trait objects, or by the simple name of a concrete type.
//!   Singletons are constructed once, on first use, other types are constructed for every
//!   injection point. Constructed instances are injected recursively before being handed out,
//!   and cyclic dependencies are reported as errors.
//! * The ```Container``` wraps both with the host lifecycle: ```initialize``` at startup and
//!   ```shutdown``` to release all managed objects.

mod container;
mod descriptor;
mod error;
mod helpers;
mod inject;
mod registry;

pub use container::{Container, InitSummary};
pub use descriptor::{
    DescriptorBuilder, Injectable, InjectionPoint, Instance, PointKind, TypeDescriptor, TypeKey,
};
pub use error::{BoxError, WiringError};
pub use inject::Injector;
pub use registry::{Binding, Registry};
