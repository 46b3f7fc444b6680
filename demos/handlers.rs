use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use graft::*;

// Services managed by the container

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Logical clock shared by every handler
#[derive(Default)]
struct TickClock(AtomicU64);
impl Injectable for TickClock {}

impl Clock for TickClock {
    fn now(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Default)]
struct Measurements {
    clock: Option<Arc<dyn Clock>>,
}
injectable!(Measurements { clock: dyn Clock });

impl Measurements {
    fn record(&self, value: f64) -> String {
        let at = self.clock.as_ref().map_or(0, |c| c.now());
        format!("{value} recorded at tick {at}")
    }
}

// Host-managed objects: handlers inject themselves before being put into service

trait Handler: Injectable + Default {
    fn handle(&self, input: f64) -> String;

    fn init(container: &Container) -> Result<Self, WiringError> {
        let mut handler = Self::default();
        container.inject(&mut handler).map_err(|e| {
            tracing::error!(handler = std::any::type_name::<Self>(), "unable to resolve dependencies");
            e
        })?;
        Ok(handler)
    }
}

#[derive(Default)]
struct MeasurementHandler {
    service: Option<Arc<Measurements>>,
}
injectable!(MeasurementHandler { service: Measurements = "measurements" });

impl Handler for MeasurementHandler {
    fn handle(&self, input: f64) -> String {
        match &self.service {
            Some(service) => service.record(input),
            None => "not wired".to_string(),
        }
    }
}

fn main() -> Result<(), WiringError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let container = Container::new();
    container.initialize([
        TypeDescriptor::of::<TickClock>()
            .singleton()
            .implements::<dyn Clock>(|c| c as Arc<dyn Clock>)
            .build(),
        TypeDescriptor::of::<Measurements>()
            .named("measurements")
            .build(),
    ])?;

    let first = MeasurementHandler::init(&container)?;
    let second = MeasurementHandler::init(&container)?;
    println!("{}", first.handle(1.5));
    println!("{}", second.handle(2.5));

    container.shutdown();
    Ok(())
}
