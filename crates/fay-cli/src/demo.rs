//! The walkthrough scenario run by `fay demo`.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use fay_events::{
    BaseEventManager, Capabilities, LockPolicy, Observe, ObserverHandle, OnEvent, SubscriberStore,
};
use tracing::{debug, info};

/// An integer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IntEvent {
    pub(crate) value: i32,
}

/// A single-precision payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FloatEvent {
    pub(crate) value: f32,
}

/// A double-precision payload. Nothing in the demo listens for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DoubleEvent {
    pub(crate) value: f64,
}

/// Prints what it receives into a shared transcript.
struct MyObserver {
    transcript: Arc<Mutex<Vec<String>>>,
}

impl MyObserver {
    fn record(&self, line: String) {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

impl OnEvent<IntEvent> for MyObserver {
    fn on_event(&self, event: &IntEvent) {
        self.record(format!("MyObserver::on_event(IntEvent): {}", event.value));
    }
}

impl OnEvent<FloatEvent> for MyObserver {
    fn on_event(&self, event: &FloatEvent) {
        self.record(format!("MyObserver::on_event(FloatEvent): {:.2}", event.value));
    }
}

impl Observe for MyObserver {
    fn declare(caps: &mut Capabilities<Self>) {
        caps.handles::<IntEvent>().handles::<FloatEvent>();
    }

    fn name(&self) -> &str {
        "MyObserver"
    }
}

/// Run the scenario against `manager` and return the lines the observer
/// produced, in delivery order.
///
/// Subscribes one observer for `IntEvent` and `FloatEvent`, dispatches one of
/// each plus an unhandled `DoubleEvent`, unsubscribes, and dispatches again.
///
/// # Errors
///
/// Returns an error if the observer's capability table cannot be built.
pub(crate) fn run<S, L>(manager: &BaseEventManager<S, L>) -> Result<Vec<String>>
where
    S: SubscriberStore,
    L: LockPolicy<S>,
{
    let transcript = Arc::new(Mutex::new(Vec::new()));
    let observer = ObserverHandle::new(Arc::new(MyObserver {
        transcript: Arc::clone(&transcript),
    }))
    .context("failed to build demo observer")?;

    info!(observer_id = %observer.id(), "running demo scenario");

    manager.subscribe(&observer);
    manager.dispatch(&IntEvent { value: 1 });
    manager.dispatch(&FloatEvent { value: 2.34 });
    let unhandled = DoubleEvent { value: 5.67 };
    manager.dispatch(&unhandled);
    debug!(value = unhandled.value, "dispatched DoubleEvent with no declared handler");
    manager.unsubscribe(&observer);
    // Nobody is listening any more.
    manager.dispatch(&IntEvent { value: 1 });

    let mut lines = transcript.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(std::mem::take(&mut *lines))
}
