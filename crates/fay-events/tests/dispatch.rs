//! End-to-end dispatch behavior through the public API.

use std::sync::{Arc, Mutex};

use fay_events::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct IntEvent {
    value: i32,
}

#[derive(Debug, Clone, PartialEq)]
struct FloatEvent {
    value: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct DoubleEvent {
    value: f64,
}

// Field-for-field copy of IntEvent.
#[derive(Debug, Clone, PartialEq)]
struct LookalikeIntEvent {
    value: i32,
}

/// Shared log of every delivery, tagged with the observer that received it.
type Journal = Arc<Mutex<Vec<String>>>;

struct Recorder {
    label: &'static str,
    journal: Journal,
}

impl OnEvent<IntEvent> for Recorder {
    fn on_event(&self, event: &IntEvent) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:int:{}", self.label, event.value));
    }
}

impl OnEvent<FloatEvent> for Recorder {
    fn on_event(&self, event: &FloatEvent) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:float:{:.2}", self.label, event.value));
    }
}

impl Observe for Recorder {
    fn declare(caps: &mut Capabilities<Self>) {
        caps.handles::<IntEvent>().handles::<FloatEvent>();
    }

    fn name(&self) -> &str {
        self.label
    }
}

fn recorder(label: &'static str, journal: &Journal) -> ObserverHandle {
    ObserverHandle::new(Arc::new(Recorder {
        label,
        journal: Arc::clone(journal),
    }))
    .unwrap()
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

fn setup() -> (EventManager, Journal) {
    fay_telemetry::setup_test_logging();
    (EventManager::new(), Journal::default())
}

#[test]
fn test_example_scenario() {
    let (manager, journal) = setup();
    let observer = recorder("my", &journal);

    manager.subscribe(&observer);
    manager.dispatch(&IntEvent { value: 1 });
    manager.dispatch(&FloatEvent { value: 2.34 });
    manager.dispatch(&DoubleEvent { value: 5.67 });
    manager.unsubscribe(&observer);
    manager.dispatch(&IntEvent { value: 1 });

    assert_eq!(entries(&journal), ["my:int:1", "my:float:2.34"]);
}

#[test]
fn test_subscription_order_is_delivery_order() {
    let (manager, journal) = setup();
    let a = recorder("a", &journal);
    let b = recorder("b", &journal);
    let c = recorder("c", &journal);

    manager.subscribe(&b);
    manager.subscribe(&a);
    manager.subscribe(&c);
    manager.dispatch(&IntEvent { value: 3 });

    assert_eq!(entries(&journal), ["b:int:3", "a:int:3", "c:int:3"]);
}

#[test]
fn test_unsubscribe_keeps_remaining_order() {
    let (manager, journal) = setup();
    let a = recorder("a", &journal);
    let b = recorder("b", &journal);
    let c = recorder("c", &journal);

    for observer in [&a, &b, &c] {
        manager.subscribe(observer);
    }
    manager.unsubscribe(&b);
    manager.dispatch(&IntEvent { value: 9 });

    assert_eq!(entries(&journal), ["a:int:9", "c:int:9"]);
}

#[test]
fn test_unsubscribe_unknown_is_noop() {
    let (manager, journal) = setup();
    let subscribed = recorder("in", &journal);
    let stranger = recorder("out", &journal);

    manager.subscribe(&subscribed);
    manager.unsubscribe(&stranger);
    manager.unsubscribe(&stranger);

    assert_eq!(manager.len(), 1);
    manager.dispatch(&IntEvent { value: 4 });
    assert_eq!(entries(&journal), ["in:int:4"]);
}

#[test]
fn test_lookalike_type_is_not_delivered() {
    let (manager, journal) = setup();
    manager.subscribe(&recorder("r", &journal));

    manager.dispatch(&LookalikeIntEvent { value: 1 });
    manager.dispatch(&DoubleEvent { value: 1.0 });
    assert!(entries(&journal).is_empty());

    manager.dispatch(&IntEvent { value: 1 });
    manager.dispatch(&FloatEvent { value: 1.0 });
    assert_eq!(entries(&journal), ["r:int:1", "r:float:1.00"]);
}

#[test]
fn test_duplicate_subscription_delivers_twice() {
    let (manager, journal) = setup();
    let observer = recorder("dup", &journal);

    manager.subscribe(&observer);
    manager.subscribe(&observer.clone());
    assert_eq!(manager.len(), 2);

    manager.dispatch(&IntEvent { value: 1 });
    assert_eq!(entries(&journal).len(), 2);

    manager.unsubscribe(&observer);
    assert!(manager.contains(&observer));
    manager.dispatch(&IntEvent { value: 2 });
    assert_eq!(entries(&journal).len(), 3);

    manager.unsubscribe(&observer);
    assert!(!manager.contains(&observer));
    manager.dispatch(&IntEvent { value: 3 });
    assert_eq!(entries(&journal).len(), 3);
}

#[test]
fn test_partial_capability_overlap() {
    let (manager, journal) = setup();
    let both = recorder("both", &journal);

    let float_journal = Arc::clone(&journal);
    let float_only = ObserverHandle::builder("float_only")
        .on::<FloatEvent, _>(move |event| {
            float_journal
                .lock()
                .unwrap()
                .push(format!("float_only:float:{:.2}", event.value));
        })
        .build()
        .unwrap();

    manager.subscribe(&float_only);
    manager.subscribe(&both);

    manager.dispatch(&IntEvent { value: 5 });
    manager.dispatch(&FloatEvent { value: 0.5 });

    assert_eq!(
        entries(&journal),
        ["both:int:5", "float_only:float:0.50", "both:float:0.50"]
    );
}

#[test]
fn test_single_threaded_manager_matches_default() {
    fay_telemetry::setup_test_logging();
    let manager: SingleThreadedEventManager = SingleThreadedEventManager::new();
    let journal = Journal::default();
    let observer = recorder("st", &journal);

    manager.subscribe(&observer);
    manager.dispatch_value(IntEvent { value: 1 });
    manager.dispatch_value(DoubleEvent { value: 5.67 });
    manager.unsubscribe(&observer);
    manager.dispatch_value(IntEvent { value: 1 });

    assert_eq!(entries(&journal), ["st:int:1"]);
}

#[test]
fn test_observer_panic_propagates_and_releases_lock() {
    let (manager, journal) = setup();
    let panicking = ObserverHandle::builder("boom")
        .on::<IntEvent, _>(|_| panic!("observer failed"))
        .build()
        .unwrap();
    let after = recorder("after", &journal);

    manager.subscribe(&panicking);
    manager.subscribe(&after);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        manager.dispatch(&IntEvent { value: 1 });
    }));
    assert!(result.is_err());
    // Observers after the failing one did not run.
    assert!(entries(&journal).is_empty());

    // The manager is usable again.
    manager.unsubscribe(&panicking);
    manager.dispatch(&IntEvent { value: 2 });
    assert_eq!(entries(&journal), ["after:int:2"]);
}

#[test]
fn test_event_is_shared_immutably() {
    let (manager, journal) = setup();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..3 {
        let seen = Arc::clone(&seen);
        let handle = ObserverHandle::builder("reader")
            .on::<IntEvent, _>(move |event| seen.lock().unwrap().push(event.clone()))
            .build()
            .unwrap();
        manager.subscribe(&handle);
    }

    let event = IntEvent { value: 11 };
    manager.dispatch(&event);

    assert_eq!(event, IntEvent { value: 11 });
    assert_eq!(*seen.lock().unwrap(), vec![event.clone(); 3]);
    assert!(entries(&journal).is_empty());
}
