//! Capability-tagged observers.
//!
//! An observer declares the closed set of event types it handles. The
//! declaration is turned into a capability table keyed by [`TypeId`], and
//! the table is frozen inside an [`ObserverHandle`]. Dispatch then asks the
//! handle for the entry matching the event's concrete type; a missing
//! entry means the observer is skipped.
//!
//! There are two ways to build a handle:
//!
//! 1. **Typed observers**: implement [`OnEvent<E>`] once per event type and
//!    list those types in [`Observe::declare`]. The compiler checks that
//!    every declared type has a matching `OnEvent` impl.
//!
//! 2. **Closure observers**: use [`ObserverHandle::builder`] and register
//!    one closure per event type with [`ObserverBuilder::on`].

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{ObserverError, ObserverResult};

/// Handling operation for one event type.
///
/// Implement once for every event type the observer declares.
pub trait OnEvent<E: 'static> {
    /// Called synchronously, on the dispatching thread, for each event of type `E`.
    fn on_event(&self, event: &E);
}

/// A type that declares its event capabilities.
///
/// Observers are `Send + Sync` whichever manager they are subscribed to.
/// A [`SingleThreadedEventManager`](crate::SingleThreadedEventManager)
/// drops the lock around its subscriber list, not these bounds: an
/// observer with mutable state still needs atomics or a `Mutex`, and
/// `Rc`/`RefCell` state is rejected.
///
/// # Example
///
/// ```rust
/// use fay_events::{Capabilities, Observe, ObserverHandle, OnEvent};
/// use std::sync::Arc;
///
/// struct Ping;
/// struct Pong;
///
/// struct Player;
///
/// impl OnEvent<Ping> for Player {
///     fn on_event(&self, _event: &Ping) {}
/// }
///
/// impl OnEvent<Pong> for Player {
///     fn on_event(&self, _event: &Pong) {}
/// }
///
/// impl Observe for Player {
///     fn declare(caps: &mut Capabilities<Self>) {
///         caps.handles::<Ping>().handles::<Pong>();
///     }
/// }
///
/// let handle = ObserverHandle::new(Arc::new(Player)).unwrap();
/// assert!(handle.can_handle::<Ping>());
/// assert!(!handle.can_handle::<String>());
/// ```
pub trait Observe: Send + Sync + 'static {
    /// Lists the event types this observer handles.
    fn declare(caps: &mut Capabilities<Self>)
    where
        Self: Sized;

    /// Name used in logs.
    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

/// Type-erased entry point for one declared event type.
type Invoker = Box<dyn Fn(&dyn Any) + Send + Sync>;

fn erase<E, F>(handler: F) -> Invoker
where
    E: 'static,
    F: Fn(&E) + Send + Sync + 'static,
{
    Box::new(move |event: &dyn Any| {
        // The table is keyed by TypeId, so a lookup hit always downcasts.
        if let Some(event) = event.downcast_ref::<E>() {
            handler(event);
        }
    })
}

/// Capability table: event `TypeId` to invoker, plus declared names in order.
#[derive(Default)]
struct CapabilityTable {
    invokers: HashMap<TypeId, Invoker>,
    names: Vec<&'static str>,
}

impl CapabilityTable {
    fn insert<E: 'static>(&mut self, observer: &str, invoker: Invoker) -> ObserverResult<()> {
        match self.invokers.entry(TypeId::of::<E>()) {
            Entry::Occupied(_) => Err(ObserverError::DuplicateCapability {
                observer: observer.to_owned(),
                event_type: type_name::<E>(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(invoker);
                self.names.push(type_name::<E>());
                Ok(())
            },
        }
    }
}

/// Collects the capabilities of a typed observer during [`Observe::declare`].
pub struct Capabilities<S> {
    observer: Arc<S>,
    name: String,
    table: CapabilityTable,
    error: Option<ObserverError>,
}

impl<S: Observe> Capabilities<S> {
    /// Declare that the observer handles events of type `E`.
    ///
    /// Declaring the same type twice makes [`ObserverHandle::new`] fail.
    pub fn handles<E>(&mut self) -> &mut Self
    where
        E: 'static,
        S: OnEvent<E>,
    {
        let observer = Arc::clone(&self.observer);
        let invoker = erase::<E, _>(move |event| observer.on_event(event));
        if self.error.is_none()
            && let Err(e) = self.table.insert::<E>(&self.name, invoker)
        {
            self.error = Some(e);
        }
        self
    }
}

/// Unique identifier of an observer handle, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct ObserverCell {
    id: ObserverId,
    name: String,
    table: CapabilityTable,
}

/// Opaque handle to a registered observer.
///
/// Clones share identity: subscribing a clone and unsubscribing the
/// original refer to the same observer. Equality is pointer identity,
/// never structural.
///
/// The handle keeps the underlying observer alive. Unsubscribe to stop
/// delivery; dropping the caller's copy does not.
#[derive(Clone)]
pub struct ObserverHandle {
    inner: Arc<ObserverCell>,
}

impl ObserverHandle {
    /// Build a handle for a typed observer.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::DuplicateCapability`] if `declare` lists the
    /// same event type twice.
    pub fn new<S: Observe>(observer: Arc<S>) -> ObserverResult<Self> {
        let name = observer.name().to_owned();
        let mut caps = Capabilities {
            observer,
            name,
            table: CapabilityTable::default(),
            error: None,
        };
        S::declare(&mut caps);

        match caps.error {
            Some(e) => Err(e),
            None => Ok(Self::from_table(caps.name, caps.table)),
        }
    }

    /// Start building a closure-based observer.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ObserverBuilder {
        ObserverBuilder {
            name: name.into(),
            table: CapabilityTable::default(),
            error: None,
        }
    }

    fn from_table(name: String, table: CapabilityTable) -> Self {
        Self {
            inner: Arc::new(ObserverCell {
                id: ObserverId::new(),
                name,
                table,
            }),
        }
    }

    /// Identifier of this observer.
    #[must_use]
    pub fn id(&self) -> ObserverId {
        self.inner.id
    }

    /// Name of this observer.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether this observer declared events of type `E`.
    #[must_use]
    pub fn can_handle<E: 'static>(&self) -> bool {
        self.can_handle_type(TypeId::of::<E>())
    }

    /// Whether this observer declared the event type identified by `type_id`.
    #[must_use]
    pub fn can_handle_type(&self, type_id: TypeId) -> bool {
        self.inner.table.invokers.contains_key(&type_id)
    }

    /// Type names of the declared events, in declaration order.
    #[must_use]
    pub fn capabilities(&self) -> &[&'static str] {
        &self.inner.table.names
    }

    /// Whether `other` refers to the same observer.
    #[must_use]
    pub fn same_observer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Invoke the handler for `E`, if declared. Returns whether it ran.
    pub(crate) fn deliver<E: 'static>(&self, event: &E) -> bool {
        match self.inner.table.invokers.get(&TypeId::of::<E>()) {
            Some(invoke) => {
                invoke(event);
                true
            },
            None => false,
        }
    }
}

impl PartialEq for ObserverHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_observer(other)
    }
}

impl Eq for ObserverHandle {}

impl Hash for ObserverHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.inner), state);
    }
}

impl fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("capabilities", &self.inner.table.names)
            .finish()
    }
}

/// Builder for closure-based observers.
///
/// ```rust
/// use fay_events::ObserverHandle;
///
/// struct Tick(u64);
///
/// let handle = ObserverHandle::builder("ticker")
///     .on::<Tick, _>(|tick| println!("tick {}", tick.0))
///     .build()
///     .unwrap();
/// assert_eq!(handle.capabilities().len(), 1);
/// ```
pub struct ObserverBuilder {
    name: String,
    table: CapabilityTable,
    error: Option<ObserverError>,
}

impl ObserverBuilder {
    /// Handle events of type `E` with `handler`.
    #[must_use]
    pub fn on<E, F>(mut self, handler: F) -> Self
    where
        E: 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        if self.error.is_none()
            && let Err(e) = self.table.insert::<E>(&self.name, erase(handler))
        {
            self.error = Some(e);
        }
        self
    }

    /// Freeze the capability table into a handle.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::DuplicateCapability`] if [`on`](Self::on)
    /// was called twice for the same event type.
    pub fn build(self) -> ObserverResult<ObserverHandle> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(ObserverHandle::from_table(self.name, self.table)),
        }
    }
}
