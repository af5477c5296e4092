//! The event manager: subscribe, unsubscribe, dispatch.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::lock::{LockPolicy, MutexLock, NullLock};
use crate::observer::ObserverHandle;
use crate::store::SubscriberStore;

/// Thread-safe manager with `Vec` storage and a [`MutexLock`].
pub type EventManager = BaseEventManager<Vec<ObserverHandle>, MutexLock<Vec<ObserverHandle>>>;

/// Manager for single-threaded use, guarded by a [`NullLock`].
///
/// It is `!Sync`; the compiler rejects sharing it between threads.
pub type SingleThreadedEventManager<S = Vec<ObserverHandle>> = BaseEventManager<S, NullLock<S>>;

/// Synchronous, type-matched event dispatcher.
///
/// `S` chooses how subscribers are stored and `L` how they are guarded.
/// Both are fixed at construction. Use the [`EventManager`] and
/// [`SingleThreadedEventManager`] aliases unless a custom pairing is needed.
///
/// # Deadlocks
///
/// The lock is held for the whole of every operation, including while
/// observers run inside [`dispatch`](Self::dispatch). Calling `subscribe`,
/// `unsubscribe`, `dispatch` (or any other method) on the same manager from
/// inside an observer is not supported: with [`MutexLock`] it deadlocks,
/// with [`NullLock`] it panics and the lock is released on unwind.
pub struct BaseEventManager<S, L>
where
    S: SubscriberStore,
    L: LockPolicy<S>,
{
    subscribers: L,
    _store: PhantomData<fn() -> S>,
}

impl<S, L> BaseEventManager<S, L>
where
    S: SubscriberStore,
    L: LockPolicy<S>,
{
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::from_store(S::default())
    }

    /// Create an empty manager with room for `capacity` subscriptions.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_store(S::with_capacity(capacity))
    }

    fn from_store(store: S) -> Self {
        Self {
            subscribers: L::new(store),
            _store: PhantomData,
        }
    }

    /// Register an observer.
    ///
    /// Duplicates are kept: subscribing the same handle twice delivers each
    /// matching event twice until it is unsubscribed twice.
    pub fn subscribe(&self, observer: &ObserverHandle) {
        let count = self.subscribers.locked(|subs| {
            subs.push(observer.clone());
            subs.len()
        });

        debug!(
            observer_id = %observer.id(),
            observer_name = %observer.name(),
            subscriber_count = count,
            "Observer subscribed"
        );
    }

    /// Remove the earliest subscription of `observer`.
    ///
    /// Unknown handles are ignored.
    pub fn unsubscribe(&self, observer: &ObserverHandle) {
        let removed = self.subscribers.locked(|subs| subs.remove_first(observer));

        if removed {
            debug!(
                observer_id = %observer.id(),
                observer_name = %observer.name(),
                "Observer unsubscribed"
            );
        } else {
            trace!(observer_id = %observer.id(), "Unsubscribe of unknown observer ignored");
        }
    }

    /// Deliver `event` to every subscribed observer that declared type `E`.
    ///
    /// Observers run on the calling thread, in subscription order. Matching
    /// is on the exact concrete type: a `Box<E>` or a look-alike struct does
    /// not reach observers of `E`. Observers without the capability are
    /// skipped silently.
    ///
    /// A panic in an observer propagates to the caller; later observers do
    /// not run and the lock is released.
    pub fn dispatch<E: 'static>(&self, event: &E) {
        let event_type = type_name::<E>();

        self.subscribers.locked(|subs| {
            let mut delivered: usize = 0;
            for observer in subs.handles() {
                if observer.deliver(event) {
                    trace!(observer_name = %observer.name(), event_type, "Delivered event");
                    delivered = delivered.saturating_add(1);
                }
            }
            trace!(event_type, delivered, "Dispatch finished");
        });
    }

    /// Like [`dispatch`](Self::dispatch), for an owned event.
    #[allow(clippy::needless_pass_by_value)]
    pub fn dispatch_value<E: 'static>(&self, event: E) {
        self.dispatch(&event);
    }

    /// Whether `observer` currently has at least one subscription.
    #[must_use]
    pub fn contains(&self, observer: &ObserverHandle) -> bool {
        self.subscribers
            .locked(|subs| subs.handles().any(|h| h == observer))
    }

    /// Number of subscriptions, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.locked(|subs| subs.len())
    }

    /// Whether there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.locked(|subs| subs.is_empty())
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        let dropped = self.subscribers.locked(|subs| {
            let count = subs.len();
            subs.clear();
            count
        });
        debug!(dropped, "All observers unsubscribed");
    }
}

impl<S, L> Default for BaseEventManager<S, L>
where
    S: SubscriberStore,
    L: LockPolicy<S>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, L> fmt::Debug for BaseEventManager<S, L>
where
    S: SubscriberStore,
    L: LockPolicy<S>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseEventManager")
            .field("store", &type_name::<S>())
            .field("subscriber_count", &self.len())
            .finish()
    }
}
