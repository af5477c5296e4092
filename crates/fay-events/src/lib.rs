//! Fay Events - Synchronous, type-matched observer dispatch.
//!
//! This crate provides:
//! - Observers that declare a closed set of event types they handle
//! - An event manager that delivers each event to the observers declaring
//!   its concrete type, in subscription order, on the calling thread
//! - Pluggable storage and lock strategies, including an explicit
//!   single-threaded variant with no synchronization
//!
//! # Architecture
//!
//! Events are plain Rust types; nothing has to be implemented on them. An
//! observer's declaration is compiled into a capability table keyed by
//! [`std::any::TypeId`] when its [`ObserverHandle`] is built. Dispatch
//! walks the subscriber list under one lock and looks each observer's
//! table up for the event's type.
//!
//! The lock is held while observers run. Observers must not call back into
//! the manager that is dispatching to them; see [`BaseEventManager`].
//!
//! # Example
//!
//! ```rust
//! use fay_events::{Capabilities, EventManager, Observe, ObserverHandle, OnEvent};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI64, Ordering};
//!
//! struct IntEvent(i64);
//! struct DoubleEvent(f64);
//!
//! #[derive(Default)]
//! struct Sum(AtomicI64);
//!
//! impl OnEvent<IntEvent> for Sum {
//!     fn on_event(&self, event: &IntEvent) {
//!         self.0.fetch_add(event.0, Ordering::SeqCst);
//!     }
//! }
//!
//! impl Observe for Sum {
//!     fn declare(caps: &mut Capabilities<Self>) {
//!         caps.handles::<IntEvent>();
//!     }
//! }
//!
//! let sum = Arc::new(Sum::default());
//! let handle = ObserverHandle::new(Arc::clone(&sum)).unwrap();
//!
//! let manager = EventManager::new();
//! manager.subscribe(&handle);
//!
//! manager.dispatch(&IntEvent(2));
//! manager.dispatch(&DoubleEvent(5.67)); // not declared, skipped
//! manager.unsubscribe(&handle);
//! manager.dispatch(&IntEvent(40)); // no longer subscribed
//!
//! assert_eq!(sum.0.load(Ordering::SeqCst), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod lock;
mod manager;
mod observer;
mod store;

pub use error::{ObserverError, ObserverResult};
pub use lock::{LockPolicy, MutexLock, NullLock};
pub use manager::{BaseEventManager, EventManager, SingleThreadedEventManager};
pub use observer::{Capabilities, Observe, ObserverBuilder, ObserverHandle, ObserverId, OnEvent};
pub use store::SubscriberStore;
