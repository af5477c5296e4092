//! Prelude module - commonly used types for convenient import.
//!
//! Use `use fay_events::prelude::*;` to import all essential types.

// Manager
pub use crate::{BaseEventManager, EventManager, SingleThreadedEventManager};

// Observers
pub use crate::{Capabilities, Observe, ObserverBuilder, ObserverHandle, ObserverId, OnEvent};

// Strategies
pub use crate::{LockPolicy, MutexLock, NullLock, SubscriberStore};

// Errors
pub use crate::{ObserverError, ObserverResult};
