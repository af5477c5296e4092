//! Subscriber storage strategies.

use std::collections::VecDeque;

use crate::observer::ObserverHandle;

/// Ordered storage for subscribed observer handles.
///
/// Implementations keep list semantics: `push` never deduplicates, and
/// `remove_first` drops only the earliest entry identical to the given
/// handle. Iteration follows insertion order.
pub trait SubscriberStore: Default {
    /// Create an empty store with room for `capacity` handles.
    fn with_capacity(capacity: usize) -> Self;

    /// Append a handle.
    fn push(&mut self, handle: ObserverHandle);

    /// Remove the first handle identical to `handle`. Returns `true` if one was removed.
    fn remove_first(&mut self, handle: &ObserverHandle) -> bool;

    /// Iterate handles in insertion order.
    fn handles(&self) -> impl Iterator<Item = &ObserverHandle>;

    /// Number of stored handles, duplicates included.
    fn len(&self) -> usize;

    /// Whether the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every handle.
    fn clear(&mut self);
}

impl SubscriberStore for Vec<ObserverHandle> {
    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    fn push(&mut self, handle: ObserverHandle) {
        Vec::push(self, handle);
    }

    fn remove_first(&mut self, handle: &ObserverHandle) -> bool {
        match self.iter().position(|h| h == handle) {
            Some(index) => {
                self.remove(index);
                true
            },
            None => false,
        }
    }

    fn handles(&self) -> impl Iterator<Item = &ObserverHandle> {
        self.iter()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }
}

impl SubscriberStore for VecDeque<ObserverHandle> {
    fn with_capacity(capacity: usize) -> Self {
        VecDeque::with_capacity(capacity)
    }

    fn push(&mut self, handle: ObserverHandle) {
        self.push_back(handle);
    }

    fn remove_first(&mut self, handle: &ObserverHandle) -> bool {
        match self.iter().position(|h| h == handle) {
            Some(index) => self.remove(index).is_some(),
            None => false,
        }
    }

    fn handles(&self) -> impl Iterator<Item = &ObserverHandle> {
        self.iter()
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn clear(&mut self) {
        VecDeque::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(name: &str) -> ObserverHandle {
        ObserverHandle::builder(name).build().unwrap()
    }

    fn names<S: SubscriberStore>(store: &S) -> Vec<String> {
        store.handles().map(|h| h.name().to_string()).collect()
    }

    fn check_list_semantics<S: SubscriberStore>() {
        let a = handle("a");
        let b = handle("b");
        let mut store = S::with_capacity(4);
        assert!(store.is_empty());

        store.push(a.clone());
        store.push(b.clone());
        store.push(a.clone());
        assert_eq!(names(&store), ["a", "b", "a"]);

        // Only the earliest copy goes.
        assert!(store.remove_first(&a));
        assert_eq!(names(&store), ["b", "a"]);

        assert!(store.remove_first(&a));
        assert!(!store.remove_first(&a));
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_vec_list_semantics() {
        check_list_semantics::<Vec<ObserverHandle>>();
    }

    #[test]
    fn test_vec_deque_list_semantics() {
        check_list_semantics::<VecDeque<ObserverHandle>>();
    }

    #[test]
    fn test_remove_matches_identity_not_name() {
        let first = handle("twin");
        let second = handle("twin");
        let mut store: Vec<ObserverHandle> = SubscriberStore::with_capacity(2);
        store.push(first.clone());
        store.push(second.clone());

        assert!(SubscriberStore::remove_first(&mut store, &second));
        assert_eq!(store.len(), 1);
        assert_eq!(store[0], first);
    }
}
