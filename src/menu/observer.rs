use derive_more::{Display, From, Into};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique across every publisher in the process, so one id can be handed
/// back to whichever owner issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

pub type Listener<T> = Box<dyn FnMut(&T) + Send>;

/// Plain listener list. Publishing calls every listener once, in
/// subscription order.
pub struct Publisher<T> {
    listeners: Vec<(SubscriptionId, Listener<T>)>,
}

impl<T> Publisher<T> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&T) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    pub fn publish(&mut self, value: &T) {
        for (_, listener) in &mut self.listeners {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<T> Default for Publisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A value plus the listeners that want to hear when it changes.
#[derive(Debug)]
pub struct Observable<T> {
    value: T,
    publisher: Publisher<T>,
}

impl<T: Clone + PartialEq> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            publisher: Publisher::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value.clone()
    }

    /// Stores `value` and notifies listeners if it differs from the current
    /// one. Returns whether it changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.publisher.publish(&self.value);
        true
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&T) + Send + 'static) -> SubscriptionId {
        self.publisher.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }
}
