//! Peer-to-peer scope broadcast between hotkey registries.
//!
//! There is no registry of registries. Each registry subscribes its
//! [`ScopeState`] to a caller-owned [`ScopeBus`]; publishing a
//! [`ScopeSignal`] flips every subscriber's active flag synchronously. The
//! last published signal wins.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use keynav_types::{ElementId, ScopeSignal};
use tracing::debug;

/// Scoping flags shared between a registry and the bus.
#[derive(Debug)]
pub struct ScopeState {
    container: ElementId,
    is_global: bool,
    active: Cell<bool>,
}

impl ScopeState {
    pub fn new(container: ElementId, is_global: bool, active: bool) -> Rc<Self> {
        Rc::new(Self {
            container,
            is_global,
            active: Cell::new(active),
        })
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    pub fn is_global(&self) -> bool {
        self.is_global
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    /// Applies a broadcast: a dialog signal activates only the registry bound
    /// to that container, a global signal activates only global registries.
    pub fn apply(&self, signal: ScopeSignal) {
        let active = match signal {
            ScopeSignal::ActivateDialog(container) => self.container == container,
            ScopeSignal::ActivateGlobal => self.is_global,
        };
        self.active.set(active);
    }
}

#[derive(Debug, Default)]
struct BusInner {
    next_id: u64,
    subscribers: IndexMap<u64, Rc<ScopeState>>,
}

/// Broadcast channel for [`ScopeSignal`]s. Cloning yields another handle to
/// the same channel.
#[derive(Debug, Clone, Default)]
pub struct ScopeBus {
    inner: Rc<RefCell<BusInner>>,
}

impl ScopeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, state: Rc<ScopeState>) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, state);
        Subscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Delivers `signal` to every subscriber and returns how many were
    /// notified.
    pub fn publish(&self, signal: ScopeSignal) -> usize {
        let subscribers: Vec<Rc<ScopeState>> = self.inner.borrow().subscribers.values().cloned().collect();
        for state in &subscribers {
            state.apply(signal);
        }
        debug!(topic = signal.topic(), notified = subscribers.len(), "published scope signal");
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// Live subscription; unsubscribes when cancelled or dropped.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<RefCell<BusInner>>,
}

impl Subscription {
    pub fn cancel(self) {}

    fn release(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().subscribers.shift_remove(&self.id);
        }
        self.bus = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_signal_activates_only_matching_container() {
        let bus = ScopeBus::new();
        let global = ScopeState::new(ElementId(0), true, true);
        let dialog = ScopeState::new(ElementId(5), false, false);
        let other = ScopeState::new(ElementId(9), false, true);
        let _subs: Vec<_> = [&global, &dialog, &other]
            .into_iter()
            .map(|state| bus.subscribe(Rc::clone(state)))
            .collect();

        assert_eq!(bus.publish(ScopeSignal::ActivateDialog(ElementId(5))), 3);
        assert!(dialog.is_active());
        assert!(!other.is_active());
        assert!(!global.is_active());

        bus.publish(ScopeSignal::ActivateGlobal);
        assert!(global.is_active());
        assert!(!dialog.is_active());
        assert!(!other.is_active());
    }

    #[test]
    fn dropping_a_subscription_unsubscribes() {
        let bus = ScopeBus::new();
        let state = ScopeState::new(ElementId(1), false, false);
        let subscription = bus.subscribe(Rc::clone(&state));
        assert_eq!(bus.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(ScopeSignal::ActivateDialog(ElementId(1))), 0);
        assert!(!state.is_active());
    }

    #[test]
    fn cancel_outliving_the_bus_is_harmless() {
        let bus = ScopeBus::new();
        let subscription = bus.subscribe(ScopeState::new(ElementId(1), true, true));
        drop(bus);
        subscription.cancel();
    }
}
