// vireo-core/src/dep.rs
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;

use crate::watcher::{Watcher, WeakWatcher};

static NEXT_DEP_ID: AtomicUsize = AtomicUsize::new(1);

struct DepInner {
    id: usize,
    // keyed by watcher id
    subscribers: RefCell<IndexMap<usize, WeakWatcher>>,
}

/// Subscriber registry of one observable slot.
///
/// Subscribers are unique by watcher identity and kept in subscription order.
/// The dep only holds weak references; a dropped watcher just stops being
/// notified.
#[derive(Clone)]
pub struct Dep(Rc<DepInner>);

impl Dep {
    pub fn new() -> Self {
        Dep(Rc::new(DepInner {
            id: NEXT_DEP_ID.fetch_add(1, Ordering::Relaxed),
            subscribers: RefCell::new(IndexMap::new()),
        }))
    }

    pub fn id(&self) -> usize {
        self.0.id
    }

    /// Subscribe the active watcher, if there is one.
    pub fn depend(&self) {
        if let Some(watcher) = Watcher::current() {
            self.add_sub(&watcher);
        }
    }

    pub fn add_sub(&self, watcher: &Watcher) {
        let mut subs = self.0.subscribers.borrow_mut();
        if !subs.contains_key(&watcher.id()) {
            tracing::trace!(dep = self.0.id, watcher = watcher.id(), "subscribe");
            subs.insert(watcher.id(), watcher.downgrade());
        }
    }

    /// Run `update()` on every live subscriber, in order.
    pub fn notify(&self) {
        // Snapshot so that subscribers may depend on this dep again while
        // re-running.
        let subscribers: Vec<Watcher> = {
            let mut subs = self.0.subscribers.borrow_mut();
            subs.retain(|_, s| s.upgrade().is_some());
            subs.values().filter_map(WeakWatcher::upgrade).collect()
        };
        tracing::debug!(dep = self.0.id, subscribers = subscribers.len(), "notify");
        for watcher in subscribers {
            watcher.update();
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.0
            .subscribers
            .borrow()
            .values()
            .filter(|s| s.upgrade().is_some())
            .count()
    }

    pub fn has_subscriber(&self, watcher: &Watcher) -> bool {
        self.0
            .subscribers
            .borrow()
            .get(&watcher.id())
            .is_some_and(|s| s.points_to(watcher))
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.0.id)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
