use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

// The watcher currently collecting dependencies.
thread_local! {
    static CURRENT_WATCHER: RefCell<Option<Watcher>> = const { RefCell::new(None) };
}

static NEXT_WATCHER_ID: AtomicUsize = AtomicUsize::new(1);

/// Upper bound on back-to-back re-runs caused by a watcher notifying itself.
pub const MAX_RERUNS: usize = 100;

struct WatcherInner {
    id: usize,
    getter: RefCell<Box<dyn FnMut()>>,
    runs: Cell<usize>,
    running: Cell<bool>,
    dirty: Cell<bool>,
}

/// A re-runnable computation.
///
/// While running it is the active watcher, so every observable slot it reads
/// subscribes it. Any notification re-runs it in full.
#[derive(Clone)]
pub struct Watcher(Rc<WatcherInner>);

impl Watcher {
    /// Create the watcher and run it once to collect dependencies.
    pub fn new<F>(getter: F) -> Self
    where
        F: FnMut() + 'static,
    {
        let watcher = Watcher(Rc::new(WatcherInner {
            id: NEXT_WATCHER_ID.fetch_add(1, Ordering::Relaxed),
            getter: RefCell::new(Box::new(getter)),
            runs: Cell::new(0),
            running: Cell::new(false),
            dirty: Cell::new(false),
        }));
        watcher.run();
        watcher
    }

    /// The watcher collecting dependencies right now, if any.
    pub fn current() -> Option<Watcher> {
        CURRENT_WATCHER.with(|cur| cur.borrow().clone())
    }

    pub fn id(&self) -> usize {
        self.0.id
    }

    /// How many times the getter has been invoked.
    pub fn runs(&self) -> usize {
        self.0.runs.get()
    }

    pub fn is_running(&self) -> bool {
        self.0.running.get()
    }

    /// Invoke the getter as the active watcher.
    ///
    /// If this watcher is already running (its own run wrote to a slot it
    /// depends on), the request is recorded and served right after the current
    /// run returns, up to [`MAX_RERUNS`] times in a row.
    pub fn run(&self) {
        if self.0.running.get() {
            tracing::trace!(watcher = self.0.id, "re-entrant notify deferred");
            self.0.dirty.set(true);
            return;
        }
        let mut reruns = 0;
        loop {
            self.run_once();
            if !self.0.dirty.replace(false) {
                break;
            }
            if reruns == MAX_RERUNS {
                tracing::warn!(
                    watcher = self.0.id,
                    reruns,
                    "watcher keeps invalidating itself, giving up"
                );
                break;
            }
            reruns += 1;
        }
    }

    /// Called by a dep on change. Same as [`Watcher::run`].
    pub fn update(&self) {
        self.run();
    }

    pub fn downgrade(&self) -> WeakWatcher {
        WeakWatcher(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Watcher) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn run_once(&self) {
        let run = self.0.runs.get() + 1;
        self.0.runs.set(run);
        tracing::debug!(watcher = self.0.id, run, "watcher run");

        let _active = ActiveGuard::enter(self.clone());
        let mut getter = self.0.getter.borrow_mut();
        (*getter)();
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.0.id)
            .field("runs", &self.0.runs.get())
            .finish()
    }
}

/// Non-owning watcher reference, as stored by deps.
#[derive(Clone)]
pub struct WeakWatcher(Weak<WatcherInner>);

impl WeakWatcher {
    pub fn upgrade(&self) -> Option<Watcher> {
        self.0.upgrade().map(Watcher)
    }

    pub fn points_to(&self, watcher: &Watcher) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&watcher.0))
    }
}

/// Makes a watcher the active one for its lifetime. Dropping it (including
/// during unwinding) restores the previous marker and clears `running`.
struct ActiveGuard {
    watcher: Watcher,
    previous: Option<Watcher>,
}

impl ActiveGuard {
    fn enter(watcher: Watcher) -> Self {
        watcher.0.running.set(true);
        let previous = CURRENT_WATCHER.with(|cur| cur.replace(Some(watcher.clone())));
        ActiveGuard { watcher, previous }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_WATCHER.with(|cur| *cur.borrow_mut() = previous);
        self.watcher.0.running.set(false);
    }
}
