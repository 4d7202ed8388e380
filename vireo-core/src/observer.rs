use crate::value::{Object, Value};

/// Make `value` reactive.
///
/// Non-objects are ignored, and so are objects that were observed before, so
/// calling this repeatedly is cheap and never installs a second dep.
pub fn observe(value: &Value) {
    if let Value::Object(obj) = value {
        Observer::new(obj).walk();
    }
}

/// Convenience for the common case of observing a root data object.
pub fn observe_object(obj: &Object) {
    Observer::new(obj).walk();
}

/// Walks one object and turns its own properties into observable slots.
pub struct Observer<'a> {
    value: &'a Object,
}

impl<'a> Observer<'a> {
    pub fn new(value: &'a Object) -> Self {
        Observer { value }
    }

    pub fn walk(&self) {
        // Mark before recursing so cyclic data terminates.
        if !self.value.mark_observed() {
            return;
        }
        let keys = self.value.keys();
        tracing::trace!(keys = keys.len(), "observe object");
        for key in keys {
            define_reactive(self.value, &key);
        }
    }
}

fn define_reactive(obj: &Object, key: &str) {
    if let Some(child) = obj.install_dep(key) {
        observe(&child);
    }
}
