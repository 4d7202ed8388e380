use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::dep::Dep;
use crate::observer::observe;

/// A plain data value that templates can read from.
///
/// `Object` and `Array` are handles: cloning one aliases the same storage, so a
/// write through any clone is seen by every other clone.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
}

impl Value {
    /// Identity comparison used to decide whether a write is a change.
    ///
    /// Scalars compare by value, objects and arrays by reference.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Structural equality over untracked reads. Comparing values never
/// subscribes the active watcher to anything.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                // A cycle back into `a` compares equal at that point.
                let Some(_visit) = Visit::enter(Rc::as_ptr(&a.0).cast()) else { return true };
                a.to_vec() == b.to_vec()
            }
            (Value::Object(a), Value::Object(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let Some(_visit) = Visit::enter(Rc::as_ptr(&a.0).cast()) else { return true };
                let left: Vec<(String, Value)> =
                    a.0.slots.borrow().iter().map(|(k, s)| (k.clone(), s.value.clone())).collect();
                let right = b.0.slots.borrow().len();
                left.len() == right
                    && left
                        .iter()
                        .all(|(k, v)| b.peek(k).is_some_and(|r| r == *v))
            }
            _ => self.same(other),
        }
    }
}

/// The string form a placeholder renders to.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Array(a) => {
                // An array reached again while joining itself renders empty.
                let Some(_visit) = Visit::enter(Rc::as_ptr(&a.0).cast()) else { return Ok(()) };
                for (i, item) in a.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    // holes and nulls join as empty strings
                    if !matches!(item, Value::Null) {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // exponent form with an explicit sign, as in `1e+21` and `1.5e-7`
        let exp = format!("{n:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                write!(f, "{mantissa}e+{power}")
            }
            _ => f.write_str(&exp),
        }
    } else {
        write!(f, "{n}")
    }
}

thread_local! {
    static VISITING: RefCell<Vec<*const ()>> = const { RefCell::new(Vec::new()) };
}

// Marks a shared container as being traversed on this thread, so walks over
// self-containing data stop instead of recursing forever.
struct Visit(*const ());

impl Visit {
    fn enter(ptr: *const ()) -> Option<Visit> {
        VISITING.with(|v| {
            let mut v = v.borrow_mut();
            if v.contains(&ptr) {
                None
            } else {
                v.push(ptr);
                Some(Visit(ptr))
            }
        })
    }
}

impl Drop for Visit {
    fn drop(&mut self) {
        VISITING.with(|v| {
            let mut v = v.borrow_mut();
            if let Some(i) = v.iter().rposition(|&p| p == self.0) {
                v.remove(i);
            }
        });
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(Array::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

struct Slot {
    value: Value,
    // Present once the owning object has been observed.
    dep: Option<Dep>,
}

#[derive(Default)]
struct ObjectInner {
    slots: RefCell<IndexMap<String, Slot>>,
    observed: Cell<bool>,
}

/// A shared map of named slots. After [`observe`] every slot is backed by a
/// [`Dep`]: reads during a watcher run subscribe the watcher, writes of a
/// different value notify the subscribers.
#[derive(Clone, Default)]
pub struct Object(Rc<ObjectInner>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mainly for constructing data before observation.
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key.into(), value.into());
        self
    }

    /// Read a slot. Registers the active watcher, if any, with the slot's dep.
    pub fn get(&self, key: &str) -> Option<Value> {
        let (value, dep) = {
            let slots = self.0.slots.borrow();
            let slot = slots.get(key)?;
            (slot.value.clone(), slot.dep.clone())
        };
        if let Some(dep) = dep {
            tracing::trace!(key, value = %value, "get");
            dep.depend();
        }
        Some(value)
    }

    /// Read a slot without dependency tracking.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.0.slots.borrow().get(key).map(|s| s.value.clone())
    }

    /// Write a slot.
    ///
    /// Identical values (see [`Value::same`]) are ignored. On an observed
    /// object a change stores the value, observes it, then notifies the slot's
    /// subscribers in subscription order before returning.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let observed = self.is_observed();
        let dep = {
            let mut slots = self.0.slots.borrow_mut();
            match slots.get_mut(&key) {
                Some(slot) => {
                    if slot.value.same(&value) {
                        return;
                    }
                    slot.value = value.clone();
                    slot.dep.clone()
                }
                None => {
                    let dep = observed.then(Dep::new);
                    slots.insert(key.clone(), Slot { value: value.clone(), dep });
                    None
                }
            }
        };
        if observed {
            tracing::trace!(key = %key, value = %value, "set");
            observe(&value);
        }
        if let Some(dep) = dep {
            dep.notify();
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.slots.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.slots.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.slots.borrow().is_empty()
    }

    pub fn is_observed(&self) -> bool {
        self.0.observed.get()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The dep behind `key`, if the slot exists and is observable.
    pub fn dep(&self, key: &str) -> Option<Dep> {
        self.0.slots.borrow().get(key).and_then(|s| s.dep.clone())
    }

    /// Flip the object to observed. Returns `false` if it already was.
    pub(crate) fn mark_observed(&self) -> bool {
        !self.0.observed.replace(true)
    }

    /// Give `key` a dep if it has none yet and hand back its current value.
    pub(crate) fn install_dep(&self, key: &str) -> Option<Value> {
        let mut slots = self.0.slots.borrow_mut();
        let slot = slots.get_mut(key)?;
        if slot.dep.is_none() {
            slot.dep = Some(Dep::new());
        }
        Some(slot.value.clone())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Slots may be mutably borrowed mid-write; don't panic while logging.
        let Some(_visit) = Visit::enter(Rc::as_ptr(&self.0).cast()) else {
            return f.write_str("Object { <cycle> }");
        };
        match self.0.slots.try_borrow() {
            Ok(slots) => f
                .debug_map()
                .entries(slots.iter().map(|(k, s)| (k, &s.value)))
                .finish(),
            Err(_) => f.write_str("Object { <borrowed> }"),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let obj = Object::new();
        for (k, v) in iter {
            obj.set(k, v);
        }
        obj
    }
}

/// A shared list. Arrays are never deep observed: writing an index or pushing
/// does not notify anyone.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut items = self.0.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Null);
        }
        items[index] = value.into();
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Array(Rc::new(RefCell::new(items)))
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_visit) = Visit::enter(Rc::as_ptr(&self.0).cast()) else {
            return f.write_str("Array [<cycle>]");
        };
        match self.0.try_borrow() {
            Ok(items) => f.debug_list().entries(items.iter()).finish(),
            Err(_) => f.write_str("Array [<borrowed>]"),
        }
    }
}
