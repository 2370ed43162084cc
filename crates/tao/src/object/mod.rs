//! Keyed and indexed collections
//!
//! A single `Object` type covers plain objects (string-keyed property
//! maps) and arrays (element vectors that also carry a property map).
//! Native runtime objects (promise, channel, timer, and the global
//! object) are further kinds of the same type, so guest code sees one
//! uniform keyed-access surface and bound-method dispatch works the same
//! everywhere.

pub(crate) mod array;
pub(crate) mod string;

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};
use crate::runtime::{Channel, Promise, Timer};
use crate::value::Value;

/// What shape of object this is. The kind is fixed at construction.
pub enum ObjectKind {
    /// Plain property-map object
    Plain,
    /// Array: ordered elements plus a property map
    Array,
    /// The process-wide global object
    Global,
    /// A promise
    Promise(Promise),
    /// A buffered channel
    Channel(Channel),
    /// A one-shot timer
    Timer(Timer),
}

/// Mutable object state: the property map and, for arrays, the elements.
#[derive(Default)]
pub struct ObjectData {
    pub(crate) props: IndexMap<String, Value>,
    pub(crate) elems: Vec<Value>,
}

/// A heap object. Shared via `Arc`; identity is pointer identity.
pub struct Object {
    kind: ObjectKind,
    data: RwLock<ObjectData>,
}

impl Object {
    // ═══════════════════════════════════════════════════════════════════
    // Construction
    // ═══════════════════════════════════════════════════════════════════

    /// A new empty plain object.
    pub fn new_plain() -> Arc<Object> {
        Arc::new(Object {
            kind: ObjectKind::Plain,
            data: RwLock::new(ObjectData::default()),
        })
    }

    /// A new array with the given elements.
    pub fn new_array(elems: Vec<Value>) -> Arc<Object> {
        Arc::new(Object {
            kind: ObjectKind::Array,
            data: RwLock::new(ObjectData {
                props: IndexMap::new(),
                elems,
            }),
        })
    }

    /// The global object.
    pub fn new_global() -> Arc<Object> {
        Arc::new(Object {
            kind: ObjectKind::Global,
            data: RwLock::new(ObjectData::default()),
        })
    }

    /// A promise object.
    pub fn new_promise() -> Arc<Object> {
        Arc::new(Object {
            kind: ObjectKind::Promise(Promise::new()),
            data: RwLock::new(ObjectData::default()),
        })
    }

    /// A channel object with the given capacity.
    pub fn new_channel(capacity: usize) -> Arc<Object> {
        Arc::new(Object {
            kind: ObjectKind::Channel(Channel::new(capacity)),
            data: RwLock::new(ObjectData::default()),
        })
    }

    /// A timer object.
    pub fn new_timer(timer: Timer) -> Arc<Object> {
        Arc::new(Object {
            kind: ObjectKind::Timer(timer),
            data: RwLock::new(ObjectData::default()),
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Kind inspection
    // ═══════════════════════════════════════════════════════════════════

    /// Is this object an array?
    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array)
    }

    /// Kind name for bound-builtin display (`builtin(Array.push)`, ...).
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Plain => "Object",
            ObjectKind::Array => "Array",
            ObjectKind::Global => "Global",
            ObjectKind::Promise(_) => "Promise",
            ObjectKind::Channel(_) => "Channel",
            ObjectKind::Timer(_) => "Timer",
        }
    }

    /// The promise payload, if this is a promise object.
    pub fn as_promise(&self) -> Option<&Promise> {
        match &self.kind {
            ObjectKind::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// The channel payload, if this is a channel object.
    pub fn as_channel(&self) -> Option<&Channel> {
        match &self.kind {
            ObjectKind::Channel(c) => Some(c),
            _ => None,
        }
    }

    /// The timer payload, if this is a timer object.
    pub fn as_timer(&self) -> Option<&Timer> {
        match &self.kind {
            ObjectKind::Timer(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, ObjectData> {
        self.data.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, ObjectData> {
        self.data.write()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Keyed access
    // ═══════════════════════════════════════════════════════════════════

    /// Look up `key` on `obj`.
    ///
    /// Arrays resolve the derived `length` and the reserved method names
    /// before the property map; native kinds expose only their method
    /// tables. A missing key reads as Nil. Takes the `Arc` so method
    /// lookups can bind the receiver.
    pub fn get_key(obj: &Arc<Object>, key: &str) -> Value {
        let this = || Value::Object(obj.clone());
        match &obj.kind {
            ObjectKind::Array => {
                if key == "length" {
                    return Value::Number(obj.len() as i64);
                }
                if let Some((name, func)) = array::method(key) {
                    return Value::bound_builtin(this(), name, func);
                }
                obj.lookup_prop(key).unwrap_or(Value::Nil)
            }
            ObjectKind::Plain | ObjectKind::Global => {
                obj.lookup_prop(key).unwrap_or(Value::Nil)
            }
            ObjectKind::Promise(_) => match crate::runtime::promise::method(key) {
                Some((name, func)) => Value::bound_builtin(this(), name, func),
                None => Value::Nil,
            },
            ObjectKind::Channel(_) => match crate::runtime::channel::method(key) {
                Some((name, func)) => Value::bound_builtin(this(), name, func),
                None => Value::Nil,
            },
            ObjectKind::Timer(_) => match crate::runtime::timer::method(key) {
                Some((name, func)) => Value::bound_builtin(this(), name, func),
                None => Value::Nil,
            },
        }
    }

    /// Set `key` on `obj`. Native kinds reject assignment.
    pub fn set_key(obj: &Arc<Object>, key: &str, value: Value) -> Result<()> {
        match &obj.kind {
            ObjectKind::Plain | ObjectKind::Array | ObjectKind::Global => {
                obj.write().props.insert(key.to_string(), value);
                Ok(())
            }
            _ => Err(Error::not_assignable(&Value::Object(obj.clone()))),
        }
    }

    /// Property-map lookup without method-table fallback. Used by the
    /// root scope's global fallback, where a missing name must stay a
    /// `Name` error rather than read as Nil.
    pub fn lookup_prop(&self, key: &str) -> Option<Value> {
        self.read().props.get(key).cloned()
    }

    /// Insert a property directly (builtin installation, `groupBy` tags).
    pub fn set_prop(&self, key: &str, value: Value) {
        self.write().props.insert(key.to_string(), value);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Indexed access
    // ═══════════════════════════════════════════════════════════════════

    /// Number of array elements.
    pub fn len(&self) -> usize {
        self.read().elems.len()
    }

    /// True when the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `pos`, or a `Range` error.
    pub fn get_elem(&self, pos: i64) -> Result<Value> {
        let data = self.read();
        if pos < 0 || pos as usize >= data.elems.len() {
            return Err(Error::Range("array index out of range".to_string()));
        }
        Ok(data.elems[pos as usize].clone())
    }

    /// Replace the element at `pos`, or a `Range` error.
    pub fn set_elem(&self, pos: i64, value: Value) -> Result<()> {
        let mut data = self.write();
        if pos < 0 || pos as usize >= data.elems.len() {
            return Err(Error::Range("array index out of range".to_string()));
        }
        data.elems[pos as usize] = value;
        Ok(())
    }

    /// Append an element.
    pub fn push_elem(&self, value: Value) {
        self.write().elems.push(value);
    }

    /// Snapshot the elements, so iteration never holds the object lock
    /// across guest callbacks.
    pub(crate) fn elems_snapshot(&self) -> Vec<Value> {
        self.read().elems.clone()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Display and truth
    // ═══════════════════════════════════════════════════════════════════

    /// The display form: `[e1,e2,…]` for arrays, `{k1:v1,…}` with keys
    /// sorted alphabetically for plain objects.
    pub fn render(&self) -> String {
        match &self.kind {
            ObjectKind::Array => {
                let data = self.read();
                let parts: Vec<String> = data.elems.iter().map(|v| v.to_string()).collect();
                format!("[{}]", parts.join(","))
            }
            ObjectKind::Plain | ObjectKind::Global => {
                let data = self.read();
                let mut keys: Vec<&String> = data.props.keys().collect();
                keys.sort();
                let parts: Vec<String> = keys
                    .into_iter()
                    .map(|k| format!("{}:{}", k, data.props[k]))
                    .collect();
                format!("{{{}}}", parts.join(","))
            }
            ObjectKind::Promise(_) => "promise".to_string(),
            ObjectKind::Channel(_) => "channel".to_string(),
            ObjectKind::Timer(_) => "timer".to_string(),
        }
    }

    /// Truth: arrays are true when non-empty, plain objects when they have
    /// any own property, native objects always.
    pub fn truth(&self) -> bool {
        match &self.kind {
            ObjectKind::Array => !self.is_empty(),
            ObjectKind::Plain | ObjectKind::Global => !self.read().props.is_empty(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object_keys() {
        let obj = Object::new_plain();
        assert_eq!(Object::get_key(&obj, "missing"), Value::Nil);
        Object::set_key(&obj, "a", Value::Number(1)).unwrap();
        assert_eq!(Object::get_key(&obj, "a"), Value::Number(1));
        assert_eq!(obj.lookup_prop("missing"), None);
    }

    #[test]
    fn test_array_length_is_derived() {
        let arr = Object::new_array(vec![Value::Number(1), Value::Number(2)]);
        assert_eq!(Object::get_key(&arr, "length"), Value::Number(2));
        arr.push_elem(Value::Number(3));
        assert_eq!(Object::get_key(&arr, "length"), Value::Number(3));
    }

    #[test]
    fn test_array_methods_shadow_props() {
        let arr = Object::new_array(vec![]);
        Object::set_key(&arr, "map", Value::Number(99)).unwrap();
        // Reserved names win over the property map.
        assert!(matches!(Object::get_key(&arr, "map"), Value::Builtin(_)));
        // Non-reserved names still read from the property map.
        Object::set_key(&arr, "tag", Value::Number(7)).unwrap();
        assert_eq!(Object::get_key(&arr, "tag"), Value::Number(7));
    }

    #[test]
    fn test_elem_range_checks() {
        let arr = Object::new_array(vec![Value::Number(10)]);
        assert_eq!(arr.get_elem(0).unwrap(), Value::Number(10));
        assert!(matches!(arr.get_elem(1), Err(Error::Range(_))));
        assert!(matches!(arr.get_elem(-1), Err(Error::Range(_))));
        assert!(arr.set_elem(0, Value::Number(20)).is_ok());
        assert!(arr.set_elem(5, Value::Nil).is_err());
    }

    #[test]
    fn test_truth() {
        let obj = Object::new_plain();
        assert!(!obj.truth());
        obj.set_prop("k", Value::Nil);
        assert!(obj.truth());

        let arr = Object::new_array(vec![]);
        assert!(!arr.truth());
        arr.push_elem(Value::Number(0));
        assert!(arr.truth());
    }

    #[test]
    fn test_native_objects_reject_set_key() {
        let promise = Object::new_promise();
        assert!(Object::set_key(&promise, "x", Value::Nil).is_err());
        assert!(matches!(Object::get_key(&promise, "then"), Value::Builtin(_)));
        assert_eq!(Object::get_key(&promise, "nope"), Value::Nil);
    }
}
