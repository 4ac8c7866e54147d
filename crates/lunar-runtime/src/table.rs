//! Reference-semantics tables
//!
//! A table has two parts: a dense array part addressed by integer keys
//! `1..=n`, and a hash part addressed by string keys. Either part may be
//! empty. A table may also carry a metatable.
//!
//! `TableRef` is the handle stored in [`Value::Table`]. All clones point at
//! the same table; mutation through one clone is visible through all others.
//! Locks are only ever taken one at a time, never nested, so a table that
//! is its own metatable does not deadlock.

use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Table contents
#[derive(Debug, Default, Clone)]
pub struct Table {
    /// Array part; script index `i` lives at `array[i - 1]`
    pub array: Vec<Value>,
    /// String-keyed part
    pub hash: HashMap<Arc<str>, Value>,
    /// Metatable consulted for metamethods
    pub metatable: Option<TableRef>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shared handle to a [`Table`]
#[derive(Clone, Default)]
pub struct TableRef(Arc<Mutex<Table>>);

impl TableRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an array table from numbers
    pub fn from_numbers(values: impl IntoIterator<Item = f64>) -> Self {
        let table = Table {
            array: values.into_iter().map(Value::Number).collect(),
            ..Table::default()
        };
        TableRef(Arc::new(Mutex::new(table)))
    }

    /// Acquire the lock and apply a read function.
    pub fn with<R>(&self, f: impl FnOnce(&Table) -> R) -> R {
        let guard = self.0.lock().expect("TableRef lock poisoned");
        f(&guard)
    }

    /// Acquire the lock and apply a mutation function.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Table) -> R) -> R {
        let mut guard = self.0.lock().expect("TableRef lock poisoned");
        f(&mut guard)
    }

    /// Length of the array part
    pub fn array_length(&self) -> usize {
        self.with(|t| t.array.len())
    }

    pub fn raw_get_str(&self, key: &str) -> Value {
        self.with(|t| t.hash.get(key).cloned().unwrap_or(Value::Nil))
    }

    /// Set a string key; assigning nil removes the entry
    pub fn raw_set_str(&self, key: impl Into<Arc<str>>, value: Value) {
        let key = key.into();
        self.with_mut(|t| {
            if value.is_nil() {
                t.hash.remove(&key);
            } else {
                t.hash.insert(key, value);
            }
        });
    }

    /// Read a 1-based array slot; anything outside `1..=len` is nil
    pub fn raw_get_index(&self, index: usize) -> Value {
        if index == 0 {
            return Value::Nil;
        }
        self.with(|t| t.array.get(index - 1).cloned().unwrap_or(Value::Nil))
    }

    /// Write a 1-based array slot
    ///
    /// Writing at `len + 1` appends. Returns false when the index would
    /// leave a hole in the array part.
    pub fn raw_set_index(&self, index: usize, value: Value) -> bool {
        if index == 0 {
            return false;
        }
        self.with_mut(|t| {
            let len = t.array.len();
            if index <= len {
                t.array[index - 1] = value;
                true
            } else if index == len + 1 {
                t.array.push(value);
                true
            } else {
                false
            }
        })
    }

    pub fn metatable(&self) -> Option<TableRef> {
        self.with(|t| t.metatable.clone())
    }

    pub fn set_metatable(&self, metatable: Option<TableRef>) {
        self.with_mut(|t| t.metatable = metatable);
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &TableRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address used for display
    pub fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableRef({:p})", self.as_ptr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_storage() {
        let a = TableRef::new();
        let b = a.clone();
        b.raw_set_str("x", Value::Number(1.0));
        assert_eq!(a.raw_get_str("x"), Value::Number(1.0));
        assert_eq!(a, b);
        assert_ne!(a, TableRef::new());
    }

    #[test]
    fn test_set_nil_removes_key() {
        let t = TableRef::new();
        t.raw_set_str("x", Value::Bool(true));
        t.raw_set_str("x", Value::Nil);
        assert!(t.with(|t| t.hash.is_empty()));
    }

    #[test]
    fn test_array_part_append_and_holes() {
        let t = TableRef::new();
        assert!(t.raw_set_index(1, Value::Number(10.0)));
        assert!(t.raw_set_index(2, Value::Number(20.0)));
        assert!(!t.raw_set_index(4, Value::Number(40.0)));
        assert!(!t.raw_set_index(0, Value::Number(0.0)));
        assert_eq!(t.array_length(), 2);
        assert_eq!(t.raw_get_index(2), Value::Number(20.0));
        assert_eq!(t.raw_get_index(3), Value::Nil);
        assert_eq!(t.raw_get_index(0), Value::Nil);
    }

    #[test]
    fn test_self_metatable_does_not_deadlock() {
        let t = TableRef::new();
        t.set_metatable(Some(t.clone()));
        let mt = t.metatable().unwrap();
        assert!(mt.ptr_eq(&t));
        // Break the cycle so the table is freed
        t.set_metatable(None);
    }

    #[test]
    fn test_from_numbers() {
        let t = TableRef::from_numbers([1.0, 2.0, 3.0]);
        assert_eq!(t.array_length(), 3);
        assert_eq!(t.raw_get_index(3), Value::Number(3.0));
    }
}
