//! Register stack shared by all frames of a thread

use crate::value::Value;
use std::ops::Range;

static NIL: Value = Value::Nil;

/// Growable register file
///
/// Frames address it through absolute indices (`frame.base + register`).
/// Reads past the end yield nil instead of panicking, so inspection code
/// can probe any register safely.
#[derive(Debug, Default)]
pub struct ValueStack {
    values: Vec<Value>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Read an absolute slot; nil when out of range
    pub fn get(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&NIL)
    }

    /// Write an absolute slot, growing the stack with nils if needed
    pub fn set(&mut self, index: usize, value: Value) {
        self.ensure_len(index + 1);
        self.values[index] = value;
    }

    /// Grow (never shrink) to at least `len` slots
    pub fn ensure_len(&mut self, len: usize) {
        if self.values.len() < len {
            self.values.resize(len, Value::Nil);
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy a range of slots out, padding with nils past the end
    pub fn copy_range(&self, range: Range<usize>) -> Vec<Value> {
        range.map(|i| self.get(i).clone()).collect()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}
