//! Global interpreter state shared by all threads of a VM

use crate::native::{FunctionContext, LibraryFunction, NativeFunction};
use crate::table::TableRef;
use crate::value::{Function, RuntimeError, Value, ValueType};
use std::collections::HashMap;
use std::sync::Arc;

/// Globals and per-type metatables
#[derive(Debug, Default)]
pub struct State {
    globals: TableRef,
    type_metatables: HashMap<ValueType, TableRef>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn globals(&self) -> &TableRef {
        &self.globals
    }

    pub fn global(&self, name: &str) -> Value {
        self.globals.raw_get_str(name)
    }

    pub fn set_global(&self, name: &str, value: Value) {
        self.globals.raw_set_str(name, value);
    }

    /// Shared metatable for every value of a non-table type
    pub fn type_metatable(&self, value_type: ValueType) -> Option<TableRef> {
        self.type_metatables.get(&value_type).cloned()
    }

    /// Install or clear a per-type metatable
    ///
    /// Tables carry their own metatable, so registering one for
    /// `ValueType::Table` has no effect on lookups.
    pub fn set_type_metatable(&mut self, value_type: ValueType, metatable: Option<TableRef>) {
        match metatable {
            Some(mt) => {
                self.type_metatables.insert(value_type, mt);
            }
            None => {
                self.type_metatables.remove(&value_type);
            }
        }
    }

    /// Define a native function as a global
    pub fn register_function<F>(&self, name: &str, func: F) -> Function
    where
        F: Fn(&FunctionContext<'_>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        let function = Function::Native(Arc::new(NativeFunction::new(name, func)));
        self.set_global(name, Value::Function(function.clone()));
        function
    }

    /// Define a library table of native functions as a global
    ///
    /// Each function is named `library.function` in error messages.
    pub fn register_library(
        &self,
        library: &str,
        functions: &[(&str, LibraryFunction)],
    ) -> TableRef {
        let table = TableRef::new();
        for (name, func) in functions {
            let native = NativeFunction::new(format!("{}.{}", library, name), *func);
            table.raw_set_str(*name, Value::Function(Function::Native(Arc::new(native))));
        }
        self.set_global(library, Value::Table(table.clone()));
        table
    }
}
