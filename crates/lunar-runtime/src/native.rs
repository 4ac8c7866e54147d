//! Native (Rust) functions callable from bytecode

use crate::table::TableRef;
use crate::value::{RuntimeError, Value};
use crate::vm::State;
use std::fmt;
use std::sync::Arc;

/// Native function body
///
/// Receives the call context and returns exactly one value or an error.
/// Arc provides cheap cloning for sharing natives across states.
pub type NativeFn = Arc<dyn Fn(&FunctionContext<'_>) -> Result<Value, RuntimeError> + Send + Sync>;

/// Plain function pointer form used by library registration tables
pub type LibraryFunction = fn(&FunctionContext<'_>) -> Result<Value, RuntimeError>;

/// A named native function
pub struct NativeFunction {
    pub name: String,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&FunctionContext<'_>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn invoke(&self, ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
        (self.func)(ctx)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Arguments and environment of one native call
///
/// Argument indices are 0-based here; errors report them 1-based.
pub struct FunctionContext<'a> {
    pub state: &'a State,
    pub args: &'a [Value],
    /// Qualified name used in error messages (e.g. `vec3.add`)
    pub function_name: &'a str,
}

impl<'a> FunctionContext<'a> {
    pub fn new(state: &'a State, args: &'a [Value], function_name: &'a str) -> Self {
        Self {
            state,
            args,
            function_name,
        }
    }

    /// Argument `index`, nil when absent
    pub fn argument(&self, index: usize) -> &Value {
        const NIL: Value = Value::Nil;
        self.args.get(index).unwrap_or(&NIL)
    }

    pub fn number_argument(&self, index: usize) -> Result<f64, RuntimeError> {
        let value = self.argument(index);
        value.as_number().ok_or_else(|| {
            self.bad_argument(index, format!("number expected, got {}", value.type_name()))
        })
    }

    pub fn table_argument(&self, index: usize) -> Result<TableRef, RuntimeError> {
        let value = self.argument(index);
        value.as_table().cloned().ok_or_else(|| {
            self.bad_argument(index, format!("table expected, got {}", value.type_name()))
        })
    }

    /// Build a `BadArgument` error for argument `index`
    pub fn bad_argument(&self, index: usize, message: impl Into<String>) -> RuntimeError {
        RuntimeError::BadArgument {
            position: index + 1,
            function: self.function_name.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_argument_is_one_based() {
        let state = State::new();
        let args = [Value::Number(1.0)];
        let ctx = FunctionContext::new(&state, &args, "vec3.add");

        let err = ctx.table_argument(0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad argument #1 to 'vec3.add' (table expected, got number)"
        );
    }

    #[test]
    fn test_missing_argument_is_nil() {
        let state = State::new();
        let ctx = FunctionContext::new(&state, &[], "f");

        assert!(ctx.argument(3).is_nil());
        let err = ctx.number_argument(1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad argument #2 to 'f' (number expected, got nil)"
        );
    }

    #[test]
    fn test_invoke() {
        let state = State::new();
        let double = NativeFunction::new("double", |ctx| {
            Ok(Value::Number(ctx.number_argument(0)? * 2.0))
        });
        let args = [Value::Number(21.0)];
        let result = double
            .invoke(&FunctionContext::new(&state, &args, "double"))
            .unwrap();
        assert_eq!(result, Value::Number(42.0));
    }
}
