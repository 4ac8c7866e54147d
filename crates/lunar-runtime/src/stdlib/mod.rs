//! Numeric standard libraries
//!
//! Vectors and matrices are plain tables of numbers: `vec3` uses 3 elements,
//! `vec4` uses 4, and `mat4` uses 16 in row-major order (M11, M12, ..., M44).
//! Arithmetic happens in `f32` and results are written back as numbers.

pub mod matrix4x4;
pub mod vector3;
pub mod vector4;

use crate::native::{FunctionContext, LibraryFunction};
use crate::table::TableRef;
use crate::value::{RuntimeError, Value};
use crate::vm::State;
use lunar_config::Config;
use tracing::debug;

/// Every library with its global name
pub const LIBRARIES: &[(&str, &[(&str, LibraryFunction)])] = &[
    ("vec3", vector3::FUNCTIONS),
    ("vec4", vector4::FUNCTIONS),
    ("mat4", matrix4x4::FUNCTIONS),
];

/// Open every numeric library into the global table
pub fn open_libs(state: &State) {
    for (name, functions) in LIBRARIES {
        state.register_library(name, functions);
    }
}

/// Open the numeric libraries enabled in the `[libraries]` section
pub fn open_libs_with(state: &State, config: &Config) {
    for (name, functions) in LIBRARIES {
        if config.library_enabled(name) {
            state.register_library(name, functions);
        } else {
            debug!(library = name, "library disabled by config");
        }
    }
}

/// Read argument `index` as a table of exactly `N` numbers.
///
/// Anything else is a bad argument carrying `message`.
pub(crate) fn read_components<const N: usize>(
    ctx: &FunctionContext<'_>,
    index: usize,
    message: &str,
) -> Result<[f32; N], RuntimeError> {
    let table = ctx.table_argument(index)?;
    table.with(|t| {
        if t.array.len() != N {
            return Err(ctx.bad_argument(index, message));
        }
        let mut out = [0.0f32; N];
        for (slot, value) in out.iter_mut().zip(&t.array) {
            *slot = match value {
                Value::Number(n) => *n as f32,
                _ => return Err(ctx.bad_argument(index, message)),
            };
        }
        Ok(out)
    })
}

/// Read argument `index` as a number narrowed to `f32`
pub(crate) fn float_argument(ctx: &FunctionContext<'_>, index: usize) -> Result<f32, RuntimeError> {
    Ok(ctx.number_argument(index)? as f32)
}

/// New array table holding `components`
pub(crate) fn table_from_components(components: &[f32]) -> Value {
    debug_assert!(matches!(components.len(), 3 | 4 | 16));
    Value::Table(TableRef::from_numbers(
        components.iter().map(|&c| f64::from(c)),
    ))
}
