//! `vec4` library: four-component vectors as `{x, y, z, w}` tables

use super::{float_argument, read_components, table_from_components};
use crate::native::{FunctionContext, LibraryFunction};
use crate::value::{RuntimeError, Value};
use nalgebra::Vector4;

pub(crate) const INVALID_VEC4: &str = "Invalid vec4. Four numeric elements required";

pub const FUNCTIONS: &[(&str, LibraryFunction)] = &[
    ("add", add),
    ("sub", sub),
    ("dot", dot),
    ("mag", mag),
    ("mag2", mag2),
    ("normalize", normalize),
    ("scale", scale),
    ("lerp", lerp),
];

/// Read argument `index` as a vec4
pub(crate) fn read_vec4(
    ctx: &FunctionContext<'_>,
    index: usize,
) -> Result<Vector4<f32>, RuntimeError> {
    read_components::<4>(ctx, index, INVALID_VEC4).map(Vector4::from)
}

fn to_value(v: Vector4<f32>) -> Value {
    table_from_components(v.as_slice())
}

pub fn add(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(read_vec4(ctx, 0)? + read_vec4(ctx, 1)?))
}

pub fn sub(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(read_vec4(ctx, 0)? - read_vec4(ctx, 1)?))
}

pub fn dot(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let d = read_vec4(ctx, 0)?.dot(&read_vec4(ctx, 1)?);
    Ok(Value::Number(f64::from(d)))
}

pub fn mag(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(Value::Number(f64::from(read_vec4(ctx, 0)?.norm())))
}

pub fn mag2(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(Value::Number(f64::from(read_vec4(ctx, 0)?.norm_squared())))
}

/// The zero vector normalizes to NaN components.
pub fn normalize(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let v = read_vec4(ctx, 0)?;
    Ok(to_value(v / v.norm()))
}

pub fn scale(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let v = read_vec4(ctx, 0)?;
    Ok(to_value(v * float_argument(ctx, 1)?))
}

pub fn lerp(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let a = read_vec4(ctx, 0)?;
    let b = read_vec4(ctx, 1)?;
    let t = float_argument(ctx, 2)?;
    Ok(to_value(a.lerp(&b, t)))
}
