//! `vec3` library: three-component vectors as `{x, y, z}` tables

use super::{float_argument, read_components, table_from_components};
use crate::native::{FunctionContext, LibraryFunction};
use crate::value::{RuntimeError, Value};
use nalgebra::Vector3;

pub(crate) const INVALID_VEC3: &str = "Invalid vec3. Three numeric elements required";

pub const FUNCTIONS: &[(&str, LibraryFunction)] = &[
    ("add", add),
    ("sub", sub),
    ("dot", dot),
    ("cross", cross),
    ("mag", mag),
    ("mag2", mag2),
    ("normalize", normalize),
    ("scale", scale),
    ("lerp", lerp),
    ("distance", distance),
];

/// Read argument `index` as a vec3
pub(crate) fn read_vec3(
    ctx: &FunctionContext<'_>,
    index: usize,
) -> Result<Vector3<f32>, RuntimeError> {
    read_components::<3>(ctx, index, INVALID_VEC3).map(Vector3::from)
}

fn to_value(v: Vector3<f32>) -> Value {
    table_from_components(v.as_slice())
}

/// add(a: vec3, b: vec3) -> vec3
pub fn add(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(read_vec3(ctx, 0)? + read_vec3(ctx, 1)?))
}

/// sub(a: vec3, b: vec3) -> vec3
pub fn sub(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(read_vec3(ctx, 0)? - read_vec3(ctx, 1)?))
}

/// dot(a: vec3, b: vec3) -> number
pub fn dot(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let d = read_vec3(ctx, 0)?.dot(&read_vec3(ctx, 1)?);
    Ok(Value::Number(f64::from(d)))
}

/// cross(a: vec3, b: vec3) -> vec3
pub fn cross(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(read_vec3(ctx, 0)?.cross(&read_vec3(ctx, 1)?)))
}

/// mag(v: vec3) -> number
///
/// Euclidean length.
pub fn mag(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(Value::Number(f64::from(read_vec3(ctx, 0)?.norm())))
}

/// mag2(v: vec3) -> number
///
/// Squared length; cheaper than `mag` for comparisons.
pub fn mag2(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(Value::Number(f64::from(read_vec3(ctx, 0)?.norm_squared())))
}

/// normalize(v: vec3) -> vec3
///
/// The zero vector normalizes to NaN components.
pub fn normalize(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let v = read_vec3(ctx, 0)?;
    Ok(to_value(v / v.norm()))
}

/// scale(v: vec3, s: number) -> vec3
pub fn scale(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let v = read_vec3(ctx, 0)?;
    let s = float_argument(ctx, 1)?;
    Ok(to_value(v * s))
}

/// lerp(a: vec3, b: vec3, t: number) -> vec3
///
/// `t` is not clamped.
pub fn lerp(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let a = read_vec3(ctx, 0)?;
    let b = read_vec3(ctx, 1)?;
    let t = float_argument(ctx, 2)?;
    Ok(to_value(a.lerp(&b, t)))
}

/// distance(a: vec3, b: vec3) -> number
pub fn distance(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let d = (read_vec3(ctx, 0)? - read_vec3(ctx, 1)?).norm();
    Ok(Value::Number(f64::from(d)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableRef;
    use crate::vm::State;
    use pretty_assertions::assert_eq;

    fn v3(x: f64, y: f64, z: f64) -> Value {
        Value::Table(TableRef::from_numbers([x, y, z]))
    }

    fn call(f: LibraryFunction, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let state = State::new();
        f(&FunctionContext::new(&state, args, name))
    }

    fn numbers(value: &Value) -> Vec<f64> {
        value
            .as_table()
            .unwrap()
            .with(|t| t.array.iter().map(|v| v.as_number().unwrap()).collect())
    }

    #[test]
    fn test_add_sub() {
        let sum = call(add, "vec3.add", &[v3(1.0, 2.0, 3.0), v3(4.0, 5.0, 6.0)]).unwrap();
        assert_eq!(numbers(&sum), vec![5.0, 7.0, 9.0]);

        let diff = call(sub, "vec3.sub", &[v3(1.0, 2.0, 3.0), v3(4.0, 5.0, 6.0)]).unwrap();
        assert_eq!(numbers(&diff), vec![-3.0, -3.0, -3.0]);
    }

    #[test]
    fn test_dot_and_cross() {
        let d = call(dot, "vec3.dot", &[v3(1.0, 2.0, 3.0), v3(4.0, 5.0, 6.0)]).unwrap();
        assert_eq!(d, Value::Number(32.0));

        let c = call(cross, "vec3.cross", &[v3(1.0, 0.0, 0.0), v3(0.0, 1.0, 0.0)]).unwrap();
        assert_eq!(numbers(&c), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_magnitudes() {
        assert_eq!(
            call(mag, "vec3.mag", &[v3(2.0, 3.0, 6.0)]).unwrap(),
            Value::Number(7.0)
        );
        assert_eq!(
            call(mag2, "vec3.mag2", &[v3(2.0, 3.0, 6.0)]).unwrap(),
            Value::Number(49.0)
        );
        assert_eq!(
            call(distance, "vec3.distance", &[v3(1.0, 1.0, 1.0), v3(1.0, 4.0, 5.0)]).unwrap(),
            Value::Number(5.0)
        );
    }

    #[test]
    fn test_normalize_scale_lerp() {
        let n = call(normalize, "vec3.normalize", &[v3(0.0, 0.0, 8.0)]).unwrap();
        assert_eq!(numbers(&n), vec![0.0, 0.0, 1.0]);

        let s = call(scale, "vec3.scale", &[v3(1.0, -2.0, 0.5), Value::Number(2.0)]).unwrap();
        assert_eq!(numbers(&s), vec![2.0, -4.0, 1.0]);

        let l = call(
            lerp,
            "vec3.lerp",
            &[v3(0.0, 0.0, 0.0), v3(4.0, 8.0, -2.0), Value::Number(0.5)],
        )
        .unwrap();
        assert_eq!(numbers(&l), vec![2.0, 4.0, -1.0]);
    }

    #[test]
    fn test_wrong_length_is_bad_argument() {
        let two = Value::Table(TableRef::from_numbers([1.0, 2.0]));
        let err = call(add, "vec3.add", &[v3(1.0, 2.0, 3.0), two]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad argument #2 to 'vec3.add' (Invalid vec3. Three numeric elements required)"
        );
    }

    #[test]
    fn test_non_table_is_bad_argument() {
        let err = call(mag, "vec3.mag", &[Value::Number(3.0)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad argument #1 to 'vec3.mag' (table expected, got number)"
        );
    }

    #[test]
    fn test_scale_requires_number() {
        let err = call(scale, "vec3.scale", &[v3(1.0, 2.0, 3.0), Value::Nil]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad argument #2 to 'vec3.scale' (number expected, got nil)"
        );
    }
}
