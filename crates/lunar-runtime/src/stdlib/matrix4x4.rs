//! `mat4` library: 4x4 matrices as 16-element row-major tables
//!
//! Matrices follow the row-vector convention: a point is transformed as
//! `p * M`, translation lives in M41..M43, and `mul(a, b)` applies `a`
//! first.
//!
//! A table is loaded into an [`nalgebra::Matrix4`] from its column slice.
//! Table row `i` becomes matrix column `i`, so the loaded value is the
//! column-vector form of the same transform and nalgebra's rotation and view
//! constructors apply unchanged. Products therefore reverse operand order.
//! Projections use a `[0, 1]` depth range and are built by hand.

use super::vector3::read_vec3;
use super::vector4::read_vec4;
use super::{float_argument, read_components, table_from_components};
use crate::native::{FunctionContext, LibraryFunction};
use crate::value::{RuntimeError, Value};
use nalgebra::{Matrix4, Point3, Unit, Vector3, Vector4};

pub(crate) const INVALID_MAT4: &str = "Invalid mat4x4. 16 numeric elements required";

/// Squared distance under which a billboard faces the camera's forward vector
const BILLBOARD_EPSILON: f32 = 1e-4;

/// Cosine threshold (0.1 degrees) for a billboard axis being parallel to its facing
const BILLBOARD_MIN_ANGLE: f32 = 1.0 - 0.1 * (std::f32::consts::PI / 180.0);

pub const FUNCTIONS: &[(&str, LibraryFunction)] = &[
    ("identity", identity),
    ("add", add),
    ("sub", sub),
    ("mul", mul),
    ("transpose", transpose),
    ("invert", invert),
    ("make_orthographic", make_orthographic),
    ("make_perspective", make_perspective),
    ("make_ortho_off_center", make_ortho_off_center),
    ("make_perspective_off_center", make_perspective_off_center),
    ("make_perspective_fov", make_perspective_fov),
    ("make_reflection", make_reflection),
    ("make_shadow", make_shadow),
    ("make_world_matrix", make_world_matrix),
    ("make_billboard", make_billboard),
    ("make_look_at", make_look_at),
    ("make_translation", make_translation),
    ("make_scale", make_scale),
    ("make_rot_x", make_rot_x),
    ("make_rot_y", make_rot_y),
    ("make_rot_z", make_rot_z),
    ("from_axis_angle", from_axis_angle),
    ("from_yaw_pitch_roll", from_yaw_pitch_roll),
];

type Mat4 = Matrix4<f32>;

// ============================================================================
// Conversion
// ============================================================================

fn read_mat4(ctx: &FunctionContext<'_>, index: usize) -> Result<Mat4, RuntimeError> {
    read_components::<16>(ctx, index, INVALID_MAT4).map(|m| Mat4::from_column_slice(&m))
}

fn to_value(m: Mat4) -> Value {
    table_from_components(m.as_slice())
}

/// Matrix from its four rows in table order
fn from_rows(rows: [[f32; 4]; 4]) -> Mat4 {
    Mat4::from_columns(&rows.map(Vector4::from))
}

/// Matrix whose table rows are the given basis vectors and origin
fn from_basis(x: Vector3<f32>, y: Vector3<f32>, z: Vector3<f32>, origin: Vector3<f32>) -> Mat4 {
    Mat4::from_columns(&[x.push(0.0), y.push(0.0), z.push(0.0), origin.push(1.0)])
}

/// Plane `(a, b, c, d)` scaled so its normal has unit length
fn normalize_plane(plane: Vector4<f32>) -> Vector4<f32> {
    plane / plane.xyz().norm()
}

/// Reject near/far plane distances a perspective projection cannot use
fn check_clip_planes(
    ctx: &FunctionContext<'_>,
    near_index: usize,
    near: f32,
    far: f32,
) -> Result<(), RuntimeError> {
    if near <= 0.0 {
        return Err(ctx.bad_argument(near_index, "near plane distance must be positive"));
    }
    if far <= 0.0 {
        return Err(ctx.bad_argument(near_index + 1, "far plane distance must be positive"));
    }
    if near >= far {
        return Err(ctx.bad_argument(
            near_index,
            "near plane distance must be less than far plane distance",
        ));
    }
    Ok(())
}

fn ortho_off_center(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let depth = 1.0 / (near - far);
    from_rows([
        [2.0 / (right - left), 0.0, 0.0, 0.0],
        [0.0, 2.0 / (top - bottom), 0.0, 0.0],
        [0.0, 0.0, depth, 0.0],
        [
            (left + right) / (left - right),
            (top + bottom) / (bottom - top),
            near * depth,
            1.0,
        ],
    ])
}

fn perspective_off_center(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let depth = far / (near - far);
    from_rows([
        [2.0 * near / (right - left), 0.0, 0.0, 0.0],
        [0.0, 2.0 * near / (top - bottom), 0.0, 0.0],
        [
            (left + right) / (right - left),
            (top + bottom) / (top - bottom),
            depth,
            -1.0,
        ],
        [0.0, 0.0, near * depth, 0.0],
    ])
}

fn rotation(axis: Unit<Vector3<f32>>, angle: f32) -> Mat4 {
    Mat4::from_axis_angle(&axis, angle)
}

// ============================================================================
// Arithmetic
// ============================================================================

/// identity() -> mat4
pub fn identity(_ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(Mat4::identity()))
}

/// add(a: mat4, b: mat4) -> mat4
pub fn add(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(read_mat4(ctx, 0)? + read_mat4(ctx, 1)?))
}

/// sub(a: mat4, b: mat4) -> mat4
pub fn sub(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(read_mat4(ctx, 0)? - read_mat4(ctx, 1)?))
}

/// mul(a: mat4, b: mat4 | number) -> mat4
///
/// A table second argument is a matrix product, anything else must be a
/// number scaling every element.
pub fn mul(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let a = read_mat4(ctx, 0)?;
    if ctx.argument(1).as_table().is_some() {
        let b = read_mat4(ctx, 1)?;
        Ok(to_value(b * a))
    } else {
        Ok(to_value(a * float_argument(ctx, 1)?))
    }
}

/// transpose(m: mat4) -> mat4
pub fn transpose(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(read_mat4(ctx, 0)?.transpose()))
}

/// invert(m: mat4) -> mat4 | nil
///
/// Returns nil for a singular matrix.
pub fn invert(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let m = read_mat4(ctx, 0)?;
    let det = m.determinant();
    if det == 0.0 || !det.is_finite() {
        return Ok(Value::Nil);
    }
    Ok(m.try_inverse().map_or(Value::Nil, to_value))
}

// ============================================================================
// Projections
// ============================================================================

/// make_orthographic(width, height, near, far) -> mat4
pub fn make_orthographic(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let width = float_argument(ctx, 0)?;
    let height = float_argument(ctx, 1)?;
    let near = float_argument(ctx, 2)?;
    let far = float_argument(ctx, 3)?;

    let (w, h) = (width * 0.5, height * 0.5);
    Ok(to_value(ortho_off_center(-w, w, -h, h, near, far)))
}

/// make_perspective(width, height, near, far) -> mat4
pub fn make_perspective(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let width = float_argument(ctx, 0)?;
    let height = float_argument(ctx, 1)?;
    let near = float_argument(ctx, 2)?;
    let far = float_argument(ctx, 3)?;
    check_clip_planes(ctx, 2, near, far)?;

    let (w, h) = (width * 0.5, height * 0.5);
    Ok(to_value(perspective_off_center(-w, w, -h, h, near, far)))
}

/// make_ortho_off_center(left, right, bottom, top, near, far) -> mat4
pub fn make_ortho_off_center(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let left = float_argument(ctx, 0)?;
    let right = float_argument(ctx, 1)?;
    let bottom = float_argument(ctx, 2)?;
    let top = float_argument(ctx, 3)?;
    let near = float_argument(ctx, 4)?;
    let far = float_argument(ctx, 5)?;

    Ok(to_value(ortho_off_center(left, right, bottom, top, near, far)))
}

/// make_perspective_off_center(left, right, bottom, top, near, far) -> mat4
pub fn make_perspective_off_center(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let left = float_argument(ctx, 0)?;
    let right = float_argument(ctx, 1)?;
    let bottom = float_argument(ctx, 2)?;
    let top = float_argument(ctx, 3)?;
    let near = float_argument(ctx, 4)?;
    let far = float_argument(ctx, 5)?;
    check_clip_planes(ctx, 4, near, far)?;

    Ok(to_value(perspective_off_center(left, right, bottom, top, near, far)))
}

/// make_perspective_fov(fov_y, aspect, near, far) -> mat4
///
/// `fov_y` is in radians and must lie strictly between 0 and pi.
pub fn make_perspective_fov(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let fov = float_argument(ctx, 0)?;
    let aspect = float_argument(ctx, 1)?;
    let near = float_argument(ctx, 2)?;
    let far = float_argument(ctx, 3)?;

    if fov <= 0.0 || fov >= std::f32::consts::PI {
        return Err(ctx.bad_argument(0, "field of view must be between 0 and pi"));
    }
    check_clip_planes(ctx, 2, near, far)?;

    let top = near * (fov * 0.5).tan();
    let right = top * aspect;
    Ok(to_value(perspective_off_center(-right, right, -top, top, near, far)))
}

// ============================================================================
// Planes
// ============================================================================

/// make_reflection(plane: vec4) -> mat4
///
/// Reflects through the plane `ax + by + cz + d = 0`.
pub fn make_reflection(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let plane = normalize_plane(read_vec4(ctx, 0)?);
    let n = plane.xyz();
    let f = n * -2.0;

    Ok(to_value(from_rows([
        [f.x * n.x + 1.0, f.y * n.x, f.z * n.x, 0.0],
        [f.x * n.y, f.y * n.y + 1.0, f.z * n.y, 0.0],
        [f.x * n.z, f.y * n.z, f.z * n.z + 1.0, 0.0],
        [f.x * plane.w, f.y * plane.w, f.z * plane.w, 1.0],
    ])))
}

/// make_shadow(light_dir: vec3, plane: vec4) -> mat4
///
/// Flattens geometry onto `plane` along a directional light.
pub fn make_shadow(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let light = read_vec3(ctx, 0)?;
    let plane = normalize_plane(read_vec4(ctx, 1)?);
    let dot = plane.xyz().dot(&light);
    let (a, b, c, d) = (-plane.x, -plane.y, -plane.z, -plane.w);

    Ok(to_value(from_rows([
        [a * light.x + dot, a * light.y, a * light.z, 0.0],
        [b * light.x, b * light.y + dot, b * light.z, 0.0],
        [c * light.x, c * light.y, c * light.z + dot, 0.0],
        [d * light.x, d * light.y, d * light.z, dot],
    ])))
}

// ============================================================================
// Placement
// ============================================================================

/// make_world_matrix(position: vec3, forward: vec3, up: vec3) -> mat4
pub fn make_world_matrix(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let position = read_vec3(ctx, 0)?;
    let forward = read_vec3(ctx, 1)?;
    let up = read_vec3(ctx, 2)?;

    let z = (-forward).normalize();
    let x = up.cross(&z).normalize();
    let y = z.cross(&x);

    Ok(to_value(from_basis(x, y, z, position)))
}

/// make_billboard(object, camera, axis, camera_forward, object_forward) -> mat4
///
/// Billboard that may only rotate around `axis`. When the camera sits on
/// the axis, `object_forward` decides the facing instead.
pub fn make_billboard(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let object = read_vec3(ctx, 0)?;
    let camera = read_vec3(ctx, 1)?;
    let axis = read_vec3(ctx, 2)?;
    let camera_forward = read_vec3(ctx, 3)?;
    let object_forward = read_vec3(ctx, 4)?;

    let to_object = object - camera;
    let norm = to_object.norm_squared();
    let face = if norm < BILLBOARD_EPSILON {
        -camera_forward
    } else {
        to_object / norm.sqrt()
    };

    // Facing parallel to the axis cannot orient the billboard; fall back to
    // the object's forward, then to a fixed direction.
    let facing = if axis.dot(&face).abs() <= BILLBOARD_MIN_ANGLE {
        face
    } else if axis.dot(&object_forward).abs() <= BILLBOARD_MIN_ANGLE {
        object_forward
    } else if axis.z.abs() > BILLBOARD_MIN_ANGLE {
        Vector3::x()
    } else {
        -Vector3::z()
    };
    let x = axis.cross(&facing).normalize();
    let z = x.cross(&axis).normalize();

    Ok(to_value(from_basis(x, axis, z, object)))
}

/// make_look_at(eye: vec3, target: vec3, up: vec3) -> mat4
pub fn make_look_at(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let eye = Point3::from(read_vec3(ctx, 0)?);
    let target = Point3::from(read_vec3(ctx, 1)?);
    let up = read_vec3(ctx, 2)?;
    Ok(to_value(Mat4::look_at_rh(&eye, &target, &up)))
}

// ============================================================================
// Affine transforms
// ============================================================================

/// make_translation(x, y, z) -> mat4
pub fn make_translation(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let offset = Vector3::new(
        float_argument(ctx, 0)?,
        float_argument(ctx, 1)?,
        float_argument(ctx, 2)?,
    );
    Ok(to_value(Mat4::new_translation(&offset)))
}

/// make_scale(sx, sy, sz) -> mat4
pub fn make_scale(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let scale = Vector3::new(
        float_argument(ctx, 0)?,
        float_argument(ctx, 1)?,
        float_argument(ctx, 2)?,
    );
    Ok(to_value(Mat4::new_nonuniform_scaling(&scale)))
}

/// make_rot_x(radians) -> mat4
pub fn make_rot_x(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(rotation(Vector3::x_axis(), float_argument(ctx, 0)?)))
}

/// make_rot_y(radians) -> mat4
pub fn make_rot_y(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(rotation(Vector3::y_axis(), float_argument(ctx, 0)?)))
}

/// make_rot_z(radians) -> mat4
pub fn make_rot_z(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    Ok(to_value(rotation(Vector3::z_axis(), float_argument(ctx, 0)?)))
}

/// from_axis_angle(axis: vec3, radians) -> mat4
///
/// `axis` is expected to be unit length; it is not normalized.
pub fn from_axis_angle(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let axis = Unit::new_unchecked(read_vec3(ctx, 0)?);
    let angle = float_argument(ctx, 1)?;
    Ok(to_value(rotation(axis, angle)))
}

/// from_yaw_pitch_roll(yaw, pitch, roll) -> mat4
///
/// Yaw turns around Y, pitch around X, roll around Z. Roll is applied first.
pub fn from_yaw_pitch_roll(ctx: &FunctionContext<'_>) -> Result<Value, RuntimeError> {
    let yaw = float_argument(ctx, 0)?;
    let pitch = float_argument(ctx, 1)?;
    let roll = float_argument(ctx, 2)?;
    Ok(to_value(
        rotation(Vector3::y_axis(), yaw)
            * rotation(Vector3::x_axis(), pitch)
            * rotation(Vector3::z_axis(), roll),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableRef;
    use crate::vm::State;
    use pretty_assertions::assert_eq;
    use std::f64::consts::FRAC_PI_2;

    const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    fn call(f: LibraryFunction, args: &[Value]) -> Result<Value, RuntimeError> {
        let state = State::new();
        f(&FunctionContext::new(&state, args, "mat4.test"))
    }

    fn table(values: &[f64]) -> Value {
        Value::Table(TableRef::from_numbers(values.iter().copied()))
    }

    fn numbers(value: &Value) -> Vec<f64> {
        value
            .as_table()
            .unwrap()
            .with(|t| t.array.iter().map(|v| v.as_number().unwrap()).collect())
    }

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < 1e-5, "element {}: {} != {}", i + 1, a, e);
        }
    }

    #[test]
    fn test_identity() {
        assert_eq!(numbers(&call(identity, &[]).unwrap()), IDENTITY.to_vec());
    }

    #[test]
    fn test_translation_lives_in_last_row() {
        let m = call(make_translation, &[n(1.0), n(2.0), n(3.0)]).unwrap();
        let values = numbers(&m);
        assert_eq!(&values[12..16], &[1.0, 2.0, 3.0, 1.0]);
        assert_eq!(&values[0..4], &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_mul_applies_left_operand_first() {
        let translate = call(make_translation, &[n(1.0), n(2.0), n(3.0)]).unwrap();
        let scale = call(make_scale, &[n(2.0), n(2.0), n(2.0)]).unwrap();

        let m = numbers(&call(mul, &[translate, scale]).unwrap());
        assert_eq!(
            m,
            vec![
                2.0, 0.0, 0.0, 0.0, //
                0.0, 2.0, 0.0, 0.0, //
                0.0, 0.0, 2.0, 0.0, //
                2.0, 4.0, 6.0, 1.0,
            ]
        );
    }

    #[test]
    fn test_mul_by_scalar() {
        let m = numbers(&call(mul, &[table(&IDENTITY), n(3.0)]).unwrap());
        assert_eq!(m[0], 3.0);
        assert_eq!(m[15], 3.0);
        assert_eq!(m[1], 0.0);
    }

    #[test]
    fn test_mul_rejects_string_operand() {
        let err = call(mul, &[table(&IDENTITY), Value::string("2")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad argument #2 to 'mat4.test' (number expected, got string)"
        );
    }

    #[test]
    fn test_add_sub_transpose() {
        let ascending: Vec<f64> = (1..=16).map(f64::from).collect();
        let m = table(&ascending);

        let doubled = numbers(&call(add, &[m.clone(), m.clone()]).unwrap());
        assert_eq!(doubled[4], 10.0);
        assert!(numbers(&call(sub, &[m.clone(), m.clone()]).unwrap())
            .iter()
            .all(|v| *v == 0.0));

        let t = numbers(&call(transpose, &[m]).unwrap());
        assert_eq!(&t[0..4], &[1.0, 5.0, 9.0, 13.0]);
    }

    #[test]
    fn test_invert() {
        let translate = call(make_translation, &[n(1.0), n(-2.0), n(4.0)]).unwrap();
        let inverse = numbers(&call(invert, &[translate]).unwrap());
        assert_close(&inverse[12..15], &[-1.0, 2.0, -4.0]);

        let singular = table(&[0.0; 16]);
        assert!(call(invert, &[singular]).unwrap().is_nil());
    }

    #[test]
    fn test_rotation_layout() {
        let m = numbers(&call(make_rot_x, &[n(FRAC_PI_2)]).unwrap());
        // M22 = cos, M23 = sin, M32 = -sin, M33 = cos
        assert_close(&m[5..7], &[0.0, 1.0]);
        assert_close(&m[9..11], &[-1.0, 0.0]);

        let z = numbers(&call(make_rot_z, &[n(FRAC_PI_2)]).unwrap());
        assert_close(&z[0..2], &[0.0, 1.0]);

        let axis = Value::Table(TableRef::from_numbers([0.0, 0.0, 1.0]));
        let same = numbers(&call(from_axis_angle, &[axis, n(FRAC_PI_2)]).unwrap());
        assert_close(&same, &z);

        let ypr = numbers(&call(from_yaw_pitch_roll, &[n(0.0), n(0.0), n(FRAC_PI_2)]).unwrap());
        assert_close(&ypr, &z);
    }

    #[test]
    fn test_orthographic() {
        let m = numbers(&call(make_orthographic, &[n(4.0), n(2.0), n(1.0), n(3.0)]).unwrap());
        assert_close(
            &m,
            &[
                0.5, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, -0.5, 0.0, //
                0.0, 0.0, -0.5, 1.0,
            ],
        );
        let off = numbers(
            &call(
                make_ortho_off_center,
                &[n(-2.0), n(2.0), n(-1.0), n(1.0), n(1.0), n(3.0)],
            )
            .unwrap(),
        );
        assert_close(&off, &m);
    }

    #[test]
    fn test_perspective_variants_agree() {
        let m = numbers(&call(make_perspective, &[n(2.0), n(2.0), n(1.0), n(3.0)]).unwrap());
        assert_close(
            &m,
            &[
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, -1.5, -1.0, //
                0.0, 0.0, -1.5, 0.0,
            ],
        );

        let off = numbers(
            &call(
                make_perspective_off_center,
                &[n(-1.0), n(1.0), n(-1.0), n(1.0), n(1.0), n(3.0)],
            )
            .unwrap(),
        );
        assert_close(&off, &m);

        let fov = numbers(&call(make_perspective_fov, &[n(FRAC_PI_2), n(1.0), n(1.0), n(3.0)]).unwrap());
        assert_close(&fov, &m);
    }

    #[test]
    fn test_perspective_rejects_bad_planes() {
        let err = call(make_perspective, &[n(2.0), n(2.0), n(0.0), n(3.0)]).unwrap_err();
        assert!(err.to_string().starts_with("bad argument #3"));

        let err = call(make_perspective_fov, &[n(1.0), n(1.0), n(5.0), n(3.0)]).unwrap_err();
        assert!(err.to_string().contains("less than far"));

        let err = call(make_perspective_fov, &[n(4.0), n(1.0), n(1.0), n(3.0)]).unwrap_err();
        assert!(err.to_string().starts_with("bad argument #1"));
    }

    #[test]
    fn test_reflection_through_ground_plane() {
        let plane = Value::Table(TableRef::from_numbers([0.0, 2.0, 0.0, 0.0]));
        let m = numbers(&call(make_reflection, &[plane]).unwrap());
        assert_close(
            &m,
            &[
                1.0, 0.0, 0.0, 0.0, //
                0.0, -1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        );
    }

    #[test]
    fn test_shadow_flattens_onto_plane() {
        let light = Value::Table(TableRef::from_numbers([0.0, 1.0, 0.0]));
        let plane = Value::Table(TableRef::from_numbers([0.0, 1.0, 0.0, 0.0]));
        let m = numbers(&call(make_shadow, &[light, plane]).unwrap());
        // dot = 1, so the Y column collapses
        assert_close(&m[0..4], &[1.0, 0.0, 0.0, 0.0]);
        assert_close(&m[4..8], &[0.0, 0.0, 0.0, 0.0]);
        assert_close(&m[12..16], &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_world_matrix() {
        let v3 = |x, y, z| Value::Table(TableRef::from_numbers([x, y, z]));
        let m = numbers(
            &call(
                make_world_matrix,
                &[v3(1.0, 2.0, 3.0), v3(0.0, 0.0, -1.0), v3(0.0, 1.0, 0.0)],
            )
            .unwrap(),
        );
        let mut expected = IDENTITY;
        expected[12..15].copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_close(&m, &expected);
    }

    #[test]
    fn test_billboard_faces_camera() {
        let v3 = |x, y, z| Value::Table(TableRef::from_numbers([x, y, z]));
        let m = numbers(
            &call(
                make_billboard,
                &[
                    v3(0.0, 0.0, 0.0),
                    v3(0.0, 0.0, 5.0),
                    v3(0.0, 1.0, 0.0),
                    v3(0.0, 0.0, -1.0),
                    v3(0.0, 0.0, -1.0),
                ],
            )
            .unwrap(),
        );
        assert_close(
            &m,
            &[
                -1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, -1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        );
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let v3 = |x, y, z| Value::Table(TableRef::from_numbers([x, y, z]));
        let m = numbers(
            &call(
                make_look_at,
                &[v3(0.0, 0.0, 5.0), v3(0.0, 0.0, 0.0), v3(0.0, 1.0, 0.0)],
            )
            .unwrap(),
        );
        let mut expected = IDENTITY;
        expected[14] = -5.0;
        assert_close(&m, &expected);
    }

    #[test]
    fn test_short_table_is_bad_argument() {
        let err = call(transpose, &[table(&[1.0, 2.0, 3.0, 4.0])]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad argument #1 to 'mat4.test' (Invalid mat4x4. 16 numeric elements required)"
        );
    }
}
