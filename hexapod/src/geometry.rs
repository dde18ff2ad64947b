//! Geometry primitives: elementary rotations, their fixed composition order,
//! point-set rotation and distances.

use nalgebra::{Matrix3, Point3, Rotation3};

use crate::angles::{Radians, RollPitchYaw};

/// Rotation about X.
pub fn rot_x(angle: Radians) -> Matrix3<f64> {
    let (s, c) = angle.0.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, c, -s,
        0.0, s, c,
    )
}

/// Rotation about Y.
pub fn rot_y(angle: Radians) -> Matrix3<f64> {
    let (s, c) = angle.0.sin_cos();
    Matrix3::new(
        c, 0.0, s,
        0.0, 1.0, 0.0,
        -s, 0.0, c,
    )
}

/// Rotation about Z.
pub fn rot_z(angle: Radians) -> Matrix3<f64> {
    let (s, c) = angle.0.sin_cos();
    Matrix3::new(
        c, -s, 0.0,
        s, c, 0.0,
        0.0, 0.0, 1.0,
    )
}

fn d_rot_x(angle: Radians) -> Matrix3<f64> {
    let (s, c) = angle.0.sin_cos();
    Matrix3::new(
        0.0, 0.0, 0.0,
        0.0, -s, -c,
        0.0, c, -s,
    )
}

fn d_rot_y(angle: Radians) -> Matrix3<f64> {
    let (s, c) = angle.0.sin_cos();
    Matrix3::new(
        -s, 0.0, c,
        0.0, 0.0, 0.0,
        -c, 0.0, -s,
    )
}

fn d_rot_z(angle: Radians) -> Matrix3<f64> {
    let (s, c) = angle.0.sin_cos();
    Matrix3::new(
        -s, -c, 0.0,
        c, -s, 0.0,
        0.0, 0.0, 0.0,
    )
}

/// Platform rotation for an orientation: `R = Rz(yaw) · Ry(pitch) · Rx(roll)`.
///
/// The composition order is fixed; lengths recorded against one order are
/// meaningless under another.
pub fn rotation_matrix(rpy: &RollPitchYaw) -> Rotation3<f64> {
    let m = rot_z(rpy.yaw) * rot_y(rpy.pitch) * rot_x(rpy.roll);
    Rotation3::from_matrix_unchecked(m)
}

/// Partial derivatives of [`rotation_matrix`] with respect to roll, pitch and
/// yaw, in that order.
pub fn rotation_partials(rpy: &RollPitchYaw) -> [Matrix3<f64>; 3] {
    let rx = rot_x(rpy.roll);
    let ry = rot_y(rpy.pitch);
    let rz = rot_z(rpy.yaw);
    [
        rz * ry * d_rot_x(rpy.roll),
        rz * d_rot_y(rpy.pitch) * rx,
        d_rot_z(rpy.yaw) * ry * rx,
    ]
}

/// Applies `p' = R·p` to every point, keeping order and count.
pub fn rotate_points<const N: usize>(
    points: &[Point3<f64>; N],
    rotation: &Rotation3<f64>,
) -> [Point3<f64>; N] {
    points.map(|p| rotation.transform_point(&p))
}

/// Euclidean distance between two points.
pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    nalgebra::distance(a, b)
}
