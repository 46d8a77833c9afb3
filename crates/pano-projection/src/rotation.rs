//! Rotation state and rotation matrix
//!
//! The rotation is three angles in degrees. Each transform rebuilds the
//! shader matrix from scratch as
//!
//! ```text
//! M = I · Rx(x) · Ry(-y) · Rz(-z)
//! ```
//!
//! using post-multiplication on a column-major 4×4 matrix. Axis order and the
//! sign inversion of the Y and Z angles are part of the camera rig's
//! calibration and must not change.
//!
//! # Concurrency
//!
//! [`RotationHandle`] lets another thread update the angles while frames are
//! being transformed. Each angle is stored in its own atomic, so a reader
//! racing a writer may observe a mix of old and new angles for one frame,
//! but always valid floats.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Three-axis rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    /// Rotation about X (degrees)
    pub x_deg: f32,
    /// Rotation about Y (degrees)
    pub y_deg: f32,
    /// Rotation about Z (degrees)
    pub z_deg: f32,
}

impl Rotation {
    /// Create a rotation from degrees
    pub const fn new(x_deg: f32, y_deg: f32, z_deg: f32) -> Self {
        Self { x_deg, y_deg, z_deg }
    }

    /// Angles converted to radians, in (x, y, z) order
    pub fn radians(&self) -> (f32, f32, f32) {
        (
            deg_to_rad(self.x_deg),
            deg_to_rad(self.y_deg),
            deg_to_rad(self.z_deg),
        )
    }

    /// Build the shader rotation matrix
    pub fn matrix(&self) -> Mat4 {
        let (x_rad, y_rad, z_rad) = self.radians();
        Mat4::identity().rotate_x(x_rad).rotate_y(-y_rad).rotate_z(-z_rad)
    }
}

fn deg_to_rad(deg: f32) -> f32 {
    (f64::from(deg) * std::f64::consts::PI / 180.0) as f32
}

fn sin_cos(rad: f32) -> (f32, f32) {
    let rad = f64::from(rad);
    (rad.sin() as f32, rad.cos() as f32)
}

/// Column-major 4×4 matrix, laid out as the shader expects it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4(pub [f32; 16]);

impl Mat4 {
    /// Identity matrix
    pub const fn identity() -> Self {
        Self([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Raw column-major elements
    pub fn as_array(&self) -> &[f32; 16] {
        &self.0
    }

    /// Element at `row`, `col`
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.0[col * 4 + row]
    }

    /// `self · Rx(rad)`
    #[must_use]
    pub fn rotate_x(self, rad: f32) -> Self {
        let (s, c) = sin_cos(rad);
        let a = self.0;
        let mut out = a;
        for i in 0..4 {
            let a1 = a[4 + i];
            let a2 = a[8 + i];
            out[4 + i] = a1 * c + a2 * s;
            out[8 + i] = a2 * c - a1 * s;
        }
        Self(out)
    }

    /// `self · Ry(rad)`
    #[must_use]
    pub fn rotate_y(self, rad: f32) -> Self {
        let (s, c) = sin_cos(rad);
        let a = self.0;
        let mut out = a;
        for i in 0..4 {
            let a0 = a[i];
            let a2 = a[8 + i];
            out[i] = a0 * c - a2 * s;
            out[8 + i] = a0 * s + a2 * c;
        }
        Self(out)
    }

    /// `self · Rz(rad)`
    #[must_use]
    pub fn rotate_z(self, rad: f32) -> Self {
        let (s, c) = sin_cos(rad);
        let a = self.0;
        let mut out = a;
        for i in 0..4 {
            let a0 = a[i];
            let a1 = a[4 + i];
            out[i] = a0 * c + a1 * s;
            out[4 + i] = a1 * c - a0 * s;
        }
        Self(out)
    }

    /// Matrix product `self · rhs`
    #[must_use]
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| self.get(row, k) * rhs.get(k, col)).sum();
            }
        }
        Self(out)
    }

    /// Transform a direction (w = 0)
    pub fn transform_vector(&self, v: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0f32; 3];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = self.get(row, 0) * v[0] + self.get(row, 1) * v[1] + self.get(row, 2) * v[2];
        }
        out
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

/// Shared, lock-free rotation storage
#[derive(Debug, Default)]
struct RotationCell {
    x: AtomicU32,
    y: AtomicU32,
    z: AtomicU32,
}

impl RotationCell {
    fn store(&self, rotation: Rotation) {
        self.x.store(rotation.x_deg.to_bits(), Ordering::Relaxed);
        self.y.store(rotation.y_deg.to_bits(), Ordering::Relaxed);
        self.z.store(rotation.z_deg.to_bits(), Ordering::Relaxed);
    }

    fn load(&self) -> Rotation {
        Rotation {
            x_deg: f32::from_bits(self.x.load(Ordering::Relaxed)),
            y_deg: f32::from_bits(self.y.load(Ordering::Relaxed)),
            z_deg: f32::from_bits(self.z.load(Ordering::Relaxed)),
        }
    }
}

/// Cloneable handle to an engine's rotation state
///
/// Writes are not validated and have no side effects beyond the stored
/// angles. They take effect on the next transform.
#[derive(Debug, Clone, Default)]
pub struct RotationHandle {
    cell: Arc<RotationCell>,
}

impl RotationHandle {
    /// Create a handle holding `rotation`
    pub fn new(rotation: Rotation) -> Self {
        let handle = Self::default();
        handle.set(rotation);
        handle
    }

    /// Overwrite all three angles
    pub fn set(&self, rotation: Rotation) {
        self.cell.store(rotation);
    }

    /// Overwrite all three angles from degrees
    pub fn set_degrees(&self, x_deg: f32, y_deg: f32, z_deg: f32) {
        self.set(Rotation::new(x_deg, y_deg, z_deg));
    }

    /// Current angles
    pub fn get(&self) -> Rotation {
        self.cell.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rx(rad: f32) -> Mat4 {
        let (s, c) = sin_cos(rad);
        // column-major: column 1 = (0, c, s, 0), column 2 = (0, -s, c, 0)
        Mat4([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, -s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    fn ry(rad: f32) -> Mat4 {
        let (s, c) = sin_cos(rad);
        Mat4([
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    fn rz(rad: f32) -> Mat4 {
        let (s, c) = sin_cos(rad);
        Mat4([
            c, s, 0.0, 0.0, //
            -s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    fn assert_close(a: &Mat4, b: &Mat4) {
        for (i, (x, y)) in a.0.iter().zip(b.0.iter()).enumerate() {
            assert!((x - y).abs() < 1e-5, "element {} differs: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn test_identity_rotation() {
        assert_eq!(Rotation::default().matrix(), Mat4::identity());
    }

    #[test]
    fn test_matrix_matches_composition() {
        let samples = [
            Rotation::new(0.0, 0.0, 0.0),
            Rotation::new(90.0, 0.0, 0.0),
            Rotation::new(0.0, 45.0, 0.0),
            Rotation::new(0.0, 0.0, -30.0),
            Rotation::new(12.5, -77.0, 180.0),
            Rotation::new(-360.0, 720.0, 33.3),
        ];

        for rotation in samples {
            let (x, y, z) = rotation.radians();
            let expected = Mat4::identity().multiply(&rx(x)).multiply(&ry(-y)).multiply(&rz(-z));
            assert_close(&rotation.matrix(), &expected);
        }
    }

    #[test]
    fn test_axis_order_and_signs() {
        // X is applied with its own sign
        let m = Rotation::new(90.0, 0.0, 0.0).matrix();
        let v = m.transform_vector([0.0, 1.0, 0.0]);
        assert!((v[2] - 1.0).abs() < 1e-6);

        // Y is inverted: +90 about Y maps +Z to -X
        let m = Rotation::new(0.0, 90.0, 0.0).matrix();
        let v = m.transform_vector([0.0, 0.0, 1.0]);
        assert!((v[0] + 1.0).abs() < 1e-6);

        // Z is inverted: +90 about Z maps +X to -Y
        let m = Rotation::new(0.0, 0.0, 90.0).matrix();
        let v = m.transform_vector([1.0, 0.0, 0.0]);
        assert!((v[1] + 1.0).abs() < 1e-6);

        // Order matters: the X-then-Y composition differs from Y-then-X
        let (x, y, _) = Rotation::new(40.0, 70.0, 0.0).radians();
        let swapped = Mat4::identity().rotate_y(-y).rotate_x(x);
        assert_ne!(Rotation::new(40.0, 70.0, 0.0).matrix(), swapped);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let rotation = Rotation::new(10.0, 20.0, 30.0);
        let first = rotation.matrix();
        let _ = Rotation::new(-90.0, 5.0, 1.0).matrix();
        assert_eq!(rotation.matrix(), first);
    }

    #[test]
    fn test_matrix_is_orthonormal() {
        let m = Rotation::new(33.0, -12.0, 150.0).matrix();
        for col in 0..3 {
            let len: f32 = (0..3).map(|row| m.get(row, col).powi(2)).sum();
            assert!((len - 1.0).abs() < 1e-5);
        }
        assert_eq!(m.get(3, 3), 1.0);
    }

    #[test]
    fn test_handle_roundtrip() {
        let handle = RotationHandle::new(Rotation::new(1.0, 2.0, 3.0));
        let clone = handle.clone();
        clone.set_degrees(-4.0, 5.5, 6.25);
        assert_eq!(handle.get(), Rotation::new(-4.0, 5.5, 6.25));
    }

    #[test]
    fn test_handle_concurrent_writes_stay_valid() {
        let handle = RotationHandle::default();
        let writer = handle.clone();

        let thread = std::thread::spawn(move || {
            for i in 0..10_000 {
                let v = (i % 360) as f32;
                writer.set_degrees(v, -v, v * 0.5);
            }
        });

        for _ in 0..10_000 {
            let r = handle.get();
            assert!(r.x_deg.is_finite() && r.y_deg.is_finite() && r.z_deg.is_finite());
            let m = r.matrix();
            assert!(m.0.iter().all(|v| v.is_finite()));
        }

        thread.join().expect("writer thread");
    }
}
