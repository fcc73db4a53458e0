//! Vector and matrix math for the rendering pipeline

use serde::{Deserialize, Serialize};
use std::ops::{Add, Index, Mul, Neg, Sub};

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l == 0.0 {
            return Vec3::ZERO;
        }
        Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        }
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Rotate this point about an axis through `pivot` by `angle` radians
    /// (Rodrigues' formula; the axis need not be normalized).
    pub fn rotate_about(self, axis: Vec3, angle: f32, pivot: Vec3) -> Vec3 {
        let k = axis.normalize();
        let v = self - pivot;
        let (sin, cos) = angle.sin_cos();
        let rotated = v.scale(cos) + k.cross(v).scale(sin) + k.scale(k.dot(v) * (1.0 - cos));
        pivot + rotated
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

impl Index<usize> for Vec3 {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of range: {i}"),
        }
    }
}

/// 2D Vector (texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 3x3 matrix, stored as rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct M33 {
    pub rows: [Vec3; 3],
}

impl M33 {
    pub const IDENTITY: M33 = M33 {
        rows: [
            Vec3 { x: 1.0, y: 0.0, z: 0.0 },
            Vec3 { x: 0.0, y: 1.0, z: 0.0 },
            Vec3 { x: 0.0, y: 0.0, z: 1.0 },
        ],
    };

    pub fn from_columns(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self {
            rows: [
                Vec3::new(c0.x, c1.x, c2.x),
                Vec3::new(c0.y, c1.y, c2.y),
                Vec3::new(c0.z, c1.z, c2.z),
            ],
        }
    }

    pub fn column(&self, i: usize) -> Vec3 {
        Vec3::new(self.rows[0][i], self.rows[1][i], self.rows[2][i])
    }

    pub fn det(&self) -> f32 {
        let [r0, r1, r2] = self.rows;
        r0.dot(r1.cross(r2))
    }

    /// Returns `None` when the matrix is singular.
    pub fn inverted(&self) -> Option<M33> {
        let d = self.det();
        if d.abs() < 1e-12 {
            return None;
        }
        let c0 = self.column(0);
        let c1 = self.column(1);
        let c2 = self.column(2);
        // Rows of the inverse are the scaled reciprocal basis vectors.
        Some(M33 {
            rows: [
                c1.cross(c2).scale(1.0 / d),
                c2.cross(c0).scale(1.0 / d),
                c0.cross(c1).scale(1.0 / d),
            ],
        })
    }
}

impl Mul<Vec3> for M33 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        Vec3::new(self.rows[0].dot(v), self.rows[1].dot(v), self.rows[2].dot(v))
    }
}

impl Mul<M33> for M33 {
    type Output = M33;
    fn mul(self, other: M33) -> M33 {
        M33::from_columns(
            self * other.column(0),
            self * other.column(1),
            self * other.column(2),
        )
    }
}

/// Axis aligned bounding box, grown one point at a time.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    pub fn new() -> Self {
        Self {
            min: Vec3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Vec3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    pub fn add_point(&mut self, p: Vec3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn min_corner(&self) -> Vec3 {
        self.min
    }

    pub fn max_corner(&self) -> Vec3 {
        self.max
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert!((a.dot(b) - 32.0).abs() < 0.001);
    }

    #[test]
    fn test_vec3_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = a.cross(b);
        assert!((c.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_rotate_about_quarter_turn() {
        let p = Vec3::new(1.0, 0.0, 0.0);
        let r = p.rotate_about(Vec3::new(0.0, 0.0, 1.0), std::f32::consts::FRAC_PI_2, Vec3::ZERO);
        assert!((r.x).abs() < 1e-5);
        assert!((r.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rotate_about_pivot() {
        let p = Vec3::new(2.0, 0.0, 0.0);
        let r = p.rotate_about(Vec3::new(0.0, 0.0, 1.0), std::f32::consts::PI, Vec3::new(1.0, 0.0, 0.0));
        assert!((r.x).abs() < 1e-5);
        assert!((r.y).abs() < 1e-5);
    }

    #[test]
    fn test_m33_inverse() {
        let m = M33::from_columns(
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
        );
        let inv = m.inverted().unwrap();
        let id = m * inv;
        for i in 0..3 {
            for j in 0..3 {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert!((id.rows[i][j] - expect).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_m33_singular() {
        let m = M33::from_columns(Vec3::ONE, Vec3::ONE, Vec3::new(0.0, 1.0, 2.0));
        assert!(m.inverted().is_none());
    }

    #[test]
    fn test_aabb_grow() {
        let mut b = Aabb::new();
        b.add_point(Vec3::new(-1.0, 2.0, 0.0));
        b.add_point(Vec3::new(3.0, -2.0, 5.0));
        assert_eq!(b.min_corner(), Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.size(), Vec3::new(4.0, 4.0, 5.0));
    }
}
