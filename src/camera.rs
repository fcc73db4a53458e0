//! Planar pinhole camera
//!
//! The rasterizer only needs the small [`Camera`] surface: a projection,
//! the eye position, and the image-plane basis. [`Pinhole`] is the concrete
//! model used by the demo driver and the tests.

use crate::math::{M33, Vec3};
use log::warn;

/// What the rasterizer requires of a camera.
pub trait Camera {
    /// Project a world-space point to `(pixel x, pixel y, 1/depth)`.
    /// Returns `None` when the point is at or behind the eye plane.
    fn project(&self, p: Vec3) -> Option<Vec3>;

    /// Eye position.
    fn eye(&self) -> Vec3;

    /// Image-plane basis `[a | b | c]` as matrix columns: `a` spans one
    /// pixel to the right, `b` one pixel down, `c` points at the top-left
    /// corner of the image plane.
    fn basis(&self) -> M33;

    /// World-space extent of one pixel along the two image axes.
    fn pixel_scale(&self) -> (f32, f32) {
        let m = self.basis();
        (m.column(0).len(), m.column(1).len())
    }
}

/// Planar pinhole camera with a y-down image plane.
///
/// The projected `z` is the reciprocal of camera-space depth, so nearer
/// points carry *larger* values; the depth buffer convention follows.
#[derive(Debug, Clone)]
pub struct Pinhole {
    a: Vec3,
    b: Vec3,
    c: Vec3,
    eye: Vec3,
    focal: f32,
    width: usize,
    height: usize,
    inv: M33,
}

impl Pinhole {
    /// Camera at the origin looking down -z, `hfov` in degrees.
    pub fn new(hfov: f32, width: usize, height: usize) -> Self {
        let w = width as f32;
        let h = height as f32;
        let focal = (w / 2.0) / (hfov.to_radians() / 2.0).tan();
        let mut cam = Self {
            a: Vec3::new(1.0, 0.0, 0.0),
            b: Vec3::new(0.0, -1.0, 0.0),
            c: Vec3::new(-w / 2.0, h / 2.0, -focal),
            eye: Vec3::ZERO,
            focal,
            width,
            height,
            inv: M33::IDENTITY,
        };
        cam.update_inverse();
        cam
    }

    /// Place the camera `distance` away from `target` along `-view_dir`,
    /// keeping the current focal length. A `view_dir` parallel to `up`
    /// leaves the pose unchanged.
    pub fn look_at(&mut self, target: Vec3, view_dir: Vec3, up: Vec3, distance: f32) {
        let vd = view_dir.normalize();
        let right = vd.cross(up);
        if right.len() == 0.0 {
            warn!("look_at: view direction parallel to up vector, pose unchanged");
            return;
        }
        let a = right.normalize().scale(self.a.len());
        let b = vd.cross(a).normalize().scale(self.b.len());

        self.eye = target - vd.scale(distance);
        self.c = vd.scale(self.focal)
            - a.scale(self.width as f32 / 2.0)
            - b.scale(self.height as f32 / 2.0);
        self.a = a;
        self.b = b;
        self.update_inverse();
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn update_inverse(&mut self) {
        match M33::from_columns(self.a, self.b, self.c).inverted() {
            Some(inv) => self.inv = inv,
            None => warn!("degenerate camera basis, projection unusable"),
        }
    }
}

impl Camera for Pinhole {
    fn project(&self, p: Vec3) -> Option<Vec3> {
        let q = self.inv * (p - self.eye);
        if q.z <= 0.0 {
            return None;
        }
        Some(Vec3::new(q.x / q.z, q.y / q.z, 1.0 / q.z))
    }

    fn eye(&self) -> Vec3 {
        self.eye
    }

    fn basis(&self) -> M33 {
        M33::from_columns(self.a, self.b, self.c)
    }
}
