//! Software color + depth buffer and triangle scan conversion
//!
//! Storage is bottom-left origin: row 0 of the backing vectors holds the
//! bottom row of the image, while all pixel addressing is screen-space with
//! y growing downward. `save`/`load` and the pixel accessors all depend on
//! this flip staying exact.
//!
//! Depth convention: projected depth is the reciprocal of camera-space
//! depth, so *larger* stored values are nearer. The depth buffer is cleared
//! to a floor (0.0 for a full frame) and a write wins only when strictly
//! greater than the stored value.

use crate::camera::Camera;
use crate::error::Result;
use crate::light::Light;
use crate::math::{Aabb, M33, Vec3};
use crate::texture::Texture;
use crate::types::{Color, RasterSpace, RenderConfig, ShadingMode, Vertex};
use std::path::Path;

/// Minimum triangle area; anything smaller is skipped as degenerate.
const AREA_EPSILON: f32 = 1e-7;

pub struct Framebuffer {
    pix: Vec<u32>,
    zb: Vec<f32>,
    width: usize,
    height: usize,
}

/// Per-triangle state shared by both rasterization variants.
#[derive(Clone, Copy)]
struct TriangleSetup {
    pp0: Vec3,
    pp1: Vec3,
    pp2: Vec3,
    u_min: i32,
    u_max: i32,
    v_min: i32,
    v_max: i32,
    /// Signed doubled area of the projected triangle.
    denom: f32,
    /// Maps a pixel ray back to affine weights on the triangle plane.
    q: M33,
    /// World-space extent of one pixel along the image axes.
    ax: f32,
    ay: f32,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pix: vec![0; width * height],
            zb: vec![0.0; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw packed pixels, bottom row first.
    pub fn pixels(&self) -> &[u32] {
        &self.pix
    }

    fn index(&self, u: i32, v: i32) -> usize {
        debug_assert!(
            u >= 0 && (u as usize) < self.width && v >= 0 && (v as usize) < self.height,
            "pixel ({u}, {v}) out of range"
        );
        (self.height - 1 - v as usize) * self.width + u as usize
    }

    /// Read one pixel; the caller guarantees `(u, v)` is in range.
    pub fn pixel(&self, u: i32, v: i32) -> Color {
        Color::from_u32(self.pix[self.index(u, v)])
    }

    /// Read one depth cell; the caller guarantees `(u, v)` is in range.
    pub fn depth(&self, u: i32, v: i32) -> f32 {
        self.zb[self.index(u, v)]
    }

    /// Set every pixel to `color`; the depth buffer is untouched.
    pub fn clear(&mut self, color: Color) {
        self.pix.fill(color.to_u32());
    }

    /// Reset every depth cell to `z0`. A full frame clears to 0.0 so any
    /// projected depth (always positive) passes the first test.
    pub fn clear_depth(&mut self, z0: f32) {
        self.zb.fill(z0);
    }

    /// Unconditional write; the caller guarantees `(u, v)` is in range.
    pub fn set_pixel(&mut self, u: i32, v: i32, color: Color) {
        let idx = self.index(u, v);
        self.pix[idx] = color.to_u32();
    }

    /// Depth-tested write: only a strictly greater `z` lands.
    pub fn set_pixel_depth(&mut self, u: i32, v: i32, color: Color, z: f32) {
        let idx = self.index(u, v);
        if self.zb[idx] >= z {
            return;
        }
        self.pix[idx] = color.to_u32();
        self.zb[idx] = z;
    }

    /// As `set_pixel_depth`, but silently discards out-of-range pixels.
    pub fn set_pixel_guarded(&mut self, u: i32, v: i32, color: Color, z: f32) {
        if u < 0 || u >= self.width as i32 || v < 0 || v >= self.height as i32 {
            return;
        }
        self.set_pixel_depth(u, v, color, z);
    }

    /// Walk from `p0` to `p1` with one sample per covered row/column,
    /// linearly interpolating position and color. Writes go through the
    /// guarded, depth-tested path; `z` comes from the interpolated third
    /// component.
    pub fn draw_segment_2d(&mut self, p0: Vec3, c0: Vec3, p1: Vec3, c1: Vec3) {
        let dx = (p0.x - p1.x).abs();
        let dy = (p0.y - p1.y).abs();
        let n = 1 + if dx < dy { dy as i32 } else { dx as i32 };

        for i in 0..=n {
            let frac = i as f32 / n as f32;
            let curr = p0 + (p1 - p0) * frac;
            let currc = c0 + (c1 - c0) * frac;
            self.set_pixel_guarded(curr.x as i32, curr.y as i32, Color::from_vec(currc), curr.z);
        }
    }

    /// Project both endpoints and draw; a segment with either endpoint
    /// behind the camera is discarded whole, with no partial clipping.
    pub fn draw_segment_3d<C: Camera + ?Sized>(
        &mut self,
        cam: &C,
        p0: Vec3,
        c0: Vec3,
        p1: Vec3,
        c1: Vec3,
    ) {
        let Some(pp0) = cam.project(p0) else { return };
        let Some(pp1) = cam.project(p1) else { return };
        self.draw_segment_2d(pp0, c0, pp1, c1);
    }

    /// Shared front half of both rasterizers: degeneracy guard, projection,
    /// clipped bounding box and the plane-reconstruction matrix. `None`
    /// means the triangle produces no pixels.
    fn triangle_setup<C: Camera + ?Sized>(
        &self,
        cam: &C,
        cam_mat: &M33,
        v0: &Vertex,
        v1: &Vertex,
        v2: &Vertex,
    ) -> Option<TriangleSetup> {
        if (v1.pos - v0.pos).cross(v2.pos - v0.pos).len() < AREA_EPSILON {
            return None;
        }

        // Whole-primitive rejection: no clipping against the near plane.
        let pp0 = cam.project(v0.pos)?;
        let pp1 = cam.project(v1.pos)?;
        let pp2 = cam.project(v2.pos)?;

        let mut bbox = Aabb::new();
        bbox.add_point(pp0);
        bbox.add_point(pp1);
        bbox.add_point(pp2);

        // Pixels whose centers fall inside the box, clipped to the grid.
        let u_min = ((bbox.min_corner().x + 0.5) as i32).max(0);
        let u_max = ((bbox.max_corner().x - 0.5) as i32).min(self.width as i32 - 1);
        let v_min = ((bbox.min_corner().y + 0.5) as i32).max(0);
        let v_max = ((bbox.max_corner().y - 0.5) as i32).min(self.height as i32 - 1);
        if u_min > u_max || v_min > v_max {
            return None;
        }

        let denom = (pp1 - pp0).cross(pp2 - pp0).z;
        if denom.abs() < AREA_EPSILON {
            return None;
        }

        let eye = cam.eye();
        let verts = M33::from_columns(v0.pos - eye, v1.pos - eye, v2.pos - eye);
        let q = verts.inverted()? * *cam_mat;

        let (ax, ay) = cam.pixel_scale();

        Some(TriangleSetup {
            pp0,
            pp1,
            pp2,
            u_min,
            u_max,
            v_min,
            v_max,
            denom,
            q,
            ax,
            ay,
        })
    }

    /// Per-pixel depth and attribute-weight resolution. Returns
    /// `(depth, s, t, plane point)` with the weights already swapped to
    /// the perspective-correct pair in model-space mode, or `None` when
    /// the pixel is rejected or loses the depth test.
    #[allow(clippy::too_many_arguments)]
    fn resolve_pixel<C: Camera + ?Sized>(
        &self,
        setup: &TriangleSetup,
        cam: &C,
        cfg: &RenderConfig,
        u: i32,
        v: i32,
        v0: &Vertex,
        v1: &Vertex,
        v2: &Vertex,
    ) -> Option<(f32, f32, f32, Vec3)> {
        let TriangleSetup { pp0, pp1, pp2, denom, q, ax, ay, .. } = *setup;

        let pp = Vec3::new((u as f32 + 0.5) * ax, (v as f32 + 0.5) * ay, 0.0);

        // Cheap screen-space weights, used only as the inside test (and as
        // the attribute weights in screen-space mode).
        let s = (pp - pp0).cross(pp2 - pp0).z / denom;
        let t = -((pp - pp0).cross(pp1 - pp0)).z / denom;
        if s < 0.0 || s > 1.0 || t < 0.0 || t > 1.0 || s + t > 1.0 {
            return None;
        }

        // Perspective-correct weights from the pixel ray.
        let a = q * Vec3::new(u as f32 + 0.5, v as f32 + 0.5, 1.0);
        let wsum = a.x + a.y + a.z;
        let s2 = a.y / wsum;
        let t2 = a.z / wsum;

        // The corresponding point on the triangle's supporting plane.
        let p = v0.pos * (1.0 - s2 - t2) + v1.pos * s2 + v2.pos * t2;

        let (depth, s, t) = match cfg.space {
            RasterSpace::Model => {
                // Re-projection may fail when the plane point falls behind
                // the camera; the pixel is skipped.
                let rp = cam.project(p)?;
                (rp.z, s2, t2)
            }
            RasterSpace::Screen => {
                let z = pp0.z * (1.0 - s - t) + pp1.z * s + pp2.z * t;
                if z <= 0.0 {
                    return None;
                }
                (z, s, t)
            }
        };

        if self.zb[self.index(u, v)] >= depth {
            return None;
        }

        Some((depth, s, t, p))
    }

    /// Scan-convert one untextured triangle with Gouraud or Phong shading.
    pub fn rasterize<C, L>(
        &mut self,
        cam: &C,
        cam_mat: &M33,
        v0: &Vertex,
        v1: &Vertex,
        v2: &Vertex,
        light: &L,
        cfg: &RenderConfig,
    ) where
        C: Camera + ?Sized,
        L: Light + ?Sized,
    {
        let Some(setup) = self.triangle_setup(cam, cam_mat, v0, v1, v2) else {
            return;
        };

        let eye = cam.eye();

        // Gouraud lights the three vertices once, up front.
        let (c0, c1, c2) = if cfg.shading == ShadingMode::Gouraud {
            (
                light.get_color(eye, v0.pos, v0.color, v0.normal),
                light.get_color(eye, v1.pos, v1.color, v1.normal),
                light.get_color(eye, v2.pos, v2.color, v2.normal),
            )
        } else {
            (Vec3::ZERO, Vec3::ZERO, Vec3::ZERO)
        };

        for u in setup.u_min..=setup.u_max {
            for v in setup.v_min..=setup.v_max {
                let Some((depth, s, t, p)) =
                    self.resolve_pixel(&setup, cam, cfg, u, v, v0, v1, v2)
                else {
                    continue;
                };

                let c = match cfg.shading {
                    ShadingMode::Phong => {
                        let base =
                            v0.color * (1.0 - s - t) + v1.color * s + v2.color * t;
                        let n =
                            v0.normal * (1.0 - s - t) + v1.normal * s + v2.normal * t;
                        light.get_color(eye, p, base, n)
                    }
                    ShadingMode::Gouraud => c0 * (1.0 - s - t) + c1 * s + c2 * t,
                };

                self.set_pixel_depth(u, v, Color::from_vec(c), depth);
            }
        }
    }

    /// Scan-convert one textured triangle. The mip level pair is chosen
    /// once per triangle from the pixel and texture-coordinate footprints,
    /// not per pixel; there is no lighting step.
    pub fn rasterize_with_texture<C>(
        &mut self,
        cam: &C,
        cam_mat: &M33,
        v0: &Vertex,
        v1: &Vertex,
        v2: &Vertex,
        texture: &Texture,
        cfg: &RenderConfig,
    ) where
        C: Camera + ?Sized,
    {
        let Some(setup) = self.triangle_setup(cam, cam_mat, v0, v1, v2) else {
            return;
        };

        let ds_min = v0.uv.x.min(v1.uv.x).min(v2.uv.x);
        let ds_max = v0.uv.x.max(v1.uv.x).max(v2.uv.x);
        let dt_min = v0.uv.y.min(v1.uv.y).min(v2.uv.y);
        let dt_max = v0.uv.y.max(v1.uv.y).max(v2.uv.y);

        let sel = texture.select_mip_levels(
            setup.u_max - setup.u_min,
            setup.v_max - setup.v_min,
            ds_max - ds_min,
            dt_max - dt_min,
        );

        for u in setup.u_min..=setup.u_max {
            for v in setup.v_min..=setup.v_max {
                let Some((depth, s, t, _p)) =
                    self.resolve_pixel(&setup, cam, cfg, u, v, v0, v1, v2)
                else {
                    continue;
                };

                let tx = v0.uv.x * (1.0 - s - t) + v1.uv.x * s + v2.uv.x * t;
                let ty = v0.uv.y * (1.0 - s - t) + v1.uv.y * s + v2.uv.y * t;
                let c = texture.get_color(sel, tx, ty);

                self.set_pixel_depth(u, v, Color::from_vec(c), depth);
            }
        }
    }

    /// Encode to an image file (format by extension). Storage is
    /// bottom-left; files are written top-down, so rows flip once here.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut raw = Vec::with_capacity(self.width * self.height * 4);
        for v in 0..self.height {
            let base = (self.height - 1 - v) * self.width;
            for u in 0..self.width {
                let c = Color::from_u32(self.pix[base + u]);
                raw.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
        }
        image::save_buffer(
            path,
            &raw,
            self.width as u32,
            self.height as u32,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }

    /// Decode an image file into the color buffer, resizing to match and
    /// undoing the row flip applied by `save`. The depth buffer is reset
    /// to zero.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let img = image::open(path)?.to_rgba8();
        let (w, h) = img.dimensions();

        self.width = w as usize;
        self.height = h as usize;
        self.pix = vec![0; self.width * self.height];
        self.zb = vec![0.0; self.width * self.height];

        for (y, row) in img.rows().enumerate() {
            let base = (self.height - 1 - y) * self.width;
            for (x, p) in row.enumerate() {
                self.pix[base + x] =
                    Color { r: p[0], g: p[1], b: p[2], a: p[3] }.to_u32();
            }
        }
        Ok(())
    }
}
