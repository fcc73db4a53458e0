//! Mip-mapped texture sampling
//!
//! A [`Texture`] owns a pyramid of images: level 0 is the decoded source,
//! every further level is the source box-filtered down to half the linear
//! size. Each level is filtered from level 0 directly rather than from the
//! previous level, so filter error does not compound.
//!
//! Level selection is a pure function returning a [`MipSelection`], which
//! the caller threads into [`Texture::get_color`]; the sampler itself holds
//! no per-triangle state.

use crate::error::Result;
use crate::math::Vec3;
use crate::types::Color;
use std::path::Path;

/// One image of the pyramid.
#[derive(Debug, Clone)]
pub struct MipLevel {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl MipLevel {
    fn texel(&self, x: usize, y: usize) -> Vec3 {
        Color::from_u32(self.pixels[y * self.width + x]).to_vec()
    }

    /// Bilinear lookup at continuous texel coordinates. Texel `(0, 0)` is
    /// centered at `(0.5, 0.5)`; coordinates below the first center sample
    /// only that texel, and the right/bottom neighbor clamps to the edge.
    fn bilinear(&self, x: f32, y: f32) -> Vec3 {
        let (x0, s) = if x < 0.5 {
            (0, 0.0)
        } else {
            let x0 = (x - 0.5) as usize;
            (x0, x - x0 as f32 - 0.5)
        };
        let (y0, t) = if y < 0.5 {
            (0, 0.0)
        } else {
            let y0 = (y - 0.5) as usize;
            (y0, y - y0 as f32 - 0.5)
        };

        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let c0 = self.texel(x0, y0);
        let c1 = self.texel(x1, y0);
        let c2 = self.texel(x1, y1);
        let c3 = self.texel(x0, y1);

        c0.scale((1.0 - s) * (1.0 - t))
            + c1.scale(s * (1.0 - t))
            + c2.scale(s * t)
            + c3.scale((1.0 - s) * t)
    }
}

/// A pair of adjacent pyramid levels plus the blend between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MipSelection {
    pub finer: usize,
    pub coarser: usize,
    /// Weight of the coarser level; 0.0 samples only the finer one.
    pub blend: f32,
}

impl MipSelection {
    /// Full-resolution sampling, used when no footprint is known.
    pub const FULL: MipSelection = MipSelection {
        finer: 0,
        coarser: 0,
        blend: 0.0,
    };
}

/// Mip-map image pyramid with trilinear sampling.
#[derive(Debug, Clone)]
pub struct Texture {
    levels: Vec<MipLevel>,
}

impl Texture {
    /// Build a texture (and its full pyramid) from packed RGBA pixels in
    /// bottom-left row order.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Self {
        assert_eq!(pixels.len(), width * height);
        let mut tex = Self {
            levels: vec![MipLevel { width, height, pixels }],
        };
        tex.build_mip_chain();
        tex
    }

    /// Decode an image file into level 0. File rows are top-down; storage
    /// is bottom-left like the framebuffer, so rows are flipped here.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path)?;
        Ok(Self::from_image(&img))
    }

    pub fn from_image(img: &image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        let mut pixels = vec![0u32; (w * h) as usize];
        for (y, row) in rgba.rows().enumerate() {
            let base = (h as usize - 1 - y) * w as usize;
            for (x, p) in row.enumerate() {
                pixels[base + x] =
                    Color { r: p[0], g: p[1], b: p[2], a: p[3] }.to_u32();
            }
        }
        Self::from_pixels(w as usize, h as usize, pixels)
    }

    /// Procedural checker texture for demos and tests.
    pub fn checkerboard(width: usize, height: usize, cell: usize, c0: Color, c1: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.push(if even { c0 } else { c1 }.to_u32());
            }
        }
        Self::from_pixels(width, height, pixels)
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    /// Halve width and height until either dimension would drop below one
    /// texel, filtering each level from the full-resolution source.
    fn build_mip_chain(&mut self) {
        let w0 = self.levels[0].width;
        let h0 = self.levels[0].height;

        let mut w = w0 / 2;
        let mut h = h0 / 2;
        while w >= 1 && h >= 1 {
            let scale_x = w0 as f32 / w as f32;
            let scale_y = h0 as f32 / h as f32;

            let mut pixels = Vec::with_capacity(w * h);
            for i in 0..h {
                for j in 0..w {
                    let x = (j as f32 + 0.5) * scale_x;
                    let y = (i as f32 + 0.5) * scale_y;
                    let c = self.levels[0].bilinear(x, y);
                    pixels.push(Color::from_vec(c).to_u32());
                }
            }
            self.levels.push(MipLevel { width: w, height: h, pixels });

            w /= 2;
            h /= 2;
        }
    }

    /// Choose the two pyramid levels bracketing the resolution a triangle
    /// needs: `pixel_w`/`pixel_h` is its on-screen footprint, `ds`/`dt`
    /// the extent of its texture coordinates. A zero-size texture-space
    /// footprint collapses to full resolution.
    pub fn select_mip_levels(&self, pixel_w: i32, pixel_h: i32, ds: f32, dt: f32) -> MipSelection {
        if ds == 0.0 || dt == 0.0 {
            return MipSelection::FULL;
        }

        let want_w = (pixel_w as f32 / ds) as i32 + 1;
        let want_h = (pixel_h as f32 / dt) as i32 + 1;

        for coarser in 0..self.levels.len() {
            let lw = self.levels[coarser].width as i32;
            let lh = self.levels[coarser].height as i32;

            if want_w > lw {
                if coarser == 0 {
                    return MipSelection { finer: 0, coarser: 0, blend: 1.0 };
                }
                let finer = coarser - 1;
                let fw = self.levels[finer].width as i32;
                let blend = (fw - want_w) as f32 / (fw - lw) as f32;
                return MipSelection { finer, coarser, blend };
            }
            if want_h > lh {
                if coarser == 0 {
                    return MipSelection { finer: 0, coarser: 0, blend: 1.0 };
                }
                let finer = coarser - 1;
                let fh = self.levels[finer].height as i32;
                let blend = (fh - want_h) as f32 / (fh - lh) as f32;
                return MipSelection { finer, coarser, blend };
            }
        }

        // Coarser than the whole pyramid: clamp to the last level.
        let last = self.levels.len() - 1;
        MipSelection { finer: last, coarser: last, blend: 1.0 }
    }

    /// Trilinear lookup: bilinear in both selected levels, blended.
    /// Coordinates outside `[0, 1)` wrap (tile).
    pub fn get_color(&self, sel: MipSelection, s: f32, t: f32) -> Vec3 {
        let c1 = self.sample_level(sel.finer, s, t);
        let c2 = self.sample_level(sel.coarser, s, t);
        c1.scale(1.0 - sel.blend) + c2.scale(sel.blend)
    }

    fn sample_level(&self, level: usize, u: f32, v: f32) -> Vec3 {
        let lvl = &self.levels[level];

        // Fractional wrap; negative fractions wrap forward.
        let mut x = (u - u.trunc()) * lvl.width as f32;
        let mut y = (v - v.trunc()) * lvl.height as f32;
        if x < 0.0 {
            x += lvl.width as f32;
        }
        if y < 0.0 {
            y += lvl.height as f32;
        }

        lvl.bilinear(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: usize, height: usize, color: Color) -> Texture {
        Texture::from_pixels(width, height, vec![color.to_u32(); width * height])
    }

    #[test]
    fn test_mip_chain_dimensions() {
        let tex = solid(8, 4, Color::WHITE);
        let dims: Vec<_> = tex.levels().iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(dims, vec![(8, 4), (4, 2), (2, 1)]);
    }

    #[test]
    fn test_mip_chain_square() {
        let tex = solid(16, 16, Color::WHITE);
        assert_eq!(tex.levels().len(), 5);
        let last = tex.levels().last().unwrap();
        assert_eq!((last.width, last.height), (1, 1));
    }

    #[test]
    fn test_uniform_texture_samples_uniform() {
        let tex = solid(8, 8, Color::new(255, 0, 0));
        for sel in [
            MipSelection::FULL,
            MipSelection { finer: 0, coarser: 1, blend: 0.5 },
            MipSelection { finer: 2, coarser: 3, blend: 0.25 },
        ] {
            let c = tex.get_color(sel, 0.3, 0.7);
            assert!((c.x - 1.0).abs() < 0.01);
            assert!(c.y.abs() < 0.01);
        }
    }

    #[test]
    fn test_wrap_law() {
        let tex = Texture::checkerboard(16, 16, 2, Color::WHITE, Color::BLACK);
        let a = tex.get_color(MipSelection::FULL, 1.25, -0.25);
        let b = tex.get_color(MipSelection::FULL, 0.25, 0.75);
        assert!((a - b).len() < 1e-6);
    }

    #[test]
    fn test_degenerate_footprint_selects_full_resolution() {
        let tex = solid(32, 32, Color::WHITE);
        assert_eq!(tex.select_mip_levels(100, 100, 0.0, 1.0), MipSelection::FULL);
        assert_eq!(tex.select_mip_levels(100, 100, 1.0, 0.0), MipSelection::FULL);
    }

    #[test]
    fn test_larger_footprint_selects_finer_levels() {
        let tex = solid(64, 64, Color::WHITE);
        let big = tex.select_mip_levels(40, 40, 1.0, 1.0);
        let small = tex.select_mip_levels(6, 6, 1.0, 1.0);
        assert!(big.finer < small.finer);
        assert!(big.coarser <= small.coarser);
    }

    #[test]
    fn test_tiny_footprint_clamps_to_coarsest() {
        let tex = solid(64, 64, Color::WHITE);
        let sel = tex.select_mip_levels(0, 0, 1.0, 1.0);
        let last = tex.levels().len() - 1;
        assert_eq!(sel.finer, last);
        assert_eq!(sel.coarser, last);
        assert_eq!(sel.blend, 1.0);
    }

    #[test]
    fn test_blend_between_brackets() {
        let tex = solid(64, 64, Color::WHITE);
        // Desired width 41 sits between the 64 and 32 texel levels.
        let sel = tex.select_mip_levels(40, 40, 1.0, 1.0);
        assert_eq!(sel.finer, 0);
        assert_eq!(sel.coarser, 1);
        assert!(sel.blend > 0.0 && sel.blend < 1.0);
    }
}
