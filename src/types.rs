//! Core types shared by the rendering pipeline

use crate::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Pack as a single pixel word, red in the low byte.
    pub fn to_u32(self) -> u32 {
        (self.r as u32) | ((self.g as u32) << 8) | ((self.b as u32) << 16) | ((self.a as u32) << 24)
    }

    pub fn from_u32(pix: u32) -> Self {
        Self {
            r: (pix & 0xff) as u8,
            g: ((pix >> 8) & 0xff) as u8,
            b: ((pix >> 16) & 0xff) as u8,
            a: ((pix >> 24) & 0xff) as u8,
        }
    }

    /// Quantize a 0.0-1.0 color vector; out-of-range channels clamp.
    pub fn from_vec(c: Vec3) -> Self {
        Self {
            r: (c.x.clamp(0.0, 1.0) * 255.0) as u8,
            g: (c.y.clamp(0.0, 1.0) * 255.0) as u8,
            b: (c.z.clamp(0.0, 1.0) * 255.0) as u8,
            a: 255,
        }
    }

    pub fn to_vec(self) -> Vec3 {
        Vec3::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

/// A vertex with position, color, normal and texture coordinate
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    pub pos: Vec3,
    pub color: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(pos: Vec3, color: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { pos, color, normal, uv }
    }

    pub fn from_pos(x: f32, y: f32, z: f32) -> Self {
        Self {
            pos: Vec3::new(x, y, z),
            ..Self::default()
        }
    }
}

/// How per-pixel depth and attribute weights are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterSpace {
    /// Interpolate projected depth with the screen-space barycentrics.
    Screen,
    /// Re-project the reconstructed 3D point; perspective-correct weights.
    Model,
}

/// Shading mode for untextured triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingMode {
    /// Light the three vertices once, blend the lit colors per pixel.
    Gouraud,
    /// Blend color and normal per pixel, then light each pixel.
    Phong,
}

/// Rasterizer settings, passed explicitly into every rasterization call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderConfig {
    pub space: RasterSpace,
    pub shading: ShadingMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            space: RasterSpace::Screen,
            shading: ShadingMode::Gouraud,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_pack_roundtrip() {
        let c = Color::new(12, 200, 99);
        assert_eq!(Color::from_u32(c.to_u32()), c);
    }

    #[test]
    fn test_color_from_vec_clamps() {
        let c = Color::from_vec(Vec3::new(2.0, -1.0, 0.5));
        assert_eq!(c.r, 255);
        assert_eq!(c.g, 0);
        assert_eq!(c.b, 127);
    }
}
