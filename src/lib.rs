//! Perspective-correct software triangle rasterizer
//!
//! A z-buffered rendering pipeline driven by a planar pinhole camera:
//! - perspective-correct attribute interpolation (with an optional cheap
//!   screen-space mode)
//! - Gouraud and per-pixel Phong shading
//! - mip-mapped, trilinearly filtered texture sampling
//! - binary mesh loading plus procedural quad/sphere generators
//!
//! The pipeline is single-threaded: one frame is one walk over meshes,
//! triangles and covered pixels, with exclusive access to the framebuffer.

pub mod camera;
pub mod error;
pub mod framebuffer;
pub mod light;
pub mod math;
pub mod mesh;
pub mod texture;
pub mod types;

pub use camera::{Camera, Pinhole};
pub use error::{RenderError, Result};
pub use framebuffer::Framebuffer;
pub use light::{Light, LightKind, PhongLight};
pub use math::{Aabb, Vec2, Vec3, M33};
pub use mesh::Mesh;
pub use texture::{MipSelection, Texture};
pub use types::{Color, RasterSpace, RenderConfig, ShadingMode, Vertex};
