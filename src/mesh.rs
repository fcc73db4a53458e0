//! Triangle mesh: vertex and index arrays, rigid transforms, and the
//! per-triangle render dispatch into the framebuffer.

use crate::camera::Camera;
use crate::error::{RenderError, Result};
use crate::framebuffer::Framebuffer;
use crate::light::Light;
use crate::math::{Aabb, Vec2, Vec3};
use crate::texture::Texture;
use crate::types::{RenderConfig, Vertex};
use log::info;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug)]
pub struct Mesh {
    verts: Vec<Vertex>,
    tris: Vec<[u32; 3]>,
    texture: Option<Texture>,
}

fn read_i32(r: &mut impl Read) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u32(r: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f32(r: &mut impl Read) -> Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

fn read_vec3(r: &mut impl Read) -> Result<Vec3> {
    Ok(Vec3::new(read_f32(r)?, read_f32(r)?, read_f32(r)?))
}

impl Mesh {
    /// Build a mesh from already-decoded arrays. Every index must be in
    /// range of the vertex array.
    pub fn from_parts(verts: Vec<Vertex>, tris: Vec<[u32; 3]>) -> Self {
        debug_assert!(tris
            .iter()
            .all(|t| t.iter().all(|&i| (i as usize) < verts.len())));
        Self {
            verts,
            tris,
            texture: None,
        }
    }

    /// Load the binary mesh format: an int32 vertex count, four one-byte
    /// channel flags (`'y'` = present; position is mandatory), one densely
    /// packed float block per present channel in the order position /
    /// color / normal / texcoord, then an int32 triangle count and the
    /// flat u32 index array.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut r = BufReader::new(File::open(path)?);

        let verts_n = read_i32(&mut r)?;
        if verts_n < 0 {
            return Err(RenderError::MalformedMesh(format!(
                "negative vertex count {verts_n}"
            )));
        }

        let mut flags = [0u8; 4];
        r.read_exact(&mut flags)?;
        if flags[0] != b'y' {
            return Err(RenderError::MalformedMesh(
                "position channel is mandatory".into(),
            ));
        }

        // Grown as the stream is consumed; a hostile count in the header
        // hits end-of-file instead of forcing a huge up-front allocation.
        let mut verts = Vec::new();
        for _ in 0..verts_n {
            verts.push(Vertex {
                pos: read_vec3(&mut r)?,
                ..Vertex::default()
            });
        }
        if flags[1] == b'y' {
            for v in &mut verts {
                v.color = read_vec3(&mut r)?;
            }
        }
        if flags[2] == b'y' {
            for v in &mut verts {
                v.normal = read_vec3(&mut r)?;
            }
        }
        if flags[3] == b'y' {
            for v in &mut verts {
                v.uv = Vec2::new(read_f32(&mut r)?, read_f32(&mut r)?);
            }
        }

        let tris_n = read_i32(&mut r)?;
        if tris_n < 0 {
            return Err(RenderError::MalformedMesh(format!(
                "negative triangle count {tris_n}"
            )));
        }
        let mut tris = Vec::new();
        for _ in 0..tris_n {
            let tri = [read_u32(&mut r)?, read_u32(&mut r)?, read_u32(&mut r)?];
            if tri.iter().any(|&i| i >= verts_n as u32) {
                return Err(RenderError::MalformedMesh(format!(
                    "triangle index out of range: {tri:?}"
                )));
            }
            tris.push(tri);
        }

        info!(
            "loaded {} verts, {} tris from {}",
            verts_n,
            tris_n,
            path.display()
        );

        Ok(Self {
            verts,
            tris,
            texture: None,
        })
    }

    /// Axis-aligned quad in the z = 0 plane with unit texture coordinates.
    pub fn quad(width: f32, height: f32, color: Vec3) -> Self {
        Self::quad_with_uv(width, height, color, 0.0, 0.0, 1.0, 1.0)
    }

    /// Quad with an explicit texture-coordinate range; values past 1.0
    /// tile the texture across the surface.
    pub fn quad_with_uv(
        width: f32,
        height: f32,
        color: Vec3,
        u0: f32,
        v0: f32,
        u1: f32,
        v1: f32,
    ) -> Self {
        let n = Vec3::new(0.0, 0.0, 1.0);
        let verts = vec![
            Vertex::new(Vec3::new(0.0, 0.0, 0.0), color, n, Vec2::new(u0, v0)),
            Vertex::new(Vec3::new(width, 0.0, 0.0), color, n, Vec2::new(u1, v0)),
            Vertex::new(Vec3::new(width, height, 0.0), color, n, Vec2::new(u1, v1)),
            Vertex::new(Vec3::new(0.0, height, 0.0), color, n, Vec2::new(u0, v1)),
        ];
        let tris = vec![[0, 1, 2], [0, 2, 3]];
        Self::from_parts(verts, tris)
    }

    /// Latitude/longitude sphere centered at the origin.
    pub fn sphere(radius: f32, color: Vec3, stacks: usize, slices: usize) -> Self {
        let mut verts = Vec::with_capacity((stacks + 1) * (slices + 1));
        for i in 0..=stacks {
            let phi = std::f32::consts::PI * i as f32 / stacks as f32;
            let y = radius * phi.cos();
            let ring = radius * phi.sin();
            for j in 0..=slices {
                let theta = std::f32::consts::TAU * j as f32 / slices as f32;
                let pos = Vec3::new(ring * theta.cos(), y, ring * theta.sin());
                verts.push(Vertex::new(
                    pos,
                    color,
                    pos.normalize(),
                    Vec2::new(j as f32 / slices as f32, i as f32 / stacks as f32),
                ));
            }
        }

        let ring_len = (slices + 1) as u32;
        let mut tris = Vec::with_capacity(stacks * slices * 2);
        for i in 0..stacks as u32 {
            for j in 0..slices as u32 {
                let a = i * ring_len + j;
                let b = a + 1;
                let c = a + ring_len;
                let d = c + 1;
                tris.push([a, c, b]);
                tris.push([b, c, d]);
            }
        }
        Self::from_parts(verts, tris)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.verts
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.tris
    }

    pub fn bind_texture(&mut self, texture: Texture) {
        self.texture = Some(texture);
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn bounding_box(&self) -> Aabb {
        let mut bbox = Aabb::new();
        for v in &self.verts {
            bbox.add_point(v.pos);
        }
        bbox
    }

    /// Midpoint of the bounding box, not a mass centroid.
    pub fn centroid(&self) -> Vec3 {
        let bbox = self.bounding_box();
        (bbox.min_corner() + bbox.max_corner()) * 0.5
    }

    pub fn translate(&mut self, v: Vec3) {
        for vert in &mut self.verts {
            vert.pos = vert.pos + v;
        }
    }

    pub fn scale(&mut self, factor: f32) {
        for vert in &mut self.verts {
            vert.pos = vert.pos * factor;
        }
    }

    /// Rescale per axis so the bounding box matches `size`, then move the
    /// centroid to `centroid`.
    pub fn scale_to_fit(&mut self, centroid: Vec3, size: Vec3) {
        let bbox = self.bounding_box();
        let c = self.centroid();
        let scale = Vec3::new(
            size.x / bbox.size().x,
            size.y / bbox.size().y,
            size.z / bbox.size().z,
        );
        for vert in &mut self.verts {
            vert.pos = Vec3::new(
                (vert.pos.x - c.x) * scale.x + centroid.x,
                (vert.pos.y - c.y) * scale.y + centroid.y,
                (vert.pos.z - c.z) * scale.z + centroid.z,
            );
        }
    }

    /// Rotate all vertices about an axis through `pivot` by `angle`
    /// radians.
    pub fn rotate_about(&mut self, axis: Vec3, angle: f32, pivot: Vec3) {
        for vert in &mut self.verts {
            vert.pos = vert.pos.rotate_about(axis, angle, pivot);
        }
    }

    /// Rotate about an axis through the mesh's own centroid.
    pub fn rotate_about_centroid(&mut self, axis: Vec3, angle: f32) {
        self.rotate_about(axis, angle, self.centroid());
    }

    /// Submit every triangle to the textured or untextured rasterizer,
    /// depending on whether a texture is bound.
    pub fn render_solid<C, L>(
        &self,
        fb: &mut Framebuffer,
        cam: &C,
        light: &L,
        cfg: &RenderConfig,
    ) where
        C: Camera + ?Sized,
        L: Light + ?Sized,
    {
        let cam_mat = cam.basis();
        for &[i0, i1, i2] in &self.tris {
            let v0 = &self.verts[i0 as usize];
            let v1 = &self.verts[i1 as usize];
            let v2 = &self.verts[i2 as usize];
            match &self.texture {
                Some(tex) => fb.rasterize_with_texture(cam, &cam_mat, v0, v1, v2, tex, cfg),
                None => fb.rasterize(cam, &cam_mat, v0, v1, v2, light, cfg),
            }
        }
    }

    /// Draw the three edges of every triangle as depth-tested 3D segments.
    pub fn render_wireframe<C: Camera + ?Sized>(&self, fb: &mut Framebuffer, cam: &C) {
        for &[i0, i1, i2] in &self.tris {
            let v0 = &self.verts[i0 as usize];
            let v1 = &self.verts[i1 as usize];
            let v2 = &self.verts[i2 as usize];
            fb.draw_segment_3d(cam, v0.pos, v0.color, v1.pos, v1.color);
            fb.draw_segment_3d(cam, v1.pos, v1.color, v2.pos, v2.color);
            fb.draw_segment_3d(cam, v2.pos, v2.color, v0.pos, v0.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Pinhole;
    use crate::light::PhongLight;
    use crate::types::Color;
    use std::io::Write;

    fn cube_corners() -> Mesh {
        let verts = vec![
            Vertex::from_pos(-1.0, -1.0, -1.0),
            Vertex::from_pos(1.0, 1.0, 1.0),
        ];
        Mesh::from_parts(verts, vec![])
    }

    #[test]
    fn test_scale_to_fit_places_bounding_box() {
        let mut mesh = cube_corners();
        mesh.scale_to_fit(Vec3::new(10.0, 0.0, 0.0), Vec3::new(4.0, 4.0, 4.0));
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min_corner(), Vec3::new(8.0, -2.0, -2.0));
        assert_eq!(bbox.max_corner(), Vec3::new(12.0, 2.0, 2.0));
    }

    #[test]
    fn test_centroid_is_bbox_midpoint() {
        let mesh = Mesh::from_parts(
            vec![
                Vertex::from_pos(0.0, 0.0, 0.0),
                Vertex::from_pos(4.0, 2.0, 6.0),
                Vertex::from_pos(1.0, 1.0, 1.0),
            ],
            vec![],
        );
        assert_eq!(mesh.centroid(), Vec3::new(2.0, 1.0, 3.0));
    }

    #[test]
    fn test_translate_then_rotate() {
        let mut mesh = cube_corners();
        mesh.translate(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(mesh.centroid(), Vec3::new(5.0, 0.0, 0.0));

        // A full turn about the centroid leaves positions in place.
        mesh.rotate_about_centroid(Vec3::new(0.0, 1.0, 0.0), std::f32::consts::TAU);
        let p = mesh.vertices()[0].pos;
        assert!((p - Vec3::new(4.0, -1.0, -1.0)).len() < 1e-4);
    }

    #[test]
    fn test_sphere_normals_unit_length() {
        let mesh = Mesh::sphere(20.0, Vec3::ONE, 8, 16);
        assert_eq!(mesh.vertices().len(), 9 * 17);
        assert_eq!(mesh.triangles().len(), 8 * 16 * 2);
        for v in mesh.vertices() {
            assert!((v.normal.len() - 1.0).abs() < 1e-4);
            assert!((v.pos.len() - 20.0).abs() < 1e-3);
        }
    }

    fn write_mesh_file(path: &std::path::Path, tri: [u32; 3]) {
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(&3i32.to_le_bytes()).unwrap();
        f.write_all(b"yynn").unwrap();
        for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in p {
                f.write_all(&c.to_le_bytes()).unwrap();
            }
        }
        for c in [[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
            for ch in c {
                f.write_all(&ch.to_le_bytes()).unwrap();
            }
        }
        f.write_all(&1i32.to_le_bytes()).unwrap();
        for i in tri {
            f.write_all(&i.to_le_bytes()).unwrap();
        }
    }

    #[test]
    fn test_load_binary_mesh() {
        let path = std::env::temp_dir().join("perspex_mesh_ok.bin");
        write_mesh_file(&path, [0, 1, 2]);
        let mesh = Mesh::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.triangles(), &[[0, 1, 2]]);
        assert_eq!(mesh.vertices()[1].pos, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.vertices()[2].color, Vec3::new(0.0, 0.0, 1.0));
        // Channels absent from the file stay at their defaults.
        assert_eq!(mesh.vertices()[0].normal, Vec3::ZERO);
    }

    #[test]
    fn test_load_rejects_out_of_range_index() {
        let path = std::env::temp_dir().join("perspex_mesh_bad_index.bin");
        write_mesh_file(&path, [0, 1, 9]);
        let err = Mesh::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, RenderError::MalformedMesh(_)));
    }

    #[test]
    fn test_load_truncated_huge_vertex_count_fails_fast() {
        let path = std::env::temp_dir().join("perspex_mesh_huge_count.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&i32::MAX.to_le_bytes()).unwrap();
        f.write_all(b"ynnn").unwrap();
        drop(f);

        // The header promises two billion vertices but carries none; the
        // load must fail at end-of-file, not allocate for the claim.
        let err = Mesh::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, RenderError::Io(_)));
    }

    #[test]
    fn test_load_rejects_missing_positions() {
        let path = std::env::temp_dir().join("perspex_mesh_no_pos.bin");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&1i32.to_le_bytes()).unwrap();
        f.write_all(b"nnnn").unwrap();
        drop(f);

        let err = Mesh::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, RenderError::MalformedMesh(_)));
    }

    fn front_camera() -> Pinhole {
        let mut cam = Pinhole::new(60.0, 64, 64);
        cam.look_at(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 1.0, 0.0),
            200.0,
        );
        cam
    }

    #[test]
    fn test_render_solid_covers_pixels() {
        let mut mesh = Mesh::quad(60.0, 60.0, Vec3::new(1.0, 0.0, 0.0));
        mesh.translate(Vec3::ZERO - mesh.centroid());

        let mut fb = Framebuffer::new(64, 64);
        fb.clear(Color::BLACK);
        fb.clear_depth(0.0);

        let light = PhongLight::directional(Vec3::new(0.0, 0.0, -1.0));
        mesh.render_solid(&mut fb, &front_camera(), &light, &RenderConfig::default());

        let black = Color::BLACK.to_u32();
        let covered = fb.pixels().iter().filter(|&&p| p != black).count();
        assert!(covered > 50, "expected a visible quad, got {covered} pixels");
        // The quad is centered in front of the camera.
        assert_ne!(fb.pixel(32, 32), Color::BLACK);
        assert!(fb.depth(32, 32) > 0.0);
    }

    #[test]
    fn test_render_textured_quad() {
        let mut mesh = Mesh::quad(60.0, 60.0, Vec3::ONE);
        mesh.translate(Vec3::ZERO - mesh.centroid());
        mesh.bind_texture(Texture::checkerboard(32, 32, 4, Color::WHITE, Color::RED));

        let mut fb = Framebuffer::new(64, 64);
        fb.clear(Color::BLACK);
        fb.clear_depth(0.0);

        let light = PhongLight::directional(Vec3::new(0.0, 0.0, -1.0));
        mesh.render_solid(&mut fb, &front_camera(), &light, &RenderConfig::default());
        assert_ne!(fb.pixel(32, 32), Color::BLACK);
    }

    #[test]
    fn test_render_wireframe_draws_edges() {
        let mut mesh = Mesh::quad(60.0, 60.0, Vec3::new(0.0, 1.0, 0.0));
        mesh.translate(Vec3::ZERO - mesh.centroid());

        let mut fb = Framebuffer::new(64, 64);
        fb.clear_depth(0.0);
        mesh.render_wireframe(&mut fb, &front_camera());
        assert!(fb.pixels().iter().any(|&p| p != 0));
    }
}
