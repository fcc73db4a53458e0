//! Demo driver: render one frame of a scene to an image file.
//!
//! With no mesh argument a small procedural scene is used (an untextured
//! sphere and a checker-textured quad).

use clap::{Parser, ValueEnum};
use log::info;
use perspex::{
    Color, Framebuffer, Mesh, PhongLight, Pinhole, RasterSpace, RenderConfig, ShadingMode,
    Texture, Vec3,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpaceArg {
    Screen,
    Model,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShadingArg {
    Gouraud,
    Phong,
}

#[derive(Parser, Debug)]
#[command(version, about = "Software triangle rasterizer demo")]
struct Args {
    /// Binary mesh file to render; omit for the procedural demo scene
    #[arg(long)]
    mesh: Option<PathBuf>,

    /// Texture image to bind to the loaded mesh
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Output image file (format by extension, e.g. .tif or .png)
    #[arg(long, default_value = "frame.tif")]
    output: PathBuf,

    #[arg(long, default_value_t = 480)]
    width: usize,

    #[arg(long, default_value_t = 360)]
    height: usize,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 60.0)]
    hfov: f32,

    /// Depth/attribute resolution mode
    #[arg(long, value_enum, default_value_t = SpaceArg::Model)]
    space: SpaceArg,

    /// Shading mode for untextured meshes
    #[arg(long, value_enum, default_value_t = ShadingArg::Phong)]
    shading: ShadingArg,

    /// Draw wireframe edges instead of filled triangles
    #[arg(long)]
    wireframe: bool,
}

fn build_scene(args: &Args) -> perspex::Result<Vec<Mesh>> {
    if let Some(path) = &args.mesh {
        let mut mesh = Mesh::load(path)?;
        if let Some(tex_path) = &args.texture {
            mesh.bind_texture(Texture::from_file(tex_path)?);
        }
        mesh.translate(Vec3::ZERO - mesh.centroid());
        return Ok(vec![mesh]);
    }

    let mut sphere = Mesh::sphere(30.0, Vec3::new(0.2, 0.4, 1.0), 20, 40);
    sphere.translate(Vec3::new(-40.0, 0.0, 0.0));

    let mut quad = Mesh::quad(60.0, 60.0, Vec3::ONE);
    quad.bind_texture(Texture::checkerboard(
        64,
        64,
        8,
        Color::WHITE,
        Color::new(180, 40, 40),
    ));
    quad.translate(Vec3::new(40.0, 0.0, 0.0) - quad.centroid());

    Ok(vec![sphere, quad])
}

fn main() -> perspex::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let meshes = build_scene(&args)?;

    let mut cam = Pinhole::new(args.hfov, args.width, args.height);
    cam.look_at(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 1.0, 0.0),
        200.0,
    );

    let light = PhongLight::directional(Vec3::new(-0.5, -0.5, -1.0));
    let cfg = RenderConfig {
        space: match args.space {
            SpaceArg::Screen => RasterSpace::Screen,
            SpaceArg::Model => RasterSpace::Model,
        },
        shading: match args.shading {
            ShadingArg::Gouraud => ShadingMode::Gouraud,
            ShadingArg::Phong => ShadingMode::Phong,
        },
    };

    let mut fb = Framebuffer::new(args.width, args.height);
    fb.clear(Color::BLACK);
    fb.clear_depth(0.0);

    for mesh in &meshes {
        if args.wireframe {
            mesh.render_wireframe(&mut fb, &cam);
        } else {
            mesh.render_solid(&mut fb, &cam, &light, &cfg);
        }
    }

    fb.save(&args.output)?;
    info!("wrote {}", args.output.display());
    Ok(())
}
