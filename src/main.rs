//! Headless voltrace demo: render a procedural volume and save the result
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --variant <NAME>   Renderer variant (default: basic)
//!   --frames <N>       Frames to accumulate (default: 64)
//!   --resolution <PX>  Display size (default: 512)
//!   --shaders <PATH>   Shader library (default: shaders/library.json)
//!   --config <PATH>    Renderer config JSON, overrides --variant/--resolution
//!   --output <PATH>    PNG to write (default: voltrace.png)
//!   --list             Print the variants and their parameters, then exit

use std::path::PathBuf;
use std::time::Instant;

use glam::Vec3;

use voltrace::core::camera::Camera;
use voltrace::core::config::RendererConfig;
use voltrace::core::logging;
use voltrace::core::types::Result;
use voltrace::render::backend::{GpuBackend, WgpuBackend};
use voltrace::render::context::GpuContext;
use voltrace::render::program::ShaderLibrary;
use voltrace::render::properties::Properties;
use voltrace::render::{EnvironmentTexture, FrameInputs, Renderer, RendererKind, Volume};

/// Side of the procedural density cube
const VOLUME_SIZE: u32 = 64;

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--list") {
        list_variants();
        return;
    }

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let frames = parse_u32_arg(args, "--frames").unwrap_or(64);
    let shaders = parse_str_arg(args, "--shaders").unwrap_or_else(|| "shaders/library.json".to_string());
    let output = PathBuf::from(parse_str_arg(args, "--output").unwrap_or_else(|| "voltrace.png".to_string()));

    let config = match parse_str_arg(args, "--config") {
        Some(path) => RendererConfig::load(path)?,
        None => RendererConfig::new(
            parse_str_arg(args, "--variant").unwrap_or_else(|| "basic".to_string()),
            parse_u32_arg(args, "--resolution").unwrap_or(512),
        ),
    };

    let context = GpuContext::new_blocking()?;
    let mut backend = WgpuBackend::new(&context);
    let library = ShaderLibrary::load(&shaders)?;

    let volume_texture = backend.import_volume(
        "density",
        (VOLUME_SIZE, VOLUME_SIZE, VOLUME_SIZE),
        &procedural_density(VOLUME_SIZE),
    )?;
    let environment_texture = backend.import_image("environment", 64, 32, &gradient_environment(64, 32))?;

    let volume = Volume::new(volume_texture);
    let environment = EnvironmentTexture(environment_texture);
    let camera = Camera::look_at(Vec3::new(1.2, 0.8, 1.6), Vec3::ZERO, Vec3::Y);
    let inputs = FrameInputs::new(&volume, &camera, &environment);

    let mut renderer = Renderer::new(&mut backend, &library, &config)?;

    let start = Instant::now();
    for _ in 0..frames {
        renderer.render(&mut backend, &inputs)?;
    }
    let pixels = renderer.read_display(&mut backend)?;
    log::info!(
        "Rendered {} frames of '{}' in {:.2}s",
        renderer.frame(),
        renderer.kind(),
        start.elapsed().as_secs_f32()
    );

    save_png(&output, renderer.resolution(), &pixels)?;
    log::info!("Wrote {}", output.display());

    renderer.destroy(&mut backend);
    backend.destroy_surface(volume_texture);
    backend.destroy_surface(environment_texture);
    Ok(())
}

fn list_variants() {
    for kind in RendererKind::ALL {
        let properties = Properties::new(kind.properties());
        match properties.descriptors_json() {
            Ok(json) => println!("{}: {}", kind, json),
            Err(e) => println!("{}: <{}>", kind, e),
        }
    }
}

/// Soft sphere with a denser shell
fn procedural_density(size: u32) -> Vec<u8> {
    let mut density = Vec::with_capacity((size * size * size) as usize);
    let scale = 1.0 / (size - 1) as f32;
    for z in 0..size {
        for y in 0..size {
            for x in 0..size {
                let p = Vec3::new(x as f32, y as f32, z as f32) * scale - Vec3::splat(0.5);
                let r = p.length() * 2.0;
                let shell = (-((r - 0.7) * 8.0).powi(2)).exp();
                let core = (1.0 - r).max(0.0) * 0.5;
                density.push(((shell + core).min(1.0) * 255.0) as u8);
            }
        }
    }
    density
}

/// Sky-to-ground gradient in equirectangular layout
fn gradient_environment(width: u32, height: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        let t = y as f32 / (height - 1) as f32;
        let sky = Vec3::new(0.55, 0.7, 0.95);
        let ground = Vec3::new(0.25, 0.22, 0.2);
        let c = sky.lerp(ground, t);
        for _ in 0..width {
            rgba.extend_from_slice(&[(c.x * 255.0) as u8, (c.y * 255.0) as u8, (c.z * 255.0) as u8, 255]);
        }
    }
    rgba
}

fn save_png(path: &PathBuf, resolution: u32, pixels: &[f32]) -> Result<()> {
    let bytes: Vec<u8> = pixels
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
        .collect();
    let image = image::RgbaImage::from_raw(resolution, resolution, bytes)
        .ok_or_else(|| voltrace::core::Error::Gpu("display readback has the wrong size".to_string()))?;
    image
        .save(path)
        .map_err(|e| voltrace::core::Error::Io(std::io::Error::other(e)))
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
