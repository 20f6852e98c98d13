//! Demo showing a textured polygon mesh driven through the headless backend.
//!
//! Builds a grid of quads, maps a procedural checkerboard onto it, cycles
//! through the visualization styles and prints the assembled fragment stage.
//! Run with `RUST_LOG=debug` to see every program rebuild.

use std::sync::Arc;

use polyscope_rs::*;

fn checkerboard(size: u32, cells: u32) -> Result<Texture> {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let dark = (x * cells / size + y * cells / size) % 2 == 0;
            let (r, g, b) = if dark { (30, 60, 160) } else { (230, 220, 200) };
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    Texture::new_2d(size, size, data)
}

fn main() -> Result<()> {
    let mut polyscope = init()?;

    // An n x n grid of quads in the XY plane
    let n = 8_u32;
    let mut vertices = Vec::new();
    let mut uv = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            let (s, t) = (i as f32 / n as f32, j as f32 / n as f32);
            vertices.push(Vec3::new(s * 2.0 - 1.0, t * 2.0 - 1.0, 0.1 * (s * 6.0).sin()));
            uv.push(Vec2::new(s, t));
        }
    }
    let index = |i: u32, j: u32| j * (n + 1) + i;
    let faces = (0..n)
        .flat_map(|j| (0..n).map(move |i| (i, j)))
        .map(|(i, j)| vec![index(i, j), index(i + 1, j), index(i + 1, j + 1), index(i, j + 1)])
        .collect();

    polyscope.register_surface_mesh("grid", vertices, faces)?;
    polyscope.add_texture_quantity(
        "grid",
        "checker image",
        uv,
        ParamDomain::Vertex,
        Arc::new(checkerboard(64, 8)?),
    )?;
    polyscope.frame_tick()?;

    for style in ParamVizStyle::ALL {
        polyscope.with_texture_quantity("grid", "checker image", |q, mesh, engine| {
            q.set_style(style, mesh, engine)?;
            q.set_checker_size(0.25)
        })?;
        polyscope.frame_tick()?;

        let mesh = polyscope
            .get_surface_mesh("grid")
            .ok_or_else(|| PolyscopeError::StructureNotFound("grid".to_string()))?;
        if let Some(quantity) = mesh.texture_quantity("checker image") {
            let rules: Vec<String> = quantity.program_rules().iter().map(ToString::to_string).collect();
            println!("{:<14} {}", style.label(), rules.join(" "));
        }
    }

    let mesh = polyscope
        .get_surface_mesh("grid")
        .ok_or_else(|| PolyscopeError::StructureNotFound("grid".to_string()))?;
    if let Some(program) = mesh
        .texture_quantity("checker image")
        .and_then(SurfaceTextureQuantity::program)
    {
        if let Some(source) = program.description().stage_source(ShaderStageKind::Fragment) {
            println!("\n{source}");
        }
    }

    println!("programs compiled: {}", polyscope.engine().compile_count());
    Ok(())
}
