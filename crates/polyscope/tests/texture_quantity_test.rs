//! Integration tests for texture quantities on surface meshes, driven through
//! the headless backend.

use std::sync::Arc;

use polyscope_rs::builtin_rules::{IMAGE_TEXTURE, MATCAP_TEXTURES, VALUE2_ATTRIBUTE};
use polyscope_rs::*;

fn checkerboard(size: u32) -> Arc<Texture> {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let v = if (x + y) % 2 == 0 { 255 } else { 40 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    Arc::new(Texture::new_2d(size, size, data).unwrap())
}

/// Two quads sharing an edge, plus a triangle.
fn scene() -> Polyscope {
    let mut polyscope = init().unwrap();
    let vertices = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(2.0, 1.0, 0.0),
        Vec3::new(3.0, 0.5, 0.0),
    ];
    let faces = vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2], vec![4, 6, 5]];
    polyscope
        .register_surface_mesh("strip", vertices, faces)
        .unwrap();
    let uv: Vec<Vec2> = polyscope
        .get_surface_mesh("strip")
        .unwrap()
        .vertices()
        .iter()
        .map(|v| Vec2::new(v.x / 3.0, v.y))
        .collect();
    polyscope
        .add_texture_quantity("strip", "uv", uv, ParamDomain::Vertex, checkerboard(8))
        .unwrap();
    polyscope
}

fn quantity(polyscope: &Polyscope) -> &SurfaceTextureQuantity {
    polyscope
        .get_surface_mesh("strip")
        .unwrap()
        .texture_quantity("uv")
        .unwrap()
}

fn program(polyscope: &Polyscope) -> &HeadlessProgram {
    HeadlessProgram::downcast(quantity(polyscope).program().unwrap()).unwrap()
}

#[test]
fn polygon_faces_are_fan_triangulated() {
    let polyscope = scene();
    let mesh = polyscope.get_surface_mesh("strip").unwrap();
    assert_eq!(
        mesh.triangulation(),
        &[[0, 1, 2], [0, 2, 3], [1, 4, 5], [1, 5, 2], [4, 6, 5]]
    );

    // every per-corner buffer of the draw has one entry per triangle corner
    let program = program(&polyscope);
    let corners = mesh.num_triangles() * 3;
    for name in [VALUE2_ATTRIBUTE, "a_vertexPositions", "a_vertexNormals"] {
        assert_eq!(program.attribute(name).unwrap().len(), corners, "{name}");
    }
}

#[test]
fn first_frame_draws_with_texture_and_matcaps() {
    let mut polyscope = scene();
    assert!(polyscope.frame_tick().unwrap());

    let program = program(&polyscope);
    assert_eq!(program.stats().draws, 1);
    assert!(program.texture(IMAGE_TEXTURE).is_some());
    for name in MATCAP_TEXTURES {
        assert!(program.texture(name).is_some(), "{name}");
    }
    assert!(program.uniform("u_modelView").is_some());
    assert_eq!(program.uniform("u_modLen"), Some(UniformValue::Float(1.0)));
}

#[test]
fn style_round_trip_restores_rule_list() {
    let mut polyscope = scene();
    let original = quantity(&polyscope).program_rules().to_vec();

    for style in [ParamVizStyle::Grid, ParamVizStyle::Texture] {
        polyscope
            .with_texture_quantity("strip", "uv", |q, mesh, engine| {
                q.set_style(style, mesh, engine)
            })
            .unwrap();
    }

    assert_eq!(quantity(&polyscope).program_rules(), original.as_slice());
    assert_eq!(quantity(&polyscope).rebuild_count(), 3);
}

#[test]
fn checker_size_edits_take_the_cheap_path() {
    let mut polyscope = scene();
    let rules = quantity(&polyscope).program_rules().to_vec();
    let compiles = polyscope.engine().compile_count();

    for (i, size) in [0.5, 0.25, 0.125, 2.0].into_iter().enumerate() {
        polyscope
            .with_texture_quantity("strip", "uv", |q, _, _| q.set_checker_size(size))
            .unwrap();
        assert_eq!(quantity(&polyscope).uniform_update_count(), i + 1);
        assert!(polyscope.frame_tick().unwrap());
    }

    assert_eq!(quantity(&polyscope).rebuild_count(), 1);
    assert_eq!(quantity(&polyscope).program_rules(), rules.as_slice());
    assert_eq!(polyscope.engine().compile_count(), compiles);
    assert_eq!(program(&polyscope).uniform("u_modLen"), Some(UniformValue::Float(2.0)));
}

#[test]
fn texture_swap_rebuilds_and_rebinds() {
    let mut polyscope = scene();
    let replacement = checkerboard(4);
    polyscope
        .with_texture_quantity("strip", "uv", |q, mesh, engine| {
            q.set_texture(Arc::clone(&replacement), mesh, engine)
        })
        .unwrap();

    assert_eq!(quantity(&polyscope).rebuild_count(), 2);
    let program = program(&polyscope);
    let bound = program.texture(IMAGE_TEXTURE).unwrap();
    assert!(Arc::ptr_eq(&bound.texture, &replacement));
    assert_eq!(bound.options, SamplerOptions::default());
    // matcaps survive the swap
    assert!(program.texture(MATCAP_TEXTURES[0]).is_some());
}

#[test]
fn incompatible_texture_keeps_previous_program() {
    let mut polyscope = scene();
    assert!(polyscope.frame_tick().unwrap());
    let volume = Arc::new(Texture::new_3d(2, 2, 2, vec![0; 32]).unwrap());

    let result = polyscope.with_texture_quantity("strip", "uv", |q, mesh, engine| {
        q.set_texture(volume, mesh, engine)
    });
    assert!(matches!(
        result,
        Err(PolyscopeError::TextureDimensionMismatch { .. })
    ));

    assert_eq!(quantity(&polyscope).rebuild_count(), 1);
    assert_eq!(quantity(&polyscope).texture().dim(), TextureDim::D2);
    // the old program is still bound and drawable
    polyscope.redraw_request().request();
    assert!(polyscope.frame_tick().unwrap());
    assert_eq!(program(&polyscope).stats().draws, 2);
}

#[test]
fn slice_plane_marks_program_stale_until_update() {
    let mut polyscope = scene();
    let mesh = polyscope.get_surface_mesh_mut("strip").unwrap();
    mesh.add_slice_plane(SlicePlane::with_pose("cut", Vec3::new(1.5, 0.0, 0.0), Vec3::X));

    let engine = polyscope.engine();
    let mesh = polyscope.get_surface_mesh("strip").unwrap();
    assert!(!quantity(&polyscope).is_program_compatible(mesh, engine));

    // frame_tick rebuilds stale programs before drawing
    assert!(polyscope.frame_tick().unwrap());
    assert_eq!(quantity(&polyscope).rebuild_count(), 2);
    assert_eq!(
        program(&polyscope).uniform("u_slicePlaneNormal_0"),
        Some(UniformValue::Vec3(Vec3::X))
    );
}

#[test]
fn corner_domain_coords() {
    let mut polyscope = init().unwrap();
    polyscope
        .register_surface_mesh(
            "quad",
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap();
    let corners = vec![
        Vec2::new(0.1, 0.0),
        Vec2::new(0.2, 0.0),
        Vec2::new(0.3, 0.0),
        Vec2::new(0.4, 0.0),
    ];
    let quantity = polyscope
        .add_texture_quantity("quad", "uv", corners.clone(), ParamDomain::Corner, checkerboard(2))
        .unwrap();
    let program = HeadlessProgram::downcast(quantity.program().unwrap()).unwrap();
    assert_eq!(
        program.attribute(VALUE2_ATTRIBUTE),
        Some(&AttributeData::Vec2(vec![
            corners[0], corners[1], corners[2], corners[0], corners[2], corners[3]
        ]))
    );
}

#[test]
fn settings_snapshot_serializes() {
    let polyscope = scene();
    let settings = texture_quantity_to_settings(quantity(&polyscope));
    let json = serde_json::to_string(&settings).unwrap();
    let back: TextureQuantitySettings = serde_json::from_str(&json).unwrap();
    assert_eq!(back, settings);
}
