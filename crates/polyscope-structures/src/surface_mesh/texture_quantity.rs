//! Texture quantity: an image sampled through UV coordinates on a surface mesh.

use std::sync::Arc;

use glam::Vec2;
use polyscope_core::error::{PolyscopeError, Result};
use polyscope_core::options::TextureQuantityOptions;
use polyscope_core::quantity::{ParamCoordsType, ParamDomain, ParamVizStyle, Quantity, QuantityKind};
use polyscope_core::state::RedrawRequest;
use polyscope_render::builtin_rules::{IMAGE_TEXTURE, VALUE2_ATTRIBUTE};
use polyscope_render::templates::MESH;
use polyscope_render::{
    AttributeData, RenderEngine, RuleRef, SamplerOptions, ShaderProgram, Texture,
};
use serde::{Deserialize, Serialize};

use super::parameterization_quantity::{
    validate_alt_darkness, validate_checker_size, validate_rotation, ParamState,
    ParameterizationStyling,
};
use super::MeshParent;

/// Lifecycle hooks every surface mesh quantity provides.
pub trait SurfaceMeshQuantity: Quantity {
    /// Whether the current program was built from the configuration the
    /// quantity has now.
    fn is_program_compatible(&self, mesh: &dyn MeshParent, engine: &dyn RenderEngine) -> bool;

    /// Rebuilds the program unconditionally.
    fn refresh(&mut self, mesh: &dyn MeshParent, engine: &mut dyn RenderEngine) -> Result<()>;

    /// Pushes per-frame uniforms and draws.
    fn draw(&mut self, mesh: &dyn MeshParent, engine: &dyn RenderEngine) -> Result<()>;
}

/// Snapshot of the user-editable state of a texture quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureQuantitySettings {
    pub enabled: bool,
    pub style: ParamVizStyle,
    pub coords_type: ParamCoordsType,
    pub checker_size: f32,
    pub rotation: f32,
    pub alt_darkness: f32,
    pub flip_u: bool,
    pub flip_v: bool,
}

/// A texture image mapped onto a surface mesh through UV coordinates.
///
/// The program is either bound to the current configuration or stale. Edits
/// that change the rule list (style, flips, texture) rebuild immediately;
/// edits that only touch uniforms take effect on the next draw.
pub struct SurfaceTextureQuantity {
    name: String,
    structure_name: String,
    enabled: bool,
    params: ParamState,
    texture: Arc<Texture>,
    sampler: SamplerOptions,
    program: Option<Box<dyn ShaderProgram>>,
    program_rules: Vec<RuleRef>,
    rebuild_count: usize,
    uniform_update_count: usize,
    redraw: RedrawRequest,
}

impl SurfaceTextureQuantity {
    /// Creates a quantity without a program. Call [`Self::refresh`] (or add it
    /// through the mesh) before drawing.
    pub fn new(
        name: impl Into<String>,
        mesh: &dyn MeshParent,
        coords: Vec<Vec2>,
        domain: ParamDomain,
        texture: Arc<Texture>,
        options: &TextureQuantityOptions,
    ) -> Result<Self> {
        let expected = ParamState::expected_len(domain, mesh);
        if coords.len() != expected {
            return Err(PolyscopeError::SizeMismatch {
                expected,
                actual: coords.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            structure_name: mesh.name().to_string(),
            enabled: true,
            params: ParamState::new(coords, domain, options)?,
            texture,
            sampler: SamplerOptions::default(),
            program: None,
            program_rules: Vec::new(),
            rebuild_count: 0,
            uniform_update_count: 0,
            redraw: RedrawRequest::new(),
        })
    }

    #[must_use]
    pub fn with_redraw_request(mut self, redraw: RedrawRequest) -> Self {
        self.redraw = redraw;
        self
    }

    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    pub fn program(&self) -> Option<&dyn ShaderProgram> {
        self.program.as_deref()
    }

    /// Rule list of the current program.
    pub fn program_rules(&self) -> &[RuleRef] {
        &self.program_rules
    }

    /// Number of programs built so far.
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }

    /// Number of edits that went through the uniform-only path.
    pub fn uniform_update_count(&self) -> usize {
        self.uniform_update_count
    }

    /// Full rule list for the current configuration.
    pub fn desired_rules(&self, mesh: &dyn MeshParent, engine: &dyn RenderEngine) -> Vec<RuleRef> {
        mesh.add_surface_mesh_rules(engine, self.style_rules())
    }

    /// Rebuilds the program if it is missing or stale. Returns whether a
    /// rebuild happened.
    pub fn update(&mut self, mesh: &dyn MeshParent, engine: &mut dyn RenderEngine) -> Result<bool> {
        if self.is_program_compatible(mesh, &*engine) {
            return Ok(false);
        }
        self.rebuild(mesh, engine)?;
        Ok(true)
    }

    /// Builds a program for the current configuration and fills it.
    ///
    /// Textures bound to the previous program carry over when the new one
    /// declares them. On failure the previous program stays in place.
    pub fn rebuild(&mut self, mesh: &dyn MeshParent, engine: &mut dyn RenderEngine) -> Result<()> {
        let rules = self.desired_rules(mesh, &*engine);
        let mut program = engine.request_shader(MESH, &rules)?;

        if let Some(old) = self.program.as_deref() {
            program.copy_textures_from(old);
        }
        if program.has_texture(IMAGE_TEXTURE) {
            program.set_texture(IMAGE_TEXTURE, Arc::clone(&self.texture), self.sampler)?;
        }
        program.set_attribute(VALUE2_ATTRIBUTE, AttributeData::Vec2(self.corner_coords(mesh)))?;
        mesh.set_mesh_geometry_attributes(program.as_mut())?;
        engine.set_material(program.as_mut(), mesh.material())?;

        self.program = Some(program);
        self.program_rules = rules;
        self.rebuild_count += 1;
        log::debug!(
            "rebuilt program of texture quantity '{}' on '{}' ({} rebuilds)",
            self.name,
            self.structure_name,
            self.rebuild_count
        );
        Ok(())
    }

    /// Applies an edit that changes the rule list or the bound image, then
    /// rebuilds. A failed rebuild restores the previous configuration.
    fn reconfigure(
        &mut self,
        mesh: &dyn MeshParent,
        engine: &mut dyn RenderEngine,
        edit: impl FnOnce(&mut Self),
    ) -> Result<()> {
        let previous_params = self.params.clone();
        let previous_texture = Arc::clone(&self.texture);
        edit(self);

        if let Err(err) = self.rebuild(mesh, engine) {
            log::warn!(
                "texture quantity '{}' on '{}': keeping previous configuration: {err}",
                self.name,
                self.structure_name
            );
            self.params = previous_params;
            self.texture = previous_texture;
            return Err(err);
        }
        self.redraw.request();
        Ok(())
    }

    /// Replaces the sampled image.
    pub fn set_texture(
        &mut self,
        texture: Arc<Texture>,
        mesh: &dyn MeshParent,
        engine: &mut dyn RenderEngine,
    ) -> Result<()> {
        self.reconfigure(mesh, engine, |q| q.texture = texture)
    }

    pub fn set_style(
        &mut self,
        style: ParamVizStyle,
        mesh: &dyn MeshParent,
        engine: &mut dyn RenderEngine,
    ) -> Result<()> {
        let (flip_u, flip_v) = (self.params.flip_u, self.params.flip_v);
        self.configure(style, flip_u, flip_v, mesh, engine).map(drop)
    }

    pub fn set_flip_u(
        &mut self,
        flip: bool,
        mesh: &dyn MeshParent,
        engine: &mut dyn RenderEngine,
    ) -> Result<()> {
        let (style, flip_v) = (self.params.style, self.params.flip_v);
        self.configure(style, flip, flip_v, mesh, engine).map(drop)
    }

    pub fn set_flip_v(
        &mut self,
        flip: bool,
        mesh: &dyn MeshParent,
        engine: &mut dyn RenderEngine,
    ) -> Result<()> {
        let (style, flip_u) = (self.params.style, self.params.flip_u);
        self.configure(style, flip_u, flip, mesh, engine).map(drop)
    }

    /// Sets every rule-affecting parameter at once, with at most one
    /// rebuild. Returns whether a rebuild happened.
    pub fn configure(
        &mut self,
        style: ParamVizStyle,
        flip_u: bool,
        flip_v: bool,
        mesh: &dyn MeshParent,
        engine: &mut dyn RenderEngine,
    ) -> Result<bool> {
        let params = &self.params;
        if (params.style, params.flip_u, params.flip_v) == (style, flip_u, flip_v) {
            return Ok(false);
        }
        self.reconfigure(mesh, engine, |q| {
            q.params.style = style;
            q.params.flip_u = flip_u;
            q.params.flip_v = flip_v;
        })?;
        Ok(true)
    }

    fn uniform_edit(&mut self) {
        self.uniform_update_count += 1;
        self.redraw.request();
    }

    pub fn set_checker_size(&mut self, size: f32) -> Result<()> {
        self.params.checker_size = validate_checker_size(size)?;
        self.uniform_edit();
        Ok(())
    }

    pub fn set_rotation(&mut self, angle: f32) -> Result<()> {
        self.params.rotation = validate_rotation(angle)?;
        self.uniform_edit();
        Ok(())
    }

    pub fn set_alt_darkness(&mut self, darkness: f32) -> Result<()> {
        self.params.alt_darkness = validate_alt_darkness(darkness)?;
        self.uniform_edit();
        Ok(())
    }

    pub fn set_coords_type(&mut self, coords_type: ParamCoordsType) {
        self.params.coords_type = coords_type;
        self.uniform_edit();
    }

    /// Replaces the UV coordinates and re-uploads them into the current
    /// program.
    pub fn update_coords(&mut self, coords: Vec<Vec2>, mesh: &dyn MeshParent) -> Result<()> {
        let expected = ParamState::expected_len(self.params.domain, mesh);
        if coords.len() != expected {
            return Err(PolyscopeError::SizeMismatch {
                expected,
                actual: coords.len(),
            });
        }
        self.params.coords = coords;
        let corner_coords = self.corner_coords(mesh);
        if let Some(program) = self.program.as_deref_mut() {
            program.set_attribute(VALUE2_ATTRIBUTE, AttributeData::Vec2(corner_coords))?;
        }
        self.redraw.request();
        Ok(())
    }

    pub fn settings(&self) -> TextureQuantitySettings {
        TextureQuantitySettings {
            enabled: self.enabled,
            style: self.params.style,
            coords_type: self.params.coords_type,
            checker_size: self.params.checker_size,
            rotation: self.params.rotation,
            alt_darkness: self.params.alt_darkness,
            flip_u: self.params.flip_u,
            flip_v: self.params.flip_v,
        }
    }
}

impl ParameterizationStyling for SurfaceTextureQuantity {
    fn param_state(&self) -> &ParamState {
        &self.params
    }
}

impl Quantity for SurfaceTextureQuantity {
    fn name(&self) -> &str {
        &self.name
    }

    fn structure_name(&self) -> &str {
        &self.structure_name
    }

    fn kind(&self) -> QuantityKind {
        QuantityKind::Texture
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.redraw.request();
    }

    fn data_size(&self) -> usize {
        self.params.coords.len()
    }
}

impl SurfaceMeshQuantity for SurfaceTextureQuantity {
    fn is_program_compatible(&self, mesh: &dyn MeshParent, engine: &dyn RenderEngine) -> bool {
        self.program.is_some() && self.program_rules == self.desired_rules(mesh, engine)
    }

    fn refresh(&mut self, mesh: &dyn MeshParent, engine: &mut dyn RenderEngine) -> Result<()> {
        self.rebuild(mesh, engine)
    }

    fn draw(&mut self, mesh: &dyn MeshParent, engine: &dyn RenderEngine) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.program.is_none() {
            return Err(PolyscopeError::NoProgram(self.name.clone()));
        }
        if !self.is_program_compatible(mesh, engine) {
            return Err(PolyscopeError::StaleProgram(self.name.clone()));
        }

        let uniforms = self.style_uniforms(mesh.length_scale());
        let Some(program) = self.program.as_deref_mut() else {
            return Err(PolyscopeError::NoProgram(self.name.clone()));
        };
        for (name, value) in uniforms {
            if let Err(err) = program.set_uniform(name, value) {
                log::trace!("texture quantity '{}': skipping {name}: {err}", self.name);
            }
        }
        mesh.set_structure_uniforms(program);
        engine.set_camera_uniforms(program, mesh.transform());
        program.draw()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface_mesh::SurfaceMesh;
    use glam::Vec3;
    use polyscope_core::slice_plane::SlicePlane;
    use polyscope_render::builtin_rules::{
        CHECKER_TILE2COLOR, LIGHT_PASSTHRU, MATCAP_TEXTURES, PARAM_FLIP_U, PARAM_FLIP_V,
        SLICE_PLANE_CULL,
    };
    use polyscope_render::{HeadlessEngine, HeadlessProgram, RuleRegistry, UniformValue};

    fn engine() -> HeadlessEngine {
        HeadlessEngine::new(Arc::new(RuleRegistry::with_builtin_rules().unwrap()))
    }

    fn quad() -> SurfaceMesh {
        SurfaceMesh::new(
            "quad",
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            vec![vec![0, 1, 2, 3]],
        )
    }

    fn uv() -> Vec<Vec2> {
        vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y]
    }

    fn image() -> Arc<Texture> {
        Arc::new(Texture::new_2d(2, 2, vec![255; 16]).unwrap())
    }

    fn mesh_with_texture(engine: &mut HeadlessEngine) -> SurfaceMesh {
        let mut mesh = quad();
        mesh.add_texture_quantity(
            "uv",
            uv(),
            ParamDomain::Vertex,
            image(),
            &TextureQuantityOptions::default(),
            engine,
        )
        .unwrap();
        mesh
    }

    fn headless(quantity: &SurfaceTextureQuantity) -> &HeadlessProgram {
        HeadlessProgram::downcast(quantity.program().unwrap()).unwrap()
    }

    #[test]
    fn test_add_builds_and_fills_program() {
        let mut engine = engine();
        let mesh = mesh_with_texture(&mut engine);
        let quantity = mesh.texture_quantity("uv").unwrap();

        assert_eq!(quantity.rebuild_count(), 1);
        assert_eq!(quantity.kind(), QuantityKind::Texture);
        let program = headless(quantity);
        assert!(program.texture(IMAGE_TEXTURE).is_some());
        let Some(AttributeData::Vec2(coords)) = program.attribute(VALUE2_ATTRIBUTE) else {
            panic!("missing UV attribute");
        };
        assert_eq!(
            coords,
            &vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::ZERO, Vec2::ONE, Vec2::Y]
        );
    }

    fn has_rule(quantity: &SurfaceTextureQuantity, name: &str) -> bool {
        quantity.program_rules().iter().any(|r| r.name == name)
    }

    #[test]
    fn test_flip_setters_toggle_rules() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        let quantity = mesh.texture_quantity("uv").unwrap();
        assert!(!has_rule(quantity, PARAM_FLIP_U));
        assert!(has_rule(quantity, PARAM_FLIP_V));

        mesh.update_texture_quantity("uv", |q, parent| q.set_flip_u(true, parent, &mut engine))
            .unwrap();
        let quantity = mesh.texture_quantity("uv").unwrap();
        assert!(quantity.flip_u());
        assert!(has_rule(quantity, PARAM_FLIP_U));
        assert_eq!(quantity.rebuild_count(), 2);

        mesh.update_texture_quantity("uv", |q, parent| q.set_flip_v(false, parent, &mut engine))
            .unwrap();
        let quantity = mesh.texture_quantity("uv").unwrap();
        assert!(!has_rule(quantity, PARAM_FLIP_V));
        assert_eq!(quantity.rebuild_count(), 3);

        // setting the current value is not a rule change
        mesh.update_texture_quantity("uv", |q, parent| q.set_flip_v(false, parent, &mut engine))
            .unwrap();
        assert_eq!(mesh.texture_quantity("uv").unwrap().rebuild_count(), 3);
        mesh.draw(&engine).unwrap();
    }

    #[test]
    fn test_refresh_rebuilds_with_same_rules() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        let rules = mesh.texture_quantity("uv").unwrap().program_rules().to_vec();

        mesh.refresh(&mut engine).unwrap();
        let quantity = mesh.texture_quantity("uv").unwrap();
        assert_eq!(quantity.rebuild_count(), 2);
        assert_eq!(quantity.program_rules(), rules.as_slice());
        let program = headless(quantity);
        assert!(program.texture(IMAGE_TEXTURE).is_some());
        for name in MATCAP_TEXTURES {
            assert!(program.texture(name).is_some(), "{name}");
        }
        mesh.draw(&engine).unwrap();
    }

    #[test]
    fn test_vertex_update_refreshes_geometry() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        let moved = vec![Vec3::ZERO, Vec3::X * 2.0, Vec3::new(2.0, 2.0, 0.0), Vec3::Y * 2.0];
        mesh.update_vertices(moved, &mut engine).unwrap();

        let quantity = mesh.texture_quantity("uv").unwrap();
        assert_eq!(quantity.rebuild_count(), 2);
        let Some(AttributeData::Vec3(positions)) = headless(quantity).attribute("a_vertexPositions")
        else {
            panic!("missing position attribute");
        };
        assert_eq!(positions[1], Vec3::X * 2.0);
    }

    #[test]
    fn test_coords_length_checked() {
        let mesh = quad();
        let result = SurfaceTextureQuantity::new(
            "uv",
            &mesh,
            vec![Vec2::ZERO; 3],
            ParamDomain::Corner,
            image(),
            &TextureQuantityOptions::default(),
        );
        assert!(matches!(
            result,
            Err(PolyscopeError::SizeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_draw_without_program() {
        let engine = engine();
        let mesh = quad();
        let mut quantity = SurfaceTextureQuantity::new(
            "uv",
            &mesh,
            uv(),
            ParamDomain::Vertex,
            image(),
            &TextureQuantityOptions::default(),
        )
        .unwrap();
        assert!(matches!(
            quantity.draw(&mesh, &engine),
            Err(PolyscopeError::NoProgram(_))
        ));
        quantity.set_enabled(false);
        assert!(quantity.draw(&mesh, &engine).is_ok());
    }

    #[test]
    fn test_uniform_edits_do_not_rebuild() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        let compiles = engine.compile_count();

        mesh.update_texture_quantity("uv", |q, _| {
            q.set_checker_size(0.25)?;
            q.set_rotation(1.0)?;
            q.set_alt_darkness(0.5)
        })
        .unwrap();
        mesh.draw(&engine).unwrap();

        let quantity = mesh.texture_quantity("uv").unwrap();
        assert_eq!(quantity.rebuild_count(), 1);
        assert_eq!(quantity.uniform_update_count(), 3);
        assert_eq!(engine.compile_count(), compiles);
        let program = headless(quantity);
        assert_eq!(program.uniform("u_modLen"), Some(UniformValue::Float(0.25)));
        assert_eq!(program.uniform("u_angle"), Some(UniformValue::Float(1.0)));
        assert_eq!(program.stats().draws, 1);
    }

    #[test]
    fn test_invalid_uniform_edit_keeps_value() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        let result = mesh.update_texture_quantity("uv", |q, _| q.set_checker_size(-1.0));
        assert!(matches!(result, Err(PolyscopeError::InvalidParameter { .. })));
        assert_eq!(mesh.texture_quantity("uv").unwrap().checker_size(), 1.0);
    }

    #[test]
    fn test_style_change_rebuilds() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        mesh.update_texture_quantity("uv", |q, parent| {
            q.set_style(ParamVizStyle::Checker, parent, &mut engine)
        })
        .unwrap();

        let quantity = mesh.texture_quantity("uv").unwrap();
        assert_eq!(quantity.rebuild_count(), 2);
        assert!(quantity
            .program_rules()
            .contains(&RuleRef::new(CHECKER_TILE2COLOR)));
        mesh.draw(&engine).unwrap();
        let program = headless(mesh.texture_quantity("uv").unwrap());
        assert_eq!(program.uniform("u_modDarkness"), Some(UniformValue::Float(1.0)));
    }

    #[test]
    fn test_texture_dimension_mismatch_reverts() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        let original = Arc::clone(mesh.texture_quantity("uv").unwrap().texture());
        let strip = Arc::new(Texture::new_1d(4, vec![0; 16]).unwrap());

        let result = mesh.update_texture_quantity("uv", |q, parent| {
            q.set_texture(strip, parent, &mut engine)
        });
        assert!(matches!(
            result,
            Err(PolyscopeError::TextureDimensionMismatch { .. })
        ));

        let quantity = mesh.texture_quantity("uv").unwrap();
        assert!(Arc::ptr_eq(quantity.texture(), &original));
        assert_eq!(quantity.rebuild_count(), 1);
        let bound = headless(quantity).texture(IMAGE_TEXTURE).unwrap();
        assert!(Arc::ptr_eq(&bound.texture, &original));
    }

    #[test]
    fn test_material_change_makes_program_stale() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        mesh.set_material("flat", &engine).unwrap();
        assert!(matches!(
            mesh.draw(&engine),
            Err(PolyscopeError::StaleProgram(_))
        ));

        assert_eq!(mesh.update_quantities(&mut engine).unwrap(), 1);
        assert_eq!(mesh.update_quantities(&mut engine).unwrap(), 0);
        let quantity = mesh.texture_quantity("uv").unwrap();
        assert_eq!(quantity.program_rules().last(), Some(&RuleRef::new(LIGHT_PASSTHRU)));
        mesh.draw(&engine).unwrap();
    }

    #[test]
    fn test_slice_plane_uniforms_pushed() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        mesh.add_slice_plane(SlicePlane::with_pose("cut", Vec3::splat(0.5), Vec3::X));
        mesh.update_quantities(&mut engine).unwrap();
        mesh.draw(&engine).unwrap();

        let quantity = mesh.texture_quantity("uv").unwrap();
        assert!(quantity
            .program_rules()
            .contains(&RuleRef::instance(SLICE_PLANE_CULL, "0")));
        let program = headless(quantity);
        assert_eq!(
            program.uniform("u_slicePlaneCenter_0"),
            Some(UniformValue::Vec3(Vec3::splat(0.5)))
        );
    }

    #[test]
    fn test_update_coords_uploads_without_rebuild() {
        let mut engine = engine();
        let mut mesh = mesh_with_texture(&mut engine);
        mesh.update_texture_quantity("uv", |q, parent| {
            q.update_coords(vec![Vec2::ONE; 4], parent)
        })
        .unwrap();
        let quantity = mesh.texture_quantity("uv").unwrap();
        assert_eq!(quantity.rebuild_count(), 1);
        assert_eq!(
            headless(quantity).attribute(VALUE2_ATTRIBUTE),
            Some(&AttributeData::Vec2(vec![Vec2::ONE; 6]))
        );
    }

    #[test]
    fn test_settings_snapshot() {
        let mut engine = engine();
        let mesh = mesh_with_texture(&mut engine);
        let settings = mesh.texture_quantity("uv").unwrap().settings();
        assert!(settings.enabled);
        assert_eq!(settings.style, ParamVizStyle::Texture);
        assert!(settings.flip_v);
        assert!(!settings.flip_u);
    }
}
