//! A window-less backend.
//!
//! [`HeadlessEngine`] assembles programs exactly like a GPU backend would,
//! runs a structural check over the generated source in place of a driver
//! compiler, and records everything fed to each [`HeadlessProgram`] so the
//! results can be inspected.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use glam::Mat4;
use polyscope_core::error::{PolyscopeError, Result};

use crate::builtin_rules::{GLOBAL_FRAGMENT_FILTER, GLSL_VERSION};
use crate::camera::{self, Camera};
use crate::engine::{
    AttributeData, BoundTexture, RenderEngine, SamplerOptions, ShaderProgram, UniformValue,
};
use crate::error::{RenderError, RenderResult};
use crate::materials::MaterialRegistry;
use crate::rule_registry::RuleRegistry;
use crate::rules::RuleRef;
use crate::shader::{ProgramDescription, ShaderAssembler, ShaderTemplate};
use crate::templates;
use crate::texture::Texture;

/// Default framebuffer size.
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

/// Render engine without a GPU.
pub struct HeadlessEngine {
    registry: Arc<RuleRegistry>,
    templates: HashMap<String, ShaderTemplate>,
    materials: MaterialRegistry,
    camera: Camera,
    width: u32,
    height: u32,
    default_rules: Vec<RuleRef>,
    compile_count: usize,
}

impl HeadlessEngine {
    /// Creates an engine with the built-in templates and materials.
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self::with_size(registry, DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Creates an engine with a given framebuffer size.
    #[allow(clippy::cast_precision_loss)]
    pub fn with_size(registry: Arc<RuleRegistry>, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            registry,
            templates: templates::builtin_templates(),
            materials: MaterialRegistry::new(),
            camera: Camera::new(width as f32 / height as f32),
            width,
            height,
            default_rules: vec![RuleRef::new(GLSL_VERSION), RuleRef::new(GLOBAL_FRAGMENT_FILTER)],
            compile_count: 0,
        }
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// Adds or replaces a base template.
    pub fn register_template(&mut self, template: ShaderTemplate) {
        self.templates.insert(template.name().to_string(), template);
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialRegistry {
        &mut self.materials
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Resizes the framebuffer.
    #[allow(clippy::cast_precision_loss)]
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.camera
            .set_aspect_ratio(self.width as f32 / self.height as f32);
    }

    /// Number of programs compiled so far.
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    /// Assembles a program without compiling it.
    pub fn assemble(&self, base_name: &str, rules: &[RuleRef]) -> Result<ProgramDescription> {
        let template = self
            .templates
            .get(base_name)
            .ok_or_else(|| PolyscopeError::UnknownTemplate(base_name.to_string()))?;
        let all_rules: Vec<RuleRef> = self.default_rules.iter().chain(rules).cloned().collect();
        ShaderAssembler::new(&self.registry).assemble(template, &all_rules)
    }
}

impl RenderEngine for HeadlessEngine {
    fn request_shader(&mut self, base_name: &str, rules: &[RuleRef]) -> Result<Box<dyn ShaderProgram>> {
        let description = self.assemble(base_name, rules)?;
        if let Err(err) = check_program(&description) {
            log::warn!("program '{base_name}' failed to compile: {err}");
            return Err(err);
        }
        self.compile_count += 1;
        log::debug!(
            "compiled program '{}' [{}]",
            base_name,
            description.rules.join(", ")
        );
        Ok(Box::new(HeadlessProgram::new(description)))
    }

    fn set_material(&self, program: &mut dyn ShaderProgram, material: &str) -> RenderResult<()> {
        if !self.materials.has(material) {
            return Err(RenderError::UnknownMaterial(material.to_string()));
        }
        if let Some(matcaps) = self.materials.matcaps(material) {
            let options = SamplerOptions {
                with_alpha: false,
                use_mipmap: false,
                repeat: false,
            };
            for (name, texture) in matcaps.bindings() {
                if program.has_texture(name) {
                    program.set_texture(name, Arc::clone(texture), options)?;
                }
            }
        }
        Ok(())
    }

    fn has_material(&self, material: &str) -> bool {
        self.materials.has(material)
    }

    fn is_flat_material(&self, material: &str) -> bool {
        self.materials.get(material).is_some_and(|m| m.is_flat)
    }

    fn set_camera_uniforms(&self, program: &mut dyn ShaderProgram, model: Mat4) {
        let view = self.view_matrix();
        let projection = self.projection_matrix();
        let values = [
            ("u_modelView", UniformValue::Mat4(view * model)),
            ("u_projMatrix", UniformValue::Mat4(projection)),
            ("u_invProjMatrix_worldPos", UniformValue::Mat4(projection.inverse())),
            ("u_invViewMatrix_worldPos", UniformValue::Mat4(view.inverse())),
            (
                "u_viewport_worldPos",
                UniformValue::Vec4(camera::viewport(self.width, self.height)),
            ),
        ];
        for (name, value) in values {
            if !program.has_uniform(name) {
                continue;
            }
            if let Err(err) = program.set_uniform(name, value) {
                log::trace!("skipping camera uniform: {err}");
            }
        }
    }

    fn view_matrix(&self) -> Mat4 {
        self.camera.view_matrix()
    }

    fn projection_matrix(&self) -> Mat4 {
        self.camera.projection_matrix()
    }
}

/// Rejects sources a GLSL compiler would reject for structural reasons.
fn check_program(description: &ProgramDescription) -> Result<()> {
    for stage in &description.stages {
        let fail = |message: String| PolyscopeError::ShaderCompile {
            message: format!("{:?} stage: {message}", stage.kind),
            assembled_source: description.full_source(),
        };
        let source = &stage.source;

        if source.contains("${") || source.contains("}$") {
            return Err(fail("unresolved template marker".to_string()));
        }
        for (open, close) in [('{', '}'), ('(', ')')] {
            let mut depth: i64 = 0;
            for c in source.chars() {
                if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth < 0 {
                        return Err(fail(format!("unexpected '{close}'")));
                    }
                }
            }
            if depth != 0 {
                return Err(fail(format!("unbalanced '{open}'")));
            }
        }

        let mut declared: Vec<&str> = Vec::new();
        for statement in source.split(';') {
            let line = statement.lines().last().unwrap_or_default().trim();
            let Some(declaration) = line.strip_prefix("uniform ") else {
                continue;
            };
            let Some(name) = declaration.split_whitespace().last() else {
                continue;
            };
            let name = name.split('[').next().unwrap_or(name);
            if declared.contains(&name) {
                return Err(fail(format!("redeclaration of uniform '{name}'")));
            }
            declared.push(name);
        }
    }
    Ok(())
}

/// Counters of the work a program has been asked to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramStats {
    pub uniform_writes: usize,
    pub attribute_uploads: usize,
    pub uploaded_bytes: usize,
    pub texture_binds: usize,
    pub draws: usize,
}

/// A program of the headless backend: validates and records its inputs.
#[derive(Debug)]
pub struct HeadlessProgram {
    description: ProgramDescription,
    uniforms: HashMap<String, UniformValue>,
    attributes: HashMap<String, AttributeData>,
    textures: BTreeMap<String, BoundTexture>,
    stats: ProgramStats,
}

impl HeadlessProgram {
    pub fn new(description: ProgramDescription) -> Self {
        Self {
            description,
            uniforms: HashMap::new(),
            attributes: HashMap::new(),
            textures: BTreeMap::new(),
            stats: ProgramStats::default(),
        }
    }

    /// Views a generic program as a headless one, if it is one.
    pub fn downcast(program: &dyn ShaderProgram) -> Option<&Self> {
        program.as_any().downcast_ref::<Self>()
    }

    /// Last value written to a uniform.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeData> {
        self.attributes.get(name)
    }

    pub fn texture(&self, name: &str) -> Option<&BoundTexture> {
        self.textures.get(name)
    }

    pub fn stats(&self) -> ProgramStats {
        self.stats
    }
}

impl ShaderProgram for HeadlessProgram {
    fn description(&self) -> &ProgramDescription {
        &self.description
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()> {
        let expected = self
            .description
            .uniform_type(name)
            .ok_or_else(|| RenderError::UnknownUniform(name.to_string()))?;
        if expected != value.data_type() {
            return Err(RenderError::UniformTypeMismatch {
                name: name.to_string(),
                expected,
                actual: value.data_type(),
            });
        }
        self.uniforms.insert(name.to_string(), value);
        self.stats.uniform_writes += 1;
        Ok(())
    }

    fn set_attribute(&mut self, name: &str, data: AttributeData) -> RenderResult<()> {
        let expected = self
            .description
            .attribute_type(name)
            .ok_or_else(|| RenderError::UnknownAttribute(name.to_string()))?;
        if expected != data.data_type() {
            return Err(RenderError::AttributeTypeMismatch {
                name: name.to_string(),
                expected,
                actual: data.data_type(),
            });
        }
        self.stats.attribute_uploads += 1;
        self.stats.uploaded_bytes += data.to_bytes().len();
        self.attributes.insert(name.to_string(), data);
        Ok(())
    }

    fn set_texture(
        &mut self,
        name: &str,
        texture: Arc<Texture>,
        options: SamplerOptions,
    ) -> RenderResult<()> {
        let expected = self
            .description
            .texture_dim(name)
            .ok_or_else(|| RenderError::UnknownTexture(name.to_string()))?;
        if expected != texture.dim() {
            return Err(RenderError::TextureDimensionMismatch {
                name: name.to_string(),
                expected,
                actual: texture.dim(),
            });
        }
        self.textures
            .insert(name.to_string(), BoundTexture { texture, options });
        self.stats.texture_binds += 1;
        Ok(())
    }

    fn bound_textures(&self) -> Vec<(String, BoundTexture)> {
        self.textures
            .iter()
            .map(|(name, bound)| (name.clone(), bound.clone()))
            .collect()
    }

    fn draw(&mut self) -> RenderResult<()> {
        let mut element_count: Option<usize> = None;
        for decl in &self.description.attributes {
            let data = self
                .attributes
                .get(&decl.name)
                .ok_or_else(|| RenderError::MissingAttribute(decl.name.clone()))?;
            match element_count {
                None => element_count = Some(data.len()),
                Some(expected) if expected != data.len() => {
                    return Err(RenderError::AttributeLengthMismatch {
                        name: decl.name.clone(),
                        expected,
                        actual: data.len(),
                    });
                }
                Some(_) => {}
            }
        }
        if let Some(missing) = self
            .description
            .textures
            .iter()
            .find(|t| !self.textures.contains_key(&t.name))
        {
            return Err(RenderError::MissingTexture(missing.name.clone()));
        }
        self.stats.draws += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin_rules::{
        IMAGE_TEXTURE, LIGHT_MATCAP, LIGHT_PASSTHRU, MESH_PROPAGATE_VALUE2, PARAM_TRANSFORM_VALUE2,
        SHADE_BASECOLOR, SHADE_TEXTURE2COLOR, VALUE2_ATTRIBUTE,
    };
    use crate::rule_registry::RuleEntry;
    use crate::rules::{rule_refs, DataType, ShaderRule, TextureDim};
    use crate::templates::MESH;
    use glam::{Vec2, Vec3};

    fn engine() -> HeadlessEngine {
        HeadlessEngine::new(Arc::new(RuleRegistry::with_builtin_rules().unwrap()))
    }

    #[test]
    fn test_default_rules_are_prepended() {
        let mut engine = engine();
        let program = engine
            .request_shader(MESH, &rule_refs([SHADE_BASECOLOR, LIGHT_PASSTHRU]))
            .unwrap();
        let description = program.description();
        assert_eq!(
            description.rules,
            vec![GLSL_VERSION, GLOBAL_FRAGMENT_FILTER, SHADE_BASECOLOR, LIGHT_PASSTHRU]
        );
        assert!(description.stages[0].source.starts_with("#version 330 core"));
        assert_eq!(engine.compile_count(), 1);
    }

    #[test]
    fn test_unknown_template() {
        let mut engine = engine();
        assert!(matches!(
            engine.request_shader("VOLUME", &[]),
            Err(PolyscopeError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn test_duplicate_uniform_text_fails_compile() {
        let mut registry = RuleRegistry::with_builtin_rules().unwrap();
        registry
            .register(
                "SECOND_BASECOLOR",
                ShaderRule::new("SECOND_BASECOLOR")
                    .replace("FRAG_DECLARATIONS", "uniform vec3 u_baseColor;")
                    .uniform("u_baseColor", DataType::Vector3Float),
            )
            .unwrap();
        let mut engine = HeadlessEngine::new(Arc::new(registry));
        let err = engine
            .request_shader(
                MESH,
                &rule_refs([SHADE_BASECOLOR, "SECOND_BASECOLOR", LIGHT_PASSTHRU]),
            )
            .err()
            .unwrap();
        match err {
            PolyscopeError::ShaderCompile {
                message,
                assembled_source,
            } => {
                assert!(message.contains("u_baseColor"));
                assert!(assembled_source.contains("uniform vec3 u_baseColor;"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(engine.compile_count(), 0);
    }

    #[test]
    fn test_unbalanced_snippet_fails_compile() {
        let mut registry = RuleRegistry::with_builtin_rules().unwrap();
        registry
            .register(
                "BROKEN",
                RuleEntry::from(
                    ShaderRule::new("BROKEN").replace("GENERATE_SHADE_COLOR", "if (x) {"),
                ),
            )
            .unwrap();
        let mut engine = HeadlessEngine::new(Arc::new(registry));
        assert!(matches!(
            engine.request_shader(MESH, &rule_refs(["BROKEN"])),
            Err(PolyscopeError::ShaderCompile { .. })
        ));
    }

    #[test]
    fn test_program_validates_inputs() {
        let mut engine = engine();
        let mut program = engine
            .request_shader(
                MESH,
                &rule_refs([MESH_PROPAGATE_VALUE2, PARAM_TRANSFORM_VALUE2, SHADE_TEXTURE2COLOR, LIGHT_PASSTHRU]),
            )
            .unwrap();

        assert!(program.set_uniform("u_modLen", UniformValue::Float(2.0)).is_ok());
        assert_eq!(
            program.set_uniform("u_modLen", UniformValue::Int(2)),
            Err(RenderError::UniformTypeMismatch {
                name: "u_modLen".to_string(),
                expected: DataType::Float,
                actual: DataType::Int,
            })
        );
        assert_eq!(
            program.set_uniform("u_nothing", UniformValue::Float(1.0)),
            Err(RenderError::UnknownUniform("u_nothing".to_string()))
        );

        let one_d = Arc::new(Texture::new_1d(2, vec![0; 8]).unwrap());
        assert!(matches!(
            program.set_texture(IMAGE_TEXTURE, one_d, SamplerOptions::default()),
            Err(RenderError::TextureDimensionMismatch {
                expected: TextureDim::D2,
                actual: TextureDim::D1,
                ..
            })
        ));
    }

    #[test]
    fn test_mistyped_camera_uniform_is_skipped() {
        let mut registry = RuleRegistry::with_builtin_rules().unwrap();
        registry
            .register(
                "ODD_VIEWPORT",
                ShaderRule::new("ODD_VIEWPORT")
                    .replace("FRAG_DECLARATIONS", "uniform float u_viewport_worldPos;")
                    .uniform("u_viewport_worldPos", DataType::Float),
            )
            .unwrap();
        let mut engine = HeadlessEngine::new(Arc::new(registry));
        let mut program = engine
            .request_shader(MESH, &rule_refs(["ODD_VIEWPORT", SHADE_BASECOLOR, LIGHT_PASSTHRU]))
            .unwrap();

        engine.set_camera_uniforms(program.as_mut(), Mat4::IDENTITY);
        let headless = HeadlessProgram::downcast(program.as_ref()).unwrap();
        assert!(headless.uniform("u_viewport_worldPos").is_none());
        assert!(headless.uniform("u_modelView").is_some());
        assert!(headless.uniform("u_projMatrix").is_some());
    }

    #[test]
    fn test_array_sampler_binds_layered_texture() {
        let mut registry = RuleRegistry::with_builtin_rules().unwrap();
        registry
            .register(
                "SHADE_LAYER",
                ShaderRule::new("SHADE_LAYER")
                    .replace("FRAG_DECLARATIONS", "uniform sampler2DArray t_layers;")
                    .replace(
                        "GENERATE_SHADE_COLOR",
                        "vec3 albedoColor = texture(t_layers, vec3(0.5, 0.5, 0.)).rgb;",
                    )
                    .texture("t_layers", TextureDim::Array),
            )
            .unwrap();
        let mut engine = HeadlessEngine::new(Arc::new(registry));
        let mut program = engine
            .request_shader(MESH, &rule_refs(["SHADE_LAYER", LIGHT_PASSTHRU]))
            .unwrap();

        let layers = Arc::new(Texture::new_array(1, 1, 2, vec![0; 8]).unwrap());
        assert!(program
            .set_texture("t_layers", layers, SamplerOptions::default())
            .is_ok());
        let flat = Arc::new(Texture::new_2d(1, 1, vec![0; 4]).unwrap());
        assert!(matches!(
            program.set_texture("t_layers", flat, SamplerOptions::default()),
            Err(RenderError::TextureDimensionMismatch {
                expected: TextureDim::Array,
                actual: TextureDim::D2,
                ..
            })
        ));
    }

    #[test]
    fn test_draw_requires_consistent_inputs() {
        let mut engine = engine();
        let mut program = engine
            .request_shader(
                MESH,
                &rule_refs([MESH_PROPAGATE_VALUE2, SHADE_TEXTURE2COLOR, LIGHT_PASSTHRU]),
            )
            .unwrap();

        assert!(matches!(program.draw(), Err(RenderError::MissingAttribute(_))));

        program
            .set_attribute("a_vertexPositions", AttributeData::Vec3(vec![Vec3::ZERO; 3]))
            .unwrap();
        program
            .set_attribute("a_vertexNormals", AttributeData::Vec3(vec![Vec3::Z; 3]))
            .unwrap();
        program
            .set_attribute(VALUE2_ATTRIBUTE, AttributeData::Vec2(vec![Vec2::ZERO; 2]))
            .unwrap();
        assert!(matches!(
            program.draw(),
            Err(RenderError::AttributeLengthMismatch { .. })
        ));

        program
            .set_attribute(VALUE2_ATTRIBUTE, AttributeData::Vec2(vec![Vec2::ZERO; 3]))
            .unwrap();
        assert_eq!(
            program.draw(),
            Err(RenderError::MissingTexture(IMAGE_TEXTURE.to_string()))
        );

        let image = Arc::new(Texture::solid(Vec3::ONE));
        program
            .set_texture(IMAGE_TEXTURE, image, SamplerOptions::default())
            .unwrap();
        assert!(program.draw().is_ok());
        let stats = HeadlessProgram::downcast(program.as_ref()).unwrap().stats();
        assert_eq!(stats.draws, 1);
        assert_eq!(stats.attribute_uploads, 4);
    }

    #[test]
    fn test_set_material_binds_matcaps() {
        let mut engine = engine();
        let mut program = engine
            .request_shader(MESH, &rule_refs([SHADE_BASECOLOR, LIGHT_MATCAP]))
            .unwrap();
        engine.set_material(program.as_mut(), "wax").unwrap();
        assert_eq!(program.bound_textures().len(), 4);
        assert_eq!(
            engine.set_material(program.as_mut(), "glass"),
            Err(RenderError::UnknownMaterial("glass".to_string()))
        );
        assert!(engine.is_flat_material("flat"));
        assert!(!engine.is_flat_material("wax"));
    }

    #[test]
    fn test_copy_textures_from_matches_name_and_dim() {
        let mut engine = engine();
        let rules = rule_refs([MESH_PROPAGATE_VALUE2, SHADE_TEXTURE2COLOR, LIGHT_PASSTHRU]);
        let mut old = engine.request_shader(MESH, &rules).unwrap();
        old.set_texture(
            IMAGE_TEXTURE,
            Arc::new(Texture::solid(Vec3::X)),
            SamplerOptions::default(),
        )
        .unwrap();

        let mut same = engine.request_shader(MESH, &rules).unwrap();
        assert_eq!(same.copy_textures_from(old.as_ref()), 1);

        let mut plain = engine
            .request_shader(MESH, &rule_refs([SHADE_BASECOLOR, LIGHT_PASSTHRU]))
            .unwrap();
        assert_eq!(plain.copy_textures_from(old.as_ref()), 0);
    }

    #[test]
    fn test_camera_uniforms_only_where_declared() {
        let mut engine = engine();
        let mut program = engine
            .request_shader(MESH, &rule_refs([SHADE_BASECOLOR, LIGHT_PASSTHRU]))
            .unwrap();
        engine.set_camera_uniforms(program.as_mut(), Mat4::IDENTITY);
        let headless = HeadlessProgram::downcast(program.as_ref()).unwrap();
        assert_eq!(
            headless.uniform("u_modelView"),
            Some(UniformValue::Mat4(engine.view_matrix()))
        );
        assert!(headless.uniform("u_viewport_worldPos").is_none());
    }
}
