//! Initialization and the scene handle.
//!
//! [`init`] sets up logging, the built-in rule registry and a backend, and
//! returns a [`Polyscope`] handle that owns the registered structures.

use std::sync::Arc;

use polyscope_core::error::{PolyscopeError, Result};
use polyscope_core::options::Options;
use polyscope_core::quantity::ParamDomain;
use polyscope_core::state::RedrawRequest;
use polyscope_render::{HeadlessEngine, RenderEngine, RuleRegistry, Texture};
use polyscope_structures::{MeshParent, SurfaceMesh, SurfaceTextureQuantity};

use crate::{Vec2, Vec3};

/// Initializes polyscope with default options and the headless backend.
///
/// # Example
///
/// ```no_run
/// use polyscope_rs::*;
///
/// fn main() -> Result<()> {
///     let mut polyscope = init()?;
///     polyscope.register_surface_mesh("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![vec![0, 1, 2]])?;
///     Ok(())
/// }
/// ```
pub fn init() -> Result<Polyscope> {
    init_with_options(Options::default())
}

/// Initializes polyscope with the given options and the headless backend.
pub fn init_with_options(options: Options) -> Result<Polyscope> {
    let _ = env_logger::try_init();
    let registry = Arc::new(RuleRegistry::with_builtin_rules()?);
    log::info!("polyscope-rs initialized ({} shader rules)", registry.len());
    Ok(Polyscope::with_engine(HeadlessEngine::new(registry), options))
}

/// Owns the backend, the options and every registered structure.
pub struct Polyscope<E: RenderEngine = HeadlessEngine> {
    engine: E,
    options: Options,
    meshes: Vec<SurfaceMesh>,
    redraw: RedrawRequest,
}

impl<E: RenderEngine> Polyscope<E> {
    /// Wraps an already configured backend.
    pub fn with_engine(engine: E, options: Options) -> Self {
        Self {
            engine,
            options,
            meshes: Vec::new(),
            redraw: RedrawRequest::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Options apply to structures and quantities created afterwards.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Handle the host polls to decide whether to draw a frame.
    pub fn redraw_request(&self) -> &RedrawRequest {
        &self.redraw
    }

    /// Registers a polygon surface mesh.
    pub fn register_surface_mesh(
        &mut self,
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        faces: Vec<Vec<u32>>,
    ) -> Result<&mut SurfaceMesh> {
        let name = name.into();
        if self.meshes.iter().any(|m| m.name() == name) {
            return Err(PolyscopeError::StructureExists(name));
        }
        let mut mesh =
            SurfaceMesh::new(name, vertices, faces).with_redraw_request(self.redraw.clone());
        mesh.set_material(self.options.default_material.clone(), &self.engine)?;
        log::debug!(
            "registered surface mesh '{}' ({} triangles)",
            mesh.name(),
            mesh.num_triangles()
        );
        self.meshes.push(mesh);
        self.redraw.request();

        let index = self.meshes.len() - 1;
        Ok(&mut self.meshes[index])
    }

    pub fn get_surface_mesh(&self, name: &str) -> Option<&SurfaceMesh> {
        self.meshes.iter().find(|m| m.name() == name)
    }

    pub fn get_surface_mesh_mut(&mut self, name: &str) -> Option<&mut SurfaceMesh> {
        self.meshes.iter_mut().find(|m| m.name() == name)
    }

    pub fn surface_mesh_names(&self) -> Vec<&str> {
        self.meshes.iter().map(MeshParent::name).collect()
    }

    /// Removes a structure and every quantity on it.
    pub fn remove_structure(&mut self, name: &str) -> Result<()> {
        let index = self
            .meshes
            .iter()
            .position(|m| m.name() == name)
            .ok_or_else(|| PolyscopeError::StructureNotFound(name.to_string()))?;
        self.meshes.remove(index);
        self.redraw.request();
        Ok(())
    }

    pub fn remove_all_structures(&mut self) {
        self.meshes.clear();
        self.redraw.request();
    }

    /// Adds a texture quantity to a mesh, styled with the current
    /// [`Options::texture_quantity`] defaults.
    pub fn add_texture_quantity(
        &mut self,
        mesh: &str,
        name: impl Into<String>,
        coords: Vec<Vec2>,
        domain: ParamDomain,
        texture: Arc<Texture>,
    ) -> Result<&mut SurfaceTextureQuantity> {
        let options = self.options.texture_quantity;
        let mesh = self
            .meshes
            .iter_mut()
            .find(|m| m.name() == mesh)
            .ok_or_else(|| PolyscopeError::StructureNotFound(mesh.to_string()))?;
        mesh.add_texture_quantity(name, coords, domain, texture, &options, &mut self.engine)
    }

    /// Runs `f` on a texture quantity with its mesh and the backend, for edits
    /// that may rebuild the program.
    pub fn with_texture_quantity<R>(
        &mut self,
        mesh: &str,
        quantity: &str,
        f: impl FnOnce(&mut SurfaceTextureQuantity, &dyn MeshParent, &mut E) -> Result<R>,
    ) -> Result<R> {
        let engine = &mut self.engine;
        let mesh = self
            .meshes
            .iter_mut()
            .find(|m| m.name() == mesh)
            .ok_or_else(|| PolyscopeError::StructureNotFound(mesh.to_string()))?;
        mesh.update_texture_quantity(quantity, |q, parent| f(q, parent, engine))
    }

    /// Brings every program up to date and draws the scene if a redraw was
    /// requested. Returns whether a frame was drawn.
    ///
    /// A failed frame keeps the redraw request armed, so the next tick tries
    /// again.
    pub fn frame_tick(&mut self) -> Result<bool> {
        if !self.redraw.take() {
            return Ok(false);
        }
        let result = self.draw_frame();
        if result.is_err() {
            self.redraw.request();
        }
        result.map(|()| true)
    }

    fn draw_frame(&mut self) -> Result<()> {
        let mut rebuilt = 0;
        for mesh in &mut self.meshes {
            rebuilt += mesh.update_quantities(&mut self.engine)?;
        }
        if rebuilt > 0 {
            log::debug!("rebuilt {rebuilt} stale programs before drawing");
        }
        for mesh in &mut self.meshes {
            mesh.draw(&self.engine)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_registers_builtin_rules() {
        let polyscope = init().unwrap();
        assert!(polyscope
            .engine()
            .registry()
            .contains(polyscope_render::builtin_rules::SHADE_TEXTURE2COLOR));
        assert_eq!(polyscope.options(), &Options::default());
    }

    #[test]
    fn test_structure_names_are_unique() {
        let mut polyscope = init().unwrap();
        let tri = || (vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![vec![0, 1, 2]]);
        let (v, f) = tri();
        polyscope.register_surface_mesh("tri", v, f).unwrap();
        let (v, f) = tri();
        assert!(matches!(
            polyscope.register_surface_mesh("tri", v, f),
            Err(PolyscopeError::StructureExists(_))
        ));
        polyscope.remove_structure("tri").unwrap();
        assert!(matches!(
            polyscope.remove_structure("tri"),
            Err(PolyscopeError::StructureNotFound(_))
        ));
    }

    #[test]
    fn test_frame_tick_only_draws_on_request() {
        let mut polyscope = init().unwrap();
        assert!(!polyscope.frame_tick().unwrap());
        polyscope
            .register_surface_mesh("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![vec![0, 1, 2]])
            .unwrap();
        assert!(polyscope.frame_tick().unwrap());
        assert!(!polyscope.frame_tick().unwrap());
    }

    #[test]
    fn test_failed_frame_keeps_redraw_armed() {
        use crate::{templates, ShaderStageKind, ShaderTemplate, SlicePlane, Texture};

        let mut polyscope = init().unwrap();
        polyscope
            .register_surface_mesh("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![vec![0, 1, 2]])
            .unwrap();
        polyscope
            .add_texture_quantity(
                "tri",
                "uv",
                vec![Vec2::ZERO, Vec2::X, Vec2::Y],
                ParamDomain::Vertex,
                Arc::new(Texture::solid(Vec3::ONE)),
            )
            .unwrap();
        assert!(polyscope.frame_tick().unwrap());

        // a template without markers cannot host the rebuild a slice plane forces
        polyscope.engine_mut().register_template(
            ShaderTemplate::new(templates::MESH)
                .stage(ShaderStageKind::Vertex, "void main() {}")
                .stage(ShaderStageKind::Fragment, "void main() {}"),
        );
        polyscope
            .get_surface_mesh_mut("tri")
            .unwrap()
            .add_slice_plane(SlicePlane::new("cut"));
        assert!(polyscope.frame_tick().is_err());
        assert!(polyscope.frame_tick().is_err());

        polyscope
            .engine_mut()
            .register_template(templates::mesh_template());
        assert!(polyscope.frame_tick().unwrap());
        assert!(!polyscope.frame_tick().unwrap());
    }

    #[test]
    fn test_unknown_default_material_rejected() {
        let mut options = Options::default();
        options.default_material = "glass".to_string();
        let mut polyscope = init_with_options(options).unwrap();
        assert!(polyscope
            .register_surface_mesh("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![vec![0, 1, 2]])
            .is_err());
        assert!(polyscope.surface_mesh_names().is_empty());
    }

    #[test]
    fn test_default_material_applied() {
        let mut options = Options::default();
        options.default_material = "flat".to_string();
        let mut polyscope = init_with_options(options).unwrap();
        let mesh = polyscope
            .register_surface_mesh("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![vec![0, 1, 2]])
            .unwrap();
        assert_eq!(mesh.material(), "flat");
    }
}
