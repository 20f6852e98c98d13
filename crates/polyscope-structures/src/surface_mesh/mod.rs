//! Surface mesh structure.

mod geometry;
mod parameterization_quantity;
mod texture_quantity;

pub use geometry::fan_triangulate;
pub use parameterization_quantity::{ParamState, ParameterizationStyling};
pub use texture_quantity::{SurfaceMeshQuantity, SurfaceTextureQuantity, TextureQuantitySettings};

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use polyscope_core::error::{PolyscopeError, Result};
use polyscope_core::options::TextureQuantityOptions;
use polyscope_core::quantity::{ParamDomain, Quantity};
use polyscope_core::slice_plane::{SlicePlane, MAX_SLICE_PLANES};
use polyscope_core::state::RedrawRequest;
use polyscope_render::builtin_rules::{
    slice_plane_uniform_names, CULL_POS_FROM_WORLD, GENERATE_WORLD_POS, LIGHT_MATCAP,
    LIGHT_PASSTHRU, SLICE_PLANE_CULL,
};
use polyscope_render::{
    AttributeData, RenderEngine, RenderError, RenderResult, RuleRef, ShaderProgram, Texture,
    UniformValue,
};

/// What a mesh quantity needs from the mesh it is drawn on.
///
/// Face connectivity is flattened: the corners of face `f` are
/// `face_inds_entries[face_inds_start[f]..face_inds_start[f + 1]]`.
pub trait MeshParent {
    fn name(&self) -> &str;

    fn num_vertices(&self) -> usize;

    fn num_faces(&self) -> usize;

    /// Offsets into [`MeshParent::face_inds_entries`], one per face plus the end.
    fn face_inds_start(&self) -> &[usize];

    /// Vertex index of every face corner, in face order.
    fn face_inds_entries(&self) -> &[u32];

    fn num_corners(&self) -> usize {
        self.face_inds_entries().len()
    }

    /// Fan triangulation as corner indices. Every per-corner buffer of a
    /// draw call is laid out in this order.
    fn triangle_corners(&self) -> &[[usize; 3]];

    fn transform(&self) -> Mat4;

    /// Characteristic size of the mesh.
    fn length_scale(&self) -> f32;

    fn material(&self) -> &str;

    /// Wraps a quantity's rules with the structural ones: slice plane culling
    /// first, the material's lighting rule last.
    fn add_surface_mesh_rules(&self, engine: &dyn RenderEngine, rules: Vec<RuleRef>) -> Vec<RuleRef>;

    /// Pushes per-frame structure uniforms (slice planes).
    fn set_structure_uniforms(&self, program: &mut dyn ShaderProgram);

    /// Uploads per-corner positions and normals.
    fn set_mesh_geometry_attributes(&self, program: &mut dyn ShaderProgram) -> RenderResult<()>;
}

/// A surface mesh structure (triangular or polygonal).
pub struct SurfaceMesh {
    // Core data
    name: String,
    vertices: Vec<Vec3>,
    faces: Vec<Vec<u32>>,
    enabled: bool,
    transform: Mat4,
    material: String,
    slice_planes: Vec<SlicePlane>,
    texture_quantities: Vec<SurfaceTextureQuantity>,
    redraw: RedrawRequest,

    // Computed data
    face_inds_start: Vec<usize>,
    face_inds_entries: Vec<u32>,
    triangulation: Vec<[u32; 3]>,
    triangle_corners: Vec<[usize; 3]>,
    face_normals: Vec<Vec3>,
    vertex_normals: Vec<Vec3>,
    length_scale: f32,
}

impl SurfaceMesh {
    /// Creates a new surface mesh from vertices and polygon faces.
    ///
    /// Each face is a variable-length list of vertex indices forming a polygon.
    pub fn new(name: impl Into<String>, vertices: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Self {
        let mut mesh = Self {
            name: name.into(),
            vertices,
            faces,
            enabled: true,
            transform: Mat4::IDENTITY,
            material: "clay".to_string(),
            slice_planes: Vec::new(),
            texture_quantities: Vec::new(),
            redraw: RedrawRequest::new(),

            face_inds_start: Vec::new(),
            face_inds_entries: Vec::new(),
            triangulation: Vec::new(),
            triangle_corners: Vec::new(),
            face_normals: Vec::new(),
            vertex_normals: Vec::new(),
            length_scale: 1.0,
        };
        mesh.recompute();
        mesh
    }

    /// Creates a new surface mesh from triangles.
    pub fn from_triangles(
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    ) -> Self {
        let faces = triangles.into_iter().map(|t| t.to_vec()).collect();
        Self::new(name, vertices, faces)
    }

    /// Shares a redraw handle with this mesh and its quantities.
    #[must_use]
    pub fn with_redraw_request(mut self, redraw: RedrawRequest) -> Self {
        self.redraw = redraw;
        self
    }

    /// Returns the number of triangles in the triangulation.
    pub fn num_triangles(&self) -> usize {
        self.triangulation.len()
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<u32>] {
        &self.faces
    }

    /// The triangulation as vertex indices.
    pub fn triangulation(&self) -> &[[u32; 3]] {
        &self.triangulation
    }

    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    pub fn vertex_normals(&self) -> &[Vec3] {
        &self.vertex_normals
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.redraw.request();
    }

    /// Sets the object transform. Only affects uniforms.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.redraw.request();
    }

    /// Sets the material. Switching between lit and flat materials changes
    /// the lighting rule, so quantities rebuild on their next update.
    ///
    /// Fails with `UnknownMaterial` if the backend has no such material; the
    /// current material is kept.
    pub fn set_material(&mut self, material: impl Into<String>, engine: &dyn RenderEngine) -> Result<()> {
        let material = material.into();
        if !engine.has_material(&material) {
            return Err(RenderError::UnknownMaterial(material).into());
        }
        self.material = material;
        self.redraw.request();
        Ok(())
    }

    /// Updates the vertex positions and re-uploads geometry of every quantity.
    pub fn update_vertices(&mut self, vertices: Vec<Vec3>, engine: &mut dyn RenderEngine) -> Result<()> {
        if vertices.len() != self.vertices.len() {
            return Err(PolyscopeError::SizeMismatch {
                expected: self.vertices.len(),
                actual: vertices.len(),
            });
        }
        self.vertices = vertices;
        self.recompute();
        self.refresh(engine)
    }

    // === Slice planes ===

    /// Adds a slice plane. Returns its index, or `None` when all
    /// [`MAX_SLICE_PLANES`] slots are taken.
    pub fn add_slice_plane(&mut self, plane: SlicePlane) -> Option<usize> {
        if self.slice_planes.len() >= MAX_SLICE_PLANES {
            log::warn!(
                "mesh '{}' already has {MAX_SLICE_PLANES} slice planes, ignoring '{}'",
                self.name,
                plane.name()
            );
            return None;
        }
        self.slice_planes.push(plane);
        self.redraw.request();
        Some(self.slice_planes.len() - 1)
    }

    pub fn slice_planes(&self) -> &[SlicePlane] {
        &self.slice_planes
    }

    pub fn slice_plane_mut(&mut self, index: usize) -> Option<&mut SlicePlane> {
        self.redraw.request();
        self.slice_planes.get_mut(index)
    }

    pub fn remove_slice_plane(&mut self, index: usize) -> Option<SlicePlane> {
        if index >= self.slice_planes.len() {
            return None;
        }
        self.redraw.request();
        Some(self.slice_planes.remove(index))
    }

    // === Quantities ===

    /// Adds a texture quantity and builds its program.
    ///
    /// `coords` holds one UV per vertex or per face corner, as `domain` says.
    pub fn add_texture_quantity(
        &mut self,
        name: impl Into<String>,
        coords: Vec<Vec2>,
        domain: ParamDomain,
        texture: Arc<Texture>,
        options: &TextureQuantityOptions,
        engine: &mut dyn RenderEngine,
    ) -> Result<&mut SurfaceTextureQuantity> {
        let name = name.into();
        if self.texture_quantities.iter().any(|q| q.name() == name) {
            return Err(PolyscopeError::QuantityExists(name, self.name.clone()));
        }

        let mut quantity = SurfaceTextureQuantity::new(name, &*self, coords, domain, texture, options)?
            .with_redraw_request(self.redraw.clone());
        quantity.rebuild(&*self, engine)?;
        self.texture_quantities.push(quantity);
        self.redraw.request();

        let index = self.texture_quantities.len() - 1;
        Ok(&mut self.texture_quantities[index])
    }

    pub fn texture_quantity(&self, name: &str) -> Option<&SurfaceTextureQuantity> {
        self.texture_quantities.iter().find(|q| q.name() == name)
    }

    pub fn texture_quantity_names(&self) -> Vec<&str> {
        self.texture_quantities.iter().map(Quantity::name).collect()
    }

    /// Removes a quantity, releasing its program.
    pub fn remove_quantity(&mut self, name: &str) -> Result<()> {
        let index = self
            .texture_quantities
            .iter()
            .position(|q| q.name() == name)
            .ok_or_else(|| PolyscopeError::QuantityNotFound(name.to_string(), self.name.clone()))?;
        self.texture_quantities.remove(index);
        self.redraw.request();
        Ok(())
    }

    /// Runs `f` on a quantity with this mesh as its parent.
    pub fn update_texture_quantity<R>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut SurfaceTextureQuantity, &dyn MeshParent) -> Result<R>,
    ) -> Result<R> {
        let mut quantities = std::mem::take(&mut self.texture_quantities);
        let result = match quantities.iter_mut().find(|q| q.name() == name) {
            Some(quantity) => f(quantity, &*self),
            None => Err(PolyscopeError::QuantityNotFound(
                name.to_string(),
                self.name.clone(),
            )),
        };
        self.texture_quantities = quantities;
        result
    }

    /// Rebuilds every quantity whose program no longer matches its
    /// configuration. Returns the number of rebuilds.
    pub fn update_quantities(&mut self, engine: &mut dyn RenderEngine) -> Result<usize> {
        let mut quantities = std::mem::take(&mut self.texture_quantities);
        let mut rebuilt = 0;
        let mut result = Ok(());
        for quantity in &mut quantities {
            match quantity.update(&*self, engine) {
                Ok(true) => rebuilt += 1,
                Ok(false) => {}
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        self.texture_quantities = quantities;
        result.map(|()| rebuilt)
    }

    /// Forces a rebuild of every quantity.
    pub fn refresh(&mut self, engine: &mut dyn RenderEngine) -> Result<()> {
        let mut quantities = std::mem::take(&mut self.texture_quantities);
        let result = quantities
            .iter_mut()
            .try_for_each(|q| q.refresh(&*self, engine));
        self.texture_quantities = quantities;
        result
    }

    /// Draws every enabled quantity.
    pub fn draw(&mut self, engine: &dyn RenderEngine) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut quantities = std::mem::take(&mut self.texture_quantities);
        let result = quantities
            .iter_mut()
            .try_for_each(|q| q.draw(&*self, engine));
        self.texture_quantities = quantities;
        result
    }
}

impl MeshParent for SurfaceMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    fn num_faces(&self) -> usize {
        self.faces.len()
    }

    fn face_inds_start(&self) -> &[usize] {
        &self.face_inds_start
    }

    fn face_inds_entries(&self) -> &[u32] {
        &self.face_inds_entries
    }

    fn triangle_corners(&self) -> &[[usize; 3]] {
        &self.triangle_corners
    }

    fn transform(&self) -> Mat4 {
        self.transform
    }

    fn length_scale(&self) -> f32 {
        self.length_scale
    }

    fn material(&self) -> &str {
        &self.material
    }

    fn add_surface_mesh_rules(&self, engine: &dyn RenderEngine, rules: Vec<RuleRef>) -> Vec<RuleRef> {
        let mut out = Vec::with_capacity(rules.len() + 2 + MAX_SLICE_PLANES);
        let planes: Vec<usize> = self
            .slice_planes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_enabled())
            .map(|(i, _)| i)
            .collect();
        if !planes.is_empty() {
            out.push(RuleRef::new(GENERATE_WORLD_POS));
            out.push(RuleRef::new(CULL_POS_FROM_WORLD));
            out.extend(
                planes
                    .iter()
                    .map(|i| RuleRef::instance(SLICE_PLANE_CULL, i.to_string())),
            );
        }
        out.extend(rules);
        out.push(RuleRef::new(if engine.is_flat_material(&self.material) {
            LIGHT_PASSTHRU
        } else {
            LIGHT_MATCAP
        }));
        out
    }

    fn set_structure_uniforms(&self, program: &mut dyn ShaderProgram) {
        for (i, plane) in self.slice_planes.iter().enumerate() {
            if !plane.is_enabled() {
                continue;
            }
            let (center, normal) = slice_plane_uniform_names(&i.to_string());
            for (name, value) in [
                (center, UniformValue::Vec3(plane.origin())),
                (normal, UniformValue::Vec3(plane.normal())),
            ] {
                if let Err(err) = program.set_uniform(&name, value) {
                    log::trace!("mesh '{}': skipping {name}: {err}", self.name);
                }
            }
        }
    }

    fn set_mesh_geometry_attributes(&self, program: &mut dyn ShaderProgram) -> RenderResult<()> {
        let corner_vertex = |c: usize| self.face_inds_entries[c] as usize;
        let positions: Vec<Vec3> = self
            .triangle_corners
            .iter()
            .flat_map(|tri| tri.iter().map(|&c| self.vertices.get(corner_vertex(c)).copied().unwrap_or(Vec3::ZERO)))
            .collect();
        let normals: Vec<Vec3> = self
            .triangle_corners
            .iter()
            .flat_map(|tri| {
                tri.iter()
                    .map(|&c| self.vertex_normals.get(corner_vertex(c)).copied().unwrap_or(Vec3::ZERO))
            })
            .collect();
        program.set_attribute("a_vertexPositions", AttributeData::Vec3(positions))?;
        program.set_attribute("a_vertexNormals", AttributeData::Vec3(normals))?;
        Ok(())
    }
}
