//! polyscope-rs: shader rule composition and textured surface meshes.
//!
//! Shader programs are assembled from a base template and an ordered list of
//! named rules. Each rule splices snippets into the template's markers and
//! declares the uniforms, attributes and textures it reads. Quantities on a
//! structure pick their rules from their configuration and rebuild their
//! program whenever that list changes.
//!
//! # Quick Start
//!
//! ```no_run
//! use polyscope_rs::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let mut polyscope = init()?;
//!
//!     let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
//!     polyscope.register_surface_mesh("quad", vertices, vec![vec![0, 1, 2, 3]])?;
//!
//!     let uv = vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
//!     let image = Arc::new(Texture::open("checker.png")?);
//!     polyscope.add_texture_quantity("quad", "uv", uv, ParamDomain::Vertex, image)?;
//!
//!     polyscope.frame_tick()?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - A **rule** is a named, reusable shader fragment; generator rules take a
//!   suffix and produce one instance per use (e.g. one per slice plane).
//! - The **assembler** resolves rule lists against a [`RuleRegistry`] and
//!   produces a [`ProgramDescription`] with merged declarations.
//! - A **structure** ([`SurfaceMesh`]) owns geometry and quantities; a
//!   **quantity** ([`SurfaceTextureQuantity`]) owns its program.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod init;
mod ui_sync;

pub use init::{init, init_with_options, Polyscope};
pub use ui_sync::{apply_texture_quantity_settings, texture_quantity_to_settings, UpdatePath};

// Re-export core types
pub use polyscope_core::{
    error::{PolyscopeError, Result},
    options::{Options, TextureQuantityOptions},
    quantity::{ParamCoordsType, ParamDomain, ParamVizStyle, Quantity, QuantityKind},
    slice_plane::{SlicePlane, MAX_SLICE_PLANES},
    state::RedrawRequest,
    Mat4, Vec2, Vec3, Vec4,
};

// Re-export render types
pub use polyscope_render::{
    builtin_rules, rule_refs, templates, AttributeData, Camera, DataType, HeadlessEngine,
    HeadlessProgram, Material, MaterialRegistry, ProgramDescription, RenderEngine, RuleEntry,
    RuleRef, RuleRegistry, SamplerOptions, ShaderAssembler, ShaderProgram, ShaderRule,
    ShaderStageKind, ShaderTemplate, Texture, TextureDim, UniformValue,
};

// Re-export structures
pub use polyscope_structures::{
    MeshParent, ParameterizationStyling, SurfaceMesh, SurfaceMeshQuantity,
    SurfaceTextureQuantity, TextureQuantitySettings,
};
