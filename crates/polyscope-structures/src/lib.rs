//! Structure implementations for polyscope-rs.
//!
//! This crate provides the surface mesh structure and the quantities drawn
//! on it:
//! - Flattened polygon faces and their fan triangulation
//! - UV parameterization styling (texture, checker, grid, pass-through)
//! - Texture quantities that keep their shader program in sync with their
//!   configuration

// Graphics code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod surface_mesh;

pub use surface_mesh::{
    fan_triangulate, MeshParent, ParamState, ParameterizationStyling, SurfaceMesh,
    SurfaceMeshQuantity, SurfaceTextureQuantity, TextureQuantitySettings,
};
