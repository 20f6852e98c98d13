//! Core abstractions for polyscope-rs.
//!
//! This crate provides the fundamental types used throughout polyscope-rs:
//! - [`PolyscopeError`], the error taxonomy shared by every crate
//! - [`Quantity`] trait for data associated with structures
//! - Parameterization enums used by UV and texture quantities
//! - Configuration options and slice planes

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod options;
pub mod quantity;
pub mod slice_plane;
pub mod state;

pub use error::{PolyscopeError, Result};
pub use options::{Options, TextureQuantityOptions};
pub use quantity::{ParamCoordsType, ParamDomain, ParamVizStyle, Quantity, QuantityKind};
pub use slice_plane::{SlicePlane, MAX_SLICE_PLANES};
pub use state::RedrawRequest;

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
