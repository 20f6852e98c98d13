//! Rendering backend for polyscope-rs.
//!
//! This crate provides:
//! - Shader rules and the rule registry, including generator rules
//! - Program assembly from base templates and ordered rule lists
//! - Backend-neutral engine and program traits, with a headless backend
//! - Materials, textures and the camera

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod builtin_rules;
pub mod camera;
pub mod engine;
pub mod error;
pub mod headless;
pub mod materials;
pub mod rule_registry;
pub mod rules;
pub mod shader;
pub mod templates;
pub mod texture;

pub use camera::{Camera, ProjectionMode};
pub use engine::{
    AttributeData, BoundTexture, RenderEngine, SamplerOptions, ShaderProgram, UniformValue,
};
pub use error::{RenderError, RenderResult};
pub use headless::{HeadlessEngine, HeadlessProgram, ProgramStats};
pub use materials::{Material, MaterialRegistry, MatcapTextureSet};
pub use rule_registry::{RuleEntry, RuleGenerator, RuleRegistry};
pub use rules::{
    rule_refs, AttributeDecl, DataType, RuleRef, ShaderRule, TextureDecl, TextureDim, UniformDecl,
};
pub use shader::{
    AssembledStage, ProgramDescription, ShaderAssembler, ShaderStage, ShaderStageKind,
    ShaderTemplate,
};
pub use texture::Texture;
