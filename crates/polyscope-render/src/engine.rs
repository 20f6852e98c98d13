//! Backend-neutral rendering interfaces.
//!
//! Structures and quantities talk to the renderer only through
//! [`RenderEngine`] (to build programs) and [`ShaderProgram`] (to feed and
//! draw them). [`crate::headless::HeadlessEngine`] is the bundled backend.

use std::any::Any;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};
use polyscope_core::error::Result;

use crate::error::RenderResult;
use crate::rules::{DataType, RuleRef};
use crate::shader::ProgramDescription;
use crate::texture::Texture;

/// A value for a single uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// The declared type this value satisfies.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::UInt(_) => DataType::UInt,
            Self::Float(_) => DataType::Float,
            Self::Vec2(_) => DataType::Vector2Float,
            Self::Vec3(_) => DataType::Vector3Float,
            Self::Vec4(_) => DataType::Vector4Float,
            Self::Mat4(_) => DataType::Matrix44Float,
        }
    }

    /// Bytes as uploaded to the GPU (column-major for matrices).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Int(v) => bytemuck::bytes_of(v).to_vec(),
            Self::UInt(v) => bytemuck::bytes_of(v).to_vec(),
            Self::Float(v) => bytemuck::bytes_of(v).to_vec(),
            Self::Vec2(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            Self::Vec3(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            Self::Vec4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            Self::Mat4(v) => bytemuck::cast_slice(&v.to_cols_array()).to_vec(),
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        Self::UInt(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Int(i32::from(v))
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

/// Per-element data for one vertex attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    Float(Vec<f32>),
    Vec2(Vec<Vec2>),
    Vec3(Vec<Vec3>),
    Vec4(Vec<Vec4>),
}

impl AttributeData {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Float(_) => DataType::Float,
            Self::Vec2(_) => DataType::Vector2Float,
            Self::Vec3(_) => DataType::Vector3Float,
            Self::Vec4(_) => DataType::Vector4Float,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tightly packed bytes, as uploaded to a vertex buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Float(v) => bytemuck::cast_slice(v).to_vec(),
            Self::Vec2(v) => {
                let flat: Vec<[f32; 2]> = v.iter().map(|x| x.to_array()).collect();
                bytemuck::cast_slice(&flat).to_vec()
            }
            Self::Vec3(v) => {
                let flat: Vec<[f32; 3]> = v.iter().map(|x| x.to_array()).collect();
                bytemuck::cast_slice(&flat).to_vec()
            }
            Self::Vec4(v) => {
                let flat: Vec<[f32; 4]> = v.iter().map(|x| x.to_array()).collect();
                bytemuck::cast_slice(&flat).to_vec()
            }
        }
    }
}

/// Sampling options for a bound texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerOptions {
    /// Keep the alpha channel instead of forcing opaque.
    pub with_alpha: bool,
    /// Generate and sample mipmaps.
    pub use_mipmap: bool,
    /// Wrap coordinates outside [0, 1] instead of clamping.
    pub repeat: bool,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            with_alpha: true,
            use_mipmap: true,
            repeat: true,
        }
    }
}

/// A texture bound to a program sampler.
#[derive(Debug, Clone)]
pub struct BoundTexture {
    pub texture: Arc<Texture>,
    pub options: SamplerOptions,
}

/// A compiled program owned by one quantity.
pub trait ShaderProgram: Send + Sync {
    /// The description the program was compiled from.
    fn description(&self) -> &ProgramDescription;

    /// Sets a declared uniform; the value type must match the declaration.
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()>;

    /// Uploads a declared per-element attribute.
    fn set_attribute(&mut self, name: &str, data: AttributeData) -> RenderResult<()>;

    /// Binds a texture to a declared sampler of the same dimensionality.
    fn set_texture(
        &mut self,
        name: &str,
        texture: Arc<Texture>,
        options: SamplerOptions,
    ) -> RenderResult<()>;

    /// All currently bound textures, keyed by sampler name.
    fn bound_textures(&self) -> Vec<(String, BoundTexture)>;

    /// Issues the draw call.
    fn draw(&mut self) -> RenderResult<()>;

    /// Downcasting hook for backend-specific inspection.
    fn as_any(&self) -> &dyn Any;

    /// Returns true if the program declares `name` as a uniform.
    fn has_uniform(&self, name: &str) -> bool {
        self.description().uniform_type(name).is_some()
    }

    /// Returns true if the program declares `name` as a texture.
    fn has_texture(&self, name: &str) -> bool {
        self.description().texture_dim(name).is_some()
    }

    /// Rebinds every texture of `other` that this program declares with the
    /// same dimensionality. Returns the number of textures carried over.
    fn copy_textures_from(&mut self, other: &dyn ShaderProgram) -> usize {
        let mut copied = 0;
        for (name, bound) in other.bound_textures() {
            if self.description().texture_dim(&name) != Some(bound.texture.dim()) {
                continue;
            }
            if self.set_texture(&name, bound.texture, bound.options).is_ok() {
                copied += 1;
            }
        }
        copied
    }
}

/// Builds programs and supplies the scene-wide state they read.
pub trait RenderEngine {
    /// Assembles and compiles a program from a base template and an ordered
    /// rule list. Backend-wide rules (version header, global filters) are
    /// prepended by the engine.
    fn request_shader(&mut self, base_name: &str, rules: &[RuleRef]) -> Result<Box<dyn ShaderProgram>>;

    /// Binds whatever a material needs (matcap textures) to `program`.
    fn set_material(&self, program: &mut dyn ShaderProgram, material: &str) -> RenderResult<()>;

    /// Returns true if `material` is known to this backend.
    fn has_material(&self, material: &str) -> bool;

    /// Returns true if `material` is unlit.
    fn is_flat_material(&self, material: &str) -> bool;

    /// Sets view, projection and viewport uniforms for a structure with
    /// the given object transform.
    fn set_camera_uniforms(&self, program: &mut dyn ShaderProgram, model: Mat4);

    fn view_matrix(&self) -> Mat4;

    fn projection_matrix(&self) -> Mat4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_value_types() {
        assert_eq!(UniformValue::from(1.0_f32).data_type(), DataType::Float);
        assert_eq!(UniformValue::from(true), UniformValue::Int(1));
        assert_eq!(UniformValue::from(Vec3::ONE).data_type(), DataType::Vector3Float);
        assert_eq!(UniformValue::from(Mat4::IDENTITY).to_bytes().len(), 64);
    }

    #[test]
    fn test_attribute_bytes_are_packed() {
        let data = AttributeData::Vec2(vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.data_type(), DataType::Vector2Float);
        let expected: &[u8] = bytemuck::cast_slice(&[1.0_f32, 2.0, 3.0, 4.0]);
        assert_eq!(data.to_bytes(), expected);
    }

    #[test]
    fn test_sampler_defaults() {
        let options = SamplerOptions::default();
        assert!(options.with_alpha && options.use_mipmap && options.repeat);
    }
}
