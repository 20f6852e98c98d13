//! Shader replacement rules.
//!
//! A [`ShaderRule`] is a named bundle of source snippets, each keyed by the
//! template marker it is injected at, plus the uniforms, attributes and
//! textures the snippets need. Programs are assembled from a base template and
//! an ordered list of rules (see [`crate::shader::ShaderAssembler`]).

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Data type of a uniform or vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int,
    UInt,
    Float,
    Vector2Float,
    Vector3Float,
    Vector4Float,
    Matrix44Float,
    Vector2UInt,
    Vector3UInt,
    Vector4UInt,
}

impl DataType {
    /// Number of scalar components.
    pub fn components(self) -> usize {
        match self {
            Self::Int | Self::UInt | Self::Float => 1,
            Self::Vector2Float | Self::Vector2UInt => 2,
            Self::Vector3Float | Self::Vector3UInt => 3,
            Self::Vector4Float | Self::Vector4UInt => 4,
            Self::Matrix44Float => 16,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::Vector2Float => "vec2",
            Self::Vector3Float => "vec3",
            Self::Vector4Float => "vec4",
            Self::Matrix44Float => "mat4",
            Self::Vector2UInt => "uvec2",
            Self::Vector3UInt => "uvec3",
            Self::Vector4UInt => "uvec4",
        };
        f.write_str(name)
    }
}

/// Dimensionality of a texture sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureDim {
    D1,
    D2,
    D3,
    /// A layered 2D texture.
    Array,
}

impl fmt::Display for TextureDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::D1 => "1D",
            Self::D2 => "2D",
            Self::D3 => "3D",
            Self::Array => "2D array",
        };
        f.write_str(name)
    }
}

/// A uniform required by a rule or template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniformDecl {
    pub name: String,
    pub ty: DataType,
}

/// A per-vertex attribute required by a rule or template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub name: String,
    pub ty: DataType,
}

/// A texture sampler required by a rule or template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureDecl {
    pub name: String,
    pub dim: TextureDim,
}

/// An immutable, named set of marker substitutions and declarations.
///
/// Two rules are equal when their names are equal; content is not compared.
/// The registry rejects a second registration under an existing name.
#[derive(Debug, Clone)]
pub struct ShaderRule {
    name: String,
    replacements: Vec<(String, String)>,
    uniforms: Vec<UniformDecl>,
    attributes: Vec<AttributeDecl>,
    textures: Vec<TextureDecl>,
}

impl ShaderRule {
    /// Creates an empty rule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replacements: Vec::new(),
            uniforms: Vec::new(),
            attributes: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// Adds a snippet injected at `marker`.
    #[must_use]
    pub fn replace(mut self, marker: impl Into<String>, source: impl Into<String>) -> Self {
        self.replacements.push((marker.into(), source.into()));
        self
    }

    /// Declares a uniform.
    #[must_use]
    pub fn uniform(mut self, name: impl Into<String>, ty: DataType) -> Self {
        self.uniforms.push(UniformDecl {
            name: name.into(),
            ty,
        });
        self
    }

    /// Declares a vertex attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, ty: DataType) -> Self {
        self.attributes.push(AttributeDecl {
            name: name.into(),
            ty,
        });
        self
    }

    /// Declares a texture sampler.
    #[must_use]
    pub fn texture(mut self, name: impl Into<String>, dim: TextureDim) -> Self {
        self.textures.push(TextureDecl {
            name: name.into(),
            dim,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marker/snippet pairs, in insertion order.
    pub fn replacements(&self) -> &[(String, String)] {
        &self.replacements
    }

    /// Snippets this rule injects at `marker`, in insertion order.
    pub fn snippets_for<'a>(&'a self, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.replacements
            .iter()
            .filter(move |(m, _)| m == marker)
            .map(|(_, src)| src.as_str())
    }

    pub fn uniforms(&self) -> &[UniformDecl] {
        &self.uniforms
    }

    pub fn attributes(&self) -> &[AttributeDecl] {
        &self.attributes
    }

    pub fn textures(&self) -> &[TextureDecl] {
        &self.textures
    }
}

impl PartialEq for ShaderRule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ShaderRule {}

impl Hash for ShaderRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A reference to a registered rule, with the suffix a generator rule needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleRef {
    pub name: String,
    pub suffix: Option<String>,
}

impl RuleRef {
    /// References a static rule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suffix: None,
        }
    }

    /// References one instance of a generator rule.
    pub fn instance(name: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suffix: Some(suffix.into()),
        }
    }
}

impl From<&str> for RuleRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RuleRef {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{}[{suffix}]", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Builds a rule list from plain names.
pub fn rule_refs<I, S>(names: I) -> Vec<RuleRef>
where
    I: IntoIterator<Item = S>,
    S: Into<RuleRef>,
{
    names.into_iter().map(Into::into).collect()
}
