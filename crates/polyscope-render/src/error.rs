//! Rendering error types.

use polyscope_core::PolyscopeError;
use thiserror::Error;

use crate::rules::{DataType, TextureDim};

/// Errors a backend reports when a compiled program is fed data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The program declares no such uniform.
    #[error("program has no uniform '{0}'")]
    UnknownUniform(String),

    /// A uniform value does not match its declared type.
    #[error("uniform '{name}' is {expected}, got {actual}")]
    UniformTypeMismatch {
        name: String,
        expected: DataType,
        actual: DataType,
    },

    /// The program declares no such attribute.
    #[error("program has no attribute '{0}'")]
    UnknownAttribute(String),

    /// Attribute data does not match its declared type.
    #[error("attribute '{name}' is {expected}, got {actual}")]
    AttributeTypeMismatch {
        name: String,
        expected: DataType,
        actual: DataType,
    },

    /// Attribute buffers of one program disagree in length.
    #[error("attribute '{name}' has {actual} elements, expected {expected}")]
    AttributeLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A declared attribute was never uploaded.
    #[error("attribute '{0}' was never set")]
    MissingAttribute(String),

    /// The program declares no such texture.
    #[error("program has no texture '{0}'")]
    UnknownTexture(String),

    /// A texture does not match its declared dimensionality.
    #[error("texture '{name}' is {expected}, got {actual}")]
    TextureDimensionMismatch {
        name: String,
        expected: TextureDim,
        actual: TextureDim,
    },

    /// A declared texture has nothing bound.
    #[error("texture '{0}' was never bound")]
    MissingTexture(String),

    /// No material with this name is registered.
    #[error("unknown material '{0}'")]
    UnknownMaterial(String),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for PolyscopeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::TextureDimensionMismatch {
                name,
                expected,
                actual,
            } => PolyscopeError::TextureDimensionMismatch {
                name,
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            other => PolyscopeError::RenderError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_maps_to_core_variant() {
        let err: PolyscopeError = RenderError::TextureDimensionMismatch {
            name: "t_image".to_string(),
            expected: TextureDim::D2,
            actual: TextureDim::D1,
        }
        .into();
        assert!(matches!(
            err,
            PolyscopeError::TextureDimensionMismatch { name, .. } if name == "t_image"
        ));
    }

    #[test]
    fn test_other_errors_map_to_render_error() {
        let err: PolyscopeError = RenderError::UnknownMaterial("glass".to_string()).into();
        assert!(matches!(err, PolyscopeError::RenderError(msg) if msg.contains("glass")));
    }
}
