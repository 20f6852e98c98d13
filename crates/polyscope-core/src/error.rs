//! Error types for polyscope-rs.

use thiserror::Error;

/// The main error type for polyscope-rs operations.
#[derive(Error, Debug)]
pub enum PolyscopeError {
    /// A shader rule registration was rejected.
    #[error("invalid shader rule '{rule}': {reason}")]
    RuleConfiguration { rule: String, reason: String },

    /// A shader rule with the given name is already registered.
    #[error("shader rule '{0}' already registered")]
    DuplicateRule(String),

    /// A shader rule with the given name was not found.
    #[error("unknown shader rule '{0}'")]
    UnknownRule(String),

    /// A suffix was supplied to a static rule, or withheld from a generator.
    #[error("shader rule '{rule}' misused: {reason}")]
    RuleSuffixMisuse { rule: String, reason: String },

    /// Two rules declare the same uniform with different types.
    #[error("uniform '{name}' declared as both {first} and {second}")]
    UniformTypeConflict {
        name: String,
        first: String,
        second: String,
    },

    /// Two rules declare the same attribute with different types.
    #[error("attribute '{name}' declared as both {first} and {second}")]
    AttributeTypeConflict {
        name: String,
        first: String,
        second: String,
    },

    /// Two rules declare the same texture with different dimensionality.
    #[error("texture '{name}' declared as both {first} and {second}")]
    TextureDimensionConflict {
        name: String,
        first: String,
        second: String,
    },

    /// A template is inconsistent with the rules applied to it.
    #[error("malformed shader template '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    /// The backend has no base template with the given name.
    #[error("unknown shader template '{0}'")]
    UnknownTemplate(String),

    /// A texture does not fit the sampler the current program declares for it.
    #[error("texture '{name}' expects a {expected} sampler, got {actual} data")]
    TextureDimensionMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// The backend compiler rejected an assembled program.
    #[error("shader compilation failed: {message}")]
    ShaderCompile {
        message: String,
        assembled_source: String,
    },

    /// A quantity was drawn before any program was built for it.
    #[error("quantity '{0}' has no shader program")]
    NoProgram(String),

    /// A quantity was drawn with a program that no longer matches its configuration.
    #[error("shader program of quantity '{0}' is stale, rebuild before drawing")]
    StaleProgram(String),

    /// A structure with the given name already exists.
    #[error("structure '{0}' already exists")]
    StructureExists(String),

    /// A structure with the given name was not found.
    #[error("structure '{0}' not found")]
    StructureNotFound(String),

    /// A quantity with the given name already exists.
    #[error("quantity '{0}' already exists on structure '{1}'")]
    QuantityExists(String, String),

    /// A quantity with the given name was not found.
    #[error("quantity '{0}' not found on structure '{1}'")]
    QuantityNotFound(String, String),

    /// A parameter value is outside its valid range.
    #[error("invalid value for '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Rendering error reported by the backend.
    #[error("render error: {0}")]
    RenderError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for polyscope-rs operations.
pub type Result<T> = std::result::Result<T, PolyscopeError>;
