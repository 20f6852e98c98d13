//! Configuration options for polyscope.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::quantity::ParamVizStyle;

/// Global configuration options for polyscope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Material assigned to newly registered surface meshes.
    pub default_material: String,

    /// Defaults applied to newly created texture quantities.
    pub texture_quantity: TextureQuantityOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_material: "clay".to_string(),
            texture_quantity: TextureQuantityOptions::default(),
        }
    }
}

impl Options {
    /// Parses options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Initial parameter values for a surface texture quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureQuantityOptions {
    /// Texture scale, also the checker/grid period.
    pub checker_size: f32,
    /// Darkening factor of the alternate checker cells and grid lines.
    pub alt_darkness: f32,
    /// Rotation of the UV coordinates, in radians.
    pub rotation: f32,
    /// Mirror the U coordinate.
    pub flip_u: bool,
    /// Mirror the V coordinate (images are stored top row first).
    pub flip_v: bool,
    /// Initial visualization style.
    pub style: ParamVizStyle,
}

impl Default for TextureQuantityOptions {
    fn default() -> Self {
        Self {
            checker_size: 1.0,
            alt_darkness: 1.0,
            rotation: 0.0,
            flip_u: false,
            flip_v: true,
            style: ParamVizStyle::Texture,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_texture_options() {
        let opts = TextureQuantityOptions::default();
        assert!((opts.checker_size - 1.0).abs() < f32::EPSILON);
        assert!((opts.alt_darkness - 1.0).abs() < f32::EPSILON);
        assert!(!opts.flip_u);
        assert!(opts.flip_v);
        assert_eq!(opts.style, ParamVizStyle::Texture);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let opts = Options::from_json(r#"{ "texture_quantity": { "flip_v": false } }"#).unwrap();
        assert!(!opts.texture_quantity.flip_v);
        assert!((opts.texture_quantity.checker_size - 1.0).abs() < f32::EPSILON);
        assert_eq!(opts.default_material, "clay");
    }

    #[test]
    fn test_json_round_trip() {
        let mut opts = Options::default();
        opts.texture_quantity.style = ParamVizStyle::Grid;
        opts.default_material = "wax".to_string();
        let parsed = Options::from_json(&opts.to_json().unwrap()).unwrap();
        assert_eq!(parsed, opts);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Options::from_json("{ not json").is_err());
    }
}
