//! Quantity trait and related types.
//!
//! A [`Quantity`] represents data associated with a structure, such as UV
//! coordinates or a texture mapped onto a surface mesh.

use serde::{Deserialize, Serialize};

/// The kind of quantity (for categorization and UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityKind {
    /// Scalar values (single float per element).
    Scalar,
    /// Vector values (Vec3 per element).
    Vector,
    /// Color values (RGB or RGBA per element).
    Color,
    /// Parameterization values (UV coordinates).
    Parameterization,
    /// A texture image sampled through UV coordinates.
    Texture,
    /// Other/custom quantity type.
    Other,
}

/// Data associated with a structure that can be visualized.
pub trait Quantity: Send + Sync {
    /// Returns the name of this quantity.
    fn name(&self) -> &str;

    /// Returns the name shown in the UI.
    fn nice_name(&self) -> String {
        self.name().to_string()
    }

    /// Returns the name of the parent structure.
    fn structure_name(&self) -> &str;

    /// Returns the kind of this quantity.
    fn kind(&self) -> QuantityKind;

    /// Returns whether this quantity is currently enabled/visible.
    fn is_enabled(&self) -> bool;

    /// Sets the enabled state of this quantity.
    fn set_enabled(&mut self, enabled: bool);

    /// Returns the number of data elements.
    fn data_size(&self) -> usize;
}

/// How a parameterization is visualized on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ParamVizStyle {
    /// Sample the bound texture image.
    #[default]
    Texture,
    /// Texture with an alternating checker darkening on top.
    Checker,
    /// Texture with darkened grid lines on top.
    Grid,
    /// The UV coordinates themselves, shown as a color.
    PassThrough,
}

impl ParamVizStyle {
    /// All styles, in UI order.
    pub const ALL: [Self; 4] = [Self::Texture, Self::Checker, Self::Grid, Self::PassThrough];

    /// Label used in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Texture => "Texture",
            Self::Checker => "Checker",
            Self::Grid => "Grid",
            Self::PassThrough => "Pass-through",
        }
    }
}

/// What the UV coordinates mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ParamCoordsType {
    /// Coordinates in [0, 1] (the usual texture space).
    #[default]
    Unit,
    /// Coordinates scaled like world-space lengths.
    World,
}

/// Which mesh element each UV coordinate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ParamDomain {
    /// One coordinate per mesh vertex.
    #[default]
    Vertex,
    /// One coordinate per face corner, in face order.
    Corner,
}
