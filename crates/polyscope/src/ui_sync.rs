//! Glue between UI settings snapshots and texture quantities.

use polyscope_core::error::Result;
use polyscope_core::quantity::Quantity;
use polyscope_render::RenderEngine;
use polyscope_structures::{
    MeshParent, ParameterizationStyling, SurfaceTextureQuantity, TextureQuantitySettings,
};

/// Which path applying a settings snapshot took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePath {
    /// The snapshot matched the quantity.
    Unchanged,
    /// Only uniform-level state changed; the program was kept.
    Uniform,
    /// The rule list changed and the program was rebuilt.
    Rebuild,
}

/// Syncs a settings snapshot edited in the UI back to the quantity.
///
/// Uniform-level fields are applied first. If the rebuild that rule-level
/// fields require fails, they are restored so the quantity is left as it was.
pub fn apply_texture_quantity_settings(
    quantity: &mut SurfaceTextureQuantity,
    settings: &TextureQuantitySettings,
    mesh: &dyn MeshParent,
    engine: &mut dyn RenderEngine,
) -> Result<UpdatePath> {
    let previous = quantity.settings();
    if previous == *settings {
        return Ok(UpdatePath::Unchanged);
    }

    if let Err(err) = apply_uniform_settings(quantity, settings) {
        apply_uniform_settings(quantity, &previous)?;
        return Err(err);
    }
    match quantity.configure(settings.style, settings.flip_u, settings.flip_v, mesh, engine) {
        Ok(true) => Ok(UpdatePath::Rebuild),
        Ok(false) => Ok(UpdatePath::Uniform),
        Err(err) => {
            apply_uniform_settings(quantity, &previous)?;
            Err(err)
        }
    }
}

#[allow(clippy::float_cmp)]
fn apply_uniform_settings(
    quantity: &mut SurfaceTextureQuantity,
    settings: &TextureQuantitySettings,
) -> Result<()> {
    if quantity.is_enabled() != settings.enabled {
        quantity.set_enabled(settings.enabled);
    }
    if quantity.coords_type() != settings.coords_type {
        quantity.set_coords_type(settings.coords_type);
    }
    if quantity.checker_size() != settings.checker_size {
        quantity.set_checker_size(settings.checker_size)?;
    }
    if quantity.rotation() != settings.rotation {
        quantity.set_rotation(settings.rotation)?;
    }
    if quantity.alt_darkness() != settings.alt_darkness {
        quantity.set_alt_darkness(settings.alt_darkness)?;
    }
    Ok(())
}

/// Creates a settings snapshot from the current quantity state.
#[must_use]
pub fn texture_quantity_to_settings(quantity: &SurfaceTextureQuantity) -> TextureQuantitySettings {
    quantity.settings()
}
