//! Parameterization (UV) styling shared by quantities that draw through UVs.

use glam::Vec2;
use polyscope_core::error::{PolyscopeError, Result};
use polyscope_core::options::TextureQuantityOptions;
use polyscope_core::quantity::{ParamCoordsType, ParamDomain, ParamVizStyle};
use polyscope_render::builtin_rules::{
    CHECKER_TILE2COLOR, GRID_TILE2COLOR, MESH_PROPAGATE_VALUE2, PARAM_FLIP_U, PARAM_FLIP_V,
    PARAM_TRANSFORM_VALUE2, SHADE_TEXTURE2COLOR, SHADE_VALUE2_AS_COLOR,
};
use polyscope_render::{RuleRef, UniformValue};

use super::MeshParent;

/// UV coordinates plus the parameters that style them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamState {
    pub(crate) coords: Vec<Vec2>,
    pub(crate) domain: ParamDomain,
    pub(crate) coords_type: ParamCoordsType,
    pub(crate) style: ParamVizStyle,
    pub(crate) checker_size: f32,
    pub(crate) alt_darkness: f32,
    pub(crate) rotation: f32,
    pub(crate) flip_u: bool,
    pub(crate) flip_v: bool,
}

impl ParamState {
    /// Creates a state from coordinates and option defaults.
    pub fn new(coords: Vec<Vec2>, domain: ParamDomain, options: &TextureQuantityOptions) -> Result<Self> {
        Ok(Self {
            coords,
            domain,
            coords_type: ParamCoordsType::Unit,
            style: options.style,
            checker_size: validate_checker_size(options.checker_size)?,
            alt_darkness: validate_alt_darkness(options.alt_darkness)?,
            rotation: validate_rotation(options.rotation)?,
            flip_u: options.flip_u,
            flip_v: options.flip_v,
        })
    }

    /// Number of coordinates the parent mesh needs for `domain`.
    pub fn expected_len(domain: ParamDomain, parent: &dyn MeshParent) -> usize {
        match domain {
            ParamDomain::Vertex => parent.num_vertices(),
            ParamDomain::Corner => parent.num_corners(),
        }
    }
}

pub(crate) fn validate_checker_size(size: f32) -> Result<f32> {
    if size.is_finite() && size > 0.0 {
        Ok(size)
    } else {
        Err(PolyscopeError::InvalidParameter {
            parameter: "checker_size".to_string(),
            reason: format!("must be positive, got {size}"),
        })
    }
}

pub(crate) fn validate_alt_darkness(darkness: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&darkness) {
        Ok(darkness)
    } else {
        Err(PolyscopeError::InvalidParameter {
            parameter: "alt_darkness".to_string(),
            reason: format!("must be in [0, 1], got {darkness}"),
        })
    }
}

pub(crate) fn validate_rotation(angle: f32) -> Result<f32> {
    if angle.is_finite() {
        Ok(angle)
    } else {
        Err(PolyscopeError::InvalidParameter {
            parameter: "rotation".to_string(),
            reason: format!("must be finite, got {angle}"),
        })
    }
}

/// UV-parameterized styling.
///
/// Implementors expose their [`ParamState`]; everything else is derived:
/// the style-dependent part of the rule list, the per-frame uniforms, and
/// the per-corner coordinate buffer.
pub trait ParameterizationStyling {
    fn param_state(&self) -> &ParamState;

    fn coords(&self) -> &[Vec2] {
        &self.param_state().coords
    }

    fn domain(&self) -> ParamDomain {
        self.param_state().domain
    }

    fn coords_type(&self) -> ParamCoordsType {
        self.param_state().coords_type
    }

    fn style(&self) -> ParamVizStyle {
        self.param_state().style
    }

    fn checker_size(&self) -> f32 {
        self.param_state().checker_size
    }

    fn alt_darkness(&self) -> f32 {
        self.param_state().alt_darkness
    }

    fn rotation(&self) -> f32 {
        self.param_state().rotation
    }

    fn flip_u(&self) -> bool {
        self.param_state().flip_u
    }

    fn flip_v(&self) -> bool {
        self.param_state().flip_v
    }

    /// Rules for the current style and flips, before any structure rules.
    fn style_rules(&self) -> Vec<RuleRef> {
        let state = self.param_state();
        let mut rules = vec![RuleRef::new(MESH_PROPAGATE_VALUE2)];
        if state.flip_u {
            rules.push(RuleRef::new(PARAM_FLIP_U));
        }
        if state.flip_v {
            rules.push(RuleRef::new(PARAM_FLIP_V));
        }
        rules.push(RuleRef::new(PARAM_TRANSFORM_VALUE2));
        match state.style {
            ParamVizStyle::Texture => rules.push(RuleRef::new(SHADE_TEXTURE2COLOR)),
            ParamVizStyle::Checker => {
                rules.push(RuleRef::new(SHADE_TEXTURE2COLOR));
                rules.push(RuleRef::new(CHECKER_TILE2COLOR));
            }
            ParamVizStyle::Grid => {
                rules.push(RuleRef::new(SHADE_TEXTURE2COLOR));
                rules.push(RuleRef::new(GRID_TILE2COLOR));
            }
            ParamVizStyle::PassThrough => rules.push(RuleRef::new(SHADE_VALUE2_AS_COLOR)),
        }
        rules
    }

    /// Uniform values pushed every frame. `u_modLen` scales the coordinates;
    /// world-space coordinates are first normalized by the mesh size.
    fn style_uniforms(&self, length_scale: f32) -> [(&'static str, UniformValue); 3] {
        let state = self.param_state();
        let mod_len = match state.coords_type {
            ParamCoordsType::Unit => state.checker_size,
            ParamCoordsType::World if length_scale > 0.0 => state.checker_size / length_scale,
            ParamCoordsType::World => state.checker_size,
        };
        [
            ("u_modLen", UniformValue::Float(mod_len)),
            ("u_modDarkness", UniformValue::Float(state.alt_darkness)),
            ("u_angle", UniformValue::Float(state.rotation)),
        ]
    }

    /// Coordinates laid out per triangle corner, in the parent's draw order.
    fn corner_coords(&self, parent: &dyn MeshParent) -> Vec<Vec2> {
        let state = self.param_state();
        let entries = parent.face_inds_entries();
        let lookup = |corner: usize| -> Vec2 {
            let index = match state.domain {
                ParamDomain::Vertex => entries.get(corner).map(|&v| v as usize),
                ParamDomain::Corner => Some(corner),
            };
            index
                .and_then(|i| state.coords.get(i))
                .copied()
                .unwrap_or(Vec2::ZERO)
        };

        parent
            .triangle_corners()
            .iter()
            .flat_map(|tri| tri.iter().map(|&c| lookup(c)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Styled(ParamState);

    impl ParameterizationStyling for Styled {
        fn param_state(&self) -> &ParamState {
            &self.0
        }
    }

    fn styled(options: &TextureQuantityOptions) -> Styled {
        Styled(ParamState::new(vec![Vec2::ZERO], ParamDomain::Vertex, options).unwrap())
    }

    fn names(rules: &[RuleRef]) -> Vec<&str> {
        rules.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_style_rules_per_style() {
        let mut options = TextureQuantityOptions {
            flip_v: false,
            ..TextureQuantityOptions::default()
        };
        assert_eq!(
            names(&styled(&options).style_rules()),
            vec![MESH_PROPAGATE_VALUE2, PARAM_TRANSFORM_VALUE2, SHADE_TEXTURE2COLOR]
        );

        options.style = ParamVizStyle::Checker;
        assert_eq!(
            names(&styled(&options).style_rules()),
            vec![
                MESH_PROPAGATE_VALUE2,
                PARAM_TRANSFORM_VALUE2,
                SHADE_TEXTURE2COLOR,
                CHECKER_TILE2COLOR
            ]
        );

        options.style = ParamVizStyle::PassThrough;
        options.flip_u = true;
        options.flip_v = true;
        assert_eq!(
            names(&styled(&options).style_rules()),
            vec![
                MESH_PROPAGATE_VALUE2,
                PARAM_FLIP_U,
                PARAM_FLIP_V,
                PARAM_TRANSFORM_VALUE2,
                SHADE_VALUE2_AS_COLOR
            ]
        );
    }

    #[test]
    fn test_world_coords_scale_mod_len() {
        let options = TextureQuantityOptions {
            checker_size: 0.5,
            ..TextureQuantityOptions::default()
        };
        let mut quantity = styled(&options);
        assert_eq!(quantity.style_uniforms(4.0)[0].1, UniformValue::Float(0.5));
        quantity.0.coords_type = ParamCoordsType::World;
        assert_eq!(quantity.style_uniforms(4.0)[0].1, UniformValue::Float(0.125));
        // degenerate meshes fall back to unit scaling
        assert_eq!(quantity.style_uniforms(0.0)[0].1, UniformValue::Float(0.5));
    }

    #[test]
    fn test_invalid_options_rejected() {
        for options in [
            TextureQuantityOptions {
                checker_size: 0.0,
                ..TextureQuantityOptions::default()
            },
            TextureQuantityOptions {
                alt_darkness: 1.5,
                ..TextureQuantityOptions::default()
            },
            TextureQuantityOptions {
                rotation: f32::NAN,
                ..TextureQuantityOptions::default()
            },
        ] {
            assert!(matches!(
                ParamState::new(Vec::new(), ParamDomain::Vertex, &options),
                Err(PolyscopeError::InvalidParameter { .. })
            ));
        }
    }
}
