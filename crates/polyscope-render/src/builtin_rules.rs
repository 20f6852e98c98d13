//! The built-in shader rule set.
//!
//! Snippets are GLSL 330. Each comment states what a rule reads and what it
//! defines, since later rules in a list depend on symbols from earlier ones.

use polyscope_core::error::Result;

use crate::rule_registry::{RuleEntry, RuleRegistry};
use crate::rules::{DataType, ShaderRule, TextureDim};

pub const GLSL_VERSION: &str = "GLSL_VERSION";
pub const GLOBAL_FRAGMENT_FILTER: &str = "GLOBAL_FRAGMENT_FILTER";
pub const LIGHT_MATCAP: &str = "LIGHT_MATCAP";
pub const LIGHT_PASSTHRU: &str = "LIGHT_PASSTHRU";
pub const SHADE_BASECOLOR: &str = "SHADE_BASECOLOR";
pub const SHADE_COLOR: &str = "SHADE_COLOR";
pub const SHADE_COLORMAP_VALUE: &str = "SHADE_COLORMAP_VALUE";
pub const SHADE_COLORMAP_ANGULAR2: &str = "SHADE_COLORMAP_ANGULAR2";
pub const SHADE_GRID_VALUE2: &str = "SHADE_GRID_VALUE2";
pub const SHADE_CHECKER_VALUE2: &str = "SHADE_CHECKER_VALUE2";
pub const SHADEVALUE_MAG_VALUE2: &str = "SHADEVALUE_MAG_VALUE2";
pub const ISOLINE_STRIPE_VALUECOLOR: &str = "ISOLINE_STRIPE_VALUECOLOR";
pub const CHECKER_VALUE2COLOR: &str = "CHECKER_VALUE2COLOR";
pub const GENERATE_WORLD_POS: &str = "GENERATE_WORLD_POS";
pub const CULL_POS_FROM_WORLD: &str = "CULL_POS_FROM_WORLD";
pub const CULL_POS_FROM_ATTR: &str = "CULL_POS_FROM_ATTR";
pub const SLICE_PLANE_CULL: &str = "SLICE_PLANE_CULL";
pub const MESH_PROPAGATE_VALUE2: &str = "MESH_PROPAGATE_VALUE2";
pub const PARAM_FLIP_U: &str = "PARAM_FLIP_U";
pub const PARAM_FLIP_V: &str = "PARAM_FLIP_V";
pub const PARAM_TRANSFORM_VALUE2: &str = "PARAM_TRANSFORM_VALUE2";
pub const SHADE_TEXTURE2COLOR: &str = "SHADE_TEXTURE2COLOR";
pub const CHECKER_TILE2COLOR: &str = "CHECKER_TILE2COLOR";
pub const GRID_TILE2COLOR: &str = "GRID_TILE2COLOR";
pub const SHADE_VALUE2_AS_COLOR: &str = "SHADE_VALUE2_AS_COLOR";

/// Attribute carrying per-corner UV coordinates.
pub const VALUE2_ATTRIBUTE: &str = "a_value2";
/// Sampler the texture rules read from.
pub const IMAGE_TEXTURE: &str = "t_image";
/// Matcap samplers bound by the backend for lit materials.
pub const MATCAP_TEXTURES: [&str; 4] = ["t_mat_r", "t_mat_g", "t_mat_b", "t_mat_k"];

/// Uniform names used by the [`SLICE_PLANE_CULL`] instance with `suffix`,
/// as `(center, normal)`.
pub fn slice_plane_uniform_names(suffix: &str) -> (String, String) {
    (
        format!("u_slicePlaneCenter_{suffix}"),
        format!("u_slicePlaneNormal_{suffix}"),
    )
}

/// Culls fragments behind one slice plane.
///
/// The plane's uniforms embed `suffix`, so several planes can be active in the
/// same program.
pub fn generate_slice_plane_rule(suffix: &str) -> ShaderRule {
    let (center, normal) = slice_plane_uniform_names(suffix);
    ShaderRule::new(format!("{SLICE_PLANE_CULL}_{suffix}"))
        .replace(
            "FRAG_DECLARATIONS",
            format!("uniform vec3 {center}; uniform vec3 {normal};"),
        )
        .replace(
            "GLOBAL_FRAGMENT_FILTER",
            format!("if(dot(cullPos, {normal}) < dot({center}, {normal})) {{ discard; }}"),
        )
        .uniform(center, DataType::Vector3Float)
        .uniform(normal, DataType::Vector3Float)
}

/// Registers every built-in rule.
pub fn register_builtin_rules(registry: &mut RuleRegistry) -> Result<()> {
    for rule in builtin_rules() {
        let name = rule.name().to_string();
        registry.register(name, rule)?;
    }
    registry.register(SLICE_PLANE_CULL, RuleEntry::generator(generate_slice_plane_rule))?;
    Ok(())
}

#[allow(clippy::too_many_lines)]
fn builtin_rules() -> Vec<ShaderRule> {
    vec![
        ShaderRule::new(GLSL_VERSION).replace("GLSL_VERSION", "#version 330 core"),
        // possibly discards a fragment due to global rules
        ShaderRule::new(GLOBAL_FRAGMENT_FILTER)
            .replace("GLOBAL_FRAGMENT_FILTER", "// do nothing, for now"),
        // in: vec3 albedoColor, vec3 shadeNormal; out: vec3 litColor
        ShaderRule::new(LIGHT_MATCAP)
            .replace(
                "FRAG_DECLARATIONS",
                "uniform sampler2D t_mat_r;\n\
                 uniform sampler2D t_mat_g;\n\
                 uniform sampler2D t_mat_b;\n\
                 uniform sampler2D t_mat_k;\n\
                 vec3 lightSurfaceMat(vec3 normal, vec3 color, sampler2D t_mat_r, sampler2D t_mat_g, sampler2D t_mat_b, sampler2D t_mat_k);",
            )
            .replace(
                "GENERATE_LIT_COLOR",
                "vec3 litColor = lightSurfaceMat(shadeNormal, albedoColor, t_mat_r, t_mat_g, t_mat_b, t_mat_k);",
            )
            .texture("t_mat_r", TextureDim::D2)
            .texture("t_mat_g", TextureDim::D2)
            .texture("t_mat_b", TextureDim::D2)
            .texture("t_mat_k", TextureDim::D2),
        // in: vec3 albedoColor; out: vec3 litColor
        ShaderRule::new(LIGHT_PASSTHRU)
            .replace("GENERATE_LIT_COLOR", "vec3 litColor = albedoColor;"),
        // out: vec3 albedoColor
        ShaderRule::new(SHADE_BASECOLOR)
            .replace("FRAG_DECLARATIONS", "uniform vec3 u_baseColor;")
            .replace("GENERATE_SHADE_COLOR", "vec3 albedoColor = u_baseColor;")
            .uniform("u_baseColor", DataType::Vector3Float),
        // in: vec3 shadeColor; out: vec3 albedoColor
        ShaderRule::new(SHADE_COLOR)
            .replace("GENERATE_SHADE_COLOR", "vec3 albedoColor = shadeColor;"),
        // in: float shadeValue; out: vec3 albedoColor
        ShaderRule::new(SHADE_COLORMAP_VALUE)
            .replace(
                "FRAG_DECLARATIONS",
                "uniform float u_rangeHigh;\n\
                 uniform float u_rangeLow;\n\
                 uniform sampler1D t_colormap;",
            )
            .replace(
                "GENERATE_SHADE_COLOR",
                "float rangeTVal = (shadeValue - u_rangeLow) / (u_rangeHigh - u_rangeLow);\n\
                 rangeTVal = clamp(rangeTVal, 0.f, 1.f);\n\
                 vec3 albedoColor = texture(t_colormap, rangeTVal).rgb;",
            )
            .uniform("u_rangeLow", DataType::Float)
            .uniform("u_rangeHigh", DataType::Float)
            .texture("t_colormap", TextureDim::D1),
        // in: vec2 shadeValue2; out: vec3 albedoColor
        ShaderRule::new(SHADE_COLORMAP_ANGULAR2)
            .replace(
                "FRAG_DECLARATIONS",
                "uniform float u_angle;\n\
                 uniform sampler1D t_colormap;",
            )
            .replace(
                "GENERATE_SHADE_COLOR",
                "float pi = 3.14159265359;\n\
                 float angle = atan(shadeValue2.y, shadeValue2.x) / (2. * pi) + 0.5;\n\
                 float shiftedAngle = mod(angle + u_angle/(2. * pi), 1.);\n\
                 vec3 albedoColor = texture(t_colormap, shiftedAngle).rgb;",
            )
            .uniform("u_angle", DataType::Float)
            .texture("t_colormap", TextureDim::D1),
        // in: vec2 shadeValue2; out: vec3 albedoColor
        ShaderRule::new(SHADE_GRID_VALUE2)
            .replace(
                "FRAG_DECLARATIONS",
                "uniform float u_modLen;\n\
                 uniform vec3 u_gridLineColor;\n\
                 uniform vec3 u_gridBackgroundColor;",
            )
            .replace(
                "GENERATE_SHADE_COLOR",
                "float mX = mod(shadeValue2.x, 2.0 * u_modLen) / u_modLen - 1.f;\n\
                 float mY = mod(shadeValue2.y, 2.0 * u_modLen) / u_modLen - 1.f;\n\
                 float minD = min(min(abs(mX), 1.0 - abs(mX)), min(abs(mY), 1.0 - abs(mY))) * 2.;\n\
                 float width = 0.05;\n\
                 float slopeWidthPix = 5.;\n\
                 vec2 fw = fwidth(shadeValue2);\n\
                 float scale = max(fw.x, fw.y);\n\
                 float pWidth = slopeWidthPix * scale;\n\
                 float s = smoothstep(width, width + pWidth, minD);\n\
                 vec3 albedoColor = mix(u_gridLineColor, u_gridBackgroundColor, s);",
            )
            .uniform("u_modLen", DataType::Float)
            .uniform("u_gridLineColor", DataType::Vector3Float)
            .uniform("u_gridBackgroundColor", DataType::Vector3Float),
        // in: vec2 shadeValue2; out: vec3 albedoColor
        ShaderRule::new(SHADE_CHECKER_VALUE2)
            .replace(
                "FRAG_DECLARATIONS",
                "uniform float u_modLen;\n\
                 uniform vec3 u_color1;\n\
                 uniform vec3 u_color2;",
            )
            .replace(
                "GENERATE_SHADE_COLOR",
                "float mX = mod(shadeValue2.x, 2.0 * u_modLen) / u_modLen - 1.f;\n\
                 float mY = mod(shadeValue2.y, 2.0 * u_modLen) / u_modLen - 1.f;\n\
                 float minD = min(min(abs(mX), 1.0 - abs(mX)), min(abs(mY), 1.0 - abs(mY))) * 2.;\n\
                 float minDSmooth = pow(minD, 1. / 6.);\n\
                 float v = (mX * mY);\n\
                 float adjV = sign(v) * minDSmooth;\n\
                 float s = smoothstep(-1.f, 1.f, adjV);\n\
                 vec3 albedoColor = mix(u_color1, u_color2, s);",
            )
            .uniform("u_modLen", DataType::Float)
            .uniform("u_color1", DataType::Vector3Float)
            .uniform("u_color2", DataType::Vector3Float),
        // in: vec2 shadeValue2; out: float shadeValue
        ShaderRule::new(SHADEVALUE_MAG_VALUE2)
            .replace("GENERATE_SHADE_COLOR", "float shadeValue = length(shadeValue2);"),
        // in: float shadeValue, vec3 albedoColor; modifies albedoColor
        ShaderRule::new(ISOLINE_STRIPE_VALUECOLOR)
            .replace(
                "FRAG_DECLARATIONS",
                "uniform float u_modLen;\n\
                 uniform float u_modDarkness;",
            )
            .replace(
                "GENERATE_SHADE_COLOR",
                "float modVal = mod(shadeValue, 2.0 * u_modLen);\n\
                 if(modVal > u_modLen) {\n\
                   albedoColor *= u_modDarkness;\n\
                 }",
            )
            .uniform("u_modLen", DataType::Float)
            .uniform("u_modDarkness", DataType::Float),
        // in: vec2 shadeValue2, vec3 albedoColor; modifies albedoColor
        ShaderRule::new(CHECKER_VALUE2COLOR)
            .replace(
                "FRAG_DECLARATIONS",
                "uniform float u_modLen;\n\
                 uniform float u_modDarkness;",
            )
            .replace(
                "GENERATE_SHADE_COLOR",
                "vec3 albedoColorDark = albedoColor * u_modDarkness;\n\
                 float mX = mod(shadeValue2.x, 2.0 * u_modLen) / u_modLen - 1.f;\n\
                 float mY = mod(shadeValue2.y, 2.0 * u_modLen) / u_modLen - 1.f;\n\
                 float minD = min(min(abs(mX), 1.0 - abs(mX)), min(abs(mY), 1.0 - abs(mY))) * 2.;\n\
                 float minDSmooth = pow(minD, 1. / 6.);\n\
                 float v = (mX * mY);\n\
                 float adjV = sign(v) * minDSmooth;\n\
                 float s = smoothstep(-1.f, 1.f, adjV);\n\
                 albedoColor = mix(albedoColor, albedoColorDark, s);",
            )
            .uniform("u_modLen", DataType::Float)
            .uniform("u_modDarkness", DataType::Float),
        // in: float depth; out: vec3 worldPos
        ShaderRule::new(GENERATE_WORLD_POS)
            .replace(
                "FRAG_DECLARATIONS",
                "uniform mat4 u_invProjMatrix_worldPos;\n\
                 uniform mat4 u_invViewMatrix_worldPos;\n\
                 uniform vec4 u_viewport_worldPos;\n\
                 vec3 fragmentViewPosition(vec4 viewport, vec2 depthRange, mat4 invProjMat, vec4 fragCoord);",
            )
            .replace(
                "GLOBAL_FRAGMENT_FILTER",
                "vec2 depthRange_worldPos = vec2(gl_DepthRange.near, gl_DepthRange.far);\n\
                 vec4 fragCoord_worldPos = gl_FragCoord;\n\
                 fragCoord_worldPos.z = depth;\n\
                 vec4 worldPos4 = u_invViewMatrix_worldPos * vec4(fragmentViewPosition(u_viewport_worldPos, depthRange_worldPos, u_invProjMatrix_worldPos, fragCoord_worldPos), 1.);\n\
                 vec3 worldPos = worldPos4.xyz / worldPos4.w;",
            )
            .uniform("u_invProjMatrix_worldPos", DataType::Matrix44Float)
            .uniform("u_invViewMatrix_worldPos", DataType::Matrix44Float)
            .uniform("u_viewport_worldPos", DataType::Vector4Float),
        // in: vec3 worldPos; out: vec3 cullPos
        ShaderRule::new(CULL_POS_FROM_WORLD)
            .replace("GLOBAL_FRAGMENT_FILTER", "vec3 cullPos = worldPos;"),
        // in: vec3 cullPosAttr; out: vec3 cullPos
        ShaderRule::new(CULL_POS_FROM_ATTR)
            .replace("GLOBAL_FRAGMENT_FILTER", "vec3 cullPos = cullPosAttr;"),
        // out: vec2 shadeValue2
        ShaderRule::new(MESH_PROPAGATE_VALUE2)
            .replace(
                "VERT_DECLARATIONS",
                "in vec2 a_value2;\n\
                 out vec2 a_value2ToFrag;",
            )
            .replace("VERT_ASSIGNMENTS", "a_value2ToFrag = a_value2;")
            .replace("FRAG_DECLARATIONS", "in vec2 a_value2ToFrag;")
            .replace("GENERATE_SHADE_VALUE", "vec2 shadeValue2 = a_value2ToFrag;")
            .attribute(VALUE2_ATTRIBUTE, DataType::Vector2Float),
        // modifies shadeValue2
        ShaderRule::new(PARAM_FLIP_U)
            .replace("GENERATE_SHADE_VALUE", "shadeValue2.x = -shadeValue2.x;"),
        // modifies shadeValue2
        ShaderRule::new(PARAM_FLIP_V)
            .replace("GENERATE_SHADE_VALUE", "shadeValue2.y = -shadeValue2.y;"),
        // modifies shadeValue2: rotated by u_angle, then scaled by u_modLen
        ShaderRule::new(PARAM_TRANSFORM_VALUE2)
            .replace(
                "FRAG_DECLARATIONS",
                "uniform float u_angle;\n\
                 uniform float u_modLen;",
            )
            .replace(
                "GENERATE_SHADE_VALUE",
                "float sinFactor = sin(u_angle);\n\
                 float cosFactor = cos(u_angle);\n\
                 shadeValue2 = shadeValue2 * mat2(cosFactor, -sinFactor, sinFactor, cosFactor);\n\
                 shadeValue2 = shadeValue2 * u_modLen;",
            )
            .uniform("u_angle", DataType::Float)
            .uniform("u_modLen", DataType::Float),
        // in: vec2 shadeValue2; out: vec3 albedoColor
        ShaderRule::new(SHADE_TEXTURE2COLOR)
            .replace("FRAG_DECLARATIONS", "uniform sampler2D t_image;")
            .replace(
                "GENERATE_SHADE_COLOR",
                "vec3 albedoColor = texture(t_image, shadeValue2).rgb;",
            )
            .texture(IMAGE_TEXTURE, TextureDim::D2),
        // in: vec2 shadeValue2 (one texture tile per unit), vec3 albedoColor; modifies albedoColor
        ShaderRule::new(CHECKER_TILE2COLOR)
            .replace("FRAG_DECLARATIONS", "uniform float u_modDarkness;")
            .replace(
                "GENERATE_SHADE_COLOR",
                "vec2 tileId = floor(shadeValue2);\n\
                 if(mod(tileId.x + tileId.y, 2.0) > 0.5) {\n\
                   albedoColor *= u_modDarkness;\n\
                 }",
            )
            .uniform("u_modDarkness", DataType::Float),
        // in: vec2 shadeValue2 (one texture tile per unit), vec3 albedoColor; modifies albedoColor
        ShaderRule::new(GRID_TILE2COLOR)
            .replace("FRAG_DECLARATIONS", "uniform float u_modDarkness;")
            .replace(
                "GENERATE_SHADE_COLOR",
                "vec2 tileFrac = fract(shadeValue2);\n\
                 float lineDist = min(min(tileFrac.x, 1.0 - tileFrac.x), min(tileFrac.y, 1.0 - tileFrac.y));\n\
                 vec2 tileFw = fwidth(shadeValue2);\n\
                 float lineWidth = 0.02 + 2. * max(tileFw.x, tileFw.y);\n\
                 float onLine = 1.0 - smoothstep(0.02, lineWidth, lineDist);\n\
                 albedoColor = mix(albedoColor, albedoColor * u_modDarkness, onLine);",
            )
            .uniform("u_modDarkness", DataType::Float),
        // in: vec2 shadeValue2; out: vec3 albedoColor
        ShaderRule::new(SHADE_VALUE2_AS_COLOR).replace(
            "GENERATE_SHADE_COLOR",
            "vec3 albedoColor = vec3(fract(shadeValue2), 0.);",
        ),
    ]
}
