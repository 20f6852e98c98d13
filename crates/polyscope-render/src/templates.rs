//! Base program templates.
//!
//! Templates carry only the skeleton shared by every program built on them;
//! everything structure- or quantity-specific arrives through rules.

use std::collections::HashMap;

use crate::rules::DataType;
use crate::shader::{ShaderStageKind, ShaderTemplate};

/// Name of the surface mesh template.
pub const MESH: &str = "MESH";

const MESH_VERT_SHADER: &str = r"${ GLSL_VERSION }$

in vec3 a_vertexPositions;
in vec3 a_vertexNormals;
out vec3 a_vertexNormalToFrag;

uniform mat4 u_modelView;
uniform mat4 u_projMatrix;

${ VERT_DECLARATIONS }$

void main() {
    gl_Position = u_projMatrix * u_modelView * vec4(a_vertexPositions, 1.);
    a_vertexNormalToFrag = mat3(u_modelView) * a_vertexNormals;
    ${ VERT_ASSIGNMENTS }$
}
";

const MESH_FRAG_SHADER: &str = r"${ GLSL_VERSION }$

in vec3 a_vertexNormalToFrag;
layout(location = 0) out vec4 outputF;

${ FRAG_DECLARATIONS }$

void main() {
    float depth = gl_FragCoord.z;
    ${ GLOBAL_FRAGMENT_FILTER }$

    vec3 shadeNormal = normalize(a_vertexNormalToFrag);
    if (!gl_FrontFacing) {
        shadeNormal = -shadeNormal;
    }

    ${ GENERATE_SHADE_VALUE }$
    ${ GENERATE_SHADE_COLOR }$
    ${ GENERATE_LIT_COLOR }$

    outputF = vec4(litColor, 1.);
}

vec3 fragmentViewPosition(vec4 viewport, vec2 depthRange, mat4 invProjMat, vec4 fragCoord) {
    vec4 ndcPos;
    ndcPos.xy = ((2.0 * fragCoord.xy) - (2.0 * viewport.xy)) / (viewport.zw) - 1.;
    ndcPos.z = (2.0 * fragCoord.z - depthRange.x - depthRange.y) / (depthRange.y - depthRange.x);
    ndcPos.w = 1.0;
    vec4 clipPos = ndcPos / fragCoord.w;
    vec4 eyePos = invProjMat * clipPos;
    return eyePos.xyz / eyePos.w;
}

vec3 lightSurfaceMat(vec3 normal, vec3 color, sampler2D t_mat_r, sampler2D t_mat_g, sampler2D t_mat_b, sampler2D t_mat_k) {
    vec2 matUV = normal.xy / 2.0 + vec2(.5, .5);
    vec3 matR = texture(t_mat_r, matUV).rgb;
    vec3 matG = texture(t_mat_g, matUV).rgb;
    vec3 matB = texture(t_mat_b, matUV).rgb;
    vec3 matK = texture(t_mat_k, matUV).rgb;
    return color.r * matR + color.g * matG + color.b * matB + (1. - color.r - color.g - color.b) * matK;
}
";

/// The triangle mesh template: positions and normals in, one color out.
///
/// Markers: `GLSL_VERSION`, `VERT_DECLARATIONS`, `VERT_ASSIGNMENTS`,
/// `FRAG_DECLARATIONS`, `GLOBAL_FRAGMENT_FILTER`, `GENERATE_SHADE_VALUE`,
/// `GENERATE_SHADE_COLOR`, `GENERATE_LIT_COLOR`.
pub fn mesh_template() -> ShaderTemplate {
    ShaderTemplate::new(MESH)
        .stage(ShaderStageKind::Vertex, MESH_VERT_SHADER)
        .stage(ShaderStageKind::Fragment, MESH_FRAG_SHADER)
        .uniform("u_modelView", DataType::Matrix44Float)
        .uniform("u_projMatrix", DataType::Matrix44Float)
        .attribute("a_vertexPositions", DataType::Vector3Float)
        .attribute("a_vertexNormals", DataType::Vector3Float)
}

/// All built-in templates keyed by name.
pub fn builtin_templates() -> HashMap<String, ShaderTemplate> {
    [mesh_template()]
        .into_iter()
        .map(|t| (t.name().to_string(), t))
        .collect()
}
