//! Shader program assembly.
//!
//! A [`ShaderTemplate`] holds stage sources with `${ MARKER }$` placeholders.
//! [`ShaderAssembler`] resolves an ordered rule list against a
//! [`RuleRegistry`], splices every rule's snippets into the placeholders in
//! list order, and merges all declarations into a [`ProgramDescription`].

use std::collections::BTreeMap;
use std::fmt::Display;

use polyscope_core::error::{PolyscopeError, Result};
use serde::{Deserialize, Serialize};

use crate::rule_registry::RuleRegistry;
use crate::rules::{
    AttributeDecl, DataType, RuleRef, ShaderRule, TextureDecl, TextureDim, UniformDecl,
};

const MARKER_OPEN: &str = "${";
const MARKER_CLOSE: &str = "}$";

/// Pipeline stage of a shader source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

/// One stage of a template, with unresolved markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStage {
    pub kind: ShaderStageKind,
    pub source: String,
}

/// A base program: stage sources plus the declarations they need themselves.
#[derive(Debug, Clone)]
pub struct ShaderTemplate {
    name: String,
    stages: Vec<ShaderStage>,
    uniforms: Vec<UniformDecl>,
    attributes: Vec<AttributeDecl>,
    textures: Vec<TextureDecl>,
}

impl ShaderTemplate {
    /// Creates a template with no stages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            uniforms: Vec::new(),
            attributes: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// Adds a stage.
    #[must_use]
    pub fn stage(mut self, kind: ShaderStageKind, source: impl Into<String>) -> Self {
        self.stages.push(ShaderStage {
            kind,
            source: source.into(),
        });
        self
    }

    /// Declares a uniform used directly by the template.
    #[must_use]
    pub fn uniform(mut self, name: impl Into<String>, ty: DataType) -> Self {
        self.uniforms.push(UniformDecl {
            name: name.into(),
            ty,
        });
        self
    }

    /// Declares an attribute used directly by the template.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, ty: DataType) -> Self {
        self.attributes.push(AttributeDecl {
            name: name.into(),
            ty,
        });
        self
    }

    /// Declares a texture used directly by the template.
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

    pub fn stages(&self) -> &[ShaderStage] {
        &self.stages
    }

    /// Marker names in order of first appearance across all stages.
    pub fn markers(&self) -> Result<Vec<String>> {
        let mut markers: Vec<String> = Vec::new();
        for stage in &self.stages {
            for segment in parse_segments(&self.name, &stage.source)? {
                if let Segment::Marker(name) = segment {
                    if !markers.iter().any(|m| m == name) {
                        markers.push(name.to_string());
                    }
                }
            }
        }
        Ok(markers)
    }
}

/// One stage with every marker substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledStage {
    pub kind: ShaderStageKind,
    pub source: String,
}

/// A fully resolved program, ready for the backend compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDescription {
    /// Name of the template the program was built from.
    pub base_name: String,
    /// Resolved rule names, in list order.
    pub rules: Vec<String>,
    pub stages: Vec<AssembledStage>,
    /// Text spliced in at each template marker.
    pub injections: BTreeMap<String, String>,
    pub uniforms: Vec<UniformDecl>,
    pub attributes: Vec<AttributeDecl>,
    pub textures: Vec<TextureDecl>,
}

impl ProgramDescription {
    /// Returns the text injected at `marker`.
    pub fn injection(&self, marker: &str) -> Option<&str> {
        self.injections.get(marker).map(String::as_str)
    }

    /// Returns the declared type of a uniform.
    pub fn uniform_type(&self, name: &str) -> Option<DataType> {
        self.uniforms.iter().find(|u| u.name == name).map(|u| u.ty)
    }

    /// Returns the declared type of an attribute.
    pub fn attribute_type(&self, name: &str) -> Option<DataType> {
        self.attributes.iter().find(|a| a.name == name).map(|a| a.ty)
    }

    /// Returns the declared dimensionality of a texture.
    pub fn texture_dim(&self, name: &str) -> Option<TextureDim> {
        self.textures.iter().find(|t| t.name == name).map(|t| t.dim)
    }

    /// Returns the assembled source of a stage.
    pub fn stage_source(&self, kind: ShaderStageKind) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.source.as_str())
    }

    /// All stage sources concatenated, for diagnostics.
    pub fn full_source(&self) -> String {
        self.stages
            .iter()
            .map(|s| format!("// ---- {:?} ----\n{}", s.kind, s.source))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serializes the description to JSON, for diagnostics and cache keys.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds program descriptions from templates and rule lists.
///
/// Assembly is a pure function of the template, the rule list and the
/// registry contents. It does not check data flow between rules (a rule that
/// reads `cullPos` must simply be listed after the rule that defines it).
#[derive(Debug, Clone, Copy)]
pub struct ShaderAssembler<'a> {
    registry: &'a RuleRegistry,
}

impl<'a> ShaderAssembler<'a> {
    pub fn new(registry: &'a RuleRegistry) -> Self {
        Self { registry }
    }

    /// Assembles `template` with `rules`, in order.
    pub fn assemble(&self, template: &ShaderTemplate, rules: &[RuleRef]) -> Result<ProgramDescription> {
        let resolved = rules
            .iter()
            .map(|r| self.registry.resolve(&r.name, r.suffix.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        let markers = template.markers()?;
        for rule in &resolved {
            if let Some((marker, _)) = rule
                .replacements()
                .iter()
                .find(|(marker, _)| !markers.contains(marker))
            {
                return Err(PolyscopeError::MalformedTemplate {
                    template: template.name().to_string(),
                    reason: format!("rule '{}' targets missing marker '{marker}'", rule.name()),
                });
            }
        }

        let injections: BTreeMap<String, String> = markers
            .iter()
            .map(|marker| {
                let text = resolved
                    .iter()
                    .flat_map(|rule| rule.snippets_for(marker))
                    .collect::<Vec<_>>()
                    .join("\n");
                (marker.clone(), text)
            })
            .collect();

        let stages = template
            .stages()
            .iter()
            .map(|stage| {
                Ok(AssembledStage {
                    kind: stage.kind,
                    source: substitute(template.name(), &stage.source, &injections)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let rule_refs: Vec<&ShaderRule> = resolved.iter().map(AsRef::as_ref).collect();
        let uniforms = merge_declarations(
            &template.uniforms,
            rule_refs.iter().map(|r| r.uniforms()),
            |d| (&d.name, d.ty),
            |name, first, second| PolyscopeError::UniformTypeConflict {
                name,
                first,
                second,
            },
        )?;
        let attributes = merge_declarations(
            &template.attributes,
            rule_refs.iter().map(|r| r.attributes()),
            |d| (&d.name, d.ty),
            |name, first, second| PolyscopeError::AttributeTypeConflict {
                name,
                first,
                second,
            },
        )?;
        let textures = merge_declarations(
            &template.textures,
            rule_refs.iter().map(|r| r.textures()),
            |d| (&d.name, d.dim),
            |name, first, second| PolyscopeError::TextureDimensionConflict {
                name,
                first,
                second,
            },
        )?;

        Ok(ProgramDescription {
            base_name: template.name().to_string(),
            rules: rule_refs.iter().map(|r| r.name().to_string()).collect(),
            stages,
            injections,
            uniforms,
            attributes,
            textures,
        })
    }
}

/// Merges declaration lists keyed by name, keeping first-seen order.
fn merge_declarations<'d, T, K, I, F, E>(
    base: &'d [T],
    incoming: I,
    key: F,
    conflict: E,
) -> Result<Vec<T>>
where
    T: Clone + 'd,
    K: PartialEq + Display,
    I: Iterator<Item = &'d [T]>,
    F: Fn(&T) -> (&String, K),
    E: Fn(String, String, String) -> PolyscopeError,
{
    let mut merged: Vec<T> = Vec::new();
    for decl in base.iter().chain(incoming.flatten()) {
        let (name, kind) = key(decl);
        match merged.iter().find(|&m| key(m).0 == name) {
            Some(existing) => {
                let existing_kind = key(existing).1;
                if existing_kind != kind {
                    return Err(conflict(
                        name.clone(),
                        existing_kind.to_string(),
                        kind.to_string(),
                    ));
                }
            }
            None => merged.push(decl.clone()),
        }
    }
    Ok(merged)
}

enum Segment<'s> {
    Text(&'s str),
    Marker(&'s str),
}

fn parse_segments<'s>(template: &str, source: &'s str) -> Result<Vec<Segment<'s>>> {
    let malformed = |reason: String| PolyscopeError::MalformedTemplate {
        template: template.to_string(),
        reason,
    };

    let mut segments = Vec::new();
    let mut rest = source;
    while let Some(open) = rest.find(MARKER_OPEN) {
        segments.push(Segment::Text(&rest[..open]));
        let after_open = &rest[open + MARKER_OPEN.len()..];
        let close = after_open
            .find(MARKER_CLOSE)
            .ok_or_else(|| malformed("unterminated marker".to_string()))?;
        let name = after_open[..close].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(malformed(format!("invalid marker name '{name}'")));
        }
        segments.push(Segment::Marker(name));
        rest = &after_open[close + MARKER_CLOSE.len()..];
    }
    segments.push(Segment::Text(rest));
    Ok(segments)
}

fn substitute(template: &str, source: &str, injections: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    for segment in parse_segments(template, source)? {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Marker(name) => {
                if let Some(text) = injections.get(name) {
                    out.push_str(text);
                }
            }
        }
    }
    Ok(out)
}
