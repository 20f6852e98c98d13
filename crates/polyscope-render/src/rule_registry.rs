//! Registry of named shader rules.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use polyscope_core::error::{PolyscopeError, Result};

use crate::rules::ShaderRule;

/// Builds a uniquely named rule instance from a caller-supplied suffix.
pub type RuleGenerator = Arc<dyn Fn(&str) -> ShaderRule + Send + Sync>;

/// A registry entry: either a fixed rule or a generator of rule instances.
#[derive(Clone)]
pub enum RuleEntry {
    Static(ShaderRule),
    Generator(RuleGenerator),
}

impl RuleEntry {
    /// Wraps a generator function.
    pub fn generator<F>(f: F) -> Self
    where
        F: Fn(&str) -> ShaderRule + Send + Sync + 'static,
    {
        Self::Generator(Arc::new(f))
    }
}

impl From<ShaderRule> for RuleEntry {
    fn from(rule: ShaderRule) -> Self {
        Self::Static(rule)
    }
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(rule) => f.debug_tuple("Static").field(&rule.name()).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// Mapping from rule name to rule or rule generator.
///
/// Populated once at startup and read-only afterwards; share it between
/// rendering contexts behind an `Arc`. Resolution takes `&self` only, so
/// concurrent lookups need no locking.
///
/// Suffix policy: a static rule resolved with a suffix, and a generator
/// resolved without one (or with an empty one), are both rejected with
/// [`PolyscopeError::RuleSuffixMisuse`].
#[derive(Debug, Default)]
pub struct RuleRegistry {
    entries: HashMap<String, RuleEntry>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in rule set.
    pub fn with_builtin_rules() -> Result<Self> {
        let mut registry = Self::new();
        crate::builtin_rules::register_builtin_rules(&mut registry)?;
        Ok(registry)
    }

    /// Registers a rule or generator under `name`.
    pub fn register(&mut self, name: impl Into<String>, entry: impl Into<RuleEntry>) -> Result<()> {
        let name = name.into();
        let entry = entry.into();

        if name.is_empty() {
            return Err(PolyscopeError::RuleConfiguration {
                rule: name,
                reason: "rule name is empty".to_string(),
            });
        }
        if self.entries.contains_key(&name) {
            return Err(PolyscopeError::DuplicateRule(name));
        }
        if let RuleEntry::Static(rule) = &entry {
            if rule.name() != name {
                return Err(PolyscopeError::RuleConfiguration {
                    reason: format!("registered under a different name '{}'", rule.name()),
                    rule: name,
                });
            }
            validate_rule(rule)?;
        }

        self.entries.insert(name, entry);
        Ok(())
    }

    /// Resolves `name` to a rule, instantiating generators with `suffix`.
    pub fn resolve(&self, name: &str, suffix: Option<&str>) -> Result<Cow<'_, ShaderRule>> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| PolyscopeError::UnknownRule(name.to_string()))?;

        match (entry, suffix) {
            (RuleEntry::Static(rule), None) => Ok(Cow::Borrowed(rule)),
            (RuleEntry::Static(_), Some(suffix)) => Err(PolyscopeError::RuleSuffixMisuse {
                rule: name.to_string(),
                reason: format!("static rule given suffix '{suffix}'"),
            }),
            (RuleEntry::Generator(generate), Some(suffix)) if !suffix.is_empty() => {
                let rule = generate(suffix);
                validate_rule(&rule)?;
                Ok(Cow::Owned(rule))
            }
            (RuleEntry::Generator(_), _) => Err(PolyscopeError::RuleSuffixMisuse {
                rule: name.to_string(),
                reason: "generator rule needs a non-empty suffix".to_string(),
            }),
        }
    }

    /// Checks if a rule with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns whether `name` is registered as a generator.
    pub fn is_generator(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(RuleEntry::Generator(_)))
    }

    /// Returns all registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rejects rules that could never assemble cleanly on their own.
fn validate_rule(rule: &ShaderRule) -> Result<()> {
    let config_error = |reason: String| PolyscopeError::RuleConfiguration {
        rule: rule.name().to_string(),
        reason,
    };

    if rule.replacements().iter().any(|(marker, _)| marker.trim().is_empty()) {
        return Err(config_error("replacement with an empty marker".to_string()));
    }
    for (i, decl) in rule.uniforms().iter().enumerate() {
        if rule.uniforms()[..i]
            .iter()
            .any(|d| d.name == decl.name && d.ty != decl.ty)
        {
            return Err(config_error(format!(
                "uniform '{}' declared twice with different types",
                decl.name
            )));
        }
    }
    for (i, decl) in rule.attributes().iter().enumerate() {
        if rule.attributes()[..i]
            .iter()
            .any(|d| d.name == decl.name && d.ty != decl.ty)
        {
            return Err(config_error(format!(
                "attribute '{}' declared twice with different types",
                decl.name
            )));
        }
    }
    for (i, decl) in rule.textures().iter().enumerate() {
        if rule.textures()[..i]
            .iter()
            .any(|d| d.name == decl.name && d.dim != decl.dim)
        {
            return Err(config_error(format!(
                "texture '{}' declared twice with different dimensions",
                decl.name
            )));
        }
    }
    Ok(())
}
