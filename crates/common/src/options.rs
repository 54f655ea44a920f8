//! Generation options consumed by the emitter

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of the emitted bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flavor {
    /// Plugin registering a runtime-backed client on a server host
    #[default]
    FullNodePlugin,
    /// Standalone fetch-based functions for browsers
    Frontend,
    /// Type declarations only
    TypesOnly,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::FullNodePlugin => write!(f, "full-node-plugin"),
            Flavor::Frontend => write!(f, "frontend"),
            Flavor::TypesOnly => write!(f, "types-only"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    #[default]
    Esm,
    Cjs,
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleFormat::Esm => write!(f, "esm"),
            ModuleFormat::Cjs => write!(f, "cjs"),
        }
    }
}

/// How union types are written in declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnionStyle {
    /// `A | B`
    #[default]
    Native,
    /// Broadest common shape of the members, with the members listed in a
    /// comment. Lossy: re-parsing does not give back the union.
    Widened,
}

fn default_name() -> String {
    "api".to_string()
}

fn default_true() -> bool {
    true
}

fn default_runtime_package() -> String {
    "@clientgen/runtime".to_string()
}

/// Options for a single emit run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EmitOptions {
    /// Client name, used for exported identifiers and file stems
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub flavor: Flavor,
    /// Operations take `{ path, query, headers, body }` instead of flat arguments
    #[serde(default)]
    pub full_request: bool,
    /// Operations resolve to `{ statusCode, headers, body }` instead of the body
    #[serde(default)]
    pub full_response: bool,
    #[serde(default)]
    pub module_format: ModuleFormat,
    /// Inline type annotations in the bindings instead of a separate declaration artifact
    #[serde(default)]
    pub typescript: bool,
    /// Fields missing from `required` are optional; when false every field is required
    #[serde(default = "default_true")]
    pub props_optional: bool,
    #[serde(default)]
    pub union_style: UnionStyle,
    /// Package the node plugin imports its runtime from
    #[serde(default = "default_runtime_package")]
    pub runtime_package: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            name: default_name(),
            flavor: Flavor::default(),
            full_request: false,
            full_response: false,
            module_format: ModuleFormat::default(),
            typescript: false,
            props_optional: true,
            union_style: UnionStyle::default(),
            runtime_package: default_runtime_package(),
        }
    }
}

impl EmitOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn with_typescript(mut self, typescript: bool) -> Self {
        self.typescript = typescript;
        self
    }

    pub fn with_module_format(mut self, module_format: ModuleFormat) -> Self {
        self.module_format = module_format;
        self
    }

    pub fn with_full_request(mut self, full_request: bool) -> Self {
        self.full_request = full_request;
        self
    }

    pub fn with_full_response(mut self, full_response: bool) -> Self {
        self.full_response = full_response;
        self
    }

    pub fn with_props_optional(mut self, props_optional: bool) -> Self {
        self.props_optional = props_optional;
        self
    }

    pub fn with_union_style(mut self, union_style: UnionStyle) -> Self {
        self.union_style = union_style;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let options: EmitOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, EmitOptions::default());
        assert!(options.props_optional);
        assert_eq!(options.flavor, Flavor::FullNodePlugin);
    }

    #[test]
    fn test_kebab_case_keys() {
        let options: EmitOptions = serde_json::from_str(
            r#"{"name": "movies", "flavor": "types-only", "module-format": "cjs", "full-response": true}"#,
        )
        .unwrap();
        assert_eq!(options.flavor, Flavor::TypesOnly);
        assert_eq!(options.module_format, ModuleFormat::Cjs);
        assert!(options.full_response);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<EmitOptions, _> = serde_json::from_str(r#"{"flavour": "frontend"}"#);
        assert!(result.is_err());
    }
}
