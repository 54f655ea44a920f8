//! Generation configuration loaded from YAML or JSON files
//!
//! A configuration file names the schema to read and carries the emit
//! options, so that repeated generations do not need long command lines:
//!
//! ```yaml
//! schema: ./openapi.yaml
//! emit:
//!   name: movies
//!   flavor: frontend
//!   typescript: true
//! ```

use crate::{EmitOptions, GeneratorError, Result, SchemaKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GenerationConfig {
    /// Local schema file
    #[serde(default)]
    pub schema: Option<PathBuf>,
    /// Remote schema URL
    #[serde(default)]
    pub url: Option<String>,
    /// Headers sent when fetching a remote schema
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Skip kind detection
    #[serde(default)]
    pub kind: Option<SchemaKind>,
    #[serde(default)]
    pub emit: EmitOptions,
}

impl GenerationConfig {
    /// Load configuration from a `.yaml`/`.yml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Generation(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let config = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Flavor;
    use std::io::Write;

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "schema: ./openapi.yaml\nkind: openapi\nemit:\n  name: movies\n  flavor: frontend\n  typescript: true"
        )
        .unwrap();

        let config = GenerationConfig::load(file.path()).unwrap();
        assert_eq!(config.schema, Some(PathBuf::from("./openapi.yaml")));
        assert_eq!(config.kind, Some(SchemaKind::OpenApi));
        assert_eq!(config.emit.name, "movies");
        assert_eq!(config.emit.flavor, Flavor::Frontend);
        assert!(config.emit.typescript);
        assert!(config.emit.props_optional);
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"url": "https://example.com/openapi.json", "headers": {{"authorization": "Bearer x"}}}}"#
        )
        .unwrap();

        let config = GenerationConfig::load(file.path()).unwrap();
        assert_eq!(
            config.url.as_deref(),
            Some("https://example.com/openapi.json")
        );
        assert_eq!(config.headers["authorization"], "Bearer x");
        assert_eq!(config.emit, EmitOptions::default());
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "schema: a.json\nflavor: frontend").unwrap();
        assert!(matches!(
            GenerationConfig::load(file.path()),
            Err(GeneratorError::Yaml(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = GenerationConfig::load(Path::new("/nonexistent/clientgen.yaml"));
        assert!(matches!(result, Err(GeneratorError::Generation(_))));
    }
}
