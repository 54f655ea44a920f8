//! Emitted artifacts and their metadata

use clientgen_common::{Flavor, ModuleFormat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an artifact contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Callable client code
    Bindings,
    /// Type declarations only
    Declarations,
    /// Bindings with inline annotations followed by the declarations
    Combined,
}

/// Output language of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(rename = "js")]
    JavaScript,
    #[serde(rename = "ts")]
    TypeScript,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::JavaScript => write!(f, "js"),
            Language::TypeScript => write!(f, "ts"),
        }
    }
}

/// One emitted file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub kind: ArtifactKind,
    pub flavor: Flavor,
    pub language: Language,
    pub module_format: ModuleFormat,
    /// Suggested file name without extension
    pub stem: String,
    pub contents: String,
}

impl GeneratedArtifact {
    /// File extension implied by kind and language
    pub fn extension(&self) -> &'static str {
        match (self.kind, self.language) {
            (ArtifactKind::Declarations, _) => "d.ts",
            (_, Language::TypeScript) => "ts",
            (_, Language::JavaScript) => match self.module_format {
                ModuleFormat::Esm => "mjs",
                ModuleFormat::Cjs => "cjs",
            },
        }
    }

    /// Suggested file name, e.g. `movies.d.ts`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(kind: ArtifactKind, language: Language, module_format: ModuleFormat) -> GeneratedArtifact {
        GeneratedArtifact {
            kind,
            flavor: Flavor::Frontend,
            language,
            module_format,
            stem: "movies".to_string(),
            contents: String::new(),
        }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            artifact(ArtifactKind::Declarations, Language::TypeScript, ModuleFormat::Esm).file_name(),
            "movies.d.ts"
        );
        assert_eq!(
            artifact(ArtifactKind::Combined, Language::TypeScript, ModuleFormat::Cjs).file_name(),
            "movies.ts"
        );
        assert_eq!(
            artifact(ArtifactKind::Bindings, Language::JavaScript, ModuleFormat::Esm).file_name(),
            "movies.mjs"
        );
        assert_eq!(
            artifact(ArtifactKind::Bindings, Language::JavaScript, ModuleFormat::Cjs).file_name(),
            "movies.cjs"
        );
    }
}
