//! Binding and declaration emitter for clientgen
//!
//! This crate turns a normalized [`ApiDefinition`] into client artifacts:
//! a Fastify-style node plugin backed by the clientgen runtime, a
//! dependency-free `fetch` frontend module, or type declarations alone.
//! Output is deterministic: the same definition and options always
//! produce byte-identical artifacts.

mod artifact;
mod declarations;
mod operations;
mod render;
mod templates;

pub use artifact::{ArtifactKind, GeneratedArtifact, Language};
pub use declarations::parse_declarations;
pub use render::TypeRenderer;

use clientgen_common::naming::{property_key, split_words, type_name, value_name};
use clientgen_common::{
    ApiDefinition, EmitOptions, Flavor, GeneratorError, ModuleFormat, Result, SchemaKind,
};
use operations::{function_name, operation_types, NameSpace, OperationView};
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// Path the frontend `graphql` function posts to
const GRAPHQL_PATH: &str = "/graphql";

/// Identifiers the frontend module defines itself
const FRONTEND_HELPERS: &[&str] = &[
    "baseUrl",
    "defaultHeaders",
    "defaultFetchParams",
    "setBaseUrl",
    "setDefaultHeaders",
    "setDefaultFetchParams",
    "appendQuery",
    "omit",
    "call",
    "graphql",
    "routes",
];

/// Everything the templates need, computed once per emit
struct Model {
    header: String,
    types: Vec<String>,
    operation_types: Vec<String>,
    client_interface: String,
    operations: Vec<OperationView>,
    graphql: bool,
    graphql_request_type: String,
    base_url: String,
    client_type: String,
    options_type: String,
    client_name: String,
    factory: String,
    plugin_fn: String,
}

impl Model {
    fn build(api: &ApiDefinition, options: &EmitOptions) -> Self {
        let renderer = TypeRenderer::new(&api.types, options);
        let graphql = api.kind == SchemaKind::Graphql;

        let types = api
            .types
            .named()
            .filter_map(|(_, id)| renderer.declaration(id))
            .collect();

        let mut type_names = NameSpace::new(api.types.named().map(|(name, _)| name));
        let client_base = type_name(&options.name);
        let client_type = type_names.claim(&format!("{}Client", client_base));
        let options_type = type_names.claim(&format!("{}ClientOptions", client_base));

        let client_name = value_name(&options.name);
        let factory = format!("generate{}Client", client_base);
        let plugin_fn = format!("{}Plugin", client_name);
        let mut value_names = NameSpace::new(
            FRONTEND_HELPERS
                .iter()
                .copied()
                .chain([factory.as_str(), plugin_fn.as_str()]),
        );

        let mut operation_decls = Vec::new();
        let mut operations = Vec::new();
        let mut client_members = Vec::new();
        let mut graphql_request_type = String::from("unknown");
        for op in &api.operations {
            let op_types = operation_types(&renderer, op, options, &mut type_names);
            operation_decls.extend(op_types.declarations.iter().cloned());

            let return_type = if graphql {
                graphql_request_type = format!(
                    "{} & {{ headers?: Record<string, string> }}",
                    op_types.request
                );
                "Promise<unknown>".to_string()
            } else {
                format!("Promise<{}>", op_types.responses)
            };
            client_members.push(format!(
                "  {}(request{}: {}): {};",
                property_key(&op.id),
                if op_types.request_optional { "?" } else { "" },
                op_types.request,
                return_type
            ));

            let function = function_name(op, &mut value_names);
            operations.push(OperationView::new(
                &renderer,
                op,
                &op_types,
                function,
                options.full_request,
            ));
        }

        let client_interface = if client_members.is_empty() {
            format!("export interface {} {{}}", client_type)
        } else {
            format!(
                "export interface {} {{\n{}\n}}",
                client_type,
                client_members.join("\n")
            )
        };

        let header = format!(
            "// Generated by clientgen from {} {}. Do not edit.",
            api.title, api.version
        )
        .replace(['\r', '\n'], " ");

        Self {
            header,
            types,
            operation_types: operation_decls,
            client_interface,
            operations,
            graphql,
            graphql_request_type,
            base_url: api.servers.first().cloned().unwrap_or_default(),
            client_type,
            options_type,
            client_name,
            factory,
            plugin_fn,
        }
    }

    /// `export declare` lines describing JavaScript bindings of `flavor`
    fn ambient(&self, flavor: Flavor) -> Vec<String> {
        match flavor {
            Flavor::TypesOnly => Vec::new(),
            Flavor::Frontend => {
                let mut lines = vec![
                    "export declare function setBaseUrl(url: string): void;".to_string(),
                    "export declare function setDefaultHeaders(headers: Record<string, string>): void;"
                        .to_string(),
                    "export declare function setDefaultFetchParams(params: RequestInit): void;"
                        .to_string(),
                ];
                if self.graphql {
                    lines.push(format!(
                        "export declare function graphql(request: {}): Promise<unknown>;",
                        self.graphql_request_type
                    ));
                } else {
                    for op in &self.operations {
                        lines.push(format!(
                            "export declare function {}(request{}: {}): {};",
                            op.function,
                            if op.request_optional { "?" } else { "" },
                            op.request_type,
                            op.return_type
                        ));
                    }
                }
                lines
            }
            Flavor::FullNodePlugin => vec![
                "export declare const routes: Record<string, { path: string; method: string }>;"
                    .to_string(),
                format!(
                    "export declare function {}(options: {}): Promise<{}>;",
                    self.factory, self.options_type, self.client_type
                ),
                format!(
                    "declare function {}(app: unknown, options: {}): Promise<void>;",
                    self.plugin_fn, self.options_type
                ),
                format!("export default {};", self.plugin_fn),
            ],
        }
    }
}

/// Emitter holding the compiled templates
///
/// Build once and reuse it across emit runs.
pub struct Emitter {
    tera: Tera,
}

impl Emitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tera: templates::load_templates()?,
        })
    }

    /// Emit every artifact implied by the options
    ///
    /// - `types-only`: one declaration artifact
    /// - `typescript`: one TypeScript module with inline annotations
    /// - otherwise: JavaScript bindings plus a matching declaration artifact
    pub fn emit(&self, api: &ApiDefinition, options: &EmitOptions) -> Result<Vec<GeneratedArtifact>> {
        let model = Model::build(api, options);
        let stem = file_stem(&options.name);
        let artifact = |kind, language, contents| GeneratedArtifact {
            kind,
            flavor: options.flavor,
            language,
            module_format: options.module_format,
            stem: stem.clone(),
            contents,
        };

        let artifacts = match options.flavor {
            Flavor::TypesOnly => vec![artifact(
                ArtifactKind::Declarations,
                Language::TypeScript,
                self.render_declarations(&model, options.flavor, true)?,
            )],
            _ if options.typescript => vec![artifact(
                ArtifactKind::Combined,
                Language::TypeScript,
                self.render_bindings(&model, options)?,
            )],
            flavor => vec![
                artifact(
                    ArtifactKind::Bindings,
                    Language::JavaScript,
                    self.render_bindings(&model, options)?,
                ),
                artifact(
                    ArtifactKind::Declarations,
                    Language::TypeScript,
                    self.render_declarations(&model, flavor, true)?,
                ),
            ],
        };

        tracing::debug!(
            name = %options.name,
            flavor = %options.flavor,
            operations = api.operations.len(),
            artifacts = artifacts.len(),
            "emitted client"
        );
        Ok(artifacts)
    }

    /// Declarations text; `standalone` adds the header and ambient declarations
    fn render_declarations(&self, model: &Model, flavor: Flavor, standalone: bool) -> Result<String> {
        let mut context = Context::new();
        context.insert("header", if standalone { model.header.as_str() } else { "" });
        context.insert("types", &model.types);
        context.insert("operation_types", &model.operation_types);
        context.insert("client_interface", &model.client_interface);
        context.insert("plugin", &(flavor == Flavor::FullNodePlugin));
        context.insert("options_type", &model.options_type);
        let ambient = if standalone {
            model.ambient(flavor)
        } else {
            Vec::new()
        };
        context.insert("ambient", &ambient);

        self.render("declarations", &context)
    }

    fn render_bindings(&self, model: &Model, options: &EmitOptions) -> Result<String> {
        let typescript = options.typescript;
        let esm_syntax = typescript || options.module_format == ModuleFormat::Esm;

        let mut context = Context::new();
        context.insert("header", &model.header);
        context.insert("typescript", &typescript);
        context.insert("esm_syntax", &esm_syntax);
        context.insert("use_strict", &!esm_syntax);
        context.insert("export_kw", if esm_syntax { "export " } else { "" });
        context.insert("full_request", &options.full_request);
        context.insert("full_response", &options.full_response);
        context.insert("graphql", &model.graphql);
        context.insert("client_name", &model.client_name);
        context.insert("options_type", &model.options_type);
        let declarations = if typescript {
            self.render_declarations(model, options.flavor, false)?
        } else {
            String::new()
        };
        context.insert("declarations", &declarations);

        let template = match options.flavor {
            Flavor::FullNodePlugin => {
                let builder = if model.graphql {
                    "buildGraphQLClient"
                } else {
                    "buildOpenAPIClient"
                };
                context.insert("builder", builder);
                context.insert("runtime_package", &options.runtime_package);
                context.insert("operations", &model.operations);
                context.insert("factory", &model.factory);
                context.insert("factory_return", &format!("Promise<{}>", model.client_type));
                context.insert("plugin_fn", &model.plugin_fn);
                context.insert(
                    "routes_type",
                    "Record<string, { path: string; method: string }>",
                );
                "plugin"
            }
            _ => {
                let operations: &[OperationView] = if model.graphql {
                    &[]
                } else {
                    &model.operations
                };
                let mut exports: Vec<&str> =
                    vec!["setBaseUrl", "setDefaultHeaders", "setDefaultFetchParams"];
                exports.extend(operations.iter().map(|op| op.function.as_str()));
                if model.graphql {
                    exports.push("graphql");
                }
                context.insert("operations", operations);
                context.insert("exports", &exports);
                context.insert("base_url", &model.base_url);
                context.insert("graphql_path", GRAPHQL_PATH);
                context.insert("graphql_request_type", &model.graphql_request_type);
                "frontend"
            }
        };

        self.render(template, &context)
    }

    fn render(&self, template: &str, context: &Context) -> Result<String> {
        let rendered = self.tera.render(template, context).map_err(|e| {
            GeneratorError::Generation(format!("Failed to render {} template: {:?}", template, e))
        })?;
        Ok(normalize_blank_lines(&rendered))
    }
}

/// Emit with a freshly built [`Emitter`]
pub fn emit(api: &ApiDefinition, options: &EmitOptions) -> Result<Vec<GeneratedArtifact>> {
    Emitter::new()?.emit(api, options)
}

/// Write artifacts into a directory, returning the written paths
pub fn write_artifacts(artifacts: &[GeneratedArtifact], output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|e| {
        GeneratorError::Generation(format!("Failed to create output directory: {}", e))
    })?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = output_dir.join(artifact.file_name());
        fs::write(&path, &artifact.contents)?;
        written.push(path);
    }
    Ok(written)
}

/// `MoviesAPI` becomes `movies-api`
fn file_stem(name: &str) -> String {
    let words = split_words(name);
    if words.is_empty() {
        return "client".to_string();
    }
    words.join("-").to_lowercase()
}

/// Collapse runs of blank lines and end with exactly one newline
fn normalize_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank = true;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !blank {
                out.push('\n');
            }
            blank = true;
        } else {
            out.push_str(line);
            out.push('\n');
            blank = false;
        }
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("movies"), "movies");
        assert_eq!(file_stem("MoviesAPI"), "movies-api");
        assert_eq!(file_stem("pet_store"), "pet-store");
        assert_eq!(file_stem("--"), "client");
    }

    #[test]
    fn test_normalize_blank_lines() {
        assert_eq!(normalize_blank_lines("\n\na\n\n\n\nb  \n\n"), "a\n\nb\n");
        assert_eq!(normalize_blank_lines(""), "");
    }

    #[test]
    fn test_emitter_builds() {
        assert!(Emitter::new().is_ok());
    }
}
