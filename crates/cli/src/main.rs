//! clientgen CLI
//!
//! Command-line interface for inspecting API schemas and generating typed
//! clients from them.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clientgen_common::{
    ApiDefinition, EmitOptions, Flavor, GenerationConfig, ModuleFormat, SchemaKind, UnionStyle,
};
use clientgen_generator::{emit, write_artifacts};
use clientgen_parser::{normalize, normalize_file};
use clientgen_runtime::{fetch_schema, HeaderSet};
use colored::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "clientgen")]
#[command(version, about = "Generate typed API clients from OpenAPI and GraphQL schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Where the schema comes from
#[derive(clap::Args, Debug, Default)]
struct SchemaSource {
    /// Path to a local schema file
    #[arg(short, long, conflicts_with = "url")]
    schema: Option<PathBuf>,

    /// URL to fetch the schema from
    #[arg(short, long)]
    url: Option<String>,

    /// Header sent with the schema request, as `Name: value` (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Schema kind (auto-detected if not specified)
    #[arg(short, long)]
    kind: Option<KindArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a schema and display its operations
    #[command(after_help = "EXAMPLES:\n  \
        # Inspect a local OpenAPI document\n  \
        clientgen inspect --schema movies.openapi.json\n\n  \
        # Dump the normalized definition of a remote schema\n  \
        clientgen inspect --url http://localhost:3042/documentation/json --json")]
    Inspect {
        #[command(flatten)]
        source: SchemaSource,

        /// Print the normalized definition as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate client bindings and declarations
    #[command(after_help = "EXAMPLES:\n  \
        # Node plugin with separate declarations\n  \
        clientgen generate --schema movies.openapi.json --name movies --output ./client\n\n  \
        # Browser client in TypeScript\n  \
        clientgen generate \\\n    \
        --url http://localhost:3042/documentation/json \\\n    \
        --name movies \\\n    \
        --flavor frontend \\\n    \
        --typescript\n\n  \
        # Everything from a configuration file\n  \
        clientgen generate --config clientgen.yaml")]
    Generate {
        #[command(flatten)]
        source: SchemaSource,

        /// YAML or JSON configuration file; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Client name
        #[arg(short, long)]
        name: Option<String>,

        /// Output flavor
        #[arg(short, long)]
        flavor: Option<FlavorArg>,

        /// Operations take `{ path, query, headers, body }`
        #[arg(long)]
        full_request: bool,

        /// Operations resolve to `{ statusCode, headers, body }`
        #[arg(long)]
        full_response: bool,

        /// Module format of JavaScript bindings
        #[arg(short, long)]
        module: Option<ModuleArg>,

        /// Emit TypeScript with inline annotations
        #[arg(long)]
        typescript: bool,

        /// Whether fields missing from `required` are optional
        #[arg(long)]
        props_optional: Option<bool>,

        /// Widen unions to their common shape
        #[arg(long)]
        widen_unions: bool,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    /// OpenAPI 3.x or Swagger 2.0
    Openapi,
    /// GraphQL introspection result
    Graphql,
}

impl From<KindArg> for SchemaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Openapi => SchemaKind::OpenApi,
            KindArg::Graphql => SchemaKind::Graphql,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FlavorArg {
    /// Plugin registering a runtime-backed client
    FullNodePlugin,
    /// Standalone fetch-based functions
    Frontend,
    /// Type declarations only
    TypesOnly,
}

impl From<FlavorArg> for Flavor {
    fn from(flavor: FlavorArg) -> Self {
        match flavor {
            FlavorArg::FullNodePlugin => Flavor::FullNodePlugin,
            FlavorArg::Frontend => Flavor::Frontend,
            FlavorArg::TypesOnly => Flavor::TypesOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModuleArg {
    Esm,
    Cjs,
}

impl From<ModuleArg> for ModuleFormat {
    fn from(module: ModuleArg) -> Self {
        match module {
            ModuleArg::Esm => ModuleFormat::Esm,
            ModuleArg::Cjs => ModuleFormat::Cjs,
        }
    }
}

fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{}`", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{}`", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        println!("{} Verbose mode enabled", "→".cyan());
    }

    match cli.command {
        Commands::Inspect { source, json } => {
            inspect_command(&source, json, cli.verbose).await?;
        }
        Commands::Generate {
            source,
            config,
            name,
            flavor,
            full_request,
            full_response,
            module,
            typescript,
            props_optional,
            widen_unions,
            output,
        } => {
            let mut generation = match &config {
                Some(path) => GenerationConfig::load(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => GenerationConfig::default(),
            };
            apply_source(&mut generation, source);

            let emit_options = &mut generation.emit;
            if let Some(name) = name {
                emit_options.name = name;
            }
            if let Some(flavor) = flavor {
                emit_options.flavor = flavor.into();
            }
            if let Some(module) = module {
                emit_options.module_format = module.into();
            }
            if let Some(props_optional) = props_optional {
                emit_options.props_optional = props_optional;
            }
            emit_options.full_request |= full_request;
            emit_options.full_response |= full_response;
            emit_options.typescript |= typescript;
            if widen_unions {
                emit_options.union_style = UnionStyle::Widened;
            }

            generate_command(&generation, output.as_path(), cli.verbose).await?;
        }
    }

    Ok(())
}

/// RUST_LOG wins; otherwise warnings, or debug output for the workspace crates with `--verbose`
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,clientgen_parser=debug,clientgen_generator=debug,clientgen_runtime=debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbose))
        .init();
}

/// Command-line schema flags override the configuration file
fn apply_source(config: &mut GenerationConfig, source: SchemaSource) {
    if let Some(schema) = source.schema {
        config.schema = Some(schema);
        config.url = None;
    }
    if let Some(url) = source.url {
        config.url = Some(url);
        config.schema = None;
    }
    config.headers.extend(source.headers);
    if let Some(kind) = source.kind {
        config.kind = Some(kind.into());
    }
}

async fn load_schema(
    schema: Option<&Path>,
    url: Option<&str>,
    headers: &BTreeMap<String, String>,
    kind: Option<SchemaKind>,
) -> Result<ApiDefinition> {
    match (schema, url) {
        (Some(path), _) => {
            println!("{} Reading schema: {}", "→".cyan(), path.display());
            normalize_file(path, kind).with_context(|| format!("Failed to load schema {}", path.display()))
        }
        (None, Some(url)) => {
            println!("{} Fetching schema: {}", "→".cyan(), url);
            let headers: HeaderSet = headers.iter().collect();
            let raw = fetch_schema(url, &headers)
                .await
                .with_context(|| format!("Failed to fetch schema from {}", url))?;
            normalize(&raw, kind).context("Failed to normalize schema")
        }
        (None, None) => bail!("either --schema or --url is required"),
    }
}

async fn inspect_command(source: &SchemaSource, json: bool, verbose: bool) -> Result<()> {
    let headers: BTreeMap<String, String> = source.headers.iter().cloned().collect();
    let api = load_schema(
        source.schema.as_deref(),
        source.url.as_deref(),
        &headers,
        source.kind.map(Into::into),
    )
    .await?;

    if json {
        let dump = serde_json::to_string_pretty(&api).context("Failed to serialize definition")?;
        println!("{}", dump);
        return Ok(());
    }

    println!("\n{}", "✓ Schema normalized!".green().bold());
    println!("\n{}", "API Definition:".bold());
    println!("  Title: {}", api.title.yellow());
    println!("  Version: {}", api.version.yellow());
    println!("  Kind: {}", api.kind);
    if !api.servers.is_empty() {
        println!("  Servers: {}", api.servers.join(", "));
    }
    println!("  Operations: {}", api.operations.len());
    println!("  Named types: {}", api.types.named().count());

    if !api.operations.is_empty() {
        println!("\n{}", "Operations:".bold());
        for op in &api.operations {
            println!(
                "  • {} {} {}",
                op.id.cyan(),
                format!("{:<6}", op.method.as_str()).yellow(),
                op.path
            );
            if verbose {
                for param in &op.parameters {
                    println!(
                        "    {:?} {}{} {}",
                        param.location,
                        param.name,
                        if param.required { "" } else { "?" },
                        api.types.describe(param.ty).dimmed()
                    );
                }
                for response in &op.responses {
                    let media: Vec<&str> = response.content.iter().map(|m| m.media_type.as_str()).collect();
                    println!("    → {} {}", response.status.label(), media.join(", ").dimmed());
                }
            }
        }
    }

    Ok(())
}

async fn generate_command(config: &GenerationConfig, output: &Path, verbose: bool) -> Result<()> {
    let options: &EmitOptions = &config.emit;
    println!("{} Generating client: {}", "→".cyan(), options.name.yellow());

    if verbose {
        println!("  Flavor: {}", options.flavor);
        println!("  Module: {}", options.module_format);
        println!("  TypeScript: {}", options.typescript);
        println!("  Full request: {}", options.full_request);
        println!("  Full response: {}", options.full_response);
        println!("  Output: {}", output.display());
    }

    let api = load_schema(
        config.schema.as_deref(),
        config.url.as_deref(),
        &config.headers,
        config.kind,
    )
    .await?;
    println!(
        "{} Parsed {} operations from {} {}",
        "✓".green(),
        api.operations.len(),
        api.title,
        api.version
    );

    println!("{} Emitting artifacts...", "→".cyan());
    let artifacts = emit(&api, options).context("Failed to emit client")?;
    tracing::debug!(count = artifacts.len(), "emitted artifacts");
    let written = write_artifacts(&artifacts, output).context("Failed to write artifacts")?;

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("\n{}", "Generated files:".bold());
    for path in &written {
        println!("  📄 {}", path.display());
    }

    Ok(())
}
