//! shapegen CLI
//!
//! Compiles shape descriptors into a Rust module, summarizes the type
//! model, and prints the effective configuration.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use shapegen::descriptor::load_path;
use shapegen::model::ShapeType;
use shapegen::{build_model, generate_from_path, ShapegenConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shapegen")]
#[command(about = "Generate Rust types from SHACL-style shape descriptors")]
struct Cli {
    /// Configuration file (merged over the default locations)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Rust module
    Generate {
        /// Descriptor file or directory of *.json descriptors
        input: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the module even when some types failed
        #[arg(long)]
        allow_partial: bool,
    },

    /// Build the type model and list every type
    Summary {
        /// Descriptor file or directory of *.json descriptors
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration, or write it to a file
    Config {
        /// Write to this file instead of stdout
        #[arg(long)]
        save: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ShapegenConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Generate {
            input,
            output,
            allow_partial,
        } => {
            let module = generate_from_path(&input, &config)
                .with_context(|| format!("generating from {}", input.display()))?;

            if !module.diagnostics.is_empty() {
                eprintln!("{}", module.diagnostics.format_all());
            }
            if module.diagnostics.has_errors() && !allow_partial {
                bail!(
                    "{} error(s) in {} shape(s); rerun with --allow-partial to write the remaining types",
                    module.diagnostics.error_count(),
                    module.shapes
                );
            }

            match output {
                Some(path) => {
                    std::fs::write(&path, &module.code)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!(
                        "✅ Wrote {} ({} shapes, inputs {})",
                        path.display(),
                        module.shapes,
                        module.fingerprint.short()
                    );
                }
                None => print!("{}", module.code),
            }
        }

        Commands::Summary { input, json } => {
            let loaded = load_path(&input).with_context(|| format!("loading {}", input.display()))?;
            let output = build_model(&loaded.shapes, &config.generator);

            let rows: Vec<serde_json::Value> = output
                .model
                .iter()
                .map(|shape| {
                    let failed = output.model.is_failed(shape.name());
                    let group = output.recursion.group_of(shape.name()).map(|g| g.id);
                    match shape {
                        ShapeType::Object(object) => json!({
                            "name": object.name,
                            "kind": if object.is_abstract { "abstract object" } else { "object" },
                            "style": object.style,
                            "parents": object.parents,
                            "properties": object.properties.len(),
                            "identifier": object.identifier.strategy.as_str(),
                            "features": object.features,
                            "recursiveGroup": group,
                            "failed": failed,
                        }),
                        ShapeType::Union(union) => json!({
                            "name": union.name,
                            "kind": "union",
                            "style": union.style,
                            "members": union.members,
                            "features": union.features,
                            "recursiveGroup": group,
                            "failed": failed,
                        }),
                        ShapeType::Value(value) => json!({
                            "name": value.name,
                            "kind": "value",
                            "datatype": value.scalar,
                            "failed": failed,
                        }),
                    }
                })
                .collect();

            if json {
                let report = json!({
                    "fingerprint": loaded.fingerprint.as_str(),
                    "sources": loaded.sources,
                    "types": rows,
                    "diagnostics": output.diagnostics.all(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("📋 {} types from {} file(s)", rows.len(), loaded.sources.len());
                for shape in output.model.iter() {
                    let marker = if output.model.is_failed(shape.name()) { "❌" } else { "✓" };
                    let detail = match shape {
                        ShapeType::Object(object) => format!(
                            "{}object, {} own properties, identifier {}",
                            if object.is_abstract { "abstract " } else { "" },
                            object.properties.len(),
                            object.identifier.strategy.as_str()
                        ),
                        ShapeType::Union(union) => format!("union of {}", union.members.join(", ")),
                        ShapeType::Value(value) => format!("value {}", value.scalar.rust_type()),
                    };
                    println!("  {} {} ({})", marker, shape.name(), detail);
                }
                if !output.diagnostics.is_empty() {
                    println!();
                    println!("{}", output.diagnostics.format_all());
                }
            }

            if output.diagnostics.has_errors() {
                std::process::exit(2);
            }
        }

        Commands::Config { save } => match save {
            Some(path) => {
                config.save(&path).with_context(|| format!("writing {}", path))?;
                println!("✅ Saved configuration to {}", path);
            }
            None => print!("{}", toml::to_string_pretty(&config)?),
        },
    }

    Ok(())
}
