use crate::generator::diagnostics::print_diagnostics;
use crate::generator::{adapt, format_project, generate_project, GeneratorOptions, ProjectPaths};
use crate::spec::load_source_graph;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for sdkgen
///
/// Generates typed Rust client crates from service descriptions.
#[derive(Parser, Debug)]
#[command(name = "sdkgen")]
#[command(about = "Rust client library generator", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a client crate from a service description
    Generate {
        /// Path to the service description (YAML or JSON)
        #[arg(short, long)]
        description: PathBuf,

        /// Output directory of the generated crate
        #[arg(short, long)]
        output: PathBuf,

        /// Package name for Cargo.toml [package].name
        /// If not provided, taken from the description or its root namespace
        #[arg(long)]
        crate_name: Option<String>,

        /// Version for Cargo.toml [package].version (default: 0.1.0)
        #[arg(long)]
        crate_version: Option<String>,

        /// Edition for a freshly written Cargo.toml
        #[arg(long, default_value = crate::generator::DEFAULT_EDITION)]
        edition: String,

        /// Replace an existing Cargo.toml instead of merging its [dependencies]
        #[arg(long, default_value_t = false)]
        overwrite_cargo_toml: bool,

        /// Replace an existing src/lib.rs
        #[arg(long, default_value_t = false)]
        overwrite_lib_rs: bool,

        /// Use workspace-inherited dependencies, version and edition
        #[arg(long, default_value_t = false)]
        workspace_dependencies: bool,

        /// Do not prepend the "generated" header to files
        #[arg(long, default_value_t = false)]
        omit_header: bool,

        /// List the files that would be written without touching the disk
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Path to dependencies configuration file (sdkgen-dependencies.toml)
        /// If not provided, will auto-detect alongside the description
        #[arg(long)]
        dependencies_config: Option<PathBuf>,

        /// Run `cargo fmt` on the output directory afterwards
        #[arg(long, default_value_t = false)]
        format: bool,
    },
    /// Resolve and adapt a description, reporting diagnostics without writing anything
    Check {
        /// Path to the service description (YAML or JSON)
        #[arg(short, long)]
        description: PathBuf,

        /// Exit with an error if any warning is reported
        #[arg(long, default_value_t = false)]
        deny_warnings: bool,
    },
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Returns an error if the description cannot be loaded or adapted, if
/// writing the output fails, or if `cargo fmt` fails when requested.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            description,
            output,
            crate_name,
            crate_version,
            edition,
            overwrite_cargo_toml,
            overwrite_lib_rs,
            workspace_dependencies,
            omit_header,
            dry_run,
            dependencies_config,
            format,
        } => {
            let options = GeneratorOptions {
                crate_name,
                crate_version,
                edition,
                overwrite_cargo_toml,
                overwrite_lib_rs,
                workspace_dependencies,
                omit_header,
            };
            let paths = ProjectPaths {
                description,
                output,
                dependencies_config,
            };
            let report = generate_project(&paths, &options, dry_run)?;
            if dry_run {
                for path in &report.written {
                    println!("{}", path.display());
                }
            } else {
                info!(
                    written = report.written.len(),
                    skipped = report.skipped.len(),
                    output = %paths.output.display(),
                    "generation complete"
                );
                if format {
                    format_project(&paths.output)?;
                }
            }
            print_diagnostics(&report.diagnostics);
            Ok(())
        }
        Commands::Check {
            description,
            deny_warnings,
        } => {
            let source = load_source_graph(&description)?;
            let adapted = adapt(&source, "check", "0.0.0")
                .with_context(|| format!("Failed to adapt {}", description.display()))?;
            print_diagnostics(&adapted.diagnostics);
            let warnings = adapted.diagnostics.warnings().count();
            if deny_warnings && warnings > 0 {
                anyhow::bail!("{} warning(s) in {}", warnings, description.display());
            }
            info!(
                enums = adapted.krate.graph.enums.len(),
                records = adapted.krate.graph.records.len(),
                unions = adapted.krate.graph.unions.len(),
                clients = adapted.krate.graph.clients.len(),
                "description is valid"
            );
            Ok(())
        }
    }
}
