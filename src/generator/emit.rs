//! The generation pipeline: adapt, sort, then emit every file in a fixed order.

use super::adapter::adapt;
use super::clients::emit_client_files;
use super::dependencies_config::DependenciesConfig;
use super::diagnostics::Diagnostics;
use super::error::Result;
use super::manifest::{dependency_lines, merge_manifest, render_manifest};
use super::model::{Module, SortedCrate};
use super::models::emit_model_files;
use super::modules::{emit_error, emit_generated_mod, emit_module_index, has_generated};
use super::options::GeneratorOptions;
use super::templates::RUST_HEADER;
use crate::spec::SourceGraph;
use std::path::PathBuf;
use tracing::debug;

/// One output file, relative to the crate directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedFile {
    fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }
}

#[derive(Debug)]
pub struct Generation {
    /// `Cargo.toml` first, then each module depth first
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Diagnostics,
}

/// Generate the client crate for `source`.
///
/// With `existing_manifest` and without `overwrite_cargo_toml`, the
/// manifest is the existing one with its dependency region regenerated.
pub fn generate(
    source: &SourceGraph,
    options: &GeneratorOptions,
    deps_config: Option<&DependenciesConfig>,
    existing_manifest: Option<&str>,
) -> Result<Generation> {
    let name = options.crate_name(source);
    let version = options.crate_version(source);
    let adapted = adapt(source, &name, &version)?;
    let krate = adapted.krate.sort();
    let header = (!options.omit_header).then_some(RUST_HEADER);

    let lines = dependency_lines(
        &krate.dependencies,
        deps_config,
        options.workspace_dependencies,
    );
    let manifest = match existing_manifest {
        Some(existing) if !options.overwrite_cargo_toml => merge_manifest(existing, &lines),
        _ => render_manifest(
            &krate.name,
            &krate.version,
            &options.edition,
            options.workspace_dependencies,
            lines,
            !options.omit_header,
        )?,
    };

    let mut files = vec![GeneratedFile::new(PathBuf::from("Cargo.toml"), manifest)];
    for module in krate.root.walk() {
        emit_module(&krate, module, header, &mut files)?;
    }
    debug!(files = files.len(), "emitted crate {}", krate.name);
    Ok(Generation {
        files,
        diagnostics: adapted.diagnostics,
    })
}

fn emit_module(
    krate: &SortedCrate,
    module: &Module,
    header: Option<&str>,
    files: &mut Vec<GeneratedFile>,
) -> Result<()> {
    let dir = module.path.source_dir();
    let index = if module.path.is_root() { "lib.rs" } else { "mod.rs" };
    files.push(GeneratedFile::new(
        dir.join(index),
        emit_module_index(krate, module, header)?,
    ));
    if !has_generated(module) {
        return Ok(());
    }

    let generated = dir.join("generated");
    files.push(GeneratedFile::new(
        generated.join("mod.rs"),
        emit_generated_mod(module, header)?,
    ));
    if module.path.is_root() && module.has_clients_recursive() {
        files.push(GeneratedFile::new(
            generated.join("error.rs"),
            emit_error(header)?,
        ));
    }
    for file in emit_model_files(krate, module, header)? {
        files.push(GeneratedFile::new(
            generated.join("models").join(file.name),
            file.content,
        ));
    }
    for file in emit_client_files(krate, module, header)? {
        files.push(GeneratedFile::new(
            generated.join("clients").join(file.name),
            file.content,
        ));
    }
    Ok(())
}
