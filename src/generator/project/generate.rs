use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::generator::dependencies_config::{load_dependencies_config, resolve_config_path};
use crate::generator::diagnostics::Diagnostics;
use crate::generator::emit::{generate, GeneratedFile};
use crate::generator::options::GeneratorOptions;
use crate::spec::load_source_graph;

/// What a project generation run did.
#[derive(Debug)]
pub struct GenerateReport {
    /// Files written, or that would be written in a dry run
    pub written: Vec<PathBuf>,
    /// Existing files left untouched
    pub skipped: Vec<PathBuf>,
    pub diagnostics: Diagnostics,
}

/// Where a project run reads from and writes to.
#[derive(Debug, Clone, Default)]
pub struct ProjectPaths {
    pub description: PathBuf,
    pub output: PathBuf,
    /// Explicit dependency configuration; otherwise looked up next to the description
    pub dependencies_config: Option<PathBuf>,
}

/// Generate the client crate described by `paths.description` into `paths.output`.
///
/// Each module's `generated/` directory is cleared before writing so stale
/// files from removed entities do not linger. An existing `src/lib.rs` is
/// kept unless `overwrite_lib_rs`; an existing Cargo.toml is merged unless
/// `overwrite_cargo_toml`. With `dry_run` nothing is touched on disk.
pub fn generate_project(
    paths: &ProjectPaths,
    options: &GeneratorOptions,
    dry_run: bool,
) -> anyhow::Result<GenerateReport> {
    let source = load_source_graph(&paths.description)?;

    let deps_config = match resolve_config_path(paths.dependencies_config.as_deref(), &paths.description) {
        Some(path) => {
            info!(path = %path.display(), "using dependency configuration");
            load_dependencies_config(&path)?
        }
        None => None,
    };

    let manifest_path = paths.output.join("Cargo.toml");
    let existing_manifest = if manifest_path.exists() {
        Some(
            fs::read_to_string(&manifest_path)
                .with_context(|| format!("Failed to read {}", manifest_path.display()))?,
        )
    } else {
        None
    };

    let generation = generate(
        &source,
        options,
        deps_config.as_ref(),
        existing_manifest.as_deref(),
    )
    .with_context(|| format!("Failed to generate from {}", paths.description.display()))?;

    let mut written = Vec::new();
    let mut skipped = Vec::new();
    let lib_rs = Path::new("src").join("lib.rs");
    for file in &generation.files {
        if file.path == lib_rs
            && !options.overwrite_lib_rs
            && paths.output.join(&file.path).exists()
        {
            debug!(path = %file.path.display(), "keeping existing lib.rs");
            skipped.push(file.path.clone());
            continue;
        }
        written.push(file.path.clone());
    }

    if dry_run {
        for path in &written {
            info!(path = %path.display(), "would write");
        }
    } else {
        clear_generated_dirs(&paths.output, &generation.files)?;
        for file in generation.files.iter().filter(|f| written.contains(&f.path)) {
            write_file(&paths.output, file)?;
        }
    }

    Ok(GenerateReport {
        written,
        skipped,
        diagnostics: generation.diagnostics,
    })
}

/// Remove every `generated/` directory that this run writes into.
fn clear_generated_dirs(output: &Path, files: &[GeneratedFile]) -> anyhow::Result<()> {
    let mut dirs: Vec<PathBuf> = files
        .iter()
        .filter_map(|f| {
            f.path
                .ancestors()
                .find(|a| a.file_name().is_some_and(|n| n == "generated"))
                .map(Path::to_path_buf)
        })
        .collect();
    dirs.sort();
    dirs.dedup();
    for dir in dirs {
        let dir = output.join(dir);
        if dir.exists() {
            debug!(dir = %dir.display(), "clearing generated directory");
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to clear {}", dir.display()))?;
        }
    }
    Ok(())
}

fn write_file(output: &Path, file: &GeneratedFile) -> anyhow::Result<()> {
    let path = output.join(&file.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, &file.content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote file");
    Ok(())
}
