use crate::generator::naming::to_snake_case;
use crate::spec::SourceGraph;

pub const DEFAULT_CRATE_VERSION: &str = "0.1.0";
pub const DEFAULT_EDITION: &str = "2021";

/// Knobs for one generation run.
///
/// `None` for name or version falls back to the description's `crate` block,
/// then to the snake_case root namespace and [`DEFAULT_CRATE_VERSION`].
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub crate_name: Option<String>,
    pub crate_version: Option<String>,
    pub edition: String,
    /// Replace an existing Cargo.toml instead of merging its `[dependencies]`
    pub overwrite_cargo_toml: bool,
    /// Replace an existing `src/lib.rs`
    pub overwrite_lib_rs: bool,
    /// Emit `{ workspace = true }` dependencies and inherit version/edition
    pub workspace_dependencies: bool,
    /// Leave the "generated" header off every file
    pub omit_header: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            crate_name: None,
            crate_version: None,
            edition: DEFAULT_EDITION.to_string(),
            overwrite_cargo_toml: false,
            overwrite_lib_rs: false,
            workspace_dependencies: false,
            omit_header: false,
        }
    }
}

impl GeneratorOptions {
    pub fn crate_name(&self, source: &SourceGraph) -> String {
        self.crate_name
            .clone()
            .or_else(|| source.crate_name.clone())
            .unwrap_or_else(|| {
                if source.namespace.is_empty() {
                    "client".to_string()
                } else {
                    to_snake_case(&source.namespace)
                }
            })
    }

    pub fn crate_version(&self, source: &SourceGraph) -> String {
        self.crate_version
            .clone()
            .or_else(|| source.crate_version.clone())
            .unwrap_or_else(|| DEFAULT_CRATE_VERSION.to_string())
    }
}
