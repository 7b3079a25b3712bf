//! Dependency configuration for generated client crates
//!
//! A `sdkgen-dependencies.toml` next to the service description can pin
//! versions, switch dependencies to the workspace, and add crates the
//! generated code does not need itself.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name looked up next to the description.
pub const CONFIG_FILE_NAME: &str = "sdkgen-dependencies.toml";

/// Dependency specification for Cargo.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DependencySpec {
    /// Simple version string: "1.33"
    Version(String),
    /// Workspace dependency: { workspace = true }
    Workspace {
        workspace: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        features: Option<Vec<String>>,
    },
    /// Full specification: { version = "1.33", features = ["serde"] }
    Full {
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        git: Option<String>,
        #[serde(default)]
        branch: Option<String>,
        #[serde(default)]
        features: Option<Vec<String>>,
    },
}

impl DependencySpec {
    /// Features listed on this entry, if any.
    pub fn features(&self) -> &[String] {
        match self {
            DependencySpec::Version(_) => &[],
            DependencySpec::Workspace { features, .. } | DependencySpec::Full { features, .. } => {
                features.as_deref().unwrap_or_default()
            }
        }
    }

    /// Render as the right-hand side of a `[dependencies]` entry, with
    /// `extra_features` merged into the entry's own features.
    pub fn render(&self, extra_features: &[String]) -> String {
        let mut features: Vec<String> = self.features().to_vec();
        for f in extra_features {
            if !features.contains(f) {
                features.push(f.clone());
            }
        }
        features.sort();

        let mut parts = Vec::new();
        match self {
            DependencySpec::Version(v) => {
                if features.is_empty() {
                    return format!("\"{}\"", v);
                }
                parts.push(format!("version = \"{}\"", v));
            }
            DependencySpec::Workspace { .. } => parts.push("workspace = true".to_string()),
            DependencySpec::Full {
                version,
                path,
                git,
                branch,
                ..
            } => {
                if let Some(v) = version {
                    parts.push(format!("version = \"{}\"", v));
                }
                if let Some(p) = path {
                    parts.push(format!("path = \"{}\"", p));
                }
                if let Some(g) = git {
                    parts.push(format!("git = \"{}\"", g));
                }
                if let Some(b) = branch {
                    parts.push(format!("branch = \"{}\"", b));
                }
            }
        }
        if !features.is_empty() {
            let quoted: Vec<String> = features.iter().map(|f| format!("\"{}\"", f)).collect();
            parts.push(format!("features = [{}]", quoted.join(", ")));
        }
        format!("{{ {} }}", parts.join(", "))
    }
}

/// Dependency configuration loaded from sdkgen-dependencies.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DependenciesConfig {
    /// Overrides for derived dependencies, or extra dependencies to always include
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,

    /// Conditional dependencies - included when an external package is used
    #[serde(default)]
    pub conditional: BTreeMap<String, ConditionalDependency>,
}

/// Conditional dependency that is included when an external package is referenced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalDependency {
    /// External package key to detect (e.g. "rust_decimal")
    pub detect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl ConditionalDependency {
    /// Convert to DependencySpec
    pub fn to_spec(&self) -> DependencySpec {
        if let Some(true) = self.workspace {
            DependencySpec::Workspace {
                workspace: true,
                features: self.features.clone(),
            }
        } else if self.version.is_some() || self.path.is_some() || self.git.is_some() {
            DependencySpec::Full {
                version: self.version.clone(),
                path: self.path.clone(),
                git: self.git.clone(),
                branch: self.branch.clone(),
                features: self.features.clone(),
            }
        } else {
            // nothing pinned: defer to the workspace
            DependencySpec::Workspace {
                workspace: true,
                features: self.features.clone(),
            }
        }
    }
}

/// Load dependencies configuration from a TOML file
///
/// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but
/// fails to parse.
pub fn load_dependencies_config(config_path: &Path) -> anyhow::Result<Option<DependenciesConfig>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(config_path).with_context(|| {
        format!(
            "Failed to read dependencies config: {}",
            config_path.display()
        )
    })?;

    let config: DependenciesConfig = toml::from_str(&contents).with_context(|| {
        format!(
            "Failed to parse dependencies config: {}",
            config_path.display()
        )
    })?;

    Ok(Some(config))
}

/// Look for `sdkgen-dependencies.toml` in the same directory as the description.
pub fn auto_detect_config_path(description_path: &Path) -> Option<PathBuf> {
    let dir = description_path.parent()?;
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Resolve dependencies config path
///
/// Priority:
/// 1. Explicitly provided path (via CLI)
/// 2. Auto-detected alongside the description
/// 3. None (no config)
pub fn resolve_config_path(
    explicit_path: Option<&Path>,
    description_path: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    auto_detect_config_path(description_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config: DependenciesConfig = toml::from_str(
            r#"
[dependencies]
reqwest = { version = "0.12", features = ["rustls-tls"] }
tokio = "1"
serde = { workspace = true }

[conditional.money]
detect = "rust_decimal"
version = "1.36"
"#,
        )
        .unwrap();
        assert_eq!(
            config.dependencies.get("tokio"),
            Some(&DependencySpec::Version("1".to_string()))
        );
        assert!(matches!(
            config.dependencies.get("serde"),
            Some(DependencySpec::Workspace { workspace: true, .. })
        ));
        assert_eq!(config.conditional["money"].detect, "rust_decimal");
        assert_eq!(
            config.conditional["money"].to_spec().render(&[]),
            "{ version = \"1.36\" }"
        );
    }

    #[test]
    fn test_render_merges_features() {
        let spec = DependencySpec::Full {
            version: Some("0.12".into()),
            path: None,
            git: None,
            branch: None,
            features: Some(vec!["rustls-tls".into()]),
        };
        assert_eq!(
            spec.render(&["json".to_string()]),
            "{ version = \"0.12\", features = [\"json\", \"rustls-tls\"] }"
        );
        assert_eq!(DependencySpec::Version("1".into()).render(&[]), "\"1\"");
        assert_eq!(
            DependencySpec::Workspace {
                workspace: true,
                features: None
            }
            .render(&["derive".to_string()]),
            "{ workspace = true, features = [\"derive\"] }"
        );
    }

    #[test]
    fn test_missing_config_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dependencies_config(&dir.path().join(CONFIG_FILE_NAME))
            .unwrap()
            .is_none());
        assert!(auto_detect_config_path(&dir.path().join("service.yaml")).is_none());
    }
}
