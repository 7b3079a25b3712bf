//! Cargo.toml emission and merging.
//!
//! A fresh manifest is rendered from a template. When the output directory
//! already holds one, only its `[dependencies]` region is replaced and every
//! other byte is kept.

use super::dependencies_config::{DependenciesConfig, DependencySpec};
use super::error::Result;
use super::imports::EXTERNAL_PACKAGES;
use super::model::CrateDependencies;
use super::templates::{render, CargoTomlTemplateData, TOML_HEADER};
use std::collections::BTreeMap;

/// Versions used for derived dependencies that the configuration does not pin.
pub const DEFAULT_VERSIONS: &[(&str, &str)] = &[
    ("reqwest", "0.12"),
    ("rust_decimal", "1"),
    ("serde", "1"),
    ("serde_json", "1"),
    ("time", "0.3"),
    ("url", "2"),
    ("uuid", "1"),
];

fn default_version(name: &str) -> &'static str {
    DEFAULT_VERSIONS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
        .unwrap_or("*")
}

/// `name = spec` lines for the `[dependencies]` table, sorted by name.
///
/// Derived dependencies take their spec from `config` when it names them,
/// otherwise the workspace (in workspace mode) or the default version.
/// Configured extras and conditionals whose package is in use are added.
pub fn dependency_lines(
    deps: &CrateDependencies,
    config: Option<&DependenciesConfig>,
    workspace: bool,
) -> Vec<String> {
    let mut lines: BTreeMap<String, String> = BTreeMap::new();
    for dep in deps.iter() {
        let spec = config
            .and_then(|c| c.dependencies.get(&dep.name))
            .cloned()
            .unwrap_or_else(|| {
                if workspace {
                    DependencySpec::Workspace {
                        workspace: true,
                        features: None,
                    }
                } else {
                    DependencySpec::Version(default_version(&dep.name).to_string())
                }
            });
        lines.insert(dep.name.clone(), spec.render(&dep.features));
    }

    if let Some(config) = config {
        for (name, spec) in &config.dependencies {
            lines
                .entry(name.clone())
                .or_insert_with(|| spec.render(&[]));
        }
        for (name, conditional) in &config.conditional {
            let detected = EXTERNAL_PACKAGES
                .iter()
                .find(|p| p.package == conditional.detect)
                .and_then(|p| p.dependency)
                .is_some_and(|d| deps.contains(d));
            if detected {
                lines
                    .entry(name.clone())
                    .or_insert_with(|| conditional.to_spec().render(&[]));
            }
        }
    }

    lines
        .into_iter()
        .map(|(name, spec)| format!("{} = {}", name, spec))
        .collect()
}

/// Render a fresh manifest.
pub fn render_manifest(
    name: &str,
    version: &str,
    edition: &str,
    workspace: bool,
    dependencies: Vec<String>,
    with_header: bool,
) -> Result<String> {
    let data = CargoTomlTemplateData {
        name: name.to_string(),
        version: version.to_string(),
        edition: edition.to_string(),
        workspace,
        dependencies,
    };
    render(&data, "Cargo.toml", with_header.then_some(TOML_HEADER))
}

/// The header of a table line with any trailing comment and any
/// whitespace outside quoted keys removed, so `[ dependencies ] # managed`
/// reads as `[dependencies]`.
fn table_header(line: &str) -> Option<String> {
    if !line.trim_start().starts_with('[') {
        return None;
    }
    let mut header = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    for c in line.chars() {
        match quote {
            Some(q) => {
                header.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '#' => break,
                '"' | '\'' => {
                    quote = Some(c);
                    header.push(c);
                }
                c if c.is_whitespace() => {}
                c => header.push(c),
            },
        }
    }
    Some(header)
}

fn is_dependency_table(header: &str) -> bool {
    header == "[dependencies]" || header.starts_with("[dependencies.")
}

/// Replace the `[dependencies]` region of `existing` with `lines`.
///
/// The region runs from the `[dependencies]` header to the next table header
/// that is not a `[dependencies.*]` sub-table. Blank lines ending the region
/// are kept so the following table stays separated. Without a region, one is
/// appended. Every byte outside the region is preserved.
pub fn merge_manifest(existing: &str, lines: &[String]) -> String {
    let mut region = String::from("[dependencies]\n");
    for line in lines {
        region.push_str(line);
        region.push('\n');
    }

    let chunks: Vec<&str> = existing.split_inclusive('\n').collect();
    let Some(start) = chunks
        .iter()
        .position(|c| table_header(c).as_deref() == Some("[dependencies]"))
    else {
        let mut out = existing.to_string();
        if !out.is_empty() {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str(&region);
        return out;
    };

    let mut end = chunks.len();
    for (i, chunk) in chunks.iter().enumerate().skip(start + 1) {
        if let Some(header) = table_header(chunk) {
            if !is_dependency_table(&header) {
                end = i;
                break;
            }
        }
    }
    let mut keep_from = end;
    while keep_from > start + 1 && chunks[keep_from - 1].trim().is_empty() {
        keep_from -= 1;
    }

    let mut out = String::with_capacity(existing.len() + region.len());
    for chunk in &chunks[..start] {
        out.push_str(chunk);
    }
    out.push_str(&region);
    for chunk in &chunks[keep_from..] {
        out.push_str(chunk);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::dependencies_config::ConditionalDependency;

    fn derived() -> CrateDependencies {
        let mut deps = CrateDependencies::default();
        deps.add("serde", &["derive"]);
        deps.add("time", &["serde", "serde-well-known"]);
        deps
    }

    #[test]
    fn test_dependency_lines_defaults() {
        assert_eq!(
            dependency_lines(&derived(), None, false),
            vec![
                "serde = { version = \"1\", features = [\"derive\"] }",
                "time = { version = \"0.3\", features = [\"serde\", \"serde-well-known\"] }",
            ]
        );
        assert_eq!(
            dependency_lines(&derived(), None, true)[0],
            "serde = { workspace = true, features = [\"derive\"] }"
        );
    }

    #[test]
    fn test_dependency_lines_config() {
        let mut config = DependenciesConfig::default();
        config
            .dependencies
            .insert("serde".into(), DependencySpec::Version("1.0.200".into()));
        config
            .dependencies
            .insert("tokio".into(), DependencySpec::Version("1".into()));
        config.conditional.insert(
            "time-tz".into(),
            ConditionalDependency {
                detect: "time".into(),
                workspace: None,
                version: Some("0.3".into()),
                path: None,
                git: None,
                branch: None,
                features: None,
            },
        );
        config.conditional.insert(
            "uuid-ext".into(),
            ConditionalDependency {
                detect: "uuid".into(),
                workspace: Some(true),
                version: None,
                path: None,
                git: None,
                branch: None,
                features: None,
            },
        );
        let lines = dependency_lines(&derived(), Some(&config), false);
        assert_eq!(
            lines,
            vec![
                "serde = { version = \"1.0.200\", features = [\"derive\"] }",
                "time = { version = \"0.3\", features = [\"serde\", \"serde-well-known\"] }",
                "time-tz = { version = \"0.3\" }",
                "tokio = \"1\"",
            ]
        );
    }

    #[test]
    fn test_render_manifest_header() {
        let out = render_manifest("widgets", "1.2.0", "2021", true, vec!["url = \"2\"".into()], true)
            .unwrap();
        assert_eq!(
            out,
            "# Code generated by sdkgen. DO NOT EDIT.\n\n[package]\nname = \"widgets\"\nversion.workspace = true\nedition.workspace = true\n\n[dependencies]\nurl = \"2\"\n"
        );
    }

    #[test]
    fn test_merge_replaces_only_dependencies() {
        let existing = "[package]\nname = \"widgets\" # keep\n\n[dependencies]\nold = \"1\"\n\n[dependencies.extra]\nversion = \"2\"\n\n[dev-dependencies]\ntokio = \"1\"\n";
        let out = merge_manifest(existing, &["serde = \"1\"".to_string()]);
        assert_eq!(
            out,
            "[package]\nname = \"widgets\" # keep\n\n[dependencies]\nserde = \"1\"\n\n[dev-dependencies]\ntokio = \"1\"\n"
        );
    }

    #[test]
    fn test_merge_appends_missing_region() {
        let out = merge_manifest("[package]\nname = \"a\"", &["url = \"2\"".to_string()]);
        assert_eq!(out, "[package]\nname = \"a\"\n\n[dependencies]\nurl = \"2\"\n");
        assert_eq!(merge_manifest("", &[]), "[dependencies]\n");
    }

    #[test]
    fn test_merge_recognizes_commented_headers() {
        let existing = "[package]\nname = \"a\"\n\n[dependencies] # managed by sdkgen\nold = \"1\"\n\n[ dependencies.extra ]\nversion = \"2\"\n\n[features] # \"quoted # text\"\ndefault = []\n";
        let out = merge_manifest(existing, &["serde = \"1\"".to_string()]);
        assert_eq!(
            out,
            "[package]\nname = \"a\"\n\n[dependencies]\nserde = \"1\"\n\n[features] # \"quoted # text\"\ndefault = []\n"
        );
        assert_eq!(out.matches("[dependencies]").count(), 1);
    }

    #[test]
    fn test_table_header_keeps_quoted_hashes() {
        assert_eq!(table_header("[dependencies] # x").as_deref(), Some("[dependencies]"));
        assert_eq!(
            table_header("[dependencies.\"a#b\"] # x").as_deref(),
            Some("[dependencies.\"a#b\"]")
        );
        assert_eq!(table_header("name = \"[x]\""), None);
    }

    #[test]
    fn test_merge_region_at_end_of_file() {
        let existing = "[package]\r\nname = \"a\"\r\n\r\n[dependencies]\r\nold = \"1\"\r\n";
        let out = merge_manifest(existing, &["new = \"2\"".to_string()]);
        assert_eq!(out, "[package]\r\nname = \"a\"\r\n\r\n[dependencies]\nnew = \"2\"\n");
    }
}
