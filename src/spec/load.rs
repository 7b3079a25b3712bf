use super::build::SourceGraph;
use super::types::ServiceDescription;
use anyhow::Context;
use std::path::Path;

/// Parse a description from text. `yaml` selects the YAML parser, JSON otherwise.
pub fn parse_description(content: &str, yaml: bool) -> anyhow::Result<ServiceDescription> {
    let desc = if yaml {
        serde_yaml::from_str(content).context("Failed to parse YAML service description")?
    } else {
        serde_json::from_str(content).context("Failed to parse JSON service description")?
    };
    Ok(desc)
}

/// Load a description file, choosing the parser by extension (`.yaml`/`.yml` or JSON).
pub fn load_description(file_path: &Path) -> anyhow::Result<ServiceDescription> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read service description: {}", file_path.display()))?;
    let yaml = matches!(
        file_path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    parse_description(&content, yaml)
        .with_context(|| format!("Invalid service description: {}", file_path.display()))
}

/// Load and resolve a description file in one step.
pub fn load_source_graph(file_path: &Path) -> anyhow::Result<SourceGraph> {
    let desc = load_description(file_path)?;
    let graph = SourceGraph::from_description(&desc)
        .with_context(|| format!("Unresolvable service description: {}", file_path.display()))?;
    Ok(graph)
}
