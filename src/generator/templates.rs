use askama::Template;

use super::error::{GenerateError, Result};

/// First line of every generated Rust file.
pub const RUST_HEADER: &str = "// Code generated by sdkgen. DO NOT EDIT.";
/// First line of a freshly generated manifest.
pub const TOML_HEADER: &str = "# Code generated by sdkgen. DO NOT EDIT.";

/// A rendered file, named relative to the directory that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileText {
    pub name: String,
    pub content: String,
}

/// One variant of a generated enum
#[derive(Debug, Clone)]
pub struct EnumValueView {
    /// Doc and attribute lines preceding the variant, newline-terminated
    pub prelude: String,
    pub name: String,
    /// Wire value as a Rust string literal
    pub wire: String,
}

#[derive(Debug, Clone)]
pub struct EnumView {
    pub docs: String,
    pub derives: String,
    pub visibility: &'static str,
    pub name: String,
    pub extensible: bool,
    pub values: Vec<EnumValueView>,
}

/// Template data for `generated/models/enums.rs`
#[derive(Template)]
#[template(path = "enums.rs.txt", escape = "none")]
pub struct EnumsTemplateData {
    pub uses: String,
    pub enums: Vec<EnumView>,
}

#[derive(Debug, Clone)]
pub struct FieldView {
    /// Doc and attribute lines preceding the field, newline-terminated
    pub prelude: String,
    pub visibility: &'static str,
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone)]
pub struct RecordView {
    pub docs: String,
    pub derives: String,
    pub visibility: &'static str,
    pub name: String,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone)]
pub struct MarkerView {
    pub docs: String,
    pub visibility: &'static str,
    pub name: String,
}

/// Template data for `generated/models/models.rs`
#[derive(Template)]
#[template(path = "models.rs.txt", escape = "none")]
pub struct ModelsTemplateData {
    pub uses: String,
    pub records: Vec<RecordView>,
    pub markers: Vec<MarkerView>,
}

#[derive(Debug, Clone)]
pub struct UnionMemberView {
    pub name: String,
    /// Discriminator value as a Rust string literal
    pub wire: String,
    pub ty: String,
}

#[derive(Debug, Clone)]
pub struct UnionView {
    pub docs: String,
    pub visibility: &'static str,
    pub name: String,
    /// Arguments of the container `#[serde(...)]` attribute
    pub tagging: String,
    pub members: Vec<UnionMemberView>,
}

/// Template data for `generated/models/unions.rs`
#[derive(Template)]
#[template(path = "unions.rs.txt", escape = "none")]
pub struct UnionsTemplateData {
    pub uses: String,
    pub unions: Vec<UnionView>,
}

/// Stored client field
#[derive(Debug, Clone)]
pub struct ClientFieldView {
    pub name: String,
    pub ty: String,
    /// Initializer inside `Self { .. }` in the constructor
    pub init: String,
}

/// Field of an options struct; always emitted as `Option<ty>`
#[derive(Debug, Clone)]
pub struct OptionFieldView {
    pub docs: String,
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone)]
pub struct MethodOptionsView {
    pub name: String,
    pub visibility: &'static str,
    pub method: String,
    pub fields: Vec<OptionFieldView>,
}

/// Template data for one `generated/clients/<client>.rs`
#[derive(Template)]
#[template(path = "client.rs.txt", escape = "none")]
pub struct ClientTemplateData {
    pub uses: String,
    pub docs: String,
    pub visibility: &'static str,
    pub name: String,
    pub fields: Vec<ClientFieldView>,
    pub constructable: bool,
    pub options_name: String,
    pub option_fields: Vec<OptionFieldView>,
    /// `, name: Type` pairs following `endpoint` in `new`
    pub ctor_params: String,
    /// Fully rendered methods, indented for the impl block
    pub methods: Vec<String>,
    pub method_options: Vec<MethodOptionsView>,
}

/// Template data for the `mod.rs` files below `generated/`
#[derive(Template)]
#[template(path = "mod.rs.txt", escape = "none")]
pub struct ModRsTemplateData {
    pub declarations: Vec<String>,
    pub reexports: Vec<String>,
}

/// Template data for `lib.rs` and each sub-module's `mod.rs`
#[derive(Template)]
#[template(path = "module.rs.txt", escape = "none")]
pub struct ModuleTemplateData {
    pub inner_attributes: Vec<String>,
    pub has_generated: bool,
    pub sub_modules: Vec<String>,
    pub has_clients: bool,
    pub has_models: bool,
    pub exports_error: bool,
    pub reexports: Vec<String>,
}

/// Template for `generated/error.rs`
#[derive(Template)]
#[template(path = "error.rs.txt", escape = "none")]
pub struct ErrorTemplate;

/// Template data for a fresh Cargo.toml
#[derive(Template)]
#[template(path = "Cargo.toml.txt", escape = "none")]
pub struct CargoTomlTemplateData {
    pub name: String,
    pub version: String,
    pub edition: String,
    pub workspace: bool,
    /// Rendered `name = spec` lines, sorted by name
    pub dependencies: Vec<String>,
}

/// Render `template` for `file` and normalize the layout.
///
/// Leading blank lines and trailing whitespace are dropped, runs of blank
/// lines collapse to one, and blank lines directly inside braces are
/// removed. `header` is prepended, followed by one blank line.
pub fn render<T: Template>(template: &T, file: &str, header: Option<&str>) -> Result<String> {
    let rendered = template.render().map_err(|source| GenerateError::Render {
        file: file.to_string(),
        source,
    })?;
    Ok(finish(&rendered, header))
}

pub(crate) fn finish(rendered: &str, header: Option<&str>) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in rendered.lines().map(str::trim_end) {
        if line.is_empty() {
            let after_open = lines
                .last()
                .map_or(true, |prev| prev.is_empty() || prev.ends_with('{'));
            if after_open {
                continue;
            }
        } else if line.trim_start().starts_with('}') && lines.last() == Some(&"") {
            lines.pop();
        }
        lines.push(line);
    }
    while lines.last() == Some(&"") {
        lines.pop();
    }

    let mut out = String::with_capacity(rendered.len() + 64);
    if let Some(header) = header {
        out.push_str(header);
        out.push_str("\n\n");
    }
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// [`doc_lines`] joined, each line newline-terminated; empty without docs.
pub fn doc_block(docs: Option<&str>, indent: &str) -> String {
    doc_lines(docs, indent)
        .into_iter()
        .map(|line| line + "\n")
        .collect()
}

/// `///` lines for `docs`, indented by `indent`.
pub fn doc_lines(docs: Option<&str>, indent: &str) -> Vec<String> {
    docs.map(|d| {
        d.trim()
            .lines()
            .map(|line| {
                let line = line.trim_end();
                if line.is_empty() {
                    format!("{}///", indent)
                } else {
                    format!("{}/// {}", indent, line)
                }
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Rust string literal for `s`.
pub fn string_literal(s: &str) -> String {
    format!("{:?}", s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_normalizes_blank_lines() {
        let out = finish("\n\nstruct A {\n\n    a: u8,\n\n}\n\n\n\nstruct B {}   \n\n", None);
        assert_eq!(out, "struct A {\n    a: u8,\n}\n\nstruct B {}\n");
        let out = finish("mod a;\n", Some(RUST_HEADER));
        assert_eq!(out, format!("{}\n\nmod a;\n", RUST_HEADER));
    }

    #[test]
    fn test_doc_lines() {
        assert_eq!(
            doc_lines(Some("First line.\n\nSecond."), "    "),
            vec!["    /// First line.", "    ///", "    /// Second."]
        );
        assert!(doc_lines(None, "").is_empty());
        assert_eq!(doc_block(Some("Widget."), ""), "/// Widget.\n");
        assert_eq!(doc_block(None, "    "), "");
    }

    #[test]
    fn test_mod_rs_template() {
        let data = ModRsTemplateData {
            declarations: vec!["mod enums;".into(), "mod models;".into()],
            reexports: vec!["pub use enums::*;".into(), "pub use models::*;".into()],
        };
        let out = render(&data, "mod.rs", None).unwrap();
        assert_eq!(
            out,
            "mod enums;\nmod models;\n\npub use enums::*;\npub use models::*;\n"
        );
    }

    #[test]
    fn test_cargo_toml_template() {
        let data = CargoTomlTemplateData {
            name: "widgets".into(),
            version: "0.1.0".into(),
            edition: "2021".into(),
            workspace: false,
            dependencies: vec!["serde = { version = \"1\", features = [\"derive\"] }".into()],
        };
        let out = render(&data, "Cargo.toml", None).unwrap();
        assert_eq!(
            out,
            "[package]\nname = \"widgets\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\nserde = { version = \"1\", features = [\"derive\"] }\n"
        );
    }
}
