//! Module index files: `lib.rs` / `<sub>/mod.rs`, `generated/mod.rs` and
//! the shared `generated/error.rs`.

use super::error::Result;
use super::model::{Module, SortedCrate, Visibility};
use super::templates::{render, ErrorTemplate, ModRsTemplateData, ModuleTemplateData};

/// Lints the generated code trips by construction.
const ROOT_INNER_ATTRIBUTES: &[&str] =
    &["#![allow(clippy::too_many_arguments, non_camel_case_types, non_snake_case)]"];

/// Every `generated` tree carries its own allow for `COLLIDES_` names, so
/// it holds when an existing `lib.rs` is kept.
const GENERATED_INNER_ATTRIBUTE: &str = "#![allow(non_camel_case_types, non_snake_case)]";

/// Prefix of names handed out for colliding requests.
const COLLIDES_PREFIX: &str = "COLLIDES_";

/// Whether `module` needs a `generated` directory at all.
pub fn has_generated(module: &Module) -> bool {
    if module.path.is_root() {
        module.has_content() || module.has_clients_recursive()
    } else {
        module.has_content()
    }
}

/// Render `lib.rs` for the root module, `mod.rs` for any other.
pub fn emit_module_index(krate: &SortedCrate, module: &Module, header: Option<&str>) -> Result<String> {
    let root = module.path.is_root();
    let data = ModuleTemplateData {
        inner_attributes: if root {
            ROOT_INNER_ATTRIBUTES.iter().map(|a| a.to_string()).collect()
        } else {
            Vec::new()
        },
        has_generated: has_generated(module),
        sub_modules: module.sub_modules.iter().map(|m| sub_module_declaration(&m.name)).collect(),
        has_clients: !module.clients.is_empty(),
        has_models: module.has_models(),
        exports_error: root && module.has_clients_recursive(),
        reexports: client_reexports(krate, module),
    };
    let file = if root { "lib.rs" } else { "mod.rs" };
    render(&data, file, header)
}

fn sub_module_declaration(name: &str) -> String {
    if name.starts_with(COLLIDES_PREFIX) {
        format!("#[allow(non_snake_case)]\npub mod {};", name)
    } else {
        format!("pub mod {};", name)
    }
}

/// `pub use clients::{..};` for every public constructable client, its
/// options and the option types of its public methods.
fn client_reexports(krate: &SortedCrate, module: &Module) -> Vec<String> {
    let mut names = Vec::new();
    for id in &module.clients {
        let client = krate.graph.client(*id);
        if client.visibility != Visibility::Pub {
            continue;
        }
        let Some(ctor) = &client.constructor else {
            continue;
        };
        names.push(client.name.clone());
        names.push(ctor.options_name.clone());
        for m in &client.methods {
            if !m.is_accessor() && m.visibility == Visibility::Pub {
                names.push(m.options_name.clone());
            }
        }
    }
    names.sort();
    match names.len() {
        0 => Vec::new(),
        1 => vec![format!("pub use clients::{};", names[0])],
        _ => vec![format!("pub use clients::{{{}}};", names.join(", "))],
    }
}

/// Render `generated/mod.rs`.
pub fn emit_generated_mod(module: &Module, header: Option<&str>) -> Result<String> {
    let mut declarations = vec![GENERATED_INNER_ATTRIBUTE.to_string(), String::new()];
    if !module.clients.is_empty() {
        declarations.push("pub mod clients;".to_string());
    }
    if module.path.is_root() && module.has_clients_recursive() {
        declarations.push("pub mod error;".to_string());
    }
    if module.has_models() {
        declarations.push("pub mod models;".to_string());
    }
    render(
        &ModRsTemplateData {
            declarations,
            reexports: Vec::new(),
        },
        "generated/mod.rs",
        header,
    )
}

/// Render `generated/error.rs`.
pub fn emit_error(header: Option<&str>) -> Result<String> {
    render(&ErrorTemplate, "generated/error.rs", header)
}
