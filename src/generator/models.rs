//! Emitters for `generated/models/`: enums, records, markers and unions.

use super::error::Result;
use super::imports::{external_package, EmitScope, OtherModelFile, Use};
use super::model::{Enum, Module, Record, SortedCrate, Type, TypeGraph, Union};
use super::templates::{
    doc_block, render, string_literal, EnumValueView, EnumView, EnumsTemplateData, FieldView,
    FileText, MarkerView, ModRsTemplateData, ModelsTemplateData, RecordView, UnionMemberView,
    UnionView, UnionsTemplateData,
};

const FIXED_ENUM_DERIVES: &str = "Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize";
const EXTENSIBLE_ENUM_DERIVES: &str = "Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize";

fn add_serde(uses: &mut Use<'_>) {
    uses.add("serde", "Deserialize");
    uses.add("serde", "Serialize");
}

/// Render every file of `module`'s `generated/models/` directory, `mod.rs`
/// first. Empty when the module declares no models.
pub fn emit_model_files(
    krate: &SortedCrate,
    module: &Module,
    header: Option<&str>,
) -> Result<Vec<FileText>> {
    if !module.has_models() {
        return Ok(Vec::new());
    }
    let graph = &krate.graph;
    let mut files = Vec::new();
    let mut declared = Vec::new();

    if !module.enums.is_empty() {
        declared.push("enums");
        files.push(FileText {
            name: "enums.rs".to_string(),
            content: emit_enums(graph, module, header)?,
        });
    }
    if !module.records.is_empty() || !module.markers.is_empty() {
        declared.push("models");
        files.push(FileText {
            name: "models.rs".to_string(),
            content: emit_records(graph, module, header)?,
        });
    }
    if !module.unions.is_empty() {
        declared.push("unions");
        files.push(FileText {
            name: "unions.rs".to_string(),
            content: emit_unions(graph, module, header)?,
        });
    }

    let mod_rs = ModRsTemplateData {
        declarations: declared
            .iter()
            .map(|m| {
                if *m == "models" {
                    "#[allow(clippy::module_inception)]\nmod models;".to_string()
                } else {
                    format!("mod {};", m)
                }
            })
            .collect(),
        reexports: declared.iter().map(|m| format!("pub use {}::*;", m)).collect(),
    };
    files.insert(
        0,
        FileText {
            name: "mod.rs".to_string(),
            content: render(&mod_rs, "generated/models/mod.rs", header)?,
        },
    );
    Ok(files)
}

fn enum_view(e: &Enum) -> EnumView {
    let values = e
        .values
        .iter()
        .map(|v| {
            let wire = v.value.to_string();
            let mut prelude = doc_block(v.docs.as_deref(), "    ");
            if wire != v.name {
                prelude.push_str(&format!("    #[serde(rename = {})]\n", string_literal(&wire)));
            }
            EnumValueView {
                prelude,
                name: v.name.clone(),
                wire: string_literal(&wire),
            }
        })
        .collect();
    EnumView {
        docs: doc_block(e.docs.as_deref(), ""),
        derives: if e.extensible {
            EXTENSIBLE_ENUM_DERIVES.to_string()
        } else {
            FIXED_ENUM_DERIVES.to_string()
        },
        visibility: e.visibility.prefix(),
        name: e.name.clone(),
        extensible: e.extensible,
        values,
    }
}

fn emit_enums(graph: &TypeGraph, module: &Module, header: Option<&str>) -> Result<String> {
    let mut uses = Use::new(
        graph,
        &module.path,
        EmitScope::ModelsOther(OtherModelFile::Enums),
    );
    add_serde(&mut uses);
    let data = EnumsTemplateData {
        uses: uses.text(),
        enums: module.enums.iter().map(|id| enum_view(graph.enum_(*id))).collect(),
    };
    render(&data, "generated/models/enums.rs", header)
}

/// serde `with` module for values of `ty`, if its package needs one.
fn serde_with(ty: &Type) -> Option<String> {
    let (inner, optional) = match ty {
        Type::Option(inner) => (inner.as_ref(), true),
        other => (other, false),
    };
    let Type::External(ext) = inner else {
        return None;
    };
    let module = external_package(&ext.package)?.serde_with?;
    Some(if optional {
        format!("{}::option", module)
    } else {
        module.to_string()
    })
}

fn record_view(graph: &TypeGraph, record: &Record, uses: &mut Use<'_>) -> Result<RecordView> {
    let mut fields = Vec::with_capacity(record.fields.len());
    for f in &record.fields {
        let ty = uses.decl(&f.ty)?;
        let mut serde = Vec::new();
        if f.serde != f.name {
            serde.push(format!("rename = {}", string_literal(&f.serde)));
        }
        if f.optional {
            serde.push("default".to_string());
            serde.push("skip_serializing_if = \"Option::is_none\"".to_string());
        }
        if let Some(with) = serde_with(&f.ty) {
            serde.push(format!("with = {}", string_literal(&with)));
        }
        let mut prelude = doc_block(f.docs.as_deref(), "    ");
        if !serde.is_empty() {
            prelude.push_str(&format!("    #[serde({})]\n", serde.join(", ")));
        }
        fields.push(FieldView {
            prelude,
            visibility: f.visibility.prefix(),
            name: f.name.clone(),
            ty,
        });
    }

    let defaultable = record.fields.iter().all(|f| graph.is_defaultable(&f.ty));
    let derives = if defaultable {
        "Clone, Debug, Default, Deserialize, Serialize"
    } else {
        "Clone, Debug, Deserialize, Serialize"
    };
    Ok(RecordView {
        docs: doc_block(record.docs.as_deref(), ""),
        derives: derives.to_string(),
        visibility: record.visibility.prefix(),
        name: record.name.clone(),
        fields,
    })
}

fn emit_records(graph: &TypeGraph, module: &Module, header: Option<&str>) -> Result<String> {
    let mut uses = Use::new(graph, &module.path, EmitScope::Models);
    for id in &module.records {
        uses.local(&graph.record(*id).name);
    }
    for id in &module.markers {
        uses.local(&graph.marker(*id).name);
    }
    add_serde(&mut uses);
    let mut records = Vec::with_capacity(module.records.len());
    for id in &module.records {
        records.push(record_view(graph, graph.record(*id), &mut uses)?);
    }
    let markers = module
        .markers
        .iter()
        .map(|id| {
            let m = graph.marker(*id);
            MarkerView {
                docs: doc_block(m.docs.as_deref(), ""),
                visibility: m.visibility.prefix(),
                name: m.name.clone(),
            }
        })
        .collect();
    let data = ModelsTemplateData {
        uses: uses.text(),
        records,
        markers,
    };
    render(&data, "generated/models/models.rs", header)
}

fn union_view(union: &Union, uses: &mut Use<'_>) -> Result<UnionView> {
    let mut members = Vec::with_capacity(union.members.len());
    for m in &union.members {
        members.push(UnionMemberView {
            name: m.name.clone(),
            wire: string_literal(&m.discriminator_value),
            ty: uses.decl(&m.ty)?,
        });
    }
    let tagging = match &union.envelope {
        Some(envelope) => format!(
            "tag = {}, content = {}",
            string_literal(&union.discriminator),
            string_literal(envelope)
        ),
        None => format!("tag = {}", string_literal(&union.discriminator)),
    };
    Ok(UnionView {
        docs: doc_block(union.docs.as_deref(), ""),
        visibility: union.visibility.prefix(),
        name: union.name.clone(),
        tagging,
        members,
    })
}

fn emit_unions(graph: &TypeGraph, module: &Module, header: Option<&str>) -> Result<String> {
    let mut uses = Use::new(
        graph,
        &module.path,
        EmitScope::ModelsOther(OtherModelFile::Unions),
    );
    for id in &module.unions {
        uses.local(&graph.union(*id).name);
    }
    add_serde(&mut uses);
    let mut unions = Vec::with_capacity(module.unions.len());
    for id in &module.unions {
        unions.push(union_view(graph.union(*id), &mut uses)?);
    }
    let data = UnionsTemplateData {
        uses: uses.text(),
        unions,
    };
    render(&data, "generated/models/unions.rs", header)
}
