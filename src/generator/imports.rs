//! Per-file import computation.
//!
//! Every emitted file owns a [`Use`] collector. Types are fed to it as the
//! file is built; it records the module each named type must be imported
//! from, relative to the file's position in the module tree, and renders the
//! minimal, sorted `use` block.
//!
//! A name is imported at most once per file and never over an item the file
//! defines. A type whose name is already taken is spelled with its full path
//! instead, which is why type expressions come from [`Use::decl`].

use super::error::{GenerateError, Result};
use super::model::{ModulePath, Type, TypeGraph};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A crate outside the generated one that descriptions may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalPackage {
    /// Key used in the description (`external { package }`)
    pub package: &'static str,
    /// Module path types are imported from
    pub module: &'static str,
    /// Cargo dependency providing the module, `None` for `std`
    pub dependency: Option<&'static str>,
    pub features: &'static [&'static str],
    /// serde `with` module for values of this package, if the default
    /// serde representation is not the wire format
    pub serde_with: Option<&'static str>,
}

pub const EXTERNAL_PACKAGES: &[ExternalPackage] = &[
    ExternalPackage {
        package: "rust_decimal",
        module: "rust_decimal",
        dependency: Some("rust_decimal"),
        features: &["serde-str"],
        serde_with: None,
    },
    ExternalPackage {
        package: "serde_json",
        module: "serde_json",
        dependency: Some("serde_json"),
        features: &[],
        serde_with: None,
    },
    ExternalPackage {
        package: "std::net",
        module: "std::net",
        dependency: None,
        features: &[],
        serde_with: None,
    },
    ExternalPackage {
        package: "time",
        module: "time",
        dependency: Some("time"),
        features: &["serde", "serde-well-known"],
        serde_with: Some("time::serde::rfc3339"),
    },
    ExternalPackage {
        package: "url",
        module: "url",
        dependency: Some("url"),
        features: &["serde"],
        serde_with: None,
    },
    ExternalPackage {
        package: "uuid",
        module: "uuid",
        dependency: Some("uuid"),
        features: &["serde"],
        serde_with: None,
    },
];

pub fn external_package(package: &str) -> Option<&'static ExternalPackage> {
    EXTERNAL_PACKAGES.iter().find(|p| p.package == package)
}

/// Files under `generated/models/` other than `models.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtherModelFile {
    Enums,
    Unions,
}

/// Where the file being emitted sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitScope {
    /// `generated/clients/*.rs`
    Clients,
    /// `generated/models/models.rs`
    Models,
    /// `generated/models/enums.rs` or `generated/models/unions.rs`
    ModelsOther(OtherModelFile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFile {
    Enums,
    Models,
    Unions,
}

/// One `module::Name` pair to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub module: String,
    pub name: String,
}

impl ImportEntry {
    fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

/// Decides where a single named type is imported from.
#[derive(Debug, Clone, Copy)]
pub struct ImportResolver<'a> {
    graph: &'a TypeGraph,
    module: &'a ModulePath,
    scope: EmitScope,
}

impl<'a> ImportResolver<'a> {
    pub fn new(graph: &'a TypeGraph, module: &'a ModulePath, scope: EmitScope) -> Self {
        Self {
            graph,
            module,
            scope,
        }
    }

    fn current_file(&self) -> Option<ModelFile> {
        match self.scope {
            EmitScope::Clients => None,
            EmitScope::Models => Some(ModelFile::Models),
            EmitScope::ModelsOther(OtherModelFile::Enums) => Some(ModelFile::Enums),
            EmitScope::ModelsOther(OtherModelFile::Unions) => Some(ModelFile::Unions),
        }
    }

    fn model_import(
        &self,
        defined_in: &ModulePath,
        file: ModelFile,
        name: &str,
    ) -> Option<ImportEntry> {
        if self.scope == EmitScope::Clients || defined_in != self.module {
            return Some(ImportEntry::new(defined_in.generated_path("models"), name));
        }
        if self.current_file() == Some(file) {
            None
        } else {
            Some(ImportEntry::new("super", name))
        }
    }

    /// Import needed to name `ty` itself, ignoring any type arguments.
    ///
    /// Returns `Ok(None)` for builtins, `Option`/`Vec` and types defined in
    /// the file being emitted.
    pub fn resolve_named(&self, ty: &Type) -> Result<Option<ImportEntry>> {
        let entry = match ty {
            Type::Enum(id) => {
                let e = self.graph.enum_(*id);
                self.model_import(&e.module, ModelFile::Enums, &e.name)
            }
            Type::Union(id) => {
                let u = self.graph.union(*id);
                self.model_import(&u.module, ModelFile::Unions, &u.name)
            }
            Type::Record(id) => {
                let r = self.graph.record(*id);
                self.model_import(&r.module, ModelFile::Models, &r.name)
            }
            Type::Marker(id) => {
                let m = self.graph.marker(*id);
                self.model_import(&m.module, ModelFile::Models, &m.name)
            }
            Type::Client(id) => {
                let c = self.graph.client(*id);
                if &c.module == self.module {
                    Some(ImportEntry::new("super", &c.name))
                } else {
                    Some(ImportEntry::new(c.module.generated_path("clients"), &c.name))
                }
            }
            Type::HashMap(..) => Some(ImportEntry::new("std::collections", "HashMap")),
            Type::External(ext) => {
                let package = external_package(&ext.package).ok_or_else(|| {
                    GenerateError::UnknownExternalPackage {
                        package: ext.package.clone(),
                        entity: ext.name.clone(),
                    }
                })?;
                Some(ImportEntry::new(package.module, &ext.name))
            }
            Type::Generic(g) => g
                .module
                .as_ref()
                .map(|module| ImportEntry::new(module.clone(), &g.name)),
            Type::Scalar(_) | Type::String | Type::Option(_) | Type::Vec(_) => None,
        };
        Ok(entry)
    }
}

/// Import collector for one emitted file.
#[derive(Debug, Clone)]
pub struct Use<'a> {
    resolver: ImportResolver<'a>,
    entries: BTreeMap<String, BTreeSet<String>>,
    /// Names of the items the file itself defines
    locals: BTreeSet<String>,
    /// Imported name -> module it was imported from
    imported: HashMap<String, String>,
}

impl<'a> Use<'a> {
    pub fn new(graph: &'a TypeGraph, module: &'a ModulePath, scope: EmitScope) -> Self {
        Self {
            resolver: ImportResolver::new(graph, module, scope),
            entries: BTreeMap::new(),
            locals: BTreeSet::new(),
            imported: HashMap::new(),
        }
    }

    /// Declare an item defined by the file; imports of the same name are
    /// spelled with their full path instead. Call before adding imports.
    pub fn local(&mut self, name: impl Into<String>) {
        self.locals.insert(name.into());
    }

    /// Import `name` from `module` unconditionally.
    pub fn add(&mut self, module: &str, name: &str) {
        self.imported
            .entry(name.to_string())
            .or_insert_with(|| module.to_string());
        self.entries
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string());
    }

    fn import(&mut self, entry: ImportEntry) {
        if self.locals.contains(&entry.name) {
            return;
        }
        match self.imported.get(&entry.name) {
            Some(module) if *module != entry.module => return,
            Some(_) => {}
            None => {
                self.imported.insert(entry.name.clone(), entry.module.clone());
            }
        }
        self.entries.entry(entry.module).or_default().insert(entry.name);
    }

    fn is_imported(&self, entry: &ImportEntry) -> bool {
        self.imported.get(&entry.name) == Some(&entry.module)
    }

    /// Import everything needed to spell `ty`, recursing into containers.
    pub fn add_for_type(&mut self, ty: &Type) -> Result<()> {
        if let Some(entry) = self.resolver.resolve_named(ty)? {
            self.import(entry);
        }
        match ty {
            Type::Option(inner) | Type::Vec(inner) => self.add_for_type(inner),
            Type::HashMap(k, v) => {
                self.add_for_type(k)?;
                self.add_for_type(v)
            }
            Type::Generic(g) => {
                for arg in &g.args {
                    self.add_for_type(arg)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Import what `ty` needs and return how the file spells it.
    pub fn decl(&mut self, ty: &Type) -> Result<String> {
        self.add_for_type(ty)?;
        self.spell(ty)
    }

    fn spell(&self, ty: &Type) -> Result<String> {
        let spelled = match ty {
            Type::Option(inner) => format!("Option<{}>", self.spell(inner)?),
            Type::Vec(inner) => format!("Vec<{}>", self.spell(inner)?),
            Type::HashMap(k, v) => format!(
                "{}<{}, {}>",
                self.path_of(ty, "HashMap")?,
                self.spell(k)?,
                self.spell(v)?
            ),
            Type::Generic(g) => {
                let mut args = Vec::with_capacity(g.args.len());
                for arg in &g.args {
                    args.push(self.spell(arg)?);
                }
                format!("{}<{}>", self.path_of(ty, &g.name)?, args.join(", "))
            }
            other => self.path_of(other, &self.resolver.graph.type_decl(other))?,
        };
        Ok(spelled)
    }

    /// `name`, or its full path when the import was refused.
    fn path_of(&self, ty: &Type, name: &str) -> Result<String> {
        Ok(match self.resolver.resolve_named(ty)? {
            Some(entry) if !self.is_imported(&entry) => format!("{}::{}", entry.module, entry.name),
            _ => name.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the `use` block, one statement per module, modules sorted.
    /// Returns an empty string when nothing is imported.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (module, names) in &self.entries {
            if names.len() == 1 {
                for name in names {
                    out.push_str(&format!("use {}::{};\n", module, name));
                }
            } else {
                out.push_str(&format!("use {}::{{\n", module));
                for name in names {
                    out.push_str(&format!("    {},\n", name));
                }
                out.push_str("};\n");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::model::{
        Enum, External, Generic, Record, RecordField, Union, UnionMember, Visibility,
    };
    use crate::ids::{EnumId, RecordId, UnionId};

    fn graph() -> TypeGraph {
        let root = ModulePath::root();
        let admin = root.child("admin");
        let mut graph = TypeGraph::default();
        for (name, module) in [("Widget", &root), ("Part", &root), ("AuditEntry", &admin)] {
            graph.records.push(Record {
                name: name.to_string(),
                docs: None,
                visibility: Visibility::Pub,
                module: module.clone(),
                fields: vec![RecordField {
                    name: "id".into(),
                    serde: "id".into(),
                    docs: None,
                    visibility: Visibility::Pub,
                    ty: Type::String,
                    optional: false,
                }],
            });
        }
        graph.enums.push(Enum {
            name: "Color".into(),
            docs: None,
            visibility: Visibility::Pub,
            module: root.clone(),
            extensible: false,
            values: Vec::new(),
        });
        graph.unions.push(Union {
            name: "Shape".into(),
            docs: None,
            visibility: Visibility::Pub,
            module: root,
            discriminator: "kind".into(),
            envelope: None,
            members: vec![UnionMember {
                name: "Widget".into(),
                discriminator_value: "widget".into(),
                ty: Type::Record(RecordId::new(0)),
            }],
        });
        graph
    }

    #[test]
    fn test_same_file_records_need_no_imports() {
        let graph = graph();
        let root = ModulePath::root();
        let mut uses = Use::new(&graph, &root, EmitScope::Models);
        uses.add_for_type(&Type::Record(RecordId::new(1))).unwrap();
        uses.add_for_type(&Type::Vec(Box::new(Type::Record(RecordId::new(0)))))
            .unwrap();
        uses.add_for_type(&Type::Generic(Generic::boxed(Type::Record(RecordId::new(0)))))
            .unwrap();
        assert!(uses.is_empty());
        assert_eq!(uses.text(), "");
    }

    #[test]
    fn test_sibling_model_files_import_from_super() {
        let graph = graph();
        let root = ModulePath::root();
        let mut uses = Use::new(&graph, &root, EmitScope::Models);
        uses.add_for_type(&Type::option(Type::Enum(EnumId::new(0)))).unwrap();
        uses.add_for_type(&Type::Union(UnionId::new(0))).unwrap();
        assert_eq!(uses.text(), "use super::{\n    Color,\n    Shape,\n};\n");

        let mut uses = Use::new(&graph, &root, EmitScope::ModelsOther(OtherModelFile::Unions));
        uses.add_for_type(&Type::Record(RecordId::new(0))).unwrap();
        uses.add_for_type(&Type::Union(UnionId::new(0))).unwrap();
        assert_eq!(uses.text(), "use super::Widget;\n");
    }

    #[test]
    fn test_clients_and_other_modules_use_absolute_paths() {
        let graph = graph();
        let root = ModulePath::root();
        let mut uses = Use::new(&graph, &root, EmitScope::Clients);
        uses.add_for_type(&Type::Record(RecordId::new(0))).unwrap();
        uses.add_for_type(&Type::Record(RecordId::new(2))).unwrap();
        uses.add("url", "Url");
        assert_eq!(
            uses.text(),
            "use crate::admin::generated::models::AuditEntry;\n\
             use crate::generated::models::Widget;\n\
             use url::Url;\n"
        );

        let admin = root.child("admin");
        let mut uses = Use::new(&graph, &admin, EmitScope::Models);
        uses.add_for_type(&Type::Record(RecordId::new(0))).unwrap();
        uses.add_for_type(&Type::Record(RecordId::new(2))).unwrap();
        assert_eq!(uses.text(), "use crate::generated::models::Widget;\n");
    }

    #[test]
    fn test_local_items_are_not_shadowed_by_imports() {
        let graph = graph();
        let admin = ModulePath::root().child("admin");
        let mut uses = Use::new(&graph, &admin, EmitScope::Models);
        uses.local("Widget");
        assert_eq!(
            uses.decl(&Type::option(Type::Record(RecordId::new(0)))).unwrap(),
            "Option<crate::generated::models::Widget>"
        );
        assert_eq!(uses.decl(&Type::Record(RecordId::new(1))).unwrap(), "Part");
        assert_eq!(uses.text(), "use crate::generated::models::Part;\n");
    }

    #[test]
    fn test_second_claimant_of_a_name_is_spelled_in_full() {
        let mut graph = graph();
        let mut url = graph.records[1].clone();
        url.name = "Url".into();
        graph.records.push(url);
        let root = ModulePath::root();
        let mut uses = Use::new(&graph, &root, EmitScope::Clients);
        uses.local("WidgetClient");
        uses.add("url", "Url");
        let external = Type::External(External {
            package: "url".into(),
            name: "Url".into(),
        });
        assert_eq!(
            uses.decl(&Type::Record(RecordId::new(3))).unwrap(),
            "crate::generated::models::Url"
        );
        assert_eq!(uses.decl(&external).unwrap(), "Url");
        assert_eq!(
            uses.decl(&Type::HashMap(
                Box::new(Type::String),
                Box::new(Type::Vec(Box::new(Type::Record(RecordId::new(0)))))
            ))
            .unwrap(),
            "HashMap<String, Vec<Widget>>"
        );
        assert_eq!(
            uses.text(),
            "use crate::generated::models::Widget;\n\
             use std::collections::HashMap;\n\
             use url::Url;\n"
        );
    }

    #[test]
    fn test_externals_and_maps() {
        let graph = graph();
        let root = ModulePath::root();
        let mut uses = Use::new(&graph, &root, EmitScope::Models);
        let ts = Type::External(External {
            package: "time".into(),
            name: "OffsetDateTime".into(),
        });
        uses.add_for_type(&Type::HashMap(Box::new(Type::String), Box::new(ts.clone())))
            .unwrap();
        uses.add_for_type(&ts).unwrap();
        assert_eq!(
            uses.text(),
            "use std::collections::HashMap;\nuse time::OffsetDateTime;\n"
        );
    }

    #[test]
    fn test_unknown_external_package_is_fatal() {
        let graph = graph();
        let root = ModulePath::root();
        let mut uses = Use::new(&graph, &root, EmitScope::Models);
        let err = uses
            .add_for_type(&Type::External(External {
                package: "left_pad".into(),
                name: "Pad".into(),
            }))
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnknownExternalPackage { .. }));
    }
}
