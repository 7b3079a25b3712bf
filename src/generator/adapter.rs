//! Source graph → code model.
//!
//! The [`Adapter`] is the run-scoped context: it owns the identity caches,
//! the symbol tables and the type graph under construction. Names are
//! registered for every entity before any is resolved, so collisions are
//! detected regardless of conversion order.

use super::diagnostics::Diagnostics;
use super::error::{GenerateError, Result};
use super::imports::external_package;
use super::model::*;
use super::naming::{self, NameContext};
use super::symbols::SymbolTable;
use crate::ids::*;
use crate::spec::{
    Access, Builtin, NamespacePath, SourceGraph, SourceMethod, SourceMethodKind, SourcePaging,
    SourceType, TokenResponseDecl,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::{Display, Formatter};
use tracing::{debug, info};

/// Module names every generated module already uses.
const RESERVED_MODULE_NAMES: &[&str] = &["clients", "generated", "models"];

/// Names taken on every client struct and in its constructor.
const CLIENT_BUILTINS: &[&str] = &["endpoint", "http", "options"];

/// Variant holding unrecognized values of extensible enums.
const UNKNOWN_VARIANT: &str = "UnknownValue";

/// Argument and local names used by generated method bodies.
const METHOD_LOCALS: &[&str] = &[
    "items",
    "next_link",
    "next_token",
    "options",
    "page",
    "request",
    "response",
    "token",
    "url",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TypeKey {
    Enum(SourceEnumId),
    Model(SourceModelId),
    Union(SourceUnionId),
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKey::Enum(id) => write!(f, "{}", id),
            TypeKey::Model(id) => write!(f, "{}", id),
            TypeKey::Union(id) => write!(f, "{}", id),
        }
    }
}

/// Items declared in a module's `generated/clients/`: the client structs
/// and their options structs share one namespace there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ClientKey {
    Client(SourceClientId),
    Options(SourceClientId),
    MethodOptions(SourceClientId, usize),
}

impl Display for ClientKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientKey::Client(id) => write!(f, "{}", id),
            ClientKey::Options(id) => write!(f, "options of {}", id),
            ClientKey::MethodOptions(id, i) => write!(f, "options of method {} of {}", i, id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelTarget {
    Record(RecordId),
    Marker(MarkerId),
}

/// Result of adaptation: the unsorted crate plus collected diagnostics.
#[derive(Debug)]
pub struct Adapted {
    pub krate: Crate,
    pub diagnostics: Diagnostics,
}

pub struct Adapter<'a> {
    source: &'a SourceGraph,
    diagnostics: Diagnostics,
    graph: TypeGraph,
    root: Module,

    module_paths: HashMap<NamespacePath, ModulePath>,
    type_names: HashMap<NamespacePath, SymbolTable<TypeKey>>,
    client_names: HashMap<NamespacePath, SymbolTable<ClientKey>>,

    enums: HashMap<SourceEnumId, EnumId>,
    models: HashMap<SourceModelId, ModelTarget>,
    unions: HashMap<SourceUnionId, UnionId>,
    clients: HashMap<SourceClientId, ClientId>,
    client_files: HashMap<SourceClientId, String>,
    records_in_progress: HashSet<RecordId>,
    unions_in_progress: HashSet<UnionId>,
    external_packages: BTreeSet<&'static str>,
}

fn visibility(access: Access) -> Visibility {
    match access {
        Access::Public => Visibility::Pub,
        Access::Internal => Visibility::PubCrate,
    }
}

fn namespace_label(ns: &NamespacePath) -> String {
    if ns.is_empty() {
        "the root module".to_string()
    } else {
        format!("namespace '{}'", ns.join("."))
    }
}

/// Adapt `source` into a [`Crate`] named `name` at `version`.
pub fn adapt(source: &SourceGraph, name: &str, version: &str) -> Result<Adapted> {
    let mut adapter = Adapter::new(source);
    adapter.register_modules()?;
    adapter.register_types()?;
    adapter.register_clients()?;

    for i in 0..source.enums.len() {
        adapter.convert_enum(SourceEnumId::new(i))?;
    }
    for i in 0..source.models.len() {
        adapter.convert_model(SourceModelId::new(i))?;
    }
    for i in 0..source.unions.len() {
        adapter.convert_union(SourceUnionId::new(i))?;
    }
    adapter.resolve_client_files()?;
    for i in 0..source.clients.len() {
        adapter.convert_client(SourceClientId::new(i))?;
    }

    let dependencies = adapter.dependencies();
    info!(
        enums = adapter.graph.enums.len(),
        records = adapter.graph.records.len(),
        markers = adapter.graph.markers.len(),
        unions = adapter.graph.unions.len(),
        clients = adapter.graph.clients.len(),
        diagnostics = adapter.diagnostics.len(),
        "adapted service description"
    );
    Ok(Adapted {
        krate: Crate {
            name: name.to_string(),
            version: version.to_string(),
            dependencies,
            graph: adapter.graph,
            root: adapter.root,
        },
        diagnostics: adapter.diagnostics,
    })
}

impl<'a> Adapter<'a> {
    pub fn new(source: &'a SourceGraph) -> Self {
        Self {
            source,
            diagnostics: Diagnostics::new(),
            graph: TypeGraph::default(),
            root: Module::new("", ModulePath::root()),
            module_paths: HashMap::new(),
            type_names: HashMap::new(),
            client_names: HashMap::new(),
            enums: HashMap::new(),
            models: HashMap::new(),
            unions: HashMap::new(),
            clients: HashMap::new(),
            client_files: HashMap::new(),
            records_in_progress: HashSet::new(),
            unions_in_progress: HashSet::new(),
            external_packages: BTreeSet::new(),
        }
    }

    /// Assign a module name to every namespace segment, per parent module.
    fn register_modules(&mut self) -> Result<()> {
        let source = self.source;
        let mut namespaces: BTreeSet<NamespacePath> = BTreeSet::new();
        let all = source
            .enums
            .iter()
            .map(|e| &e.namespace)
            .chain(source.models.iter().map(|m| &m.namespace))
            .chain(source.unions.iter().map(|u| &u.namespace))
            .chain(source.clients.iter().map(|c| &c.namespace));
        for ns in all {
            for len in 0..=ns.len() {
                namespaces.insert(ns[..len].to_vec());
            }
        }

        let mut tables: HashMap<NamespacePath, SymbolTable<String>> = HashMap::new();
        for ns in namespaces.iter().filter(|ns| !ns.is_empty()) {
            let parent = ns[..ns.len() - 1].to_vec();
            let table = tables.entry(parent.clone()).or_insert_with(|| {
                SymbolTable::new(format!("sub-modules of {}", namespace_label(&parent)))
            });
            let segment = &ns[ns.len() - 1];
            table.add(
                naming::snake_name(segment, NameContext::Module),
                format!("namespace '{}'", ns.join(".")),
                segment.clone(),
            )?;
        }
        for (parent, table) in tables.iter_mut() {
            for reserved in RESERVED_MODULE_NAMES {
                let key = format!("module '{}' of {}", reserved, namespace_label(parent));
                table.add(*reserved, key, *reserved)?;
            }
        }

        self.module_paths.insert(Vec::new(), ModulePath::root());
        for ns in namespaces.iter().filter(|ns| !ns.is_empty()) {
            let parent = ns[..ns.len() - 1].to_vec();
            let parent_path = self.module_paths.get(&parent).cloned().unwrap_or_default();
            let key = format!("namespace '{}'", ns.join("."));
            let name = match tables.get_mut(&parent) {
                Some(table) => table.get(&key, &mut self.diagnostics)?,
                None => naming::snake_name(&ns[ns.len() - 1], NameContext::Module),
            };
            let path = parent_path.child(name);
            self.root.descendant_mut(&path);
            self.module_paths.insert(ns.clone(), path);
        }
        Ok(())
    }

    fn type_table(&mut self, ns: &NamespacePath) -> &mut SymbolTable<TypeKey> {
        self.type_names
            .entry(ns.clone())
            .or_insert_with(|| SymbolTable::new(format!("types of {}", namespace_label(ns))))
    }

    fn register_types(&mut self) -> Result<()> {
        let source = self.source;
        for (i, e) in source.enums.iter().enumerate() {
            let key = TypeKey::Enum(SourceEnumId::new(i));
            self.type_table(&e.namespace)
                .add(naming::type_name(&e.name), key, &e.name)?;
        }
        for (i, m) in source.models.iter().enumerate() {
            let key = TypeKey::Model(SourceModelId::new(i));
            self.type_table(&m.namespace)
                .add(naming::type_name(&m.name), key, &m.name)?;
        }
        for (i, u) in source.unions.iter().enumerate() {
            let key = TypeKey::Union(SourceUnionId::new(i));
            self.type_table(&u.namespace)
                .add(naming::type_name(&u.name), key, &u.name)?;
        }
        Ok(())
    }

    fn register_clients(&mut self) -> Result<()> {
        let source = self.source;
        for (i, c) in source.clients.iter().enumerate() {
            let table = self.client_names.entry(c.namespace.clone()).or_insert_with(|| {
                SymbolTable::new(format!("clients of {}", namespace_label(&c.namespace)))
            });
            let id = SourceClientId::new(i);
            let client = naming::type_name(&c.name);
            table.add(client.clone(), ClientKey::Client(id), &c.name)?;
            if c.constructable {
                table.add(format!("{}Options", client), ClientKey::Options(id), &c.name)?;
            }
            for (j, m) in c.methods.iter().enumerate() {
                if matches!(m.kind, SourceMethodKind::ClientAccessor(_)) {
                    continue;
                }
                table.add(
                    format!("{}{}Options", client, naming::type_name(&m.name)),
                    ClientKey::MethodOptions(id, j),
                    &m.name,
                )?;
            }
        }
        Ok(())
    }

    fn type_name_of(&mut self, ns: &NamespacePath, key: TypeKey) -> Result<String> {
        let table = self
            .type_names
            .get_mut(ns)
            .ok_or_else(|| GenerateError::UnregisteredSymbol {
                scope: format!("types of {}", namespace_label(ns)),
                entity: key.to_string(),
            })?;
        table.get(&key, &mut self.diagnostics)
    }

    fn client_name_of(&mut self, ns: &NamespacePath, key: ClientKey) -> Result<String> {
        let table = self
            .client_names
            .get_mut(ns)
            .ok_or_else(|| GenerateError::UnregisteredSymbol {
                scope: format!("clients of {}", namespace_label(ns)),
                entity: key.to_string(),
            })?;
        table.get(&key, &mut self.diagnostics)
    }

    fn module_of(&self, ns: &NamespacePath) -> ModulePath {
        self.module_paths.get(ns).cloned().unwrap_or_default()
    }

    /// File stems for client modules; distinct client names can share a
    /// snake_case spelling, so they get their own scope per module.
    fn resolve_client_files(&mut self) -> Result<()> {
        let source = self.source;
        let mut tables: HashMap<NamespacePath, SymbolTable<SourceClientId>> = HashMap::new();
        let mut names = Vec::with_capacity(source.clients.len());
        for (i, c) in source.clients.iter().enumerate() {
            let id = SourceClientId::new(i);
            let name = self.client_name_of(&c.namespace, ClientKey::Client(id))?;
            let table = tables.entry(c.namespace.clone()).or_insert_with(|| {
                SymbolTable::new(format!("client files of {}", namespace_label(&c.namespace)))
            });
            table.add(naming::snake_name(&name, NameContext::Module), id, name.clone())?;
            names.push(id);
        }
        for id in names {
            let ns = &source.client(id).namespace;
            if let Some(table) = tables.get_mut(ns) {
                let file = table.get(&id, &mut self.diagnostics)?;
                self.client_files.insert(id, file);
            }
        }
        Ok(())
    }

    fn convert_enum(&mut self, id: SourceEnumId) -> Result<EnumId> {
        if let Some(existing) = self.enums.get(&id) {
            return Ok(*existing);
        }
        let source = self.source;
        let src = source.enum_(id);
        let name = self.type_name_of(&src.namespace, TypeKey::Enum(id))?;
        let module = self.module_of(&src.namespace);

        let mut table = SymbolTable::new(format!("values of enum {}", name));
        if !src.fixed {
            table.add(UNKNOWN_VARIANT, "catch-all variant".to_string(), UNKNOWN_VARIANT)?;
        }
        for (i, v) in src.values.iter().enumerate() {
            let requested =
                naming::escape_reserved(naming::normalize(&v.name, src.kind), NameContext::Type);
            table.add(requested, format!("value {}", i), &v.name)?;
        }
        let mut values = Vec::with_capacity(src.values.len());
        for (i, v) in src.values.iter().enumerate() {
            values.push(EnumValue {
                name: table.get(&format!("value {}", i), &mut self.diagnostics)?,
                docs: v.docs.clone(),
                value: v.value.clone(),
            });
        }

        let eid = EnumId::new(self.graph.enums.len());
        debug!(entity = %src.id, name = %name, module = %module, "adapted enum");
        self.root.descendant_mut(&module).enums.push(eid);
        self.graph.enums.push(Enum {
            name,
            docs: src.docs.clone(),
            visibility: visibility(src.access),
            module,
            extensible: !src.fixed,
            values,
        });
        self.enums.insert(id, eid);
        Ok(eid)
    }

    fn convert_model(&mut self, id: SourceModelId) -> Result<ModelTarget> {
        if let Some(existing) = self.models.get(&id) {
            return Ok(*existing);
        }
        let source = self.source;
        let src = source.model(id);
        if src.name.trim().is_empty() {
            return Err(GenerateError::UnnamedRecord {
                entity: src.id.clone(),
            });
        }
        let name = self.type_name_of(&src.namespace, TypeKey::Model(id))?;
        let module = self.module_of(&src.namespace);

        if src.properties.is_empty() {
            let mid = MarkerId::new(self.graph.markers.len());
            debug!(entity = %src.id, name = %name, module = %module, "adapted marker");
            self.root.descendant_mut(&module).markers.push(mid);
            self.graph.markers.push(Marker {
                name,
                docs: src.docs.clone(),
                visibility: visibility(src.access),
                module,
            });
            self.models.insert(id, ModelTarget::Marker(mid));
            return Ok(ModelTarget::Marker(mid));
        }

        // cached before the fields are converted so self references terminate
        let rid = RecordId::new(self.graph.records.len());
        self.root.descendant_mut(&module).records.push(rid);
        self.graph.records.push(Record {
            name: name.clone(),
            docs: src.docs.clone(),
            visibility: visibility(src.access),
            module: module.clone(),
            fields: Vec::new(),
        });
        self.models.insert(id, ModelTarget::Record(rid));
        self.records_in_progress.insert(rid);

        let mut table = SymbolTable::new(format!("fields of {}", name));
        for (i, p) in src.properties.iter().enumerate() {
            table.add(naming::snake_name(&p.name, NameContext::Property), i, &p.name)?;
        }
        let mut fields = Vec::with_capacity(src.properties.len());
        for (i, p) in src.properties.iter().enumerate() {
            let ty = self.convert_type(&p.ty, true)?;
            fields.push(RecordField {
                name: table.get(&i, &mut self.diagnostics)?,
                serde: p.name.clone(),
                docs: p.docs.clone(),
                visibility: visibility(p.access),
                ty: if p.required { ty } else { Type::option(ty) },
                optional: !p.required,
            });
        }

        self.graph.records[rid.index()].fields = fields;
        self.records_in_progress.remove(&rid);
        debug!(entity = %src.id, name = %name, module = %module, "adapted record");
        Ok(ModelTarget::Record(rid))
    }

    fn convert_union(&mut self, id: SourceUnionId) -> Result<UnionId> {
        if let Some(existing) = self.unions.get(&id) {
            return Ok(*existing);
        }
        let source = self.source;
        let src = source.union(id);
        let name = self.type_name_of(&src.namespace, TypeKey::Union(id))?;
        let module = self.module_of(&src.namespace);

        let uid = UnionId::new(self.graph.unions.len());
        self.root.descendant_mut(&module).unions.push(uid);
        self.graph.unions.push(Union {
            name: name.clone(),
            docs: src.docs.clone(),
            visibility: visibility(src.access),
            module: module.clone(),
            discriminator: src.discriminator.clone(),
            envelope: src.envelope.clone(),
            members: Vec::new(),
        });
        self.unions.insert(id, uid);
        self.unions_in_progress.insert(uid);

        let mut table = SymbolTable::new(format!("members of union {}", name));
        for (i, m) in src.members.iter().enumerate() {
            table.add(naming::type_name(&m.discriminator_value), i, &m.discriminator_value)?;
        }
        let mut members = Vec::with_capacity(src.members.len());
        for (i, m) in src.members.iter().enumerate() {
            let ty = self.convert_type(&m.ty, true)?;
            members.push(UnionMember {
                name: table.get(&i, &mut self.diagnostics)?,
                discriminator_value: m.discriminator_value.clone(),
                ty,
            });
        }

        self.graph.unions[uid.index()].members = members;
        self.unions_in_progress.remove(&uid);
        debug!(entity = %src.id, name = %name, module = %module, "adapted union");
        Ok(uid)
    }

    /// Convert a type reference. `boxable` marks positions stored inline in
    /// a record or union, where a reference to a type still under
    /// construction must be boxed to keep the type finite.
    fn convert_type(&mut self, ty: &SourceType, boxable: bool) -> Result<Type> {
        let converted = match ty {
            SourceType::Builtin(b) => self.convert_builtin(*b),
            SourceType::Array(inner) => Type::Vec(Box::new(self.convert_type(inner, false)?)),
            SourceType::Dictionary(value) => Type::HashMap(
                Box::new(Type::String),
                Box::new(self.convert_type(value, false)?),
            ),
            SourceType::Nullable(inner) => Type::option(self.convert_type(inner, boxable)?),
            SourceType::Enum(id) => Type::Enum(self.convert_enum(*id)?),
            SourceType::Model(id) => match self.convert_model(*id)? {
                ModelTarget::Marker(mid) => Type::Marker(mid),
                ModelTarget::Record(rid) if boxable && self.records_in_progress.contains(&rid) => {
                    Type::Generic(Generic::boxed(Type::Record(rid)))
                }
                ModelTarget::Record(rid) => Type::Record(rid),
            },
            SourceType::Union(id) => {
                let uid = self.convert_union(*id)?;
                if boxable && self.unions_in_progress.contains(&uid) {
                    Type::Generic(Generic::boxed(Type::Union(uid)))
                } else {
                    Type::Union(uid)
                }
            }
            SourceType::External { package, name } => {
                let known = external_package(package).ok_or_else(|| {
                    GenerateError::UnknownExternalPackage {
                        package: package.clone(),
                        entity: name.clone(),
                    }
                })?;
                self.external_packages.insert(known.package);
                Type::External(External {
                    package: package.clone(),
                    name: name.clone(),
                })
            }
        };
        Ok(converted)
    }

    fn external(&mut self, package: &'static str, name: &str) -> Type {
        self.external_packages.insert(package);
        Type::External(External {
            package: package.to_string(),
            name: name.to_string(),
        })
    }

    fn convert_builtin(&mut self, builtin: Builtin) -> Type {
        match builtin {
            Builtin::Boolean => Type::Scalar(Scalar::Bool),
            Builtin::Int8 => Type::Scalar(Scalar::I8),
            Builtin::Int16 => Type::Scalar(Scalar::I16),
            Builtin::Int32 => Type::Scalar(Scalar::I32),
            Builtin::Int64 => Type::Scalar(Scalar::I64),
            Builtin::Uint8 => Type::Scalar(Scalar::U8),
            Builtin::Uint16 => Type::Scalar(Scalar::U16),
            Builtin::Uint32 => Type::Scalar(Scalar::U32),
            Builtin::Uint64 => Type::Scalar(Scalar::U64),
            Builtin::Float32 => Type::Scalar(Scalar::F32),
            Builtin::Float64 => Type::Scalar(Scalar::F64),
            Builtin::String | Builtin::Duration => Type::String,
            Builtin::Bytes => Type::Vec(Box::new(Type::Scalar(Scalar::U8))),
            Builtin::Decimal => self.external("rust_decimal", "Decimal"),
            Builtin::Url => self.external("url", "Url"),
            Builtin::UtcDateTime => self.external("time", "OffsetDateTime"),
            Builtin::Uuid => self.external("uuid", "Uuid"),
            Builtin::Any => self.external("serde_json", "Value"),
        }
    }

    fn convert_client(&mut self, id: SourceClientId) -> Result<ClientId> {
        if let Some(existing) = self.clients.get(&id) {
            return Ok(*existing);
        }
        let source = self.source;
        let src = source.client(id);
        let name = self.client_name_of(&src.namespace, ClientKey::Client(id))?;
        let module = self.module_of(&src.namespace);
        let constructor = if src.constructable {
            Some(Constructor {
                options_name: self.client_name_of(&src.namespace, ClientKey::Options(id))?,
            })
        } else {
            None
        };
        let file_name = self
            .client_files
            .get(&id)
            .cloned()
            .unwrap_or_else(|| naming::to_snake_case(&name));

        // cached first: accessors may point back at this client
        let cid = ClientId::new(self.graph.clients.len());
        self.root.descendant_mut(&module).clients.push(cid);
        self.graph.clients.push(Client {
            name: name.clone(),
            docs: src.docs.clone(),
            visibility: visibility(src.access),
            module: module.clone(),
            file_name,
            constructor,
            fields: Vec::new(),
            methods: Vec::new(),
        });
        self.clients.insert(id, cid);

        let mut params: Vec<_> = src
            .parameters
            .iter()
            .filter(|p| p.name != "endpoint")
            .collect();
        sort_client_parameters(&mut params, |p| p.name.as_str());

        let mut table = SymbolTable::new(format!("fields of client {}", name));
        for builtin in CLIENT_BUILTINS {
            table.add(*builtin, format!("built-in field '{}'", builtin), *builtin)?;
        }
        for p in &params {
            table.add(
                naming::snake_name(&p.name, NameContext::Property),
                format!("parameter '{}'", p.name),
                &p.name,
            )?;
        }
        let mut fields = Vec::with_capacity(params.len());
        for p in &params {
            fields.push(ClientField {
                name: table.get(&format!("parameter '{}'", p.name), &mut self.diagnostics)?,
                wire_name: p.name.clone(),
                location: p.location,
                ty: self.convert_type(&p.ty, false)?,
                optional: !p.required,
                docs: p.docs.clone(),
            });
        }

        let mut table = SymbolTable::new(format!("methods of client {}", name));
        for builtin in ["new", "endpoint"] {
            table.add(builtin, format!("built-in method '{}'", builtin), builtin)?;
        }
        for (i, m) in src.methods.iter().enumerate() {
            table.add(
                naming::snake_name(&m.name, NameContext::Method),
                format!("method {}", i),
                &m.name,
            )?;
        }
        let mut methods = Vec::with_capacity(src.methods.len());
        for (i, m) in src.methods.iter().enumerate() {
            let method_name = table.get(&format!("method {}", i), &mut self.diagnostics)?;
            let options_name = match m.kind {
                SourceMethodKind::ClientAccessor(_) => String::new(),
                _ => self.client_name_of(&src.namespace, ClientKey::MethodOptions(id, i))?,
            };
            methods.push(self.convert_method(&name, method_name, options_name, m)?);
        }

        let client = &mut self.graph.clients[cid.index()];
        client.fields = fields;
        client.methods = methods;
        debug!(entity = %src.id, name = %name, module = %module, "adapted client");
        Ok(cid)
    }

    fn convert_method(
        &mut self,
        client_name: &str,
        name: String,
        options_name: String,
        src: &SourceMethod,
    ) -> Result<Method> {
        let qualified = format!("{}::{}", client_name, name);
        let mut table = SymbolTable::new(format!("parameters of {}", qualified));
        for local in METHOD_LOCALS {
            table.add(*local, format!("generated local '{}'", local), *local)?;
        }
        for p in &src.parameters {
            table.add(
                naming::snake_name(&p.name, NameContext::Parameter),
                format!("parameter '{}'", p.name),
                &p.name,
            )?;
        }
        let mut params = Vec::new();
        let mut options = Vec::new();
        for p in &src.parameters {
            let param = MethodParameter {
                name: table.get(&format!("parameter '{}'", p.name), &mut self.diagnostics)?,
                wire_name: p.name.clone(),
                location: p.location,
                ty: self.convert_type(&p.ty, false)?,
                docs: p.docs.clone(),
            };
            if p.required {
                params.push(param);
            } else {
                options.push(param);
            }
        }

        let kind = match &src.kind {
            SourceMethodKind::Basic => MethodKind::Basic {
                returns: match &src.response {
                    Some(ty) => Some(self.convert_type(ty, false)?),
                    None => None,
                },
            },
            SourceMethodKind::ClientAccessor(target) => MethodKind::ClientAccessor {
                client: self.convert_client(*target)?,
            },
            SourceMethodKind::Pageable(paging) => {
                self.convert_paging(&qualified, src, paging, &params, &options)?
            }
        };

        Ok(Method {
            options_name,
            name,
            docs: src.docs.clone(),
            visibility: visibility(src.access),
            kind,
            http: src.http.as_ref().map(|h| HttpBinding {
                method: h.method,
                path: h.path.clone(),
            }),
            params,
            options,
        })
    }

    fn convert_paging(
        &mut self,
        method: &str,
        src: &SourceMethod,
        paging: &SourcePaging,
        params: &[MethodParameter],
        options: &[MethodParameter],
    ) -> Result<MethodKind> {
        let page = match &src.response {
            Some(ty) => match self.convert_type(ty, false)? {
                Type::Record(rid) => rid,
                other => {
                    return Err(GenerateError::PageNotAModel {
                        method: method.to_string(),
                        found: self.graph.type_decl(&other),
                    })
                }
            },
            None => {
                return Err(GenerateError::PageNotAModel {
                    method: method.to_string(),
                    found: "no response".to_string(),
                })
            }
        };

        let find_param = |wire: &str| -> Result<ParamRef> {
            params
                .iter()
                .map(|p| (p, false))
                .chain(options.iter().map(|p| (p, true)))
                .find(|(p, _)| p.wire_name == wire)
                .map(|(p, in_options)| ParamRef {
                    name: p.name.clone(),
                    wire_name: p.wire_name.clone(),
                    in_options,
                })
                .ok_or_else(|| GenerateError::UnknownPagingParameter {
                    method: method.to_string(),
                    parameter: wire.to_string(),
                })
        };

        let (items_path, strategy) = match paging {
            SourcePaging::NextLink {
                items,
                next_link,
                reinjected,
            } => (
                items,
                PagingStrategy::NextLink {
                    next_link: self.field_path(method, page, next_link)?,
                    reinjected: reinjected
                        .iter()
                        .map(|wire| find_param(wire))
                        .collect::<Result<Vec<_>>>()?,
                },
            ),
            SourcePaging::ContinuationToken {
                items,
                request,
                response,
            } => (
                items,
                PagingStrategy::ContinuationToken {
                    request: TokenRequest {
                        location: request.location,
                        wire_name: request.name.clone(),
                        param: find_param(&request.name)?,
                    },
                    response: match response {
                        TokenResponseDecl::Body { path } => {
                            TokenResponse::Body(self.field_path(method, page, path)?)
                        }
                        TokenResponseDecl::Header { name } => TokenResponse::Header(name.clone()),
                    },
                },
            ),
        };

        let items = self.field_path(method, page, items_path)?;
        let item = match self.field_type(page, &items) {
            Some(Type::Vec(inner)) => (**inner).clone(),
            _ => {
                return Err(GenerateError::PageItemsNotAList {
                    method: method.to_string(),
                })
            }
        };
        Ok(MethodKind::Pageable {
            page,
            items,
            item,
            strategy,
        })
    }

    /// Resolve a wire-name path through nested records into local field names.
    fn field_path(&self, method: &str, page: RecordId, path: &[String]) -> Result<Vec<FieldRef>> {
        let mut record = page;
        let mut out = Vec::with_capacity(path.len());
        for (i, wire) in path.iter().enumerate() {
            let current = self.graph.record(record);
            let field = current
                .fields
                .iter()
                .find(|f| &f.serde == wire)
                .ok_or_else(|| GenerateError::UnknownPagingField {
                    method: method.to_string(),
                    record: current.name.clone(),
                    field: wire.clone(),
                })?;
            out.push(FieldRef {
                name: field.name.clone(),
                optional: field.ty.is_option(),
            });
            if i + 1 < path.len() {
                match field.ty.unwrap_option().unwrap_box() {
                    Type::Record(next) => record = *next,
                    _ => {
                        return Err(GenerateError::UnknownPagingField {
                            method: method.to_string(),
                            record: current.name.clone(),
                            field: path[i + 1].clone(),
                        })
                    }
                }
            }
        }
        Ok(out)
    }

    /// Type of the last field of a resolved path, without its `Option` layer.
    fn field_type(&self, page: RecordId, path: &[FieldRef]) -> Option<&Type> {
        let mut record = page;
        let mut ty = None;
        for step in path {
            let field = self
                .graph
                .record(record)
                .fields
                .iter()
                .find(|f| f.name == step.name)?;
            let inner = field.ty.unwrap_option().unwrap_box();
            if let Type::Record(next) = inner {
                record = *next;
            }
            ty = Some(inner);
        }
        ty
    }

    fn dependencies(&self) -> CrateDependencies {
        let mut deps = CrateDependencies::default();
        let has_models = !(self.graph.enums.is_empty()
            && self.graph.records.is_empty()
            && self.graph.markers.is_empty()
            && self.graph.unions.is_empty());
        if has_models {
            deps.add("serde", &["derive"]);
        }
        if !self.graph.clients.is_empty() {
            deps.add("reqwest", &["json"]);
            deps.add("serde_json", &[]);
            deps.add("url", &[]);
        }
        for package in &self.external_packages {
            if let Some(known) = external_package(package) {
                if let Some(dependency) = known.dependency {
                    deps.add(dependency, known.features);
                }
            }
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::parse_description;

    fn adapt_yaml(yaml: &str) -> Result<Adapted> {
        let desc = parse_description(yaml, true).unwrap();
        let source = SourceGraph::from_description(&desc).unwrap();
        adapt(&source, "demo", "0.1.0")
    }

    #[test]
    fn test_self_referencing_model_is_boxed() {
        let adapted = adapt_yaml(
            r#"
namespace: Demo
models:
  - name: tree_node
    properties:
      - name: value
        type: { kind: string }
        required: true
      - name: parent
        type: { kind: model, ref: Demo.tree_node }
      - name: children
        type: { kind: array, item: { kind: model, ref: Demo.tree_node } }
        required: true
"#,
        )
        .unwrap();
        let graph = &adapted.krate.graph;
        let node = graph.record(RecordId::new(0));
        assert_eq!(node.name, "TreeNode");
        let decls: Vec<_> = node.fields.iter().map(|f| graph.type_decl(&f.ty)).collect();
        assert_eq!(
            decls,
            vec!["String", "Option<Box<TreeNode>>", "Vec<TreeNode>"]
        );
        assert!(adapted.krate.dependencies.contains("serde"));
        assert!(!adapted.krate.dependencies.contains("reqwest"));
    }

    #[test]
    fn test_empty_model_becomes_marker() {
        let adapted = adapt_yaml(
            r#"
namespace: Demo
models:
  - name: Empty
"#,
        )
        .unwrap();
        assert_eq!(adapted.krate.graph.markers.len(), 1);
        assert!(adapted.krate.graph.records.is_empty());
        assert_eq!(adapted.krate.root.markers, vec![MarkerId::new(0)]);
    }

    #[test]
    fn test_unnamed_model_is_fatal() {
        let err = adapt_yaml(
            r#"
namespace: Demo
models:
  - name: ""
    id: Demo.anonymous
    properties:
      - name: a
        type: { kind: string }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::UnnamedRecord { entity } if entity == "Demo.anonymous"));
    }

    #[test]
    fn test_colliding_type_names_get_ranked() {
        let adapted = adapt_yaml(
            r#"
namespace: Demo
models:
  - name: widget_part
    properties:
      - name: a
        type: { kind: string }
  - name: WidgetPart
    properties:
      - name: b
        type: { kind: string }
"#,
        )
        .unwrap();
        let names: Vec<_> = adapted
            .krate
            .graph
            .records
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["COLLIDES_WidgetPart_ID2", "COLLIDES_WidgetPart_ID1"]);
        assert_eq!(adapted.diagnostics.len(), 1);
    }

    #[test]
    fn test_same_name_in_other_namespace_is_kept() {
        let adapted = adapt_yaml(
            r#"
namespace: Demo
models:
  - name: widget_part
    properties:
      - name: a
        type: { kind: string }
  - name: WidgetPart
    namespace: Demo.Admin
    properties:
      - name: b
        type: { kind: string }
"#,
        )
        .unwrap();
        let names: Vec<_> = adapted
            .krate
            .graph
            .records
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["WidgetPart", "WidgetPart"]);
        assert!(adapted.diagnostics.is_empty());
    }

    #[test]
    fn test_catch_all_variant_is_reserved_only_when_extensible() {
        let adapted = adapt_yaml(
            r#"
namespace: Demo
enums:
  - name: Open
    values:
      - { name: unknown_value, value: unknown }
  - name: Closed
    fixed: true
    values:
      - { name: unknown_value, value: unknown }
"#,
        )
        .unwrap();
        let graph = &adapted.krate.graph;
        assert_eq!(graph.enum_(EnumId::new(0)).values[0].name, "COLLIDES_UnknownValue_ID2");
        assert_eq!(graph.enum_(EnumId::new(1)).values[0].name, "UnknownValue");
        assert_eq!(adapted.diagnostics.len(), 1);
    }

    #[test]
    fn test_namespaces_become_sub_modules() {
        let adapted = adapt_yaml(
            r#"
namespace: Demo
enums:
  - name: Color
    namespace: Demo.Admin.Audit
    values:
      - { name: red, value: red }
      - { name: "1.5", value: "1.5" }
"#,
        )
        .unwrap();
        let e = adapted.krate.graph.enum_(EnumId::new(0));
        assert_eq!(e.module.to_string(), "crate::admin::audit");
        assert!(e.extensible);
        let values: Vec<_> = e.values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(values, vec!["Red", "StringValue1Dot5"]);
        let admin = &adapted.krate.root.sub_modules[0];
        assert_eq!(admin.name, "admin");
        assert_eq!(admin.sub_modules[0].enums, vec![EnumId::new(0)]);
    }

    #[test]
    fn test_namespace_named_like_generated_module_collides() {
        let adapted = adapt_yaml(
            r#"
namespace: Demo
models:
  - name: Thing
    namespace: Demo.Models
"#,
        )
        .unwrap();
        assert_eq!(adapted.krate.root.sub_modules[0].name, "COLLIDES_models_ID1");
    }

    #[test]
    fn test_external_types_record_dependencies() {
        let adapted = adapt_yaml(
            r#"
namespace: Demo
models:
  - name: Event
    properties:
      - name: at
        type: { kind: utc_date_time }
        required: true
      - name: address
        type: { kind: external, package: "std::net", name: IpAddr }
"#,
        )
        .unwrap();
        let deps: Vec<_> = adapted.krate.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(deps, vec!["serde", "time"]);
    }

    #[test]
    fn test_unknown_external_package_is_fatal() {
        let err = adapt_yaml(
            r#"
namespace: Demo
models:
  - name: Event
    properties:
      - name: at
        type: { kind: external, package: chrono, name: DateTime }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::UnknownExternalPackage { .. }));
    }

    const PAGED: &str = r#"
namespace: Demo
models:
  - name: Widget
    properties:
      - name: id
        type: { kind: string }
        required: true
  - name: WidgetPage
    properties:
      - name: value
        type: { kind: array, item: { kind: model, ref: Demo.Widget } }
      - name: nextLink
        type: { kind: string }
clients:
  - name: WidgetClient
    parameters:
      - name: apiVersion
        type: { kind: string }
        required: true
      - name: endpoint
        type: { kind: url }
        required: true
      - name: credential
        location: header
        type: { kind: string }
        required: true
    methods:
      - name: listWidgets
        kind: pageable
        http: { method: GET, path: /widgets }
        response: { kind: model, ref: Demo.WidgetPage }
        parameters:
          - name: top
            type: { kind: int32 }
        paging:
          kind: next_link
          items: [value]
          next_link: [nextLink]
          reinjected: [top]
      - name: new
        http: { method: POST, path: /reset }
      - name: admin
        kind: client_accessor
        client: Demo.AdminClient
  - name: AdminClient
    constructable: false
"#;

    #[test]
    fn test_client_fields_methods_and_paging() {
        let adapted = adapt_yaml(PAGED).unwrap();
        let graph = &adapted.krate.graph;
        let client = graph.client(ClientId::new(0));
        assert_eq!(client.name, "WidgetClient");
        assert_eq!(client.file_name, "widget_client");
        let fields: Vec<_> = client.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["credential", "api_version"]);
        assert_eq!(
            client.constructor.as_ref().map(|c| c.options_name.as_str()),
            Some("WidgetClientOptions")
        );

        let names: Vec<_> = client.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["list_widgets", "COLLIDES_new_ID2", "admin"]);

        let list = &client.methods[0];
        assert_eq!(list.options_name, "WidgetClientListWidgetsOptions");
        assert_eq!(list.options.len(), 1);
        match &list.kind {
            MethodKind::Pageable {
                items,
                item,
                strategy: PagingStrategy::NextLink { next_link, reinjected },
                ..
            } => {
                assert_eq!(items[0].name, "value");
                assert!(items[0].optional);
                assert_eq!(graph.type_decl(item), "Widget");
                assert_eq!(next_link[0].name, "next_link");
                assert!(reinjected[0].in_options);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert!(matches!(
            client.methods[2].kind,
            MethodKind::ClientAccessor { client } if client == ClientId::new(1)
        ));
        assert!(graph.client(ClientId::new(1)).constructor.is_none());

        let deps: Vec<_> = adapted.krate.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(deps, vec!["serde", "reqwest", "serde_json", "url"]);
    }

    #[test]
    fn test_unknown_paging_field_is_fatal() {
        let yaml = PAGED.replace("next_link: [nextLink]", "next_link: [next]");
        let err = adapt_yaml(&yaml).unwrap_err();
        assert!(matches!(err, GenerateError::UnknownPagingField { field, .. } if field == "next"));
    }

    #[test]
    fn test_page_items_must_be_a_list() {
        let yaml = PAGED.replace("items: [value]", "items: [nextLink]");
        let err = adapt_yaml(&yaml).unwrap_err();
        assert!(matches!(err, GenerateError::PageItemsNotAList { .. }));
    }
}
