use super::types::*;
use crate::ids::{SourceClientId, SourceEnumId, SourceModelId, SourceUnionId};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Problems found while resolving a description into a [`SourceGraph`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptionError {
    #[error("{entity} references unknown {kind} '{target}'")]
    UnknownReference {
        entity: String,
        kind: &'static str,
        target: String,
    },
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("pageable method {entity} has no paging strategy")]
    MissingPaging { entity: String },
    #[error("client accessor {entity} does not name a client")]
    MissingAccessorTarget { entity: String },
    #[error("method {entity} has no http binding")]
    MissingHttp { entity: String },
}

/// Builtin scalar-like types that need no declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Decimal,
    String,
    Bytes,
    Url,
    UtcDateTime,
    Duration,
    Uuid,
    Any,
}

/// A type reference with every named reference resolved to an arena id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceType {
    Builtin(Builtin),
    Array(Box<SourceType>),
    Dictionary(Box<SourceType>),
    Nullable(Box<SourceType>),
    Enum(SourceEnumId),
    Model(SourceModelId),
    Union(SourceUnionId),
    External { package: String, name: String },
}

/// Position of an entity below the root namespace, as raw namespace segments.
pub type NamespacePath = Vec<String>;

#[derive(Debug, Clone)]
pub struct SourceEnum {
    pub id: String,
    pub name: String,
    pub namespace: NamespacePath,
    pub access: Access,
    pub docs: Option<String>,
    pub fixed: bool,
    pub kind: ValueKind,
    pub values: Vec<EnumValueDecl>,
}

#[derive(Debug, Clone)]
pub struct SourceProperty {
    pub name: String,
    pub ty: SourceType,
    pub required: bool,
    pub access: Access,
    pub docs: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SourceModel {
    pub id: String,
    pub name: String,
    pub namespace: NamespacePath,
    pub access: Access,
    pub docs: Option<String>,
    pub properties: Vec<SourceProperty>,
}

#[derive(Debug, Clone)]
pub struct SourceUnionMember {
    pub discriminator_value: String,
    pub ty: SourceType,
}

#[derive(Debug, Clone)]
pub struct SourceUnion {
    pub id: String,
    pub name: String,
    pub namespace: NamespacePath,
    pub access: Access,
    pub docs: Option<String>,
    pub discriminator: String,
    pub envelope: Option<String>,
    pub members: Vec<SourceUnionMember>,
}

#[derive(Debug, Clone)]
pub struct SourceParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub ty: SourceType,
    pub required: bool,
    pub docs: Option<String>,
}

#[derive(Debug, Clone)]
pub enum SourcePaging {
    NextLink {
        items: Vec<String>,
        next_link: Vec<String>,
        reinjected: Vec<String>,
    },
    ContinuationToken {
        items: Vec<String>,
        request: TokenRequestDecl,
        response: TokenResponseDecl,
    },
}

#[derive(Debug, Clone)]
pub enum SourceMethodKind {
    Basic,
    Pageable(SourcePaging),
    ClientAccessor(SourceClientId),
}

#[derive(Debug, Clone)]
pub struct SourceMethod {
    pub name: String,
    pub access: Access,
    pub docs: Option<String>,
    pub kind: SourceMethodKind,
    pub http: Option<HttpDecl>,
    pub parameters: Vec<SourceParameter>,
    pub response: Option<SourceType>,
}

#[derive(Debug, Clone)]
pub struct SourceClient {
    pub id: String,
    pub name: String,
    pub namespace: NamespacePath,
    pub access: Access,
    pub docs: Option<String>,
    pub constructable: bool,
    pub parameters: Vec<SourceParameter>,
    pub methods: Vec<SourceMethod>,
}

/// Resolved source graph: arenas of declared entities addressed by typed ids.
#[derive(Debug, Clone, Default)]
pub struct SourceGraph {
    pub crate_name: Option<String>,
    pub crate_version: Option<String>,
    pub namespace: String,
    pub enums: Vec<SourceEnum>,
    pub models: Vec<SourceModel>,
    pub unions: Vec<SourceUnion>,
    pub clients: Vec<SourceClient>,
}

#[derive(Default)]
struct IdIndex {
    enums: HashMap<String, SourceEnumId>,
    models: HashMap<String, SourceModelId>,
    unions: HashMap<String, SourceUnionId>,
    clients: HashMap<String, SourceClientId>,
}

fn qualified_id(explicit: &Option<String>, namespace: &str, name: &str) -> String {
    match explicit {
        Some(id) => id.clone(),
        None if namespace.is_empty() => name.to_string(),
        None => format!("{}.{}", namespace, name),
    }
}

fn insert_unique<I: Copy>(
    map: &mut HashMap<String, I>,
    kind: &'static str,
    id: String,
    value: I,
) -> Result<(), DescriptionError> {
    if map.contains_key(&id) {
        return Err(DescriptionError::DuplicateId { kind, id });
    }
    map.insert(id, value);
    Ok(())
}

/// Namespace segments below `root`. Namespaces outside the root are kept whole.
pub fn relative_namespace(root: &str, namespace: &str) -> NamespacePath {
    let rest = if root.is_empty() {
        namespace
    } else if namespace == root {
        ""
    } else if let Some(rest) = namespace
        .strip_prefix(root)
        .and_then(|r| r.strip_prefix('.'))
    {
        rest
    } else {
        namespace
    };
    rest.split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl SourceGraph {
    /// Resolve every string reference in `desc`.
    ///
    /// Entity ids default to `namespace.name`. Unknown references and
    /// duplicate ids are rejected, naming the entity that triggered them.
    pub fn from_description(desc: &ServiceDescription) -> Result<Self, DescriptionError> {
        let root = desc.namespace.as_str();
        let ns_of = |ns: &Option<String>| ns.clone().unwrap_or_else(|| root.to_string());

        let mut index = IdIndex::default();
        for (i, e) in desc.enums.iter().enumerate() {
            let id = qualified_id(&e.id, &ns_of(&e.namespace), &e.name);
            insert_unique(&mut index.enums, "enum", id, SourceEnumId::new(i))?;
        }
        for (i, m) in desc.models.iter().enumerate() {
            let id = qualified_id(&m.id, &ns_of(&m.namespace), &m.name);
            insert_unique(&mut index.models, "model", id, SourceModelId::new(i))?;
        }
        for (i, u) in desc.unions.iter().enumerate() {
            let id = qualified_id(&u.id, &ns_of(&u.namespace), &u.name);
            insert_unique(&mut index.unions, "union", id, SourceUnionId::new(i))?;
        }
        for (i, c) in desc.clients.iter().enumerate() {
            let id = qualified_id(&c.id, &ns_of(&c.namespace), &c.name);
            insert_unique(&mut index.clients, "client", id, SourceClientId::new(i))?;
        }

        let mut graph = SourceGraph {
            crate_name: desc.crate_info.as_ref().and_then(|c| c.name.clone()),
            crate_version: desc.crate_info.as_ref().and_then(|c| c.version.clone()),
            namespace: root.to_string(),
            ..Default::default()
        };

        for e in &desc.enums {
            let ns = ns_of(&e.namespace);
            graph.enums.push(SourceEnum {
                id: qualified_id(&e.id, &ns, &e.name),
                name: e.name.clone(),
                namespace: relative_namespace(root, &ns),
                access: e.access,
                docs: e.docs.clone(),
                fixed: e.fixed,
                kind: e.kind,
                values: e.values.clone(),
            });
        }

        for m in &desc.models {
            let ns = ns_of(&m.namespace);
            let id = qualified_id(&m.id, &ns, &m.name);
            let mut properties = Vec::with_capacity(m.properties.len());
            for p in &m.properties {
                let entity = format!("property '{}' of model '{}'", p.name, id);
                properties.push(SourceProperty {
                    name: p.name.clone(),
                    ty: index.resolve(&p.ty, &entity)?,
                    required: p.required,
                    access: p.access,
                    docs: p.docs.clone(),
                });
            }
            graph.models.push(SourceModel {
                id,
                name: m.name.clone(),
                namespace: relative_namespace(root, &ns),
                access: m.access,
                docs: m.docs.clone(),
                properties,
            });
        }

        for u in &desc.unions {
            let ns = ns_of(&u.namespace);
            let id = qualified_id(&u.id, &ns, &u.name);
            let mut members = Vec::with_capacity(u.members.len());
            for member in &u.members {
                let entity = format!(
                    "member '{}' of union '{}'",
                    member.discriminator_value, id
                );
                members.push(SourceUnionMember {
                    discriminator_value: member.discriminator_value.clone(),
                    ty: index.resolve(&member.ty, &entity)?,
                });
            }
            graph.unions.push(SourceUnion {
                id,
                name: u.name.clone(),
                namespace: relative_namespace(root, &ns),
                access: u.access,
                docs: u.docs.clone(),
                discriminator: u.discriminator.clone(),
                envelope: u.envelope.clone(),
                members,
            });
        }

        for c in &desc.clients {
            let ns = ns_of(&c.namespace);
            let id = qualified_id(&c.id, &ns, &c.name);
            let parameters = index.resolve_parameters(&c.parameters, &format!("client '{}'", id))?;
            let mut methods = Vec::with_capacity(c.methods.len());
            for m in &c.methods {
                methods.push(index.resolve_method(m, &id)?);
            }
            graph.clients.push(SourceClient {
                id,
                name: c.name.clone(),
                namespace: relative_namespace(root, &ns),
                access: c.access,
                docs: c.docs.clone(),
                constructable: c.constructable,
                parameters,
                methods,
            });
        }

        debug!(
            enums = graph.enums.len(),
            models = graph.models.len(),
            unions = graph.unions.len(),
            clients = graph.clients.len(),
            "resolved service description"
        );
        Ok(graph)
    }

    pub fn enum_(&self, id: SourceEnumId) -> &SourceEnum {
        &self.enums[id.index()]
    }

    pub fn model(&self, id: SourceModelId) -> &SourceModel {
        &self.models[id.index()]
    }

    pub fn union(&self, id: SourceUnionId) -> &SourceUnion {
        &self.unions[id.index()]
    }

    pub fn client(&self, id: SourceClientId) -> &SourceClient {
        &self.clients[id.index()]
    }
}

impl IdIndex {
    fn resolve(&self, ty: &TypeRef, entity: &str) -> Result<SourceType, DescriptionError> {
        let builtin = |b| Ok(SourceType::Builtin(b));
        match ty {
            TypeRef::Boolean => builtin(Builtin::Boolean),
            TypeRef::Int8 => builtin(Builtin::Int8),
            TypeRef::Int16 => builtin(Builtin::Int16),
            TypeRef::Int32 => builtin(Builtin::Int32),
            TypeRef::Int64 => builtin(Builtin::Int64),
            TypeRef::Uint8 => builtin(Builtin::Uint8),
            TypeRef::Uint16 => builtin(Builtin::Uint16),
            TypeRef::Uint32 => builtin(Builtin::Uint32),
            TypeRef::Uint64 => builtin(Builtin::Uint64),
            TypeRef::Float32 => builtin(Builtin::Float32),
            TypeRef::Float64 => builtin(Builtin::Float64),
            TypeRef::Decimal => builtin(Builtin::Decimal),
            TypeRef::String => builtin(Builtin::String),
            TypeRef::Bytes => builtin(Builtin::Bytes),
            TypeRef::Url => builtin(Builtin::Url),
            TypeRef::UtcDateTime => builtin(Builtin::UtcDateTime),
            TypeRef::Duration => builtin(Builtin::Duration),
            TypeRef::Uuid => builtin(Builtin::Uuid),
            TypeRef::Any => builtin(Builtin::Any),
            TypeRef::Array { item } => Ok(SourceType::Array(Box::new(self.resolve(item, entity)?))),
            TypeRef::Dictionary { value } => Ok(SourceType::Dictionary(Box::new(
                self.resolve(value, entity)?,
            ))),
            TypeRef::Nullable { inner } => Ok(SourceType::Nullable(Box::new(
                self.resolve(inner, entity)?,
            ))),
            TypeRef::Enum { target } => self
                .enums
                .get(target)
                .map(|id| SourceType::Enum(*id))
                .ok_or_else(|| unknown(entity, "enum", target)),
            TypeRef::Model { target } => self
                .models
                .get(target)
                .map(|id| SourceType::Model(*id))
                .ok_or_else(|| unknown(entity, "model", target)),
            TypeRef::Union { target } => self
                .unions
                .get(target)
                .map(|id| SourceType::Union(*id))
                .ok_or_else(|| unknown(entity, "union", target)),
            TypeRef::External { package, name } => Ok(SourceType::External {
                package: package.clone(),
                name: name.clone(),
            }),
        }
    }

    fn resolve_parameters(
        &self,
        params: &[ParameterDecl],
        owner: &str,
    ) -> Result<Vec<SourceParameter>, DescriptionError> {
        params
            .iter()
            .map(|p| {
                let entity = format!("parameter '{}' of {}", p.name, owner);
                Ok(SourceParameter {
                    name: p.name.clone(),
                    location: p.location,
                    ty: self.resolve(&p.ty, &entity)?,
                    required: p.required,
                    docs: p.docs.clone(),
                })
            })
            .collect()
    }

    fn resolve_method(
        &self,
        m: &MethodDecl,
        client_id: &str,
    ) -> Result<SourceMethod, DescriptionError> {
        let entity = format!("{}.{}", client_id, m.name);
        let kind = match m.kind {
            MethodKind::Basic => SourceMethodKind::Basic,
            MethodKind::Pageable => {
                let paging = m.paging.as_ref().ok_or_else(|| DescriptionError::MissingPaging {
                    entity: entity.clone(),
                })?;
                SourceMethodKind::Pageable(match paging {
                    PagingDecl::NextLink {
                        items,
                        next_link,
                        reinjected,
                    } => SourcePaging::NextLink {
                        items: items.clone(),
                        next_link: next_link.clone(),
                        reinjected: reinjected.clone(),
                    },
                    PagingDecl::ContinuationToken {
                        items,
                        request,
                        response,
                    } => SourcePaging::ContinuationToken {
                        items: items.clone(),
                        request: request.clone(),
                        response: response.clone(),
                    },
                })
            }
            MethodKind::ClientAccessor => {
                let target =
                    m.client
                        .as_ref()
                        .ok_or_else(|| DescriptionError::MissingAccessorTarget {
                            entity: entity.clone(),
                        })?;
                let id = self
                    .clients
                    .get(target)
                    .ok_or_else(|| unknown(&entity, "client", target))?;
                SourceMethodKind::ClientAccessor(*id)
            }
        };
        if !matches!(kind, SourceMethodKind::ClientAccessor(_)) && m.http.is_none() {
            return Err(DescriptionError::MissingHttp { entity });
        }

        let response = match &m.response {
            Some(ty) => Some(self.resolve(ty, &format!("response of {}", entity))?),
            None => None,
        };
        Ok(SourceMethod {
            name: m.name.clone(),
            access: m.access,
            docs: m.docs.clone(),
            kind,
            http: m.http.clone(),
            parameters: self.resolve_parameters(&m.parameters, &format!("method '{}'", entity))?,
            response,
        })
    }
}

fn unknown(entity: &str, kind: &'static str, target: &str) -> DescriptionError {
    DescriptionError::UnknownReference {
        entity: entity.to_string(),
        kind,
        target: target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_namespace() {
        assert!(relative_namespace("Contoso.Widgets", "Contoso.Widgets").is_empty());
        assert_eq!(
            relative_namespace("Contoso.Widgets", "Contoso.Widgets.Admin.Audit"),
            vec!["Admin".to_string(), "Audit".to_string()]
        );
        assert_eq!(
            relative_namespace("Contoso.Widgets", "Contoso.WidgetsExtra"),
            vec!["Contoso".to_string(), "WidgetsExtra".to_string()]
        );
        assert_eq!(relative_namespace("", "A.B"), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_unknown_model_reference_names_the_property() {
        let desc = ServiceDescription {
            namespace: "Demo".into(),
            models: vec![ModelDecl {
                id: None,
                name: "Widget".into(),
                namespace: None,
                access: Access::Public,
                docs: None,
                properties: vec![PropertyDecl {
                    name: "part".into(),
                    ty: TypeRef::Model {
                        target: "Demo.Missing".into(),
                    },
                    required: true,
                    access: Access::Public,
                    docs: None,
                }],
            }],
            ..Default::default()
        };
        let err = SourceGraph::from_description(&desc).unwrap_err();
        assert_eq!(
            err,
            DescriptionError::UnknownReference {
                entity: "property 'part' of model 'Demo.Widget'".into(),
                kind: "model",
                target: "Demo.Missing".into(),
            }
        );
    }
}
