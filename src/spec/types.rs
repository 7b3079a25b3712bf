use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Top-level service description document.
///
/// This is the raw, deserialized form: references between entities are
/// still strings. [`SourceGraph::from_description`](super::SourceGraph::from_description)
/// resolves them into arena ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceDescription {
    #[serde(rename = "crate", default, skip_serializing_if = "Option::is_none")]
    pub crate_info: Option<CrateInfo>,
    /// Root namespace; entities in deeper namespaces land in sub-modules
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub enums: Vec<EnumDecl>,
    #[serde(default)]
    pub models: Vec<ModelDecl>,
    #[serde(default)]
    pub unions: Vec<UnionDecl>,
    #[serde(default)]
    pub clients: Vec<ClientDecl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrateInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Source access level. Internal entities are emitted `pub(crate)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    #[default]
    Public,
    Internal,
}

/// Value kind of an enum; drives the prefix used for names starting with a digit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    #[default]
    String,
    Integer,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Float32,
    Float64,
    Decimal,
    Boolean,
}

impl ValueKind {
    /// PascalCase word used when a name needs a kind prefix.
    pub fn word(self) -> &'static str {
        match self {
            ValueKind::String => "String",
            ValueKind::Integer => "Integer",
            ValueKind::Int8 => "Int8",
            ValueKind::Int16 => "Int16",
            ValueKind::Int32 => "Int32",
            ValueKind::Int64 => "Int64",
            ValueKind::Uint8 => "Uint8",
            ValueKind::Uint16 => "Uint16",
            ValueKind::Uint32 => "Uint32",
            ValueKind::Uint64 => "Uint64",
            ValueKind::Float => "Float",
            ValueKind::Float32 => "Float32",
            ValueKind::Float64 => "Float64",
            ValueKind::Decimal => "Decimal",
            ValueKind::Boolean => "Boolean",
        }
    }

    pub fn is_fractional(self) -> bool {
        matches!(
            self,
            ValueKind::Float | ValueKind::Float32 | ValueKind::Float64 | ValueKind::Decimal
        )
    }
}

/// Literal wire value of an enum member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl Display for WireValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WireValue::Integer(v) => write!(f, "{}", v),
            WireValue::Float(v) => write!(f, "{}", v),
            WireValue::Boolean(v) => write!(f, "{}", v),
            WireValue::String(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDecl {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub docs: Option<String>,
    /// Fixed enums reject unknown wire values; extensible ones keep them
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub kind: ValueKind,
    pub values: Vec<EnumValueDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumValueDecl {
    pub name: String,
    pub value: WireValue,
    #[serde(default)]
    pub docs: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDecl {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyDecl {
    /// Wire name, emitted verbatim in `#[serde(rename)]`
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub docs: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnionDecl {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub docs: Option<String>,
    /// Wire name of the discriminator field
    pub discriminator: String,
    /// Wire name of the field wrapping the variant payload, if any
    #[serde(default)]
    pub envelope: Option<String>,
    pub members: Vec<UnionMemberDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnionMemberDecl {
    pub discriminator_value: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// Reference to a type, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
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
    Array {
        item: Box<TypeRef>,
    },
    Dictionary {
        value: Box<TypeRef>,
    },
    Nullable {
        #[serde(rename = "type")]
        inner: Box<TypeRef>,
    },
    Enum {
        #[serde(rename = "ref")]
        target: String,
    },
    Model {
        #[serde(rename = "ref")]
        target: String,
    },
    Union {
        #[serde(rename = "ref")]
        target: String,
    },
    External {
        package: String,
        name: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientDecl {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub docs: Option<String>,
    /// Whether callers can construct the client directly (otherwise only
    /// reachable through an accessor method)
    #[serde(default = "default_true")]
    pub constructable: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Basic,
    Pageable,
    ClientAccessor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub docs: Option<String>,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub http: Option<HttpDecl>,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
    #[serde(default)]
    pub response: Option<TypeRef>,
    #[serde(default)]
    pub paging: Option<PagingDecl>,
    /// Target client id for `client_accessor` methods
    #[serde(default)]
    pub client: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Put,
    Post,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpDecl {
    #[serde(default)]
    pub method: HttpMethod,
    /// Path template relative to the endpoint, e.g. `/widgets/{widgetName}`
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

impl Display for ParameterLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Body => write!(f, "body"),
        }
    }
}

fn default_location() -> ParameterLocation {
    ParameterLocation::Query
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterDecl {
    /// Wire name (path placeholder, query key or header name)
    pub name: String,
    #[serde(default = "default_location")]
    pub location: ParameterLocation,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub docs: Option<String>,
}

/// Pagination strategy of a pageable method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PagingDecl {
    NextLink {
        /// Wire-name path from the page model to the item list
        items: Vec<String>,
        /// Wire-name path from the page model to the next-page link
        next_link: Vec<String>,
        /// Query parameters re-applied to every next-page request
        #[serde(default)]
        reinjected: Vec<String>,
    },
    ContinuationToken {
        items: Vec<String>,
        request: TokenRequestDecl,
        response: TokenResponseDecl,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRequestDecl {
    pub location: TokenLocation,
    /// Wire name of the parameter carrying the token; must be one of the method's parameters
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenLocation {
    Query,
    Header,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "location", rename_all = "snake_case")]
pub enum TokenResponseDecl {
    Body { path: Vec<String> },
    Header { name: String },
}
