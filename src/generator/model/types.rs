//! Target type graph: the canonical, deduplicated types the emitters print.

use crate::ids::{ClientId, EnumId, MarkerId, RecordId, UnionId};
use crate::spec::WireValue;

/// Item visibility in the generated crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Pub,
    PubCrate,
}

impl Visibility {
    /// Prefix including the trailing space, e.g. `"pub "`.
    pub fn prefix(self) -> &'static str {
        match self {
            Visibility::Pub => "pub ",
            Visibility::PubCrate => "pub(crate) ",
        }
    }
}

/// Location of a module in the generated crate, as final module names.
/// The root module has no segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Absolute path of a directory below this module's `generated` module,
    /// e.g. `crate::admin::generated::models`.
    pub fn generated_path(&self, leaf: &str) -> String {
        let mut parts = vec!["crate".to_string()];
        parts.extend(self.0.iter().cloned());
        parts.push("generated".to_string());
        parts.push(leaf.to_string());
        parts.join("::")
    }

    /// `src/` relative directory holding this module's `mod.rs` (or `lib.rs`).
    pub fn source_dir(&self) -> std::path::PathBuf {
        let mut dir = std::path::PathBuf::from("src");
        for segment in &self.0 {
            dir.push(segment);
        }
        dir
    }
}

impl std::fmt::Display for ModulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "crate")
        } else {
            write!(f, "crate::{}", self.0.join("::"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Scalar {
    pub fn as_str(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::I8 => "i8",
            Scalar::I16 => "i16",
            Scalar::I32 => "i32",
            Scalar::I64 => "i64",
            Scalar::U8 => "u8",
            Scalar::U16 => "u16",
            Scalar::U32 => "u32",
            Scalar::U64 => "u64",
            Scalar::F32 => "f32",
            Scalar::F64 => "f64",
        }
    }
}

/// Type from a crate outside the generated one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct External {
    /// Package key into the external package table (e.g. `time`)
    pub package: String,
    pub name: String,
}

/// A named generic such as `Box<T>`. `module` is `None` for prelude types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Generic {
    pub name: String,
    pub module: Option<String>,
    pub args: Vec<Type>,
}

impl Generic {
    pub fn boxed(inner: Type) -> Self {
        Generic {
            name: "Box".to_string(),
            module: None,
            args: vec![inner],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Enum(EnumId),
    Union(UnionId),
    Record(RecordId),
    Marker(MarkerId),
    Client(ClientId),
    Scalar(Scalar),
    String,
    Option(Box<Type>),
    Vec(Box<Type>),
    HashMap(Box<Type>, Box<Type>),
    External(External),
    Generic(Generic),
}

impl Type {
    pub fn option(inner: Type) -> Self {
        match inner {
            Type::Option(_) => inner,
            other => Type::Option(Box::new(other)),
        }
    }

    pub fn is_option(&self) -> bool {
        matches!(self, Type::Option(_))
    }

    /// Strip one `Option` layer if present.
    pub fn unwrap_option(&self) -> &Type {
        match self {
            Type::Option(inner) => inner,
            other => other,
        }
    }

    /// Strip `Box<T>` if present.
    pub fn unwrap_box(&self) -> &Type {
        match self {
            Type::Generic(g) if g.name == "Box" && g.module.is_none() && g.args.len() == 1 => {
                &g.args[0]
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub docs: Option<String>,
    pub value: WireValue,
}

#[derive(Debug, Clone)]
pub struct Enum {
    pub name: String,
    pub docs: Option<String>,
    pub visibility: Visibility,
    pub module: ModulePath,
    /// Extensible enums carry an `UnknownValue(String)` catch-all
    pub extensible: bool,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone)]
pub struct RecordField {
    /// snake_case local name
    pub name: String,
    /// Verbatim wire name
    pub serde: String,
    pub docs: Option<String>,
    pub visibility: Visibility,
    /// Field type; already wrapped in `Option` for optional fields
    pub ty: Type,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct Record {
    pub name: String,
    pub docs: Option<String>,
    pub visibility: Visibility,
    pub module: ModulePath,
    pub fields: Vec<RecordField>,
}

/// A record without fields, emitted as an empty struct.
#[derive(Debug, Clone)]
pub struct Marker {
    pub name: String,
    pub docs: Option<String>,
    pub visibility: Visibility,
    pub module: ModulePath,
}

#[derive(Debug, Clone)]
pub struct UnionMember {
    pub name: String,
    pub discriminator_value: String,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Union {
    pub name: String,
    pub docs: Option<String>,
    pub visibility: Visibility,
    pub module: ModulePath,
    pub discriminator: String,
    pub envelope: Option<String>,
    pub members: Vec<UnionMember>,
}

/// Arena storage for every adapted entity.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    pub enums: Vec<Enum>,
    pub records: Vec<Record>,
    pub markers: Vec<Marker>,
    pub unions: Vec<Union>,
    pub clients: Vec<super::client::Client>,
}

impl TypeGraph {
    pub fn enum_(&self, id: EnumId) -> &Enum {
        &self.enums[id.index()]
    }

    pub fn record(&self, id: RecordId) -> &Record {
        &self.records[id.index()]
    }

    pub fn marker(&self, id: MarkerId) -> &Marker {
        &self.markers[id.index()]
    }

    pub fn union(&self, id: UnionId) -> &Union {
        &self.unions[id.index()]
    }

    pub fn client(&self, id: ClientId) -> &super::client::Client {
        &self.clients[id.index()]
    }

    /// Rust spelling of `ty` as it appears in generated code, assuming the
    /// needed imports are in scope.
    pub fn type_decl(&self, ty: &Type) -> String {
        match ty {
            Type::Enum(id) => self.enum_(*id).name.clone(),
            Type::Union(id) => self.union(*id).name.clone(),
            Type::Record(id) => self.record(*id).name.clone(),
            Type::Marker(id) => self.marker(*id).name.clone(),
            Type::Client(id) => self.client(*id).name.clone(),
            Type::Scalar(s) => s.as_str().to_string(),
            Type::String => "String".to_string(),
            Type::Option(inner) => format!("Option<{}>", self.type_decl(inner)),
            Type::Vec(inner) => format!("Vec<{}>", self.type_decl(inner)),
            Type::HashMap(k, v) => {
                format!("HashMap<{}, {}>", self.type_decl(k), self.type_decl(v))
            }
            Type::External(e) => e.name.clone(),
            Type::Generic(g) => {
                let args: Vec<String> = g.args.iter().map(|a| self.type_decl(a)).collect();
                format!("{}<{}>", g.name, args.join(", "))
            }
        }
    }

    /// Whether `#[derive(Default)]` is valid for a struct holding `ty`.
    pub fn is_defaultable(&self, ty: &Type) -> bool {
        match ty {
            Type::Option(_) | Type::Vec(_) | Type::HashMap(..) => true,
            Type::Scalar(_) | Type::String | Type::Marker(_) => true,
            Type::Enum(_) | Type::Union(_) | Type::Client(_) | Type::External(_) => false,
            Type::Record(_) | Type::Generic(_) => false,
        }
    }
}
