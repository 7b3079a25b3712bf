//! Client definitions: clients, their methods and pagination strategies.

use super::types::{ModulePath, Type, Visibility};
use crate::ids::{ClientId, RecordId};
use crate::spec::{HttpMethod, ParameterLocation, TokenLocation};

/// A value stored on the client and applied to every request.
#[derive(Debug, Clone)]
pub struct ClientField {
    pub name: String,
    pub wire_name: String,
    pub location: ParameterLocation,
    /// Value type, without the `Option` wrapper of optional fields
    pub ty: Type,
    pub optional: bool,
    pub docs: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Constructor {
    /// Name of the `{Client}Options` struct
    pub options_name: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    pub name: String,
    pub docs: Option<String>,
    pub visibility: Visibility,
    pub module: ModulePath,
    /// File stem under `generated/clients/`
    pub file_name: String,
    /// `None` when the client is only reachable through an accessor
    pub constructor: Option<Constructor>,
    /// Stored parameters in constructor order (see [`sort_client_parameters`])
    pub fields: Vec<ClientField>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone)]
pub struct HttpBinding {
    pub method: HttpMethod,
    /// Path template with `{wire_name}` placeholders
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct MethodParameter {
    pub name: String,
    pub wire_name: String,
    pub location: ParameterLocation,
    /// Value type, without the `Option` wrapper of option fields
    pub ty: Type,
    pub docs: Option<String>,
}

/// One step of a path through page model fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub name: String,
    /// The field is declared as `Option<_>`
    pub optional: bool,
}

/// A method parameter referenced by name, either required or in the options struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRef {
    pub name: String,
    pub wire_name: String,
    pub in_options: bool,
}

#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub location: TokenLocation,
    pub wire_name: String,
    pub param: ParamRef,
}

#[derive(Debug, Clone)]
pub enum TokenResponse {
    Body(Vec<FieldRef>),
    Header(String),
}

#[derive(Debug, Clone)]
pub enum PagingStrategy {
    NextLink {
        next_link: Vec<FieldRef>,
        reinjected: Vec<ParamRef>,
    },
    ContinuationToken {
        request: TokenRequest,
        response: TokenResponse,
    },
}

#[derive(Debug, Clone)]
pub enum MethodKind {
    Basic {
        returns: Option<Type>,
    },
    Pageable {
        page: RecordId,
        items: Vec<FieldRef>,
        item: Type,
        strategy: PagingStrategy,
    },
    ClientAccessor {
        client: ClientId,
    },
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub docs: Option<String>,
    pub visibility: Visibility,
    pub kind: MethodKind,
    pub http: Option<HttpBinding>,
    /// Required parameters in declaration order
    pub params: Vec<MethodParameter>,
    /// Name of the `{Client}{Method}Options` struct
    pub options_name: String,
    /// Optional parameters, emitted as fields of the options struct
    pub options: Vec<MethodParameter>,
}

impl Method {
    pub fn is_accessor(&self) -> bool {
        matches!(self.kind, MethodKind::ClientAccessor { .. })
    }
}

/// Order client parameters as `endpoint`, then `credential`, then the rest
/// in their original order.
pub fn sort_client_parameters<T>(params: &mut [T], name_of: impl Fn(&T) -> &str) {
    params.sort_by_key(|p| match name_of(p) {
        "endpoint" => 0,
        "credential" => 1,
        _ => 2,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_client_parameters() {
        let mut params = vec!["something", "credential", "endpoint", "other"];
        sort_client_parameters(&mut params, |p| *p);
        assert_eq!(params, vec!["endpoint", "credential", "something", "other"]);

        let mut params = vec!["credential", "endpoint"];
        sort_client_parameters(&mut params, |p| *p);
        assert_eq!(params, vec!["endpoint", "credential"]);
    }
}
