use thiserror::Error;

/// Fatal generation errors. Each variant names the entity that triggered it.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("model '{entity}' has an empty name")]
    UnnamedRecord { entity: String },

    #[error("{entity} is already registered in {scope}")]
    DuplicateRegistration { scope: String, entity: String },

    #[error("{entity} requested '{name}' in {scope} after that name was resolved")]
    NameAlreadyResolved {
        scope: String,
        entity: String,
        name: String,
    },

    #[error("{entity} was never registered in {scope}")]
    UnregisteredSymbol { scope: String, entity: String },

    #[error("external package '{package}' used by {entity} has no known module")]
    UnknownExternalPackage { package: String, entity: String },

    #[error("pageable method {method} must return a model, found {found}")]
    PageNotAModel { method: String, found: String },

    #[error("paging field '{field}' of method {method} does not exist on '{record}'")]
    UnknownPagingField {
        method: String,
        record: String,
        field: String,
    },

    #[error("items path of pageable method {method} must end in a list")]
    PageItemsNotAList { method: String },

    #[error("paging parameter '{parameter}' is not a parameter of method {method}")]
    UnknownPagingParameter { method: String, parameter: String },

    #[error("path placeholder '{parameter}' of method {method} matches no parameter")]
    UnknownPathParameter { method: String, parameter: String },

    #[error("failed to render {file}: {source}")]
    Render {
        file: String,
        #[source]
        source: askama::Error,
    },
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
