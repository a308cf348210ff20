use crate::descriptor::{TypeFlag, TypeId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A member, constituent or type argument points outside the type table.
    #[error("type id {0} is not present in the type table")]
    UnknownType(TypeId),

    /// A type surface the walker has no schema for. Fatal: emitting a guessed
    /// fragment would silently change what the validator accepts.
    #[error("unrecognized type {id} with flags {flags:?}")]
    Unrecognized { id: TypeId, flags: Vec<TypeFlag> },

    /// Nesting exceeded the configured limit; only reachable through a cycle
    /// of anonymous object types, which no name-based check can close.
    #[error("type {id} nested deeper than {limit} levels")]
    DepthLimit { id: TypeId, limit: usize },

    #[error("at JSON path {path} → {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("jq: {0}")]
    Jq(String),
}
