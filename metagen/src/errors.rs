use std::path::PathBuf;

use thiserror::Error;

use crate::declaration::DeclId;

/// Failure reported by the host while resolving declarations or types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The type exists but cannot be resolved in the current round.
    #[error("{name} is not resolvable in the current round of processing")]
    NotYetResolvable { name: String },

    /// The host has no declaration under this name.
    #[error("unknown declaration: {name}")]
    Unknown { name: String },

    #[error("{message}")]
    Other { message: String },
}

impl ResolveError {
    pub fn not_yet_resolvable(name: impl Into<String>) -> Self {
        Self::NotYetResolvable { name: name.into() }
    }

    /// Only the not-yet-resolvable condition is retried in a later round.
    pub fn is_deferrable(&self) -> bool {
        matches!(self, Self::NotYetResolvable { .. })
    }
}

/// Failure persisting an emitted artifact.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Other { message: String },
}

/// Failure loading generator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metamodel configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level error type of a generation session.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Host resolution failed. Deferrable when the inner error is.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The resolved type does not carry the generic arguments its kind requires.
    #[error("attribute `{attribute}` of {entity}: expected {expected} type argument(s) on {ty}, found {found}")]
    MalformedGenerics {
        entity: DeclId,
        attribute: String,
        ty: String,
        expected: usize,
        found: usize,
    },

    /// The artifact could not be turned into Rust source.
    #[error("failed to render metamodel {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: syn::Error,
    },

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Two entities would be written to the same file.
    #[error("metamodel file {file_name} of {entity} is already generated for {existing}")]
    NameClash {
        file_name: String,
        existing: DeclId,
        entity: DeclId,
    },

    /// Entities still deferred when the session ended.
    #[error("unresolvable entities at end of processing: {entities:?}")]
    Unresolved { entities: Vec<DeclId> },
}

impl GenerateError {
    /// Whether the failing entity should be retried in the next round.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Resolve(err) if err.is_deferrable())
    }
}
