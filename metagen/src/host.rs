//! Interfaces the generator expects from its host.

use std::path::PathBuf;

use crate::declaration::{DeclId, EntityDeclaration, Marker};
use crate::errors::{ResolveError, WriteError};
use crate::types::{Capability, ResolvedType, TypeRef};

/// Symbol resolution supplied by the host.
///
/// Any method may report [`ResolveError::NotYetResolvable`]; the generator
/// defers the affected entity to the next round instead of failing.
pub trait Resolver {
    /// Declarations carrying `marker` that are new in the current round.
    fn symbols_with_marker(&self, marker: Marker) -> Vec<DeclId>;

    /// Full declaration, including inherited attributes.
    fn entity(&self, id: &DeclId) -> Result<EntityDeclaration, ResolveError>;

    /// Resolve a written type reference.
    fn resolve(&self, ty: &TypeRef) -> Result<ResolvedType, ResolveError>;

    /// Whether `ty` structurally satisfies `capability`.
    fn is_assignable(&self, ty: &ResolvedType, capability: Capability) -> bool;
}

/// Which inputs an emitted artifact depends on, for incremental rebuilds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependencies {
    /// Rebuild whenever any input changes.
    AllFiles,
    /// Rebuild when one of the contributing declarations changes.
    Precise { declarations: Vec<DeclId>, files: Vec<PathBuf> },
}

/// A finished, rendered artifact handed to the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedArtifact {
    pub entity: DeclId,
    /// Generated type name (`Person_`).
    pub name: String,
    /// File name the source is stored under (`person_.rs`).
    pub file_name: String,
    pub source: String,
    pub dependencies: Dependencies,
}

/// Emission facility supplied by the host.
///
/// Writing the same `file_name` twice must replace the earlier content.
pub trait ArtifactWriter {
    fn write(&mut self, artifact: &EmittedArtifact) -> Result<(), WriteError>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn symbols_with_marker(&self, marker: Marker) -> Vec<DeclId> {
        (**self).symbols_with_marker(marker)
    }

    fn entity(&self, id: &DeclId) -> Result<EntityDeclaration, ResolveError> {
        (**self).entity(id)
    }

    fn resolve(&self, ty: &TypeRef) -> Result<ResolvedType, ResolveError> {
        (**self).resolve(ty)
    }

    fn is_assignable(&self, ty: &ResolvedType, capability: Capability) -> bool {
        (**self).is_assignable(ty, capability)
    }
}

impl<W: ArtifactWriter + ?Sized> ArtifactWriter for &mut W {
    fn write(&mut self, artifact: &EmittedArtifact) -> Result<(), WriteError> {
        (**self).write(artifact)
    }
}
