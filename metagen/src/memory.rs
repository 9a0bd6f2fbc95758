//! In-memory host: a [`Resolver`] and an [`ArtifactWriter`] over plain collections.
//!
//! Useful for embedding the generator where declarations are already known
//! and for exercising round behavior without touching the filesystem.

use std::collections::{BTreeMap, HashMap};

use crate::declaration::{DeclId, EntityDeclaration, Marker};
use crate::errors::{ResolveError, WriteError};
use crate::host::{ArtifactWriter, EmittedArtifact, Resolver};
use crate::types::{Capability, ResolvedType, TypeRef, known_capability, known_type};

#[derive(Debug, Clone)]
enum TypeShape {
    Plain(Vec<Capability>),
    Alias(TypeRef),
}

/// Declarations held in memory. Entities added since the last
/// [`next_round`](MemoryResolver::next_round) are the round's new symbols.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    entities: BTreeMap<DeclId, EntityDeclaration>,
    fresh: Vec<DeclId>,
    types: HashMap<String, TypeShape>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity; it also becomes resolvable as a type.
    pub fn add_entity(&mut self, entity: EntityDeclaration) -> &mut Self {
        self.types
            .insert(entity.id.as_str().to_string(), TypeShape::Plain(Vec::new()));
        if !self.fresh.contains(&entity.id) {
            self.fresh.push(entity.id.clone());
        }
        self.entities.insert(entity.id.clone(), entity);
        self
    }

    /// Declare a non-entity type with the given structural capabilities.
    pub fn declare_type<I>(&mut self, name: impl Into<String>, capabilities: I) -> &mut Self
    where
        I: IntoIterator<Item = Capability>,
    {
        self.types
            .insert(name.into(), TypeShape::Plain(capabilities.into_iter().collect()));
        self
    }

    pub fn declare_alias(&mut self, name: impl Into<String>, target: TypeRef) -> &mut Self {
        self.types.insert(name.into(), TypeShape::Alias(target));
        self
    }

    /// Start a new round: previously added entities are no longer new.
    pub fn next_round(&mut self) {
        self.fresh.clear();
    }

    fn lookup(&self, ty: &TypeRef) -> Option<(String, &TypeShape)> {
        if let Some(shape) = self.types.get(&ty.path) {
            return Some((ty.path.clone(), shape));
        }
        if ty.scope.is_empty() {
            return None;
        }
        let scoped = format!("{}::{}", ty.scope, ty.path);
        self.types.get(&scoped).map(|shape| (scoped, shape))
    }
}

impl Resolver for MemoryResolver {
    fn symbols_with_marker(&self, marker: Marker) -> Vec<DeclId> {
        self.fresh
            .iter()
            .filter(|id| self.entities.get(*id).is_some_and(|entity| entity.marker == marker))
            .cloned()
            .collect()
    }

    fn entity(&self, id: &DeclId) -> Result<EntityDeclaration, ResolveError> {
        self.entities
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::Unknown { name: id.to_string() })
    }

    fn resolve(&self, ty: &TypeRef) -> Result<ResolvedType, ResolveError> {
        if ty.verbatim {
            return Ok(ResolvedType {
                nullable: ty.nullable,
                ..ResolvedType::new(ty.path.clone())
            });
        }

        let arguments = ty
            .arguments
            .iter()
            .map(|argument| self.resolve(argument))
            .collect::<Result<Vec<_>, _>>()?;

        let mut resolved = match self.lookup(ty) {
            Some((name, TypeShape::Plain(_))) => ResolvedType::new(name),
            Some((name, TypeShape::Alias(target))) => {
                let target = self.resolve(target)?;
                ResolvedType::new(name).aliasing(target)
            }
            None => match known_type(&ty.path) {
                Some(known) => ResolvedType::new(known.canonical),
                None => return Err(ResolveError::not_yet_resolvable(ty.path.clone())),
            },
        };
        resolved.arguments = arguments;
        resolved.nullable = ty.nullable;
        Ok(resolved)
    }

    fn is_assignable(&self, ty: &ResolvedType, capability: Capability) -> bool {
        let ty = ty.unaliased();
        match self.types.get(&ty.name) {
            Some(TypeShape::Plain(capabilities)) => capabilities.contains(&capability),
            Some(TypeShape::Alias(_)) => false,
            None => known_capability(&ty.name) == Some(capability),
        }
    }
}

/// Writer that keeps the latest artifact per file name.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    artifacts: BTreeMap<String, EmittedArtifact>,
    writes: Vec<String>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest artifact for a generated name (`Person_`).
    pub fn get(&self, name: &str) -> Option<&EmittedArtifact> {
        self.artifacts.values().find(|artifact| artifact.name == name)
    }

    pub fn source(&self, name: &str) -> Option<&str> {
        self.get(name).map(|artifact| artifact.source.as_str())
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &EmittedArtifact> {
        self.artifacts.values()
    }

    /// Generated names in the order they were written, rewrites included.
    pub fn writes(&self) -> &[String] {
        &self.writes
    }
}

impl ArtifactWriter for MemoryWriter {
    fn write(&mut self, artifact: &EmittedArtifact) -> Result<(), WriteError> {
        self.writes.push(artifact.name.clone());
        self.artifacts.insert(artifact.file_name.clone(), artifact.clone());
        Ok(())
    }
}
