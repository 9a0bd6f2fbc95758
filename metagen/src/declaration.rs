//! Persistent type declarations as supplied by the host.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::types::TypeRef;

/// Qualified name of a declaration (`crate::model::Person`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(String);

impl DeclId {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self(qualified_name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn simple_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }

    /// Everything before the simple name; empty for unqualified names.
    pub fn module_path(&self) -> &str {
        match self.0.rfind("::") {
            Some(index) => &self.0[..index],
            None => "",
        }
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeclId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Annotation markers that make a type a metamodel candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Entity,
    MappedSuperclass,
}

/// Where a declaration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Origin {
    /// Part of the sources being compiled.
    #[default]
    Source,
    /// Provided by a dependency; contributes names but is never emitted.
    Library,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub line: usize,
}

/// Relationship cardinality annotation on an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Relationship {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "one_to_one" => Some(Self::OneToOne),
            "one_to_many" => Some(Self::OneToMany),
            "many_to_one" => Some(Self::ManyToOne),
            "many_to_many" => Some(Self::ManyToMany),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Deprecation {
    pub message: Option<String>,
}

impl Deprecation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn note(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

/// One persistent property of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDeclaration {
    pub name: String,
    pub ty: TypeRef,
    /// Declaration the attribute is written on.
    pub owner: DeclId,
    pub origin: Origin,
    pub is_abstract: bool,
    pub is_override: bool,
    pub relationship: Option<Relationship>,
    /// A custom converter changes the stored shape; such attributes are always singular.
    pub convert: bool,
    pub deprecation: Option<Deprecation>,
}

impl AttributeDeclaration {
    pub fn new(name: impl Into<String>, ty: TypeRef, owner: DeclId) -> Self {
        Self {
            name: name.into(),
            ty,
            owner,
            origin: Origin::Source,
            is_abstract: false,
            is_override: false,
            relationship: None,
            convert: false,
            deprecation: None,
        }
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn override_(mut self) -> Self {
        self.is_override = true;
        self
    }

    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = Some(relationship);
        self
    }

    pub fn converted(mut self) -> Self {
        self.convert = true;
        self
    }

    pub fn deprecated(mut self, deprecation: Deprecation) -> Self {
        self.deprecation = Some(deprecation);
        self
    }

    pub fn from_library(mut self) -> Self {
        self.origin = Origin::Library;
        self
    }

    pub fn is_joinable(&self) -> bool {
        self.relationship.is_some()
    }
}

/// A persistent type: an entity or a mapped superclass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDeclaration {
    pub id: DeclId,
    pub marker: Marker,
    pub is_abstract: bool,
    /// Whether subtyping is permitted. Abstract declarations are always open.
    pub is_open: bool,
    pub origin: Origin,
    pub location: Option<SourceLocation>,
    /// All supertypes, nearest first.
    pub supertypes: Vec<DeclId>,
    /// Own attributes first, then inherited ones.
    pub attributes: Vec<AttributeDeclaration>,
}

impl EntityDeclaration {
    pub fn new(id: DeclId, marker: Marker) -> Self {
        Self {
            id,
            marker,
            is_abstract: false,
            is_open: false,
            origin: Origin::Source,
            location: None,
            supertypes: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn open(mut self) -> Self {
        self.is_open = true;
        self
    }

    pub fn extends(mut self, supertype: DeclId) -> Self {
        self.supertypes.push(supertype);
        self
    }

    pub fn located(mut self, path: impl Into<PathBuf>, line: usize) -> Self {
        self.location = Some(SourceLocation {
            path: path.into(),
            line,
        });
        self
    }

    pub fn attribute(mut self, attribute: AttributeDeclaration) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn permits_subtypes(&self) -> bool {
        self.is_open || self.is_abstract
    }

    /// Attributes deduplicated by simple name; the first (most derived) occurrence wins.
    pub fn distinct_attributes(&self) -> impl Iterator<Item = &AttributeDeclaration> {
        let mut seen = HashSet::new();
        self.attributes
            .iter()
            .filter(move |attribute| seen.insert(attribute.name.as_str()))
    }

    pub fn declares(&self, attribute: &AttributeDeclaration) -> bool {
        attribute.owner == self.id
    }

    pub fn source_path(&self) -> Option<&PathBuf> {
        self.location.as_ref().map(|location| &location.path)
    }
}
