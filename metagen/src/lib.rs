//! Static metamodel generation for persistent entity declarations.
//!
//! For every type marked `#[derive(Entity)]` or `#[derive(MappedSuperclass)]`
//! the generator emits a companion (`Person_`) carrying attribute name
//! constants, typed attribute descriptors, and path and join accessors for
//! building queries without raw strings. See [`criteria`] for the vocabulary
//! the generated code refers to.
//!
//! Generation runs in rounds driven by a host (see [`host`]): declarations
//! whose types cannot be resolved yet are retried in a later round, and
//! abstract attributes of a supertype are filled in once a subtype gives
//! them a concrete type.
//!
//! Most users go through `metagen-build` from a build script. Embedders
//! with their own declaration source drive [`MetamodelProcessor`] directly:
//!
//! ```
//! use metagen::{AttributeDeclaration, DeclId, EntityDeclaration, Marker, MetamodelProcessor, TypeRef};
//! use metagen::memory::{MemoryResolver, MemoryWriter};
//!
//! let person = DeclId::new("crate::model::Person");
//! let mut resolver = MemoryResolver::new();
//! resolver.add_entity(
//!     EntityDeclaration::new(person.clone(), Marker::Entity)
//!         .attribute(AttributeDeclaration::new("firstName", TypeRef::new("String"), person)),
//! );
//!
//! let mut writer = MemoryWriter::new();
//! let mut processor = MetamodelProcessor::default();
//! processor.process(&resolver, &mut writer)?;
//! processor.finish()?;
//!
//! assert!(writer.source("Person_").unwrap().contains("FIRST_NAME"));
//! # Ok::<(), metagen::GenerateError>(())
//! ```

extern crate self as metagen;

pub mod artifact;
pub mod builder;
pub mod classify;
pub mod config;
pub mod criteria;
pub mod declaration;
pub mod errors;
pub mod host;
pub mod memory;
pub mod naming;
pub mod processor;
pub mod registry;
pub mod types;

pub use artifact::GeneratedArtifact;
pub use builder::{BuildOutcome, MetamodelBuilder};
pub use classify::AttributeKind;
pub use config::MetamodelConfig;
pub use declaration::{
    AttributeDeclaration, DeclId, Deprecation, EntityDeclaration, Marker, Origin, Relationship, SourceLocation,
};
pub use errors::{ConfigError, GenerateError, ResolveError, WriteError};
pub use host::{ArtifactWriter, Dependencies, EmittedArtifact, Resolver};
pub use processor::{MetamodelProcessor, RoundOutcome};
pub use registry::OverrideRegistry;
pub use types::{Capability, ResolvedType, TypeRef};

pub use metagen_macros::{Entity, MappedSuperclass};
