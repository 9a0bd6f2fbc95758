//! `Resolver` over scanned source files.
//!
//! Each scan path is loaded as its own round. A type that is not part of
//! anything loaded so far is reported as not yet resolvable, so an entity
//! referring to a type from a later scan path is retried once that path
//! has been loaded.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::trace;
use metagen::types::{known_capability, known_type};
use metagen::{
    AttributeDeclaration, Capability, DeclId, EntityDeclaration, Marker, MetamodelConfig, Origin, ResolveError,
    ResolvedType, Resolver, TypeRef,
};

use crate::scanner::{ScanResult, ScannedEntity};

#[derive(Debug, Clone)]
enum TypeEntry {
    Plain,
    Alias(TypeRef),
}

#[derive(Debug, Default)]
pub struct SourceResolver {
    config: MetamodelConfig,
    entities: BTreeMap<DeclId, ScannedEntity>,
    fresh: Vec<DeclId>,
    types: HashMap<String, TypeEntry>,
    /// Simple name to qualified names, for lookups of unqualified paths.
    by_simple_name: HashMap<String, BTreeSet<String>>,
    /// Module to `use` bindings (name to imported path).
    imports: HashMap<String, HashMap<String, String>>,
    /// Module to glob-imported modules.
    globs: HashMap<String, Vec<String>>,
}

impl SourceResolver {
    pub fn new(config: MetamodelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Start a round with newly scanned sources; their entities are the round's new symbols.
    pub fn begin_round(&mut self, scan: ScanResult) {
        self.fresh.clear();
        self.add(scan, true);
    }

    /// Add declarations that are resolvable but never candidates.
    pub fn add_library(&mut self, scan: ScanResult) {
        self.add(scan, false);
    }

    fn add(&mut self, scan: ScanResult, fresh: bool) {
        for import in scan.imports {
            match import.name {
                Some(name) => {
                    self.imports.entry(import.module).or_default().insert(name, import.target);
                }
                None => self.globs.entry(import.module).or_default().push(import.target),
            }
        }
        for name in scan.types {
            self.declare(name, TypeEntry::Plain);
        }
        for (name, target) in scan.aliases {
            self.declare(name, TypeEntry::Alias(target));
        }
        for entity in scan.entities {
            self.declare(entity.id.as_str().to_string(), TypeEntry::Plain);
            if fresh && entity.origin == Origin::Source && !self.entities.contains_key(&entity.id) {
                self.fresh.push(entity.id.clone());
            }
            self.entities.insert(entity.id.clone(), entity);
        }
    }

    fn declare(&mut self, qualified: String, entry: TypeEntry) {
        let simple = qualified.rsplit("::").next().unwrap_or(&qualified).to_string();
        self.by_simple_name.entry(simple).or_default().insert(qualified.clone());
        self.types.insert(qualified, entry);
    }

    /// Qualified name of a locally declared type.
    ///
    /// The reference's own module and its `use` imports win. An unqualified
    /// name found nowhere in scope falls back to the single declared type of
    /// that name; several candidates are an error.
    fn lookup(&self, ty: &TypeRef) -> Result<Option<String>, ResolveError> {
        let path = ty.path.trim_start_matches("::");
        if self.types.contains_key(path) {
            return Ok(Some(path.to_string()));
        }
        if !ty.scope.is_empty() {
            let scoped = format!("{}::{}", ty.scope, path);
            if self.types.contains_key(&scoped) {
                return Ok(Some(scoped));
            }
            if let Some(relative) = path.strip_prefix("super::") {
                let parent = ty.scope.rsplit_once("::").map_or("", |(parent, _)| parent);
                let qualified = format!("{parent}::{relative}");
                if self.types.contains_key(&qualified) {
                    return Ok(Some(qualified));
                }
            }
        }

        let (head, rest) = match path.split_once("::") {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        if let Some(target) = self.imports.get(&ty.scope).and_then(|bindings| bindings.get(head)) {
            let imported = match rest {
                Some(rest) => format!("{target}::{rest}"),
                None => target.clone(),
            };
            // Imports of foreign types fall through to known and extern types.
            return Ok(self.types.contains_key(&imported).then_some(imported));
        }
        if rest.is_some() {
            return Ok(None);
        }

        let globbed: Vec<String> = self
            .globs
            .get(&ty.scope)
            .into_iter()
            .flatten()
            .map(|module| format!("{module}::{path}"))
            .filter(|qualified| self.types.contains_key(qualified))
            .collect();
        if !globbed.is_empty() {
            return unique(path, &ty.scope, globbed);
        }

        match self.by_simple_name.get(path) {
            Some(candidates) => unique(path, &ty.scope, candidates.iter().cloned().collect()),
            None => Ok(None),
        }
    }

    fn supertype_id(&self, written: &TypeRef) -> Result<DeclId, ResolveError> {
        match self.lookup(written)?.map(DeclId::new) {
            Some(id) if self.entities.contains_key(&id) => Ok(id),
            _ => Err(ResolveError::not_yet_resolvable(written.path.clone())),
        }
    }

    /// Supertypes nearest first, each listed once.
    fn supertypes(&self, entity: &ScannedEntity) -> Result<Vec<DeclId>, ResolveError> {
        let mut ordered = Vec::new();
        let mut queue: Vec<DeclId> = Vec::new();
        for written in &entity.extends {
            queue.push(self.supertype_id(written)?);
        }
        let mut index = 0;
        while index < queue.len() {
            let current = queue[index].clone();
            index += 1;
            if current == entity.id || ordered.contains(&current) {
                continue;
            }
            if let Some(scanned) = self.entities.get(&current) {
                for written in &scanned.extends {
                    queue.push(self.supertype_id(written)?);
                }
            }
            ordered.push(current);
        }
        Ok(ordered)
    }
}

fn unique(path: &str, scope: &str, mut candidates: Vec<String>) -> Result<Option<String>, ResolveError> {
    if candidates.len() > 1 {
        return Err(ResolveError::Other {
            message: format!(
                "`{}` in {} is ambiguous between {}; import it with `use` or write the full path",
                path,
                scope,
                candidates.join(", ")
            ),
        });
    }
    Ok(candidates.pop())
}

fn attributes_of(entity: &ScannedEntity) -> impl Iterator<Item = AttributeDeclaration> + '_ {
    entity.fields.iter().map(move |field| {
        let mut attribute = AttributeDeclaration::new(field.name.clone(), field.ty.clone(), entity.id.clone());
        attribute.origin = entity.origin;
        attribute.is_abstract = field.is_abstract;
        attribute.is_override = field.is_override;
        attribute.relationship = field.relationship;
        attribute.convert = field.convert;
        attribute.deprecation = field.deprecation.clone();
        attribute
    })
}

impl Resolver for SourceResolver {
    fn symbols_with_marker(&self, marker: Marker) -> Vec<DeclId> {
        self.fresh
            .iter()
            .filter(|id| self.entities.get(*id).is_some_and(|entity| entity.marker == marker))
            .cloned()
            .collect()
    }

    fn entity(&self, id: &DeclId) -> Result<EntityDeclaration, ResolveError> {
        let scanned = self
            .entities
            .get(id)
            .ok_or_else(|| ResolveError::Unknown { name: id.to_string() })?;

        let mut entity = EntityDeclaration::new(scanned.id.clone(), scanned.marker);
        entity.is_abstract = scanned.is_abstract;
        entity.is_open = scanned.is_open;
        entity.origin = scanned.origin;
        entity.location = Some(scanned.location.clone());
        entity.supertypes = self.supertypes(scanned)?;
        entity.attributes.extend(attributes_of(scanned));
        for supertype in &entity.supertypes {
            if let Some(inherited) = self.entities.get(supertype) {
                entity.attributes.extend(attributes_of(inherited));
            }
        }
        Ok(entity)
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

        let mut resolved = if let Some(qualified) = self.lookup(ty)? {
            match self.types.get(&qualified) {
                Some(TypeEntry::Alias(target)) => {
                    let target = self.resolve(target)?;
                    ResolvedType::new(qualified).aliasing(target)
                }
                _ => ResolvedType::new(qualified),
            }
        } else if let Some(configured) = self.configured_capability_type(&ty.path) {
            ResolvedType::new(configured)
        } else if let Some(known) = known_type(&ty.path) {
            ResolvedType::new(known.canonical)
        } else if let Some(foreign) = self.config.extern_type(&ty.path) {
            ResolvedType::new(foreign)
        } else {
            trace!("{} is not known yet", ty.path);
            return Err(ResolveError::not_yet_resolvable(ty.path.clone()));
        };

        resolved.arguments = arguments;
        resolved.nullable = ty.nullable;
        Ok(resolved)
    }

    fn is_assignable(&self, ty: &ResolvedType, capability: Capability) -> bool {
        let ty = ty.unaliased();
        let configured = self.config.capabilities.capabilities_of(&ty.name);
        if !configured.is_empty() {
            return configured.contains(&capability);
        }
        if self.types.contains_key(&ty.name) {
            return false;
        }
        known_capability(&ty.name) == Some(capability)
    }
}

impl SourceResolver {
    /// Full path of a type configured under `[capabilities]`.
    fn configured_capability_type(&self, path: &str) -> Option<String> {
        let capabilities = &self.config.capabilities;
        let simple = path.rsplit("::").next().unwrap_or(path);
        [&capabilities.map, &capabilities.list, &capabilities.set, &capabilities.collection]
            .into_iter()
            .flatten()
            .find(|configured| {
                let configured = configured.trim_start_matches("::");
                configured == path.trim_start_matches("::") || configured.rsplit("::").next() == Some(simple)
            })
            .cloned()
    }
}
