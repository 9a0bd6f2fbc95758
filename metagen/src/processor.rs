//! Round driver.
//!
//! The host invokes [`MetamodelProcessor::process`] once per compilation
//! round. Each round builds every candidate, registers abstract attributes,
//! then matches overrides and patches supertype artifacts, including ones
//! written in earlier rounds, before handing everything to the writer.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::artifact::GeneratedArtifact;
use crate::builder::MetamodelBuilder;
use crate::config::MetamodelConfig;
use crate::declaration::{DeclId, Marker, Origin};
use crate::errors::GenerateError;
use crate::host::{ArtifactWriter, Resolver};
use crate::registry::{OverrideCandidate, OverrideRegistry};

/// What one round produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    pub round: usize,
    /// Generated names written this round, patched ones included.
    pub written: Vec<String>,
    /// Generated names of artifacts that received a patch this round.
    pub patched: Vec<String>,
    /// Entities to retry in the next round.
    pub deferred: Vec<DeclId>,
}

/// Generation session state threaded through the rounds.
#[derive(Debug)]
pub struct MetamodelProcessor {
    config: MetamodelConfig,
    registry: OverrideRegistry,
    emitted: BTreeMap<DeclId, GeneratedArtifact>,
    deferred: Vec<DeclId>,
    round: usize,
}

impl Default for MetamodelProcessor {
    fn default() -> Self {
        Self::new(MetamodelConfig::default())
    }
}

impl MetamodelProcessor {
    pub fn new(config: MetamodelConfig) -> Self {
        Self {
            config,
            registry: OverrideRegistry::new(),
            emitted: BTreeMap::new(),
            deferred: Vec::new(),
            round: 0,
        }
    }

    /// Run a round over the host's new marked declarations and the entities
    /// deferred by the previous round.
    pub fn process<R, W>(&mut self, resolver: &R, writer: &mut W) -> Result<RoundOutcome, GenerateError>
    where
        R: Resolver + ?Sized,
        W: ArtifactWriter + ?Sized,
    {
        let mut candidates = resolver.symbols_with_marker(Marker::MappedSuperclass);
        candidates.extend(resolver.symbols_with_marker(Marker::Entity));
        for deferred in std::mem::take(&mut self.deferred) {
            if !candidates.contains(&deferred) {
                candidates.push(deferred);
            }
        }
        self.run_round(candidates, resolver, writer)
    }

    /// Run a round over an explicit candidate list.
    pub fn run_round<I, R, W>(&mut self, candidates: I, resolver: &R, writer: &mut W) -> Result<RoundOutcome, GenerateError>
    where
        I: IntoIterator<Item = DeclId>,
        R: Resolver + ?Sized,
        W: ArtifactWriter + ?Sized,
    {
        self.round += 1;
        let builder = MetamodelBuilder::new(resolver, &self.config);
        let mut built: BTreeMap<DeclId, GeneratedArtifact> = BTreeMap::new();
        let mut overrides: Vec<OverrideCandidate> = Vec::new();
        let mut deferred = Vec::new();

        for id in candidates {
            if built.contains_key(&id) || deferred.contains(&id) {
                continue;
            }
            let entity = match resolver.entity(&id) {
                Ok(entity) => entity,
                Err(err) if err.is_deferrable() => {
                    debug!("round {}: deferring {}: {}", self.round, id, err);
                    deferred.push(id);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if entity.origin == Origin::Library {
                continue;
            }

            let mut outcome = match builder.build(&entity) {
                Ok(outcome) => outcome,
                Err(err) if err.is_deferred() => {
                    debug!("round {}: deferring {}: {}", self.round, id, err);
                    deferred.push(id);
                    continue;
                }
                Err(err) => return Err(err),
            };
            if let Some(previous) = self.emitted.get(&id) {
                outcome.artifact.adopt_patches(previous);
            }
            for pending in outcome.abstracts {
                self.registry.register(pending);
            }
            overrides.extend(outcome.overrides);
            built.insert(id, outcome.artifact);
        }

        let mut patched = BTreeSet::new();
        for patch in self.registry.resolve(overrides) {
            if !built.contains_key(&patch.target) {
                if let Some(previous) = self.emitted.get(&patch.target) {
                    built.insert(patch.target.clone(), previous.clone());
                }
            }
            let Some(target) = built.get_mut(&patch.target) else {
                debug!("round {}: no artifact for {}, patch dropped", self.round, patch.target);
                continue;
            };
            target.patch(patch.field, patch.contributor, patch.source);
            patched.insert(target.name.clone());
        }

        for (id, artifact) in &built {
            let file_name = artifact.file_name();
            let taken = self
                .emitted
                .iter()
                .chain(&built)
                .find(|(other, previous)| *other != id && previous.file_name() == file_name);
            if let Some((existing, _)) = taken {
                return Err(GenerateError::NameClash {
                    file_name,
                    existing: existing.clone(),
                    entity: id.clone(),
                });
            }
        }

        let mut written = Vec::with_capacity(built.len());
        for (id, artifact) in built {
            let emitted = artifact.emit(&self.config)?;
            writer.write(&emitted)?;
            written.push(artifact.name.clone());
            self.emitted.insert(id, artifact);
        }

        info!(
            "metamodel round {}: {} written, {} patched, {} deferred",
            self.round,
            written.len(),
            patched.len(),
            deferred.len()
        );
        self.deferred = deferred.clone();
        Ok(RoundOutcome {
            round: self.round,
            written,
            patched: patched.into_iter().collect(),
            deferred,
        })
    }

    /// End the session.
    ///
    /// Abstract attributes that never met an override are logged only.
    /// Entities still deferred are an error.
    pub fn finish(&self) -> Result<(), GenerateError> {
        for pending in self.registry.pending() {
            debug!(
                "{}.{} has no concrete override, no descriptor generated",
                pending.owner, pending.key.attribute
            );
        }
        if self.deferred.is_empty() {
            Ok(())
        } else {
            Err(GenerateError::Unresolved {
                entities: self.deferred.clone(),
            })
        }
    }

    pub fn config(&self) -> &MetamodelConfig {
        &self.config
    }

    pub fn round(&self) -> usize {
        self.round
    }

    /// Entities deferred by the last round.
    pub fn deferred(&self) -> &[DeclId] {
        &self.deferred
    }

    /// Latest artifact emitted for an entity.
    pub fn artifact(&self, id: &DeclId) -> Option<&GeneratedArtifact> {
        self.emitted.get(id)
    }

    pub fn registry(&self) -> &OverrideRegistry {
        &self.registry
    }
}
