//! Abstract attributes waiting for a concrete override in a subtype.
//!
//! A supertype may declare `shape` abstractly; its artifact then lacks a
//! `shape` descriptor. When a subtype overrides `shape` with a concrete,
//! non-generic type, the supertype's artifact is patched with a descriptor
//! that casts the subtype's one. Entries move from pending to consumed at
//! most once and never go back.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use log::{debug, trace};

use crate::artifact::{DescriptorField, DescriptorSource};
use crate::classify::AttributeKind;
use crate::declaration::{DeclId, Deprecation};
use crate::types::ResolvedType;

/// (resolved type canonical name, attribute simple name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingKey {
    pub type_name: String,
    pub attribute: String,
}

impl PendingKey {
    pub fn new(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attribute: attribute.into(),
        }
    }
}

/// An abstract attribute found while building `owner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAbstract {
    pub key: PendingKey,
    pub owner: DeclId,
}

/// A concrete override found while building `subtype`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideCandidate {
    pub key: PendingKey,
    pub subtype: DeclId,
    /// Generated name of the subtype's artifact (`Square_`).
    pub subtype_artifact: String,
    /// Supertypes of the subtype; only these can be patched.
    pub supertypes: Vec<DeclId>,
    pub kind: AttributeKind,
    pub parameters: Vec<ResolvedType>,
    pub deprecation: Option<Deprecation>,
    pub source: Option<PathBuf>,
}

/// A descriptor to insert into the artifact of `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub target: DeclId,
    pub field: DescriptorField,
    pub contributor: DeclId,
    pub source: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct OverrideRegistry {
    pending: BTreeMap<PendingKey, Vec<DeclId>>,
    consumed: BTreeSet<(PendingKey, DeclId)>,
    waiting: Vec<OverrideCandidate>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an abstract attribute. Re-registering a pending or consumed
    /// entry (the owner was rebuilt in a later round) has no effect.
    pub fn register(&mut self, entry: PendingAbstract) {
        if self.consumed.contains(&(entry.key.clone(), entry.owner.clone())) {
            return;
        }
        let owners = self.pending.entry(entry.key.clone()).or_default();
        if !owners.contains(&entry.owner) {
            trace!("pending abstract {}.{}: {}", entry.owner, entry.key.attribute, entry.key.type_name);
            owners.push(entry.owner);
        }
    }

    /// Match override candidates against pending entries.
    ///
    /// New candidates queue behind those still waiting from earlier rounds.
    /// A candidate consumes the nearest pending supertype with the same key;
    /// candidates that match nothing keep waiting for a later round.
    pub fn resolve<I>(&mut self, candidates: I) -> Vec<Patch>
    where
        I: IntoIterator<Item = OverrideCandidate>,
    {
        for candidate in candidates {
            let queued = self
                .waiting
                .iter()
                .any(|waiting| waiting.key == candidate.key && waiting.subtype == candidate.subtype);
            if !queued {
                self.waiting.push(candidate);
            }
        }

        let mut patches = Vec::new();
        let mut still_waiting = Vec::new();
        for candidate in std::mem::take(&mut self.waiting) {
            match self.consume(&candidate) {
                Some(target) => patches.push(Self::patch(target, candidate)),
                None => still_waiting.push(candidate),
            }
        }
        self.waiting = still_waiting;
        patches
    }

    fn consume(&mut self, candidate: &OverrideCandidate) -> Option<DeclId> {
        let owners = self.pending.get_mut(&candidate.key)?;
        let target = candidate
            .supertypes
            .iter()
            .find(|supertype| owners.contains(supertype))?
            .clone();
        owners.retain(|owner| *owner != target);
        if owners.is_empty() {
            self.pending.remove(&candidate.key);
        }
        self.consumed.insert((candidate.key.clone(), target.clone()));
        Some(target)
    }

    fn patch(target: DeclId, candidate: OverrideCandidate) -> Patch {
        debug!("abstract {}.{} made concrete by {}", target, candidate.key.attribute, candidate.subtype);
        Patch {
            field: DescriptorField {
                attribute: candidate.key.attribute,
                kind: candidate.kind,
                owner: target.clone(),
                parameters: candidate.parameters,
                source: DescriptorSource::Cast {
                    from: candidate.subtype_artifact,
                },
                deprecation: candidate.deprecation,
            },
            target,
            contributor: candidate.subtype,
            source: candidate.source,
        }
    }

    /// Abstract attributes never matched by an override.
    pub fn pending(&self) -> impl Iterator<Item = PendingAbstract> + '_ {
        self.pending.iter().flat_map(|(key, owners)| {
            owners.iter().map(move |owner| PendingAbstract {
                key: key.clone(),
                owner: owner.clone(),
            })
        })
    }

    pub fn is_consumed(&self, key: &PendingKey, owner: &DeclId) -> bool {
        self.consumed.contains(&(key.clone(), owner.clone()))
    }
}
