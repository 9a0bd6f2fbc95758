//! Builds the artifact of one entity.

use log::trace;

use crate::artifact::{DescriptorField, DescriptorSource, GeneratedArtifact, JoinAccessor, NameConstant, PathAccessor};
use crate::classify::AttributeKind;
use crate::config::MetamodelConfig;
use crate::declaration::{AttributeDeclaration, EntityDeclaration, Origin};
use crate::errors::GenerateError;
use crate::host::Resolver;
use crate::registry::{OverrideCandidate, PendingAbstract, PendingKey};
use crate::types::ResolvedType;

/// Result of building one entity.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub artifact: GeneratedArtifact,
    /// Abstract, non-generic attributes declared on the entity.
    pub abstracts: Vec<PendingAbstract>,
    /// Concrete, non-generic overrides declared on the entity.
    pub overrides: Vec<OverrideCandidate>,
}

pub struct MetamodelBuilder<'a, R: ?Sized> {
    resolver: &'a R,
    config: &'a MetamodelConfig,
}

impl<'a, R: Resolver + ?Sized> MetamodelBuilder<'a, R> {
    pub fn new(resolver: &'a R, config: &'a MetamodelConfig) -> Self {
        Self { resolver, config }
    }

    /// Build the artifact of `entity`.
    ///
    /// Fails with a deferrable error when the host cannot resolve one of the
    /// entity's own attribute types yet; nothing is produced in that case.
    pub fn build(&self, entity: &EntityDeclaration) -> Result<BuildOutcome, GenerateError> {
        let mut outcome = BuildOutcome {
            artifact: GeneratedArtifact::new(entity, &self.config.suffix),
            abstracts: Vec::new(),
            overrides: Vec::new(),
        };

        for attribute in entity.distinct_attributes() {
            outcome.artifact.constants.push(NameConstant::for_attribute(attribute));

            if !entity.declares(attribute) || attribute.origin == Origin::Library {
                trace!("{}: {} is inherited, constant only", entity.id, attribute.name);
                continue;
            }

            let resolved = self.resolver.resolve(&attribute.ty)?;
            if attribute.is_abstract {
                if !resolved.unaliased().is_generic() {
                    outcome.abstracts.push(PendingAbstract {
                        key: pending_key(&resolved, attribute),
                        owner: entity.id.clone(),
                    });
                }
                continue;
            }

            self.attribute(entity, attribute, &resolved, &mut outcome)?;
        }

        outcome.artifact.finish();
        Ok(outcome)
    }

    fn attribute(
        &self,
        entity: &EntityDeclaration,
        attribute: &AttributeDeclaration,
        resolved: &ResolvedType,
        outcome: &mut BuildOutcome,
    ) -> Result<(), GenerateError> {
        let kind = if attribute.convert {
            AttributeKind::Singular
        } else {
            AttributeKind::classify(resolved, self.resolver)
        };
        let parameters = kind.type_parameters(&entity.id, &attribute.name, resolved)?;

        outcome.artifact.push_descriptor(DescriptorField {
            attribute: attribute.name.clone(),
            kind,
            owner: entity.id.clone(),
            parameters: parameters.clone(),
            source: DescriptorSource::Declared,
            deprecation: attribute.deprecation.clone(),
        });
        outcome.artifact.paths.push(PathAccessor {
            attribute: attribute.name.clone(),
            kind,
            parameters: parameters.clone(),
            deprecation: attribute.deprecation.clone(),
        });
        if attribute.is_joinable() {
            outcome.artifact.joins.push(JoinAccessor {
                attribute: attribute.name.clone(),
                kind,
                parameters: parameters.clone(),
                deprecation: attribute.deprecation.clone(),
            });
        }

        if attribute.is_override && !resolved.unaliased().is_generic() {
            outcome.overrides.push(OverrideCandidate {
                key: pending_key(resolved, attribute),
                subtype: entity.id.clone(),
                subtype_artifact: outcome.artifact.name.clone(),
                supertypes: entity.supertypes.clone(),
                kind,
                parameters,
                deprecation: attribute.deprecation.clone(),
                source: entity.source_path().cloned(),
            });
        }
        Ok(())
    }
}

fn pending_key(resolved: &ResolvedType, attribute: &AttributeDeclaration) -> PendingKey {
    PendingKey::new(resolved.name.clone(), attribute.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{DeclId, Marker, Relationship};
    use crate::memory::MemoryResolver;
    use crate::types::TypeRef;

    fn attr(name: &str, ty: TypeRef, owner: &DeclId) -> AttributeDeclaration {
        AttributeDeclaration::new(name, ty, owner.clone())
    }

    #[test]
    fn inherited_attributes_only_get_constants() {
        let base = DeclId::new("crate::model::Base");
        let child = DeclId::new("crate::model::Child");
        let entity = EntityDeclaration::new(child.clone(), Marker::Entity)
            .extends(base.clone())
            .attribute(attr("nickName", TypeRef::new("String"), &child))
            .attribute(attr("id", TypeRef::new("i64"), &base))
            .attribute(attr("legacyCode", TypeRef::new("String"), &child).from_library());

        let resolver = MemoryResolver::new();
        let config = MetamodelConfig::default();
        let outcome = MetamodelBuilder::new(&resolver, &config).build(&entity).unwrap();

        let constants: Vec<_> = outcome.artifact.constants.iter().map(|c| c.constant.as_str()).collect();
        assert_eq!(constants, ["ID", "LEGACY_CODE", "NICK_NAME"]);
        let descriptors: Vec<_> = outcome.artifact.descriptors().iter().map(|d| d.attribute.as_str()).collect();
        assert_eq!(descriptors, ["nickName"]);
        assert!(outcome.abstracts.is_empty());
    }

    #[test]
    fn converted_collections_are_singular() {
        let id = DeclId::new("crate::model::Post");
        let tags = TypeRef::new("Vec").with_arg(TypeRef::new("String"));
        let entity = EntityDeclaration::new(id.clone(), Marker::Entity).attribute(attr("tags", tags, &id).converted());

        let resolver = MemoryResolver::new();
        let config = MetamodelConfig::default();
        let outcome = MetamodelBuilder::new(&resolver, &config).build(&entity).unwrap();

        let field = outcome.artifact.descriptor("tags").unwrap();
        assert_eq!(field.kind, AttributeKind::Singular);
        assert_eq!(
            field.parameters,
            vec![ResolvedType::new("::std::vec::Vec").with_args([ResolvedType::new("::std::string::String")])]
        );
    }

    #[test]
    fn abstract_and_override_attributes_are_collected() {
        let mut resolver = MemoryResolver::new();
        resolver.declare_type("crate::model::Color", []);
        let config = MetamodelConfig::default();
        let builder = MetamodelBuilder::new(&resolver, &config);

        let shape = DeclId::new("crate::model::Shape");
        let base = EntityDeclaration::new(shape.clone(), Marker::MappedSuperclass)
            .abstract_()
            .attribute(attr("color", TypeRef::new("crate::model::Color"), &shape).abstract_())
            .attribute(attr("layers", TypeRef::new("Vec").with_arg(TypeRef::new("i32")), &shape).abstract_());
        let outcome = builder.build(&base).unwrap();
        assert_eq!(
            outcome.abstracts,
            vec![PendingAbstract {
                key: PendingKey::new("crate::model::Color", "color"),
                owner: shape.clone(),
            }]
        );
        assert!(outcome.artifact.descriptors().is_empty());

        let square = DeclId::new("crate::model::Square");
        let sub = EntityDeclaration::new(square.clone(), Marker::Entity)
            .extends(shape.clone())
            .attribute(attr("color", TypeRef::new("crate::model::Color"), &square).override_())
            .attribute(attr("color", TypeRef::new("crate::model::Color"), &shape).abstract_());
        let outcome = builder.build(&sub).unwrap();
        assert_eq!(outcome.overrides.len(), 1);
        assert_eq!(outcome.overrides[0].subtype_artifact, "Square_");
        assert_eq!(outcome.overrides[0].supertypes, vec![shape]);
    }

    #[test]
    fn unresolvable_types_defer() {
        let id = DeclId::new("crate::model::Person");
        let entity = EntityDeclaration::new(id.clone(), Marker::Entity)
            .attribute(attr("home", TypeRef::new("crate::model::Address"), &id).relationship(Relationship::ManyToOne));

        let resolver = MemoryResolver::new();
        let config = MetamodelConfig::default();
        let err = MetamodelBuilder::new(&resolver, &config).build(&entity).unwrap_err();
        assert!(err.is_deferred());
    }
}
