//! Attribute classification and descriptor type parameters.

use crate::declaration::DeclId;
use crate::errors::GenerateError;
use crate::host::Resolver;
use crate::types::{Capability, ResolvedType};

/// Shape of a persistent attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKind {
    Singular,
    Map,
    Collection,
    List,
    Set,
}

impl AttributeKind {
    /// Classify a resolved attribute type.
    ///
    /// Aliases are unwrapped first; capabilities are then tested as Map,
    /// List, Set, Collection, and the first match wins.
    pub fn classify<R: Resolver + ?Sized>(ty: &ResolvedType, resolver: &R) -> Self {
        let ty = ty.unaliased();
        Capability::ORDER
            .into_iter()
            .find(|capability| resolver.is_assignable(&ty, *capability))
            .map_or(Self::Singular, Self::from)
    }

    /// Generic parameters of the descriptor, nullability stripped.
    ///
    /// Singular attributes are parameterized by their own type, plural ones
    /// by their element type, maps by key and value.
    pub fn type_parameters(self, entity: &DeclId, attribute: &str, ty: &ResolvedType) -> Result<Vec<ResolvedType>, GenerateError> {
        if self == Self::Singular {
            return Ok(vec![ty.non_null()]);
        }

        let target = ty.unaliased();
        let expected = self.arity();
        if target.arguments.len() < expected {
            return Err(GenerateError::MalformedGenerics {
                entity: entity.clone(),
                attribute: attribute.to_string(),
                ty: target.to_rust(),
                expected,
                found: target.arguments.len(),
            });
        }

        Ok(target.arguments[..expected].iter().map(ResolvedType::non_null).collect())
    }

    fn arity(self) -> usize {
        match self {
            Self::Singular | Self::Collection | Self::List | Self::Set => 1,
            Self::Map => 2,
        }
    }

    /// Descriptor type family (`SingularAttribute`, `ListAttribute`, ...).
    pub fn descriptor_family(self) -> &'static str {
        match self {
            Self::Singular => "SingularAttribute",
            Self::Map => "MapAttribute",
            Self::Collection => "CollectionAttribute",
            Self::List => "ListAttribute",
            Self::Set => "SetAttribute",
        }
    }

    /// Join type family (`Join`, `ListJoin`, ...).
    pub fn join_family(self) -> &'static str {
        match self {
            Self::Singular => "Join",
            Self::Map => "MapJoin",
            Self::Collection => "CollectionJoin",
            Self::List => "ListJoin",
            Self::Set => "SetJoin",
        }
    }

    /// Value shape marker a path to a plural attribute evaluates to.
    /// Singular paths evaluate to the attribute type itself.
    pub fn value_family(self) -> Option<&'static str> {
        match self {
            Self::Singular => None,
            Self::Map => Some("Map"),
            Self::Collection => Some("Collection"),
            Self::List => Some("List"),
            Self::Set => Some("Set"),
        }
    }
}

impl From<Capability> for AttributeKind {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::Map => Self::Map,
            Capability::List => Self::List,
            Capability::Set => Self::Set,
            Capability::Collection => Self::Collection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryResolver;
    use crate::types::TypeRef;

    fn resolved(resolver: &MemoryResolver, ty: TypeRef) -> ResolvedType {
        resolver.resolve(&ty).unwrap()
    }

    #[test]
    fn classifies_standard_collections() {
        let resolver = MemoryResolver::new();
        let string = TypeRef::new("String");
        let cases = [
            (TypeRef::new("i64"), AttributeKind::Singular),
            (TypeRef::new("Vec").with_arg(string.clone()), AttributeKind::List),
            (TypeRef::new("HashSet").with_arg(string.clone()), AttributeKind::Set),
            (TypeRef::new("BinaryHeap").with_arg(TypeRef::new("i32")), AttributeKind::Collection),
            (
                TypeRef::new("HashMap").with_args([string.clone(), TypeRef::new("i64")]),
                AttributeKind::Map,
            ),
        ];
        for (ty, kind) in cases {
            let ty = resolved(&resolver, ty);
            assert_eq!(AttributeKind::classify(&ty, &resolver), kind, "{ty}");
        }
    }

    #[test]
    fn first_matching_capability_wins() {
        let mut resolver = MemoryResolver::new();
        resolver.declare_type("crate::model::Roster", [Capability::Collection, Capability::List]);
        let ty = resolved(&resolver, TypeRef::new("crate::model::Roster").with_arg(TypeRef::new("String")));
        assert_eq!(AttributeKind::classify(&ty, &resolver), AttributeKind::List);
    }

    #[test]
    fn alias_chains_classify_like_their_target() {
        let mut resolver = MemoryResolver::new();
        let set = TypeRef::new("BTreeSet").with_arg(TypeRef::new("String"));
        resolver.declare_alias("crate::model::Tags", set.clone());
        resolver.declare_alias("crate::model::Labels", TypeRef::new("crate::model::Tags"));
        resolver.declare_alias("crate::model::Marks", TypeRef::new("crate::model::Labels"));

        let direct = resolved(&resolver, set);
        let aliased = resolved(&resolver, TypeRef::new("crate::model::Marks"));
        assert_eq!(AttributeKind::classify(&aliased, &resolver), AttributeKind::Set);
        assert_eq!(
            AttributeKind::classify(&aliased, &resolver),
            AttributeKind::classify(&direct, &resolver)
        );

        let entity = DeclId::new("crate::model::Post");
        assert_eq!(
            AttributeKind::Set.type_parameters(&entity, "tags", &aliased).unwrap(),
            vec![ResolvedType::new("::std::string::String")]
        );
    }

    #[test]
    fn parameters_strip_nullability() {
        let resolver = MemoryResolver::new();
        let entity = DeclId::new("crate::model::Person");

        let nickname = resolved(&resolver, TypeRef::new("String").nullable());
        assert_eq!(
            AttributeKind::Singular.type_parameters(&entity, "nickname", &nickname).unwrap(),
            vec![ResolvedType::new("::std::string::String")]
        );

        let scores = resolved(
            &resolver,
            TypeRef::new("HashMap").with_args([TypeRef::new("String").nullable(), TypeRef::new("i32").nullable()]),
        );
        assert_eq!(
            AttributeKind::Map.type_parameters(&entity, "scores", &scores).unwrap(),
            vec![ResolvedType::new("::std::string::String"), ResolvedType::new("i32")]
        );
    }

    #[test]
    fn missing_arguments_are_fatal() {
        let resolver = MemoryResolver::new();
        let entity = DeclId::new("crate::model::Person");
        let bare = resolved(&resolver, TypeRef::new("HashMap"));
        let err = AttributeKind::Map.type_parameters(&entity, "scores", &bare).unwrap_err();
        assert!(matches!(err, GenerateError::MalformedGenerics { expected: 2, found: 0, .. }));
        assert!(!err.is_deferred());
    }

    #[test]
    fn families() {
        assert_eq!(AttributeKind::Singular.descriptor_family(), "SingularAttribute");
        assert_eq!(AttributeKind::Map.join_family(), "MapJoin");
        assert_eq!(AttributeKind::Singular.value_family(), None);
        assert_eq!(AttributeKind::Collection.value_family(), Some("Collection"));
    }
}
