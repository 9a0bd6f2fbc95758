//! Runtime vocabulary referenced by generated metamodels.
//!
//! A generated companion such as `Person_` exposes descriptors
//! (`SingularAttribute<Person, String>`, `SetAttribute<Person, String>`, ...)
//! and accessor traits implemented for every [`Path`] and [`From`]. Query
//! builders navigate typed attribute paths through them:
//!
//! ```ignore
//! let person = Person_::class_.root();
//! let city = person.join_address(None).city_();
//! assert_eq!(city.path(), "address.city");
//! ```

use std::fmt;
use std::marker::PhantomData;

/// `Self` is `T` or one of its persistent subtypes.
///
/// Generated metamodels implement it for every declared supertype.
pub trait Extends<T: ?Sized> {}

impl<T: ?Sized> Extends<T> for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistentKind {
    Entity,
    MappedSuperclass,
}

/// Implemented by `#[derive(Entity)]` and `#[derive(MappedSuperclass)]`.
pub trait Persistent {
    const ENTITY_NAME: &'static str;
    const KIND: PersistentKind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
}

/// Value shape of a path to a list attribute.
pub struct List<E>(PhantomData<fn() -> E>);
/// Value shape of a path to a set attribute.
pub struct Set<E>(PhantomData<fn() -> E>);
/// Value shape of a path to an unordered collection attribute.
pub struct Collection<E>(PhantomData<fn() -> E>);
/// Value shape of a path to a map attribute.
pub struct Map<K, V>(PhantomData<fn() -> (K, V)>);

/// A descriptor usable with [`Path::get`].
pub trait PathAttribute {
    /// Declaring type.
    type Owner: ?Sized;
    /// What a path to the attribute evaluates to.
    type Value;

    fn name(&self) -> &'static str;
}

/// A descriptor usable with [`From::join`].
pub trait JoinAttribute: PathAttribute {
    type Joined<Z>;

    fn joined<Z>(&self, segments: Vec<&'static str>, join_type: JoinType) -> Self::Joined<Z>;
}

macro_rules! attribute_descriptor {
    ($(#[$meta:meta])* $name:ident<$($param:ident),+>) => {
        $(#[$meta])*
        pub struct $name<X, $($param),+> {
            name: &'static str,
            marker: PhantomData<fn() -> (X, $($param),+)>,
        }

        impl<X, $($param),+> $name<X, $($param),+> {
            pub const fn new(name: &'static str) -> Self {
                Self {
                    name,
                    marker: PhantomData,
                }
            }

            pub const fn name(&self) -> &'static str {
                self.name
            }

            /// The same attribute seen from another declaring type.
            pub const fn cast<Y>(&self) -> $name<Y, $($param),+> {
                $name {
                    name: self.name,
                    marker: PhantomData,
                }
            }
        }

        impl<X, $($param),+> Clone for $name<X, $($param),+> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<X, $($param),+> Copy for $name<X, $($param),+> {}

        impl<X, $($param),+> fmt::Debug for $name<X, $($param),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name)).field("name", &self.name).finish()
            }
        }
    };
}

attribute_descriptor!(
    /// Single-valued attribute of `X` with type `T`.
    SingularAttribute<T>
);
attribute_descriptor!(
    /// List-valued attribute of `X` with elements `E`.
    ListAttribute<E>
);
attribute_descriptor!(
    /// Set-valued attribute of `X` with elements `E`.
    SetAttribute<E>
);
attribute_descriptor!(
    /// Collection-valued attribute of `X` with elements `E`.
    CollectionAttribute<E>
);
attribute_descriptor!(
    /// Map-valued attribute of `X` from `K` to `V`.
    MapAttribute<K, V>
);

impl<X, T> PathAttribute for SingularAttribute<X, T> {
    type Owner = X;
    type Value = T;

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<X, T> JoinAttribute for SingularAttribute<X, T> {
    type Joined<Z> = Join<Z, T>;

    fn joined<Z>(&self, segments: Vec<&'static str>, join_type: JoinType) -> Self::Joined<Z> {
        Join::new(segments, join_type)
    }
}

impl<X, E> PathAttribute for ListAttribute<X, E> {
    type Owner = X;
    type Value = List<E>;

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<X, E> JoinAttribute for ListAttribute<X, E> {
    type Joined<Z> = ListJoin<Z, E>;

    fn joined<Z>(&self, segments: Vec<&'static str>, join_type: JoinType) -> Self::Joined<Z> {
        ListJoin::new(segments, join_type)
    }
}

impl<X, E> PathAttribute for SetAttribute<X, E> {
    type Owner = X;
    type Value = Set<E>;

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<X, E> JoinAttribute for SetAttribute<X, E> {
    type Joined<Z> = SetJoin<Z, E>;

    fn joined<Z>(&self, segments: Vec<&'static str>, join_type: JoinType) -> Self::Joined<Z> {
        SetJoin::new(segments, join_type)
    }
}

impl<X, E> PathAttribute for CollectionAttribute<X, E> {
    type Owner = X;
    type Value = Collection<E>;

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<X, E> JoinAttribute for CollectionAttribute<X, E> {
    type Joined<Z> = CollectionJoin<Z, E>;

    fn joined<Z>(&self, segments: Vec<&'static str>, join_type: JoinType) -> Self::Joined<Z> {
        CollectionJoin::new(segments, join_type)
    }
}

impl<X, K, V> PathAttribute for MapAttribute<X, K, V> {
    type Owner = X;
    type Value = Map<K, V>;

    fn name(&self) -> &'static str {
        self.name
    }
}

impl<X, K, V> JoinAttribute for MapAttribute<X, K, V> {
    type Joined<Z> = MapJoin<Z, K, V>;

    fn joined<Z>(&self, segments: Vec<&'static str>, join_type: JoinType) -> Self::Joined<Z> {
        MapJoin::new(segments, join_type)
    }
}

fn child(parent: &[&'static str], name: &'static str) -> Vec<&'static str> {
    let mut segments = parent.to_vec();
    segments.push(name);
    segments
}

/// Something attributes of `X` can be read from.
pub trait Path<X> {
    /// Attribute names from the query root to this path.
    fn segments(&self) -> &[&'static str];

    fn get<A>(&self, attribute: &A) -> Expression<A::Value>
    where
        A: PathAttribute,
        X: Extends<A::Owner>,
    {
        Expression::new(child(self.segments(), attribute.name()))
    }

    fn path(&self) -> String {
        self.segments().join(".")
    }
}

/// Something relationships of `X` can be joined from.
pub trait From<X>: Path<X> {
    fn join<A>(&self, attribute: &A, join_type: JoinType) -> A::Joined<X>
    where
        A: JoinAttribute,
        X: Extends<A::Owner>,
    {
        attribute.joined::<X>(child(self.segments(), attribute.name()), join_type)
    }
}

/// Typed path expression evaluating to `T`.
pub struct Expression<T> {
    segments: Vec<&'static str>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Expression<T> {
    fn new(segments: Vec<&'static str>) -> Self {
        Self {
            segments,
            marker: PhantomData,
        }
    }
}

impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        Self::new(self.segments.clone())
    }
}

impl<T> fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.segments.join(".")).finish()
    }
}

impl<T> Path<T> for Expression<T> {
    fn segments(&self) -> &[&'static str] {
        &self.segments
    }
}

/// Query root over entity `X`.
pub struct Root<X> {
    entity: &'static str,
    marker: PhantomData<fn() -> X>,
}

impl<X> Root<X> {
    pub const fn new(entity: &'static str) -> Self {
        Self {
            entity,
            marker: PhantomData,
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }
}

impl<X> fmt::Debug for Root<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Root").field(&self.entity).finish()
    }
}

impl<X> Path<X> for Root<X> {
    fn segments(&self) -> &[&'static str] {
        &[]
    }
}

impl<X> From<X> for Root<X> {}

macro_rules! join_kind {
    ($(#[$meta:meta])* $name:ident<$($param:ident),+> => $target:ident) => {
        $(#[$meta])*
        pub struct $name<Z, $($param),+> {
            segments: Vec<&'static str>,
            join_type: JoinType,
            marker: PhantomData<fn() -> (Z, $($param),+)>,
        }

        impl<Z, $($param),+> $name<Z, $($param),+> {
            fn new(segments: Vec<&'static str>, join_type: JoinType) -> Self {
                Self {
                    segments,
                    join_type,
                    marker: PhantomData,
                }
            }

            pub fn join_type(&self) -> JoinType {
                self.join_type
            }
        }

        impl<Z, $($param),+> fmt::Debug for $name<Z, $($param),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("path", &self.segments.join("."))
                    .field("join_type", &self.join_type)
                    .finish()
            }
        }

        impl<Z, $($param),+> Path<$target> for $name<Z, $($param),+> {
            fn segments(&self) -> &[&'static str] {
                &self.segments
            }
        }

        impl<Z, $($param),+> From<$target> for $name<Z, $($param),+> {}
    };
}

join_kind!(
    /// Join from `Z` to a single related `X`.
    Join<X> => X
);
join_kind!(
    /// Join from `Z` to the elements of a list.
    ListJoin<E> => E
);
join_kind!(
    /// Join from `Z` to the elements of a set.
    SetJoin<E> => E
);
join_kind!(
    /// Join from `Z` to the elements of a collection.
    CollectionJoin<E> => E
);
join_kind!(
    /// Join from `Z` to the values of a map.
    MapJoin<K, V> => V
);

/// Class token of an entity.
pub struct EntityType<X> {
    name: &'static str,
    marker: PhantomData<fn() -> X>,
}

/// Class token of a mapped superclass.
pub struct MappedSuperclassType<X> {
    name: &'static str,
    marker: PhantomData<fn() -> X>,
}

macro_rules! class_token {
    ($name:ident) => {
        impl<X> $name<X> {
            pub const fn new(name: &'static str) -> Self {
                Self {
                    name,
                    marker: PhantomData,
                }
            }

            pub const fn name(&self) -> &'static str {
                self.name
            }

            pub fn root(&self) -> Root<X> {
                Root::new(self.name)
            }
        }

        impl<X> fmt::Debug for $name<X> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.name).finish()
            }
        }
    };
}

class_token!(EntityType);
class_token!(MappedSuperclassType);
