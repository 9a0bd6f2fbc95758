//! Type references as written in declarations and as resolved by the host.

use std::fmt;

/// A type exactly as written on an attribute, before the host resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Path as written (`String`, `model::Color`, `::std::vec::Vec`).
    pub path: String,
    /// Generic arguments as written.
    pub arguments: Vec<TypeRef>,
    /// `Option<T>` is recorded as a nullable `T`.
    pub nullable: bool,
    /// Module the reference was written in (`crate::model`), used for lookup.
    pub scope: String,
    /// Syntax the host cannot name (arrays, tuples, references); resolved as an opaque singular.
    pub verbatim: bool,
}

impl TypeRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            arguments: Vec::new(),
            nullable: false,
            scope: String::new(),
            verbatim: false,
        }
    }

    pub fn verbatim(text: impl Into<String>) -> Self {
        Self {
            verbatim: true,
            ..Self::new(text)
        }
    }

    pub fn with_arg(mut self, argument: TypeRef) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_args<I>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = TypeRef>,
    {
        self.arguments.extend(arguments);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn in_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Last path segment (`Vec` for `::std::vec::Vec`).
    pub fn simple_name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }
}

/// A fully resolved type.
///
/// `name` is the canonical path used both as the registry key and as the
/// emitted type path. When the host resolved a type alias, `alias` holds
/// the aliased type; `name` and `arguments` still describe the alias itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedType {
    pub name: String,
    pub arguments: Vec<ResolvedType>,
    pub nullable: bool,
    pub alias: Option<Box<ResolvedType>>,
}

impl ResolvedType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            nullable: false,
            alias: None,
        }
    }

    pub fn with_args<I>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = ResolvedType>,
    {
        self.arguments.extend(arguments);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn aliasing(mut self, target: ResolvedType) -> Self {
        self.alias = Some(Box::new(target));
        self
    }

    /// Follow alias indirection until a non-alias type is reached.
    ///
    /// Nullability written on the alias use site survives the unwrap.
    pub fn unaliased(&self) -> ResolvedType {
        let mut current = self;
        while let Some(target) = current.alias.as_deref() {
            current = target;
        }
        let mut resolved = current.clone();
        resolved.nullable |= self.nullable;
        resolved
    }

    /// Same type with nullability stripped at the top level.
    pub fn non_null(&self) -> ResolvedType {
        let mut stripped = self.clone();
        stripped.nullable = false;
        stripped
    }

    pub fn is_generic(&self) -> bool {
        !self.arguments.is_empty()
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    pub fn is_string(&self) -> bool {
        !self.nullable && matches!(self.name.as_str(), "::std::string::String" | "String" | "::alloc::string::String")
    }

    /// Rust source spelling, `Option`-wrapped when nullable.
    pub fn to_rust(&self) -> String {
        let mut rendered = self.name.clone();
        if !self.arguments.is_empty() {
            let arguments: Vec<String> = self.arguments.iter().map(ResolvedType::to_rust).collect();
            rendered.push('<');
            rendered.push_str(&arguments.join(", "));
            rendered.push('>');
        }
        if self.nullable {
            format!("::core::option::Option<{rendered}>")
        } else {
            rendered
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rust())
    }
}

/// Structural capabilities the classifier asks the host about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Map,
    List,
    Set,
    Collection,
}

impl Capability {
    /// Classification priority order.
    pub const ORDER: [Capability; 4] = [Capability::Map, Capability::List, Capability::Set, Capability::Collection];
}

/// A standard library type every host knows about.
#[derive(Debug, Clone, Copy)]
pub struct KnownType {
    pub simple_name: &'static str,
    pub canonical: &'static str,
    pub capability: Option<Capability>,
}

const fn known(simple_name: &'static str, canonical: &'static str, capability: Option<Capability>) -> KnownType {
    KnownType {
        simple_name,
        canonical,
        capability,
    }
}

/// Standard library types resolvable without a declaration.
pub const KNOWN_TYPES: &[KnownType] = &[
    known("String", "::std::string::String", None),
    known("bool", "bool", None),
    known("char", "char", None),
    known("i8", "i8", None),
    known("i16", "i16", None),
    known("i32", "i32", None),
    known("i64", "i64", None),
    known("i128", "i128", None),
    known("isize", "isize", None),
    known("u8", "u8", None),
    known("u16", "u16", None),
    known("u32", "u32", None),
    known("u64", "u64", None),
    known("u128", "u128", None),
    known("usize", "usize", None),
    known("f32", "f32", None),
    known("f64", "f64", None),
    known("Box", "::std::boxed::Box", None),
    known("Vec", "::std::vec::Vec", Some(Capability::List)),
    known("VecDeque", "::std::collections::VecDeque", Some(Capability::List)),
    known("LinkedList", "::std::collections::LinkedList", Some(Capability::List)),
    known("HashSet", "::std::collections::HashSet", Some(Capability::Set)),
    known("BTreeSet", "::std::collections::BTreeSet", Some(Capability::Set)),
    known("BinaryHeap", "::std::collections::BinaryHeap", Some(Capability::Collection)),
    known("HashMap", "::std::collections::HashMap", Some(Capability::Map)),
    known("BTreeMap", "::std::collections::BTreeMap", Some(Capability::Map)),
];

/// Look up a standard type by the path it was written with.
pub fn known_type(path: &str) -> Option<&'static KnownType> {
    let simple = path.rsplit("::").next().unwrap_or(path);
    KNOWN_TYPES
        .iter()
        .find(|known| known.canonical == path || known.simple_name == simple)
}

/// Capability of a standard type given its canonical name.
pub fn known_capability(canonical: &str) -> Option<Capability> {
    KNOWN_TYPES
        .iter()
        .find(|known| known.canonical == canonical)
        .and_then(|known| known.capability)
}
