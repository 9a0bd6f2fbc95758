//! Source file scanner for discovering `Entity` and `MappedSuperclass` derives.

use anyhow::{Context, Result};
use metagen::config::MarkerSettings;
use metagen::{DeclId, Deprecation, Marker, Origin, Relationship, SourceLocation, TypeRef};
use quote::ToTokens;
use std::fs;
use std::path::{Path, PathBuf};
use syn::{Attribute, Expr, ExprLit, Fields, GenericArgument, Item, Lit, LitStr, Meta, PathArguments, Type, UseTree};
use walkdir::WalkDir;

/// A struct carrying one of the marker derives.
#[derive(Debug, Clone)]
pub struct ScannedEntity {
    pub id: DeclId,
    pub marker: Marker,
    pub is_abstract: bool,
    pub is_open: bool,
    pub origin: Origin,
    pub location: SourceLocation,
    /// Supertypes as written in `#[metamodel(extends = "..")]`.
    pub extends: Vec<TypeRef>,
    pub fields: Vec<ScannedField>,
}

#[derive(Debug, Clone)]
pub struct ScannedField {
    pub name: String,
    pub ty: TypeRef,
    pub is_abstract: bool,
    pub is_override: bool,
    pub relationship: Option<Relationship>,
    pub convert: bool,
    pub deprecation: Option<Deprecation>,
}

/// A name a `use` item brings into a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedImport {
    pub module: String,
    /// Bound name; `None` for a glob import.
    pub name: Option<String>,
    /// Imported path, absolute when written from `crate`, `self` or `super`.
    pub target: String,
}

/// Everything the resolver needs from one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub entities: Vec<ScannedEntity>,
    /// `type Tags = BTreeSet<String>;` keyed by qualified alias name.
    pub aliases: Vec<(String, TypeRef)>,
    /// Every other named type (structs, enums, unions, generic aliases).
    pub types: Vec<String>,
    pub imports: Vec<ScannedImport>,
}

impl ScanResult {
    pub fn extend(&mut self, other: ScanResult) {
        self.entities.extend(other.entities);
        self.aliases.extend(other.aliases);
        self.types.extend(other.types);
        self.imports.extend(other.imports);
    }
}

/// Scan a directory recursively, skipping generated and target directories.
pub fn scan_directory(
    path: &Path,
    crate_name: &str,
    markers: &MarkerSettings,
    origin: Origin,
    exclude: Option<&Path>,
) -> Result<ScanResult> {
    let mut result = ScanResult::default();

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "rs")
                && !p.to_string_lossy().contains("/generated/")
                && !p.to_string_lossy().contains("/target/")
                && !exclude.is_some_and(|excluded| p.starts_with(excluded))
        })
        .collect();
    files.sort();

    for file_path in files {
        let module_path = compute_module_path(&file_path, path, crate_name);
        let content =
            fs::read_to_string(&file_path).with_context(|| format!("Failed to read {}", file_path.display()))?;
        let scanned = scan_source(&content, &file_path, &module_path, markers, origin)
            .with_context(|| format!("Failed to scan {}", file_path.display()))?;
        result.extend(scanned);
    }

    Ok(result)
}

/// Scan the contents of one file.
pub fn scan_source(
    content: &str,
    file_path: &Path,
    module_path: &str,
    markers: &MarkerSettings,
    origin: Origin,
) -> Result<ScanResult> {
    let syntax = syn::parse_file(content).with_context(|| format!("Failed to parse {}", file_path.display()))?;
    let mut result = ScanResult::default();
    scan_items(&syntax.items, file_path, module_path, markers, origin, &mut result)?;
    Ok(result)
}

fn scan_items(
    items: &[Item],
    file_path: &Path,
    module_path: &str,
    markers: &MarkerSettings,
    origin: Origin,
    result: &mut ScanResult,
) -> Result<()> {
    for item in items {
        match item {
            Item::Struct(item_struct) => {
                let qualified = qualify(module_path, &item_struct.ident.to_string());
                match marker_of(&item_struct.attrs, markers) {
                    Some(marker) => {
                        let entity = extract_entity(item_struct, marker, &qualified, file_path, module_path, markers)?;
                        result.entities.push(ScannedEntity { origin, ..entity });
                    }
                    None => result.types.push(qualified),
                }
            }
            Item::Enum(item) => result.types.push(qualify(module_path, &item.ident.to_string())),
            Item::Union(item) => result.types.push(qualify(module_path, &item.ident.to_string())),
            Item::Type(item) => {
                let qualified = qualify(module_path, &item.ident.to_string());
                if item.generics.params.is_empty() {
                    result.aliases.push((qualified, type_ref(&item.ty, module_path)));
                } else {
                    result.types.push(qualified);
                }
            }
            Item::Use(item_use) => collect_imports(&item_use.tree, &mut Vec::new(), module_path, &mut result.imports),
            Item::Mod(item_mod) => {
                if let Some((_, nested)) = &item_mod.content {
                    let nested_path = qualify(module_path, &item_mod.ident.to_string());
                    scan_items(nested, file_path, &nested_path, markers, origin, result)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn collect_imports(tree: &UseTree, prefix: &mut Vec<String>, module_path: &str, imports: &mut Vec<ScannedImport>) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_imports(&path.tree, prefix, module_path, imports);
            prefix.pop();
        }
        UseTree::Name(name) => {
            let name = name.ident.to_string();
            bind_import(prefix, name, None, module_path, imports);
        }
        UseTree::Rename(rename) => {
            let alias = rename.rename.to_string();
            if alias != "_" {
                bind_import(prefix, rename.ident.to_string(), Some(alias), module_path, imports);
            }
        }
        UseTree::Glob(_) => imports.push(ScannedImport {
            module: module_path.to_string(),
            name: None,
            target: absolute_import(module_path, prefix),
        }),
        UseTree::Group(group) => {
            for tree in &group.items {
                collect_imports(tree, prefix, module_path, imports);
            }
        }
    }
}

/// `use a::b::c` binds `c`, `use a::b::{self}` binds `b`.
fn bind_import(
    prefix: &[String],
    ident: String,
    alias: Option<String>,
    module_path: &str,
    imports: &mut Vec<ScannedImport>,
) {
    let mut segments = prefix.to_vec();
    if ident != "self" {
        segments.push(ident);
    }
    let Some(last) = segments.last().cloned() else { return };
    imports.push(ScannedImport {
        module: module_path.to_string(),
        name: Some(alias.unwrap_or(last)),
        target: absolute_import(module_path, &segments),
    });
}

/// Resolve `crate::`, `self::` and `super::` against the importing module.
fn absolute_import(module_path: &str, segments: &[String]) -> String {
    let mut base: Vec<&str> = module_path.split("::").collect();
    let mut rest = segments;
    match segments.first().map(String::as_str) {
        Some("crate") => {
            base.truncate(1);
            rest = &segments[1..];
        }
        Some("self") => rest = &segments[1..],
        Some("super") => {
            while rest.first().is_some_and(|segment| segment == "super") {
                base.pop();
                rest = &rest[1..];
            }
        }
        _ => return segments.join("::"),
    }
    base.iter()
        .map(|segment| segment.to_string())
        .chain(rest.iter().cloned())
        .collect::<Vec<_>>()
        .join("::")
}

/// Which marker derive a struct carries, matched on the last path segment.
fn marker_of(attrs: &[Attribute], markers: &MarkerSettings) -> Option<Marker> {
    for attr in attrs {
        if attr.path().is_ident("derive")
            && let Ok(nested) = attr.parse_args_with(
                syn::punctuated::Punctuated::<syn::Path, syn::Token![,]>::parse_terminated,
            )
        {
            for path in nested {
                let Some(last) = path.segments.last() else { continue };
                if last.ident == markers.entity.as_str() {
                    return Some(Marker::Entity);
                }
                if last.ident == markers.mapped_superclass.as_str() {
                    return Some(Marker::MappedSuperclass);
                }
            }
        }
    }
    None
}

fn extract_entity(
    item: &syn::ItemStruct,
    marker: Marker,
    qualified: &str,
    file_path: &Path,
    module_path: &str,
    markers: &MarkerSettings,
) -> Result<ScannedEntity> {
    let mut entity = ScannedEntity {
        id: DeclId::new(qualified),
        marker,
        is_abstract: false,
        is_open: false,
        origin: Origin::Source,
        location: SourceLocation {
            path: file_path.to_path_buf(),
            line: item.ident.span().start().line,
        },
        extends: Vec::new(),
        fields: Vec::new(),
    };

    for attr in item.attrs.iter().filter(|attr| attr.path().is_ident(&markers.attribute)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("abstract") {
                entity.is_abstract = true;
            } else if meta.path.is_ident("open") {
                entity.is_open = true;
            } else if meta.path.is_ident("extends") {
                let value: LitStr = meta.value()?.parse()?;
                let written: Type = value.parse()?;
                entity.extends.push(type_ref(&written, module_path));
            } else {
                return Err(meta.error("unsupported metamodel option"));
            }
            Ok(())
        })
        .with_context(|| format!("Invalid #[{}] on {}", markers.attribute, qualified))?;
    }

    if let Fields::Named(named) = &item.fields {
        for field in &named.named {
            let Some(ident) = &field.ident else { continue };
            let name = ident.to_string().trim_start_matches("r#").to_string();
            let deprecation = deprecation(&field.attrs)
                .with_context(|| format!("Invalid #[deprecated] on {}.{}", qualified, name))?;
            let mut scanned = ScannedField {
                name,
                ty: type_ref(&field.ty, module_path),
                is_abstract: false,
                is_override: false,
                relationship: None,
                convert: false,
                deprecation,
            };
            for attr in field.attrs.iter().filter(|attr| attr.path().is_ident(&markers.attribute)) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("abstract") {
                        scanned.is_abstract = true;
                    } else if meta.path.is_ident("override") {
                        scanned.is_override = true;
                    } else if meta.path.is_ident("convert") {
                        scanned.convert = true;
                    } else if let Some(relationship) = meta
                        .path
                        .get_ident()
                        .and_then(|ident| Relationship::from_name(&ident.to_string()))
                    {
                        scanned.relationship = Some(relationship);
                    } else {
                        return Err(meta.error("unsupported metamodel field option"));
                    }
                    Ok(())
                })
                .with_context(|| format!("Invalid #[{}] on {}.{}", markers.attribute, qualified, scanned.name))?;
            }
            entity.fields.push(scanned);
        }
    }

    Ok(entity)
}

/// `#[deprecated]`, `#[deprecated = ".."]` or `#[deprecated(since = "..", note = "..")]`.
fn deprecation(attrs: &[Attribute]) -> syn::Result<Option<Deprecation>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("deprecated")) else {
        return Ok(None);
    };
    let message = match &attr.meta {
        Meta::Path(_) => None,
        Meta::NameValue(name_value) => match &name_value.value {
            Expr::Lit(ExprLit { lit: Lit::Str(lit), .. }) => Some(lit.value()),
            other => return Err(syn::Error::new_spanned(other, "expected a string literal")),
        },
        Meta::List(_) => {
            let mut note = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("note") {
                    let value: LitStr = meta.value()?.parse()?;
                    note = Some(value.value());
                    Ok(())
                } else if meta.path.is_ident("since") {
                    let _: LitStr = meta.value()?.parse()?;
                    Ok(())
                } else {
                    Err(meta.error("expected `since` or `note`"))
                }
            })?;
            note
        }
    };
    Ok(Some(Deprecation { message }))
}

/// Translate a written type. `Option<T>` becomes a nullable `T`; syntax
/// without a nameable path is kept verbatim.
pub fn type_ref(ty: &Type, scope: &str) -> TypeRef {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => {
            let path = &type_path.path;
            if let Some(inner) = option_inner(path) {
                return type_ref(inner, scope).nullable();
            }
            let mut written: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
            if path.leading_colon.is_some() {
                written.insert(0, String::new());
            }
            let arguments = path
                .segments
                .last()
                .map(|segment| match &segment.arguments {
                    PathArguments::AngleBracketed(args) => args
                        .args
                        .iter()
                        .filter_map(|arg| match arg {
                            GenericArgument::Type(ty) => Some(type_ref(ty, scope)),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                })
                .unwrap_or_default();
            TypeRef::new(written.join("::")).with_args(arguments).in_scope(scope)
        }
        Type::Group(group) => type_ref(&group.elem, scope),
        Type::Paren(paren) => type_ref(&paren.elem, scope),
        other => TypeRef::verbatim(other.to_token_stream().to_string()),
    }
}

fn option_inner(path: &syn::Path) -> Option<&Type> {
    let last = path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    match &last.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn qualify(module_path: &str, name: &str) -> String {
    format!("{module_path}::{name}")
}

/// Compute the module path from a file path.
/// e.g., "src/shop/models/order.rs" -> "crate::shop::models::order"
pub fn compute_module_path(file_path: &Path, base_path: &Path, crate_name: &str) -> String {
    let relative = file_path.strip_prefix(base_path).unwrap_or(file_path);

    let without_extension = relative.with_extension("");
    let mut parts: Vec<&str> = without_extension
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    // Remove "mod" or "lib" from the end if present
    if let Some(last) = parts.last()
        && (*last == "mod" || *last == "lib" || *last == "main")
    {
        parts.pop();
    }

    if parts.is_empty() {
        crate_name.to_string()
    } else {
        format!("{}::{}", crate_name, parts.join("::"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(code: &str) -> ScanResult {
        scan_source(
            code,
            Path::new("src/model.rs"),
            "crate::model",
            &MarkerSettings::default(),
            Origin::Source,
        )
        .unwrap()
    }

    #[test]
    fn test_marker_of() {
        let code = r#"
            #[derive(Debug, metagen::MappedSuperclass, Clone)]
            struct Shape {
                id: i64,
            }
        "#;

        let syntax: syn::ItemStruct = syn::parse_str(code).unwrap();
        assert_eq!(marker_of(&syntax.attrs, &MarkerSettings::default()), Some(Marker::MappedSuperclass));
    }

    #[test]
    fn test_extract_entity() {
        let result = scan(
            r#"
            use std::collections::BTreeSet;

            #[derive(Entity)]
            #[metamodel(open, extends = "Shape")]
            pub struct Square {
                #[metamodel(override)]
                color: Color,
                nick_name: Option<String>,
                tags: BTreeSet<String>,
                #[metamodel(many_to_one)]
                #[deprecated(note = "use owner")]
                parent: Option<Person>,
                checksum: [u8; 16],
            }

            pub enum Color { Red }
            type Labels = BTreeSet<String>;

            mod nested {
                #[derive(Entity)]
                struct Inner { id: i64 }
            }
            "#,
        );

        assert_eq!(result.entities.len(), 2);
        let square = &result.entities[0];
        assert_eq!(square.id, DeclId::new("crate::model::Square"));
        assert_eq!(square.marker, Marker::Entity);
        assert!(square.is_open && !square.is_abstract);
        assert_eq!(square.extends, vec![TypeRef::new("Shape").in_scope("crate::model")]);

        let names: Vec<_> = square.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["color", "nick_name", "tags", "parent", "checksum"]);
        assert!(square.fields[0].is_override);
        assert!(square.fields[1].ty.nullable);
        assert_eq!(square.fields[1].ty.path, "String");
        assert_eq!(square.fields[2].ty.arguments.len(), 1);
        assert_eq!(square.fields[3].relationship, Some(Relationship::ManyToOne));
        assert_eq!(square.fields[3].deprecation, Some(Deprecation::new("use owner")));
        assert!(square.fields[4].ty.verbatim);

        assert_eq!(result.entities[1].id, DeclId::new("crate::model::nested::Inner"));
        assert_eq!(result.types, vec!["crate::model::Color".to_string()]);
        assert_eq!(result.aliases[0].0, "crate::model::Labels");
    }

    #[test]
    fn test_rejects_unknown_options() {
        let err = scan_source(
            r#"
            #[derive(Entity)]
            #[metamodel(table = "people")]
            struct Person { id: i64 }
            "#,
            Path::new("src/model.rs"),
            "crate::model",
            &MarkerSettings::default(),
            Origin::Source,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("crate::model::Person"));
    }

    #[test]
    fn test_collects_imports() {
        let result = scan_source(
            r#"
            use crate::b::Color;
            use super::shapes::{self, Square as Tile};
            use std::collections::{BTreeSet, HashMap as Map};
            use self::inner::*;
            use std::fmt::Write as _;
            "#,
            Path::new("src/c/car.rs"),
            "crate::c::car",
            &MarkerSettings::default(),
            Origin::Source,
        )
        .unwrap();

        let bound: Vec<_> = result
            .imports
            .iter()
            .map(|import| (import.name.as_deref(), import.target.as_str()))
            .collect();
        assert_eq!(
            bound,
            [
                (Some("Color"), "crate::b::Color"),
                (Some("shapes"), "crate::c::shapes"),
                (Some("Tile"), "crate::c::shapes::Square"),
                (Some("BTreeSet"), "std::collections::BTreeSet"),
                (Some("Map"), "std::collections::HashMap"),
                (None, "crate::c::car::inner"),
            ]
        );
        assert!(result.imports.iter().all(|import| import.module == "crate::c::car"));
    }

    #[test]
    fn test_rejects_malformed_deprecation() {
        let err = scan_source(
            r#"
            #[derive(Entity)]
            struct Person {
                #[deprecated(note = 5)]
                name: String,
            }
            "#,
            Path::new("src/model.rs"),
            "crate::model",
            &MarkerSettings::default(),
            Origin::Source,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("crate::model::Person.name"));
    }

    #[test]
    fn test_compute_module_path() {
        let base = Path::new("src");
        assert_eq!(compute_module_path(Path::new("src/lib.rs"), base, "crate"), "crate");
        assert_eq!(compute_module_path(Path::new("src/shop/mod.rs"), base, "crate"), "crate::shop");
        assert_eq!(
            compute_module_path(Path::new("src/shop/order.rs"), base, "crate"),
            "crate::shop::order"
        );
    }
}
