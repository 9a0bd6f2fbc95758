//! The generated companion of one entity and its rendering to Rust source.

use std::collections::BTreeMap;
use std::path::PathBuf;

use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};

use crate::classify::AttributeKind;
use crate::config::MetamodelConfig;
use crate::declaration::{AttributeDeclaration, DeclId, Deprecation, EntityDeclaration};
use crate::errors::GenerateError;
use crate::host::{Dependencies, EmittedArtifact};
use crate::naming;
use crate::types::ResolvedType;

/// `pub const FIRST_NAME: &str = "firstName";`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConstant {
    pub constant: String,
    pub attribute: String,
    pub deprecation: Option<Deprecation>,
}

impl NameConstant {
    pub fn for_attribute(attribute: &AttributeDeclaration) -> Self {
        Self {
            constant: naming::constant_name(&attribute.name),
            attribute: attribute.name.clone(),
            deprecation: attribute.deprecation.clone(),
        }
    }
}

/// Where a descriptor's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorSource {
    /// Declared on the entity itself.
    Declared,
    /// Patched in from a subtype's concrete descriptor (`B_::shape.cast()`).
    Cast { from: String },
}

/// Typed attribute descriptor: `pub const name: SingularAttribute<Person, String>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorField {
    pub attribute: String,
    pub kind: AttributeKind,
    /// Declaring type the descriptor is parameterized by.
    pub owner: DeclId,
    pub parameters: Vec<ResolvedType>,
    pub source: DescriptorSource,
    pub deprecation: Option<Deprecation>,
}

impl DescriptorField {
    pub fn is_string_typed(&self) -> bool {
        self.kind == AttributeKind::Singular && self.parameters.first().is_some_and(ResolvedType::is_string)
    }

    pub fn is_cast(&self) -> bool {
        matches!(self.source, DescriptorSource::Cast { .. })
    }
}

/// Extension accessor navigating to an attribute from any path over the entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAccessor {
    pub attribute: String,
    pub kind: AttributeKind,
    pub parameters: Vec<ResolvedType>,
    pub deprecation: Option<Deprecation>,
}

/// Extension accessor joining a relationship attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinAccessor {
    pub attribute: String,
    pub kind: AttributeKind,
    pub parameters: Vec<ResolvedType>,
    pub deprecation: Option<Deprecation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassToken {
    Entity,
    MappedSuperclass,
}

impl ClassToken {
    fn family(self) -> &'static str {
        match self {
            Self::Entity => "EntityType",
            Self::MappedSuperclass => "MappedSuperclassType",
        }
    }
}

/// The generated companion of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub entity: DeclId,
    /// Generated type name (`Person_`).
    pub name: String,
    /// Accessors are generic over subtypes of the entity.
    pub generic: bool,
    pub constants: Vec<NameConstant>,
    descriptors: Vec<DescriptorField>,
    pub paths: Vec<PathAccessor>,
    pub joins: Vec<JoinAccessor>,
    pub class_token: ClassToken,
    pub supertypes: Vec<DeclId>,
    /// Declarations that contributed to this artifact and their source files.
    pub origins: BTreeMap<DeclId, Option<PathBuf>>,
}

impl GeneratedArtifact {
    pub fn new(entity: &EntityDeclaration, suffix: &str) -> Self {
        let mut origins = BTreeMap::new();
        origins.insert(entity.id.clone(), entity.source_path().cloned());
        Self {
            entity: entity.id.clone(),
            name: naming::generated_name(entity.id.simple_name(), suffix),
            generic: entity.permits_subtypes(),
            constants: Vec::new(),
            descriptors: Vec::new(),
            paths: Vec::new(),
            joins: Vec::new(),
            class_token: if entity.is_abstract {
                ClassToken::MappedSuperclass
            } else {
                ClassToken::Entity
            },
            supertypes: entity.supertypes.clone(),
            origins,
        }
    }

    /// Descriptors in emission order: string-typed first, then by attribute name.
    pub fn descriptors(&self) -> &[DescriptorField] {
        &self.descriptors
    }

    pub fn descriptor(&self, attribute: &str) -> Option<&DescriptorField> {
        self.descriptors.iter().find(|field| field.attribute == attribute)
    }

    pub fn push_descriptor(&mut self, field: DescriptorField) {
        self.descriptors.retain(|existing| existing.attribute != field.attribute);
        self.descriptors.push(field);
        self.sort();
    }

    /// Add a descriptor contributed by another declaration.
    pub fn patch(&mut self, field: DescriptorField, contributor: DeclId, source: Option<PathBuf>) {
        self.push_descriptor(field);
        self.origins.entry(contributor).or_insert(source);
    }

    /// Carry patched descriptors over from an earlier build of the same entity.
    pub fn adopt_patches(&mut self, previous: &GeneratedArtifact) {
        for field in previous.descriptors.iter().filter(|field| field.is_cast()) {
            if self.descriptor(&field.attribute).is_none() {
                self.descriptors.push(field.clone());
            }
        }
        for (declaration, source) in &previous.origins {
            self.origins.entry(declaration.clone()).or_insert_with(|| source.clone());
        }
        self.sort();
    }

    pub fn finish(&mut self) {
        self.constants.sort_by(|a, b| a.constant.cmp(&b.constant));
        self.sort();
    }

    fn sort(&mut self) {
        self.descriptors
            .sort_by(|a, b| (!a.is_string_typed(), &a.attribute).cmp(&(!b.is_string_typed(), &b.attribute)));
    }

    pub fn file_name(&self) -> String {
        naming::file_name(&self.name)
    }

    pub fn dependencies(&self, precise: bool) -> Dependencies {
        if !precise {
            return Dependencies::AllFiles;
        }
        Dependencies::Precise {
            declarations: self.origins.keys().cloned().collect(),
            files: self.origins.values().flatten().cloned().collect(),
        }
    }

    /// Render and package for the writer.
    pub fn emit(&self, config: &MetamodelConfig) -> Result<EmittedArtifact, GenerateError> {
        Ok(EmittedArtifact {
            entity: self.entity.clone(),
            name: self.name.clone(),
            file_name: self.file_name(),
            source: self.render(config)?,
            dependencies: self.dependencies(config.precise_dependencies),
        })
    }

    /// Rust source of the companion module.
    pub fn render(&self, config: &MetamodelConfig) -> Result<String, GenerateError> {
        let tokens = Renderer::new(self, config)?.render()?;
        let file: syn::File = syn::parse2(tokens).map_err(|source| self.render_error(source))?;
        Ok(prettyplease::unparse(&file))
    }

    fn render_error(&self, source: syn::Error) -> GenerateError {
        GenerateError::Render {
            name: self.name.clone(),
            source,
        }
    }
}

struct Renderer<'a> {
    artifact: &'a GeneratedArtifact,
    runtime: syn::Path,
    entity: syn::Type,
    companion: Ident,
}

impl<'a> Renderer<'a> {
    fn new(artifact: &'a GeneratedArtifact, config: &MetamodelConfig) -> Result<Self, GenerateError> {
        Ok(Self {
            artifact,
            runtime: syn::parse_str(&config.runtime_path).map_err(|source| artifact.render_error(source))?,
            entity: parse_type(artifact, &artifact.entity.to_string())?,
            companion: ident(&artifact.name),
        })
    }

    fn render(&self) -> Result<TokenStream, GenerateError> {
        let header = format!(
            " Metamodel of `{}`. Auto-generated by metagen, do not edit manually.",
            self.artifact.entity
        );
        let summary = format!(" Static metamodel of [`{}`].", self.artifact.entity);
        let companion = &self.companion;
        let entity = &self.entity;
        let runtime = &self.runtime;

        let constants = self.artifact.constants.iter().map(|constant| {
            let name = ident(&constant.constant);
            let value = &constant.attribute;
            let deprecated = deprecated(constant.deprecation.as_ref());
            quote! {
                #deprecated
                pub const #name: &'static str = #value;
            }
        });

        let descriptors = self
            .artifact
            .descriptors
            .iter()
            .map(|field| self.descriptor(field))
            .collect::<Result<Vec<_>, _>>()?;

        let class_family = format_ident!("{}", self.artifact.class_token.family());
        let class_doc = format!(" @see {}", self.artifact.entity);
        let entity_name = self.artifact.entity.simple_name();

        let paths = self.path_accessors()?;
        let joins = self.join_accessors()?;

        let supertypes = self
            .artifact
            .supertypes
            .iter()
            .map(|supertype| {
                let supertype = parse_type(self.artifact, supertype.as_str())?;
                Ok(quote! {
                    impl #runtime::Extends<#supertype> for #entity {}
                })
            })
            .collect::<Result<Vec<_>, GenerateError>>()?;

        Ok(quote! {
            #![doc = #header]
            #![allow(warnings)]

            #[doc = #summary]
            pub struct #companion;

            impl #companion {
                #(#constants)*

                #(#descriptors)*

                #[doc = #class_doc]
                pub const class_: #runtime::#class_family<#entity> = #runtime::#class_family::new(#entity_name);
            }

            #paths

            #joins

            #(#supertypes)*
        })
    }

    fn descriptor(&self, field: &DescriptorField) -> Result<TokenStream, GenerateError> {
        let runtime = &self.runtime;
        let name = ident(&field.attribute);
        let family = format_ident!("{}", field.kind.descriptor_family());
        let owner = parse_type(self.artifact, field.owner.as_str())?;
        let parameters = self.types(&field.parameters)?;
        let doc = format!(" @see {}.{}", field.owner, field.attribute);
        let deprecated = deprecated(field.deprecation.as_ref());
        let attribute = &field.attribute;

        let value = match &field.source {
            DescriptorSource::Declared => quote!(#runtime::#family::new(#attribute)),
            DescriptorSource::Cast { from } => {
                let from = ident(from);
                quote!(super::#from::#name.cast())
            }
        };

        Ok(quote! {
            #[doc = #doc]
            #deprecated
            pub const #name: #runtime::#family<#owner, #(#parameters),*> = #value;
        })
    }

    fn path_accessors(&self) -> Result<TokenStream, GenerateError> {
        if self.artifact.paths.is_empty() {
            return Ok(TokenStream::new());
        }
        let runtime = &self.runtime;
        let companion = &self.companion;
        let trait_name = format_ident!("{}Path", self.artifact.entity.simple_name());
        let (generics, target, bounds) = self.impl_header(quote!(#runtime::Path));

        let mut signatures = Vec::new();
        let mut bodies = Vec::new();
        for accessor in &self.artifact.paths {
            let method = ident(&naming::path_accessor(&accessor.attribute));
            let attribute = ident(&accessor.attribute);
            let parameters = self.types(&accessor.parameters)?;
            let value = match accessor.kind.value_family() {
                None => quote!(#(#parameters),*),
                Some(family) => {
                    let family = format_ident!("{family}");
                    quote!(#runtime::#family<#(#parameters),*>)
                }
            };
            let deprecated = deprecated(accessor.deprecation.as_ref());
            signatures.push(quote! {
                #deprecated
                fn #method(&self) -> #runtime::Expression<#value>;
            });
            bodies.push(quote! {
                fn #method(&self) -> #runtime::Expression<#value> {
                    <P as #runtime::Path<#target>>::get(self, &#companion::#attribute)
                }
            });
        }

        Ok(quote! {
            pub trait #trait_name<X> {
                #(#signatures)*
            }

            impl #generics #trait_name<#target> for P #bounds {
                #(#bodies)*
            }
        })
    }

    fn join_accessors(&self) -> Result<TokenStream, GenerateError> {
        if self.artifact.joins.is_empty() {
            return Ok(TokenStream::new());
        }
        let runtime = &self.runtime;
        let companion = &self.companion;
        let trait_name = format_ident!("{}From", self.artifact.entity.simple_name());
        let (generics, target, bounds) = self.impl_header(quote!(#runtime::From));

        let mut signatures = Vec::new();
        let mut bodies = Vec::new();
        for accessor in &self.artifact.joins {
            let method = ident(&naming::join_accessor(&accessor.attribute));
            let attribute = ident(&accessor.attribute);
            let family = format_ident!("{}", accessor.kind.join_family());
            let parameters = self.types(&accessor.parameters)?;
            let deprecated = deprecated(accessor.deprecation.as_ref());
            signatures.push(quote! {
                #deprecated
                fn #method(&self, join_type: ::core::option::Option<#runtime::JoinType>) -> #runtime::#family<X, #(#parameters),*>;
            });
            bodies.push(quote! {
                fn #method(&self, join_type: ::core::option::Option<#runtime::JoinType>) -> #runtime::#family<#target, #(#parameters),*> {
                    <P as #runtime::From<#target>>::join(self, &#companion::#attribute, join_type.unwrap_or_default())
                }
            });
        }

        Ok(quote! {
            pub trait #trait_name<X> {
                #(#signatures)*
            }

            impl #generics #trait_name<#target> for P #bounds {
                #(#bodies)*
            }
        })
    }

    /// Generics, trait argument, and where clause of an accessor impl.
    ///
    /// Open entities get a type variable bounded by the entity so the
    /// accessors also apply to paths over subtypes.
    fn impl_header(&self, capability: TokenStream) -> (TokenStream, TokenStream, TokenStream) {
        let runtime = &self.runtime;
        let entity = &self.entity;
        if self.artifact.generic {
            (
                quote!(<X, P>),
                quote!(X),
                quote!(where P: #capability<X> + ?Sized, X: #runtime::Extends<#entity>),
            )
        } else {
            (quote!(<P>), quote!(#entity), quote!(where P: #capability<#entity> + ?Sized))
        }
    }

    fn types(&self, types: &[ResolvedType]) -> Result<Vec<syn::Type>, GenerateError> {
        types.iter().map(|ty| parse_type(self.artifact, &ty.to_rust())).collect()
    }
}

fn parse_type(artifact: &GeneratedArtifact, text: &str) -> Result<syn::Type, GenerateError> {
    syn::parse_str(text).map_err(|source| artifact.render_error(source))
}

fn ident(name: &str) -> Ident {
    syn::parse_str::<Ident>(name).unwrap_or_else(|_| Ident::new_raw(name, Span::call_site()))
}

fn deprecated(deprecation: Option<&Deprecation>) -> TokenStream {
    match deprecation {
        Some(deprecation) => {
            let note = deprecation.note();
            quote!(#[deprecated(note = #note)])
        }
        None => TokenStream::new(),
    }
}
