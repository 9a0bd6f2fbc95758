use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Error, Field, Fields, Generics, Ident, LitStr, Result};

#[derive(Clone, Copy)]
pub(crate) enum PersistentKind {
    Entity,
    MappedSuperclass,
}

impl PersistentKind {
    fn derive_name(self) -> &'static str {
        match self {
            Self::Entity => "Entity",
            Self::MappedSuperclass => "MappedSuperclass",
        }
    }
}

pub(crate) struct ParsedPersistent {
    name: Ident,
    generics: Generics,
    kind: PersistentKind,
}

#[derive(Default)]
struct ContainerFlags {
    is_abstract: bool,
    extends: Vec<LitStr>,
}

#[derive(Default)]
struct FieldFlags {
    is_abstract: bool,
    is_override: bool,
    relationship: Option<Ident>,
    convert: bool,
}

const RELATIONSHIPS: [&str; 4] = ["one_to_one", "one_to_many", "many_to_one", "many_to_many"];

impl ParsedPersistent {
    pub(crate) fn from_input(input: &DeriveInput, kind: PersistentKind) -> Result<Self> {
        let derive_name = kind.derive_name();
        let mut container = ContainerFlags::default();
        for attr in &input.attrs {
            if attr.path().is_ident("metamodel") {
                Self::parse_container_attr(attr, &mut container)?;
            }
        }

        let fields = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => &named.named,
                _ => {
                    return Err(Error::new(
                        input.ident.span(),
                        format!("{derive_name} requires named fields"),
                    ));
                }
            },
            _ => {
                return Err(Error::new(
                    input.ident.span(),
                    format!("{derive_name} can only be derived for structs"),
                ));
            }
        };

        for field in fields {
            let flags = Self::parse_field(field)?;
            let span = field.ident.as_ref().map_or_else(Span::call_site, Ident::span);
            if flags.is_abstract && !container.is_abstract {
                return Err(Error::new(
                    span,
                    "#[metamodel(abstract)] fields require #[metamodel(abstract)] on the struct",
                ));
            }
            if flags.is_override && container.extends.is_empty() {
                return Err(Error::new(
                    span,
                    "#[metamodel(override)] requires a supertype: add #[metamodel(extends = \"...\")] to the struct",
                ));
            }
            if flags.is_abstract && flags.is_override {
                return Err(Error::new(span, "a field cannot be both abstract and override"));
            }
            if flags.convert && flags.relationship.is_some() {
                return Err(Error::new(span, "converted fields cannot be relationships"));
            }
        }

        Ok(Self {
            name: input.ident.clone(),
            generics: input.generics.clone(),
            kind,
        })
    }

    fn parse_container_attr(attr: &Attribute, flags: &mut ContainerFlags) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("abstract") {
                flags.is_abstract = true;
            } else if meta.path.is_ident("open") {
                // only read by the scanner
            } else if meta.path.is_ident("extends") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(Error::new(value.span(), "extends requires a type name"));
                }
                flags.extends.push(value);
            } else {
                return Err(meta.error("unknown metamodel option, expected `abstract`, `open` or `extends = \"..\"`"));
            }
            Ok(())
        })
    }

    fn parse_field(field: &Field) -> Result<FieldFlags> {
        let mut flags = FieldFlags::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("metamodel") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("abstract") {
                    flags.is_abstract = true;
                } else if meta.path.is_ident("override") {
                    flags.is_override = true;
                } else if meta.path.is_ident("convert") {
                    flags.convert = true;
                } else if let Some(ident) = meta.path.get_ident().filter(|ident| RELATIONSHIPS.iter().any(|r| *ident == r)) {
                    if let Some(previous) = &flags.relationship {
                        return Err(meta.error(format!("relationship already declared as `{previous}`")));
                    }
                    flags.relationship = Some(ident.clone());
                } else {
                    return Err(meta.error(
                        "unknown metamodel field option, expected `abstract`, `override`, `convert` or a relationship",
                    ));
                }
                Ok(())
            })?;
        }
        Ok(flags)
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let name = &self.name;
        let entity_name = LitStr::new(&name.to_string(), name.span());
        let kind = match self.kind {
            PersistentKind::Entity => quote!(::metagen::criteria::PersistentKind::Entity),
            PersistentKind::MappedSuperclass => quote!(::metagen::criteria::PersistentKind::MappedSuperclass),
        };
        let (impl_generics, ty_generics, where_clause) = self.generics.split_for_impl();

        quote! {
            impl #impl_generics ::metagen::criteria::Persistent for #name #ty_generics #where_clause {
                const ENTITY_NAME: &'static str = #entity_name;
                const KIND: ::metagen::criteria::PersistentKind = #kind;
            }
        }
    }
}
