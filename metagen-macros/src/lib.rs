//! Derive markers for metagen.
//!
//! `#[derive(Entity)]` and `#[derive(MappedSuperclass)]` mark a struct as a
//! metamodel candidate for the `metagen-build` scanner and implement
//! `metagen::criteria::Persistent`. The `#[metamodel(...)]` helper attribute
//! is validated here and read again by the scanner.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod parsed;

use parsed::{ParsedPersistent, PersistentKind};

#[proc_macro_derive(Entity, attributes(metamodel))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    derive(input, PersistentKind::Entity)
}

#[proc_macro_derive(MappedSuperclass, attributes(metamodel))]
pub fn derive_mapped_superclass(input: TokenStream) -> TokenStream {
    derive(input, PersistentKind::MappedSuperclass)
}

fn derive(input: TokenStream, kind: PersistentKind) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedPersistent::from_input(&input, kind) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}
