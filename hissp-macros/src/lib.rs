//! Procedural macros for registering Hissp reader- and compiler-macros
//!
//! Provides `#[reader_macro(name = "...")]` and `#[compiler_macro(name =
//! "...")]`, attribute macros that wrap a plain Rust function taking
//! unevaluated Hissp arguments into the boilerplate needed to register it
//! under a `MacroNamespace`: name registration and doc capture for
//! introspection. Both attributes produce the same registration shape —
//! the macro namespace protocol makes no distinction between read-time and
//! compile-time invocation (the registry holds one kind of callable); the
//! two names exist only to document which registry a macro is meant for.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, ItemFn, Meta};

/// Extracts the rustdoc (`///`) text attached to a function, joined into
/// one string, for use as the macro's registered description.
fn extract_doc_comments(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc") {
                if let Meta::NameValue(nv) = &attr.meta {
                    if let syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(lit_str), .. }) = &nv.value {
                        return Some(lit_str.value());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses `name = "..."` out of the attribute's token stream.
fn parse_macro_name(attr_stream: &TokenStream) -> Option<String> {
    let attr_str = attr_stream.to_string();
    let start = attr_str.find("name")?;
    let rest = &attr_str[start..];
    let quote_start = rest.find('"')? + 1;
    let quote_end = rest[quote_start..].find('"')? + quote_start;
    Some(rest[quote_start..quote_end].to_string())
}

fn expand(attr: TokenStream, item: TokenStream, kind: &str) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);
    let fn_name = func.sig.ident.clone();
    let surface_name = parse_macro_name(&attr).unwrap_or_else(|| fn_name.to_string());
    let doc = extract_doc_comments(&func.attrs);

    let register_fn_name = quote::format_ident!("register_{}", fn_name);
    let doc_const_name = quote::format_ident!("{}_DOC", fn_name.to_string().to_uppercase());
    let kind_const_name = quote::format_ident!("{}_KIND", fn_name.to_string().to_uppercase());

    let expanded = quote! {
        #func

        #[doc(hidden)]
        pub const #doc_const_name: &str = #doc;
        #[doc(hidden)]
        pub const #kind_const_name: &str = #kind;

        /// Binds `#fn_name` into `module`'s macro namespace under its
        /// surface name (munged at registration, per the namespace
        /// protocol).
        #[allow(dead_code)]
        pub fn #register_fn_name(registry: &mut crate::macro_ns::MacroRegistry, module: &str) {
            registry
                .namespace_mut(module)
                .define(#surface_name, std::sync::Arc::new(#fn_name));
        }
    };

    TokenStream::from(expanded)
}

/// Registers a function as a read-time macro: the reader invokes it
/// directly when it encounters `<name>#x` (§4.C rule 8).
#[proc_macro_attribute]
pub fn reader_macro(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, "reader")
}

/// Registers a function as a compile-time macro: the compiler invokes it
/// when a tuple head resolves via `_macro_` lookup (§4.F).
#[proc_macro_attribute]
pub fn compiler_macro(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, "compiler")
}
