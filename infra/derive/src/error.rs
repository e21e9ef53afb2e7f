use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Data, DeriveInput, Fields, Ident, Type, Variant};

/// Paths under which `Cow` may be spelled in a `context` field.
const COW_PATHS: [&str; 4] = ["", "std::borrow::", "::std::borrow::", "alloc::borrow::"];

/// What the expansion needs to know about one variant.
struct Shape<'a> {
    ident: &'a Ident,
    source: Option<&'a Type>,
    has_context: bool,
}

pub fn expand(input: DeriveInput) -> TokenStream {
    match shapes(&input) {
        Ok(shapes) => render(&input, &shapes),
        Err(err) => err.to_compile_error(),
    }
}

fn shapes(input: &DeriveInput) -> syn::Result<Vec<Shape<'_>>> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "keel_error can only be applied to enums"));
    };

    let shapes = data.variants.iter().map(shape).collect::<syn::Result<Vec<_>>>()?;
    if let Some(orphan) = shapes.iter().find(|s| s.source.is_some() && !s.has_context) {
        return Err(syn::Error::new_spanned(
            orphan.ident,
            "keel_error requires `context: Option<Cow<'static, str>>` for variants with a source",
        ));
    }
    Ok(shapes)
}

fn shape(variant: &Variant) -> syn::Result<Shape<'_>> {
    let Fields::Named(fields) = &variant.fields else {
        return Err(syn::Error::new_spanned(
            variant,
            "keel_error requires named fields for source/context handling",
        ));
    };

    let mut shape = Shape { ident: &variant.ident, source: None, has_context: false };
    for field in &fields.named {
        let Some(name) = &field.ident else { continue };
        if name == "source" {
            shape.source = Some(&field.ty);
        } else if name == "context" {
            if !is_context_type(&field.ty) {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "context field must be Option<Cow<'static, str>>",
                ));
            }
            shape.has_context = true;
        }
    }
    Ok(shape)
}

fn is_context_type(ty: &Type) -> bool {
    let rendered: String = ty.to_token_stream().to_string().split_whitespace().collect();
    rendered
        .strip_prefix("Option<")
        .and_then(|inner| inner.strip_suffix("Cow<'static,str>>"))
        .is_some_and(|path| COW_PATHS.contains(&path))
}

fn render(input: &DeriveInput, shapes: &[Shape<'_>]) -> TokenStream {
    let name = &input.ident;
    let ext = format_ident!("{name}Ext");
    let derives = missing_derives(input);

    let context_arms = shapes.iter().filter(|s| s.has_context).map(|s| {
        let variant = s.ident;
        quote! { #name::#variant { context: slot, .. } => *slot = Some(context.into()), }
    });
    let kind_arms = shapes.iter().map(|s| {
        let variant = s.ident;
        let label = variant.to_string();
        quote! { Self::#variant { .. } => #label, }
    });
    let conversions = shapes
        .iter()
        .filter(|s| s.ident != "Internal")
        .filter_map(|s| s.source.map(|ty| conversion(name, &ext, s.ident, ty)));
    let fallback = shapes.iter().any(|s| s.ident == "Internal").then(|| internal_fallback(name));

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        pub trait #ext<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut e| {
                    #[allow(unreachable_patterns)]
                    match &mut e {
                        #( #context_arms )*
                        _ => {}
                    }
                    e
                })
            }
        }

        #[automatically_derived]
        impl #name {
            /// Variant name, for structured log fields.
            #[must_use]
            pub const fn kind(&self) -> &'static str {
                match self {
                    #( #kind_arms )*
                }
            }
        }

        #( #conversions )*
        #fallback

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
        }
    }
}

/// `From<Source>` plus `.context()` directly on `Result<T, Source>`.
fn conversion(name: &Ident, ext: &Ident, variant: &Ident, source: &Type) -> TokenStream {
    quote! {
        #[automatically_derived]
        impl From<#source> for #name {
            #[inline]
            fn from(source: #source) -> Self {
                Self::#variant { source, context: None }
            }
        }

        impl<T> #ext<T> for std::result::Result<T, #source> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                self.map_err(|source| #name::#variant { source, context: Some(context.into()) })
            }
        }
    }
}

fn internal_fallback(name: &Ident) -> TokenStream {
    quote! {
        impl From<&'static str> for #name {
            #[inline]
            fn from(message: &'static str) -> Self {
                Self::Internal { message: std::borrow::Cow::Borrowed(message), context: None }
            }
        }

        impl From<String> for #name {
            #[inline]
            fn from(message: String) -> Self {
                Self::Internal { message: std::borrow::Cow::Owned(message), context: None }
            }
        }
    }
}

/// `Debug` and `thiserror::Error`, unless the enum already derives them.
fn missing_derives(input: &DeriveInput) -> TokenStream {
    let mut present = Vec::new();
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                present.push(segment.ident.to_string());
            }
            Ok(())
        });
    }

    let has = |name: &str| present.iter().any(|derived| derived == name);
    let debug = (!has("Debug")).then(|| quote!(Debug));
    let error = (!has("Error")).then(|| quote!(::thiserror::Error));
    let wanted: Vec<TokenStream> = debug.into_iter().chain(error).collect();
    if wanted.is_empty() { quote!() } else { quote!(#[derive(#(#wanted),*)]) }
}
