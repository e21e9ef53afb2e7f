#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the keel crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! keel-derive.workspace = true
//! thiserror.workspace = true
//! ```
//!
//! The docstring examples are `ignore`d to avoid compiling in this crate;
//! the consuming crates carry the real usages.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// A high-level attribute macro for defining domain-specific error enums.
///
/// This macro reduces boilerplate by transforming a standard enum into a fully-featured
/// error type integrated with the keel crates.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Kind Label**: Generates `kind()`, returning the variant name for log fields.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `#[source]` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides specialized `From<&str>` and `From<String>` implementations
///   if an `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors name that field `source`.
/// 4. Tuple or unit variants are rejected to keep error wiring explicit and reliable.
/// 5. One annotated enum per module, since a private `format_context` helper is emitted
///    next to it.
///
/// # Example
///
/// ```rust,ignore
/// use keel_derive::keel_error;
/// use std::borrow::Cow;
///
/// #[keel_error]
/// pub enum BackendError {
///     #[error("Transport failure{}: {source}", format_context(.context))]
///     Transport {
///         source: std::io::Error,
///         context: Option<Cow<'static, str>>,
///     },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn probe() -> Result<(), BackendError> {
///     std::fs::metadata("bucket.lock").context("Probing bucket lock")?;
///     Err("unreachable".into())
/// }
/// ```
#[proc_macro_attribute]
pub fn keel_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).into()
}
