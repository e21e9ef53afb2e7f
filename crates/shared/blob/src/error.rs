use crate::key::display_key;
use std::borrow::Cow;

/// Boxed transport error carried through [`BlobError::Backend`] untouched.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by every keyspace implementation.
///
/// `KeyNotFound` and `KeyExists` are expected outcomes callers branch on;
/// `Backend` is opaque and may be transient.
#[keel_derive::keel_error]
pub enum BlobError {
    /// The key is empty, absent, or hidden behind a delete marker.
    #[error("Key not found{}: {}", format_context(.context), display_key(.key))]
    KeyNotFound { key: Vec<u8>, context: Option<Cow<'static, str>> },

    /// A non-replacing put found the key already present.
    #[error("Key already exists{}: {}", format_context(.context), display_key(.key))]
    KeyExists { key: Vec<u8>, context: Option<Cow<'static, str>> },

    /// The caller's context ended while waiting for a rate limit token.
    #[error("Rate limit context ended{}: {message}", format_context(.context))]
    RateLimited { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The caller's context ended while a remote call was in flight.
    #[error("Operation cancelled{}: {message}", format_context(.context))]
    Cancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage backend failure{}: {source}", format_context(.context))]
    Backend { source: BoxError, context: Option<Cow<'static, str>> },

    #[error("Internal fault{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl BlobError {
    pub fn key_not_found(key: impl Into<Vec<u8>>) -> Self {
        Self::KeyNotFound { key: key.into(), context: None }
    }

    pub fn key_exists(key: impl Into<Vec<u8>>) -> Self {
        Self::KeyExists { key: key.into(), context: None }
    }

    /// Wraps a transport failure, recording which operation hit it.
    pub fn backend(
        source: impl Into<BoxError>,
        context: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Backend { source: source.into(), context: Some(context.into()) }
    }

    #[must_use]
    pub const fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }

    #[must_use]
    pub const fn is_key_exists(&self) -> bool {
        matches!(self, Self::KeyExists { .. })
    }

    /// The key this error refers to, for the key-scoped variants.
    #[must_use]
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Self::KeyNotFound { key, .. } | Self::KeyExists { key, .. } => Some(key),
            _ => None,
        }
    }
}
