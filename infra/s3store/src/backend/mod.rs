//! The object-store operations a keyspace needs, behind one trait so the
//! keyspace logic runs unchanged against S3 or the in-memory store.

mod memory;
mod s3;

pub use memory::MemoryBackend;
pub use s3::{S3Backend, S3ClientOptions};

use async_trait::async_trait;
use keel_blob::BoxError;
use std::borrow::Cow;
use std::fmt;

#[keel_derive::keel_error]
pub enum BackendError {
    /// The object (or bucket) does not exist.
    #[error("Object not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A bucket with this name already exists.
    #[error("Already exists{}: {message}", format_context(.context))]
    AlreadyExists { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Object store request failed{}: {source}", format_context(.context))]
    Transport { source: BoxError, context: Option<Cow<'static, str>> },
}

impl BackendError {
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }

    pub fn transport(source: impl Into<BoxError>, context: impl Into<Cow<'static, str>>) -> Self {
        Self::Transport { source: source.into(), context: Some(context.into()) }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Metadata returned by a HEAD request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectHead {
    pub size: u64,
    /// The current version is a delete marker; the key counts as absent.
    pub delete_marker: bool,
}

/// One page request of a lexicographic listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Only names starting with this string; empty lists the whole bucket.
    pub prefix: String,
    /// Only names strictly greater than this one.
    pub start_after: Option<String>,
    /// Opaque token from the previous page.
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Object names in increasing order.
    pub keys: Vec<String>,
    /// Present when more pages follow.
    pub next_continuation: Option<String>,
}

#[async_trait]
pub trait ObjectBackend: Send + Sync + fmt::Debug {
    /// Creates `bucket` in `region`.
    ///
    /// # Errors
    /// [`BackendError::AlreadyExists`] if the bucket already exists.
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), BackendError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BackendError>;

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), BackendError>;

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead, BackendError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError>;

    async fn list_objects(&self, bucket: &str, request: ListRequest) -> Result<ListPage, BackendError>;
}
