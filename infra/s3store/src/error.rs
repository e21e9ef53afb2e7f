use crate::backend::BackendError;
use std::borrow::Cow;

#[keel_derive::keel_error]
pub enum StoreError {
    #[error("Invalid store address{}: {message}", format_context(.context))]
    InvalidAddress { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid store configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Creating or checking the bucket failed while opening the store.
    #[error("Bucket bootstrap failed{}: {source}", format_context(.context))]
    Bucket { source: BackendError, context: Option<Cow<'static, str>> },
}

impl StoreError {
    pub(crate) fn invalid_address(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidAddress { message: message.into(), context: None }
    }

    pub(crate) fn invalid_configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidConfiguration { message: message.into(), context: None }
    }
}
