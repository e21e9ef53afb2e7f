use keel_derive::keel_error;
use std::borrow::Cow;

#[keel_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<std::borrow::Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

mod plain {
    use keel_derive::keel_error;
    use std::borrow::Cow;

    #[keel_error]
    #[derive(Debug, PartialEq, Eq)]
    pub enum PlainError {
        #[error("Missing{}: {name}", format_context(.context))]
        Missing { name: String, context: Option<Cow<'static, str>> },
    }
}

fn main() {
    let err = DemoError::from("boom");
    let _ = err.kind();
    let _ = plain::PlainError::Missing { name: "a".into(), context: None }.kind();
}
