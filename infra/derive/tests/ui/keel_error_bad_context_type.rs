use keel_derive::keel_error;

#[keel_error]
pub enum FetchError {
    #[error("fetch failed: {source}")]
    Fetch { source: std::io::Error, context: Option<String> },
}

fn main() {}
