use keel_derive::keel_error;

#[keel_error]
pub enum FetchError {
    Fetch(std::io::Error),
}

fn main() {}
