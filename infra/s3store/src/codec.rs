use std::borrow::Cow;

/// Hex digits of the key that become the shard directory.
pub const DEFAULT_SHARD_WIDTH: usize = 3;

/// Widest shard directory a store accepts; wider layouts push object names
/// toward the 1024-byte S3 key limit.
pub const MAX_SHARD_WIDTH: usize = 64;

const SEPARATOR: char = '/';
const FILLER: char = '-';
const CHILD_MARK: char = '_';

#[keel_derive::keel_error]
#[derive(PartialEq, Eq)]
pub enum KeyCodecError {
    /// The object name was not produced by this codec.
    #[error("Foreign object name{}: {path}", format_context(.context))]
    ForeignKey { path: String, context: Option<Cow<'static, str>> },
}

impl KeyCodecError {
    fn foreign(path: &str) -> Self {
        Self::ForeignKey { path: path.to_owned(), context: None }
    }

    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        matches!(self, Self::ForeignKey { .. })
    }
}

/// Maps byte keys to object names below a prefix and back.
///
/// A key is written as lowercase hex and split into a fixed-width shard
/// directory and a tail: with prefix `p` and width 3, the key `a` (`61`)
/// becomes `p/61-/-` and `abc` (`616263`) becomes `p/616/263`. Short keys pad
/// the shard with `-`, and an empty tail is written as `-`. Since `-` sorts
/// before every hex digit, object names sort exactly like the keys they encode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCodec {
    prefix: String,
    shard_width: usize,
}

impl KeyCodec {
    #[must_use]
    pub fn new(prefix: impl AsRef<str>, shard_width: usize) -> Self {
        Self { prefix: clean_prefix(prefix.as_ref()), shard_width }
    }

    /// The same layout rooted at another prefix.
    #[must_use]
    pub fn with_prefix(&self, prefix: impl AsRef<str>) -> Self {
        Self::new(prefix, self.shard_width)
    }

    /// The layout of the child namespace `name`: `<prefix>/_<hex(name)>`.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let segment = format!("{CHILD_MARK}{}", hex::encode(name));
        if self.prefix.is_empty() {
            self.with_prefix(segment)
        } else {
            self.with_prefix(format!("{}{SEPARATOR}{segment}", self.prefix))
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub const fn shard_width(&self) -> usize {
        self.shard_width
    }

    /// The listing prefix covering every object name this codec produces.
    #[must_use]
    pub fn list_prefix(&self) -> String {
        if self.prefix.is_empty() { String::new() } else { format!("{}{SEPARATOR}", self.prefix) }
    }

    #[must_use]
    pub fn encode(&self, key: &[u8]) -> String {
        let digits = hex::encode(key);
        let mut path = String::with_capacity(self.prefix.len() + digits.len() + self.shard_width + 3);
        if !self.prefix.is_empty() {
            path.push_str(&self.prefix);
            path.push(SEPARATOR);
        }

        if self.shard_width > 0 {
            let split = digits.len().min(self.shard_width);
            let (shard, tail) = digits.split_at(split);
            path.push_str(shard);
            path.extend(std::iter::repeat_n(FILLER, self.shard_width - split));
            path.push(SEPARATOR);
            push_segment(&mut path, tail);
        } else {
            push_segment(&mut path, &digits);
        }
        path
    }

    /// Recovers the key behind `path`.
    ///
    /// # Errors
    /// [`KeyCodecError::ForeignKey`] for any name [`encode`](Self::encode) would
    /// not have produced, including names that only differ in letter case.
    pub fn decode(&self, path: &str) -> Result<Vec<u8>, KeyCodecError> {
        let rest = if self.prefix.is_empty() {
            path
        } else {
            path.strip_prefix(self.prefix.as_str())
                .and_then(|rest| rest.strip_prefix(SEPARATOR))
                .ok_or_else(|| KeyCodecError::foreign(path))?
        };

        let digits: Cow<'_, str> = if self.shard_width == 0 {
            Cow::Borrowed(segment_digits(rest))
        } else {
            let (shard, tail) =
                rest.split_once(SEPARATOR).ok_or_else(|| KeyCodecError::foreign(path))?;
            if shard.len() != self.shard_width {
                return Err(KeyCodecError::foreign(path));
            }
            let shard = shard.trim_end_matches(FILLER);
            Cow::Owned(format!("{shard}{}", segment_digits(tail)))
        };

        let key = hex::decode(digits.as_ref()).map_err(|_| KeyCodecError::foreign(path))?;
        if key.is_empty() || self.encode(&key) != path {
            return Err(KeyCodecError::foreign(path));
        }
        Ok(key)
    }
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new("", DEFAULT_SHARD_WIDTH)
    }
}

fn push_segment(path: &mut String, digits: &str) {
    if digits.is_empty() {
        path.push(FILLER);
    } else {
        path.push_str(digits);
    }
}

fn segment_digits(segment: &str) -> &str {
    if segment.len() == 1 && segment.starts_with(FILLER) { "" } else { segment }
}

fn clean_prefix(prefix: &str) -> String {
    prefix.split(SEPARATOR).filter(|part| !part.is_empty()).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> KeyCodec {
        KeyCodec::new("p", 3)
    }

    #[test]
    fn encodes_with_shard_and_tail() {
        let codec = codec();
        assert_eq!(codec.encode(b"a"), "p/61-/-");
        assert_eq!(codec.encode(b"ab"), "p/616/2");
        assert_eq!(codec.encode(b"abc"), "p/616/263");
    }

    #[test]
    fn empty_prefix_omits_the_leading_segment() {
        let codec = KeyCodec::new("", 3);
        assert_eq!(codec.encode(b"ab"), "616/2");
        assert_eq!(codec.decode("616/2").unwrap(), b"ab");
        assert_eq!(codec.list_prefix(), "");
    }

    #[test]
    fn zero_width_writes_bare_hex() {
        let codec = KeyCodec::new("root", 0);
        assert_eq!(codec.encode(b"ab"), "root/6162");
        assert_eq!(codec.decode("root/6162").unwrap(), b"ab");
    }

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(KeyCodec::new("/a//b/", 3).prefix(), "a/b");
    }

    #[test]
    fn child_prefix_is_hex_of_name() {
        let child = codec().child("team-a");
        assert_eq!(child.prefix(), "p/_7465616d2d61");
        assert_eq!(KeyCodec::new("", 3).child("x").prefix(), "_78");
    }

    #[test]
    fn decode_rejects_other_layouts() {
        let codec = codec();
        for path in [
            "q/616/2",
            "p/616",
            "p/61/2",
            "p/616/2/3",
            "p/616/zz",
            "p/616/26",
            "p/616/-",
            "p/61-/2",
            "p/---/-",
            "p/616/2A",
            "p/616/",
            "p/_7465616d2d61/616/2",
        ] {
            let err = codec.decode(path).unwrap_err();
            assert!(err.is_foreign_key(), "{path} should be foreign");
        }
    }

    #[test]
    fn padded_shard_round_trips() {
        let codec = codec();
        let path = codec.encode(&[0x00]);
        assert_eq!(path, "p/00-/-");
        assert_eq!(codec.decode(&path).unwrap(), [0x00]);
    }

    #[test]
    fn foreign_error_names_the_path() {
        let err = codec().decode("elsewhere").unwrap_err();
        assert_eq!(err.to_string(), "Foreign object name: elsewhere");
    }
}
