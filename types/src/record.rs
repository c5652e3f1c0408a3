use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

/// One delimiter-bounded byte sequence, delimiter stripped.
///
/// Every record owns its own allocation; a producer never touches a record
/// again after handing it to the queue. Zero-length records are valid and
/// come from two adjacent delimiters.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Record(Vec<u8>);

impl Record {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// UTF-8 view, replacing invalid sequences with U+FFFD.
    #[must_use]
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl Deref for Record {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Record {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Record {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<&str> for Record {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<Record> for Vec<u8> {
    fn from(value: Record) -> Self {
        value.0
    }
}

// Payloads are arbitrary bytes; show them escaped rather than as a number list.
impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record(b\"{}\")", self.0.escape_ascii())
    }
}
