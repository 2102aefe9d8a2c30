//! Image identifiers.
//!
//! The identifier is the filename stem of every file an image produces, so
//! it is validated up front: ASCII letters, digits, `-` and `_`, at most
//! [`MAX_ID_LEN`] bytes.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_ID_LEN: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid image id {0:?}: expected 1-128 ASCII letters, digits, '-' or '_'")]
pub struct InvalidId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidId> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= MAX_ID_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid { Ok(Self(id)) } else { Err(InvalidId(id)) }
    }

    /// A fresh random (v4) UUID in hyphenated form.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ImageId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
