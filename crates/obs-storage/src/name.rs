//! Bucket naming rules.

use std::fmt;

use crate::error::{StorageError, StorageResult};

/// Shortest allowed bucket name.
pub const MIN_BUCKET_NAME_LEN: usize = 3;

/// Longest allowed bucket name.
pub const MAX_BUCKET_NAME_LEN: usize = 63;

/// A bucket name that is safe to use as a single directory component.
///
/// 3 to 63 bytes of lowercase ASCII letters, digits, `-` and `.`, starting
/// and ending with a letter or digit, with no `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(String);

impl BucketName {
    /// Validate `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidBucketName`] naming the broken rule.
    pub fn parse(name: &str) -> StorageResult<Self> {
        let invalid = |reason| StorageError::InvalidBucketName {
            name: name.to_owned(),
            reason,
        };

        if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&name.len()) {
            return Err(invalid("must be between 3 and 63 characters"));
        }
        if !name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
        {
            return Err(invalid(
                "may only contain lowercase letters, digits, '-' and '.'",
            ));
        }
        let alnum = |b: Option<&u8>| b.is_some_and(u8::is_ascii_alphanumeric);
        if !alnum(name.as_bytes().first()) || !alnum(name.as_bytes().last()) {
            return Err(invalid("must start and end with a letter or digit"));
        }
        if name.contains("..") {
            return Err(invalid("must not contain '..'"));
        }

        Ok(Self(name.to_owned()))
    }

    /// The validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
