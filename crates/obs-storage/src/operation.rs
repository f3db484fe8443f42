//! Static table of which privilege each storage operation needs.

use std::fmt;

use obs_credentials::PrivilegeLevel;

/// A storage operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a bucket and issue its first credential.
    CreateBucket,
    /// Check that a bucket exists.
    HeadBucket,
    /// Remove a bucket and everything in it.
    DeleteBucket,
    /// Upload an object under a new key.
    PutObject,
    /// Upload an object over an existing key.
    OverwriteObject,
    /// Download an object.
    GetObject,
    /// Remove an object.
    DeleteObject,
    /// Hand out a signed path to an object.
    SignObject,
    /// Download an object through a signed path.
    GetSignedObject,
}

impl Operation {
    /// Level a credential must hold, or `None` for operations that take no
    /// credential. A signed path download is authenticated by the path's own
    /// signature instead.
    #[must_use]
    pub const fn required_level(self) -> Option<PrivilegeLevel> {
        match self {
            Self::CreateBucket | Self::HeadBucket | Self::GetSignedObject => None,
            Self::GetObject | Self::SignObject => Some(PrivilegeLevel::Read),
            Self::PutObject => Some(PrivilegeLevel::Write),
            Self::OverwriteObject => Some(PrivilegeLevel::Update),
            Self::DeleteBucket | Self::DeleteObject => Some(PrivilegeLevel::Delete),
        }
    }

    /// Name used in logs and spans.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateBucket => "create_bucket",
            Self::HeadBucket => "head_bucket",
            Self::DeleteBucket => "delete_bucket",
            Self::PutObject => "put_object",
            Self::OverwriteObject => "overwrite_object",
            Self::GetObject => "get_object",
            Self::DeleteObject => "delete_object",
            Self::SignObject => "sign_object",
            Self::GetSignedObject => "get_signed_object",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_levels() {
        assert_eq!(Operation::HeadBucket.required_level(), None);
        assert_eq!(
            Operation::DeleteBucket.required_level(),
            Some(PrivilegeLevel::Delete)
        );
        assert_eq!(
            Operation::GetObject.required_level(),
            Some(PrivilegeLevel::Read)
        );
        assert_eq!(
            Operation::SignObject.required_level(),
            Operation::GetObject.required_level()
        );
        assert_eq!(Operation::GetSignedObject.required_level(), None);
        assert!(
            Operation::OverwriteObject.required_level() > Operation::PutObject.required_level()
        );
    }
}
