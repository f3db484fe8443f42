//! Request and response bodies exchanged with the API layer.

use chrono::{DateTime, Utc};
use obs_credentials::PrivilegeLevel;
use serde::{Deserialize, Serialize};

/// Body of a bucket creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucket {
    /// Name of the bucket to create.
    pub bucket_name: String,
    /// Actions the returned credential should grant.
    pub action: Vec<PrivilegeLevel>,
}

/// A bucket name plus the credential presented for it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleBucket {
    /// Target bucket.
    pub bucket_name: String,
    /// Access key.
    pub ak: String,
    /// Secret key.
    pub sk: String,
}

impl std::fmt::Debug for SimpleBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleBucket")
            .field("bucket_name", &self.bucket_name)
            .field("ak", &self.ak)
            .field("sk", &"***")
            .finish()
    }
}

/// Result of a bucket head request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Bucket name.
    pub name: String,
    /// Modification time of the bucket directory.
    pub last_modified: DateTime<Utc>,
}

/// A signed path to one object, usable in place of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTarget {
    /// Object key followed by its signature.
    pub path: String,
}

/// Whether an upload created a new object or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PutOutcome {
    /// The key did not exist before.
    Created,
    /// An existing object was replaced.
    Overwritten,
}
