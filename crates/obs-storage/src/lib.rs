//! OBS Storage - Buckets and objects on the local filesystem.
//!
//! Each bucket is a directory under a configured root. Creating a bucket
//! issues a stateless credential; every later call presents that credential
//! and is checked against the privilege its operation requires:
//!
//! | Operation        | Requires |
//! |------------------|----------|
//! | create / head    | nothing  |
//! | get object       | `read`   |
//! | sign object      | `read`   |
//! | get signed path  | a valid path signature |
//! | put new object   | `write`  |
//! | overwrite object | `update` |
//! | delete object    | `delete` |
//! | delete bucket    | `delete` |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use obs_credentials::PrivilegeLevel;
//! use obs_crypto::MasterSecret;
//! use obs_storage::{BucketStore, CreateBucket, SimpleBucket};
//!
//! # async fn run() -> obs_storage::StorageResult<()> {
//! let secret = Arc::new(MasterSecret::generate().map_err(obs_credentials::CredentialError::from)?);
//! let store = BucketStore::new("/srv/obs", secret);
//!
//! let creds = store
//!     .create_bucket(&CreateBucket {
//!         bucket_name: "photos".into(),
//!         action: vec![PrivilegeLevel::Write],
//!     })
//!     .await?;
//!
//! let bucket = SimpleBucket {
//!     bucket_name: "photos".into(),
//!     ak: creds.ak,
//!     sk: creds.sk,
//! };
//! store.put_object(&bucket, "cat.jpg", b"...").await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod model;
mod name;
mod operation;
mod path;
mod store;

pub use error::{StorageError, StorageResult};
pub use model::{BucketInfo, CreateBucket, FileTarget, PutOutcome, SimpleBucket};
pub use name::{BucketName, MAX_BUCKET_NAME_LEN, MIN_BUCKET_NAME_LEN};
pub use operation::Operation;
pub use path::resolve_object_path;
pub use store::BucketStore;
