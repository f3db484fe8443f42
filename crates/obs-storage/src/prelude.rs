//! Prelude module - commonly used types for convenient import.
//!
//! Use `use obs_storage::prelude::*;` to import all essential types.

// Errors
pub use crate::{StorageError, StorageResult};

// Store
pub use crate::{BucketName, BucketStore, Operation};

// Request and response models
pub use crate::{BucketInfo, CreateBucket, FileTarget, PutOutcome, SimpleBucket};
