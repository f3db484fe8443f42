//! Sub-command implementations.

pub(crate) mod bucket;
pub(crate) mod keys;
pub(crate) mod object;
pub(crate) mod token;

use obs_storage::StorageError;

use crate::theme::Theme;

/// Turn a storage failure into a user-facing error.
///
/// Full detail goes to the debug log; the message shown is the public one,
/// so a forged key and a garbled one read the same.
pub(crate) fn storage_failure(err: StorageError) -> anyhow::Error {
    tracing::debug!(error = %err, status = err.status_code(), "storage operation failed");
    anyhow::anyhow!(Theme::error(&err.public_message()))
}
