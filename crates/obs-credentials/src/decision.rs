//! Allow/deny decisions over verified privilege sets.
//!
//! Higher levels subsume lower ones: a credential holding `Delete` passes
//! `Read`, `Write` and `Update` checks as well. Which level an operation
//! requires is decided by the caller.

use crate::error::{CredentialError, CredentialResult};
use crate::privilege::{PrivilegeLevel, PrivilegeSet};

/// Whether `granted` authorizes an operation that requires `required`.
///
/// An empty set authorizes nothing.
#[must_use]
pub fn authorize(granted: PrivilegeSet, required: PrivilegeLevel) -> bool {
    granted.has_at_least(required)
}

/// Like [`authorize`], but as a result.
///
/// # Errors
///
/// Returns [`CredentialError::InsufficientPrivilege`] when denied.
pub fn require(granted: PrivilegeSet, required: PrivilegeLevel) -> CredentialResult<()> {
    AccessDecision::evaluate(granted, required).into_result(granted)
}

/// Outcome of checking a privilege set against a required level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The operation may proceed.
    Allow,
    /// The operation is refused.
    Deny {
        /// Level the operation needed.
        required: PrivilegeLevel,
    },
}

impl AccessDecision {
    /// Evaluate `granted` against `required`.
    #[must_use]
    pub fn evaluate(granted: PrivilegeSet, required: PrivilegeLevel) -> Self {
        if authorize(granted, required) {
            Self::Allow
        } else {
            Self::Deny { required }
        }
    }

    /// Check if this decision allows the operation.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert into a result, reporting `granted` on denial.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InsufficientPrivilege`] for [`Self::Deny`].
    pub fn into_result(self, granted: PrivilegeSet) -> CredentialResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny { required } => {
                Err(CredentialError::InsufficientPrivilege { required, granted })
            },
        }
    }
}
