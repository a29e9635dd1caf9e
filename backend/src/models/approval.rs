//! Approval workflow shared by donors and donation requests.
//!
//! A record starts [`ApprovalState::Pending`] and can only move forward to
//! [`ApprovalState::Approved`]. Rejection is not a state: a rejected record
//! is deleted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    #[default]
    Pending,
    Approved,
}

/// Raised when an update tries to move an approved record back to pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("an approved record cannot be moved back to pending")]
pub struct ApprovalTransitionError;

impl ApprovalState {
    pub fn from_flag(is_approved: bool) -> Self {
        if is_approved {
            ApprovalState::Approved
        } else {
            ApprovalState::Pending
        }
    }

    pub fn is_approved(self) -> bool {
        self == ApprovalState::Approved
    }

    /// Resolve a requested `isApproved` value against the current state.
    ///
    /// Approving is always allowed (and idempotent). Asking for pending is a
    /// no-op on a pending record and an error on an approved one.
    pub fn transition(self, requested: bool) -> Result<ApprovalState, ApprovalTransitionError> {
        match (self, requested) {
            (_, true) => Ok(ApprovalState::Approved),
            (ApprovalState::Pending, false) => Ok(ApprovalState::Pending),
            (ApprovalState::Approved, false) => Err(ApprovalTransitionError),
        }
    }
}

/// Records gated by the approval workflow.
pub trait Approvable {
    fn approval(&self) -> ApprovalState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_can_be_approved() {
        assert_eq!(
            ApprovalState::Pending.transition(true),
            Ok(ApprovalState::Approved)
        );
    }

    #[test]
    fn test_approve_is_idempotent() {
        assert_eq!(
            ApprovalState::Approved.transition(true),
            Ok(ApprovalState::Approved)
        );
    }

    #[test]
    fn test_no_way_back_to_pending() {
        assert_eq!(
            ApprovalState::Approved.transition(false),
            Err(ApprovalTransitionError)
        );
        assert_eq!(
            ApprovalState::Pending.transition(false),
            Ok(ApprovalState::Pending)
        );
    }

    #[test]
    fn test_flag_mapping() {
        assert!(ApprovalState::from_flag(true).is_approved());
        assert!(!ApprovalState::from_flag(false).is_approved());
        assert_eq!(ApprovalState::default(), ApprovalState::Pending);
    }
}
