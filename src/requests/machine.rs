//! The request lifecycle in one place. Every status mutation goes through
//! [`transition`], so the guards for responding and cancelling cannot drift
//! apart between handlers.

use super::repo_types::RequestStatus;
use thiserror::Error;

/// The caller's relationship to the request record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    Sender,
    Receiver,
    /// Neither party of the request.
    Stranger,
}

impl CallerRole {
    pub fn of(caller: uuid::Uuid, sender_id: uuid::Uuid, receiver_id: uuid::Uuid) -> Self {
        if caller == sender_id {
            CallerRole::Sender
        } else if caller == receiver_id {
            CallerRole::Receiver
        } else {
            CallerRole::Stranger
        }
    }
}

/// Status-mutating operations on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    /// Receiver accepts or rejects a pending request.
    Respond(RequestStatus),
    /// Sender withdraws a pending request; lands on `rejected`.
    Cancel,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Status must be either 'accepted' or 'rejected'")]
    InvalidResponseStatus,
    #[error("Request must be in pending status to respond")]
    RespondNotPending,
    #[error("Only the receiver of this request can respond to it")]
    NotReceiver,
    #[error("Only pending requests can be cancelled")]
    CancelNotPending,
    #[error("Only the sender of a request can cancel it")]
    NotSender,
}

impl TransitionError {
    /// Role violations get a generic "not permitted" response; state
    /// violations are surfaced verbatim.
    pub fn is_authorization(&self) -> bool {
        matches!(self, TransitionError::NotReceiver | TransitionError::NotSender)
    }
}

/// Apply `action` by `role` to a request currently in `current`. Returns the
/// next status or the first violated guard; the caller writes the record only
/// on success.
pub fn transition(
    current: RequestStatus,
    role: CallerRole,
    action: RequestAction,
) -> Result<RequestStatus, TransitionError> {
    match action {
        RequestAction::Respond(target) => {
            if !matches!(target, RequestStatus::Accepted | RequestStatus::Rejected) {
                return Err(TransitionError::InvalidResponseStatus);
            }
            if current != RequestStatus::Pending {
                return Err(TransitionError::RespondNotPending);
            }
            if role != CallerRole::Receiver {
                return Err(TransitionError::NotReceiver);
            }
            Ok(target)
        }
        RequestAction::Cancel => {
            if current != RequestStatus::Pending {
                return Err(TransitionError::CancelNotPending);
            }
            if role != CallerRole::Sender {
                return Err(TransitionError::NotSender);
            }
            Ok(RequestStatus::Rejected)
        }
    }
}

#[cfg(test)]
mod transition_tests {
    use super::*;
    use RequestStatus::{Accepted, Pending, Rejected};

    #[test]
    fn receiver_accepts_pending() {
        assert_eq!(
            transition(Pending, CallerRole::Receiver, RequestAction::Respond(Accepted)),
            Ok(Accepted)
        );
    }

    #[test]
    fn receiver_rejects_pending() {
        assert_eq!(
            transition(Pending, CallerRole::Receiver, RequestAction::Respond(Rejected)),
            Ok(Rejected)
        );
    }

    #[test]
    fn respond_rejects_pending_as_target() {
        assert_eq!(
            transition(Pending, CallerRole::Receiver, RequestAction::Respond(Pending)),
            Err(TransitionError::InvalidResponseStatus)
        );
    }

    #[test]
    fn respond_requires_pending_state() {
        for terminal in [Accepted, Rejected] {
            assert_eq!(
                transition(terminal, CallerRole::Receiver, RequestAction::Respond(Accepted)),
                Err(TransitionError::RespondNotPending)
            );
        }
    }

    #[test]
    fn sender_and_stranger_cannot_respond() {
        for role in [CallerRole::Sender, CallerRole::Stranger] {
            assert_eq!(
                transition(Pending, role, RequestAction::Respond(Accepted)),
                Err(TransitionError::NotReceiver)
            );
        }
    }

    #[test]
    fn sender_cancels_pending_to_rejected() {
        assert_eq!(
            transition(Pending, CallerRole::Sender, RequestAction::Cancel),
            Ok(Rejected)
        );
    }

    #[test]
    fn cancel_requires_pending_state() {
        for terminal in [Accepted, Rejected] {
            assert_eq!(
                transition(terminal, CallerRole::Sender, RequestAction::Cancel),
                Err(TransitionError::CancelNotPending)
            );
        }
    }

    #[test]
    fn receiver_and_stranger_cannot_cancel() {
        for role in [CallerRole::Receiver, CallerRole::Stranger] {
            assert_eq!(
                transition(Pending, role, RequestAction::Cancel),
                Err(TransitionError::NotSender)
            );
        }
    }

    #[test]
    fn role_errors_are_authorization_errors() {
        assert!(TransitionError::NotReceiver.is_authorization());
        assert!(TransitionError::NotSender.is_authorization());
        assert!(!TransitionError::RespondNotPending.is_authorization());
        assert!(!TransitionError::InvalidResponseStatus.is_authorization());
        assert!(!TransitionError::CancelNotPending.is_authorization());
    }

    #[test]
    fn caller_role_classification() {
        let sender = uuid::Uuid::new_v4();
        let receiver = uuid::Uuid::new_v4();
        let other = uuid::Uuid::new_v4();
        assert_eq!(CallerRole::of(sender, sender, receiver), CallerRole::Sender);
        assert_eq!(CallerRole::of(receiver, sender, receiver), CallerRole::Receiver);
        assert_eq!(CallerRole::of(other, sender, receiver), CallerRole::Stranger);
    }
}
