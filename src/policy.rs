//! Status transition rules
//!
//! Each status family is its own state machine and every `(from, to)` pair
//! has a defined outcome. Group calls can additionally substitute a
//! different target: joining a call we know rang is recorded as
//! `RingingAccepted` so the ring is never forgotten.

use crate::model::{CallLinkCallStatus, CallStatus, GroupCallStatus, IndividualCallStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Allowed,
    NotAllowed,
    PreferAlternate(CallStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTransition {
    Allowed,
    NotAllowed,
    PreferAlternate(GroupCallStatus),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CallStatusPolicy;

impl CallStatusPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Outcome of moving a record from `from` to `to`. Statuses from
    /// different families are never interchangeable.
    pub fn transition(&self, from: CallStatus, to: CallStatus) -> TransitionOutcome {
        match (from, to) {
            (CallStatus::Individual(from), CallStatus::Individual(to)) => {
                if self.individual_transition_allowed(from, to) {
                    TransitionOutcome::Allowed
                } else {
                    TransitionOutcome::NotAllowed
                }
            }
            (CallStatus::Group(from), CallStatus::Group(to)) => {
                match self.group_transition(from, to) {
                    GroupTransition::Allowed => TransitionOutcome::Allowed,
                    GroupTransition::NotAllowed => TransitionOutcome::NotAllowed,
                    GroupTransition::PreferAlternate(status) => {
                        TransitionOutcome::PreferAlternate(CallStatus::Group(status))
                    }
                }
            }
            (CallStatus::CallLink(from), CallStatus::CallLink(to)) => {
                if self.call_link_transition_allowed(from, to) {
                    TransitionOutcome::Allowed
                } else {
                    TransitionOutcome::NotAllowed
                }
            }
            _ => TransitionOutcome::NotAllowed,
        }
    }

    /// Pending moves anywhere else; terminal statuses only move up in
    /// priority (`Accepted > NotAccepted > IncomingMissed`).
    pub fn individual_transition_allowed(
        &self,
        from: IndividualCallStatus,
        to: IndividualCallStatus,
    ) -> bool {
        use IndividualCallStatus::*;

        match (from, to) {
            (Pending, Pending) => false,
            (Pending, _) => true,
            (_, Pending) => false,
            (from, to) => individual_priority(to) > individual_priority(from),
        }
    }

    pub fn group_transition(&self, from: GroupCallStatus, to: GroupCallStatus) -> GroupTransition {
        use GroupCallStatus::*;
        use GroupTransition::{Allowed, NotAllowed, PreferAlternate};

        match from {
            Generic => match to {
                Generic => NotAllowed,
                Joined
                | Ringing
                | RingingAccepted
                | RingingDeclined
                | RingingMissed
                | RingingMissedNotificationProfile => Allowed,
            },
            Joined => match to {
                Generic | Joined => NotAllowed,
                RingingAccepted => Allowed,
                // We joined, so whatever ring raced with the join was accepted.
                Ringing | RingingDeclined | RingingMissed | RingingMissedNotificationProfile => {
                    PreferAlternate(RingingAccepted)
                }
            },
            Ringing => match to {
                Generic | Ringing => NotAllowed,
                Joined => PreferAlternate(RingingAccepted),
                RingingAccepted
                | RingingDeclined
                | RingingMissed
                | RingingMissedNotificationProfile => Allowed,
            },
            RingingAccepted => NotAllowed,
            RingingDeclined => match to {
                Joined => PreferAlternate(RingingAccepted),
                RingingAccepted => Allowed,
                Generic
                | Ringing
                | RingingDeclined
                | RingingMissed
                | RingingMissedNotificationProfile => NotAllowed,
            },
            RingingMissed | RingingMissedNotificationProfile => match to {
                Joined => PreferAlternate(RingingAccepted),
                RingingAccepted | RingingDeclined => Allowed,
                Generic | Ringing | RingingMissed | RingingMissedNotificationProfile => {
                    NotAllowed
                }
            },
        }
    }

    pub fn call_link_transition_allowed(
        &self,
        from: CallLinkCallStatus,
        to: CallLinkCallStatus,
    ) -> bool {
        matches!(
            (from, to),
            (CallLinkCallStatus::Generic, CallLinkCallStatus::Joined)
        )
    }
}

fn individual_priority(status: IndividualCallStatus) -> u8 {
    match status {
        IndividualCallStatus::Pending => 0,
        IndividualCallStatus::IncomingMissed => 1,
        IndividualCallStatus::NotAccepted => 2,
        IndividualCallStatus::Accepted => 3,
    }
}
