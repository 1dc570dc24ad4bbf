//! Call status model and its flat integer encoding
//!
//! All three status families share one `status` column. Each family owns a
//! disjoint integer range and decoding rejects anything outside them:
//!
//! | family     | range    |
//! |------------|----------|
//! | individual | 0..=3    |
//! | group      | 4..=10   |
//! | call link  | 11..=12  |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

pub const INDIVIDUAL_RAW_RANGE: RangeInclusive<i64> = 0..=3;
pub const GROUP_RAW_RANGE: RangeInclusive<i64> = 4..=10;
pub const CALL_LINK_RAW_RANGE: RangeInclusive<i64> = 11..=12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndividualCallStatus {
    /// Signaling is in flight and the outcome is not yet known.
    Pending,
    Accepted,
    NotAccepted,
    /// An incoming call rang out without being answered anywhere.
    IncomingMissed,
}

impl IndividualCallStatus {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Accepted,
        Self::NotAccepted,
        Self::IncomingMissed,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::NotAccepted => "notAccepted",
            Self::IncomingMissed => "incomingMissed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupCallStatus {
    /// We know the call exists (e.g. from a peek) but never joined it.
    Generic,
    Joined,
    /// Someone else is ringing us right now.
    Ringing,
    RingingAccepted,
    RingingDeclined,
    RingingMissed,
    /// The ring was missed because a notification profile silenced it.
    RingingMissedNotificationProfile,
}

impl GroupCallStatus {
    pub const ALL: [Self; 7] = [
        Self::Generic,
        Self::Joined,
        Self::Ringing,
        Self::RingingAccepted,
        Self::RingingDeclined,
        Self::RingingMissed,
        Self::RingingMissedNotificationProfile,
    ];

    /// Whether this status implies a ring happened for the call.
    pub fn is_ringing_family(self) -> bool {
        match self {
            Self::Generic | Self::Joined => false,
            Self::Ringing
            | Self::RingingAccepted
            | Self::RingingDeclined
            | Self::RingingMissed
            | Self::RingingMissedNotificationProfile => true,
        }
    }

    pub fn is_missed(self) -> bool {
        matches!(
            self,
            Self::RingingMissed | Self::RingingMissedNotificationProfile
        )
    }

    fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Joined => "joined",
            Self::Ringing => "ringing",
            Self::RingingAccepted => "ringingAccepted",
            Self::RingingDeclined => "ringingDeclined",
            Self::RingingMissed => "ringingMissed",
            Self::RingingMissedNotificationProfile => "ringingMissedNotificationProfile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallLinkCallStatus {
    Generic,
    Joined,
}

impl CallLinkCallStatus {
    pub const ALL: [Self; 2] = [Self::Generic, Self::Joined];

    fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Joined => "joined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallStatus {
    Individual(IndividualCallStatus),
    Group(GroupCallStatus),
    CallLink(CallLinkCallStatus),
}

impl CallStatus {
    /// Every status across all three families, in raw-value order.
    pub const ALL: [CallStatus; 13] = [
        CallStatus::Individual(IndividualCallStatus::Pending),
        CallStatus::Individual(IndividualCallStatus::Accepted),
        CallStatus::Individual(IndividualCallStatus::NotAccepted),
        CallStatus::Individual(IndividualCallStatus::IncomingMissed),
        CallStatus::Group(GroupCallStatus::Generic),
        CallStatus::Group(GroupCallStatus::Joined),
        CallStatus::Group(GroupCallStatus::Ringing),
        CallStatus::Group(GroupCallStatus::RingingAccepted),
        CallStatus::Group(GroupCallStatus::RingingDeclined),
        CallStatus::Group(GroupCallStatus::RingingMissed),
        CallStatus::Group(GroupCallStatus::RingingMissedNotificationProfile),
        CallStatus::CallLink(CallLinkCallStatus::Generic),
        CallStatus::CallLink(CallLinkCallStatus::Joined),
    ];

    /// Statuses that leave a record unread when applied.
    pub const MISSED: [CallStatus; 3] = [
        CallStatus::Individual(IndividualCallStatus::IncomingMissed),
        CallStatus::Group(GroupCallStatus::RingingMissed),
        CallStatus::Group(GroupCallStatus::RingingMissedNotificationProfile),
    ];

    pub fn is_missed(self) -> bool {
        match self {
            CallStatus::Individual(s) => s == IndividualCallStatus::IncomingMissed,
            CallStatus::Group(s) => s.is_missed(),
            CallStatus::CallLink(_) => false,
        }
    }

    pub fn as_group(self) -> Option<GroupCallStatus> {
        match self {
            CallStatus::Group(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_raw(self) -> i64 {
        use CallLinkCallStatus as L;
        use GroupCallStatus as G;
        use IndividualCallStatus as I;

        match self {
            CallStatus::Individual(s) => match s {
                I::Pending => 0,
                I::Accepted => 1,
                I::NotAccepted => 2,
                I::IncomingMissed => 3,
            },
            CallStatus::Group(s) => match s {
                G::Generic => 4,
                G::Joined => 5,
                G::Ringing => 6,
                G::RingingAccepted => 7,
                G::RingingDeclined => 8,
                G::RingingMissed => 9,
                G::RingingMissedNotificationProfile => 10,
            },
            CallStatus::CallLink(s) => match s {
                L::Generic => 11,
                L::Joined => 12,
            },
        }
    }

    /// Decode a persisted status. Values outside the known ranges yield `None`
    /// rather than being coerced to a neighbouring status.
    pub fn from_raw(raw: i64) -> Option<Self> {
        use CallLinkCallStatus as L;
        use GroupCallStatus as G;
        use IndividualCallStatus as I;

        let status = match raw {
            0 => CallStatus::Individual(I::Pending),
            1 => CallStatus::Individual(I::Accepted),
            2 => CallStatus::Individual(I::NotAccepted),
            3 => CallStatus::Individual(I::IncomingMissed),
            4 => CallStatus::Group(G::Generic),
            5 => CallStatus::Group(G::Joined),
            6 => CallStatus::Group(G::Ringing),
            7 => CallStatus::Group(G::RingingAccepted),
            8 => CallStatus::Group(G::RingingDeclined),
            9 => CallStatus::Group(G::RingingMissed),
            10 => CallStatus::Group(G::RingingMissedNotificationProfile),
            11 => CallStatus::CallLink(L::Generic),
            12 => CallStatus::CallLink(L::Joined),
            _ => return None,
        };
        Some(status)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStatus::Individual(s) => write!(f, "individual.{}", s.name()),
            CallStatus::Group(s) => write!(f, "group.{}", s.name()),
            CallStatus::CallLink(s) => write!(f, "callLink.{}", s.name()),
        }
    }
}

impl FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallStatus::ALL
            .into_iter()
            .find(|status| status.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown call status: {}", s))
    }
}
