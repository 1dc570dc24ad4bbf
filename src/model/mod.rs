//! Call record data model
//!
//! A `CallRecord` is the durable status entry for one call. A
//! `DeletedCallRecord` is the tombstone left behind when one is deleted.

mod status;

pub use status::{
    CallLinkCallStatus, CallStatus, GroupCallStatus, IndividualCallStatus, CALL_LINK_RAW_RANGE,
    GROUP_RAW_RANGE, INDIVIDUAL_RAW_RANGE,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account identity of another participant.
pub type Aci = Uuid;

/// Milliseconds since the epoch on this device.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Local conversation a call belongs to. Thread and call-link row ids are
/// disjoint address spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationId {
    Thread(i64),
    CallLink(i64),
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationId::Thread(id) => write!(f, "thread:{}", id),
            ConversationId::CallLink(id) => write!(f, "link:{}", id),
        }
    }
}

impl FromStr for ConversationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected thread:<id> or link:<id>, got {}", s))?;
        let id: i64 = id
            .parse()
            .map_err(|_| format!("invalid conversation row id: {}", id))?;
        match kind {
            "thread" => Ok(ConversationId::Thread(id)),
            "link" => Ok(ConversationId::CallLink(id)),
            _ => Err(format!("unknown conversation kind: {}", kind)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallType {
    AudioCall,
    VideoCall,
    GroupCall,
    AdHocCall,
}

impl CallType {
    pub fn to_raw(self) -> i64 {
        match self {
            CallType::AudioCall => 0,
            CallType::VideoCall => 1,
            CallType::GroupCall => 2,
            CallType::AdHocCall => 3,
        }
    }

    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(CallType::AudioCall),
            1 => Some(CallType::VideoCall),
            2 => Some(CallType::GroupCall),
            3 => Some(CallType::AdHocCall),
            _ => None,
        }
    }

    /// Whether `status` belongs to the status family of this call type.
    pub fn accepts(self, status: CallStatus) -> bool {
        matches!(
            (self, status),
            (CallType::AudioCall | CallType::VideoCall, CallStatus::Individual(_))
                | (CallType::GroupCall, CallStatus::Group(_))
                | (CallType::AdHocCall, CallStatus::CallLink(_))
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

impl CallDirection {
    pub fn to_raw(self) -> i64 {
        match self {
            CallDirection::Incoming => 0,
            CallDirection::Outgoing => 1,
        }
    }

    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(CallDirection::Incoming),
            1 => Some(CallDirection::Outgoing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallUnreadStatus {
    Read,
    Unread,
}

impl CallUnreadStatus {
    /// Missed calls start out unread, everything else is read.
    pub fn for_status(status: CallStatus) -> Self {
        if status.is_missed() {
            CallUnreadStatus::Unread
        } else {
            CallUnreadStatus::Read
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            CallUnreadStatus::Read => 0,
            CallUnreadStatus::Unread => 1,
        }
    }

    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(CallUnreadStatus::Read),
            1 => Some(CallUnreadStatus::Unread),
            _ => None,
        }
    }
}

/// Identity of a call on this device: unique per `(call_id, conversation_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallRecordId {
    pub call_id: u64,
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Storage row id, assigned on insert.
    pub id: i64,
    pub call_id: u64,
    pub conversation_id: ConversationId,
    /// Row id of the timeline entry mirroring this call.
    pub interaction_row_id: i64,
    pub call_type: CallType,
    pub call_direction: CallDirection,
    pub call_status: CallStatus,
    pub unread_status: CallUnreadStatus,
    pub call_began_timestamp: u64,
    pub call_ended_timestamp: Option<u64>,
    /// Who rang us, for incoming ringing-family group calls.
    pub group_call_ringer_aci: Option<Aci>,
}

impl CallRecord {
    pub fn identifier(&self) -> CallRecordId {
        CallRecordId {
            call_id: self.call_id,
            conversation_id: self.conversation_id,
        }
    }
}

/// A call record that has not been inserted yet.
#[derive(Debug, Clone)]
pub struct NewCallRecord {
    pub call_id: u64,
    pub conversation_id: ConversationId,
    pub interaction_row_id: i64,
    pub call_type: CallType,
    pub call_direction: CallDirection,
    pub call_status: CallStatus,
    pub call_began_timestamp: u64,
    pub group_call_ringer_aci: Option<Aci>,
}

/// Tombstone for a deleted call. Its presence blocks the call from being
/// recreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedCallRecord {
    pub call_id: u64,
    pub conversation_id: ConversationId,
    pub deleted_at_timestamp: u64,
}

impl DeletedCallRecord {
    pub fn new(call_id: u64, conversation_id: ConversationId, deleted_at_timestamp: u64) -> Self {
        Self {
            call_id,
            conversation_id,
            deleted_at_timestamp,
        }
    }
}
