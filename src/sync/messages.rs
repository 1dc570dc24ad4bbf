//! Sync message payloads exchanged between an account's devices

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Aci, CallDirection, CallType};

/// How another device names a conversation.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SyncConversation {
    Individual { peer: Aci },
    Group { group_id: Vec<u8> },
    AdHoc { room_id: Vec<u8> },
}

impl fmt::Debug for SyncConversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncConversation::Individual { peer } => write!(f, "individual({})", peer),
            SyncConversation::Group { group_id } => write!(f, "group({})", hex::encode(group_id)),
            SyncConversation::AdHoc { room_id } => write!(f, "adHoc({})", hex::encode(room_id)),
        }
    }
}

/// What happened to a call on the sending device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallEvent {
    Accepted,
    NotAccepted,
    Deleted,
    /// Ad-hoc calls only: the call is known to exist but was not joined.
    Observed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEventMessage {
    pub conversation: SyncConversation,
    pub call_id: u64,
    pub timestamp: u64,
    pub direction: CallDirection,
    pub call_type: CallType,
    pub event: CallEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallLogEvent {
    /// Every call at or before the anchor was deleted.
    Cleared,
    /// Every call at or before the anchor was read.
    MarkedAsRead,
    /// Every call in the anchor's conversation at or before it was read.
    MarkedAsReadInConversation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogAnchor {
    pub call_id: u64,
    pub conversation: SyncConversation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogMessage {
    pub event: CallLogEvent,
    pub anchor: Option<CallLogAnchor>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum OutgoingSyncMessage {
    CallEvent(CallEventMessage),
    CallLog(CallLogMessage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_call_event_json_shape() {
        let message = OutgoingSyncMessage::CallEvent(CallEventMessage {
            conversation: SyncConversation::Individual {
                peer: Uuid::from_u128(1),
            },
            call_id: 42,
            timestamp: 1_000,
            direction: CallDirection::Outgoing,
            call_type: CallType::VideoCall,
            event: CallEvent::NotAccepted,
        });

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "callEvent");
        assert_eq!(json["payload"]["callId"], 42);
        assert_eq!(json["payload"]["event"], "notAccepted");
        assert_eq!(json["payload"]["conversation"]["kind"], "individual");

        let parsed: OutgoingSyncMessage = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_conversation_debug_is_hex() {
        let group = SyncConversation::Group {
            group_id: vec![0xab, 0x01],
        };
        assert_eq!(format!("{:?}", group), "group(ab01)");
    }
}
