//! Cross-device synchronization of call history
//!
//! - `messages`: payloads exchanged with the account's other devices
//! - `outgoing`: composing and (possibly deferred) sending of local changes
//! - `call_event`: reconciling another device's view of a single call
//! - `call_log`: reconciling bulk clear and mark-read events

mod call_event;
mod call_log;
mod messages;
mod outgoing;

pub use call_event::IncomingCallEventReconciler;
pub use call_log::IncomingCallLogReconciler;
pub use messages::{
    CallEvent, CallEventMessage, CallLogAnchor, CallLogEvent, CallLogMessage,
    OutgoingSyncMessage, SyncConversation,
};
pub use outgoing::{OutgoingSyncMessageComposer, ReadinessGate};
