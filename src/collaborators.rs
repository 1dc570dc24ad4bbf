//! Interfaces to the systems that surround the call history
//!
//! The messaging host owns conversations, the timeline entries that mirror
//! calls, and the transport to the account's other devices. The engine only
//! talks to them through the traits below.

use std::sync::Arc;
use tracing::debug;

use crate::db::{DbWriteTx, ReadTx};
use crate::error::{CallRecordError, Result};
use crate::model::{CallDirection, CallStatus, CallType, ConversationId};
use crate::sync::{OutgoingSyncMessage, ReadinessGate, SyncConversation};

/// Maps wire-level conversation identifiers to local conversations and back.
pub trait ConversationResolver: Send + Sync {
    /// `None` when this device has no matching conversation.
    fn resolve(
        &self,
        conversation: &SyncConversation,
        tx: &dyn ReadTx,
    ) -> Result<Option<ConversationId>>;

    /// The identifier other devices know `conversation_id` by.
    fn sync_conversation(
        &self,
        conversation_id: ConversationId,
        tx: &dyn ReadTx,
    ) -> Result<Option<SyncConversation>>;
}

/// What the timeline owner needs to render a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEntry {
    pub conversation_id: ConversationId,
    pub call_type: CallType,
    pub call_direction: CallDirection,
    pub call_status: CallStatus,
    pub timestamp: u64,
}

/// Owner of the conversation timeline entries mirroring each call.
pub trait TimelineEntryOwner: Send + Sync {
    /// Create the entry and return its row id.
    fn insert_call_entry(&self, entry: &CallEntry, tx: &DbWriteTx<'_>) -> Result<i64>;

    fn update_call_entry(
        &self,
        interaction_row_id: i64,
        direction: CallDirection,
        status: CallStatus,
        tx: &DbWriteTx<'_>,
    ) -> Result<()>;

    fn delete_call_entry(&self, interaction_row_id: i64, tx: &DbWriteTx<'_>) -> Result<()>;

    /// A linked device handled the call: mark the entry and everything
    /// before it in the conversation as read.
    fn mark_read_for_sync(
        &self,
        interaction_row_id: i64,
        sync_message_timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()>;
}

/// Delivers sync messages to the account's other devices. Fire-and-forget:
/// delivery and retries are the transport's business.
pub trait SyncTransport: Send + Sync {
    fn send(&self, message: &OutgoingSyncMessage, tx: &DbWriteTx<'_>);
}

/// The set of collaborators a manager is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn ConversationResolver>,
    pub timeline: Arc<dyn TimelineEntryOwner>,
    pub readiness: Arc<ReadinessGate>,
}

/// Host for tools that operate on the call history database alone, without
/// the messaging app around it. Knows no conversations, keeps no timeline
/// and drops outgoing messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandaloneHost;

impl StandaloneHost {
    pub fn collaborators() -> Collaborators {
        let host = Arc::new(StandaloneHost);
        Collaborators {
            resolver: host.clone(),
            timeline: host.clone(),
            readiness: Arc::new(ReadinessGate::ready(host)),
        }
    }
}

impl ConversationResolver for StandaloneHost {
    fn resolve(
        &self,
        _conversation: &SyncConversation,
        _tx: &dyn ReadTx,
    ) -> Result<Option<ConversationId>> {
        Ok(None)
    }

    fn sync_conversation(
        &self,
        _conversation_id: ConversationId,
        _tx: &dyn ReadTx,
    ) -> Result<Option<SyncConversation>> {
        Ok(None)
    }
}

impl TimelineEntryOwner for StandaloneHost {
    fn insert_call_entry(&self, entry: &CallEntry, _tx: &DbWriteTx<'_>) -> Result<i64> {
        Err(CallRecordError::MissingDependency(format!(
            "no timeline available for {}",
            entry.conversation_id
        )))
    }

    fn update_call_entry(
        &self,
        _interaction_row_id: i64,
        _direction: CallDirection,
        _status: CallStatus,
        _tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn delete_call_entry(&self, _interaction_row_id: i64, _tx: &DbWriteTx<'_>) -> Result<()> {
        Ok(())
    }

    fn mark_read_for_sync(
        &self,
        _interaction_row_id: i64,
        _sync_message_timestamp: u64,
        _tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        Ok(())
    }
}

impl SyncTransport for StandaloneHost {
    fn send(&self, message: &OutgoingSyncMessage, _tx: &DbWriteTx<'_>) {
        debug!(?message, "no transport, dropping sync message");
    }
}
