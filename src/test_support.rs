//! Test doubles for the collaborators around the call history

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::collaborators::{
    CallEntry, Collaborators, ConversationResolver, SyncTransport, TimelineEntryOwner,
};
use crate::db::{CallRecordChange, ChangeSink, DbWriteTx, ReadTx};
use crate::error::{CallRecordError, Result};
use crate::model::{
    CallDirection, CallStatus, CallType, ConversationId, GroupCallStatus, IndividualCallStatus,
    NewCallRecord,
};
use crate::sync::{OutgoingSyncMessage, ReadinessGate, SyncConversation};

#[derive(Default)]
pub struct RecordingSink {
    changes: Mutex<Vec<CallRecordChange>>,
}

impl RecordingSink {
    pub fn changes(&self) -> Vec<CallRecordChange> {
        self.changes.lock().clone()
    }
}

impl ChangeSink for RecordingSink {
    fn publish(&self, change: &CallRecordChange) {
        self.changes.lock().push(change.clone());
    }
}

/// Resolver backed by two in-memory maps.
#[derive(Default)]
pub struct FakeResolver {
    conversations: Mutex<HashMap<ConversationId, SyncConversation>>,
}

impl FakeResolver {
    pub fn add_thread(&self, thread_row_id: i64, conversation: SyncConversation) {
        self.conversations
            .lock()
            .insert(ConversationId::Thread(thread_row_id), conversation);
    }

    pub fn add_call_link(&self, call_link_row_id: i64, conversation: SyncConversation) {
        self.conversations
            .lock()
            .insert(ConversationId::CallLink(call_link_row_id), conversation);
    }
}

impl ConversationResolver for FakeResolver {
    fn resolve(
        &self,
        conversation: &SyncConversation,
        _tx: &dyn ReadTx,
    ) -> Result<Option<ConversationId>> {
        Ok(self
            .conversations
            .lock()
            .iter()
            .find(|(_, known)| *known == conversation)
            .map(|(id, _)| *id))
    }

    fn sync_conversation(
        &self,
        conversation_id: ConversationId,
        _tx: &dyn ReadTx,
    ) -> Result<Option<SyncConversation>> {
        Ok(self.conversations.lock().get(&conversation_id).cloned())
    }
}

#[derive(Default)]
struct TimelineState {
    next_id: i64,
    entries: HashMap<i64, CallEntry>,
    read_markers: HashMap<i64, u64>,
}

/// Timeline that keeps entries in memory.
#[derive(Default)]
pub struct FakeTimeline {
    state: Mutex<TimelineState>,
}

impl FakeTimeline {
    pub fn entry_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn entry_status(&self, interaction_row_id: i64) -> Option<CallStatus> {
        self.state
            .lock()
            .entries
            .get(&interaction_row_id)
            .map(|e| e.call_status)
    }

    /// Sync timestamp the entry was last marked read with.
    pub fn read_marker(&self, interaction_row_id: i64) -> Option<u64> {
        self.state
            .lock()
            .read_markers
            .get(&interaction_row_id)
            .copied()
    }
}

impl TimelineEntryOwner for FakeTimeline {
    fn insert_call_entry(&self, entry: &CallEntry, _tx: &DbWriteTx<'_>) -> Result<i64> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.entries.insert(id, entry.clone());
        Ok(id)
    }

    fn update_call_entry(
        &self,
        interaction_row_id: i64,
        direction: CallDirection,
        status: CallStatus,
        _tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let entry = state.entries.get_mut(&interaction_row_id).ok_or_else(|| {
            CallRecordError::MissingDependency(format!("timeline entry {}", interaction_row_id))
        })?;
        entry.call_direction = direction;
        entry.call_status = status;
        Ok(())
    }

    fn delete_call_entry(&self, interaction_row_id: i64, _tx: &DbWriteTx<'_>) -> Result<()> {
        self.state.lock().entries.remove(&interaction_row_id);
        Ok(())
    }

    fn mark_read_for_sync(
        &self,
        interaction_row_id: i64,
        sync_message_timestamp: u64,
        _tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        self.state
            .lock()
            .read_markers
            .insert(interaction_row_id, sync_message_timestamp);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingSyncMessage>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<OutgoingSyncMessage> {
        self.sent.lock().clone()
    }
}

impl SyncTransport for RecordingTransport {
    fn send(&self, message: &OutgoingSyncMessage, _tx: &DbWriteTx<'_>) {
        self.sent.lock().push(message.clone());
    }
}

/// A full set of recording collaborators with a ready transport.
pub struct TestHost {
    pub resolver: Arc<FakeResolver>,
    pub timeline: Arc<FakeTimeline>,
    pub transport: Arc<RecordingTransport>,
}

impl TestHost {
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(FakeResolver::default()),
            timeline: Arc::new(FakeTimeline::default()),
            transport: Arc::new(RecordingTransport::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            resolver: self.resolver.clone(),
            timeline: self.timeline.clone(),
            readiness: Arc::new(ReadinessGate::ready(self.transport.clone())),
        }
    }
}

// Far from the ids handed out by `FakeTimeline`.
static NEXT_INTERACTION_ROW_ID: AtomicI64 = AtomicI64::new(1_000_000);

fn next_interaction_row_id() -> i64 {
    NEXT_INTERACTION_ROW_ID.fetch_add(1, Ordering::Relaxed)
}

/// Incoming audio call in a thread.
pub fn new_individual_record(
    call_id: u64,
    thread_row_id: i64,
    status: IndividualCallStatus,
    timestamp: u64,
) -> NewCallRecord {
    NewCallRecord {
        call_id,
        conversation_id: ConversationId::Thread(thread_row_id),
        interaction_row_id: next_interaction_row_id(),
        call_type: CallType::AudioCall,
        call_direction: CallDirection::Incoming,
        call_status: CallStatus::Individual(status),
        call_began_timestamp: timestamp,
        group_call_ringer_aci: None,
    }
}

/// Incoming group call in a thread, without a ringer.
pub fn new_group_record(
    call_id: u64,
    thread_row_id: i64,
    status: GroupCallStatus,
    timestamp: u64,
) -> NewCallRecord {
    NewCallRecord {
        call_id,
        conversation_id: ConversationId::Thread(thread_row_id),
        interaction_row_id: next_interaction_row_id(),
        call_type: CallType::GroupCall,
        call_direction: CallDirection::Incoming,
        call_status: CallStatus::Group(status),
        call_began_timestamp: timestamp,
        group_call_ringer_aci: None,
    }
}
