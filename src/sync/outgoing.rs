//! Outgoing sync messages and the readiness gate they wait behind

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::collaborators::{Collaborators, ConversationResolver, SyncTransport};
use crate::db::{Database, DbWriteTx};
use crate::error::{CallRecordError, Result};
use crate::model::{
    CallLinkCallStatus, CallRecord, CallStatus, GroupCallStatus, IndividualCallStatus,
};

use super::messages::{
    CallEvent, CallEventMessage, CallLogAnchor, CallLogEvent, CallLogMessage,
    OutgoingSyncMessage,
};

/// Holds outgoing messages until the host app is ready to send them.
///
/// A message submitted before [`ReadinessGate::flush`] waits for its write
/// transaction to commit and is then queued in commit order. A rolled back
/// transaction queues nothing. `flush` sends the queue, in order, inside a
/// write transaction of its own. The transport is never called with the
/// queue locked.
pub struct ReadinessGate {
    transport: Arc<dyn SyncTransport>,
    ready: AtomicBool,
    pending: Mutex<VecDeque<OutgoingSyncMessage>>,
}

impl ReadinessGate {
    /// A gate that queues until flushed.
    pub fn new(transport: Arc<dyn SyncTransport>) -> Self {
        Self {
            transport,
            ready: AtomicBool::new(false),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// A gate that sends immediately.
    pub fn ready(transport: Arc<dyn SyncTransport>) -> Self {
        let gate = Self::new(transport);
        gate.ready.store(true, Ordering::SeqCst);
        gate
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Committed messages waiting for `flush`.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn submit(self: &Arc<Self>, message: OutgoingSyncMessage, tx: &DbWriteTx<'_>) {
        if self.is_ready() {
            self.transport.send(&message, tx);
            return;
        }

        debug!("app not ready, deferring sync message until commit");
        let gate = Arc::clone(self);
        tx.on_commit(move |db| gate.enqueue_committed(message, db));
    }

    /// Queue a message whose transaction has committed. If the gate opened
    /// in the meantime it is sent right away in a fresh transaction.
    fn enqueue_committed(&self, message: OutgoingSyncMessage, db: &Database) {
        {
            let mut pending = self.pending.lock();
            if !self.is_ready() {
                pending.push_back(message);
                debug!(queued = pending.len(), "queued deferred sync message");
                return;
            }
        }

        let sent = db.write(|tx| {
            self.transport.send(&message, tx);
            Ok::<_, CallRecordError>(())
        });
        if let Err(e) = sent {
            error!("failed to send sync message, keeping it for the next flush: {}", e);
            self.pending.lock().push_back(message);
        }
    }

    /// Mark the app ready and send everything queued so far. Returns the
    /// number of messages sent. On failure the unsent messages stay queued
    /// and the gate stays closed.
    pub fn flush(&self, db: &Database) -> Result<usize> {
        let mut sent = 0;

        loop {
            let batch = {
                let mut pending = self.pending.lock();
                if pending.is_empty() {
                    // Opened under the lock: nothing can be queued behind it.
                    self.ready.store(true, Ordering::SeqCst);
                    break;
                }
                std::mem::take(&mut *pending)
            };

            let result = db.write(|tx| {
                for message in &batch {
                    self.transport.send(message, tx);
                }
                Ok::<_, CallRecordError>(batch.len())
            });

            match result {
                Ok(count) => sent += count,
                Err(e) => {
                    let mut pending = self.pending.lock();
                    for message in batch.into_iter().rev() {
                        pending.push_front(message);
                    }
                    return Err(e);
                }
            }
        }

        if sent > 0 {
            info!(sent, "flushed deferred sync messages");
        }
        Ok(sent)
    }
}

/// Turns local call record changes into sync messages for the account's
/// other devices.
#[derive(Clone)]
pub struct OutgoingSyncMessageComposer {
    resolver: Arc<dyn ConversationResolver>,
    gate: Arc<ReadinessGate>,
}

impl OutgoingSyncMessageComposer {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            resolver: collaborators.resolver.clone(),
            gate: collaborators.readiness.clone(),
        }
    }

    /// The event announcing `status`, or `None` for local bookkeeping
    /// statuses that other devices never hear about.
    pub fn event_for_status(status: CallStatus) -> Option<CallEvent> {
        match status {
            CallStatus::Individual(status) => match status {
                IndividualCallStatus::Pending => None,
                IndividualCallStatus::Accepted => Some(CallEvent::Accepted),
                IndividualCallStatus::NotAccepted | IndividualCallStatus::IncomingMissed => {
                    Some(CallEvent::NotAccepted)
                }
            },
            CallStatus::Group(status) => match status {
                GroupCallStatus::Joined | GroupCallStatus::RingingAccepted => {
                    Some(CallEvent::Accepted)
                }
                GroupCallStatus::RingingDeclined => Some(CallEvent::NotAccepted),
                // Every device observes rings for itself.
                GroupCallStatus::Generic
                | GroupCallStatus::Ringing
                | GroupCallStatus::RingingMissed
                | GroupCallStatus::RingingMissedNotificationProfile => None,
            },
            CallStatus::CallLink(status) => match status {
                CallLinkCallStatus::Generic => None,
                CallLinkCallStatus::Joined => Some(CallEvent::Accepted),
            },
        }
    }

    /// Announce the record's current status, if it is announceable.
    pub fn send_status_event(&self, record: &CallRecord, tx: &DbWriteTx<'_>) -> Result<()> {
        match Self::event_for_status(record.call_status) {
            Some(event) => self.send_call_event(record, event, record.call_began_timestamp, tx),
            None => {
                debug!(
                    call_id = record.call_id,
                    status = %record.call_status,
                    "status is not announced"
                );
                Ok(())
            }
        }
    }

    pub fn send_deleted_event(
        &self,
        record: &CallRecord,
        timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        self.send_call_event(record, CallEvent::Deleted, timestamp, tx)
    }

    pub fn send_call_log(
        &self,
        event: CallLogEvent,
        anchor: &CallRecord,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        let Some(conversation) = self.resolver.sync_conversation(anchor.conversation_id, tx)?
        else {
            error!(
                conversation = %anchor.conversation_id,
                "missing conversation for call log anchor, not sending"
            );
            return Ok(());
        };

        info!(?event, call_id = anchor.call_id, "sending call log sync message");
        self.gate.submit(
            OutgoingSyncMessage::CallLog(CallLogMessage {
                event,
                anchor: Some(CallLogAnchor {
                    call_id: anchor.call_id,
                    conversation,
                }),
                timestamp: anchor.call_began_timestamp,
            }),
            tx,
        );
        Ok(())
    }

    fn send_call_event(
        &self,
        record: &CallRecord,
        event: CallEvent,
        timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        let Some(conversation) = self.resolver.sync_conversation(record.conversation_id, tx)?
        else {
            error!(
                call_id = record.call_id,
                conversation = %record.conversation_id,
                "missing conversation for call event, not sending"
            );
            return Ok(());
        };

        info!(call_id = record.call_id, ?event, "sending call event sync message");
        self.gate.submit(
            OutgoingSyncMessage::CallEvent(CallEventMessage {
                conversation,
                call_id: record.call_id,
                timestamp,
                direction: record.call_direction,
                call_type: record.call_type,
                event,
            }),
            tx,
        );
        Ok(())
    }
}
