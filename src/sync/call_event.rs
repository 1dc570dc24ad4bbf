//! Incoming call event sync messages
//!
//! Another of the account's devices reports what happened to one call. The
//! event is merged into the local record through the per-kind managers and
//! is never re-announced.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::collaborators::{Collaborators, ConversationResolver, TimelineEntryOwner};
use crate::db::DbWriteTx;
use crate::error::{CallRecordError, Result};
use crate::manager::{
    AdHocCallRecordManager, CallRecordDeleteManager, GroupCall, GroupCallRecordManager,
    GroupCallUpdate, IndividualCall, IndividualCallRecordManager, RecordOutcome,
};
use crate::model::{
    CallDirection, CallLinkCallStatus, CallRecord, ConversationId, GroupCallStatus,
    IndividualCallStatus,
};
use crate::store::{CallRecordFetch, CallRecordStore};

use super::messages::{CallEvent, CallEventMessage, SyncConversation};

pub struct IncomingCallEventReconciler {
    store: CallRecordStore,
    resolver: Arc<dyn ConversationResolver>,
    timeline: Arc<dyn TimelineEntryOwner>,
    individual: IndividualCallRecordManager,
    group: GroupCallRecordManager,
    ad_hoc: AdHocCallRecordManager,
    delete: CallRecordDeleteManager,
}

impl IncomingCallEventReconciler {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            store: CallRecordStore::new(),
            resolver: collaborators.resolver.clone(),
            timeline: collaborators.timeline.clone(),
            individual: IndividualCallRecordManager::new(collaborators),
            group: GroupCallRecordManager::new(collaborators),
            ad_hoc: AdHocCallRecordManager::new(collaborators),
            delete: CallRecordDeleteManager::new(collaborators),
        }
    }

    pub fn handle(
        &self,
        message: &CallEventMessage,
        sync_message_timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        let Some(conversation_id) = self.resolver.resolve(&message.conversation, tx)? else {
            error!(
                conversation = ?message.conversation,
                call_id = message.call_id,
                "missing conversation for incoming call event"
            );
            return Err(CallRecordError::MissingConversation(format!(
                "{:?}",
                message.conversation
            )));
        };

        if message.event == CallEvent::Deleted {
            return self.delete_call(message.call_id, conversation_id, tx);
        }

        match (&message.conversation, conversation_id) {
            (SyncConversation::Individual { .. }, ConversationId::Thread(thread_row_id)) => {
                self.handle_individual(message, thread_row_id, sync_message_timestamp, tx)
            }
            (SyncConversation::Group { .. }, ConversationId::Thread(thread_row_id)) => {
                self.handle_group(message, thread_row_id, sync_message_timestamp, tx)
            }
            (SyncConversation::AdHoc { .. }, ConversationId::CallLink(call_link_row_id)) => {
                self.handle_ad_hoc(message, call_link_row_id, tx)
            }
            (conversation, resolved) => {
                error!(?conversation, resolved = %resolved, "conversation resolved to the wrong kind");
                Err(CallRecordError::MissingConversation(format!(
                    "{:?}",
                    conversation
                )))
            }
        }
    }

    fn handle_individual(
        &self,
        message: &CallEventMessage,
        thread_row_id: i64,
        sync_message_timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        let status = match message.event {
            CallEvent::Accepted => IndividualCallStatus::Accepted,
            CallEvent::NotAccepted => IndividualCallStatus::NotAccepted,
            CallEvent::Observed | CallEvent::Deleted => {
                warn!(event = ?message.event, "ignoring event for 1:1 call");
                return Ok(());
            }
        };

        let outcome = match self
            .store
            .fetch(message.call_id, ConversationId::Thread(thread_row_id), tx)?
        {
            CallRecordFetch::Tombstoned => {
                warn!(call_id = message.call_id, "ignoring 1:1 call event, record was deleted");
                return Ok(());
            }
            CallRecordFetch::Found(record) => {
                info!(call_id = message.call_id, "updating 1:1 call for sync message");
                self.individual.update_record(record, status, false, tx)?
            }
            CallRecordFetch::NotFound => {
                info!(call_id = message.call_id, "creating 1:1 call for sync message");
                self.individual.create_or_update(
                    IndividualCall {
                        call_id: message.call_id,
                        thread_row_id,
                        call_type: message.call_type,
                        direction: message.direction,
                        status,
                        timestamp: message.timestamp,
                    },
                    false,
                    tx,
                )?
            }
        };

        self.mark_read(&outcome, sync_message_timestamp, tx)
    }

    fn handle_group(
        &self,
        message: &CallEventMessage,
        thread_row_id: i64,
        sync_message_timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        let accepted = match message.event {
            CallEvent::Accepted => true,
            CallEvent::NotAccepted => false,
            CallEvent::Observed | CallEvent::Deleted => {
                warn!(event = ?message.event, "ignoring event for group call");
                return Ok(());
            }
        };

        let outcome = match self
            .store
            .fetch(message.call_id, ConversationId::Thread(thread_row_id), tx)?
        {
            CallRecordFetch::Tombstoned => {
                warn!(call_id = message.call_id, "ignoring group call event, record was deleted");
                return Ok(());
            }
            CallRecordFetch::Found(record) => {
                let Some(update) = group_update_for_existing(&record, message, accepted) else {
                    return Ok(());
                };
                info!(call_id = message.call_id, "updating group call for sync message");
                self.group.update_record(record, update, false, tx)?
            }
            CallRecordFetch::NotFound => {
                let status = match (message.direction, accepted) {
                    (CallDirection::Outgoing, false) => {
                        error!(call_id = message.call_id, "declined a call we started");
                        return Ok(());
                    }
                    // Outgoing rings are not tracked, assume it was accepted.
                    (CallDirection::Outgoing, true) => GroupCallStatus::RingingAccepted,
                    // A later ring update upgrades this if there was a ring.
                    (CallDirection::Incoming, true) => GroupCallStatus::Joined,
                    // Only ring declines are sent as not accepted.
                    (CallDirection::Incoming, false) => GroupCallStatus::RingingDeclined,
                };

                info!(call_id = message.call_id, "creating group call for sync message");
                self.group.create_record(
                    GroupCall {
                        call_id: message.call_id,
                        thread_row_id,
                        direction: message.direction,
                        status,
                        ringer: None,
                        timestamp: message.timestamp,
                    },
                    false,
                    tx,
                )?
            }
        };

        self.mark_read(&outcome, sync_message_timestamp, tx)
    }

    fn handle_ad_hoc(
        &self,
        message: &CallEventMessage,
        call_link_row_id: i64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        let status = match message.event {
            CallEvent::Accepted => CallLinkCallStatus::Joined,
            CallEvent::Observed => CallLinkCallStatus::Generic,
            CallEvent::NotAccepted | CallEvent::Deleted => {
                warn!(event = ?message.event, "ignoring event for call link");
                return Ok(());
            }
        };

        self.ad_hoc.create_or_update(
            message.call_id,
            call_link_row_id,
            status,
            message.timestamp,
            false,
            tx,
        )?;
        Ok(())
    }

    fn delete_call(
        &self,
        call_id: u64,
        conversation_id: ConversationId,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        match self.store.fetch(call_id, conversation_id, tx)? {
            CallRecordFetch::Tombstoned => {
                warn!(call_id, "ignoring delete, record was already deleted");
                Ok(())
            }
            CallRecordFetch::Found(record) => {
                // Reacting to another device's delete, so no announcement.
                self.delete.delete_call_records(&[record], false, tx)
            }
            CallRecordFetch::NotFound => {
                self.delete.mark_call_as_deleted(call_id, conversation_id, tx)
            }
        }
    }

    fn mark_read(
        &self,
        outcome: &RecordOutcome,
        sync_message_timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        match outcome.record() {
            Some(record) => self.timeline.mark_read_for_sync(
                record.interaction_row_id,
                sync_message_timestamp,
                tx,
            ),
            None => Ok(()),
        }
    }
}

/// How a linked device's accept or decline maps onto a group call we
/// already know. A known ring is never forgotten.
fn group_update_for_existing(
    record: &CallRecord,
    message: &CallEventMessage,
    accepted: bool,
) -> Option<GroupCallUpdate> {
    let Some(existing) = record.call_status.as_group() else {
        error!(call_id = record.call_id, status = %record.call_status, "group call without a group status");
        return None;
    };
    let knew_of_ring = existing != GroupCallStatus::Generic && existing != GroupCallStatus::Joined;

    let mut direction = record.call_direction;
    let status = match (message.direction, accepted) {
        // Joined on another device.
        (CallDirection::Incoming, true) => {
            if knew_of_ring {
                GroupCallStatus::RingingAccepted
            } else {
                GroupCallStatus::Joined
            }
        }
        // Rang the group from another device.
        (CallDirection::Outgoing, true) => {
            if record.call_direction == CallDirection::Outgoing
                && existing == GroupCallStatus::RingingAccepted
            {
                warn!(call_id = record.call_id, "already knew of this outgoing ring");
                return None;
            }
            if knew_of_ring {
                warn!(call_id = record.call_id, "ring event for a call started on another device");
            } else {
                direction = CallDirection::Outgoing;
            }
            GroupCallStatus::RingingAccepted
        }
        // Declined on another device; a local join wins.
        (CallDirection::Incoming, false) => match existing {
            GroupCallStatus::Joined | GroupCallStatus::RingingAccepted => {
                GroupCallStatus::RingingAccepted
            }
            _ => GroupCallStatus::RingingDeclined,
        },
        (CallDirection::Outgoing, false) => {
            error!(call_id = record.call_id, "declined our own outgoing call");
            return None;
        }
    };

    Some(GroupCallUpdate {
        direction,
        status,
        ringer: None,
        timestamp: message.timestamp,
    })
}
