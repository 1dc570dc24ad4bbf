//! Group ring updates
//!
//! Rings are signalled separately from the call itself. Each update is
//! mapped onto a group call status, creating the record when the ring is
//! the first this device hears of the call.

use std::sync::Arc;
use tracing::{info, warn};

use crate::collaborators::{Collaborators, ConversationResolver};
use crate::db::DbWriteTx;
use crate::error::Result;
use crate::model::{Aci, CallDirection, ConversationId, GroupCallStatus};
use crate::store::{CallRecordFetch, CallRecordStore};
use crate::sync::SyncConversation;

use super::{GroupCall, GroupCallRecordManager, GroupCallUpdate, RecordOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingUpdate {
    Requested,
    ExpiredRing,
    CancelledByRinger,
    BusyLocally,
    BusyOnAnotherDevice,
    AcceptedOnAnotherDevice,
    DeclinedOnAnotherDevice,
}

impl RingUpdate {
    pub const ALL: [RingUpdate; 7] = [
        RingUpdate::Requested,
        RingUpdate::ExpiredRing,
        RingUpdate::CancelledByRinger,
        RingUpdate::BusyLocally,
        RingUpdate::BusyOnAnotherDevice,
        RingUpdate::AcceptedOnAnotherDevice,
        RingUpdate::DeclinedOnAnotherDevice,
    ];

    /// The ring ended without this user answering it.
    pub(crate) fn is_missed(self) -> bool {
        matches!(
            self,
            RingUpdate::ExpiredRing
                | RingUpdate::CancelledByRinger
                | RingUpdate::BusyLocally
                | RingUpdate::BusyOnAnotherDevice
        )
    }

    /// Updates about what another of our devices did carry no ringer.
    fn names_ringer(self) -> bool {
        !matches!(
            self,
            RingUpdate::AcceptedOnAnotherDevice | RingUpdate::DeclinedOnAnotherDevice
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRingUpdate {
    pub group_id: Vec<u8>,
    pub ring_id: i64,
    pub update: RingUpdate,
    /// Who sent the update.
    pub sender: Aci,
    pub timestamp: u64,
    /// A notification profile suppressed the ring on this device.
    pub silenced: bool,
}

impl GroupRingUpdate {
    /// Ring ids are the call id reinterpreted as signed.
    pub fn call_id(&self) -> u64 {
        self.ring_id as u64
    }
}

pub struct RingUpdateHandler {
    store: CallRecordStore,
    resolver: Arc<dyn ConversationResolver>,
    group_manager: GroupCallRecordManager,
}

impl RingUpdateHandler {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            store: CallRecordStore::new(),
            resolver: collaborators.resolver.clone(),
            group_manager: GroupCallRecordManager::new(collaborators),
        }
    }

    /// Apply a ring update. Returns `None` when the update was ignored.
    pub fn handle(
        &self,
        ring: &GroupRingUpdate,
        tx: &DbWriteTx<'_>,
    ) -> Result<Option<RecordOutcome>> {
        let conversation = SyncConversation::Group {
            group_id: ring.group_id.clone(),
        };
        let thread_row_id = match self.resolver.resolve(&conversation, tx)? {
            Some(ConversationId::Thread(id)) => id,
            Some(other) => {
                warn!(conversation = %other, "ring update resolved to a non-thread conversation");
                return Ok(None);
            }
            None => {
                warn!(group = ?conversation, "ignoring ring update for unknown group");
                return Ok(None);
            }
        };

        let call_id = ring.call_id();
        let ringer = ring.update.names_ringer().then_some(ring.sender);

        match self
            .store
            .fetch(call_id, ConversationId::Thread(thread_row_id), tx)?
        {
            CallRecordFetch::Tombstoned => {
                warn!(call_id, "ignoring ring update, record was deleted");
                Ok(Some(RecordOutcome::Tombstoned))
            }
            CallRecordFetch::NotFound => {
                let status = status_for_new_record(ring.update, ring.silenced);
                info!(call_id, update = ?ring.update, status = ?status, "creating record for ring update");
                self.group_manager
                    .create_record(
                        GroupCall {
                            call_id,
                            thread_row_id,
                            direction: CallDirection::Incoming,
                            status,
                            ringer,
                            timestamp: ring.timestamp,
                        },
                        false,
                        tx,
                    )
                    .map(Some)
            }
            CallRecordFetch::Found(record) => {
                let Some(existing) = record.call_status.as_group() else {
                    warn!(call_id, status = %record.call_status, "ring update for a non-group record");
                    return Ok(None);
                };
                let Some(status) = status_for_existing_record(existing, ring.update, ring.silenced)
                else {
                    info!(call_id, update = ?ring.update, status = ?existing, "ring update changes nothing");
                    return Ok(Some(RecordOutcome::Unchanged(record)));
                };

                let direction = record.call_direction;
                let timestamp = record.call_began_timestamp;
                self.group_manager
                    .update_record(
                        record,
                        GroupCallUpdate {
                            direction,
                            status,
                            ringer,
                            timestamp,
                        },
                        false,
                        tx,
                    )
                    .map(Some)
            }
        }
    }
}

fn missed_status(silenced: bool) -> GroupCallStatus {
    if silenced {
        GroupCallStatus::RingingMissedNotificationProfile
    } else {
        GroupCallStatus::RingingMissed
    }
}

fn status_for_new_record(update: RingUpdate, silenced: bool) -> GroupCallStatus {
    if update.is_missed() {
        return missed_status(silenced);
    }
    match update {
        RingUpdate::Requested => GroupCallStatus::Ringing,
        RingUpdate::AcceptedOnAnotherDevice => GroupCallStatus::RingingAccepted,
        _ => GroupCallStatus::RingingDeclined,
    }
}

/// `None` when the update adds nothing to what the record already says.
fn status_for_existing_record(
    existing: GroupCallStatus,
    update: RingUpdate,
    silenced: bool,
) -> Option<GroupCallStatus> {
    use GroupCallStatus::*;

    match existing {
        Generic => Some(status_for_new_record(update, silenced)),
        // Joined before hearing about the ring: the ring was accepted.
        Joined => Some(RingingAccepted),
        Ringing => match update {
            RingUpdate::Requested => None,
            RingUpdate::AcceptedOnAnotherDevice => Some(RingingAccepted),
            RingUpdate::DeclinedOnAnotherDevice => Some(RingingDeclined),
            _ => Some(missed_status(silenced)),
        },
        RingingAccepted => None,
        RingingDeclined => match update {
            RingUpdate::AcceptedOnAnotherDevice => Some(RingingAccepted),
            _ => None,
        },
        RingingMissed | RingingMissedNotificationProfile => match update {
            RingUpdate::AcceptedOnAnotherDevice => Some(RingingAccepted),
            RingUpdate::DeclinedOnAnotherDevice => Some(RingingDeclined),
            _ => None,
        },
    }
}
