//! Group call records

use tracing::debug;

use crate::collaborators::Collaborators;
use crate::db::DbWriteTx;
use crate::error::Result;
use crate::model::{Aci, CallDirection, CallRecord, CallStatus, CallType, ConversationId, GroupCallStatus};

use super::{CallObservation, RecordChange, RecordOutcome, RecordWriter};

#[derive(Debug, Clone, Copy)]
pub struct GroupCall {
    pub call_id: u64,
    pub thread_row_id: i64,
    pub direction: CallDirection,
    pub status: GroupCallStatus,
    /// Who rang, when someone else rang us.
    pub ringer: Option<Aci>,
    pub timestamp: u64,
}

/// Change to apply to a group call record the caller already holds.
#[derive(Debug, Clone, Copy)]
pub struct GroupCallUpdate {
    pub direction: CallDirection,
    pub status: GroupCallStatus,
    pub ringer: Option<Aci>,
    pub timestamp: u64,
}

pub struct GroupCallRecordManager {
    writer: RecordWriter,
}

impl GroupCallRecordManager {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            writer: RecordWriter::new(collaborators),
        }
    }

    pub fn create_or_update(
        &self,
        call: GroupCall,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<RecordOutcome> {
        self.writer.create_or_update(
            CallObservation {
                call_id: call.call_id,
                conversation_id: ConversationId::Thread(call.thread_row_id),
                call_type: CallType::GroupCall,
                direction: call.direction,
                status: CallStatus::Group(call.status),
                ringer: ringer_for(call.direction, call.ringer),
                timestamp: call.timestamp,
            },
            announce,
            tx,
        )
    }

    /// Insert a new group call record. The caller has checked there is
    /// neither a record nor a tombstone for the call.
    pub fn create_record(
        &self,
        call: GroupCall,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<RecordOutcome> {
        self.writer.create(
            CallObservation {
                call_id: call.call_id,
                conversation_id: ConversationId::Thread(call.thread_row_id),
                call_type: CallType::GroupCall,
                direction: call.direction,
                status: CallStatus::Group(call.status),
                ringer: ringer_for(call.direction, call.ringer),
                timestamp: call.timestamp,
            },
            announce,
            tx,
        )
    }

    pub fn update_record(
        &self,
        record: CallRecord,
        update: GroupCallUpdate,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<RecordOutcome> {
        self.writer.update(
            record,
            RecordChange {
                direction: Some(update.direction),
                status: CallStatus::Group(update.status),
                ringer: ringer_for(update.direction, update.ringer),
                timestamp: update.timestamp,
            },
            announce,
            tx,
        )
    }
}

/// Rings we start ourselves have no ringer worth recording.
fn ringer_for(direction: CallDirection, ringer: Option<Aci>) -> Option<Aci> {
    match direction {
        CallDirection::Incoming => ringer,
        CallDirection::Outgoing => {
            if ringer.is_some() {
                debug!("dropping ringer for outgoing group call");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::CallRecordError;
    use crate::test_support::TestHost;
    use uuid::Uuid;

    fn call(status: GroupCallStatus, direction: CallDirection, ringer: Option<Aci>) -> GroupCall {
        GroupCall {
            call_id: 99,
            thread_row_id: 5,
            direction,
            status,
            ringer,
            timestamp: 1_000,
        }
    }

    fn record_of(outcome: RecordOutcome) -> CallRecord {
        outcome.record().cloned().expect("record")
    }

    #[test]
    fn test_incoming_ring_records_ringer() {
        let host = TestHost::new();
        let db = Database::open_in_memory().unwrap();
        let manager = GroupCallRecordManager::new(&host.collaborators());
        let ringer = Uuid::from_u128(3);

        let record = db
            .write(|tx| {
                manager.create_or_update(
                    call(GroupCallStatus::Ringing, CallDirection::Incoming, Some(ringer)),
                    false,
                    tx,
                )
            })
            .map(record_of)
            .unwrap();
        assert_eq!(record.group_call_ringer_aci, Some(ringer));
    }

    #[test]
    fn test_outgoing_ring_drops_ringer() {
        let host = TestHost::new();
        let db = Database::open_in_memory().unwrap();
        let manager = GroupCallRecordManager::new(&host.collaborators());

        let record = db
            .write(|tx| {
                manager.create_or_update(
                    call(
                        GroupCallStatus::RingingAccepted,
                        CallDirection::Outgoing,
                        Some(Uuid::from_u128(3)),
                    ),
                    false,
                    tx,
                )
            })
            .map(record_of)
            .unwrap();
        assert_eq!(record.group_call_ringer_aci, None);
    }

    #[test]
    fn test_ringer_ignored_for_non_ringing_status() {
        let host = TestHost::new();
        let db = Database::open_in_memory().unwrap();
        let manager = GroupCallRecordManager::new(&host.collaborators());

        let record = db
            .write(|tx| {
                manager.create_or_update(
                    call(
                        GroupCallStatus::Joined,
                        CallDirection::Incoming,
                        Some(Uuid::from_u128(3)),
                    ),
                    false,
                    tx,
                )
            })
            .map(record_of)
            .unwrap();
        assert_eq!(record.group_call_ringer_aci, None);
    }

    #[test]
    fn test_join_after_ring_becomes_ringing_accepted() {
        let host = TestHost::new();
        let db = Database::open_in_memory().unwrap();
        let manager = GroupCallRecordManager::new(&host.collaborators());

        let record = db
            .write(|tx| {
                manager.create_or_update(
                    call(GroupCallStatus::RingingMissed, CallDirection::Incoming, None),
                    false,
                    tx,
                )?;
                manager.create_or_update(
                    call(GroupCallStatus::Joined, CallDirection::Incoming, None),
                    false,
                    tx,
                )
            })
            .map(record_of)
            .unwrap();
        assert_eq!(
            record.call_status,
            CallStatus::Group(GroupCallStatus::RingingAccepted)
        );
        assert_eq!(record.unread_status, crate::model::CallUnreadStatus::Read);
    }

    #[test]
    fn test_rejected_transition_leaves_record() {
        let host = TestHost::new();
        let db = Database::open_in_memory().unwrap();
        let manager = GroupCallRecordManager::new(&host.collaborators());

        let outcome = db
            .write(|tx| {
                manager.create_or_update(
                    call(GroupCallStatus::RingingAccepted, CallDirection::Incoming, None),
                    false,
                    tx,
                )?;
                manager.create_or_update(
                    call(GroupCallStatus::RingingDeclined, CallDirection::Incoming, None),
                    true,
                    tx,
                )
            })
            .unwrap();
        assert!(matches!(outcome, RecordOutcome::Unchanged(_)));
        assert!(host.transport.sent().is_empty());
    }

    #[test]
    fn test_update_record_moves_direction() {
        let host = TestHost::new();
        let db = Database::open_in_memory().unwrap();
        let manager = GroupCallRecordManager::new(&host.collaborators());

        let record = db
            .write(|tx| {
                let created = manager.create_or_update(
                    call(GroupCallStatus::Generic, CallDirection::Incoming, None),
                    false,
                    tx,
                )?;
                let record = created.record().cloned().ok_or_else(|| {
                    CallRecordError::MissingDependency("record".into())
                })?;
                manager.update_record(
                    record,
                    GroupCallUpdate {
                        direction: CallDirection::Outgoing,
                        status: GroupCallStatus::RingingAccepted,
                        ringer: None,
                        timestamp: 2_000,
                    },
                    false,
                    tx,
                )
            })
            .map(record_of)
            .unwrap();
        assert_eq!(record.call_direction, CallDirection::Outgoing);
        assert_eq!(record.call_began_timestamp, 1_000);
    }
}
