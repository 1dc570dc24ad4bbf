//! Call-link ("ad-hoc") call records

use crate::collaborators::Collaborators;
use crate::db::DbWriteTx;
use crate::error::Result;
use crate::model::{CallDirection, CallLinkCallStatus, CallStatus, CallType, ConversationId};

use super::{CallObservation, RecordOutcome, RecordWriter};

pub struct AdHocCallRecordManager {
    writer: RecordWriter,
}

impl AdHocCallRecordManager {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            writer: RecordWriter::new(collaborators),
        }
    }

    /// Ad-hoc calls have no caller, so they are always recorded as incoming.
    pub fn create_or_update(
        &self,
        call_id: u64,
        call_link_row_id: i64,
        status: CallLinkCallStatus,
        timestamp: u64,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<RecordOutcome> {
        self.writer.create_or_update(
            CallObservation {
                call_id,
                conversation_id: ConversationId::CallLink(call_link_row_id),
                call_type: CallType::AdHocCall,
                direction: CallDirection::Incoming,
                status: CallStatus::CallLink(status),
                ringer: None,
                timestamp,
            },
            announce,
            tx,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::CallRecordError;
    use crate::test_support::TestHost;

    #[test]
    fn test_generic_then_joined() {
        let host = TestHost::new();
        host.resolver.add_call_link(
            2,
            crate::sync::SyncConversation::AdHoc {
                room_id: vec![0xbe, 0xef],
            },
        );
        let db = Database::open_in_memory().unwrap();
        let manager = AdHocCallRecordManager::new(&host.collaborators());

        let (first, second, third) = db
            .write(|tx| {
                Ok::<_, CallRecordError>((
                    manager.create_or_update(1, 2, CallLinkCallStatus::Generic, 10, false, tx)?,
                    manager.create_or_update(1, 2, CallLinkCallStatus::Joined, 5, true, tx)?,
                    manager.create_or_update(1, 2, CallLinkCallStatus::Generic, 1, false, tx)?,
                ))
            })
            .unwrap();

        assert!(matches!(first, RecordOutcome::Created(_)));
        let joined = match second {
            RecordOutcome::Updated(r) => r,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(joined.call_status, CallStatus::CallLink(CallLinkCallStatus::Joined));
        assert_eq!(joined.conversation_id, ConversationId::CallLink(2));
        assert_eq!(joined.call_began_timestamp, 5);
        assert!(matches!(third, RecordOutcome::Unchanged(_)));
        assert_eq!(host.transport.sent().len(), 1);
    }

    #[test]
    fn test_call_link_and_thread_ids_do_not_collide() {
        let host = TestHost::new();
        let db = Database::open_in_memory().unwrap();
        let collaborators = host.collaborators();
        let ad_hoc = AdHocCallRecordManager::new(&collaborators);
        let group = crate::manager::GroupCallRecordManager::new(&collaborators);

        let outcomes = db
            .write(|tx| {
                let a = ad_hoc.create_or_update(7, 1, CallLinkCallStatus::Joined, 10, false, tx)?;
                let b = group.create_or_update(
                    crate::manager::GroupCall {
                        call_id: 7,
                        thread_row_id: 1,
                        direction: CallDirection::Incoming,
                        status: crate::model::GroupCallStatus::Joined,
                        ringer: None,
                        timestamp: 10,
                    },
                    false,
                    tx,
                )?;
                Ok::<_, CallRecordError>((a, b))
            })
            .unwrap();

        assert!(matches!(outcomes.0, RecordOutcome::Created(_)));
        assert!(matches!(outcomes.1, RecordOutcome::Created(_)));
    }
}
