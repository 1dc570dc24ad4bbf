//! 1:1 call records

use tracing::error;

use crate::collaborators::Collaborators;
use crate::db::DbWriteTx;
use crate::error::{CallRecordError, Result};
use crate::model::{CallDirection, CallRecord, CallStatus, CallType, ConversationId, IndividualCallStatus};

use super::{CallObservation, RecordChange, RecordOutcome, RecordWriter};

/// A 1:1 call as observed locally or by a linked device.
#[derive(Debug, Clone, Copy)]
pub struct IndividualCall {
    pub call_id: u64,
    pub thread_row_id: i64,
    /// Audio or video.
    pub call_type: CallType,
    pub direction: CallDirection,
    pub status: IndividualCallStatus,
    pub timestamp: u64,
}

pub struct IndividualCallRecordManager {
    writer: RecordWriter,
}

impl IndividualCallRecordManager {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            writer: RecordWriter::new(collaborators),
        }
    }

    pub fn create_or_update(
        &self,
        call: IndividualCall,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<RecordOutcome> {
        if !matches!(call.call_type, CallType::AudioCall | CallType::VideoCall) {
            error!(call_id = call.call_id, call_type = ?call.call_type, "not a 1:1 call type");
            return Err(CallRecordError::MismatchedStatus {
                call_type: call.call_type,
                status: CallStatus::Individual(call.status),
            });
        }

        self.writer.create_or_update(
            CallObservation {
                call_id: call.call_id,
                conversation_id: ConversationId::Thread(call.thread_row_id),
                call_type: call.call_type,
                direction: call.direction,
                status: CallStatus::Individual(call.status),
                ringer: None,
                timestamp: call.timestamp,
            },
            announce,
            tx,
        )
    }

    /// Apply a new status to a record the caller already holds.
    pub fn update_record(
        &self,
        record: CallRecord,
        status: IndividualCallStatus,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<RecordOutcome> {
        let timestamp = record.call_began_timestamp;
        self.writer.update(
            record,
            RecordChange {
                direction: None,
                status: CallStatus::Individual(status),
                ringer: None,
                timestamp,
            },
            announce,
            tx,
        )
    }
}
