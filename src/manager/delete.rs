//! Deleting call records
//!
//! A deleted record always leaves a tombstone behind, so that late sync
//! messages or ring updates cannot bring it back.

use std::sync::Arc;
use tracing::{info, warn};

use crate::collaborators::{Collaborators, TimelineEntryOwner};
use crate::db::DbWriteTx;
use crate::error::Result;
use crate::model::{now_millis, CallRecord, CallType, ConversationId, DeletedCallRecord};
use crate::store::{CallRecordQuerier, CallRecordStore, DeletedCallRecordStore, FetchOrdering};
use crate::sync::{CallLogEvent, OutgoingSyncMessageComposer};

pub struct CallRecordDeleteManager {
    store: CallRecordStore,
    deleted: DeletedCallRecordStore,
    querier: CallRecordQuerier,
    timeline: Arc<dyn TimelineEntryOwner>,
    composer: OutgoingSyncMessageComposer,
}

impl CallRecordDeleteManager {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            store: CallRecordStore::new(),
            deleted: DeletedCallRecordStore::new(),
            querier: CallRecordQuerier::default(),
            timeline: collaborators.timeline.clone(),
            composer: OutgoingSyncMessageComposer::new(collaborators),
        }
    }

    pub fn with_querier(mut self, querier: CallRecordQuerier) -> Self {
        self.querier = querier;
        self
    }

    /// Delete records along with their timeline entries, tombstoning each.
    pub fn delete_call_records(
        &self,
        records: &[CallRecord],
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.store.delete(records, tx)?;

        let now = now_millis();
        for record in records {
            self.deleted.insert(
                &DeletedCallRecord::new(record.call_id, record.conversation_id, now),
                tx,
            )?;
            self.timeline
                .delete_call_entry(record.interaction_row_id, tx)?;
        }
        info!(count = records.len(), "deleted call records");

        if announce {
            for record in records {
                self.composer
                    .send_deleted_event(record, deleted_event_timestamp(record, now), tx)?;
            }
        }
        Ok(())
    }

    /// Tombstone a call this device never recorded.
    pub fn mark_call_as_deleted(
        &self,
        call_id: u64,
        conversation_id: ConversationId,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        info!(call_id, conversation = %conversation_id, "marking call as deleted");
        self.deleted.insert(
            &DeletedCallRecord::new(call_id, conversation_id, now_millis()),
            tx,
        )
    }

    /// Delete every record that began at or before `timestamp`. Returns the
    /// number deleted. When announcing, one `cleared` call log message
    /// anchored on the newest deleted record is sent.
    pub fn delete_all_before(
        &self,
        timestamp: u64,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<usize> {
        let records = self
            .querier
            .fetch_cursor(
                FetchOrdering::DescendingBefore(timestamp.saturating_add(1)),
                tx,
            )
            .drain()?;

        if records.is_empty() {
            warn!(timestamp, "no call records to clear");
            return Ok(0);
        }

        self.delete_call_records(&records, false, tx)?;

        if announce {
            // Newest first, so the first record anchors the message.
            self.composer
                .send_call_log(CallLogEvent::Cleared, &records[0], tx)?;
        }
        Ok(records.len())
    }
}

/// 1:1 calls share a start time across devices; other calls have no agreed
/// start, so the deletion time is used.
fn deleted_event_timestamp(record: &CallRecord, now: u64) -> u64 {
    match record.call_type {
        CallType::AudioCall | CallType::VideoCall => record.call_began_timestamp,
        CallType::GroupCall | CallType::AdHocCall => now,
    }
}
