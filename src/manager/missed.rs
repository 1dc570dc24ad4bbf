//! Unread missed-call counts and bulk read marking

use tracing::{error, info};

use crate::collaborators::Collaborators;
use crate::db::{DbWriteTx, ReadTx};
use crate::error::Result;
use crate::model::{CallRecord, CallStatus, ConversationId};
use crate::store::{CallRecordCursor, CallRecordQuerier, CallRecordStore, FetchOrdering};
use crate::sync::{CallLogEvent, OutgoingSyncMessageComposer};

pub struct MissedCallManager {
    store: CallRecordStore,
    querier: CallRecordQuerier,
    composer: OutgoingSyncMessageComposer,
}

impl MissedCallManager {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            store: CallRecordStore::new(),
            querier: CallRecordQuerier::default(),
            composer: OutgoingSyncMessageComposer::new(collaborators),
        }
    }

    pub fn with_querier(mut self, querier: CallRecordQuerier) -> Self {
        self.querier = querier;
        self
    }

    /// Number of unread calls with a missed status.
    pub fn unread_missed_call_count(&self, tx: &dyn ReadTx) -> Result<usize> {
        let mut count = 0;
        for status in CallStatus::MISSED {
            for record in self
                .querier
                .fetch_cursor_for_unread(status, FetchOrdering::Descending, tx)
            {
                record?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Mark every unread call as read, optionally only those that began at
    /// or before `before_timestamp`. Returns how many were marked. When
    /// announcing, the newest marked call anchors a `markedAsRead` message.
    pub fn mark_unread_as_read(
        &self,
        before_timestamp: Option<u64>,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<usize> {
        let ordering = ordering_through(before_timestamp);
        let (marked, newest) = self.mark_each(
            |status| self.querier.fetch_cursor_for_unread(status, ordering, tx),
            tx,
        );

        info!(marked, ?before_timestamp, "marked unread calls as read");

        if announce {
            if let Some(newest) = newest {
                self.composer
                    .send_call_log(CallLogEvent::MarkedAsRead, &newest, tx)?;
            }
        }
        Ok(marked)
    }

    /// Mark unread calls in the anchor's conversation, at or before the
    /// anchor, as read. When announcing and something was marked, the
    /// anchor is sent in a `markedAsReadInConversation` message.
    pub fn mark_unread_in_conversation_as_read(
        &self,
        anchor: &CallRecord,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<usize> {
        let marked = self.mark_unread_in_conversation_before(
            anchor.conversation_id,
            anchor.call_began_timestamp,
            tx,
        );

        if announce && marked > 0 {
            self.composer
                .send_call_log(CallLogEvent::MarkedAsReadInConversation, anchor, tx)?;
        }
        Ok(marked)
    }

    pub(crate) fn mark_unread_in_conversation_before(
        &self,
        conversation_id: ConversationId,
        timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> usize {
        let ordering = ordering_through(Some(timestamp));
        let (marked, _) = self.mark_each(
            |status| {
                self.querier.fetch_cursor_for_unread_in_conversation(
                    status,
                    conversation_id,
                    ordering,
                    tx,
                )
            },
            tx,
        );

        info!(marked, conversation = %conversation_id, "marked unread calls in conversation as read");
        marked
    }

    /// Walk the unread cursor of every status, marking each record read.
    /// Failures are logged and skipped. Returns the count and the newest
    /// record marked.
    fn mark_each<'t>(
        &self,
        cursor_for: impl Fn(CallStatus) -> CallRecordCursor<'t>,
        tx: &DbWriteTx<'_>,
    ) -> (usize, Option<CallRecord>) {
        let mut marked = 0;
        let mut newest: Option<CallRecord> = None;

        // Any status can be unread, not only the missed ones.
        for status in CallStatus::ALL {
            for record in cursor_for(status) {
                let mut record = match record {
                    Ok(record) => record,
                    Err(e) => {
                        error!(status = %status, "failed to read unread call: {}", e);
                        break;
                    }
                };

                if let Err(e) = self.store.mark_as_read(&mut record, tx) {
                    error!(call_id = record.call_id, "failed to mark call as read: {}", e);
                    continue;
                }
                marked += 1;

                let is_newer = newest
                    .as_ref()
                    .map_or(true, |n| record.call_began_timestamp > n.call_began_timestamp);
                if is_newer {
                    newest = Some(record);
                }
            }
        }

        (marked, newest)
    }
}

/// Ordering that includes records at exactly `timestamp`: the anchor of a
/// read marker may share its millisecond with the boundary.
fn ordering_through(timestamp: Option<u64>) -> FetchOrdering {
    match timestamp {
        Some(ts) => FetchOrdering::DescendingBefore(ts.saturating_add(1)),
        None => FetchOrdering::Descending,
    }
}
