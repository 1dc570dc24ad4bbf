//! Incoming call log sync messages: bulk clear and read markers

use std::sync::Arc;
use tracing::{error, info};

use crate::collaborators::{Collaborators, ConversationResolver};
use crate::db::{DbWriteTx, ReadTx};
use crate::error::{CallRecordError, Result};
use crate::manager::{CallRecordDeleteManager, MissedCallManager};
use crate::model::ConversationId;
use crate::store::{CallRecordFetch, CallRecordQuerier, CallRecordStore};

use super::messages::{CallLogAnchor, CallLogEvent, CallLogMessage};

pub struct IncomingCallLogReconciler {
    store: CallRecordStore,
    resolver: Arc<dyn ConversationResolver>,
    delete: CallRecordDeleteManager,
    missed: MissedCallManager,
}

impl IncomingCallLogReconciler {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            store: CallRecordStore::new(),
            resolver: collaborators.resolver.clone(),
            delete: CallRecordDeleteManager::new(collaborators),
            missed: MissedCallManager::new(collaborators),
        }
    }

    /// Page size for the bulk walks.
    pub fn with_querier(mut self, querier: CallRecordQuerier) -> Self {
        self.delete = self.delete.with_querier(querier);
        self.missed = self.missed.with_querier(querier);
        self
    }

    pub fn handle(&self, message: &CallLogMessage, tx: &DbWriteTx<'_>) -> Result<()> {
        let anchor = match &message.anchor {
            Some(anchor) => self.hydrate(anchor, tx)?,
            None => None,
        };
        // Clocks differ between devices; the local record's start wins.
        let timestamp = anchor
            .and_then(|(_, began)| began)
            .unwrap_or(message.timestamp);

        match message.event {
            CallLogEvent::Cleared => {
                let deleted = self.delete.delete_all_before(timestamp, false, tx)?;
                info!(deleted, timestamp, "cleared call history for sync message");
            }
            CallLogEvent::MarkedAsRead => {
                self.missed.mark_unread_as_read(Some(timestamp), false, tx)?;
            }
            CallLogEvent::MarkedAsReadInConversation => {
                let Some((conversation_id, _)) = anchor else {
                    error!(anchor = ?message.anchor, "conversation read marker without a local conversation");
                    return Err(CallRecordError::MissingConversation(format!(
                        "{:?}",
                        message.anchor.as_ref().map(|a| &a.conversation)
                    )));
                };
                self.missed
                    .mark_unread_in_conversation_before(conversation_id, timestamp, tx);
            }
        }
        Ok(())
    }

    /// The local conversation of the anchor and, when this device has the
    /// call, its began timestamp.
    fn hydrate(
        &self,
        anchor: &CallLogAnchor,
        tx: &dyn ReadTx,
    ) -> Result<Option<(ConversationId, Option<u64>)>> {
        let Some(conversation_id) = self.resolver.resolve(&anchor.conversation, tx)? else {
            return Ok(None);
        };

        let began = match self.store.fetch(anchor.call_id, conversation_id, tx)? {
            CallRecordFetch::Found(record) => Some(record.call_began_timestamp),
            CallRecordFetch::Tombstoned | CallRecordFetch::NotFound => None,
        };
        Ok(Some((conversation_id, began)))
    }
}
