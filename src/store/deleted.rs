//! Tombstones for deleted calls
//!
//! A tombstone blocks any later attempt to create or update a call record
//! with the same `(callId, conversation)` identity.

use rusqlite::{params, OptionalExtension};

use crate::db::{DbWriteTx, ReadTx};
use crate::error::Result;
use crate::model::{ConversationId, DeletedCallRecord};

use super::{
    conversation_column, conversation_columns, decode_call_id, sql_timestamp, ConversationColumn,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeletedCallRecordStore;

impl DeletedCallRecordStore {
    pub fn new() -> Self {
        Self
    }

    /// Record a tombstone. Re-deleting an already tombstoned call keeps the
    /// original deletion time.
    pub fn insert(&self, record: &DeletedCallRecord, tx: &DbWriteTx<'_>) -> Result<()> {
        let (thread_row_id, call_link_row_id) = conversation_columns(record.conversation_id);

        tx.conn().execute(
            "INSERT OR IGNORE INTO DeletedCallRecord
             (callId, threadRowId, callLinkRowId, deletedAtTimestamp)
             VALUES (?, ?, ?, ?)",
            params![
                record.call_id.to_string(),
                thread_row_id,
                call_link_row_id,
                sql_timestamp(record.deleted_at_timestamp),
            ],
        )?;
        Ok(())
    }

    pub fn fetch(
        &self,
        call_id: u64,
        conversation_id: ConversationId,
        tx: &dyn ReadTx,
    ) -> Result<Option<DeletedCallRecord>> {
        let ConversationColumn { column, row_id } = conversation_column(conversation_id);
        let sql = format!(
            "SELECT callId, deletedAtTimestamp FROM DeletedCallRecord
             WHERE {} = ? AND callId = ?",
            column
        );

        let row: Option<(String, i64)> = tx
            .conn()
            .query_row(&sql, params![row_id, call_id.to_string()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        row.map(|(call_id, deleted_at)| {
            Ok(DeletedCallRecord {
                call_id: decode_call_id(&call_id)?,
                conversation_id,
                deleted_at_timestamp: deleted_at.max(0) as u64,
            })
        })
        .transpose()
    }

    pub fn contains(
        &self,
        call_id: u64,
        conversation_id: ConversationId,
        tx: &dyn ReadTx,
    ) -> Result<bool> {
        Ok(self.fetch(call_id, conversation_id, tx)?.is_some())
    }

    /// Move every tombstone of `from_thread_row_id` onto `into_thread_row_id`.
    /// Tombstones already present in the target thread win.
    pub fn merge_conversations(
        &self,
        from_thread_row_id: i64,
        into_thread_row_id: i64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        tx.conn().execute(
            "UPDATE OR IGNORE DeletedCallRecord SET threadRowId = ? WHERE threadRowId = ?",
            params![into_thread_row_id, from_thread_row_id],
        )?;
        tx.conn().execute(
            "DELETE FROM DeletedCallRecord WHERE threadRowId = ?",
            params![from_thread_row_id],
        )?;
        Ok(())
    }
}
