//! Call record storage with SQLite
//!
//! - `CallRecordStore`: CRUD over call records plus change notifications
//! - `DeletedCallRecordStore`: tombstones for deleted calls
//! - `CallRecordQuerier`: ordered, filtered, forward-only cursors

mod deleted;
mod querier;
mod schema;

pub use deleted::DeletedCallRecordStore;
pub use querier::{CallRecordCursor, CallRecordQuerier, FetchOrdering, DEFAULT_BATCH_SIZE};
pub use schema::SCHEMA;

use rusqlite::{params, OptionalExtension, Row};
use tracing::{error, info};
use uuid::Uuid;

use crate::db::{CallRecordChange, DbWriteTx, ReadTx};
use crate::error::{CallRecordError, Result};
use crate::model::{
    Aci, CallDirection, CallRecord, CallStatus, CallType, CallUnreadStatus, ConversationId,
    NewCallRecord,
};

/// Result of looking up a call by its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRecordFetch {
    Found(CallRecord),
    /// The call was deleted and must not be recreated.
    Tombstoned,
    NotFound,
}

pub struct CallRecordStore {
    deleted: DeletedCallRecordStore,
}

impl Default for CallRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CallRecordStore {
    pub fn new() -> Self {
        Self {
            deleted: DeletedCallRecordStore::new(),
        }
    }

    // ============================================
    // WRITES
    // ============================================

    pub fn insert(&self, new: NewCallRecord, tx: &DbWriteTx<'_>) -> Result<CallRecord> {
        if !new.call_type.accepts(new.call_status) {
            return Err(CallRecordError::MismatchedStatus {
                call_type: new.call_type,
                status: new.call_status,
            });
        }
        if new.group_call_ringer_aci.is_some() && !is_ringing(new.call_status) {
            return Err(CallRecordError::RingerNotAllowed {
                status: new.call_status,
            });
        }

        let unread_status = CallUnreadStatus::for_status(new.call_status);
        let (thread_row_id, call_link_row_id) = conversation_columns(new.conversation_id);

        let id: i64 = tx.conn().query_row(
            r#"INSERT INTO CallRecord
               (callId, interactionRowId, threadRowId, callLinkRowId, type, direction,
                status, unreadStatus, callBeganTimestamp, callEndedTimestamp, groupCallRingerAci)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
               RETURNING id"#,
            params![
                new.call_id.to_string(),
                new.interaction_row_id,
                thread_row_id,
                call_link_row_id,
                new.call_type.to_raw(),
                new.call_direction.to_raw(),
                new.call_status.to_raw(),
                unread_status.to_raw(),
                sql_timestamp(new.call_began_timestamp),
                new.group_call_ringer_aci.map(|aci| aci.as_bytes().to_vec()),
            ],
            |row| row.get(0),
        )?;

        info!(
            call_id = new.call_id,
            conversation = %new.conversation_id,
            status = %new.call_status,
            "inserted call record"
        );
        tx.push_change(CallRecordChange::Inserted);

        Ok(CallRecord {
            id,
            call_id: new.call_id,
            conversation_id: new.conversation_id,
            interaction_row_id: new.interaction_row_id,
            call_type: new.call_type,
            call_direction: new.call_direction,
            call_status: new.call_status,
            unread_status,
            call_began_timestamp: new.call_began_timestamp,
            call_ended_timestamp: None,
            group_call_ringer_aci: new.group_call_ringer_aci,
        })
    }

    /// Delete a batch of records. Tombstones are the caller's responsibility.
    pub fn delete(&self, records: &[CallRecord], tx: &DbWriteTx<'_>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut stmt = tx.conn().prepare_cached("DELETE FROM CallRecord WHERE id = ?")?;
        for record in records {
            stmt.execute(params![record.id])?;
        }

        tx.push_change(CallRecordChange::Deleted {
            ids: records.iter().map(CallRecord::identifier).collect(),
        });
        Ok(())
    }

    /// Apply a new status. Unread state is recomputed: only missed statuses
    /// leave the record unread.
    pub fn update_call_status(
        &self,
        record: &mut CallRecord,
        new_status: CallStatus,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        if !record.call_type.accepts(new_status) {
            return Err(CallRecordError::MismatchedStatus {
                call_type: record.call_type,
                status: new_status,
            });
        }

        let unread_status = CallUnreadStatus::for_status(new_status);
        tx.conn().execute(
            "UPDATE CallRecord SET status = ?, unreadStatus = ? WHERE id = ?",
            params![new_status.to_raw(), unread_status.to_raw(), record.id],
        )?;

        record.call_status = new_status;
        record.unread_status = unread_status;
        tx.push_change(CallRecordChange::StatusUpdated {
            id: record.identifier(),
        });
        Ok(())
    }

    /// Mark read without touching the status.
    pub fn mark_as_read(&self, record: &mut CallRecord, tx: &DbWriteTx<'_>) -> Result<()> {
        tx.conn().execute(
            "UPDATE CallRecord SET unreadStatus = ? WHERE id = ?",
            params![CallUnreadStatus::Read.to_raw(), record.id],
        )?;
        record.unread_status = CallUnreadStatus::Read;
        Ok(())
    }

    pub fn update_direction(
        &self,
        record: &mut CallRecord,
        direction: CallDirection,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        tx.conn().execute(
            "UPDATE CallRecord SET direction = ? WHERE id = ?",
            params![direction.to_raw(), record.id],
        )?;
        record.call_direction = direction;
        Ok(())
    }

    /// Only valid while the record holds a ringing-family group status.
    pub fn update_group_call_ringer_aci(
        &self,
        record: &mut CallRecord,
        ringer: Aci,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        if !is_ringing(record.call_status) {
            return Err(CallRecordError::RingerNotAllowed {
                status: record.call_status,
            });
        }

        tx.conn().execute(
            "UPDATE CallRecord SET groupCallRingerAci = ? WHERE id = ?",
            params![ringer.as_bytes().to_vec(), record.id],
        )?;
        record.group_call_ringer_aci = Some(ringer);
        Ok(())
    }

    pub fn update_call_began_timestamp(
        &self,
        record: &mut CallRecord,
        timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        tx.conn().execute(
            "UPDATE CallRecord SET callBeganTimestamp = ? WHERE id = ?",
            params![sql_timestamp(timestamp), record.id],
        )?;
        record.call_began_timestamp = timestamp;
        Ok(())
    }

    /// Lower the began timestamp to `timestamp` if that is earlier. Returns
    /// whether anything changed; the timestamp never moves forward.
    pub fn update_call_began_timestamp_if_earlier(
        &self,
        record: &mut CallRecord,
        timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<bool> {
        if timestamp >= record.call_began_timestamp {
            return Ok(false);
        }
        self.update_call_began_timestamp(record, timestamp, tx)?;
        Ok(true)
    }

    pub fn update_call_ended_timestamp(
        &self,
        record: &mut CallRecord,
        timestamp: u64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        tx.conn().execute(
            "UPDATE CallRecord SET callEndedTimestamp = ? WHERE id = ?",
            params![sql_timestamp(timestamp), record.id],
        )?;
        record.call_ended_timestamp = Some(timestamp);
        Ok(())
    }

    /// Reassign every call of `from_thread_row_id` to `into_thread_row_id`,
    /// tombstones included. Used when the conversation owner merges threads.
    pub fn merge_conversations(
        &self,
        from_thread_row_id: i64,
        into_thread_row_id: i64,
        tx: &DbWriteTx<'_>,
    ) -> Result<()> {
        let moved = tx.conn().execute(
            "UPDATE CallRecord SET threadRowId = ? WHERE threadRowId = ?",
            params![into_thread_row_id, from_thread_row_id],
        )?;
        self.deleted
            .merge_conversations(from_thread_row_id, into_thread_row_id, tx)?;

        info!(
            from = from_thread_row_id,
            into = into_thread_row_id,
            moved,
            "merged call records between threads"
        );
        Ok(())
    }

    // ============================================
    // READS
    // ============================================

    /// Look up a call by identity, checking tombstones first.
    pub fn fetch(
        &self,
        call_id: u64,
        conversation_id: ConversationId,
        tx: &dyn ReadTx,
    ) -> Result<CallRecordFetch> {
        if self.deleted.contains(call_id, conversation_id, tx)? {
            return Ok(CallRecordFetch::Tombstoned);
        }

        let ConversationColumn { column, row_id } = conversation_column(conversation_id);
        let sql = format!(
            "SELECT {} FROM CallRecord WHERE {} = ? AND callId = ?",
            CALL_RECORD_COLUMNS, column
        );
        let row = tx
            .conn()
            .query_row(&sql, params![row_id, call_id.to_string()], CallRecordRow::from_row)
            .optional()?;

        match row {
            Some(row) => Ok(CallRecordFetch::Found(row.into_record()?)),
            None => Ok(CallRecordFetch::NotFound),
        }
    }

    pub fn fetch_by_interaction_row_id(
        &self,
        interaction_row_id: i64,
        tx: &dyn ReadTx,
    ) -> Result<Option<CallRecord>> {
        let sql = format!(
            "SELECT {} FROM CallRecord WHERE interactionRowId = ?",
            CALL_RECORD_COLUMNS
        );
        tx.conn()
            .query_row(&sql, params![interaction_row_id], CallRecordRow::from_row)
            .optional()?
            .map(CallRecordRow::into_record)
            .transpose()
    }

    /// All records of a conversation, newest first.
    pub fn fetch_all(
        &self,
        conversation_id: ConversationId,
        limit: Option<usize>,
        tx: &dyn ReadTx,
    ) -> Result<Vec<CallRecord>> {
        let ConversationColumn { column, row_id } = conversation_column(conversation_id);
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let sql = format!(
            "SELECT {} FROM CallRecord WHERE {} = ?
             ORDER BY callBeganTimestamp DESC, id DESC LIMIT ?",
            CALL_RECORD_COLUMNS, column
        );

        let mut stmt = tx.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(params![row_id, limit], CallRecordRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(CallRecordRow::into_record).collect()
    }
}

fn is_ringing(status: CallStatus) -> bool {
    status.as_group().is_some_and(|s| s.is_ringing_family())
}

// ============================================
// COLUMN HELPERS
// ============================================

pub(crate) const CALL_RECORD_COLUMNS: &str = "id, callId, interactionRowId, threadRowId, \
     callLinkRowId, type, direction, status, unreadStatus, callBeganTimestamp, \
     callEndedTimestamp, groupCallRingerAci";

pub(crate) struct ConversationColumn {
    pub column: &'static str,
    pub row_id: i64,
}

pub(crate) fn conversation_column(conversation_id: ConversationId) -> ConversationColumn {
    match conversation_id {
        ConversationId::Thread(row_id) => ConversationColumn {
            column: "threadRowId",
            row_id,
        },
        ConversationId::CallLink(row_id) => ConversationColumn {
            column: "callLinkRowId",
            row_id,
        },
    }
}

pub(crate) fn conversation_columns(conversation_id: ConversationId) -> (Option<i64>, Option<i64>) {
    match conversation_id {
        ConversationId::Thread(id) => (Some(id), None),
        ConversationId::CallLink(id) => (None, Some(id)),
    }
}

pub(crate) fn sql_timestamp(timestamp: u64) -> i64 {
    i64::try_from(timestamp).unwrap_or(i64::MAX)
}

pub(crate) fn decode_call_id(value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| decode_failure("callId", value))
}

/// Persisted data that maps to no known value. Fails loudly in debug
/// builds; release builds surface the error to the caller.
fn decode_failure(column: &'static str, value: impl ToString) -> CallRecordError {
    let value = value.to_string();
    error!(column, value = %value, "undecodable call record column");
    debug_assert!(false, "cannot decode {} from {}", column, value);
    CallRecordError::decode(column, value)
}

// ============================================
// ROW TYPES
// ============================================

/// A `CallRecord` row as stored, before its columns are validated.
#[derive(Debug)]
pub(crate) struct CallRecordRow {
    pub id: i64,
    pub call_id: String,
    pub interaction_row_id: i64,
    pub thread_row_id: Option<i64>,
    pub call_link_row_id: Option<i64>,
    pub call_type: i64,
    pub direction: i64,
    pub status: i64,
    pub unread_status: i64,
    pub call_began_timestamp: i64,
    pub call_ended_timestamp: i64,
    pub group_call_ringer_aci: Option<Vec<u8>>,
}

impl CallRecordRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            call_id: row.get(1)?,
            interaction_row_id: row.get(2)?,
            thread_row_id: row.get(3)?,
            call_link_row_id: row.get(4)?,
            call_type: row.get(5)?,
            direction: row.get(6)?,
            status: row.get(7)?,
            unread_status: row.get(8)?,
            call_began_timestamp: row.get(9)?,
            call_ended_timestamp: row.get(10)?,
            group_call_ringer_aci: row.get(11)?,
        })
    }

    pub(crate) fn into_record(self) -> Result<CallRecord> {
        let conversation_id = match (self.thread_row_id, self.call_link_row_id) {
            (Some(id), None) => ConversationId::Thread(id),
            (None, Some(id)) => ConversationId::CallLink(id),
            (thread, link) => {
                return Err(decode_failure(
                    "conversation",
                    format!("thread={:?} link={:?}", thread, link),
                ))
            }
        };

        let call_type = CallType::from_raw(self.call_type)
            .ok_or_else(|| decode_failure("type", self.call_type))?;
        let call_status = CallStatus::from_raw(self.status)
            .ok_or_else(|| decode_failure("status", self.status))?;
        if !call_type.accepts(call_status) {
            return Err(decode_failure(
                "status",
                format!("{} for {:?}", self.status, call_type),
            ));
        }

        let group_call_ringer_aci = match self.group_call_ringer_aci {
            Some(bytes) => Some(
                Uuid::from_slice(&bytes)
                    .map_err(|_| decode_failure("groupCallRingerAci", hex::encode(&bytes)))?,
            ),
            None => None,
        };

        Ok(CallRecord {
            id: self.id,
            call_id: decode_call_id(&self.call_id)?,
            conversation_id,
            interaction_row_id: self.interaction_row_id,
            call_type,
            call_direction: CallDirection::from_raw(self.direction)
                .ok_or_else(|| decode_failure("direction", self.direction))?,
            call_status,
            unread_status: CallUnreadStatus::from_raw(self.unread_status)
                .ok_or_else(|| decode_failure("unreadStatus", self.unread_status))?,
            call_began_timestamp: self.call_began_timestamp.max(0) as u64,
            call_ended_timestamp: match self.call_ended_timestamp {
                0 => None,
                ts => Some(ts.max(0) as u64),
            },
            group_call_ringer_aci,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::model::{DeletedCallRecord, GroupCallStatus, IndividualCallStatus};
    use crate::test_support::{new_group_record, new_individual_record, RecordingSink};
    use std::sync::Arc;

    fn insert(db: &Database, store: &CallRecordStore, new: NewCallRecord) -> CallRecord {
        db.write(|tx| store.insert(new, tx)).unwrap()
    }

    #[test]
    fn test_insert_then_fetch_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        let mut new = new_group_record(u64::MAX, 3, GroupCallStatus::Ringing, 1_000);
        new.group_call_ringer_aci = Some(Uuid::from_u128(42));

        let record = insert(&db, &store, new);

        let fetched = db
            .read(|tx| store.fetch(u64::MAX, ConversationId::Thread(3), tx))
            .unwrap();
        assert_eq!(fetched, CallRecordFetch::Found(record));
    }

    #[test]
    fn test_fetch_reports_tombstone_and_absence() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();

        db.write(|tx| {
            DeletedCallRecordStore::new()
                .insert(&DeletedCallRecord::new(5, ConversationId::Thread(1), 10), tx)
        })
        .unwrap();

        db.read(|tx| {
            assert_eq!(
                store.fetch(5, ConversationId::Thread(1), tx)?,
                CallRecordFetch::Tombstoned
            );
            assert_eq!(
                store.fetch(6, ConversationId::Thread(1), tx)?,
                CallRecordFetch::NotFound
            );
            Ok::<_, CallRecordError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_insert_rejects_mismatched_status() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        let mut new = new_individual_record(1, 1, IndividualCallStatus::Accepted, 1);
        new.call_status = CallStatus::Group(GroupCallStatus::Joined);

        let result = db.write(|tx| store.insert(new, tx));
        assert!(matches!(result, Err(CallRecordError::MismatchedStatus { .. })));
    }

    #[test]
    fn test_duplicate_identity_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        insert(&db, &store, new_individual_record(1, 1, IndividualCallStatus::Accepted, 1));

        let mut duplicate = new_individual_record(1, 1, IndividualCallStatus::Accepted, 1);
        duplicate.interaction_row_id += 1;
        let result = db.write(|tx| store.insert(duplicate, tx));
        assert!(matches!(result, Err(CallRecordError::Persistence(_))));
    }

    #[test]
    fn test_update_status_derives_unread() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        let mut record = insert(&db, &store, new_group_record(1, 1, GroupCallStatus::Generic, 1));
        assert_eq!(record.unread_status, CallUnreadStatus::Read);

        db.write(|tx| {
            store.update_call_status(
                &mut record,
                CallStatus::Group(GroupCallStatus::RingingMissed),
                tx,
            )
        })
        .unwrap();
        assert_eq!(record.unread_status, CallUnreadStatus::Unread);

        db.write(|tx| {
            store.update_call_status(&mut record, CallStatus::Group(GroupCallStatus::Joined), tx)
        })
        .unwrap();
        assert_eq!(record.unread_status, CallUnreadStatus::Read);

        let fetched = db
            .read(|tx| store.fetch(1, ConversationId::Thread(1), tx))
            .unwrap();
        assert_eq!(fetched, CallRecordFetch::Found(record));
    }

    #[test]
    fn test_mark_as_read_keeps_status() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        let mut record = insert(
            &db,
            &store,
            new_individual_record(1, 1, IndividualCallStatus::IncomingMissed, 1),
        );
        assert_eq!(record.unread_status, CallUnreadStatus::Unread);

        db.write(|tx| store.mark_as_read(&mut record, tx)).unwrap();

        assert_eq!(record.unread_status, CallUnreadStatus::Read);
        assert_eq!(
            record.call_status,
            CallStatus::Individual(IndividualCallStatus::IncomingMissed)
        );
    }

    #[test]
    fn test_began_timestamp_never_moves_forward() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        let mut record = insert(
            &db,
            &store,
            new_individual_record(1, 1, IndividualCallStatus::Accepted, 1_000),
        );

        let changed = db
            .write(|tx| store.update_call_began_timestamp_if_earlier(&mut record, 2_000, tx))
            .unwrap();
        assert!(!changed);
        assert_eq!(record.call_began_timestamp, 1_000);

        let changed = db
            .write(|tx| store.update_call_began_timestamp_if_earlier(&mut record, 500, tx))
            .unwrap();
        assert!(changed);

        let fetched = db
            .read(|tx| store.fetch(1, ConversationId::Thread(1), tx))
            .unwrap();
        match fetched {
            CallRecordFetch::Found(r) => assert_eq!(r.call_began_timestamp, 500),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ringer_requires_ringing_status() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        let mut record = insert(&db, &store, new_group_record(1, 1, GroupCallStatus::Joined, 1));

        let result = db.write(|tx| {
            store.update_group_call_ringer_aci(&mut record, Uuid::from_u128(7), tx)
        });
        assert!(matches!(result, Err(CallRecordError::RingerNotAllowed { .. })));

        db.write(|tx| {
            store.update_call_status(
                &mut record,
                CallStatus::Group(GroupCallStatus::RingingAccepted),
                tx,
            )?;
            store.update_group_call_ringer_aci(&mut record, Uuid::from_u128(7), tx)
        })
        .unwrap();
        assert_eq!(record.group_call_ringer_aci, Some(Uuid::from_u128(7)));
    }

    #[test]
    fn test_direction_and_ended_timestamp_updates() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        let mut record = insert(&db, &store, new_group_record(1, 1, GroupCallStatus::Joined, 1));

        db.write(|tx| {
            store.update_direction(&mut record, CallDirection::Outgoing, tx)?;
            store.update_call_ended_timestamp(&mut record, 99, tx)
        })
        .unwrap();

        let fetched = db
            .read(|tx| store.fetch_by_interaction_row_id(record.interaction_row_id, tx))
            .unwrap();
        assert_eq!(fetched, Some(record.clone()));
        assert_eq!(record.call_ended_timestamp, Some(99));
    }

    #[test]
    fn test_fetch_all_newest_first_with_limit() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        for (call_id, ts) in [(1, 100), (2, 300), (3, 200)] {
            insert(&db, &store, new_group_record(call_id, 1, GroupCallStatus::Joined, ts));
        }
        insert(&db, &store, new_group_record(4, 2, GroupCallStatus::Joined, 400));

        let all = db
            .read(|tx| store.fetch_all(ConversationId::Thread(1), None, tx))
            .unwrap();
        let timestamps: Vec<_> = all.iter().map(|r| r.call_began_timestamp).collect();
        assert_eq!(timestamps, vec![300, 200, 100]);

        let limited = db
            .read(|tx| store.fetch_all(ConversationId::Thread(1), Some(2), tx))
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_change_notifications() {
        let sink = Arc::new(RecordingSink::default());
        let db = Database::open_in_memory()
            .unwrap()
            .with_change_sink(sink.clone());
        let store = CallRecordStore::new();

        let mut record = insert(&db, &store, new_group_record(1, 1, GroupCallStatus::Generic, 1));
        db.write(|tx| {
            store.update_call_status(&mut record, CallStatus::Group(GroupCallStatus::Joined), tx)
        })
        .unwrap();
        db.write(|tx| store.delete(std::slice::from_ref(&record), tx))
            .unwrap();

        assert_eq!(
            sink.changes(),
            vec![
                CallRecordChange::Inserted,
                CallRecordChange::StatusUpdated {
                    id: record.identifier()
                },
                CallRecordChange::Deleted {
                    ids: vec![record.identifier()]
                },
            ]
        );
    }

    #[test]
    fn test_merge_conversations_moves_records() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        insert(&db, &store, new_individual_record(1, 10, IndividualCallStatus::Accepted, 1));

        db.write(|tx| store.merge_conversations(10, 20, tx)).unwrap();

        db.read(|tx| {
            assert_eq!(
                store.fetch(1, ConversationId::Thread(10), tx)?,
                CallRecordFetch::NotFound
            );
            assert!(matches!(
                store.fetch(1, ConversationId::Thread(20), tx)?,
                CallRecordFetch::Found(_)
            ));
            Ok::<_, CallRecordError>(())
        })
        .unwrap();
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "cannot decode status"))]
    fn test_unknown_status_fails_decode() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        insert(&db, &store, new_group_record(1, 1, GroupCallStatus::Joined, 1));
        db.connection()
            .execute("UPDATE CallRecord SET status = 99", [])
            .unwrap();

        let result = db.read(|tx| store.fetch(1, ConversationId::Thread(1), tx));
        assert!(matches!(result, Err(CallRecordError::Decode { .. })));
    }
}
