//! Ordered, filtered, forward-only cursors over call records
//!
//! Cursors page through the table in `(callBeganTimestamp, id)` order using
//! keyset pagination, so each page is an index range read. Rows may be
//! mutated between pages (e.g. marked read) without disturbing iteration.

use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::collections::VecDeque;

use crate::db::ReadTx;
use crate::error::Result;
use crate::model::{CallRecord, CallStatus, CallUnreadStatus, ConversationId};

use super::{conversation_column, sql_timestamp, CallRecordRow, CALL_RECORD_COLUMNS};

pub const DEFAULT_BATCH_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrdering {
    /// Newest first.
    Descending,
    /// Newest first, strictly before the timestamp.
    DescendingBefore(u64),
    /// Oldest first, strictly after the timestamp.
    AscendingAfter(u64),
}

impl FetchOrdering {
    fn is_ascending(self) -> bool {
        matches!(self, FetchOrdering::AscendingAfter(_))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Filter {
    status: Option<CallStatus>,
    conversation_id: Option<ConversationId>,
    unread_only: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CallRecordQuerier {
    batch_size: usize,
}

impl Default for CallRecordQuerier {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl CallRecordQuerier {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn fetch_cursor<'t>(
        &self,
        ordering: FetchOrdering,
        tx: &'t dyn ReadTx,
    ) -> CallRecordCursor<'t> {
        self.cursor(Filter::default(), ordering, tx)
    }

    pub fn fetch_cursor_for_status<'t>(
        &self,
        status: CallStatus,
        ordering: FetchOrdering,
        tx: &'t dyn ReadTx,
    ) -> CallRecordCursor<'t> {
        let filter = Filter {
            status: Some(status),
            ..Filter::default()
        };
        self.cursor(filter, ordering, tx)
    }

    pub fn fetch_cursor_for_conversation<'t>(
        &self,
        conversation_id: ConversationId,
        ordering: FetchOrdering,
        tx: &'t dyn ReadTx,
    ) -> CallRecordCursor<'t> {
        let filter = Filter {
            conversation_id: Some(conversation_id),
            ..Filter::default()
        };
        self.cursor(filter, ordering, tx)
    }

    pub fn fetch_cursor_for_conversation_and_status<'t>(
        &self,
        conversation_id: ConversationId,
        status: CallStatus,
        ordering: FetchOrdering,
        tx: &'t dyn ReadTx,
    ) -> CallRecordCursor<'t> {
        let filter = Filter {
            status: Some(status),
            conversation_id: Some(conversation_id),
            unread_only: false,
        };
        self.cursor(filter, ordering, tx)
    }

    pub fn fetch_cursor_for_unread<'t>(
        &self,
        status: CallStatus,
        ordering: FetchOrdering,
        tx: &'t dyn ReadTx,
    ) -> CallRecordCursor<'t> {
        let filter = Filter {
            status: Some(status),
            conversation_id: None,
            unread_only: true,
        };
        self.cursor(filter, ordering, tx)
    }

    pub fn fetch_cursor_for_unread_in_conversation<'t>(
        &self,
        status: CallStatus,
        conversation_id: ConversationId,
        ordering: FetchOrdering,
        tx: &'t dyn ReadTx,
    ) -> CallRecordCursor<'t> {
        let filter = Filter {
            status: Some(status),
            conversation_id: Some(conversation_id),
            unread_only: true,
        };
        self.cursor(filter, ordering, tx)
    }

    fn cursor<'t>(
        &self,
        filter: Filter,
        ordering: FetchOrdering,
        tx: &'t dyn ReadTx,
    ) -> CallRecordCursor<'t> {
        CallRecordCursor {
            tx,
            filter,
            ordering,
            batch_size: self.batch_size,
            last_key: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }
}

/// Forward-only cursor, valid for the lifetime of the transaction it reads.
pub struct CallRecordCursor<'t> {
    tx: &'t dyn ReadTx,
    filter: Filter,
    ordering: FetchOrdering,
    batch_size: usize,
    /// `(callBeganTimestamp, id)` of the last row handed out.
    last_key: Option<(i64, i64)>,
    buffer: VecDeque<CallRecord>,
    exhausted: bool,
}

impl CallRecordCursor<'_> {
    /// Next record, or `None` once the cursor is drained.
    pub fn next_record(&mut self) -> Result<Option<CallRecord>> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fetch_page()?;
        }
        Ok(self.buffer.pop_front())
    }

    /// Drain the remaining records.
    pub fn drain(self) -> Result<Vec<CallRecord>> {
        self.collect()
    }

    fn fetch_page(&mut self) -> Result<()> {
        let (sql, values) = self.page_query();
        let tx = self.tx;
        let mut stmt = tx.conn().prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), CallRecordRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.len() < self.batch_size {
            self.exhausted = true;
        }
        if let Some(last) = rows.last() {
            self.last_key = Some((last.call_began_timestamp, last.id));
        }

        for row in rows {
            self.buffer.push_back(row.into_record()?);
        }
        Ok(())
    }

    fn page_query(&self) -> (String, Vec<Value>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(conversation_id) = self.filter.conversation_id {
            let column = conversation_column(conversation_id);
            conditions.push(format!("{} = ?", column.column));
            values.push(Value::Integer(column.row_id));
        }
        if let Some(status) = self.filter.status {
            conditions.push("status = ?".to_string());
            values.push(Value::Integer(status.to_raw()));
        }
        if self.filter.unread_only {
            conditions.push("unreadStatus = ?".to_string());
            values.push(Value::Integer(CallUnreadStatus::Unread.to_raw()));
        }

        match self.ordering {
            FetchOrdering::Descending => {}
            FetchOrdering::DescendingBefore(ts) => {
                conditions.push("callBeganTimestamp < ?".to_string());
                values.push(Value::Integer(sql_timestamp(ts)));
            }
            FetchOrdering::AscendingAfter(ts) => {
                conditions.push("callBeganTimestamp > ?".to_string());
                values.push(Value::Integer(sql_timestamp(ts)));
            }
        }

        let (cmp, direction) = if self.ordering.is_ascending() {
            (">", "ASC")
        } else {
            ("<", "DESC")
        };

        if let Some((ts, id)) = self.last_key {
            conditions.push(format!(
                "(callBeganTimestamp {cmp} ? OR (callBeganTimestamp = ? AND id {cmp} ?))",
                cmp = cmp
            ));
            values.extend([Value::Integer(ts), Value::Integer(ts), Value::Integer(id)]);
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        values.push(Value::Integer(self.batch_size as i64));
        let sql = format!(
            "SELECT {} FROM CallRecord {} ORDER BY callBeganTimestamp {dir}, id {dir} LIMIT ?",
            CALL_RECORD_COLUMNS,
            where_clause,
            dir = direction
        );
        (sql, values)
    }
}

impl Iterator for CallRecordCursor<'_> {
    type Item = Result<CallRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.exhausted = true;
                self.buffer.clear();
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::model::{GroupCallStatus, IndividualCallStatus};
    use crate::store::CallRecordStore;
    use crate::test_support::{new_group_record, new_individual_record};

    fn timestamps(cursor: CallRecordCursor<'_>) -> Vec<u64> {
        cursor
            .map(|r| r.unwrap().call_began_timestamp)
            .collect()
    }

    fn seed(db: &Database, rows: &[(u64, i64, GroupCallStatus, u64)]) {
        let store = CallRecordStore::new();
        db.write(|tx| {
            for &(call_id, thread, status, ts) in rows {
                store.insert(new_group_record(call_id, thread, status, ts), tx)?;
            }
            Ok::<_, crate::error::CallRecordError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_ordering_modes() {
        let db = Database::open_in_memory().unwrap();
        seed(
            &db,
            &[
                (1, 1, GroupCallStatus::Joined, 100),
                (2, 1, GroupCallStatus::Joined, 200),
                (3, 1, GroupCallStatus::Joined, 300),
            ],
        );
        let querier = CallRecordQuerier::new(2);

        db.read(|tx| {
            assert_eq!(
                timestamps(querier.fetch_cursor(FetchOrdering::Descending, tx)),
                vec![300, 200, 100]
            );
            assert_eq!(
                timestamps(querier.fetch_cursor(FetchOrdering::DescendingBefore(250), tx)),
                vec![200, 100]
            );
            assert_eq!(
                timestamps(querier.fetch_cursor(FetchOrdering::AscendingAfter(150), tx)),
                vec![200, 300]
            );
            Ok::<_, crate::error::CallRecordError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_equal_timestamps_page_without_loss() {
        let db = Database::open_in_memory().unwrap();
        seed(
            &db,
            &[
                (1, 1, GroupCallStatus::Joined, 100),
                (2, 1, GroupCallStatus::Joined, 100),
                (3, 1, GroupCallStatus::Joined, 100),
                (4, 1, GroupCallStatus::Joined, 50),
            ],
        );
        let querier = CallRecordQuerier::new(1);

        let ids: Vec<u64> = db
            .read(|tx| {
                querier
                    .fetch_cursor(FetchOrdering::Descending, tx)
                    .map(|r| r.map(|r| r.call_id))
                    .collect::<Result<Vec<_>>>()
            })
            .unwrap();
        assert_eq!(ids, vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_filters() {
        let db = Database::open_in_memory().unwrap();
        seed(
            &db,
            &[
                (1, 1, GroupCallStatus::RingingMissed, 100),
                (2, 1, GroupCallStatus::Joined, 200),
                (3, 2, GroupCallStatus::RingingMissed, 300),
                (4, 2, GroupCallStatus::Joined, 400),
            ],
        );
        let missed = CallStatus::Group(GroupCallStatus::RingingMissed);
        let querier = CallRecordQuerier::default();

        db.read(|tx| {
            assert_eq!(
                timestamps(querier.fetch_cursor_for_status(missed, FetchOrdering::Descending, tx)),
                vec![300, 100]
            );
            assert_eq!(
                timestamps(querier.fetch_cursor_for_conversation(
                    ConversationId::Thread(2),
                    FetchOrdering::Descending,
                    tx
                )),
                vec![400, 300]
            );
            assert_eq!(
                timestamps(querier.fetch_cursor_for_conversation_and_status(
                    ConversationId::Thread(1),
                    missed,
                    FetchOrdering::AscendingAfter(0),
                    tx
                )),
                vec![100]
            );
            assert!(querier
                .fetch_cursor_for_conversation(
                    ConversationId::CallLink(1),
                    FetchOrdering::Descending,
                    tx
                )
                .next()
                .is_none());
            Ok::<_, crate::error::CallRecordError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_unread_cursor_survives_marking_read() {
        let db = Database::open_in_memory().unwrap();
        let store = CallRecordStore::new();
        db.write(|tx| {
            for (call_id, ts) in [(1, 10), (2, 20), (3, 30)] {
                store.insert(
                    new_individual_record(call_id, 1, IndividualCallStatus::IncomingMissed, ts),
                    tx,
                )?;
            }
            Ok::<_, crate::error::CallRecordError>(())
        })
        .unwrap();

        let missed = CallStatus::Individual(IndividualCallStatus::IncomingMissed);
        let querier = CallRecordQuerier::new(1);

        let marked = db
            .write(|tx| {
                let mut marked = 0;
                let mut cursor =
                    querier.fetch_cursor_for_unread(missed, FetchOrdering::Descending, tx);
                while let Some(mut record) = cursor.next_record()? {
                    store.mark_as_read(&mut record, tx)?;
                    marked += 1;
                }
                Ok::<_, crate::error::CallRecordError>(marked)
            })
            .unwrap();
        assert_eq!(marked, 3);

        let remaining = db
            .read(|tx| {
                querier
                    .fetch_cursor_for_unread_in_conversation(
                        missed,
                        ConversationId::Thread(1),
                        FetchOrdering::Descending,
                        tx,
                    )
                    .drain()
            })
            .unwrap();
        assert!(remaining.is_empty());
    }
}
