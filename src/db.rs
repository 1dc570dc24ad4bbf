//! SQLite database handle, transactions and post-commit change notification
//!
//! Every store operation runs inside a transaction handed out by
//! [`Database::read`] or [`Database::write`]. Change notifications raised
//! during a write are held on the transaction and published to the
//! [`ChangeSink`] only after the commit succeeds. Commit hooks registered
//! on a write transaction run after that, and never on rollback.

use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::model::CallRecordId;
use crate::store::SCHEMA;

/// A change to the call record table, observable after commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRecordChange {
    Inserted,
    Deleted { ids: Vec<CallRecordId> },
    StatusUpdated { id: CallRecordId },
}

/// Receiver of committed call record changes (typically the UI layer).
pub trait ChangeSink: Send + Sync {
    fn publish(&self, change: &CallRecordChange);
}

/// Sink that drops every change.
pub struct NoopChangeSink;

impl ChangeSink for NoopChangeSink {
    fn publish(&self, _change: &CallRecordChange) {}
}

/// Anything that can serve reads: both read and write transactions.
pub trait ReadTx {
    fn conn(&self) -> &Connection;
}

pub struct DbReadTx<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl ReadTx for DbReadTx<'_> {
    fn conn(&self) -> &Connection {
        &self.tx
    }
}

type CommitHook = Box<dyn FnOnce(&Database)>;

pub struct DbWriteTx<'a> {
    tx: rusqlite::Transaction<'a>,
    changes: RefCell<Vec<CallRecordChange>>,
    commit_hooks: RefCell<Vec<CommitHook>>,
}

impl DbWriteTx<'_> {
    /// Queue a change to publish once this transaction commits.
    pub(crate) fn push_change(&self, change: CallRecordChange) {
        self.changes.borrow_mut().push(change);
    }

    /// Run `hook` once this transaction has committed, outside of it.
    /// Dropped unrun if the transaction rolls back.
    pub(crate) fn on_commit(&self, hook: impl FnOnce(&Database) + 'static) {
        self.commit_hooks.borrow_mut().push(Box::new(hook));
    }
}

impl ReadTx for DbWriteTx<'_> {
    fn conn(&self) -> &Connection {
        &self.tx
    }
}

pub struct Database {
    conn: Connection,
    sink: Arc<dyn ChangeSink>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            sink: Arc::new(NoopChangeSink),
        })
    }

    /// Replace the sink that receives committed changes.
    pub fn with_change_sink(mut self, sink: Arc<dyn ChangeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Raw connection, for collaborators sharing this database file.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn read<T, E>(&self, f: impl FnOnce(&DbReadTx<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let tx = DbReadTx {
            tx: self.conn.unchecked_transaction()?,
        };
        let value = f(&tx)?;
        tx.tx.commit()?;
        Ok(value)
    }

    /// Run `f` in a write transaction. Returning `Err` rolls back and
    /// discards any changes and commit hooks queued by `f`.
    pub fn write<T, E>(&self, f: impl FnOnce(&DbWriteTx<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let tx = DbWriteTx {
            tx: self.conn.unchecked_transaction()?,
            changes: RefCell::new(Vec::new()),
            commit_hooks: RefCell::new(Vec::new()),
        };

        // Rollback happens when `tx` drops on the error path.
        let value = f(&tx)?;

        let DbWriteTx {
            tx,
            changes,
            commit_hooks,
        } = tx;
        tx.commit()?;

        for change in changes.into_inner() {
            self.sink.publish(&change);
        }
        for hook in commit_hooks.into_inner() {
            hook(self);
        }

        Ok(value)
    }
}
