//! SQLite schema for call records and their tombstones
//!
//! Every cursor the querier hands out is backed by one of the indexes
//! below, so no supported filter needs a table scan or a temporary sort.

pub const SCHEMA: &str = r#"
-- ============================================
-- CALL RECORDS
-- ============================================

CREATE TABLE IF NOT EXISTS CallRecord (
    id INTEGER PRIMARY KEY NOT NULL,
    callId TEXT NOT NULL,                      -- u64 as decimal string
    interactionRowId INTEGER NOT NULL UNIQUE,  -- timeline entry mirroring the call
    threadRowId INTEGER,
    callLinkRowId INTEGER,
    type INTEGER NOT NULL,
    direction INTEGER NOT NULL,
    status INTEGER NOT NULL,                   -- flat status, see model::status
    unreadStatus INTEGER NOT NULL,
    callBeganTimestamp INTEGER NOT NULL,
    callEndedTimestamp INTEGER NOT NULL DEFAULT 0, -- 0 = not ended
    groupCallRingerAci BLOB,
    CHECK ((threadRowId IS NULL) != (callLinkRowId IS NULL))
);

CREATE UNIQUE INDEX IF NOT EXISTS CallRecord_threadRowId_callId
    ON CallRecord(threadRowId, callId) WHERE threadRowId IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS CallRecord_callLinkRowId_callId
    ON CallRecord(callLinkRowId, callId) WHERE callLinkRowId IS NOT NULL;

-- ============================================
-- DELETED CALL RECORDS (tombstones)
-- ============================================

CREATE TABLE IF NOT EXISTS DeletedCallRecord (
    id INTEGER PRIMARY KEY NOT NULL,
    callId TEXT NOT NULL,
    threadRowId INTEGER,
    callLinkRowId INTEGER,
    deletedAtTimestamp INTEGER NOT NULL,
    CHECK ((threadRowId IS NULL) != (callLinkRowId IS NULL))
);

CREATE UNIQUE INDEX IF NOT EXISTS DeletedCallRecord_threadRowId_callId
    ON DeletedCallRecord(threadRowId, callId) WHERE threadRowId IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS DeletedCallRecord_callLinkRowId_callId
    ON DeletedCallRecord(callLinkRowId, callId) WHERE callLinkRowId IS NOT NULL;
CREATE INDEX IF NOT EXISTS DeletedCallRecord_deletedAtTimestamp
    ON DeletedCallRecord(deletedAtTimestamp);

-- ============================================
-- QUERY INDEXES
-- ============================================

-- Unfiltered history
CREATE INDEX IF NOT EXISTS CallRecord_callBeganTimestamp
    ON CallRecord(callBeganTimestamp);

-- By status
CREATE INDEX IF NOT EXISTS CallRecord_status_callBeganTimestamp
    ON CallRecord(status, callBeganTimestamp);

-- By conversation
CREATE INDEX IF NOT EXISTS CallRecord_threadRowId_callBeganTimestamp
    ON CallRecord(threadRowId, callBeganTimestamp) WHERE threadRowId IS NOT NULL;
CREATE INDEX IF NOT EXISTS CallRecord_callLinkRowId_callBeganTimestamp
    ON CallRecord(callLinkRowId, callBeganTimestamp) WHERE callLinkRowId IS NOT NULL;

-- By conversation and status
CREATE INDEX IF NOT EXISTS CallRecord_threadRowId_status_callBeganTimestamp
    ON CallRecord(threadRowId, status, callBeganTimestamp) WHERE threadRowId IS NOT NULL;
CREATE INDEX IF NOT EXISTS CallRecord_callLinkRowId_status_callBeganTimestamp
    ON CallRecord(callLinkRowId, status, callBeganTimestamp) WHERE callLinkRowId IS NOT NULL;

-- Unread, optionally by conversation
CREATE INDEX IF NOT EXISTS CallRecord_status_unreadStatus_callBeganTimestamp
    ON CallRecord(status, unreadStatus, callBeganTimestamp);
CREATE INDEX IF NOT EXISTS CallRecord_threadRowId_status_unreadStatus_callBeganTimestamp
    ON CallRecord(threadRowId, status, unreadStatus, callBeganTimestamp) WHERE threadRowId IS NOT NULL;
CREATE INDEX IF NOT EXISTS CallRecord_callLinkRowId_status_unreadStatus_callBeganTimestamp
    ON CallRecord(callLinkRowId, status, unreadStatus, callBeganTimestamp) WHERE callLinkRowId IS NOT NULL;
"#;
