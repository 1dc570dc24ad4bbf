//! List command implementation

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::db::Database;
use crate::error::CallRecordError;
use crate::model::{CallRecord, CallStatus, CallUnreadStatus, ConversationId};
use crate::store::{CallRecordQuerier, CallRecordStore, FetchOrdering};

pub fn run(
    db: &Database,
    config: &Config,
    conversation: Option<ConversationId>,
    status: Option<CallStatus>,
    limit: Option<usize>,
) -> Result<()> {
    let querier = CallRecordQuerier::new(config.history.cursor_batch_size);
    let ordering = FetchOrdering::Descending;

    let records = db
        .read(|tx| {
            let cursor = match (conversation, status) {
                (Some(conversation), None) => {
                    let limit = limit.or(config.history.fetch_all_limit);
                    return CallRecordStore::new().fetch_all(conversation, limit, tx);
                }
                (Some(conversation), Some(status)) => querier
                    .fetch_cursor_for_conversation_and_status(conversation, status, ordering, tx),
                (None, Some(status)) => querier.fetch_cursor_for_status(status, ordering, tx),
                (None, None) => querier.fetch_cursor(ordering, tx),
            };
            cursor
                .take(limit.unwrap_or(usize::MAX))
                .collect::<Result<Vec<_>, CallRecordError>>()
        })
        .context("failed to read call records")?;

    if records.is_empty() {
        println!("No calls found.");
        return Ok(());
    }

    print_records(&records);
    Ok(())
}

pub(crate) fn print_records(records: &[CallRecord]) {
    println!(
        "{:<12} {:<22} {:<12} {:<10} {:<30} {}",
        "Began", "Call ID", "Conversation", "Direction", "Status", "Unread"
    );
    println!("{}", "-".repeat(96));

    for record in records {
        let began = i64::try_from(record.call_began_timestamp)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|ts| ts.format("%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        let unread = match record.unread_status {
            CallUnreadStatus::Unread => "*",
            CallUnreadStatus::Read => "",
        };

        println!(
            "{:<12} {:<22} {:<12} {:<10} {:<30} {}",
            began,
            record.call_id,
            record.conversation_id.to_string(),
            format!("{:?}", record.call_direction).to_lowercase(),
            record.call_status.to_string(),
            unread,
        );
    }
}
