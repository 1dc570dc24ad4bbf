//! Unread command implementation

use anyhow::{Context, Result};

use crate::collaborators::StandaloneHost;
use crate::config::Config;
use crate::db::Database;
use crate::error::CallRecordError;
use crate::manager::MissedCallManager;
use crate::model::CallStatus;
use crate::store::{CallRecordQuerier, FetchOrdering};

use super::list::print_records;

pub fn run(db: &Database, config: &Config) -> Result<()> {
    let querier = CallRecordQuerier::new(config.history.cursor_batch_size);
    let manager = MissedCallManager::new(&StandaloneHost::collaborators()).with_querier(querier);

    let (missed, mut records) = db
        .read(|tx| {
            let missed = manager.unread_missed_call_count(tx)?;
            let mut records = Vec::new();
            for status in CallStatus::ALL {
                for record in querier.fetch_cursor_for_unread(status, FetchOrdering::Descending, tx) {
                    records.push(record?);
                }
            }
            Ok::<_, CallRecordError>((missed, records))
        })
        .context("failed to read unread calls")?;

    println!("Unread missed calls: {}\n", missed);

    if records.is_empty() {
        return Ok(());
    }

    records.sort_by(|a, b| {
        b.call_began_timestamp
            .cmp(&a.call_began_timestamp)
            .then(b.id.cmp(&a.id))
    });
    print_records(&records);
    Ok(())
}
