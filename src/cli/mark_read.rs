//! Mark-read command implementation

use anyhow::{Context, Result};

use crate::collaborators::StandaloneHost;
use crate::config::Config;
use crate::db::Database;
use crate::manager::MissedCallManager;
use crate::store::CallRecordQuerier;

pub fn run(db: &Database, config: &Config, before: Option<u64>) -> Result<()> {
    let manager = MissedCallManager::new(&StandaloneHost::collaborators())
        .with_querier(CallRecordQuerier::new(config.history.cursor_batch_size));

    let marked = db
        .write(|tx| manager.mark_unread_as_read(before, false, tx))
        .context("failed to mark calls as read")?;

    println!("Marked {} call(s) as read", marked);
    Ok(())
}
