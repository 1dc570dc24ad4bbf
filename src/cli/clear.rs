//! Clear command implementation

use anyhow::{Context, Result};

use crate::collaborators::StandaloneHost;
use crate::config::Config;
use crate::db::Database;
use crate::manager::CallRecordDeleteManager;
use crate::store::CallRecordQuerier;

pub fn run(db: &Database, config: &Config, before: u64) -> Result<()> {
    let manager = CallRecordDeleteManager::new(&StandaloneHost::collaborators())
        .with_querier(CallRecordQuerier::new(config.history.cursor_batch_size));

    let deleted = db
        .write(|tx| manager.delete_all_before(before, false, tx))
        .context("failed to clear call history")?;

    if deleted == 0 {
        println!("No calls at or before {}.", before);
    } else {
        println!("Deleted {} call(s)", deleted);
    }
    Ok(())
}
