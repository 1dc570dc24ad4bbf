pub mod cli;
pub mod collaborators;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod manager;
pub mod model;
pub mod policy;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use collaborators::{Collaborators, ConversationResolver, SyncTransport, TimelineEntryOwner};
pub use config::Config;
pub use db::{CallRecordChange, ChangeSink, Database};
pub use error::{CallRecordError, Result};
pub use model::{CallRecord, CallStatus, ConversationId};
