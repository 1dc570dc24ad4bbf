//! Subcommand implementations for the `callhistory` binary
//!
//! Every command works on the local database alone and never announces
//! anything to linked devices.

pub mod clear;
pub mod list;
pub mod mark_read;
pub mod unread;
