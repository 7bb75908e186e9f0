// Runtime layer - what the transport talks to
// Workspace (sync) and Client (async) expose session listing, turn and change
// review, and reverts backed by the ledger.

pub mod client;
pub mod config;
pub mod error;
pub mod locks;
pub mod revert;
pub mod scan;
pub mod workspace;

pub use client::Client;
pub use config::Config;
pub use error::{Error, Result, RevertRejected};
pub use locks::KeyedLocks;
pub use revert::RevertEngine;
pub use scan::{InterruptOnDrop, ScanInterrupt};
pub use workspace::Workspace;
