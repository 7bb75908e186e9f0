//! Testing utilities for agrewind.
//!
//! - [`TestWorld`]: isolated project tree, log root and data directory
//! - [`SessionLogBuilder`]: fluent writer for realistic session logs

pub mod log_builder;
pub mod world;

pub use log_builder::SessionLogBuilder;
pub use world::TestWorld;
