//! treexport: export content-addressed source trees onto a real filesystem
//!
//! A source tree stored in an object database is copied onto a destination
//! directory. Files whose content hash matches what was last exported for the
//! same path are skipped, symlinks are materialized as copies of their targets,
//! and sibling entries are exported concurrently.

pub mod cli;
pub mod config;
pub mod dest;
pub mod error;
pub mod export;
pub mod hook;
pub mod logging;
pub mod memory;
pub mod progress;
pub mod store;
pub mod tree;
pub mod types;
