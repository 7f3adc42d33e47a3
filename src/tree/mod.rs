//! Source tree model
//!
//! Entries, modes and logical paths of the content-addressed source tree, plus
//! the snapshot importer that turns a local directory into stored objects.

pub mod builder;
pub mod entry;
pub mod hasher;
pub mod mode;
pub mod path;
pub mod walker;

pub use entry::{Child, Content, Entry, Resolved};
pub use mode::EntryMode;
