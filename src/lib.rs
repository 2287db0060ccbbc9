//! snippy: a terminal snippet manager.
//!
//! The library holds the record store, fork tracking and the staged reorder
//! workflow, plus the optional REST backend mirror. The `snippy` binary puts
//! a ratatui interface and a one-shot CLI on top.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod editor;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod reorder;
pub mod search;
pub mod session;
pub mod store;
pub mod sync;
pub mod ui;

pub use reorder::{PositionSink, ReorderList, ReorderState, Reorderable};
pub use session::Session;
pub use store::{RecordStore, SnippetScope};
