//! Event handling: turns terminal key events into [`crate::app::App`] changes.

pub mod keys;
