//! procspy: a live terminal view of running processes.
//!
//! Snapshots of `/proc` are taken on a timer and whenever a watched
//! directory sees activity; the list is drawn with ratatui and navigated
//! with the arrow keys. All state changes go through one [`coordinator`].

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod collector;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod input;
pub mod protocol;
pub mod refresher;
pub mod signals;
pub mod state;
pub mod terminal;
pub mod ui;
pub mod watcher;
