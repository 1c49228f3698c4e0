//! Requests submitted to the coordinator

use crate::collector::Snapshot;
use crate::input::Command;
use std::fmt;

/// What caused a snapshot refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Filesystem,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Timer => f.write_str("timer"),
            Trigger::Filesystem => f.write_str("filesystem"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    QuitKey,
    Interrupt,
    Terminate,
    /// Every request sender is gone.
    Disconnected,
}

/// A mutation (or a plain redraw) for the coordinator to apply.
///
/// Requests are applied strictly in the order they arrive on the channel.
#[derive(Debug)]
pub enum Request {
    ReplaceSnapshot { trigger: Trigger, snapshot: Snapshot },
    Key(Command),
    /// Terminal geometry changed; redraw without touching the selection.
    Redraw,
    Shutdown(ShutdownReason),
    /// The terminal input stream failed. Fatal.
    InputFailed(std::io::Error),
}
