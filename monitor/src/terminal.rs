//! Terminal ownership: raw mode and the alternate screen

use crate::coordinator::Surface;
use crate::state::ViewState;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use tracing::warn;

/// Holds the terminal in raw mode on the alternate screen.
///
/// `leave` restores it; dropping an active session restores it too, so an
/// early return or a panic still hands back a usable shell.
pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl TerminalSession {
    pub fn enter() -> std::io::Result<Self> {
        enable_raw_mode()?;
        match Self::setup() {
            Ok(terminal) => Ok(Self {
                terminal,
                active: true,
            }),
            Err(e) => {
                let _ = stdout().execute(LeaveAlternateScreen);
                let _ = disable_raw_mode();
                Err(e)
            }
        }
    }

    fn setup() -> std::io::Result<Terminal<CrosstermBackend<Stdout>>> {
        let mut out = stdout();
        out.execute(EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(out))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(terminal)
    }

    pub fn leave(mut self) -> std::io::Result<()> {
        self.restore()
    }

    /// Every step runs even if an earlier one fails; the first error wins.
    fn restore(&mut self) -> std::io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let cleared = self.terminal.clear();
        let raw = disable_raw_mode();
        let screen = self
            .terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .map(|_| ());
        let cursor = self.terminal.show_cursor();
        cleared.and(raw).and(screen).and(cursor)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}

impl Surface for TerminalSession {
    fn rows(&mut self) -> std::io::Result<u16> {
        self.terminal.rows()
    }

    fn draw(&mut self, view: &ViewState) -> std::io::Result<()> {
        Surface::draw(&mut self.terminal, view)
    }
}
