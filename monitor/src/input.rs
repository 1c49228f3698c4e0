//! Keyboard input: maps terminal events to coordinator requests

use crate::protocol::{Request, ShutdownReason};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    Quit,
    Noop,
}

pub fn map_key(key: KeyEvent) -> Command {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Command::Up,
        KeyCode::Down | KeyCode::Char('j') => Command::Down,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        _ => Command::Noop,
    }
}

/// Translate one terminal event into a request, if it warrants one.
pub fn to_request(event: Event) -> Option<Request> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(Request::Key(map_key(key))),
        Event::Resize(_, _) => Some(Request::Redraw),
        _ => None,
    }
}

/// Forward terminal events to the coordinator until shutdown.
///
/// Reading the next event is the only suspension point. A stream error is
/// forwarded as [`Request::InputFailed`] and ends the loop; a quit key ends it
/// right after submitting.
pub async fn forward_events<S>(
    mut events: S,
    requests: mpsc::UnboundedSender<Request>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: Stream<Item = std::io::Result<Event>> + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = shutdown.changed() => break,
            next = events.next() => next,
        };
        let request = match next {
            Some(Ok(event)) => match to_request(event) {
                Some(request) => request,
                None => continue,
            },
            Some(Err(e)) => {
                error!("Terminal input failed: {}", e);
                let _ = requests.send(Request::InputFailed(e));
                break;
            }
            None => {
                debug!("Terminal input stream closed");
                let _ = requests.send(Request::Shutdown(ShutdownReason::Disconnected));
                break;
            }
        };
        let quit = matches!(request, Request::Key(Command::Quit));
        if requests.send(request).is_err() || quit {
            break;
        }
    }
}
