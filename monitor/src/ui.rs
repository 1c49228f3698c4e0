//! Frame rendering

use crate::collector::ProcessRecord;
use crate::state::ViewState;
use chrono::{DateTime, Local};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub const TITLE: &str = "Process Monitor";
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Rows lost to the panel border.
pub const BORDER_ROWS: u16 = 2;

/// Draw the whole panel for `view`. Reads the view, never changes it.
pub fn draw(frame: &mut Frame, view: &ViewState, now: DateTime<Local>) {
    let area = frame.area();
    let snapshot = view.snapshot();

    let mut block = Block::default().borders(Borders::ALL).title(TITLE);
    if snapshot.is_truncated() {
        block = block.title_bottom(format!(" showing first {} processes ", snapshot.len()));
    }

    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    let selected = view.selected_index();
    let rows = usize::from(area.height.saturating_sub(BORDER_ROWS));
    let lines: Vec<Line> = view
        .window(rows)
        .filter_map(|i| snapshot.get(i).map(|record| (i, record)))
        .map(|(i, record)| {
            let text = format_row(&stamp, record);
            if Some(i) == selected {
                Line::styled(text, Style::default().add_modifier(Modifier::REVERSED))
            } else {
                Line::raw(text)
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn format_row(stamp: &str, record: &ProcessRecord) -> String {
    format!(
        "{} CMD: {:<10} UID: {:<10} PID: {:<10}",
        stamp, record.command, record.owner, record.pid
    )
}
