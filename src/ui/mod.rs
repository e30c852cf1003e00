pub mod components;
pub mod listed;
pub mod renderfns;
pub mod view;
pub mod views;

use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Keep the selection inside a list of `len` rows, selecting the first row
/// when nothing is selected yet.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

/// Split the screen into header, content and footer rows.
pub fn screen_layout(area: Rect) -> (Rect, Rect, Rect) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(area);
  (chunks[0], chunks[1], chunks[2])
}
