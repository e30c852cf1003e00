use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::sync::ViewSync;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views read collections from the session's [`ViewSync`] when rendering
/// and ask it for loads and mutations when handling keys. They never own
/// entity data, so every view sees the latest applied state.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent, sync: &mut ViewSync) -> ViewAction;

  fn render(&mut self, frame: &mut Frame, area: Rect, sync: &ViewSync);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called when the view becomes visible
  fn on_enter(&mut self, _sync: &mut ViewSync) {}

  /// True while the view is taking text input, so `:` and `q` reach it
  /// instead of the app.
  fn captures_input(&self) -> bool {
    false
  }

  /// Keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
