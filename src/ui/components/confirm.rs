use super::KeyResult;
use crate::ui::renderfns::centered;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// y/n prompt guarding a destructive action on one record.
#[derive(Debug, Clone, Default)]
pub struct ConfirmPrompt {
  /// Id of the record the prompt is about
  target: Option<String>,
  message: String,
}

impl ConfirmPrompt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.target.is_some()
  }

  pub fn show(&mut self, target: String, message: String) {
    self.target = Some(target);
    self.message = message;
  }

  /// While shown, swallows every key. `y` yields the target id.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<String> {
    let Some(target) = self.target.as_ref() else {
      return KeyResult::NotHandled;
    };
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => {
        let target = target.clone();
        self.target = None;
        KeyResult::Event(target)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
        self.target = None;
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  fn overlay_width(&self) -> u16 {
    u16::try_from(self.message.chars().count())
      .unwrap_or(u16::MAX)
      .saturating_add(6)
      .max(30)
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.is_active() {
      return;
    }

    let overlay_area = centered(area, self.overlay_width(), 4);

    frame.render_widget(Clear, overlay_area);
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Confirm ");
    let lines = vec![
      Line::raw(self.message.as_str()),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" no", Style::default().fg(Color::DarkGray)),
      ]),
    ];
    frame.render_widget(
      Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
      overlay_area,
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_yes_returns_target() {
    let mut prompt = ConfirmPrompt::new();
    prompt.show("P1".into(), "Delete product Pipe?".into());

    assert_eq!(prompt.handle_key(key(KeyCode::Char('x'))), KeyResult::Handled);
    assert!(prompt.is_active());
    assert_eq!(
      prompt.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event("P1".to_string())
    );
    assert!(!prompt.is_active());
  }

  #[test]
  fn test_no_dismisses() {
    let mut prompt = ConfirmPrompt::new();
    prompt.show("P1".into(), "Delete?".into());
    assert_eq!(prompt.handle_key(key(KeyCode::Char('n'))), KeyResult::Handled);
    assert!(!prompt.is_active());
    assert_eq!(prompt.handle_key(key(KeyCode::Char('y'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_overlay_width_saturates_on_long_message() {
    let mut prompt = ConfirmPrompt::new();
    prompt.show("P1".into(), "x".repeat(70_000));
    assert_eq!(prompt.overlay_width(), u16::MAX);

    prompt.show("P1".into(), "Delete?".into());
    assert_eq!(prompt.overlay_width(), 30);
  }

  #[test]
  fn test_long_message_renders_inside_area() {
    let mut prompt = ConfirmPrompt::new();
    prompt.show("P1".into(), "x".repeat(70_000));

    let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(40, 10)).unwrap();
    terminal
      .draw(|frame| prompt.render_overlay(frame, frame.area()))
      .unwrap();
  }
}
