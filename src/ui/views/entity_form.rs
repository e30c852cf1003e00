use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::sync::ViewSync;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::listed::{Listed, Lookup};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Create or edit one record as a list of text fields.
pub struct EntityFormView<T: Listed> {
  /// The record being edited; `None` when creating
  original: Option<T>,
  inputs: Vec<TextInput>,
  focused: usize,
  error: Option<String>,
}

impl<T: Listed> EntityFormView<T> {
  pub fn new(original: Option<T>) -> Self {
    let inputs = match &original {
      Some(record) => record.field_values().into_iter().map(TextInput::with_value).collect(),
      None => T::fields().iter().map(|_| TextInput::new()).collect(),
    };
    Self {
      original,
      inputs,
      focused: 0,
      error: None,
    }
  }

  fn values(&self) -> Vec<String> {
    self.inputs.iter().map(|input| input.value().to_string()).collect()
  }

  fn focus(&mut self, delta: isize) {
    let len = self.inputs.len() as isize;
    if len > 0 {
      self.focused = (self.focused as isize + delta).rem_euclid(len) as usize;
    }
  }

  /// Build, validate and submit. Stays open with an error on failure.
  fn submit(&mut self, sync: &mut ViewSync) -> ViewAction {
    let built = T::from_fields(self.original.as_ref(), &self.values(), &Lookup::from_sync(sync));
    let record = match built {
      Ok(record) => record,
      Err(message) => {
        self.error = Some(message);
        return ViewAction::None;
      }
    };

    match sync.save(record) {
      Ok(_) => ViewAction::Pop,
      Err(e) => {
        self.error = Some(e.to_string());
        ViewAction::None
      }
    }
  }

  fn title(&self) -> String {
    match &self.original {
      Some(record) => format!(" Edit {} {} ", T::KIND.label().to_lowercase(), record.display_name()),
      None => format!(" New {} ", T::KIND.label().to_lowercase()),
    }
  }
}

impl<T: Listed> View for EntityFormView<T> {
  fn handle_key(&mut self, key: KeyEvent, sync: &mut ViewSync) -> ViewAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Char('s') if ctrl => return self.submit(sync),
      KeyCode::Tab | KeyCode::Down => {
        self.focus(1);
        return ViewAction::None;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus(-1);
        return ViewAction::None;
      }
      _ => {}
    }

    let Some(input) = self.inputs.get_mut(self.focused) else {
      return ViewAction::None;
    };
    match input.handle_key(key) {
      InputResult::Submitted(_) if self.focused + 1 == self.inputs.len() => self.submit(sync),
      InputResult::Submitted(_) => {
        self.focus(1);
        ViewAction::None
      }
      InputResult::Consumed => {
        self.error = None;
        ViewAction::None
      }
      InputResult::Cancelled => ViewAction::Pop,
      InputResult::NotHandled => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, _sync: &ViewSync) {
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let label_width = T::fields().iter().map(|f| f.label.len()).max().unwrap_or(0);
    let mut lines: Vec<Line> = T::fields()
      .iter()
      .zip(&self.inputs)
      .enumerate()
      .map(|(i, (field, input))| {
        let focused = i == self.focused;
        let label_style = if focused {
          Style::default().fg(Color::Yellow).bold()
        } else {
          Style::default().fg(Color::DarkGray)
        };
        let mut spans = vec![Span::styled(
          format!("{:>width$}: ", field.label, width = label_width),
          label_style,
        )];
        spans.extend(input.spans(focused));
        if input.is_empty() && !field.hint.is_empty() {
          spans.push(Span::styled(
            format!("  {}", field.hint),
            Style::default().fg(Color::DarkGray).italic(),
          ));
        }
        Line::from(spans)
      })
      .collect();

    lines.push(Line::raw(""));
    if let Some(error) = &self.error {
      lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)));
    } else {
      lines.push(Line::styled(
        "Enter on the last field or Ctrl-S to save",
        Style::default().fg(Color::DarkGray),
      ));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.original {
      Some(record) => format!("Edit {}", record.display_name()),
      None => format!("New {}", T::KIND.label().to_lowercase()),
    }
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "next field").with_priority(10),
      ShortcutInfo::new("ctrl-s", "save").with_priority(20),
      ShortcutInfo::new("esc", "cancel").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::ResultCache;
  use crate::config::PaginationConfig;
  use crate::gateway::{Action, Gateway, GatewayError, Params};
  use crate::model::Product;
  use futures::future::BoxFuture;
  use futures::FutureExt;
  use serde_json::{json, Value};
  use std::sync::Arc;

  struct AcceptAll;

  impl Gateway for AcceptAll {
    fn call(&self, _action: Action, params: Params) -> BoxFuture<'static, Result<Value, GatewayError>> {
      let id = params.get("id").cloned().unwrap_or(Value::Null);
      async move { Ok(json!({ "success": true, "id": id })) }.boxed()
    }
  }

  fn sync() -> ViewSync {
    ViewSync::new(Arc::new(AcceptAll), ResultCache::in_memory(), &PaginationConfig::default())
  }

  fn press(form: &mut EntityFormView<Product>, sync: &mut ViewSync, code: KeyCode) -> ViewAction {
    form.handle_key(KeyEvent::new(code, KeyModifiers::NONE), sync)
  }

  fn type_text(form: &mut EntityFormView<Product>, sync: &mut ViewSync, text: &str) {
    for c in text.chars() {
      press(form, sync, KeyCode::Char(c));
    }
  }

  #[tokio::test]
  async fn test_blank_name_stays_open_with_error() {
    let mut sync = sync();
    let mut form = EntityFormView::<Product>::new(None);

    let action = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL), &mut sync);

    assert!(matches!(action, ViewAction::None));
    assert!(form.error.is_some());
    assert_eq!(sync.pending_mutations(), 0);
  }

  #[tokio::test]
  async fn test_valid_form_submits_and_closes() {
    let mut sync = sync();
    let mut form = EntityFormView::<Product>::new(None);

    press(&mut form, &mut sync, KeyCode::Tab);
    type_text(&mut form, &mut sync, "Pipe");
    let action = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL), &mut sync);

    assert!(matches!(action, ViewAction::Pop));
    assert_eq!(sync.pending_mutations(), 1);
  }

  #[tokio::test]
  async fn test_bad_number_reported() {
    let mut sync = sync();
    let mut form = EntityFormView::<Product>::new(None);

    press(&mut form, &mut sync, KeyCode::Tab);
    type_text(&mut form, &mut sync, "Pipe");
    for _ in 0..4 {
      press(&mut form, &mut sync, KeyCode::Tab);
    }
    type_text(&mut form, &mut sync, "cheap");
    let action = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL), &mut sync);

    assert!(matches!(action, ViewAction::None));
    assert!(form.error.as_deref().unwrap_or("").starts_with("Price"));
  }

  #[test]
  fn test_focus_wraps() {
    let mut form = EntityFormView::<Product>::new(None);
    form.focus(-1);
    assert_eq!(form.focused, Product::fields().len() - 1);
    form.focus(1);
    assert_eq!(form.focused, 0);
  }
}
