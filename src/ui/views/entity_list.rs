use std::marker::PhantomData;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::store::SyncState;
use crate::sync::ViewSync;
use crate::ui::components::{ConfirmPrompt, KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::listed::Listed;
use crate::ui::renderfns::cell;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::EntityFormView;

/// Root list for one entity kind.
pub struct EntityListView<T: Listed> {
  list_state: ListState,
  search: SearchInput,
  filter: String,
  confirm: ConfirmPrompt,
  _kind: PhantomData<T>,
}

impl<T: Listed> EntityListView<T> {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
      search: SearchInput::new(),
      filter: String::new(),
      confirm: ConfirmPrompt::new(),
      _kind: PhantomData,
    }
  }

  fn visible<'a>(&self, sync: &'a ViewSync) -> Vec<&'a T> {
    let query = self.filter.to_lowercase();
    T::collection(sync)
      .items()
      .iter()
      .filter(|item| query.is_empty() || item.matches(&query))
      .collect()
  }

  fn selected<'a>(&self, sync: &'a ViewSync) -> Option<&'a T> {
    let index = self.list_state.selected()?;
    self.visible(sync).get(index).copied()
  }

  fn title(&self, sync: &ViewSync) -> String {
    let collection = T::collection(sync);
    let count = if self.filter.is_empty() {
      collection.items().len().to_string()
    } else {
      format!("{}/{}", self.visible(sync).len(), collection.items().len())
    };
    let more = if collection.store().has_more() { "+" } else { "" };

    match collection.store().state() {
      SyncState::Empty | SyncState::Loading => format!(" {} (loading...) ", T::KIND.plural()),
      SyncState::LoadingMore => format!(" {} ({}{}, loading more...) ", T::KIND.plural(), count, more),
      SyncState::LoadFailed(e) => format!(" {} ({}) (error: {}) ", T::KIND.plural(), count, e),
      SyncState::Loaded => format!(" {} ({}{}) ", T::KIND.plural(), count, more),
    }
  }

  fn header_line() -> Line<'static> {
    let text = T::columns()
      .iter()
      .map(|(title, width)| cell(title, *width))
      .collect::<Vec<_>>()
      .join(" ");
    Line::styled(
      format!("  {}", text),
      Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
    )
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect, sync: &ViewSync) {
    let visible = self.visible(sync);
    ensure_valid_selection(&mut self.list_state, visible.len());

    let block = Block::default()
      .title(self.title(sync))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(0)])
      .split(inner);
    frame.render_widget(Paragraph::new(Self::header_line()), chunks[0]);

    let state = T::collection(sync).store().state();
    if visible.is_empty() {
      let content = match state {
        SyncState::Empty | SyncState::Loading => "Loading...".to_string(),
        SyncState::LoadFailed(_) => "Failed to load. Press 'r' to retry.".to_string(),
        _ if !self.filter.is_empty() => format!("Nothing matches '{}'.", self.filter),
        _ => format!("No {} yet. Press 'a' to add one.", T::KIND.plural().to_lowercase()),
      };
      let paragraph = Paragraph::new(content).style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, chunks[1]);
      return;
    }

    let items: Vec<ListItem> = visible.iter().map(|item| ListItem::new(item.row())).collect();
    let list = List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
  }
}

impl<T: Listed> Default for EntityListView<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Listed> View for EntityListView<T> {
  fn handle_key(&mut self, key: KeyEvent, sync: &mut ViewSync) -> ViewAction {
    // Confirmation prompt swallows everything while shown
    match self.confirm.handle_key(key) {
      KeyResult::Event(id) => {
        sync.delete(T::KIND, &id);
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.filter = query;
        self.list_state.select(Some(0));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.list_state.select_last(),
      KeyCode::Char('r') => {
        if T::collection(sync).store().state().error().is_some() {
          sync.retry(T::KIND);
        } else {
          sync.load_first_page(T::KIND);
        }
      }
      KeyCode::Char('n') => {
        sync.load_next_page(T::KIND);
      }
      KeyCode::Char('a') => {
        return ViewAction::Push(Box::new(EntityFormView::<T>::new(None)));
      }
      KeyCode::Char('e') => {
        if let Some(item) = self.selected(sync) {
          return ViewAction::Push(Box::new(EntityFormView::new(Some(item.clone()))));
        }
      }
      KeyCode::Char('d') => {
        if let Some(item) = self.selected(sync) {
          let message = format!("Delete {} {}?", T::KIND.label().to_lowercase(), item.display_name());
          self.confirm.show(item.id().to_string(), message);
        }
      }
      KeyCode::Enter => {
        if let Some(view) = self.selected(sync).and_then(|item| item.detail_view()) {
          return ViewAction::Push(view);
        }
      }
      KeyCode::Esc if !self.filter.is_empty() => {
        self.filter.clear();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, sync: &ViewSync) {
    self.render_list(frame, area, sync);
    self.search.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    if self.filter.is_empty() {
      T::KIND.plural().to_string()
    } else {
      format!("{} [/{}]", T::KIND.plural(), self.filter)
    }
  }

  fn on_enter(&mut self, sync: &mut ViewSync) {
    sync.open(T::KIND);
  }

  fn captures_input(&self) -> bool {
    self.search.is_active() || self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "filter").with_priority(20),
      ShortcutInfo::new("a", "add").with_priority(30),
      ShortcutInfo::new("e", "edit").with_priority(31),
      ShortcutInfo::new("d", "delete").with_priority(32),
      ShortcutInfo::new("n", "more").with_priority(40),
      ShortcutInfo::new("r", "reload").with_priority(41),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
