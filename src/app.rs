use crate::commands;
use crate::event::{Event, EventHandler};
use crate::model::{Customer, EntityKind, Product, Quotation};
use crate::sync::{NoticeLevel, ViewSync};
use crate::ui::components::{draw_footer, CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::draw_header;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::EntityListView;
use crate::ui::screen_layout;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Section shown at the root of the stack
  root: EntityKind,

  /// `:` command line
  command_input: CommandInput,

  /// Collections, cache and mutation state shared by every view
  sync: ViewSync,

  /// Shown in the header
  title: String,
  endpoint_host: String,

  /// Whether to quit
  should_quit: bool,
}

fn root_view(kind: EntityKind) -> Box<dyn View> {
  match kind {
    EntityKind::Quotation => Box::new(EntityListView::<Quotation>::new()),
    EntityKind::Product => Box::new(EntityListView::<Product>::new()),
    EntityKind::Customer => Box::new(EntityListView::<Customer>::new()),
  }
}

impl App {
  pub fn new(sync: ViewSync, title: String, endpoint_host: String, start: EntityKind) -> Self {
    let mut app = Self {
      view_stack: Vec::new(),
      root: start,
      command_input: CommandInput::new(),
      sync,
      title,
      endpoint_host,
      should_quit: false,
    };
    app.switch_root(start);
    app
  }

  pub async fn run(mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.main_loop().await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    self.sync.close();
    result
  }

  async fn main_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        self.sync.poll();
        self.sync.prune_notices();
      }
      Event::Resize => {}
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Command line takes everything while open
    match self.command_input.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(cmd)) => {
        self.execute_command(&cmd);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    let Some(view) = self.view_stack.last_mut() else {
      return;
    };
    if key.code == KeyCode::Char(':') && !view.captures_input() {
      self.command_input.activate();
      return;
    }

    let action = view.handle_key(key, &mut self.sync);
    self.apply_action(action);
  }

  fn apply_action(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(mut view) => {
        view.on_enter(&mut self.sync);
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  /// Replace the whole stack with the list for `kind`.
  fn switch_root(&mut self, kind: EntityKind) {
    debug!(section = kind.plural(), "switching section");
    let mut view = root_view(kind);
    view.on_enter(&mut self.sync);
    self.view_stack.clear();
    self.view_stack.push(view);
    self.root = kind;
  }

  fn execute_command(&mut self, input: &str) {
    let Some(cmd) = commands::find(input) else {
      self
        .sync
        .notify(NoticeLevel::Error, format!("Unknown command: {}", input.trim()));
      return;
    };

    match cmd.name {
      "quotations" => self.switch_root(EntityKind::Quotation),
      "products" => self.switch_root(EntityKind::Product),
      "customers" => self.switch_root(EntityKind::Customer),
      "refresh" => {
        info!(section = self.root.plural(), "manual refresh");
        self.sync.refresh(self.root);
      }
      "quit" => self.should_quit = true,
      _ => {}
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let (header_area, content_area, footer_area) = screen_layout(frame.area());

    let shortcuts = self.view_stack.last().map(|v| v.shortcuts()).unwrap_or_default();
    draw_header(frame, header_area, &self.title, &self.endpoint_host, &shortcuts);

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, content_area, &self.sync);
    }

    draw_footer(
      frame,
      footer_area,
      &self.view_breadcrumb(),
      self.sync.latest_notice(),
      self.sync.is_busy(),
    );

    self.command_input.render_overlay(frame, content_area);
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::ResultCache;
  use crate::config::PaginationConfig;
  use crate::gateway::{Action, Gateway, GatewayError, Params};
  use futures::future::BoxFuture;
  use futures::FutureExt;
  use serde_json::{json, Value};
  use std::sync::Arc;

  /// Every list is empty and every mutation succeeds.
  struct EmptyGateway;

  impl Gateway for EmptyGateway {
    fn call(&self, _action: Action, _params: Params) -> BoxFuture<'static, Result<Value, GatewayError>> {
      async { Ok(json!({ "items": [], "success": true })) }.boxed()
    }
  }

  fn app() -> App {
    let sync = ViewSync::new(
      Arc::new(EmptyGateway),
      ResultCache::in_memory(),
      &PaginationConfig::default(),
    );
    App::new(sync, "Shop".into(), "example.com".into(), EntityKind::Quotation)
  }

  fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
  }

  fn type_command(app: &mut App, cmd: &str) {
    press(app, KeyCode::Char(':'));
    for c in cmd.chars() {
      press(app, KeyCode::Char(c));
    }
    press(app, KeyCode::Enter);
  }

  #[tokio::test]
  async fn test_command_switches_section() {
    let mut app = app();
    assert_eq!(app.view_breadcrumb(), vec!["Quotations"]);

    type_command(&mut app, "cust");
    assert_eq!(app.root, EntityKind::Customer);
    assert_eq!(app.view_breadcrumb(), vec!["Customers"]);
  }

  #[tokio::test]
  async fn test_form_push_and_pop() {
    let mut app = app();
    type_command(&mut app, "products");

    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.view_breadcrumb(), vec!["Products", "New product"]);

    // Forms take ':' as text, so Esc is the only way out
    press(&mut app, KeyCode::Char(':'));
    assert!(!app.command_input.is_active());
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.view_breadcrumb(), vec!["Products"]);
  }

  #[tokio::test]
  async fn test_quit_from_root() {
    let mut app = app();
    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_ctrl_c_quits_anywhere() {
    let mut app = app();
    press(&mut app, KeyCode::Char('a'));
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }
}
