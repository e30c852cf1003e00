use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::model::{EntityKind, Quotation};
use crate::sync::{CollectionControl, ViewSync};
use crate::ui::renderfns::{cell, money, quantity, status_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::EntityFormView;

/// Header, line items and total of one quotation.
pub struct QuotationDetailView {
  id: String,
  scroll: u16,
}

impl QuotationDetailView {
  pub fn new(id: String) -> Self {
    Self { id, scroll: 0 }
  }

  fn lines(quotation: &Quotation) -> Vec<Line<'static>> {
    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::DarkGray));
    let date = quotation.date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());

    let mut lines = vec![
      Line::from(vec![label("Customer: "), Span::raw(quotation.customer_name.clone())]),
      Line::from(vec![
        label("Date: "),
        Span::raw(date),
        Span::raw("  "),
        label("Status: "),
        Span::styled(
          quotation.status.to_string(),
          Style::default().fg(status_color(quotation.status)),
        ),
      ]),
    ];
    if !quotation.notes.is_empty() {
      lines.push(Line::from(vec![label("Notes: "), Span::raw(quotation.notes.clone())]));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
      format!(
        "{} {} {:>8} {:>10} {:>12}",
        cell("Product", 10),
        cell("Name", 28),
        "Qty",
        "Price",
        "Line total"
      ),
      Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
    ));
    for item in &quotation.items {
      lines.push(Line::raw(format!(
        "{} {} {:>8} {:>10} {:>12}",
        cell(&item.product_id, 10),
        cell(&item.product_name, 28),
        quantity(item.quantity),
        money(item.unit_price),
        money(item.line_total)
      )));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
      label("Total: "),
      Span::styled(money(quotation.total), Style::default().fg(Color::Yellow).bold()),
    ]));
    lines
  }
}

impl View for QuotationDetailView {
  fn handle_key(&mut self, key: KeyEvent, sync: &mut ViewSync) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Char('e') => {
        if let Some(quotation) = sync.quotations().get(&self.id) {
          return ViewAction::Push(Box::new(EntityFormView::new(Some(quotation.clone()))));
        }
      }
      KeyCode::Char('r') => {
        sync.load_first_page(EntityKind::Quotation);
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, sync: &ViewSync) {
    let quotation = sync.quotations().get(&self.id);
    let title = match quotation {
      Some(q) => format!(" Quotation {} ", q.customer_name),
      None => " Quotation ".to_string(),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    // The list reloads after every change, so the record may be gone for a moment
    let paragraph = match quotation {
      Some(q) => Paragraph::new(Self::lines(q)).scroll((self.scroll, 0)),
      None if sync.collection(EntityKind::Quotation).is_in_flight() => {
        Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray))
      }
      None => Paragraph::new("This quotation is no longer in the loaded list.")
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(paragraph.block(block).wrap(Wrap { trim: false }), area);
  }

  fn breadcrumb_label(&self) -> String {
    self.id.chars().take(8).collect()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("e", "edit").with_priority(10),
      ShortcutInfo::new("r", "reload").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
