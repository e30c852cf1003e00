use crate::sync::{Notice, NoticeLevel};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Footer bar: view breadcrumb, sync activity and the latest notice.
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], notice: Option<&Notice>, busy: bool) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }
    let style = if i == breadcrumb.len() - 1 {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };
    spans.push(Span::styled(part.clone(), style));
  }

  if busy {
    spans.push(Span::styled("  syncing...", Style::default().fg(Color::DarkGray)));
  }

  if let Some(notice) = notice {
    let color = match notice.level {
      NoticeLevel::Info => Color::Green,
      NoticeLevel::Error => Color::Red,
    };
    spans.push(Span::raw("   "));
    spans.push(Span::styled(notice.message.clone(), Style::default().fg(color)));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
