use crate::model::QuotationStatus;
use ratatui::prelude::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Left-align `s` in a column of `width` characters.
pub fn cell(s: &str, width: usize) -> String {
  format!("{:<width$}", truncate(s, width), width = width)
}

/// Amounts as shown in lists: two decimals, no currency.
pub fn money(value: f64) -> String {
  format!("{:.2}", value)
}

/// Quantities without a trailing ".0" for whole numbers.
pub fn quantity(value: f64) -> String {
  if value.fract() == 0.0 && value.abs() < 1e15 {
    format!("{}", value as i64)
  } else {
    format!("{}", value)
  }
}

pub fn status_color(status: QuotationStatus) -> Color {
  match status {
    QuotationStatus::Draft => Color::White,
    QuotationStatus::Sent => Color::Yellow,
    QuotationStatus::Accepted => Color::Green,
    QuotationStatus::Rejected => Color::Red,
  }
}

/// A `width` x `height` rect centred in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Größenangabe", 7), "Größ...");
  }

  #[test]
  fn test_cell_pads() {
    assert_eq!(cell("ab", 4), "ab  ");
  }

  #[test]
  fn test_numbers() {
    assert_eq!(money(250.0), "250.00");
    assert_eq!(quantity(3.0), "3");
    assert_eq!(quantity(2.5), "2.5");
  }

  #[test]
  fn test_status_color() {
    assert_eq!(status_color(QuotationStatus::Accepted), Color::Green);
    assert_eq!(status_color(QuotationStatus::Draft), Color::White);
  }

  #[test]
  fn test_centered_clamps() {
    let area = Rect::new(0, 0, 20, 10);
    assert_eq!(centered(area, 10, 4), Rect::new(5, 3, 10, 4));
    assert_eq!(centered(area, 50, 50), area);
  }
}
