//! How each entity kind appears in lists and forms.

use ratatui::prelude::*;

use crate::model::{Customer, Entity, Product, Quotation, QuotationLineItem, QuotationStatus};
use crate::sync::{CollectionSync, ViewSync};
use crate::ui::renderfns::{cell, money, quantity, status_color};
use crate::ui::view::View;
use crate::ui::views::QuotationDetailView;

/// A form field label plus a hint shown when the field is empty.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
  pub label: &'static str,
  pub hint: &'static str,
}

const fn field(label: &'static str, hint: &'static str) -> FieldSpec {
  FieldSpec { label, hint }
}

/// Loaded records that forms resolve references against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lookup<'a> {
  pub products: &'a [Product],
  pub customers: &'a [Customer],
}

impl<'a> Lookup<'a> {
  pub fn from_sync(sync: &'a ViewSync) -> Self {
    Self {
      products: sync.products().items(),
      customers: sync.customers().items(),
    }
  }

  fn product(&self, id: &str) -> Option<&'a Product> {
    self.products.iter().find(|p| p.id == id)
  }

  /// By id first, then by name ignoring case.
  fn customer(&self, key: &str) -> Option<&'a Customer> {
    self
      .customers
      .iter()
      .find(|c| c.id == key)
      .or_else(|| self.customers.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
  }
}

pub trait Listed: Entity {
  fn collection(sync: &ViewSync) -> &CollectionSync<Self>;

  /// Column titles and widths, in characters
  fn columns() -> &'static [(&'static str, usize)];

  fn row(&self) -> Line<'static>;

  /// `query` is already lowercased.
  fn matches(&self, query: &str) -> bool;

  fn fields() -> &'static [FieldSpec];

  /// Current values, one per field.
  fn field_values(&self) -> Vec<String>;

  /// Build a record from form values. Editing starts from `original` so
  /// fields the form does not show are kept.
  fn from_fields(original: Option<&Self>, values: &[String], lookup: &Lookup) -> Result<Self, String>;

  /// View opened with Enter, if the kind has one.
  fn detail_view(&self) -> Option<Box<dyn View>> {
    None
  }
}

fn contains(haystack: &str, query: &str) -> bool {
  haystack.to_lowercase().contains(query)
}

fn value(values: &[String], i: usize) -> &str {
  values.get(i).map(|v| v.trim()).unwrap_or("")
}

/// Blank reads as zero.
fn number(label: &str, raw: &str) -> Result<f64, String> {
  if raw.is_empty() {
    return Ok(0.0);
  }
  raw
    .replace(',', "")
    .parse()
    .map_err(|_| format!("{} must be a number, got '{}'", label, raw))
}

fn columns_line(cells: Vec<Span<'static>>) -> Line<'static> {
  let mut spans = Vec::with_capacity(cells.len() * 2);
  for (i, span) in cells.into_iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw(" "));
    }
    spans.push(span);
  }
  Line::from(spans)
}

impl Listed for Product {
  fn collection(sync: &ViewSync) -> &CollectionSync<Self> {
    sync.products()
  }

  fn columns() -> &'static [(&'static str, usize)] {
    &[
      ("Key", 10),
      ("Name", 28),
      ("Category", 14),
      ("Unit", 6),
      ("Price", 10),
      ("Stock", 8),
    ]
  }

  fn row(&self) -> Line<'static> {
    columns_line(vec![
      Span::styled(cell(&self.id, 10), Style::default().fg(Color::Cyan)),
      Span::raw(cell(&self.name, 28)),
      Span::styled(cell(&self.category, 14), Style::default().fg(Color::DarkGray)),
      Span::raw(cell(&self.unit, 6)),
      Span::raw(format!("{:>10}", money(self.price))),
      Span::raw(format!("{:>8}", quantity(self.stock_quantity))),
    ])
  }

  fn matches(&self, query: &str) -> bool {
    [&self.id, &self.name, &self.alias, &self.category]
      .iter()
      .any(|s| contains(s, query))
  }

  fn fields() -> &'static [FieldSpec] {
    const FIELDS: &[FieldSpec] = &[
      field("Item key", "blank to generate, kept on edit"),
      field("Name", "required"),
      field("Alias", ""),
      field("Category", ""),
      field("Unit", "e.g. pcs, m, kg"),
      field("Price", "0.00"),
      field("Stock", "0"),
    ];
    FIELDS
  }

  fn field_values(&self) -> Vec<String> {
    vec![
      self.id.clone(),
      self.name.clone(),
      self.alias.clone(),
      self.category.clone(),
      self.unit.clone(),
      money(self.price),
      quantity(self.stock_quantity),
    ]
  }

  fn from_fields(original: Option<&Self>, values: &[String], _lookup: &Lookup) -> Result<Self, String> {
    // The key names the sheet row, so an edit always updates the row it came from
    let mut product = match original {
      Some(original) => original.clone(),
      None => Product {
        id: value(values, 0).to_string(),
        ..Default::default()
      },
    };
    product.name = value(values, 1).to_string();
    product.alias = value(values, 2).to_string();
    product.category = value(values, 3).to_string();
    product.unit = value(values, 4).to_string();
    product.price = number("Price", value(values, 5))?;
    product.stock_quantity = number("Stock", value(values, 6))?;
    Ok(product)
  }
}

impl Listed for Customer {
  fn collection(sync: &ViewSync) -> &CollectionSync<Self> {
    sync.customers()
  }

  fn columns() -> &'static [(&'static str, usize)] {
    &[("Name", 26), ("Contact", 18), ("Phone", 14), ("Email", 26)]
  }

  fn row(&self) -> Line<'static> {
    columns_line(vec![
      Span::styled(cell(&self.name, 26), Style::default().fg(Color::Cyan)),
      Span::raw(cell(&self.contact_person, 18)),
      Span::raw(cell(&self.phone, 14)),
      Span::styled(cell(&self.email, 26), Style::default().fg(Color::DarkGray)),
    ])
  }

  fn matches(&self, query: &str) -> bool {
    [&self.name, &self.contact_person, &self.phone, &self.email]
      .iter()
      .any(|s| contains(s, query))
  }

  fn fields() -> &'static [FieldSpec] {
    const FIELDS: &[FieldSpec] = &[
      field("Name", "required"),
      field("Contact", ""),
      field("Phone", ""),
      field("Email", ""),
      field("Address", ""),
    ];
    FIELDS
  }

  fn field_values(&self) -> Vec<String> {
    vec![
      self.name.clone(),
      self.contact_person.clone(),
      self.phone.clone(),
      self.email.clone(),
      self.address.clone(),
    ]
  }

  fn from_fields(original: Option<&Self>, values: &[String], _lookup: &Lookup) -> Result<Self, String> {
    let mut customer = original.cloned().unwrap_or_default();
    customer.name = value(values, 0).to_string();
    customer.contact_person = value(values, 1).to_string();
    customer.phone = value(values, 2).to_string();
    customer.email = value(values, 3).to_string();
    customer.address = value(values, 4).to_string();
    Ok(customer)
  }
}

/// Parse `P1:2, P2:1.5` into (product id, quantity) pairs. A bare id means
/// a quantity of one.
pub fn parse_line_entries(raw: &str) -> Result<Vec<(String, f64)>, String> {
  raw
    .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
    .filter(|entry| !entry.is_empty())
    .map(|entry| match entry.rsplit_once(':') {
      Some((id, qty)) => qty
        .parse::<f64>()
        .map(|qty| (id.to_string(), qty))
        .map_err(|_| format!("Bad quantity in '{}'", entry)),
      None => Ok((entry.to_string(), 1.0)),
    })
    .collect()
}

impl Listed for Quotation {
  fn collection(sync: &ViewSync) -> &CollectionSync<Self> {
    sync.quotations()
  }

  fn columns() -> &'static [(&'static str, usize)] {
    &[
      ("Date", 10),
      ("Customer", 26),
      ("Lines", 5),
      ("Total", 12),
      ("Status", 9),
    ]
  }

  fn row(&self) -> Line<'static> {
    let date = self.date.map(|d| d.to_string()).unwrap_or_default();
    columns_line(vec![
      Span::styled(cell(&date, 10), Style::default().fg(Color::DarkGray)),
      Span::styled(cell(&self.customer_name, 26), Style::default().fg(Color::Cyan)),
      Span::raw(format!("{:>5}", self.items.len())),
      Span::raw(format!("{:>12}", money(self.total))),
      Span::styled(
        cell(self.status.as_str(), 9),
        Style::default().fg(status_color(self.status)),
      ),
    ])
  }

  fn matches(&self, query: &str) -> bool {
    contains(&self.customer_name, query)
      || contains(&self.id, query)
      || contains(&self.notes, query)
      || self.status.as_str() == query
  }

  fn fields() -> &'static [FieldSpec] {
    const FIELDS: &[FieldSpec] = &[
      field("Customer", "customer id or name"),
      field("Items", "PRODUCT_ID:QTY, ..."),
      field("Status", "draft, sent, accepted, rejected"),
      field("Notes", ""),
    ];
    FIELDS
  }

  fn field_values(&self) -> Vec<String> {
    let customer = if self.customer_id.is_empty() {
      self.customer_name.clone()
    } else {
      self.customer_id.clone()
    };
    let items = self
      .items
      .iter()
      .map(|line| format!("{}:{}", line.product_id, quantity(line.quantity)))
      .collect::<Vec<_>>()
      .join(", ");
    vec![customer, items, self.status.to_string(), self.notes.clone()]
  }

  fn from_fields(original: Option<&Self>, values: &[String], lookup: &Lookup) -> Result<Self, String> {
    let mut quotation = original.cloned().unwrap_or_default();

    // An unchanged customer keeps the name captured at creation
    let customer_key = value(values, 0);
    let unchanged = original.is_some_and(|o| {
      !customer_key.is_empty() && (o.customer_id == customer_key || o.customer_name == customer_key)
    });
    if !unchanged {
      match lookup.customer(customer_key) {
        Some(customer) => {
          quotation.customer_id = customer.id.clone();
          quotation.customer_name = customer.name.clone();
        }
        None if customer_key.is_empty() => {
          quotation.customer_id.clear();
          quotation.customer_name.clear();
        }
        None => return Err(format!("Unknown customer '{}'", customer_key)),
      }
    }

    // Lines already on the quotation keep their snapshot; new ones copy the product
    let mut items = Vec::new();
    for (product_id, qty) in parse_line_entries(value(values, 1))? {
      let existing = original.and_then(|o| o.items.iter().find(|line| line.product_id == product_id));
      let line = match existing {
        Some(line) => QuotationLineItem {
          quantity: qty,
          ..line.clone()
        },
        None => match lookup.product(&product_id) {
          Some(product) => QuotationLineItem::from_product(product, qty),
          None => return Err(format!("Unknown product '{}'", product_id)),
        },
      };
      items.push(line);
    }
    quotation.items = items;

    let status = value(values, 2);
    quotation.status = if status.is_empty() {
      QuotationStatus::Draft
    } else {
      QuotationStatus::parse(status).ok_or_else(|| format!("Unknown status '{}'", status))?
    };
    quotation.notes = value(values, 3).to_string();
    quotation.recompute_totals();
    Ok(quotation)
  }

  fn detail_view(&self) -> Option<Box<dyn View>> {
    Some(Box::new(QuotationDetailView::new(self.id.clone())))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
  }

  fn catalogue() -> (Vec<Product>, Vec<Customer>) {
    let products = vec![
      Product {
        id: "P1".into(),
        name: "Pipe".into(),
        price: 100.0,
        ..Default::default()
      },
      Product {
        id: "P2".into(),
        name: "Valve".into(),
        price: 50.0,
        ..Default::default()
      },
    ];
    let customers = vec![Customer {
      id: "C1".into(),
      name: "Acme Traders".into(),
      ..Default::default()
    }];
    (products, customers)
  }

  #[test]
  fn test_parse_line_entries() {
    assert_eq!(
      parse_line_entries("P1:2, P2:1.5;P3").unwrap(),
      vec![
        ("P1".to_string(), 2.0),
        ("P2".to_string(), 1.5),
        ("P3".to_string(), 1.0),
      ]
    );
    assert!(parse_line_entries("P1:two").is_err());
    assert!(parse_line_entries("  ").unwrap().is_empty());
  }

  #[test]
  fn test_new_quotation_copies_snapshots() {
    let (products, customers) = catalogue();
    let lookup = Lookup {
      products: &products,
      customers: &customers,
    };

    let quotation =
      Quotation::from_fields(None, &strings(&["acme traders", "P1:2, P2:1", "", "urgent"]), &lookup).unwrap();

    assert_eq!(quotation.customer_id, "C1");
    assert_eq!(quotation.customer_name, "Acme Traders");
    assert_eq!(quotation.items[0].product_name, "Pipe");
    assert_eq!(quotation.total, 250.0);
    assert_eq!(quotation.status, QuotationStatus::Draft);
    assert_eq!(quotation.notes, "urgent");
  }

  #[test]
  fn test_edit_keeps_existing_line_prices() {
    let (mut products, customers) = catalogue();
    let lookup = Lookup {
      products: &products,
      customers: &customers,
    };
    let original = Quotation::from_fields(None, &strings(&["C1", "P1:1", "sent", ""]), &lookup).unwrap();

    // Price list changes after the quotation was issued
    products[0].price = 999.0;
    let lookup = Lookup {
      products: &products,
      customers: &[],
    };
    let values = original.field_values();
    assert_eq!(values, strings(&["C1", "P1:1", "sent", ""]));

    let edited = Quotation::from_fields(Some(&original), &strings(&["C1", "P1:3", "accepted", ""]), &lookup).unwrap();
    assert_eq!(edited.items[0].unit_price, 100.0);
    assert_eq!(edited.total, 300.0);
    assert_eq!(edited.customer_name, "Acme Traders");
    assert_eq!(edited.status, QuotationStatus::Accepted);
  }

  #[test]
  fn test_unknown_references_rejected() {
    let (products, customers) = catalogue();
    let lookup = Lookup {
      products: &products,
      customers: &customers,
    };
    assert_eq!(
      Quotation::from_fields(None, &strings(&["Nobody", "P1:1", "", ""]), &lookup).unwrap_err(),
      "Unknown customer 'Nobody'"
    );
    assert_eq!(
      Quotation::from_fields(None, &strings(&["C1", "P9:1", "", ""]), &lookup).unwrap_err(),
      "Unknown product 'P9'"
    );
    assert!(Quotation::from_fields(None, &strings(&["C1", "P1:1", "lost", ""]), &lookup).is_err());
  }

  #[test]
  fn test_product_form_numbers() {
    let lookup = Lookup::default();
    let product = Product::from_fields(
      None,
      &strings(&["", "Pipe", "", "Plumbing", "m", "1,200.50", ""]),
      &lookup,
    )
    .unwrap();
    assert_eq!(product.price, 1200.5);
    assert_eq!(product.stock_quantity, 0.0);

    let err = Product::from_fields(None, &strings(&["", "Pipe", "", "", "", "cheap", ""]), &lookup).unwrap_err();
    assert!(err.starts_with("Price must be a number"));
  }

  #[test]
  fn test_customer_edit_keeps_id() {
    let original = Customer {
      id: "C7".into(),
      name: "Old".into(),
      ..Default::default()
    };
    let edited = Customer::from_fields(
      Some(&original),
      &strings(&["New", "Ann", "555", "a@b.c", ""]),
      &Lookup::default(),
    )
    .unwrap();
    assert_eq!(edited.id, "C7");
    assert_eq!(edited.name, "New");
  }

  #[test]
  fn test_product_edit_keeps_key() {
    let original = Product {
      id: "K1".into(),
      name: "Pipe".into(),
      ..Default::default()
    };
    let lookup = Lookup::default();

    let blanked = Product::from_fields(Some(&original), &strings(&["", "Pipe", "", "", "", "1", ""]), &lookup).unwrap();
    assert_eq!(blanked.id, "K1");

    let renamed = Product::from_fields(Some(&original), &strings(&["K2", "Tube", "", "", "", "1", ""]), &lookup).unwrap();
    assert_eq!(renamed.id, "K1");
    assert_eq!(renamed.name, "Tube");

    let created = Product::from_fields(None, &strings(&["K9", "Valve", "", "", "", "", ""]), &lookup).unwrap();
    assert_eq!(created.id, "K9");
  }

  #[test]
  fn test_field_values_line_up_with_fields() {
    let (products, customers) = catalogue();
    assert_eq!(products[0].field_values().len(), Product::fields().len());
    assert_eq!(customers[0].field_values().len(), Customer::fields().len());
    assert_eq!(Quotation::default().field_values().len(), Quotation::fields().len());
    assert_eq!(Product::fields()[0].label, "Item key");
  }

  #[test]
  fn test_matches() {
    let (products, _) = catalogue();
    assert!(products[0].matches("pip"));
    assert!(!products[0].matches("valve"));
  }
}
