use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::customer::Customer;
use super::entity::{Entity, EntityKind};
use super::lenient;
use super::product::Product;
use super::validation::{non_negative, require, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
  #[default]
  Draft,
  Sent,
  Accepted,
  Rejected,
}

impl QuotationStatus {
  pub const ALL: [QuotationStatus; 4] = [
    QuotationStatus::Draft,
    QuotationStatus::Sent,
    QuotationStatus::Accepted,
    QuotationStatus::Rejected,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      QuotationStatus::Draft => "draft",
      QuotationStatus::Sent => "sent",
      QuotationStatus::Accepted => "accepted",
      QuotationStatus::Rejected => "rejected",
    }
  }

  /// Parse a status name, ignoring case.
  pub fn parse(s: &str) -> Option<Self> {
    let s = s.trim();
    Self::ALL
      .into_iter()
      .find(|status| status.as_str().eq_ignore_ascii_case(s))
  }
}

/// Unknown or blank statuses read as `Draft`.
impl<'de> Deserialize<'de> for QuotationStatus {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = lenient::opt_string(deserializer)?;
    Ok(raw.as_deref().and_then(Self::parse).unwrap_or_default())
  }
}

impl fmt::Display for QuotationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One product line on a quotation.
///
/// Name and price are copied from the product when the line is created, so
/// later price-list changes do not alter issued quotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationLineItem {
  #[serde(default, deserialize_with = "lenient::string")]
  pub product_id: String,
  #[serde(default, deserialize_with = "lenient::string")]
  pub product_name: String,
  #[serde(default, deserialize_with = "lenient::number")]
  pub unit_price: f64,
  #[serde(default, deserialize_with = "lenient::number")]
  pub quantity: f64,
  #[serde(default, deserialize_with = "lenient::number")]
  pub line_total: f64,
}

impl QuotationLineItem {
  pub fn from_product(product: &Product, quantity: f64) -> Self {
    let mut line = Self {
      product_id: product.id.clone(),
      product_name: product.name.clone(),
      unit_price: product.price,
      quantity,
      line_total: 0.0,
    };
    line.recompute();
    line
  }

  pub fn recompute(&mut self) {
    self.line_total = self.unit_price * self.quantity;
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
  #[serde(default, deserialize_with = "lenient::string")]
  pub id: String,
  #[serde(default, deserialize_with = "lenient::string")]
  pub customer_id: String,
  /// Customer name as it was when the quotation was created
  #[serde(default, deserialize_with = "lenient::string")]
  pub customer_name: String,
  #[serde(
    default,
    deserialize_with = "lenient::date",
    skip_serializing_if = "Option::is_none"
  )]
  pub date: Option<NaiveDate>,
  #[serde(default)]
  pub items: Vec<QuotationLineItem>,
  #[serde(default, deserialize_with = "lenient::number")]
  pub total: f64,
  #[serde(default, deserialize_with = "lenient::string")]
  pub notes: String,
  #[serde(default)]
  pub status: QuotationStatus,
}

impl Quotation {
  /// Start a quotation for `customer`, dated today.
  pub fn for_customer(customer: &Customer) -> Self {
    Self {
      customer_id: customer.id.clone(),
      customer_name: customer.name.clone(),
      date: Some(Local::now().date_naive()),
      ..Default::default()
    }
  }

  pub fn add_line(&mut self, product: &Product, quantity: f64) {
    self.items.push(QuotationLineItem::from_product(product, quantity));
    self.recompute_totals();
  }

  /// Recompute every line total and the quotation total from unit prices
  /// and quantities, ignoring whatever totals were stored before.
  pub fn recompute_totals(&mut self) {
    for line in &mut self.items {
      line.recompute();
    }
    self.total = self.items.iter().map(|line| line.line_total).sum();
  }
}

impl Entity for Quotation {
  const KIND: EntityKind = EntityKind::Quotation;

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn display_name(&self) -> &str {
    &self.customer_name
  }

  fn validate(&self) -> Result<(), ValidationError> {
    require("customer", &self.customer_name)?;
    if self.items.is_empty() {
      return Err(ValidationError::Missing { field: "items" });
    }
    for line in &self.items {
      require("product", &line.product_id)?;
      non_negative("unit price", line.unit_price)?;
      if !(line.quantity.is_finite() && line.quantity > 0.0) {
        return Err(ValidationError::invalid(
          "quantity",
          format!("{} needs a quantity above zero", line.product_name),
        ));
      }
    }
    Ok(())
  }

  fn prepare(&mut self) {
    if self.date.is_none() {
      self.date = Some(Local::now().date_naive());
    }
    self.recompute_totals();
  }
}
