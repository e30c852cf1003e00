use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use super::lenient;
use super::validation::{non_negative, require, ValidationError};

/// A sellable item from the price list. Also reads the sheet's own column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  /// Item key; user-assigned or generated on first save
  #[serde(default, alias = "ItemKeyID", deserialize_with = "lenient::string")]
  pub id: String,
  #[serde(default, alias = "ItemName", deserialize_with = "lenient::string")]
  pub name: String,
  #[serde(default, alias = "Alias", deserialize_with = "lenient::string")]
  pub alias: String,
  #[serde(default, alias = "Category", deserialize_with = "lenient::string")]
  pub category: String,
  #[serde(default, alias = "Unit", deserialize_with = "lenient::string")]
  pub unit: String,
  /// List price per unit
  #[serde(default, alias = "PriceList", deserialize_with = "lenient::number")]
  pub price: f64,
  #[serde(default, deserialize_with = "lenient::number")]
  pub stock_quantity: f64,
}

impl Entity for Product {
  const KIND: EntityKind = EntityKind::Product;

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn display_name(&self) -> &str {
    &self.name
  }

  fn validate(&self) -> Result<(), ValidationError> {
    require("name", &self.name)?;
    non_negative("price", self.price)?;
    non_negative("stock quantity", self.stock_quantity)
  }

  fn prepare(&mut self) {
    self.id = self.id.trim().to_string();
    self.name = self.name.trim().to_string();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::gateway::api_types::{decode_page, Page};
  use crate::gateway::Action;
  use serde_json::json;

  #[test]
  fn test_deserialize_sheet_row() {
    let product: Product = serde_json::from_value(json!({
      "id": 1001,
      "name": "PVC Pipe 1\"",
      "unit": "m",
      "price": "120",
      "stockQuantity": "",
      "extraColumn": "ignored",
    }))
    .unwrap();

    assert_eq!(product.id, "1001");
    assert_eq!(product.price, 120.0);
    assert_eq!(product.stock_quantity, 0.0);
    assert_eq!(product.alias, "");
  }

  #[test]
  fn test_decode_sheet_column_names() {
    let page: Page<Product> = decode_page(
      Action::GetProducts,
      "products",
      json!({ "products": [{
        "ItemKeyID": "K1",
        "ItemName": "Pipe",
        "Alias": "PVC",
        "Category": "Plumbing",
        "Unit": "m",
        "PriceList": 120,
      }] }),
    )
    .unwrap();

    let product = &page.items[0];
    assert_eq!(product.id, "K1");
    assert_eq!(product.name, "Pipe");
    assert_eq!(product.alias, "PVC");
    assert_eq!(product.category, "Plumbing");
    assert_eq!(product.unit, "m");
    assert_eq!(product.price, 120.0);
  }

  #[test]
  fn test_serializes_camel_case() {
    let product = Product {
      id: "P1".into(),
      name: "Pipe".into(),
      price: 120.0,
      stock_quantity: 5.0,
      ..Default::default()
    };
    let value = serde_json::to_value(&product).unwrap();
    assert_eq!(value["stockQuantity"], json!(5.0));
    assert_eq!(value["price"], json!(120.0));
  }

  #[test]
  fn test_name_required() {
    let product = Product {
      name: "   ".into(),
      ..Default::default()
    };
    assert_eq!(
      product.validate(),
      Err(ValidationError::Missing { field: "name" })
    );
  }

  #[test]
  fn test_negative_price_rejected() {
    let product = Product {
      name: "Valve".into(),
      price: -1.0,
      ..Default::default()
    };
    assert!(matches!(
      product.validate(),
      Err(ValidationError::Invalid { field: "price", .. })
    ));
  }
}
