use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use super::lenient;
use super::validation::{require, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  #[serde(default, deserialize_with = "lenient::string")]
  pub id: String,
  #[serde(default, deserialize_with = "lenient::string")]
  pub name: String,
  #[serde(default, deserialize_with = "lenient::string")]
  pub contact_person: String,
  #[serde(default, deserialize_with = "lenient::string")]
  pub phone: String,
  #[serde(default, deserialize_with = "lenient::string")]
  pub email: String,
  #[serde(default, deserialize_with = "lenient::string")]
  pub address: String,
}

impl Entity for Customer {
  const KIND: EntityKind = EntityKind::Customer;

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
    let email = self.email.trim();
    if !email.is_empty() && !email.contains('@') {
      return Err(ValidationError::invalid("email", "missing `@`"));
    }
    Ok(())
  }

  fn prepare(&mut self) {
    self.name = self.name.trim().to_string();
    self.email = self.email.trim().to_string();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_phone_number_cell() {
    let customer: Customer =
      serde_json::from_value(json!({ "id": "C1", "name": "Acme", "phone": 9876543210_u64 }))
        .unwrap();
    assert_eq!(customer.phone, "9876543210");
  }

  #[test]
  fn test_email_checked_when_present() {
    let mut customer = Customer {
      name: "Acme".into(),
      ..Default::default()
    };
    assert!(customer.validate().is_ok());

    customer.email = "acme.example.com".into();
    assert!(matches!(
      customer.validate(),
      Err(ValidationError::Invalid { field: "email", .. })
    ));
  }
}
