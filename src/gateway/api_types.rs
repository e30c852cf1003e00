//! Response shapes returned by the sheet endpoint.
//!
//! The endpoint is a spreadsheet script, so responses are loose: collection
//! pages may arrive under `items`, under the collection name, or as a bare
//! array. These helpers normalise them into typed values.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{Action, GatewayError};
use crate::model::lenient;

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items: Vec<T>,
  /// Explicit "more data available" flag, when the server reports one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub has_more: Option<bool>,
}

/// Acknowledgement of a mutation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MutationAck {
  #[serde(default, deserialize_with = "lenient::opt_string")]
  pub id: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMutationResponse {
  success: Option<bool>,
  #[serde(flatten)]
  ack: MutationAck,
}

/// Decode a collection response into a typed page.
pub fn decode_page<T: DeserializeOwned>(
  action: Action,
  collection_key: &str,
  value: Value,
) -> Result<Page<T>, GatewayError> {
  let (raw_items, has_more) = match value {
    Value::Array(items) => (Value::Array(items), None),
    Value::Object(mut map) => {
      let has_more = map.get("hasMore").and_then(Value::as_bool);
      let items = map
        .remove("items")
        .or_else(|| map.remove(collection_key))
        .ok_or_else(|| {
          GatewayError::protocol(
            action,
            format!("response has neither `items` nor `{}`", collection_key),
          )
        })?;
      (items, has_more)
    }
    other => {
      return Err(GatewayError::protocol(
        action,
        format!("expected an object or array, got {}", type_name(&other)),
      ))
    }
  };

  let items: Vec<T> = serde_json::from_value(raw_items)
    .map_err(|e| GatewayError::protocol(action, format!("malformed {}: {}", collection_key, e)))?;

  Ok(Page { items, has_more })
}

/// Decode the success indicator of a mutation response.
pub fn decode_mutation(action: Action, value: Value) -> Result<MutationAck, GatewayError> {
  if let Some(message) = rejection(&value) {
    return Err(GatewayError::rejected(action, message));
  }

  let response: ApiMutationResponse = serde_json::from_value(value)
    .map_err(|e| GatewayError::protocol(action, format!("malformed acknowledgement: {}", e)))?;

  match response.success {
    Some(true) => Ok(response.ack),
    _ => Err(GatewayError::protocol(action, "missing `success` flag")),
  }
}

/// Extract the refusal message when a body reports `"success": false`.
pub(crate) fn rejection(value: &Value) -> Option<String> {
  let object = value.as_object()?;
  if object.get("success").and_then(Value::as_bool) != Some(false) {
    return None;
  }
  Some(message_of(value).unwrap_or_else(|| "operation failed".to_string()))
}

/// Best-effort error text from a raw (possibly non-JSON) body.
pub(crate) fn error_message(body: &str) -> Option<String> {
  let value: Value = serde_json::from_str(body).ok()?;
  message_of(&value)
}

fn message_of(value: &Value) -> Option<String> {
  ["error", "message"]
    .iter()
    .find_map(|key| value.get(key).and_then(Value::as_str))
    .map(String::from)
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[derive(Debug, Deserialize, PartialEq)]
  struct Row {
    id: String,
  }

  #[test]
  fn test_decode_items_with_has_more() {
    let page: Page<Row> = decode_page(
      Action::GetQuotations,
      "quotations",
      json!({ "items": [{ "id": "q1" }], "hasMore": true }),
    )
    .unwrap();

    assert_eq!(page.items, vec![Row { id: "q1".into() }]);
    assert_eq!(page.has_more, Some(true));
  }

  #[test]
  fn test_decode_collection_named_key() {
    let page: Page<Row> = decode_page(
      Action::GetProducts,
      "products",
      json!({ "products": [{ "id": "p1" }, { "id": "p2" }] }),
    )
    .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.has_more, None);
  }

  #[test]
  fn test_decode_bare_array() {
    let page: Page<Row> =
      decode_page(Action::GetCustomers, "customers", json!([{ "id": "c1" }])).unwrap();
    assert_eq!(page.items.len(), 1);
  }

  #[test]
  fn test_decode_missing_items_is_protocol_error() {
    let err = decode_page::<Row>(Action::GetProducts, "products", json!({ "rows": [] }))
      .unwrap_err();
    assert!(matches!(err, GatewayError::Protocol { .. }));
  }

  #[test]
  fn test_decode_wrong_item_shape_is_protocol_error() {
    let err = decode_page::<Row>(Action::GetProducts, "products", json!({ "items": [1, 2] }))
      .unwrap_err();
    assert!(matches!(err, GatewayError::Protocol { .. }));
  }

  #[test]
  fn test_mutation_success() {
    let ack = decode_mutation(Action::SaveProduct, json!({ "success": true, "id": "p9" })).unwrap();
    assert_eq!(ack.id.as_deref(), Some("p9"));

    // Sheet row ids come back as numbers
    let ack = decode_mutation(Action::SaveProduct, json!({ "success": true, "id": 42 })).unwrap();
    assert_eq!(ack.id.as_deref(), Some("42"));
  }

  #[test]
  fn test_mutation_without_flag_is_protocol_error() {
    let err = decode_mutation(Action::SaveProduct, json!({ "ok": 1 })).unwrap_err();
    assert!(matches!(err, GatewayError::Protocol { .. }));
  }

  #[test]
  fn test_mutation_refused() {
    let err = decode_mutation(
      Action::DeleteCustomer,
      json!({ "success": false, "error": "Customer has quotations" }),
    )
    .unwrap_err();
    assert_eq!(
      err.to_string(),
      "deleteCustomer: rejected by server: Customer has quotations"
    );
  }

  #[test]
  fn test_rejection_message() {
    assert_eq!(
      rejection(&json!({ "success": false, "error": "Sheet locked" })),
      Some("Sheet locked".to_string())
    );
    assert_eq!(rejection(&json!({ "success": true })), None);
    assert_eq!(rejection(&json!([1, 2])), None);
  }

  #[test]
  fn test_error_message_from_offline_payload() {
    let body = r#"{"error":"App requires internet connection"}"#;
    assert_eq!(
      error_message(body),
      Some("App requires internet connection".to_string())
    );
    assert_eq!(error_message("<html>oops</html>"), None);
  }
}
