use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::EndpointConfig;
use crate::gateway::api_types::{error_message, rejection};
use crate::gateway::{Action, Gateway, GatewayError, Params};

/// HTTP client for the sheet endpoint.
///
/// Every action is sent as a `POST` with a JSON body of the form
/// `{"action": ..., ...params, "timestamp": <epoch millis>}`.
#[derive(Clone)]
pub struct RemoteGateway {
  http: reqwest::Client,
  endpoint: Url,
}

impl RemoteGateway {
  pub fn new(config: &EndpointConfig) -> Result<Self> {
    let mut builder =
      reqwest::Client::builder().user_agent(concat!("quotedesk/", env!("CARGO_PKG_VERSION")));

    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }

    let http = builder
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self::from_reqwest(config.url.clone(), http))
  }

  /// Wrap an existing reqwest client.
  pub fn from_reqwest(endpoint: Url, http: reqwest::Client) -> Self {
    Self { http, endpoint }
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  /// Send one action and return the parsed response body.
  pub async fn send(&self, action: Action, params: Params) -> Result<Value, GatewayError> {
    let body = request_body(action, params, Utc::now().timestamp_millis());
    debug!(action = action.as_str(), "calling endpoint");

    let network = |source| GatewayError::Network {
      action: action.as_str(),
      source,
    };

    let response = self
      .http
      .post(self.endpoint.clone())
      .json(&body)
      .send()
      .await
      .map_err(network)?;

    let status = response.status();
    let text = response.text().await.map_err(network)?;

    if !status.is_success() {
      let message = error_message(&text).unwrap_or_else(|| {
        status
          .canonical_reason()
          .unwrap_or("request failed")
          .to_string()
      });
      warn!(action = action.as_str(), status = status.as_u16(), %message, "endpoint returned an error status");
      return Err(GatewayError::status(action, status.as_u16(), message));
    }

    let value: Value = serde_json::from_str(&text)
      .map_err(|e| GatewayError::protocol(action, format!("body is not JSON: {}", e)))?;

    if let Some(message) = rejection(&value) {
      warn!(action = action.as_str(), %message, "endpoint rejected the request");
      return Err(GatewayError::rejected(action, message));
    }

    Ok(value)
  }
}

impl Gateway for RemoteGateway {
  fn call(&self, action: Action, params: Params) -> BoxFuture<'static, Result<Value, GatewayError>> {
    let gateway = self.clone();
    async move { gateway.send(action, params).await }.boxed()
  }
}

/// Build the request body. `action` and `timestamp` always win over
/// same-named parameters.
fn request_body(action: Action, params: Params, timestamp: i64) -> Value {
  let mut body = params;
  body.insert("action".to_string(), Value::from(action.as_str()));
  body.insert("timestamp".to_string(), Value::from(timestamp));
  Value::Object(body)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use wiremock::matchers::{body_partial_json, method};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  async fn setup() -> (MockServer, RemoteGateway) {
    let server = MockServer::start().await;
    let endpoint = Url::parse(&format!("{}/exec", server.uri())).unwrap();
    let gateway = RemoteGateway::from_reqwest(endpoint, reqwest::Client::new());
    (server, gateway)
  }

  fn params(value: Value) -> Params {
    match value {
      Value::Object(map) => map,
      _ => unreachable!("test params must be an object"),
    }
  }

  #[test]
  fn test_request_body_merges_params() {
    let body = request_body(
      Action::GetQuotations,
      params(json!({ "offset": 20, "limit": 10, "action": "spoofed" })),
      1_700_000_000_000,
    );

    assert_eq!(
      body,
      json!({
        "action": "getQuotations",
        "offset": 20,
        "limit": 10,
        "timestamp": 1_700_000_000_000_i64,
      })
    );
  }

  #[tokio::test]
  async fn test_posts_action_and_params() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
      .and(body_partial_json(
        json!({ "action": "getQuotations", "offset": 0, "limit": 20 }),
      ))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "items": [], "hasMore": false })),
      )
      .expect(1)
      .mount(&server)
      .await;

    let value = gateway
      .send(
        Action::GetQuotations,
        params(json!({ "offset": 0, "limit": 20 })),
      )
      .await
      .unwrap();

    assert_eq!(value, json!({ "items": [], "hasMore": false }));

    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent["timestamp"].is_i64());
  }

  #[tokio::test]
  async fn test_error_status_is_network_error() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
      .respond_with(
        ResponseTemplate::new(503)
          .set_body_json(json!({ "error": "App requires internet connection" })),
      )
      .mount(&server)
      .await;

    let err = gateway
      .send(Action::GetProducts, Params::new())
      .await
      .unwrap_err();

    assert!(err.is_network());
    match err {
      GatewayError::Status {
        status, message, ..
      } => {
        assert_eq!(status, 503);
        assert_eq!(message, "App requires internet connection");
      }
      other => panic!("expected status error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_non_json_body_is_protocol_error() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
      .mount(&server)
      .await;

    let err = gateway
      .send(Action::GetCustomers, Params::new())
      .await
      .unwrap_err();

    assert!(matches!(err, GatewayError::Protocol { .. }));
  }

  #[tokio::test]
  async fn test_success_false_is_rejection() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({ "success": false, "error": "Duplicate item key" })),
      )
      .mount(&server)
      .await;

    let err = gateway
      .send(Action::SaveProduct, params(json!({ "id": "P-1" })))
      .await
      .unwrap_err();

    match err {
      GatewayError::Rejected { action, message } => {
        assert_eq!(action, "saveProduct");
        assert_eq!(message, "Duplicate item key");
      }
      other => panic!("expected rejection, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_unreachable_endpoint_is_network_error() {
    // Port 9 (discard) is not listening on test machines
    let endpoint = Url::parse("http://127.0.0.1:9/exec").unwrap();
    let gateway = RemoteGateway::from_reqwest(endpoint, reqwest::Client::new());

    let err = gateway
      .send(Action::GetProducts, Params::new())
      .await
      .unwrap_err();

    assert!(matches!(err, GatewayError::Network { .. }));
  }

  #[tokio::test]
  async fn test_trait_call_goes_through_send() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
      .and(body_partial_json(json!({ "action": "deleteProduct", "id": "P-7" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
      .expect(1)
      .mount(&server)
      .await;

    let gateway: &dyn Gateway = &gateway;
    let value = gateway
      .call(Action::DeleteProduct, params(json!({ "id": "P-7" })))
      .await
      .unwrap();

    assert_eq!(value, json!({ "success": true }));
  }
}
