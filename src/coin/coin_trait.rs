/**
* filename : coin_trait
* date: 2025. 6. 5.
* description: shared JSON-over-HTTP plumbing for chain API clients
**/

use crate::types::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[async_trait]
pub trait BlockchainClient: Clone + Send + Sync {
  fn get_http_client(&self) -> &Client;
  fn get_api_url(&self) -> &str;

  /// POSTs `payload` to `<api_url><path>` and decodes the JSON answer.
  ///
  /// A non-2xx status is a transport failure; a body that does not parse into `T`
  /// is a decode failure.
  async fn post_json<P, T>(&self, path: &str, payload: &P) -> Result<T, AppError>
  where
    P: Serialize + Sync + ?Sized,
    T: DeserializeOwned + Send,
  {
    let url = format!("{}{}", self.get_api_url().trim_end_matches('/'), path);
    let response = self
      .get_http_client()
      .post(&url)
      .header("Content-Type", "application/json")
      .json(payload)
      .send()
      .await
      .map_err(|e| AppError::Transport(format!("POST {} failed: {}", url, e)))?;

    decode_response(&url, response).await
  }

  async fn get_json<T>(&self, path: &str) -> Result<T, AppError>
  where
    T: DeserializeOwned + Send,
  {
    let url = format!("{}{}", self.get_api_url().trim_end_matches('/'), path);
    let response = self
      .get_http_client()
      .get(&url)
      .send()
      .await
      .map_err(|e| AppError::Transport(format!("GET {} failed: {}", url, e)))?;

    decode_response(&url, response).await
  }
}

async fn decode_response<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T, AppError> {
  let status = response.status();
  if !status.is_success() {
    return Err(AppError::Transport(format!("{} returned status {}", url, status)));
  }

  let body = response
    .text()
    .await
    .map_err(|e| AppError::Transport(format!("reading body of {} failed: {}", url, e)))?;

  serde_json::from_str(&body).map_err(|e| AppError::Decode(format!("invalid JSON from {}: {}", url, e)))
}
