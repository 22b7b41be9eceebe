use reqwest::{Client, Request, Response};

use crate::proxy_service::relay_error::RelayError;

/// Sends the request as-is. The client must be built with redirects disabled so a 3xx
/// reaches the caller untouched.
pub async fn execute(client: &Client, request: Request, executed_url: &str) -> Result<Response, RelayError> {
  client.execute(request).await.map_err(|err| RelayError::UpstreamUnreachable {
    executed_url: executed_url.to_string(),
    reason: err.to_string(),
  })
}
