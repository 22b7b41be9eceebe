use actix_web::dev::Payload;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use reqwest::{Method, Request, Url};

use crate::proxy_service::relay_error::RelayError;

/// Describe the inbound hop only; the client computes its own for the outbound one.
const CONNECTION_SCOPED: [HeaderName; 3] = [HOST, CONTENT_LENGTH, TRANSFER_ENCODING];

/// Drains the inbound body into memory. The payload is consumed whatever the outcome.
pub async fn read_body(mut payload: Payload, executed_url: &str) -> Result<Bytes, RelayError> {
  let mut body_buffer = BytesMut::new();

  while let Some(chunk) = payload.next().await {
    match chunk {
      Ok(bytes) => body_buffer.extend_from_slice(&bytes),
      Err(err) => {
        return Err(RelayError::BodyReadFailed {
          executed_url: executed_url.to_string(),
          reason: err.to_string(),
        });
      }
    }
  }

  Ok(body_buffer.freeze())
}

pub fn build<'a, I>(method: Method, target_url: &str, raw_query: &str, headers: I, body: Bytes) -> Result<Request, RelayError>
where
  I: IntoIterator<Item = (&'a HeaderName, &'a HeaderValue)>,
{
  let full_url = if raw_query.is_empty() {
    target_url.to_string()
  } else {
    format!("{}?{}", target_url, raw_query)
  };

  // parsing normalizes the path: `.`/`..` segments are resolved before the backend sees it
  let url = Url::parse(&full_url).map_err(|err| RelayError::InvalidTarget {
    executed_url: target_url.to_string(),
    reason: err.to_string(),
  })?;

  let mut header_map = HeaderMap::new();
  for (name, value) in headers {
    if CONNECTION_SCOPED.contains(name) {
      continue;
    }
    header_map.append(name.clone(), value.clone());
  }

  let mut request = Request::new(method, url);
  *request.headers_mut() = header_map;
  if !body.is_empty() {
    *request.body_mut() = Some(body.into());
  }

  Ok(request)
}
