use std::collections::BTreeMap;
use std::io;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING, CONTENT_TYPE, LOCATION};
use reqwest::{Response, StatusCode};
use serde::Serialize;

use crate::proxy_service::diagnostic_body;
use crate::proxy_service::relay_error::RelayError;
use crate::route_config::Mapping;

/// What a single relay produced, for logs and the request history.
#[derive(Serialize, PartialEq, Debug, Clone)]
pub struct ProxyResult {
  pub executed_url: String,
  pub status_code: u16,
  pub headers: BTreeMap<String, Vec<String>>,
  pub body: String,
}

/// Sink for the caller's response. Headers are buffered until `write_head`, after which
/// only body chunks may follow.
pub(crate) trait ResponseWriter {
  fn append_header(&mut self, name: HeaderName, value: HeaderValue);

  fn write_head(&mut self, status: StatusCode);

  async fn write_chunk(&mut self, chunk: Bytes) -> io::Result<()>;

  /// Tells the caller the body is incomplete.
  async fn abort(&mut self, reason: String);
}

pub(crate) async fn transcribe<W: ResponseWriter>(
  response: Response,
  mapping: &Mapping,
  public_url: &str,
  executed_url: &str,
  writer: &mut W,
) -> Result<ProxyResult, RelayError> {
  let status = response.status();
  let upstream_headers = response.headers().clone();

  for (name, value) in upstream_headers.iter() {
    let value = if *name == LOCATION {
      rewrite_location(value, &mapping.to, public_url)
    } else {
      value.clone()
    };
    writer.append_header(name.clone(), value);
  }

  writer.write_head(status);

  let text = diagnostic_body::is_text(header_strings(&upstream_headers, &CONTENT_TYPE));
  let gzipped = diagnostic_body::is_gzipped(header_strings(&upstream_headers, &CONTENT_ENCODING));

  let mut seen = BytesMut::new();
  let mut body_stream = response.bytes_stream();

  while let Some(chunk) = body_stream.next().await {
    let chunk = match chunk {
      Ok(chunk) => chunk,
      Err(err) => {
        writer.abort(err.to_string()).await;
        return Err(RelayError::StreamingFailure {
          executed_url: executed_url.to_string(),
          reason: err.to_string(),
        });
      }
    };

    seen.extend_from_slice(&chunk);
    writer.write_chunk(chunk).await.map_err(|err| RelayError::StreamingFailure {
      executed_url: executed_url.to_string(),
      reason: err.to_string(),
    })?;
  }

  Ok(ProxyResult {
    executed_url: executed_url.to_string(),
    status_code: status.as_u16(),
    headers: header_lists(&upstream_headers),
    body: diagnostic_body::transcribe(text, gzipped, &seen),
  })
}

/// Points a backend redirect back at the proxy when it targets the mapped backend.
fn rewrite_location(value: &HeaderValue, target: &str, public_url: &str) -> HeaderValue {
  let Ok(location) = value.to_str() else {
    return value.clone();
  };

  match location.strip_prefix(target) {
    Some(rest) => HeaderValue::from_str(&format!("{}{}", public_url, rest)).unwrap_or_else(|_| value.clone()),
    None => value.clone(),
  }
}

fn header_strings<'a>(headers: &'a HeaderMap, name: &HeaderName) -> impl Iterator<Item = &'a str> {
  headers
    .get_all(name)
    .iter()
    .filter_map(|value| value.to_str().ok())
}

fn header_lists(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
  let mut lists: BTreeMap<String, Vec<String>> = BTreeMap::new();

  for (name, value) in headers.iter() {
    lists
      .entry(name.as_str().to_string())
      .or_default()
      .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
  }

  lists
}
