use std::io;

use actix_web::body::{BodyStream, SizedStream};
use actix_web::HttpResponse;
use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use reqwest::StatusCode;
use tokio::sync::{mpsc, oneshot};

use crate::proxy_service::response_transcriber::ResponseWriter;

type BodyChunk = Result<Bytes, io::Error>;

/// Feeds an actix streaming response from the relay task. The response head is handed
/// over once through a oneshot channel; body chunks follow over a bounded channel, so a
/// slow caller slows down the upstream read.
pub struct ChannelResponseWriter {
  headers: Vec<(HeaderName, HeaderValue)>,
  head_tx: Option<oneshot::Sender<HttpResponse>>,
  body_tx: mpsc::Sender<BodyChunk>,
  body_rx: Option<mpsc::Receiver<BodyChunk>>,
}

impl ChannelResponseWriter {
  pub fn new(capacity: usize) -> (ChannelResponseWriter, oneshot::Receiver<HttpResponse>) {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(capacity);

    let writer = ChannelResponseWriter {
      headers: Vec::new(),
      head_tx: Some(head_tx),
      body_tx,
      body_rx: Some(body_rx),
    };

    (writer, head_rx)
  }
}

impl ResponseWriter for ChannelResponseWriter {
  fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
    self.headers.push((name, value));
  }

  fn write_head(&mut self, status: StatusCode) {
    let (Some(head_tx), Some(body_rx)) = (self.head_tx.take(), self.body_rx.take()) else {
      return;
    };

    let declared_length = declared_length(status, &self.headers);
    let mut response = HttpResponse::build(status);
    for header in self.headers.drain(..) {
      response.append_header(header);
    }

    let body = futures_util::stream::unfold(body_rx, |mut body_rx| async move {
      body_rx.recv().await.map(|chunk| (chunk, body_rx))
    });

    // a sized body keeps the backend's content-length on the wire instead of chunking
    let response = match declared_length {
      Some(length) => response.body(SizedStream::new(length, body)),
      None => response.body(BodyStream::new(body)),
    };

    // receiver gone means the caller already went away
    let _ = head_tx.send(response);
  }

  async fn write_chunk(&mut self, chunk: Bytes) -> io::Result<()> {
    self
      .body_tx
      .send(Ok(chunk))
      .await
      .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "caller closed the connection"))
  }

  async fn abort(&mut self, reason: String) {
    let _ = self.body_tx.send(Err(io::Error::new(io::ErrorKind::Other, reason))).await;
  }
}

/// Length announced by the backend, for statuses that may carry a body.
fn declared_length(status: StatusCode, headers: &[(HeaderName, HeaderValue)]) -> Option<u64> {
  if status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
    return None;
  }

  headers
    .iter()
    .find(|(name, _)| *name == CONTENT_LENGTH)
    .and_then(|(_, value)| value.to_str().ok())
    .and_then(|value| value.trim().parse::<u64>().ok())
}
