use std::io::Read;

use flate2::read::GzDecoder;
use log::debug;

pub const BINARY_MARKER: &str = "Binary";

const TEXT_APPLICATION_TYPES: [&str; 6] = [
  "json",
  "xml",
  "javascript",
  "ecmascript",
  "x-www-form-urlencoded",
  "graphql",
];

/// True when any of the `Content-Type` values names a textual media type.
pub fn is_text<'a, I>(content_types: I) -> bool
where
  I: IntoIterator<Item = &'a str>,
{
  content_types.into_iter().any(|content_type| {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    let Some((top, sub)) = essence.split_once('/') else {
      return false;
    };

    top == "text"
      || (top == "application" && TEXT_APPLICATION_TYPES.contains(&sub))
      || sub.ends_with("+json")
      || sub.ends_with("+xml")
  })
}

/// True when any of the `Content-Encoding` values lists gzip.
pub fn is_gzipped<'a, I>(content_encodings: I) -> bool
where
  I: IntoIterator<Item = &'a str>,
{
  content_encodings.into_iter().any(|encoding| {
    encoding
      .split(',')
      .any(|token| token.trim().eq_ignore_ascii_case("gzip") || token.trim().eq_ignore_ascii_case("x-gzip"))
  })
}

/// Best-effort textual form of a response body, never fails.
pub fn transcribe(text: bool, gzipped: bool, body: &[u8]) -> String {
  if !text {
    return String::from(BINARY_MARKER);
  }

  if !gzipped {
    return String::from_utf8_lossy(body).into_owned();
  }

  let mut decoded = Vec::new();
  match GzDecoder::new(body).read_to_end(&mut decoded) {
    Ok(_) => String::from_utf8_lossy(&decoded).into_owned(),
    Err(err) => {
      debug!("Unable to decompress gzip body for diagnostics: {}", err);
      String::from(BINARY_MARKER)
    }
  }
}
