use std::collections::HashSet;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single routing rule: requests whose path starts with `from` are relayed to `to`.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Mapping {
  pub from: String,
  pub to: String,
  #[serde(default = "default_active")]
  pub active: bool,
}

fn default_active() -> bool {
  true
}

impl Mapping {
  pub fn new(from: &str, to: &str) -> Mapping {
    Mapping {
      from: String::from(from),
      to: String::from(to),
      active: true,
    }
  }
}

/// Ordered list of mappings. Order is significant: the first active mapping whose
/// prefix matches a request path wins.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct Configuration {
  #[serde(default)]
  pub mappings: Vec<Mapping>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("configuration file error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid JSON configuration: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid YAML configuration: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("invalid configuration: {0}")]
  Invalid(String),
}

impl ResponseError for ConfigError {
  fn status_code(&self) -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
  }
}

impl Configuration {
  pub fn new(mappings: Vec<Mapping>) -> Configuration {
    Configuration { mappings }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for mapping in self.mappings.iter() {
      if mapping.from.is_empty() || !mapping.from.starts_with('/') {
        return Err(ConfigError::Invalid(format!(
          "mapping prefix '{}' must be a non-empty path starting with '/'",
          mapping.from
        )));
      }

      if !seen.insert(mapping.from.as_str()) {
        return Err(ConfigError::Invalid(format!(
          "mapping prefix '{}' is declared more than once",
          mapping.from
        )));
      }

      if mapping.to.ends_with('/') {
        return Err(ConfigError::Invalid(format!(
          "target '{}' must not end with '/'",
          mapping.to
        )));
      }

      let target = Url::parse(&mapping.to)
        .map_err(|err| ConfigError::Invalid(format!("target '{}' is not a valid URL: {}", mapping.to, err)))?;

      if !matches!(target.scheme(), "http" | "https") || !target.has_host() {
        return Err(ConfigError::Invalid(format!(
          "target '{}' must be an absolute http(s) URL",
          mapping.to
        )));
      }
    }

    Ok(())
  }
}
