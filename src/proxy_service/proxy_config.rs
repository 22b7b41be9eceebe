use std::sync::Arc;

use crate::configuration_store::SharedConfiguration;
use crate::history::ProxyHistory;

pub struct ProxyConfig {
  /// Externally visible base URL of this proxy, without trailing slash.
  pub public_url: Box<str>,
  pub mappings: Arc<SharedConfiguration>,
  pub history: Arc<ProxyHistory>,
}

impl ProxyConfig {
  pub fn new(public_url: &str, mappings: Arc<SharedConfiguration>, history: Arc<ProxyHistory>) -> ProxyConfig {
    ProxyConfig {
      public_url: Box::from(public_url.trim_end_matches('/')),
      mappings,
      history,
    }
  }
}
