use std::sync::Arc;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use futures_util::future::{ready, Ready};
use log::debug;
use reqwest::Client;
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::proxy_route_service::ProxyRouteService;

/// Hands every worker its own relay service. All of them share the mapping snapshot,
/// the history and the client's connection pool.
#[derive(Clone)]
pub struct ProxyRouteServiceFactory {
  config: Arc<ProxyConfig>,
  http_client: Client,
}

impl ProxyRouteServiceFactory {
  pub fn new(config: Arc<ProxyConfig>, http_client: Client) -> ProxyRouteServiceFactory {
    ProxyRouteServiceFactory { config, http_client }
  }
}

impl ServiceFactory<ServiceRequest> for ProxyRouteServiceFactory {
  type Response = ServiceResponse;
  type Error = actix_web::Error;
  type Config = ();
  type Service = ProxyRouteService;
  type InitError = ();
  type Future = Ready<Result<ProxyRouteService, ()>>;

  fn new_service(&self, _: ()) -> Self::Future {
    debug!("Relay service ready, redirects rewritten to '{}'.", self.config.public_url);

    ready(Ok(ProxyRouteService {
      config: self.config.clone(),
      http_client: self.http_client.clone(),
    }))
  }
}
