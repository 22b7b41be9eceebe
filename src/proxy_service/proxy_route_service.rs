use std::sync::Arc;
use std::time::Instant;
use actix_web::{dev, HttpRequest, HttpResponse};
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse};
use actix_web::http::{Method, StatusCode};
use futures_core::future::LocalBoxFuture;
use log::{debug, error, info, warn};
use reqwest::{Client, Response};
use crate::history::HistoryEntry;
use crate::proxy_service::channel_writer::ChannelResponseWriter;
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::relay_error::RelayError;
use crate::proxy_service::response_transcriber::{self, ProxyResult};
use crate::proxy_service::{mapping_resolver, relay_executor, upstream_request};

const BODY_CHANNEL_CAPACITY: usize = 16;

pub struct ProxyRouteService {
  pub(super) config: Arc<ProxyConfig>,
  pub(super) http_client: Client,
}

impl Service<ServiceRequest> for ProxyRouteService {
  type Response = ServiceResponse;
  type Error = actix_web::Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  dev::always_ready!();

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let (http_request, payload) = req.into_parts();

    Box::pin(ProxyRouteService::exec(self.config.clone(), self.http_client.clone(), http_request, payload))
  }
}

impl ProxyRouteService {
  async fn exec(config: Arc<ProxyConfig>, client: Client, http: HttpRequest, payload: Payload) -> Result<ServiceResponse, actix_web::Error> {
    let started = Instant::now();
    let method = http.method().clone();
    let path = http.path().to_string();
    let snapshot = config.mappings.snapshot();

    let Some((mapping, target_url)) = mapping_resolver::resolve(&path, &snapshot) else {
      warn!("No mapping matches '{} {}'.", method, path);
      return Ok(ServiceResponse::new(http, HttpResponse::NotFound().finish()));
    };
    let mapping = mapping.clone();

    let response = match ProxyRouteService::forward(&client, &http, payload, &target_url).await {
      Ok(response) => response,
      Err(err) => {
        let status = err.status_code().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ProxyRouteService::report(&config, &method, &path, started, Err(err));
        return Ok(ServiceResponse::new(http, HttpResponse::build(status).finish()));
      }
    };

    debug!("Upstream answered {} for {}", response.status(), &target_url);

    let (mut writer, head_rx) = ChannelResponseWriter::new(BODY_CHANNEL_CAPACITY);
    let task_config = config.clone();

    actix_web::rt::spawn(async move {
      let outcome =
        response_transcriber::transcribe(response, &mapping, &task_config.public_url, &target_url, &mut writer).await;
      // closes the caller's body before the result is reported
      drop(writer);
      ProxyRouteService::report(&task_config, &method, &path, started, outcome);
    });

    match head_rx.await {
      Ok(response) => Ok(ServiceResponse::new(http, response)),
      Err(_) => {
        error!("Relay task ended before sending a response head");
        Ok(ServiceResponse::new(http, HttpResponse::InternalServerError().finish()))
      }
    }
  }

  async fn forward(client: &Client, http: &HttpRequest, payload: Payload, target_url: &str) -> Result<Response, RelayError> {
    let body = upstream_request::read_body(payload, target_url).await?;
    let request = upstream_request::build(
      http.method().clone(),
      target_url,
      http.query_string(),
      http.headers().iter(),
      body,
    )?;

    relay_executor::execute(client, request, target_url).await
  }

  fn report(config: &ProxyConfig, method: &Method, path: &str, started: Instant, outcome: Result<ProxyResult, RelayError>) {
    let elapsed = started.elapsed().as_millis();

    let outcome = match outcome {
      Ok(result) => {
        info!("{} {} -> {} {} ({} ms)", method, path, result.executed_url, result.status_code, elapsed);
        debug!("Body of {}: {}", result.executed_url, result.body);
        Ok(result)
      }
      Err(err) => {
        error!("{} {} -> {} failed ({} ms): {}", method, path, err.executed_url(), elapsed, err);
        Err(err.to_string())
      }
    };

    config.history.record(HistoryEntry::new(method.as_str(), path, elapsed, outcome));
  }
}
