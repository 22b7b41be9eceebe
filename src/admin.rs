use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{web, HttpResponse};
use log::info;

use crate::configuration_store::{ConfigurationStore, SharedConfiguration};
use crate::history::ProxyHistory;
use crate::route_config::{ConfigError, Configuration};

pub struct AdminState {
  pub store: Arc<dyn ConfigurationStore>,
  pub mappings: Arc<SharedConfiguration>,
  pub history: Arc<ProxyHistory>,
  /// Keeps the stored file and the published snapshot in step.
  save_lock: Mutex<()>,
}

impl AdminState {
  pub fn new(store: Arc<dyn ConfigurationStore>, mappings: Arc<SharedConfiguration>, history: Arc<ProxyHistory>) -> AdminState {
    AdminState {
      store,
      mappings,
      history,
      save_lock: Mutex::new(()),
    }
  }

  pub fn apply(&self, config: Configuration) -> Result<(), ConfigError> {
    let _guard = match self.save_lock.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };

    self.store.save(&config)?;
    self.mappings.publish(config);

    Ok(())
  }
}

/// Only the admin resources get CORS; every other path, `/api/*` included, is relayed untouched.
pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg
    .service(
      web::resource("/api/configurations")
        .wrap(Cors::permissive())
        .route(web::get().to(get_configurations))
        .route(web::put().to(save_configurations)),
    )
    .service(
      web::resource("/api/requests")
        .wrap(Cors::permissive())
        .route(web::get().to(get_requests)),
    );
}

async fn get_configurations(state: web::Data<AdminState>) -> Result<HttpResponse, ConfigError> {
  let config = state.store.load()?;

  Ok(HttpResponse::Ok().json(config))
}

/// Body is parsed by hand: a malformed configuration is reported like any other failure.
async fn save_configurations(state: web::Data<AdminState>, body: web::Bytes) -> Result<HttpResponse, ConfigError> {
  let config: Configuration = serde_json::from_slice(&body)?;
  state.apply(config.clone())?;
  info!("Configuration updated, {} mapping(s) active.", config.mappings.iter().filter(|m| m.active).count());

  Ok(HttpResponse::Ok().json(config))
}

async fn get_requests(state: web::Data<AdminState>) -> HttpResponse {
  HttpResponse::Ok().json(state.history.recent())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::configuration_store::FileConfigurationStore;
  use crate::history::HistoryEntry;
  use crate::route_config::Mapping;
  use actix_web::http::StatusCode;
  use actix_web::test::{self, TestRequest};
  use actix_web::App;

  fn state(dir: &tempfile::TempDir) -> web::Data<AdminState> {
    web::Data::new(AdminState::new(
      Arc::new(FileConfigurationStore::new(dir.path().join("config.json"))),
      Arc::new(SharedConfiguration::new(Configuration::default())),
      Arc::new(ProxyHistory::new(5)),
    ))
  }

  fn sample() -> Configuration {
    Configuration::new(vec![
      Mapping::new("/api-v1", "https://one.example.com"),
      Mapping::new("/", "http://localhost:3000"),
    ])
  }

  #[actix_web::test]
  async fn put_then_get_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let put = TestRequest::put().uri("/api/configurations").set_json(sample()).to_request();
    let echoed: Configuration = test::call_and_read_body_json(&app, put).await;
    assert_eq!(echoed, sample());
    assert_eq!(*state.mappings.snapshot(), sample());

    let get = TestRequest::get().uri("/api/configurations").to_request();
    let loaded: Configuration = test::call_and_read_body_json(&app, get).await;
    assert_eq!(loaded, sample());
  }

  #[actix_web::test]
  async fn malformed_body_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = test::init_service(App::new().app_data(state(&dir)).configure(configure)).await;

    let put = TestRequest::put()
      .uri("/api/configurations")
      .insert_header(("content-type", "application/json"))
      .set_payload("{\"mappings\": [")
      .to_request();
    let resp = test::call_service(&app, put).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[actix_web::test]
  async fn invalid_configuration_is_not_published() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
    let invalid = Configuration::new(vec![Mapping::new("/a", "https://x"), Mapping::new("/a", "https://y")]);

    let put = TestRequest::put().uri("/api/configurations").set_json(invalid).to_request();
    let resp = test::call_service(&app, put).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(state.mappings.snapshot().mappings.is_empty());
    assert!(!dir.path().join("config.json").exists());
  }

  #[test]
  fn concurrent_saves_leave_file_and_snapshot_equal() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);

    let writers: Vec<_> = (0..8)
      .map(|i| {
        let state = state.clone();
        std::thread::spawn(move || {
          for round in 0..10 {
            let target = format!("https://backend-{}-{}", i, round);
            state.apply(Configuration::new(vec![Mapping::new("/a", &target)])).unwrap();
          }
        })
      })
      .collect();
    for writer in writers {
      writer.join().unwrap();
    }

    assert_eq!(state.store.load().unwrap(), *state.mappings.snapshot());
  }

  #[actix_web::test]
  async fn preflight_outside_admin_resources_is_not_answered() {
    let dir = tempfile::tempdir().unwrap();
    let app = test::init_service(App::new().app_data(state(&dir)).configure(configure)).await;

    let preflight = TestRequest::default()
      .method(actix_web::http::Method::OPTIONS)
      .uri("/api/thing")
      .insert_header(("origin", "http://ui.example"))
      .insert_header(("access-control-request-method", "GET"))
      .to_request();
    let resp = test::call_service(&app, preflight).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().get("access-control-allow-origin").is_none());
  }

  #[actix_web::test]
  async fn admin_resources_answer_preflight() {
    let dir = tempfile::tempdir().unwrap();
    let app = test::init_service(App::new().app_data(state(&dir)).configure(configure)).await;

    let preflight = TestRequest::default()
      .method(actix_web::http::Method::OPTIONS)
      .uri("/api/configurations")
      .insert_header(("origin", "http://ui.example"))
      .insert_header(("access-control-request-method", "PUT"))
      .to_request();
    let resp = test::call_service(&app, preflight).await;

    assert!(resp.status().is_success());
    assert!(resp.headers().get("access-control-allow-origin").is_some());
  }

  #[actix_web::test]
  async fn lists_recent_requests() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);
    state.history.record(HistoryEntry::new("GET", "/a/x", 3, Err(String::from("refused"))));
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let get = TestRequest::get().uri("/api/requests").to_request();
    let entries: serde_json::Value = test::call_and_read_body_json(&app, get).await;

    assert_eq!(entries[0]["path"], "/a/x");
    assert_eq!(entries[0]["error"], "refused");
  }
}
