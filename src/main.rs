mod admin;
mod configuration_store;
mod history;
mod http_client;
mod proxy_service;
mod route_config;
mod settings;
mod std_logger;

use std::io::{ErrorKind, Result};
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;

use crate::admin::AdminState;
use crate::configuration_store::{ConfigurationStore, FileConfigurationStore, SharedConfiguration};
use crate::history::ProxyHistory;
use crate::http_client::HttpClientConfig;
use crate::proxy_service::{ProxyConfig, ProxyRouteServiceFactory};
use crate::settings::Settings;
use crate::std_logger::StdLogger;

#[actix_web::main]
async fn main() -> Result<()> {
  let settings = Settings::parse();
  StdLogger::init(settings.log_level).map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;

  let http_client = HttpClientConfig {
    http_proxy: settings.http_proxy.clone(),
    user: settings.proxy_user.clone(),
    pass: settings.proxy_pass.clone(),
  }
  .to_client()
  .map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;

  let store = FileConfigurationStore::new(&settings.config_file);
  let configuration = store
    .load()
    .map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;
  configuration
    .validate()
    .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;

  for mapping in configuration.mappings.iter() {
    info!("Mapping '{}' -> '{}'{}.", mapping.from, mapping.to, if mapping.active { "" } else { " (inactive)" });
  }

  let mappings = Arc::new(SharedConfiguration::new(configuration));
  let history = Arc::new(ProxyHistory::new(settings.history_size));
  let public_url = settings.public_url();
  let proxy_config = Arc::new(ProxyConfig::new(&public_url, mappings.clone(), history.clone()));
  let admin_state = web::Data::new(AdminState::new(Arc::new(store), mappings, history));

  info!(
    "Listening on {}:{} with {} worker(s), redirects rewritten to '{}'.",
    settings.bind, settings.port, settings.workers, public_url
  );

  HttpServer::new(move || {
    App::new()
      .app_data(admin_state.clone())
      .configure(admin::configure)
      .default_service(ProxyRouteServiceFactory::new(proxy_config.clone(), http_client.clone()))
  })
  .workers(settings.workers)
  .bind((settings.bind.as_str(), settings.port))?
  .run()
  .await
}
