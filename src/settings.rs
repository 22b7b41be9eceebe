use clap::Parser;
use log::LevelFilter;

/// Process settings; every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "path_proxy", version, about = "Relays requests to backends selected by path prefix")]
pub struct Settings {
  #[arg(long, env = "HTTP_BIND", default_value = "0.0.0.0")]
  pub bind: String,

  #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
  pub port: u16,

  #[arg(long, env = "HTTP_WORKER_COUNT", default_value_t = 4)]
  pub workers: usize,

  /// Mapping file, JSON or YAML by extension.
  #[arg(long = "config", env = "ROUTE_CONF_LOCATION", default_value = "config.json")]
  pub config_file: String,

  /// Base URL clients use to reach this proxy; backend redirects are rewritten to it.
  /// Defaults to http://localhost:<port>.
  #[arg(long, env = "PROXY_PUBLIC_URL")]
  pub public_url: Option<String>,

  #[arg(long, env = "HTTP_PROXY_URL")]
  pub http_proxy: Option<String>,

  #[arg(long, env = "HTTP_PROXY_USER")]
  pub proxy_user: Option<String>,

  #[arg(long, env = "HTTP_PROXY_PASS")]
  pub proxy_pass: Option<String>,

  #[arg(long, env = "LOG_LEVEL", default_value_t = LevelFilter::Info)]
  pub log_level: LevelFilter,

  /// Number of relays kept for /api/requests, 0 disables it.
  #[arg(long, env = "PROXY_HISTORY_SIZE", default_value_t = 100)]
  pub history_size: usize,
}

impl Settings {
  pub fn public_url(&self) -> String {
    match &self.public_url {
      Some(url) => url.trim_end_matches('/').to_string(),
      None => format!("http://localhost:{}", self.port),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let settings = Settings::try_parse_from(["path_proxy"]).unwrap();

    assert_eq!(settings.port, 8080);
    assert_eq!(settings.workers, 4);
    assert_eq!(settings.config_file, "config.json");
    assert_eq!(settings.history_size, 100);
  }

  #[test]
  fn public_url_defaults_to_localhost_port() {
    let settings = Settings::try_parse_from(["path_proxy", "--port", "9000"]).unwrap();

    assert_eq!(settings.public_url(), "http://localhost:9000");
  }

  #[test]
  fn public_url_loses_trailing_slash() {
    let settings =
      Settings::try_parse_from(["path_proxy", "--public-url", "https://proxy.example.com/", "--log-level", "debug"]).unwrap();

    assert_eq!(settings.public_url(), "https://proxy.example.com");
    assert_eq!(settings.log_level, LevelFilter::Debug);
  }
}
