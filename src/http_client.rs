use reqwest::redirect::Policy;
use reqwest::Client;

/// Outbound client settings. Redirects are never followed so backend redirects reach
/// the caller and can be rewritten.
#[derive(Default)]
pub struct HttpClientConfig {
  pub http_proxy: Option<String>,
  pub user: Option<String>,
  pub pass: Option<String>,
}

impl HttpClientConfig {
  pub fn to_client(self) -> Result<Client, reqwest::Error> {
    let HttpClientConfig { http_proxy, user, pass } = self;
    let mut client_builder = reqwest::ClientBuilder::new();

    if let Some(proxy_url) = http_proxy {
      let mut proxy = reqwest::Proxy::all(proxy_url)?;

      if let (Some(user_name), Some(password)) = (user, pass) {
        proxy = proxy.basic_auth(&user_name, &password);
      }

      client_builder = client_builder.proxy(proxy);
    }

    let client = client_builder.redirect(Policy::none()).build()?;

    Ok(client)
  }
}
