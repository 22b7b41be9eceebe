//! Relay of inbound requests to the backend selected by path prefix.
//!
//! A request flows through `mapping_resolver` (pick mapping, compose target URL),
//! `upstream_request` (rebuild the request), `relay_executor` (send it, redirects not
//! followed) and `response_transcriber` (copy head and body back, keep a textual copy of
//! the body). `proxy_route_service` glues them into an actix service.

pub mod channel_writer;
pub mod diagnostic_body;
pub mod mapping_resolver;
pub mod proxy_config;
pub mod proxy_factory;
pub mod proxy_route_service;
pub mod relay_error;
pub mod relay_executor;
pub mod response_transcriber;
pub mod upstream_request;

pub use proxy_config::ProxyConfig;
pub use proxy_factory::ProxyRouteServiceFactory;
pub use response_transcriber::ProxyResult;
