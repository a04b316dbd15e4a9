//! Outbound HTTP client construction.

use std::time::Duration;

use reqwest::Client;

/// Client for talking to the desk device: per-request timeout, short
/// connect timeout, no redirects.
pub fn create_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    base_builder(timeout).build()
}

fn base_builder(timeout: Duration) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(3)))
        .tcp_nodelay(true)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(concat!("thinq-bridge/", env!("CARGO_PKG_VERSION")))
}
