//! Process-wide HTTP client shared by the inference and transcription calls.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("precis/", env!("CARGO_PKG_VERSION"));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to default HTTP client");
            Client::new()
        })
});

/// The shared client. Request timeouts are set per call from configuration.
pub fn http_client() -> &'static Client {
    &HTTP_CLIENT
}
