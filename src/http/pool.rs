use reqwest::Client;
use std::time::Duration;
use crate::error::Result;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const USER_AGENT: &str = concat!("crpt-client/", env!("CARGO_PKG_VERSION"));

/// Timeouts for the HTTP client used by the executor.
#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
        }
    }
}

pub fn create_http_client(settings: &HttpSettings) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .tcp_nodelay(true)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()?;

    Ok(client)
}
