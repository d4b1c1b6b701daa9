use super::{HealthResult, Probe, ProbeContext, STARTING_REASON};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

/// HTTP reachability of a web interface whose port comes from configuration.
///
/// Any HTTP response counts as reachable; the probe only cares that something
/// is listening and speaking HTTP.
#[derive(Debug, Clone)]
pub struct WebUrlProbe {
    host: String,
    port_key: String,
    default_port: u16,
    path: String,
    startup_grace: Duration,
    /// Build failure kept as a reason so checks can report it
    client: Result<reqwest::Client, String>,
}

impl WebUrlProbe {
    /// Probe `http://{host}:{port}/`, reading the port from `port_key`
    pub fn new(host: impl Into<String>, port_key: impl Into<String>, default_port: u16) -> Self {
        Self {
            host: host.into(),
            port_key: port_key.into(),
            default_port,
            path: "/".to_string(),
            startup_grace: Duration::ZERO,
            // Service hosts are local to the platform; never route them through a proxy
            client: reqwest::Client::builder()
                .no_proxy()
                .build()
                .map_err(|e| e.to_string()),
        }
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') { path } else { format!("/{path}") };
        self
    }

    /// Report "starting" instead of probing while uptime is below `grace`
    #[must_use]
    pub fn startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    /// URL this probe would hit under `ctx`
    pub fn url(&self, ctx: &ProbeContext) -> String {
        let port = ctx.port(&self.port_key).unwrap_or(self.default_port);
        format!("http://{}:{}{}", self.host, port, self.path)
    }
}

#[async_trait]
impl Probe for WebUrlProbe {
    async fn check(&self, ctx: &ProbeContext) -> HealthResult {
        if ctx.within_grace(self.startup_grace) {
            return HealthResult::unknown(STARTING_REASON);
        }

        let client = match &self.client {
            Ok(client) => client,
            Err(e) => return HealthResult::unknown(format!("HTTP client unavailable: {e}")),
        };

        let url = self.url(ctx);
        match client.get(&url).send().await {
            Ok(response) => {
                debug!("{url} answered with {}", response.status());
                HealthResult::Healthy
            }
            Err(e) => {
                debug!("{url} unreachable: {e}");
                HealthResult::unhealthy("The web interface is unreachable")
            }
        }
    }
}
