use super::{HealthResult, Probe, ProbeContext, STARTING_REASON};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP reachability of a port taken from configuration
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port_key: String,
    default_port: u16,
    label: String,
    startup_grace: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port_key: impl Into<String>, default_port: u16) -> Self {
        let port_key = port_key.into();
        Self {
            host: host.into(),
            label: port_key.clone(),
            port_key,
            default_port,
            startup_grace: Duration::ZERO,
        }
    }

    /// Name used in failure reasons (e.g. "API server")
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    pub fn address(&self, ctx: &ProbeContext) -> String {
        let port = ctx.port(&self.port_key).unwrap_or(self.default_port);
        format!("{}:{}", self.host, port)
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn check(&self, ctx: &ProbeContext) -> HealthResult {
        if ctx.within_grace(self.startup_grace) {
            return HealthResult::unknown(STARTING_REASON);
        }

        let address = self.address(ctx);
        match TcpStream::connect(&address).await {
            Ok(_) => HealthResult::Healthy,
            Err(e) => {
                debug!("{address} unreachable: {e}");
                HealthResult::unhealthy(format!("The {} is unreachable", self.label))
            }
        }
    }
}
