//! Named health probes with a per-call time budget
//!
//! Every probe runs in its own task. The registry never returns an error:
//! a probe that overruns its budget yields `Unknown("timeout")`, and a probe
//! that panics yields `Unhealthy`.

mod tcp;
mod web;

pub use tcp::TcpProbe;
pub use web::WebUrlProbe;

use crate::config::ConfigValue;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Reason reported when a probe overruns its budget
pub const TIMEOUT_REASON: &str = "timeout";

/// Reason reported while a service is inside its startup grace period
pub const STARTING_REASON: &str = "starting";

/// Tri-state verdict of a probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "reason", rename_all = "lowercase")]
pub enum HealthResult {
    Healthy,
    Unhealthy(String),
    /// The probe could not reach a verdict
    Unknown(String),
}

impl HealthResult {
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self::Unhealthy(reason.into())
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::Unknown(reason.into())
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Healthy => None,
            Self::Unhealthy(r) | Self::Unknown(r) => Some(r),
        }
    }
}

impl fmt::Display for HealthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy(r) => write!(f, "unhealthy: {r}"),
            Self::Unknown(r) => write!(f, "unknown: {r}"),
        }
    }
}

/// What a probe gets to look at
#[derive(Debug, Clone, Default)]
pub struct ProbeContext {
    /// Configuration currently applied
    pub config: Arc<ConfigValue>,
    /// How long the service has been running, when the host reports it
    pub uptime: Option<Duration>,
}

impl ProbeContext {
    pub fn new(config: Arc<ConfigValue>) -> Self {
        Self { config, uptime: None }
    }

    #[must_use]
    pub fn with_uptime(mut self, uptime: Duration) -> Self {
        self.uptime = Some(uptime);
        self
    }

    /// Whether the service is still inside `grace` after start
    pub fn within_grace(&self, grace: Duration) -> bool {
        self.uptime.is_some_and(|up| up < grace)
    }

    /// Port stored under a top-level key, if present and in range
    pub fn port(&self, key: &str) -> Option<u16> {
        self.config
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .and_then(|p| u16::try_from(p).ok())
    }
}

/// Trait for health probes
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, ctx: &ProbeContext) -> HealthResult;
}

/// Adapter turning an async closure into a [`Probe`]
pub struct FnProbe<F>(F);

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn(ProbeContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HealthResult> + Send + 'static,
{
    async fn check(&self, ctx: &ProbeContext) -> HealthResult {
        (self.0)(ctx.clone()).await
    }
}

/// Wrap an async closure as a probe
pub fn probe_fn<F, Fut>(f: F) -> FnProbe<F>
where
    F: Fn(ProbeContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HealthResult> + Send + 'static,
{
    FnProbe(f)
}

/// Named probes in registration order
#[derive(Default, Clone)]
pub struct HealthRegistry {
    probes: Vec<(String, Arc<dyn Probe>)>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe; an existing probe with the same name is replaced
    pub fn register(&mut self, name: impl Into<String>, probe: impl Probe + 'static) -> &mut Self {
        let name = name.into();
        let probe: Arc<dyn Probe> = Arc::new(probe);
        match self.probes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = probe,
            None => self.probes.push((name, probe)),
        }
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    fn get(&self, name: &str) -> Option<Arc<dyn Probe>> {
        self.probes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| Arc::clone(p))
    }

    /// Run one probe within `budget`
    pub async fn run(&self, name: &str, budget: Duration, ctx: ProbeContext) -> HealthResult {
        match self.get(name) {
            Some(probe) => run_guarded(name.to_string(), probe, budget, ctx).await,
            None => HealthResult::unknown(format!("no health check named '{name}'")),
        }
    }

    /// Run every probe concurrently, each with its own `budget`
    pub async fn run_all(&self, budget: Duration, ctx: ProbeContext) -> Vec<(String, HealthResult)> {
        let handles: Vec<_> = self
            .probes
            .iter()
            .map(|(name, probe)| {
                let task = run_guarded(name.clone(), Arc::clone(probe), budget, ctx.clone());
                (name.clone(), tokio::spawn(task))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let result = handle
                .await
                .unwrap_or_else(|e| HealthResult::unknown(format!("probe task failed: {e}")));
            results.push((name, result));
        }
        results
    }
}

impl fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthRegistry")
            .field("probes", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

async fn run_guarded(
    name: String,
    probe: Arc<dyn Probe>,
    budget: Duration,
    ctx: ProbeContext,
) -> HealthResult {
    let task = tokio::spawn(async move { probe.check(&ctx).await });
    let abort = task.abort_handle();

    let result = match tokio::time::timeout(budget, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) if e.is_panic() => {
            warn!("Health check '{name}' panicked");
            HealthResult::unhealthy("health check panicked")
        }
        Ok(Err(_)) => HealthResult::unknown("health check was cancelled"),
        Err(_) => {
            abort.abort();
            warn!("Health check '{name}' exceeded its budget of {budget:?}");
            HealthResult::unknown(TIMEOUT_REASON)
        }
    };
    debug!("Health check '{name}': {result}");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_serialization() {
        assert_eq!(
            serde_json::to_value(HealthResult::Healthy).unwrap(),
            json!({"result": "healthy"})
        );
        assert_eq!(
            serde_json::to_value(HealthResult::unknown("timeout")).unwrap(),
            json!({"result": "unknown", "reason": "timeout"})
        );
    }

    #[test]
    fn test_context_port() {
        let config = json!({"ui-port": 5173, "bad": 70000}).as_object().unwrap().clone();
        let ctx = ProbeContext::new(Arc::new(config));
        assert_eq!(ctx.port("ui-port"), Some(5173));
        assert_eq!(ctx.port("bad"), None);
        assert_eq!(ctx.port("missing"), None);
    }

    #[test]
    fn test_within_grace() {
        let ctx = ProbeContext::default();
        assert!(!ctx.within_grace(Duration::from_secs(10)));
        let ctx = ctx.with_uptime(Duration::from_secs(3));
        assert!(ctx.within_grace(Duration::from_secs(10)));
        assert!(!ctx.within_grace(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn test_run_and_unknown_name() {
        let mut registry = HealthRegistry::new();
        registry.register("ok", probe_fn(|_| async { HealthResult::Healthy }));

        let budget = Duration::from_secs(1);
        assert_eq!(
            registry.run("ok", budget, ProbeContext::default()).await,
            HealthResult::Healthy
        );
        let missing = registry.run("nope", budget, ProbeContext::default()).await;
        assert!(matches!(missing, HealthResult::Unknown(ref r) if r.contains("nope")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_unknown() {
        let mut registry = HealthRegistry::new();
        registry.register(
            "hung",
            probe_fn(|_| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                HealthResult::Healthy
            }),
        );

        let result = registry
            .run("hung", Duration::from_millis(100), ProbeContext::default())
            .await;
        assert_eq!(result, HealthResult::unknown(TIMEOUT_REASON));
    }

    #[tokio::test]
    async fn test_panic_yields_unhealthy() {
        let mut registry = HealthRegistry::new();
        registry.register(
            "boom",
            probe_fn(|ctx| async move {
                if ctx.uptime.is_none() {
                    panic!("probe exploded");
                }
                HealthResult::Healthy
            }),
        );

        let result = registry
            .run("boom", Duration::from_secs(1), ProbeContext::default())
            .await;
        assert!(matches!(result, HealthResult::Unhealthy(_)));
    }

    #[tokio::test]
    async fn test_register_replaces() {
        let mut registry = HealthRegistry::new();
        registry.register("a", probe_fn(|_| async { HealthResult::unhealthy("old") }));
        registry.register("a", probe_fn(|_| async { HealthResult::Healthy }));
        assert_eq!(registry.len(), 1);
        assert!(
            registry
                .run("a", Duration::from_secs(1), ProbeContext::default())
                .await
                .is_healthy()
        );
    }
}
