//! Versioned upgrade/downgrade transforms
//!
//! A ledger records transforms keyed by the version they migrate *from*. The
//! step recorded at `S` moves data from `S` to the next recorded version, or
//! to the current version when `S` is the last one. Upgrades run `up`
//! transforms in ascending order; downgrades run `down` transforms in
//! descending order.
//!
//! # Example
//!
//! ```rust
//! use hostconf::{ConfigValue, MigrationLedger};
//! use serde_json::json;
//!
//! let mut ledger = MigrationLedger::new("0.2.0.0").unwrap();
//! ledger
//!     .record(
//!         "0.1.0.0",
//!         |mut v: ConfigValue| {
//!             v.insert("max-instances".into(), json!(10));
//!             Ok(v)
//!         },
//!         |mut v: ConfigValue| {
//!             v.remove("max-instances");
//!             Ok(v)
//!         },
//!     )
//!     .unwrap();
//!
//! let migrated = ledger.migrate(&ConfigValue::new(), "0.1.0.0", "0.2.0.0").unwrap();
//! assert_eq!(migrated["max-instances"], json!(10));
//! ```

mod version;

pub use version::Version;

use crate::config::ConfigValue;
use crate::error::{MigrationError, MigrationErrorKind, Result};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A single transform over a configuration tree
pub type Transform = Arc<dyn Fn(ConfigValue) -> std::result::Result<ConfigValue, String> + Send + Sync>;

struct Step {
    up: Transform,
    down: Transform,
}

/// Which way a plan runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upgrade,
    Downgrade,
}

/// One transform in a plan together with the boundary it crosses
#[derive(Clone)]
pub struct PlannedStep {
    pub from: Version,
    pub to: Version,
    transform: Transform,
}

impl PlannedStep {
    /// `from -> to`, as reported in step failures
    pub fn boundary(&self) -> String {
        format!("{} -> {}", self.from, self.to)
    }
}

impl fmt::Debug for PlannedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlannedStep({})", self.boundary())
    }
}

impl PartialEq for PlannedStep {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && Arc::ptr_eq(&self.transform, &other.transform)
    }
}

/// An ordered list of transforms from one version to another
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    pub from: Version,
    pub to: Version,
    pub direction: Direction,
    pub steps: Vec<PlannedStep>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Concatenate two plans sharing a middle version
    pub fn then(mut self, next: MigrationPlan) -> MigrationPlan {
        self.to = next.to;
        self.steps.extend(next.steps);
        self
    }
}

fn unreachable(detail: String) -> MigrationError {
    MigrationError {
        kind: MigrationErrorKind::UnknownVersion,
        detail,
        boundary: None,
    }
}

/// Ordered mapping of source versions to transforms, plus the current version
pub struct MigrationLedger {
    current: Version,
    steps: BTreeMap<Version, Step>,
}

impl MigrationLedger {
    /// An empty ledger at `current`
    pub fn new(current: &str) -> Result<Self> {
        Ok(Self {
            current: current.parse()?,
            steps: BTreeMap::new(),
        })
    }

    /// Record the transforms leaving `from_version`.
    ///
    /// `from_version` must be older than the current version; recording the
    /// same version twice replaces the earlier transforms.
    pub fn record<U, D>(&mut self, from_version: &str, up: U, down: D) -> Result<&mut Self>
    where
        U: Fn(ConfigValue) -> std::result::Result<ConfigValue, String> + Send + Sync + 'static,
        D: Fn(ConfigValue) -> std::result::Result<ConfigValue, String> + Send + Sync + 'static,
    {
        let version: Version = from_version.parse()?;
        if version >= self.current {
            return Err(crate::error::Error::InvalidVersion(format!(
                "{version} is not older than the current version {}",
                self.current
            )));
        }
        let step = Step {
            up: Arc::new(up),
            down: Arc::new(down),
        };
        if self.steps.insert(version, step).is_some() {
            debug!("Replaced migration recorded at {version}");
        }
        Ok(self)
    }

    pub fn current(&self) -> Version {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every version the ledger knows, ascending, ending with the current one
    pub fn versions(&self) -> Vec<Version> {
        self.steps
            .keys()
            .copied()
            .chain(std::iter::once(self.current))
            .collect()
    }

    /// Whether `version` is recorded or is the current version
    pub fn knows(&self, version: &Version) -> bool {
        *version == self.current || self.steps.contains_key(version)
    }

    fn known(&self, version: &str) -> std::result::Result<Version, MigrationError> {
        let parsed: Version = version
            .parse()
            .map_err(|_| MigrationError::unknown_version(version))?;
        if self.knows(&parsed) {
            Ok(parsed)
        } else {
            Err(MigrationError::unknown_version(parsed))
        }
    }

    /// Version following `version` in the ledger's history
    fn successor(&self, version: &Version) -> Version {
        self.steps
            .range((std::ops::Bound::Excluded(*version), std::ops::Bound::Unbounded))
            .next()
            .map(|(v, _)| *v)
            .unwrap_or(self.current)
    }

    /// Plan the `up` transforms taking data from `from` to `to`, ascending
    pub fn plan_upgrade(&self, from: &str, to: &str) -> std::result::Result<MigrationPlan, MigrationError> {
        let (from, to) = (self.known(from)?, self.known(to)?);
        if from > to {
            return Err(unreachable(format!("cannot upgrade from {from} to older version {to}")));
        }

        let steps = self
            .steps
            .range(from..to)
            .map(|(version, step)| PlannedStep {
                from: *version,
                to: self.successor(version),
                transform: Arc::clone(&step.up),
            })
            .collect();

        Ok(MigrationPlan {
            from,
            to,
            direction: Direction::Upgrade,
            steps,
        })
    }

    /// Plan the `down` transforms taking data from `from` back to `to`, descending
    pub fn plan_downgrade(&self, from: &str, to: &str) -> std::result::Result<MigrationPlan, MigrationError> {
        let (from, to) = (self.known(from)?, self.known(to)?);
        if from < to {
            return Err(unreachable(format!("cannot downgrade from {from} to newer version {to}")));
        }

        let steps = self
            .steps
            .range(to..from)
            .rev()
            .map(|(version, step)| PlannedStep {
                from: self.successor(version),
                to: *version,
                transform: Arc::clone(&step.down),
            })
            .collect();

        Ok(MigrationPlan {
            from,
            to,
            direction: Direction::Downgrade,
            steps,
        })
    }

    /// Plan in whichever direction `from -> to` requires
    pub fn plan(&self, from: &str, to: &str) -> std::result::Result<MigrationPlan, MigrationError> {
        let (f, t) = (self.known(from)?, self.known(to)?);
        if f <= t {
            self.plan_upgrade(from, to)
        } else {
            self.plan_downgrade(from, to)
        }
    }

    /// Run a plan against a value.
    ///
    /// All or nothing: `value` is never modified, and the first failing step
    /// aborts the whole plan with its version boundary.
    pub fn apply(&self, value: &ConfigValue, plan: &MigrationPlan) -> std::result::Result<ConfigValue, MigrationError> {
        let mut current = value.clone();
        for step in &plan.steps {
            debug!("Running migration step {}", step.boundary());
            current = (step.transform)(current)
                .map_err(|detail| MigrationError::step_failed(step.boundary(), detail))?;
        }
        Ok(current)
    }

    /// Plan and apply in one go
    pub fn migrate(&self, value: &ConfigValue, from: &str, to: &str) -> std::result::Result<ConfigValue, MigrationError> {
        let plan = self.plan(from, to)?;
        if plan.is_empty() {
            debug!("No migration steps between {} and {}", plan.from, plan.to);
            return Ok(value.clone());
        }
        info!(
            "Migrating configuration {} -> {} ({} step(s))",
            plan.from,
            plan.to,
            plan.steps.len()
        );
        self.apply(value, &plan)
    }
}

impl fmt::Debug for MigrationLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationLedger")
            .field("current", &self.current.to_string())
            .field("recorded", &self.steps.keys().map(ToString::to_string).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tag(label: &'static str) -> impl Fn(ConfigValue) -> std::result::Result<ConfigValue, String> {
        move |mut v: ConfigValue| {
            let trail = v
                .entry("trail")
                .or_insert_with(|| json!([]))
                .as_array_mut()
                .ok_or("trail is not an array")?;
            trail.push(json!(label));
            Ok(v)
        }
    }

    fn ledger() -> MigrationLedger {
        let mut ledger = MigrationLedger::new("0.4").unwrap();
        ledger.record("0.1", tag("up1"), tag("down1")).unwrap();
        ledger.record("0.2", tag("up2"), tag("down2")).unwrap();
        ledger.record("0.3", tag("up3"), tag("down3")).unwrap();
        ledger
    }

    fn trail(value: &ConfigValue) -> Vec<String> {
        value["trail"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_empty_ledger_noop() {
        let ledger = MigrationLedger::new("0.1.0.1").unwrap();
        let plan = ledger.plan_upgrade("0.1.0.1", "0.1.0.1").unwrap();
        assert!(plan.is_empty());

        let value = json!({"api-port": 8080}).as_object().unwrap().clone();
        assert_eq!(ledger.migrate(&value, "0.1.0.1", "0.1.0.1").unwrap(), value);
    }

    #[test]
    fn test_upgrade_order_and_boundaries() {
        let ledger = ledger();
        let plan = ledger.plan_upgrade("0.1", "0.4").unwrap();
        let boundaries: Vec<_> = plan.steps.iter().map(PlannedStep::boundary).collect();
        assert_eq!(boundaries, ["0.1 -> 0.2", "0.2 -> 0.3", "0.3 -> 0.4"]);

        let out = ledger.apply(&ConfigValue::new(), &plan).unwrap();
        assert_eq!(trail(&out), ["up1", "up2", "up3"]);
    }

    #[test]
    fn test_downgrade_order() {
        let ledger = ledger();
        let plan = ledger.plan_downgrade("0.4", "0.2").unwrap();
        let boundaries: Vec<_> = plan.steps.iter().map(PlannedStep::boundary).collect();
        assert_eq!(boundaries, ["0.4 -> 0.3", "0.3 -> 0.2"]);

        let out = ledger.apply(&ConfigValue::new(), &plan).unwrap();
        assert_eq!(trail(&out), ["down3", "down2"]);
    }

    #[test]
    fn test_plans_compose() {
        let ledger = ledger();
        let whole = ledger.plan_upgrade("0.1", "0.4").unwrap();
        let split = ledger
            .plan_upgrade("0.1", "0.3")
            .unwrap()
            .then(ledger.plan_upgrade("0.3", "0.4").unwrap());
        assert_eq!(whole, split);
    }

    #[test]
    fn test_unknown_version() {
        let ledger = ledger();
        let err = ledger.plan_upgrade("0.0.9", "0.4").unwrap_err();
        assert_eq!(err.kind, MigrationErrorKind::UnknownVersion);

        let err = ledger.plan_upgrade("0.1", "0.5").unwrap_err();
        assert_eq!(err.kind, MigrationErrorKind::UnknownVersion);

        let err = ledger.plan_upgrade("not-a-version", "0.4").unwrap_err();
        assert_eq!(err.kind, MigrationErrorKind::UnknownVersion);
    }

    #[test]
    fn test_wrong_direction_rejected() {
        let ledger = ledger();
        assert!(ledger.plan_upgrade("0.3", "0.1").is_err());
        assert!(ledger.plan_downgrade("0.1", "0.3").is_err());
        assert_eq!(ledger.plan("0.3", "0.1").unwrap().direction, Direction::Downgrade);
    }

    #[test]
    fn test_failing_step_is_all_or_nothing() {
        let mut ledger = ledger();
        ledger
            .record("0.2", tag("up2"), |_| Err("cannot go back".to_string()))
            .unwrap();

        let original = json!({"trail": []}).as_object().unwrap().clone();
        let err = ledger.migrate(&original, "0.4", "0.1").unwrap_err();
        assert_eq!(err.kind, MigrationErrorKind::StepFailed);
        assert_eq!(err.boundary.as_deref(), Some("0.3 -> 0.2"));
        assert_eq!(err.detail, "cannot go back");
        assert_eq!(original, json!({"trail": []}).as_object().unwrap().clone());
    }

    #[test]
    fn test_record_rejects_current_or_newer() {
        let mut ledger = MigrationLedger::new("0.2").unwrap();
        assert!(ledger.record("0.2", tag("a"), tag("b")).is_err());
        assert!(ledger.record("0.3", tag("a"), tag("b")).is_err());
        assert!(ledger.is_empty());
        assert_eq!(ledger.versions(), vec![Version::parse("0.2").unwrap()]);
    }
}
