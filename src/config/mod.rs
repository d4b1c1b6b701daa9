//! Configuration schema types
//!
//! This module contains the declarative side of the contract:
//! - `OptionSpec` / `OptionKind` - One typed, constrained option and its validation
//! - `ConfigSpec` - Ordered option collection, defaults, and display rendering
//! - `NumberRange` - Interval notation for numeric options
//! - `PackageConfig` - Runtime settings for a package instance

mod range;
mod schema;
mod spec;
mod types;

pub use range::{Bound, NumberRange};
pub use schema::{
    BooleanSpec, EnumSpec, NumberSpec, ObjectSpec, OptionKind, OptionSpec, StringSpec,
};
pub use spec::{ConfigSpec, ConfigValue, DisplayChoice, DisplayOption, DisplaySchema};
pub use types::{
    DEFAULT_HEALTH_TIMEOUT, DEFAULT_STARTUP_GRACE, PackageConfig, PackageConfigBuilder,
};
