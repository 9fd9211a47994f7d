//! Runtime configuration
//!
//! Read once from the environment when the first VM of the process is built:
//! - `KK_REPORT` → at-exit report (see `report.rs`)
//! - `KK_STACK_CAPACITY` → initial operand stack capacity in cells
//! - `KK_LOG` → tracing filter directives (default `warn`)

use crate::report::ReportConfig;
use kk_core::DEFAULT_STACK_CAPACITY;
use std::sync::OnceLock;

pub const REPORT_ENV: &str = "KK_REPORT";
pub const STACK_CAPACITY_ENV: &str = "KK_STACK_CAPACITY";
pub const LOG_ENV: &str = "KK_LOG";

pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub report: Option<ReportConfig>,
    pub stack_capacity: usize,
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            report: None,
            stack_capacity: DEFAULT_STACK_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Build from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let report = lookup(REPORT_ENV).and_then(|v| ReportConfig::parse(&v));

        let stack_capacity = match lookup(STACK_CAPACITY_ENV) {
            Some(v) => match v.trim().parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!(
                        "Warning: {}='{}' is not a cell count, using {}",
                        STACK_CAPACITY_ENV, v, DEFAULT_STACK_CAPACITY
                    );
                    DEFAULT_STACK_CAPACITY
                }
            },
            None => DEFAULT_STACK_CAPACITY,
        };

        let log_filter = lookup(LOG_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        RuntimeConfig {
            report,
            stack_capacity,
            log_filter,
        }
    }
}

static RUNTIME_CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// Process-wide configuration, parsed on first use
pub fn runtime_config() -> &'static RuntimeConfig {
    RUNTIME_CONFIG.get_or_init(RuntimeConfig::from_env)
}
