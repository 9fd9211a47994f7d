//! At-exit report for compiled programs
//!
//! Dumps heap and stack KPIs when the program finishes, controlled by the
//! `KK_REPORT` env var:
//! - Unset → no report, zero cost
//! - `1` → human-readable to stderr
//! - `json` → JSON to stderr
//! - `json:/path` → JSON to file
//!
//! ## Feature Flag
//!
//! JSON output requires the `report-json` feature (enabled by default).
//! Without it, JSON requests fall back to the human format with a warning.

use crate::vm::Vm;
use serde::Serialize;
use std::io::Write;

// =============================================================================
// Report Configuration (parsed from KK_REPORT)
// =============================================================================

/// Output format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportFormat {
    Human,
    Json,
}

/// Output destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDestination {
    Stderr,
    File(String),
}

/// Parsed report configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub format: ReportFormat,
    pub destination: ReportDestination,
}

impl ReportConfig {
    /// Parse a `KK_REPORT` value; `None` means no report
    pub fn parse(val: &str) -> Option<Self> {
        match val {
            "" | "0" => None,
            "1" => Some(ReportConfig {
                format: ReportFormat::Human,
                destination: ReportDestination::Stderr,
            }),
            "json" => Some(ReportConfig {
                format: ReportFormat::Json,
                destination: ReportDestination::Stderr,
            }),
            s if s.starts_with("json:") && s.len() > 5 => Some(ReportConfig {
                format: ReportFormat::Json,
                destination: ReportDestination::File(s[5..].to_string()),
            }),
            _ => {
                eprintln!("Warning: KK_REPORT='{}' not recognized, ignoring", val);
                None
            }
        }
    }
}

// =============================================================================
// Report Data
// =============================================================================

/// Collected metrics for the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportData {
    pub objects_allocated: u64,
    pub objects_freed: u64,
    /// Objects still live at exit; anything non-zero is a leak
    pub objects_live: u64,
    pub peak_live_objects: u64,
    pub stack_high_water: usize,
    pub final_stack_depth: usize,
}

impl ReportData {
    pub fn collect(vm: &Vm, final_stack_depth: usize) -> Self {
        let stats = vm.heap().stats();
        ReportData {
            objects_allocated: stats.allocated,
            objects_freed: stats.freed,
            objects_live: stats.live(),
            peak_live_objects: stats.peak_live,
            stack_high_water: vm.stack().high_water(),
            final_stack_depth,
        }
    }
}

// =============================================================================
// Formatting
// =============================================================================

pub fn format_human(data: &ReportData) -> String {
    let mut out = String::new();
    out.push_str("=== KK REPORT ===\n");
    out.push_str(&format!("Objects allocated: {}\n", data.objects_allocated));
    out.push_str(&format!("Objects freed:     {}\n", data.objects_freed));
    out.push_str(&format!("Objects leaked:    {}\n", data.objects_live));
    out.push_str(&format!("Peak live objects: {}\n", data.peak_live_objects));
    out.push_str(&format!("Stack high water:  {}\n", data.stack_high_water));
    out.push_str(&format!("Final stack depth: {}\n", data.final_stack_depth));
    out.push_str("=================\n");
    out
}

#[cfg(feature = "report-json")]
pub fn format_json(data: &ReportData) -> String {
    serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(not(feature = "report-json"))]
pub fn format_json(data: &ReportData) -> String {
    eprintln!(
        "Warning: KK_REPORT=json requires the 'report-json' feature. Falling back to human format."
    );
    format_human(data)
}

// =============================================================================
// Emit
// =============================================================================

pub fn emit_report(config: &ReportConfig, data: &ReportData) {
    let output = match config.format {
        ReportFormat::Human => format_human(data),
        ReportFormat::Json => {
            let mut json = format_json(data);
            json.push('\n');
            json
        }
    };

    match &config.destination {
        ReportDestination::Stderr => {
            let _ = std::io::stderr().write_all(output.as_bytes());
        }
        ReportDestination::File(path) => {
            if let Ok(mut f) = std::fs::File::create(path) {
                let _ = f.write_all(output.as_bytes());
            } else {
                eprintln!("Warning: could not write report to {}", path);
                let _ = std::io::stderr().write_all(output.as_bytes());
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
