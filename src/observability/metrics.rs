//! Metrics collection.
//!
//! # Metrics
//! - `propmap_lines_total` (counter): loader line outcomes by `outcome`
//! - `propmap_substitutions_total` (counter): `$(name)` expansions by `result`
//! - `propmap_references_total` (counter): inheritance steps by `result`
//! - `propmap_entries` (gauge): entries in the most recently loaded map
//!
//! # Design Decisions
//! - Labels are static strings so recording never allocates
//! - No exporter is installed here; the host decides where metrics go

/// Record the outcome of one loader line.
pub fn record_line(outcome: &'static str) {
    ::metrics::counter!("propmap_lines_total", "outcome" => outcome).increment(1);
}

/// Record one `$(name)` expansion attempt.
pub fn record_substitution(result: &'static str) {
    ::metrics::counter!("propmap_substitutions_total", "result" => result).increment(1);
}

/// Record one reference inheritance step.
pub fn record_reference(result: &'static str) {
    ::metrics::counter!("propmap_references_total", "result" => result).increment(1);
}

/// Record the entry count of a freshly loaded map.
pub fn record_entries(count: usize) {
    ::metrics::gauge!("propmap_entries").set(count as f64);
}
