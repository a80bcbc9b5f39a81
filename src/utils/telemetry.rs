//! Telemetry Module
//!
//! In-process counters for what the bot did since startup. Nothing typed by
//! a user is kept: no amounts, categories, descriptions or names. Every key
//! is a fixed label, so memory does not grow with traffic.
//!
//! The snapshot is served by the health API, logged at shutdown and, when a
//! directory is configured, exported as JSON.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::errors::AppResult;

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub messages_handled: u64,
    pub denied: u64,
    pub commands: u64,
    pub expenses_recorded: u64,
    pub sink_failures: u64,
    pub unrecognized: u64,
    /// Rejections keyed by kind (`invalid_amount`, ...)
    pub rejections: BTreeMap<String, u64>,
    /// Recorded expenses whose category is in the registry
    pub known_category_expenses: u64,
    /// Recorded expenses with a free-form standard-form category
    pub free_form_category_expenses: u64,
    pub started_at: DateTime<Utc>,
    pub taken_at: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn total_rejections(&self) -> u64 {
        self.rejections.values().sum()
    }

    /// One-line summary for the shutdown log
    pub fn summary(&self) -> String {
        format!(
            "handled={} recorded={} rejected={} unrecognized={} denied={} sink_failures={}",
            self.messages_handled,
            self.expenses_recorded,
            self.total_rejections(),
            self.unrecognized,
            self.denied,
            self.sink_failures,
        )
    }
}

/// Main stats collector, shared as `Arc<BotStats>`
pub struct BotStats {
    messages_handled: AtomicU64,
    denied: AtomicU64,
    commands: AtomicU64,
    expenses_recorded: AtomicU64,
    sink_failures: AtomicU64,
    unrecognized: AtomicU64,
    known_category_expenses: AtomicU64,
    free_form_category_expenses: AtomicU64,
    rejections: DashMap<&'static str, u64>,
    started_at: DateTime<Utc>,
}

impl Default for BotStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BotStats {
    pub fn new() -> Self {
        Self {
            messages_handled: AtomicU64::new(0),
            denied: AtomicU64::new(0),
            commands: AtomicU64::new(0),
            expenses_recorded: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            unrecognized: AtomicU64::new(0),
            known_category_expenses: AtomicU64::new(0),
            free_form_category_expenses: AtomicU64::new(0),
            rejections: DashMap::new(),
            started_at: Utc::now(),
        }
    }

    pub fn record_message(&self) {
        self.messages_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    /// `known_category`: whether the category matched the registry
    pub fn record_expense(&self, known_category: bool) {
        self.expenses_recorded.fetch_add(1, Ordering::Relaxed);
        if known_category {
            self.known_category_expenses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.free_form_category_expenses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unrecognized(&self) {
        self.unrecognized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, kind: &'static str) {
        *self.rejections.entry(kind).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            messages_handled: self.messages_handled.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
            expenses_recorded: self.expenses_recorded.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            known_category_expenses: self.known_category_expenses.load(Ordering::Relaxed),
            free_form_category_expenses: self.free_form_category_expenses.load(Ordering::Relaxed),
            rejections: self
                .rejections
                .iter()
                .map(|e| (e.key().to_string(), *e.value()))
                .collect(),
            started_at: self.started_at,
            taken_at: Utc::now(),
        }
    }

    /// Write the current snapshot as pretty JSON into `dir`
    pub fn export_stats_json(&self, dir: &Path) -> AppResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let snapshot = self.snapshot();
        let path = dir.join(format!(
            "stats_{}.json",
            snapshot.taken_at.format("%Y%m%d_%H%M%S")
        ));
        fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = BotStats::new();
        stats.record_message();
        stats.record_message();
        stats.record_expense(true);
        stats.record_expense(false);
        stats.record_rejection("invalid_amount");
        stats.record_denied();

        let snap = stats.snapshot();
        assert_eq!(snap.messages_handled, 2);
        assert_eq!(snap.expenses_recorded, 2);
        assert_eq!(snap.known_category_expenses, 1);
        assert_eq!(snap.free_form_category_expenses, 1);
        assert_eq!(snap.total_rejections(), 1);
        assert_eq!(snap.denied, 1);
        assert!(snap.summary().contains("recorded=2"));
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::tempdir().unwrap();
        let stats = BotStats::new();
        stats.record_unrecognized();

        let path = stats.export_stats_json(dir.path()).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        let parsed: StatsSnapshot = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.unrecognized, 1);
    }
}
