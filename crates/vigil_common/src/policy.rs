//! Escalation policy table.
//!
//! Immutable lookup `(severity, level) -> { next, delay }` loaded once at
//! startup. Absence of an entry is a terminal/undefined state: lookups
//! return `None` and callers must not silently proceed.
//!
//! Wire format (JSON array):
//!
//! ```json
//! [{ "severity": "high", "level": 5, "next": "CLOSE", "delaySeconds": 21600 }]
//! ```
//!
//! `next` is either an integer level or the string `"CLOSE"`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::complaint::Severity;

/// Where a rung leads: the next level, or closure of the complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Escalate(u32),
    Close,
}

/// One resolved rung of the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyStep {
    pub next: NextStep,
    pub delay: Duration,
}

/// Wire representation of a single policy entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PolicyEntry {
    severity: Severity,
    level: u32,
    next: NextValue,
    #[serde(rename = "delaySeconds")]
    delay_seconds: u64,
}

/// `next` on the wire: an int level or the literal string "CLOSE".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum NextValue {
    Level(u32),
    Keyword(String),
}

/// Immutable (severity, level) -> step table.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    table: HashMap<(Severity, u32), PolicyStep>,
}

impl EscalationPolicy {
    /// Typed lookup. `None` means the pair is undefined in the policy and
    /// the caller must treat it as a configuration gap.
    pub fn step(&self, severity: Severity, level: u32) -> Option<PolicyStep> {
        self.table.get(&(severity, level)).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Parse the JSON wire format.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<PolicyEntry> =
            serde_json::from_str(json).context("parsing escalation policy JSON")?;
        let mut table = HashMap::with_capacity(entries.len());
        for entry in entries {
            let next = match &entry.next {
                NextValue::Level(l) => NextStep::Escalate(*l),
                NextValue::Keyword(k) if k == "CLOSE" => NextStep::Close,
                NextValue::Keyword(k) => {
                    anyhow::bail!(
                        "invalid next value '{}' for ({}, {})",
                        k,
                        entry.severity,
                        entry.level
                    );
                }
            };
            table.insert(
                (entry.severity, entry.level),
                PolicyStep {
                    next,
                    delay: Duration::from_secs(entry.delay_seconds),
                },
            );
        }
        Ok(Self { table })
    }

    /// Load a policy file, falling back to the built-in ladder when the
    /// path does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading policy file {}", path.display()))?;
        Self::from_json(&raw)
    }
}

impl Default for EscalationPolicy {
    /// Built-in ladder. Higher severity escalates faster and climbs
    /// further before closing.
    fn default() -> Self {
        const HOUR: u64 = 3600;
        let rungs: &[(Severity, u32, NextStep, u64)] = &[
            (Severity::Low, 1, NextStep::Escalate(2), 4 * HOUR),
            (Severity::Low, 2, NextStep::Escalate(3), 8 * HOUR),
            (Severity::Low, 3, NextStep::Close, 24 * HOUR),
            (Severity::Medium, 1, NextStep::Escalate(2), 2 * HOUR),
            (Severity::Medium, 2, NextStep::Escalate(3), 4 * HOUR),
            (Severity::Medium, 3, NextStep::Escalate(4), 8 * HOUR),
            (Severity::Medium, 4, NextStep::Close, 12 * HOUR),
            (Severity::High, 1, NextStep::Escalate(2), HOUR / 2),
            (Severity::High, 2, NextStep::Escalate(3), HOUR),
            (Severity::High, 3, NextStep::Escalate(4), 2 * HOUR),
            (Severity::High, 4, NextStep::Escalate(5), 4 * HOUR),
            (Severity::High, 5, NextStep::Close, 6 * HOUR),
        ];
        let table = rungs
            .iter()
            .map(|&(sev, level, next, secs)| {
                ((sev, level), PolicyStep { next, delay: Duration::from_secs(secs) })
            })
            .collect();
        Self { table }
    }
}
