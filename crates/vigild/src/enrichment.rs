//! Category enrichment seam.
//!
//! Some complaint categories carry a pointer to auxiliary data held by an
//! external collaborator (e.g. a transit-route record). Enrichment is pure
//! decoration: a failed or empty lookup degrades to the bare complaint and
//! is never allowed to fail the caller's operation.

use serde_json::Value;
use std::collections::HashMap;

use vigil_common::error::Result;
use vigil_common::Complaint;

pub trait CategoryLookup: Send + Sync {
    fn lookup(&self, category_data_id: &str) -> Result<Option<Value>>;
}

/// Fixed-table lookup used by the daemon until a real collaborator is
/// wired in, and by tests.
#[derive(Default)]
pub struct StaticLookup {
    entries: HashMap<String, Value>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, id: &str, value: Value) -> Self {
        self.entries.insert(id.to_string(), value);
        self
    }
}

impl CategoryLookup for StaticLookup {
    fn lookup(&self, category_data_id: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(category_data_id).cloned())
    }
}

/// Complaint serialized for the wire, with the optional enrichment
/// attached under `category_data`.
pub fn enriched_payload(complaint: &Complaint, lookup: &dyn CategoryLookup) -> Value {
    let mut payload = match serde_json::to_value(complaint) {
        Ok(v) => v,
        Err(_) => return Value::Null,
    };
    if let Some(data_id) = &complaint.category_data_id {
        match lookup.lookup(data_id) {
            Ok(Some(data)) => {
                payload["category_data"] = data;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("enrichment lookup failed for {data_id}: {e}");
            }
        }
    }
    payload
}
