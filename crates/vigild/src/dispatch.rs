//! Dispatch matcher.
//!
//! Surfaces active complaints to an officer, tiered by severity: each tier
//! has its own radius (high severity deliberately casts the widest net)
//! and all tiers share the 2-hour creation lookback. Complaints the
//! officer already declined (per their ephemeral rejection index) are
//! filtered out. Tiers are returned independently, newest first - no
//! cross-tier merge.

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use vigil_common::config::DispatchConfig;
use vigil_common::{Complaint, GeoPoint, Severity};

use crate::enrichment::CategoryLookup;
use crate::ephemeral::EphemeralStore;
use crate::rejection::rejection_key;
use crate::store::ComplaintStore;

/// A matched complaint with its optional category enrichment. Enrichment
/// failures degrade to `category_data: None`, never drop the match.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchedComplaint {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub category_data: Option<Value>,
}

/// Per-tier results of a nearby query.
#[derive(Debug, Default, Serialize)]
pub struct NearbyComplaints {
    pub low: Vec<DispatchedComplaint>,
    pub medium: Vec<DispatchedComplaint>,
    pub high: Vec<DispatchedComplaint>,
}

pub struct DispatchMatcher {
    complaints: Arc<dyn ComplaintStore>,
    ephemeral: Arc<dyn EphemeralStore>,
    lookup: Arc<dyn CategoryLookup>,
    config: DispatchConfig,
}

impl DispatchMatcher {
    pub fn new(
        complaints: Arc<dyn ComplaintStore>,
        ephemeral: Arc<dyn EphemeralStore>,
        lookup: Arc<dyn CategoryLookup>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            complaints,
            ephemeral,
            lookup,
            config,
        }
    }

    /// Active, non-stale, non-rejected complaints near the officer, one
    /// list per severity tier.
    pub fn find_nearby(&self, officer_id: &str, lat: f64, lon: f64) -> NearbyComplaints {
        // Exclusion set is a cache: if the read fails, dispatch proceeds
        // unfiltered rather than failing the query
        let excluded: HashSet<String> = match self.ephemeral.smembers(&rejection_key(officer_id)) {
            Ok(members) => members,
            Err(e) => {
                warn!("rejection index read failed for {officer_id}: {e}");
                HashSet::new()
            }
        };

        let origin = GeoPoint::new(lat, lon);
        let lookback = ChronoDuration::from_std(self.config.lookback())
            .unwrap_or_else(|_| ChronoDuration::hours(2));
        let cutoff = Utc::now() - lookback;
        let pool = self.complaints.all();

        let mut results = NearbyComplaints::default();
        for severity in [Severity::Low, Severity::Medium, Severity::High] {
            let radius_km = self.config.radius_km(severity);
            let mut tier: Vec<&Complaint> = pool
                .iter()
                .filter(|c| {
                    c.active
                        && c.severity == severity
                        && c.created_at >= cutoff
                        && c.location.distance_km(&origin) <= radius_km
                        && !excluded.contains(&c.id.to_string())
                })
                .collect();
            tier.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let enriched = tier.into_iter().map(|c| self.enrich(c)).collect();
            match severity {
                Severity::Low => results.low = enriched,
                Severity::Medium => results.medium = enriched,
                Severity::High => results.high = enriched,
            }
        }
        results
    }

    fn enrich(&self, complaint: &Complaint) -> DispatchedComplaint {
        let category_data = match &complaint.category_data_id {
            Some(data_id) => match self.lookup.lookup(data_id) {
                Ok(data) => data,
                Err(e) => {
                    warn!("enrichment failed for complaint {}: {e}", complaint.id);
                    None
                }
            },
            None => None,
        };
        DispatchedComplaint {
            complaint: complaint.clone(),
            category_data,
        }
    }
}
