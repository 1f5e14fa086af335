//! Complaint record - the persisted entity the engine revolves around.
//!
//! Owns status/level/severity/active/assignment/rejection fields. The
//! document store holding these has last-write-wins semantics; all
//! coordination is advisory via `status`/`active` re-checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Coarse urgency classification. Fixes both the escalation timing
/// (policy ladder) and the dispatch radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Complaint lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    /// Waiting for an officer; eligible for dispatch while `active`
    Pending,
    /// Claimed by an officer, being worked
    InProgress,
    /// Closed successfully by the assigned officer
    Resolved,
    /// Closed without resolution (threshold rejections or exhausted ladder)
    Rejected,
}

impl ComplaintStatus {
    /// Terminal statuses admit no further escalation timer.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Rejected)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplaintStatus::Pending => write!(f, "pending"),
            ComplaintStatus::InProgress => write!(f, "in_progress"),
            ComplaintStatus::Resolved => write!(f, "resolved"),
            ComplaintStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another point, in kilometers (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// One durable rejection event. Permanent audit data, unlike the ephemeral
/// per-officer rejection index used as a dispatch filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub officer_id: String,
    pub reason: String,
    pub rejected_at: DateTime<Utc>,
}

/// Intake payload for filing a new complaint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComplaint {
    pub reporter_id: String,
    pub category: String,
    /// Key into the category-enrichment collaborator, when the category
    /// carries auxiliary data (e.g. a transit route)
    pub category_data_id: Option<String>,
    pub description: String,
    pub severity: Severity,
    pub location: GeoPoint,
}

/// The persisted complaint record.
///
/// Invariants:
/// - `active == true` implies `status == Pending` and `assigned_officer == None`
/// - `level` equals the `to_level` of the latest escalation history entry
/// - once terminal, no escalation timer may remain armed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub reporter_id: String,
    pub category: String,
    pub category_data_id: Option<String>,
    pub description: String,
    pub severity: Severity,
    pub level: u32,
    pub status: ComplaintStatus,
    pub active: bool,
    pub assigned_officer: Option<String>,
    pub rejections: Vec<Rejection>,
    pub location: GeoPoint,
    pub created_at: DateTime<Utc>,
    /// Back-pointer to the escalation record, set lazily on first schedule
    pub escalation_id: Option<Uuid>,
}

impl Complaint {
    /// Create a fresh pending complaint at level 1 from an intake payload.
    pub fn from_intake(new: NewComplaint) -> Self {
        Self {
            id: Uuid::new_v4(),
            reporter_id: new.reporter_id,
            category: new.category,
            category_data_id: new.category_data_id,
            description: new.description,
            severity: new.severity,
            level: 1,
            status: ComplaintStatus::Pending,
            active: true,
            assigned_officer: None,
            rejections: Vec::new(),
            location: new.location,
            created_at: Utc::now(),
            escalation_id: None,
        }
    }

    /// Count of distinct officer ids across all durable rejections.
    /// The threshold rule counts distinct rejecters, not rejection events.
    pub fn distinct_rejecters(&self) -> usize {
        let mut seen: Vec<&str> = Vec::with_capacity(self.rejections.len());
        for r in &self.rejections {
            if !seen.contains(&r.officer_id.as_str()) {
                seen.push(&r.officer_id);
            }
        }
        seen.len()
    }

    /// Whether this officer already appears in the durable rejection list.
    pub fn rejected_by(&self, officer_id: &str) -> bool {
        self.rejections.iter().any(|r| r.officer_id == officer_id)
    }
}
