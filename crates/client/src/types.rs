//! Wire models for the REST backend.
//!
//! The backend owns these shapes. Records are document-store style and keyed
//! by `_id`; fields the console does not read are ignored and most fields
//! default when absent.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use fleetadmin_auth::{Permission, Role};
use fleetadmin_core::{DriverId, PenaltyId, StaffId};

/// `GET /stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_drivers: u64,
    pub active_staff: u64,
    pub pending_approvals: u64,
    /// Only sent to admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today_revenue: Option<f64>,
    /// Counters this console does not know about yet.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    #[serde(alias = "_id")]
    pub id: DriverId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub ghana_card: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "isApproved")]
    pub approved: bool,
    /// Embedded penalty documents or bare references; only counted here.
    #[serde(default)]
    pub penalties: Vec<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Driver {
    pub fn penalty_count(&self) -> usize {
        self.penalties.len()
    }
}

/// `POST /drivers/register`. The driver sets a password on first sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDriver {
    pub name: String,
    pub phone: String,
    pub ghana_card: String,
}

/// `PUT /drivers/:id`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghana_card: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    #[serde(alias = "_id")]
    pub id: StaffId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_staff_role")]
    pub role: Role,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

fn default_staff_role() -> Role {
    Role::Staff
}

/// `POST /staff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaff {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
    pub permissions: BTreeSet<Permission>,
}

/// `PUT /staff/:id`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<Permission>>,
}

/// How a penalty type is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyAmount {
    /// Flat amount in GHS.
    Fixed(u32),
    /// Share of a cost supplied when the penalty is recorded.
    PercentOfCost(u8),
}

/// An entry of the penalty-type catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyKind {
    pub name: &'static str,
    pub amount: PenaltyAmount,
}

impl PenaltyKind {
    /// Amount to charge. Percentage kinds need the underlying cost.
    pub fn amount_for(&self, cost: Option<f64>) -> Option<f64> {
        match self.amount {
            PenaltyAmount::Fixed(amount) => Some(f64::from(amount)),
            PenaltyAmount::PercentOfCost(pct) => cost
                .filter(|c| c.is_finite() && *c > 0.0)
                .map(|c| c * f64::from(pct) / 100.0),
        }
    }
}

/// Penalty types offered when recording a penalty.
pub const PENALTIES: &[PenaltyKind] = &[
    PenaltyKind { name: "Overspeeding", amount: PenaltyAmount::Fixed(50) },
    PenaltyKind { name: "Geofencing", amount: PenaltyAmount::Fixed(200) },
    PenaltyKind { name: "Late Payment", amount: PenaltyAmount::Fixed(50) },
    PenaltyKind { name: "Locking Car", amount: PenaltyAmount::Fixed(50) },
    PenaltyKind { name: "Car Sharing", amount: PenaltyAmount::Fixed(200) },
    PenaltyKind { name: "Number of Trips", amount: PenaltyAmount::Fixed(100) },
    PenaltyKind { name: "Photocheck", amount: PenaltyAmount::Fixed(100) },
    PenaltyKind { name: "Self Repair", amount: PenaltyAmount::Fixed(100) },
    PenaltyKind { name: "Servicing Show Up Failure", amount: PenaltyAmount::Fixed(50) },
    PenaltyKind { name: "Inspection Show Up Failure", amount: PenaltyAmount::Fixed(100) },
    PenaltyKind { name: "Recovery (Based on Location)", amount: PenaltyAmount::Fixed(150) },
    PenaltyKind { name: "Accident (20% of total cost)", amount: PenaltyAmount::PercentOfCost(20) },
];

/// Look up a catalog entry by its exact name.
pub fn penalty_kind(name: &str) -> Option<&'static PenaltyKind> {
    PENALTIES.iter().find(|k| k.name == name)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Penalty {
    #[serde(alias = "_id")]
    pub id: PenaltyId,
    #[serde(alias = "driver")]
    pub driver_id: DriverId,
    #[serde(default, rename = "type")]
    pub penalty_type: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, alias = "isPaid")]
    pub paid: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `POST /penalties`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPenalty {
    pub driver_id: DriverId,
    #[serde(rename = "type")]
    pub penalty_type: String,
    pub amount: f64,
    pub reason: String,
}

/// Who performed an audited action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditActor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default, rename = "performedByDetails")]
    pub performed_by: Option<AuditActor>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default, alias = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuditEntry {
    pub fn performer(&self) -> Option<&str> {
        self.performed_by.as_ref().and_then(|a| a.name.as_deref())
    }
}

/// Filters for `GET /audit`. Pages count from 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl AuditQuery {
    pub const DEFAULT_LIMIT: u32 = 20;

    /// First page with the default page size.
    pub fn first_page() -> Self {
        Self {
            page: Some(1),
            limit: Some(Self::DEFAULT_LIMIT),
            ..Self::default()
        }
    }
}

/// One page of audit entries plus the total across all pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "AuditResponse")]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    pub total: u64,
}

impl AuditPage {
    /// Entries whose performer name contains `query`, ignoring case.
    pub fn by_performer(&self, query: &str) -> Vec<AuditEntry> {
        let query = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                query.is_empty()
                    || e.performer()
                        .is_some_and(|name| name.to_lowercase().contains(&query))
            })
            .cloned()
            .collect()
    }
}

/// The backend answers `{logs, total}`, `{data, total}` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum AuditResponse {
    Wrapped {
        #[serde(alias = "data")]
        logs: Vec<AuditEntry>,
        #[serde(default)]
        total: Option<u64>,
    },
    Bare(Vec<AuditEntry>),
}

impl From<AuditResponse> for AuditPage {
    fn from(value: AuditResponse) -> Self {
        let (entries, total) = match value {
            AuditResponse::Wrapped { logs, total } => (logs, total),
            AuditResponse::Bare(entries) => (entries, None),
        };
        let total = total.unwrap_or(entries.len() as u64);
        Self { entries, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_reads_document_ids_and_ghana_card() {
        let drivers: Vec<Driver> = serde_json::from_str(
            r#"[{"_id":"65f0a1","name":"Kofi","phone":"0241234567","ghanaCard":"GHA-123456789-0","isApproved":false}]"#,
        )
        .unwrap();
        let d = &drivers[0];
        assert_eq!(d.id.as_str(), "65f0a1");
        assert_eq!(d.phone.as_deref(), Some("0241234567"));
        assert_eq!(d.ghana_card.as_deref(), Some("GHA-123456789-0"));
        assert!(!d.approved);
        assert_eq!(d.penalty_count(), 0);

        let with_penalties: Driver =
            serde_json::from_str(r#"{"_id":"7","penalties":["p1",{"_id":"p2"}]}"#).unwrap();
        assert_eq!(with_penalties.penalty_count(), 2);
    }

    #[test]
    fn staff_and_penalties_read_document_ids() {
        let s: StaffMember = serde_json::from_str(
            r#"{"_id":"s9","name":"Ama","email":"ama@fleet.test","role":"admin","permissions":[]}"#,
        )
        .unwrap();
        assert_eq!(s.id.as_str(), "s9");
        assert_eq!(s.role, Role::Admin);

        let p: Penalty = serde_json::from_str(
            r#"{"_id":"p1","driver":"65f0a1","type":"Geofencing","amount":200,"isPaid":true}"#,
        )
        .unwrap();
        assert_eq!(p.driver_id.as_str(), "65f0a1");
        assert_eq!(p.penalty_type.as_deref(), Some("Geofencing"));
        assert!(p.paid);
    }

    #[test]
    fn stats_read_dashboard_counters() {
        let s: DashboardStats = serde_json::from_str(
            r#"{"totalDrivers":4,"activeStaff":2,"pendingApprovals":1,"todayRevenue":350.5,"activeVehicles":3}"#,
        )
        .unwrap();
        assert_eq!(s.total_drivers, 4);
        assert_eq!(s.active_staff, 2);
        assert_eq!(s.pending_approvals, 1);
        assert_eq!(s.today_revenue, Some(350.5));
        assert_eq!(s.other.get("activeVehicles"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn audit_page_accepts_every_envelope() {
        let wrapped: AuditPage = serde_json::from_str(
            r#"{"logs":[{"_id":"a1","action":"driver.approved","performedByDetails":{"name":"Pat"}}],"total":41}"#,
        )
        .unwrap();
        assert_eq!(wrapped.entries.len(), 1);
        assert_eq!(wrapped.total, 41);
        assert_eq!(wrapped.entries[0].performer(), Some("Pat"));

        let data: AuditPage =
            serde_json::from_str(r#"{"data":[{"action":"a"},{"action":"b"}]}"#).unwrap();
        assert_eq!(data.total, 2);

        let bare: AuditPage = serde_json::from_str(r#"[{"action":"a"}]"#).unwrap();
        assert_eq!(bare.total, 1);
    }

    #[test]
    fn audit_query_uses_backend_parameter_names() {
        let query = AuditQuery {
            action: Some("login".into()),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..AuditQuery::first_page()
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({
                "action": "login",
                "startDate": "2026-03-01",
                "page": 1,
                "limit": 20,
            })
        );
    }

    #[test]
    fn penalty_catalog_prices_kinds() {
        let speeding = penalty_kind("Overspeeding").unwrap();
        assert_eq!(speeding.amount_for(None), Some(50.0));

        let accident = penalty_kind("Accident (20% of total cost)").unwrap();
        assert_eq!(accident.amount_for(None), None);
        assert_eq!(accident.amount_for(Some(1000.0)), Some(200.0));

        assert!(penalty_kind("overspeeding").is_none());
    }

    #[test]
    fn new_penalty_posts_type_field() {
        let body = serde_json::to_value(NewPenalty {
            driver_id: DriverId::new("65f0a1"),
            penalty_type: "Geofencing".into(),
            amount: 200.0,
            reason: "Left zone".into(),
        })
        .unwrap();
        assert_eq!(body["type"], "Geofencing");
        assert_eq!(body["driverId"], "65f0a1");
    }

    #[test]
    fn updates_omit_absent_fields() {
        let body = serde_json::to_value(StaffUpdate {
            name: Some("Lee".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "name": "Lee" }));
    }
}
