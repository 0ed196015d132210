//! Typed operations over the REST collections.

use fleetadmin_auth::PermissionCatalog;
use fleetadmin_core::{DriverId, PenaltyId, StaffId};

use crate::api::{ApiClient, ApiError};
use crate::types::{
    AuditPage, AuditQuery, DashboardStats, Driver, DriverUpdate, NewDriver, NewPenalty, NewStaff,
    Penalty, StaffMember, StaffUpdate,
};

/// One method per backend endpoint; all carry the bearer credential.
///
/// Record ids travel as single escaped path segments.
#[derive(Clone)]
pub struct Resources {
    api: ApiClient,
}

impl Resources {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.api.get(&["stats"]).await
    }

    pub async fn drivers(&self) -> Result<Vec<Driver>, ApiError> {
        self.api.get(&["drivers"]).await
    }

    pub async fn register_driver(&self, driver: &NewDriver) -> Result<(), ApiError> {
        self.api.post(&["drivers", "register"], driver).await
    }

    pub async fn approve_driver(&self, id: &DriverId) -> Result<(), ApiError> {
        self.api.patch(&["drivers", id.as_str(), "approve"]).await
    }

    pub async fn update_driver(&self, id: &DriverId, update: &DriverUpdate) -> Result<(), ApiError> {
        self.api.put(&["drivers", id.as_str()], update).await
    }

    pub async fn staff(&self) -> Result<Vec<StaffMember>, ApiError> {
        self.api.get(&["staff"]).await
    }

    pub async fn create_staff(&self, staff: &NewStaff) -> Result<(), ApiError> {
        self.api.post(&["staff"], staff).await
    }

    pub async fn update_staff(&self, id: &StaffId, update: &StaffUpdate) -> Result<(), ApiError> {
        self.api.put(&["staff", id.as_str()], update).await
    }

    pub async fn delete_staff(&self, id: &StaffId) -> Result<(), ApiError> {
        self.api.delete(&["staff", id.as_str()]).await
    }

    pub async fn permission_catalog(&self) -> Result<PermissionCatalog, ApiError> {
        self.api.get(&["permissions"]).await
    }

    pub async fn driver_penalties(&self, driver: &DriverId) -> Result<Vec<Penalty>, ApiError> {
        self.api.get(&["penalties", "driver", driver.as_str()]).await
    }

    pub async fn create_penalty(&self, penalty: &NewPenalty) -> Result<(), ApiError> {
        self.api.post(&["penalties"], penalty).await
    }

    pub async fn pay_penalty(&self, id: &PenaltyId) -> Result<(), ApiError> {
        self.api.patch(&["penalties", id.as_str(), "pay"]).await
    }

    pub async fn delete_penalty(&self, id: &PenaltyId) -> Result<(), ApiError> {
        self.api.delete(&["penalties", id.as_str()]).await
    }

    pub async fn audit_log(&self, query: &AuditQuery) -> Result<AuditPage, ApiError> {
        self.api.get_with_query(&["audit"], query).await
    }
}
