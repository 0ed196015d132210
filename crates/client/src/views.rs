//! View controllers: one per screen, each owning its fetch scope.
//!
//! A view fetches when opened and cancels whatever is in flight when it is
//! dropped. Failures are reported once through the notifier (or expire the
//! session on 401) and leave the displayed data as it was. Nothing retries.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use fleetadmin_auth::PermissionCatalog;
use fleetadmin_core::{DriverId, PenaltyId, StaffId};

use crate::api::ApiError;
use crate::notify::{Notification, Notifier};
use crate::resources::Resources;
use crate::scope::{FetchOutcome, ScopedSlot};
use crate::session::SessionProvider;
use crate::types::{
    AuditEntry, AuditPage, AuditQuery, DashboardStats, Driver, DriverUpdate, NewDriver, NewPenalty,
    NewStaff, Penalty, PenaltyKind, StaffMember, StaffUpdate,
};

/// Dependencies injected into every view.
#[derive(Clone)]
pub struct ViewContext {
    pub resources: Resources,
    pub session: Arc<SessionProvider>,
    pub notifier: Arc<dyn Notifier>,
}

impl ViewContext {
    pub fn new(
        resources: Resources,
        session: Arc<SessionProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resources,
            session,
            notifier,
        }
    }

    /// Route a failure: auth failures downgrade the session, the rest notify.
    pub fn report(&self, err: &ApiError, fallback: &str) {
        if err.is_auth_failure() {
            self.session.expire();
            return;
        }
        tracing::warn!(error = %err, "request failed");
        self.notifier
            .notify(Notification::error(err.user_message(fallback)));
    }

    fn load_into<T, F>(&self, slot: &ScopedSlot<T>, fetch: F, fallback: &'static str) -> JoinHandle<FetchOutcome>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let ctx = self.clone();
        slot.load(fetch, move |e| ctx.report(&e, fallback))
    }

    /// Run a mutation; `true` on success.
    async fn mutate<F>(&self, op: F, success: &str, fallback: &str) -> bool
    where
        F: Future<Output = Result<(), ApiError>>,
    {
        match op.await {
            Ok(()) => {
                self.notifier.notify(Notification::success(success));
                true
            }
            Err(e) => {
                self.report(&e, fallback);
                false
            }
        }
    }
}

pub struct DashboardView {
    ctx: ViewContext,
    stats: ScopedSlot<DashboardStats>,
}

impl DashboardView {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            stats: ScopedSlot::new(),
        }
    }

    pub fn open(&self) -> JoinHandle<FetchOutcome> {
        let resources = self.ctx.resources.clone();
        self.ctx.load_into(
            &self.stats,
            async move { resources.stats().await },
            "Failed to load statistics",
        )
    }

    pub fn stats(&self) -> Option<DashboardStats> {
        self.stats.get()
    }
}

impl Drop for DashboardView {
    fn drop(&mut self) {
        self.stats.cancel();
    }
}

pub struct DriversView {
    ctx: ViewContext,
    drivers: ScopedSlot<Vec<Driver>>,
}

impl DriversView {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            drivers: ScopedSlot::new(),
        }
    }

    pub fn open(&self) -> JoinHandle<FetchOutcome> {
        let resources = self.ctx.resources.clone();
        self.ctx.load_into(
            &self.drivers,
            async move { resources.drivers().await },
            "Failed to load drivers",
        )
    }

    pub fn drivers(&self) -> Vec<Driver> {
        self.drivers.get().unwrap_or_default()
    }

    pub fn pending(&self) -> Vec<Driver> {
        self.drivers
            .with(|d| d.map(|d| d.iter().filter(|d| !d.approved).cloned().collect::<Vec<_>>()))
            .unwrap_or_default()
    }

    pub async fn approve(&self, id: &DriverId) -> bool {
        let ok = self
            .ctx
            .mutate(self.ctx.resources.approve_driver(id), "Driver approved", "Failed to approve driver")
            .await;
        if ok {
            self.open();
        }
        ok
    }

    pub async fn register(&self, driver: &NewDriver) -> bool {
        let ok = self
            .ctx
            .mutate(self.ctx.resources.register_driver(driver), "Driver registered", "Failed to register driver")
            .await;
        if ok {
            self.open();
        }
        ok
    }

    pub async fn update(&self, id: &DriverId, update: &DriverUpdate) -> bool {
        let ok = self
            .ctx
            .mutate(self.ctx.resources.update_driver(id, update), "Driver updated", "Failed to update driver")
            .await;
        if ok {
            self.open();
        }
        ok
    }
}

impl Drop for DriversView {
    fn drop(&mut self) {
        self.drivers.cancel();
    }
}

pub struct StaffView {
    ctx: ViewContext,
    staff: ScopedSlot<Vec<StaffMember>>,
    catalog: ScopedSlot<PermissionCatalog>,
}

impl StaffView {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            staff: ScopedSlot::new(),
            catalog: ScopedSlot::new(),
        }
    }

    /// Load the staff list and the permission labels side by side.
    pub fn open(&self) -> (JoinHandle<FetchOutcome>, JoinHandle<FetchOutcome>) {
        (self.refresh(), self.load_catalog())
    }

    fn refresh(&self) -> JoinHandle<FetchOutcome> {
        let resources = self.ctx.resources.clone();
        self.ctx.load_into(
            &self.staff,
            async move { resources.staff().await },
            "Failed to load staff",
        )
    }

    fn load_catalog(&self) -> JoinHandle<FetchOutcome> {
        let resources = self.ctx.resources.clone();
        self.ctx.load_into(
            &self.catalog,
            async move { resources.permission_catalog().await },
            "Failed to load permissions",
        )
    }

    pub fn staff(&self) -> Vec<StaffMember> {
        self.staff.get().unwrap_or_default()
    }

    pub fn catalog(&self) -> PermissionCatalog {
        self.catalog.get().unwrap_or_default()
    }

    pub async fn create(&self, staff: &NewStaff) -> bool {
        let ok = self
            .ctx
            .mutate(self.ctx.resources.create_staff(staff), "Staff member created", "Failed to create staff member")
            .await;
        if ok {
            self.refresh();
        }
        ok
    }

    pub async fn update(&self, id: &StaffId, update: &StaffUpdate) -> bool {
        let ok = self
            .ctx
            .mutate(self.ctx.resources.update_staff(id, update), "Staff member updated", "Failed to update staff member")
            .await;
        if ok {
            self.refresh();
        }
        ok
    }

    pub async fn delete(&self, id: &StaffId) -> bool {
        let ok = self
            .ctx
            .mutate(self.ctx.resources.delete_staff(id), "Staff member deleted", "Failed to delete staff member")
            .await;
        if ok {
            self.refresh();
        }
        ok
    }
}

impl Drop for StaffView {
    fn drop(&mut self) {
        self.staff.cancel();
        self.catalog.cancel();
    }
}

/// Penalties of one selected driver.
///
/// Switching drivers cancels the previous driver's fetch, so a slow reply for
/// an earlier selection never replaces the current one.
pub struct DriverPenaltiesView {
    ctx: ViewContext,
    driver: Mutex<Option<DriverId>>,
    penalties: ScopedSlot<Vec<Penalty>>,
}

impl DriverPenaltiesView {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            driver: Mutex::new(None),
            penalties: ScopedSlot::new(),
        }
    }

    pub fn driver(&self) -> Option<DriverId> {
        self.driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch to `driver` and fetch its penalties.
    pub fn select_driver(&self, driver: DriverId) -> JoinHandle<FetchOutcome> {
        self.penalties.cancel();
        self.penalties.set(None);
        *self.driver.lock().unwrap_or_else(PoisonError::into_inner) = Some(driver.clone());
        self.fetch(driver)
    }

    /// Re-fetch for the current driver, if one is selected.
    pub fn refresh(&self) -> Option<JoinHandle<FetchOutcome>> {
        self.driver().map(|driver| self.fetch(driver))
    }

    fn fetch(&self, driver: DriverId) -> JoinHandle<FetchOutcome> {
        let resources = self.ctx.resources.clone();
        self.ctx.load_into(
            &self.penalties,
            async move { resources.driver_penalties(&driver).await },
            "Failed to load penalties",
        )
    }

    pub fn penalties(&self) -> Vec<Penalty> {
        self.penalties.get().unwrap_or_default()
    }

    pub fn outstanding_amount(&self) -> f64 {
        self.penalties
            .with(|p| p.map(|p| p.iter().filter(|p| !p.paid).map(|p| p.amount).sum::<f64>()))
            .unwrap_or(0.0)
    }

    /// Record a penalty of catalog type `kind` against the selected driver.
    ///
    /// `cost` is required for kinds priced as a share of a cost.
    pub async fn add(&self, kind: &PenaltyKind, reason: &str, cost: Option<f64>) -> bool {
        let Some(driver_id) = self.driver() else {
            self.ctx.notifier.notify(Notification::error("Select a driver first"));
            return false;
        };
        let Some(amount) = kind.amount_for(cost) else {
            self.ctx
                .notifier
                .notify(Notification::error("Enter the total cost for this penalty"));
            return false;
        };
        let penalty = NewPenalty {
            driver_id,
            penalty_type: kind.name.to_string(),
            amount,
            reason: reason.trim().to_string(),
        };
        let ok = self
            .ctx
            .mutate(self.ctx.resources.create_penalty(&penalty), "Penalty recorded", "Failed to record penalty")
            .await;
        if ok {
            self.refresh();
        }
        ok
    }

    pub async fn pay(&self, id: &PenaltyId) -> bool {
        let ok = self
            .ctx
            .mutate(self.ctx.resources.pay_penalty(id), "Penalty marked as paid", "Failed to update penalty")
            .await;
        if ok {
            self.refresh();
        }
        ok
    }

    pub async fn delete(&self, id: &PenaltyId) -> bool {
        let ok = self
            .ctx
            .mutate(self.ctx.resources.delete_penalty(id), "Penalty deleted", "Failed to delete penalty")
            .await;
        if ok {
            self.refresh();
        }
        ok
    }
}

impl Drop for DriverPenaltiesView {
    fn drop(&mut self) {
        self.penalties.cancel();
    }
}

pub struct AuditLogView {
    ctx: ViewContext,
    page: ScopedSlot<AuditPage>,
}

impl AuditLogView {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            page: ScopedSlot::new(),
        }
    }

    /// Fetch entries matching `query`; a newer search supersedes an older one.
    pub fn search(&self, query: AuditQuery) -> JoinHandle<FetchOutcome> {
        let resources = self.ctx.resources.clone();
        self.ctx.load_into(
            &self.page,
            async move { resources.audit_log(&query).await },
            "Failed to load audit log",
        )
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.page
            .with(|p| p.map(|p| p.entries.clone()))
            .unwrap_or_default()
    }

    /// Matching entries across all pages, as reported by the backend.
    pub fn total(&self) -> u64 {
        self.page.with(|p| p.map(|p| p.total)).unwrap_or(0)
    }

    /// Loaded entries narrowed to performers whose name contains `query`.
    pub fn by_performer(&self, query: &str) -> Vec<AuditEntry> {
        self.page
            .with(|p| p.map(|p| p.by_performer(query)))
            .unwrap_or_default()
    }
}

impl Drop for AuditLogView {
    fn drop(&mut self) {
        self.page.cancel();
    }
}
