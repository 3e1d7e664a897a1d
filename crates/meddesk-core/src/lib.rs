//! Meddesk Core Library
//!
//! Hospital front-desk and billing record-keeper: patient registration with
//! sequential identifier generation, bed allotment, a payment transaction
//! ledger, and consolidated discharge billing.
//!
//! # Architecture
//!
//! ```text
//! Registration ──► visits (append-only: UHID = YYMM + serial, regno per visit)
//!                        │
//!          latest-visit resolution (highest regno wins)
//!          ┌─────────────┼──────────────────┐
//!          ▼             ▼                  ▼
//!     Bed Allotment   Transaction      Discharge Billing
//!     (one ACTIVE     Ledger           (visit + bed + ACTIVE
//!      bed per UHID)  (IPD only)        payments → final bill)
//! ```
//!
//! # Core Principle
//!
//! **Visit rows are never mutated.** Editing a patient appends a new visit
//! with the next regno; beds, transactions, and bills always attach to the
//! visit with the highest regno. Cancellations flip a status column and
//! record who cancelled, so every ledger stays append-only for audit.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Visit, Transaction, BedAllocation, FinalBill)
//! - [`clock`]: IST wall clock behind a trait, pinnable in tests
//! - [`registrar`]: UHID/regno allocation and registration
//! - [`resolver`]: Latest-visit resolution for linked entities
//! - [`ledger`]: Payment transaction entry and cancellation
//! - [`billing`]: Discharge workup and final bill aggregation
//! - [`insights`]: Daily registration and discharge counts
//! - [`money`]: Two-decimal fixed-point rounding
//! - [`validate`]: Shared field validators

pub mod billing;
pub mod clock;
pub mod db;
pub mod insights;
pub mod ledger;
pub mod models;
pub mod money;
pub mod registrar;
pub mod resolver;
pub mod validate;

// Re-export commonly used types
pub use billing::{BillingAggregator, DischargeWorkup};
pub use clock::{Clock, FixedClock, IstClock};
pub use db::Database;
pub use insights::{DailyCounts, Insights};
pub use ledger::TransactionLedger;
pub use models::{
    Address, BedAllocation, BedRequest, BedStatus, BillRequest, ChargeLine, Discounts, FilteredVisit,
    FinalBill, NewPatient, PatientType, PatientUpdate, PaymentDetails, PaymentMode, RecordStatus,
    Transaction, TransactionLine, TransactionRequest, Visit, VisitFilter,
};
pub use registrar::Registrar;
pub use resolver::VisitResolver;

use std::path::Path;

use tracing::info;

use crate::db::{beds, DbError};

/// Crate-level error: every fallible desk operation returns this.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Db(#[from] DbError),
}

impl From<validate::ValidationError> for Error {
    fn from(e: validate::ValidationError) -> Self {
        Error::Validation(e.0)
    }
}

pub type DeskResult<T> = Result<T, Error>;

/// The front desk: one handle over the whole record-keeper.
///
/// Wraps the database and a wall clock and exposes every desk operation.
/// Production code uses [`FrontDesk::open`]; tests pin time with
/// [`FrontDesk::with_clock`] and a [`FixedClock`].
pub struct FrontDesk<C: Clock = IstClock> {
    db: Database,
    clock: C,
}

impl FrontDesk<IstClock> {
    /// Open or create the record store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> DeskResult<Self> {
        Ok(Self {
            db: Database::open(path)?,
            clock: IstClock,
        })
    }

    /// In-memory store, used by tests and demos.
    pub fn open_in_memory() -> DeskResult<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
            clock: IstClock,
        })
    }
}

impl<C: Clock> FrontDesk<C> {
    /// Wrap an already-open database with an explicit clock.
    pub fn with_clock(db: Database, clock: C) -> Self {
        Self { db, clock }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Give the database back, e.g. to reopen under a different clock.
    pub fn into_database(self) -> Database {
        self.db
    }

    // ---- registration ----

    /// Register a brand-new patient, allocating UHID and regno `001`.
    pub fn register_patient(&mut self, req: NewPatient) -> DeskResult<Visit> {
        Registrar::new(&mut self.db, &self.clock).register(req)
    }

    /// Append a new visit for a known UHID with the next regno.
    pub fn update_patient(&mut self, uhid: &str, req: PatientUpdate) -> DeskResult<Visit> {
        Registrar::new(&mut self.db, &self.clock).re_register(uhid, req)
    }

    /// Search by exact UHID or mobile number; every matching visit row.
    pub fn find_patients(&self, search: &str) -> DeskResult<Vec<Visit>> {
        let visits = self.db.find_visits(search)?;
        if visits.is_empty() {
            return Err(Error::NotFound(format!(
                "no patients found with UHID or mobile {search}"
            )));
        }
        Ok(visits)
    }

    /// The current visit for a UHID.
    pub fn latest_visit(&self, uhid: &str) -> DeskResult<Visit> {
        VisitResolver::new(&self.db).latest_visit(uhid)
    }

    // ---- transactions ----

    /// Record a payment against the latest (IPD) visit of a UHID.
    pub fn record_transaction(&mut self, req: TransactionRequest) -> DeskResult<Transaction> {
        TransactionLedger::new(&mut self.db, &self.clock).record(req)
    }

    /// Cancel a transaction by its unique number.
    pub fn cancel_transaction(
        &mut self,
        transaction_no: &str,
        cancelled_by: &str,
    ) -> DeskResult<Transaction> {
        TransactionLedger::new(&mut self.db, &self.clock).cancel(transaction_no, cancelled_by)
    }

    /// All transactions ever recorded for a UHID, newest first.
    pub fn transactions_for(&self, uhid: &str) -> DeskResult<Vec<Transaction>> {
        validate::uhid(uhid)?;
        let txns = self.db.transactions_for(uhid)?;
        if txns.is_empty() {
            return Err(Error::NotFound(format!(
                "no transactions found for UHID {uhid}"
            )));
        }
        Ok(txns)
    }

    // ---- beds ----

    /// Allot a bed to a UHID's current visit. At most one ACTIVE bed may
    /// exist per UHID; release it before allotting another.
    pub fn allot_bed(&mut self, req: BedRequest) -> DeskResult<BedAllocation> {
        let department = validate::required(&req.department, "department")?;
        let bed_number = validate::required(&req.bed_number, "bed number")?;

        let tx = self.db.write_transaction()?;
        let visit = resolver::resolve_latest(&tx, &req.uhid)?;
        if beds::active_bed(&tx, &visit.uhid)?.is_some() {
            return Err(Error::Conflict(format!(
                "an active bed already exists for UHID {}",
                visit.uhid
            )));
        }
        let mut bed = BedAllocation {
            bed_id: None,
            uhid: visit.uhid,
            patient_name: visit.full_name,
            department,
            bed_number,
            status: BedStatus::Active,
        };
        let id = beds::insert_bed(&tx, &bed)?;
        tx.commit().map_err(DbError::from)?;

        bed.bed_id = Some(id);
        info!(uhid = %bed.uhid, bed_number = %bed.bed_number, "allotted bed");
        Ok(bed)
    }

    /// Release the ACTIVE bed for a UHID.
    pub fn release_bed(&mut self, uhid: &str) -> DeskResult<()> {
        validate::uhid(uhid)?;
        let released = beds::mark_bed_released(self.db.conn(), uhid)?;
        if !released {
            return Err(Error::NotFound(format!(
                "no active bed found with UHID {uhid}"
            )));
        }
        info!(uhid, "released bed");
        Ok(())
    }

    /// The ACTIVE bed for a UHID alongside the latest visit.
    pub fn bed_for(&self, uhid: &str) -> DeskResult<(BedAllocation, Option<Visit>)> {
        VisitResolver::new(&self.db).bed_with_visit(uhid)
    }

    // ---- billing ----

    /// The discharge view for a UHID's current visit: demographics, ACTIVE
    /// bed, and ACTIVE payments, gathered for the desk before billing.
    pub fn discharge_workup(&self, uhid: &str) -> DeskResult<DischargeWorkup> {
        billing::workup(self.db.conn(), uhid)
    }

    /// Generate the final bill for a UHID's current visit.
    pub fn create_final_bill(&mut self, req: BillRequest) -> DeskResult<FinalBill> {
        BillingAggregator::new(&mut self.db, &self.clock).create_bill(req)
    }

    /// Cancel a final bill by its number.
    pub fn cancel_final_bill(
        &mut self,
        final_bill_no: &str,
        cancelled_by: &str,
    ) -> DeskResult<FinalBill> {
        BillingAggregator::new(&mut self.db, &self.clock).cancel_bill(final_bill_no, cancelled_by)
    }

    /// All bills for a UHID, newest first.
    pub fn bills_for(&self, uhid: &str) -> DeskResult<Vec<FinalBill>> {
        validate::uhid(uhid)?;
        let bills = self.db.bills_for(uhid)?;
        if bills.is_empty() {
            return Err(Error::NotFound(format!("no bills found for UHID {uhid}")));
        }
        Ok(bills)
    }

    // ---- insights ----

    /// Today's registration and discharge counts.
    pub fn counts_today(&self) -> DeskResult<DailyCounts> {
        Insights::new(&self.db, &self.clock).today()
    }

    /// Daily counts for the trailing `days` days, oldest first.
    pub fn counts_trailing(&self, days: u32) -> DeskResult<Vec<DailyCounts>> {
        Insights::new(&self.db, &self.clock).trailing(days)
    }

    /// Registrations matching a report filter, newest first, with each
    /// row's discharge stamp when a live bill exists.
    pub fn filter_patients(&self, filter: &VisitFilter) -> DeskResult<Vec<FilteredVisit>> {
        Insights::new(&self.db, &self.clock).filter(filter)
    }
}
