//! Linked-entity resolution.
//!
//! Downstream records (beds, transactions, bills) always attach to the
//! *current* visit of a UHID: the row with the numerically maximal regno.

use rusqlite::Connection;

use crate::db::{beds, visits, Database};
use crate::models::{BedAllocation, Visit};
use crate::{validate, DeskResult, Error};

/// Resolve the current visit for a UHID, failing with NotFound when the
/// UHID has no visits.
pub(crate) fn resolve_latest(conn: &Connection, uhid: &str) -> DeskResult<Visit> {
    validate::uhid(uhid)?;
    visits::latest_visit(conn, uhid)?
        .ok_or_else(|| Error::NotFound(format!("no patient found with UHID {uhid}")))
}

/// Resolve the current visit and require it to be an IPD admission.
/// Transaction entry is an inpatient operation; OPD/DAYCARE visits go
/// straight to bill generation.
pub(crate) fn resolve_latest_ipd(conn: &Connection, uhid: &str) -> DeskResult<Visit> {
    let visit = resolve_latest(conn, uhid)?;
    if !visit.is_ipd() {
        return Err(Error::Validation(format!(
            "patient {uhid} is {}; transaction entry requires an IPD visit",
            visit.patient_type.as_str()
        )));
    }
    Ok(visit)
}

/// Read-side resolver over the visit store.
pub struct VisitResolver<'a> {
    db: &'a Database,
}

impl<'a> VisitResolver<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// The current visit for a UHID.
    pub fn latest_visit(&self, uhid: &str) -> DeskResult<Visit> {
        resolve_latest(self.db.conn(), uhid)
    }

    /// The current visit, required to be IPD.
    pub fn latest_ipd_visit(&self, uhid: &str) -> DeskResult<Visit> {
        resolve_latest_ipd(self.db.conn(), uhid)
    }

    /// The ACTIVE bed for a UHID together with the latest visit. Bed and
    /// department are only meaningful through the UHID's current visit.
    pub fn bed_with_visit(&self, uhid: &str) -> DeskResult<(BedAllocation, Option<Visit>)> {
        validate::uhid(uhid)?;
        let bed = beds::active_bed(self.db.conn(), uhid)?
            .ok_or_else(|| Error::NotFound(format!("no bed found with UHID {uhid}")))?;
        let visit = self.db.latest_visit(uhid)?;
        Ok((bed, visit))
    }
}
