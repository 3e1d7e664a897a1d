//! Patient registration and identifier generation.
//!
//! UHIDs are `YYMM` plus a 4-digit serial that restarts at `0001` every
//! calendar month; regnos count visits under one UHID from `001`. Both are
//! fixed-width zero-padded strings, so lexicographic order equals numeric
//! order and the max-scans below stay index-friendly.
//!
//! Every allocation runs inside an immediate write transaction: the read
//! of the current maximum and the insert of the new row commit atomically,
//! so two concurrent registrations can never mint the same identifier.

use rusqlite::Connection;
use tracing::info;

use crate::clock::Clock;
use crate::db::{visits, Database, DbError};
use crate::models::{Address, NewPatient, PatientUpdate, Visit};
use crate::money::round2;
use crate::{validate, DeskResult, Error};

/// First regno issued under a fresh UHID.
pub const FIRST_REGNO: &str = "001";

/// Highest serial a month can hold before the UHID space is exhausted.
const MAX_MONTHLY_SERIAL: u32 = 9999;

/// Highest visit count a UHID can hold.
const MAX_REGNO: u32 = 999;

/// Registration front: allocates identifiers and appends visit rows.
pub struct Registrar<'a, C: Clock> {
    db: &'a mut Database,
    clock: &'a C,
}

impl<'a, C: Clock> Registrar<'a, C> {
    pub fn new(db: &'a mut Database, clock: &'a C) -> Self {
        Self { db, clock }
    }

    /// Register a brand-new patient. Allocates the next UHID for the
    /// current month and issues the first regno.
    pub fn register(&mut self, req: NewPatient) -> DeskResult<Visit> {
        let mut visit = self.visit_from_new(req)?;
        let prefix = self.clock.uhid_prefix();

        let tx = self.db.write_transaction()?;
        visit.uhid = next_uhid(&tx, &prefix)?;
        visit.regno = FIRST_REGNO.to_string();
        let id = visits::insert_visit(&tx, &visit)?;
        tx.commit().map_err(DbError::from)?;

        visit.id = Some(id);
        info!(uhid = %visit.uhid, regno = %visit.regno, "registered new patient");
        Ok(visit)
    }

    /// Re-register a known patient: appends a new visit under the same
    /// UHID with the next regno. Absent fields carry over from the
    /// latest visit's snapshot; the original row is never touched.
    pub fn re_register(&mut self, uhid: &str, req: PatientUpdate) -> DeskResult<Visit> {
        validate::uhid(uhid)?;

        let clock = self.clock;
        let tx = self.db.write_transaction()?;
        let latest = visits::latest_visit(&tx, uhid)?
            .ok_or_else(|| Error::NotFound(format!("no patient found with UHID {uhid}")))?;
        let regno = next_regno(&latest)?;
        let mut visit = Self::merge(clock, latest, req, regno)?;
        let id = visits::insert_visit(&tx, &visit)?;
        tx.commit().map_err(DbError::from)?;

        visit.id = Some(id);
        info!(uhid = %visit.uhid, regno = %visit.regno, "re-registered patient");
        Ok(visit)
    }

    fn visit_from_new(&self, req: NewPatient) -> DeskResult<Visit> {
        let date_of_reg = match req.date_of_reg.as_deref() {
            Some(v) => validate::date_ymd(v, "registration date")?,
            None => self.clock.date_string(),
        };
        let time_of_reg = match req.time_of_reg.as_deref() {
            Some(v) => validate::time_of_day(v, "registration time")?,
            None => self.clock.time_string(),
        };

        Ok(Visit {
            id: None,
            uhid: String::new(),
            regno: String::new(),
            aadhaar_no: validate::aadhaar(req.aadhaar_no.as_deref())?,
            title: req.title,
            full_name: validate::required(&req.full_name, "patient name")?,
            sex: req.sex,
            mobile: validate::mobile(req.mobile.as_deref())?,
            date_of_reg,
            time_of_reg,
            age: validate::age(req.age)?,
            patient_type: req.patient_type,
            empanelment: req.empanelment,
            religion: validate::required(&req.religion, "religion")?,
            marital_status: validate::required(&req.marital_status, "marital status")?,
            father_husband: validate::required(&req.father_husband, "father/husband name")?,
            doctors_in_charge: req.doctors_in_charge,
            reg_amount: round2(validate::amount(req.reg_amount, "registration amount")?),
            local_address: checked_address(req.local_address)?,
            permanent_address: checked_address(req.permanent_address)?,
            registered_by: validate::required(&req.registered_by, "registered_by")?,
        })
    }

    fn merge(clock: &C, latest: Visit, req: PatientUpdate, regno: String) -> DeskResult<Visit> {
        let date_of_reg = match req.date_of_reg.as_deref() {
            Some(v) => validate::date_ymd(v, "registration date")?,
            None => clock.date_string(),
        };
        let time_of_reg = match req.time_of_reg.as_deref() {
            Some(v) => validate::time_of_day(v, "registration time")?,
            None => clock.time_string(),
        };
        let reg_amount = match req.reg_amount {
            Some(v) => round2(validate::amount(v, "registration amount")?),
            None => latest.reg_amount,
        };

        Ok(Visit {
            id: None,
            uhid: latest.uhid,
            regno,
            aadhaar_no: match req.aadhaar_no.as_deref() {
                Some(v) => validate::aadhaar(Some(v))?,
                None => latest.aadhaar_no,
            },
            title: req.title.or(latest.title),
            full_name: match req.full_name.as_deref() {
                Some(v) => validate::required(v, "patient name")?,
                None => latest.full_name,
            },
            sex: req.sex.or(latest.sex),
            mobile: match req.mobile.as_deref() {
                Some(v) => validate::mobile(Some(v))?,
                None => latest.mobile,
            },
            date_of_reg,
            time_of_reg,
            age: match req.age {
                Some(v) => validate::age(Some(v))?,
                None => latest.age,
            },
            patient_type: req.patient_type.unwrap_or(latest.patient_type),
            empanelment: req.empanelment.or(latest.empanelment),
            religion: req.religion.unwrap_or(latest.religion),
            marital_status: req.marital_status.unwrap_or(latest.marital_status),
            father_husband: req.father_husband.unwrap_or(latest.father_husband),
            doctors_in_charge: req.doctors_in_charge.unwrap_or(latest.doctors_in_charge),
            reg_amount,
            local_address: match req.local_address {
                Some(addr) => checked_address(Some(addr))?,
                None => latest.local_address,
            },
            permanent_address: match req.permanent_address {
                Some(addr) => checked_address(Some(addr))?,
                None => latest.permanent_address,
            },
            registered_by: req.registered_by.unwrap_or(latest.registered_by),
        })
    }
}

fn checked_address(address: Option<Address>) -> DeskResult<Option<Address>> {
    match address {
        None => Ok(None),
        Some(mut addr) => {
            addr.zip = validate::zip(addr.zip.as_deref())?;
            Ok(Some(addr))
        }
    }
}

/// The next UHID for the given `YYMM` prefix. The monthly serial continues
/// from the stored maximum when it shares the prefix and restarts at 0001
/// otherwise, which is exactly the month rollover.
fn next_uhid(conn: &Connection, prefix: &str) -> DeskResult<String> {
    let serial = match visits::max_uhid(conn)? {
        Some(last) => match last.strip_prefix(prefix) {
            Some(tail) => {
                let current: u32 = tail.parse().map_err(|_| {
                    Error::Db(DbError::Constraint(format!("malformed UHID in store: {last}")))
                })?;
                current + 1
            }
            None => 1,
        },
        None => 1,
    };
    if serial > MAX_MONTHLY_SERIAL {
        return Err(Error::Conflict(format!(
            "UHID serial space exhausted for month {prefix}"
        )));
    }
    Ok(format!("{prefix}{serial:04}"))
}

/// The next regno under an existing UHID.
fn next_regno(latest: &Visit) -> DeskResult<String> {
    let current = latest.regno_value().ok_or_else(|| {
        Error::Db(DbError::Constraint(format!(
            "malformed regno in store: {}",
            latest.regno
        )))
    })?;
    let next = current + 1;
    if next > MAX_REGNO {
        return Err(Error::Conflict(format!(
            "visit sequence exhausted for UHID {}",
            latest.uhid
        )));
    }
    Ok(format!("{next:03}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::PatientType;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn new_patient(name: &str, patient_type: PatientType) -> NewPatient {
        NewPatient {
            aadhaar_no: None,
            title: Some("Ms".into()),
            full_name: name.into(),
            sex: Some("F".into()),
            mobile: Some("9876543210".into()),
            date_of_reg: None,
            time_of_reg: None,
            age: Some(34),
            patient_type,
            empanelment: None,
            religion: "Hindu".into(),
            marital_status: "Married".into(),
            father_husband: "R. Verma".into(),
            doctors_in_charge: vec!["Dr. Rao".into()],
            reg_amount: Decimal::from_str("500.00").unwrap(),
            local_address: None,
            permanent_address: None,
            registered_by: "frontdesk1".into(),
        }
    }

    #[test]
    fn test_first_registration_of_month() {
        let mut db = Database::open_in_memory().unwrap();
        let clock = FixedClock::at(2025, 6, 15, 10, 0, 0);

        let visit = Registrar::new(&mut db, &clock)
            .register(new_patient("Asha Verma", PatientType::Opd))
            .unwrap();
        assert_eq!(visit.uhid, "25060001");
        assert_eq!(visit.regno, "001");
        assert_eq!(visit.date_of_reg, "2025-06-15");
        assert_eq!(visit.time_of_reg, "10:00:00 AM");
    }

    #[test]
    fn test_serials_are_dense_within_month() {
        let mut db = Database::open_in_memory().unwrap();
        let clock = FixedClock::at(2025, 6, 15, 10, 0, 0);

        for expected in ["25060001", "25060002", "25060003"] {
            let visit = Registrar::new(&mut db, &clock)
                .register(new_patient("Patient", PatientType::Opd))
                .unwrap();
            assert_eq!(visit.uhid, expected);
        }
    }

    #[test]
    fn test_month_rollover_restarts_serial() {
        let mut db = Database::open_in_memory().unwrap();

        let june = FixedClock::at(2025, 6, 30, 23, 0, 0);
        let visit = Registrar::new(&mut db, &june)
            .register(new_patient("June Patient", PatientType::Opd))
            .unwrap();
        assert_eq!(visit.uhid, "25060001");

        let july = FixedClock::at(2025, 7, 1, 0, 30, 0);
        let visit = Registrar::new(&mut db, &july)
            .register(new_patient("July Patient", PatientType::Opd))
            .unwrap();
        assert_eq!(visit.uhid, "25070001");
    }

    #[test]
    fn test_serial_space_exhaustion_is_a_conflict() {
        let mut db = Database::open_in_memory().unwrap();
        let clock = FixedClock::at(2025, 6, 15, 10, 0, 0);

        // Seed the last serial of the month directly.
        let registrar = Registrar::new(&mut db, &clock);
        let mut seeded = registrar
            .visit_from_new(new_patient("Seed", PatientType::Opd))
            .unwrap();
        seeded.uhid = "25069999".into();
        seeded.regno = "001".into();
        visits::insert_visit(db.conn(), &seeded).unwrap();

        let result =
            Registrar::new(&mut db, &clock).register(new_patient("Overflow", PatientType::Opd));
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_re_register_increments_regno_and_merges() {
        let mut db = Database::open_in_memory().unwrap();
        let clock = FixedClock::at(2025, 6, 15, 10, 0, 0);

        let first = Registrar::new(&mut db, &clock)
            .register(new_patient("Asha Verma", PatientType::Opd))
            .unwrap();

        let later = FixedClock::at(2025, 8, 2, 9, 15, 0);
        let update = PatientUpdate {
            patient_type: Some(PatientType::Ipd),
            mobile: Some("91234-56789".into()),
            ..Default::default()
        };
        let second = Registrar::new(&mut db, &later)
            .re_register(&first.uhid, update)
            .unwrap();

        assert_eq!(second.uhid, first.uhid);
        assert_eq!(second.regno, "002");
        assert_eq!(second.patient_type, PatientType::Ipd);
        assert_eq!(second.mobile, Some("9123456789".into()));
        // Carried over from the first visit
        assert_eq!(second.full_name, "Asha Verma");
        assert_eq!(second.religion, "Hindu");
        assert_eq!(second.date_of_reg, "2025-08-02");

        // The original visit row is untouched.
        let rows = db.visits_for(&first.uhid).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].regno, "001");
        assert_eq!(rows[0].patient_type, PatientType::Opd);
    }

    #[test]
    fn test_re_register_unknown_uhid() {
        let mut db = Database::open_in_memory().unwrap();
        let clock = FixedClock::at(2025, 6, 15, 10, 0, 0);
        let result =
            Registrar::new(&mut db, &clock).re_register("25069999", PatientUpdate::default());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_validation_failures_reject_registration() {
        let mut db = Database::open_in_memory().unwrap();
        let clock = FixedClock::at(2025, 6, 15, 10, 0, 0);

        let mut bad_mobile = new_patient("Asha Verma", PatientType::Opd);
        bad_mobile.mobile = Some("12345".into());
        assert!(matches!(
            Registrar::new(&mut db, &clock).register(bad_mobile),
            Err(Error::Validation(_))
        ));

        let mut bad_amount = new_patient("Asha Verma", PatientType::Opd);
        bad_amount.reg_amount = Decimal::from_str("-5").unwrap();
        assert!(matches!(
            Registrar::new(&mut db, &clock).register(bad_amount),
            Err(Error::Validation(_))
        ));

        // Nothing was inserted for the failed attempts.
        assert!(db.conn().query_row("SELECT COUNT(*) FROM visits", [], |r| r.get::<_, i64>(0))
            .unwrap()
            == 0);
    }

    #[test]
    fn test_registration_amount_is_rounded_to_paise() {
        let mut db = Database::open_in_memory().unwrap();
        let clock = FixedClock::at(2025, 6, 15, 10, 0, 0);

        let mut patient = new_patient("Asha Verma", PatientType::Opd);
        patient.reg_amount = Decimal::from_str("500.005").unwrap();
        let visit = Registrar::new(&mut db, &clock).register(patient).unwrap();
        assert_eq!(visit.reg_amount.to_string(), "500.00");
    }
}
