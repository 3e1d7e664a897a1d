//! Visit row operations.
//!
//! Visits are append-only: there is no update path here by design.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::{Database, DbError, DbResult};
use crate::models::{Address, FilteredVisit, PatientType, Visit, VisitFilter};

const VISIT_COLUMNS: &str = "id, uhid, regno, aadhaar_no, title, full_name, sex, mobile, \
     date_of_reg, time_of_reg, age, patient_type, empanelment, religion, marital_status, \
     father_husband, doctors_in_charge, reg_amount, local_address, permanent_address, \
     registered_by";

/// Insert a visit row, returning its row id.
pub(crate) fn insert_visit(conn: &Connection, visit: &Visit) -> DbResult<i64> {
    let doctors = serde_json::to_string(&visit.doctors_in_charge)?;
    let local = visit
        .local_address
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let permanent = visit
        .permanent_address
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        r#"
        INSERT INTO visits (
            uhid, regno, aadhaar_no, title, full_name, sex, mobile,
            date_of_reg, time_of_reg, age, patient_type, empanelment,
            religion, marital_status, father_husband, doctors_in_charge,
            reg_amount, local_address, permanent_address, registered_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                  ?15, ?16, ?17, ?18, ?19, ?20)
        "#,
        params![
            visit.uhid,
            visit.regno,
            visit.aadhaar_no,
            visit.title,
            visit.full_name,
            visit.sex,
            visit.mobile,
            visit.date_of_reg,
            visit.time_of_reg,
            visit.age,
            visit.patient_type.as_str(),
            visit.empanelment,
            visit.religion,
            visit.marital_status,
            visit.father_husband,
            doctors,
            visit.reg_amount.to_string(),
            local,
            permanent,
            visit.registered_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The maximum-sorting UHID across all visits (fixed-width zero-padded,
/// so text order equals numeric order).
pub(crate) fn max_uhid(conn: &Connection) -> DbResult<Option<String>> {
    conn.query_row(
        "SELECT uhid FROM visits ORDER BY uhid DESC LIMIT 1",
        [],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

/// The visit with the highest regno for a UHID, i.e. the current visit.
pub(crate) fn latest_visit(conn: &Connection, uhid: &str) -> DbResult<Option<Visit>> {
    let sql = format!(
        "SELECT {VISIT_COLUMNS} FROM visits WHERE uhid = ? ORDER BY regno DESC LIMIT 1"
    );
    conn.query_row(&sql, [uhid], map_visit_row)
        .optional()?
        .map(TryInto::try_into)
        .transpose()
}

/// All visits for a UHID, latest regno first.
pub(crate) fn visits_for(conn: &Connection, uhid: &str) -> DbResult<Vec<Visit>> {
    let sql = format!("SELECT {VISIT_COLUMNS} FROM visits WHERE uhid = ? ORDER BY regno DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([uhid], map_visit_row)?;
    collect_visits(rows)
}

/// Visits matching a UHID or a mobile number, latest regno first.
pub(crate) fn find_visits(conn: &Connection, search: &str) -> DbResult<Vec<Visit>> {
    let sql = format!(
        "SELECT {VISIT_COLUMNS} FROM visits WHERE uhid = ?1 OR mobile = ?1 ORDER BY regno DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([search], map_visit_row)?;
    collect_visits(rows)
}

/// Visits matching a report filter, newest first, each left-joined with
/// the discharge date/time of its non-cancelled bill. Cancelled bills are
/// ignored by the join, so a corrected discharge shows the live stamp.
pub(crate) fn filter_visits(
    conn: &Connection,
    filter: &VisitFilter,
) -> DbResult<Vec<FilteredVisit>> {
    let visit_cols: Vec<String> = VISIT_COLUMNS
        .split(", ")
        .map(|col| format!("v.{}", col.trim()))
        .collect();
    let mut sql = format!(
        "SELECT {}, b.discharge_date, b.discharge_time FROM visits v \
         LEFT JOIN final_bills b \
           ON b.patient_uhid = v.uhid AND b.patient_regno = v.regno \
          AND b.status != 'CANCELLED'",
        visit_cols.join(", ")
    );

    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();
    if let Some(patient_type) = filter.patient_type {
        clauses.push("v.patient_type = ?");
        args.push(patient_type.as_str().to_string());
    }
    if let Some(from) = &filter.date_from {
        clauses.push("v.date_of_reg >= ?");
        args.push(from.clone());
    }
    if let Some(to) = &filter.date_to {
        clauses.push("v.date_of_reg <= ?");
        args.push(to.clone());
    }
    if let Some(doctor) = &filter.doctor {
        // doctors_in_charge is a JSON array; LIKE over its text form gives
        // the case-insensitive substring match the report needs.
        clauses.push("v.doctors_in_charge LIKE '%' || ? || '%'");
        args.push(doctor.clone());
    }
    if let Some(empanelment) = &filter.empanelment {
        clauses.push("v.empanelment = ?");
        args.push(empanelment.clone());
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY v.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args), |row| {
        let visit = map_visit_row(row)?;
        let discharge_date: Option<String> = row.get(21)?;
        let discharge_time: Option<String> = row.get(22)?;
        Ok((visit, discharge_date, discharge_time))
    })?;

    let mut matches = Vec::new();
    for row in rows {
        let (visit, discharge_date, discharge_time) = row?;
        matches.push(FilteredVisit {
            visit: visit.try_into()?,
            discharge_date,
            discharge_time,
        });
    }
    Ok(matches)
}

/// Number of registrations of one patient type on a given date.
pub(crate) fn count_on(conn: &Connection, date: &str, patient_type: PatientType) -> DbResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM visits WHERE date_of_reg = ?1 AND patient_type = ?2",
        params![date, patient_type.as_str()],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

impl Database {
    /// Get the current (max-regno) visit for a UHID.
    pub fn latest_visit(&self, uhid: &str) -> DbResult<Option<Visit>> {
        latest_visit(&self.conn, uhid)
    }

    /// All visits for a UHID, latest first.
    pub fn visits_for(&self, uhid: &str) -> DbResult<Vec<Visit>> {
        visits_for(&self.conn, uhid)
    }

    /// Search visits by UHID or mobile number, latest first.
    pub fn find_visits(&self, search: &str) -> DbResult<Vec<Visit>> {
        find_visits(&self.conn, search)
    }

    /// Registrations of a patient type on a date.
    pub fn count_visits_on(&self, date: &str, patient_type: PatientType) -> DbResult<i64> {
        count_on(&self.conn, date, patient_type)
    }

    /// Visits matching a report filter, joined with discharge stamps.
    pub fn filter_visits(&self, filter: &VisitFilter) -> DbResult<Vec<FilteredVisit>> {
        filter_visits(&self.conn, filter)
    }
}

/// Intermediate row struct for database mapping.
struct VisitRow {
    id: i64,
    uhid: String,
    regno: String,
    aadhaar_no: Option<String>,
    title: Option<String>,
    full_name: String,
    sex: Option<String>,
    mobile: Option<String>,
    date_of_reg: String,
    time_of_reg: String,
    age: Option<i64>,
    patient_type: String,
    empanelment: Option<String>,
    religion: String,
    marital_status: String,
    father_husband: String,
    doctors_in_charge: String,
    reg_amount: String,
    local_address: Option<String>,
    permanent_address: Option<String>,
    registered_by: String,
}

fn map_visit_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VisitRow> {
    Ok(VisitRow {
        id: row.get(0)?,
        uhid: row.get(1)?,
        regno: row.get(2)?,
        aadhaar_no: row.get(3)?,
        title: row.get(4)?,
        full_name: row.get(5)?,
        sex: row.get(6)?,
        mobile: row.get(7)?,
        date_of_reg: row.get(8)?,
        time_of_reg: row.get(9)?,
        age: row.get(10)?,
        patient_type: row.get(11)?,
        empanelment: row.get(12)?,
        religion: row.get(13)?,
        marital_status: row.get(14)?,
        father_husband: row.get(15)?,
        doctors_in_charge: row.get(16)?,
        reg_amount: row.get(17)?,
        local_address: row.get(18)?,
        permanent_address: row.get(19)?,
        registered_by: row.get(20)?,
    })
}

impl TryFrom<VisitRow> for Visit {
    type Error = DbError;

    fn try_from(row: VisitRow) -> Result<Self, Self::Error> {
        let patient_type = PatientType::parse(&row.patient_type).ok_or_else(|| {
            DbError::Constraint(format!("unknown patient type: {}", row.patient_type))
        })?;
        let doctors_in_charge: Vec<String> = serde_json::from_str(&row.doctors_in_charge)?;
        let local_address: Option<Address> = row
            .local_address
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let permanent_address: Option<Address> = row
            .permanent_address
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Visit {
            id: Some(row.id),
            uhid: row.uhid,
            regno: row.regno,
            aadhaar_no: row.aadhaar_no,
            title: row.title,
            full_name: row.full_name,
            sex: row.sex,
            mobile: row.mobile,
            date_of_reg: row.date_of_reg,
            time_of_reg: row.time_of_reg,
            age: row.age,
            patient_type,
            empanelment: row.empanelment,
            religion: row.religion,
            marital_status: row.marital_status,
            father_husband: row.father_husband,
            doctors_in_charge,
            reg_amount: Decimal::from_str(&row.reg_amount)?,
            local_address,
            permanent_address,
            registered_by: row.registered_by,
        })
    }
}

fn collect_visits(
    rows: impl Iterator<Item = rusqlite::Result<VisitRow>>,
) -> DbResult<Vec<Visit>> {
    let mut visits = Vec::new();
    for row in rows {
        visits.push(row?.try_into()?);
    }
    Ok(visits)
}
