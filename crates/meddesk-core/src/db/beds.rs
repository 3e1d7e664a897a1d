//! Bed allocation row operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{BedAllocation, BedStatus};

/// Insert a bed allocation, returning its row id.
pub(crate) fn insert_bed(conn: &Connection, bed: &BedAllocation) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO bed_allocations (uhid, patient_name, department, bed_number, status) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            bed.uhid,
            bed.patient_name,
            bed.department,
            bed.bed_number,
            bed.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The ACTIVE bed for a UHID, if any. At most one exists.
pub(crate) fn active_bed(conn: &Connection, uhid: &str) -> DbResult<Option<BedAllocation>> {
    conn.query_row(
        "SELECT bed_id, uhid, patient_name, department, bed_number, status \
         FROM bed_allocations WHERE uhid = ? AND status = 'ACTIVE' \
         ORDER BY bed_id DESC LIMIT 1",
        [uhid],
        map_bed_row,
    )
    .optional()?
    .map(TryInto::try_into)
    .transpose()
}

/// Release the ACTIVE bed for a UHID.
pub(crate) fn mark_bed_released(conn: &Connection, uhid: &str) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "UPDATE bed_allocations SET status = 'RELEASED' WHERE uhid = ? AND status = 'ACTIVE'",
        [uhid],
    )?;
    Ok(rows_affected > 0)
}

impl Database {
    /// Get the ACTIVE bed for a UHID.
    pub fn active_bed(&self, uhid: &str) -> DbResult<Option<BedAllocation>> {
        active_bed(&self.conn, uhid)
    }
}

struct BedRow {
    bed_id: i64,
    uhid: String,
    patient_name: String,
    department: String,
    bed_number: String,
    status: String,
}

fn map_bed_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BedRow> {
    Ok(BedRow {
        bed_id: row.get(0)?,
        uhid: row.get(1)?,
        patient_name: row.get(2)?,
        department: row.get(3)?,
        bed_number: row.get(4)?,
        status: row.get(5)?,
    })
}

impl TryFrom<BedRow> for BedAllocation {
    type Error = DbError;

    fn try_from(row: BedRow) -> Result<Self, Self::Error> {
        let status = BedStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("unknown bed status: {}", row.status)))?;
        Ok(BedAllocation {
            bed_id: Some(row.bed_id),
            uhid: row.uhid,
            patient_name: row.patient_name,
            department: row.department,
            bed_number: row.bed_number,
            status,
        })
    }
}
