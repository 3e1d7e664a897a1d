//! Final bill row operations.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::{Database, DbError, DbResult};
use crate::models::{ChargeLine, FinalBill, RecordStatus, TransactionLine};

const BILL_COLUMNS: &str = "id, final_bill_no, patient_uhid, patient_regno, patient_name, \
     age, gender, admission_date, admission_time, discharge_date, discharge_time, \
     consultant_doctor, room_type, bed_no, reg_amount, charges_summary, \
     transaction_breakdown, medication_discount, room_service_discount, \
     consultancy_charges_discount, total_charges, total_discount, net_amount, total_paid, \
     balance, created_by, status, cancelled_by";

/// Insert a final bill, returning its row id.
pub(crate) fn insert_bill(conn: &Connection, bill: &FinalBill) -> DbResult<i64> {
    let charges = serde_json::to_string(&bill.charges_summary)?;
    let breakdown = serde_json::to_string(&bill.transaction_breakdown)?;

    conn.execute(
        r#"
        INSERT INTO final_bills (
            final_bill_no, patient_uhid, patient_regno, patient_name, age, gender,
            admission_date, admission_time, discharge_date, discharge_time,
            consultant_doctor, room_type, bed_no, reg_amount, charges_summary,
            transaction_breakdown, medication_discount, room_service_discount,
            consultancy_charges_discount, total_charges, total_discount, net_amount,
            total_paid, balance, created_by, status, cancelled_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                  ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)
        "#,
        params![
            bill.final_bill_no,
            bill.patient_uhid,
            bill.patient_regno,
            bill.patient_name,
            bill.age,
            bill.gender,
            bill.admission_date,
            bill.admission_time,
            bill.discharge_date,
            bill.discharge_time,
            bill.consultant_doctor,
            bill.room_type,
            bill.bed_no,
            bill.reg_amount.to_string(),
            charges,
            breakdown,
            bill.medication_discount.to_string(),
            bill.room_service_discount.to_string(),
            bill.consultancy_charges_discount.to_string(),
            bill.total_charges.to_string(),
            bill.total_discount.to_string(),
            bill.net_amount.to_string(),
            bill.total_paid.to_string(),
            bill.balance.to_string(),
            bill.created_by,
            bill.status.as_str(),
            bill.cancelled_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Latest bill carrying a bill number, if any.
pub(crate) fn bill_by_no(conn: &Connection, final_bill_no: &str) -> DbResult<Option<FinalBill>> {
    let sql = format!(
        "SELECT {BILL_COLUMNS} FROM final_bills WHERE final_bill_no = ? ORDER BY id DESC LIMIT 1"
    );
    conn.query_row(&sql, [final_bill_no], map_bill_row)
        .optional()?
        .map(TryInto::try_into)
        .transpose()
}

/// Whether any bill row, regardless of status, carries this number.
pub(crate) fn bill_no_exists(conn: &Connection, final_bill_no: &str) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM final_bills WHERE final_bill_no = ?",
        [final_bill_no],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// The ACTIVE bill for one `(uhid, regno)` visit, if any.
pub(crate) fn active_bill_for(
    conn: &Connection,
    uhid: &str,
    regno: &str,
) -> DbResult<Option<FinalBill>> {
    let sql = format!(
        "SELECT {BILL_COLUMNS} FROM final_bills \
         WHERE patient_uhid = ?1 AND patient_regno = ?2 AND status = 'ACTIVE' \
         ORDER BY id DESC LIMIT 1"
    );
    conn.query_row(&sql, params![uhid, regno], map_bill_row)
        .optional()?
        .map(TryInto::try_into)
        .transpose()
}

/// All bills for a UHID, newest first.
pub(crate) fn bills_for(conn: &Connection, uhid: &str) -> DbResult<Vec<FinalBill>> {
    let sql =
        format!("SELECT {BILL_COLUMNS} FROM final_bills WHERE patient_uhid = ? ORDER BY id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([uhid], map_bill_row)?;

    let mut bills = Vec::new();
    for row in rows {
        bills.push(row?.try_into()?);
    }
    Ok(bills)
}

/// Flip a bill to CANCELLED, recording who cancelled it.
pub(crate) fn mark_bill_cancelled(
    conn: &Connection,
    final_bill_no: &str,
    cancelled_by: &str,
) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "UPDATE final_bills SET status = 'CANCELLED', cancelled_by = ?2 \
         WHERE final_bill_no = ?1",
        params![final_bill_no, cancelled_by],
    )?;
    Ok(rows_affected > 0)
}

/// Number of bills discharged on a given date.
pub(crate) fn count_discharges_on(conn: &Connection, date: &str) -> DbResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM final_bills WHERE discharge_date = ?",
        [date],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

impl Database {
    /// Latest bill carrying a bill number.
    pub fn bill_by_no(&self, final_bill_no: &str) -> DbResult<Option<FinalBill>> {
        bill_by_no(&self.conn, final_bill_no)
    }

    /// All bills for a UHID, newest first.
    pub fn bills_for(&self, uhid: &str) -> DbResult<Vec<FinalBill>> {
        bills_for(&self.conn, uhid)
    }

    /// The ACTIVE bill for one visit, if any.
    pub fn active_bill_for(&self, uhid: &str, regno: &str) -> DbResult<Option<FinalBill>> {
        active_bill_for(&self.conn, uhid, regno)
    }

    /// Discharges (bills) dated a given day.
    pub fn count_discharges_on(&self, date: &str) -> DbResult<i64> {
        count_discharges_on(&self.conn, date)
    }
}

/// Intermediate row struct for database mapping.
struct BillRow {
    id: i64,
    final_bill_no: String,
    patient_uhid: String,
    patient_regno: String,
    patient_name: String,
    age: Option<i64>,
    gender: Option<String>,
    admission_date: String,
    admission_time: Option<String>,
    discharge_date: String,
    discharge_time: String,
    consultant_doctor: Option<String>,
    room_type: Option<String>,
    bed_no: Option<String>,
    reg_amount: String,
    charges_summary: String,
    transaction_breakdown: String,
    medication_discount: String,
    room_service_discount: String,
    consultancy_charges_discount: String,
    total_charges: String,
    total_discount: String,
    net_amount: String,
    total_paid: String,
    balance: String,
    created_by: String,
    status: String,
    cancelled_by: Option<String>,
}

fn map_bill_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BillRow> {
    Ok(BillRow {
        id: row.get(0)?,
        final_bill_no: row.get(1)?,
        patient_uhid: row.get(2)?,
        patient_regno: row.get(3)?,
        patient_name: row.get(4)?,
        age: row.get(5)?,
        gender: row.get(6)?,
        admission_date: row.get(7)?,
        admission_time: row.get(8)?,
        discharge_date: row.get(9)?,
        discharge_time: row.get(10)?,
        consultant_doctor: row.get(11)?,
        room_type: row.get(12)?,
        bed_no: row.get(13)?,
        reg_amount: row.get(14)?,
        charges_summary: row.get(15)?,
        transaction_breakdown: row.get(16)?,
        medication_discount: row.get(17)?,
        room_service_discount: row.get(18)?,
        consultancy_charges_discount: row.get(19)?,
        total_charges: row.get(20)?,
        total_discount: row.get(21)?,
        net_amount: row.get(22)?,
        total_paid: row.get(23)?,
        balance: row.get(24)?,
        created_by: row.get(25)?,
        status: row.get(26)?,
        cancelled_by: row.get(27)?,
    })
}

impl TryFrom<BillRow> for FinalBill {
    type Error = DbError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let status = RecordStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("unknown status: {}", row.status)))?;
        let charges_summary: Vec<ChargeLine> = serde_json::from_str(&row.charges_summary)?;
        let transaction_breakdown: Vec<TransactionLine> =
            serde_json::from_str(&row.transaction_breakdown)?;

        Ok(FinalBill {
            id: Some(row.id),
            final_bill_no: row.final_bill_no,
            patient_uhid: row.patient_uhid,
            patient_regno: row.patient_regno,
            patient_name: row.patient_name,
            age: row.age,
            gender: row.gender,
            admission_date: row.admission_date,
            admission_time: row.admission_time,
            discharge_date: row.discharge_date,
            discharge_time: row.discharge_time,
            consultant_doctor: row.consultant_doctor,
            room_type: row.room_type,
            bed_no: row.bed_no,
            reg_amount: Decimal::from_str(&row.reg_amount)?,
            charges_summary,
            transaction_breakdown,
            medication_discount: Decimal::from_str(&row.medication_discount)?,
            room_service_discount: Decimal::from_str(&row.room_service_discount)?,
            consultancy_charges_discount: Decimal::from_str(&row.consultancy_charges_discount)?,
            total_charges: Decimal::from_str(&row.total_charges)?,
            total_discount: Decimal::from_str(&row.total_discount)?,
            net_amount: Decimal::from_str(&row.net_amount)?,
            total_paid: Decimal::from_str(&row.total_paid)?,
            balance: Decimal::from_str(&row.balance)?,
            created_by: row.created_by,
            status,
            cancelled_by: row.cancelled_by,
        })
    }
}
