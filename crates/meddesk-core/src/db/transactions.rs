//! Transaction row operations.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::{Database, DbError, DbResult};
use crate::models::{PaymentDetails, PaymentMode, RecordStatus, Transaction};

const TXN_COLUMNS: &str = "id, patient_uhid, patient_regno, patient_name, admission_date, \
     purpose, amount, payment_mode, payment_details, transaction_date, transaction_time, \
     transaction_no, created_by, status, cancelled_by";

/// Insert a transaction row, returning its row id.
pub(crate) fn insert_transaction(conn: &Connection, txn: &Transaction) -> DbResult<i64> {
    let details = txn
        .payment_details
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        r#"
        INSERT INTO transactions (
            patient_uhid, patient_regno, patient_name, admission_date, purpose,
            amount, payment_mode, payment_details, transaction_date,
            transaction_time, transaction_no, created_by, status, cancelled_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
        params![
            txn.patient_uhid,
            txn.patient_regno,
            txn.patient_name,
            txn.admission_date,
            txn.purpose,
            txn.amount.to_string(),
            txn.payment_mode.as_str(),
            details,
            txn.transaction_date,
            txn.transaction_time,
            txn.transaction_no,
            txn.created_by,
            txn.status.as_str(),
            txn.cancelled_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Point lookup by the globally unique transaction number.
pub(crate) fn transaction_by_no(
    conn: &Connection,
    transaction_no: &str,
) -> DbResult<Option<Transaction>> {
    let sql = format!("SELECT {TXN_COLUMNS} FROM transactions WHERE transaction_no = ?");
    conn.query_row(&sql, [transaction_no], map_txn_row)
        .optional()?
        .map(TryInto::try_into)
        .transpose()
}

/// All transactions for a UHID regardless of visit or status, newest first.
pub(crate) fn transactions_for(conn: &Connection, uhid: &str) -> DbResult<Vec<Transaction>> {
    let sql =
        format!("SELECT {TXN_COLUMNS} FROM transactions WHERE patient_uhid = ? ORDER BY id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([uhid], map_txn_row)?;
    collect_txns(rows)
}

/// ACTIVE transactions for one exact `(uhid, regno)` visit, newest first.
pub(crate) fn active_for_visit(
    conn: &Connection,
    uhid: &str,
    regno: &str,
) -> DbResult<Vec<Transaction>> {
    let sql = format!(
        "SELECT {TXN_COLUMNS} FROM transactions \
         WHERE patient_uhid = ?1 AND patient_regno = ?2 AND status = 'ACTIVE' \
         ORDER BY id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![uhid, regno], map_txn_row)?;
    collect_txns(rows)
}

/// Flip a transaction to CANCELLED, recording who cancelled it.
pub(crate) fn mark_transaction_cancelled(
    conn: &Connection,
    transaction_no: &str,
    cancelled_by: &str,
) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "UPDATE transactions SET status = 'CANCELLED', cancelled_by = ?2 \
         WHERE transaction_no = ?1",
        params![transaction_no, cancelled_by],
    )?;
    Ok(rows_affected > 0)
}

impl Database {
    /// Get a transaction by its unique number.
    pub fn transaction_by_no(&self, transaction_no: &str) -> DbResult<Option<Transaction>> {
        transaction_by_no(&self.conn, transaction_no)
    }

    /// All transactions ever recorded for a UHID, newest first.
    pub fn transactions_for(&self, uhid: &str) -> DbResult<Vec<Transaction>> {
        transactions_for(&self.conn, uhid)
    }

    /// ACTIVE transactions for one visit, newest first.
    pub fn active_transactions_for(&self, uhid: &str, regno: &str) -> DbResult<Vec<Transaction>> {
        active_for_visit(&self.conn, uhid, regno)
    }
}

/// Intermediate row struct for database mapping.
struct TxnRow {
    id: i64,
    patient_uhid: String,
    patient_regno: String,
    patient_name: String,
    admission_date: String,
    purpose: String,
    amount: String,
    payment_mode: String,
    payment_details: Option<String>,
    transaction_date: String,
    transaction_time: String,
    transaction_no: String,
    created_by: String,
    status: String,
    cancelled_by: Option<String>,
}

fn map_txn_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TxnRow> {
    Ok(TxnRow {
        id: row.get(0)?,
        patient_uhid: row.get(1)?,
        patient_regno: row.get(2)?,
        patient_name: row.get(3)?,
        admission_date: row.get(4)?,
        purpose: row.get(5)?,
        amount: row.get(6)?,
        payment_mode: row.get(7)?,
        payment_details: row.get(8)?,
        transaction_date: row.get(9)?,
        transaction_time: row.get(10)?,
        transaction_no: row.get(11)?,
        created_by: row.get(12)?,
        status: row.get(13)?,
        cancelled_by: row.get(14)?,
    })
}

impl TryFrom<TxnRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TxnRow) -> Result<Self, Self::Error> {
        let payment_mode = PaymentMode::parse(&row.payment_mode).ok_or_else(|| {
            DbError::Constraint(format!("unknown payment mode: {}", row.payment_mode))
        })?;
        let status = RecordStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("unknown status: {}", row.status)))?;
        let payment_details: Option<PaymentDetails> = row
            .payment_details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Transaction {
            id: Some(row.id),
            patient_uhid: row.patient_uhid,
            patient_regno: row.patient_regno,
            patient_name: row.patient_name,
            admission_date: row.admission_date,
            purpose: row.purpose,
            amount: Decimal::from_str(&row.amount)?,
            payment_mode,
            payment_details,
            transaction_date: row.transaction_date,
            transaction_time: row.transaction_time,
            transaction_no: row.transaction_no,
            created_by: row.created_by,
            status,
            cancelled_by: row.cancelled_by,
        })
    }
}

fn collect_txns(
    rows: impl Iterator<Item = rusqlite::Result<TxnRow>>,
) -> DbResult<Vec<Transaction>> {
    let mut txns = Vec::new();
    for row in rows {
        txns.push(row?.try_into()?);
    }
    Ok(txns)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_txn(transaction_no: &str, regno: &str, amount: &str) -> Transaction {
        Transaction {
            id: None,
            patient_uhid: "25060001".into(),
            patient_regno: regno.into(),
            patient_name: "Asha Verma".into(),
            admission_date: "2025-06-15".into(),
            purpose: "ADVANCE".into(),
            amount: Decimal::from_str(amount).unwrap(),
            payment_mode: PaymentMode::Cash,
            payment_details: None,
            transaction_date: "2025-06-16".into(),
            transaction_time: "03:30:00 PM".into(),
            transaction_no: transaction_no.into(),
            created_by: "frontdesk1".into(),
            status: RecordStatus::Active,
            cancelled_by: None,
        }
    }

    #[test]
    fn test_insert_and_lookup_by_no() {
        let db = Database::open_in_memory().unwrap();
        insert_transaction(db.conn(), &sample_txn("TXN0001", "001", "5000.00")).unwrap();

        let txn = db.transaction_by_no("TXN0001").unwrap().unwrap();
        assert_eq!(txn.amount, Decimal::from_str("5000.00").unwrap());
        assert_eq!(txn.payment_mode, PaymentMode::Cash);
        assert!(txn.is_active());

        assert!(db.transaction_by_no("TXN9999").unwrap().is_none());
    }

    #[test]
    fn test_active_for_visit_filters_regno_and_status() {
        let db = Database::open_in_memory().unwrap();
        insert_transaction(db.conn(), &sample_txn("TXN0001", "001", "1000.00")).unwrap();
        insert_transaction(db.conn(), &sample_txn("TXN0002", "002", "2000.00")).unwrap();
        insert_transaction(db.conn(), &sample_txn("TXN0003", "002", "3000.00")).unwrap();

        mark_transaction_cancelled(db.conn(), "TXN0002", "admin").unwrap();

        let active = db.active_transactions_for("25060001", "002").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].transaction_no, "TXN0003");
    }

    #[test]
    fn test_newest_first_ordering() {
        let db = Database::open_in_memory().unwrap();
        for no in ["TXN0001", "TXN0002", "TXN0003"] {
            insert_transaction(db.conn(), &sample_txn(no, "001", "100.00")).unwrap();
        }
        let all = db.transactions_for("25060001").unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].transaction_no, "TXN0003");
        assert_eq!(all[2].transaction_no, "TXN0001");
    }

    #[test]
    fn test_cancel_records_who() {
        let db = Database::open_in_memory().unwrap();
        insert_transaction(db.conn(), &sample_txn("TXN0001", "001", "100.00")).unwrap();

        assert!(mark_transaction_cancelled(db.conn(), "TXN0001", "supervisor").unwrap());
        let txn = db.transaction_by_no("TXN0001").unwrap().unwrap();
        assert_eq!(txn.status, RecordStatus::Cancelled);
        assert_eq!(txn.cancelled_by, Some("supervisor".into()));

        assert!(!mark_transaction_cancelled(db.conn(), "TXN9999", "supervisor").unwrap());
    }

    #[test]
    fn test_payment_details_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut txn = sample_txn("TXN0001", "001", "100.00");
        txn.payment_mode = PaymentMode::Cheque;
        txn.payment_details = Some(PaymentDetails {
            bank_name: Some("State Bank of India".into()),
            instrument_no: Some("000123".into()),
            instrument_date: Some("2025-06-16".into()),
        });
        insert_transaction(db.conn(), &txn).unwrap();

        let stored = db.transaction_by_no("TXN0001").unwrap().unwrap();
        let details = stored.payment_details.unwrap();
        assert_eq!(details.bank_name, Some("State Bank of India".into()));
    }
}
