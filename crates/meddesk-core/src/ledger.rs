//! Payment transaction ledger.
//!
//! Transactions are advance or interim payments against an IPD admission.
//! Each carries a caller-supplied, globally unique transaction number and
//! snapshots the patient's name and visit identifiers at entry time.
//! Cancellation never deletes: the row flips to CANCELLED and records who
//! cancelled it, so the ledger stays append-only for audit.

use tracing::info;

use crate::clock::Clock;
use crate::db::{transactions, Database, DbError};
use crate::models::{PaymentMode, RecordStatus, Transaction, TransactionRequest};
use crate::money::round2;
use crate::{resolver, validate, DeskResult, Error};

pub struct TransactionLedger<'a, C: Clock> {
    db: &'a mut Database,
    clock: &'a C,
}

impl<'a, C: Clock> TransactionLedger<'a, C> {
    pub fn new(db: &'a mut Database, clock: &'a C) -> Self {
        Self { db, clock }
    }

    /// Record a payment against the latest visit of a UHID. The visit must
    /// be an IPD admission, and the transaction number must be unused.
    pub fn record(&mut self, req: TransactionRequest) -> DeskResult<Transaction> {
        validate::uhid(&req.patient_uhid)?;
        let payment_mode = PaymentMode::parse(&req.payment_mode).ok_or_else(|| {
            let allowed = PaymentMode::ALL.map(|m| m.as_str()).join(", ");
            Error::Validation(format!("invalid payment mode; must be one of: {allowed}"))
        })?;
        let amount = round2(validate::amount(req.amount, "amount")?);
        let admission_date = validate::date_ymd(&req.admission_date, "admission date")?;
        let transaction_date = match req.transaction_date.as_deref() {
            Some(v) => validate::date_ymd(v, "transaction date")?,
            None => self.clock.date_string(),
        };
        let transaction_time = match req.transaction_time.as_deref() {
            Some(v) => validate::time_of_day(v, "transaction time")?,
            None => self.clock.time_string(),
        };
        let purpose = validate::required(&req.purpose, "purpose")?;
        let transaction_no = validate::required(&req.transaction_no, "transaction number")?;
        let created_by = validate::required(&req.created_by, "created_by")?;

        let tx = self.db.write_transaction()?;
        if transactions::transaction_by_no(&tx, &transaction_no)?.is_some() {
            return Err(Error::Conflict(format!(
                "transaction number {transaction_no} already exists"
            )));
        }
        let visit = resolver::resolve_latest_ipd(&tx, &req.patient_uhid)?;

        let mut txn = Transaction {
            id: None,
            patient_uhid: visit.uhid,
            patient_regno: visit.regno,
            patient_name: visit.full_name,
            admission_date,
            purpose,
            amount,
            payment_mode,
            payment_details: req.payment_details,
            transaction_date,
            transaction_time,
            transaction_no,
            created_by,
            status: RecordStatus::Active,
            cancelled_by: None,
        };
        let id = transactions::insert_transaction(&tx, &txn)?;
        tx.commit().map_err(DbError::from)?;

        txn.id = Some(id);
        info!(
            transaction_no = %txn.transaction_no,
            uhid = %txn.patient_uhid,
            regno = %txn.patient_regno,
            amount = %txn.amount,
            "recorded transaction"
        );
        Ok(txn)
    }

    /// Cancel a transaction by its number. Cancelling twice is a conflict.
    pub fn cancel(&mut self, transaction_no: &str, cancelled_by: &str) -> DeskResult<Transaction> {
        let cancelled_by = validate::required(cancelled_by, "cancelled_by")?;

        let tx = self.db.write_transaction()?;
        let txn = transactions::transaction_by_no(&tx, transaction_no)?.ok_or_else(|| {
            Error::NotFound(format!("transaction {transaction_no} not found"))
        })?;
        if txn.status == RecordStatus::Cancelled {
            return Err(Error::Conflict(format!(
                "transaction {transaction_no} is already cancelled"
            )));
        }
        transactions::mark_transaction_cancelled(&tx, transaction_no, &cancelled_by)?;
        tx.commit().map_err(DbError::from)?;

        info!(transaction_no, cancelled_by = %cancelled_by, "cancelled transaction");
        Ok(Transaction {
            status: RecordStatus::Cancelled,
            cancelled_by: Some(cancelled_by),
            ..txn
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{NewPatient, PatientType};
    use crate::registrar::Registrar;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn register(db: &mut Database, patient_type: PatientType) -> String {
        let clock = FixedClock::at(2025, 6, 15, 10, 0, 0);
        let req = NewPatient {
            aadhaar_no: None,
            title: None,
            full_name: "Asha Verma".into(),
            sex: Some("F".into()),
            mobile: None,
            date_of_reg: None,
            time_of_reg: None,
            age: Some(34),
            patient_type,
            empanelment: None,
            religion: "Hindu".into(),
            marital_status: "Married".into(),
            father_husband: "R. Verma".into(),
            doctors_in_charge: vec![],
            reg_amount: Decimal::from_str("500.00").unwrap(),
            local_address: None,
            permanent_address: None,
            registered_by: "frontdesk1".into(),
        };
        Registrar::new(db, &clock).register(req).unwrap().uhid
    }

    fn txn_request(uhid: &str, transaction_no: &str, amount: &str) -> TransactionRequest {
        TransactionRequest {
            patient_uhid: uhid.into(),
            admission_date: "2025-06-15".into(),
            purpose: "ADVANCE".into(),
            amount: Decimal::from_str(amount).unwrap(),
            payment_mode: "CASH".into(),
            payment_details: None,
            transaction_date: None,
            transaction_time: None,
            transaction_no: transaction_no.into(),
            created_by: "frontdesk1".into(),
        }
    }

    #[test]
    fn test_record_snapshots_latest_visit() {
        let mut db = Database::open_in_memory().unwrap();
        let uhid = register(&mut db, PatientType::Ipd);

        let clock = FixedClock::at(2025, 6, 16, 15, 30, 0);
        let txn = TransactionLedger::new(&mut db, &clock)
            .record(txn_request(&uhid, "TXN0001", "5000.00"))
            .unwrap();

        assert_eq!(txn.patient_uhid, uhid);
        assert_eq!(txn.patient_regno, "001");
        assert_eq!(txn.patient_name, "Asha Verma");
        assert_eq!(txn.transaction_date, "2025-06-16");
        assert_eq!(txn.transaction_time, "03:30:00 PM");
        assert!(txn.is_active());
    }

    #[test]
    fn test_non_ipd_visit_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let uhid = register(&mut db, PatientType::Opd);

        let clock = FixedClock::at(2025, 6, 16, 15, 30, 0);
        let result =
            TransactionLedger::new(&mut db, &clock).record(txn_request(&uhid, "TXN0001", "100.00"));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_duplicate_transaction_no_is_a_conflict() {
        let mut db = Database::open_in_memory().unwrap();
        let uhid = register(&mut db, PatientType::Ipd);
        let clock = FixedClock::at(2025, 6, 16, 15, 30, 0);

        TransactionLedger::new(&mut db, &clock)
            .record(txn_request(&uhid, "TXN0001", "100.00"))
            .unwrap();
        let result =
            TransactionLedger::new(&mut db, &clock).record(txn_request(&uhid, "TXN0001", "200.00"));
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_invalid_payment_mode() {
        let mut db = Database::open_in_memory().unwrap();
        let uhid = register(&mut db, PatientType::Ipd);
        let clock = FixedClock::at(2025, 6, 16, 15, 30, 0);

        let mut req = txn_request(&uhid, "TXN0001", "100.00");
        req.payment_mode = "BITCOIN".into();
        let result = TransactionLedger::new(&mut db, &clock).record(req);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_amount_is_rounded_to_paise() {
        let mut db = Database::open_in_memory().unwrap();
        let uhid = register(&mut db, PatientType::Ipd);
        let clock = FixedClock::at(2025, 6, 16, 15, 30, 0);

        let txn = TransactionLedger::new(&mut db, &clock)
            .record(txn_request(&uhid, "TXN0001", "100.015"))
            .unwrap();
        assert_eq!(txn.amount.to_string(), "100.02");
    }

    #[test]
    fn test_cancel_and_double_cancel() {
        let mut db = Database::open_in_memory().unwrap();
        let uhid = register(&mut db, PatientType::Ipd);
        let clock = FixedClock::at(2025, 6, 16, 15, 30, 0);

        TransactionLedger::new(&mut db, &clock)
            .record(txn_request(&uhid, "TXN0001", "100.00"))
            .unwrap();

        let cancelled = TransactionLedger::new(&mut db, &clock)
            .cancel("TXN0001", "supervisor")
            .unwrap();
        assert_eq!(cancelled.status, RecordStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by, Some("supervisor".into()));

        let again = TransactionLedger::new(&mut db, &clock).cancel("TXN0001", "supervisor");
        assert!(matches!(again, Err(Error::Conflict(_))));

        let missing = TransactionLedger::new(&mut db, &clock).cancel("TXN9999", "supervisor");
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
