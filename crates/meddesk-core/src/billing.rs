//! Discharge billing aggregator.
//!
//! A final bill consolidates one `(uhid, regno)` visit: demographic
//! snapshot, itemized charges, category discounts, and the ACTIVE payments
//! recorded against the visit. All money math happens here in two-decimal
//! fixed point; stored rows are never recomputed.

use rusqlite::Connection;
use tracing::info;

use crate::clock::Clock;
use crate::db::{beds, bills, transactions, Database, DbError};
use crate::models::{
    BedAllocation, BillRequest, ChargeLine, Discounts, FinalBill, RecordStatus, Transaction,
    TransactionLine, Visit,
};
use crate::money::round2;
use crate::{resolver, validate, DeskResult, Error};

/// Everything the desk needs on screen before generating a final bill:
/// the current visit, its ACTIVE bed (if any), and its ACTIVE payments.
#[derive(Debug, Clone)]
pub struct DischargeWorkup {
    pub visit: Visit,
    pub bed: Option<BedAllocation>,
    pub transactions: Vec<Transaction>,
}

/// Pull the discharge view for a UHID's current visit.
pub(crate) fn workup(conn: &Connection, uhid: &str) -> DeskResult<DischargeWorkup> {
    let visit = resolver::resolve_latest(conn, uhid)?;
    let bed = beds::active_bed(conn, uhid)?;
    let transactions = transactions::active_for_visit(conn, &visit.uhid, &visit.regno)?;
    Ok(DischargeWorkup {
        visit,
        bed,
        transactions,
    })
}

pub struct BillingAggregator<'a, C: Clock> {
    db: &'a mut Database,
    clock: &'a C,
}

impl<'a, C: Clock> BillingAggregator<'a, C> {
    pub fn new(db: &'a mut Database, clock: &'a C) -> Self {
        Self { db, clock }
    }

    /// Generate the final bill for a UHID's current visit.
    ///
    /// Fails with Conflict when the bill number was ever used before or
    /// when the visit already has an ACTIVE bill; cancelling that bill
    /// frees the visit for a corrected one.
    pub fn create_bill(&mut self, req: BillRequest) -> DeskResult<FinalBill> {
        let final_bill_no = validate::required(&req.final_bill_no, "final bill number")?;
        let created_by = validate::required(&req.created_by, "created_by")?;
        let discharge_date = match req.discharge_date.as_deref() {
            Some(v) => validate::date_ymd(v, "discharge date")?,
            None => self.clock.date_string(),
        };
        let discharge_time = match req.discharge_time.as_deref() {
            Some(v) => validate::time_of_day(v, "discharge time")?,
            None => self.clock.time_string(),
        };
        let mut charges = Vec::with_capacity(req.charges.len());
        for line in req.charges {
            charges.push(ChargeLine {
                description: validate::required(&line.description, "charge description")?,
                amount: round2(validate::amount(line.amount, "charge amount")?),
            });
        }
        let discounts = Discounts {
            medication: round2(validate::amount(req.discounts.medication, "medication discount")?),
            room_service: round2(validate::amount(
                req.discounts.room_service,
                "room service discount",
            )?),
            consultancy: round2(validate::amount(
                req.discounts.consultancy,
                "consultancy discount",
            )?),
        };

        let tx = self.db.write_transaction()?;
        if bills::bill_no_exists(&tx, &final_bill_no)? {
            return Err(Error::Conflict(format!(
                "final bill number {final_bill_no} already used"
            )));
        }
        let DischargeWorkup {
            visit,
            bed,
            transactions,
        } = workup(&tx, &req.patient_uhid)?;
        if bills::active_bill_for(&tx, &visit.uhid, &visit.regno)?.is_some() {
            return Err(Error::Conflict(format!(
                "an active bill already exists for UHID {} visit {}",
                visit.uhid, visit.regno
            )));
        }

        let breakdown: Vec<TransactionLine> = transactions
            .iter()
            .map(|t| TransactionLine {
                transaction_no: t.transaction_no.clone(),
                transaction_date: t.transaction_date.clone(),
                payment_mode: t.payment_mode,
                amount: t.amount,
            })
            .collect();

        let charge_sum: rust_decimal::Decimal = charges.iter().map(|c| c.amount).sum();
        let total_charges = round2(visit.reg_amount + charge_sum);
        let total_discount = round2(discounts.total());
        let net_amount = round2(total_charges - total_discount);
        let total_paid = round2(breakdown.iter().map(|t| t.amount).sum());
        let balance = round2(net_amount - total_paid);

        let consultant_doctor = if visit.doctors_in_charge.is_empty() {
            None
        } else {
            Some(visit.doctors_in_charge.join(", "))
        };

        let mut bill = FinalBill {
            id: None,
            final_bill_no,
            patient_uhid: visit.uhid,
            patient_regno: visit.regno,
            patient_name: visit.full_name,
            age: visit.age,
            gender: visit.sex,
            admission_date: visit.date_of_reg,
            admission_time: Some(visit.time_of_reg),
            discharge_date,
            discharge_time,
            consultant_doctor,
            room_type: req.room_type.or_else(|| {
                bed.as_ref().map(|b| b.department.clone())
            }),
            bed_no: bed.map(|b| b.bed_number),
            reg_amount: visit.reg_amount,
            charges_summary: charges,
            transaction_breakdown: breakdown,
            medication_discount: discounts.medication,
            room_service_discount: discounts.room_service,
            consultancy_charges_discount: discounts.consultancy,
            total_charges,
            total_discount,
            net_amount,
            total_paid,
            balance,
            created_by,
            status: RecordStatus::Active,
            cancelled_by: None,
        };
        let id = bills::insert_bill(&tx, &bill)?;
        tx.commit().map_err(DbError::from)?;

        bill.id = Some(id);
        info!(
            final_bill_no = %bill.final_bill_no,
            uhid = %bill.patient_uhid,
            regno = %bill.patient_regno,
            net = %bill.net_amount,
            balance = %bill.balance,
            "generated final bill"
        );
        Ok(bill)
    }

    /// Cancel a bill by its number. Cancelling twice is a conflict.
    pub fn cancel_bill(&mut self, final_bill_no: &str, cancelled_by: &str) -> DeskResult<FinalBill> {
        let cancelled_by = validate::required(cancelled_by, "cancelled_by")?;

        let tx = self.db.write_transaction()?;
        let bill = bills::bill_by_no(&tx, final_bill_no)?
            .ok_or_else(|| Error::NotFound(format!("final bill {final_bill_no} not found")))?;
        if bill.status == RecordStatus::Cancelled {
            return Err(Error::Conflict(format!(
                "final bill {final_bill_no} is already cancelled"
            )));
        }
        bills::mark_bill_cancelled(&tx, final_bill_no, &cancelled_by)?;
        tx.commit().map_err(DbError::from)?;

        info!(final_bill_no, cancelled_by = %cancelled_by, "cancelled final bill");
        Ok(FinalBill {
            status: RecordStatus::Cancelled,
            cancelled_by: Some(cancelled_by),
            ..bill
        })
    }
}
