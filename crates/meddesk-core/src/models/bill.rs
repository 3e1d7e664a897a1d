//! Final (discharge) bill models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{PaymentMode, RecordStatus};

/// One line in the charges summary of a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeLine {
    pub description: String,
    pub amount: Decimal,
}

/// One line in the transaction breakdown of a bill, snapshotted from an
/// ACTIVE transaction at billing time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    pub transaction_no: String,
    pub transaction_date: String,
    pub payment_mode: PaymentMode,
    pub amount: Decimal,
}

/// Category discounts applied to a bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discounts {
    pub medication: Decimal,
    pub room_service: Decimal,
    pub consultancy: Decimal,
}

impl Discounts {
    pub fn total(&self) -> Decimal {
        self.medication + self.room_service + self.consultancy
    }
}

/// Consolidated discharge invoice for one `(uhid, regno)` visit.
///
/// Embeds a full snapshot of demographics, charges, and payments; at most
/// one ACTIVE bill exists per visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalBill {
    /// Row id, assigned on insert.
    pub id: Option<i64>,
    pub final_bill_no: String,
    pub patient_uhid: String,
    pub patient_regno: String,
    pub patient_name: String,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub admission_date: String,
    pub admission_time: Option<String>,
    pub discharge_date: String,
    pub discharge_time: String,
    pub consultant_doctor: Option<String>,
    pub room_type: Option<String>,
    pub bed_no: Option<String>,
    /// Registration fee of the billed visit.
    pub reg_amount: Decimal,
    pub charges_summary: Vec<ChargeLine>,
    pub transaction_breakdown: Vec<TransactionLine>,
    pub medication_discount: Decimal,
    pub room_service_discount: Decimal,
    pub consultancy_charges_discount: Decimal,
    /// Reg amount plus all charge lines.
    pub total_charges: Decimal,
    pub total_discount: Decimal,
    /// `total_charges - total_discount`.
    pub net_amount: Decimal,
    /// Sum of ACTIVE transaction amounts for the visit.
    pub total_paid: Decimal,
    /// `net_amount - total_paid`.
    pub balance: Decimal,
    pub created_by: String,
    pub status: RecordStatus,
    pub cancelled_by: Option<String>,
}

impl FinalBill {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

/// Discharge billing request. Demographics, payments, and bed details are
/// pulled from the records; the caller supplies only the bill number,
/// itemized charges, discounts, and discharge timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRequest {
    pub final_bill_no: String,
    pub patient_uhid: String,
    /// Defaults to today's IST date when absent.
    pub discharge_date: Option<String>,
    /// Defaults to the current IST time when absent.
    pub discharge_time: Option<String>,
    /// Overrides the bed's department as the displayed room type.
    pub room_type: Option<String>,
    pub charges: Vec<ChargeLine>,
    pub discounts: Discounts,
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_discount_total() {
        let discounts = Discounts {
            medication: Decimal::from_str("100.50").unwrap(),
            room_service: Decimal::from_str("49.50").unwrap(),
            consultancy: Decimal::ZERO,
        };
        assert_eq!(discounts.total(), Decimal::from_str("150.00").unwrap());
    }
}
