//! Payment transaction models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status shared by transactions and final bills.
/// Cancellation is a status flip, never a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Active,
    Cancelled,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "ACTIVE",
            RecordStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(RecordStatus::Active),
            "CANCELLED" => Some(RecordStatus::Cancelled),
            _ => None,
        }
    }
}

/// Closed set of accepted payment modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Cash,
    Card,
    Upi,
    Cheque,
    Cashless,
    Rtgs,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Card => "CARD",
            PaymentMode::Upi => "UPI",
            PaymentMode::Cheque => "CHEQUE",
            PaymentMode::Cashless => "CASHLESS",
            PaymentMode::Rtgs => "RTGS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(PaymentMode::Cash),
            "CARD" => Some(PaymentMode::Card),
            "UPI" => Some(PaymentMode::Upi),
            "CHEQUE" => Some(PaymentMode::Cheque),
            "CASHLESS" => Some(PaymentMode::Cashless),
            "RTGS" => Some(PaymentMode::Rtgs),
            _ => None,
        }
    }

    /// All accepted modes, for validation messages.
    pub const ALL: [PaymentMode; 6] = [
        PaymentMode::Cash,
        PaymentMode::Card,
        PaymentMode::Upi,
        PaymentMode::Cheque,
        PaymentMode::Cashless,
        PaymentMode::Rtgs,
    ];
}

/// Instrument details for non-cash payments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub bank_name: Option<String>,
    /// Card / cheque / reference number.
    pub instrument_no: Option<String>,
    pub instrument_date: Option<String>,
}

/// A recorded payment, attached to one `(uhid, regno)` visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Row id, assigned on insert.
    pub id: Option<i64>,
    pub patient_uhid: String,
    /// Regno of the visit the payment belongs to; always the latest visit
    /// at the time of entry.
    pub patient_regno: String,
    pub patient_name: String,
    pub admission_date: String,
    pub purpose: String,
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    pub payment_details: Option<PaymentDetails>,
    pub transaction_date: String,
    pub transaction_time: String,
    /// Globally unique transaction number.
    pub transaction_no: String,
    pub created_by: String,
    pub status: RecordStatus,
    pub cancelled_by: Option<String>,
}

impl Transaction {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

/// Payment entry request. The visit it attaches to is resolved from the
/// UHID at entry time; callers never supply a regno.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub patient_uhid: String,
    pub admission_date: String,
    pub purpose: String,
    pub amount: Decimal,
    /// Validated against the closed [`PaymentMode`] set.
    pub payment_mode: String,
    pub payment_details: Option<PaymentDetails>,
    /// Defaults to today's IST date when absent.
    pub transaction_date: Option<String>,
    /// Defaults to the current IST time when absent.
    pub transaction_time: Option<String>,
    pub transaction_no: String,
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_mode_round_trip() {
        for mode in PaymentMode::ALL {
            assert_eq!(PaymentMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(PaymentMode::parse("cash"), None);
        assert_eq!(PaymentMode::parse("BARTER"), None);
    }

    #[test]
    fn test_record_status_round_trip() {
        assert_eq!(RecordStatus::parse("ACTIVE"), Some(RecordStatus::Active));
        assert_eq!(
            RecordStatus::parse("CANCELLED"),
            Some(RecordStatus::Cancelled)
        );
        assert_eq!(RecordStatus::parse("cancelled"), None);
    }
}
