//! Visit models: one row per registration event.
//!
//! A visit is never mutated. "Editing" a patient appends a new visit row
//! carrying the full demographic snapshot with an incremented regno; the
//! highest regno identifies the current visit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Patient category for a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientType {
    /// Outpatient
    Opd,
    /// Inpatient
    Ipd,
    /// Day-care admission
    Daycare,
}

impl PatientType {
    /// Canonical uppercase form used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientType::Opd => "OPD",
            PatientType::Ipd => "IPD",
            PatientType::Daycare => "DAYCARE",
        }
    }

    /// Parse the canonical uppercase form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPD" => Some(PatientType::Opd),
            "IPD" => Some(PatientType::Ipd),
            "DAYCARE" => Some(PatientType::Daycare),
            _ => None,
        }
    }

    /// All categories, in reporting order.
    pub const ALL: [PatientType; 3] = [PatientType::Opd, PatientType::Ipd, PatientType::Daycare];
}

/// Postal address snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
}

/// One registration event, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Row id, assigned on insert.
    pub id: Option<i64>,
    /// `YYMM` + 4-digit monthly serial; stable across all visits of a patient.
    pub uhid: String,
    /// Per-UHID sequence number, zero-padded to 3 digits, starting at `001`.
    pub regno: String,
    pub aadhaar_no: Option<String>,
    pub title: Option<String>,
    pub full_name: String,
    pub sex: Option<String>,
    pub mobile: Option<String>,
    /// Registration date, `YYYY-MM-DD` (IST).
    pub date_of_reg: String,
    /// Registration time, 12-hour `HH:MM:SS AM/PM` (IST).
    pub time_of_reg: String,
    pub age: Option<i64>,
    pub patient_type: PatientType,
    pub empanelment: Option<String>,
    pub religion: String,
    pub marital_status: String,
    pub father_husband: String,
    pub doctors_in_charge: Vec<String>,
    /// Registration fee charged for this visit.
    pub reg_amount: Decimal,
    pub local_address: Option<Address>,
    pub permanent_address: Option<Address>,
    pub registered_by: String,
}

impl Visit {
    /// Numeric value of the regno, if well-formed.
    pub fn regno_value(&self) -> Option<u32> {
        self.regno.parse().ok()
    }

    /// Whether this visit admits inpatient operations (transaction entry).
    pub fn is_ipd(&self) -> bool {
        self.patient_type == PatientType::Ipd
    }
}

/// Registration request for a brand-new patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub aadhaar_no: Option<String>,
    pub title: Option<String>,
    pub full_name: String,
    pub sex: Option<String>,
    pub mobile: Option<String>,
    /// Defaults to today's IST date when absent.
    pub date_of_reg: Option<String>,
    /// Defaults to the current IST time when absent.
    pub time_of_reg: Option<String>,
    pub age: Option<i64>,
    pub patient_type: PatientType,
    pub empanelment: Option<String>,
    pub religion: String,
    pub marital_status: String,
    pub father_husband: String,
    pub doctors_in_charge: Vec<String>,
    pub reg_amount: Decimal,
    pub local_address: Option<Address>,
    pub permanent_address: Option<Address>,
    pub registered_by: String,
}

/// Filter criteria for registration reports. Absent fields do not
/// constrain; present ones are ANDed together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitFilter {
    pub patient_type: Option<PatientType>,
    /// Inclusive lower bound on `date_of_reg`, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive upper bound on `date_of_reg`, `YYYY-MM-DD`.
    pub date_to: Option<String>,
    /// Substring match against the doctors-in-charge list.
    pub doctor: Option<String>,
    pub empanelment: Option<String>,
}

/// A visit row joined with the discharge stamp of its non-cancelled bill,
/// when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredVisit {
    pub visit: Visit,
    pub discharge_date: Option<String>,
    pub discharge_time: Option<String>,
}

/// Re-registration request for a known patient. Absent fields carry over
/// from the latest visit's snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub aadhaar_no: Option<String>,
    pub title: Option<String>,
    pub full_name: Option<String>,
    pub sex: Option<String>,
    pub mobile: Option<String>,
    pub date_of_reg: Option<String>,
    pub time_of_reg: Option<String>,
    pub age: Option<i64>,
    pub patient_type: Option<PatientType>,
    pub empanelment: Option<String>,
    pub religion: Option<String>,
    pub marital_status: Option<String>,
    pub father_husband: Option<String>,
    pub doctors_in_charge: Option<Vec<String>>,
    pub reg_amount: Option<Decimal>,
    pub local_address: Option<Address>,
    pub permanent_address: Option<Address>,
    pub registered_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_type_round_trip() {
        for pt in PatientType::ALL {
            assert_eq!(PatientType::parse(pt.as_str()), Some(pt));
        }
        assert_eq!(PatientType::parse("ipd"), None);
    }

    #[test]
    fn test_regno_value() {
        let mut visit = sample_visit();
        assert_eq!(visit.regno_value(), Some(3));
        visit.regno = "abc".into();
        assert_eq!(visit.regno_value(), None);
    }

    fn sample_visit() -> Visit {
        Visit {
            id: None,
            uhid: "25060001".into(),
            regno: "003".into(),
            aadhaar_no: None,
            title: None,
            full_name: "Asha Verma".into(),
            sex: Some("F".into()),
            mobile: None,
            date_of_reg: "2025-06-15".into(),
            time_of_reg: "10:00:00 AM".into(),
            age: Some(34),
            patient_type: PatientType::Ipd,
            empanelment: None,
            religion: "Hindu".into(),
            marital_status: "Married".into(),
            father_husband: "R. Verma".into(),
            doctors_in_charge: vec!["Dr. Rao".into()],
            reg_amount: Decimal::new(50000, 2),
            local_address: None,
            permanent_address: None,
            registered_by: "frontdesk1".into(),
        }
    }
}
