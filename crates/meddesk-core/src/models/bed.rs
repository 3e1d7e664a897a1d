//! Bed allotment models.

use serde::{Deserialize, Serialize};

/// Bed allocation status. A UHID holds at most one ACTIVE bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BedStatus {
    Active,
    Released,
}

impl BedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedStatus::Active => "ACTIVE",
            BedStatus::Released => "RELEASED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(BedStatus::Active),
            "RELEASED" => Some(BedStatus::Released),
            _ => None,
        }
    }
}

/// A bed assigned to a patient, keyed by UHID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedAllocation {
    /// Row id, assigned on insert.
    pub bed_id: Option<i64>,
    pub uhid: String,
    /// Name snapshot from the latest visit at allotment time.
    pub patient_name: String,
    pub department: String,
    pub bed_number: String,
    pub status: BedStatus,
}

/// Bed allotment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedRequest {
    pub uhid: String,
    pub department: String,
    pub bed_number: String,
}
