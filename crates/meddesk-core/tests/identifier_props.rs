//! Property tests for identifier generation and money rounding.

use meddesk_core::{
    money, Database, FixedClock, FrontDesk, NewPatient, PatientType, PatientUpdate,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

fn patient(n: u32) -> NewPatient {
    NewPatient {
        aadhaar_no: None,
        title: None,
        full_name: format!("Patient {n}"),
        sex: None,
        mobile: None,
        date_of_reg: None,
        time_of_reg: None,
        age: None,
        patient_type: PatientType::Opd,
        empanelment: None,
        religion: "Hindu".into(),
        marital_status: "Single".into(),
        father_husband: "Father".into(),
        doctors_in_charge: vec![],
        reg_amount: Decimal::from_str("200.00").unwrap(),
        local_address: None,
        permanent_address: None,
        registered_by: "desk".into(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// However many registrations happen in a month, UHIDs come out
    /// eight digits wide, dense, and strictly increasing.
    #[test]
    fn uhid_serials_are_dense_and_fixed_width(count in 1u32..40) {
        let db = Database::open_in_memory().unwrap();
        let mut desk = FrontDesk::with_clock(db, FixedClock::at(2025, 6, 15, 10, 0, 0));

        let mut last_serial = 0u32;
        for n in 0..count {
            let visit = desk.register_patient(patient(n)).unwrap();
            prop_assert_eq!(visit.uhid.len(), 8);
            prop_assert!(visit.uhid.starts_with("2506"));
            let serial: u32 = visit.uhid[4..].parse().unwrap();
            prop_assert_eq!(serial, last_serial + 1);
            last_serial = serial;
        }
    }

    /// Repeated re-registrations yield dense three-digit regnos.
    #[test]
    fn regnos_are_dense_and_fixed_width(count in 1u32..20) {
        let db = Database::open_in_memory().unwrap();
        let mut desk = FrontDesk::with_clock(db, FixedClock::at(2025, 6, 15, 10, 0, 0));

        let uhid = desk.register_patient(patient(0)).unwrap().uhid;
        for n in 1..=count {
            let visit = desk.update_patient(&uhid, PatientUpdate::default()).unwrap();
            prop_assert_eq!(visit.regno.len(), 3);
            prop_assert_eq!(visit.regno_value(), Some(n + 1));
        }
    }

    /// Rounding is idempotent and always lands on two decimal places.
    #[test]
    fn round2_is_idempotent(units in -10_000_000i64..10_000_000, scale in 0u32..6) {
        let value = Decimal::new(units, scale);
        let rounded = money::round2(value);
        prop_assert_eq!(rounded.scale(), 2);
        prop_assert_eq!(money::round2(rounded), rounded);
        // Never off by more than half a paisa.
        let diff = (value - rounded).abs();
        prop_assert!(diff <= Decimal::new(5, 3));
    }
}
