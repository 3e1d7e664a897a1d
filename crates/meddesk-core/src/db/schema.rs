//! SQLite schema definition.

/// Complete database schema for the front-desk record-keeper.
///
/// Currency columns hold canonical two-decimal strings, never REAL.
/// UHID/regno are fixed-width zero-padded numeric strings, so the
/// descending text scans below coincide with numeric order.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Visits (append-only; one row per registration event)
-- ============================================================================

CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uhid TEXT NOT NULL,
    regno TEXT NOT NULL,
    aadhaar_no TEXT,
    title TEXT,
    full_name TEXT NOT NULL,
    sex TEXT,
    mobile TEXT,
    date_of_reg TEXT NOT NULL,
    time_of_reg TEXT NOT NULL,
    age INTEGER,
    patient_type TEXT NOT NULL CHECK (patient_type IN ('OPD', 'IPD', 'DAYCARE')),
    empanelment TEXT,
    religion TEXT NOT NULL,
    marital_status TEXT NOT NULL,
    father_husband TEXT NOT NULL,
    doctors_in_charge TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    reg_amount TEXT NOT NULL,                       -- 2-dp decimal string
    local_address TEXT,                             -- JSON object
    permanent_address TEXT,                         -- JSON object
    registered_by TEXT NOT NULL,
    UNIQUE (uhid, regno)
);

CREATE INDEX IF NOT EXISTS idx_visits_uhid ON visits(uhid);
CREATE INDEX IF NOT EXISTS idx_visits_mobile ON visits(mobile);
CREATE INDEX IF NOT EXISTS idx_visits_date_type ON visits(date_of_reg, patient_type);

-- ============================================================================
-- Transactions (status flips only, never deleted)
-- ============================================================================

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_uhid TEXT NOT NULL,
    patient_regno TEXT NOT NULL,
    patient_name TEXT NOT NULL,
    admission_date TEXT NOT NULL,
    purpose TEXT NOT NULL,
    amount TEXT NOT NULL,                           -- 2-dp decimal string
    payment_mode TEXT NOT NULL
        CHECK (payment_mode IN ('CASH', 'CARD', 'UPI', 'CHEQUE', 'CASHLESS', 'RTGS')),
    payment_details TEXT,                           -- JSON object
    transaction_date TEXT NOT NULL,
    transaction_time TEXT NOT NULL,
    transaction_no TEXT NOT NULL UNIQUE,
    created_by TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'ACTIVE' CHECK (status IN ('ACTIVE', 'CANCELLED')),
    cancelled_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_transactions_visit
    ON transactions(patient_uhid, patient_regno, status);

-- ============================================================================
-- Bed Allocations
-- ============================================================================

CREATE TABLE IF NOT EXISTS bed_allocations (
    bed_id INTEGER PRIMARY KEY AUTOINCREMENT,
    uhid TEXT NOT NULL,
    patient_name TEXT NOT NULL,
    department TEXT NOT NULL,
    bed_number TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'ACTIVE' CHECK (status IN ('ACTIVE', 'RELEASED'))
);

CREATE INDEX IF NOT EXISTS idx_beds_uhid ON bed_allocations(uhid, status);

-- ============================================================================
-- Final Bills
-- ============================================================================

-- The one-ACTIVE-bill-per-visit rule is checked before insert rather than
-- expressed as a unique index, so cancelled bills never block a new bill.
CREATE TABLE IF NOT EXISTS final_bills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    final_bill_no TEXT NOT NULL,
    patient_uhid TEXT NOT NULL,
    patient_regno TEXT NOT NULL,
    patient_name TEXT NOT NULL,
    age INTEGER,
    gender TEXT,
    admission_date TEXT NOT NULL,
    admission_time TEXT,
    discharge_date TEXT NOT NULL,
    discharge_time TEXT NOT NULL,
    consultant_doctor TEXT,
    room_type TEXT,
    bed_no TEXT,
    reg_amount TEXT NOT NULL,
    charges_summary TEXT NOT NULL DEFAULT '[]',     -- JSON array of ChargeLine
    transaction_breakdown TEXT NOT NULL DEFAULT '[]', -- JSON array of TransactionLine
    medication_discount TEXT NOT NULL,
    room_service_discount TEXT NOT NULL,
    consultancy_charges_discount TEXT NOT NULL,
    total_charges TEXT NOT NULL,
    total_discount TEXT NOT NULL,
    net_amount TEXT NOT NULL,
    total_paid TEXT NOT NULL,
    balance TEXT NOT NULL,
    created_by TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'ACTIVE' CHECK (status IN ('ACTIVE', 'CANCELLED')),
    cancelled_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_bills_no ON final_bills(final_bill_no);
CREATE INDEX IF NOT EXISTS idx_bills_visit
    ON final_bills(patient_uhid, patient_regno, status);
CREATE INDEX IF NOT EXISTS idx_bills_discharge ON final_bills(discharge_date);
"#;
