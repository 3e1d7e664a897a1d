//! Registration reports: daily counts for the dashboard and filtered
//! patient listings.

use chrono::Duration;
use serde::Serialize;

use crate::clock::Clock;
use crate::db::Database;
use crate::models::{FilteredVisit, PatientType, VisitFilter};
use crate::{validate, DeskResult, Error};

/// Registrations by category plus discharges for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCounts {
    /// `YYYY-MM-DD` (IST).
    pub date: String,
    pub opd: i64,
    pub ipd: i64,
    pub daycare: i64,
    pub discharged: i64,
}

pub struct Insights<'a, C: Clock> {
    db: &'a Database,
    clock: &'a C,
}

impl<'a, C: Clock> Insights<'a, C> {
    pub fn new(db: &'a Database, clock: &'a C) -> Self {
        Self { db, clock }
    }

    /// Today's registration and discharge counts.
    pub fn today(&self) -> DeskResult<DailyCounts> {
        self.counts_for(&self.clock.date_string())
    }

    /// Daily counts for the trailing `days` days, oldest first; today is
    /// the last element.
    pub fn trailing(&self, days: u32) -> DeskResult<Vec<DailyCounts>> {
        let now = self.clock.now();
        let mut series = Vec::with_capacity(days as usize);
        for offset in (0..i64::from(days)).rev() {
            let date = (now - Duration::days(offset)).format("%Y-%m-%d").to_string();
            series.push(self.counts_for(&date)?);
        }
        Ok(series)
    }

    /// Registrations matching a report filter, newest first, each joined
    /// with the discharge stamp of its non-cancelled bill when billed.
    pub fn filter(&self, filter: &VisitFilter) -> DeskResult<Vec<FilteredVisit>> {
        if let Some(from) = &filter.date_from {
            validate::date_ymd(from, "date_from")?;
        }
        if let Some(to) = &filter.date_to {
            validate::date_ymd(to, "date_to")?;
        }
        let matches = self.db.filter_visits(filter)?;
        if matches.is_empty() {
            return Err(Error::NotFound(
                "no patients found with given filters".into(),
            ));
        }
        Ok(matches)
    }

    fn counts_for(&self, date: &str) -> DeskResult<DailyCounts> {
        Ok(DailyCounts {
            date: date.to_string(),
            opd: self.db.count_visits_on(date, PatientType::Opd)?,
            ipd: self.db.count_visits_on(date, PatientType::Ipd)?,
            daycare: self.db.count_visits_on(date, PatientType::Daycare)?,
            discharged: self.db.count_discharges_on(date)?,
        })
    }
}
