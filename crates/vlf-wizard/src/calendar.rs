//! Report date fields.

use chrono::{Datelike, NaiveDate};

/// Spanish month names, January first.
pub const MONTHS_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Source of the current date.
pub trait Clock {
    /// Today's date.
    fn today(&self) -> NaiveDate;
}

/// The local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Day, month name and year of a date, as written in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParts {
    /// Day of month, 1-31.
    pub day: u32,
    /// Spanish month name.
    pub month: &'static str,
    /// Calendar year.
    pub year: i32,
}

/// Split `date` into report fields.
#[must_use]
pub fn date_parts(date: NaiveDate) -> DateParts {
    // month0 is always 0..12
    let month = MONTHS_ES[date.month0() as usize % MONTHS_ES.len()];
    DateParts {
        day: date.day(),
        month,
        year: date.year(),
    }
}
