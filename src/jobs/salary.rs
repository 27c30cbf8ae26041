//! Salary text normalization.
//!
//! Turns strings like `"$45,000 - $60,000 a year"` into digit-only bounds and a
//! canonical pay period.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Placeholder written for any field that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

// "$A - $B <unit>" where the dash may be a hyphen or an en dash.
static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$([\d,]+(?:\.\d+)?)\s*[–-]\s*\$([\d,]+(?:\.\d+)?)\s*(?:per\s+|an?\s+)?([a-z\s]+)")
        .expect("salary range pattern is valid")
});

static FIXED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$([\d,]+(?:\.\d+)?)\s*(?:per\s+|an?\s+)?([a-z\s]+)")
        .expect("fixed salary pattern is valid")
});

/// Keyword → unit, tried in this order; the first keyword contained in the
/// raw phrase wins.
const UNIT_KEYWORDS: &[(&str, SalaryUnit)] = &[
    ("year", SalaryUnit::Year),
    ("annually", SalaryUnit::Year),
    ("month", SalaryUnit::Month),
    ("monthly", SalaryUnit::Month),
    ("week", SalaryUnit::Week),
    ("weekly", SalaryUnit::Week),
    ("day", SalaryUnit::Day),
    ("daily", SalaryUnit::Day),
    ("hour", SalaryUnit::Hour),
    ("hourly", SalaryUnit::Hour),
    ("per hour", SalaryUnit::Hour),
    ("per year", SalaryUnit::Year),
    ("per month", SalaryUnit::Month),
    ("per week", SalaryUnit::Week),
    ("per day", SalaryUnit::Day),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalaryUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Other,
    /// No amount was found, or the amount had no unit phrase after it.
    NotAvailable,
}

impl SalaryUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryUnit::Year => "year",
            SalaryUnit::Month => "month",
            SalaryUnit::Week => "week",
            SalaryUnit::Day => "day",
            SalaryUnit::Hour => "hour",
            SalaryUnit::Other => "other",
            SalaryUnit::NotAvailable => NOT_AVAILABLE,
        }
    }

    /// Maps a lower-cased unit phrase to a canonical unit by keyword lookup.
    /// Returns `None` when no keyword occurs in the phrase.
    pub fn from_phrase(phrase: &str) -> Option<SalaryUnit> {
        UNIT_KEYWORDS
            .iter()
            .find(|(keyword, _)| phrase.contains(keyword))
            .map(|(_, unit)| *unit)
    }
}

impl fmt::Display for SalaryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSalary {
    pub min: String,
    pub max: String,
    /// Set only when the text carried a single amount rather than a range.
    pub fixed: Option<String>,
    pub unit: SalaryUnit,
    /// Lower-cased, trimmed phrase that followed the amount(s).
    pub unit_raw: Option<String>,
}

impl NormalizedSalary {
    pub fn not_available() -> Self {
        NormalizedSalary {
            min: NOT_AVAILABLE.to_string(),
            max: NOT_AVAILABLE.to_string(),
            fixed: None,
            unit: SalaryUnit::NotAvailable,
            unit_raw: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.min != NOT_AVAILABLE
    }
}

fn strip_separators(amount: &str) -> String {
    amount.replace(',', "")
}

/// Normalizes a raw salary string.
///
/// A range match is tried first, then a single amount. Text with neither
/// yields the `N/A` triple. An unknown unit phrase maps to
/// [`SalaryUnit::Other`] and is logged as a warning.
pub fn normalize_salary(text: &str) -> NormalizedSalary {
    let mut salary = NormalizedSalary::not_available();

    let unit_raw = if let Some(caps) = RANGE_RE.captures(text) {
        salary.min = strip_separators(&caps[1]);
        salary.max = strip_separators(&caps[2]);
        caps[3].trim().to_lowercase()
    } else if let Some(caps) = FIXED_RE.captures(text) {
        let amount = strip_separators(&caps[1]);
        salary.min = amount.clone();
        salary.max = amount.clone();
        salary.fixed = Some(amount);
        caps[2].trim().to_lowercase()
    } else {
        return salary;
    };

    if unit_raw.is_empty() {
        return salary;
    }

    salary.unit = match SalaryUnit::from_phrase(&unit_raw) {
        Some(unit) => unit,
        None => {
            tracing::warn!("Unrecognized salary unit '{}' in salary text '{}'", unit_raw, text);
            SalaryUnit::Other
        }
    };
    salary.unit_raw = Some(unit_raw);
    salary
}
