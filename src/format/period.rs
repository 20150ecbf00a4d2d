use chrono::Month;
use serde::{Serialize, Serializer};
use std::fmt;

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A chart axis tick: zero-based position and its label.
pub type Tick = (usize, String);

/// Error returned for malformed period codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    /// Length other than 4 (`YYYY`) or 6 (`YYYYMM`).
    InvalidLength(String),
    /// Contains something other than ASCII digits.
    NotNumeric(String),
    /// Month component outside `01..=12`.
    InvalidMonth(String),
    /// A month-only operation was given a year code.
    NotAMonth(String),
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength(code) => {
                write!(f, "Invalid period '{code}': expected YYYY or YYYYMM")
            }
            Self::NotNumeric(code) => write!(f, "Invalid period '{code}': not numeric"),
            Self::InvalidMonth(code) => {
                write!(f, "Invalid period '{code}': month must be 01 to 12")
            }
            Self::NotAMonth(code) => write!(f, "Period '{code}' is not a YYYYMM month"),
        }
    }
}

impl std::error::Error for PeriodError {}

/// Report granularity, derived from the period code length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodMode {
    /// `YYYY`: one data point per month.
    Year,
    /// `YYYYMM`: one data point per day.
    Month,
}

impl PeriodMode {
    /// Length of the period code itself, i.e. the prefix shared by all date
    /// keys belonging to that period.
    pub const fn prefix_len(self) -> usize {
        match self {
            Self::Year => 4,
            Self::Month => 6,
        }
    }

    /// Length of the date keys that hold one data point in this mode.
    pub const fn key_len(self) -> usize {
        match self {
            Self::Year => 6,
            Self::Month => 8,
        }
    }

    /// Highest data point number a key can carry: month 12 or day 31.
    pub const fn max_position(self) -> usize {
        match self {
            Self::Year => 12,
            Self::Month => 31,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
        }
    }
}

/// A validated period code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Period {
    code: String,
    year: i32,
    month: Option<u32>,
}

impl Period {
    pub fn parse(code: &str) -> Result<Self, PeriodError> {
        if code.len() != 4 && code.len() != 6 {
            return Err(PeriodError::InvalidLength(code.to_string()));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PeriodError::NotNumeric(code.to_string()));
        }
        let year = code[..4]
            .parse()
            .map_err(|_| PeriodError::NotNumeric(code.to_string()))?;
        let month = if code.len() == 6 {
            let month: u32 = code[4..]
                .parse()
                .map_err(|_| PeriodError::NotNumeric(code.to_string()))?;
            if !(1..=12).contains(&month) {
                return Err(PeriodError::InvalidMonth(code.to_string()));
            }
            Some(month)
        } else {
            None
        };
        Ok(Self {
            code: code.to_string(),
            year,
            month,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    pub const fn month(&self) -> Option<u32> {
        self.month
    }

    pub const fn mode(&self) -> PeriodMode {
        if self.month.is_some() {
            PeriodMode::Month
        } else {
            PeriodMode::Year
        }
    }

    /// "2012" for years, "March 2012" for months.
    pub fn label(&self) -> String {
        self.month.map_or_else(
            || self.code.clone(),
            |month| format!("{} {}", month_name(month), &self.code[..4]),
        )
    }

    /// X axis ticks for the overview chart.
    pub fn ticks(&self) -> Vec<Tick> {
        match self.month {
            Some(month) => days_in_month(self.year, month).map_or_else(Vec::new, day_ticks),
            None => year_ticks(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code)
    }
}

/// Gregorian leap year rule.
pub const fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` (1-based) of `year`, or `None` when `month` is
/// outside `1..=12`.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let days = *DAYS_IN_MONTH.get(usize::try_from(month.checked_sub(1)?).ok()?)?;
    Some(if month == 2 && is_leap_year(year) {
        days + 1
    } else {
        days
    })
}

/// Full English name of a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or("", |m| m.name())
}

/// Human label for a period code: the year itself, or "<Month> <YYYY>".
pub fn period_label(period: &str) -> Result<String, PeriodError> {
    Period::parse(period).map(|p| p.label())
}

/// One tick per day of a `YYYYMM` month, labelled "1", "2", ...
pub fn month_ticks(yyyymm: &str) -> Result<Vec<Tick>, PeriodError> {
    let period = Period::parse(yyyymm)?;
    let month = period
        .month()
        .ok_or_else(|| PeriodError::NotAMonth(yyyymm.to_string()))?;
    days_in_month(period.year(), month)
        .map(day_ticks)
        .ok_or_else(|| PeriodError::InvalidMonth(yyyymm.to_string()))
}

/// Twelve ticks, "jan" to "dec", for year mode.
pub fn year_ticks() -> Vec<Tick> {
    (1..=12u32)
        .map(|m| (m as usize - 1, month_name(m)[..3].to_lowercase()))
        .collect()
}

fn day_ticks(n_days: u32) -> Vec<Tick> {
    (0..n_days as usize).map(|i| (i, (i + 1).to_string())).collect()
}
