use crate::ParseRecordError;
use core::{fmt, str::FromStr};

/// The calendar year every synthetic hire date falls in.
pub const HIRE_YEAR: u16 = 2020;

/// Highest day-of-month ever generated. Every month has at least 28 days, so
/// no generated date is invalid.
pub const MAX_HIRE_DAY: u8 = 28;

/// A hire date within [`HIRE_YEAR`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HireDate {
    month: u8,
    day: u8,
}

impl HireDate {
    /// Returns `None` unless `month` is in `1..=12` and `day` in
    /// `1..=MAX_HIRE_DAY`.
    pub const fn new(month: u8, day: u8) -> Option<Self> {
        if month >= 1 && month <= 12 && day >= 1 && day <= MAX_HIRE_DAY {
            Some(Self { month, day })
        } else {
            None
        }
    }

    /// Caller guarantees the same bounds [`HireDate::new`] checks.
    pub(crate) const fn new_unchecked(month: u8, day: u8) -> Self {
        debug_assert!(month >= 1 && month <= 12 && day >= 1 && day <= MAX_HIRE_DAY);
        Self { month, day }
    }

    pub const fn year(&self) -> u16 {
        HIRE_YEAR
    }

    pub const fn month(&self) -> u8 {
        self.month
    }

    pub const fn day(&self) -> u8 {
        self.day
    }
}

impl fmt::Display for HireDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{HIRE_YEAR}-{:02}-{:02}", self.month, self.day)
    }
}

impl FromStr for HireDate {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseRecordError::malformed("Hire Date", s);

        let mut parts = s.splitn(3, '-');
        let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if year.parse::<u16>().map_err(|_| malformed())? != HIRE_YEAR {
            return Err(malformed());
        }
        let month = month.parse().map_err(|_| malformed())?;
        let day = day.parse().map_err(|_| malformed())?;

        Self::new(month, day).ok_or_else(malformed)
    }
}
