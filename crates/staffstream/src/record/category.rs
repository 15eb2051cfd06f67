use crate::ParseRecordError;
use core::{fmt, str::FromStr};

/// The department an employee belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Department {
    Engineering,
    Marketing,
    Sales,
    HR,
    Finance,
    Operations,
}

impl Department {
    /// Every department, in the order used for random draws.
    pub const ALL: [Self; 6] = [
        Self::Engineering,
        Self::Marketing,
        Self::Sales,
        Self::HR,
        Self::Finance,
        Self::Operations,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Engineering => "Engineering",
            Self::Marketing => "Marketing",
            Self::Sales => "Sales",
            Self::HR => "HR",
            Self::Finance => "Finance",
            Self::Operations => "Operations",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseRecordError::UnknownDepartment(s.to_string()))
    }
}

/// The seniority or role of an employee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    Manager,
    Senior,
    Junior,
    Lead,
    Director,
    Analyst,
}

impl Position {
    /// Every position, in the order used for random draws.
    pub const ALL: [Self; 6] = [
        Self::Manager,
        Self::Senior,
        Self::Junior,
        Self::Lead,
        Self::Director,
        Self::Analyst,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "Manager",
            Self::Senior => "Senior",
            Self::Junior => "Junior",
            Self::Lead => "Lead",
            Self::Director => "Director",
            Self::Analyst => "Analyst",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseRecordError::UnknownPosition(s.to_string()))
    }
}
