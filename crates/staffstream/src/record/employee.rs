use super::{Department, HireDate, Position};
use crate::ParseRecordError;
use core::{fmt, ops::RangeInclusive, str::FromStr};

/// Inclusive range every generated salary is drawn from.
pub const SALARY_RANGE: RangeInclusive<u32> = 45_000..=150_000;

/// Separator between the fields of a formatted record line.
pub const FIELD_DELIMITER: &str = " | ";

/// Separator between a field name and its value.
pub const VALUE_DELIMITER: &str = ": ";

/// A single synthetic employee.
///
/// Records are immutable once generated. The [`Display`](fmt::Display)
/// implementation renders the line that goes out on the wire, and
/// [`FromStr`] parses such a line back.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmployeeRecord {
    id: u32,
    department: Department,
    position: Position,
    salary: u32,
    hire_date: HireDate,
}

impl EmployeeRecord {
    pub const fn new(
        id: u32,
        department: Department,
        position: Position,
        salary: u32,
        hire_date: HireDate,
    ) -> Self {
        Self {
            id,
            department,
            position,
            salary,
            hire_date,
        }
    }

    /// The 1-based ordinal of this record within its set.
    pub const fn id(&self) -> u32 {
        self.id
    }

    pub const fn department(&self) -> Department {
        self.department
    }

    pub const fn position(&self) -> Position {
        self.position
    }

    pub const fn salary(&self) -> u32 {
        self.salary
    }

    pub const fn hire_date(&self) -> HireDate {
        self.hire_date
    }
}

impl fmt::Display for EmployeeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            id,
            department,
            position,
            salary,
            hire_date,
        } = self;

        write!(
            f,
            "ID: {id:05} | Name: {position} {department} Employee {id} | \
             Email: employee{id}@company.com | Department: {department} | \
             Salary: ${} | Hire Date: {hire_date}",
            Thousands(*salary)
        )
    }
}

impl FromStr for EmployeeRecord {
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut id = None;
        let mut name = None;
        let mut department = None;
        let mut salary = None;
        let mut hire_date = None;

        for field in line.split(FIELD_DELIMITER) {
            let Some((key, value)) = field.split_once(VALUE_DELIMITER) else {
                continue;
            };
            match key {
                "ID" => id = Some(value),
                "Name" => name = Some(value),
                "Department" => department = Some(value),
                "Salary" => salary = Some(value),
                "Hire Date" => hire_date = Some(value),
                _ => {}
            }
        }

        let id = id.ok_or(ParseRecordError::MissingField("ID"))?;
        let id = id
            .parse()
            .map_err(|_| ParseRecordError::malformed("ID", id))?;

        let department: Department = department
            .ok_or(ParseRecordError::MissingField("Department"))?
            .parse()?;

        // The name is "<position> <department> Employee <id>".
        let name = name.ok_or(ParseRecordError::MissingField("Name"))?;
        let position: Position = name
            .split_once(' ')
            .map(|(position, _)| position)
            .ok_or_else(|| ParseRecordError::malformed("Name", name))?
            .parse()?;

        let salary = salary.ok_or(ParseRecordError::MissingField("Salary"))?;
        let salary = parse_salary(salary)?;

        let hire_date = hire_date
            .ok_or(ParseRecordError::MissingField("Hire Date"))?
            .parse()?;

        Ok(Self::new(id, department, position, salary, hire_date))
    }
}

fn parse_salary(value: &str) -> Result<u32, ParseRecordError> {
    let digits: String = value
        .strip_prefix('$')
        .ok_or_else(|| ParseRecordError::malformed("Salary", value))?
        .chars()
        .filter(|&c| c != ',')
        .collect();

    digits
        .parse()
        .map_err(|_| ParseRecordError::malformed("Salary", value))
}

/// Renders an integer with `,` thousands separators.
struct Thousands(u32);

impl fmt::Display for Thousands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let lead = digits.len() % 3;

        for (i, c) in digits.chars().enumerate() {
            if i != 0 && (i + 3 - lead) % 3 == 0 {
                f.write_str(",")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
