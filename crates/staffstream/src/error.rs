/// Errors produced when parsing a formatted record line back into an
/// [`EmployeeRecord`](crate::EmployeeRecord).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseRecordError {
    /// A required `Name: value` field is absent from the line.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A field is present but its value could not be interpreted.
    #[error("malformed `{field}` value: {value:?}")]
    MalformedField { field: &'static str, value: String },

    /// The department is not one of the known departments.
    #[error("unknown department: {0:?}")]
    UnknownDepartment(String),

    /// The position is not one of the known positions.
    #[error("unknown position: {0:?}")]
    UnknownPosition(String),
}

impl ParseRecordError {
    pub(crate) fn malformed(field: &'static str, value: &str) -> Self {
        Self::MalformedField {
            field,
            value: value.to_string(),
        }
    }
}
