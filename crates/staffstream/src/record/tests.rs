use crate::{
    Department, EmployeeRecord, FIELD_DELIMITER, HireDate, ParseRecordError, Position,
    VALUE_DELIMITER,
};

fn sample() -> EmployeeRecord {
    EmployeeRecord::new(
        42,
        Department::Sales,
        Position::Senior,
        123_456,
        HireDate::new(3, 14).unwrap(),
    )
}

#[test]
fn renders_the_wire_line() {
    assert_eq!(
        sample().to_string(),
        "ID: 00042 | Name: Senior Sales Employee 42 | Email: employee42@company.com | \
         Department: Sales | Salary: $123,456 | Hire Date: 2020-03-14"
    );
}

#[test]
fn wide_ids_are_not_truncated() {
    let record = EmployeeRecord::new(
        123_456,
        Department::HR,
        Position::Analyst,
        45_000,
        HireDate::new(12, 28).unwrap(),
    );
    let line = record.to_string();
    assert!(line.starts_with("ID: 123456 | Name: Analyst HR Employee 123456 | "));
    assert!(line.ends_with("Salary: $45,000 | Hire Date: 2020-12-28"));
}

#[test]
fn parses_its_own_output() {
    let record = sample();
    let parsed: EmployeeRecord = record.to_string().parse().unwrap();
    assert_eq!(parsed, record);
}

#[test]
fn fields_split_on_documented_delimiters() {
    let line = sample().to_string();
    let fields: Vec<(&str, &str)> = line
        .split(FIELD_DELIMITER)
        .map(|f| f.split_once(VALUE_DELIMITER).unwrap())
        .collect();

    assert_eq!(
        fields,
        [
            ("ID", "00042"),
            ("Name", "Senior Sales Employee 42"),
            ("Email", "employee42@company.com"),
            ("Department", "Sales"),
            ("Salary", "$123,456"),
            ("Hire Date", "2020-03-14"),
        ]
    );
}

#[test]
fn parse_reports_missing_fields() {
    let err = "ID: 00001 | Department: Sales"
        .parse::<EmployeeRecord>()
        .unwrap_err();
    assert_eq!(err, ParseRecordError::MissingField("Name"));

    let err = "Name: Lead HR Employee 1".parse::<EmployeeRecord>().unwrap_err();
    assert_eq!(err, ParseRecordError::MissingField("ID"));
}

#[test]
fn parse_rejects_unknown_categories() {
    let line = sample().to_string().replace("Department: Sales", "Department: Legal");
    assert_eq!(
        line.parse::<EmployeeRecord>().unwrap_err(),
        ParseRecordError::UnknownDepartment("Legal".to_string())
    );

    let line = sample().to_string().replace("Name: Senior", "Name: Intern");
    assert_eq!(
        line.parse::<EmployeeRecord>().unwrap_err(),
        ParseRecordError::UnknownPosition("Intern".to_string())
    );
}

#[test]
fn parse_rejects_bad_dates() {
    for bad in ["2021-01-01", "2020-13-01", "2020-02-29", "2020-00-10", "2020-1"] {
        let line = sample().to_string().replace("2020-03-14", bad);
        assert!(
            matches!(
                line.parse::<EmployeeRecord>(),
                Err(ParseRecordError::MalformedField {
                    field: "Hire Date",
                    ..
                })
            ),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn hire_date_bounds() {
    assert!(HireDate::new(1, 1).is_some());
    assert!(HireDate::new(12, 28).is_some());
    assert!(HireDate::new(0, 1).is_none());
    assert!(HireDate::new(13, 1).is_none());
    assert!(HireDate::new(2, 29).is_none());
    assert!(HireDate::new(6, 0).is_none());
    assert_eq!(HireDate::new(7, 4).unwrap().year(), 2020);
}

#[test]
fn categories_round_trip_through_str() {
    for d in Department::ALL {
        assert_eq!(d.as_str().parse::<Department>().unwrap(), d);
    }
    for p in Position::ALL {
        assert_eq!(p.as_str().parse::<Position>().unwrap(), p);
    }
}
