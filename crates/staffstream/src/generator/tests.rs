use crate::{
    DEFAULT_RECORD_COUNT, Department, EmployeeRecord, MAX_HIRE_DAY, Position, RecordGenerator,
    RecordSet, SALARY_RANGE,
};
use rand::{SeedableRng, rngs::StdRng};
use std::collections::HashSet;

#[test]
fn generates_exactly_the_requested_count() {
    for count in [0, 1, 2, 17, 1_000] {
        let set = RecordSet::generate_seeded(count, 1);
        assert_eq!(set.len(), count as usize);
    }
}

#[test]
fn ids_are_sequential_from_one() {
    let set = RecordSet::generate_seeded(DEFAULT_RECORD_COUNT, 99);
    for (i, record) in set.iter().enumerate() {
        assert_eq!(record.id() as usize, i + 1);
    }
}

#[test]
fn fields_stay_within_bounds() {
    let set = RecordSet::generate_seeded(DEFAULT_RECORD_COUNT, 3);

    for record in &set {
        assert!(SALARY_RANGE.contains(&record.salary()), "{record}");
        assert!(Department::ALL.contains(&record.department()));
        assert!(Position::ALL.contains(&record.position()));

        let date = record.hire_date();
        assert_eq!(date.year(), 2020);
        assert!((1..=12).contains(&date.month()));
        assert!((1..=MAX_HIRE_DAY).contains(&date.day()));
    }
}

#[test]
fn draws_cover_every_category() {
    let set = RecordSet::generate_seeded(DEFAULT_RECORD_COUNT, 11);

    let departments: HashSet<_> = set.iter().map(EmployeeRecord::department).collect();
    let positions: HashSet<_> = set.iter().map(EmployeeRecord::position).collect();
    assert_eq!(departments.len(), Department::ALL.len());
    assert_eq!(positions.len(), Position::ALL.len());

    let months: HashSet<_> = set.iter().map(|r| r.hire_date().month()).collect();
    assert_eq!(months.len(), 12);
}

#[test]
fn same_seed_same_records() {
    let a = RecordSet::generate_seeded(500, 1234);
    let b = RecordGenerator::new(StdRng::seed_from_u64(1234)).generate(500);
    assert_eq!(a, b);

    let c = RecordSet::generate_seeded(500, 4321);
    assert_ne!(a, c);
}

#[test]
fn unseeded_generation_is_well_formed() {
    let set = RecordSet::generate(100);
    assert_eq!(set.len(), 100);
    assert_eq!(set.get(99).map(EmployeeRecord::id), Some(100));
}

#[test]
fn every_line_round_trips() {
    let set = RecordSet::generate_seeded(2_000, 5);
    for record in &set {
        let parsed: EmployeeRecord = record.to_string().parse().unwrap();
        assert_eq!(&parsed, record);
    }
}
