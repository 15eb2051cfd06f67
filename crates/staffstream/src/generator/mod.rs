//! Synthetic record generation.
//!
//! A [`RecordGenerator`] owns a random source and turns it into a
//! [`RecordSet`]. Any [`rand::Rng`] works, which keeps normal operation
//! randomized while tests plug in a seeded [`StdRng`].

#[cfg(test)]
mod tests;

use crate::{
    Department, EmployeeRecord, HireDate, MAX_HIRE_DAY, Position, RecordSet, SALARY_RANGE,
};
use rand::{Rng, SeedableRng, rngs::StdRng, rngs::ThreadRng};

/// Number of records a service generates when nothing else is configured.
pub const DEFAULT_RECORD_COUNT: u32 = 10_000;

/// Builds [`RecordSet`]s from a random source.
///
/// Ids are assigned sequentially starting at 1. Department, position, salary
/// and hire date are each drawn independently and uniformly.
#[derive(Debug)]
pub struct RecordGenerator<R> {
    rng: R,
}

impl<R: Rng> RecordGenerator<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generates exactly `count` records with ids `1..=count`.
    pub fn generate(&mut self, count: u32) -> RecordSet {
        let records = (1..=count).map(|id| self.next_record(id)).collect();
        RecordSet::from_records(records)
    }

    fn next_record(&mut self, id: u32) -> EmployeeRecord {
        let department = Department::ALL[self.rng.random_range(0..Department::ALL.len())];
        let position = Position::ALL[self.rng.random_range(0..Position::ALL.len())];
        let salary = self.rng.random_range(SALARY_RANGE);
        let month = self.rng.random_range(1..=12);
        let day = self.rng.random_range(1..=MAX_HIRE_DAY);

        let hire_date = HireDate::new_unchecked(month, day);

        EmployeeRecord::new(id, department, position, salary, hire_date)
    }
}

impl RecordGenerator<ThreadRng> {
    /// A generator backed by the thread-local RNG.
    pub fn thread_local() -> Self {
        Self::new(rand::rng())
    }
}

impl RecordGenerator<StdRng> {
    /// A deterministic generator: the same seed always yields the same
    /// records.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl RecordSet {
    /// Generates `count` records from the thread-local RNG.
    pub fn generate(count: u32) -> Self {
        RecordGenerator::thread_local().generate(count)
    }

    /// Generates `count` records reproducibly from `seed`.
    pub fn generate_seeded(count: u32, seed: u64) -> Self {
        RecordGenerator::seeded(seed).generate(count)
    }
}
