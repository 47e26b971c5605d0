//! Demo patient generation.
//!
//! Randomness is external: callers supply a [`SeedSource`]. The shape of the
//! generated records (status cycle, which patients get a mailing address)
//! depends only on the index.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::models::{Address, DateOfBirth, Patient, PatientStatus};

/// Number of patients created by the "create seed data" action.
pub const DEFAULT_SEED_COUNT: usize = 20;

/// Supplier of fake personal data.
pub trait SeedSource {
    fn first_name(&mut self) -> String;
    fn last_name(&mut self) -> String;
    fn sex(&mut self) -> String;
    fn gender(&mut self) -> String;
    fn phone(&mut self) -> String;
    fn notes(&mut self) -> String;
    fn birthdate(&mut self) -> DateTime<Utc>;
    /// A non-primary address.
    fn address(&mut self) -> Address;
}

/// Status assigned to the `index`-th seeded patient.
pub fn seed_status(index: usize) -> PatientStatus {
    if index % 4 == 0 {
        PatientStatus::Active
    } else if index % 3 == 0 {
        PatientStatus::Inquiry
    } else if index % 2 == 0 {
        PatientStatus::Inactive
    } else {
        PatientStatus::Onboarding
    }
}

/// Generate `count` patients. Every fifth patient (starting with the first)
/// gets a filled-in mailing address; the rest get an empty one.
pub fn generate_seed_data<S: SeedSource + ?Sized>(count: usize, source: &mut S) -> Vec<Patient> {
    (0..count)
        .map(|i| {
            let mut primary = source.address();
            primary.is_primary = true;
            let mailing = if i % 5 == 0 {
                let mut mailing = source.address();
                mailing.is_primary = false;
                mailing
            } else {
                Address::empty(false)
            };

            Patient {
                first_name: source.first_name(),
                middle_name: source.first_name(),
                last_name: source.last_name(),
                sex: source.sex(),
                gender: source.gender(),
                phone: source.phone(),
                notes: source.notes(),
                dob: Some(DateOfBirth::Timestamp(source.birthdate())),
                status: seed_status(i),
                addresses: vec![primary, mailing],
                ..Patient::empty()
            }
        })
        .collect()
}

const FIRST_NAMES: [&str; 8] = [
    "Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Frances", "John",
];
const LAST_NAMES: [&str; 8] = [
    "Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth", "Allen", "Backus",
];
const CITIES: [(&str, &str, &str); 4] = [
    ("Ames", "IA", "50010"),
    ("Portland", "OR", "97201"),
    ("Austin", "TX", "73301"),
    ("Albany", "NY", "12207"),
];
const STREETS: [&str; 4] = ["Main St", "Oak Ave", "Elm Rd", "Cedar Ln"];

/// Deterministic source cycling through fixed tables. Useful for demos and
/// tests where reproducible records matter more than variety.
#[derive(Debug, Clone, Default)]
pub struct FixtureSeedSource {
    tick: usize,
}

impl FixtureSeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> usize {
        let n = self.tick;
        self.tick += 1;
        n
    }
}

impl SeedSource for FixtureSeedSource {
    fn first_name(&mut self) -> String {
        FIRST_NAMES[self.next() % FIRST_NAMES.len()].to_string()
    }

    fn last_name(&mut self) -> String {
        LAST_NAMES[self.next() % LAST_NAMES.len()].to_string()
    }

    fn sex(&mut self) -> String {
        if self.next() % 2 == 0 { "female" } else { "male" }.to_string()
    }

    fn gender(&mut self) -> String {
        ["Woman", "Man", "Non-binary"][self.next() % 3].to_string()
    }

    fn phone(&mut self) -> String {
        format!("555-{:04}", self.next() % 10_000)
    }

    fn notes(&mut self) -> String {
        format!("Seeded record {}.", self.next())
    }

    fn birthdate(&mut self) -> DateTime<Utc> {
        let base = Utc.with_ymd_and_hms(1950, 1, 1, 0, 0, 0).single().unwrap_or_default();
        base + Duration::days((self.next() as i64 * 397) % 20_000)
    }

    fn address(&mut self) -> Address {
        let n = self.next();
        let (city, state, zip) = CITIES[n % CITIES.len()];
        let street = format!("{} {}", 100 + n, STREETS[n % STREETS.len()]);
        Address::new(&street, city, state, zip, false)
    }
}
