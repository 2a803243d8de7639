// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use carebase_app::{
    AppointmentFormInput, AppointmentStatus, Gender, InvoiceFormInput, MedicationFormInput,
    PatientFormInput, PatientId, PatientStatus, Role, StaffFormInput, StaffId,
};
use std::path::PathBuf;
use time::{Date, Duration, Month, PrimitiveDateTime, Time};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];
const STREET_NAMES: [&str; 10] = [
    "Maple", "Oak", "Cedar", "Elm", "Pine", "Birch", "Willow", "Aspen", "Spruce", "Juniper",
];
const STREET_SUFFIXES: [&str; 5] = ["St", "Ave", "Ln", "Dr", "Way"];
const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
const ALLERGIES: [&str; 6] = ["", "", "", "Penicillin", "Latex", "Peanuts"];
const DEPARTMENTS: [&str; 8] = [
    "General Medicine",
    "Cardiology",
    "Pediatrics",
    "Orthopedics",
    "Emergency",
    "Pharmacy",
    "Pathology",
    "Imaging",
];
const VISIT_KINDS: [&str; 4] = ["Consultation", "Follow-up", "Check-up", "Review"];
const VISIT_REASONS: [&str; 6] = [
    "Persistent cough",
    "Blood pressure review",
    "Annual physical",
    "Back pain",
    "Medication refill",
    "Post-operative check",
];
const SERVICES: [&str; 6] = [
    "Consultation",
    "Blood panel",
    "Chest X-ray",
    "Ward stay",
    "Physiotherapy session",
    "Vaccination",
];
const DRUGS: [(&str, &str); 8] = [
    ("Amoxil", "Amoxicillin"),
    ("Panadol", "Paracetamol"),
    ("Glucophage", "Metformin"),
    ("Lipitor", "Atorvastatin"),
    ("Ventolin", "Salbutamol"),
    ("Norvasc", "Amlodipine"),
    ("Zithromax", "Azithromycin"),
    ("Nexium", "Esomeprazole"),
];
const STRENGTHS: [&str; 5] = ["5 mg", "20 mg", "250 mg", "500 mg", "100 mcg"];

/// Patients are born between these years.
const BIRTH_YEARS: (i32, i32) = (1935, 2024);
const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for realistic hospital records. The same seed always
/// yields the same sequence.
#[derive(Debug, Clone)]
pub struct HospitalFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl HospitalFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn patient(&mut self) -> PatientFormInput {
        let first_name = self.pick(&FIRST_NAMES).to_owned();
        let last_name = self.pick(&LAST_NAMES).to_owned();
        let father_name = if self.rng.bool() {
            format!("{} {}", self.pick(&FIRST_NAMES), last_name)
        } else {
            String::new()
        };
        let gender = if self.rng.bool() {
            Gender::Female
        } else {
            Gender::Male
        };
        let status = match self.rng.int_n(10) {
            0 => PatientStatus::Emergency,
            1 | 2 => PatientStatus::Ipd,
            3 => PatientStatus::Discharged,
            _ => PatientStatus::Opd,
        };
        let email = format!(
            "{}.{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        );

        PatientFormInput {
            date_of_birth: self.date_in_years(BIRTH_YEARS.0, BIRTH_YEARS.1),
            gender,
            phone: self.phone(),
            email,
            address: self.street_address(),
            status,
            blood_group: self.pick(&BLOOD_GROUPS).to_owned(),
            allergies: self.pick(&ALLERGIES).to_owned(),
            first_name,
            last_name,
            father_name,
        }
    }

    pub fn staff(&mut self, role: Role) -> StaffFormInput {
        let first_name = self.pick(&FIRST_NAMES).to_owned();
        let last_name = self.pick(&LAST_NAMES).to_owned();
        StaffFormInput {
            employee_id: String::new(),
            email: format!(
                "{}.{}@hospital.example",
                first_name.to_lowercase(),
                last_name.to_lowercase()
            ),
            first_name,
            last_name,
            role,
            department: self.pick(&DEPARTMENTS).to_owned(),
            phone: self.phone(),
            active: true,
        }
    }

    pub fn appointment(
        &mut self,
        patient_id: PatientId,
        doctor_id: StaffId,
        day: Date,
    ) -> AppointmentFormInput {
        let slot = self.int_range_i64(0, 15);
        let scheduled_at = PrimitiveDateTime::new(day, Time::MIDNIGHT)
            + Duration::minutes(8 * 60 + slot * 30);
        AppointmentFormInput {
            patient_id,
            doctor_id,
            scheduled_at,
            duration_minutes: [15, 30, 45, 60][self.rng.int_n(4)],
            kind: self.pick(&VISIT_KINDS).to_owned(),
            reason: self.pick(&VISIT_REASONS).to_owned(),
            status: AppointmentStatus::Scheduled,
        }
    }

    pub fn medication(&mut self) -> MedicationFormInput {
        let (name, generic) = DRUGS[self.rng.int_n(DRUGS.len())];
        let reorder_level = self.int_range_i64(10, 100);
        MedicationFormInput {
            name: name.to_owned(),
            generic_name: generic.to_owned(),
            strength: self.pick(&STRENGTHS).to_owned(),
            stock: self.int_range_i64(0, 400),
            reorder_level,
            expiry_date: Some(self.date_in_years(REFERENCE_YEAR, REFERENCE_YEAR + 2)),
            unit_price_cents: Some(self.int_range_i64(5, 50) * 10),
        }
    }

    /// Invoice with `0 <= paid <= amount`.
    pub fn invoice(&mut self, patient_id: PatientId) -> InvoiceFormInput {
        let amount_cents = self.int_range_i64(20, 5_000) * 100;
        let paid_cents = match self.rng.int_n(3) {
            0 => 0,
            1 => amount_cents,
            _ => self.int_range_i64(0, amount_cents),
        };
        InvoiceFormInput {
            patient_id,
            services: self.pick(&SERVICES).to_owned(),
            amount_cents,
            paid_cents,
            issued_on: self.date_in_years(REFERENCE_YEAR, REFERENCE_YEAR),
        }
    }

    pub fn date_in_years(&mut self, first_year: i32, last_year: i32) -> Date {
        let year = self.int_range_i32(first_year, last_year);
        let start = midnight(year, Month::January, 1);
        let offset = self.int_range_i64(0, 364);
        start + Duration::days(offset)
    }

    fn phone(&mut self) -> String {
        format!(
            "555-{:03}-{:04}",
            self.int_range_i32(100, 999),
            self.int_range_i32(0, 9999)
        )
    }

    fn street_address(&mut self) -> String {
        format!(
            "{} {} {}",
            self.int_range_i32(1, 9999),
            self.pick(&STREET_NAMES),
            self.pick(&STREET_SUFFIXES)
        )
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = i64::from(max) - i64::from(min) + 1;
        let offset = (self.rng.next_u64() % (span as u64)) as i64;
        (i64::from(min) + offset) as i32
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("carebase.db");
    Ok((dir, db_path))
}

/// Fixed "today" for tests that depend on the calendar.
pub fn fixture_date() -> Date {
    midnight(REFERENCE_YEAR, Month::March, 15)
}

fn midnight(year: i32, month: Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day).unwrap_or(Date::MIN)
}

#[cfg(test)]
mod tests {
    use super::{BIRTH_YEARS, HospitalFaker, fixture_date, temp_db_path};
    use carebase_app::{PatientId, Role, StaffId};
    use std::collections::BTreeSet;

    #[test]
    fn new_deterministic_seed() {
        let mut left = HospitalFaker::new(42);
        let mut right = HospitalFaker::new(42);

        assert_eq!(left.patient(), right.patient());
        assert_eq!(left.staff(Role::Doctor), right.staff(Role::Doctor));
    }

    #[test]
    fn zero_seed_is_normalized() {
        let mut zero = HospitalFaker::new(0);
        let mut one = HospitalFaker::new(1);
        assert_eq!(zero.seed(), 1);
        assert_eq!(zero.patient(), one.patient());
    }

    #[test]
    fn patient() {
        let mut faker = HospitalFaker::new(1);
        let patient = faker.patient();

        assert!(!patient.first_name.is_empty());
        assert!(!patient.last_name.is_empty());
        assert!(!patient.phone.is_empty());
        assert!(patient.email.contains('@'));
        let year = patient.date_of_birth.year();
        assert!((BIRTH_YEARS.0..=BIRTH_YEARS.1).contains(&year));
    }

    #[test]
    fn generated_patients_validate() {
        let mut faker = HospitalFaker::new(5);
        for _ in 0..50 {
            let patient = faker.patient();
            patient
                .validate(fixture_date())
                .expect("generated patient should be valid");
        }
    }

    #[test]
    fn staff_keeps_requested_role() {
        let mut faker = HospitalFaker::new(2);
        let staff = faker.staff(Role::Pharmacist);
        assert_eq!(staff.role, Role::Pharmacist);
        assert!(staff.active);
        assert!(staff.employee_id.is_empty());
    }

    #[test]
    fn appointment_lands_on_requested_day() {
        let mut faker = HospitalFaker::new(3);
        let day = fixture_date();
        for _ in 0..20 {
            let appointment = faker.appointment(PatientId::new(1), StaffId::new(2), day);
            assert_eq!(appointment.scheduled_at.date(), day);
            assert!((8..=15).contains(&appointment.scheduled_at.hour()));
            appointment.validate().expect("appointment should be valid");
        }
    }

    #[test]
    fn invoice_paid_never_exceeds_amount() {
        let mut faker = HospitalFaker::new(4);
        for _ in 0..100 {
            let invoice = faker.invoice(PatientId::new(1));
            assert!(invoice.amount_cents > 0);
            assert!((0..=invoice.amount_cents).contains(&invoice.paid_cents));
        }
    }

    #[test]
    fn medication_values_are_non_negative() {
        let mut faker = HospitalFaker::new(6);
        for _ in 0..50 {
            let medication = faker.medication();
            assert!(medication.stock >= 0);
            assert!(medication.reorder_level >= 10);
            medication.validate().expect("medication should be valid");
        }
    }

    #[test]
    fn variety_across_seeds() {
        let mut names = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = HospitalFaker::new(seed);
            let patient = faker.patient();
            names.insert(format!("{} {}", patient.first_name, patient.last_name));
        }
        assert!(names.len() >= 10, "got {}", names.len());
    }

    #[test]
    fn int_n() {
        let mut faker = HospitalFaker::new(42);
        for _ in 0..100 {
            let value = faker.int_n(5);
            assert!(value < 5);
        }
    }

    #[test]
    fn temp_db_path_lives_in_temp_dir() -> anyhow::Result<()> {
        let (dir, path) = temp_db_path()?;
        assert!(path.starts_with(dir.path()));
        assert!(!path.exists());
        Ok(())
    }
}
