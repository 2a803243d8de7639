// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use carebase_app::{
    AppointmentFormInput, AppointmentStatus, Gender, InvoiceFormInput, LabOrderFormInput,
    LabOrderStatus, MedicationFormInput, PatientFormInput, PatientStatus,
    PrescriptionFormInput, PrescriptionStatus, RadiologyOrderFormInput, RadiologyStatus, Role,
    StaffFormInput, StaffId, local_today,
};
use time::{Date, Duration, Month, PrimitiveDateTime, Time};
use tracing::info;

use crate::{NewAccount, Store};

/// (email, password, role tag, display name)
const DEMO_ACCOUNTS: &[(&str, &str, &str, &str)] = &[
    ("admin@hospital.com", "admin123", "ADMIN", "Admin User"),
    ("doctor@hospital.com", "doctor123", "DOCTOR", "Dr. Smith"),
    ("nurse@hospital.com", "nurse123", "NURSE", "Nurse Johnson"),
    (
        "receptionist@hospital.com",
        "reception123",
        "RECEPTIONIST",
        "Reception Desk",
    ),
    (
        "pharmacist@hospital.com",
        "pharma123",
        "PHARMACIST",
        "Pharmacist Lee",
    ),
    ("lab@hospital.com", "lab123", "LAB_TECH", "Lab Tech"),
    ("radio@hospital.com", "radio123", "RADIOLOGIST", "Radiologist"),
    ("finance@hospital.com", "finance123", "FINANCE", "Finance Manager"),
    ("hr@hospital.com", "hr123", "HR", "HR Manager"),
    ("patient@hospital.com", "patient123", "PATIENT", "Patient User"),
];

/// (first, last, role, department)
const DEMO_STAFF: &[(&str, &str, Role, &str)] = &[
    ("Admin", "User", Role::Admin, "Administration"),
    ("John", "Smith", Role::Doctor, "General Medicine"),
    ("Mary", "Johnson", Role::Nurse, "Ward A"),
    ("Rachel", "Green", Role::Receptionist, "Front Desk"),
    ("Li", "Lee", Role::Pharmacist, "Pharmacy"),
    ("Sam", "Patel", Role::LabTech, "Pathology"),
    ("Nora", "Kim", Role::Radiologist, "Imaging"),
    ("Frank", "Ortiz", Role::Finance, "Accounts"),
    ("Helen", "Ruiz", Role::Hr, "Human Resources"),
    ("Aisha", "Khan", Role::Doctor, "Cardiology"),
];

const FIRST_NAMES: &[&str] = &[
    "Amir", "Beatriz", "Chen", "Dalia", "Elias", "Farah", "Goran", "Hana", "Ivan", "Jonas",
    "Kemi", "Lucia", "Mateo", "Nadia", "Oscar", "Priya", "Quinn", "Rosa", "Tariq", "Uma",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Brennan", "Castillo", "Dubois", "Eriksen", "Fischer", "Gallo", "Haddad",
    "Ibrahim", "Jensen", "Kowalski", "Larsen", "Moreau", "Novak", "Okafor",
];

const BLOOD_GROUPS: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

const DEMO_MEDICATIONS: &[(&str, &str, &str, i64, i64, i64)] = &[
    ("Amoxil", "Amoxicillin", "500 mg", 240, 50, 45),
    ("Panadol", "Paracetamol", "500 mg", 35, 100, 10),
    ("Glucophage", "Metformin", "850 mg", 0, 40, 30),
    ("Lipitor", "Atorvastatin", "20 mg", 18, 40, 85),
    ("Ventolin", "Salbutamol", "100 mcg", 60, 20, 120),
    ("Zantac", "Ranitidine", "150 mg", 12, 30, 25),
    ("Norvasc", "Amlodipine", "5 mg", 150, 30, 40),
    ("Augmentin", "Amoxicillin/Clavulanate", "625 mg", 75, 25, 95),
];

const PATIENT_COUNT: usize = 24;

/// Populates an empty database with accounts and a working day of records.
/// Does nothing when accounts already exist.
pub(crate) fn seed(store: &Store) -> Result<()> {
    if store.account_count()? > 0 {
        info!("demo data skipped: database already has accounts");
        return Ok(());
    }

    for (email, password, role_tag, display_name) in DEMO_ACCOUNTS {
        store.create_account(&NewAccount {
            email: (*email).to_owned(),
            display_name: (*display_name).to_owned(),
            role_tag: (*role_tag).to_owned(),
            password: (*password).to_owned(),
            active: true,
        })?;
    }

    let mut staff_ids = Vec::with_capacity(DEMO_STAFF.len());
    for (index, (first, last, role, department)) in DEMO_STAFF.iter().enumerate() {
        let id = store.create_staff(&StaffFormInput {
            employee_id: String::new(),
            first_name: (*first).to_owned(),
            last_name: (*last).to_owned(),
            role: *role,
            department: (*department).to_owned(),
            phone: format!("555-01{index:02}"),
            email: format!(
                "{}.{}@hospital.com",
                first.to_lowercase(),
                last.to_lowercase()
            ),
            active: true,
        })?;
        staff_ids.push((id, *role));
    }
    let doctors: Vec<StaffId> = staff_ids
        .iter()
        .filter(|(_, role)| *role == Role::Doctor)
        .map(|(id, _)| *id)
        .collect();
    let lab_tech = staff_of(&staff_ids, Role::LabTech)?;
    let radiologist = staff_of(&staff_ids, Role::Radiologist)?;

    let today = local_today();
    let mut patient_ids = Vec::with_capacity(PATIENT_COUNT);
    for index in 0..PATIENT_COUNT {
        patient_ids.push(store.create_patient(&demo_patient(index)?)?);
    }

    let kinds = ["Consultation", "Follow-up", "Check-up", "Review"];
    let statuses = [
        AppointmentStatus::Completed,
        AppointmentStatus::Completed,
        AppointmentStatus::InConsultation,
        AppointmentStatus::CheckedIn,
        AppointmentStatus::CheckedIn,
        AppointmentStatus::Scheduled,
        AppointmentStatus::Scheduled,
        AppointmentStatus::Scheduled,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Scheduled,
    ];
    for (index, status) in statuses.iter().enumerate() {
        let minutes = 9 * 60 + 30 * index as i64;
        let start = PrimitiveDateTime::new(today, Time::MIDNIGHT) + Duration::minutes(minutes);
        store.create_appointment(&AppointmentFormInput {
            patient_id: patient_ids[index],
            doctor_id: doctors[index % doctors.len()],
            scheduled_at: start,
            duration_minutes: 30,
            kind: kinds[index % kinds.len()].to_owned(),
            reason: "Routine visit".to_owned(),
            status: *status,
        })?;
    }

    let prescriptions = [
        ("Amoxicillin 500mg x 7 days", PrescriptionStatus::Pending),
        ("Paracetamol 500mg PRN", PrescriptionStatus::Pending),
        ("Metformin 850mg BID", PrescriptionStatus::Dispensed),
        ("Atorvastatin 20mg nightly", PrescriptionStatus::Pending),
    ];
    for (index, (medications, status)) in prescriptions.iter().enumerate() {
        store.create_prescription(&PrescriptionFormInput {
            patient_id: patient_ids[index],
            doctor_id: doctors[index % doctors.len()],
            issued_on: today - Duration::days(index as i64),
            medications: (*medications).to_owned(),
            status: *status,
        })?;
    }

    for (index, (name, generic, strength, stock, reorder, price)) in
        DEMO_MEDICATIONS.iter().enumerate()
    {
        store.create_medication(&MedicationFormInput {
            name: (*name).to_owned(),
            generic_name: (*generic).to_owned(),
            strength: (*strength).to_owned(),
            stock: *stock,
            reorder_level: *reorder,
            expiry_date: Some(today + Duration::days(90 + 30 * index as i64)),
            unit_price_cents: Some(*price),
        })?;
    }

    let invoices = [
        ("Consultation", 50_000, 50_000),
        ("Blood panel, consultation", 120_000, 40_000),
        ("Chest X-ray", 80_000, 0),
        ("Ward stay (2 nights)", 450_000, 450_000),
        ("Follow-up", 30_000, 0),
    ];
    for (index, (services, amount, paid)) in invoices.iter().enumerate() {
        store.create_invoice(&InvoiceFormInput {
            patient_id: patient_ids[index],
            services: (*services).to_owned(),
            amount_cents: *amount,
            paid_cents: *paid,
            issued_on: today - Duration::days(index as i64),
        })?;
    }

    let lab_orders = [
        ("Complete Blood Count", LabOrderStatus::Completed, "Within normal range"),
        ("Lipid Panel", LabOrderStatus::InProgress, ""),
        ("HbA1c", LabOrderStatus::Pending, ""),
        ("Liver Function Test", LabOrderStatus::Pending, ""),
    ];
    for (index, (test_type, status, result)) in lab_orders.iter().enumerate() {
        store.create_lab_order(&LabOrderFormInput {
            patient_id: patient_ids[index + 2],
            test_type: (*test_type).to_owned(),
            ordered_by: lab_tech,
            ordered_on: today - Duration::days(index as i64),
            status: *status,
            result: (*result).to_owned(),
        })?;
    }

    let studies = [
        ("Chest X-ray", RadiologyStatus::Reported, "No acute findings"),
        ("Abdominal Ultrasound", RadiologyStatus::InProgress, ""),
        ("MRI Brain", RadiologyStatus::Pending, ""),
    ];
    for (index, (study_type, status, findings)) in studies.iter().enumerate() {
        store.create_radiology_order(&RadiologyOrderFormInput {
            patient_id: patient_ids[index + 4],
            study_type: (*study_type).to_owned(),
            ordered_by: radiologist,
            ordered_on: today - Duration::days(index as i64),
            status: *status,
            findings: (*findings).to_owned(),
        })?;
    }

    info!(
        accounts = DEMO_ACCOUNTS.len(),
        staff = DEMO_STAFF.len(),
        patients = PATIENT_COUNT,
        "seeded demo data"
    );
    Ok(())
}

fn staff_of(staff: &[(StaffId, Role)], role: Role) -> Result<StaffId> {
    staff
        .iter()
        .find(|(_, candidate)| *candidate == role)
        .map(|(id, _)| *id)
        .with_context(|| format!("demo staff has no {}", role.label()))
}

fn demo_patient(index: usize) -> Result<PatientFormInput> {
    let (first_name, last_name, gender) = match index {
        0 => ("John", "Doe", Gender::Male),
        1 => ("Jane", "Smith", Gender::Female),
        _ => (
            FIRST_NAMES[index % FIRST_NAMES.len()],
            LAST_NAMES[(index * 7) % LAST_NAMES.len()],
            if index % 2 == 0 {
                Gender::Male
            } else {
                Gender::Female
            },
        ),
    };
    let status = match index % 8 {
        3 => PatientStatus::Ipd,
        5 => PatientStatus::Emergency,
        7 => PatientStatus::Discharged,
        _ => PatientStatus::Opd,
    };
    let month = Month::try_from((index % 12) as u8 + 1).context("demo birth month")?;
    let date_of_birth = Date::from_calendar_date(
        1950 + ((index * 3) % 60) as i32,
        month,
        (index % 28) as u8 + 1,
    )
    .context("demo birth date")?;

    Ok(PatientFormInput {
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        father_name: String::new(),
        date_of_birth,
        gender,
        phone: format!("555-02{index:02}"),
        email: format!(
            "{}.{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        ),
        address: format!("{} Main Street", 10 + index),
        status,
        blood_group: BLOOD_GROUPS[index % BLOOD_GROUPS.len()].to_owned(),
        allergies: if index % 5 == 0 {
            "Penicillin".to_owned()
        } else {
            String::new()
        },
    })
}
