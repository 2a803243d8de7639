// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use carebase_app::{
    AppointmentStatus, DashboardKind, DepartmentId, LabOrderFormInput, LabOrderStatus, PatientStatus,
    PrescriptionFormInput, PrescriptionStatus, RadiologyOrderFormInput, RadiologyStatus, Role,
    StaffId, TabKind,
};
use carebase_db::{NewAccount, Store, validate_db_path};
use carebase_testkit::{HospitalFaker, fixture_date, temp_db_path};
use time::{Date, Month};

fn bootstrapped() -> Result<Store> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    Ok(store)
}

fn doctor(store: &Store, faker: &mut HospitalFaker) -> Result<StaffId> {
    store.create_staff(&faker.staff(Role::Doctor))
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path(":memory:").is_ok());
    assert!(validate_db_path("/tmp/carebase.db").is_ok());
}

#[test]
fn bootstrap_is_idempotent_on_disk() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    {
        let store = Store::open(&path)?;
        store.bootstrap()?;
        let mut faker = HospitalFaker::new(1);
        store.create_patient(&faker.patient())?;
    }

    let store = Store::open(&path)?;
    store.bootstrap()?;
    assert_eq!(store.list_patients()?.len(), 1);
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = bootstrapped()?;
    store.raw_connection().execute_batch(
        "
        DROP TABLE invoices;
        CREATE TABLE invoices (
          id INTEGER PRIMARY KEY,
          invoice_number TEXT NOT NULL,
          patient_id INTEGER NOT NULL,
          services TEXT NOT NULL,
          amount_cents INTEGER NOT NULL,
          issued_on TEXT NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        ",
    )?;

    let err = store
        .bootstrap()
        .expect_err("schema validation should fail");
    let message = err.to_string();
    assert!(message.contains("table `invoices` is missing required columns"));
    assert!(message.contains("paid_cents"));
    Ok(())
}

#[test]
fn bootstrap_rejects_foreign_database() -> Result<()> {
    let store = Store::open_memory()?;
    store
        .raw_connection()
        .execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);")?;

    let err = store.bootstrap().expect_err("unknown schema should fail");
    assert!(
        err.to_string()
            .contains("database is missing required table `accounts`")
    );
    Ok(())
}

#[test]
fn authenticate_accepts_matching_credentials_only() -> Result<()> {
    let store = bootstrapped()?;
    store.create_account(&NewAccount {
        email: "Doctor@Hospital.com".to_owned(),
        display_name: "Dr. Smith".to_owned(),
        role_tag: "DOCTOR".to_owned(),
        password: "doctor123".to_owned(),
        active: true,
    })?;

    let session = store.authenticate("  doctor@HOSPITAL.com ", "doctor123")?;
    assert_eq!(session.account().email, "doctor@hospital.com");
    assert_eq!(session.role(), Some(Role::Doctor));
    assert_eq!(session.dashboard(), DashboardKind::Doctor);
    assert!(session.can_open(TabKind::Appointments));
    assert!(!session.can_open(TabKind::Billing));

    let wrong_password = store
        .authenticate("doctor@hospital.com", "doctor124")
        .expect_err("wrong password should fail");
    let unknown = store
        .authenticate("nobody@hospital.com", "doctor123")
        .expect_err("unknown account should fail");
    assert_eq!(wrong_password.to_string(), unknown.to_string());
    assert_eq!(unknown.to_string(), "invalid email or password");
    Ok(())
}

#[test]
fn inactive_accounts_cannot_sign_in() -> Result<()> {
    let store = bootstrapped()?;
    store.create_account(&NewAccount {
        email: "hr@hospital.com".to_owned(),
        display_name: "HR Manager".to_owned(),
        role_tag: "HR".to_owned(),
        password: "hr123".to_owned(),
        active: false,
    })?;

    let err = store
        .authenticate("hr@hospital.com", "hr123")
        .expect_err("inactive account should fail");
    assert_eq!(err.to_string(), "invalid email or password");
    Ok(())
}

#[test]
fn unknown_role_tag_gets_welcome_dashboard() -> Result<()> {
    let store = bootstrapped()?;
    store.create_account(&NewAccount {
        email: "volunteer@hospital.com".to_owned(),
        display_name: "Volunteer".to_owned(),
        role_tag: "VOLUNTEER".to_owned(),
        password: "help".to_owned(),
        active: true,
    })?;

    let session = store.authenticate("volunteer@hospital.com", "help")?;
    assert_eq!(session.role(), None);
    assert_eq!(session.tabs(), vec![TabKind::Dashboard]);
    assert_eq!(
        session.dashboard().title(),
        "Dashboard for VOLUNTEER is under development"
    );
    Ok(())
}

#[test]
fn create_patient_assigns_sequential_upid() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(7);

    let first = store.create_patient(&faker.patient())?;
    let second = store.create_patient(&faker.patient())?;

    assert_eq!(store.get_patient(first)?.upid, "P1001");
    assert_eq!(store.get_patient(second)?.upid, "P1002");
    Ok(())
}

#[test]
fn update_patient_round_trips_fields() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(8);
    let id = store.create_patient(&faker.patient())?;

    let mut update = faker.patient();
    update.status = PatientStatus::Ipd;
    update.date_of_birth = Date::from_calendar_date(1980, Month::July, 4)?;
    update.allergies = "Latex".to_owned();
    store.update_patient(id, &update)?;

    let patient = store.get_patient(id)?;
    assert_eq!(patient.first_name, update.first_name);
    assert_eq!(patient.status, PatientStatus::Ipd);
    assert_eq!(patient.date_of_birth, update.date_of_birth);
    assert_eq!(patient.allergies, "Latex");
    assert_eq!(patient.upid, "P1001");

    let missing = store
        .update_patient(carebase_app::PatientId::new(999), &update)
        .expect_err("unknown patient should fail");
    assert!(missing.to_string().contains("patient 999 not found"));
    Ok(())
}

#[test]
fn unknown_status_tag_surfaces_as_error() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(9);
    store.create_patient(&faker.patient())?;
    store
        .raw_connection()
        .execute("UPDATE patients SET status = 'ADMITTED'", [])?;

    let err = store
        .list_patients()
        .expect_err("unknown status should fail to load");
    assert!(format!("{err:#}").contains("unknown patient status ADMITTED"));
    Ok(())
}

#[test]
fn appointment_tokens_count_per_day() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(10);
    let patient = store.create_patient(&faker.patient())?;
    let doctor = doctor(&store, &mut faker)?;
    let day = fixture_date();
    let next_day = day.next_day().expect("valid next day");

    let first = store.create_appointment(&faker.appointment(patient, doctor, day))?;
    let second = store.create_appointment(&faker.appointment(patient, doctor, day))?;
    let other_day = store.create_appointment(&faker.appointment(patient, doctor, next_day))?;

    assert_eq!(store.get_appointment(first)?.token, "TOK-20260315-0001");
    assert_eq!(store.get_appointment(second)?.token, "TOK-20260315-0002");
    assert_eq!(store.get_appointment(other_day)?.token, "TOK-20260316-0001");

    let appointment = store.get_appointment(first)?;
    let patient_row = store.get_patient(patient)?;
    assert_eq!(appointment.patient_name, patient_row.full_name());
    Ok(())
}

#[test]
fn appointment_requires_existing_patient_and_doctor() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(11);
    let doctor = doctor(&store, &mut faker)?;
    let input = faker.appointment(carebase_app::PatientId::new(42), doctor, fixture_date());

    let err = store
        .create_appointment(&input)
        .expect_err("missing patient should fail");
    assert!(err.to_string().contains("patient 42 does not exist"));
    Ok(())
}

#[test]
fn appointment_status_flow_stamps_times() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(12);
    let patient = store.create_patient(&faker.patient())?;
    let doctor = doctor(&store, &mut faker)?;
    let id = store.create_appointment(&faker.appointment(patient, doctor, fixture_date()))?;

    store.update_appointment_status(id, AppointmentStatus::CheckedIn)?;
    let checked_in = store.get_appointment(id)?;
    assert_eq!(checked_in.status, AppointmentStatus::CheckedIn);
    assert!(checked_in.checked_in_at.is_some());
    assert!(checked_in.completed_at.is_none());

    store.update_appointment_status(id, AppointmentStatus::InConsultation)?;
    store.update_appointment_status(id, AppointmentStatus::Completed)?;
    let completed = store.get_appointment(id)?;
    assert_eq!(completed.status, AppointmentStatus::Completed);
    assert_eq!(completed.checked_in_at, checked_in.checked_in_at);
    assert!(completed.completed_at.is_some());

    let err = store
        .cancel_appointment(id)
        .expect_err("completed appointment should not cancel");
    assert!(err.to_string().contains("already completed"));
    Ok(())
}

#[test]
fn dispense_only_moves_pending_prescriptions() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(13);
    let patient = store.create_patient(&faker.patient())?;
    let doctor = doctor(&store, &mut faker)?;
    let id = store.create_prescription(&PrescriptionFormInput {
        patient_id: patient,
        doctor_id: doctor,
        issued_on: fixture_date(),
        medications: "Amoxicillin 500mg".to_owned(),
        status: PrescriptionStatus::Pending,
    })?;

    let prescription = store.get_prescription(id)?;
    assert_eq!(prescription.rx_number, format!("RX-{:05}", id.get()));

    store.dispense_prescription(id)?;
    assert_eq!(
        store.get_prescription(id)?.status,
        PrescriptionStatus::Dispensed
    );
    let err = store
        .dispense_prescription(id)
        .expect_err("second dispense should fail");
    assert!(err.to_string().contains("is not pending"));
    Ok(())
}

#[test]
fn diagnostic_orders_join_staff_names() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(14);
    let patient = store.create_patient(&faker.patient())?;
    let tech_input = faker.staff(Role::LabTech);
    let tech = store.create_staff(&tech_input)?;

    let lab = store.create_lab_order(&LabOrderFormInput {
        patient_id: patient,
        test_type: "Lipid Panel".to_owned(),
        ordered_by: tech,
        ordered_on: fixture_date(),
        status: LabOrderStatus::Pending,
        result: String::new(),
    })?;
    let imaging = store.create_radiology_order(&RadiologyOrderFormInput {
        patient_id: patient,
        study_type: "Chest X-ray".to_owned(),
        ordered_by: tech,
        ordered_on: fixture_date(),
        status: RadiologyStatus::Pending,
        findings: String::new(),
    })?;

    let lab = store.get_lab_order(lab)?;
    assert_eq!(
        lab.ordered_by_name,
        format!("{} {}", tech_input.first_name, tech_input.last_name)
    );
    assert!(lab.test_number.starts_with("LAB-"));
    assert!(store.get_radiology_order(imaging)?.order_number.starts_with("RAD-"));
    Ok(())
}

#[test]
fn dashboard_counts_reflect_records() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(15);
    let today = fixture_date();

    let mut admitted = faker.patient();
    admitted.status = PatientStatus::Ipd;
    let admitted = store.create_patient(&admitted)?;
    let mut walk_in = faker.patient();
    walk_in.status = PatientStatus::Opd;
    let walk_in = store.create_patient(&walk_in)?;
    let doctor = doctor(&store, &mut faker)?;

    let waiting = store.create_appointment(&faker.appointment(admitted, doctor, today))?;
    store.update_appointment_status(waiting, AppointmentStatus::CheckedIn)?;
    store.create_appointment(&faker.appointment(walk_in, doctor, today))?;
    let tomorrow = today.next_day().expect("valid next day");
    store.create_appointment(&faker.appointment(walk_in, doctor, tomorrow))?;

    let mut invoice = faker.invoice(walk_in);
    invoice.amount_cents = 10_000;
    invoice.paid_cents = 2_500;
    store.create_invoice(&invoice)?;

    let mut medication = faker.medication();
    medication.stock = 5;
    medication.reorder_level = 20;
    store.create_medication(&medication)?;

    let counts = store.dashboard_counts(today)?;
    assert_eq!(counts.patients_total, 2);
    assert_eq!(counts.patients_admitted, 1);
    assert_eq!(counts.staff_active, 1);
    assert_eq!(counts.appointments_today, 2);
    assert_eq!(counts.appointments_waiting, 1);
    assert_eq!(counts.medications_low_stock, 1);
    assert_eq!(counts.invoices_unpaid, 1);
    assert_eq!(counts.outstanding_cents, 7_500);
    assert_eq!(counts.collected_cents, 2_500);
    Ok(())
}

#[test]
fn report_summary_lists_finance_totals() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(16);
    let patient = store.create_patient(&faker.patient())?;
    let mut invoice = faker.invoice(patient);
    invoice.amount_cents = 123_456;
    invoice.paid_cents = 23_456;
    store.create_invoice(&invoice)?;

    let rows = store.report_summary(fixture_date())?;
    let value = |metric: &str| {
        rows.iter()
            .find(|row| row.section == "finance" && row.metric == metric)
            .map(|row| row.value.clone())
    };
    assert_eq!(value("billed"), Some("$1,234.56".to_owned()));
    assert_eq!(value("outstanding"), Some("$1,000.00".to_owned()));

    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let expected: Vec<i64> = (1..=rows.len() as i64).collect();
    assert_eq!(ids, expected);
    Ok(())
}

#[test]
fn seed_demo_data_creates_working_accounts_once() -> Result<()> {
    let store = bootstrapped()?;
    store.seed_demo_data()?;
    let patients = store.list_patients()?;
    assert!(patients.len() > 10);
    assert_eq!(patients[0].full_name(), "John Doe");
    assert_eq!(patients[0].upid, "P1001");
    assert_eq!(patients[1].full_name(), "Jane Smith");

    for (email, password, role) in [
        ("admin@hospital.com", "admin123", Role::Admin),
        ("pharmacist@hospital.com", "pharma123", Role::Pharmacist),
        ("hr@hospital.com", "hr123", Role::Hr),
        ("patient@hospital.com", "patient123", Role::Patient),
    ] {
        let session = store.authenticate(email, password)?;
        assert_eq!(session.role(), Some(role), "{email}");
    }

    store.seed_demo_data()?;
    assert_eq!(store.list_patients()?.len(), patients.len());
    assert!(!store.list_appointments()?.is_empty());
    assert!(!store.list_medications()?.is_empty());
    assert!(!store.list_invoices()?.is_empty());
    Ok(())
}

#[test]
fn departments_list_get_and_create() -> Result<()> {
    let store = bootstrapped()?;
    assert!(store.list_departments()?.is_empty());

    let ward = store.create_department("  Ward B ")?;
    store.create_department("Cardiology")?;
    let names: Vec<String> = store
        .list_departments()?
        .into_iter()
        .map(|department| department.name)
        .collect();
    assert_eq!(names, vec!["Cardiology", "Ward B"]);

    let loaded = store.get_department(ward)?;
    assert_eq!(loaded.name, "Ward B");
    assert!(loaded.active);

    let error = store
        .create_department("ward b")
        .expect_err("names are unique ignoring case");
    assert!(error.to_string().contains("already exists"));
    assert!(store.create_department("   ").is_err());
    assert!(store.get_department(DepartmentId::new(99)).is_err());

    store
        .raw_connection()
        .execute("UPDATE departments SET active = 0 WHERE id = ?", [ward.get()])?;
    assert_eq!(store.list_departments()?.len(), 1);
    Ok(())
}

#[test]
fn staff_writes_register_their_department() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(21);
    store.create_department("Pathology")?;

    let mut staff = faker.staff(Role::LabTech);
    staff.department = "pathology".to_owned();
    let staff_id = store.create_staff(&staff)?;
    assert_eq!(store.list_departments()?.len(), 1);

    staff.department = "Oncology".to_owned();
    store.update_staff(staff_id, &staff)?;
    let names: Vec<String> = store
        .list_departments()?
        .into_iter()
        .map(|department| department.name)
        .collect();
    assert_eq!(names, vec!["Oncology", "Pathology"]);
    assert_eq!(store.get_staff(staff_id)?.department, "Oncology");

    assert!(store.update_staff(StaffId::new(404), &faker.staff(Role::Nurse)).is_err());
    Ok(())
}

#[test]
fn demo_data_seeds_departments_from_staff() -> Result<()> {
    let store = bootstrapped()?;
    store.seed_demo_data()?;
    let names: Vec<String> = store
        .list_departments()?
        .into_iter()
        .map(|department| department.name)
        .collect();
    assert_eq!(names.len(), 10);
    assert!(names.contains(&"Cardiology".to_owned()));
    assert!(names.contains(&"Front Desk".to_owned()));
    Ok(())
}

#[test]
fn patient_names_follow_insertion_order() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = HospitalFaker::new(17);
    let first = faker.patient();
    let second = faker.patient();
    store.create_patient(&first)?;
    store.create_patient(&second)?;

    let names: Vec<String> = store
        .patient_names()?
        .into_iter()
        .map(|lookup| lookup.name)
        .collect();
    assert_eq!(
        names,
        vec![
            format!("{} {}", first.first_name, first.last_name),
            format!("{} {}", second.first_name, second.last_name),
        ]
    );
    Ok(())
}
