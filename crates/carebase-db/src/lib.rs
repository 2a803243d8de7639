// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use carebase_app::{
    Account, AccountId, Appointment, AppointmentFormInput, AppointmentId, AppointmentStatus,
    DashboardCounts, Department, DepartmentId, Gender, Invoice, InvoiceFormInput, InvoiceId, LabOrder, LabOrderFormInput,
    LabOrderId, LabOrderStatus, Medication, MedicationFormInput, MedicationId, Patient,
    PatientFormInput, PatientId, PatientStatus, Prescription, PrescriptionFormInput,
    PrescriptionId, PrescriptionStatus, RadiologyOrder, RadiologyOrderFormInput,
    RadiologyOrderId, RadiologyStatus, ReportRow, Role, Session, Staff, StaffFormInput, StaffId,
    table::format_money,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info, warn};

mod demo;

pub const APP_NAME: &str = "carebase";

const LOGIN_FAILED: &str = "invalid email or password";
const UPID_BASE: i64 = 1000;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "accounts",
        &[
            "id",
            "email",
            "display_name",
            "role",
            "password_salt",
            "password_sha256",
            "active",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "patients",
        &[
            "id",
            "upid",
            "first_name",
            "last_name",
            "father_name",
            "date_of_birth",
            "gender",
            "phone",
            "email",
            "address",
            "status",
            "blood_group",
            "allergies",
            "created_at",
            "updated_at",
        ],
    ),
    ("departments", &["id", "name", "active", "created_at"]),
    (
        "staff",
        &[
            "id",
            "employee_id",
            "first_name",
            "last_name",
            "role",
            "department",
            "phone",
            "email",
            "active",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "appointments",
        &[
            "id",
            "token",
            "patient_id",
            "doctor_id",
            "scheduled_at",
            "duration_minutes",
            "kind",
            "reason",
            "status",
            "checked_in_at",
            "completed_at",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "prescriptions",
        &[
            "id",
            "rx_number",
            "patient_id",
            "doctor_id",
            "issued_on",
            "medications",
            "status",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "medications",
        &[
            "id",
            "name",
            "generic_name",
            "strength",
            "stock",
            "reorder_level",
            "expiry_date",
            "unit_price_cents",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "invoices",
        &[
            "id",
            "invoice_number",
            "patient_id",
            "services",
            "amount_cents",
            "paid_cents",
            "issued_on",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "lab_orders",
        &[
            "id",
            "test_number",
            "patient_id",
            "test_type",
            "ordered_by",
            "ordered_on",
            "status",
            "result",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "radiology_orders",
        &[
            "id",
            "order_number",
            "patient_id",
            "study_type",
            "ordered_by",
            "ordered_on",
            "status",
            "findings",
            "created_at",
            "updated_at",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_accounts_email",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_email ON accounts (email);",
    },
    RequiredIndex {
        name: "idx_patients_upid",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_patients_upid ON patients (upid);",
    },
    RequiredIndex {
        name: "idx_departments_name",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_departments_name ON departments (name);",
    },
    RequiredIndex {
        name: "idx_staff_employee_id",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_staff_employee_id ON staff (employee_id);",
    },
    RequiredIndex {
        name: "idx_appointments_token",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_token ON appointments (token);",
    },
    RequiredIndex {
        name: "idx_appointments_patient_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_appointments_patient_id ON appointments (patient_id);",
    },
    RequiredIndex {
        name: "idx_prescriptions_patient_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_prescriptions_patient_id ON prescriptions (patient_id);",
    },
    RequiredIndex {
        name: "idx_invoices_patient_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_invoices_patient_id ON invoices (patient_id);",
    },
];

const APPOINTMENT_SELECT: &str = "
    SELECT
      a.id, a.token, a.patient_id, TRIM(p.first_name || ' ' || p.last_name),
      a.doctor_id, TRIM(s.first_name || ' ' || s.last_name),
      a.scheduled_at, a.duration_minutes, a.kind, a.reason, a.status,
      a.checked_in_at, a.completed_at, a.created_at, a.updated_at
    FROM appointments a
    JOIN patients p ON p.id = a.patient_id
    JOIN staff s ON s.id = a.doctor_id
";

const PRESCRIPTION_SELECT: &str = "
    SELECT
      r.id, r.rx_number, r.patient_id, TRIM(p.first_name || ' ' || p.last_name),
      r.doctor_id, TRIM(s.first_name || ' ' || s.last_name),
      r.issued_on, r.medications, r.status, r.created_at, r.updated_at
    FROM prescriptions r
    JOIN patients p ON p.id = r.patient_id
    JOIN staff s ON s.id = r.doctor_id
";

const INVOICE_SELECT: &str = "
    SELECT
      i.id, i.invoice_number, i.patient_id, TRIM(p.first_name || ' ' || p.last_name),
      i.services, i.amount_cents, i.paid_cents, i.issued_on, i.created_at, i.updated_at
    FROM invoices i
    JOIN patients p ON p.id = i.patient_id
";

const LAB_ORDER_SELECT: &str = "
    SELECT
      l.id, l.test_number, l.patient_id, TRIM(p.first_name || ' ' || p.last_name),
      l.test_type, l.ordered_by, TRIM(s.first_name || ' ' || s.last_name),
      l.ordered_on, l.status, l.result, l.created_at, l.updated_at
    FROM lab_orders l
    JOIN patients p ON p.id = l.patient_id
    JOIN staff s ON s.id = l.ordered_by
";

const RADIOLOGY_ORDER_SELECT: &str = "
    SELECT
      o.id, o.order_number, o.patient_id, TRIM(p.first_name || ' ' || p.last_name),
      o.study_type, o.ordered_by, TRIM(s.first_name || ' ' || s.last_name),
      o.ordered_on, o.status, o.findings, o.created_at, o.updated_at
    FROM radiology_orders o
    JOIN patients p ON p.id = o.patient_id
    JOIN staff s ON s.id = o.ordered_by
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub display_name: String,
    pub role_tag: String,
    pub password: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupValue<Id> {
    pub id: Id,
    pub name: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        info!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        debug!("opened in-memory database");
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            info!("created database schema");
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn create_account(&self, account: &NewAccount) -> Result<AccountId> {
        let email = normalize_email(&account.email);
        if email.is_empty() {
            bail!("account email is required");
        }
        if account.password.is_empty() {
            bail!("account password is required for {email}");
        }
        let now = now_rfc3339()?;
        let salt = checksum_sha256(format!("{email}:{now}").as_bytes())[..16].to_owned();
        let digest = password_digest(&salt, &account.password);
        self.conn
            .execute(
                "
                INSERT INTO accounts (
                  email, display_name, role, password_salt, password_sha256,
                  active, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    email,
                    account.display_name.trim(),
                    account.role_tag.trim(),
                    salt,
                    digest,
                    account.active,
                    now,
                    now,
                ],
            )
            .with_context(|| format!("insert account {email}"))?;
        Ok(AccountId::new(self.conn.last_insert_rowid()))
    }

    /// Checks credentials and issues a session. Unknown emails, inactive
    /// accounts and wrong passwords all fail with the same message.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);
        let found = self
            .conn
            .query_row(
                "
                SELECT id, email, display_name, role, password_salt, password_sha256, active
                FROM accounts
                WHERE email = ?
                ",
                params![email],
                |row| {
                    let account = Account {
                        id: AccountId::new(row.get(0)?),
                        email: row.get(1)?,
                        display_name: row.get(2)?,
                        role_tag: row.get(3)?,
                        active: row.get(6)?,
                    };
                    let salt: String = row.get(4)?;
                    let digest: String = row.get(5)?;
                    Ok((account, salt, digest))
                },
            )
            .optional()
            .with_context(|| format!("load account {email}"))?;

        let Some((account, salt, digest)) = found else {
            warn!(%email, "login failed: unknown account");
            bail!(LOGIN_FAILED);
        };
        if !account.active {
            warn!(%email, "login failed: account inactive");
            bail!(LOGIN_FAILED);
        }
        if password_digest(&salt, password) != digest {
            warn!(%email, "login failed: wrong password");
            bail!(LOGIN_FAILED);
        }

        info!(%email, role = %account.role_tag, "login succeeded");
        Ok(Session::start(account, OffsetDateTime::now_utc()))
    }

    pub fn list_patients(&self) -> Result<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  id, upid, first_name, last_name, father_name, date_of_birth, gender,
                  phone, email, address, status, blood_group, allergies,
                  created_at, updated_at
                FROM patients
                ORDER BY id ASC
                ",
            )
            .context("prepare patients query")?;
        let rows = stmt
            .query_map([], patient_from_row)
            .context("query patients")?;
        let patients = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect patients")?;
        debug!(count = patients.len(), "loaded patients");
        Ok(patients)
    }

    pub fn get_patient(&self, patient_id: PatientId) -> Result<Patient> {
        self.conn
            .query_row(
                "
                SELECT
                  id, upid, first_name, last_name, father_name, date_of_birth, gender,
                  phone, email, address, status, blood_group, allergies,
                  created_at, updated_at
                FROM patients
                WHERE id = ?
                ",
                params![patient_id.get()],
                patient_from_row,
            )
            .with_context(|| format!("load patient {}", patient_id.get()))
    }

    /// Inserts a patient and assigns its `P{1000 + id}` identifier.
    pub fn create_patient(&self, patient: &PatientFormInput) -> Result<PatientId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO patients (
                  upid, first_name, last_name, father_name, date_of_birth, gender,
                  phone, email, address, status, blood_group, allergies,
                  created_at, updated_at
                ) VALUES ('', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    patient.first_name,
                    patient.last_name,
                    patient.father_name,
                    format_date(patient.date_of_birth),
                    patient.gender.as_str(),
                    patient.phone,
                    patient.email,
                    patient.address,
                    patient.status.as_str(),
                    patient.blood_group,
                    patient.allergies,
                    now,
                    now,
                ],
            )
            .context("insert patient")?;

        let patient_id = self.conn.last_insert_rowid();
        self.conn
            .execute(
                "UPDATE patients SET upid = ? WHERE id = ?",
                params![format!("P{}", UPID_BASE + patient_id), patient_id],
            )
            .with_context(|| format!("assign identifier to patient {patient_id}"))?;
        Ok(PatientId::new(patient_id))
    }

    pub fn update_patient(&self, patient_id: PatientId, update: &PatientFormInput) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE patients
                SET
                  first_name = ?,
                  last_name = ?,
                  father_name = ?,
                  date_of_birth = ?,
                  gender = ?,
                  phone = ?,
                  email = ?,
                  address = ?,
                  status = ?,
                  blood_group = ?,
                  allergies = ?,
                  updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.first_name,
                    update.last_name,
                    update.father_name,
                    format_date(update.date_of_birth),
                    update.gender.as_str(),
                    update.phone,
                    update.email,
                    update.address,
                    update.status.as_str(),
                    update.blood_group,
                    update.allergies,
                    now,
                    patient_id.get(),
                ],
            )
            .context("update patient")?;
        if rows_affected == 0 {
            bail!(
                "patient {} not found -- choose an existing patient and retry",
                patient_id.get()
            );
        }
        Ok(())
    }

    pub fn patient_names(&self) -> Result<Vec<LookupValue<PatientId>>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, TRIM(first_name || ' ' || last_name) FROM patients ORDER BY id ASC",
            )
            .context("prepare patient names query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LookupValue {
                    id: PatientId::new(row.get(0)?),
                    name: row.get(1)?,
                })
            })
            .context("query patient names")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect patient names")
    }

    /// Active departments, ordered by name.
    pub fn list_departments(&self) -> Result<Vec<Department>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, name, active, created_at
                FROM departments
                WHERE active = 1
                ORDER BY name ASC
                ",
            )
            .context("prepare departments query")?;
        let rows = stmt
            .query_map([], department_from_row)
            .context("query departments")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect departments")
    }

    pub fn get_department(&self, department_id: DepartmentId) -> Result<Department> {
        self.conn
            .query_row(
                "SELECT id, name, active, created_at FROM departments WHERE id = ?",
                params![department_id.get()],
                department_from_row,
            )
            .with_context(|| format!("load department {}", department_id.get()))
    }

    pub fn create_department(&self, name: &str) -> Result<DepartmentId> {
        let name = name.trim();
        if name.is_empty() {
            bail!("department name is required -- enter a name and retry");
        }
        if self.find_department(name)?.is_some() {
            bail!("department {name:?} already exists -- pick it from the list instead");
        }
        self.conn
            .execute(
                "INSERT INTO departments (name, active, created_at) VALUES (?, 1, ?)",
                params![name, now_rfc3339()?],
            )
            .with_context(|| format!("insert department {name:?}"))?;
        info!(department = name, "created department");
        Ok(DepartmentId::new(self.conn.last_insert_rowid()))
    }

    fn find_department(&self, name: &str) -> Result<Option<DepartmentId>> {
        self.conn
            .query_row(
                "SELECT id FROM departments WHERE name = ?",
                params![name],
                |row| row.get(0).map(DepartmentId::new),
            )
            .optional()
            .with_context(|| format!("look up department {name:?}"))
    }

    /// Staff rows keep the department name; a name not yet in the lookup is
    /// added so the form can offer it next time.
    fn register_department(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() || self.find_department(name)?.is_some() {
            return Ok(());
        }
        self.create_department(name).map(|_| ())
    }

    pub fn list_staff(&self) -> Result<Vec<Staff>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  id, employee_id, first_name, last_name, role, department,
                  phone, email, active, created_at, updated_at
                FROM staff
                ORDER BY id ASC
                ",
            )
            .context("prepare staff query")?;
        let rows = stmt.query_map([], staff_from_row).context("query staff")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect staff")
    }

    pub fn get_staff(&self, staff_id: StaffId) -> Result<Staff> {
        self.conn
            .query_row(
                "
                SELECT
                  id, employee_id, first_name, last_name, role, department,
                  phone, email, active, created_at, updated_at
                FROM staff
                WHERE id = ?
                ",
                params![staff_id.get()],
                staff_from_row,
            )
            .with_context(|| format!("load staff member {}", staff_id.get()))
    }

    pub fn create_staff(&self, staff: &StaffFormInput) -> Result<StaffId> {
        self.register_department(&staff.department)?;
        let now = now_rfc3339()?;
        let employee_id = if staff.employee_id.trim().is_empty() {
            let next: i64 = self
                .conn
                .query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM staff", [], |row| {
                    row.get(0)
                })
                .context("compute next employee id")?;
            format!("EMP-{}", UPID_BASE + next)
        } else {
            staff.employee_id.trim().to_owned()
        };
        self.conn
            .execute(
                "
                INSERT INTO staff (
                  employee_id, first_name, last_name, role, department,
                  phone, email, active, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    employee_id,
                    staff.first_name,
                    staff.last_name,
                    staff.role.as_str(),
                    staff.department,
                    staff.phone,
                    staff.email,
                    staff.active,
                    now,
                    now,
                ],
            )
            .with_context(|| format!("insert staff member {employee_id}"))?;
        Ok(StaffId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_staff(&self, staff_id: StaffId, update: &StaffFormInput) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE staff
                SET
                  employee_id = COALESCE(NULLIF(?, ''), employee_id),
                  first_name = ?,
                  last_name = ?,
                  role = ?,
                  department = ?,
                  phone = ?,
                  email = ?,
                  active = ?,
                  updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.employee_id.trim(),
                    update.first_name,
                    update.last_name,
                    update.role.as_str(),
                    update.department,
                    update.phone,
                    update.email,
                    update.active,
                    now,
                    staff_id.get(),
                ],
            )
            .context("update staff member")?;
        if rows_affected == 0 {
            bail!(
                "staff member {} not found -- choose an existing staff member and retry",
                staff_id.get()
            );
        }
        self.register_department(&update.department)
    }

    pub fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let sql = format!("{APPOINTMENT_SELECT} ORDER BY a.scheduled_at ASC, a.id ASC");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare appointments query")?;
        let rows = stmt
            .query_map([], appointment_from_row)
            .context("query appointments")?;
        let appointments = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect appointments")?;
        debug!(count = appointments.len(), "loaded appointments");
        Ok(appointments)
    }

    pub fn get_appointment(&self, appointment_id: AppointmentId) -> Result<Appointment> {
        let sql = format!("{APPOINTMENT_SELECT} WHERE a.id = ?");
        self.conn
            .query_row(&sql, params![appointment_id.get()], appointment_from_row)
            .with_context(|| format!("load appointment {}", appointment_id.get()))
    }

    /// Books an appointment. The token is `TOK-YYYYMMDD-NNNN`, numbered per day.
    pub fn create_appointment(&self, appointment: &AppointmentFormInput) -> Result<AppointmentId> {
        self.require_row("patients", appointment.patient_id.get(), "patient")?;
        self.require_row("staff", appointment.doctor_id.get(), "doctor")?;

        let prefix = format!(
            "TOK-{}-",
            format_date(appointment.scheduled_at.date()).replace('-', "")
        );
        let last_number: i64 = self
            .conn
            .query_row(
                "
                SELECT COALESCE(MAX(CAST(substr(token, ?) AS INTEGER)), 0)
                FROM appointments
                WHERE token LIKE ?
                ",
                params![prefix.len() as i64 + 1, format!("{prefix}%")],
                |row| row.get(0),
            )
            .with_context(|| format!("find last token for {prefix}"))?;
        let token = format!("{prefix}{:04}", last_number + 1);

        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO appointments (
                  token, patient_id, doctor_id, scheduled_at, duration_minutes,
                  kind, reason, status, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    token,
                    appointment.patient_id.get(),
                    appointment.doctor_id.get(),
                    format_wall_clock(appointment.scheduled_at),
                    appointment.duration_minutes,
                    appointment.kind,
                    appointment.reason,
                    appointment.status.as_str(),
                    now,
                    now,
                ],
            )
            .with_context(|| format!("insert appointment {token}"))?;
        Ok(AppointmentId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_appointment(
        &self,
        appointment_id: AppointmentId,
        update: &AppointmentFormInput,
    ) -> Result<()> {
        self.require_row("patients", update.patient_id.get(), "patient")?;
        self.require_row("staff", update.doctor_id.get(), "doctor")?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE appointments
                SET
                  patient_id = ?,
                  doctor_id = ?,
                  scheduled_at = ?,
                  duration_minutes = ?,
                  kind = ?,
                  reason = ?,
                  status = ?,
                  updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.patient_id.get(),
                    update.doctor_id.get(),
                    format_wall_clock(update.scheduled_at),
                    update.duration_minutes,
                    update.kind,
                    update.reason,
                    update.status.as_str(),
                    now,
                    appointment_id.get(),
                ],
            )
            .context("update appointment")?;
        if rows_affected == 0 {
            bail!(
                "appointment {} not found -- choose an existing appointment and retry",
                appointment_id.get()
            );
        }
        Ok(())
    }

    /// Moves an open appointment to `status`, stamping check-in and
    /// completion times. Closed appointments refuse further changes.
    pub fn update_appointment_status(
        &self,
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<()> {
        let current = self.get_appointment(appointment_id)?;
        if current.status == status {
            return Ok(());
        }
        if current.status.is_closed() {
            bail!(
                "appointment {} is already {} -- book a new appointment instead",
                current.token,
                current.status.label()
            );
        }

        let now = now_rfc3339()?;
        let checked_in_at = (status == AppointmentStatus::CheckedIn).then(|| now.clone());
        let completed_at = (status == AppointmentStatus::Completed).then(|| now.clone());
        self.conn
            .execute(
                "
                UPDATE appointments
                SET
                  status = ?,
                  checked_in_at = COALESCE(?, checked_in_at),
                  completed_at = COALESCE(?, completed_at),
                  updated_at = ?
                WHERE id = ?
                ",
                params![
                    status.as_str(),
                    checked_in_at,
                    completed_at,
                    now,
                    appointment_id.get()
                ],
            )
            .with_context(|| format!("set appointment {} status", current.token))?;
        info!(token = %current.token, status = status.as_str(), "appointment status changed");
        Ok(())
    }

    pub fn cancel_appointment(&self, appointment_id: AppointmentId) -> Result<()> {
        self.update_appointment_status(appointment_id, AppointmentStatus::Cancelled)
    }

    pub fn list_prescriptions(&self) -> Result<Vec<Prescription>> {
        let sql = format!("{PRESCRIPTION_SELECT} ORDER BY r.id DESC");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare prescriptions query")?;
        let rows = stmt
            .query_map([], prescription_from_row)
            .context("query prescriptions")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect prescriptions")
    }

    pub fn get_prescription(&self, prescription_id: PrescriptionId) -> Result<Prescription> {
        let sql = format!("{PRESCRIPTION_SELECT} WHERE r.id = ?");
        self.conn
            .query_row(&sql, params![prescription_id.get()], prescription_from_row)
            .with_context(|| format!("load prescription {}", prescription_id.get()))
    }

    pub fn create_prescription(
        &self,
        prescription: &PrescriptionFormInput,
    ) -> Result<PrescriptionId> {
        self.require_row("patients", prescription.patient_id.get(), "patient")?;
        self.require_row("staff", prescription.doctor_id.get(), "doctor")?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO prescriptions (
                  rx_number, patient_id, doctor_id, issued_on, medications, status,
                  created_at, updated_at
                ) VALUES ('', ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    prescription.patient_id.get(),
                    prescription.doctor_id.get(),
                    format_date(prescription.issued_on),
                    prescription.medications,
                    prescription.status.as_str(),
                    now,
                    now,
                ],
            )
            .context("insert prescription")?;
        let id = self.conn.last_insert_rowid();
        self.assign_number("prescriptions", "rx_number", "RX", id)?;
        Ok(PrescriptionId::new(id))
    }

    pub fn update_prescription(
        &self,
        prescription_id: PrescriptionId,
        update: &PrescriptionFormInput,
    ) -> Result<()> {
        self.require_row("patients", update.patient_id.get(), "patient")?;
        self.require_row("staff", update.doctor_id.get(), "doctor")?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE prescriptions
                SET patient_id = ?, doctor_id = ?, issued_on = ?, medications = ?,
                    status = ?, updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.patient_id.get(),
                    update.doctor_id.get(),
                    format_date(update.issued_on),
                    update.medications,
                    update.status.as_str(),
                    now,
                    prescription_id.get(),
                ],
            )
            .context("update prescription")?;
        if rows_affected == 0 {
            bail!("prescription {} not found", prescription_id.get());
        }
        Ok(())
    }

    pub fn dispense_prescription(&self, prescription_id: PrescriptionId) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE prescriptions
                SET status = ?, updated_at = ?
                WHERE id = ? AND status = ?
                ",
                params![
                    PrescriptionStatus::Dispensed.as_str(),
                    now,
                    prescription_id.get(),
                    PrescriptionStatus::Pending.as_str(),
                ],
            )
            .context("dispense prescription")?;
        if rows_affected == 0 {
            bail!(
                "prescription {} is not pending -- only pending prescriptions can be dispensed",
                prescription_id.get()
            );
        }
        Ok(())
    }

    pub fn list_medications(&self) -> Result<Vec<Medication>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  id, name, generic_name, strength, stock, reorder_level,
                  expiry_date, unit_price_cents, created_at, updated_at
                FROM medications
                ORDER BY name COLLATE NOCASE ASC, id ASC
                ",
            )
            .context("prepare medications query")?;
        let rows = stmt
            .query_map([], medication_from_row)
            .context("query medications")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect medications")
    }

    pub fn get_medication(&self, medication_id: MedicationId) -> Result<Medication> {
        self.conn
            .query_row(
                "
                SELECT
                  id, name, generic_name, strength, stock, reorder_level,
                  expiry_date, unit_price_cents, created_at, updated_at
                FROM medications
                WHERE id = ?
                ",
                params![medication_id.get()],
                medication_from_row,
            )
            .with_context(|| format!("load medication {}", medication_id.get()))
    }

    pub fn create_medication(&self, medication: &MedicationFormInput) -> Result<MedicationId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO medications (
                  name, generic_name, strength, stock, reorder_level,
                  expiry_date, unit_price_cents, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    medication.name,
                    medication.generic_name,
                    medication.strength,
                    medication.stock,
                    medication.reorder_level,
                    medication.expiry_date.map(format_date),
                    medication.unit_price_cents,
                    now,
                    now,
                ],
            )
            .context("insert medication")?;
        Ok(MedicationId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_medication(
        &self,
        medication_id: MedicationId,
        update: &MedicationFormInput,
    ) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE medications
                SET name = ?, generic_name = ?, strength = ?, stock = ?, reorder_level = ?,
                    expiry_date = ?, unit_price_cents = ?, updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.name,
                    update.generic_name,
                    update.strength,
                    update.stock,
                    update.reorder_level,
                    update.expiry_date.map(format_date),
                    update.unit_price_cents,
                    now,
                    medication_id.get(),
                ],
            )
            .context("update medication")?;
        if rows_affected == 0 {
            bail!("medication {} not found", medication_id.get());
        }
        Ok(())
    }

    pub fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let sql = format!("{INVOICE_SELECT} ORDER BY i.id DESC");
        let mut stmt = self.conn.prepare(&sql).context("prepare invoices query")?;
        let rows = stmt
            .query_map([], invoice_from_row)
            .context("query invoices")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect invoices")
    }

    pub fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice> {
        let sql = format!("{INVOICE_SELECT} WHERE i.id = ?");
        self.conn
            .query_row(&sql, params![invoice_id.get()], invoice_from_row)
            .with_context(|| format!("load invoice {}", invoice_id.get()))
    }

    pub fn create_invoice(&self, invoice: &InvoiceFormInput) -> Result<InvoiceId> {
        self.require_row("patients", invoice.patient_id.get(), "patient")?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO invoices (
                  invoice_number, patient_id, services, amount_cents, paid_cents,
                  issued_on, created_at, updated_at
                ) VALUES ('', ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    invoice.patient_id.get(),
                    invoice.services,
                    invoice.amount_cents,
                    invoice.paid_cents,
                    format_date(invoice.issued_on),
                    now,
                    now,
                ],
            )
            .context("insert invoice")?;
        let id = self.conn.last_insert_rowid();
        self.assign_number("invoices", "invoice_number", "INV", id)?;
        Ok(InvoiceId::new(id))
    }

    pub fn update_invoice(&self, invoice_id: InvoiceId, update: &InvoiceFormInput) -> Result<()> {
        self.require_row("patients", update.patient_id.get(), "patient")?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE invoices
                SET patient_id = ?, services = ?, amount_cents = ?, paid_cents = ?,
                    issued_on = ?, updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.patient_id.get(),
                    update.services,
                    update.amount_cents,
                    update.paid_cents,
                    format_date(update.issued_on),
                    now,
                    invoice_id.get(),
                ],
            )
            .context("update invoice")?;
        if rows_affected == 0 {
            bail!("invoice {} not found", invoice_id.get());
        }
        Ok(())
    }

    pub fn list_lab_orders(&self) -> Result<Vec<LabOrder>> {
        let sql = format!("{LAB_ORDER_SELECT} ORDER BY l.id DESC");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare lab orders query")?;
        let rows = stmt
            .query_map([], lab_order_from_row)
            .context("query lab orders")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect lab orders")
    }

    pub fn get_lab_order(&self, lab_order_id: LabOrderId) -> Result<LabOrder> {
        let sql = format!("{LAB_ORDER_SELECT} WHERE l.id = ?");
        self.conn
            .query_row(&sql, params![lab_order_id.get()], lab_order_from_row)
            .with_context(|| format!("load lab order {}", lab_order_id.get()))
    }

    pub fn create_lab_order(&self, order: &LabOrderFormInput) -> Result<LabOrderId> {
        self.require_row("patients", order.patient_id.get(), "patient")?;
        self.require_row("staff", order.ordered_by.get(), "ordering staff member")?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO lab_orders (
                  test_number, patient_id, test_type, ordered_by, ordered_on, status, result,
                  created_at, updated_at
                ) VALUES ('', ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    order.patient_id.get(),
                    order.test_type,
                    order.ordered_by.get(),
                    format_date(order.ordered_on),
                    order.status.as_str(),
                    order.result,
                    now,
                    now,
                ],
            )
            .context("insert lab order")?;
        let id = self.conn.last_insert_rowid();
        self.assign_number("lab_orders", "test_number", "LAB", id)?;
        Ok(LabOrderId::new(id))
    }

    pub fn update_lab_order(&self, lab_order_id: LabOrderId, update: &LabOrderFormInput) -> Result<()> {
        self.require_row("patients", update.patient_id.get(), "patient")?;
        self.require_row("staff", update.ordered_by.get(), "ordering staff member")?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE lab_orders
                SET patient_id = ?, test_type = ?, ordered_by = ?, ordered_on = ?,
                    status = ?, result = ?, updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.patient_id.get(),
                    update.test_type,
                    update.ordered_by.get(),
                    format_date(update.ordered_on),
                    update.status.as_str(),
                    update.result,
                    now,
                    lab_order_id.get(),
                ],
            )
            .context("update lab order")?;
        if rows_affected == 0 {
            bail!("lab order {} not found", lab_order_id.get());
        }
        Ok(())
    }

    pub fn list_radiology_orders(&self) -> Result<Vec<RadiologyOrder>> {
        let sql = format!("{RADIOLOGY_ORDER_SELECT} ORDER BY o.id DESC");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare radiology orders query")?;
        let rows = stmt
            .query_map([], radiology_order_from_row)
            .context("query radiology orders")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect radiology orders")
    }

    pub fn get_radiology_order(&self, order_id: RadiologyOrderId) -> Result<RadiologyOrder> {
        let sql = format!("{RADIOLOGY_ORDER_SELECT} WHERE o.id = ?");
        self.conn
            .query_row(&sql, params![order_id.get()], radiology_order_from_row)
            .with_context(|| format!("load radiology order {}", order_id.get()))
    }

    pub fn create_radiology_order(
        &self,
        order: &RadiologyOrderFormInput,
    ) -> Result<RadiologyOrderId> {
        self.require_row("patients", order.patient_id.get(), "patient")?;
        self.require_row("staff", order.ordered_by.get(), "ordering staff member")?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO radiology_orders (
                  order_number, patient_id, study_type, ordered_by, ordered_on, status,
                  findings, created_at, updated_at
                ) VALUES ('', ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    order.patient_id.get(),
                    order.study_type,
                    order.ordered_by.get(),
                    format_date(order.ordered_on),
                    order.status.as_str(),
                    order.findings,
                    now,
                    now,
                ],
            )
            .context("insert radiology order")?;
        let id = self.conn.last_insert_rowid();
        self.assign_number("radiology_orders", "order_number", "RAD", id)?;
        Ok(RadiologyOrderId::new(id))
    }

    pub fn update_radiology_order(
        &self,
        order_id: RadiologyOrderId,
        update: &RadiologyOrderFormInput,
    ) -> Result<()> {
        self.require_row("patients", update.patient_id.get(), "patient")?;
        self.require_row("staff", update.ordered_by.get(), "ordering staff member")?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE radiology_orders
                SET patient_id = ?, study_type = ?, ordered_by = ?, ordered_on = ?,
                    status = ?, findings = ?, updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.patient_id.get(),
                    update.study_type,
                    update.ordered_by.get(),
                    format_date(update.ordered_on),
                    update.status.as_str(),
                    update.findings,
                    now,
                    order_id.get(),
                ],
            )
            .context("update radiology order")?;
        if rows_affected == 0 {
            bail!("radiology order {} not found", order_id.get());
        }
        Ok(())
    }

    pub fn dashboard_counts(&self, today: Date) -> Result<DashboardCounts> {
        let today = format_date(today);
        Ok(DashboardCounts {
            patients_total: self.count("SELECT COUNT(*) FROM patients", [], "count patients")?,
            patients_admitted: self.count(
                "SELECT COUNT(*) FROM patients WHERE status = 'IPD'",
                [],
                "count admitted patients",
            )?,
            patients_emergency: self.count(
                "SELECT COUNT(*) FROM patients WHERE status = 'EMERGENCY'",
                [],
                "count emergency patients",
            )?,
            staff_active: self.count(
                "SELECT COUNT(*) FROM staff WHERE active = 1",
                [],
                "count active staff",
            )?,
            appointments_today: self.count(
                "SELECT COUNT(*) FROM appointments WHERE substr(scheduled_at, 1, 10) = ?",
                [&today],
                "count today's appointments",
            )?,
            appointments_waiting: self.count(
                "
                SELECT COUNT(*)
                FROM appointments
                WHERE substr(scheduled_at, 1, 10) = ?
                  AND status IN ('CHECKED_IN', 'IN_CONSULTATION')
                ",
                [&today],
                "count waiting patients",
            )?,
            prescriptions_pending: self.count(
                "SELECT COUNT(*) FROM prescriptions WHERE status = 'PENDING'",
                [],
                "count pending prescriptions",
            )?,
            medications_low_stock: self.count(
                "SELECT COUNT(*) FROM medications WHERE stock <= reorder_level",
                [],
                "count low-stock medications",
            )?,
            lab_orders_open: self.count(
                "SELECT COUNT(*) FROM lab_orders WHERE status <> 'COMPLETED'",
                [],
                "count open lab orders",
            )?,
            radiology_orders_open: self.count(
                "SELECT COUNT(*) FROM radiology_orders WHERE status IN ('PENDING', 'IN_PROGRESS')",
                [],
                "count open radiology orders",
            )?,
            invoices_unpaid: self.count(
                "SELECT COUNT(*) FROM invoices WHERE paid_cents < amount_cents",
                [],
                "count unpaid invoices",
            )?,
            outstanding_cents: self.sum(
                "SELECT COALESCE(SUM(amount_cents - paid_cents), 0) FROM invoices",
                "sum outstanding balance",
            )?,
            collected_cents: self.sum(
                "SELECT COALESCE(SUM(paid_cents), 0) FROM invoices",
                "sum collected payments",
            )?,
        })
    }

    /// Flat metric rows for the reports tab.
    pub fn report_summary(&self, today: Date) -> Result<Vec<ReportRow>> {
        let counts = self.dashboard_counts(today)?;
        let mut rows = Vec::new();
        let mut push = |section: &str, metric: String, value: String| {
            rows.push(ReportRow {
                id: rows.len() as i64 + 1,
                section: section.to_owned(),
                metric,
                value,
            });
        };

        push("patients", "registered".to_owned(), counts.patients_total.to_string());
        for status in PatientStatus::ALL {
            let count = self.count(
                "SELECT COUNT(*) FROM patients WHERE status = ?",
                [status.as_str()],
                "count patients by status",
            )?;
            push("patients", status.label().to_owned(), count.to_string());
        }
        push("staff", "active".to_owned(), counts.staff_active.to_string());
        for status in AppointmentStatus::ALL {
            let count = self.count(
                "SELECT COUNT(*) FROM appointments WHERE status = ?",
                [status.as_str()],
                "count appointments by status",
            )?;
            push("appointments", status.label().to_owned(), count.to_string());
        }
        push(
            "pharmacy",
            "pending prescriptions".to_owned(),
            counts.prescriptions_pending.to_string(),
        );
        push(
            "pharmacy",
            "low stock items".to_owned(),
            counts.medications_low_stock.to_string(),
        );
        push(
            "diagnostics",
            "open lab orders".to_owned(),
            counts.lab_orders_open.to_string(),
        );
        push(
            "diagnostics",
            "open imaging orders".to_owned(),
            counts.radiology_orders_open.to_string(),
        );
        push(
            "finance",
            "billed".to_owned(),
            format_money(counts.collected_cents + counts.outstanding_cents),
        );
        push(
            "finance",
            "collected".to_owned(),
            format_money(counts.collected_cents),
        );
        push(
            "finance",
            "outstanding".to_owned(),
            format_money(counts.outstanding_cents),
        );
        push(
            "finance",
            "unpaid invoices".to_owned(),
            counts.invoices_unpaid.to_string(),
        );
        Ok(rows)
    }

    pub fn seed_demo_data(&self) -> Result<()> {
        demo::seed(self)
    }

    pub(crate) fn account_count(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM accounts", [], "count accounts")
    }

    fn count<P: rusqlite::Params>(&self, sql: &str, params: P, what: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(sql, params, |row| row.get(0))
            .with_context(|| what.to_owned())?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn sum(&self, sql: &str, what: &str) -> Result<i64> {
        self.conn
            .query_row(sql, [], |row| row.get(0))
            .with_context(|| what.to_owned())
    }

    fn require_row(&self, table: &str, id: i64, label: &str) -> Result<()> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)");
        let exists: i64 = self
            .conn
            .query_row(&sql, params![id], |row| row.get(0))
            .with_context(|| format!("check {label} {id}"))?;
        if exists != 1 {
            bail!("{label} {id} does not exist -- enter an existing id and retry");
        }
        Ok(())
    }

    fn assign_number(&self, table: &str, column: &str, prefix: &str, id: i64) -> Result<()> {
        let sql = format!("UPDATE {table} SET {column} = ? WHERE id = ?");
        self.conn
            .execute(&sql, params![format!("{prefix}-{id:05}"), id])
            .with_context(|| format!("assign {column} for {table} {id}"))?;
        Ok(())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("CAREBASE_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set CAREBASE_DB_PATH to a writable database path")
    })?;
    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("carebase.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }
    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }
    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }
    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }
    Ok(())
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let date_of_birth_raw: String = row.get(5)?;
    let created_at_raw: String = row.get(13)?;
    let updated_at_raw: String = row.get(14)?;
    Ok(Patient {
        id: PatientId::new(row.get(0)?),
        upid: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        father_name: row.get(4)?,
        date_of_birth: parse_date(&date_of_birth_raw).map_err(to_sql_error)?,
        gender: parse_tag(row, 6, "gender", Gender::parse)?,
        phone: row.get(7)?,
        email: row.get(8)?,
        address: row.get(9)?,
        status: parse_tag(row, 10, "patient status", PatientStatus::parse)?,
        blood_group: row.get(11)?,
        allergies: row.get(12)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn department_from_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    let created_at_raw: String = row.get(3)?;
    Ok(Department {
        id: DepartmentId::new(row.get(0)?),
        name: row.get(1)?,
        active: row.get(2)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
    })
}

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    let created_at_raw: String = row.get(9)?;
    let updated_at_raw: String = row.get(10)?;
    Ok(Staff {
        id: StaffId::new(row.get(0)?),
        employee_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        role: parse_tag(row, 4, "staff role", Role::parse)?,
        department: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        active: row.get(8)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let scheduled_at_raw: String = row.get(6)?;
    let checked_in_at_raw: Option<String> = row.get(11)?;
    let completed_at_raw: Option<String> = row.get(12)?;
    let created_at_raw: String = row.get(13)?;
    let updated_at_raw: String = row.get(14)?;
    Ok(Appointment {
        id: AppointmentId::new(row.get(0)?),
        token: row.get(1)?,
        patient_id: PatientId::new(row.get(2)?),
        patient_name: row.get(3)?,
        doctor_id: StaffId::new(row.get(4)?),
        doctor_name: row.get(5)?,
        scheduled_at: parse_wall_clock(&scheduled_at_raw).map_err(to_sql_error)?,
        duration_minutes: row.get(7)?,
        kind: row.get(8)?,
        reason: row.get(9)?,
        status: parse_tag(row, 10, "appointment status", AppointmentStatus::parse)?,
        checked_in_at: parse_opt_datetime(checked_in_at_raw).map_err(to_sql_error)?,
        completed_at: parse_opt_datetime(completed_at_raw).map_err(to_sql_error)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn prescription_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    let issued_on_raw: String = row.get(6)?;
    let created_at_raw: String = row.get(9)?;
    let updated_at_raw: String = row.get(10)?;
    Ok(Prescription {
        id: PrescriptionId::new(row.get(0)?),
        rx_number: row.get(1)?,
        patient_id: PatientId::new(row.get(2)?),
        patient_name: row.get(3)?,
        doctor_id: StaffId::new(row.get(4)?),
        doctor_name: row.get(5)?,
        issued_on: parse_date(&issued_on_raw).map_err(to_sql_error)?,
        medications: row.get(7)?,
        status: parse_tag(row, 8, "prescription status", PrescriptionStatus::parse)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    let expiry_date_raw: Option<String> = row.get(6)?;
    let created_at_raw: String = row.get(8)?;
    let updated_at_raw: String = row.get(9)?;
    Ok(Medication {
        id: MedicationId::new(row.get(0)?),
        name: row.get(1)?,
        generic_name: row.get(2)?,
        strength: row.get(3)?,
        stock: row.get(4)?,
        reorder_level: row.get(5)?,
        expiry_date: parse_opt_date(expiry_date_raw).map_err(to_sql_error)?,
        unit_price_cents: row.get(7)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    let issued_on_raw: String = row.get(7)?;
    let created_at_raw: String = row.get(8)?;
    let updated_at_raw: String = row.get(9)?;
    Ok(Invoice {
        id: InvoiceId::new(row.get(0)?),
        invoice_number: row.get(1)?,
        patient_id: PatientId::new(row.get(2)?),
        patient_name: row.get(3)?,
        services: row.get(4)?,
        amount_cents: row.get(5)?,
        paid_cents: row.get(6)?,
        issued_on: parse_date(&issued_on_raw).map_err(to_sql_error)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn lab_order_from_row(row: &Row<'_>) -> rusqlite::Result<LabOrder> {
    let ordered_on_raw: String = row.get(7)?;
    let created_at_raw: String = row.get(10)?;
    let updated_at_raw: String = row.get(11)?;
    Ok(LabOrder {
        id: LabOrderId::new(row.get(0)?),
        test_number: row.get(1)?,
        patient_id: PatientId::new(row.get(2)?),
        patient_name: row.get(3)?,
        test_type: row.get(4)?,
        ordered_by: StaffId::new(row.get(5)?),
        ordered_by_name: row.get(6)?,
        ordered_on: parse_date(&ordered_on_raw).map_err(to_sql_error)?,
        status: parse_tag(row, 8, "lab order status", LabOrderStatus::parse)?,
        result: row.get(9)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn radiology_order_from_row(row: &Row<'_>) -> rusqlite::Result<RadiologyOrder> {
    let ordered_on_raw: String = row.get(7)?;
    let created_at_raw: String = row.get(10)?;
    let updated_at_raw: String = row.get(11)?;
    Ok(RadiologyOrder {
        id: RadiologyOrderId::new(row.get(0)?),
        order_number: row.get(1)?,
        patient_id: PatientId::new(row.get(2)?),
        patient_name: row.get(3)?,
        study_type: row.get(4)?,
        ordered_by: StaffId::new(row.get(5)?),
        ordered_by_name: row.get(6)?,
        ordered_on: parse_date(&ordered_on_raw).map_err(to_sql_error)?,
        status: parse_tag(row, 8, "radiology status", RadiologyStatus::parse)?,
        findings: row.get(9)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn parse_tag<T>(
    row: &Row<'_>,
    index: usize,
    what: &str,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(index)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown {what} {raw}"),
            )),
        )
    })
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a carebase database or migrate first"
            );
        }
        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();
        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }
    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;
    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_digest(salt: &str, password: &str) -> String {
    checksum_sha256(format!("{salt}:{password}").as_bytes())
}

fn checksum_sha256(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut output = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }
    bail!("unsupported datetime format {raw:?}")
}

fn parse_opt_datetime(raw: Option<String>) -> Result<Option<OffsetDateTime>> {
    raw.as_deref().map(parse_datetime).transpose()
}

fn parse_date(raw: &str) -> Result<Date> {
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Ok(value);
    }
    let date_time = parse_datetime(raw)?;
    Ok(date_time.date())
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.as_deref().map(parse_date).transpose()
}

/// Appointment times are local wall-clock values with no offset.
fn parse_wall_clock(raw: &str) -> Result<PrimitiveDateTime> {
    PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]"),
    )
    .with_context(|| format!("unsupported appointment time {raw:?}"))
}

fn format_wall_clock(value: PrimitiveDateTime) -> String {
    format!(
        "{} {:02}:{:02}",
        format_date(value.date()),
        value.hour(),
        value.minute()
    )
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

#[cfg(test)]
mod tests {
    use super::{checksum_sha256, format_wall_clock, parse_wall_clock, password_digest};
    use anyhow::Result;
    use time::macros::datetime;

    #[test]
    fn password_digest_is_salted_sha256() {
        let digest = password_digest("abc", "secret");
        assert_eq!(digest, checksum_sha256(b"abc:secret"));
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, password_digest("abd", "secret"));
    }

    #[test]
    fn wall_clock_round_trip() -> Result<()> {
        let value = datetime!(2026-03-09 14:05);
        let raw = format_wall_clock(value);
        assert_eq!(raw, "2026-03-09 14:05");
        assert_eq!(parse_wall_clock(&raw)?, value);
        Ok(())
    }
}
