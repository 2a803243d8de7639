// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use time::{Date, PrimitiveDateTime};

use crate::validation::{
    format_cents_input, format_datetime_input, parse_optional_cents, parse_optional_date,
    parse_required_cents, parse_required_date, parse_required_datetime, parse_required_int,
};
use crate::{
    Appointment, AppointmentStatus, FormKind, Gender, Invoice, LabOrder, LabOrderStatus,
    Medication, Patient, PatientId, PatientStatus, Prescription, PrescriptionStatus,
    RadiologyOrder, RadiologyStatus, Role, Staff, StaffId, age_on,
};

pub const DEFAULT_APPOINTMENT_MINUTES: i32 = 30;
const APPOINTMENT_MINUTES: std::ops::RangeInclusive<i32> = 5..=480;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientFormInput {
    pub first_name: String,
    pub last_name: String,
    pub father_name: String,
    pub date_of_birth: Date,
    pub gender: Gender,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub status: PatientStatus,
    pub blood_group: String,
    pub allergies: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentFormInput {
    pub patient_id: PatientId,
    pub doctor_id: StaffId,
    pub scheduled_at: PrimitiveDateTime,
    pub duration_minutes: i32,
    pub kind: String,
    pub reason: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffFormInput {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub department: String,
    pub phone: String,
    pub email: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionFormInput {
    pub patient_id: PatientId,
    pub doctor_id: StaffId,
    pub issued_on: Date,
    pub medications: String,
    pub status: PrescriptionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationFormInput {
    pub name: String,
    pub generic_name: String,
    pub strength: String,
    pub stock: i64,
    pub reorder_level: i64,
    pub expiry_date: Option<Date>,
    pub unit_price_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceFormInput {
    pub patient_id: PatientId,
    pub services: String,
    pub amount_cents: i64,
    pub paid_cents: i64,
    pub issued_on: Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabOrderFormInput {
    pub patient_id: PatientId,
    pub test_type: String,
    pub ordered_by: StaffId,
    pub ordered_on: Date,
    pub status: LabOrderStatus,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadiologyOrderFormInput {
    pub patient_id: PatientId,
    pub study_type: String,
    pub ordered_by: StaffId,
    pub ordered_on: Date,
    pub status: RadiologyStatus,
    pub findings: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Patient(PatientFormInput),
    Appointment(AppointmentFormInput),
    Staff(StaffFormInput),
    Prescription(PrescriptionFormInput),
    Medication(MedicationFormInput),
    Invoice(InvoiceFormInput),
    LabOrder(LabOrderFormInput),
    RadiologyOrder(RadiologyOrderFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Patient(_) => FormKind::Patient,
            Self::Appointment(_) => FormKind::Appointment,
            Self::Staff(_) => FormKind::Staff,
            Self::Prescription(_) => FormKind::Prescription,
            Self::Medication(_) => FormKind::Medication,
            Self::Invoice(_) => FormKind::Invoice,
            Self::LabOrder(_) => FormKind::LabOrder,
            Self::RadiologyOrder(_) => FormKind::RadiologyOrder,
        }
    }

    pub fn validate(&self, today: Date) -> Result<()> {
        match self {
            Self::Patient(patient) => patient.validate(today),
            Self::Appointment(appointment) => appointment.validate(),
            Self::Staff(staff) => staff.validate(),
            Self::Prescription(prescription) => prescription.validate(),
            Self::Medication(medication) => medication.validate(),
            Self::Invoice(invoice) => invoice.validate(),
            Self::LabOrder(order) => order.validate(),
            Self::RadiologyOrder(order) => order.validate(),
        }
    }
}

impl PatientFormInput {
    pub fn validate(&self, today: Date) -> Result<()> {
        if self.first_name.trim().is_empty() {
            bail!("patient first name is required -- enter a first name and retry");
        }
        if self.last_name.trim().is_empty() {
            bail!("patient last name is required -- enter a last name and retry");
        }
        if self.phone.trim().is_empty() {
            bail!("patient phone is required -- enter a phone number and retry");
        }
        if self.date_of_birth > today {
            bail!("patient date of birth cannot be in the future");
        }
        validate_optional_email(&self.email, "patient")
    }
}

impl AppointmentFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.patient_id.get() <= 0 {
            bail!("appointment patient is required -- enter a patient id and retry");
        }
        if self.doctor_id.get() <= 0 {
            bail!("appointment doctor is required -- enter a doctor id and retry");
        }
        if !APPOINTMENT_MINUTES.contains(&self.duration_minutes) {
            bail!(
                "appointment duration must be between {} and {} minutes",
                APPOINTMENT_MINUTES.start(),
                APPOINTMENT_MINUTES.end()
            );
        }
        Ok(())
    }
}

impl StaffFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            bail!("staff first and last name are required -- enter both and retry");
        }
        if self.email.trim().is_empty() {
            bail!("staff email is required -- enter an email address and retry");
        }
        validate_optional_email(&self.email, "staff")
    }
}

impl PrescriptionFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.patient_id.get() <= 0 {
            bail!("prescription patient is required -- enter a patient id and retry");
        }
        if self.doctor_id.get() <= 0 {
            bail!("prescription doctor is required -- enter a doctor id and retry");
        }
        if self.medications.trim().is_empty() {
            bail!("prescription needs at least one medication -- list the medications and retry");
        }
        Ok(())
    }
}

impl MedicationFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("medication name is required -- enter a name and retry");
        }
        if self.stock < 0 {
            bail!("medication stock cannot be negative");
        }
        if self.reorder_level < 0 {
            bail!("medication reorder level cannot be negative");
        }
        if let Some(price) = self.unit_price_cents
            && price < 0
        {
            bail!("medication unit price cannot be negative");
        }
        Ok(())
    }
}

impl InvoiceFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.patient_id.get() <= 0 {
            bail!("invoice patient is required -- enter a patient id and retry");
        }
        if self.services.trim().is_empty() {
            bail!("invoice services are required -- describe the billed services and retry");
        }
        if self.amount_cents <= 0 {
            bail!("invoice amount must be positive");
        }
        if self.paid_cents < 0 {
            bail!("invoice paid amount cannot be negative");
        }
        if self.paid_cents > self.amount_cents {
            bail!("invoice paid amount cannot exceed the invoice amount");
        }
        Ok(())
    }
}

impl LabOrderFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.patient_id.get() <= 0 {
            bail!("lab order patient is required -- enter a patient id and retry");
        }
        if self.test_type.trim().is_empty() {
            bail!("lab order test type is required -- enter a test and retry");
        }
        if self.ordered_by.get() <= 0 {
            bail!("lab order needs an ordering staff id");
        }
        if self.status == LabOrderStatus::Completed && self.result.trim().is_empty() {
            bail!("completed lab orders need a result -- enter the result and retry");
        }
        Ok(())
    }
}

impl RadiologyOrderFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.patient_id.get() <= 0 {
            bail!("radiology order patient is required -- enter a patient id and retry");
        }
        if self.study_type.trim().is_empty() {
            bail!("radiology study type is required -- enter a study and retry");
        }
        if self.ordered_by.get() <= 0 {
            bail!("radiology order needs an ordering staff id");
        }
        if self.status == RadiologyStatus::Reported && self.findings.trim().is_empty() {
            bail!("reported studies need findings -- enter the findings and retry");
        }
        Ok(())
    }
}

fn validate_optional_email(email: &str, entity: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(());
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => bail!("{entity} email {email:?} is not a valid address"),
    }
}

/// One text field of a form. Fields with `choices` are cycled, not typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub choices: &'static [&'static str],
}

const fn text(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        choices: &[],
    }
}

const fn choice(
    key: &'static str,
    label: &'static str,
    choices: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        choices,
    }
}

const GENDERS: &[&str] = &["MALE", "FEMALE", "OTHER"];
const PATIENT_STATUSES: &[&str] = &["OPD", "IPD", "DISCHARGED", "EMERGENCY", "DECEASED"];
const APPOINTMENT_STATUSES: &[&str] = &[
    "SCHEDULED",
    "CHECKED_IN",
    "IN_CONSULTATION",
    "COMPLETED",
    "CANCELLED",
    "NO_SHOW",
];
const ROLES: &[&str] = &[
    "ADMIN",
    "DOCTOR",
    "NURSE",
    "RECEPTIONIST",
    "PHARMACIST",
    "LAB_TECH",
    "RADIOLOGIST",
    "FINANCE",
    "HR",
    "PATIENT",
    "AUDITOR",
];
const YES_NO: &[&str] = &["yes", "no"];
const PRESCRIPTION_STATUSES: &[&str] = &["PENDING", "DISPENSED", "CANCELLED"];
const LAB_STATUSES: &[&str] = &["PENDING", "IN_PROGRESS", "COMPLETED"];
const RADIOLOGY_STATUSES: &[&str] = &["PENDING", "IN_PROGRESS", "COMPLETED", "REPORTED"];

const PATIENT_FIELDS: &[FieldSpec] = &[
    text("first_name", "first name"),
    text("last_name", "last name"),
    text("father_name", "father's name"),
    text("date_of_birth", "date of birth"),
    choice("gender", "gender", GENDERS),
    text("phone", "phone"),
    text("email", "email"),
    text("address", "address"),
    choice("status", "status", PATIENT_STATUSES),
    text("blood_group", "blood group"),
    text("allergies", "allergies"),
];

const APPOINTMENT_FIELDS: &[FieldSpec] = &[
    text("patient_id", "patient id"),
    text("doctor_id", "doctor id"),
    text("scheduled_at", "date/time"),
    text("duration_minutes", "minutes"),
    text("kind", "type"),
    text("reason", "reason"),
    choice("status", "status", APPOINTMENT_STATUSES),
];

const STAFF_FIELDS: &[FieldSpec] = &[
    text("employee_id", "employee id"),
    text("first_name", "first name"),
    text("last_name", "last name"),
    choice("role", "role", ROLES),
    text("department", "department"),
    text("phone", "phone"),
    text("email", "email"),
    choice("active", "active", YES_NO),
];

const PRESCRIPTION_FIELDS: &[FieldSpec] = &[
    text("patient_id", "patient id"),
    text("doctor_id", "doctor id"),
    text("issued_on", "issued on"),
    text("medications", "medications"),
    choice("status", "status", PRESCRIPTION_STATUSES),
];

const MEDICATION_FIELDS: &[FieldSpec] = &[
    text("name", "name"),
    text("generic_name", "generic name"),
    text("strength", "strength"),
    text("stock", "stock"),
    text("reorder_level", "reorder level"),
    text("expiry_date", "expiry date"),
    text("unit_price", "unit price"),
];

const INVOICE_FIELDS: &[FieldSpec] = &[
    text("patient_id", "patient id"),
    text("services", "services"),
    text("amount", "amount"),
    text("paid", "paid"),
    text("issued_on", "issued on"),
];

const LAB_ORDER_FIELDS: &[FieldSpec] = &[
    text("patient_id", "patient id"),
    text("test_type", "test"),
    text("ordered_by", "ordered by (staff id)"),
    text("ordered_on", "ordered on"),
    choice("status", "status", LAB_STATUSES),
    text("result", "result"),
];

const RADIOLOGY_ORDER_FIELDS: &[FieldSpec] = &[
    text("patient_id", "patient id"),
    text("study_type", "study"),
    text("ordered_by", "ordered by (staff id)"),
    text("ordered_on", "ordered on"),
    choice("status", "status", RADIOLOGY_STATUSES),
    text("findings", "findings"),
];

pub fn form_fields(kind: FormKind) -> &'static [FieldSpec] {
    match kind {
        FormKind::Patient => PATIENT_FIELDS,
        FormKind::Appointment => APPOINTMENT_FIELDS,
        FormKind::Staff => STAFF_FIELDS,
        FormKind::Prescription => PRESCRIPTION_FIELDS,
        FormKind::Medication => MEDICATION_FIELDS,
        FormKind::Invoice => INVOICE_FIELDS,
        FormKind::LabOrder => LAB_ORDER_FIELDS,
        FormKind::RadiologyOrder => RADIOLOGY_ORDER_FIELDS,
    }
}

/// Text being edited in an open form. `target` is the id of the row being
/// edited, or `None` when adding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    kind: FormKind,
    target: Option<i64>,
    values: Vec<String>,
    focus: usize,
}

impl FormDraft {
    pub fn blank(kind: FormKind, today: Date) -> Self {
        let today = crate::table::format_date(today);
        let mut draft = Self::empty(kind, None);
        for spec in form_fields(kind) {
            let initial = match (kind, spec.key) {
                (_, "issued_on" | "ordered_on") => today.clone(),
                (FormKind::Appointment, "scheduled_at") => format!("{today} 09:00"),
                (FormKind::Appointment, "duration_minutes") => {
                    DEFAULT_APPOINTMENT_MINUTES.to_string()
                }
                (FormKind::Medication, "stock" | "reorder_level") => "0".to_owned(),
                (FormKind::Invoice, "paid") => "0.00".to_owned(),
                _ => spec.choices.first().map(|c| (*c).to_owned()).unwrap_or_default(),
            };
            draft.set(spec.key, initial);
        }
        draft
    }

    pub fn for_patient(patient: &Patient) -> Self {
        let mut draft = Self::empty(FormKind::Patient, Some(patient.id.get()));
        draft.set("first_name", &patient.first_name);
        draft.set("last_name", &patient.last_name);
        draft.set("father_name", &patient.father_name);
        draft.set("date_of_birth", crate::table::format_date(patient.date_of_birth));
        draft.set("gender", patient.gender.as_str());
        draft.set("phone", &patient.phone);
        draft.set("email", &patient.email);
        draft.set("address", &patient.address);
        draft.set("status", patient.status.as_str());
        draft.set("blood_group", &patient.blood_group);
        draft.set("allergies", &patient.allergies);
        draft
    }

    pub fn for_appointment(appointment: &Appointment) -> Self {
        let mut draft = Self::empty(FormKind::Appointment, Some(appointment.id.get()));
        draft.set("patient_id", appointment.patient_id.get().to_string());
        draft.set("doctor_id", appointment.doctor_id.get().to_string());
        draft.set("scheduled_at", format_datetime_input(appointment.scheduled_at));
        draft.set("duration_minutes", appointment.duration_minutes.to_string());
        draft.set("kind", &appointment.kind);
        draft.set("reason", &appointment.reason);
        draft.set("status", appointment.status.as_str());
        draft
    }

    pub fn for_staff(staff: &Staff) -> Self {
        let mut draft = Self::empty(FormKind::Staff, Some(staff.id.get()));
        draft.set("employee_id", &staff.employee_id);
        draft.set("first_name", &staff.first_name);
        draft.set("last_name", &staff.last_name);
        draft.set("role", staff.role.as_str());
        draft.set("department", &staff.department);
        draft.set("phone", &staff.phone);
        draft.set("email", &staff.email);
        draft.set("active", if staff.active { "yes" } else { "no" });
        draft
    }

    pub fn for_prescription(prescription: &Prescription) -> Self {
        let mut draft = Self::empty(FormKind::Prescription, Some(prescription.id.get()));
        draft.set("patient_id", prescription.patient_id.get().to_string());
        draft.set("doctor_id", prescription.doctor_id.get().to_string());
        draft.set("issued_on", crate::table::format_date(prescription.issued_on));
        draft.set("medications", &prescription.medications);
        draft.set("status", prescription.status.as_str());
        draft
    }

    pub fn for_medication(medication: &Medication) -> Self {
        let mut draft = Self::empty(FormKind::Medication, Some(medication.id.get()));
        draft.set("name", &medication.name);
        draft.set("generic_name", &medication.generic_name);
        draft.set("strength", &medication.strength);
        draft.set("stock", medication.stock.to_string());
        draft.set("reorder_level", medication.reorder_level.to_string());
        draft.set(
            "expiry_date",
            medication
                .expiry_date
                .map(crate::table::format_date)
                .unwrap_or_default(),
        );
        draft.set(
            "unit_price",
            medication
                .unit_price_cents
                .map(format_cents_input)
                .unwrap_or_default(),
        );
        draft
    }

    pub fn for_invoice(invoice: &Invoice) -> Self {
        let mut draft = Self::empty(FormKind::Invoice, Some(invoice.id.get()));
        draft.set("patient_id", invoice.patient_id.get().to_string());
        draft.set("services", &invoice.services);
        draft.set("amount", format_cents_input(invoice.amount_cents));
        draft.set("paid", format_cents_input(invoice.paid_cents));
        draft.set("issued_on", crate::table::format_date(invoice.issued_on));
        draft
    }

    pub fn for_lab_order(order: &LabOrder) -> Self {
        let mut draft = Self::empty(FormKind::LabOrder, Some(order.id.get()));
        draft.set("patient_id", order.patient_id.get().to_string());
        draft.set("test_type", &order.test_type);
        draft.set("ordered_by", order.ordered_by.get().to_string());
        draft.set("ordered_on", crate::table::format_date(order.ordered_on));
        draft.set("status", order.status.as_str());
        draft.set("result", &order.result);
        draft
    }

    pub fn for_radiology_order(order: &RadiologyOrder) -> Self {
        let mut draft = Self::empty(FormKind::RadiologyOrder, Some(order.id.get()));
        draft.set("patient_id", order.patient_id.get().to_string());
        draft.set("study_type", &order.study_type);
        draft.set("ordered_by", order.ordered_by.get().to_string());
        draft.set("ordered_on", crate::table::format_date(order.ordered_on));
        draft.set("status", order.status.as_str());
        draft.set("findings", &order.findings);
        draft
    }

    fn empty(kind: FormKind, target: Option<i64>) -> Self {
        Self {
            kind,
            target,
            values: vec![String::new(); form_fields(kind).len()],
            focus: 0,
        }
    }

    pub const fn kind(&self) -> FormKind {
        self.kind
    }

    pub const fn target(&self) -> Option<i64> {
        self.target
    }

    pub const fn focus(&self) -> usize {
        self.focus
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        form_fields(self.kind)
    }

    pub fn focused_field(&self) -> FieldSpec {
        self.fields()[self.focus]
    }

    pub fn value(&self, key: &str) -> &str {
        self.fields()
            .iter()
            .position(|spec| spec.key == key)
            .and_then(|index| self.values.get(index))
            .map_or("", String::as_str)
    }

    pub fn value_at(&self, index: usize) -> &str {
        self.values.get(index).map_or("", String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Some(index) = self.fields().iter().position(|spec| spec.key == key) {
            self.values[index] = value.into();
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.values.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.values.len() - 1) % self.values.len();
    }

    /// Typing into a choice field is ignored; use [`FormDraft::cycle_choice`].
    pub fn push_char(&mut self, ch: char) {
        if self.focused_field().choices.is_empty() {
            self.values[self.focus].push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if self.focused_field().choices.is_empty() {
            self.values[self.focus].pop();
        }
    }

    /// Steps the focused choice field by `delta`, wrapping. Returns the new
    /// value, or `None` when the focused field is free text.
    pub fn cycle_choice(&mut self, delta: isize) -> Option<&str> {
        let choices = self.focused_field().choices;
        if choices.is_empty() {
            return None;
        }
        let current = choices
            .iter()
            .position(|choice| *choice == self.values[self.focus])
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(choices.len() as isize) as usize;
        self.values[self.focus] = choices[next].to_owned();
        Some(choices[next])
    }

    /// Steps a free-text field through `suggestions`, wrapping. A value not in
    /// the list starts from the first suggestion.
    pub fn cycle_suggestion(&mut self, suggestions: &[String], delta: isize) -> Option<&str> {
        if suggestions.is_empty() || !self.focused_field().choices.is_empty() {
            return None;
        }
        let current = &self.values[self.focus];
        let next = match suggestions
            .iter()
            .position(|suggestion| suggestion.eq_ignore_ascii_case(current))
        {
            Some(index) => (index as isize + delta).rem_euclid(suggestions.len() as isize) as usize,
            None => 0,
        };
        self.values[self.focus] = suggestions[next].clone();
        Some(&self.values[self.focus])
    }

    /// Extra text shown beside a field, such as the computed patient age.
    pub fn hint(&self, key: &str, today: Date) -> Option<String> {
        match (self.kind, key) {
            (FormKind::Patient, "date_of_birth") => parse_required_date(self.value(key))
                .ok()
                .filter(|dob| *dob <= today)
                .map(|dob| format!("age {}", age_on(dob, today))),
            _ => None,
        }
    }

    /// Parses every field into a typed payload and validates it.
    pub fn parse(&self, today: Date) -> Result<FormPayload> {
        let payload = match self.kind {
            FormKind::Patient => FormPayload::Patient(PatientFormInput {
                first_name: self.text("first_name"),
                last_name: self.text("last_name"),
                father_name: self.text("father_name"),
                date_of_birth: self.date("date_of_birth")?,
                gender: self.pick("gender", Gender::parse)?,
                phone: self.text("phone"),
                email: self.text("email"),
                address: self.text("address"),
                status: self.pick("status", PatientStatus::parse)?,
                blood_group: self.text("blood_group"),
                allergies: self.text("allergies"),
            }),
            FormKind::Appointment => FormPayload::Appointment(AppointmentFormInput {
                patient_id: PatientId::new(self.id("patient_id")?),
                doctor_id: StaffId::new(self.id("doctor_id")?),
                scheduled_at: parse_required_datetime(self.value("scheduled_at"))
                    .context("parse date/time")?,
                duration_minutes: i32::try_from(self.int("duration_minutes")?)
                    .context("appointment duration is out of range")?,
                kind: self.text("kind"),
                reason: self.text("reason"),
                status: self.pick("status", AppointmentStatus::parse)?,
            }),
            FormKind::Staff => FormPayload::Staff(StaffFormInput {
                employee_id: self.text("employee_id"),
                first_name: self.text("first_name"),
                last_name: self.text("last_name"),
                role: self.pick("role", Role::parse)?,
                department: self.text("department"),
                phone: self.text("phone"),
                email: self.text("email"),
                active: self.value("active") != "no",
            }),
            FormKind::Prescription => FormPayload::Prescription(PrescriptionFormInput {
                patient_id: PatientId::new(self.id("patient_id")?),
                doctor_id: StaffId::new(self.id("doctor_id")?),
                issued_on: self.date("issued_on")?,
                medications: self.text("medications"),
                status: self.pick("status", PrescriptionStatus::parse)?,
            }),
            FormKind::Medication => FormPayload::Medication(MedicationFormInput {
                name: self.text("name"),
                generic_name: self.text("generic_name"),
                strength: self.text("strength"),
                stock: self.int("stock")?,
                reorder_level: self.int("reorder_level")?,
                expiry_date: parse_optional_date(self.value("expiry_date"))
                    .context("parse expiry date")?,
                unit_price_cents: parse_optional_cents(self.value("unit_price"))
                    .context("parse unit price")?,
            }),
            FormKind::Invoice => FormPayload::Invoice(InvoiceFormInput {
                patient_id: PatientId::new(self.id("patient_id")?),
                services: self.text("services"),
                amount_cents: parse_required_cents(self.value("amount"))
                    .context("parse amount")?,
                paid_cents: parse_optional_cents(self.value("paid"))
                    .context("parse paid amount")?
                    .unwrap_or(0),
                issued_on: self.date("issued_on")?,
            }),
            FormKind::LabOrder => FormPayload::LabOrder(LabOrderFormInput {
                patient_id: PatientId::new(self.id("patient_id")?),
                test_type: self.text("test_type"),
                ordered_by: StaffId::new(self.id("ordered_by")?),
                ordered_on: self.date("ordered_on")?,
                status: self.pick("status", LabOrderStatus::parse)?,
                result: self.text("result"),
            }),
            FormKind::RadiologyOrder => FormPayload::RadiologyOrder(RadiologyOrderFormInput {
                patient_id: PatientId::new(self.id("patient_id")?),
                study_type: self.text("study_type"),
                ordered_by: StaffId::new(self.id("ordered_by")?),
                ordered_on: self.date("ordered_on")?,
                status: self.pick("status", RadiologyStatus::parse)?,
                findings: self.text("findings"),
            }),
        };
        payload.validate(today)?;
        Ok(payload)
    }

    fn label(&self, key: &str) -> &'static str {
        self.fields()
            .iter()
            .find(|spec| spec.key == key)
            .map_or("field", |spec| spec.label)
    }

    fn text(&self, key: &str) -> String {
        self.value(key).trim().to_owned()
    }

    fn date(&self, key: &str) -> Result<Date> {
        parse_required_date(self.value(key)).with_context(|| format!("parse {}", self.label(key)))
    }

    fn int(&self, key: &str) -> Result<i64> {
        parse_required_int(self.value(key)).with_context(|| format!("parse {}", self.label(key)))
    }

    fn id(&self, key: &str) -> Result<i64> {
        let value = self.value(key).trim();
        if value.is_empty() {
            bail!("{} is required -- enter an id and retry", self.label(key));
        }
        self.int(key)
    }

    fn pick<T>(&self, key: &str, parse: fn(&str) -> Option<T>) -> Result<T> {
        let value = self.value(key);
        match parse(value) {
            Some(parsed) => Ok(parsed),
            None => bail!("{} {value:?} is not a known choice", self.label(key)),
        }
    }
}
