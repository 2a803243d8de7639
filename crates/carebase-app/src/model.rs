// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::ids::*;

/// Visual weight of a status badge. The TUI maps tones to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MALE" | "M" => Some(Self::Male),
            "FEMALE" | "F" => Some(Self::Female),
            "OTHER" | "O" => Some(Self::Other),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientStatus {
    Opd,
    Ipd,
    Discharged,
    Emergency,
    Deceased,
}

impl PatientStatus {
    pub const ALL: [Self; 5] = [
        Self::Opd,
        Self::Ipd,
        Self::Discharged,
        Self::Emergency,
        Self::Deceased,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opd => "OPD",
            Self::Ipd => "IPD",
            Self::Discharged => "DISCHARGED",
            Self::Emergency => "EMERGENCY",
            Self::Deceased => "DECEASED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OPD" => Some(Self::Opd),
            "IPD" => Some(Self::Ipd),
            "DISCHARGED" => Some(Self::Discharged),
            "EMERGENCY" => Some(Self::Emergency),
            "DECEASED" => Some(Self::Deceased),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Opd => "opd",
            Self::Ipd => "ipd",
            Self::Discharged => "discharged",
            Self::Emergency => "emergency",
            Self::Deceased => "deceased",
        }
    }

    pub const fn tone(self) -> Tone {
        match self {
            Self::Opd => Tone::Info,
            Self::Ipd => Tone::Warning,
            Self::Discharged => Tone::Success,
            Self::Emergency => Tone::Danger,
            Self::Deceased => Tone::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    CheckedIn,
    InConsultation,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [Self; 6] = [
        Self::Scheduled,
        Self::CheckedIn,
        Self::InConsultation,
        Self::Completed,
        Self::Cancelled,
        Self::NoShow,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::CheckedIn => "CHECKED_IN",
            Self::InConsultation => "IN_CONSULTATION",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SCHEDULED" => Some(Self::Scheduled),
            "CHECKED_IN" => Some(Self::CheckedIn),
            "IN_CONSULTATION" => Some(Self::InConsultation),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            "NO_SHOW" => Some(Self::NoShow),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::CheckedIn => "checked in",
            Self::InConsultation => "in consultation",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no show",
        }
    }

    pub const fn tone(self) -> Tone {
        match self {
            Self::Scheduled => Tone::Info,
            Self::CheckedIn | Self::InConsultation => Tone::Warning,
            Self::Completed => Tone::Success,
            Self::Cancelled | Self::NoShow => Tone::Danger,
        }
    }

    /// Closed appointments accept no further status changes.
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrescriptionStatus {
    Pending,
    Dispensed,
    Cancelled,
}

impl PrescriptionStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Dispensed, Self::Cancelled];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Dispensed => "DISPENSED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "DISPENSED" => Some(Self::Dispensed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispensed => "dispensed",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn tone(self) -> Tone {
        match self {
            Self::Pending => Tone::Warning,
            Self::Dispensed => Tone::Success,
            Self::Cancelled => Tone::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabOrderStatus {
    Pending,
    InProgress,
    Completed,
}

impl LabOrderStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
        }
    }

    pub const fn tone(self) -> Tone {
        match self {
            Self::Pending => Tone::Warning,
            Self::InProgress => Tone::Info,
            Self::Completed => Tone::Success,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadiologyStatus {
    Pending,
    InProgress,
    Completed,
    Reported,
}

impl RadiologyStatus {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Reported,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Reported => "REPORTED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            "REPORTED" => Some(Self::Reported),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
            Self::Reported => "reported",
        }
    }

    pub const fn tone(self) -> Tone {
        match self {
            Self::Pending => Tone::Warning,
            Self::InProgress => Tone::Info,
            Self::Completed => Tone::Success,
            Self::Reported => Tone::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    InStock,
    LowStock,
    Critical,
    OutOfStock,
}

impl StockStatus {
    pub const fn for_levels(stock: i64, reorder_level: i64) -> Self {
        if stock <= 0 {
            Self::OutOfStock
        } else if stock <= reorder_level / 2 {
            Self::Critical
        } else if stock <= reorder_level {
            Self::LowStock
        } else {
            Self::InStock
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InStock => "in stock",
            Self::LowStock => "low stock",
            Self::Critical => "critical",
            Self::OutOfStock => "out of stock",
        }
    }

    pub const fn tone(self) -> Tone {
        match self {
            Self::InStock => Tone::Success,
            Self::LowStock => Tone::Warning,
            Self::Critical | Self::OutOfStock => Tone::Danger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Pending,
    Partial,
    Paid,
}

impl InvoiceStatus {
    pub const fn for_amounts(amount_cents: i64, paid_cents: i64) -> Self {
        if paid_cents <= 0 {
            Self::Pending
        } else if paid_cents < amount_cents {
            Self::Partial
        } else {
            Self::Paid
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }

    pub const fn tone(self) -> Tone {
        match self {
            Self::Pending => Tone::Danger,
            Self::Partial => Tone::Warning,
            Self::Paid => Tone::Success,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabKind {
    Dashboard,
    Patients,
    Appointments,
    Staff,
    Prescriptions,
    Pharmacy,
    Laboratory,
    Radiology,
    Billing,
    Reports,
}

impl TabKind {
    pub const ALL: [Self; 10] = [
        Self::Dashboard,
        Self::Patients,
        Self::Appointments,
        Self::Staff,
        Self::Prescriptions,
        Self::Pharmacy,
        Self::Laboratory,
        Self::Radiology,
        Self::Billing,
        Self::Reports,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Patients => "patients",
            Self::Appointments => "appointments",
            Self::Staff => "staff",
            Self::Prescriptions => "rx",
            Self::Pharmacy => "pharmacy",
            Self::Laboratory => "lab",
            Self::Radiology => "radiology",
            Self::Billing => "billing",
            Self::Reports => "reports",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Patient,
    Appointment,
    Staff,
    Prescription,
    Medication,
    Invoice,
    LabOrder,
    RadiologyOrder,
}

impl FormKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Appointment => "appointment",
            Self::Staff => "staff member",
            Self::Prescription => "prescription",
            Self::Medication => "medication",
            Self::Invoice => "invoice",
            Self::LabOrder => "lab order",
            Self::RadiologyOrder => "radiology order",
        }
    }

    pub const fn for_tab(tab: TabKind) -> Option<Self> {
        match tab {
            TabKind::Dashboard | TabKind::Reports => None,
            TabKind::Patients => Some(Self::Patient),
            TabKind::Appointments => Some(Self::Appointment),
            TabKind::Staff => Some(Self::Staff),
            TabKind::Prescriptions => Some(Self::Prescription),
            TabKind::Pharmacy => Some(Self::Medication),
            TabKind::Billing => Some(Self::Invoice),
            TabKind::Laboratory => Some(Self::LabOrder),
            TabKind::Radiology => Some(Self::RadiologyOrder),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Search,
    Form(FormKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub upid: String,
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
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Patient {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: crate::Role,
    pub department: String,
    pub phone: String,
    pub email: String,
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Staff {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

/// Lookup row behind the staff department field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub active: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub token: String,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub doctor_id: StaffId,
    pub doctor_name: String,
    pub scheduled_at: PrimitiveDateTime,
    pub duration_minutes: i32,
    pub kind: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub checked_in_at: Option<OffsetDateTime>,
    pub completed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: PrescriptionId,
    pub rx_number: String,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub doctor_id: StaffId,
    pub doctor_name: String,
    pub issued_on: Date,
    pub medications: String,
    pub status: PrescriptionStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: MedicationId,
    pub name: String,
    pub generic_name: String,
    pub strength: String,
    pub stock: i64,
    pub reorder_level: i64,
    pub expiry_date: Option<Date>,
    pub unit_price_cents: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Medication {
    pub const fn stock_status(&self) -> StockStatus {
        StockStatus::for_levels(self.stock, self.reorder_level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub services: String,
    pub amount_cents: i64,
    pub paid_cents: i64,
    pub issued_on: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Invoice {
    pub const fn status(&self) -> InvoiceStatus {
        InvoiceStatus::for_amounts(self.amount_cents, self.paid_cents)
    }

    pub const fn balance_cents(&self) -> i64 {
        self.amount_cents - self.paid_cents
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabOrder {
    pub id: LabOrderId,
    pub test_number: String,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub test_type: String,
    pub ordered_by: StaffId,
    pub ordered_by_name: String,
    pub ordered_on: Date,
    pub status: LabOrderStatus,
    pub result: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiologyOrder {
    pub id: RadiologyOrderId,
    pub order_number: String,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub study_type: String,
    pub ordered_by: StaffId,
    pub ordered_by_name: String,
    pub ordered_on: Date,
    pub status: RadiologyStatus,
    pub findings: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One line of the reports tab: a named metric and its rendered value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: i64,
    pub section: String,
    pub metric: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DashboardCounts {
    pub patients_total: usize,
    pub patients_admitted: usize,
    pub patients_emergency: usize,
    pub staff_active: usize,
    pub appointments_today: usize,
    pub appointments_waiting: usize,
    pub prescriptions_pending: usize,
    pub medications_low_stock: usize,
    pub lab_orders_open: usize,
    pub radiology_orders_open: usize,
    pub invoices_unpaid: usize,
    pub outstanding_cents: i64,
    pub collected_cents: i64,
}

/// Whole years between `date_of_birth` and `today`, using calendar
/// components only. Returns 0 for birthdays in the future.
pub fn age_on(date_of_birth: Date, today: Date) -> i32 {
    let mut years = today.year() - date_of_birth.year();
    let birthday_pending = (u8::from(today.month()), today.day())
        < (u8::from(date_of_birth.month()), date_of_birth.day());
    if birthday_pending {
        years -= 1;
    }
    years.max(0)
}

/// The local calendar date, falling back to UTC when the local offset is
/// unavailable.
pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn join_name(first: &str, last: &str) -> String {
    match (first.trim(), last.trim()) {
        ("", "") => String::new(),
        (first, "") => first.to_owned(),
        ("", last) => last.to_owned(),
        (first, last) => format!("{first} {last}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{InvoiceStatus, StockStatus, age_on};
    use time::{Date, Month};

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).expect("valid date")
    }

    #[test]
    fn age_counts_whole_years_by_calendar_components() {
        let dob = date(1980, Month::January, 15);
        assert_eq!(age_on(dob, date(2026, Month::January, 14)), 45);
        assert_eq!(age_on(dob, date(2026, Month::January, 15)), 46);
        assert_eq!(age_on(dob, date(2026, Month::December, 31)), 46);
    }

    #[test]
    fn age_handles_leap_day_birthdays() {
        let dob = date(2000, Month::February, 29);
        assert_eq!(age_on(dob, date(2025, Month::February, 28)), 24);
        assert_eq!(age_on(dob, date(2025, Month::March, 1)), 25);
    }

    #[test]
    fn age_is_never_negative() {
        let dob = date(2030, Month::June, 1);
        assert_eq!(age_on(dob, date(2026, Month::June, 1)), 0);
    }

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(StockStatus::for_levels(0, 20), StockStatus::OutOfStock);
        assert_eq!(StockStatus::for_levels(10, 20), StockStatus::Critical);
        assert_eq!(StockStatus::for_levels(15, 20), StockStatus::LowStock);
        assert_eq!(StockStatus::for_levels(21, 20), StockStatus::InStock);
    }

    #[test]
    fn invoice_status_follows_payments() {
        assert_eq!(InvoiceStatus::for_amounts(100_00, 0), InvoiceStatus::Pending);
        assert_eq!(InvoiceStatus::for_amounts(100_00, 40_00), InvoiceStatus::Partial);
        assert_eq!(InvoiceStatus::for_amounts(100_00, 100_00), InvoiceStatus::Paid);
    }
}
