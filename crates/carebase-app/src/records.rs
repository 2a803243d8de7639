// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::table::{CellValue, Record};
use crate::{
    Appointment, Invoice, LabOrder, Medication, Patient, Prescription, RadiologyOrder, ReportRow,
    Staff, age_on, local_today,
};

impl Record for Patient {
    fn record_key(&self) -> i64 {
        self.id.get()
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        Some(match name {
            "upid" => CellValue::text(&self.upid),
            "name" => CellValue::text(self.full_name()),
            "first_name" => CellValue::text(&self.first_name),
            "last_name" => CellValue::text(&self.last_name),
            "father_name" => CellValue::text(&self.father_name),
            "date_of_birth" => CellValue::Date(self.date_of_birth),
            "age" => CellValue::Integer(i64::from(age_on(self.date_of_birth, local_today()))),
            "gender" => CellValue::text(self.gender.label()),
            "phone" => CellValue::text(&self.phone),
            "email" => CellValue::text(&self.email),
            "address" => CellValue::text(&self.address),
            "status" => CellValue::Badge(self.status.label(), self.status.tone()),
            "blood_group" => CellValue::text(&self.blood_group),
            "allergies" => CellValue::text(&self.allergies),
            _ => return None,
        })
    }
}

impl Record for Staff {
    fn record_key(&self) -> i64 {
        self.id.get()
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        Some(match name {
            "employee_id" => CellValue::text(&self.employee_id),
            "name" => CellValue::text(self.full_name()),
            "role" => CellValue::text(self.role.label()),
            "department" => CellValue::text(&self.department),
            "phone" => CellValue::text(&self.phone),
            "email" => CellValue::text(&self.email),
            "active" => CellValue::Flag(self.active),
            _ => return None,
        })
    }
}

impl Record for Appointment {
    fn record_key(&self) -> i64 {
        self.id.get()
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        Some(match name {
            "token" => CellValue::text(&self.token),
            "patient" => CellValue::text(&self.patient_name),
            "doctor" => CellValue::text(&self.doctor_name),
            "date" => CellValue::Date(self.scheduled_at.date()),
            "time" => CellValue::text(format!(
                "{:02}:{:02}",
                self.scheduled_at.hour(),
                self.scheduled_at.minute()
            )),
            "duration" => CellValue::Integer(i64::from(self.duration_minutes)),
            "kind" => CellValue::text(&self.kind),
            "reason" => CellValue::text(&self.reason),
            "status" => CellValue::Badge(self.status.label(), self.status.tone()),
            _ => return None,
        })
    }
}

impl Record for Prescription {
    fn record_key(&self) -> i64 {
        self.id.get()
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        Some(match name {
            "rx_number" => CellValue::text(&self.rx_number),
            "patient" => CellValue::text(&self.patient_name),
            "doctor" => CellValue::text(&self.doctor_name),
            "issued_on" => CellValue::Date(self.issued_on),
            "medications" => CellValue::text(&self.medications),
            "status" => CellValue::Badge(self.status.label(), self.status.tone()),
            _ => return None,
        })
    }
}

impl Record for Medication {
    fn record_key(&self) -> i64 {
        self.id.get()
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        Some(match name {
            "name" => CellValue::text(&self.name),
            "generic_name" => CellValue::text(&self.generic_name),
            "strength" => CellValue::text(&self.strength),
            "stock" => CellValue::Integer(self.stock),
            "reorder_level" => CellValue::Integer(self.reorder_level),
            "expiry_date" => CellValue::optional_date(self.expiry_date),
            "unit_price" => CellValue::optional_money(self.unit_price_cents),
            "stock_status" => {
                let status = self.stock_status();
                CellValue::Badge(status.label(), status.tone())
            }
            _ => return None,
        })
    }
}

impl Record for Invoice {
    fn record_key(&self) -> i64 {
        self.id.get()
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        Some(match name {
            "invoice_number" => CellValue::text(&self.invoice_number),
            "patient" => CellValue::text(&self.patient_name),
            "services" => CellValue::text(&self.services),
            "amount" => CellValue::Money(self.amount_cents),
            "paid" => CellValue::Money(self.paid_cents),
            "balance" => CellValue::Money(self.balance_cents()),
            "issued_on" => CellValue::Date(self.issued_on),
            "status" => {
                let status = self.status();
                CellValue::Badge(status.label(), status.tone())
            }
            _ => return None,
        })
    }
}

impl Record for LabOrder {
    fn record_key(&self) -> i64 {
        self.id.get()
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        Some(match name {
            "test_number" => CellValue::text(&self.test_number),
            "patient" => CellValue::text(&self.patient_name),
            "test_type" => CellValue::text(&self.test_type),
            "ordered_by" => CellValue::text(&self.ordered_by_name),
            "ordered_on" => CellValue::Date(self.ordered_on),
            "status" => CellValue::Badge(self.status.label(), self.status.tone()),
            "result" => CellValue::text(&self.result),
            _ => return None,
        })
    }
}

impl Record for RadiologyOrder {
    fn record_key(&self) -> i64 {
        self.id.get()
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        Some(match name {
            "order_number" => CellValue::text(&self.order_number),
            "patient" => CellValue::text(&self.patient_name),
            "study_type" => CellValue::text(&self.study_type),
            "ordered_by" => CellValue::text(&self.ordered_by_name),
            "ordered_on" => CellValue::Date(self.ordered_on),
            "status" => CellValue::Badge(self.status.label(), self.status.tone()),
            "findings" => CellValue::text(&self.findings),
            _ => return None,
        })
    }
}

impl Record for ReportRow {
    fn record_key(&self) -> i64 {
        self.id
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        Some(match name {
            "section" => CellValue::text(&self.section),
            "metric" => CellValue::text(&self.metric),
            "value" => CellValue::text(&self.value),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::table::{CellValue, Record};
    use crate::{Invoice, InvoiceId, PatientId, Tone};
    use time::{Date, Month, OffsetDateTime};

    #[test]
    fn invoice_exposes_derived_fields() {
        let invoice = Invoice {
            id: InvoiceId::new(4),
            invoice_number: "INV-0004".to_owned(),
            patient_id: PatientId::new(1),
            patient_name: "John Doe".to_owned(),
            services: "Consultation".to_owned(),
            amount_cents: 50_000,
            paid_cents: 20_000,
            issued_on: Date::from_calendar_date(2026, Month::March, 2).expect("valid date"),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };

        assert_eq!(invoice.record_key(), 4);
        assert_eq!(invoice.field("balance"), Some(CellValue::Money(30_000)));
        assert_eq!(
            invoice.field("status"),
            Some(CellValue::Badge("partial", Tone::Warning))
        );
        assert_eq!(invoice.field("nonexistent"), None);
        assert_eq!(
            invoice.field("issued_on").map(|value| value.display()),
            Some("2026-03-02".to_owned())
        );
    }
}
