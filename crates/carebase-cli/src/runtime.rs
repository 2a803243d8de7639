// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use carebase_app::{
    AppointmentId, AppointmentStatus, DashboardCounts, FormPayload, InvoiceId, LabOrderId,
    MedicationId, PatientId, PrescriptionId, RadiologyOrderId, Session, StaffId, TabKind,
    local_today,
};
use carebase_db::Store;
use carebase_tui::{RowAction, TabSnapshot};

pub struct DbRuntime<'a> {
    store: &'a Store,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl carebase_tui::AppRuntime for DbRuntime<'_> {
    fn authenticate(&mut self, email: &str, password: &str) -> Result<Session> {
        self.store.authenticate(email, password)
    }

    fn load_dashboard_counts(&mut self) -> Result<DashboardCounts> {
        self.store.dashboard_counts(local_today())
    }

    fn load_tab_snapshot(&mut self, tab: TabKind) -> Result<Option<TabSnapshot>> {
        let snapshot = match tab {
            TabKind::Dashboard => None,
            TabKind::Patients => Some(TabSnapshot::Patients(self.store.list_patients()?)),
            TabKind::Appointments => {
                Some(TabSnapshot::Appointments(self.store.list_appointments()?))
            }
            TabKind::Staff => Some(TabSnapshot::Staff(self.store.list_staff()?)),
            TabKind::Prescriptions => {
                Some(TabSnapshot::Prescriptions(self.store.list_prescriptions()?))
            }
            TabKind::Pharmacy => Some(TabSnapshot::Pharmacy(self.store.list_medications()?)),
            TabKind::Laboratory => Some(TabSnapshot::Laboratory(self.store.list_lab_orders()?)),
            TabKind::Radiology => {
                Some(TabSnapshot::Radiology(self.store.list_radiology_orders()?))
            }
            TabKind::Billing => Some(TabSnapshot::Billing(self.store.list_invoices()?)),
            TabKind::Reports => Some(TabSnapshot::Reports(
                self.store.report_summary(local_today())?,
            )),
        };
        Ok(snapshot)
    }

    fn submit_form(&mut self, target: Option<i64>, payload: &FormPayload) -> Result<()> {
        payload.validate(local_today())?;

        match (payload, target) {
            (FormPayload::Patient(form), None) => {
                self.store.create_patient(form)?;
            }
            (FormPayload::Patient(form), Some(id)) => {
                self.store.update_patient(PatientId::new(id), form)?;
            }
            (FormPayload::Appointment(form), None) => {
                self.store.create_appointment(form)?;
            }
            (FormPayload::Appointment(form), Some(id)) => {
                self.store.update_appointment(AppointmentId::new(id), form)?;
            }
            (FormPayload::Staff(form), None) => {
                self.store.create_staff(form)?;
            }
            (FormPayload::Staff(form), Some(id)) => {
                self.store.update_staff(StaffId::new(id), form)?;
            }
            (FormPayload::Prescription(form), None) => {
                self.store.create_prescription(form)?;
            }
            (FormPayload::Prescription(form), Some(id)) => {
                self.store
                    .update_prescription(PrescriptionId::new(id), form)?;
            }
            (FormPayload::Medication(form), None) => {
                self.store.create_medication(form)?;
            }
            (FormPayload::Medication(form), Some(id)) => {
                self.store.update_medication(MedicationId::new(id), form)?;
            }
            (FormPayload::Invoice(form), None) => {
                self.store.create_invoice(form)?;
            }
            (FormPayload::Invoice(form), Some(id)) => {
                self.store.update_invoice(InvoiceId::new(id), form)?;
            }
            (FormPayload::LabOrder(form), None) => {
                self.store.create_lab_order(form)?;
            }
            (FormPayload::LabOrder(form), Some(id)) => {
                self.store.update_lab_order(LabOrderId::new(id), form)?;
            }
            (FormPayload::RadiologyOrder(form), None) => {
                self.store.create_radiology_order(form)?;
            }
            (FormPayload::RadiologyOrder(form), Some(id)) => {
                self.store
                    .update_radiology_order(RadiologyOrderId::new(id), form)?;
            }
        }
        Ok(())
    }

    fn apply_row_action(&mut self, row_id: i64, action: RowAction) -> Result<()> {
        let appointment_id = AppointmentId::new(row_id);
        match action {
            RowAction::CheckIn => self
                .store
                .update_appointment_status(appointment_id, AppointmentStatus::CheckedIn),
            RowAction::StartConsultation => self
                .store
                .update_appointment_status(appointment_id, AppointmentStatus::InConsultation),
            RowAction::Complete => self
                .store
                .update_appointment_status(appointment_id, AppointmentStatus::Completed),
            RowAction::Cancel => self.store.cancel_appointment(appointment_id),
            RowAction::Dispense => self
                .store
                .dispense_prescription(PrescriptionId::new(row_id)),
        }
    }

    fn load_departments(&mut self) -> Result<Vec<String>> {
        Ok(self
            .store
            .list_departments()?
            .into_iter()
            .map(|department| department.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::DbRuntime;
    use anyhow::Result;
    use carebase_app::{
        AppointmentStatus, FormPayload, PatientStatus, PrescriptionStatus, TabKind,
    };
    use carebase_db::Store;
    use carebase_testkit::{HospitalFaker, fixture_date};
    use carebase_tui::{AppRuntime, RowAction, TabSnapshot};

    fn demo_store() -> Result<Store> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        store.seed_demo_data()?;
        Ok(store)
    }

    #[test]
    fn submit_form_creates_then_updates_by_target() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut faker = HospitalFaker::new(11);
        let mut runtime = DbRuntime::new(&store);

        let mut patient = faker.patient();
        runtime.submit_form(None, &FormPayload::Patient(patient.clone()))?;
        let created = store.list_patients()?;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].upid, "P1001");

        patient.status = PatientStatus::Ipd;
        runtime.submit_form(
            Some(created[0].id.get()),
            &FormPayload::Patient(patient),
        )?;
        let updated = store.list_patients()?;
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].status, PatientStatus::Ipd);
        Ok(())
    }

    #[test]
    fn submit_form_rejects_invalid_payload_before_writing() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut faker = HospitalFaker::new(5);
        let mut runtime = DbRuntime::new(&store);

        let mut patient = faker.patient();
        patient.phone = "   ".to_owned();
        let error = runtime
            .submit_form(None, &FormPayload::Patient(patient))
            .expect_err("blank phone should fail");
        assert!(error.to_string().contains("phone is required"));
        assert!(store.list_patients()?.is_empty());
        Ok(())
    }

    #[test]
    fn every_tab_loads_from_demo_data() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = DbRuntime::new(&store);

        assert_eq!(runtime.load_tab_snapshot(TabKind::Dashboard)?, None);
        for tab in TabKind::ALL.into_iter().skip(1) {
            let snapshot = runtime
                .load_tab_snapshot(tab)?
                .unwrap_or_else(|| panic!("{} should load rows", tab.label()));
            assert_eq!(snapshot.tab(), tab);
            assert!(!snapshot.is_empty(), "{} has demo rows", tab.label());
        }

        let counts = runtime.load_dashboard_counts()?;
        assert_eq!(counts.patients_total, 24);
        assert_eq!(counts.staff_active, 10);
        Ok(())
    }

    #[test]
    fn appointment_actions_move_status_forward() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut faker = HospitalFaker::new(3);
        let patient_id = store.create_patient(&faker.patient())?;
        let doctor_id = store.create_staff(&faker.staff(carebase_app::Role::Doctor))?;
        let appointment_id =
            store.create_appointment(&faker.appointment(patient_id, doctor_id, fixture_date()))?;
        let mut runtime = DbRuntime::new(&store);

        runtime.apply_row_action(appointment_id.get(), RowAction::CheckIn)?;
        assert_eq!(
            store.get_appointment(appointment_id)?.status,
            AppointmentStatus::CheckedIn
        );
        runtime.apply_row_action(appointment_id.get(), RowAction::StartConsultation)?;
        runtime.apply_row_action(appointment_id.get(), RowAction::Complete)?;
        let completed = store.get_appointment(appointment_id)?;
        assert_eq!(completed.status, AppointmentStatus::Completed);
        assert!(completed.completed_at.is_some());

        let error = runtime
            .apply_row_action(appointment_id.get(), RowAction::Cancel)
            .expect_err("completed appointment cannot be cancelled");
        assert!(error.to_string().contains("already completed"));
        Ok(())
    }

    #[test]
    fn dispense_action_only_applies_to_pending_prescriptions() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = DbRuntime::new(&store);

        let Some(TabSnapshot::Prescriptions(prescriptions)) =
            runtime.load_tab_snapshot(TabKind::Prescriptions)?
        else {
            panic!("prescriptions tab should load");
        };
        let pending = prescriptions
            .iter()
            .find(|rx| rx.status == PrescriptionStatus::Pending)
            .expect("demo data has a pending prescription");
        let dispensed = prescriptions
            .iter()
            .find(|rx| rx.status == PrescriptionStatus::Dispensed)
            .expect("demo data has a dispensed prescription");

        runtime.apply_row_action(pending.id.get(), RowAction::Dispense)?;
        assert_eq!(
            store.get_prescription(pending.id)?.status,
            PrescriptionStatus::Dispensed
        );
        assert!(
            runtime
                .apply_row_action(dispensed.id.get(), RowAction::Dispense)
                .is_err()
        );
        Ok(())
    }

    #[test]
    fn departments_come_from_the_store() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = DbRuntime::new(&store);

        let departments = runtime.load_departments()?;
        assert_eq!(departments.first().map(String::as_str), Some("Accounts"));
        assert!(departments.iter().any(|name| name == "Ward A"));
        Ok(())
    }

    #[test]
    fn authenticate_uses_demo_accounts() -> Result<()> {
        let store = demo_store()?;
        let mut runtime = DbRuntime::new(&store);

        let session = runtime.authenticate("pharmacist@hospital.com", "pharma123")?;
        assert_eq!(session.account().role_tag, "PHARMACIST");
        assert!(runtime.authenticate("pharmacist@hospital.com", "nope").is_err());
        Ok(())
    }
}
