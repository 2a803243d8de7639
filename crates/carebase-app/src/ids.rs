// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(AccountId);
entity_id!(PatientId);
entity_id!(StaffId);
entity_id!(DepartmentId);
entity_id!(AppointmentId);
entity_id!(PrescriptionId);
entity_id!(MedicationId);
entity_id!(InvoiceId);
entity_id!(LabOrderId);
entity_id!(RadiologyOrderId);
