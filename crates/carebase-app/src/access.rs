// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::TabKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Receptionist,
    Pharmacist,
    LabTech,
    Radiologist,
    Finance,
    Hr,
    Patient,
    Auditor,
}

impl Role {
    pub const ALL: [Self; 11] = [
        Self::Admin,
        Self::Doctor,
        Self::Nurse,
        Self::Receptionist,
        Self::Pharmacist,
        Self::LabTech,
        Self::Radiologist,
        Self::Finance,
        Self::Hr,
        Self::Patient,
        Self::Auditor,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Doctor => "DOCTOR",
            Self::Nurse => "NURSE",
            Self::Receptionist => "RECEPTIONIST",
            Self::Pharmacist => "PHARMACIST",
            Self::LabTech => "LAB_TECH",
            Self::Radiologist => "RADIOLOGIST",
            Self::Finance => "FINANCE",
            Self::Hr => "HR",
            Self::Patient => "PATIENT",
            Self::Auditor => "AUDITOR",
        }
    }

    /// Case-insensitive match against the stored role tags.
    pub fn parse(value: &str) -> Option<Self> {
        let tag = value.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|role| role.as_str() == tag)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "administrator",
            Self::Doctor => "doctor",
            Self::Nurse => "nurse",
            Self::Receptionist => "receptionist",
            Self::Pharmacist => "pharmacist",
            Self::LabTech => "lab technician",
            Self::Radiologist => "radiologist",
            Self::Finance => "finance",
            Self::Hr => "human resources",
            Self::Patient => "patient",
            Self::Auditor => "auditor",
        }
    }
}

/// Landing view shown on the dashboard tab after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardKind {
    Admin,
    Doctor,
    Nurse,
    Reception,
    Pharmacy,
    Laboratory,
    Radiology,
    Finance,
    HumanResources,
    Patient,
    Audit,
    /// The account's role tag is not one this build knows how to serve.
    Welcome { role_tag: String },
}

impl DashboardKind {
    pub fn for_role(role: Option<Role>, role_tag: &str) -> Self {
        match role {
            Some(Role::Admin) => Self::Admin,
            Some(Role::Doctor) => Self::Doctor,
            Some(Role::Nurse) => Self::Nurse,
            Some(Role::Receptionist) => Self::Reception,
            Some(Role::Pharmacist) => Self::Pharmacy,
            Some(Role::LabTech) => Self::Laboratory,
            Some(Role::Radiologist) => Self::Radiology,
            Some(Role::Finance) => Self::Finance,
            Some(Role::Hr) => Self::HumanResources,
            Some(Role::Patient) => Self::Patient,
            Some(Role::Auditor) => Self::Audit,
            None => Self::Welcome {
                role_tag: role_tag.trim().to_owned(),
            },
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Admin => "Administration overview".to_owned(),
            Self::Doctor => "Clinical overview".to_owned(),
            Self::Nurse => "Ward overview".to_owned(),
            Self::Reception => "Front desk".to_owned(),
            Self::Pharmacy => "Pharmacy overview".to_owned(),
            Self::Laboratory => "Laboratory queue".to_owned(),
            Self::Radiology => "Imaging queue".to_owned(),
            Self::Finance => "Finance overview".to_owned(),
            Self::HumanResources => "Staffing overview".to_owned(),
            Self::Patient => "My care".to_owned(),
            Self::Audit => "Audit overview".to_owned(),
            Self::Welcome { role_tag } => {
                format!("Dashboard for {role_tag} is under development")
            }
        }
    }
}

impl TabKind {
    pub fn allows(self, role: Option<Role>) -> bool {
        use Role::*;

        let Some(role) = role else {
            return self == Self::Dashboard;
        };
        match self {
            Self::Dashboard => true,
            Self::Patients => matches!(role, Admin | Doctor | Nurse | Receptionist),
            Self::Appointments => matches!(role, Admin | Doctor | Receptionist),
            Self::Staff => matches!(role, Admin | Hr),
            Self::Prescriptions => matches!(role, Admin | Doctor | Pharmacist),
            Self::Pharmacy => matches!(role, Admin | Pharmacist),
            Self::Laboratory => matches!(role, Admin | LabTech | Doctor),
            Self::Radiology => matches!(role, Admin | Radiologist | Doctor),
            Self::Billing => matches!(role, Admin | Finance),
            Self::Reports => matches!(role, Admin | Finance | Auditor),
        }
    }

    /// Tabs in menu order that `role` may open. Always starts with the dashboard.
    pub fn visible_for(role: Option<Role>) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|tab| tab.allows(role))
            .collect()
    }
}
