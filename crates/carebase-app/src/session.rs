// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::{AccountId, DashboardKind, Role, TabKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub display_name: String,
    pub role_tag: String,
    pub active: bool,
}

impl Account {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role_tag)
    }
}

/// Identity of the signed-in user. Issued by a successful login and consumed
/// by [`Session::end`] on logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    account: Account,
    started_at: OffsetDateTime,
}

impl Session {
    pub fn start(account: Account, started_at: OffsetDateTime) -> Self {
        Self {
            account,
            started_at,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn role(&self) -> Option<Role> {
        self.account.role()
    }

    pub fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    pub fn dashboard(&self) -> DashboardKind {
        DashboardKind::for_role(self.role(), &self.account.role_tag)
    }

    pub fn tabs(&self) -> Vec<TabKind> {
        TabKind::visible_for(self.role())
    }

    pub fn can_open(&self, tab: TabKind) -> bool {
        tab.allows(self.role())
    }

    /// Ends the session, handing back the account for logging.
    pub fn end(self) -> Account {
        self.account
    }
}

#[cfg(test)]
mod tests {
    use super::{Account, Session};
    use crate::{AccountId, DashboardKind, TabKind};
    use time::OffsetDateTime;

    fn account(role_tag: &str) -> Account {
        Account {
            id: AccountId::new(1),
            email: "someone@hospital.test".to_owned(),
            display_name: "Someone".to_owned(),
            role_tag: role_tag.to_owned(),
            active: true,
        }
    }

    #[test]
    fn session_routes_by_role() {
        let session = Session::start(account("nurse"), OffsetDateTime::UNIX_EPOCH);
        assert_eq!(session.dashboard(), DashboardKind::Nurse);
        assert!(session.can_open(TabKind::Patients));
        assert!(!session.can_open(TabKind::Billing));
    }

    #[test]
    fn unprovisioned_role_sees_dashboard_only() {
        let session = Session::start(account("CHAPLAIN"), OffsetDateTime::UNIX_EPOCH);
        assert_eq!(session.tabs(), vec![TabKind::Dashboard]);
        assert_eq!(
            session.dashboard().title(),
            "Dashboard for CHAPLAIN is under development"
        );
    }

    #[test]
    fn end_returns_account() {
        let session = Session::start(account("ADMIN"), OffsetDateTime::UNIX_EPOCH);
        let account = session.end();
        assert_eq!(account.role_tag, "ADMIN");
    }
}
