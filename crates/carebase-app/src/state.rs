// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppMode, FormKind, Session, TabKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Main,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub session: Option<Session>,
    pub mode: AppMode,
    pub active_tab: TabKind,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Login,
            session: None,
            mode: AppMode::Nav,
            active_tab: TabKind::Dashboard,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    LogIn(Session),
    LogOut,
    NextTab,
    PrevTab,
    SetActiveTab(TabKind),
    OpenSearch,
    ExitToNav,
    OpenForm(FormKind),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SessionStarted { email: String, role_tag: String },
    SessionEnded { email: String },
    ScreenChanged(Screen),
    ModeChanged(AppMode),
    TabChanged(TabKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::LogIn(session) => self.log_in(session),
            AppCommand::LogOut => self.log_out(),
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::SetActiveTab(tab) => self.set_active_tab(tab),
            AppCommand::OpenSearch => self.set_mode(AppMode::Search),
            AppCommand::ExitToNav => self.set_mode(AppMode::Nav),
            AppCommand::OpenForm(kind) => {
                if self.session.is_none() {
                    return vec![self.set_status("sign in first")];
                }
                self.set_mode(AppMode::Form(kind))
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    /// Tabs the signed-in user may visit, in menu order.
    pub fn visible_tabs(&self) -> Vec<TabKind> {
        self.session
            .as_ref()
            .map_or_else(|| vec![TabKind::Dashboard], Session::tabs)
    }

    fn log_in(&mut self, session: Session) -> Vec<AppEvent> {
        let account = session.account();
        let started = AppEvent::SessionStarted {
            email: account.email.clone(),
            role_tag: account.role_tag.clone(),
        };
        let greeting = format!("signed in as {}", account.display_name);
        self.session = Some(session);
        self.screen = Screen::Main;
        self.mode = AppMode::Nav;
        self.active_tab = TabKind::Dashboard;
        vec![
            started,
            AppEvent::ScreenChanged(self.screen),
            AppEvent::TabChanged(self.active_tab),
            self.set_status(&greeting),
        ]
    }

    fn log_out(&mut self) -> Vec<AppEvent> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        let account = session.end();
        self.screen = Screen::Login;
        self.mode = AppMode::Nav;
        self.active_tab = TabKind::Dashboard;
        vec![
            AppEvent::SessionEnded {
                email: account.email,
            },
            AppEvent::ScreenChanged(self.screen),
            self.set_status("signed out"),
        ]
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = self.visible_tabs();
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        if tabs[next] == self.active_tab {
            return Vec::new();
        }
        self.active_tab = tabs[next];
        self.mode = AppMode::Nav;
        vec![AppEvent::TabChanged(self.active_tab)]
    }

    fn set_active_tab(&mut self, tab: TabKind) -> Vec<AppEvent> {
        let allowed = self
            .session
            .as_ref()
            .map_or(tab == TabKind::Dashboard, |session| session.can_open(tab));
        if !allowed {
            return vec![self.set_status(&format!("{} is not available", tab.label()))];
        }
        if tab == self.active_tab {
            return Vec::new();
        }
        self.active_tab = tab;
        self.mode = AppMode::Nav;
        vec![AppEvent::TabChanged(tab)]
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
