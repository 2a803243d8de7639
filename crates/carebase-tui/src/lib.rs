// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use carebase_app::table::{
    CellValue, Column, DataTable, NO_DATA_MESSAGE, NO_MATCHES_MESSAGE, Record, RowView,
    TableOptions, TablePage, TableView, ViewState,
};
use carebase_app::{
    AppCommand, AppEvent, AppMode, AppState, Appointment, DashboardCounts, DashboardKind,
    FormDraft, FormKind, FormPayload, Invoice, LabOrder, Medication, Patient, Prescription,
    RadiologyOrder, ReportRow, Screen, Session, Staff, TabKind, Tone, local_today,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::Date;
use tracing::{debug, info, warn};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const MAX_COLUMN_WIDTH: usize = 36;
const PASSWORD_MASK: char = '*';

/// Rows loaded for the active tab.
#[derive(Debug, Clone, PartialEq)]
pub enum TabSnapshot {
    Patients(Vec<Patient>),
    Appointments(Vec<Appointment>),
    Staff(Vec<Staff>),
    Prescriptions(Vec<Prescription>),
    Pharmacy(Vec<Medication>),
    Laboratory(Vec<LabOrder>),
    Radiology(Vec<RadiologyOrder>),
    Billing(Vec<Invoice>),
    Reports(Vec<ReportRow>),
}

impl TabSnapshot {
    pub const fn tab(&self) -> TabKind {
        match self {
            Self::Patients(_) => TabKind::Patients,
            Self::Appointments(_) => TabKind::Appointments,
            Self::Staff(_) => TabKind::Staff,
            Self::Prescriptions(_) => TabKind::Prescriptions,
            Self::Pharmacy(_) => TabKind::Pharmacy,
            Self::Laboratory(_) => TabKind::Laboratory,
            Self::Radiology(_) => TabKind::Radiology,
            Self::Billing(_) => TabKind::Billing,
            Self::Reports(_) => TabKind::Reports,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Patients(rows) => rows.len(),
            Self::Appointments(rows) => rows.len(),
            Self::Staff(rows) => rows.len(),
            Self::Prescriptions(rows) => rows.len(),
            Self::Pharmacy(rows) => rows.len(),
            Self::Laboratory(rows) => rows.len(),
            Self::Radiology(rows) => rows.len(),
            Self::Billing(rows) => rows.len(),
            Self::Reports(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Workflow step applied to the selected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    CheckIn,
    StartConsultation,
    Complete,
    Cancel,
    Dispense,
}

impl RowAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CheckIn => "checked in",
            Self::StartConsultation => "in consultation",
            Self::Complete => "completed",
            Self::Cancel => "cancelled",
            Self::Dispense => "dispensed",
        }
    }

    const fn for_key(tab: TabKind, code: KeyCode) -> Option<Self> {
        match (tab, code) {
            (TabKind::Appointments, KeyCode::Char('c')) => Some(Self::CheckIn),
            (TabKind::Appointments, KeyCode::Char('s')) => Some(Self::StartConsultation),
            (TabKind::Appointments, KeyCode::Char('x')) => Some(Self::Complete),
            (TabKind::Appointments, KeyCode::Char('X')) => Some(Self::Cancel),
            (TabKind::Prescriptions, KeyCode::Char('x')) => Some(Self::Dispense),
            _ => None,
        }
    }
}

pub trait AppRuntime {
    fn authenticate(&mut self, email: &str, password: &str) -> Result<Session>;
    fn load_dashboard_counts(&mut self) -> Result<DashboardCounts>;
    fn load_tab_snapshot(&mut self, tab: TabKind) -> Result<Option<TabSnapshot>>;
    /// Creates a row when `target` is `None`, otherwise updates that row.
    fn submit_form(&mut self, target: Option<i64>, payload: &FormPayload) -> Result<()>;
    fn apply_row_action(&mut self, row_id: i64, action: RowAction) -> Result<()>;
    /// Department names offered on the staff form.
    fn load_departments(&mut self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
    fn today(&mut self) -> Date {
        local_today()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LoginField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct LoginUiState {
    email: String,
    password: String,
    focus: LoginField,
}

#[derive(Debug, Clone, PartialEq)]
struct Projection {
    view: TableView,
    total_pages: usize,
    min_widths: Vec<u16>,
    column_tones: Vec<Option<Tone>>,
}

impl Projection {
    fn rows(&self) -> &[RowView] {
        match &self.view {
            TableView::NoData => &[],
            TableView::Table(page) => &page.rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    options: TableOptions,
    login: LoginUiState,
    dashboard_counts: DashboardCounts,
    snapshot: Option<TabSnapshot>,
    table: ViewState,
    selected_row: usize,
    form: Option<FormDraft>,
    departments: Vec<String>,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(options: TableOptions) -> Self {
        Self {
            options,
            login: LoginUiState::default(),
            dashboard_counts: DashboardCounts::default(),
            snapshot: None,
            table: ViewState::default(),
            selected_row: 0,
            form: None,
            departments: Vec::new(),
            help_visible: false,
            status_token: 0,
        }
    }

    fn projection(&self) -> Option<Projection> {
        self.snapshot
            .as_ref()
            .map(|snapshot| project_snapshot(snapshot, self.options, &self.table))
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: TableOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view_data(state, runtime, &mut view_data) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if state.screen == Screen::Login {
        handle_login_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.mode {
        AppMode::Form(_) => handle_form_key(state, runtime, view_data, internal_tx, key),
        AppMode::Search => handle_search_key(state, runtime, view_data, internal_tx, key),
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
    false
}

fn handle_login_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let login = &mut view_data.login;
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            login.focus = match login.focus {
                LoginField::Email => LoginField::Password,
                LoginField::Password => LoginField::Email,
            };
        }
        KeyCode::Enter => {
            if login.focus == LoginField::Email && login.password.is_empty() {
                login.focus = LoginField::Password;
            } else {
                submit_login(state, runtime, view_data, internal_tx);
            }
        }
        KeyCode::Esc => *login = LoginUiState::default(),
        KeyCode::Backspace => {
            match login.focus {
                LoginField::Email => login.email.pop(),
                LoginField::Password => login.password.pop(),
            };
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => match login.focus
        {
            LoginField::Email => login.email.push(ch),
            LoginField::Password => login.password.push(ch),
        },
        _ => {}
    }
}

fn submit_login<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let email = view_data.login.email.trim().to_owned();
    if email.is_empty() || view_data.login.password.is_empty() {
        emit_status(state, view_data, internal_tx, "enter an email and password");
        return;
    }

    match runtime.authenticate(&email, &view_data.login.password) {
        Ok(session) => {
            view_data.login = LoginUiState::default();
            info!(%email, role = %session.account().role_tag, "signed in");
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::LogIn(session),
                internal_tx,
            );
        }
        Err(error) => {
            view_data.login.password.clear();
            view_data.login.focus = LoginField::Password;
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("login failed: {error}"),
            );
        }
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return;
    }
    match key.code {
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char('f') => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::NextTab, internal_tx);
        }
        KeyCode::Char('b') => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::PrevTab, internal_tx);
        }
        KeyCode::Char('L') => {
            if let Some(session) = &state.session {
                info!(email = %session.account().email, "signed out");
            }
            dispatch_and_refresh(state, runtime, view_data, AppCommand::LogOut, internal_tx);
        }
        _ => handle_table_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_table_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(projection) = view_data.projection() else {
        return;
    };
    let row_count = projection.rows().len();

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.selected_row = (view_data.selected_row + 1).min(row_count.saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.selected_row = view_data.selected_row.saturating_sub(1);
        }
        KeyCode::Char('n') | KeyCode::PageDown => {
            if view_data.table.next_page(projection.total_pages) {
                view_data.selected_row = 0;
            } else {
                emit_status(state, view_data, internal_tx, "already on the last page");
            }
        }
        KeyCode::Char('p') | KeyCode::PageUp => {
            if view_data.table.prev_page() {
                view_data.selected_row = 0;
            } else {
                emit_status(state, view_data, internal_tx, "already on the first page");
            }
        }
        KeyCode::Char('g') | KeyCode::Home => {
            if view_data.table.first_page() {
                view_data.selected_row = 0;
            }
        }
        KeyCode::Char('G') | KeyCode::End => {
            if view_data.table.last_page(projection.total_pages) {
                view_data.selected_row = 0;
            }
        }
        KeyCode::Char('/') => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::OpenSearch, internal_tx);
        }
        KeyCode::Enter => open_clicked_form(state, runtime, view_data, internal_tx),
        KeyCode::Char('a') => open_add_form(state, runtime, view_data, internal_tx),
        code => {
            if let Some(action) = RowAction::for_key(state.active_tab, code) {
                apply_row_action(state, runtime, view_data, internal_tx, &projection, action);
            }
        }
    }
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
        }
        KeyCode::Backspace => {
            view_data.table.pop_search_char();
            view_data.selected_row = 0;
            clamp_table_view(view_data);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.table.set_search("");
            view_data.selected_row = 0;
            clamp_table_view(view_data);
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.table.push_search_char(ch);
            view_data.selected_row = 0;
            clamp_table_view(view_data);
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if key.code == KeyCode::Esc {
        view_data.form = None;
        dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
        emit_status(state, view_data, internal_tx, "edit canceled");
        return;
    }
    if key.code == KeyCode::Enter || (ctrl && key.code == KeyCode::Char('s')) {
        submit_form(state, runtime, view_data, internal_tx);
        return;
    }

    let Some(draft) = view_data.form.as_mut() else {
        dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
        return;
    };
    match key.code {
        KeyCode::Tab | KeyCode::Down => draft.focus_next(),
        KeyCode::BackTab | KeyCode::Up => draft.focus_prev(),
        KeyCode::Left => {
            if draft.cycle_choice(-1).is_none() && draft.focused_field().key == "department" {
                draft.cycle_suggestion(&view_data.departments, -1);
            }
        }
        KeyCode::Right => {
            if draft.cycle_choice(1).is_none() && draft.focused_field().key == "department" {
                draft.cycle_suggestion(&view_data.departments, 1);
            }
        }
        KeyCode::Backspace => draft.pop_char(),
        KeyCode::Char(' ') if !draft.focused_field().choices.is_empty() => {
            draft.cycle_choice(1);
        }
        KeyCode::Char(ch) if !ctrl => draft.push_char(ch),
        _ => {}
    }
}

fn open_clicked_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(snapshot) = &view_data.snapshot else {
        return;
    };
    let Some(draft) = clicked_draft(
        snapshot,
        view_data.options,
        &view_data.table,
        view_data.selected_row,
    ) else {
        return;
    };
    open_form(state, runtime, view_data, internal_tx, draft);
}

fn open_add_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(kind) = FormKind::for_tab(state.active_tab) else {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("{} has no form", state.active_tab.label()),
        );
        return;
    };
    let draft = FormDraft::blank(kind, runtime.today());
    open_form(state, runtime, view_data, internal_tx, draft);
}

fn open_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    draft: FormDraft,
) {
    let kind = draft.kind();
    view_data.departments = if kind == FormKind::Staff {
        runtime.load_departments().unwrap_or_else(|error| {
            warn!(%error, "load departments failed");
            Vec::new()
        })
    } else {
        Vec::new()
    };
    view_data.form = Some(draft);
    dispatch_and_refresh(
        state,
        runtime,
        view_data,
        AppCommand::OpenForm(kind),
        internal_tx,
    );
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(draft) = view_data.form.clone() else {
        return;
    };
    let today = runtime.today();
    let result = draft
        .parse(today)
        .and_then(|payload| runtime.submit_form(draft.target(), &payload));

    match result {
        Ok(()) => {
            view_data.form = None;
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
            reload(state, runtime, view_data, internal_tx);
            let verb = if draft.target().is_some() {
                "saved"
            } else {
                "added"
            };
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{} {verb}", draft.kind().label()),
            );
        }
        Err(error) => {
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("save failed: {error:#}"),
            );
        }
    }
}

fn apply_row_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    projection: &Projection,
    action: RowAction,
) {
    let Some(row) = projection.rows().get(view_data.selected_row) else {
        emit_status(state, view_data, internal_tx, "no row selected");
        return;
    };
    let name = row
        .cells
        .first()
        .map(CellValue::display)
        .unwrap_or_else(|| row.key.to_string());

    match runtime.apply_row_action(row.key, action) {
        Ok(()) => {
            reload(state, runtime, view_data, internal_tx);
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{name} {}", action.label()),
            );
        }
        Err(error) => emit_status(state, view_data, internal_tx, format!("{name}: {error}")),
    }
}

fn reload<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = refresh_view_data(state, runtime, view_data) {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("load failed: {error}"),
        );
    }
}

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    if should_refresh_view(&events)
        && let Err(error) = refresh_view_data(state, runtime, view_data)
    {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("load failed: {error}"),
        );
    }
    sync_form(state, view_data);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn should_refresh_view(events: &[AppEvent]) -> bool {
    events.iter().any(|event| {
        matches!(
            event,
            AppEvent::TabChanged(_) | AppEvent::SessionStarted { .. } | AppEvent::SessionEnded { .. }
        )
    })
}

fn sync_form(state: &AppState, view_data: &mut ViewData) {
    if !matches!(state.mode, AppMode::Form(_)) {
        view_data.form = None;
    }
}

fn refresh_view_data<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    sync_form(state, view_data);
    if state.session.is_none() {
        view_data.dashboard_counts = DashboardCounts::default();
        view_data.snapshot = None;
        view_data.table = ViewState::default();
        view_data.selected_row = 0;
        return Ok(());
    }

    view_data.dashboard_counts = runtime.load_dashboard_counts()?;
    let previous_tab = view_data.snapshot.as_ref().map(TabSnapshot::tab);
    let snapshot = match state.active_tab {
        TabKind::Dashboard => None,
        tab => runtime.load_tab_snapshot(tab)?,
    };
    if snapshot.as_ref().map(TabSnapshot::tab) != previous_tab {
        view_data.table = ViewState::default();
        view_data.selected_row = 0;
    }
    if let Some(snapshot) = &snapshot {
        debug!(tab = snapshot.tab().label(), rows = snapshot.len(), "loaded tab");
    }
    view_data.snapshot = snapshot;
    clamp_table_view(view_data);
    Ok(())
}

/// Keeps the page and the selected row inside the current projection.
fn clamp_table_view(view_data: &mut ViewData) {
    let Some(projection) = view_data.projection() else {
        view_data.selected_row = 0;
        return;
    };
    if view_data.table.clamp(projection.total_pages) {
        debug!(page = view_data.table.page(), "clamped table page");
    }
    let row_count = view_data
        .projection()
        .map_or(0, |projection| projection.rows().len());
    view_data.selected_row = view_data.selected_row.min(row_count.saturating_sub(1));
}

fn project<R: Record>(
    data: &[R],
    columns: &[Column<R>],
    options: TableOptions,
    state: &ViewState,
) -> Projection {
    let table = DataTable::new(data, columns, options);
    Projection {
        view: table.view(state),
        total_pages: table.total_pages(state),
        min_widths: columns.iter().map(|column| column.hint.min_width).collect(),
        column_tones: columns.iter().map(|column| column.hint.tone).collect(),
    }
}

fn project_snapshot(snapshot: &TabSnapshot, options: TableOptions, state: &ViewState) -> Projection {
    match snapshot {
        TabSnapshot::Patients(rows) => project(rows, &patient_columns(), options, state),
        TabSnapshot::Appointments(rows) => project(rows, &appointment_columns(), options, state),
        TabSnapshot::Staff(rows) => project(rows, &staff_columns(), options, state),
        TabSnapshot::Prescriptions(rows) => {
            project(rows, &prescription_columns(), options, state)
        }
        TabSnapshot::Pharmacy(rows) => project(rows, &medication_columns(), options, state),
        TabSnapshot::Laboratory(rows) => project(rows, &lab_order_columns(), options, state),
        TabSnapshot::Radiology(rows) => project(rows, &radiology_columns(), options, state),
        TabSnapshot::Billing(rows) => project(rows, &invoice_columns(), options, state),
        TabSnapshot::Reports(rows) => project(rows, &report_columns(), options, state),
    }
}

fn click_draft<R: Record>(
    data: &[R],
    columns: &[Column<R>],
    options: TableOptions,
    state: &ViewState,
    row_index: usize,
    open: fn(&R) -> FormDraft,
) -> Option<FormDraft> {
    let mut draft = None;
    let mut on_row_click = |record: &R| draft = Some(open(record));
    DataTable::new(data, columns, options).click_row(state, row_index, Some(&mut on_row_click));
    draft
}

/// Edit form for the row at `row_index` on the current page. Reports rows
/// have no click handler.
fn clicked_draft(
    snapshot: &TabSnapshot,
    options: TableOptions,
    state: &ViewState,
    row_index: usize,
) -> Option<FormDraft> {
    match snapshot {
        TabSnapshot::Patients(rows) => click_draft(
            rows,
            &patient_columns(),
            options,
            state,
            row_index,
            FormDraft::for_patient,
        ),
        TabSnapshot::Appointments(rows) => click_draft(
            rows,
            &appointment_columns(),
            options,
            state,
            row_index,
            FormDraft::for_appointment,
        ),
        TabSnapshot::Staff(rows) => click_draft(
            rows,
            &staff_columns(),
            options,
            state,
            row_index,
            FormDraft::for_staff,
        ),
        TabSnapshot::Prescriptions(rows) => click_draft(
            rows,
            &prescription_columns(),
            options,
            state,
            row_index,
            FormDraft::for_prescription,
        ),
        TabSnapshot::Pharmacy(rows) => click_draft(
            rows,
            &medication_columns(),
            options,
            state,
            row_index,
            FormDraft::for_medication,
        ),
        TabSnapshot::Laboratory(rows) => click_draft(
            rows,
            &lab_order_columns(),
            options,
            state,
            row_index,
            FormDraft::for_lab_order,
        ),
        TabSnapshot::Radiology(rows) => click_draft(
            rows,
            &radiology_columns(),
            options,
            state,
            row_index,
            FormDraft::for_radiology_order,
        ),
        TabSnapshot::Billing(rows) => click_draft(
            rows,
            &invoice_columns(),
            options,
            state,
            row_index,
            FormDraft::for_invoice,
        ),
        TabSnapshot::Reports(rows) => {
            DataTable::new(rows, &report_columns(), options).click_row(state, row_index, None);
            None
        }
    }
}

fn patient_columns() -> Vec<Column<Patient>> {
    vec![
        Column::field("UPID", "upid").min_width(6),
        Column::field("Name", "name").min_width(16),
        Column::field("Father", "father_name"),
        Column::field("Age", "age"),
        Column::field("Gender", "gender"),
        Column::field("Phone", "phone").min_width(12),
        Column::field("Blood", "blood_group"),
        Column::field("Allergies", "allergies").tone(Tone::Danger),
        Column::field("Status", "status"),
    ]
}

fn appointment_columns() -> Vec<Column<Appointment>> {
    vec![
        Column::field("Token", "token").min_width(18),
        Column::field("Patient", "patient").min_width(14),
        Column::field("Doctor", "doctor").min_width(14),
        Column::field("Date", "date"),
        Column::field("Time", "time"),
        Column::field("Min", "duration"),
        Column::field("Type", "kind"),
        Column::field("Status", "status"),
    ]
}

fn staff_columns() -> Vec<Column<Staff>> {
    vec![
        Column::field("Employee", "employee_id"),
        Column::field("Name", "name").min_width(16),
        Column::field("Role", "role"),
        Column::field("Department", "department"),
        Column::field("Phone", "phone"),
        Column::field("Email", "email"),
        Column::field("Active", "active"),
    ]
}

fn prescription_columns() -> Vec<Column<Prescription>> {
    vec![
        Column::field("Rx", "rx_number"),
        Column::field("Patient", "patient").min_width(14),
        Column::field("Doctor", "doctor").min_width(14),
        Column::field("Issued", "issued_on"),
        Column::field("Medications", "medications").min_width(20),
        Column::field("Status", "status"),
    ]
}

fn medication_columns() -> Vec<Column<Medication>> {
    vec![
        Column::field("Name", "name").min_width(12),
        Column::field("Generic", "generic_name"),
        Column::field("Strength", "strength"),
        Column::field("Stock", "stock"),
        Column::field("Reorder", "reorder_level"),
        Column::field("Expiry", "expiry_date"),
        Column::field("Price", "unit_price"),
        Column::field("Stock status", "stock_status"),
    ]
}

fn invoice_balance(invoice: &Invoice) -> CellValue {
    match invoice.balance_cents() {
        0 => CellValue::Empty,
        cents => CellValue::Money(cents),
    }
}

fn invoice_columns() -> Vec<Column<Invoice>> {
    vec![
        Column::field("Invoice", "invoice_number"),
        Column::field("Patient", "patient").min_width(14),
        Column::field("Services", "services").min_width(16),
        Column::field("Amount", "amount"),
        Column::field("Paid", "paid"),
        Column::computed("Balance", invoice_balance).tone(Tone::Warning),
        Column::field("Issued", "issued_on"),
        Column::field("Status", "status"),
    ]
}

fn lab_order_columns() -> Vec<Column<LabOrder>> {
    vec![
        Column::field("Test no", "test_number"),
        Column::field("Patient", "patient").min_width(14),
        Column::field("Test", "test_type").min_width(14),
        Column::field("Ordered by", "ordered_by"),
        Column::field("Ordered", "ordered_on"),
        Column::field("Status", "status"),
        Column::field("Result", "result"),
    ]
}

fn radiology_columns() -> Vec<Column<RadiologyOrder>> {
    vec![
        Column::field("Order", "order_number"),
        Column::field("Patient", "patient").min_width(14),
        Column::field("Study", "study_type").min_width(14),
        Column::field("Ordered by", "ordered_by"),
        Column::field("Ordered", "ordered_on"),
        Column::field("Status", "status"),
        Column::field("Findings", "findings"),
    ]
}

fn report_columns() -> Vec<Column<ReportRow>> {
    vec![
        Column::field("Section", "section").min_width(12),
        Column::field("Metric", "metric").min_width(22),
        Column::field("Value", "value"),
    ]
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    if state.screen == Screen::Login {
        render_login(frame, state, view_data);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let tabs_visible = state.visible_tabs();
    let selected = tabs_visible
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let tab_titles = tabs_visible
        .iter()
        .map(|tab| format!(" {} ", tab.label()))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("carebase").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    if state.active_tab == TabKind::Dashboard {
        let text = state
            .session
            .as_ref()
            .map(|session| render_dashboard_text(session, &view_data.dashboard_counts))
            .unwrap_or_default();
        let body = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("dashboard"));
        frame.render_widget(body, layout[1]);
    } else {
        render_table(frame, layout[1], state, view_data);
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(draft) = &view_data.form {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let title = match draft.target() {
            Some(_) => format!("edit {}", draft.kind().label()),
            None => format!("add {}", draft.kind().label()),
        };
        let form = Paragraph::new(render_form_text(draft, local_today(), &view_data.departments))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(form, area);
    }

    if view_data.help_visible {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_login(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let area = centered_rect(50, 40, frame.area());
    frame.render_widget(Clear, area);
    let login = Paragraph::new(render_login_text(&view_data.login, state.status_line.as_deref()))
        .block(
            Block::default()
                .title("carebase sign in")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(login, area);
}

fn render_login_text(login: &LoginUiState, status: Option<&str>) -> String {
    let marker = |field: LoginField| if login.focus == field { ">" } else { " " };
    let masked: String = login.password.chars().map(|_| PASSWORD_MASK).collect();
    let mut lines = vec![
        format!("{} email:    {}", marker(LoginField::Email), login.email),
        format!("{} password: {masked}", marker(LoginField::Password)),
        String::new(),
        "tab switch field | enter sign in | esc clear | ctrl+q quit".to_owned(),
    ];
    if let Some(status) = status {
        lines.push(String::new());
        lines.push(status.to_owned());
    }
    lines.join("\n")
}

fn render_dashboard_text(session: &Session, counts: &DashboardCounts) -> String {
    let dashboard = session.dashboard();
    let count = |value: usize| value.to_string();
    let money = carebase_app::table::format_money;
    let metrics: Vec<(&str, String)> = match &dashboard {
        DashboardKind::Admin => vec![
            ("patients registered", count(counts.patients_total)),
            ("patients admitted", count(counts.patients_admitted)),
            ("emergency cases", count(counts.patients_emergency)),
            ("active staff", count(counts.staff_active)),
            ("appointments today", count(counts.appointments_today)),
            ("unpaid invoices", count(counts.invoices_unpaid)),
            ("outstanding", money(counts.outstanding_cents)),
        ],
        DashboardKind::Doctor => vec![
            ("appointments today", count(counts.appointments_today)),
            ("patients waiting", count(counts.appointments_waiting)),
            ("pending prescriptions", count(counts.prescriptions_pending)),
            ("open lab orders", count(counts.lab_orders_open)),
            ("open imaging orders", count(counts.radiology_orders_open)),
        ],
        DashboardKind::Nurse => vec![
            ("patients admitted", count(counts.patients_admitted)),
            ("emergency cases", count(counts.patients_emergency)),
            ("patients waiting", count(counts.appointments_waiting)),
        ],
        DashboardKind::Reception => vec![
            ("appointments today", count(counts.appointments_today)),
            ("patients waiting", count(counts.appointments_waiting)),
            ("patients registered", count(counts.patients_total)),
        ],
        DashboardKind::Pharmacy => vec![
            ("pending prescriptions", count(counts.prescriptions_pending)),
            ("low stock items", count(counts.medications_low_stock)),
        ],
        DashboardKind::Laboratory => vec![("open lab orders", count(counts.lab_orders_open))],
        DashboardKind::Radiology => vec![(
            "open imaging orders",
            count(counts.radiology_orders_open),
        )],
        DashboardKind::Finance => vec![
            ("unpaid invoices", count(counts.invoices_unpaid)),
            ("collected", money(counts.collected_cents)),
            ("outstanding", money(counts.outstanding_cents)),
        ],
        DashboardKind::HumanResources => vec![("active staff", count(counts.staff_active))],
        DashboardKind::Patient => Vec::new(),
        DashboardKind::Audit => vec![
            ("patients registered", count(counts.patients_total)),
            ("active staff", count(counts.staff_active)),
            ("collected", money(counts.collected_cents)),
        ],
        DashboardKind::Welcome { .. } => Vec::new(),
    };

    let mut lines = vec![dashboard.title(), String::new()];
    for (label, value) in metrics {
        lines.push(format!("{label:<24} {value}"));
    }
    match &dashboard {
        DashboardKind::Patient => {
            lines.push("Contact the front desk to book or change appointments.".to_owned());
        }
        DashboardKind::Welcome { .. } => {
            lines.push("Ask an administrator to assign a supported role.".to_owned());
        }
        _ => {}
    }

    let account = session.account();
    let role = session
        .role()
        .map_or(account.role_tag.as_str(), |role| role.label());
    lines.push(String::new());
    lines.push(format!("signed in as {} ({role})", account.display_name));
    lines.join("\n")
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(table_title(state, view_data));
    let Some(projection) = view_data.projection() else {
        frame.render_widget(Paragraph::new(String::new()).block(block), area);
        return;
    };

    let page = match &projection.view {
        TableView::NoData => {
            frame.render_widget(Paragraph::new(NO_DATA_MESSAGE).block(block), area);
            return;
        }
        TableView::Table(page) => page,
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let header = Row::new(page.headers.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows: Vec<Row<'_>> = if page.no_matches {
        vec![Row::new(vec![
            Cell::from(NO_MATCHES_MESSAGE).style(Style::default().fg(Color::DarkGray)),
        ])]
    } else {
        page.rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| {
                let selected = row_index == view_data.selected_row;
                let cells = row.cells.iter().enumerate().map(|(column, cell)| {
                    let tone = cell
                        .tone()
                        .or_else(|| projection.column_tones.get(column).copied().flatten());
                    let mut style = tone.map_or_else(Style::default, |tone| {
                        Style::default().fg(tone_color(tone))
                    });
                    if selected {
                        style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                    }
                    Cell::from(cell.display()).style(style)
                });
                Row::new(cells.collect::<Vec<_>>())
            })
            .collect()
    };

    let widths = column_widths(page, &projection.min_widths);
    let table = Table::new(rows, widths).header(header).column_spacing(1);
    frame.render_widget(table, layout[0]);

    let caption = Paragraph::new(pagination_caption(page))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(caption, layout[1]);
}

fn column_widths(page: &TablePage, min_widths: &[u16]) -> Vec<Constraint> {
    page.headers
        .iter()
        .enumerate()
        .map(|(column, header)| {
            let content = page
                .rows
                .iter()
                .filter_map(|row| row.cells.get(column))
                .map(|cell| cell.display().chars().count())
                .max()
                .unwrap_or(0);
            let hint = min_widths.get(column).copied().map_or(0, usize::from);
            let mut width = content
                .max(header.chars().count())
                .max(hint)
                .min(MAX_COLUMN_WIDTH);
            // The placeholder row lives in the first column only.
            if page.no_matches && column == 0 {
                width = width.max(NO_MATCHES_MESSAGE.chars().count());
            }
            Constraint::Length(u16::try_from(width).unwrap_or(u16::MAX))
        })
        .collect()
}

fn pagination_caption(page: &TablePage) -> String {
    match &page.pagination {
        Some(info) => format!(
            "{}  page {}/{}",
            info.caption(),
            info.current,
            info.total_pages
        ),
        None if page.no_matches => String::new(),
        None => format!("{} entries", page.rows.len()),
    }
}

fn table_title(state: &AppState, view_data: &ViewData) -> String {
    let search = view_data.table.search();
    match (state.mode, search.is_empty()) {
        (AppMode::Search, _) => format!("{} / {search}_", state.active_tab.label()),
        (_, false) => format!("{} / {search}", state.active_tab.label()),
        (_, true) => state.active_tab.label().to_owned(),
    }
}

fn render_form_text(draft: &FormDraft, today: Date, departments: &[String]) -> String {
    let mut lines = Vec::with_capacity(draft.fields().len() + 2);
    for (index, spec) in draft.fields().iter().enumerate() {
        let marker = if index == draft.focus() { ">" } else { " " };
        let value = draft.value_at(index);
        let shown = if spec.choices.is_empty() {
            value.to_owned()
        } else {
            format!("< {value} >")
        };
        let mut line = format!("{marker} {:<22} {shown}", spec.label);
        if let Some(hint) = draft.hint(spec.key, today) {
            line.push_str(&format!("  ({hint})"));
        }
        if spec.key == "department" && !departments.is_empty() {
            line.push_str(&format!("  (left/right: {} known)", departments.len()));
        }
        lines.push(line);
    }
    lines.push(String::new());
    lines.push("tab/shift+tab field | left/right choose | enter save | esc cancel".to_owned());
    lines.join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Search => "SEARCH",
        AppMode::Form(_) => "FORM",
    };
    let hints = match state.mode {
        AppMode::Nav => {
            let actions = match state.active_tab {
                TabKind::Appointments => " | c/s/x/X check in/start/complete/cancel",
                TabKind::Prescriptions => " | x dispense",
                _ => "",
            };
            format!(
                "j/k row | n/p page | g/G first/last | / search | enter edit | a add{actions} | f/b tabs | L logout | ? help | ctrl+q"
            )
        }
        AppMode::Search => "type to filter | ctrl+u clear | enter/esc done".to_owned(),
        AppMode::Form(_) => "tab field | left/right choose | enter save | esc cancel".to_owned(),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help | L sign out\n\
tabs: f next | b previous\n\
table: j/k row | n/p or pgdn/pgup page | g/G first/last page\n\
table: / search (typing filters live, enter/esc done, ctrl+u clear)\n\
table: enter edit row | a add row\n\
appointments: c check in | s start consultation | x complete | X cancel\n\
prescriptions: x dispense\n\
form: tab/shift+tab field | left/right or space choose | enter or ctrl+s save | esc cancel"
}

const fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Neutral => Color::Gray,
        Tone::Info => Color::Cyan,
        Tone::Success => Color::Green,
        Tone::Warning => Color::Yellow,
        Tone::Danger => Color::Red,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
