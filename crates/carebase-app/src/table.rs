// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Client-side data table: search, pagination and column accessors over an
//! in-memory collection. Everything here is a pure projection; callers own
//! the data and the [`ViewState`].

use std::num::NonZeroUsize;

use time::Date;
use time::macros::format_description;

use crate::Tone;

pub const NO_DATA_MESSAGE: &str = "No data available";
pub const NO_MATCHES_MESSAGE: &str = "No matching records";

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

/// A row of domain data the table can project.
pub trait Record {
    /// Stable unique key used to identify the row. Need not be displayed.
    fn record_key(&self) -> i64;

    /// Value stored under `name`, or `None` when the record has no such field.
    fn field(&self, name: &str) -> Option<CellValue>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(Date),
    Money(i64),
    Flag(bool),
    Badge(&'static str, Tone),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn optional_date(value: Option<Date>) -> Self {
        value.map_or(Self::Empty, Self::Date)
    }

    pub fn optional_money(value: Option<i64>) -> Self {
        value.map_or(Self::Empty, Self::Money)
    }

    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Decimal(value) => format!("{value:.1}"),
            Self::Date(value) => format_date(*value),
            Self::Money(cents) => format_money(*cents),
            Self::Flag(true) => "yes".to_owned(),
            Self::Flag(false) => "no".to_owned(),
            Self::Badge(label, _) => (*label).to_owned(),
        }
    }

    pub fn tone(&self) -> Option<Tone> {
        match self {
            Self::Badge(_, tone) => Some(*tone),
            _ => None,
        }
    }
}

pub enum Accessor<R> {
    Field(&'static str),
    Computed(fn(&R) -> CellValue),
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Accessor<R> {}

impl<R> std::fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnHint {
    pub min_width: u16,
    pub tone: Option<Tone>,
}

#[derive(Debug)]
pub struct Column<R> {
    pub label: &'static str,
    pub accessor: Accessor<R>,
    pub hint: ColumnHint,
}

impl<R: Record> Column<R> {
    pub const fn field(label: &'static str, name: &'static str) -> Self {
        Self {
            label,
            accessor: Accessor::Field(name),
            hint: ColumnHint {
                min_width: 0,
                tone: None,
            },
        }
    }

    pub const fn computed(label: &'static str, accessor: fn(&R) -> CellValue) -> Self {
        Self {
            label,
            accessor: Accessor::Computed(accessor),
            hint: ColumnHint {
                min_width: 0,
                tone: None,
            },
        }
    }

    pub fn min_width(mut self, width: u16) -> Self {
        self.hint.min_width = width;
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.hint.tone = Some(tone);
        self
    }

    pub fn resolve(&self, record: &R) -> CellValue {
        match self.accessor {
            Accessor::Field(name) => record.field(name).unwrap_or(CellValue::Empty),
            Accessor::Computed(accessor) => accessor(record),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub page_size: NonZeroUsize,
    pub searchable: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            searchable: true,
        }
    }
}

/// Search term and 1-based page of one mounted table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    search: String,
    page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
        }
    }
}

impl ViewState {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub const fn page(&self) -> usize {
        self.page
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.push(ch);
        self.page = 1;
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.page = 1;
    }

    pub fn next_page(&mut self, total_pages: usize) -> bool {
        self.goto_page(self.page.saturating_add(1), total_pages)
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        true
    }

    pub fn goto_page(&mut self, page: usize, total_pages: usize) -> bool {
        if page == 0 || page > total_pages || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    pub fn first_page(&mut self) -> bool {
        if self.page == 1 {
            return false;
        }
        self.page = 1;
        true
    }

    pub fn last_page(&mut self, total_pages: usize) -> bool {
        self.goto_page(total_pages, total_pages)
    }

    /// Pulls the page back inside `1..=total_pages` after the data or the
    /// search shrinks. Returns whether the page moved.
    pub fn clamp(&mut self, total_pages: usize) -> bool {
        let clamped = self.page.clamp(1, total_pages.max(1));
        if clamped == self.page {
            return false;
        }
        self.page = clamped;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current: usize,
    pub total_pages: usize,
    pub first_row: usize,
    pub last_row: usize,
    pub total: usize,
}

impl PageInfo {
    pub fn caption(&self) -> String {
        format!(
            "Showing {} to {} of {} entries",
            self.first_row, self.last_row, self.total
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub key: i64,
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    pub headers: Vec<&'static str>,
    pub rows: Vec<RowView>,
    pub no_matches: bool,
    pub pagination: Option<PageInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableView {
    NoData,
    Table(TablePage),
}

pub struct DataTable<'a, R> {
    data: &'a [R],
    columns: &'a [Column<R>],
    options: TableOptions,
}

impl<'a, R: Record> DataTable<'a, R> {
    pub fn new(data: &'a [R], columns: &'a [Column<R>], options: TableOptions) -> Self {
        Self {
            data,
            columns,
            options,
        }
    }

    pub fn columns(&self) -> &'a [Column<R>] {
        self.columns
    }

    pub fn filtered(&self, state: &ViewState) -> Vec<&'a R> {
        let term = state.search.to_lowercase();
        if !self.options.searchable || term.is_empty() {
            return self.data.iter().collect();
        }
        self.data
            .iter()
            .filter(|record| {
                self.columns.iter().any(|column| {
                    column
                        .resolve(record)
                        .display()
                        .to_lowercase()
                        .contains(&term)
                })
            })
            .collect()
    }

    pub fn total_pages(&self, state: &ViewState) -> usize {
        self.filtered(state)
            .len()
            .div_ceil(self.options.page_size.get())
    }

    /// Records on the page `state` points at. A page past the end is clamped
    /// to the last page.
    pub fn page_rows(&self, state: &ViewState) -> Vec<&'a R> {
        let filtered = self.filtered(state);
        let range = self.page_range(state.page, filtered.len());
        filtered[range.start..range.end].to_vec()
    }

    pub fn row_at(&self, state: &ViewState, row_index: usize) -> Option<&'a R> {
        self.page_rows(state).get(row_index).copied()
    }

    pub fn view(&self, state: &ViewState) -> TableView {
        if self.data.is_empty() {
            return TableView::NoData;
        }

        let headers = self.columns.iter().map(|column| column.label).collect();
        let filtered = self.filtered(state);
        let total = filtered.len();
        if total == 0 {
            return TableView::Table(TablePage {
                headers,
                rows: Vec::new(),
                no_matches: true,
                pagination: None,
            });
        }

        let page_size = self.options.page_size.get();
        let total_pages = total.div_ceil(page_size);
        let range = self.page_range(state.page, total);
        let rows = filtered[range.start..range.end]
            .iter()
            .map(|record| RowView {
                key: record.record_key(),
                cells: self
                    .columns
                    .iter()
                    .map(|column| column.resolve(record))
                    .collect(),
            })
            .collect();

        let pagination = (total_pages > 1).then(|| PageInfo {
            current: range.page,
            total_pages,
            first_row: range.start + 1,
            last_row: range.end,
            total,
        });

        TableView::Table(TablePage {
            headers,
            rows,
            no_matches: false,
            pagination,
        })
    }

    /// Hands the record at `row_index` on the current page to `on_row_click`.
    /// Missing callbacks and out-of-range rows are ignored.
    pub fn click_row(
        &self,
        state: &ViewState,
        row_index: usize,
        on_row_click: Option<&mut dyn FnMut(&R)>,
    ) {
        let Some(callback) = on_row_click else {
            return;
        };
        if let Some(record) = self.row_at(state, row_index) {
            callback(record);
        }
    }

    fn page_range(&self, requested_page: usize, total: usize) -> PageRange {
        let page_size = self.options.page_size.get();
        let total_pages = total.div_ceil(page_size).max(1);
        let page = requested_page.clamp(1, total_pages);
        let start = ((page - 1) * page_size).min(total);
        let end = (page * page_size).min(total);
        PageRange { page, start, end }
    }
}

struct PageRange {
    page: usize,
    start: usize,
    end: usize,
}

pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    let dollars = (absolute / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (index, digit) in dollars.chars().enumerate() {
        if index > 0 && (dollars.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}${grouped}.{:02}", absolute % 100)
}

pub fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::{
        CellValue, Column, DataTable, NO_DATA_MESSAGE, Record, TableOptions, TableView,
        ViewState, format_money,
    };
    use crate::Tone;

    #[derive(Debug, Clone)]
    struct Contact {
        id: i64,
        name: String,
        phone: String,
    }

    impl Record for Contact {
        fn record_key(&self) -> i64 {
            self.id
        }

        fn field(&self, name: &str) -> Option<CellValue> {
            match name {
                "name" => Some(CellValue::text(&self.name)),
                "phone" => Some(CellValue::text(&self.phone)),
                _ => None,
            }
        }
    }

    fn contact(id: i64, name: &str, phone: &str) -> Contact {
        Contact {
            id,
            name: name.to_owned(),
            phone: phone.to_owned(),
        }
    }

    fn contacts(count: usize) -> Vec<Contact> {
        (1..=count)
            .map(|index| contact(index as i64, &format!("Person {index:02}"), "555"))
            .collect()
    }

    fn columns() -> Vec<Column<Contact>> {
        vec![
            Column::field("Name", "name"),
            Column::field("Phone", "phone"),
        ]
    }

    fn options(page_size: usize) -> TableOptions {
        TableOptions {
            page_size: NonZeroUsize::new(page_size).expect("non-zero page size"),
            searchable: true,
        }
    }

    fn page_of(view: &TableView) -> &super::TablePage {
        match view {
            TableView::Table(page) => page,
            TableView::NoData => panic!("expected a table, got {NO_DATA_MESSAGE:?}"),
        }
    }

    #[test]
    fn search_matches_any_column_case_insensitively() {
        let data = vec![
            contact(1, "John Doe", "555-1234"),
            contact(2, "Jane Smith", "555-5678"),
        ];
        let columns = columns();
        let table = DataTable::new(&data, &columns, TableOptions::default());
        let mut state = ViewState::default();

        state.set_search("JANE");
        let keys: Vec<i64> = table.filtered(&state).iter().map(|c| c.id).collect();
        assert_eq!(keys, vec![2]);

        state.set_search("5678");
        let keys: Vec<i64> = table.filtered(&state).iter().map(|c| c.id).collect();
        assert_eq!(keys, vec![2]);

        state.set_search("555");
        assert_eq!(table.filtered(&state).len(), 2);
    }

    #[test]
    fn search_keeps_surrounding_spaces() {
        let data = vec![contact(1, "John Doe", "1"), contact(2, "Doe John", "2")];
        let columns = columns();
        let table = DataTable::new(&data, &columns, TableOptions::default());
        let mut state = ViewState::default();

        state.set_search("doe ");
        let keys: Vec<i64> = table.filtered(&state).iter().map(|c| c.id).collect();
        assert_eq!(keys, vec![2]);

        state.set_search(" ");
        assert_eq!(table.filtered(&state).len(), 2);

        state.set_search("   ");
        assert!(table.filtered(&state).is_empty());
    }

    #[test]
    fn search_is_substring_not_token_match() {
        let data = vec![contact(1, "Annabelle", "1"), contact(2, "Bob", "2")];
        let columns = columns();
        let table = DataTable::new(&data, &columns, TableOptions::default());
        let mut state = ViewState::default();

        state.set_search("nnab");
        assert_eq!(table.filtered(&state).len(), 1);
        state.set_search("ann bob");
        assert!(table.filtered(&state).is_empty());
    }

    #[test]
    fn search_is_ignored_when_table_is_not_searchable() {
        let data = vec![contact(1, "John", "1"), contact(2, "Jane", "2")];
        let columns = columns();
        let table = DataTable::new(
            &data,
            &columns,
            TableOptions {
                searchable: false,
                ..TableOptions::default()
            },
        );
        let mut state = ViewState::default();
        state.set_search("jane");
        assert_eq!(table.filtered(&state).len(), 2);
    }

    #[test]
    fn pagination_splits_rows_and_refuses_out_of_bounds_navigation() {
        let data = contacts(23);
        let columns = columns();
        let table = DataTable::new(&data, &columns, options(10));
        let mut state = ViewState::default();
        assert_eq!(table.total_pages(&state), 3);

        let mut sizes = Vec::new();
        loop {
            let view = table.view(&state);
            sizes.push(page_of(&view).rows.len());
            if !state.next_page(table.total_pages(&state)) {
                break;
            }
        }
        assert_eq!(sizes, vec![10, 10, 3]);
        assert_eq!(state.page(), 3);

        assert!(!state.next_page(3));
        assert_eq!(state.page(), 3);

        assert!(state.first_page());
        assert!(!state.prev_page());
        assert_eq!(state.page(), 1);
        assert!(!state.goto_page(0, 3));
        assert!(!state.goto_page(4, 3));
        assert!(state.last_page(3));
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn page_info_describes_visible_slice() {
        let data = contacts(23);
        let columns = columns();
        let table = DataTable::new(&data, &columns, options(10));
        let mut state = ViewState::default();
        assert!(state.goto_page(3, 3));

        let view = table.view(&state);
        let info = page_of(&view).pagination.expect("pagination shown");
        assert_eq!(info.current, 3);
        assert_eq!(info.first_row, 21);
        assert_eq!(info.last_row, 23);
        assert_eq!(info.caption(), "Showing 21 to 23 of 23 entries");
    }

    #[test]
    fn single_page_omits_pagination() {
        let data = contacts(10);
        let columns = columns();
        let table = DataTable::new(&data, &columns, options(10));
        let view = table.view(&ViewState::default());
        assert!(page_of(&view).pagination.is_none());
        assert_eq!(page_of(&view).rows.len(), 10);
    }

    #[test]
    fn changing_search_resets_to_first_page() {
        let mut data = contacts(25);
        for (index, row) in data.iter_mut().take(3).enumerate() {
            row.name = format!("Needle {index}");
        }
        let columns = columns();
        let table = DataTable::new(&data, &columns, options(10));
        let mut state = ViewState::default();
        assert!(state.next_page(table.total_pages(&state)));
        assert_eq!(state.page(), 2);

        state.set_search("needle");
        assert_eq!(state.page(), 1);
        assert_eq!(table.total_pages(&state), 1);
        let view = table.view(&state);
        assert_eq!(page_of(&view).rows.len(), 3);
        assert!(page_of(&view).pagination.is_none());
    }

    #[test]
    fn empty_data_renders_no_data_every_time() {
        let data: Vec<Contact> = Vec::new();
        let columns = columns();
        let table = DataTable::new(&data, &columns, TableOptions::default());
        let state = ViewState::default();

        let first = table.view(&state);
        let second = table.view(&state);
        assert_eq!(first, TableView::NoData);
        assert_eq!(first, second);
        assert_eq!(table.total_pages(&state), 0);
    }

    #[test]
    fn zero_matches_keeps_header_with_placeholder() {
        let data = contacts(5);
        let columns = columns();
        let table = DataTable::new(&data, &columns, TableOptions::default());
        let mut state = ViewState::default();
        state.set_search("zzz");

        let view = table.view(&state);
        let page = page_of(&view);
        assert_eq!(page.headers, vec!["Name", "Phone"]);
        assert!(page.rows.is_empty());
        assert!(page.no_matches);
        assert!(page.pagination.is_none());
    }

    #[test]
    fn accessors_are_deterministic() {
        let data = vec![contact(7, "Dr. Who", "999")];
        let columns = vec![
            Column::field("Name", "name"),
            Column::computed("Initial", |c: &Contact| {
                CellValue::text(c.name.chars().next().map(String::from).unwrap_or_default())
            }),
            Column::computed("Badge", |_: &Contact| CellValue::Badge("ok", Tone::Success)),
        ];
        for column in &columns {
            let first = column.resolve(&data[0]);
            for _ in 0..5 {
                assert_eq!(column.resolve(&data[0]), first);
            }
        }
    }

    #[test]
    fn unknown_field_resolves_to_empty() {
        let data = vec![contact(1, "A", "1")];
        let column: Column<Contact> = Column::field("Ghost", "ghost");
        assert_eq!(column.resolve(&data[0]), CellValue::Empty);
    }

    #[test]
    fn click_without_callback_is_a_no_op() {
        let data = contacts(3);
        let columns = columns();
        let table = DataTable::new(&data, &columns, TableOptions::default());
        let state = ViewState::default();
        let before = state.clone();

        table.click_row(&state, 0, None);
        assert_eq!(state, before);
    }

    #[test]
    fn click_hands_page_row_to_callback() {
        let data = contacts(15);
        let columns = columns();
        let table = DataTable::new(&data, &columns, options(10));
        let mut state = ViewState::default();
        assert!(state.next_page(table.total_pages(&state)));

        let mut clicked = Vec::new();
        let mut record_click = |c: &Contact| clicked.push(c.id);
        table.click_row(&state, 2, Some(&mut record_click));
        table.click_row(&state, 99, Some(&mut record_click));
        assert_eq!(clicked, vec![13]);
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn stale_page_is_clamped_after_data_shrinks() {
        let data = contacts(5);
        let columns = columns();
        let table = DataTable::new(&data, &columns, options(2));
        let mut state = ViewState::default();
        assert!(state.goto_page(3, 3));

        let shrunk = contacts(3);
        let table_after = DataTable::new(&shrunk, &columns, options(2));
        let view = table_after.view(&state);
        let info = page_of(&view).pagination.expect("two pages");
        assert_eq!(info.current, 2);
        assert_eq!(page_of(&view).rows.len(), 1);
        assert_eq!(table.total_pages(&state), 3);

        assert!(state.clamp(table_after.total_pages(&state)));
        assert_eq!(state.page(), 2);
        assert!(state.prev_page());
        assert_eq!(state.page(), 1);
        assert!(!state.prev_page());
    }

    #[test]
    fn clamp_keeps_valid_pages_and_floors_empty_tables_at_one() {
        let mut state = ViewState::default();
        assert!(state.goto_page(2, 4));
        assert!(!state.clamp(4));
        assert_eq!(state.page(), 2);

        assert!(state.clamp(0));
        assert_eq!(state.page(), 1);
        assert!(!state.clamp(0));
    }

    #[test]
    fn money_groups_thousands() {
        assert_eq!(format_money(0), "$0.00");
        assert_eq!(format_money(123_456), "$1,234.56");
        assert_eq!(format_money(-100_000_001), "-$1,000,000.01");
    }
}
