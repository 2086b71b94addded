// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use armory_app::{
    AlertTone, AppCommand, AppEvent, AppMode, AppState, BatchAction, CellRenderer, CellView,
    ColumnSpec, EMPTY_SELECTION_MESSAGE, FailureKind, FieldKind, FormDraft, FormKind,
    FormSubmission, INVALID_SELECTION_MESSAGE, Listing, PageSpec, PageTarget, PendingRequest,
    ResponseOutcome, Row, RowAction, RowEffect, RowValidity, SelectedRow, SelectionModel,
    SelectionOutcome, is_kit_row, render_cell,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::{debug, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row as TableRow, Table, Tabs};
use std::cmp::Ordering;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::macros::format_description;

const HALF_PAGE_ROWS: isize = 10;
const FULL_PAGE_ROWS: isize = 20;
const LINK_ARROW: &str = "→";

/// Backend access for the UI loop. `spawn_submission` may hand the request to
/// another thread; it must deliver exactly one `SubmissionFinished`.
pub trait AppRuntime {
    fn load_rows(&mut self, target: &PageTarget) -> Result<Listing>;
    fn submit(&mut self, request: &PendingRequest) -> ResponseOutcome;
    fn spawn_submission(
        &mut self,
        request_id: u64,
        request: &PendingRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let outcome = self.submit(request);
        tx.send(InternalEvent::SubmissionFinished {
            request_id,
            outcome,
        })
        .map_err(|_| anyhow!("submission channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    SubmissionFinished {
        request_id: u64,
        outcome: ResponseOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SortSpec {
    column: usize,
    direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct TableUiState {
    selected_row: usize,
    selected_col: usize,
    sorts: Vec<SortSpec>,
    query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableCommand {
    MoveRow(isize),
    MoveColumn(isize),
    JumpFirstRow,
    JumpLastRow,
    CycleSort,
    ClearSort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TableStatus {
    SortUnavailable(&'static str),
    SortAsc(&'static str),
    SortDesc(&'static str),
    SortCleared,
}

impl TableStatus {
    fn message(self) -> String {
        match self {
            Self::SortUnavailable(column) => format!("{column} is not sortable"),
            Self::SortAsc(column) => format!("sort {column} asc"),
            Self::SortDesc(column) => format!("sort {column} desc"),
            Self::SortCleared => "sort cleared".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TableEvent {
    CursorUpdated,
    Status(TableStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    draft: FormDraft,
    field_index: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    loaded: Option<PageTarget>,
    rows: Vec<Row>,
    selection: SelectionModel,
    load_error: Option<String>,
    table: TableUiState,
    form: Option<FormUiState>,
    confirm: Option<PendingRequest>,
    help_visible: bool,
    status_token: u64,
    next_request_id: u64,
    in_flight_request: Option<u64>,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if state.mode == AppMode::Nav
        && let Err(error) = reload_active(state, runtime, &mut view_data, true)
    {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error:#}")));
    }
    sync_overlays(state, &mut view_data);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(anyhow::Error::new(error).context("draw frame"));
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::SubmissionFinished {
                request_id,
                outcome,
            } => {
                if view_data.in_flight_request != Some(request_id) {
                    debug!("dropping stale outcome for request {request_id}");
                    continue;
                }
                view_data.in_flight_request = None;
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    AppCommand::ApplyOutcome(outcome),
                    tx,
                );
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
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

fn show_failure(
    state: &mut AppState,
    runtime: &mut impl AppRuntime,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch_and_refresh(
        state,
        runtime,
        view_data,
        AppCommand::ShowAlert(AlertTone::Failure, message.into()),
        internal_tx,
    );
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

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
            emit_status(state, view_data, internal_tx, "help hidden");
        }
        return false;
    }

    match state.mode {
        AppMode::Form(_) => handle_form_key(state, runtime, view_data, internal_tx, key),
        AppMode::Confirm => handle_confirm_key(state, runtime, view_data, internal_tx, key),
        AppMode::Quantity => handle_quantity_key(state, runtime, view_data, internal_tx, key),
        AppMode::Search => handle_search_key(state, runtime, view_data, internal_tx, key),
        AppMode::Nav => return handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
    false
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if handle_table_key(state, view_data, internal_tx, key) {
        return false;
    }

    let spec = state.active.page.spec();
    match (key.code, key.modifiers) {
        (KeyCode::Tab, _) | (KeyCode::Char('f'), KeyModifiers::NONE) => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::NextPage, internal_tx);
        }
        (KeyCode::BackTab, _) | (KeyCode::Char('b'), KeyModifiers::NONE) => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::PrevPage, internal_tx);
        }
        (KeyCode::Esc, _) => {
            if state.alert.visible {
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    AppCommand::DismissAlert,
                    internal_tx,
                );
            } else if state.parent.is_some() {
                dispatch_and_refresh(state, runtime, view_data, AppCommand::Back, internal_tx);
            }
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            match reload_active(state, runtime, view_data, true) {
                Ok(()) => {
                    let message = format!("reloaded {} rows", view_data.rows.len());
                    emit_status(state, view_data, internal_tx, message);
                }
                Err(error) => {
                    emit_status(state, view_data, internal_tx, format!("load failed: {error:#}"));
                }
            }
            sync_overlays(state, view_data);
        }
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        (KeyCode::Char('/'), _) => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::EnterSearch, internal_tx);
        }
        (KeyCode::Char(' '), _) => toggle_selected_row(state, view_data, internal_tx, &spec),
        (KeyCode::Char('*'), _) => toggle_all_visible(state, view_data, internal_tx, &spec),
        (KeyCode::Char('q'), KeyModifiers::NONE) => {
            if !view_data.selection.tracks_quantity() {
                emit_status(state, view_data, internal_tx, "no quantities on this page");
            } else if selected_row(view_data).is_none() {
                emit_status(state, view_data, internal_tx, "no row selected");
            } else {
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    AppCommand::EnterQuantityEdit,
                    internal_tx,
                );
            }
        }
        (KeyCode::Enter, _) => {
            let opens_kit = spec.row_actions.contains(&RowAction::ShowKitContent)
                && selected_row(view_data).is_some_and(is_kit_row);
            if opens_kit {
                apply_row_action(state, runtime, view_data, internal_tx, RowAction::ShowKitContent);
            } else {
                emit_status(state, view_data, internal_tx, "nothing to open");
            }
        }
        (KeyCode::Char(character), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
            if let Some(batch) = spec.batch_for_key(character) {
                start_batch(state, runtime, view_data, internal_tx, &spec, batch);
            } else if let Some(action) = spec.row_action_for_key(character) {
                apply_row_action(state, runtime, view_data, internal_tx, action);
            } else if let Some(action) = spec.page_action_for_key(character) {
                open_form(state, runtime, view_data, internal_tx, FormDraft::new(action.form()));
            }
        }
        _ => {}
    }
    false
}

fn handle_table_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let Some(command) = table_command_for_key(key) else {
        return false;
    };
    let spec = state.active.page.spec();
    let event = apply_table_command(view_data, &spec, command);
    if let TableEvent::Status(status) = event {
        emit_status(state, view_data, internal_tx, status.message());
    }
    true
}

fn table_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(TableCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(TableCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(TableCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(TableCommand::MoveColumn(1)),
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveRow(HALF_PAGE_ROWS))
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveRow(-HALF_PAGE_ROWS))
        }
        (KeyCode::PageDown, _) => Some(TableCommand::MoveRow(FULL_PAGE_ROWS)),
        (KeyCode::PageUp, _) => Some(TableCommand::MoveRow(-FULL_PAGE_ROWS)),
        (KeyCode::Char('g'), _) => Some(TableCommand::JumpFirstRow),
        (KeyCode::Char('G'), _) => Some(TableCommand::JumpLastRow),
        (KeyCode::Char('s'), KeyModifiers::NONE) => Some(TableCommand::CycleSort),
        (KeyCode::Char('S'), _) => Some(TableCommand::ClearSort),
        _ => None,
    }
}

fn apply_table_command(
    view_data: &mut ViewData,
    spec: &PageSpec,
    command: TableCommand,
) -> TableEvent {
    match command {
        TableCommand::MoveRow(delta) => {
            move_row(view_data, spec, delta);
            TableEvent::CursorUpdated
        }
        TableCommand::MoveColumn(delta) => {
            let last = spec.columns.len().saturating_sub(1) as isize;
            let next = (view_data.table.selected_col as isize + delta).clamp(0, last);
            view_data.table.selected_col = next as usize;
            TableEvent::CursorUpdated
        }
        TableCommand::JumpFirstRow => {
            view_data.table.selected_row = 0;
            TableEvent::CursorUpdated
        }
        TableCommand::JumpLastRow => {
            view_data.table.selected_row = visible_rows(view_data, spec).len().saturating_sub(1);
            TableEvent::CursorUpdated
        }
        TableCommand::CycleSort => TableEvent::Status(cycle_sort(view_data, spec)),
        TableCommand::ClearSort => {
            view_data.table.sorts.clear();
            TableEvent::Status(TableStatus::SortCleared)
        }
    }
}

fn move_row(view_data: &mut ViewData, spec: &PageSpec, delta: isize) {
    let row_count = visible_rows(view_data, spec).len();
    if row_count == 0 {
        view_data.table.selected_row = 0;
        return;
    }

    let current = view_data.table.selected_row;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    view_data.table.selected_row = next.min(row_count.saturating_sub(1));
}

/// Asc, then desc, then off. Several columns may be sorted at once; earlier
/// sorts take precedence.
fn cycle_sort(view_data: &mut ViewData, spec: &PageSpec) -> TableStatus {
    let column = view_data.table.selected_col;
    let Some(column_spec) = spec.columns.get(column) else {
        return TableStatus::SortCleared;
    };
    if !column_spec.orderable() {
        return TableStatus::SortUnavailable(column_spec.label);
    }

    let sorts = &mut view_data.table.sorts;
    let status = match sorts.iter().position(|sort| sort.column == column) {
        Some(index) => match sorts[index].direction {
            SortDirection::Asc => {
                sorts[index].direction = SortDirection::Desc;
                TableStatus::SortDesc(column_spec.label)
            }
            SortDirection::Desc => {
                sorts.remove(index);
                TableStatus::SortCleared
            }
        },
        None => {
            sorts.push(SortSpec {
                column,
                direction: SortDirection::Asc,
            });
            TableStatus::SortAsc(column_spec.label)
        }
    };
    clamp_table_cursor(view_data, spec);
    status
}

fn compare_rows(left: &Row, right: &Row, sorts: &[SortSpec], columns: &[ColumnSpec]) -> Ordering {
    for sort in sorts {
        let Some(column) = columns.get(sort.column) else {
            continue;
        };
        let ordering = match (left.get(column.key), right.get(column.key)) {
            (Some(left), Some(right)) => left.cmp_value(right),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Indices into `rows` after the search filter and sorts. Ties keep load
/// order.
fn visible_rows(view_data: &ViewData, spec: &PageSpec) -> Vec<usize> {
    let mut indices: Vec<usize> = view_data
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.matches_query(&view_data.table.query))
        .map(|(index, _)| index)
        .collect();
    if !view_data.table.sorts.is_empty() {
        indices.sort_by(|left, right| {
            compare_rows(
                &view_data.rows[*left],
                &view_data.rows[*right],
                &view_data.table.sorts,
                spec.columns,
            )
        });
    }
    indices
}

fn clamp_table_cursor(view_data: &mut ViewData, spec: &PageSpec) {
    let count = visible_rows(view_data, spec).len();
    view_data.table.selected_row = view_data.table.selected_row.min(count.saturating_sub(1));
    view_data.table.selected_col = view_data
        .table
        .selected_col
        .min(spec.columns.len().saturating_sub(1));
}

fn selected_row(view_data: &ViewData) -> Option<&Row> {
    let spec = view_data.loaded.as_ref()?.page.spec();
    let visible = visible_rows(view_data, &spec);
    visible
        .get(view_data.table.selected_row)
        .and_then(|index| view_data.rows.get(*index))
}

fn toggle_selected_row(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    spec: &PageSpec,
) {
    if spec.selection.is_none() {
        emit_status(state, view_data, internal_tx, "no selection on this page");
        return;
    }
    let Some(id) = selected_row(view_data).map(|row| row.id.clone()) else {
        emit_status(state, view_data, internal_tx, "no row selected");
        return;
    };
    if let Some(validity) = view_data.selection.toggle(&id) {
        emit_status(state, view_data, internal_tx, selection_status(view_data, validity));
    }
}

fn toggle_all_visible(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    spec: &PageSpec,
) {
    if spec.selection.is_none() {
        emit_status(state, view_data, internal_tx, "no selection on this page");
        return;
    }
    let ids: Vec<_> = visible_rows(view_data, spec)
        .into_iter()
        .filter_map(|index| view_data.rows.get(index).map(|row| row.id.clone()))
        .collect();
    let checked = view_data.selection.toggle_all(&ids);
    let message = if checked {
        format!(
            "checked {} rows ({} with invalid quantity)",
            ids.len(),
            view_data.selection.invalid_count()
        )
    } else {
        "cleared selection".to_owned()
    };
    emit_status(state, view_data, internal_tx, message);
}

fn selection_status(view_data: &ViewData, validity: RowValidity) -> String {
    let checked = view_data.selection.checked_count();
    match validity {
        RowValidity::Unchecked => format!("unchecked ({checked} checked)"),
        RowValidity::ValidChecked => format!("checked ({checked} checked)"),
        RowValidity::InvalidChecked => {
            format!("checked, quantity invalid ({checked} checked)")
        }
    }
}

fn start_batch<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    spec: &PageSpec,
    batch: BatchAction,
) {
    if state.in_flight {
        dispatch_and_refresh(state, runtime, view_data, AppCommand::BeginSubmission, internal_tx);
        return;
    }
    let selected = match collect_selection(view_data, spec) {
        Ok(selected) => selected,
        Err(message) => {
            show_failure(state, runtime, view_data, internal_tx, message);
            return;
        }
    };
    if batch.needs_description() {
        open_form(
            state,
            runtime,
            view_data,
            internal_tx,
            FormDraft::new(FormKind::SigningDescription(batch)),
        );
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("{} selected -- describe the signing", selected.len()),
        );
        return;
    }
    match batch.request(&selected, None) {
        Ok(request) => send_request(state, runtime, view_data, internal_tx, request),
        Err(error) => show_failure(state, runtime, view_data, internal_tx, format!("{error:#}")),
    }
}

/// Checked rows in load order under the page's policy, or the banner text
/// explaining why nothing may be sent.
fn collect_selection(
    view_data: &ViewData,
    spec: &PageSpec,
) -> std::result::Result<Vec<SelectedRow>, String> {
    let Some(selection) = spec.selection else {
        return Err("no selection on this page".to_owned());
    };
    match view_data.selection.collect(selection.policy) {
        SelectionOutcome::Invalid(id) => {
            debug!("selection aborted at row {id}");
            Err(INVALID_SELECTION_MESSAGE.to_owned())
        }
        SelectionOutcome::Selected(selected) if selected.is_empty() => {
            Err(EMPTY_SELECTION_MESSAGE.to_owned())
        }
        SelectionOutcome::Selected(selected) => Ok(selected),
    }
}

fn apply_row_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: RowAction,
) {
    let Some(row) = selected_row(view_data) else {
        emit_status(state, view_data, internal_tx, "no row selected");
        return;
    };
    if !action.applies_to(row) {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("{} does not apply to this row", action.label()),
        );
        return;
    }
    let effect = match action.resolve(row) {
        Ok(effect) => effect,
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("{error:#}"));
            return;
        }
    };

    match effect {
        RowEffect::OpenForm { draft, warning } => {
            open_form(state, runtime, view_data, internal_tx, draft);
            if let Some(warning) = warning {
                emit_status(state, view_data, internal_tx, warning);
            }
        }
        RowEffect::Send(request) if request.needs_confirmation() => {
            view_data.confirm = Some(request);
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::RequestConfirmation,
                internal_tx,
            );
        }
        RowEffect::Send(request) => send_request(state, runtime, view_data, internal_tx, request),
        RowEffect::Drill(target) => {
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::OpenPage(target),
                internal_tx,
            );
        }
    }
}

fn open_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    draft: FormDraft,
) {
    let kind = draft.kind;
    view_data.form = Some(FormUiState {
        draft,
        field_index: 0,
    });
    dispatch_and_refresh(state, runtime, view_data, AppCommand::OpenForm(kind), internal_tx);
}

fn send_request<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    request: PendingRequest,
) {
    let events = state.dispatch(AppCommand::BeginSubmission);
    view_data.status_token = view_data.status_token.saturating_add(1);
    if events.contains(&AppEvent::SubmissionRejected) {
        schedule_status_clear(internal_tx, view_data.status_token);
        return;
    }

    view_data.next_request_id = view_data.next_request_id.saturating_add(1);
    let request_id = view_data.next_request_id;
    view_data.in_flight_request = Some(request_id);
    debug!("submitting {} as request {request_id}", request.action.label());
    if let Err(error) = runtime.spawn_submission(request_id, &request, internal_tx.clone()) {
        warn!("{} could not be sent: {error:#}", request.action.label());
        view_data.in_flight_request = None;
        let outcome =
            ResponseOutcome::transport_failure(FailureKind::NetworkFailure, format!("{error:#}"));
        dispatch_and_refresh(
            state,
            runtime,
            view_data,
            AppCommand::ApplyOutcome(outcome),
            internal_tx,
        );
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
        }
        KeyCode::Tab | KeyCode::Down => {
            let status = move_form_field_cursor(view_data, 1);
            emit_status(state, view_data, internal_tx, status);
        }
        KeyCode::BackTab | KeyCode::Up => {
            let status = move_form_field_cursor(view_data, -1);
            emit_status(state, view_data, internal_tx, status);
        }
        KeyCode::Enter => submit_form(state, runtime, view_data, internal_tx),
        KeyCode::Backspace => {
            if let Some(value) = active_form_value(view_data) {
                value.pop();
            }
        }
        KeyCode::Char(character) => {
            if let Some(value) = active_form_value(view_data) {
                value.push(character);
            }
        }
        _ => {}
    }
}

fn active_form_value(view_data: &mut ViewData) -> Option<&mut String> {
    let form = view_data.form.as_mut()?;
    form.draft.value_mut(form.field_index)
}

fn move_form_field_cursor(view_data: &mut ViewData, delta: isize) -> String {
    let Some(form) = view_data.form.as_mut() else {
        return "form unavailable".to_owned();
    };
    let fields = form.draft.fields();
    if fields.is_empty() {
        return "form has no fields".to_owned();
    }

    let len = fields.len() as isize;
    form.field_index = (form.field_index as isize + delta).rem_euclid(len) as usize;
    format_form_field_status(form.draft.kind, form.field_index)
}

fn format_form_field_status(kind: FormKind, index: usize) -> String {
    let fields = kind.fields();
    let label = fields.get(index).map_or("field", |field| field.label);
    format!("field {label} ({}/{})", index + 1, fields.len())
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(form) = &view_data.form else {
        return;
    };
    let submission = match form.draft.submit() {
        Ok(submission) => submission,
        Err(error) => {
            show_failure(state, runtime, view_data, internal_tx, format!("{error:#}"));
            return;
        }
    };

    let request = match submission {
        FormSubmission::Request(request) => Ok(request),
        FormSubmission::Batch { batch, description } => {
            let spec = state.active.page.spec();
            collect_selection(view_data, &spec).and_then(|selected| {
                batch
                    .request(&selected, Some(&description))
                    .map_err(|error| format!("{error:#}"))
            })
        }
    };
    match request {
        Ok(request) => send_request(state, runtime, view_data, internal_tx, request),
        Err(message) => show_failure(state, runtime, view_data, internal_tx, message),
    }
}

fn handle_confirm_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if key.code == KeyCode::Char('y') {
        if let Some(request) = view_data.confirm.clone() {
            send_request(state, runtime, view_data, internal_tx, request);
        }
        return;
    }
    if state.in_flight {
        return;
    }
    dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
    emit_status(state, view_data, internal_tx, "canceled");
}

fn handle_quantity_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(id) = selected_row(view_data).map(|row| row.id.clone()) else {
        dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
        return;
    };
    let mut raw = view_data
        .selection
        .state(&id)
        .map(|row_state| row_state.entered_quantity.clone())
        .unwrap_or_default();

    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
            return;
        }
        KeyCode::Backspace => {
            raw.pop();
        }
        KeyCode::Char(character) if character.is_ascii_digit() => raw.push(character),
        _ => return,
    }
    if let Some(validity) = view_data.selection.set_quantity(&id, &raw) {
        let message = match validity {
            RowValidity::InvalidChecked => format!("quantity {raw:?} is invalid"),
            _ => format!("quantity {raw}"),
        };
        emit_status(state, view_data, internal_tx, message);
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
        KeyCode::Esc => {
            view_data.table.query.clear();
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
        }
        KeyCode::Enter => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
            let spec = state.active.page.spec();
            let count = visible_rows(view_data, &spec).len();
            emit_status(state, view_data, internal_tx, format!("{count} rows match"));
        }
        KeyCode::Backspace => {
            view_data.table.query.pop();
        }
        KeyCode::Char(character) => view_data.table.query.push(character),
        _ => {}
    }
    let spec = state.active.page.spec();
    clamp_table_cursor(view_data, &spec);
}

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    if should_reload(&events)
        && let Err(error) = reload_active(state, runtime, view_data, true)
    {
        emit_status(state, view_data, internal_tx, format!("load failed: {error:#}"));
    }
    sync_overlays(state, view_data);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn should_reload(events: &[AppEvent]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, AppEvent::ReloadRequested(_)))
}

/// Replaces the rows of the active page with a fresh load. Rows are never
/// merged with an earlier load, so reloading unchanged data is a no-op.
fn reload_active<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    follow_redirect: bool,
) -> Result<()> {
    let target = state.active.clone();
    let spec = target.page.spec();
    if view_data.loaded.as_ref() != Some(&target) {
        view_data.table = TableUiState::default();
    }
    view_data.loaded = Some(target.clone());

    let listing = match runtime.load_rows(&target) {
        Ok(listing) => listing,
        Err(error) => {
            warn!("load {} failed: {error:#}", target.title());
            view_data.rows.clear();
            view_data.selection = SelectionModel::default();
            view_data.load_error = Some(format!("{error:#}"));
            return Err(error);
        }
    };

    match listing {
        Listing::Rows(rows) => {
            let mut selection =
                SelectionModel::for_rows(&rows, spec.selection.and_then(|s| s.quantity));
            if spec.selection.is_some_and(|s| s.check_all_on_load) {
                selection.check_all();
            }
            view_data.rows = rows;
            view_data.selection = selection;
            view_data.load_error = None;
            clamp_table_cursor(view_data, &spec);
            Ok(())
        }
        Listing::Redirect(path) => {
            view_data.rows.clear();
            view_data.selection = SelectionModel::default();
            view_data.load_error = Some(format!("redirected to {path}"));
            let events = state.dispatch(AppCommand::ApplyOutcome(ResponseOutcome::Redirect(path)));
            if follow_redirect && should_reload(&events) && state.active != target {
                return reload_active(state, runtime, view_data, false);
            }
            Ok(())
        }
    }
}

fn sync_overlays(state: &AppState, view_data: &mut ViewData) {
    match state.mode {
        AppMode::Form(kind) => {
            if view_data.form.as_ref().map(|form| form.draft.kind) != Some(kind) {
                view_data.form = Some(FormUiState {
                    draft: FormDraft::new(kind),
                    field_index: 0,
                });
            }
        }
        _ => view_data.form = None,
    }
    if state.mode != AppMode::Confirm {
        view_data.confirm = None;
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let alert_height = if state.alert.visible { 3 } else { 0 };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(alert_height),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let title = format!("armory ({})", state.role.label());
    if state.parent.is_none() {
        let pages = state.role.pages();
        let selected = pages
            .iter()
            .position(|page| *page == state.active.page)
            .unwrap_or(0);
        let tabs = Tabs::new(pages.iter().map(|page| page.label()).collect::<Vec<_>>())
            .block(Block::default().title(title).borders(Borders::ALL))
            .style(Style::default().fg(Color::White))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .select(selected);
        frame.render_widget(tabs, layout[0]);
    } else {
        let breadcrumb = Paragraph::new(render_breadcrumb_text(state))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(breadcrumb, layout[0]);
    }

    if state.alert.visible {
        let background = match state.alert.tone {
            AlertTone::Success => Color::Green,
            AlertTone::Failure => Color::Red,
        };
        let alert = Paragraph::new(render_alert_text(state))
            .style(Style::default().fg(Color::White).bg(background))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(alert, layout[1]);
    }

    render_table(frame, layout[2], state, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[3]);

    if let Some(form) = &view_data.form {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(render_form_overlay_text(form)).block(
            Block::default()
                .title(form.draft.kind.title())
                .borders(Borders::ALL),
        );
        frame.render_widget(overlay, area);
    }

    if let Some(request) = &view_data.confirm {
        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);
        let confirm = Paragraph::new(request.confirm_prompt())
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .block(Block::default().title("confirm").borders(Borders::ALL));
        frame.render_widget(confirm, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_breadcrumb_text(state: &AppState) -> String {
    match &state.parent {
        Some(parent) => format!(
            "{} > {}  (esc back)",
            parent.page.label(),
            state.active.title()
        ),
        None => state.active.title(),
    }
}

fn render_alert_text(state: &AppState) -> String {
    let format = format_description!("[hour]:[minute]:[second]");
    let stamp = state
        .alert
        .shown_at
        .and_then(|shown_at| shown_at.format(&format).ok());
    match stamp {
        Some(stamp) => format!("{stamp}  {}  (esc dismiss)", state.alert.text),
        None => format!("{}  (esc dismiss)", state.alert.text),
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view_data: &ViewData) {
    let spec = state.active.page.spec();
    if let Some(error) = &view_data.load_error {
        let body = Paragraph::new(format!("no rows: {error}\n\npress r to reload"))
            .style(Style::default().fg(Color::Red))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(state.active.title()),
            );
        frame.render_widget(body, area);
        return;
    }

    let widths = spec
        .columns
        .iter()
        .map(|column| match column.renderer {
            CellRenderer::Checkbox => Constraint::Length(3),
            CellRenderer::Quantity => Constraint::Length(6),
            _ => Constraint::Min(6),
        })
        .collect::<Vec<_>>();

    let header = TableRow::new(spec.columns.iter().enumerate().map(|(index, column)| {
        Cell::from(header_label(&view_data.table, index, column)).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = visible_rows(view_data, &spec)
        .into_iter()
        .enumerate()
        .filter_map(|(position, index)| view_data.rows.get(index).map(|row| (position, row)))
        .map(|(position, row)| {
            let selected = position == view_data.table.selected_row;
            let selection = view_data.selection.state(&row.id);
            let cells = spec
                .columns
                .iter()
                .enumerate()
                .map(|(column_index, column)| {
                    let view = render_cell(column, row, selection, spec.row_actions);
                    let mut style = cell_style(&view);
                    if selected {
                        style = style.bg(Color::DarkGray);
                    }
                    if selected && column_index == view_data.table.selected_col {
                        style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD);
                    }
                    Cell::from(cell_text(&view)).style(style)
                })
                .collect::<Vec<_>>();
            TableRow::new(cells)
        });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state, view_data))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn cell_text(view: &CellView) -> String {
    match view {
        CellView::Link(text) => format!("{text} {LINK_ARROW}"),
        other => other.text(),
    }
}

fn cell_style(view: &CellView) -> Style {
    match (view, view.validity()) {
        (CellView::Checkbox { .. } | CellView::Quantity { .. }, RowValidity::InvalidChecked) => {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        }
        (CellView::Checkbox { .. } | CellView::Quantity { .. }, RowValidity::ValidChecked) => {
            Style::default().fg(Color::Green)
        }
        (CellView::Link(_), _) => Style::default().fg(Color::Cyan),
        (CellView::Actions(_), _) => Style::default().fg(Color::DarkGray),
        _ => Style::default(),
    }
}

fn header_label(table: &TableUiState, index: usize, column: &ColumnSpec) -> String {
    match table.sorts.iter().position(|sort| sort.column == index) {
        Some(position) => {
            let arrow = match table.sorts[position].direction {
                SortDirection::Asc => "↑",
                SortDirection::Desc => "↓",
            };
            if table.sorts.len() > 1 {
                format!("{} {arrow}{}", column.label, position + 1)
            } else {
                format!("{} {arrow}", column.label)
            }
        }
        None => column.label.to_owned(),
    }
}

fn table_title(state: &AppState, view_data: &ViewData) -> String {
    let spec = state.active.page.spec();
    let visible = visible_rows(view_data, &spec).len();
    let mut title = format!("{} ({visible}/{})", state.active.title(), view_data.rows.len());
    if spec.selection.is_some() {
        title.push_str(&format!(
            " checked {} invalid {}",
            view_data.selection.checked_count(),
            view_data.selection.invalid_count()
        ));
    }
    if !view_data.table.query.is_empty() || state.mode == AppMode::Search {
        title.push_str(&format!(" /{}", view_data.table.query));
    }
    title
}

fn render_form_overlay_text(form: &FormUiState) -> String {
    let mut lines = form
        .draft
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let marker = if index == form.field_index { ">" } else { " " };
            let value = form.draft.values.get(index).map_or("", String::as_str);
            let shown = match field.kind {
                FieldKind::Secret => "*".repeat(value.chars().count()),
                FieldKind::Text | FieldKind::Integer => value.to_owned(),
            };
            format!("{marker} {}: {shown}", field.label)
        })
        .collect::<Vec<_>>();
    lines.push(String::new());
    lines.push("tab/shift+tab field | enter submit | esc cancel".to_owned());
    lines.join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let default = match state.mode {
        AppMode::Nav => nav_hints(state),
        AppMode::Quantity => "digits edit quantity | enter/esc done".to_owned(),
        AppMode::Search => format!("search: {} | enter keep | esc clear", view_data.table.query),
        AppMode::Form(kind) => match &view_data.form {
            Some(form) => format_form_field_status(kind, form.field_index),
            None => kind.title().to_owned(),
        },
        AppMode::Confirm => "y confirm | any other key cancels".to_owned(),
    };
    let mode = mode_label(state.mode);
    let in_flight = if state.in_flight { " | sending" } else { "" };
    match &state.status_line {
        Some(status) => format!("{mode} | {status}{in_flight} | {default}"),
        None => format!("{mode}{in_flight} | {default}"),
    }
}

fn nav_hints(state: &AppState) -> String {
    let spec = state.active.page.spec();
    let mut hints = vec!["j/k g/G s/S / r".to_owned()];
    if let Some(selection) = spec.selection {
        let mut selection_hint = "space *".to_owned();
        if selection.quantity.is_some() {
            selection_hint.push_str(" q");
        }
        hints.push(selection_hint);
        hints.extend(
            selection
                .batches
                .iter()
                .map(|batch| format!("{}:{}", batch.key(), batch.label())),
        );
    }
    hints.extend(
        spec.page_actions
            .iter()
            .map(|action| format!("{}:{}", action.key(), action.label())),
    );
    hints.push("tab ? ctrl+q".to_owned());
    hints.join(" | ")
}

fn mode_label(mode: AppMode) -> &'static str {
    match mode {
        AppMode::Nav => "NAV",
        AppMode::Quantity => "QTY",
        AppMode::Search => "SEARCH",
        AppMode::Form(_) => "FORM",
        AppMode::Confirm => "CONFIRM",
    }
}

fn help_overlay_text() -> &'static str {
    "j/k move rows, h/l move columns, g/G first/last, ctrl+d/u half page\n\
s cycle sort on column, S clear sorts, / search, r reload\n\
tab/shift+tab (or f/b) switch page, enter open kit, esc dismiss alert or go back\n\
space check row, * check all visible (again to clear), q edit quantity\n\
x submit checked rows (X rejects on approve), row keys as listed in the actions column\n\
forms: tab/shift+tab move, enter submit, esc cancel\n\
deletes ask first: y sends, any other key cancels\n\
ctrl+q quit, ? close help"
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
