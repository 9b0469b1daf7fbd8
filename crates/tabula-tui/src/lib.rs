// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::collections::BTreeSet;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tabula_app::{
    AppCommand, AppMode, AppState, EditMode, GridResult, Notice, PendingDelete, PromptKind,
    Shell, TableController, is_safe_identifier,
};

const PAGE_ROWS: isize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    selected_row: usize,
    field_cursor: usize,
    marked: BTreeSet<usize>,
    pending_delete: Option<PendingDelete>,
    prompt_input: String,
    new_table_name: String,
    status_token: u64,
}

pub fn run_app(state: &mut AppState, shell: &mut Shell, notices: &[String]) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if !notices.is_empty() {
        emit_status(state, &mut view_data, &internal_tx, notices.join(" | "));
    } else if shell.is_offline() {
        emit_status(
            state,
            &mut view_data,
            &internal_tx,
            "database unreachable; editing an offline test table",
        );
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, shell, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, shell, &mut view_data, &internal_tx, key) {
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
    let message: String = message.into();
    state.dispatch(AppCommand::SetStatus(one_line(&message)));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Validation errors list one column per line.
fn one_line(message: &str) -> String {
    let mut lines = message.lines().map(str::trim).filter(|line| !line.is_empty());
    let first = lines.next().unwrap_or_default().to_owned();
    lines.fold(first, |mut joined, line| {
        if !joined.ends_with(':') {
            joined.push(';');
        }
        joined.push(' ');
        joined.push_str(line);
        joined
    })
}

fn report(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    outcome: GridResult<Notice>,
) {
    let message = match outcome {
        Ok(notice) => notice.message(),
        Err(error) => error.to_string(),
    };
    emit_status(state, view_data, internal_tx, message);
}

fn handle_key_event(
    state: &mut AppState,
    shell: &mut Shell,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if state.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            state.dispatch(AppCommand::ToggleHelp);
        }
        return false;
    }

    match state.mode {
        AppMode::Nav => handle_nav_key(state, shell, view_data, internal_tx, key),
        AppMode::Filter | AppMode::Append => {
            handle_input_key(state, shell, view_data, internal_tx, key);
        }
        AppMode::Prompt(kind) => handle_prompt_key(state, shell, view_data, internal_tx, kind, key),
    }
    false
}

fn handle_nav_key(
    state: &mut AppState,
    shell: &mut Shell,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Tab => switch_table(shell, view_data, 1),
        KeyCode::BackTab => switch_table(shell, view_data, -1),
        KeyCode::Char('j') | KeyCode::Down => move_row(shell, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_row(shell, view_data, -1),
        KeyCode::PageDown => move_row(shell, view_data, PAGE_ROWS),
        KeyCode::PageUp => move_row(shell, view_data, -PAGE_ROWS),
        KeyCode::Char('g') => view_data.selected_row = 0,
        KeyCode::Char('G') => move_row(shell, view_data, isize::MAX / 2),
        KeyCode::Char(' ') => {
            if let Some(index) = shell.active().and_then(|table| current_row(table, view_data))
                && !view_data.marked.remove(&index)
            {
                view_data.marked.insert(index);
            }
        }
        KeyCode::Char('?') => {
            state.dispatch(AppCommand::ToggleHelp);
        }
        KeyCode::Char('/') if shell.active().is_some() => {
            view_data.field_cursor = 0;
            state.dispatch(AppCommand::EnterFilter);
        }
        KeyCode::Char('a') if shell.active().is_some() => {
            view_data.field_cursor = 0;
            state.dispatch(AppCommand::EnterAppend);
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            request_delete(state, shell, view_data, internal_tx);
        }
        KeyCode::Char('l') => {
            let outcome = shell.with_active(|table, backend| table.load(backend));
            view_data.marked.clear();
            clamp_cursor(shell, view_data);
            report(state, view_data, internal_tx, outcome);
        }
        KeyCode::Char('r') => {
            let outcome = shell.with_active(|table, backend| table.reload(backend));
            view_data.marked.clear();
            clamp_cursor(shell, view_data);
            report(state, view_data, internal_tx, outcome);
        }
        KeyCode::Char('s') => {
            let outcome = shell.with_active(|table, backend| table.save_all(backend, false));
            if let Ok(notice @ Notice::ConfirmOverwrite { .. }) = &outcome {
                emit_status(state, view_data, internal_tx, notice.message());
                state.dispatch(AppCommand::OpenPrompt(PromptKind::ConfirmOverwrite));
                return;
            }
            view_data.marked.clear();
            clamp_cursor(shell, view_data);
            report(state, view_data, internal_tx, outcome);
        }
        KeyCode::Char('n') => {
            view_data.prompt_input.clear();
            state.dispatch(AppCommand::OpenPrompt(PromptKind::NewTableName));
        }
        KeyCode::Char('D') if shell.active().is_some() => {
            state.dispatch(AppCommand::OpenPrompt(PromptKind::ConfirmDrop));
        }
        KeyCode::Char('R') | KeyCode::F(5) => {
            let outcome = shell.refresh().map(|loaded| loaded.notice());
            reset_selection(view_data);
            report(state, view_data, internal_tx, outcome);
        }
        _ => {}
    }
}

fn handle_input_key(
    state: &mut AppState,
    shell: &mut Shell,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let filtering = state.mode == AppMode::Filter;
    match key.code {
        KeyCode::Esc => {
            state.dispatch(AppCommand::ExitToNav);
            return;
        }
        KeyCode::Enter if !filtering => {
            let outcome = shell.with_active(|table, backend| table.insert(backend));
            if outcome.is_ok() {
                state.dispatch(AppCommand::ExitToNav);
            }
            report(state, view_data, internal_tx, outcome);
            return;
        }
        _ => {}
    }

    let Some(table) = shell.active_mut() else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };
    let field_count = table.form().field_count().max(1);

    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            view_data.field_cursor = (view_data.field_cursor + 1) % field_count;
        }
        KeyCode::BackTab | KeyCode::Up => {
            view_data.field_cursor = (view_data.field_cursor + field_count - 1) % field_count;
        }
        KeyCode::Backspace => {
            if let Some(input) = active_input(table, filtering, view_data.field_cursor) {
                input.pop();
            }
        }
        KeyCode::Char(ch) => {
            if let Some(input) = active_input(table, filtering, view_data.field_cursor) {
                input.push(ch);
            }
        }
        KeyCode::Enter => {
            let notice = table.apply_filter();
            view_data.selected_row = 0;
            view_data.marked.clear();
            state.dispatch(AppCommand::ExitToNav);
            report(state, view_data, internal_tx, Ok(notice));
        }
        _ => {}
    }
}

fn active_input(
    table: &mut TableController,
    filtering: bool,
    column: usize,
) -> Option<&mut String> {
    if filtering {
        table.filter_input_mut(column)
    } else {
        table.append_input_mut(column)
    }
}

fn handle_prompt_key(
    state: &mut AppState,
    shell: &mut Shell,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: PromptKind,
    key: KeyEvent,
) {
    if key.code == KeyCode::Esc {
        view_data.pending_delete = None;
        state.dispatch(AppCommand::ExitToNav);
        emit_status(state, view_data, internal_tx, "canceled");
        return;
    }

    if kind.expects_yes_no() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.dispatch(AppCommand::ExitToNav);
                confirm_prompt(state, shell, view_data, internal_tx, kind);
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                view_data.pending_delete = None;
                state.dispatch(AppCommand::ExitToNav);
                emit_status(state, view_data, internal_tx, "canceled");
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Backspace => {
            view_data.prompt_input.pop();
        }
        KeyCode::Char(ch) => view_data.prompt_input.push(ch),
        KeyCode::Enter => submit_text_prompt(state, shell, view_data, internal_tx, kind),
        _ => {}
    }
}

fn confirm_prompt(
    state: &mut AppState,
    shell: &mut Shell,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: PromptKind,
) {
    let outcome = match kind {
        PromptKind::ConfirmDelete => {
            let Some(pending) = view_data.pending_delete.take() else {
                return;
            };
            view_data.marked.clear();
            shell.with_active(|table, backend| table.delete(backend, pending))
        }
        PromptKind::ConfirmOverwrite => {
            view_data.marked.clear();
            shell.with_active(|table, backend| table.save_all(backend, true))
        }
        PromptKind::ConfirmDrop => {
            let Some(name) = shell.active().map(|table| table.name().to_owned()) else {
                return;
            };
            reset_selection(view_data);
            shell.drop_table(&name)
        }
        PromptKind::NewTableName | PromptKind::NewTableColumns => return,
    };
    clamp_cursor(shell, view_data);
    report(state, view_data, internal_tx, outcome);
}

fn submit_text_prompt(
    state: &mut AppState,
    shell: &mut Shell,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: PromptKind,
) {
    let answer = view_data.prompt_input.trim().to_owned();
    match kind {
        PromptKind::NewTableName => {
            if !is_safe_identifier(&answer) {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    "table name: use letters, digits and underscores",
                );
                return;
            }
            view_data.new_table_name = answer;
            view_data.prompt_input.clear();
            state.dispatch(AppCommand::OpenPrompt(PromptKind::NewTableColumns));
        }
        PromptKind::NewTableColumns => {
            let count = if answer.is_empty() {
                Ok(1)
            } else {
                answer.parse::<usize>()
            };
            let Ok(count) = count else {
                emit_status(state, view_data, internal_tx, "column count must be a number");
                return;
            };
            state.dispatch(AppCommand::ExitToNav);
            let name = std::mem::take(&mut view_data.new_table_name);
            let outcome = shell.create_table(&name, count);
            reset_selection(view_data);
            report(state, view_data, internal_tx, outcome);
        }
        PromptKind::ConfirmDelete | PromptKind::ConfirmOverwrite | PromptKind::ConfirmDrop => {}
    }
}

fn request_delete(
    state: &mut AppState,
    shell: &Shell,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(table) = shell.active() else {
        return;
    };
    // Only rows the filter lets through can be deleted.
    let visible = table.visible_rows();
    let marked = view_data
        .marked
        .iter()
        .copied()
        .filter(|index| visible.contains(index))
        .collect::<BTreeSet<_>>();
    let selection = if marked.is_empty() {
        current_row(table, view_data).into_iter().collect()
    } else {
        marked
    };
    match table.request_delete(&selection) {
        Some(pending) => {
            let prompt = pending.prompt();
            view_data.pending_delete = Some(pending);
            state.dispatch(AppCommand::OpenPrompt(PromptKind::ConfirmDelete));
            emit_status(state, view_data, internal_tx, prompt);
        }
        None => emit_status(
            state,
            view_data,
            internal_tx,
            Notice::NothingSelected.message(),
        ),
    }
}

fn current_row(table: &TableController, view_data: &ViewData) -> Option<usize> {
    table.visible_rows().get(view_data.selected_row).copied()
}

fn move_row(shell: &Shell, view_data: &mut ViewData, delta: isize) {
    let Some(table) = shell.active() else {
        return;
    };
    let count = table.visible_count();
    if count == 0 {
        view_data.selected_row = 0;
        return;
    }
    let next = (view_data.selected_row as isize).saturating_add(delta);
    view_data.selected_row = next.clamp(0, count as isize - 1) as usize;
}

fn clamp_cursor(shell: &Shell, view_data: &mut ViewData) {
    move_row(shell, view_data, 0);
}

fn reset_selection(view_data: &mut ViewData) {
    view_data.selected_row = 0;
    view_data.marked.clear();
    view_data.pending_delete = None;
}

fn switch_table(shell: &mut Shell, view_data: &mut ViewData, delta: isize) {
    let count = shell.tables().len();
    if count == 0 {
        return;
    }
    let current = shell.active_index().unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(count as isize) as usize;
    shell.show_index(next);
    reset_selection(view_data);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, shell: &Shell, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let menu = shell.menu();
    let titles = menu
        .iter()
        .map(|entry| entry.label.clone())
        .collect::<Vec<String>>();
    let title = if shell.is_offline() {
        "tabula (offline)"
    } else {
        "tabula"
    };
    let tabs = Tabs::new(titles)
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(shell.active_index().unwrap_or(0));
    frame.render_widget(tabs, layout[0]);

    match shell.active() {
        Some(table) => {
            render_table(frame, layout[1], table, view_data);
            let form = Paragraph::new(render_form_text(table, state, view_data))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(form, layout[2]);
        }
        None => {
            let empty = Paragraph::new("no tables; press n to create one")
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(empty, layout[1]);
        }
    }

    let status_widget = Paragraph::new(status_text(state, shell))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[3]);

    if let AppMode::Prompt(kind) = state.mode {
        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(prompt_text(kind, shell, view_data))
            .block(Block::default().title("confirm").borders(Borders::ALL));
        frame.render_widget(prompt, area);
    }

    if state.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    table: &TableController,
    view_data: &ViewData,
) {
    let fields = &table.form().append_fields;
    let mut widths = vec![Constraint::Length(1)];
    widths.extend(std::iter::repeat_n(Constraint::Min(6), fields.len()));

    let header = Row::new(
        std::iter::once(Cell::from(" ")).chain(fields.iter().map(|field| {
            Cell::from(field.label.clone()).style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
        })),
    );

    let rows = table
        .visible_rows()
        .into_iter()
        .enumerate()
        .filter_map(|(position, index)| {
            let row = table.store().get(index)?;
            let mark = if view_data.marked.contains(&index) {
                "*"
            } else {
                " "
            };
            let mut style = Style::default();
            if position == view_data.selected_row {
                style = style.bg(Color::DarkGray);
            }
            if view_data.marked.contains(&index) {
                style = style.fg(Color::Red);
            }
            let cells = std::iter::once(Cell::from(mark))
                .chain(row.iter().map(|value| Cell::from(value.clone())));
            Some(Row::new(cells).style(style))
        })
        .collect::<Vec<_>>();

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(table))
                .borders(Borders::ALL),
        );
    frame.render_widget(widget, area);
}

fn table_title(table: &TableController) -> String {
    let mut title = format!(
        "{} ({}/{})",
        table.form().title,
        table.visible_count(),
        table.store().count()
    );
    if table.filter_active() {
        title.push_str(" filtered");
    }
    title
}

fn render_form_text(table: &TableController, state: &AppState, view_data: &ViewData) -> String {
    let line = |label: &str, inputs: &[String], editing: bool| {
        let fields = table
            .form()
            .append_fields
            .iter()
            .zip(inputs)
            .map(|(field, input)| {
                let cursor = editing && field.column == view_data.field_cursor;
                let marker = if cursor { ">" } else { "" };
                format!("{marker}{}: [{input}]", field.label)
            })
            .collect::<Vec<_>>()
            .join("  ");
        format!("{label:<7}{fields}")
    };

    let current_hint = table
        .form()
        .append_fields
        .get(view_data.field_cursor)
        .filter(|_| state.is_editing())
        .map(|field| format!("  ({}: {})", field.type_name, field.kind.hint()))
        .unwrap_or_default();

    format!(
        "{}\n{}{current_hint}",
        line("filter", table.filter_inputs(), state.mode == AppMode::Filter),
        line("add", table.append_inputs(), state.mode == AppMode::Append),
    )
}

fn prompt_text(kind: PromptKind, shell: &Shell, view_data: &ViewData) -> String {
    match kind {
        PromptKind::ConfirmDelete => view_data
            .pending_delete
            .as_ref()
            .map(PendingDelete::prompt)
            .unwrap_or_default(),
        PromptKind::ConfirmOverwrite => {
            "replace every row in the database with the rows shown? (y/n)".to_owned()
        }
        PromptKind::ConfirmDrop => format!(
            "drop table {}? this cannot be undone (y/n)",
            shell.active().map(TableController::name).unwrap_or_default()
        ),
        PromptKind::NewTableName => format!("new table name: {}_", view_data.prompt_input),
        PromptKind::NewTableColumns => format!(
            "number of text columns for {}: {}_",
            view_data.new_table_name, view_data.prompt_input
        ),
    }
}

fn status_text(state: &AppState, shell: &Shell) -> String {
    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Filter => "FILTER",
        AppMode::Append => "ADD",
        AppMode::Prompt(_) => "PROMPT",
    };
    let mode = match shell.edit_mode() {
        EditMode::Staged => format!("{mode} staged"),
        EditMode::Direct => mode.to_owned(),
    };
    let keys = match state.mode {
        AppMode::Nav if shell.active().is_none() => "n new | R refresh | ? help | ctrl+q",
        AppMode::Nav => {
            "tab table | j/k | space mark | / filter | a add | d del | l/r load | s save | ? help | ctrl+q"
        }
        AppMode::Filter => "tab field | enter apply | esc back",
        AppMode::Append => "tab field | enter add | esc back",
        AppMode::Prompt(kind) if kind.expects_yes_no() => "y confirm | n/esc cancel",
        AppMode::Prompt(_) => "enter accept | esc cancel",
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {keys}"),
        None => format!("{mode} | {keys}"),
    }
}

fn help_overlay_text() -> &'static str {
    "\
tables
  tab / shift+tab   next / previous table
  n                 create a table
  D                 drop the current table
  R / F5            refresh every table from the database

rows
  j / k, pgup/pgdn  move
  g / G             first / last row
  space             mark row for deletion
  d                 delete marked rows (or the current row)

editing
  /                 edit filter fields, enter applies
  a                 edit add fields, enter inserts
  tab / shift+tab   next / previous field
  esc               back to navigation

database
  l                 load rows, keep filter text
  r                 reload rows, clear filter
  s                 save every row (replaces table contents)

global
  ?                 toggle help
  ctrl+q            quit"
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
