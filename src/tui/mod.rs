//! Terminal wizard UI.
//!
//! The wizard walks through a strict linear page order: source filename,
//! source format, target filename, target format, planner preference, then
//! either plan generation + confirmation + step execution or a direct
//! migration, and finally a terminal page.
//!
//! Asynchronous work (plan generation, step execution, direct migration)
//! runs on worker threads and reports back over an mpsc channel as `UiMsg`
//! values drained by the event loop. At most one operation is outstanding
//! at a time: the next step's operation is only issued after the previous
//! step's completion message has been applied.
//!
//! Note: Logging is file-only while the TUI owns the terminal.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{info, warn};
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::migration::{self, STEP_DELAY};
use crate::models::config::MigrationConfig;
use crate::models::plan::{MigrationPlan, StepStatus};
use crate::models::records::{PhoneSystemFormat, TwilioPhoneSystem};
use crate::planner::Planner;
use crate::utils::validation::validate_filename;

const APP_TITLE: &str = " PBX Migration Wizard ";

const PLANNER_OPTIONS: [&str; 2] = [
    "Yes - use the AI migration planner",
    "No - standard migration",
];

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    EnteringSource,
    SelectingSourceFormat,
    EnteringTarget,
    SelectingTargetFormat,
    AskingPlanPreference,
    GeneratingPlan,
    ConfirmingPlan,
    Executing,
    Completed,
}

/// Completion messages sent from worker threads back to the event loop.
#[derive(Debug, Clone)]
enum UiMsg {
    PlanComplete {
        plan: Option<MigrationPlan>,
        error: Option<String>,
    },
    StepComplete {
        step_index: usize,
        detail: String,
        error: Option<String>,
    },
    MigrationFinished {
        error: Option<String>,
    },
}

/// Asynchronous operation the state machine wants issued next. Exactly one
/// may be outstanding at a time; the event loop dispatches these to worker
/// threads.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingOp {
    GeneratePlan,
    RunDirectMigration,
    ExecuteStep(usize),
}

/// Single-line text input. The cursor is a char position, not a byte
/// offset, so multibyte input edits at char boundaries.
#[derive(Debug, Clone, Default)]
struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    /// Byte offset of the cursor's char position.
    fn byte_offset(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(offset, _)| offset)
            .unwrap_or(self.value.len())
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(c) => {
                self.value.insert(self.byte_offset(), c);
                self.cursor = (self.cursor + 1).min(self.char_count());
                true
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.value.remove(self.byte_offset());
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor < self.char_count() {
                    self.value.remove(self.byte_offset());
                }
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.char_count());
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = self.char_count();
                true
            }
            _ => false,
        }
    }
}

/// The wizard's single mutable aggregate. Only the event-loop thread
/// touches it; workers report through `UiMsg`.
struct WizardState {
    page: Page,
    config: MigrationConfig,
    filename_input: TextInput,
    input_prompt: &'static str,
    input_error: Option<String>,
    source_selected: usize,
    target_selected: usize,
    planner_selected: usize,
    plan: Option<MigrationPlan>,
    steps: Vec<crate::models::plan::ExecutionStep>,
    current_step: usize,
    error: Option<String>,
    migration_done: bool,
    user_approved: bool,
    spinner_frame: usize,
    quit: bool,
}

impl WizardState {
    fn new() -> Self {
        Self {
            page: Page::EnteringSource,
            config: MigrationConfig::default(),
            filename_input: TextInput::default(),
            input_prompt: "Enter source JSON filename",
            input_error: None,
            source_selected: 0,
            target_selected: 0,
            planner_selected: 0,
            plan: None,
            steps: Vec::new(),
            current_step: 0,
            error: None,
            migration_done: false,
            user_approved: false,
            spinner_frame: 0,
            quit: false,
        }
    }

    fn tick(&mut self) {
        if matches!(self.page, Page::GeneratingPlan | Page::Executing) {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
    }
}

/// Move a clamped selection cursor. No wraparound: up at 0 stays at 0,
/// down at the last index stays there.
fn move_cursor(selected: usize, len: usize, code: KeyCode) -> usize {
    match code {
        KeyCode::Up | KeyCode::Char('k') => selected.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => {
            if len == 0 {
                0
            } else {
                (selected + 1).min(len - 1)
            }
        }
        _ => selected,
    }
}

fn is_terminate(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Terminate keys on pages where plain characters are not text input.
fn is_menu_terminate(key: &KeyEvent) -> bool {
    is_terminate(key) || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
}

/// Apply one key event. Returns the asynchronous operation to issue, if
/// the transition requires one. Events not valid for the current page are
/// ignored.
fn handle_key(state: &mut WizardState, key: KeyEvent) -> Option<PendingOp> {
    match state.page {
        Page::EnteringSource => {
            if is_terminate(&key) || key.code == KeyCode::Esc {
                state.quit = true;
                return None;
            }
            if key.code == KeyCode::Enter {
                match validate_filename(&state.filename_input.value) {
                    Ok(normalized) => {
                        state.config.source_file = normalized;
                        state.input_error = None;
                        state.page = Page::SelectingSourceFormat;
                    }
                    Err(msg) => state.input_error = Some(msg),
                }
                return None;
            }
            state.filename_input.handle_key(key.code);
            None
        }

        Page::SelectingSourceFormat => {
            if is_menu_terminate(&key) {
                state.quit = true;
                return None;
            }
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    state.config.source_format = PhoneSystemFormat::ALL[state.source_selected];
                    state.page = Page::EnteringTarget;
                    // Reuse the text input for the target filename.
                    state.filename_input.clear();
                    state.input_prompt = "Enter target filename";
                    state.input_error = None;
                }
                code => {
                    state.source_selected =
                        move_cursor(state.source_selected, PhoneSystemFormat::ALL.len(), code);
                }
            }
            None
        }

        Page::EnteringTarget => {
            if is_terminate(&key) || key.code == KeyCode::Esc {
                state.quit = true;
                return None;
            }
            if key.code == KeyCode::Enter {
                match validate_filename(&state.filename_input.value) {
                    Ok(normalized) => {
                        state.config.target_file = normalized;
                        state.input_error = None;
                        state.page = Page::SelectingTargetFormat;
                    }
                    Err(msg) => state.input_error = Some(msg),
                }
                return None;
            }
            state.filename_input.handle_key(key.code);
            None
        }

        Page::SelectingTargetFormat => {
            if is_menu_terminate(&key) {
                state.quit = true;
                return None;
            }
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    state.config.target_format = PhoneSystemFormat::ALL[state.target_selected];
                    state.page = Page::AskingPlanPreference;
                }
                code => {
                    state.target_selected =
                        move_cursor(state.target_selected, PhoneSystemFormat::ALL.len(), code);
                }
            }
            None
        }

        Page::AskingPlanPreference => {
            if is_menu_terminate(&key) {
                state.quit = true;
                return None;
            }
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    state.config.use_planner = state.planner_selected == 0;
                    if state.config.use_planner {
                        state.page = Page::GeneratingPlan;
                        Some(PendingOp::GeneratePlan)
                    } else {
                        state.page = Page::Executing;
                        Some(PendingOp::RunDirectMigration)
                    }
                }
                code => {
                    state.planner_selected =
                        move_cursor(state.planner_selected, PLANNER_OPTIONS.len(), code);
                    None
                }
            }
        }

        Page::GeneratingPlan => {
            // Waiting on the plan service; only terminate is accepted.
            if is_menu_terminate(&key) {
                state.quit = true;
            }
            None
        }

        Page::ConfirmingPlan => {
            if is_menu_terminate(&key) {
                state.quit = true;
                return None;
            }
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    let Some(plan) = state.plan.as_ref() else {
                        return None;
                    };
                    state.user_approved = true;
                    state.steps = plan.build_execution_steps();
                    state.current_step = 0;
                    state.page = Page::Executing;
                    if state.steps.is_empty() {
                        state.migration_done = true;
                        state.page = Page::Completed;
                        None
                    } else {
                        Some(PendingOp::ExecuteStep(0))
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    state.error = Some(crate::error::MigrationError::Cancelled.to_string());
                    state.page = Page::Completed;
                    None
                }
                _ => None,
            }
        }

        Page::Executing => {
            // Waiting on step completions; only terminate is accepted.
            if is_menu_terminate(&key) {
                state.quit = true;
            }
            None
        }

        Page::Completed => {
            state.quit = true;
            None
        }
    }
}

/// Apply one worker completion message. Messages that do not match the
/// current page (or the current step cursor) are ignored.
fn apply_message(state: &mut WizardState, msg: UiMsg) -> Option<PendingOp> {
    match msg {
        UiMsg::PlanComplete { plan, error } => {
            if state.page != Page::GeneratingPlan {
                return None;
            }
            match (plan, error) {
                (Some(plan), None) => {
                    state.plan = Some(plan);
                    state.page = Page::ConfirmingPlan;
                }
                (_, error) => {
                    state.error =
                        Some(error.unwrap_or_else(|| "plan generation failed".to_string()));
                    state.page = Page::Completed;
                }
            }
            None
        }

        UiMsg::StepComplete {
            step_index,
            detail,
            error,
        } => {
            if state.page != Page::Executing || step_index != state.current_step {
                return None;
            }

            match error {
                Some(error) => {
                    if let Some(step) = state.steps.get_mut(state.current_step) {
                        step.status = StepStatus::Failed;
                        step.error = Some(error.clone());
                    }
                    state.error = Some(error);
                    state.page = Page::Completed;
                    None
                }
                None => {
                    if let Some(step) = state.steps.get_mut(state.current_step) {
                        step.status = StepStatus::Completed;
                        step.detail = Some(detail);
                    }
                    state.current_step += 1;

                    if state.current_step >= state.steps.len() {
                        state.migration_done = true;
                        state.page = Page::Completed;
                        None
                    } else {
                        if let Some(step) = state.steps.get_mut(state.current_step) {
                            step.status = StepStatus::Running;
                        }
                        Some(PendingOp::ExecuteStep(state.current_step))
                    }
                }
            }
        }

        UiMsg::MigrationFinished { error } => {
            if state.page != Page::Executing {
                return None;
            }
            match error {
                Some(error) => state.error = Some(error),
                None => state.migration_done = true,
            }
            state.page = Page::Completed;
            None
        }
    }
}

// ============================================================================
// Worker dispatch
// ============================================================================

fn dispatch(op: PendingOp, state: &WizardState, tx: &mpsc::Sender<UiMsg>) {
    match op {
        PendingOp::GeneratePlan => spawn_generate_plan(state.config.clone(), tx.clone()),
        PendingOp::RunDirectMigration => spawn_direct_migration(state.config.clone(), tx.clone()),
        PendingOp::ExecuteStep(index) => {
            if let Some(plan) = state.plan.clone() {
                spawn_execute_step(state.config.clone(), plan, index, tx.clone());
            }
        }
    }
}

fn spawn_generate_plan(config: MigrationConfig, tx: mpsc::Sender<UiMsg>) {
    thread::spawn(move || {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            "[PHASE: planning] Plan generation started (correlation_id={})",
            correlation_id
        );

        let fail = |tx: &mpsc::Sender<UiMsg>, message: String| {
            let _ = tx.send(UiMsg::PlanComplete {
                plan: None,
                error: Some(message),
            });
        };

        let planner = match Planner::from_env() {
            Ok(planner) => planner,
            Err(e) => return fail(&tx, e.to_string()),
        };

        let source_data = match std::fs::read(&config.source_file) {
            Ok(data) => data,
            Err(e) => return fail(&tx, format!("failed to read source file: {}", e)),
        };
        let system: TwilioPhoneSystem = match serde_json::from_slice(&source_data) {
            Ok(system) => system,
            Err(e) => return fail(&tx, format!("failed to parse source data: {}", e)),
        };

        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => return fail(&tx, format!("internal error starting planner: {}", e)),
        };

        match rt.block_on(planner.plan_migration_order(&system.users)) {
            Ok(plan) => {
                // Readiness commentary is best-effort; failure never blocks
                // the session.
                match rt.block_on(planner.analyze_data_quality(&system.users)) {
                    Ok(analysis) => info!(
                        "[PHASE: planning] Data quality analysis (correlation_id={}): {}",
                        correlation_id, analysis
                    ),
                    Err(e) => warn!(
                        "[PHASE: planning] Data quality analysis failed (correlation_id={}): {}",
                        correlation_id, e
                    ),
                }
                let _ = tx.send(UiMsg::PlanComplete {
                    plan: Some(plan),
                    error: None,
                });
            }
            Err(e) => fail(&tx, e.to_string()),
        }
    });
}

fn spawn_execute_step(
    config: MigrationConfig,
    plan: MigrationPlan,
    step_index: usize,
    tx: mpsc::Sender<UiMsg>,
) {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(UiMsg::StepComplete {
                    step_index,
                    detail: String::new(),
                    error: Some(format!("internal error starting step: {}", e)),
                });
                return;
            }
        };

        match rt.block_on(migration::execute_step(&config, &plan, step_index, STEP_DELAY)) {
            Ok(detail) => {
                let _ = tx.send(UiMsg::StepComplete {
                    step_index,
                    detail,
                    error: None,
                });
            }
            Err(e) => {
                let _ = tx.send(UiMsg::StepComplete {
                    step_index,
                    detail: String::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    });
}

fn spawn_direct_migration(config: MigrationConfig, tx: mpsc::Sender<UiMsg>) {
    thread::spawn(move || {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            "[PHASE: execution] Direct migration started (correlation_id={})",
            correlation_id
        );
        let error = migration::migrate_direct(&config).err().map(|e| e.to_string());
        let _ = tx.send(UiMsg::MigrationFinished { error });
    });
}

// ============================================================================
// Event loop
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the interactive wizard until the user quits or the session ends.
pub fn run() -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal);
    restore_terminal(&mut terminal)?;
    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut state = WizardState::new();
    let (tx, rx) = mpsc::channel::<UiMsg>();

    while !state.quit {
        while let Ok(msg) = rx.try_recv() {
            if let Some(op) = apply_message(&mut state, msg) {
                dispatch(op, &state, &tx);
            }
        }

        terminal.draw(|f| draw(f.size(), f, &state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let Some(op) = handle_key(&mut state, key) {
                    dispatch(op, &state, &tx);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            state.tick();
            last_tick = Instant::now();
        }
    }

    info!(
        "[PHASE: tui] Wizard session ended (approved_plan={}, error={:?})",
        state.user_approved, state.error
    );
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

fn title_style() -> Style {
    Style::default()
        .fg(Color::White)
        .bg(Color::Magenta)
        .add_modifier(Modifier::BOLD)
}

fn subtitle_style() -> Style {
    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
}

fn help_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn error_style() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

fn success_style() -> Style {
    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
}

fn planner_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

/// Style for one execution-step status tag. A pure lookup so rendering
/// stays free of mutable styling state.
fn status_style(status: StepStatus) -> Style {
    match status {
        StepStatus::Pending => Style::default().fg(Color::DarkGray),
        StepStatus::Running => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        StepStatus::Completed => Style::default().fg(Color::Green),
        StepStatus::Failed => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn status_icon(status: StepStatus, spinner_frame: usize) -> &'static str {
    match status {
        StepStatus::Pending => "⏳",
        StepStatus::Running => SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()],
        StepStatus::Completed => "✅",
        StepStatus::Failed => "❌",
    }
}

fn risk_icon(risk: &str) -> &'static str {
    match risk {
        "high" => "🔴",
        "medium" => "🟡",
        _ => "🟢",
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame<'_>, state: &WizardState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(APP_TITLE)
        .title_style(title_style());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();

    match state.page {
        Page::EnteringSource | Page::EnteringTarget => {
            let step_no = if state.page == Page::EnteringSource { 1 } else { 3 };
            lines.push(Line::styled(
                format!("Step {}: {}", step_no, state.input_prompt),
                subtitle_style(),
            ));
            lines.push(Line::raw(""));
            if state.page == Page::EnteringTarget {
                lines.push(Line::raw(format!(
                    "Source: {} ({})",
                    state.config.source_file, state.config.source_format
                )));
                lines.push(Line::raw(""));
            }
            lines.push(Line::raw(format!("> {}_", state.filename_input.value)));
            if let Some(error) = &state.input_error {
                lines.push(Line::styled(error.clone(), error_style()));
            }
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "Type a filename and press Enter. Esc or Ctrl+C quits.",
                help_style(),
            ));
        }

        Page::SelectingSourceFormat | Page::SelectingTargetFormat => {
            let (step_no, label, selected) = if state.page == Page::SelectingSourceFormat {
                (2, "source", state.source_selected)
            } else {
                (4, "target", state.target_selected)
            };
            lines.push(Line::styled(
                format!("Step {}: Select {} format", step_no, label),
                subtitle_style(),
            ));
            lines.push(Line::raw(""));
            lines.push(Line::raw(format!("Source file: {}", state.config.source_file)));
            if state.page == Page::SelectingTargetFormat {
                lines.push(Line::raw(format!("Target file: {}", state.config.target_file)));
            }
            lines.push(Line::raw(""));
            for (i, format) in PhoneSystemFormat::ALL.iter().enumerate() {
                let cursor = if i == selected { ">" } else { " " };
                lines.push(Line::raw(format!("{} {}", cursor, format)));
            }
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "Navigate with ↑/↓, select with Enter. q quits.",
                help_style(),
            ));
        }

        Page::AskingPlanPreference => {
            lines.push(Line::styled(
                "Step 5: Use the AI planner for this migration?",
                planner_style(),
            ));
            lines.push(Line::raw(""));
            lines.push(Line::raw(
                "The planner analyzes your data and proposes a migration order and to-do list.",
            ));
            lines.push(Line::raw(""));
            for (i, option) in PLANNER_OPTIONS.iter().enumerate() {
                let cursor = if i == state.planner_selected { ">" } else { " " };
                lines.push(Line::raw(format!("{} {}", cursor, option)));
            }
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "Navigate with ↑/↓, select with Enter. q quits.",
                help_style(),
            ));
        }

        Page::GeneratingPlan => {
            lines.push(Line::styled(
                "Analyzing your data and creating a migration plan...",
                planner_style(),
            ));
            lines.push(Line::raw(""));
            lines.push(Line::raw(format!(
                "{} Please wait while the planner examines your phone system data...",
                SPINNER_FRAMES[state.spinner_frame % SPINNER_FRAMES.len()]
            )));
        }

        Page::ConfirmingPlan => {
            if let Some(plan) = &state.plan {
                lines.push(Line::styled("Proposed Migration Plan", planner_style()));
                lines.push(Line::raw(""));
                lines.push(Line::raw(format!("Estimated time: {}", plan.estimated_time)));
                lines.push(Line::raw(""));
                lines.push(Line::styled("Strategy:", subtitle_style()));
                lines.push(Line::raw(plan.reasoning.clone()));
                lines.push(Line::raw(""));
                lines.push(Line::styled("Risk assessment:", subtitle_style()));
                lines.push(Line::raw(plan.risk_assessment.clone()));
                lines.push(Line::raw(""));
                lines.push(Line::styled("To-do list:", subtitle_style()));
                for todo in &plan.todo_list {
                    lines.push(Line::raw(format!(
                        "{}. {} {}",
                        todo.step,
                        risk_icon(&todo.risk),
                        todo.description
                    )));
                    lines.push(Line::raw(format!("   Action: {}", todo.action)));
                }
                lines.push(Line::raw(""));
                lines.push(Line::styled("User migration order:", subtitle_style()));
                for (i, item) in plan.recommended_order.iter().enumerate() {
                    lines.push(Line::raw(format!(
                        "{}. {} ({}) - {}",
                        i + 1,
                        item.account.name,
                        item.account.email,
                        item.reason
                    )));
                }
                lines.push(Line::raw(""));
                lines.push(Line::styled(
                    "Proceed with this plan? (Y/n)",
                    success_style(),
                ));
            }
        }

        Page::Executing => {
            lines.push(Line::styled("Executing Migration Plan", planner_style()));
            lines.push(Line::raw(""));
            if state.steps.is_empty() {
                lines.push(Line::raw(format!(
                    "{} Migrating {} to {}...",
                    SPINNER_FRAMES[state.spinner_frame % SPINNER_FRAMES.len()],
                    state.config.source_file,
                    state.config.target_file
                )));
            }
            for step in &state.steps {
                lines.push(Line::styled(
                    format!(
                        "{} Step {}: {} [{}]",
                        status_icon(step.status, state.spinner_frame),
                        step.step_number,
                        step.description,
                        step.status.as_str()
                    ),
                    status_style(step.status),
                ));
                if let Some(detail) = &step.detail {
                    lines.push(Line::raw(format!("   {}", detail)));
                }
                if let Some(error) = &step.error {
                    lines.push(Line::styled(format!("   Error: {}", error), error_style()));
                }
            }
        }

        Page::Completed => {
            if let Some(error) = &state.error {
                lines.push(Line::styled("Migration failed", error_style()));
                lines.push(Line::raw(""));
                lines.push(Line::raw(format!("Error: {}", error)));
            } else if state.migration_done {
                lines.push(Line::styled(
                    "Migration completed successfully!",
                    success_style(),
                ));
                lines.push(Line::raw(""));
                if state.config.use_planner {
                    lines.push(Line::styled("Enhanced with AI plan analysis", planner_style()));
                }
                lines.push(Line::raw(format!(
                    "Data migrated from {} ({}) to {} ({})",
                    state.config.source_file,
                    state.config.source_format,
                    state.config.target_file,
                    state.config.target_format
                )));
            }
            lines.push(Line::raw(""));
            lines.push(Line::styled("Press any key to exit", help_style()));
        }
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(paragraph, inner);
}

// ============================================================================
// Smoke mode
// ============================================================================

fn new_smoke_state(target: &str) -> WizardState {
    let mut state = WizardState::new();
    state.config.source_file = "twilio_export.json".to_string();
    state.config.source_format = PhoneSystemFormat::Twilio;
    state.config.target_file = "ringcentral_import.json".to_string();
    state.config.target_format = PhoneSystemFormat::RingCentral;

    let sample_plan = MigrationPlan {
        recommended_order: Vec::new(),
        reasoning: "Migrate administrators first to retain system management.".to_string(),
        risk_assessment: "Low risk overall; validate numbers before cutover.".to_string(),
        todo_list: vec![
            crate::models::plan::TodoItem {
                step: 1,
                description: "Backup current system data".to_string(),
                action: "Create a full backup".to_string(),
                risk: "low".to_string(),
                completed: false,
            },
            crate::models::plan::TodoItem {
                step: 2,
                description: "Generate migration file".to_string(),
                action: "Convert and write the target document".to_string(),
                risk: "medium".to_string(),
                completed: false,
            },
        ],
        estimated_time: "10 minutes".to_string(),
    };

    match target {
        "source" => {}
        "source-format" => state.page = Page::SelectingSourceFormat,
        "target" => {
            state.page = Page::EnteringTarget;
            state.input_prompt = "Enter target filename";
        }
        "target-format" => state.page = Page::SelectingTargetFormat,
        "planner" => state.page = Page::AskingPlanPreference,
        "generating" => state.page = Page::GeneratingPlan,
        "confirm" => {
            state.plan = Some(sample_plan);
            state.page = Page::ConfirmingPlan;
        }
        "executing" => {
            state.plan = Some(sample_plan.clone());
            state.steps = sample_plan.build_execution_steps();
            state.page = Page::Executing;
        }
        "done" => {
            state.migration_done = true;
            state.page = Page::Completed;
        }
        _ => {}
    }

    state
}

/// Non-interactive smoke mode: render a single frame for the named page to
/// an in-memory backend and exit. Usable from CI without touching the real
/// terminal (no raw mode / alternate screen).
pub fn smoke(target: &str) -> Result<()> {
    info!("[PHASE: tui] [STEP: smoke] Rendering single-frame smoke target={}", target);

    let state = new_smoke_state(target.trim().to_ascii_lowercase().as_str());
    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw(f.size(), f, &state))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::TodoItem;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut WizardState, text: &str) {
        for c in text.chars() {
            handle_key(state, key(KeyCode::Char(c)));
        }
    }

    fn todo(step: u32, description: &str) -> TodoItem {
        TodoItem {
            step,
            description: description.to_string(),
            action: String::new(),
            risk: "low".to_string(),
            completed: false,
        }
    }

    fn plan_with_steps(n: u32) -> MigrationPlan {
        MigrationPlan {
            todo_list: (1..=n).map(|i| todo(i, &format!("step {}", i))).collect(),
            ..Default::default()
        }
    }

    /// Drive the wizard to the plan-preference page.
    fn state_at_plan_preference() -> WizardState {
        let mut state = WizardState::new();
        type_text(&mut state, "source");
        handle_key(&mut state, key(KeyCode::Enter));
        handle_key(&mut state, key(KeyCode::Enter)); // Twilio
        type_text(&mut state, "target");
        handle_key(&mut state, key(KeyCode::Enter));
        handle_key(&mut state, key(KeyCode::Down)); // RingCentral
        handle_key(&mut state, key(KeyCode::Enter));
        assert_eq!(state.page, Page::AskingPlanPreference);
        state
    }

    /// Drive the wizard into Executing with an approved N-step plan.
    fn state_executing(n: u32) -> WizardState {
        let mut state = state_at_plan_preference();
        handle_key(&mut state, key(KeyCode::Enter)); // use planner
        let op = apply_message(
            &mut state,
            UiMsg::PlanComplete {
                plan: Some(plan_with_steps(n)),
                error: None,
            },
        );
        assert!(op.is_none());
        let op = handle_key(&mut state, key(KeyCode::Char('y')));
        assert_eq!(op, Some(PendingOp::ExecuteStep(0)));
        state
    }

    // -------------------------------------------------------------------------
    // Filename entry
    // -------------------------------------------------------------------------

    #[test]
    fn source_filename_is_normalized_on_submit() {
        let mut state = WizardState::new();
        type_text(&mut state, "accounts");
        handle_key(&mut state, key(KeyCode::Enter));

        assert_eq!(state.page, Page::SelectingSourceFormat);
        assert_eq!(state.config.source_file, "accounts.json");
    }

    #[test]
    fn empty_filename_is_rejected_without_transition() {
        let mut state = WizardState::new();
        handle_key(&mut state, key(KeyCode::Enter));

        assert_eq!(state.page, Page::EnteringSource);
        assert!(state.input_error.is_some());
        assert!(state.config.source_file.is_empty());
    }

    #[test]
    fn multibyte_filename_is_typable_and_submits() {
        let mut state = WizardState::new();
        type_text(&mut state, "café.json");
        assert_eq!(state.filename_input.value, "café.json");

        handle_key(&mut state, key(KeyCode::Enter));
        assert_eq!(state.page, Page::SelectingSourceFormat);
        assert_eq!(state.config.source_file, "café.json");
    }

    #[test]
    fn editing_around_multibyte_chars_stays_on_char_boundaries() {
        let mut input = TextInput::default();
        for c in "café".chars() {
            input.handle_key(KeyCode::Char(c));
        }

        // Backspace removes the accented char, not a byte of it.
        input.handle_key(KeyCode::Backspace);
        assert_eq!(input.value, "caf");

        // Reinsert mid-string: caf -> c<é>af via Home, Right, é.
        input.handle_key(KeyCode::Home);
        input.handle_key(KeyCode::Right);
        input.handle_key(KeyCode::Char('é'));
        assert_eq!(input.value, "céaf");

        // Delete forward over the char after the cursor.
        input.handle_key(KeyCode::Left);
        input.handle_key(KeyCode::Delete);
        assert_eq!(input.value, "caf");

        input.handle_key(KeyCode::End);
        input.handle_key(KeyCode::Char('é'));
        assert_eq!(input.value, "café");
    }

    #[test]
    fn q_is_typable_in_filename_entry() {
        let mut state = WizardState::new();
        type_text(&mut state, "quarterly");

        assert!(!state.quit);
        assert_eq!(state.filename_input.value, "quarterly");
    }

    #[test]
    fn input_buffer_resets_for_target_filename() {
        let mut state = WizardState::new();
        type_text(&mut state, "source");
        handle_key(&mut state, key(KeyCode::Enter));
        handle_key(&mut state, key(KeyCode::Enter)); // select format

        assert_eq!(state.page, Page::EnteringTarget);
        assert!(state.filename_input.value.is_empty());
        assert_eq!(state.input_prompt, "Enter target filename");
    }

    // -------------------------------------------------------------------------
    // Selection cursor clamping
    // -------------------------------------------------------------------------

    #[test]
    fn cursor_clamps_at_both_ends() {
        assert_eq!(move_cursor(0, 2, KeyCode::Up), 0);
        assert_eq!(move_cursor(0, 2, KeyCode::Char('k')), 0);
        assert_eq!(move_cursor(1, 2, KeyCode::Down), 1);
        assert_eq!(move_cursor(1, 2, KeyCode::Char('j')), 1);
        assert_eq!(move_cursor(0, 2, KeyCode::Down), 1);
        assert_eq!(move_cursor(1, 2, KeyCode::Up), 0);
    }

    #[test]
    fn format_menu_cursor_does_not_wrap() {
        let mut state = WizardState::new();
        type_text(&mut state, "source");
        handle_key(&mut state, key(KeyCode::Enter));

        handle_key(&mut state, key(KeyCode::Up));
        assert_eq!(state.source_selected, 0);
        handle_key(&mut state, key(KeyCode::Down));
        handle_key(&mut state, key(KeyCode::Down));
        handle_key(&mut state, key(KeyCode::Down));
        assert_eq!(state.source_selected, PhoneSystemFormat::ALL.len() - 1);
    }

    // -------------------------------------------------------------------------
    // Plan preference branches
    // -------------------------------------------------------------------------

    #[test]
    fn choosing_planner_issues_generate_plan() {
        let mut state = state_at_plan_preference();
        let op = handle_key(&mut state, key(KeyCode::Enter));

        assert_eq!(op, Some(PendingOp::GeneratePlan));
        assert_eq!(state.page, Page::GeneratingPlan);
        assert!(state.config.use_planner);
    }

    #[test]
    fn skipping_planner_issues_direct_migration() {
        let mut state = state_at_plan_preference();
        handle_key(&mut state, key(KeyCode::Down));
        let op = handle_key(&mut state, key(KeyCode::Enter));

        assert_eq!(op, Some(PendingOp::RunDirectMigration));
        assert_eq!(state.page, Page::Executing);
        assert!(!state.config.use_planner);
        assert!(state.steps.is_empty());
    }

    // -------------------------------------------------------------------------
    // Plan generation outcomes
    // -------------------------------------------------------------------------

    #[test]
    fn plan_success_moves_to_confirmation() {
        let mut state = state_at_plan_preference();
        handle_key(&mut state, key(KeyCode::Enter));

        apply_message(
            &mut state,
            UiMsg::PlanComplete {
                plan: Some(plan_with_steps(2)),
                error: None,
            },
        );
        assert_eq!(state.page, Page::ConfirmingPlan);
        assert!(state.plan.is_some());
        assert!(state.error.is_none());
    }

    #[test]
    fn plan_failure_terminates_session_with_error_and_no_plan() {
        let mut state = state_at_plan_preference();
        handle_key(&mut state, key(KeyCode::Enter));

        apply_message(
            &mut state,
            UiMsg::PlanComplete {
                plan: None,
                error: Some("failed to parse plan service reply: no JSON document found in response text".to_string()),
            },
        );
        assert_eq!(state.page, Page::Completed);
        assert!(state.plan.is_none());
        assert!(state.error.as_deref().unwrap().contains("no JSON document"));
    }

    #[test]
    fn plan_message_is_ignored_outside_generating_page() {
        let mut state = WizardState::new();
        let op = apply_message(
            &mut state,
            UiMsg::PlanComplete {
                plan: Some(plan_with_steps(1)),
                error: None,
            },
        );
        assert!(op.is_none());
        assert_eq!(state.page, Page::EnteringSource);
        assert!(state.plan.is_none());
    }

    // -------------------------------------------------------------------------
    // Plan confirmation
    // -------------------------------------------------------------------------

    #[test]
    fn approving_plan_initializes_steps_and_issues_step_zero() {
        let state = state_executing(3);

        assert_eq!(state.page, Page::Executing);
        assert!(state.user_approved);
        assert_eq!(state.steps.len(), 3);
        assert_eq!(state.steps[0].status, StepStatus::Running);
        assert_eq!(state.steps[1].status, StepStatus::Pending);
        assert_eq!(state.steps[2].status, StepStatus::Pending);
    }

    #[test]
    fn declining_plan_ends_session_with_cancellation_error() {
        let mut state = state_at_plan_preference();
        handle_key(&mut state, key(KeyCode::Enter));
        apply_message(
            &mut state,
            UiMsg::PlanComplete {
                plan: Some(plan_with_steps(2)),
                error: None,
            },
        );

        let op = handle_key(&mut state, key(KeyCode::Char('n')));
        assert!(op.is_none(), "decline must not issue any operation");
        assert_eq!(state.page, Page::Completed);
        assert!(state.steps.is_empty());
        assert!(!state.user_approved);
        assert_eq!(state.error.as_deref(), Some("migration cancelled by user"));
    }

    // -------------------------------------------------------------------------
    // Step execution sequencing
    // -------------------------------------------------------------------------

    #[test]
    fn steps_advance_in_strict_order() {
        let mut state = state_executing(3);

        // Step 0 completes; step 1 becomes running and is issued.
        let op = apply_message(
            &mut state,
            UiMsg::StepComplete {
                step_index: 0,
                detail: "✓ step 1 completed".to_string(),
                error: None,
            },
        );
        assert_eq!(op, Some(PendingOp::ExecuteStep(1)));
        assert_eq!(state.steps[0].status, StepStatus::Completed);
        assert_eq!(state.steps[0].detail.as_deref(), Some("✓ step 1 completed"));
        assert_eq!(state.steps[1].status, StepStatus::Running);
        assert_eq!(state.steps[2].status, StepStatus::Pending);

        let op = apply_message(
            &mut state,
            UiMsg::StepComplete {
                step_index: 1,
                detail: "✓ step 2 completed".to_string(),
                error: None,
            },
        );
        assert_eq!(op, Some(PendingOp::ExecuteStep(2)));
        assert_eq!(state.steps[2].status, StepStatus::Running);

        // Final step completes; session ends successfully.
        let op = apply_message(
            &mut state,
            UiMsg::StepComplete {
                step_index: 2,
                detail: "✓ done".to_string(),
                error: None,
            },
        );
        assert!(op.is_none());
        assert_eq!(state.page, Page::Completed);
        assert!(state.migration_done);
        assert!(state.error.is_none());
    }

    #[test]
    fn failed_step_halts_remaining_steps() {
        let mut state = state_executing(3);

        let op = apply_message(
            &mut state,
            UiMsg::StepComplete {
                step_index: 0,
                detail: String::new(),
                error: Some("failed to read source.json".to_string()),
            },
        );
        assert!(op.is_none(), "failure must not issue further steps");
        assert_eq!(state.page, Page::Completed);
        assert_eq!(state.steps[0].status, StepStatus::Failed);
        assert!(state.steps[0].error.is_some());
        assert_eq!(state.steps[1].status, StepStatus::Pending);
        assert_eq!(state.steps[2].status, StepStatus::Pending);
        assert!(state.error.is_some());
        assert!(!state.migration_done);
    }

    #[test]
    fn stale_step_message_is_ignored() {
        let mut state = state_executing(2);

        let op = apply_message(
            &mut state,
            UiMsg::StepComplete {
                step_index: 1, // current step is 0
                detail: "out of order".to_string(),
                error: None,
            },
        );
        assert!(op.is_none());
        assert_eq!(state.current_step, 0);
        assert_eq!(state.steps[0].status, StepStatus::Running);
        assert_eq!(state.steps[1].status, StepStatus::Pending);
    }

    // -------------------------------------------------------------------------
    // Direct migration outcomes
    // -------------------------------------------------------------------------

    #[test]
    fn direct_migration_success_completes_session() {
        let mut state = state_at_plan_preference();
        handle_key(&mut state, key(KeyCode::Down));
        handle_key(&mut state, key(KeyCode::Enter));

        apply_message(&mut state, UiMsg::MigrationFinished { error: None });
        assert_eq!(state.page, Page::Completed);
        assert!(state.migration_done);
        assert!(state.error.is_none());
    }

    #[test]
    fn direct_migration_failure_surfaces_error() {
        let mut state = state_at_plan_preference();
        handle_key(&mut state, key(KeyCode::Down));
        handle_key(&mut state, key(KeyCode::Enter));

        apply_message(
            &mut state,
            UiMsg::MigrationFinished {
                error: Some("unsupported migration path: RingCentral to RingCentral".to_string()),
            },
        );
        assert_eq!(state.page, Page::Completed);
        assert!(!state.migration_done);
        assert!(state.error.as_deref().unwrap().contains("unsupported"));
    }

    // -------------------------------------------------------------------------
    // No-op law and termination
    // -------------------------------------------------------------------------

    #[test]
    fn unlisted_events_leave_waiting_pages_unchanged() {
        let mut state = state_executing(2);
        for code in [
            KeyCode::Enter,
            KeyCode::Char('y'),
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::Char('x'),
        ] {
            let op = handle_key(&mut state, key(code));
            assert!(op.is_none());
            assert_eq!(state.page, Page::Executing);
            assert_eq!(state.current_step, 0);
            assert!(!state.quit);
        }

        let mut state = state_at_plan_preference();
        handle_key(&mut state, key(KeyCode::Enter)); // -> GeneratingPlan
        for code in [KeyCode::Enter, KeyCode::Char('y'), KeyCode::Char('x')] {
            let op = handle_key(&mut state, key(code));
            assert!(op.is_none());
            assert_eq!(state.page, Page::GeneratingPlan);
        }
    }

    #[test]
    fn terminate_is_accepted_on_every_page() {
        // Menu pages accept q.
        let mut state = state_at_plan_preference();
        handle_key(&mut state, key(KeyCode::Char('q')));
        assert!(state.quit);

        // Text pages accept Esc (q is text there).
        let mut state = WizardState::new();
        handle_key(&mut state, key(KeyCode::Esc));
        assert!(state.quit);

        // Waiting pages accept q.
        let mut state = state_executing(2);
        handle_key(&mut state, key(KeyCode::Char('q')));
        assert!(state.quit);

        // Ctrl+C works everywhere.
        let mut state = WizardState::new();
        handle_key(
            &mut state,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(state.quit);
    }

    #[test]
    fn any_key_exits_from_completed() {
        let mut state = state_executing(1);
        apply_message(
            &mut state,
            UiMsg::StepComplete {
                step_index: 0,
                detail: "✓ done".to_string(),
                error: None,
            },
        );
        assert_eq!(state.page, Page::Completed);

        handle_key(&mut state, key(KeyCode::Char('x')));
        assert!(state.quit);
    }

    // -------------------------------------------------------------------------
    // Smoke rendering
    // -------------------------------------------------------------------------

    #[test]
    fn smoke_renders_every_page_without_panicking() {
        for target in [
            "source",
            "source-format",
            "target",
            "target-format",
            "planner",
            "generating",
            "confirm",
            "executing",
            "done",
            "unknown-target",
        ] {
            smoke(target).unwrap();
        }
    }
}
