use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

mod countdown;
mod cycles;
mod form;
mod session;
mod ui;

use cycles::{Cycle, CycleStore};
use form::NewCycleForm;
use session::{SessionLog, SessionState};

const LOG_RING_LIMIT: usize = 512;
const FRAME_INTERVAL: Duration = Duration::from_millis(50);
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(20);
const INPUT_DEBOUNCE_MS: u128 = 40;
const INPUT_DISPATCH_INTERVAL_MS: u128 = 25;

#[derive(Clone)]
struct TerminalCapabilities {
    color: bool,
    unicode: bool,
    alt_screen: bool,
}

impl TerminalCapabilities {
    fn detect() -> Self {
        let no_color = std::env::var("NO_COLOR")
            .ok()
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        let color = !no_color;
        let unicode = std::env::var("CICLOS_TUI_UNICODE")
            .ok()
            .map(|v| v != "0")
            .unwrap_or(true);
        let alt_screen = std::env::var("CICLOS_TUI_ALT_SCREEN")
            .ok()
            .map(|v| v != "0")
            .unwrap_or(true);
        Self {
            color,
            unicode,
            alt_screen,
        }
    }
}

struct UiGuard {
    caps: TerminalCapabilities,
}

impl Drop for UiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        if self.caps.alt_screen {
            let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
        }
    }
}

#[derive(Clone)]
enum InputCommand {
    Quit,
    StartCycle,
    InterruptCycle,
    HistoryUp,
    HistoryDown,
    LogsUp,
    LogsDown,
}

struct AppModel {
    store: CycleStore,
    form: NewCycleForm,
    logs: VecDeque<String>,
    history_scroll: usize,
    log_scroll: usize,
    // Remaining seconds of the active cycle as last shown; the countdown is
    // always re-derived from the cycle's start timestamp, never decremented.
    remaining_display: i64,
    dirty: bool,
    last_render_signature: String,
    terminal_caps: TerminalCapabilities,
    session_log: SessionLog,
    state_path: PathBuf,
    input_queue: VecDeque<(u64, InputCommand)>,
    next_input_seq: u64,
    last_input_at: Instant,
    last_input_token: String,
}

impl AppModel {
    fn new(terminal_caps: TerminalCapabilities, session_log: SessionLog, state_path: PathBuf) -> Self {
        Self {
            store: CycleStore::default(),
            form: NewCycleForm::default(),
            logs: VecDeque::new(),
            history_scroll: 0,
            log_scroll: 0,
            remaining_display: 0,
            dirty: true,
            last_render_signature: String::new(),
            terminal_caps,
            session_log,
            state_path,
            input_queue: VecDeque::new(),
            next_input_seq: 1,
            last_input_at: Instant::now() - Duration::from_millis(INPUT_DEBOUNCE_MS as u64),
            last_input_token: String::new(),
        }
    }

    fn push_log(&mut self, message: String) {
        if self.logs.len() >= LOG_RING_LIMIT {
            self.logs.pop_front();
        }
        self.logs.push_back(message);
        self.dirty = true;
    }

    fn record_cycle_event(&mut self, event: &str, cycle: &Cycle) {
        self.session_log.record(event, cycle);
        self.push_log(format!(
            "{event} task={} ({}min)",
            cycle.task, cycle.minutes_amount
        ));
    }

    fn save(&self) {
        let state = SessionState {
            cycles: self.store.cycles().to_vec(),
            active_cycle_id: self.store.active_cycle_id().map(str::to_string),
            history_scroll: self.history_scroll,
            log_scroll: self.log_scroll,
        };
        session::save_state(&self.state_path, &state);
    }
}

fn enqueue_input(model: &mut AppModel, command: InputCommand, token: &str) {
    let now = Instant::now();
    if token == model.last_input_token
        && now.duration_since(model.last_input_at).as_millis() < INPUT_DEBOUNCE_MS
    {
        return;
    }
    let seq = model.next_input_seq;
    model.next_input_seq += 1;
    model.last_input_at = now;
    model.last_input_token = token.to_string();
    model.input_queue.push_back((seq, command));
}

fn dispatch_input(model: &mut AppModel) -> bool {
    if model.input_queue.is_empty() {
        return false;
    }
    if model.last_input_at.elapsed().as_millis() < INPUT_DISPATCH_INTERVAL_MS {
        return false;
    }
    let Some((_, cmd)) = model.input_queue.pop_front() else {
        return false;
    };
    model.last_input_at = Instant::now();
    match cmd {
        InputCommand::Quit => return true,
        InputCommand::StartCycle => {
            if model.store.active_cycle().is_some() {
                return false;
            }
            match model.form.validate() {
                Ok(data) => match model.store.create_new_cycle(&data.task, data.minutes_amount) {
                    Ok(cycle) => {
                        let cycle = cycle.clone();
                        model.remaining_display = cycle.total_seconds();
                        model.form.reset();
                        model.record_cycle_event("cycle:start", &cycle);
                        model.save();
                    }
                    Err(error) => model.push_log(error.to_string()),
                },
                Err(error) => {
                    model.form.error = Some(error);
                    model.dirty = true;
                }
            }
        }
        InputCommand::InterruptCycle => {
            if let Ok(cycle) = model.store.interrupt_current_cycle() {
                let cycle = cycle.clone();
                model.record_cycle_event("cycle:interrupt", &cycle);
                model.save();
            }
        }
        InputCommand::HistoryUp => {
            model.history_scroll = model.history_scroll.saturating_add(1);
            model.dirty = true;
        }
        InputCommand::HistoryDown => {
            model.history_scroll = model.history_scroll.saturating_sub(1);
            model.dirty = true;
        }
        InputCommand::LogsUp => {
            model.log_scroll = model.log_scroll.saturating_add(1);
            model.dirty = true;
        }
        InputCommand::LogsDown => {
            model.log_scroll = model.log_scroll.saturating_sub(1);
            model.dirty = true;
        }
    }
    false
}

fn tick_countdown(model: &mut AppModel) {
    let Some(remaining) = model
        .store
        .active_cycle()
        .map(|cycle| countdown::remaining_seconds(cycle, Utc::now()))
    else {
        return;
    };
    if remaining != model.remaining_display {
        model.remaining_display = remaining;
        model.dirty = true;
    }
    if remaining <= 0 {
        if let Ok(cycle) = model.store.finish_current_cycle() {
            let cycle = cycle.clone();
            model.record_cycle_event("cycle:finish", &cycle);
            model.save();
        }
    }
}

fn frame_signature(model: &AppModel) -> String {
    let last_log = model.logs.back().cloned().unwrap_or_default();
    let active = model.store.active_cycle_id().unwrap_or_default();
    let error = model
        .form
        .error
        .as_ref()
        .map(|error| error.to_string())
        .unwrap_or_default();
    format!(
        "{}|{}|{}|{}|{}|{:?}|{}|{}|{}|{}",
        model.store.cycles().len(),
        active,
        model.remaining_display,
        model.form.task,
        model.form.minutes,
        model.form.focus,
        error,
        model.history_scroll,
        model.log_scroll,
        last_log
    )
}

fn main() -> anyhow::Result<()> {
    let terminal_caps = TerminalCapabilities::detect();
    let state_path = session::resolve_state_path();
    let session_id = session::resolve_session_id();
    let session_log = SessionLog::open(&session::resolve_event_log_dir(), &session_id);

    enable_raw_mode()?;
    let _guard = UiGuard {
        caps: terminal_caps.clone(),
    };
    let mut stdout = std::io::stdout();
    if terminal_caps.alt_screen {
        execute!(stdout, EnterAlternateScreen)?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut model = AppModel::new(terminal_caps, session_log, state_path);
    if let Some(state) = session::load_state(&model.state_path) {
        let (store, history_scroll, log_scroll) = state.into_store();
        model.store = store;
        model.history_scroll = history_scroll;
        model.log_scroll = log_scroll;
    }

    // A restored active cycle keeps counting from its original start; one
    // that ran out while the app was closed is finished right away.
    let restored = model
        .store
        .active_cycle()
        .map(|cycle| (cycle.task.clone(), countdown::remaining_seconds(cycle, Utc::now())));
    if let Some((task, remaining)) = restored {
        if remaining <= 0 {
            if let Ok(cycle) = model.store.finish_current_cycle() {
                let cycle = cycle.clone();
                model.record_cycle_event("cycle:finish", &cycle);
                model.save();
            }
        } else {
            model.remaining_display = remaining;
            model.push_log(format!("ciclo restaurado: {task}"));
        }
    }

    let mut last_frame = Instant::now() - FRAME_INTERVAL;

    loop {
        tick_countdown(&mut model);

        if model.dirty && last_frame.elapsed() >= FRAME_INTERVAL {
            let signature = frame_signature(&model);
            if signature != model.last_render_signature {
                ui::draw_ui(&mut terminal, &model)?;
                model.last_render_signature = signature;
            }
            model.dirty = false;
            last_frame = Instant::now();
        }

        if event::poll(INPUT_POLL_INTERVAL)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                let cycle_active = model.store.active_cycle().is_some();
                match key.code {
                    KeyCode::Esc => enqueue_input(&mut model, InputCommand::Quit, "esc"),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        enqueue_input(&mut model, InputCommand::Quit, "ctrl-c")
                    }
                    KeyCode::Up => enqueue_input(&mut model, InputCommand::HistoryUp, "up"),
                    KeyCode::Down => enqueue_input(&mut model, InputCommand::HistoryDown, "down"),
                    KeyCode::PageUp => enqueue_input(&mut model, InputCommand::LogsUp, "pgup"),
                    KeyCode::PageDown => enqueue_input(&mut model, InputCommand::LogsDown, "pgdn"),
                    KeyCode::Tab if !cycle_active => {
                        model.form.toggle_focus();
                        model.dirty = true;
                    }
                    KeyCode::Enter if !cycle_active => {
                        if !model.form.submit_disabled() {
                            enqueue_input(&mut model, InputCommand::StartCycle, "enter");
                        }
                    }
                    KeyCode::Backspace if !cycle_active => {
                        model.form.backspace();
                        model.dirty = true;
                    }
                    KeyCode::Char('i') if cycle_active => {
                        enqueue_input(&mut model, InputCommand::InterruptCycle, "i")
                    }
                    KeyCode::Char('q') if cycle_active => {
                        enqueue_input(&mut model, InputCommand::Quit, "q")
                    }
                    KeyCode::Char(ch) if !cycle_active => {
                        model.form.push_char(ch);
                        model.dirty = true;
                    }
                    _ => {}
                }
            }
        }

        if dispatch_input(&mut model) {
            break;
        }
    }

    model.save();
    Ok(())
}
