use crate::core::{Route, Session, WrappedCore};
use crate::fetch::{ApiEvent, ApiRequest, ApiWorker, HttpApi, RemoteApi};
use crate::model::{Settings, Theme};
use crate::stats::SortOption;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone)]
pub struct AppStartupOptions {
    pub settings: Settings,
    pub logged_in: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyAction {
    None,
    Quit,
    EnterCommand,
    Request(ApiRequest),
}

impl From<Option<ApiRequest>> for KeyAction {
    fn from(request: Option<ApiRequest>) -> Self {
        request.map_or(Self::None, Self::Request)
    }
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let api = HttpApi::from_settings(&options.settings);
    info!(api = api.base_url(), logged_in = options.logged_in, "starting");
    run_with_api(options, Box::new(api))
}

pub fn run_with_api(options: AppStartupOptions, api: Box<dyn RemoteApi>) -> Result<()> {
    let mut session = Session::anonymous(&options.settings.display_name);
    session.logged_in = options.logged_in;
    let mut core = WrappedCore::new(options.settings, session);
    let worker = ApiWorker::start(api);
    dispatch(&worker, core.start());

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut command_mode = false;
    let mut command_buffer = String::new();
    let mut last_tick = Instant::now();

    let result: Result<()> = loop {
        while let Some(event) = worker.try_recv_event() {
            dispatch(&worker, apply_api_event(&mut core, event));
        }

        if core.dirty || last_tick.elapsed() > Duration::from_millis(250) {
            let command = command_mode.then_some(command_buffer.as_str());
            terminal.draw(|frame| crate::ui::draw(frame, &core, command))?;
            core.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        if command_mode {
            match key.code {
                KeyCode::Esc => {
                    command_mode = false;
                    command_buffer.clear();
                    core.dirty = true;
                }
                KeyCode::Enter => {
                    dispatch(&worker, run_command(&mut core, &command_buffer));
                    command_mode = false;
                    command_buffer.clear();
                    core.dirty = true;
                }
                KeyCode::Backspace => {
                    command_buffer.pop();
                    core.dirty = true;
                }
                KeyCode::Char(ch) => {
                    command_buffer.push(ch);
                    core.dirty = true;
                }
                _ => {}
            }
            continue;
        }

        match handle_key(&mut core, key) {
            KeyAction::Quit => break Ok(()),
            KeyAction::EnterCommand => {
                command_mode = true;
                core.dirty = true;
            }
            KeyAction::Request(request) => worker.send(request),
            KeyAction::None => {}
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    worker.shutdown();
    info!("stopped");
    result
}

fn dispatch(worker: &ApiWorker, request: Option<ApiRequest>) {
    if let Some(request) = request {
        worker.send(request);
    }
}

fn apply_api_event(core: &mut WrappedCore, event: ApiEvent) -> Option<ApiRequest> {
    match event {
        ApiEvent::ListenData { token, result } => {
            core.deliver_listen_data(token, result);
            None
        }
        ApiEvent::Login(result) => core.login_finished(result),
        ApiEvent::Logout(result) => core.logout_finished(result),
    }
}

fn handle_key(core: &mut WrappedCore, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Char(':') => KeyAction::EnterCommand,
        KeyCode::Char('h') => core.navigate(Route::Home).into(),
        KeyCode::Char('t') => core.navigate(Route::Tracks).into(),
        KeyCode::Char('a') => core.navigate(Route::About).into(),
        KeyCode::Char('l') => {
            if core.session.logged_in {
                core.set_status("Already logged in");
                KeyAction::None
            } else {
                core.navigate(Route::Login).into()
            }
        }
        KeyCode::Char('o') => core.request_logout().into(),
        KeyCode::Enter => core.activate().into(),
        KeyCode::Char('s') => {
            core.cycle_sort();
            KeyAction::None
        }
        KeyCode::Char(digit @ '1'..='3') => {
            let index = (digit as usize) - ('1' as usize);
            core.change_sort(SortOption::ALL[index]);
            KeyAction::None
        }
        KeyCode::Down => {
            core.select_next();
            KeyAction::None
        }
        KeyCode::Up => {
            core.select_prev();
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

fn run_command(core: &mut WrappedCore, raw: &str) -> Option<ApiRequest> {
    let input = raw.trim();
    if input.is_empty() {
        core.set_status("No command");
        return None;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => {
            core.set_status(
                "Commands: go <home|tracks|about|login> | sort <listens|time|title> | login | logout | theme [name] | save",
            );
            None
        }
        "go" => match Route::from_path(rest) {
            Some(route) if !rest.is_empty() => core.navigate(route),
            _ => {
                core.set_status("Usage: go <home|tracks|about|login>");
                None
            }
        },
        "sort" => {
            match SortOption::parse(rest) {
                Some(sort) => core.change_sort(sort),
                None => core.set_status("Usage: sort <listens|time|title>"),
            }
            None
        }
        "login" => core.request_login(),
        "logout" => core.request_logout(),
        "theme" => {
            if rest.is_empty() {
                let next = core.theme.next();
                core.set_theme(next);
            } else if let Some(theme) = Theme::parse(rest) {
                core.set_theme(theme);
            } else {
                core.set_status("Unknown theme");
            }
            None
        }
        "save" => {
            if let Err(err) = core.save() {
                core.set_status(&format!("save error: {err:#}"));
            }
            None
        }
        _ => {
            core.set_status("Unknown command. Use :help");
            None
        }
    }
}
