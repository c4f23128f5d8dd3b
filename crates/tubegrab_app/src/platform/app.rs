use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use tubegrab_core::{update, AppState, Msg};
use tubegrab_engine::EngineHandle;
use tubegrab_logging::{tg_debug, tg_info, tg_warn};

use super::config;
use super::effects::EffectRunner;
use super::history::HistoryStore;
use super::logging;
use super::ui::commands::{command_msgs, parse_command, Command, HELP_TEXT};
use super::ui::render::Screen;

/// Everything the main loop reacts to.
pub enum AppEvent {
    Msg(Msg),
    Line(String),
    InputClosed,
}

enum Flow {
    Continue,
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let (config, config_error) = config::load_from_env();
    logging::initialize(config.log_destination, config.level_filter());
    if let Some(err) = config_error {
        tg_warn!("{}; using default settings", err);
    }
    tg_info!("tubegrab starting, service at {}", config.service_url);

    let engine = EngineHandle::new(config.service_settings())
        .context("failed to start the download engine")?;
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(
        engine,
        HistoryStore::new(&config.history_dir),
        &config.service_url,
        event_tx.clone(),
    );
    spawn_input_reader(event_tx);

    let mut session = Session {
        state: AppState::with_poll_failure_limit(config.poll_failure_limit),
        runner,
        screen: Screen::new(),
    };

    println!("tubegrab: type 'help' for commands");
    if let Some(url) = std::env::args().nth(1) {
        session.apply_command(Command::Info(Some(url)))?;
    }

    let result = session.run(event_rx);
    session.runner.shutdown();
    tg_info!("tubegrab exiting");
    result
}

fn spawn_input_reader(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if event_tx.send(AppEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = event_tx.send(AppEvent::InputClosed);
    });
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    screen: Screen,
}

impl Session {
    fn run(&mut self, event_rx: mpsc::Receiver<AppEvent>) -> anyhow::Result<()> {
        let mut input_closed = false;
        while let Ok(event) = event_rx.recv() {
            match event {
                AppEvent::Msg(msg) => self.dispatch(msg)?,
                AppEvent::Line(line) => {
                    if let Flow::Quit = self.handle_line(&line)? {
                        return Ok(());
                    }
                }
                AppEvent::InputClosed => {
                    tg_debug!("Input closed");
                    input_closed = true;
                }
            }
            // With stdin gone, stay only until the current request or job settles.
            if input_closed && !self.state.is_loading() && !self.state.is_downloading() {
                return Ok(());
            }
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        match parse_command(line) {
            None => Ok(Flow::Continue),
            Some(Ok(command)) => self.apply_command(command),
            Some(Err(err)) => {
                println!("{err}");
                Ok(Flow::Continue)
            }
        }
    }

    fn apply_command(&mut self, command: Command) -> anyhow::Result<Flow> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => println!("{HELP_TEXT}"),
            Command::History => self.print_history(),
            command => match command_msgs(command, &self.state.view()) {
                Ok(msgs) => {
                    for msg in msgs {
                        self.dispatch(msg)?;
                    }
                }
                Err(err) => println!("{err}"),
            },
        }
        Ok(Flow::Continue)
    }

    fn dispatch(&mut self, msg: Msg) -> anyhow::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;

        if was_dirty {
            self.screen
                .draw(&view, io::stdout().lock())
                .context("failed to write to the terminal")?;
        }
        Ok(())
    }

    fn print_history(&self) {
        let entries = self.runner.history().load();
        let mut out = io::stdout().lock();
        if entries.is_empty() {
            let _ = writeln!(out, "No completed downloads yet.");
            return;
        }
        for entry in entries {
            let _ = writeln!(out, "{}", entry.summary());
        }
    }
}
