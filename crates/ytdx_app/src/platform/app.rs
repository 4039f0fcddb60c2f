use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use ytdx_core::{update, AppState, Msg};
use ytdx_logging::{ytdx_info, ytdx_warn};

use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::persistence;
use super::ui::input::{self, Command};
use super::ui::render;

const TICK_INTERVAL: Duration = Duration::from_millis(75);

/// Everything the UI thread reacts to.
pub enum AppEvent {
    Ui(Msg),
    Command(Command),
    Invalid(String),
    /// Standard input reached end of file.
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    logging::initialize(LogDestination::File);

    let config_dir = std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."));
    let config = persistence::load_config(&config_dir);

    let (app_tx, app_rx) = mpsc::channel::<AppEvent>();
    let mut runner = EffectRunner::new(config.engine, config_dir, app_tx.clone())
        .context("failed to start the download engine")?;

    let (mut state, _) = update(AppState::new(), Msg::RestoreSettings(config.settings));

    spawn_input_thread(app_tx.clone())?;
    // Background tick to throttle rendering.
    thread::Builder::new()
        .name("tick".to_string())
        .spawn(move || {
            while app_tx.send(AppEvent::Ui(Msg::Tick)).is_ok() {
                thread::sleep(TICK_INTERVAL);
            }
        })
        .context("failed to spawn tick thread")?;

    println!("{}", input::HELP);
    ytdx_info!("ytdx started");

    let mut quit = false;
    while !quit {
        let Ok(first) = app_rx.recv() else {
            break;
        };
        let mut inbox = vec![first];
        inbox.extend(app_rx.try_iter());
        inbox.extend(runner.drain_job_events().into_iter().map(AppEvent::Ui));

        for event in inbox {
            match event {
                AppEvent::Ui(msg) => state = dispatch_msg(state, msg, &mut runner),
                AppEvent::Command(Command::Quit) | AppEvent::InputClosed => quit = true,
                AppEvent::Command(Command::Help) => println!("{}", input::HELP),
                AppEvent::Command(Command::List) => state.request_render(),
                AppEvent::Command(command) => {
                    for msg in command.into_msgs() {
                        state = dispatch_msg(state, msg, &mut runner);
                    }
                }
                AppEvent::Invalid(text) => {
                    println!("{}", render::render_warning("Input", &text, state.settings().dark_mode));
                }
            }
        }

        if state.consume_dirty() {
            print!("{}", render::render(&state.view()));
            let _ = io::stdout().flush();
        }
    }

    let pending = state.pending_jobs();
    if !pending.is_empty() {
        println!("Cancelling {} downloads...", pending.len());
    }
    runner.shutdown();
    ytdx_info!("ytdx stopped");
    Ok(())
}

fn dispatch_msg(state: AppState, msg: Msg, runner: &mut EffectRunner) -> AppState {
    let (state, effects) = update(state, msg);
    runner.run(effects, state.settings().dark_mode);
    state
}

fn spawn_input_thread(app_tx: mpsc::Sender<AppEvent>) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        ytdx_warn!("Failed to read input: {}", err);
                        break;
                    }
                };
                let event = match input::parse_command(&line) {
                    Ok(Some(command)) => AppEvent::Command(command),
                    Ok(None) => continue,
                    Err(text) => AppEvent::Invalid(text),
                };
                if app_tx.send(event).is_err() {
                    return;
                }
            }
            let _ = app_tx.send(AppEvent::InputClosed);
        })
        .context("failed to spawn input thread")?;
    Ok(())
}
