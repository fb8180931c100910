use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use log::LevelFilter;
use remedy_core::{update, AppState, Msg, Phase};
use remedy_engine::EngineHandle;
use remedy_logging::{remedy_debug, remedy_info, remedy_warn, LogDestination};

use super::config;
use super::effects::EffectRunner;
use super::render::TerminalRenderer;
use crate::{Args, LogTarget};

const EVENT_WAIT: Duration = Duration::from_millis(50);

#[derive(Debug, PartialEq)]
enum UserInput {
    Msg(Msg),
    Quit,
    EndOfInput,
}

pub fn run_app(args: Args) -> anyhow::Result<ExitCode> {
    remedy_logging::initialize(
        log_destination(args.log),
        LevelFilter::Info,
        &remedy_logging::default_log_path(),
    );
    remedy_info!("Starting remedy");

    let engine_config = config::load(args.config.as_deref())?;
    let max_attempts = engine_config.poll.max_attempts;
    let engine = EngineHandle::new(engine_config, args.output.clone())
        .context("building HTTP clients")?;
    let runner = EffectRunner::new(engine);
    let mut renderer = TerminalRenderer::new(max_attempts);

    let (input_tx, input_rx) = mpsc::channel::<UserInput>();
    if let Some(file) = args.file.clone() {
        let _ = input_tx.send(UserInput::Msg(Msg::FileSelected(file)));
        if !args.interactive {
            let _ = input_tx.send(UserInput::Msg(Msg::StartClicked));
        }
    }
    if args.interactive {
        println!("Commands: open <path>, start, quit");
        spawn_stdin_reader(input_tx);
    } else {
        drop(input_tx);
    }

    let mut state = AppState::new();
    renderer.render(&state.view());
    let mut input_closed = !args.interactive;

    loop {
        loop {
            match input_rx.try_recv() {
                Ok(UserInput::Msg(msg)) => {
                    state = dispatch(state, msg, &runner, &mut renderer);
                }
                Ok(UserInput::Quit) => {
                    remedy_info!("Quit requested");
                    return Ok(exit_code(state.phase()));
                }
                Ok(UserInput::EndOfInput) | Err(mpsc::TryRecvError::Disconnected) => {
                    input_closed = true;
                    break;
                }
                Err(mpsc::TryRecvError::Empty) => break,
            }
        }

        if input_closed && is_settled(&state) {
            break;
        }

        if let Some(msg) = runner.next_msg(EVENT_WAIT) {
            state = dispatch(state, msg, &runner, &mut renderer);
        }
    }

    remedy_info!("Exiting with phase {:?}", state.phase());
    Ok(exit_code(state.phase()))
}

fn dispatch(
    state: AppState,
    msg: Msg,
    runner: &EffectRunner,
    renderer: &mut TerminalRenderer,
) -> AppState {
    let before = state.phase();
    remedy_debug!("Dispatching {:?}", msg);
    let (mut state, effects) = update(state, msg);
    let after = state.phase();
    if before != after {
        remedy_info!("Phase {:?} -> {:?}", before, after);
    }
    runner.run(effects);
    if state.consume_dirty() {
        renderer.render(&state.view());
    }
    state
}

/// Nothing left to wait for: no job, a failed job, or a finished job whose
/// script has been written (or failed to be).
fn is_settled(state: &AppState) -> bool {
    match state.phase() {
        Phase::Idle | Phase::Error => true,
        Phase::Uploading | Phase::Processing => false,
        Phase::Done => {
            let view = state.view();
            view.saved_path.is_some() || view.save_error.is_some()
        }
    }
}

fn exit_code(phase: Phase) -> ExitCode {
    if phase == Phase::Done {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn log_destination(target: LogTarget) -> LogDestination {
    match target {
        LogTarget::Terminal => LogDestination::Terminal,
        LogTarget::File => LogDestination::File,
        LogTarget::Both => LogDestination::Both,
    }
}

fn spawn_stdin_reader(input_tx: mpsc::Sender<UserInput>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    remedy_warn!("Reading stdin failed: {}", err);
                    break;
                }
            };
            match parse_command(&line) {
                Ok(Some(input)) => {
                    if input_tx.send(input).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("{message}"),
            }
        }
        let _ = input_tx.send(UserInput::EndOfInput);
    });
}

fn parse_command(line: &str) -> Result<Option<UserInput>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));

    match word {
        "open" | "o" => {
            if rest.is_empty() {
                Err("usage: open <path>".to_string())
            } else {
                Ok(Some(UserInput::Msg(Msg::FileSelected(PathBuf::from(rest)))))
            }
        }
        "start" | "s" => Ok(Some(UserInput::Msg(Msg::StartClicked))),
        "quit" | "q" | "exit" => Ok(Some(UserInput::Quit)),
        other => Err(format!("unknown command `{other}` (open <path>, start, quit)")),
    }
}
