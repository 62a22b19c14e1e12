use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{never, select, unbounded, Receiver};
use renderer::{SharedControlState, WindowRuntime, WindowSignal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckArgs, Cli, Command, EvalArgs, RunArgs};
use crate::config::{FileConfig, LaunchSettings};
use crate::console::{apply, ControlCommand, Reply};
use crate::paths::ConfigSource;

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    match cli.command {
        Some(Command::Eval(args)) => run_eval(&args),
        Some(Command::Check(args)) => run_check(&args),
        Some(Command::Settings) => {
            let settings = resolve_settings(&cli.run)?;
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        None => run_session(resolve_settings(&cli.run)?),
    }
}

/// Logs go to stderr so stdout stays clean for console replies and
/// subcommand output.
fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn resolve_settings(args: &RunArgs) -> Result<LaunchSettings> {
    let source = ConfigSource::discover(args.config.as_deref());
    tracing::debug!(path = ?source.path(), explicit = source.is_explicit(), "resolved config path");
    let file = FileConfig::load(&source)?;
    Ok(LaunchSettings::resolve(args, &file)?)
}

fn run_eval(args: &EvalArgs) -> Result<()> {
    println!("{}", formula::evaluate(&args.expression, args.t));
    Ok(())
}

fn run_check(args: &CheckArgs) -> Result<()> {
    let parsed = formula::Formula::parse(&args.expression)
        .with_context(|| format!("expression `{}` is invalid", args.expression))?;
    println!("ok: {parsed}");
    Ok(())
}

/// Control task: owns the console, applies window shortcuts, and is the only
/// writer of the shared state.
fn run_session(settings: LaunchSettings) -> Result<()> {
    let state = SharedControlState::shared(&settings.control);
    info!(
        size = ?settings.renderer.surface_size,
        view_extent = settings.renderer.view_extent,
        "opening window"
    );
    let runtime = WindowRuntime::spawn(settings.renderer, Arc::clone(&state))
        .context("failed to start renderer")?;
    let lines = spawn_console_reader()?;
    println!("type `help` for commands");

    match drive_session(lines, runtime.signals(), &state) {
        SessionEnd::Quit => info!("quit requested; closing window"),
        SessionEnd::WindowClosed => info!("window closed; ending session"),
    }
    runtime.shutdown()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Quit,
    WindowClosed,
}

/// Multiplexes console lines and window signals until `quit` or the window
/// closes. Console EOF only stops reading; the window stays up.
fn drive_session(
    lines: Receiver<String>,
    signals: &Receiver<WindowSignal>,
    state: &SharedControlState,
) -> SessionEnd {
    let mut console_open = true;
    loop {
        let console = if console_open { lines.clone() } else { never() };
        select! {
            recv(console) -> line => match line {
                Ok(line) => {
                    if !handle_line(&line, state) {
                        return SessionEnd::Quit;
                    }
                }
                Err(_) => {
                    info!("console input closed; close the window to exit");
                    console_open = false;
                }
            },
            recv(signals) -> signal => match signal {
                Ok(WindowSignal::Key(shortcut)) => {
                    if let Reply::Print(message) = apply(shortcut.into(), state) {
                        println!("{message}");
                    }
                }
                Ok(WindowSignal::Closed) | Err(_) => return SessionEnd::WindowClosed,
            },
        }
    }
}

/// Returns `false` when the session should end.
fn handle_line(line: &str, state: &SharedControlState) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return true;
    }
    match trimmed.parse::<ControlCommand>() {
        Ok(command) => match apply(command, state) {
            Reply::Print(message) => {
                println!("{message}");
                true
            }
            Reply::Quit => false,
        },
        Err(err) => {
            eprintln!("error: {err}");
            true
        }
    }
}

/// Reads stdin on a detached thread. The channel disconnects at EOF.
fn spawn_console_reader() -> Result<Receiver<String>> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("lintrans-console".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to read console input");
                        break;
                    }
                }
            }
        })
        .context("failed to spawn console thread")?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::{ControlSettings, MatrixEntry, Shortcut};

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        let state = SharedControlState::new(&ControlSettings::default());
        assert!(handle_line("   ", &state));
        assert!(handle_line("# a = 0", &state));
        assert_eq!(&*state.expression(MatrixEntry::A), "cos(t)");
    }

    #[test]
    fn bad_commands_keep_the_session_alive() {
        let state = SharedControlState::new(&ControlSettings::default());
        let before = state.snapshot().settings;
        assert!(handle_line("scale q 1", &state));
        assert!(handle_line("frobnicate", &state));
        assert_eq!(state.snapshot().settings, before);
    }

    #[test]
    fn quit_ends_the_session() {
        let state = SharedControlState::new(&ControlSettings::default());
        assert!(handle_line("a = 2", &state));
        assert_eq!(&*state.expression(MatrixEntry::A), "2");
        assert!(!handle_line("quit", &state));
    }

    #[test]
    fn console_eof_keeps_the_window_open() {
        let state = SharedControlState::shared(&ControlSettings::default());
        let (line_tx, lines) = unbounded();
        let (signal_tx, signals) = unbounded();
        line_tx.send("grid off".to_string()).unwrap();
        drop(line_tx);

        let driver = {
            let state = Arc::clone(&state);
            thread::spawn(move || drive_session(lines, &signals, &state))
        };
        thread::sleep(std::time::Duration::from_millis(50));
        assert!(!driver.is_finished());
        assert!(!state.show_grid());

        signal_tx.send(WindowSignal::Key(Shortcut::TogglePause)).unwrap();
        signal_tx.send(WindowSignal::Closed).unwrap();
        assert_eq!(driver.join().unwrap(), SessionEnd::WindowClosed);
        assert!(state.paused());
    }

    #[test]
    fn quit_line_ends_the_drive_loop() {
        let state = SharedControlState::new(&ControlSettings::default());
        let (line_tx, lines) = unbounded();
        let (_signal_tx, signals) = unbounded::<WindowSignal>();
        line_tx.send("pause".to_string()).unwrap();
        line_tx.send("quit".to_string()).unwrap();
        assert_eq!(drive_session(lines, &signals, &state), SessionEnd::Quit);
        assert!(state.paused());
    }

    #[test]
    fn dropped_runtime_counts_as_window_closed() {
        let state = SharedControlState::new(&ControlSettings::default());
        let (_line_tx, lines) = unbounded::<String>();
        let (signal_tx, signals) = unbounded::<WindowSignal>();
        drop(signal_tx);
        assert_eq!(drive_session(lines, &signals, &state), SessionEnd::WindowClosed);
    }
}
