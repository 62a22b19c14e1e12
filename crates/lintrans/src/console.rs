//! Line-oriented control surface.
//!
//! Each input line parses into a [`ControlCommand`]; only a command that
//! parsed cleanly is applied to the shared state. Window shortcuts arrive as
//! the same commands so this module stays the single writer.

use std::fmt::Write as _;
use std::str::FromStr;

use formula::Formula;
use renderer::{MatrixEntry, Shortcut, SharedControlState};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  a|b|c|d = <expr>        set a matrix entry, e.g. `a = cos(t)`; `a =` clears it
  scale <entry> <value>   scale an entry (clamped to [-2, 2])
  pause | resume | toggle pause
  grid on|off|toggle      show or hide the grid
  arrow on|off|toggle     show or hide the sample vector
  reset                   restart time from zero
  show                    print the current settings
  eval <expr>             evaluate an expression at the current time
  help                    print this message
  quit                    close the window and exit
window keys: Space pause, G grid, V vector, R reset, Esc close";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
    Toggle,
}

impl FromStr for Switch {
    type Err = CommandError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "on" | "show" | "true" | "1" => Ok(Self::On),
            "off" | "hide" | "false" | "0" => Ok(Self::Off),
            "toggle" => Ok(Self::Toggle),
            other => Err(CommandError::InvalidSwitch(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    SetExpression { entry: MatrixEntry, source: String },
    SetScale { entry: MatrixEntry, value: f64 },
    Pause,
    Resume,
    TogglePause,
    Grid(Switch),
    Arrow(Switch),
    Reset,
    Show,
    Eval(String),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'; type `help` for a list")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },
    #[error("{0}")]
    InvalidEntry(String),
    #[error("`{0}` takes no arguments")]
    UnexpectedArguments(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("expected on, off, or toggle; got '{0}'")]
    InvalidSwitch(String),
}

impl FromStr for ControlCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        if let Some((target, source)) = line.split_once('=') {
            let entry = MatrixEntry::from_str(target).map_err(CommandError::InvalidEntry)?;
            // An empty right-hand side clears the entry.
            let source = source.trim();
            return Ok(Self::SetExpression {
                entry,
                source: source.to_string(),
            });
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();
        let keyword = keyword.to_ascii_lowercase();

        match (keyword.as_str(), args.as_slice()) {
            ("scale", [entry, value]) => Ok(Self::SetScale {
                entry: MatrixEntry::from_str(entry).map_err(CommandError::InvalidEntry)?,
                value: parse_scale(value)?,
            }),
            ("scale", _) => Err(CommandError::Usage {
                command: "scale",
                expected: "an entry and a value, e.g. `scale a 0.5`",
            }),
            ("pause", []) => Ok(Self::Pause),
            ("resume" | "play", []) => Ok(Self::Resume),
            ("toggle", ["pause"]) => Ok(Self::TogglePause),
            ("toggle", ["grid"]) => Ok(Self::Grid(Switch::Toggle)),
            ("toggle", ["arrow"]) => Ok(Self::Arrow(Switch::Toggle)),
            ("toggle", _) => Err(CommandError::Usage {
                command: "toggle",
                expected: "one of pause, grid, or arrow",
            }),
            ("grid", [switch]) => Ok(Self::Grid(switch.parse()?)),
            ("grid", []) => Ok(Self::Grid(Switch::Toggle)),
            ("arrow" | "vector", [switch]) => Ok(Self::Arrow(switch.parse()?)),
            ("arrow" | "vector", []) => Ok(Self::Arrow(Switch::Toggle)),
            ("reset", []) => Ok(Self::Reset),
            ("show" | "status", []) => Ok(Self::Show),
            ("eval", _) if !rest.is_empty() => Ok(Self::Eval(rest.to_string())),
            ("eval", _) => Err(CommandError::Usage {
                command: "eval",
                expected: "an expression",
            }),
            ("help" | "?", []) => Ok(Self::Help),
            ("quit" | "exit" | "q", []) => Ok(Self::Quit),
            (
                "pause" | "resume" | "play" | "grid" | "arrow" | "vector" | "reset" | "show"
                | "status" | "help" | "?" | "quit" | "exit" | "q",
                _,
            ) => Err(CommandError::UnexpectedArguments(keyword.clone())),
            _ => Err(CommandError::Unknown(keyword.clone())),
        }
    }
}

fn parse_scale(value: &str) -> Result<f64, CommandError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|scale| !scale.is_nan())
        .ok_or_else(|| CommandError::InvalidNumber(value.to_string()))
}

impl From<Shortcut> for ControlCommand {
    fn from(shortcut: Shortcut) -> Self {
        match shortcut {
            Shortcut::TogglePause => Self::TogglePause,
            Shortcut::ToggleGrid => Self::Grid(Switch::Toggle),
            Shortcut::ToggleArrow => Self::Arrow(Switch::Toggle),
            Shortcut::ResetTime => Self::Reset,
        }
    }
}

/// What the session loop should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Print(String),
    Quit,
}

/// Applies `command` to `state` and describes the result.
pub fn apply(command: ControlCommand, state: &SharedControlState) -> Reply {
    let message = match command {
        ControlCommand::SetExpression { entry, source } => {
            state.set_expression(entry, &source);
            if source.is_empty() {
                return Reply::Print(format!("{entry} cleared (evaluates to 0)"));
            }
            match Formula::parse(&source) {
                Ok(_) => format!("{entry} = {source}"),
                Err(err) => format!("{entry} = {source} (invalid: {err}; evaluates to 0)"),
            }
        }
        ControlCommand::SetScale { entry, value } => {
            let stored = state.set_scale(entry, value);
            if stored == value {
                format!("scale {entry} = {stored}")
            } else {
                format!("scale {entry} = {stored} (clamped from {value})")
            }
        }
        ControlCommand::Pause => {
            state.set_paused(true);
            "paused".to_string()
        }
        ControlCommand::Resume => {
            state.set_paused(false);
            "running".to_string()
        }
        ControlCommand::TogglePause => {
            if state.toggle_paused() {
                "paused".to_string()
            } else {
                "running".to_string()
            }
        }
        ControlCommand::Grid(switch) => {
            let visible = match switch {
                Switch::On => {
                    state.set_show_grid(true);
                    true
                }
                Switch::Off => {
                    state.set_show_grid(false);
                    false
                }
                Switch::Toggle => state.toggle_show_grid(),
            };
            format!("grid {}", on_off(visible))
        }
        ControlCommand::Arrow(switch) => {
            let visible = match switch {
                Switch::On => {
                    state.set_show_arrow(true);
                    true
                }
                Switch::Off => {
                    state.set_show_arrow(false);
                    false
                }
                Switch::Toggle => state.toggle_show_arrow(),
            };
            format!("arrow {}", on_off(visible))
        }
        ControlCommand::Reset => {
            state.reset_time_origin();
            "time reset to 0".to_string()
        }
        ControlCommand::Show => describe(state),
        ControlCommand::Eval(source) => {
            let t = state.elapsed_seconds();
            match Formula::parse(&source) {
                Ok(formula) => match formula.eval(t) {
                    Ok(value) => format!("{value} (t = {t:.3})"),
                    Err(err) => format!("0 ({err} at t = {t:.3})"),
                },
                Err(err) => format!("error: {err}"),
            }
        }
        ControlCommand::Help => HELP.to_string(),
        ControlCommand::Quit => return Reply::Quit,
    };
    Reply::Print(message)
}

fn on_off(visible: bool) -> &'static str {
    if visible {
        "on"
    } else {
        "off"
    }
}

fn describe(state: &SharedControlState) -> String {
    let snapshot = state.snapshot();
    let settings = &snapshot.settings;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "t = {:.3}s ({})",
        snapshot.elapsed.as_secs_f64(),
        if settings.paused { "paused" } else { "running" }
    );
    for entry in MatrixEntry::ALL {
        let index = entry.index();
        let _ = writeln!(
            out,
            "{entry} = {}  (scale {})",
            settings.expressions[index], settings.scales[index]
        );
    }
    let _ = write!(
        out,
        "grid {}, arrow {}",
        on_off(settings.show_grid),
        on_off(settings.show_arrow)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::ControlSettings;

    fn state() -> SharedControlState {
        SharedControlState::new(&ControlSettings::default())
    }

    fn run(line: &str, state: &SharedControlState) -> Reply {
        apply(line.parse().unwrap(), state)
    }

    #[test]
    fn parses_expression_assignments() {
        assert_eq!(
            "b = 2 * sin(t)".parse::<ControlCommand>().unwrap(),
            ControlCommand::SetExpression {
                entry: MatrixEntry::B,
                source: "2 * sin(t)".to_string(),
            }
        );
        assert_eq!(
            " D=t ".parse::<ControlCommand>().unwrap(),
            ControlCommand::SetExpression {
                entry: MatrixEntry::D,
                source: "t".to_string(),
            }
        );
    }

    #[test]
    fn parses_keyword_commands() {
        let cases = [
            ("pause", ControlCommand::Pause),
            ("resume", ControlCommand::Resume),
            ("toggle pause", ControlCommand::TogglePause),
            ("grid off", ControlCommand::Grid(Switch::Off)),
            ("grid", ControlCommand::Grid(Switch::Toggle)),
            ("ARROW on", ControlCommand::Arrow(Switch::On)),
            ("reset", ControlCommand::Reset),
            ("show", ControlCommand::Show),
            ("help", ControlCommand::Help),
            ("quit", ControlCommand::Quit),
        ];
        for (line, expected) in cases {
            assert_eq!(line.parse::<ControlCommand>().unwrap(), expected, "{line}");
        }
        assert_eq!(
            "scale c -1.5".parse::<ControlCommand>().unwrap(),
            ControlCommand::SetScale {
                entry: MatrixEntry::C,
                value: -1.5,
            }
        );
        assert_eq!(
            "eval sin(pi / 2) + 1".parse::<ControlCommand>().unwrap(),
            ControlCommand::Eval("sin(pi / 2) + 1".to_string())
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!("".parse::<ControlCommand>(), Err(CommandError::Empty));
        assert!(matches!(
            "x = t".parse::<ControlCommand>(),
            Err(CommandError::InvalidEntry(_))
        ));
        assert!(matches!(
            "scale a lots".parse::<ControlCommand>(),
            Err(CommandError::InvalidNumber(_))
        ));
        assert!(matches!(
            "scale a NaN".parse::<ControlCommand>(),
            Err(CommandError::InvalidNumber(_))
        ));
        assert!(matches!(
            "grid maybe".parse::<ControlCommand>(),
            Err(CommandError::InvalidSwitch(_))
        ));
        assert!(matches!(
            "pause now".parse::<ControlCommand>(),
            Err(CommandError::UnexpectedArguments(_))
        ));
        assert!(matches!(
            "explode".parse::<ControlCommand>(),
            Err(CommandError::Unknown(_))
        ));
    }

    #[test]
    fn empty_assignment_clears_the_entry() {
        assert_eq!(
            "c =".parse::<ControlCommand>().unwrap(),
            ControlCommand::SetExpression {
                entry: MatrixEntry::C,
                source: String::new(),
            }
        );

        let state = state();
        let reply = run("a =   ", &state);
        assert_eq!(&*state.expression(MatrixEntry::A), "");
        assert_eq!(formula::evaluate(&state.expression(MatrixEntry::A), 1.0), 0.0);
        match reply {
            Reply::Print(message) => assert!(message.contains("cleared")),
            Reply::Quit => panic!("clearing an entry must not quit"),
        }
    }

    #[test]
    fn invalid_expressions_are_stored_and_flagged() {
        let state = state();
        let reply = run("a = __import__('os')", &state);
        assert_eq!(&*state.expression(MatrixEntry::A), "__import__('os')");
        match reply {
            Reply::Print(message) => assert!(message.contains("invalid")),
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn scales_report_clamping() {
        let state = state();
        assert_eq!(
            run("scale b 5", &state),
            Reply::Print("scale b = 2 (clamped from 5)".to_string())
        );
        assert_eq!(state.scale(MatrixEntry::B), 2.0);
        assert_eq!(
            run("scale b 0.5", &state),
            Reply::Print("scale b = 0.5".to_string())
        );
    }

    #[test]
    fn toggles_update_shared_flags() {
        let state = state();
        run("pause", &state);
        assert!(state.paused());
        run("toggle pause", &state);
        assert!(!state.paused());
        run("grid off", &state);
        assert!(!state.show_grid());
        run("grid toggle", &state);
        assert!(state.show_grid());
        run("arrow toggle", &state);
        assert!(!state.show_arrow());
    }

    #[test]
    fn shortcuts_map_to_commands() {
        let state = state();
        apply(Shortcut::TogglePause.into(), &state);
        assert!(state.paused());
        apply(Shortcut::ToggleGrid.into(), &state);
        assert!(!state.show_grid());
        apply(Shortcut::ToggleArrow.into(), &state);
        assert!(!state.show_arrow());
        assert_eq!(
            ControlCommand::from(Shortcut::ResetTime),
            ControlCommand::Reset
        );
    }

    #[test]
    fn eval_reports_errors_without_touching_state() {
        let state = state();
        let before = state.snapshot().settings;
        assert_eq!(
            run("eval foo(1)", &state),
            Reply::Print("error: unknown name 'foo'".to_string())
        );
        match run("eval 1 / 0", &state) {
            Reply::Print(message) => assert!(message.starts_with("0 (division by zero")),
            Reply::Quit => panic!("unexpected quit"),
        }
        assert_eq!(state.snapshot().settings, before);
    }

    #[test]
    fn show_lists_every_entry() {
        let state = state();
        let Reply::Print(message) = run("show", &state) else {
            panic!("show must print");
        };
        assert!(message.contains("a = cos(t)"));
        assert!(message.contains("c = -sin(t)"));
        assert!(message.ends_with("grid on, arrow on"));
    }

    #[test]
    fn quit_ends_the_session() {
        assert_eq!(run("quit", &state()), Reply::Quit);
    }
}
