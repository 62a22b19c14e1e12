use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renderer::Antialiasing;

#[derive(Parser, Debug)]
#[command(
    name = "lintrans",
    author,
    version,
    about = "Animate a 2x2 linear transform of a grid and a vector",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Settings file; defaults to `config.toml` in the user config directory.
    #[arg(long, value_name = "FILE", env = "LINTRANS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Window size in physical pixels (e.g. `800x800`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size, global = true)]
    pub size: Option<(u32, u32)>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias, global = true)]
    pub antialias: Option<Antialiasing>,

    /// World units visible from the centre to the nearest window edge.
    #[arg(long, value_name = "UNITS", value_parser = parse_view_extent, global = true)]
    pub view_extent: Option<f32>,

    /// Grid lines are drawn for every integer in `[-N, N]`.
    #[arg(
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(0..=1000),
        global = true
    )]
    pub grid_extent: Option<u32>,

    /// Untransformed sample vector (e.g. `3,1`).
    #[arg(long, value_name = "X,Y", value_parser = parse_vector, allow_hyphen_values = true, global = true)]
    pub vector: Option<(f32, f32)>,

    /// Initial expression for entry `a` (top left).
    #[arg(short = 'a', value_name = "EXPR", allow_hyphen_values = true, global = true)]
    pub a: Option<String>,

    /// Initial expression for entry `b` (top right).
    #[arg(short = 'b', value_name = "EXPR", allow_hyphen_values = true, global = true)]
    pub b: Option<String>,

    /// Initial expression for entry `c` (bottom left).
    #[arg(short = 'c', value_name = "EXPR", allow_hyphen_values = true, global = true)]
    pub c: Option<String>,

    /// Initial expression for entry `d` (bottom right).
    #[arg(short = 'd', value_name = "EXPR", allow_hyphen_values = true, global = true)]
    pub d: Option<String>,

    /// Start with the animation paused.
    #[arg(long, global = true)]
    pub paused: bool,

    /// Start with the grid hidden.
    #[arg(long, global = true)]
    pub no_grid: bool,

    /// Start with the sample vector hidden.
    #[arg(long, global = true)]
    pub no_arrow: bool,
}

impl RunArgs {
    /// Expression overrides in `a, b, c, d` order.
    pub fn expressions(&self) -> [Option<&str>; 4] {
        [&self.a, &self.b, &self.c, &self.d].map(|value| value.as_deref())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value of an expression at a given time (0 on any error).
    Eval(EvalArgs),
    /// Report whether an expression parses; exits non-zero when it does not.
    Check(CheckArgs),
    /// Print the resolved start-up settings as TOML without opening a window.
    Settings,
}

#[derive(Parser, Debug)]
pub struct EvalArgs {
    #[arg(value_name = "EXPR", allow_hyphen_values = true)]
    pub expression: String,

    /// Elapsed seconds bound to `t`.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0, allow_negative_numbers = true)]
    pub t: f64,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[arg(value_name = "EXPR", allow_hyphen_values = true)]
    pub expression: String,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

/// Inverse of [`parse_antialias`], used when printing settings.
pub fn antialias_label(mode: Antialiasing) -> String {
    match mode {
        Antialiasing::Auto => "auto".to_string(),
        Antialiasing::Off => "off".to_string(),
        Antialiasing::Samples(samples) => samples.to_string(),
    }
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 800x800".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in size '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in size '{trimmed}'"))?;

    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}

pub fn parse_vector(value: &str) -> Result<(f32, f32), String> {
    let (x, y) = value
        .trim()
        .split_once(',')
        .ok_or_else(|| "expected X,Y format, e.g. 3,1".to_string())?;
    let component = |text: &str, axis: &str| -> Result<f32, String> {
        let value: f32 = text
            .trim()
            .parse()
            .map_err(|_| format!("invalid {axis} component '{}'", text.trim()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("{axis} component must be finite"))
        }
    };
    Ok((component(x, "x")?, component(y, "y")?))
}

pub fn parse_view_extent(value: &str) -> Result<f32, String> {
    let extent: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid view extent '{}'", value.trim()))?;
    validate_view_extent(extent)
}

pub fn validate_view_extent(extent: f32) -> Result<f32, String> {
    if extent.is_finite() && extent > 0.0 {
        Ok(extent)
    } else {
        Err("view extent must be a positive number".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_antialias_modes() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias(" OFF ").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("1").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("4").unwrap(), Antialiasing::Samples(4));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("").is_err());
        assert!(parse_antialias("lots").is_err());
    }

    #[test]
    fn antialias_label_parses_back() {
        for mode in [Antialiasing::Auto, Antialiasing::Off, Antialiasing::Samples(8)] {
            assert_eq!(parse_antialias(&antialias_label(mode)).unwrap(), mode);
        }
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("800x600").unwrap(), (800, 600));
        assert_eq!(parse_surface_size(" 1024 X 768 ").unwrap(), (1024, 768));
        assert!(parse_surface_size("800").is_err());
        assert!(parse_surface_size("0x600").is_err());
        assert!(parse_surface_size("wide x tall").is_err());
    }

    #[test]
    fn parses_vectors() {
        assert_eq!(parse_vector("3,1").unwrap(), (3.0, 1.0));
        assert_eq!(parse_vector("-1.5, 2").unwrap(), (-1.5, 2.0));
        assert!(parse_vector("3").is_err());
        assert!(parse_vector("inf,1").is_err());
    }

    #[test]
    fn view_extent_must_be_positive() {
        assert_eq!(parse_view_extent("2.5").unwrap(), 2.5);
        assert!(parse_view_extent("0").is_err());
        assert!(parse_view_extent("-1").is_err());
        assert!(parse_view_extent("NaN").is_err());
    }

    #[test]
    fn expression_flags_accept_leading_minus() {
        let cli = Cli::try_parse_from(["lintrans", "-b", "-sin(t)", "--paused"]).unwrap();
        assert_eq!(cli.run.b.as_deref(), Some("-sin(t)"));
        assert!(cli.run.paused);
        assert!(cli.command.is_none());
    }

    #[test]
    fn eval_takes_expression_and_time() {
        let cli = Cli::try_parse_from(["lintrans", "eval", "2*t", "--t", "1.5"]).unwrap();
        match cli.command {
            Some(Command::Eval(args)) => {
                assert_eq!(args.expression, "2*t");
                assert_eq!(args.t, 1.5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_flags_combine_with_settings() {
        let cli =
            Cli::try_parse_from(["lintrans", "settings", "--no-grid", "-a", "t"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Settings)));
        assert!(cli.run.no_grid);
        assert_eq!(cli.run.expressions()[0], Some("t"));
    }
}
