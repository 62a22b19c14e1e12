//! Start-up settings: built-in defaults, overlaid by the optional TOML file,
//! overlaid by command-line flags. The file is read once and never written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use renderer::{ControlSettings, MatrixEntry, RendererConfig, SCALE_RANGE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{
    antialias_label, parse_antialias, parse_surface_size, validate_view_extent, RunArgs,
};
use crate::paths::ConfigSource;

const MAX_GRID_EXTENT: u32 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path:?} does not exist")]
    Missing { path: PathBuf },
    #[error("failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid `{field}` in config file: {message}")]
    Invalid { field: &'static str, message: String },
}

/// On-disk layout. Every field is optional; absent fields fall through to
/// the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub window: WindowSection,
    pub matrix: MatrixSection,
    pub scales: ScaleSection,
    pub display: DisplaySection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antialias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_extent: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_extent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<[f32; 2]>,
}

/// Expression text per entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatrixSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrow: Option<bool>,
}

impl MatrixSection {
    fn entries(&self) -> [Option<&str>; 4] {
        [&self.a, &self.b, &self.c, &self.d].map(|value| value.as_deref())
    }
}

impl ScaleSection {
    fn entries(&self) -> [Option<f64>; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

impl FileConfig {
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the file named by `source`. A missing default file yields an
    /// empty config; a missing explicit file is an error.
    pub fn load(source: &ConfigSource) -> Result<Self, ConfigError> {
        let Some(path) = source.path() else {
            return Ok(Self::default());
        };
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if source.is_explicit() {
                    return Err(ConfigError::Missing {
                        path: path.to_path_buf(),
                    });
                }
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::from_toml(&contents, path)?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }
}

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub renderer: RendererConfig,
    pub control: ControlSettings,
}

impl LaunchSettings {
    /// Applies `file` then `args` on top of the built-in defaults.
    pub fn resolve(args: &RunArgs, file: &FileConfig) -> Result<Self, ConfigError> {
        let mut renderer = RendererConfig::default();
        let mut control = ControlSettings::default();

        let window = &file.window;
        if let Some(size) = window.size.as_deref() {
            renderer.surface_size = parse_surface_size(size).map_err(|message| {
                ConfigError::Invalid {
                    field: "window.size",
                    message,
                }
            })?;
        }
        if let Some(title) = window.title.as_ref() {
            renderer.title = title.clone();
        }
        if let Some(mode) = window.antialias.as_deref() {
            renderer.antialiasing =
                parse_antialias(mode).map_err(|message| ConfigError::Invalid {
                    field: "window.antialias",
                    message,
                })?;
        }
        if let Some(extent) = window.view_extent {
            renderer.view_extent = validate_view_extent(extent).map_err(|message| {
                ConfigError::Invalid {
                    field: "window.view_extent",
                    message,
                }
            })?;
        }
        if let Some(extent) = window.grid_extent {
            if extent > MAX_GRID_EXTENT {
                return Err(ConfigError::Invalid {
                    field: "window.grid_extent",
                    message: format!("{extent} exceeds the maximum of {MAX_GRID_EXTENT}"),
                });
            }
            renderer.grid_half_extent = extent;
        }
        if let Some([x, y]) = window.vector {
            if !(x.is_finite() && y.is_finite()) {
                return Err(ConfigError::Invalid {
                    field: "window.vector",
                    message: "components must be finite".to_string(),
                });
            }
            renderer.sample_vector = (x, y);
        }

        for (slot, value) in control.expressions.iter_mut().zip(file.matrix.entries()) {
            if let Some(source) = value {
                *slot = source.to_string();
            }
        }
        for (entry, value) in MatrixEntry::ALL.into_iter().zip(file.scales.entries()) {
            if let Some(scale) = value {
                control.scales[entry.index()] = clamp_scale(entry, scale)?;
            }
        }
        if let Some(paused) = file.display.paused {
            control.paused = paused;
        }
        if let Some(grid) = file.display.grid {
            control.show_grid = grid;
        }
        if let Some(arrow) = file.display.arrow {
            control.show_arrow = arrow;
        }

        if let Some(size) = args.size {
            renderer.surface_size = size;
        }
        if let Some(mode) = args.antialias {
            renderer.antialiasing = mode;
        }
        if let Some(extent) = args.view_extent {
            renderer.view_extent = extent;
        }
        if let Some(extent) = args.grid_extent {
            renderer.grid_half_extent = extent;
        }
        if let Some(vector) = args.vector {
            renderer.sample_vector = vector;
        }
        for (slot, value) in control.expressions.iter_mut().zip(args.expressions()) {
            if let Some(source) = value {
                *slot = source.to_string();
            }
        }
        if args.paused {
            control.paused = true;
        }
        if args.no_grid {
            control.show_grid = false;
        }
        if args.no_arrow {
            control.show_arrow = false;
        }

        for (entry, source) in MatrixEntry::ALL.into_iter().zip(&control.expressions) {
            if let Err(err) = formula::Formula::parse(source) {
                tracing::warn!(%entry, expression = %source, error = %err, "initial expression is invalid; it will evaluate to 0");
            }
        }

        Ok(Self { renderer, control })
    }

    /// Fully populated file form of these settings, for `settings` output.
    pub fn to_file_config(&self) -> FileConfig {
        let renderer = &self.renderer;
        let control = &self.control;
        let [a, b, c, d] = control.expressions.clone().map(Some);
        let [scale_a, scale_b, scale_c, scale_d] = control.scales.map(Some);
        FileConfig {
            window: WindowSection {
                size: Some(format!(
                    "{}x{}",
                    renderer.surface_size.0, renderer.surface_size.1
                )),
                title: Some(renderer.title.clone()),
                antialias: Some(antialias_label(renderer.antialiasing)),
                view_extent: Some(renderer.view_extent),
                grid_extent: Some(renderer.grid_half_extent),
                vector: Some([renderer.sample_vector.0, renderer.sample_vector.1]),
            },
            matrix: MatrixSection { a, b, c, d },
            scales: ScaleSection {
                a: scale_a,
                b: scale_b,
                c: scale_c,
                d: scale_d,
            },
            display: DisplaySection {
                paused: Some(control.paused),
                grid: Some(control.show_grid),
                arrow: Some(control.show_arrow),
            },
        }
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(&self.to_file_config())?)
    }
}

fn clamp_scale(entry: MatrixEntry, value: f64) -> Result<f64, ConfigError> {
    if value.is_nan() {
        return Err(ConfigError::Invalid {
            field: "scales",
            message: format!("scale for {entry} is not a number"),
        });
    }
    let clamped = value.clamp(SCALE_RANGE.0, SCALE_RANGE.1);
    if clamped != value {
        tracing::warn!(%entry, requested = value, clamped, "scale outside the allowed range");
    }
    Ok(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::Antialiasing;
    use tempfile::TempDir;

    fn parse(contents: &str) -> FileConfig {
        FileConfig::from_toml(contents, Path::new("test.toml")).unwrap()
    }

    #[test]
    fn empty_file_resolves_to_defaults() {
        let settings = LaunchSettings::resolve(&RunArgs::default(), &parse("")).unwrap();
        assert_eq!(settings.control, ControlSettings::default());
        assert_eq!(settings.renderer.surface_size, (800, 800));
        assert_eq!(settings.renderer.view_extent, 4.0);
        assert_eq!(settings.renderer.grid_half_extent, 10);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = parse(
            r#"
            [window]
            size = "640x480"
            antialias = "off"
            vector = [1.0, 2.0]

            [matrix]
            a = "2"
            d = "t"

            [scales]
            b = 0.5

            [display]
            grid = false
            "#,
        );
        let settings = LaunchSettings::resolve(&RunArgs::default(), &file).unwrap();
        assert_eq!(settings.renderer.surface_size, (640, 480));
        assert_eq!(settings.renderer.antialiasing, Antialiasing::Off);
        assert_eq!(settings.renderer.sample_vector, (1.0, 2.0));
        assert_eq!(settings.control.expressions[0], "2");
        assert_eq!(settings.control.expressions[1], "sin(t)");
        assert_eq!(settings.control.expressions[3], "t");
        assert_eq!(settings.control.scales, [1.0, 0.5, 1.0, 1.0]);
        assert!(!settings.control.show_grid);
        assert!(settings.control.show_arrow);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let file = parse(
            r#"
            [window]
            size = "640x480"
            [matrix]
            a = "2"
            [display]
            paused = false
            "#,
        );
        let args = RunArgs {
            size: Some((300, 200)),
            a: Some("3".to_string()),
            paused: true,
            no_arrow: true,
            ..RunArgs::default()
        };
        let settings = LaunchSettings::resolve(&args, &file).unwrap();
        assert_eq!(settings.renderer.surface_size, (300, 200));
        assert_eq!(settings.control.expressions[0], "3");
        assert!(settings.control.paused);
        assert!(!settings.control.show_arrow);
    }

    #[test]
    fn out_of_range_scales_are_clamped() {
        let file = parse("[scales]\na = 5.0\nc = -3.0\n");
        let settings = LaunchSettings::resolve(&RunArgs::default(), &file).unwrap();
        assert_eq!(settings.control.scales, [2.0, 1.0, -2.0, 1.0]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_size = parse("[window]\nsize = \"huge\"\n");
        assert!(matches!(
            LaunchSettings::resolve(&RunArgs::default(), &bad_size),
            Err(ConfigError::Invalid { field: "window.size", .. })
        ));
        let bad_extent = parse("[window]\nview_extent = -1.0\n");
        assert!(matches!(
            LaunchSettings::resolve(&RunArgs::default(), &bad_extent),
            Err(ConfigError::Invalid { field: "window.view_extent", .. })
        ));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let result = FileConfig::from_toml("[window]\nfullscreen = true\n", Path::new("x.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn invalid_expressions_are_kept_verbatim() {
        let args = RunArgs {
            b: Some("__import__('os')".to_string()),
            ..RunArgs::default()
        };
        let settings = LaunchSettings::resolve(&args, &FileConfig::default()).unwrap();
        assert_eq!(settings.control.expressions[1], "__import__('os')");
    }

    #[test]
    fn printed_settings_load_back_unchanged() {
        let args = RunArgs {
            antialias: Some(Antialiasing::Samples(4)),
            grid_extent: Some(5),
            no_grid: true,
            ..RunArgs::default()
        };
        let settings = LaunchSettings::resolve(&args, &FileConfig::default()).unwrap();
        let printed = settings.to_toml().unwrap();
        let reloaded = LaunchSettings::resolve(&RunArgs::default(), &parse(&printed)).unwrap();
        assert_eq!(reloaded.control, settings.control);
        assert_eq!(reloaded.renderer.antialiasing, Antialiasing::Samples(4));
        assert_eq!(reloaded.renderer.grid_half_extent, 5);
    }

    #[test]
    fn missing_default_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let source = ConfigSource::Default(dir.path().join("config.toml"));
        assert_eq!(FileConfig::load(&source).unwrap(), FileConfig::default());
    }

    #[test]
    fn unavailable_user_directories_yield_defaults() {
        assert_eq!(
            FileConfig::load(&ConfigSource::Unavailable).unwrap(),
            FileConfig::default()
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = ConfigSource::Explicit(dir.path().join("absent.toml"));
        assert!(matches!(
            FileConfig::load(&source),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn loads_explicit_file_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lintrans.toml");
        fs::write(&path, "[display]\narrow = false\n").unwrap();
        let config = FileConfig::load(&ConfigSource::Explicit(path)).unwrap();
        assert_eq!(config.display.arrow, Some(false));
    }
}
