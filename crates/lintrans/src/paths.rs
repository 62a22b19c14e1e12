use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "lintrans";
const APPLICATION: &str = "lintrans";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Where the settings file comes from. A missing file is only an error when
/// the user named it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Default(PathBuf),
    /// No home directory to look in; built-in defaults apply.
    Unavailable,
}

impl ConfigSource {
    /// `explicit` is `--config` or `LINTRANS_CONFIG`, already merged by clap.
    pub fn discover(explicit: Option<&Path>) -> Self {
        Self::resolve(
            explicit,
            ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION),
        )
    }

    fn resolve(explicit: Option<&Path>, project_dirs: Option<ProjectDirs>) -> Self {
        if let Some(path) = explicit {
            return Self::Explicit(path.to_path_buf());
        }
        match project_dirs {
            Some(dirs) => Self::Default(dirs.config_dir().join(CONFIG_FILE_NAME)),
            None => {
                tracing::debug!("user directories unavailable; skipping config file");
                Self::Unavailable
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Default(path) => Some(path),
            Self::Unavailable => None,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let source = ConfigSource::discover(Some(Path::new("/tmp/custom.toml")));
        assert!(source.is_explicit());
        assert_eq!(source.path(), Some(Path::new("/tmp/custom.toml")));
    }

    #[test]
    fn default_path_ends_with_config_file_name() {
        if let ConfigSource::Default(path) = ConfigSource::discover(None) {
            assert!(path.ends_with(CONFIG_FILE_NAME));
        }
    }

    #[test]
    fn missing_home_directory_means_no_file() {
        let source = ConfigSource::resolve(None, None);
        assert_eq!(source, ConfigSource::Unavailable);
        assert_eq!(source.path(), None);
        assert!(!source.is_explicit());
    }
}
