use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

/// Full path of the carousel file; read by clap for `--config`.
pub const ENV_CONFIG_FILE: &str = "GRIDWARP_CONFIG";
pub const ENV_CONFIG_DIR: &str = "GRIDWARP_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Gridwarp";
const APPLICATION: &str = "gridwarp";

const CONFIG_FILE_NAME: &str = "carousel.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

/// An explicit `--config` wins; otherwise the per-user default location.
pub fn resolve_config_file(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) if !path.as_os_str().is_empty() => Ok(path),
        _ => Ok(AppPaths::discover()?.config_file()),
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = resolve_config_file(Some(PathBuf::from("/tmp/deck.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/deck.toml"));
    }

    #[test]
    fn default_file_lives_in_config_dir() {
        let paths = AppPaths {
            config_dir: PathBuf::from("/home/user/.config/gridwarp"),
        };
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/home/user/.config/gridwarp/carousel.toml")
        );
        assert_eq!(paths.config_dir(), Path::new("/home/user/.config/gridwarp"));
    }
}
