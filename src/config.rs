use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the directory searched under the user's config directory.
pub const CONFIG_DIR_NAME: &str = "nforetag";

/// Default file name for the tool configuration.
pub const DEFAULT_CONFIG_FILE: &str = "nforetag.yaml";

/// Persistent tool configuration.
///
/// ```yaml
/// enabled: true
/// jobs: |
///   /media/movies|actor|jack|杰克
/// ```
///
/// `enabled` is a one-shot trigger: `apply` runs the batch only when it is
/// `true` and writes it back as `false` once the batch has been accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub enabled: bool,
    /// One `path|tag_name|old_value|new_value` job per line.
    #[serde(default)]
    pub jobs: String,
}

/// A utility for locating, loading and saving the tool configuration.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds the configuration file by searching in a prioritized list of locations.
    ///
    /// The search order is:
    /// 1. The path as given (absolute, or relative to the current directory).
    /// 2. A path relative to the `working_dir`.
    /// 3. Inside the user config directory (`$XDG_CONFIG_HOME/nforetag` on Linux).
    /// 4. Next to the executable.
    pub fn find_config(config_path: &Path, working_dir: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let mut tried_locations = vec![config_path.to_path_buf()];

        if config_path.is_relative() {
            let in_working_dir = working_dir.join(config_path);
            if in_working_dir.exists() {
                return Ok(in_working_dir);
            }
            tried_locations.push(in_working_dir);

            if let Some(config_dir) = dirs::config_dir() {
                let user_config = config_dir.join(CONFIG_DIR_NAME).join(config_path);
                if user_config.exists() {
                    return Ok(user_config);
                }
                tried_locations.push(user_config);
            }

            if let Some(exe_dir) = env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
                let exe_config = exe_dir.join(config_path);
                if exe_config.exists() {
                    return Ok(exe_config);
                }
                tried_locations.push(exe_config);
            }
        }

        Err(Error::ConfigNotFound {
            path: config_path.to_path_buf(),
            searched: tried_locations,
        })
    }

    /// Loads a `ToolConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<ToolConfig> {
        let file = fs::File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Saves a `ToolConfig` to a YAML file, replacing it atomically.
    pub fn save(path: &Path, config: &ToolConfig) -> Result<()> {
        let contents = serde_yaml::to_string(config)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(contents.as_bytes())?;
        temp_file.persist(path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_multiline_jobs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            "enabled: true\njobs: |\n  /media/movies|actor|jack|杰克\n  /media/tv|genre|Sci-Fi|科幻\n",
        )
        .unwrap();

        let config = ConfigLoader::load(&path).unwrap();

        assert!(config.enabled);
        assert_eq!(config.jobs.lines().count(), 2);
        assert!(config.jobs.starts_with("/media/movies|actor|jack|杰克"));
    }

    #[test]
    fn test_missing_fields_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "{}\n").unwrap();

        assert_eq!(ConfigLoader::load(&path).unwrap(), ToolConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        let config = ToolConfig {
            enabled: false,
            jobs: "/media|actor|jack|杰克\n".to_string(),
        };

        ConfigLoader::save(&path, &config).unwrap();
        assert_eq!(ConfigLoader::load(&path).unwrap(), config);
    }

    #[test]
    fn test_find_config_in_working_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("custom.yaml"), "enabled: false\n").unwrap();

        let found = ConfigLoader::find_config(Path::new("custom.yaml"), temp_dir.path()).unwrap();
        assert_eq!(found, temp_dir.path().join("custom.yaml"));
    }

    #[test]
    fn test_find_config_reports_searched_locations() {
        let temp_dir = TempDir::new().unwrap();
        let err = ConfigLoader::find_config(Path::new("no-such-config.yaml"), temp_dir.path())
            .unwrap_err();

        match &err {
            Error::ConfigNotFound { path, searched } => {
                assert_eq!(path, Path::new("no-such-config.yaml"));
                assert!(searched.contains(&temp_dir.path().join("no-such-config.yaml")));
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("Searched in"));
        assert!(message.contains(&temp_dir.path().join("no-such-config.yaml").display().to_string()));
    }
}
