use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub tools: ToolsConfig,
    #[serde(rename = "clone")]
    pub git_clone: CloneConfig,
    pub scan: ScanConfig,
    pub install: InstallConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    pub git: String,
    pub dotnet: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloneConfig {
    /// Passed to `git clone --depth` when set.
    #[serde(default)]
    pub depth: Option<u32>,
    /// Parent directory for clones. Defaults to the system temp dir.
    #[serde(default)]
    pub work_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub manifest_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallConfig {
    pub remove_existing: bool,
    #[serde(default)]
    pub configuration: Option<String>,
}

const DEFAULTS: &str = include_str!("../../config/default.toml");

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    ///
    /// `explicit` replaces the per-user config location and must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user_path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(anyhow!("config file not found: {}", path.display()));
                }
                Some(path.to_path_buf())
            }
            None => directories::ProjectDirs::from("", "", "dotnet-get")
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .filter(|path| path.exists()),
        };

        let user = match user_path {
            Some(path) => {
                tracing::info!("loading user config from {}", path.display());
                Some(
                    fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?,
                )
            }
            None => None,
        };

        Self::from_layers(user.as_deref())
    }

    /// Deep-merges `user` over the compiled-in defaults.
    pub fn from_layers(user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(DEFAULTS)?;

        if let Some(user) = user {
            let overrides: toml::Table = toml::from_str(user).context("parsing user config")?;
            merge_tables(&mut merged, overrides);
        }

        let mut config: AppConfig = toml::Value::Table(merged).try_into()?;

        if let Some(dir) = config.git_clone.work_dir.as_mut() {
            if dir.starts_with('~') {
                let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
                *dir = dir.replacen('~', &home.to_string_lossy(), 1);
            }
        }

        Ok(config)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.git_clone
            .work_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
