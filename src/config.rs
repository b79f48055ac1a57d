use std::path::{Path, PathBuf};
use std::{env, fs, io};

use anyhow::{bail, Context, Result};
use clap::Args;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::logs::LogsConfig;
use crate::policy::config::PolicyConfig;

/// Resolved directories config loading works against.
pub struct PathSet {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl PathSet {
    pub fn new(config_dir: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        // Check if running as root (UID == 0)
        let is_root = unsafe { libc::geteuid() == 0 };

        let config_dir = if let Some(dir) = config_dir {
            dir
        } else if let Ok(dir) = env::var("TREEGATE_CONFIG") {
            PathBuf::from(dir)
        } else if is_root {
            PathBuf::from("/etc/treegate")
        } else {
            Self::home_dir()?.join(".config").join("treegate")
        };

        let data_dir = if let Some(dir) = data_dir {
            dir
        } else if let Ok(dir) = env::var("TREEGATE_DATA") {
            PathBuf::from(dir)
        } else if is_root {
            PathBuf::from("/var/lib/treegate")
        } else {
            Self::home_dir()?
                .join(".local")
                .join("share")
                .join("treegate")
        };

        ensure_dir_exists(&config_dir)
            .with_context(|| format!("ensure config directory: {}", config_dir.display()))?;
        ensure_dir_exists(&data_dir)
            .with_context(|| format!("ensure data directory: {}", data_dir.display()))?;

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Loads `<name>.toml` from the config directory. A missing file falls
    /// back to defaults with a warning; a malformed file is a startup error.
    pub fn load_config<T>(&self, name: &str) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
    {
        let path = self.config_dir.join(format!("{name}.toml"));
        let mut cfg: T = match fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s).context("parse config toml")?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Config file for {name} not found, using defaults");
                T::default()
            }
            Err(err) => {
                return Err(err).context(format!("read config file: {}", path.display()));
            }
        };

        cfg.complete(self).context("validate config")?;
        Ok(cfg)
    }

    fn home_dir() -> Result<PathBuf> {
        let dir = env::var_os("HOME") // Unix/Linux/macOS
            .or_else(|| env::var_os("USERPROFILE")) // Windows
            .map(PathBuf::from);
        match dir {
            Some(dir) => Ok(dir),
            None => {
                bail!("could not determine home directory, please specify config path manually")
            }
        }
    }
}

/// Validation and completion hook every config section implements.
pub trait CommonConfig: Default {
    fn complete(&mut self, ps: &PathSet) -> Result<()>;
}

/// Command line flags selecting config and data directories.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Config directory path.
    #[arg(long)]
    pub config_path: Option<String>,

    /// Data directory path.
    #[arg(long)]
    pub data_path: Option<String>,
}

impl ConfigArgs {
    pub fn build_path_set(&self) -> Result<PathSet> {
        let config_dir = Self::expand_path("config_path", self.config_path.as_deref())?;
        let data_dir = Self::expand_path("data_path", self.data_path.as_deref())?;
        PathSet::new(config_dir, data_dir)
    }

    pub fn load<T>(&self, name: &str) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
    {
        let ps = self.build_path_set()?;
        ps.load_config(name)
    }

    fn expand_path(name: &str, path: Option<&str>) -> Result<Option<PathBuf>> {
        match path {
            Some(path) => {
                let path = expandenv(name, path)?;
                Ok(Some(PathBuf::from(path)))
            }
            None => Ok(None),
        }
    }
}

/// Top level configuration for the treegate binary.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GateConfig {
    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub logs: LogsConfig,
}

impl CommonConfig for GateConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.policy.complete(ps).context("policy")?;
        self.logs.complete(ps).context("logs")?;
        Ok(())
    }
}

/// See: [`shellexpand::full`].
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let s =
        shellexpand::full(s.as_ref()).with_context(|| format!("expand env value for '{name}'"))?;
    Ok(s.to_string())
}

pub fn ensure_dir_exists(dir: &Path) -> Result<()> {
    match fs::read_dir(dir) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).context("create directory")
        }
        Err(err) => Err(err).context("read directory"),
    }
}
