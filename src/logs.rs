use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::config::{ensure_dir_exists, CommonConfig, PathSet};

/// Logging configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogsConfig {
    #[serde(default)]
    pub target: LogTarget,

    #[serde(default = "LogsConfig::default_level")]
    pub level: String,

    #[serde(skip)]
    logs_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
pub enum LogTarget {
    #[serde(rename = "stdout")]
    #[default]
    Stdout,

    #[serde(rename = "stderr")]
    Stderr,

    #[serde(rename = "file")]
    File,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::default(),
            level: Self::default_level(),
            logs_dir: PathBuf::new(),
        }
    }
}

impl CommonConfig for LogsConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.level_filter()?;

        if matches!(self.target, LogTarget::File) {
            self.logs_dir = ps.data_dir.join("logs");
            ensure_dir_exists(&self.logs_dir).context("ensure logs dir")?;
        }

        Ok(())
    }
}

impl LogsConfig {
    fn default_level() -> String {
        String::from("info")
    }

    fn level_filter(&self) -> Result<LevelFilter> {
        match self.level.as_str() {
            "error" => Ok(LevelFilter::Error),
            "info" => Ok(LevelFilter::Info),
            "debug" => Ok(LevelFilter::Debug),
            _ => bail!("unknown log level '{}'", self.level),
        }
    }

    /// Installs the global logger, with colored levels when writing to a
    /// terminal.
    pub fn init(&self, name: &str) -> Result<()> {
        let level = self.level_filter()?;

        let is_terminal = match self.target {
            LogTarget::Stdout => io::stdout().is_terminal(),
            LogTarget::Stderr => io::stderr().is_terminal(),
            LogTarget::File => false,
        };

        let colors = ColoredLevelConfig::new()
            .info(Color::Green)
            .debug(Color::Magenta);

        let dispatch = fern::Dispatch::new()
            .format(move |out, message, record| {
                if is_terminal {
                    out.finish(format_args!(
                        "{} [{}] {}",
                        humantime::format_rfc3339_millis(std::time::SystemTime::now()),
                        colors.color(record.level()),
                        message
                    ))
                } else {
                    out.finish(format_args!(
                        "{} [{}] {}",
                        humantime::format_rfc3339_millis(std::time::SystemTime::now()),
                        record.level(),
                        message
                    ))
                }
            })
            .level(level);

        let dispatch = match self.target {
            LogTarget::Stdout => dispatch.chain(io::stdout()),
            LogTarget::Stderr => dispatch.chain(io::stderr()),
            LogTarget::File => {
                let path = self.logs_dir.join(format!("{name}.log"));
                let file = fern::log_file(&path)
                    .with_context(|| format!("open log file: {}", path.display()))?;
                dispatch.chain(file)
            }
        };

        dispatch.apply().context("init logger")?;
        Ok(())
    }
}
