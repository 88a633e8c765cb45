//! Console logger behind the `log` facade.
//!
//! Lines go to stderr so stdout carries only command output (saved image
//! paths, gallery listings). A copy of every line can be appended to a file.

use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::{LensError, Result};

static LENS_LOGGER: Lazy<LensLogger> = Lazy::new(LensLogger::new);

/// Install the global logger. Fails if the log file cannot be opened or a
/// logger is already installed.
pub fn init(config: LoggerConfig) -> Result<()> {
    let level = config.level;
    LENS_LOGGER.configure(config)?;
    log::set_logger(&*LENS_LOGGER)
        .map_err(|e| LensError::ConfigError(format!("logger already installed: {}", e)))?;
    log::set_max_level(level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LevelFilter,
    pub format: LogFormat,
    pub colors: bool,
    pub emojis: bool,
    pub timestamps: bool,
    pub file: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Warn,
            format: LogFormat::Pretty,
            colors: true,
            emojis: true,
            timestamps: true,
            file: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Debug level, for `--verbose` runs.
    pub fn verbose() -> Self {
        Self::default().with_level(LevelFilter::Debug)
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.colors = enabled;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

/// Serialized shape of one line in JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    pub uptime_ms: u64,
}

fn level_style(level: Level) -> (Color, &'static str) {
    match level {
        Level::Error => (Color::Red, "❌"),
        Level::Warn => (Color::Yellow, "⚠️"),
        Level::Info => (Color::Green, "🍌"),
        Level::Debug => (Color::Blue, "🐛"),
        Level::Trace => (Color::Cyan, "🔍"),
    }
}

pub struct LensLogger {
    config: Mutex<LoggerConfig>,
    file: Mutex<Option<File>>,
    started: Instant,
}

impl LensLogger {
    pub fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            file: Mutex::new(None),
            started: Instant::now(),
        }
    }

    fn configure(&self, config: LoggerConfig) -> Result<()> {
        let file = match &config.file {
            Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
            None => None,
        };
        *self.file.lock().unwrap_or_else(|e| e.into_inner()) = file;
        *self.config.lock().unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    fn line(&self, record: &Record) -> LogLine {
        LogLine {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: record.level().as_str().to_string(),
            target: record
                .target()
                .trim_start_matches("bananalens::")
                .to_string(),
            message: record.args().to_string(),
            uptime_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    fn render(line: &LogLine, level: Level, config: &LoggerConfig, colors: bool) -> String {
        if config.format == LogFormat::Json {
            return serde_json::to_string(line).unwrap_or_default();
        }

        let (color, emoji) = level_style(level);
        let mut out = String::new();
        if config.timestamps {
            let ts = line.timestamp.format("%H:%M:%S%.3f").to_string();
            if colors {
                out.push_str(&format!("{} ", ts.bright_black()));
            } else {
                out.push_str(&format!("{} ", ts));
            }
        }
        let tag = if config.emojis {
            format!("{} {}", emoji, line.level)
        } else {
            line.level.clone()
        };
        if colors {
            out.push_str(&format!(
                "[{}] {}: ",
                tag.color(color).bold(),
                line.target.bright_blue()
            ));
        } else {
            out.push_str(&format!("[{}] {}: ", tag, line.target));
        }
        out.push_str(&line.message);
        out
    }
}

impl Default for LensLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl log::Log for LensLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let config = self.config.lock().unwrap_or_else(|e| e.into_inner());
        metadata.level() <= config.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.line(record);
        let config = self.config.lock().unwrap_or_else(|e| e.into_inner());

        eprintln!("{}", Self::render(&line, record.level(), &config, config.colors));

        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(file) = file.as_mut() {
            let _ = writeln!(file, "{}", Self::render(&line, record.level(), &config, false));
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Some(file) = self.file.lock().unwrap_or_else(|e| e.into_inner()).as_mut() {
            let _ = file.flush();
        }
    }
}

/// Logs how long a scope took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!("⏱️  {} finished in {}ms", self.name, self.elapsed().as_millis());
    }
}

pub fn timer(name: &str) -> Timer {
    log::debug!("⏱️  Starting {}", name);
    Timer {
        start: Instant::now(),
        name: name.to_string(),
    }
}

pub fn log_startup_info(app_name: &str, version: &str) {
    log::info!("🚀 Starting {} v{}", app_name, version);
}

pub fn log_config_info(config: &crate::config::Config) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   API endpoint: {}", config.gemini.base_url);
    log::info!(
        "   API key: {}",
        if config.gemini.api_key.is_some() { "✅" } else { "❌" }
    );
    log::info!("   History file: {}", config.history_path.display());
    log::info!("   Output dir: {}", config.output_dir.display());
}
