//! Rolling file logs for the review core.
//!
//! # Responsibility
//! - Resolve log settings from explicit values or `ASBUILT_LOG_LEVEL` /
//!   `ASBUILT_LOG_DIR`.
//! - Start the flexi_logger backend once per process and record panics.
//!
//! # Invariants
//! - At most one backend per process; starting again with the same settings
//!   is a no-op, with other settings an error.
//! - Nothing here panics.
//! - Review events log ids, coordinates and durations; captions never reach logs.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "asbuilt";
const LOG_LEVEL_ENV: &str = "ASBUILT_LOG_LEVEL";
const LOG_DIR_ENV: &str = "ASBUILT_LOG_DIR";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 160;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    config: LoggingConfig,
    _handle: LoggerHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a case-insensitive level name; `warning` is accepted for `warn`.
    pub fn parse(raw: &str) -> Result<Self, LoggingError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(LoggingError::UnsupportedLevel(raw.trim().to_string())),
        }
    }

    /// `debug` for debug builds, `info` for release builds.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    MissingDir,
    RelativeDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// The process already logs with different settings.
    Reconfigure {
        active: LoggingConfig,
        requested: LoggingConfig,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::MissingDir => write!(f, "log_dir cannot be empty"),
            Self::RelativeDir(dir) => {
                write!(f, "log_dir must be an absolute path, got `{}`", dir.display())
            }
            Self::CreateDir { dir, source } => {
                write!(f, "failed to create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::Reconfigure { active, requested } => write!(
                f,
                "logging already initialized as {active}; refusing to switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

/// Validated logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    level: LogLevel,
    log_dir: PathBuf,
}

impl LoggingConfig {
    /// # Errors
    /// - `UnsupportedLevel` for unknown level names.
    /// - `MissingDir` / `RelativeDir` unless `log_dir` is a non-empty absolute path.
    pub fn new(level: &str, log_dir: impl AsRef<Path>) -> Result<Self, LoggingError> {
        let level = LogLevel::parse(level)?;
        let log_dir = log_dir.as_ref();
        if log_dir.as_os_str().is_empty() {
            return Err(LoggingError::MissingDir);
        }
        if !log_dir.is_absolute() {
            return Err(LoggingError::RelativeDir(log_dir.to_path_buf()));
        }
        Ok(Self {
            level,
            log_dir: log_dir.to_path_buf(),
        })
    }

    /// Fills missing values from `ASBUILT_LOG_LEVEL` / `ASBUILT_LOG_DIR`.
    ///
    /// Returns `Ok(None)` when neither argument nor environment names a log
    /// directory. The level falls back to [`LogLevel::for_build`].
    pub fn resolve(
        level: Option<&str>,
        log_dir: Option<&Path>,
    ) -> Result<Option<Self>, LoggingError> {
        let log_dir = match log_dir {
            Some(dir) => dir.to_path_buf(),
            None => match env_value(LOG_DIR_ENV) {
                Some(dir) => PathBuf::from(dir),
                None => return Ok(None),
            },
        };
        let level = level
            .map(str::to_string)
            .or_else(|| env_value(LOG_LEVEL_ENV))
            .unwrap_or_else(|| LogLevel::for_build().as_str().to_string());
        Self::new(&level, log_dir).map(Some)
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Starts logging with these settings. See [`init_logging`].
    pub fn init(&self) -> Result<(), LoggingError> {
        init_logging(self)
    }
}

impl Display for LoggingConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "level `{}` at `{}`", self.level, self.log_dir.display())
    }
}

/// Starts the rolling file backend for this process.
///
/// Idempotent for equal settings; other settings are rejected with
/// `Reconfigure` once a backend runs.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let active = ACTIVE_LOGGER.get_or_try_init(|| start_backend(config))?;
    if active.config != *config {
        return Err(LoggingError::Reconfigure {
            active: active.config.clone(),
            requested: config.clone(),
        });
    }
    Ok(())
}

fn start_backend(config: &LoggingConfig) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&config.log_dir).map_err(|source| LoggingError::CreateDir {
        dir: config.log_dir.clone(),
        source,
    })?;

    let handle = Logger::try_with_str(config.level.as_str())?
        .log_to_file(
            FileSpec::default()
                .directory(config.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    PANIC_HOOK.get_or_init(install_panic_hook);
    info!(
        "event=logging_init module=core status=ok level={} log_dir={} version={} os={}",
        config.level,
        config.log_dir.display(),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    Ok(ActiveLogger {
        config: config.clone(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info.location().map_or_else(
            || "unknown".to_string(),
            |loc| format!("{}:{}", loc.file(), loc.line()),
        );
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            single_line(payload, PANIC_SUMMARY_CHARS)
        );
        previous(panic_info);
    }));
}

/// Flattens line breaks and caps the text at `max_chars`.
fn single_line(text: &str, max_chars: usize) -> String {
    let mut flattened: String = text
        .chars()
        .map(|c| if matches!(c, '\n' | '\r') { ' ' } else { c })
        .take(max_chars)
        .collect();
    if text.chars().count() > max_chars {
        flattened.push_str("...");
    }
    flattened
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{init_logging, single_line, LogLevel, LoggingConfig, LoggingError};
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_log_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "asbuilt-logs-{label}-{}-{nanos}",
            std::process::id()
        ))
    }

    #[test]
    fn level_parsing_is_case_insensitive() {
        assert_eq!(LogLevel::parse(" INFO ").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::parse("warning").unwrap(), LogLevel::Warn);
        assert!(matches!(
            LogLevel::parse("verbose"),
            Err(LoggingError::UnsupportedLevel(level)) if level == "verbose"
        ));
    }

    #[test]
    fn config_requires_absolute_dir() {
        assert!(matches!(
            LoggingConfig::new("info", ""),
            Err(LoggingError::MissingDir)
        ));
        let err = LoggingConfig::new("info", "logs/dev").unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn explicit_values_win_in_resolve() {
        let dir = scratch_log_dir("resolve");
        let config = LoggingConfig::resolve(Some("error"), Some(dir.as_path()))
            .unwrap()
            .unwrap();
        assert_eq!(config.level(), LogLevel::Error);
        assert_eq!(config.log_dir(), dir.as_path());

        let err = LoggingConfig::resolve(Some("info"), Some(Path::new("relative"))).unwrap_err();
        assert!(matches!(err, LoggingError::RelativeDir(_)));
    }

    #[test]
    fn single_line_flattens_and_truncates() {
        let flattened = single_line("north\nwall\rcrack", 8);
        assert_eq!(flattened, "north wa...");
        assert_eq!(single_line("short", 8), "short");
    }

    #[test]
    fn init_is_idempotent_and_rejects_other_settings() {
        let dir = scratch_log_dir("init");
        let config = LoggingConfig::new("info", &dir).unwrap();

        init_logging(&config).unwrap();
        config.init().unwrap();
        assert!(dir.is_dir());

        let louder = LoggingConfig::new("debug", &dir).unwrap();
        let err = init_logging(&louder).unwrap_err();
        assert!(err.to_string().contains("refusing to switch"));

        let elsewhere = LoggingConfig::new("info", scratch_log_dir("other")).unwrap();
        assert!(matches!(
            init_logging(&elsewhere),
            Err(LoggingError::Reconfigure { .. })
        ));
    }
}
