/// Structured logging for the Agos monitoring client
///
/// Provides context-rich logging tagged with the component and, where one
/// applies, the gauge or operation it concerns. Supports both console output
/// and an append-only log file.

use crate::location::LocationError;
use crate::model::StoreError;
use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses a config value such as "info" or "WARN". Unknown names give `None`.
    pub fn parse(raw: &str) -> Option<LogLevel> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Store,
    Location,
    Map,
    Form,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Store => write!(f, "STORE"),
            Component::Location => write!(f, "LOC"),
            Component::Map => write!(f, "MAP"),
            Component::Form => write!(f, "FORM"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - device offline, permission refused by the user
    Expected,
    /// Unexpected failure - indicates a backend or configuration problem
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, component: Component, subject: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format_entry(
            &Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            level,
            component,
            subject,
            message,
        );

        // Console output goes to stderr so command output on stdout stays clean
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, subject_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, subject_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// One log line: `<timestamp> <LEVEL> <COMPONENT> [subject]: message`.
fn format_entry(
    timestamp: &str,
    level: LogLevel,
    component: Component,
    subject: Option<&str>,
    message: &str,
) -> String {
    let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, component, subject_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, subject: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, subject, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, subject, message);
}

/// Log a warning message
pub fn warn(component: Component, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, subject, message);
}

/// Log an error message
pub fn error(component: Component, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, subject, message);
}

/// Log a debug message
pub fn debug(component: Component, subject: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, subject, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a store failure.
///
/// Losing the network is routine on a phone in the field; the stale list
/// stays on screen. Anything the backend itself rejects points at a
/// deployment or schema problem.
pub fn classify_store_failure(err: &StoreError) -> FailureType {
    match err {
        StoreError::Transport(_) => FailureType::Expected,
        StoreError::HttpError(code, _) if *code >= 500 => FailureType::Unexpected,
        StoreError::HttpError(401 | 403, _) => FailureType::Unexpected,
        StoreError::HttpError(_, _) => FailureType::Unknown,
        StoreError::ParseError(_) | StoreError::Database(_) => FailureType::Unexpected,
        StoreError::Rejected(_) => FailureType::Unknown,
    }
}

/// Classify a location failure
pub fn classify_location_failure(err: &LocationError) -> FailureType {
    match err {
        LocationError::PermissionDenied => FailureType::Expected,
        LocationError::Unavailable(_) => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

fn log_classified(component: Component, subject: &str, failure_type: FailureType, message: &str) {
    match failure_type {
        FailureType::Expected => debug(component, Some(subject), message),
        FailureType::Unexpected => error(component, Some(subject), message),
        FailureType::Unknown => warn(component, Some(subject), message),
    }
}

/// Log a store failure with automatic classification
pub fn log_store_failure(operation: &str, err: &StoreError) {
    let failure_type = classify_store_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);
    log_classified(Component::Store, operation, failure_type, &message);
}

/// Log a location failure with classification
pub fn log_location_failure(operation: &str, err: &LocationError) {
    let failure_type = classify_location_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);
    log_classified(Component::Location, operation, failure_type, &message);
}

// ---------------------------------------------------------------------------
// Verification Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a record audit
pub fn log_audit_summary(total: usize, clean: usize, flagged: usize) {
    let message = format!(
        "Audit complete: {}/{} records clean, {} flagged",
        clean, total, flagged
    );

    if flagged == 0 {
        info(Component::Store, None, &message);
    } else if clean == 0 {
        error(Component::Store, None, &message);
    } else {
        warn(Component::Store, None, &message);
    }
}
