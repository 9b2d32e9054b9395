//! Console and session log file output
//!
//! Every line is stamped with the seconds elapsed since the session epoch.
//! The console copy is coloured by level, the file copy is plain text.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::fmt;

use colored::{ColoredString, Colorize};
use fern::FormatCallback;
use log::{info, Level, Record};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Ways in which installing the logger can fail.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Log level `{0}` would hide warnings and errors, use `INFO` or more verbose")]
    LevelTooQuiet(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFile(std::io::Error),

    #[error("A global logger is already installed: {0}")]
    AlreadyInstalled(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the global logger, writing to stdout and to the session log file.
///
/// Levels quieter than `Info` are refused. Debug and trace lines name their
/// target and thread so that output from the motor workers can be separated
/// from the planner's.
///
/// Only the first call in a process can succeed.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    check_level(min_level)?;

    let log_file = fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFile)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            write_line(out, message, record, coloured_tag(record.level()))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| write_line(out, message, record, level_tag(record.level())))
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::AlreadyInstalled)?;

    info!("Logger ready at {:?}", min_level);
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Writing to: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_level(min_level: LevelFilter) -> Result<(), LoggerInitError> {
    if min_level < LevelFilter::Info {
        Err(LoggerInitError::LevelTooQuiet(min_level))
    }
    else {
        Ok(())
    }
}

fn write_line<T: fmt::Display>(
    out: FormatCallback,
    message: &fmt::Arguments,
    record: &Record,
    tag: T,
) {
    let elapsed_s = session::get_elapsed_seconds();

    match origin(record) {
        Some(origin) => out.finish(format_args!(
            "[{:10.6} {}] {}: {}",
            elapsed_s, tag, origin, message
        )),
        None => out.finish(format_args!("[{:10.6} {}] {}", elapsed_s, tag, message)),
    }
}

/// Where a verbose record came from, `None` for info and above.
fn origin(record: &Record) -> Option<String> {
    if record.level() <= Level::Info {
        return None;
    }

    let thread = std::thread::current();
    Some(format!(
        "{} ({})",
        record.target(),
        thread.name().unwrap_or("unnamed")
    ))
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

fn coloured_tag(level: Level) -> ColoredString {
    let tag = level_tag(level);

    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_origin_only_on_verbose_records() {
        let warn = Record::builder()
            .level(Level::Warn)
            .target("grid_exec::grid::scheduler")
            .build();
        assert_eq!(origin(&warn), None);

        let debug = Record::builder()
            .level(Level::Debug)
            .target("grid_exec::motor_ctrl::worker")
            .build();
        let verbose = origin(&debug).unwrap();
        assert!(verbose.starts_with("grid_exec::motor_ctrl::worker ("));
    }

    #[test]
    fn test_tags() {
        assert_eq!(level_tag(Level::Warn), "WRN");
        assert!(coloured_tag(Level::Error).to_string().contains("ERR"));
    }

    #[test]
    fn test_quiet_levels_refused() {
        assert!(check_level(LevelFilter::Info).is_ok());
        assert!(check_level(LevelFilter::Trace).is_ok());

        match check_level(LevelFilter::Warn) {
            Err(LoggerInitError::LevelTooQuiet(LevelFilter::Warn)) => (),
            other => panic!("Expected LevelTooQuiet, got {:?}", other),
        }
        assert!(check_level(LevelFilter::Off).is_err());
    }
}
