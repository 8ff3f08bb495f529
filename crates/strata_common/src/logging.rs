//! Console logging sink.
//!
//! strata logs through the `log` facade with five levels: VERBOSE maps to
//! `trace`, then debug, info, warning and error. The sink writes plain text
//! to stderr with a colorized level prefix when the stream is a terminal.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::{IsTerminal, Write};

/// Controls whether the level prefixes are colorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Colorize when stderr is a terminal.
    #[default]
    Auto,
    /// Always emit ANSI color codes.
    Always,
    /// Never emit ANSI color codes.
    Never,
}

struct ConsoleLogger {
    level: LevelFilter,
    color: bool,
}

fn level_prefix(level: Level, color: bool) -> &'static str {
    if color {
        match level {
            Level::Error => "\x1b[31merror\x1b[0m",
            Level::Warn => "\x1b[33mwarning\x1b[0m",
            Level::Info => "\x1b[32minfo\x1b[0m",
            Level::Debug => "\x1b[36mdebug\x1b[0m",
            Level::Trace => "\x1b[90mverbose\x1b[0m",
        }
    } else {
        match level {
            Level::Error => "error",
            Level::Warn => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "verbose",
        }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut err = std::io::stderr().lock();
        let _ = writeln!(
            err,
            "{}: {}",
            level_prefix(record.level(), self.color),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs the console logger at the given level.
///
/// Safe to call more than once; only the first call installs a sink (the
/// `log` facade rejects later ones), so tests can initialize freely.
pub fn init(level: LevelFilter, color: ColorChoice) {
    let colorize = match color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };
    let logger = Box::new(ConsoleLogger {
        level,
        color: colorize,
    });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}
