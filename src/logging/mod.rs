//! Leveled logging behind an injected sink
//!
//! The core never writes to stdout on its own authority: every component
//! takes a [`SaveLogger`] trait object, and callers that do not care get
//! the no-op sink, never a crash. The bundled [`JsonLogger`] emits one
//! structured JSON line per event with deterministic key order.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Fine-grained diagnostic detail
    Debug = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable or advisory issues
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sink for leveled messages emitted by the save-store.
pub trait SaveLogger: Send + Sync {
    fn log(&self, level: LogLevel, tag: &str, message: &str);

    fn debug(&self, tag: &str, message: &str) {
        self.log(LogLevel::Debug, tag, message);
    }

    fn info(&self, tag: &str, message: &str) {
        self.log(LogLevel::Info, tag, message);
    }

    fn warn(&self, tag: &str, message: &str) {
        self.log(LogLevel::Warn, tag, message);
    }

    fn error(&self, tag: &str, message: &str) {
        self.log(LogLevel::Error, tag, message);
    }
}

/// Discards everything. The fallback when no logger is injected.
pub struct NoopLogger;

impl SaveLogger for NoopLogger {
    fn log(&self, _level: LogLevel, _tag: &str, _message: &str) {}
}

/// Structured JSON logger: one line per event, deterministic key order,
/// synchronous, no buffering. Errors go to stderr, the rest to stdout.
pub struct JsonLogger;

impl JsonLogger {
    fn write_line<W: Write>(level: LogLevel, tag: &str, message: &str, writer: &mut W) {
        let mut line = String::with_capacity(96);
        line.push_str("{\"severity\":\"");
        line.push_str(level.as_str());
        line.push_str("\",\"tag\":\"");
        escape_json_string(&mut line, tag);
        line.push_str("\",\"message\":\"");
        escape_json_string(&mut line, message);
        line.push_str("\"}\n");

        // One syscall per event
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

impl SaveLogger for JsonLogger {
    fn log(&self, level: LogLevel, tag: &str, message: &str) {
        if level >= LogLevel::Error {
            Self::write_line(level, tag, message, &mut io::stderr());
        } else {
            Self::write_line(level, tag, message, &mut io::stdout());
        }
    }
}

/// The default logger handle: shared, structured, stdout/stderr.
pub fn default_logger() -> Arc<dyn SaveLogger> {
    Arc::new(JsonLogger)
}

/// The silent logger handle.
pub fn noop_logger() -> Arc<dyn SaveLogger> {
    Arc::new(NoopLogger)
}

fn escape_json_string(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => {
                output.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(level: LogLevel, tag: &str, message: &str) -> String {
        let mut buffer = Vec::new();
        JsonLogger::write_line(level, tag, message, &mut buffer);
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_json_line_is_valid_json() {
        let line = capture(LogLevel::Info, "ShardStore", "wrote shard main");
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["tag"], "ShardStore");
        assert_eq!(parsed["message"], "wrote shard main");
    }

    #[test]
    fn test_json_line_escapes_special_chars() {
        let line = capture(LogLevel::Warn, "Codec", "bad \"payload\"\nline2");
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["message"], "bad \"payload\"\nline2");
    }

    #[test]
    fn test_one_line_per_event() {
        let line = capture(LogLevel::Error, "Vault", "save failed");
        assert_eq!(line.chars().filter(|c| *c == '\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_noop_logger_is_silent_and_safe() {
        let logger = noop_logger();
        logger.debug("t", "m");
        logger.info("t", "m");
        logger.warn("t", "m");
        logger.error("t", "m");
    }
}
