//! In-memory ring-buffer game log, queryable from `POST /api/debug/logs`.
//!
//! This is distinct from the ambient `tracing` setup in the `server` crate:
//! `tracing` carries process-operational logs (startup, socket lifecycle,
//! panics), while `GameLog` carries domain log lines a dev-mode client can
//! pull back out over HTTP, each stamped via an injected `TimeSource` rather
//! than a global engine reference.

use crate::time_source::TimeSource;
use protocol::LogEntryDto;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub category: &'static str,
    pub message: String,
    pub game_time: u64,
    pub fields: HashMap<String, String>,
}

impl From<&LogEntry> for LogEntryDto {
    fn from(e: &LogEntry) -> Self {
        LogEntryDto {
            level: e.level.as_str().to_string(),
            category: e.category.to_string(),
            message: e.message.clone(),
            game_time: e.game_time,
            fields: e.fields.clone(),
        }
    }
}

/// Bounded ring buffer; oldest entries fall off once `capacity` is reached.
pub struct GameLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
    time_source: Arc<dyn TimeSource>,
}

impl GameLog {
    pub fn new(capacity: usize, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            time_source,
        }
    }

    pub fn log(&mut self, level: LogLevel, category: &'static str, message: impl Into<String>) {
        self.log_with_fields(level, category, message, HashMap::new());
    }

    pub fn log_with_fields(
        &mut self,
        level: LogLevel,
        category: &'static str,
        message: impl Into<String>,
        fields: HashMap<String, String>,
    ) {
        let entry = LogEntry {
            level,
            category,
            message: message.into(),
            game_time: self.time_source.now_ms(),
            fields,
        };
        match entry.level {
            LogLevel::Debug => tracing::debug!(category, "{}", entry.message),
            LogLevel::Info => tracing::info!(category, "{}", entry.message),
            LogLevel::Warn => tracing::warn!(category, "{}", entry.message),
            LogLevel::Error => tracing::error!(category, "{}", entry.message),
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Most recent `limit` entries, newest last; optionally filtered by
    /// category and/or minimum level.
    pub fn query(&self, category: Option<&str>, min_level: Option<LogLevel>, limit: usize) -> Vec<LogEntryDto> {
        self.entries
            .iter()
            .filter(|e| category.map(|c| c == e.category).unwrap_or(true))
            .filter(|e| min_level.map(|min| e.level >= min).unwrap_or(true))
            .rev()
            .take(limit)
            .map(LogEntryDto::from)
            .rev()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_source::TickClock;

    #[test]
    fn ring_buffer_drops_oldest_past_capacity() {
        let clock = Arc::new(TickClock::new());
        let mut log = GameLog::new(2, clock);
        log.log(LogLevel::Info, "engine", "one");
        log.log(LogLevel::Info, "engine", "two");
        log.log(LogLevel::Info, "engine", "three");

        let all = log.query(None, None, 10);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "two");
        assert_eq!(all[1].message, "three");
    }

    #[test]
    fn query_filters_by_category_and_level() {
        let clock = Arc::new(TickClock::new());
        let mut log = GameLog::new(10, clock);
        log.log(LogLevel::Debug, "engine", "debug line");
        log.log(LogLevel::Error, "gateway", "error line");

        let errors = log.query(None, Some(LogLevel::Warn), 10);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "error line");

        let gateway_only = log.query(Some("gateway"), None, 10);
        assert_eq!(gateway_only.len(), 1);
    }
}
