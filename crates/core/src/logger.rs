// SPDX-License-Identifier: MIT

//! Level-filtered, chainable logger component.
//!
//! Grounded on `iot_logger_alloc`/`_file`/`_udp`/`_custom` in the original
//! logger header: one [`LogSink`] trait with three provided sink types
//! (console, file, UDP) plus the custom-context escape hatch, instead of
//! four separate C allocator functions.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::net::UdpSocket;
use std::sync::Mutex as StdMutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::component::ComponentCore;
use crate::state::ComponentState;

pub const LOG_MSG_MAX: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    None = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

crate::simple_display! {
    LogLevel {
        None => "NONE",
        Error => "ERROR",
        Warn => "WARN",
        Info => "INFO",
        Debug => "DEBUG",
        Trace => "TRACE",
    }
}

impl LogLevel {
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => LogLevel::None,
            "ERROR" => LogLevel::Error,
            "WARN" => LogLevel::Warn,
            "INFO" => LogLevel::Info,
            "DEBUG" => LogLevel::Debug,
            "TRACE" => LogLevel::Trace,
            _ => LogLevel::Warn, // IOT_LOGLEVEL_DEFAULT
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Warn
    }
}

/// Where a rendered log line goes. Failures here are swallowed: a logger
/// must never panic or propagate an error from a sink write.
pub trait LogSink: Send + Sync {
    fn write(&self, level: LogLevel, epoch_ms: u64, line: &str);
}

pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&self, level: LogLevel, _epoch_ms: u64, line: &str) {
        if level == LogLevel::Error {
            eprint!("{line}");
        } else {
            print!("{line}");
        }
    }
}

pub struct FileSink {
    file: StdMutex<std::fs::File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: StdMutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn write(&self, _level: LogLevel, _epoch_ms: u64, line: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = f.write_all(line.as_bytes());
        }
    }
}

pub struct UdpSink {
    socket: UdpSocket,
    target: String,
}

impl UdpSink {
    pub fn new(host: &str, port: u16) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        if host.is_empty() {
            socket.set_broadcast(true)?;
        }
        Ok(Self {
            socket,
            target: format!("{}:{}", if host.is_empty() { "255.255.255.255" } else { host }, port),
        })
    }
}

impl LogSink for UdpSink {
    fn write(&self, _level: LogLevel, _epoch_ms: u64, line: &str) {
        let _ = self.socket.send_to(line.as_bytes(), &self.target);
    }
}

/// A sink built from an arbitrary closure plus opaque context, the Rust
/// analogue of `iot_log_function_t`/`iot_log_free_fn_t` (the context's
/// `Drop` impl replaces the explicit free function).
pub struct CustomSink<C> {
    ctx: C,
    f: Box<dyn Fn(LogLevel, u64, &str, &C) + Send + Sync>,
}

impl<C: Send + Sync> CustomSink<C> {
    pub fn new(ctx: C, f: impl Fn(LogLevel, u64, &str, &C) + Send + Sync + 'static) -> Self {
        Self { ctx, f: Box::new(f) }
    }
}

impl<C: Send + Sync> LogSink for CustomSink<C> {
    fn write(&self, level: LogLevel, epoch_ms: u64, line: &str) {
        (self.f)(level, epoch_ms, line, &self.ctx);
    }
}

struct LoggerState {
    level: LogLevel,
    next: Option<std::sync::Arc<Logger>>,
}

pub struct Logger {
    core: ComponentCore,
    sink: Box<dyn LogSink>,
    state: parking_lot::Mutex<LoggerState>,
}

impl Logger {
    pub fn new(name: impl Into<String>, level: LogLevel, sink: Box<dyn LogSink>) -> Self {
        Self {
            core: ComponentCore::new(name),
            sink,
            state: parking_lot::Mutex::new(LoggerState { level, next: None }),
        }
    }

    pub fn console(name: impl Into<String>, level: LogLevel) -> Self {
        Self::new(name, level, Box::new(ConsoleSink))
    }

    pub fn core(&self) -> &ComponentCore {
        &self.core
    }

    pub fn set_level(&self, level: LogLevel) {
        self.state.lock().level = level;
    }

    pub fn level(&self) -> LogLevel {
        self.state.lock().level
    }

    pub fn set_next(&self, next: std::sync::Arc<Logger>) {
        self.state.lock().next = Some(next);
    }

    pub fn start(&self) {
        self.core.set_state(ComponentState::Running);
    }

    pub fn stop(&self) {
        self.core.set_state(ComponentState::Stopped);
    }

    /// Log `message` at `level`. Filtered by both this link's level and
    /// state (only `Running` loggers emit); forwarding to `next` always
    /// happens regardless of this link's filtering decision, and `next`
    /// applies its own filter independently.
    pub fn log(&self, level: LogLevel, message: &str) {
        let (configured_level, next) = {
            let guard = self.state.lock();
            (guard.level, guard.next.clone())
        };

        if level != LogLevel::None
            && level <= configured_level
            && self.core.state() == ComponentState::Running
        {
            let epoch_ms = now_epoch_ms();
            let line = render_line(&self.core.name().to_string(), level, epoch_ms, message);
            self.sink.write(level, epoch_ms, &line);
        }

        if let Some(next) = next {
            next.log(level, message);
        }
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }
}

impl crate::factory::Component for Logger {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_arc(self: std::sync::Arc<Self>) -> std::sync::Arc<dyn std::any::Any + Send + Sync> {
        self
    }

    fn start(&self) {
        Logger::start(self);
    }

    fn stop(&self) {
        Logger::stop(self);
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Format: `<unix-seconds> <logger-name>: <level-name>: <message>\n`,
/// truncated to [`LOG_MSG_MAX`] bytes.
fn render_line(name: &str, level: LogLevel, epoch_ms: u64, message: &str) -> String {
    let mut line = String::new();
    let _ = write!(line, "{} {}: {}: {}\n", epoch_ms / 1000, name, level, message);
    if line.len() > LOG_MSG_MAX {
        // `truncate` panics off a char boundary; fall back to the nearest
        // boundary at or below the cap so a split multi-byte char is safe.
        let cut = (0..=LOG_MSG_MAX).rev().find(|&i| line.is_char_boundary(i)).unwrap_or(0);
        line.truncate(cut);
    }
    line
}

pub const LOGGER_TYPE: &str = "Svcrt::Logger";

/// Container-facing factory, reading `Level` (defaulting to `Warn`, matching
/// `IOT_LOGLEVEL_DEFAULT`) and `Next` (the name of an already-registered
/// logger to chain to) config keys.
pub struct LoggerFactory;

impl crate::factory::ComponentFactory for LoggerFactory {
    fn type_name(&self) -> &'static str {
        LOGGER_TYPE
    }

    fn category(&self) -> &'static str {
        "Svcrt::Core"
    }

    fn config(
        &self,
        map: &crate::config::ConfigMap,
        lookup: &dyn crate::factory::ComponentLookup,
    ) -> Result<std::sync::Arc<dyn crate::factory::Component>, crate::error::FactoryError> {
        let level = map
            .get("Level")
            .map(LogLevel::from_str_or_default)
            .unwrap_or_default();
        let logger = std::sync::Arc::new(Logger::console("Logger", level));

        if let Some(next_name) = map.get("Next") {
            let next_component = lookup
                .find(next_name)
                .ok_or_else(|| crate::error::FactoryError::NotFound(next_name.to_string()))?;
            let next_logger = next_component
                .as_any_arc()
                .downcast::<Logger>()
                .map_err(|_| crate::error::FactoryError::ConfigRejected(LOGGER_TYPE.to_string()))?;
            logger.set_next(next_logger);
        }

        Ok(logger)
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
