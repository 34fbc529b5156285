// Console logging through env_logger, mirrored into an in-memory ring buffer
// so the panic hook can dump the last lines next to the backtrace.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use backtrace::Backtrace;
use chrono::Utc;
use env_logger::fmt::Color;
use log::{Level, LevelFilter, Metadata, Record};

const MAX_LOG_LINES: usize = 1000;
const LOG_TARGET: &str = "object_detection_tool";

pub type LogBuffer = Arc<Mutex<VecDeque<String>>>;

struct BufferLogger {
    log_buffer: LogBuffer,
}

impl BufferLogger {
    fn new() -> Self {
        Self {
            log_buffer: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES))),
        }
    }

    fn log_to_buffer(&self, message: String) {
        if let Ok(mut buffer) = self.log_buffer.lock() {
            push_line(&mut buffer, message);
        }
    }

    fn get_shared_buffer(&self) -> LogBuffer {
        Arc::clone(&self.log_buffer)
    }
}

fn push_line(buffer: &mut VecDeque<String>, line: String) {
    if buffer.len() == MAX_LOG_LINES {
        buffer.pop_front();
    }
    buffer.push_back(line);
}

impl log::Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with(LOG_TARGET) && metadata.level() <= LevelFilter::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = match record.line() {
                Some(line) => format!("{:<5} {}:{} {}", record.level(), record.target(), line, record.args()),
                None => format!("{:<5} {} {}", record.level(), record.target(), record.args()),
            };
            self.log_to_buffer(message);
        }
    }

    fn flush(&self) {}
}

struct CompositeLogger {
    console_logger: env_logger::Logger,
    buffer_logger: BufferLogger,
}

impl log::Log for CompositeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console_logger.enabled(metadata) || self.buffer_logger.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.console_logger.enabled(record.metadata()) {
            self.console_logger.log(record);
        }
        if self.buffer_logger.enabled(record.metadata()) {
            self.buffer_logger.log(record);
        }
    }

    fn flush(&self) {
        self.console_logger.flush();
        self.buffer_logger.flush();
    }
}

/// Installs the global logger and returns the shared ring buffer.
///
/// `RUST_LOG` wins when set; otherwise only this crate logs, at debug level
/// in debug builds and info level in release builds.
pub fn setup_logger() -> LogBuffer {
    let buffer_logger = BufferLogger::new();
    let shared_buffer = buffer_logger.get_shared_buffer();

    let mut builder = env_logger::Builder::new();
    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        builder.filter(None, LevelFilter::Off);
        if cfg!(debug_assertions) {
            builder.filter(Some(LOG_TARGET), LevelFilter::Debug);
        } else {
            builder.filter(Some(LOG_TARGET), LevelFilter::Info);
        }
    }

    builder.format(|buf, record| {
        let mut style = buf.style();
        match record.level() {
            Level::Error => style.set_color(Color::Red),
            Level::Warn => style.set_color(Color::Yellow),
            Level::Info => style.set_color(Color::Green),
            Level::Debug => style.set_color(Color::Blue),
            Level::Trace => style.set_color(Color::White),
        };
        writeln!(buf, "{:<5} {}", style.value(record.level()), record.args())
    });

    let composite_logger = CompositeLogger {
        console_logger: builder.build(),
        buffer_logger,
    };

    match log::set_boxed_logger(Box::new(composite_logger)) {
        Ok(()) => log::set_max_level(LevelFilter::Trace),
        Err(e) => eprintln!("Failed to set logger: {}", e),
    }

    shared_buffer
}

pub fn get_log_directory(app_name: &str) -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(app_name).join("logs")
}

/// Writes `panic.log` with a backtrace and the buffered log lines when the
/// process panics. The default hook still runs afterwards.
pub fn setup_panic_hook(app_name: &str, log_buffer: LogBuffer) {
    let log_file_path = get_log_directory(app_name).join("panic.log");
    if let Some(parent) = log_file_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Failed to create log directory {}: {}", parent.display(), e);
        }
    }

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let backtrace = Backtrace::new();
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&log_file_path)
        {
            let _ = writeln!(file, "[{}] Panic occurred: {}", Utc::now().to_rfc3339(), info);
            let _ = writeln!(file, "Backtrace:\n{:?}\n", backtrace);
            let _ = writeln!(file, "Last {} log entries:\n", MAX_LOG_LINES);

            if let Ok(buffer) = log_buffer.lock() {
                for line in buffer.iter() {
                    let _ = writeln!(file, "{}", line);
                }
            }
        }
        default_hook(info);
    }));
}
