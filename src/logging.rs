use leptos::leptos_dom::logging::{console_error, console_log, console_warn};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Sends `log` records to the browser console.
struct Console;

static CONSOLE: Console = Console;

impl Log for Console {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        match record.level() {
            Level::Error => console_error(&line),
            Level::Warn => console_warn(&line),
            _ => console_log(&line),
        }
    }

    fn flush(&self) {}
}

pub fn init(level: LevelFilter) {
    match log::set_logger(&CONSOLE) {
        Ok(()) => log::set_max_level(level),
        Err(err) => console_warn(&format!("Logger already set: {err}")),
    }
}
