// AccelWatch — Host Logger
//
// Formats host log lines the way the ESP-IDF console prints them on the
// device (`I (07:59:00.125) accelwatch::face: ...`), so simulation output and
// serial captures read the same. Wall-clock time stands in for the device's
// milliseconds since boot.

use std::io::Write;

use chrono::Local;
use env_logger::Builder;
use log::Level;

/// Install the host logger. `RUST_LOG` overrides the default `info` filter.
pub fn init_logger() {
    Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let (tag, colour) = level_tag(record.level());
            writeln!(
                buf,
                "{}{} ({}) {}: {}\x1b[0m",
                colour,
                tag,
                Local::now().format("%H:%M:%S%.3f"),
                record.target(),
                record.args(),
            )
        })
        .init();
}

/// ESP-IDF single-letter level and its console colour.
fn level_tag(level: Level) -> (char, &'static str) {
    match level {
        Level::Error => ('E', "\x1b[0;31m"),
        Level::Warn => ('W', "\x1b[0;33m"),
        Level::Info => ('I', "\x1b[0;32m"),
        Level::Debug => ('D', ""),
        Level::Trace => ('V', ""),
    }
}
