//! Bridges `terrain-core`'s `log` records through to the browser devtools
//! console, so a host never has to install its own sink just to see
//! `EngineFacade`'s diagnostic `debug!`/`warn!`/`error!` lines.

use log::{Level, Log, Metadata, Record};

struct ConsoleLogger;

impl Log for ConsoleLogger {
  fn enabled(&self, _metadata: &Metadata) -> bool {
    true
  }

  fn log(&self, record: &Record) {
    let line = format!("[{}] {}", record.target(), record.args());
    match record.level() {
      Level::Error => web_sys::console::error_1(&line.into()),
      Level::Warn => web_sys::console::warn_1(&line.into()),
      Level::Info => web_sys::console::info_1(&line.into()),
      Level::Debug | Level::Trace => web_sys::console::debug_1(&line.into()),
    }
  }

  fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Register the console bridge as the global `log` sink. Idempotent: a
/// second call is a no-op, since a host page may call `init()` more than
/// once (e.g. across hot-reloads).
pub fn install() {
  let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(log::LevelFilter::Debug));
}
